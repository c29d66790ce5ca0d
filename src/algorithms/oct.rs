use zeroize::Zeroize;

use super::random_bytes;
use crate::error::*;

/// A symmetric secret, used for MAC, content encryption or key wrapping
#[derive(Clone)]
pub struct SymmetricKey {
    raw_key: Vec<u8>,
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bit_length", &self.bit_length())
            .finish_non_exhaustive()
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.raw_key.zeroize();
    }
}

impl SymmetricKey {
    /// Create a symmetric key from a byte slice.
    pub fn from_bytes(raw_key: &[u8]) -> Result<Self, Error> {
        ensure!(
            !raw_key.is_empty(),
            KeyGenError::InvalidOption("a symmetric key cannot be empty".to_string())
        );
        Ok(SymmetricKey {
            raw_key: raw_key.to_vec(),
        })
    }

    /// Convert the key to a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.raw_key.clone()
    }

    /// Key length, in bits.
    pub fn bit_length(&self) -> usize {
        self.raw_key.len() * 8
    }

    /// Generate a random key of `bit_length` bits.
    pub fn generate(bit_length: usize) -> Result<Self, Error> {
        ensure!(
            bit_length > 0 && bit_length % 8 == 0,
            KeyGenError::GenerationFailure(format!("invalid key length: {} bits", bit_length))
        );
        let raw_key = random_bytes(&mut rand::thread_rng(), bit_length / 8)?;
        Ok(SymmetricKey { raw_key })
    }
}

impl AsRef<[u8]> for SymmetricKey {
    /// Get the raw key, as a byte slice
    fn as_ref(&self) -> &[u8] {
        &self.raw_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate() {
        let key = SymmetricKey::generate(256).unwrap();
        assert_eq!(key.as_ref().len(), 32);
        assert_eq!(key.bit_length(), 256);

        let other = SymmetricKey::generate(256).unwrap();
        assert_ne!(key.as_ref(), other.as_ref());

        assert_eq!(SymmetricKey::generate(384).unwrap().to_bytes().len(), 48);
        assert!(SymmetricKey::generate(0).is_err());
        assert!(SymmetricKey::generate(100).is_err());
    }

    #[test]
    fn empty_key() {
        let err = SymmetricKey::from_bytes(&[]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KeyGenError>(),
            Some(KeyGenError::InvalidOption(_))
        ));
    }

    #[test]
    fn debug_does_not_leak_the_key() {
        let key = SymmetricKey::from_bytes(&[0x42; 16]).unwrap();
        let debug = format!("{:?}", key);
        assert!(debug.contains("128"));
        assert!(!debug.contains("66"));
    }
}

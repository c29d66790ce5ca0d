use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};

use crate::error::*;

pub const RSA_PUBLIC_EXPONENT: u64 = 65537;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RSAPublicKey(RsaPublicKey);

impl AsRef<RsaPublicKey> for RSAPublicKey {
    fn as_ref(&self) -> &RsaPublicKey {
        &self.0
    }
}

/// Big-endian, minimal-length public key components
pub struct RSAPublicKeyComponents {
    pub n: Vec<u8>,
    pub e: Vec<u8>,
}

/// Big-endian, minimal-length private key components, CRT values included
pub struct RSAKeyPairComponents {
    pub n: Vec<u8>,
    pub e: Vec<u8>,
    pub d: Vec<u8>,
    pub p: Vec<u8>,
    pub q: Vec<u8>,
    pub dp: Vec<u8>,
    pub dq: Vec<u8>,
    pub qi: Vec<u8>,
}

impl Drop for RSAKeyPairComponents {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.d.zeroize();
        self.p.zeroize();
        self.q.zeroize();
        self.dp.zeroize();
        self.dq.zeroize();
        self.qi.zeroize();
    }
}

impl RSAPublicKey {
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let rsa_pk = RsaPublicKey::from_public_key_der(der)
            .or_else(|_| RsaPublicKey::from_pkcs1_der(der))
            .map_err(|_| KeyGenError::InvalidPublicKey)?;
        Ok(RSAPublicKey(rsa_pk))
    }

    pub fn from_pem(pem: &str) -> Result<Self, Error> {
        let pem = pem.trim();
        let rsa_pk = RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map_err(|_| KeyGenError::InvalidPublicKey)?;
        Ok(RSAPublicKey(rsa_pk))
    }

    pub fn from_components(n: &[u8], e: &[u8]) -> Result<Self, Error> {
        let n = BigUint::from_bytes_be(n);
        let e = BigUint::from_bytes_be(e);
        let rsa_pk = RsaPublicKey::new(n, e).map_err(|_| KeyGenError::InvalidPublicKey)?;
        Ok(RSAPublicKey(rsa_pk))
    }

    /// SubjectPublicKeyInfo DER encoding
    pub fn to_der(&self) -> Result<Vec<u8>, Error> {
        let der = self
            .0
            .to_public_key_der()
            .map_err(|_| KeyGenError::InvalidPublicKey)?;
        Ok(der.as_bytes().to_vec())
    }

    pub fn to_components(&self) -> RSAPublicKeyComponents {
        let n = self.0.n().to_bytes_be();
        let e = self.0.e().to_bytes_be();
        RSAPublicKeyComponents { n, e }
    }

    pub fn modulus_bits(&self) -> usize {
        self.0.n().bits()
    }
}

#[derive(Clone)]
pub struct RSAKeyPair {
    rsa_sk: RsaPrivateKey,
}

impl std::fmt::Debug for RSAKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RSAKeyPair")
            .field("modulus_bits", &self.modulus_bits())
            .finish_non_exhaustive()
    }
}

impl AsRef<RsaPrivateKey> for RSAKeyPair {
    fn as_ref(&self) -> &RsaPrivateKey {
        &self.rsa_sk
    }
}

impl RSAKeyPair {
    fn checked(mut rsa_sk: RsaPrivateKey) -> Result<Self, Error> {
        rsa_sk.validate().map_err(|_| KeyGenError::InvalidKeyPair)?;
        rsa_sk
            .precompute()
            .map_err(|_| KeyGenError::InvalidKeyPair)?;
        ensure!(rsa_sk.primes().len() == 2, KeyGenError::InvalidKeyPair);
        Ok(RSAKeyPair { rsa_sk })
    }

    /// PKCS8 or PKCS1 DER-encoded key pair
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let rsa_sk = RsaPrivateKey::from_pkcs8_der(der)
            .or_else(|_| RsaPrivateKey::from_pkcs1_der(der))
            .map_err(|_| KeyGenError::InvalidKeyPair)?;
        Self::checked(rsa_sk)
    }

    /// PKCS8 or PKCS1 PEM-encoded key pair
    pub fn from_pem(pem: &str) -> Result<Self, Error> {
        let pem = pem.trim();
        let rsa_sk = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|_| KeyGenError::InvalidKeyPair)?;
        Self::checked(rsa_sk)
    }

    /// Rebuild a two-prime key pair. `dp`, `dq` and `qi` are recomputed.
    pub fn from_components(n: &[u8], e: &[u8], d: &[u8], p: &[u8], q: &[u8]) -> Result<Self, Error> {
        let rsa_sk = RsaPrivateKey::from_components(
            BigUint::from_bytes_be(n),
            BigUint::from_bytes_be(e),
            BigUint::from_bytes_be(d),
            vec![BigUint::from_bytes_be(p), BigUint::from_bytes_be(q)],
        )
        .map_err(|_| KeyGenError::InvalidKeyPair)?;
        Self::checked(rsa_sk)
    }

    /// PKCS8 DER encoding
    pub fn to_der(&self) -> Result<Vec<u8>, Error> {
        let der = self
            .rsa_sk
            .to_pkcs8_der()
            .map_err(|_| KeyGenError::InvalidKeyPair)?;
        Ok(der.as_bytes().to_vec())
    }

    pub fn to_components(&self) -> Result<RSAKeyPairComponents, Error> {
        let sk = &self.rsa_sk;
        let (p, q) = match sk.primes() {
            [p, q] => (p, q),
            _ => bail!(KeyGenError::InvalidKeyPair),
        };
        let dp = sk.dp().ok_or(KeyGenError::InvalidKeyPair)?;
        let dq = sk.dq().ok_or(KeyGenError::InvalidKeyPair)?;
        let qi = sk.crt_coefficient().ok_or(KeyGenError::InvalidKeyPair)?;
        Ok(RSAKeyPairComponents {
            n: sk.n().to_bytes_be(),
            e: sk.e().to_bytes_be(),
            d: sk.d().to_bytes_be(),
            p: p.to_bytes_be(),
            q: q.to_bytes_be(),
            dp: dp.to_bytes_be(),
            dq: dq.to_bytes_be(),
            qi: qi.to_bytes_be(),
        })
    }

    pub fn public_key(&self) -> RSAPublicKey {
        RSAPublicKey(self.rsa_sk.to_public_key())
    }

    pub fn modulus_bits(&self) -> usize {
        self.rsa_sk.n().bits()
    }

    pub fn generate(modulus_bits: usize) -> Result<Self, Error> {
        match modulus_bits {
            2048 | 3072 | 4096 => {}
            _ => bail!(KeyGenError::UnsupportedRSAModulus),
        };
        let mut rng = rand::thread_rng();
        let exp = BigUint::from(RSA_PUBLIC_EXPONENT);
        let rsa_sk = RsaPrivateKey::new_with_exp(&mut rng, modulus_bits, &exp)
            .map_err(|e| KeyGenError::GenerationFailure(e.to_string()))?;
        let key_pair = Self::checked(rsa_sk)
            .map_err(|e| KeyGenError::GenerationFailure(e.to_string()))?;
        ensure!(
            key_pair.modulus_bits() == modulus_bits,
            KeyGenError::GenerationFailure(format!(
                "expected a {}-bit modulus, got {} bits",
                modulus_bits,
                key_pair.modulus_bits()
            ))
        );
        Ok(key_pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_and_reload() {
        let key_pair = RSAKeyPair::generate(2048).unwrap();
        assert_eq!(key_pair.modulus_bits(), 2048);

        let components = key_pair.to_components().unwrap();
        assert_eq!(components.e, vec![0x01, 0x00, 0x01]);
        assert_eq!(components.n.len(), 256);
        assert_ne!(components.n[0], 0);

        let rebuilt = RSAKeyPair::from_components(
            &components.n,
            &components.e,
            &components.d,
            &components.p,
            &components.q,
        )
        .unwrap();
        let rebuilt_components = rebuilt.to_components().unwrap();
        assert_eq!(rebuilt_components.dp, components.dp);
        assert_eq!(rebuilt_components.dq, components.dq);
        assert_eq!(rebuilt_components.qi, components.qi);

        let der = key_pair.to_der().unwrap();
        let reloaded = RSAKeyPair::from_der(&der).unwrap();
        assert_eq!(reloaded.public_key(), key_pair.public_key());

        let pk_der = key_pair.public_key().to_der().unwrap();
        let pk = RSAPublicKey::from_der(&pk_der).unwrap();
        assert_eq!(pk.to_components().n, components.n);
    }

    #[test]
    fn unsupported_modulus() {
        let err = RSAKeyPair::generate(1024).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KeyGenError>(),
            Some(KeyGenError::UnsupportedRSAModulus)
        ));
    }
}

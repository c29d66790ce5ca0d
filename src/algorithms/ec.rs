use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use super::{random_bytes, MAX_SCALAR_ATTEMPTS};

use crate::error::*;
use crate::registry::EcCurve;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ECPublicKey {
    P256(p256::PublicKey),
    Secp256k1(k256::PublicKey),
    P384(p384::PublicKey),
    P521(p521::PublicKey),
}

impl ECPublicKey {
    pub fn curve(&self) -> EcCurve {
        match self {
            ECPublicKey::P256(_) => EcCurve::P256,
            ECPublicKey::Secp256k1(_) => EcCurve::Secp256k1,
            ECPublicKey::P384(_) => EcCurve::P384,
            ECPublicKey::P521(_) => EcCurve::P521,
        }
    }

    /// Parse a SEC1 encoded point (compressed or uncompressed)
    pub fn from_bytes(curve: EcCurve, raw: &[u8]) -> Result<Self, Error> {
        let pk = match curve {
            EcCurve::P256 => p256::PublicKey::from_sec1_bytes(raw).map(ECPublicKey::P256),
            EcCurve::Secp256k1 => {
                k256::PublicKey::from_sec1_bytes(raw).map(ECPublicKey::Secp256k1)
            }
            EcCurve::P384 => p384::PublicKey::from_sec1_bytes(raw).map(ECPublicKey::P384),
            EcCurve::P521 => p521::PublicKey::from_sec1_bytes(raw).map(ECPublicKey::P521),
        };
        pk.map_err(|_| KeyGenError::InvalidPublicKey.into())
    }

    /// Build a public key from its affine coordinates
    pub fn from_coordinates(curve: EcCurve, x: &[u8], y: &[u8]) -> Result<Self, Error> {
        let field_size = curve.field_size();
        ensure!(
            x.len() == field_size && y.len() == field_size,
            KeyGenError::InvalidPublicKey
        );
        let mut raw = Vec::with_capacity(1 + 2 * field_size);
        raw.push(0x04);
        raw.extend_from_slice(x);
        raw.extend_from_slice(y);
        Self::from_bytes(curve, &raw)
    }

    /// SEC1 uncompressed encoding
    pub fn to_bytes_uncompressed(&self) -> Vec<u8> {
        match self {
            ECPublicKey::P256(pk) => pk.to_encoded_point(false).as_bytes().to_vec(),
            ECPublicKey::Secp256k1(pk) => pk.to_encoded_point(false).as_bytes().to_vec(),
            ECPublicKey::P384(pk) => pk.to_encoded_point(false).as_bytes().to_vec(),
            ECPublicKey::P521(pk) => pk.to_encoded_point(false).as_bytes().to_vec(),
        }
    }

    /// Affine coordinates, each left-padded to the field size
    pub fn coordinates(&self) -> (Vec<u8>, Vec<u8>) {
        let field_size = self.curve().field_size();
        let uncompressed = self.to_bytes_uncompressed();
        debug_assert_eq!(uncompressed.len(), 1 + 2 * field_size);
        let x = uncompressed[1..1 + field_size].to_vec();
        let y = uncompressed[1 + field_size..].to_vec();
        (x, y)
    }

    pub fn from_der(curve: EcCurve, der: &[u8]) -> Result<Self, Error> {
        let pk = match curve {
            EcCurve::P256 => p256::PublicKey::from_public_key_der(der).map(ECPublicKey::P256),
            EcCurve::Secp256k1 => {
                k256::PublicKey::from_public_key_der(der).map(ECPublicKey::Secp256k1)
            }
            EcCurve::P384 => p384::PublicKey::from_public_key_der(der).map(ECPublicKey::P384),
            EcCurve::P521 => p521::PublicKey::from_public_key_der(der).map(ECPublicKey::P521),
        };
        pk.map_err(|_| KeyGenError::InvalidPublicKey.into())
    }

    /// SubjectPublicKeyInfo DER encoding, with an uncompressed point
    pub fn to_der(&self) -> Result<Vec<u8>, Error> {
        let der = match self {
            ECPublicKey::P256(pk) => pk.to_public_key_der(),
            ECPublicKey::Secp256k1(pk) => pk.to_public_key_der(),
            ECPublicKey::P384(pk) => pk.to_public_key_der(),
            ECPublicKey::P521(pk) => pk.to_public_key_der(),
        }
        .map_err(|_| KeyGenError::InvalidPublicKey)?;
        Ok(der.as_bytes().to_vec())
    }
}

#[derive(Clone)]
pub enum ECKeyPair {
    P256(p256::SecretKey),
    Secp256k1(k256::SecretKey),
    P384(p384::SecretKey),
    P521(p521::SecretKey),
}

impl std::fmt::Debug for ECKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ECKeyPair")
            .field("curve", &self.curve())
            .finish_non_exhaustive()
    }
}

impl ECKeyPair {
    pub fn curve(&self) -> EcCurve {
        match self {
            ECKeyPair::P256(_) => EcCurve::P256,
            ECKeyPair::Secp256k1(_) => EcCurve::Secp256k1,
            ECKeyPair::P384(_) => EcCurve::P384,
            ECKeyPair::P521(_) => EcCurve::P521,
        }
    }

    /// Load a private scalar, big-endian
    pub fn from_bytes(curve: EcCurve, raw: &[u8]) -> Result<Self, Error> {
        ensure!(raw.len() == curve.field_size(), KeyGenError::InvalidKeyPair);
        let sk = match curve {
            EcCurve::P256 => p256::SecretKey::from_slice(raw).map(ECKeyPair::P256),
            EcCurve::Secp256k1 => k256::SecretKey::from_slice(raw).map(ECKeyPair::Secp256k1),
            EcCurve::P384 => p384::SecretKey::from_slice(raw).map(ECKeyPair::P384),
            EcCurve::P521 => p521::SecretKey::from_slice(raw).map(ECKeyPair::P521),
        };
        sk.map_err(|_| KeyGenError::InvalidKeyPair.into())
    }

    /// The private scalar, big-endian, padded to the field size
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            ECKeyPair::P256(sk) => sk.to_bytes().to_vec(),
            ECKeyPair::Secp256k1(sk) => sk.to_bytes().to_vec(),
            ECKeyPair::P384(sk) => sk.to_bytes().to_vec(),
            ECKeyPair::P521(sk) => sk.to_bytes().to_vec(),
        }
    }

    pub fn from_der(curve: EcCurve, der: &[u8]) -> Result<Self, Error> {
        let sk = match curve {
            EcCurve::P256 => p256::SecretKey::from_pkcs8_der(der).map(ECKeyPair::P256),
            EcCurve::Secp256k1 => k256::SecretKey::from_pkcs8_der(der).map(ECKeyPair::Secp256k1),
            EcCurve::P384 => p384::SecretKey::from_pkcs8_der(der).map(ECKeyPair::P384),
            EcCurve::P521 => p521::SecretKey::from_pkcs8_der(der).map(ECKeyPair::P521),
        };
        sk.map_err(|_| KeyGenError::InvalidKeyPair.into())
    }

    /// PKCS8 DER encoding
    pub fn to_der(&self) -> Result<Vec<u8>, Error> {
        let der = match self {
            ECKeyPair::P256(sk) => sk.to_pkcs8_der(),
            ECKeyPair::Secp256k1(sk) => sk.to_pkcs8_der(),
            ECKeyPair::P384(sk) => sk.to_pkcs8_der(),
            ECKeyPair::P521(sk) => sk.to_pkcs8_der(),
        }
        .map_err(|_| KeyGenError::InvalidKeyPair)?;
        Ok(der.as_bytes().to_vec())
    }

    pub fn public_key(&self) -> ECPublicKey {
        match self {
            ECKeyPair::P256(sk) => ECPublicKey::P256(sk.public_key()),
            ECKeyPair::Secp256k1(sk) => ECPublicKey::Secp256k1(sk.public_key()),
            ECKeyPair::P384(sk) => ECPublicKey::P384(sk.public_key()),
            ECKeyPair::P521(sk) => ECPublicKey::P521(sk.public_key()),
        }
    }

    pub fn generate(curve: EcCurve) -> Result<Self, Error> {
        Self::generate_with_rng(curve, &mut rand::thread_rng())
    }

    /// Draw scalars from `rng` until one is in `[1, n)`
    pub fn generate_with_rng<R: RngCore + CryptoRng + ?Sized>(
        curve: EcCurve,
        rng: &mut R,
    ) -> Result<Self, Error> {
        for _ in 0..MAX_SCALAR_ATTEMPTS {
            let mut raw = random_bytes(rng, curve.field_size())?;
            if curve == EcCurve::P521 {
                // 66 bytes hold 528 bits
                raw[0] &= 0x01;
            }
            let key_pair = Self::from_bytes(curve, &raw);
            raw.zeroize();
            if let Ok(key_pair) = key_pair {
                return Ok(key_pair);
            }
        }
        bail!(KeyGenError::GenerationFailure(format!(
            "no valid {} scalar after {} attempts",
            curve.name(),
            MAX_SCALAR_ATTEMPTS
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::test_rng::{ConstantRng, FailingRng};

    const CURVES: [EcCurve; 4] = [
        EcCurve::P256,
        EcCurve::Secp256k1,
        EcCurve::P384,
        EcCurve::P521,
    ];

    #[test]
    fn generate() {
        for curve in CURVES {
            let key_pair = ECKeyPair::generate(curve).unwrap();
            assert_eq!(key_pair.curve(), curve);
            assert_eq!(key_pair.to_bytes().len(), curve.field_size());

            let pk = key_pair.public_key();
            assert_eq!(pk.curve(), curve);
            let (x, y) = pk.coordinates();
            assert_eq!(x.len(), curve.field_size());
            assert_eq!(y.len(), curve.field_size());
            assert_eq!(ECPublicKey::from_coordinates(curve, &x, &y).unwrap(), pk);

            let reloaded = ECKeyPair::from_bytes(curve, &key_pair.to_bytes()).unwrap();
            assert_eq!(reloaded.public_key(), pk);
        }
    }

    #[test]
    fn der() {
        for curve in CURVES {
            let key_pair = ECKeyPair::generate(curve).unwrap();
            let der = key_pair.to_der().unwrap();
            let reloaded = ECKeyPair::from_der(curve, &der).unwrap();
            assert_eq!(reloaded.to_bytes(), key_pair.to_bytes());

            let pk = key_pair.public_key();
            let der = pk.to_der().unwrap();
            assert_eq!(ECPublicKey::from_der(curve, &der).unwrap(), pk);
        }
    }

    #[test]
    fn invalid_points() {
        let x = [0u8; 32];
        assert!(ECPublicKey::from_coordinates(EcCurve::P256, &x, &x).is_err());
        assert!(ECPublicKey::from_coordinates(EcCurve::P384, &x, &x).is_err());
        assert!(ECKeyPair::from_bytes(EcCurve::P256, &[0u8; 32]).is_err());
    }

    #[test]
    fn generate_reports_entropy_failure() {
        for curve in CURVES {
            let err = ECKeyPair::generate_with_rng(curve, &mut FailingRng).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<KeyGenError>(),
                Some(KeyGenError::GenerationFailure(_))
            ));
        }
    }

    #[test]
    fn generate_gives_up_on_out_of_range_scalars() {
        for curve in [EcCurve::P256, EcCurve::P521] {
            for byte in [0x00, 0xff] {
                let err =
                    ECKeyPair::generate_with_rng(curve, &mut ConstantRng(byte)).unwrap_err();
                assert!(matches!(
                    err.downcast_ref::<KeyGenError>(),
                    Some(KeyGenError::GenerationFailure(_))
                ));
            }
        }
        let key_pair = ECKeyPair::generate_with_rng(EcCurve::P521, &mut ConstantRng(0x42)).unwrap();
        assert_eq!(key_pair.to_bytes()[0], 0x00);
        assert_eq!(key_pair.to_bytes()[1], 0x42);
    }
}

use ed25519_compact::x25519;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use super::{random_bytes, MAX_SCALAR_ATTEMPTS};

use crate::error::*;
use crate::registry::OkpCurve;

// RFC 8410 layouts for X25519 (id-X25519, 1.3.101.110)
const X25519_SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x6e, 0x03, 0x21, 0x00,
];
const X25519_PKCS8_PREFIX: [u8; 16] = [
    0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x6e, 0x04, 0x22, 0x04, 0x20,
];

fn strip_der_prefix<'a>(der: &'a [u8], prefix: &[u8]) -> Option<&'a [u8]> {
    match der.strip_prefix(prefix) {
        Some(raw) if raw.len() == 32 => Some(raw),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OKPPublicKey {
    Ed25519(ed25519_compact::PublicKey),
    X25519(x25519::PublicKey),
}

impl OKPPublicKey {
    pub fn curve(&self) -> OkpCurve {
        match self {
            OKPPublicKey::Ed25519(_) => OkpCurve::Ed25519,
            OKPPublicKey::X25519(_) => OkpCurve::X25519,
        }
    }

    pub fn from_bytes(curve: OkpCurve, raw: &[u8]) -> Result<Self, Error> {
        let pk = match curve {
            OkpCurve::Ed25519 => {
                ed25519_compact::PublicKey::from_slice(raw).map(OKPPublicKey::Ed25519)
            }
            OkpCurve::X25519 => x25519::PublicKey::from_slice(raw).map(OKPPublicKey::X25519),
        };
        pk.map_err(|_| KeyGenError::InvalidPublicKey.into())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            OKPPublicKey::Ed25519(pk) => pk.to_vec(),
            OKPPublicKey::X25519(pk) => pk.to_vec(),
        }
    }

    pub fn from_der(curve: OkpCurve, der: &[u8]) -> Result<Self, Error> {
        match curve {
            OkpCurve::Ed25519 => ed25519_compact::PublicKey::from_der(der)
                .map(OKPPublicKey::Ed25519)
                .map_err(|_| KeyGenError::InvalidPublicKey.into()),
            OkpCurve::X25519 => {
                let raw = strip_der_prefix(der, &X25519_SPKI_PREFIX)
                    .ok_or(KeyGenError::InvalidPublicKey)?;
                Self::from_bytes(curve, raw)
            }
        }
    }

    /// SubjectPublicKeyInfo DER encoding
    pub fn to_der(&self) -> Vec<u8> {
        match self {
            OKPPublicKey::Ed25519(pk) => pk.to_der(),
            OKPPublicKey::X25519(pk) => [&X25519_SPKI_PREFIX[..], &pk[..]].concat(),
        }
    }
}

#[derive(Clone)]
pub enum OKPKeyPair {
    Ed25519(ed25519_compact::KeyPair),
    X25519(x25519::KeyPair),
}

impl std::fmt::Debug for OKPKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OKPKeyPair")
            .field("curve", &self.curve())
            .finish_non_exhaustive()
    }
}

impl OKPKeyPair {
    pub fn curve(&self) -> OkpCurve {
        match self {
            OKPKeyPair::Ed25519(_) => OkpCurve::Ed25519,
            OKPKeyPair::X25519(_) => OkpCurve::X25519,
        }
    }

    /// Load a key pair from its 32-byte private part (Ed25519 seed or X25519 scalar)
    pub fn from_bytes(curve: OkpCurve, raw: &[u8]) -> Result<Self, Error> {
        match curve {
            OkpCurve::Ed25519 => {
                let seed = ed25519_compact::Seed::from_slice(raw)
                    .map_err(|_| KeyGenError::InvalidKeyPair)?;
                Ok(OKPKeyPair::Ed25519(ed25519_compact::KeyPair::from_seed(
                    seed,
                )))
            }
            OkpCurve::X25519 => {
                let sk =
                    x25519::SecretKey::from_slice(raw).map_err(|_| KeyGenError::InvalidKeyPair)?;
                let pk = sk
                    .recover_public_key()
                    .map_err(|_| KeyGenError::InvalidKeyPair)?;
                Ok(OKPKeyPair::X25519(x25519::KeyPair { pk, sk }))
            }
        }
    }

    /// The 32-byte private part: the Ed25519 seed, or the X25519 scalar
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            OKPKeyPair::Ed25519(kp) => kp.sk.seed().to_vec(),
            OKPKeyPair::X25519(kp) => kp.sk.to_vec(),
        }
    }

    pub fn from_der(curve: OkpCurve, der: &[u8]) -> Result<Self, Error> {
        match curve {
            OkpCurve::Ed25519 => {
                let sk = ed25519_compact::SecretKey::from_der(der)
                    .map_err(|_| KeyGenError::InvalidKeyPair)?;
                Ok(OKPKeyPair::Ed25519(ed25519_compact::KeyPair::from_seed(
                    sk.seed(),
                )))
            }
            OkpCurve::X25519 => {
                let raw = strip_der_prefix(der, &X25519_PKCS8_PREFIX)
                    .ok_or(KeyGenError::InvalidKeyPair)?;
                Self::from_bytes(curve, raw)
            }
        }
    }

    /// PKCS8 DER encoding
    pub fn to_der(&self) -> Vec<u8> {
        match self {
            OKPKeyPair::Ed25519(kp) => kp.sk.to_der(),
            OKPKeyPair::X25519(kp) => [&X25519_PKCS8_PREFIX[..], &kp.sk[..]].concat(),
        }
    }

    pub fn public_key(&self) -> OKPPublicKey {
        match self {
            OKPKeyPair::Ed25519(kp) => OKPPublicKey::Ed25519(kp.pk),
            OKPKeyPair::X25519(kp) => OKPPublicKey::X25519(kp.pk.clone()),
        }
    }

    pub fn generate(curve: OkpCurve) -> Result<Self, Error> {
        Self::generate_with_rng(curve, &mut rand::thread_rng())
    }

    pub fn generate_with_rng<R: RngCore + CryptoRng + ?Sized>(
        curve: OkpCurve,
        rng: &mut R,
    ) -> Result<Self, Error> {
        for _ in 0..MAX_SCALAR_ATTEMPTS {
            let mut raw = random_bytes(rng, 32)?;
            let key_pair = Self::from_bytes(curve, &raw);
            raw.zeroize();
            if let Ok(key_pair) = key_pair {
                return Ok(key_pair);
            }
        }
        bail!(KeyGenError::GenerationFailure(format!(
            "no valid {} key after {} attempts",
            curve.name(),
            MAX_SCALAR_ATTEMPTS
        )))
    }
}

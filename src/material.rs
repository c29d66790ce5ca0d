use crate::algorithms::*;
use crate::error::*;
use crate::registry::KeySpec;

/// Freshly generated, or imported, key material
///
/// Asymmetric variants hold the private key, from which the public key is derived.
#[derive(Debug, Clone)]
pub enum KeyMaterial {
    Symmetric(SymmetricKey),
    Rsa(RSAKeyPair),
    EllipticCurve(ECKeyPair),
    OctetKeyPair(OKPKeyPair),
}

/// The public half of an asymmetric key pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKeyMaterial {
    Rsa(RSAPublicKey),
    EllipticCurve(ECPublicKey),
    OctetKeyPair(OKPPublicKey),
}

impl KeyMaterial {
    /// The specification this material satisfies
    pub fn key_spec(&self) -> KeySpec {
        match self {
            KeyMaterial::Symmetric(key) => KeySpec::Symmetric {
                bit_length: key.bit_length(),
            },
            KeyMaterial::Rsa(key_pair) => KeySpec::Rsa {
                modulus_bits: key_pair.modulus_bits(),
            },
            KeyMaterial::EllipticCurve(key_pair) => KeySpec::EllipticCurve {
                curve: key_pair.curve(),
            },
            KeyMaterial::OctetKeyPair(key_pair) => KeySpec::OctetKeyPair {
                curve: key_pair.curve(),
            },
        }
    }

    pub fn is_symmetric(&self) -> bool {
        matches!(self, KeyMaterial::Symmetric(_))
    }

    /// Derive the public key. Symmetric keys have none.
    pub fn public_key(&self) -> Result<PublicKeyMaterial, Error> {
        let pk = match self {
            KeyMaterial::Symmetric(_) => bail!(KeyGenError::UnsupportedOperation(
                "a symmetric key has no public component"
            )),
            KeyMaterial::Rsa(key_pair) => PublicKeyMaterial::Rsa(key_pair.public_key()),
            KeyMaterial::EllipticCurve(key_pair) => {
                PublicKeyMaterial::EllipticCurve(key_pair.public_key())
            }
            KeyMaterial::OctetKeyPair(key_pair) => {
                PublicKeyMaterial::OctetKeyPair(key_pair.public_key())
            }
        };
        Ok(pk)
    }
}

impl PublicKeyMaterial {
    pub fn key_spec(&self) -> KeySpec {
        match self {
            PublicKeyMaterial::Rsa(pk) => KeySpec::Rsa {
                modulus_bits: pk.modulus_bits(),
            },
            PublicKeyMaterial::EllipticCurve(pk) => KeySpec::EllipticCurve { curve: pk.curve() },
            PublicKeyMaterial::OctetKeyPair(pk) => KeySpec::OctetKeyPair { curve: pk.curve() },
        }
    }
}

impl From<SymmetricKey> for KeyMaterial {
    fn from(key: SymmetricKey) -> Self {
        KeyMaterial::Symmetric(key)
    }
}

impl From<RSAKeyPair> for KeyMaterial {
    fn from(key_pair: RSAKeyPair) -> Self {
        KeyMaterial::Rsa(key_pair)
    }
}

impl From<ECKeyPair> for KeyMaterial {
    fn from(key_pair: ECKeyPair) -> Self {
        KeyMaterial::EllipticCurve(key_pair)
    }
}

impl From<OKPKeyPair> for KeyMaterial {
    fn from(key_pair: OKPKeyPair) -> Self {
        KeyMaterial::OctetKeyPair(key_pair)
    }
}

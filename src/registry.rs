use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::*;
use crate::error::*;

pub const DEFAULT_RSA_MODULUS_BITS: usize = 2048;

/// Short Weierstrass curves usable with `kty: "EC"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcCurve {
    P256,
    Secp256k1,
    P384,
    P521,
}

impl EcCurve {
    /// The JWK `crv` name
    pub fn name(&self) -> &'static str {
        match self {
            EcCurve::P256 => "P-256",
            EcCurve::Secp256k1 => "secp256k1",
            EcCurve::P384 => "P-384",
            EcCurve::P521 => "P-521",
        }
    }

    /// Size of a coordinate or a scalar, in bytes
    pub fn field_size(&self) -> usize {
        match self {
            EcCurve::P256 | EcCurve::Secp256k1 => 32,
            EcCurve::P384 => 48,
            EcCurve::P521 => 66,
        }
    }
}

/// Edwards and Montgomery curves usable with `kty: "OKP"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OkpCurve {
    Ed25519,
    X25519,
}

impl OkpCurve {
    /// The JWK `crv` name
    pub fn name(&self) -> &'static str {
        match self {
            OkpCurve::Ed25519 => "Ed25519",
            OkpCurve::X25519 => "X25519",
        }
    }
}

/// Any curve that can be named in a `crv` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curve {
    Ec(EcCurve),
    Okp(OkpCurve),
}

impl Curve {
    pub fn from_name(name: &str) -> Result<Self, Error> {
        let curve = match name {
            "P-256" => Curve::Ec(EcCurve::P256),
            "secp256k1" => Curve::Ec(EcCurve::Secp256k1),
            "P-384" => Curve::Ec(EcCurve::P384),
            "P-521" => Curve::Ec(EcCurve::P521),
            "Ed25519" => Curve::Okp(OkpCurve::Ed25519),
            "X25519" => Curve::Okp(OkpCurve::X25519),
            _ => bail!(KeyGenError::UnsupportedCurve(name.to_string())),
        };
        Ok(curve)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Curve::Ec(curve) => curve.name(),
            Curve::Okp(curve) => curve.name(),
        }
    }

    fn key_spec(&self) -> KeySpec {
        match *self {
            Curve::Ec(curve) => KeySpec::EllipticCurve { curve },
            Curve::Okp(curve) => KeySpec::OctetKeyPair { curve },
        }
    }
}

impl FromStr for Curve {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Curve::from_name(s)
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What has to be generated for a given algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySpec {
    Symmetric { bit_length: usize },
    Rsa { modulus_bits: usize },
    EllipticCurve { curve: EcCurve },
    OctetKeyPair { curve: OkpCurve },
}

impl KeySpec {
    pub fn is_symmetric(&self) -> bool {
        matches!(self, KeySpec::Symmetric { .. })
    }

    /// The curve, for curve-based keys
    pub fn curve(&self) -> Option<Curve> {
        match *self {
            KeySpec::Symmetric { .. } | KeySpec::Rsa { .. } => None,
            KeySpec::EllipticCurve { curve } => Some(Curve::Ec(curve)),
            KeySpec::OctetKeyPair { curve } => Some(Curve::Okp(curve)),
        }
    }
}

/// Intended use of a public key (`use` JWK parameter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyUse {
    #[serde(rename = "sig")]
    Signature,
    #[serde(rename = "enc")]
    Encryption,
}

impl KeyUse {
    pub fn name(&self) -> &'static str {
        match self {
            KeyUse::Signature => "sig",
            KeyUse::Encryption => "enc",
        }
    }
}

#[derive(Debug)]
struct RegistryEntry {
    name: &'static str,
    spec: KeySpec,
    key_use: Option<KeyUse>,
    // Curves a caller may pick instead of the default one
    curves: &'static [Curve],
}

const fn secret(name: &'static str, bit_length: usize) -> RegistryEntry {
    RegistryEntry {
        name,
        spec: KeySpec::Symmetric { bit_length },
        key_use: None,
        curves: &[],
    }
}

const fn rsa(name: &'static str, key_use: KeyUse) -> RegistryEntry {
    RegistryEntry {
        name,
        spec: KeySpec::Rsa {
            modulus_bits: DEFAULT_RSA_MODULUS_BITS,
        },
        key_use: Some(key_use),
        curves: &[],
    }
}

const fn ec(name: &'static str, curve: EcCurve, key_use: KeyUse) -> RegistryEntry {
    RegistryEntry {
        name,
        spec: KeySpec::EllipticCurve { curve },
        key_use: Some(key_use),
        curves: &[],
    }
}

const ECDH_CURVES: &[Curve] = &[
    Curve::Ec(EcCurve::P256),
    Curve::Ec(EcCurve::P384),
    Curve::Ec(EcCurve::P521),
    Curve::Okp(OkpCurve::X25519),
];

const fn ecdh(name: &'static str) -> RegistryEntry {
    RegistryEntry {
        name,
        spec: KeySpec::EllipticCurve {
            curve: EcCurve::P256,
        },
        key_use: Some(KeyUse::Encryption),
        curves: ECDH_CURVES,
    }
}

static REGISTRY: &[RegistryEntry] = &[
    // HMAC
    secret("HS256", 256),
    secret("HS384", 384),
    secret("HS512", 512),
    // AES-CBC + HMAC, the key holds both halves
    secret("A128CBC-HS256", 256),
    secret("A192CBC-HS384", 384),
    secret("A256CBC-HS512", 512),
    // AES key wrap
    secret("A128KW", 128),
    secret("A192KW", 192),
    secret("A256KW", 256),
    secret("A128GCMKW", 128),
    secret("A192GCMKW", 192),
    secret("A256GCMKW", 256),
    // AES-GCM content encryption
    secret("A128GCM", 128),
    secret("A192GCM", 192),
    secret("A256GCM", 256),
    RegistryEntry {
        name: "EdDSA",
        spec: KeySpec::OctetKeyPair {
            curve: OkpCurve::Ed25519,
        },
        key_use: Some(KeyUse::Signature),
        curves: &[Curve::Okp(OkpCurve::Ed25519)],
    },
    ec("ES256", EcCurve::P256, KeyUse::Signature),
    ec("ES256K", EcCurve::Secp256k1, KeyUse::Signature),
    ec("ES384", EcCurve::P384, KeyUse::Signature),
    ec("ES512", EcCurve::P521, KeyUse::Signature),
    rsa("PS256", KeyUse::Signature),
    rsa("PS384", KeyUse::Signature),
    rsa("PS512", KeyUse::Signature),
    rsa("RS256", KeyUse::Signature),
    rsa("RS384", KeyUse::Signature),
    rsa("RS512", KeyUse::Signature),
    rsa("RSA-OAEP", KeyUse::Encryption),
    rsa("RSA-OAEP-256", KeyUse::Encryption),
    rsa("RSA-OAEP-384", KeyUse::Encryption),
    rsa("RSA-OAEP-512", KeyUse::Encryption),
    rsa("RSA1_5", KeyUse::Encryption),
    ecdh("ECDH-ES"),
    ecdh("ECDH-ES+A128KW"),
    ecdh("ECDH-ES+A256KW"),
];

/// A JWA algorithm identifier known to the registry
#[derive(Clone, Copy)]
pub struct Algorithm(&'static RegistryEntry);

impl Algorithm {
    /// Look up an identifier. Identifiers are case-sensitive.
    pub fn from_name(name: &str) -> Result<Self, Error> {
        REGISTRY
            .iter()
            .find(|entry| entry.name == name)
            .map(Algorithm)
            .ok_or_else(|| KeyGenError::UnsupportedAlgorithm(name.to_string()).into())
    }

    /// The JWA identifier (`alg` parameter)
    pub fn name(&self) -> &'static str {
        self.0.name
    }

    /// The key specification mandated for this algorithm
    pub fn key_spec(&self) -> KeySpec {
        self.0.spec
    }

    /// The key specification, after applying caller-supplied overrides
    pub fn key_spec_with_options(&self, options: &GenerateOptions) -> Result<KeySpec, Error> {
        let mut spec = self.0.spec;
        if let Some(modulus_bits) = options.modulus_bits {
            ensure!(
                matches!(spec, KeySpec::Rsa { .. }),
                KeyGenError::InvalidOption(format!("{} does not take a modulus length", self))
            );
            match modulus_bits {
                2048 | 3072 | 4096 => {}
                _ => bail!(KeyGenError::UnsupportedRSAModulus),
            };
            spec = KeySpec::Rsa { modulus_bits };
        }
        if let Some(curve) = options.curve {
            if self.0.curves.contains(&curve) || spec.curve() == Some(curve) {
                spec = curve.key_spec();
            } else if self.0.curves.is_empty() {
                bail!(KeyGenError::InvalidOption(format!(
                    "{} does not take a curve",
                    self
                )));
            } else {
                bail!(KeyGenError::UnsupportedCurve(format!(
                    "{} cannot be used with {}",
                    curve, self
                )));
            }
        }
        Ok(spec)
    }

    /// The `use` parameter for public keys of this algorithm, if any
    pub fn key_use(&self) -> Option<KeyUse> {
        self.0.key_use
    }

    pub fn is_symmetric(&self) -> bool {
        self.0.spec.is_symmetric()
    }

    pub fn is_asymmetric(&self) -> bool {
        !self.is_symmetric()
    }

    /// Every registered algorithm, in registry order
    pub fn all() -> impl Iterator<Item = Algorithm> {
        REGISTRY.iter().map(Algorithm)
    }

    pub fn symmetric() -> impl Iterator<Item = Algorithm> {
        Self::all().filter(Algorithm::is_symmetric)
    }

    pub fn asymmetric() -> impl Iterator<Item = Algorithm> {
        Self::all().filter(Algorithm::is_asymmetric)
    }
}

impl PartialEq for Algorithm {
    fn eq(&self, other: &Self) -> bool {
        self.0.name == other.0.name
    }
}

impl Eq for Algorithm {}

impl fmt::Debug for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Algorithm").field(&self.0.name).finish()
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name)
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::from_name(s)
    }
}

/// Resolve an identifier into the key specification it mandates.
pub fn resolve_spec(identifier: &str) -> Result<KeySpec, Error> {
    Ok(Algorithm::from_name(identifier)?.key_spec())
}

/// Resolve an identifier, honoring an explicit curve or modulus length.
pub fn resolve_spec_with_options(
    identifier: &str,
    options: &GenerateOptions,
) -> Result<KeySpec, Error> {
    Algorithm::from_name(identifier)?.key_spec_with_options(options)
}

pub fn is_symmetric(identifier: &str) -> bool {
    Algorithm::from_name(identifier).map_or(false, |alg| alg.is_symmetric())
}

pub fn is_asymmetric(identifier: &str) -> bool {
    Algorithm::from_name(identifier).map_or(false, |alg| alg.is_asymmetric())
}

#[allow(unused)]
pub use anyhow::{anyhow, bail, ensure, Error};

#[derive(Debug, thiserror::Error)]
pub enum KeyGenError {
    #[error("Internal error: [{0}]")]
    InternalError(String),
    #[error("Unsupported algorithm: [{0}]")]
    UnsupportedAlgorithm(String),
    #[error("Key generation failed: [{0}]")]
    GenerationFailure(String),
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
    #[error("Unsupported curve: [{0}]")]
    UnsupportedCurve(String),
    #[error("Unsupported RSA modulus")]
    UnsupportedRSAModulus,
    #[error("Invalid option: {0}")]
    InvalidOption(String),
    #[error("Invalid JWK: {0}")]
    InvalidJWK(String),
    #[error("Invalid PEM: {0}")]
    InvalidPEM(&'static str),
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid key pair")]
    InvalidKeyPair,
}

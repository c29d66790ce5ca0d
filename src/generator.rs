use crate::algorithms::*;
use crate::common::GenerateOptions;
use crate::error::*;
use crate::material::KeyMaterial;
use crate::registry::{Algorithm, KeySpec};

/// Key material, along with the algorithm it was generated for
#[derive(Debug, Clone)]
pub struct GeneratedKey {
    pub algorithm: Algorithm,
    pub material: KeyMaterial,
}

/// Generate key material conforming to `spec`.
///
/// All entropy comes from the thread-local CSPRNG, so concurrent callers never share random state.
pub fn generate(spec: KeySpec) -> Result<KeyMaterial, Error> {
    let material: KeyMaterial = match spec {
        KeySpec::Symmetric { bit_length } => SymmetricKey::generate(bit_length)?.into(),
        KeySpec::Rsa { modulus_bits } => RSAKeyPair::generate(modulus_bits)?.into(),
        KeySpec::EllipticCurve { curve } => ECKeyPair::generate(curve)?.into(),
        KeySpec::OctetKeyPair { curve } => OKPKeyPair::generate(curve)?.into(),
    };
    debug_assert_eq!(material.key_spec(), spec);
    Ok(material)
}

/// Generate a key for `algorithm`, applying the curve and modulus overrides from `options`.
pub fn generate_for(algorithm: Algorithm, options: &GenerateOptions) -> Result<GeneratedKey, Error> {
    let spec = algorithm.key_spec_with_options(options)?;
    let material = generate(spec)?;
    Ok(GeneratedKey {
        algorithm,
        material,
    })
}

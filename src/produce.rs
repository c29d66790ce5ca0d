use crate::common::*;
use crate::error::*;
use crate::generator::{generate_for, GeneratedKey};
use crate::jwk::{to_jwk, to_public_jwk, Jwk};
use crate::pem::{public_key_to_spki, to_pkcs8, Pem};
use crate::registry::Algorithm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyRole {
    Secret,
    Public,
    Private,
}

impl KeyRole {
    pub fn name(&self) -> &'static str {
        match self {
            KeyRole::Secret => "secret",
            KeyRole::Public => "public",
            KeyRole::Private => "private",
        }
    }
}

/// A single serialized key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedArtifact {
    Jwk { role: KeyRole, jwk: Jwk },
    Pem { role: KeyRole, pem: Pem },
}

impl EncodedArtifact {
    pub fn role(&self) -> KeyRole {
        match self {
            EncodedArtifact::Jwk { role, .. } | EncodedArtifact::Pem { role, .. } => *role,
        }
    }

    pub fn is_jwk(&self) -> bool {
        matches!(self, EncodedArtifact::Jwk { .. })
    }

    /// JSON for a JWK, RFC 7468 text for a PEM block
    pub fn to_text(&self) -> Result<String, Error> {
        match self {
            EncodedArtifact::Jwk { jwk, .. } => jwk.to_json(),
            EncodedArtifact::Pem { pem, .. } => Ok(pem.to_string()),
        }
    }
}

/// Everything `produce` encoded for a single key
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub algorithm: Algorithm,
    pub secret_jwk: Option<Jwk>,
    pub public_jwk: Option<Jwk>,
    pub private_jwk: Option<Jwk>,
    pub public_pem: Option<Pem>,
    pub private_pem: Option<Pem>,
}

impl Artifacts {
    fn new(algorithm: Algorithm) -> Self {
        Artifacts {
            algorithm,
            secret_jwk: None,
            public_jwk: None,
            private_jwk: None,
            public_pem: None,
            private_pem: None,
        }
    }

    /// The artifacts in output order: JWKs first (public before private), then PEM blocks
    pub fn into_vec(self) -> Vec<EncodedArtifact> {
        let jwks = [
            (KeyRole::Secret, self.secret_jwk),
            (KeyRole::Public, self.public_jwk),
            (KeyRole::Private, self.private_jwk),
        ];
        let pems = [
            (KeyRole::Public, self.public_pem),
            (KeyRole::Private, self.private_pem),
        ];
        jwks.into_iter()
            .filter_map(|(role, jwk)| jwk.map(|jwk| EncodedArtifact::Jwk { role, jwk }))
            .chain(
                pems.into_iter()
                    .filter_map(|(role, pem)| pem.map(|pem| EncodedArtifact::Pem { role, pem })),
            )
            .collect()
    }

    pub fn len(&self) -> usize {
        [
            self.secret_jwk.is_some(),
            self.public_jwk.is_some(),
            self.private_jwk.is_some(),
            self.public_pem.is_some(),
            self.private_pem.is_some(),
        ]
        .iter()
        .filter(|&&present| present)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Generate a key for `identifier` and encode it in the requested formats.
pub fn produce(identifier: &str, formats: Formats) -> Result<Artifacts, Error> {
    produce_with_options(identifier, formats, &ProduceOptions::default())
}

/// Generate a key for `identifier` and encode it in the requested formats.
///
/// Requesting PEM for a symmetric algorithm fails before any key is generated. Encoding is
/// all-or-nothing: if any encoder fails, no artifact is returned.
pub fn produce_with_options(
    identifier: &str,
    formats: Formats,
    options: &ProduceOptions,
) -> Result<Artifacts, Error> {
    let algorithm = Algorithm::from_name(identifier)?;
    ensure!(
        !(formats.pem && algorithm.is_symmetric()),
        KeyGenError::UnsupportedOperation("symmetric keys cannot be encoded as PEM")
    );
    let GeneratedKey { algorithm, material } = generate_for(algorithm, &options.generate)?;
    let mut artifacts = Artifacts::new(algorithm);

    if material.is_symmetric() {
        if formats.jwk {
            let mut jwk = to_jwk(&material, algorithm, None)?;
            if options.with_key_id {
                let thumbprint = jwk.thumbprint()?;
                jwk = jwk.with_key_id(thumbprint);
            }
            artifacts.secret_jwk = Some(jwk);
        }
        return Ok(artifacts);
    }

    let public_key = material.public_key()?;
    if formats.jwk {
        let key_use = algorithm.key_use();
        let mut public_jwk = to_public_jwk(&public_key, algorithm, key_use)?;
        let mut private_jwk = to_jwk(&material, algorithm, key_use)?;
        if options.with_key_id {
            let thumbprint = public_jwk.thumbprint()?;
            private_jwk = private_jwk.with_key_id(&thumbprint);
            public_jwk = public_jwk.with_key_id(thumbprint);
        }
        artifacts.public_jwk = Some(public_jwk);
        artifacts.private_jwk = Some(private_jwk);
    }
    if formats.pem {
        artifacts.public_pem = Some(public_key_to_spki(&public_key)?);
        artifacts.private_pem = Some(to_pkcs8(&material)?);
    }
    Ok(artifacts)
}

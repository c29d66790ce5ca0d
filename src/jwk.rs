use std::collections::BTreeMap;

use ct_codecs::{Base64UrlSafeNoPadding, Decoder, Encoder};
use serde::{Deserialize, Serialize};

use crate::algorithms::*;
use crate::error::*;
use crate::material::{KeyMaterial, PublicKeyMaterial};
use crate::registry::{Algorithm, Curve, KeyUse};

pub const KTY_OCT: &str = "oct";
pub const KTY_RSA: &str = "RSA";
pub const KTY_EC: &str = "EC";
pub const KTY_OKP: &str = "OKP";

/// A JSON Web Key
///
/// Fields are serialized in declaration order, `kty` first. Absent parameters are omitted.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    #[serde(rename = "kty")]
    pub key_type: String,

    #[serde(rename = "crv", default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<String>,

    #[serde(rename = "alg", default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,

    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<KeyUse>,

    #[serde(rename = "kid", default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
}

impl std::fmt::Debug for Jwk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jwk")
            .field("key_type", &self.key_type)
            .field("curve", &self.curve)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("n", &self.n)
            .field("e", &self.e)
            .field("algorithm", &self.algorithm)
            .field("key_use", &self.key_use)
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

fn b64(bin: &[u8]) -> Result<String, Error> {
    Ok(Base64UrlSafeNoPadding::encode_to_string(bin)?)
}

fn decode_param(value: &Option<String>, name: &str) -> Result<Vec<u8>, Error> {
    let value = value
        .as_deref()
        .ok_or_else(|| KeyGenError::InvalidJWK(format!("missing `{}` parameter", name)))?;
    Base64UrlSafeNoPadding::decode_to_vec(value, None)
        .map_err(|_| KeyGenError::InvalidJWK(format!("invalid `{}` parameter", name)).into())
}

fn strip_leading_zeros(bin: &[u8]) -> &[u8] {
    let start = bin.iter().position(|&b| b != 0).unwrap_or(bin.len());
    &bin[start..]
}

/// Encode key material as a private (or secret) JWK.
///
/// Symmetric keys never carry a `use` parameter.
pub fn to_jwk(
    material: &KeyMaterial,
    algorithm: Algorithm,
    key_use: Option<KeyUse>,
) -> Result<Jwk, Error> {
    let jwk = match material {
        KeyMaterial::Symmetric(key) => {
            return Ok(Jwk {
                key_type: KTY_OCT.to_string(),
                k: Some(b64(key.as_ref())?),
                algorithm: Some(algorithm.name().to_string()),
                ..Default::default()
            })
        }
        KeyMaterial::Rsa(key_pair) => {
            let components = key_pair.to_components()?;
            Jwk {
                key_type: KTY_RSA.to_string(),
                n: Some(b64(&components.n)?),
                e: Some(b64(&components.e)?),
                d: Some(b64(&components.d)?),
                p: Some(b64(&components.p)?),
                q: Some(b64(&components.q)?),
                dp: Some(b64(&components.dp)?),
                dq: Some(b64(&components.dq)?),
                qi: Some(b64(&components.qi)?),
                ..Default::default()
            }
        }
        KeyMaterial::EllipticCurve(key_pair) => {
            let mut jwk = public_jwk_fields(&PublicKeyMaterial::EllipticCurve(
                key_pair.public_key(),
            ))?;
            jwk.d = Some(b64(&key_pair.to_bytes())?);
            jwk
        }
        KeyMaterial::OctetKeyPair(key_pair) => {
            let mut jwk =
                public_jwk_fields(&PublicKeyMaterial::OctetKeyPair(key_pair.public_key()))?;
            jwk.d = Some(b64(&key_pair.to_bytes())?);
            jwk
        }
    };
    Ok(Jwk {
        algorithm: Some(algorithm.name().to_string()),
        key_use,
        ..jwk
    })
}

/// Encode a public key as a JWK.
pub fn to_public_jwk(
    public_key: &PublicKeyMaterial,
    algorithm: Algorithm,
    key_use: Option<KeyUse>,
) -> Result<Jwk, Error> {
    Ok(Jwk {
        algorithm: Some(algorithm.name().to_string()),
        key_use,
        ..public_jwk_fields(public_key)?
    })
}

fn public_jwk_fields(public_key: &PublicKeyMaterial) -> Result<Jwk, Error> {
    let jwk = match public_key {
        PublicKeyMaterial::Rsa(pk) => {
            let components = pk.to_components();
            Jwk {
                key_type: KTY_RSA.to_string(),
                n: Some(b64(&components.n)?),
                e: Some(b64(&components.e)?),
                ..Default::default()
            }
        }
        PublicKeyMaterial::EllipticCurve(pk) => {
            let (x, y) = pk.coordinates();
            Jwk {
                key_type: KTY_EC.to_string(),
                curve: Some(pk.curve().name().to_string()),
                x: Some(b64(&x)?),
                y: Some(b64(&y)?),
                ..Default::default()
            }
        }
        PublicKeyMaterial::OctetKeyPair(pk) => Jwk {
            key_type: KTY_OKP.to_string(),
            curve: Some(pk.curve().name().to_string()),
            x: Some(b64(&pk.to_bytes())?),
            ..Default::default()
        },
    };
    Ok(jwk)
}

impl Jwk {
    pub fn with_key_id(mut self, key_id: impl ToString) -> Self {
        self.key_id = Some(key_id.to_string());
        self
    }

    /// `true` if the key carries private or secret parameters
    pub fn is_private(&self) -> bool {
        self.d.is_some() || self.k.is_some()
    }

    /// The same key, without its private parameters
    pub fn public_jwk(&self) -> Result<Jwk, Error> {
        ensure!(
            self.key_type != KTY_OCT,
            KeyGenError::UnsupportedOperation("a symmetric key has no public component")
        );
        Ok(Jwk {
            d: None,
            p: None,
            q: None,
            dp: None,
            dq: None,
            qi: None,
            ..self.clone()
        })
    }

    /// RFC 7638 SHA-256 thumbprint, base64url-encoded
    ///
    /// Only the required members of the key type are hashed, so a key pair and its public key
    /// share the same thumbprint.
    pub fn thumbprint(&self) -> Result<String, Error> {
        let required = match self.key_type.as_str() {
            KTY_OCT => vec![("k", &self.k)],
            KTY_RSA => vec![("e", &self.e), ("n", &self.n)],
            KTY_EC => vec![("crv", &self.curve), ("x", &self.x), ("y", &self.y)],
            KTY_OKP => vec![("crv", &self.curve), ("x", &self.x)],
            kty => bail!(KeyGenError::InvalidJWK(format!(
                "unsupported key type `{}`",
                kty
            ))),
        };
        let mut members = BTreeMap::new();
        members.insert("kty", self.key_type.as_str());
        for (name, value) in required {
            let value = value
                .as_deref()
                .ok_or_else(|| KeyGenError::InvalidJWK(format!("missing `{}` parameter", name)))?;
            members.insert(name, value);
        }
        let canonical = serde_json::to_string(&members)?;
        b64(&hmac_sha256::Hash::hash(canonical.as_bytes()))
    }

    /// Pretty-printed JSON, two-space indent
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| KeyGenError::InvalidJWK(e.to_string()).into())
    }

    fn parsed_curve(&self) -> Result<Curve, Error> {
        let name = self
            .curve
            .as_deref()
            .ok_or_else(|| KeyGenError::InvalidJWK("missing `crv` parameter".to_string()))?;
        Curve::from_name(name)
    }

    fn curve_mismatch(&self) -> Error {
        KeyGenError::InvalidJWK(format!(
            "curve `{}` cannot be used with key type `{}`",
            self.curve.as_deref().unwrap_or_default(),
            self.key_type
        ))
        .into()
    }

    /// Rebuild the public key described by this JWK
    pub fn to_public_key_material(&self) -> Result<PublicKeyMaterial, Error> {
        let pk = match self.key_type.as_str() {
            KTY_RSA => {
                let n = decode_param(&self.n, "n")?;
                let e = decode_param(&self.e, "e")?;
                let pk = RSAPublicKey::from_components(&n, &e)
                    .map_err(|_| KeyGenError::InvalidJWK("invalid RSA public key".to_string()))?;
                PublicKeyMaterial::Rsa(pk)
            }
            KTY_EC => {
                let curve = match self.parsed_curve()? {
                    Curve::Ec(curve) => curve,
                    Curve::Okp(_) => return Err(self.curve_mismatch()),
                };
                let x = decode_param(&self.x, "x")?;
                let y = decode_param(&self.y, "y")?;
                let pk = ECPublicKey::from_coordinates(curve, &x, &y)
                    .map_err(|_| KeyGenError::InvalidJWK("invalid EC point".to_string()))?;
                PublicKeyMaterial::EllipticCurve(pk)
            }
            KTY_OKP => {
                let curve = match self.parsed_curve()? {
                    Curve::Okp(curve) => curve,
                    Curve::Ec(_) => return Err(self.curve_mismatch()),
                };
                let x = decode_param(&self.x, "x")?;
                let pk = OKPPublicKey::from_bytes(curve, &x)
                    .map_err(|_| KeyGenError::InvalidJWK("invalid OKP public key".to_string()))?;
                PublicKeyMaterial::OctetKeyPair(pk)
            }
            KTY_OCT => bail!(KeyGenError::UnsupportedOperation(
                "a symmetric key has no public component"
            )),
            kty => bail!(KeyGenError::InvalidJWK(format!(
                "unsupported key type `{}`",
                kty
            ))),
        };
        Ok(pk)
    }

    /// Rebuild the key material described by this JWK
    ///
    /// Public parameters must be consistent with the private ones.
    pub fn to_key_material(&self) -> Result<KeyMaterial, Error> {
        let material = match self.key_type.as_str() {
            KTY_OCT => {
                let k = decode_param(&self.k, "k")?;
                SymmetricKey::from_bytes(&k)
                    .map_err(|_| KeyGenError::InvalidJWK("empty `k` parameter".to_string()))?
                    .into()
            }
            KTY_RSA => {
                let n = decode_param(&self.n, "n")?;
                let e = decode_param(&self.e, "e")?;
                let d = decode_param(&self.d, "d")?;
                let p = decode_param(&self.p, "p")?;
                let q = decode_param(&self.q, "q")?;
                let key_pair = RSAKeyPair::from_components(&n, &e, &d, &p, &q)
                    .map_err(|_| KeyGenError::InvalidJWK("invalid RSA key pair".to_string()))?;
                let components = key_pair.to_components()?;
                for (name, value, expected) in [
                    ("dp", &self.dp, &components.dp),
                    ("dq", &self.dq, &components.dq),
                    ("qi", &self.qi, &components.qi),
                ] {
                    if value.is_none() {
                        continue;
                    }
                    let decoded = decode_param(value, name)?;
                    ensure!(
                        strip_leading_zeros(&decoded) == strip_leading_zeros(expected),
                        KeyGenError::InvalidJWK(format!(
                            "`{}` does not match the private key",
                            name
                        ))
                    );
                }
                key_pair.into()
            }
            KTY_EC | KTY_OKP => {
                let pk = self.to_public_key_material()?;
                let d = decode_param(&self.d, "d")?;
                let material: KeyMaterial = match &pk {
                    PublicKeyMaterial::EllipticCurve(pk) => ECKeyPair::from_bytes(pk.curve(), &d)
                        .map_err(|_| KeyGenError::InvalidJWK("invalid `d` parameter".to_string()))?
                        .into(),
                    PublicKeyMaterial::OctetKeyPair(pk) => OKPKeyPair::from_bytes(pk.curve(), &d)
                        .map_err(|_| KeyGenError::InvalidJWK("invalid `d` parameter".to_string()))?
                        .into(),
                    PublicKeyMaterial::Rsa(_) => bail!(KeyGenError::InternalError(
                        "unexpected RSA public key".to_string()
                    )),
                };
                ensure!(
                    material.public_key()? == pk,
                    KeyGenError::InvalidJWK("`d` does not match the public key".to_string())
                );
                material
            }
            kty => bail!(KeyGenError::InvalidJWK(format!(
                "unsupported key type `{}`",
                kty
            ))),
        };
        Ok(material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate;
    use crate::registry::{EcCurve, KeySpec, OkpCurve};

    fn alg(name: &str) -> Algorithm {
        Algorithm::from_name(name).unwrap()
    }

    #[test]
    fn oct() {
        let material = generate(KeySpec::Symmetric { bit_length: 256 }).unwrap();
        let jwk = to_jwk(&material, alg("HS256"), Some(KeyUse::Signature)).unwrap();
        assert_eq!(jwk.key_type, "oct");
        assert_eq!(jwk.k.as_ref().unwrap().len(), 43);
        assert_eq!(jwk.algorithm.as_deref(), Some("HS256"));
        assert!(jwk.key_use.is_none());
        assert!(jwk.public_jwk().is_err());

        let json = jwk.to_json().unwrap();
        assert!(json.starts_with("{\n  \"kty\": \"oct\""));
        assert!(!json.contains("\"use\""));

        let decoded = Jwk::from_json(&json).unwrap();
        assert_eq!(decoded, jwk);
        match (decoded.to_key_material().unwrap(), material) {
            (KeyMaterial::Symmetric(a), KeyMaterial::Symmetric(b)) => {
                assert_eq!(a.as_ref(), b.as_ref())
            }
            _ => panic!("expected symmetric keys"),
        }
    }

    #[test]
    fn rfc7638_thumbprint() {
        let jwk = Jwk {
            key_type: "RSA".to_string(),
            n: Some("0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw".to_string()),
            e: Some("AQAB".to_string()),
            algorithm: Some("RS256".to_string()),
            key_id: Some("2011-04-29".to_string()),
            ..Default::default()
        };
        assert_eq!(
            jwk.thumbprint().unwrap(),
            "NzbLsXh8uDCcd-6MNwXF4W_7noWXFZAfHkxZsRGC9Xs"
        );
    }

    #[test]
    fn ec() {
        for (curve, coordinate_len) in [
            (EcCurve::P256, 43),
            (EcCurve::Secp256k1, 43),
            (EcCurve::P384, 64),
            (EcCurve::P521, 88),
        ] {
            let material = generate(KeySpec::EllipticCurve { curve }).unwrap();
            let jwk = to_jwk(&material, alg("ECDH-ES"), Some(KeyUse::Encryption)).unwrap();
            assert_eq!(jwk.curve.as_deref(), Some(curve.name()));
            assert_eq!(jwk.x.as_ref().unwrap().len(), coordinate_len);
            assert_eq!(jwk.y.as_ref().unwrap().len(), coordinate_len);
            assert_eq!(jwk.d.as_ref().unwrap().len(), coordinate_len);
            assert_eq!(jwk.key_use, Some(KeyUse::Encryption));

            let decoded = Jwk::from_json(&jwk.to_json().unwrap()).unwrap();
            let reloaded = decoded.to_key_material().unwrap();
            match (&reloaded, &material) {
                (KeyMaterial::EllipticCurve(a), KeyMaterial::EllipticCurve(b)) => {
                    assert_eq!(a.to_bytes(), b.to_bytes())
                }
                _ => panic!("expected EC key pairs"),
            }
            assert_eq!(
                to_jwk(&reloaded, alg("ECDH-ES"), Some(KeyUse::Encryption)).unwrap(),
                jwk
            );

            let public_jwk = jwk.public_jwk().unwrap();
            assert!(public_jwk.d.is_none());
            assert!(!public_jwk.is_private());
            assert_eq!(
                public_jwk.to_public_key_material().unwrap(),
                material.public_key().unwrap()
            );
            assert_eq!(public_jwk.thumbprint().unwrap(), jwk.thumbprint().unwrap());
        }
    }

    #[test]
    fn okp() {
        for (curve, name) in [(OkpCurve::Ed25519, "EdDSA"), (OkpCurve::X25519, "ECDH-ES")] {
            let material = generate(KeySpec::OctetKeyPair { curve }).unwrap();
            let jwk = to_jwk(&material, alg(name), None).unwrap();
            assert_eq!(jwk.key_type, "OKP");
            assert_eq!(jwk.curve.as_deref(), Some(curve.name()));
            assert_eq!(jwk.x.as_ref().unwrap().len(), 43);
            assert!(jwk.y.is_none());

            let reloaded = jwk.to_key_material().unwrap();
            match (&reloaded, &material) {
                (KeyMaterial::OctetKeyPair(a), KeyMaterial::OctetKeyPair(b)) => {
                    assert_eq!(a.to_bytes(), b.to_bytes())
                }
                _ => panic!("expected OKP key pairs"),
            }
            assert_eq!(to_jwk(&reloaded, alg(name), None).unwrap(), jwk);

            let public_jwk =
                to_public_jwk(&material.public_key().unwrap(), alg(name), None).unwrap();
            assert_eq!(public_jwk, jwk.public_jwk().unwrap());
        }
    }

    #[test]
    fn rsa() {
        let material = generate(KeySpec::Rsa { modulus_bits: 2048 }).unwrap();
        let jwk = to_jwk(&material, alg("RS256"), Some(KeyUse::Signature)).unwrap();
        assert_eq!(jwk.e.as_deref(), Some("AQAB"));
        assert_eq!(jwk.n.as_ref().unwrap().len(), 342);
        for param in [&jwk.d, &jwk.p, &jwk.q, &jwk.dp, &jwk.dq, &jwk.qi] {
            assert!(param.is_some());
        }

        let json = jwk.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["use"], "sig");
        assert_eq!(value["alg"], "RS256");

        let reloaded = Jwk::from_json(&json).unwrap().to_key_material().unwrap();
        assert_eq!(reloaded.public_key().unwrap(), material.public_key().unwrap());
        assert_eq!(
            to_jwk(&reloaded, alg("RS256"), Some(KeyUse::Signature)).unwrap(),
            jwk
        );

        let mut tampered = jwk.clone();
        tampered.dp = tampered.dq.clone();
        assert!(tampered.to_key_material().is_err());
    }

    #[test]
    fn inconsistent_keys_are_rejected() {
        let a = to_jwk(
            &generate(KeySpec::EllipticCurve {
                curve: EcCurve::P256,
            })
            .unwrap(),
            alg("ES256"),
            None,
        )
        .unwrap();
        let b = to_jwk(
            &generate(KeySpec::EllipticCurve {
                curve: EcCurve::P256,
            })
            .unwrap(),
            alg("ES256"),
            None,
        )
        .unwrap();
        let mixed = Jwk { d: b.d.clone(), ..a };
        let err = mixed.to_key_material().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KeyGenError>(),
            Some(KeyGenError::InvalidJWK(_))
        ));

        let wrong_curve = Jwk {
            key_type: "OKP".to_string(),
            ..b.public_jwk().unwrap()
        };
        assert!(wrong_curve.to_public_key_material().is_err());

        assert!(Jwk::from_json("{\"crv\": \"P-256\"}").is_err());
        assert!(Jwk {
            key_type: "EC".to_string(),
            ..Default::default()
        }
        .to_key_material()
        .is_err());
    }
}

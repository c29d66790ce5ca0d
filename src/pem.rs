use ct_codecs::{Base64, Decoder, Encoder};
use zeroize::Zeroize;

use crate::error::*;
use crate::material::{KeyMaterial, PublicKeyMaterial};

pub const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";
pub const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

const LINE_LENGTH: usize = 64;

/// A DER document framed as RFC 7468 text
///
/// The text uses standard, padded base64, 64-character lines, LF line endings and a trailing
/// newline.
#[derive(Clone, PartialEq, Eq)]
pub struct Pem {
    label: String,
    der: Vec<u8>,
    text: String,
}

impl std::fmt::Debug for Pem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pem")
            .field("label", &self.label)
            .field("der_len", &self.der.len())
            .finish_non_exhaustive()
    }
}

impl Drop for Pem {
    fn drop(&mut self) {
        self.der.zeroize();
        self.text.zeroize();
    }
}

impl std::fmt::Display for Pem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl Pem {
    pub fn new(label: &str, der: Vec<u8>) -> Result<Self, Error> {
        let encoded = Base64::encode_to_string(&der)?;
        let mut text = String::with_capacity(encoded.len() + encoded.len() / LINE_LENGTH + 64);
        text.push_str(&format!("-----BEGIN {}-----\n", label));
        let mut rest = encoded.as_str();
        while !rest.is_empty() {
            let (line, tail) = rest.split_at(rest.len().min(LINE_LENGTH));
            text.push_str(line);
            text.push('\n');
            rest = tail;
        }
        text.push_str(&format!("-----END {}-----\n", label));
        Ok(Pem {
            label: label.to_string(),
            der,
            text,
        })
    }

    /// Parse a single PEM block. Surrounding whitespace and CRLF line endings are accepted.
    pub fn decode(text: &str) -> Result<Self, Error> {
        let mut lines = text.trim().lines().map(str::trim);
        let label = lines
            .next()
            .and_then(|line| line.strip_prefix("-----BEGIN "))
            .and_then(|line| line.strip_suffix("-----"))
            .ok_or(KeyGenError::InvalidPEM("missing BEGIN line"))?;
        let mut body = String::new();
        let mut terminated = false;
        for line in lines.by_ref() {
            if let Some(end) = line.strip_prefix("-----END ") {
                ensure!(
                    end.strip_suffix("-----") == Some(label),
                    KeyGenError::InvalidPEM("mismatched END line")
                );
                terminated = true;
                break;
            }
            body.push_str(line);
        }
        ensure!(terminated, KeyGenError::InvalidPEM("missing END line"));
        ensure!(
            lines.next().is_none(),
            KeyGenError::InvalidPEM("trailing data after END line")
        );
        let der = Base64::decode_to_vec(&body, None)
            .map_err(|_| KeyGenError::InvalidPEM("invalid base64 payload"))?;
        body.zeroize();
        Pem::new(label, der)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The DER payload
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl AsRef<str> for Pem {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// SubjectPublicKeyInfo encoding of the public half of `material`
///
/// Fails with `UnsupportedOperation` for symmetric keys.
pub fn to_spki(material: &KeyMaterial) -> Result<Pem, Error> {
    public_key_to_spki(&material.public_key()?)
}

pub fn public_key_to_spki(public_key: &PublicKeyMaterial) -> Result<Pem, Error> {
    let der = match public_key {
        PublicKeyMaterial::Rsa(pk) => pk.to_der()?,
        PublicKeyMaterial::EllipticCurve(pk) => pk.to_der()?,
        PublicKeyMaterial::OctetKeyPair(pk) => pk.to_der(),
    };
    Pem::new(PUBLIC_KEY_LABEL, der)
}

/// PKCS#8 encoding of a private key
///
/// Fails with `UnsupportedOperation` for symmetric keys.
pub fn to_pkcs8(material: &KeyMaterial) -> Result<Pem, Error> {
    let der = match material {
        KeyMaterial::Symmetric(_) => bail!(KeyGenError::UnsupportedOperation(
            "symmetric keys have no PKCS#8 representation"
        )),
        KeyMaterial::Rsa(key_pair) => key_pair.to_der()?,
        KeyMaterial::EllipticCurve(key_pair) => key_pair.to_der()?,
        KeyMaterial::OctetKeyPair(key_pair) => key_pair.to_der(),
    };
    Pem::new(PRIVATE_KEY_LABEL, der)
}

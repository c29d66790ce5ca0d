use crate::registry::Curve;

/// Overrides applied when resolving an algorithm into a key specification
#[derive(Clone, Debug, Default)]
pub struct GenerateOptions {
    /// RSA modulus length, in bits (2048, 3072 or 4096)
    ///
    /// Only meaningful for RSA-based algorithms. Defaults to 2048.
    pub modulus_bits: Option<usize>,

    /// Curve to use instead of the algorithm default
    ///
    /// `ECDH-ES` and its key wrapping variants accept `P-256`, `P-384`, `P-521` and `X25519`.
    /// Algorithms with a mandated curve only accept that curve.
    pub curve: Option<Curve>,
}

/// Output formats requested from `produce`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Formats {
    pub jwk: bool,
    pub pem: bool,
}

impl Formats {
    pub const JWK: Formats = Formats {
        jwk: true,
        pem: false,
    };

    pub const PEM: Formats = Formats {
        jwk: false,
        pem: true,
    };

    pub const ALL: Formats = Formats {
        jwk: true,
        pem: true,
    };

    pub fn is_empty(&self) -> bool {
        !self.jwk && !self.pem
    }
}

/// Additional features to enable during key production
#[derive(Clone, Debug, Default)]
pub struct ProduceOptions {
    /// Key generation overrides
    pub generate: GenerateOptions,

    /// Set the `kid` of every JWK to the RFC 7638 thumbprint of the key
    pub with_key_id: bool,
}

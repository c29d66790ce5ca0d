use rand::RngCore;

use crate::error::*;

mod ec;
mod oct;
mod okp;
mod rsa;

pub use self::ec::*;
pub use self::oct::*;
pub use self::okp::*;
pub use self::rsa::*;

/// Draws of a private scalar before giving up on a curve
const MAX_SCALAR_ATTEMPTS: usize = 16;

/// `len` random bytes, or a `GenerationFailure` if the entropy source fails
fn random_bytes<R: RngCore + ?Sized>(rng: &mut R, len: usize) -> Result<Vec<u8>, Error> {
    let mut raw = vec![0u8; len];
    rng.try_fill_bytes(&mut raw)
        .map_err(|e| KeyGenError::GenerationFailure(e.to_string()))?;
    Ok(raw)
}

//! Range draws and per-agent seed derivation.

use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

/// Uniform draw in `[min, max)`, collapsing to `min` when the range is empty.
pub fn draw_between(rng: &mut impl Rng, min: f64, max: f64) -> f64 {
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}

/// Derive a stable RNG seed for `agent` from a user-visible master seed.
#[must_use]
pub fn agent_seed(master_seed: u64, agent: &str) -> u64 {
    let mut mac = Hmac::<Sha256>::new_from_slice(&master_seed.to_le_bytes())
        .expect("64-bit seed is valid key");
    mac.update(agent.as_bytes());
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("digest slice length");
    u64::from_le_bytes(seed_bytes)
}

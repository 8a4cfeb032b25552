//! Domain-separated seed derivation.
//!
//! Every random decision in a game (pool draw, per-round reshuffle) gets its
//! own sub-seed derived from the session seed, so a snapshot restored at any
//! point replays the same sequence without storing RNG state.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash = (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Mix a session seed, an 8-byte domain tag, and a generation counter.
#[must_use]
pub fn derive_seed(seed: u64, domain: &[u8; 8], generation: u64) -> u64 {
    let mut buf = [0u8; 24];
    buf[..8].copy_from_slice(domain);
    buf[8..16].copy_from_slice(&seed.to_le_bytes());
    buf[16..].copy_from_slice(&generation.to_le_bytes());
    fnv1a64(&buf)
}

/// Build a `ChaCha20Rng` for one domain/generation pair.
#[must_use]
pub fn rng_for(seed: u64, domain: &[u8; 8], generation: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(derive_seed(seed, domain, generation))
}

//! Seeded randomness.
//!
//! The core never reaches for ambient randomness. Callers pass an RNG into
//! every stochastic call; batch layers derive one seed per trial so results
//! are independent of how trials are spread across threads.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// RNG used for battles.
pub type BattleRng = ChaCha8Rng;

/// Create a battle RNG from a seed.
#[must_use]
pub fn battle_rng(seed: u64) -> BattleRng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// SplitMix64 finalizer.
#[must_use]
pub const fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed for trial `trial` of the pair at roster positions `(i, j)`.
///
/// Stable for a given roster order, so re-running a tuning round against
/// modified stats replays the same random stream for every pair.
#[must_use]
pub fn derive_seed(base: u64, i: usize, j: usize, trial: u32) -> u64 {
    let pair = mix64(base ^ mix64(((i as u64) << 32) | j as u64));
    mix64(pair.wrapping_add(u64::from(trial)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = battle_rng(42);
        let mut b = battle_rng(42);
        let xs: Vec<u32> = (0..8).map(|_| a.gen()).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.gen()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_derived_seeds_differ() {
        let s = derive_seed(7, 0, 1, 0);
        assert_ne!(s, derive_seed(7, 1, 0, 0));
        assert_ne!(s, derive_seed(7, 0, 1, 1));
        assert_ne!(s, derive_seed(8, 0, 1, 0));
        assert_eq!(s, derive_seed(7, 0, 1, 0));
    }
}

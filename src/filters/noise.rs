//! Randomness for the `mutate` filter.
//!
//! Noise is counter-based: every pixel of every pass gets its own short
//! random stream derived from `(seed, pass, pixel index)`. A pass therefore
//! produces the same result no matter which thread visits which pixel, and
//! a fixed seed replays exactly.

use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;

use super::Filter;
use crate::color::Rgba;

// ============================================================================
// Entropy streams
// ============================================================================

/// A stream of uniform samples in `[0, 1)`.
pub trait Entropy {
    fn next_unit(&mut self) -> f32;
}

/// Linear congruential generator with MINSTD parameters.
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u64,
}

const MINSTD_MODULUS: u64 = 2_147_483_647;

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        // State must stay in 1..modulus
        SimpleRng {
            state: seed % (MINSTD_MODULUS - 1) + 1,
        }
    }

    /// Generate next random u32 (31 significant bits).
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state * 48271 % MINSTD_MODULUS;
        self.state as u32
    }
}

impl Entropy for SimpleRng {
    fn next_unit(&mut self) -> f32 {
        // Top 24 bits so the quotient is exact in f32 and never reaches 1.0
        (self.next_u32() >> 7) as f32 / (1u32 << 24) as f32
    }
}

/// SplitMix64 finalizer, used to spread correlated keys apart.
#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

// ============================================================================
// Noise sources
// ============================================================================

/// Hands out an independent entropy stream per pixel and pass.
///
/// Implement this to inject deterministic or scripted randomness.
pub trait NoiseSource: Sync {
    type Stream: Entropy;

    fn stream(&self, pass: u32, pixel: usize) -> Self::Stream;
}

/// Default noise source: a seed expanded through SplitMix64 into MINSTD
/// streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeededNoise {
    seed: u64,
}

impl SeededNoise {
    pub fn new(seed: u64) -> Self {
        SeededNoise { seed }
    }

    /// Seed from the process-level random state.
    pub fn from_entropy() -> Self {
        SeededNoise::new(RandomState::new().hash_one(0x5EED_u64))
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl NoiseSource for SeededNoise {
    type Stream = SimpleRng;

    fn stream(&self, pass: u32, pixel: usize) -> SimpleRng {
        let key = splitmix64(((pass as u64) << 40) ^ pixel as u64);
        SimpleRng::new(splitmix64(self.seed ^ key))
    }
}

impl<N: NoiseSource + ?Sized> NoiseSource for &N {
    type Stream = N::Stream;

    fn stream(&self, pass: u32, pixel: usize) -> Self::Stream {
        (**self).stream(pass, pixel)
    }
}

// ============================================================================
// Mutate filter
// ============================================================================

/// Per-pixel `mutate(decay)` drawing from a [`NoiseSource`].
#[derive(Debug, Clone, Copy)]
pub struct Mutate<N> {
    pub decay: f32,
    pub pass: u32,
    noise: N,
}

impl<N: NoiseSource> Mutate<N> {
    pub fn new(decay: f32, noise: N) -> Self {
        Mutate {
            decay,
            pass: 0,
            noise,
        }
    }

    /// Same filter keyed to a different pass, so repeated passes do not
    /// reuse the same perturbation.
    pub fn for_pass(self, pass: u32) -> Self {
        Mutate { pass, ..self }
    }
}

impl<N: NoiseSource> Filter for Mutate<N> {
    fn apply(&self, index: usize, color: Rgba) -> Rgba {
        let mut rng = self.noise.stream(self.pass, index);
        color.mutate(self.decay, &mut rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_unit_range() {
        let mut rng = SimpleRng::new(0);
        for _ in 0..10_000 {
            let v = rng.next_unit();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_rng_deterministic() {
        let mut a = SimpleRng::new(42);
        let mut b = SimpleRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn test_streams_differ_by_pixel_and_pass() {
        let noise = SeededNoise::new(9);
        let first = |pass, pixel| noise.stream(pass, pixel).next_u32();
        assert_eq!(first(0, 0), first(0, 0));
        assert_ne!(first(0, 0), first(0, 1));
        assert_ne!(first(0, 0), first(1, 0));
    }

    #[test]
    fn test_mutate_filter_replays() {
        let color = Rgba::opaque(100, 150, 200);
        let filter = Mutate::new(0.2, SeededNoise::new(3));
        for i in 0..50 {
            assert_eq!(filter.apply(i, color), filter.apply(i, color));
        }
        let changed = (0..50).filter(|&i| filter.apply(i, color) != color).count();
        assert!(changed > 40);
    }

    #[test]
    fn test_mutate_keeps_alpha() {
        let color = Rgba::new(100, 150, 200, 0.4);
        let filter = Mutate::new(1.0, SeededNoise::new(11)).for_pass(2);
        for i in 0..20 {
            assert_eq!(filter.apply(i, color).alpha(), 0.4);
        }
    }
}

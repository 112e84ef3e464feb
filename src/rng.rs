//! # Seeded RNG (spec §4.A)
//!
//! A reproducible uniform source owned by a single [`crate::context::GenerationContext`] —
//! never a process global. Built on `rand`'s `StdRng`, which is a fixed,
//! versioned PRNG algorithm (ChaCha-based in the `rand` 0.8 line): seeding it
//! with the same `u64` always reproduces the same stream on a given `rand`
//! version, which is what spec property 1 (determinism) and the byte-for-byte
//! S1 scenario require.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Deterministic, instance-owned random source.
#[derive(Clone)]
pub struct SeededRng {
    inner: StdRng,
    seed: u64,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        SeededRng {
            inner: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Resets the stream back to its initial state for this seed, without
    /// allocating a new `SeededRng` — used by
    /// [`crate::context::GenerationContext::reset`].
    pub fn reseed(&mut self) {
        self.inner = StdRng::seed_from_u64(self.seed);
    }

    /// Uniform float in `[0, 1)`.
    pub fn random(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform integer in `[min, max]` inclusive. Panics if `min > max` —
    /// callers resolve cardinality/range bounds before reaching here.
    pub fn random_int(&mut self, min: i64, max: i64) -> i64 {
        assert!(min <= max, "random_int: min {min} > max {max}");
        self.inner.gen_range(min..=max)
    }

    /// Uniform `f64` in `[min, max]`.
    pub fn random_decimal(&mut self, min: f64, max: f64) -> f64 {
        if (max - min).abs() < f64::EPSILON {
            return min;
        }
        self.inner.gen_range(min..max)
    }

    /// Picks a uniformly random element by index; returns `None` on an
    /// empty slice.
    pub fn random_choice<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.inner.gen_range(0..items.len());
        items.get(idx)
    }

    /// `true` with probability `p` (clamped to `[0, 1]`).
    pub fn coin(&mut self, p: f64) -> bool {
        self.random() < p.clamp(0.0, 1.0)
    }
}

/// Delegates to the inner `StdRng` so `SeededRng` satisfies `rand::Rng`
/// directly — this lets the `fake` crate's `fake_with_rng` draw from the
/// same deterministic stream as everything else in a generation run.
impl RngCore for SeededRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

impl fmt::Debug for SeededRng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeededRng").field("seed", &self.seed).finish()
    }
}

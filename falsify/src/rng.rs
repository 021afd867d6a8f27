//! Seeded deterministic random source.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Deterministic pseudo-random bit source backing every generator.
///
/// `Random` is `Clone`: the runner snapshots it before each iteration so a
/// failing draw can be reconstructed exactly when shrinking starts.
#[derive(Debug, Clone)]
pub struct Random {
    rng: StdRng,
}

impl Random {
    /// Create a source from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform 64-bit draw; every other draw is carved out of this one.
    pub fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() & 0xFFFF_FFFF) as u32
    }

    pub fn next_u16(&mut self) -> u16 {
        (self.next_u64() & 0xFFFF) as u16
    }

    pub fn next_u8(&mut self) -> u8 {
        (self.next_u64() & 0xFF) as u8
    }

    // Signed draws reinterpret the unsigned bits of the same width.

    pub fn next_i64(&mut self) -> i64 {
        self.next_u64() as i64
    }

    pub fn next_i32(&mut self) -> i32 {
        self.next_u32() as i32
    }

    pub fn next_i16(&mut self) -> i16 {
        self.next_u16() as i16
    }

    pub fn next_i8(&mut self) -> i8 {
        self.next_u8() as i8
    }

    /// Raw bit reinterpretation: may yield any pattern, including NaN and
    /// subnormals.
    pub fn next_f32(&mut self) -> f32 {
        f32::from_bits(self.next_u32())
    }

    /// Raw bit reinterpretation: may yield any pattern, including NaN and
    /// subnormals.
    pub fn next_f64(&mut self) -> f64 {
        f64::from_bits(self.next_u64())
    }

    /// Uniform draw in the half-open range `[low, high)`.
    pub fn size_in(&mut self, low: usize, high: usize) -> usize {
        assert!(low < high, "size_in requires low < high");
        low + (self.next_u64() as usize) % (high - low)
    }

    /// Biased boolean: `true` with the given probability.
    pub fn next_bool(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability.clamp(0.0, 1.0))
    }

    /// Fair coin.
    pub fn next_bool_uniform(&mut self) -> bool {
        self.next_u64() & 1 == 0
    }

    /// Uniform draw in `[0, 1)`, for weighted choices.
    pub fn fraction(&mut self) -> f64 {
        // 53 high bits give a full-precision mantissa
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

/// Seed for an unseeded run: wall-clock milliseconds since the epoch.
pub fn seed_from_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::normal::inverse_normal_cdf;

/// # Substream
/// A deterministic random substream. Each parallel task owns one,
/// initialised from a child seed drawn off its parent in a fixed order,
/// which makes every parallel phase reproducible for a given root seed.
///
/// ## Details
/// - Normal deviates come from inverse-transform sampling, so one
///   uniform draw yields one gaussian and streams stay aligned.
/// - Child seeds are uniform draws scaled to 32-bit unsigned range.
pub struct Substream {
    rng: StdRng,
}

impl Substream {
    pub fn new(seed: u64) -> Substream {
        Substream {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform float in `[0, 1)`.
    pub fn uniform(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    /// Uniform double in `[0, 1)`.
    pub fn uniform_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Standard-normal deviate via the inverse CDF.
    pub fn gauss(&mut self) -> f64 {
        inverse_normal_cdf(self.uniform_f64())
    }

    /// Uniform integer in `[lo, hi]` inclusive.
    pub fn uniform_int(&mut self, lo: i32, hi: i32) -> i32 {
        debug_assert!(lo <= hi);
        self.rng.gen_range(lo..=hi)
    }

    /// Uniform index into a collection of `len` elements.
    pub fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        self.rng.gen_range(0..len)
    }

    pub fn bernoulli(&mut self, p: f64) -> bool {
        self.uniform_f64() < p
    }

    /// One uniform draw scaled to 32-bit unsigned, the seed for a child
    /// substream.
    pub fn child_seed(&mut self) -> u64 {
        (self.uniform_f64() * f64::from(u32::MAX)) as u64
    }

    pub fn substream(&mut self) -> Substream {
        Substream::new(self.child_seed())
    }
}

//! Noise generators.

use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::Error;

// -------------------------------------------------------------------------------------------------

/// Sample-and-hold pink noise generator (Voss algorithm).
///
/// Sums `OCTAVES` uniform white noise sources, where octave `i` draws a new random value every
/// `2^i` samples. Octave 0 thus is plain white noise. Output stays within `[min, max)`.
#[derive(Debug, Clone)]
pub struct PinkNoise {
    rng: SmallRng,
    min: f32,
    max: f32,
    values: [f32; Self::OCTAVES],
    counters: [u32; Self::OCTAVES],
}

impl PinkNoise {
    const OCTAVES: usize = 6;

    /// Create a new generator with values in range `[min, max)`. When no seed is given, the
    /// generator gets seeded from OS entropy.
    pub fn new(min: f32, max: f32, seed: Option<u64>) -> Result<Self, Error> {
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(Error::ParameterError(format!(
                "Invalid pink noise range: [{min}, {max})"
            )));
        }
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        let mut noise = Self {
            rng,
            min,
            max,
            values: [0.0; Self::OCTAVES],
            counters: [0; Self::OCTAVES],
        };
        noise.reset();
        Ok(noise)
    }

    /// Draw new initial values for all octaves and restart their hold counters.
    pub fn reset(&mut self) {
        for octave in 0..Self::OCTAVES {
            self.values[octave] = self.rng.random_range(self.min..self.max);
            // stagger octaves, so their updates don't all coincide
            self.counters[octave] = Self::hold_time(octave) / 2;
        }
    }

    /// Generate the next noise sample.
    pub fn next(&mut self) -> f32 {
        let mut output = 0.0;
        for octave in 0..Self::OCTAVES {
            output += self.values[octave];
            self.counters[octave] += 1;
            if self.counters[octave] >= Self::hold_time(octave) {
                self.counters[octave] = 0;
                self.values[octave] = self.rng.random_range(self.min..self.max);
            }
        }
        output / Self::OCTAVES as f32
    }

    /// Fill the given buffer with noise.
    pub fn fill(&mut self, output: &mut [f32]) {
        for sample in output {
            *sample = self.next();
        }
    }

    #[inline]
    const fn hold_time(octave: usize) -> u32 {
        1 << octave
    }
}

// -------------------------------------------------------------------------------------------------

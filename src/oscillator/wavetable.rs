use std::f64::consts::PI;

use crate::Error;

// -------------------------------------------------------------------------------------------------

/// Waveform types for wavetables.
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
    strum::EnumIter,
)]
pub enum WaveformType {
    #[default]
    Sine,
    Triangle,
    Sawtooth,
    Square,
}

// -------------------------------------------------------------------------------------------------

/// A single cycle waveform, sampled into a table of `size + 1` samples.
///
/// The last sample is a guard point which duplicates the first one, so linear interpolation
/// never needs to wrap its second read position. Non sine waveforms are summed up from a
/// limited number of harmonics, which keeps them band-limited.
#[derive(Debug, Clone)]
pub struct Wavetable {
    waveform: WaveformType,
    harmonics: usize,
    data: Vec<f32>,
}

impl Wavetable {
    pub const MIN_SIZE: usize = 16;
    pub const MAX_SIZE: usize = 65536;

    pub fn new(waveform: WaveformType, size: usize, harmonics: usize) -> Result<Self, Error> {
        if !size.is_power_of_two() || !(Self::MIN_SIZE..=Self::MAX_SIZE).contains(&size) {
            return Err(Error::ParameterError(format!(
                "Wavetable size must be a power of two in range [{}, {}], but is {size}",
                Self::MIN_SIZE,
                Self::MAX_SIZE
            )));
        }
        if harmonics < 1 || harmonics > size / 2 {
            return Err(Error::ParameterError(format!(
                "Wavetable harmonics must be in range [1, {}], but is {harmonics}",
                size / 2
            )));
        }
        let mut wavetable = Self {
            waveform,
            harmonics,
            data: vec![0.0; size + 1],
        };
        wavetable.set_waveform(waveform, true);
        Ok(wavetable)
    }

    /// Number of samples in one cycle, excluding the guard point.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.data.len() - 1
    }

    pub fn waveform(&self) -> WaveformType {
        self.waveform
    }

    pub fn harmonics(&self) -> usize {
        self.harmonics
    }

    /// Raw table data, including the guard point.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Regenerate the table with the given waveform, when it differs from the current one or
    /// `force` is set. Returns true when the table got regenerated.
    pub fn set_waveform(&mut self, waveform: WaveformType, force: bool) -> bool {
        if waveform == self.waveform && !force {
            return false;
        }
        self.waveform = waveform;
        let size = self.size();
        let step = 2.0 * PI / size as f64;
        match waveform {
            WaveformType::Sine => {
                for (index, value) in self.data[..size].iter_mut().enumerate() {
                    *value = (index as f64 * step).sin() as f32;
                }
            }
            WaveformType::Triangle | WaveformType::Sawtooth | WaveformType::Square => {
                let mut peak = 0.0f64;
                let mut samples = vec![0.0f64; size];
                for (index, sample) in samples.iter_mut().enumerate() {
                    let x = index as f64 * step;
                    *sample = (1..=self.harmonics)
                        .map(|k| Self::partial(waveform, k) * (k as f64 * x).sin())
                        .sum();
                    peak = peak.max(sample.abs());
                }
                // harmonic sums overshoot (Gibbs), so normalize to a peak of 1
                let gain = if peak > 0.0 { 1.0 / peak } else { 1.0 };
                for (value, sample) in self.data[..size].iter_mut().zip(samples) {
                    *value = (sample * gain) as f32;
                }
            }
        }
        self.data[size] = self.data[0];
        true
    }

    /// Linearly interpolated table value at the given phase in table index units.
    /// Phase must be in range `[0, size)`.
    #[inline]
    pub fn interpolate(&self, phase: f64) -> f32 {
        debug_assert!(
            phase >= 0.0 && phase < self.size() as f64,
            "Invalid wavetable phase: {phase}"
        );
        let index = phase as usize;
        let fraction = (phase - index as f64) as f32;
        let a = self.data[index];
        let b = self.data[index + 1];
        a + (b - a) * fraction
    }

    // Fourier series amplitude of the k-th sine harmonic.
    fn partial(waveform: WaveformType, k: usize) -> f64 {
        let kf = k as f64;
        match waveform {
            WaveformType::Sine => {
                if k == 1 {
                    1.0
                } else {
                    0.0
                }
            }
            WaveformType::Sawtooth => {
                let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
                sign * 2.0 / (PI * kf)
            }
            WaveformType::Square => {
                if k % 2 == 1 {
                    4.0 / (PI * kf)
                } else {
                    0.0
                }
            }
            WaveformType::Triangle => {
                if k % 2 == 1 {
                    let sign = if (k / 2) % 2 == 0 { 1.0 } else { -1.0 };
                    sign * 8.0 / (PI * PI * kf * kf)
                } else {
                    0.0
                }
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn guard_point() -> Result<(), Error> {
        for waveform in WaveformType::iter() {
            let table = Wavetable::new(waveform, 256, 8)?;
            assert_eq!(table.data().len(), 257);
            assert_eq!(table.data()[256], table.data()[0]);
            let peak = table.data().iter().fold(0.0f32, |p, v| p.max(v.abs()));
            assert!((peak - 1.0).abs() < 1e-3, "{waveform} peak is {peak}");
        }
        Ok(())
    }

    #[test]
    fn regeneration() -> Result<(), Error> {
        let mut table = Wavetable::new(WaveformType::Sine, 64, 4)?;
        assert!(!table.set_waveform(WaveformType::Sine, false));
        assert!(table.set_waveform(WaveformType::Sine, true));
        assert!(table.set_waveform(WaveformType::Square, false));
        assert_eq!(table.waveform(), WaveformType::Square);
        assert!(!table.set_waveform(WaveformType::Square, false));
        // square is symmetric: positive first half, negative second half
        assert!(table.data()[16] > 0.5);
        assert!(table.data()[48] < -0.5);
        Ok(())
    }

    #[test]
    fn interpolation() -> Result<(), Error> {
        let table = Wavetable::new(WaveformType::Sine, 1024, 1)?;
        assert_eq!(table.interpolate(0.0), 0.0);
        assert!((table.interpolate(256.0) - 1.0).abs() < 1e-6);
        let a = table.data()[100];
        let b = table.data()[101];
        assert!((table.interpolate(100.5) - (a + b) / 2.0).abs() < 1e-6);
        // reads the guard point
        assert!(table.interpolate(1023.9).abs() < 0.01);
        Ok(())
    }

    #[test]
    fn rejects_invalid_sizes() {
        assert!(Wavetable::new(WaveformType::Sine, 1000, 1).is_err());
        assert!(Wavetable::new(WaveformType::Sine, 8, 1).is_err());
        assert!(Wavetable::new(WaveformType::Sine, 64, 0).is_err());
        assert!(Wavetable::new(WaveformType::Sine, 64, 33).is_err());
        assert!(Wavetable::new(WaveformType::Sine, 64, 32).is_ok());
    }
}

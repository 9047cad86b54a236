//! Wavetable oscillators, which render the partials of a sinusoidal model.

use std::sync::Arc;

use crate::utils::{smoothed::LinearSmoothedValue, SmoothedValue};

// -------------------------------------------------------------------------------------------------

pub mod wavetable;

pub use wavetable::{WaveformType, Wavetable};

// -------------------------------------------------------------------------------------------------

/// Linear interpolating wavetable oscillator with amplitude and frequency glides.
///
/// The wavetable is shared with other oscillators. Oscillators never modify it: to switch
/// waveforms, assign a new table via [`Oscillator::set_wavetable`].
#[derive(Debug, Clone)]
pub struct Oscillator {
    wavetable: Arc<Wavetable>,
    sample_rate: u32,
    size_over_sample_rate: f64,
    phase: f64,
    reference_phase: f32,
    amplitude: LinearSmoothedValue,
    frequency: LinearSmoothedValue,
}

impl Oscillator {
    pub fn new(wavetable: Arc<Wavetable>, sample_rate: u32) -> Self {
        debug_assert!(sample_rate > 0, "Invalid sample rate");
        let size_over_sample_rate = wavetable.size() as f64 / sample_rate as f64;
        Self {
            wavetable,
            sample_rate,
            size_over_sample_rate,
            phase: 0.0,
            reference_phase: 0.0,
            amplitude: LinearSmoothedValue::new(0.0),
            frequency: LinearSmoothedValue::new(0.0),
        }
    }

    pub fn wavetable(&self) -> &Arc<Wavetable> {
        &self.wavetable
    }

    /// Switch to a new wavetable, keeping the phase position within the cycle.
    pub fn set_wavetable(&mut self, wavetable: Arc<Wavetable>) {
        let old_size = self.wavetable.size() as f64;
        let new_size = wavetable.size() as f64;
        self.phase = (self.phase / old_size * new_size).rem_euclid(new_size);
        self.size_over_sample_rate = new_size / self.sample_rate as f64;
        self.wavetable = wavetable;
    }

    /// Current, possibly gliding, amplitude.
    pub fn amplitude(&self) -> f32 {
        self.amplitude.current()
    }

    /// Current, possibly gliding, frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency.current()
    }

    /// Running phase in turns, in range `[0, 1)`.
    pub fn phase(&self) -> f32 {
        (self.phase / self.wavetable.size() as f64) as f32
    }

    /// Last phase in turns, reported by the analysis for this oscillator's partial.
    pub fn reference_phase(&self) -> f32 {
        self.reference_phase
    }

    pub fn is_gliding(&self) -> bool {
        self.amplitude.need_ramp() || self.frequency.need_ramp()
    }

    /// Immediately apply the given parameters and restart the phase. Phase is given in turns of
    /// the table cycle, so 0 starts a sine table at its zero crossing.
    pub fn start(&mut self, amplitude: f32, frequency: f32, phase: f32) {
        self.amplitude.init(self.clamp_amplitude(amplitude));
        self.frequency.init(self.clamp_frequency(frequency));
        self.reference_phase = crate::utils::wrap_phase(phase);
        self.phase = self.reference_phase as f64 * self.wavetable.size() as f64;
    }

    /// Immediately silence the oscillator.
    pub fn stop(&mut self) {
        self.amplitude.init(0.0);
        self.frequency.init(0.0);
    }

    /// Glide towards the given amplitude and frequency in `num_steps` calls to [`Self::next`].
    /// The running phase stays continuous: the given phase is memorized as reference only.
    pub fn update(&mut self, amplitude: f32, frequency: f32, phase: f32, num_steps: u32) {
        self.amplitude
            .set_target_with_duration(self.clamp_amplitude(amplitude), Some(num_steps));
        self.frequency
            .set_target_with_duration(self.clamp_frequency(frequency), Some(num_steps));
        self.reference_phase = crate::utils::wrap_phase(phase);
    }

    /// Generate the next output sample and advance the phase.
    #[inline]
    pub fn next(&mut self) -> f32 {
        let sample = self.wavetable.interpolate(self.phase);
        let amplitude = self.amplitude.next();
        let frequency = self.frequency.next();
        self.phase += frequency as f64 * self.size_over_sample_rate;
        let size = self.wavetable.size() as f64;
        if self.phase >= size {
            self.phase = self.phase.rem_euclid(size);
        }
        sample * amplitude
    }

    fn clamp_amplitude(&self, amplitude: f32) -> f32 {
        if amplitude.is_finite() {
            amplitude.max(0.0)
        } else {
            0.0
        }
    }

    fn clamp_frequency(&self, frequency: f32) -> f32 {
        if frequency.is_finite() {
            frequency.clamp(0.0, self.sample_rate as f32 / 2.0)
        } else {
            0.0
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn table_walk() -> Result<(), Error> {
        // one table sample per output sample
        let table = Arc::new(Wavetable::new(WaveformType::Sine, 2048, 1)?);
        let mut osc = Oscillator::new(Arc::clone(&table), 2048);
        osc.start(1.0, 1.0, 0.0);
        for i in 0..4096 {
            let expected = (2.0 * std::f64::consts::PI * i as f64 / 2048.0).sin() as f32;
            assert!((osc.next() - expected).abs() < 1e-5);
            assert!((0.0..1.0).contains(&osc.phase()));
        }
        Ok(())
    }

    #[test]
    fn glide_reaches_targets() -> Result<(), Error> {
        let table = Arc::new(Wavetable::new(WaveformType::Sine, 512, 1)?);
        let mut osc = Oscillator::new(table, 44100);
        osc.start(0.5, 440.0, 0.25);
        assert_eq!(osc.amplitude(), 0.5);
        assert_eq!(osc.frequency(), 440.0);
        assert!((osc.phase() - 0.25).abs() < 1e-6);

        osc.update(1.0, 880.0, 0.75, 128);
        assert!(osc.is_gliding());
        assert_eq!(osc.reference_phase(), 0.75);
        for _ in 0..127 {
            let _ = osc.next();
            assert!(osc.amplitude() < 1.0 && osc.frequency() < 880.0);
        }
        let _ = osc.next();
        assert!(!osc.is_gliding());
        assert_eq!(osc.amplitude(), 1.0);
        assert_eq!(osc.frequency(), 880.0);
        Ok(())
    }

    #[test]
    fn clamps_parameters() -> Result<(), Error> {
        let table = Arc::new(Wavetable::new(WaveformType::Sine, 512, 1)?);
        let mut osc = Oscillator::new(table, 48000);
        osc.start(-1.0, 96000.0, 1.5);
        assert_eq!(osc.amplitude(), 0.0);
        assert_eq!(osc.frequency(), 24000.0);
        assert!((osc.phase() - 0.5).abs() < 1e-6);
        osc.update(f32::NAN, f32::INFINITY, 0.0, 0);
        assert_eq!(osc.amplitude(), 0.0);
        assert_eq!(osc.frequency(), 0.0);
        Ok(())
    }

    #[test]
    fn stop_silences() -> Result<(), Error> {
        let table = Arc::new(Wavetable::new(WaveformType::Square, 512, 8)?);
        let mut osc = Oscillator::new(table, 44100);
        osc.start(1.0, 1000.0, 0.1);
        assert!(osc.next() != 0.0);
        osc.stop();
        for _ in 0..64 {
            assert_eq!(osc.next(), 0.0);
        }
        Ok(())
    }

    #[test]
    fn wavetable_switch_keeps_phase() -> Result<(), Error> {
        let sine = Arc::new(Wavetable::new(WaveformType::Sine, 512, 1)?);
        let saw = Arc::new(Wavetable::new(WaveformType::Sawtooth, 2048, 16)?);
        let mut osc = Oscillator::new(sine, 44100);
        osc.start(1.0, 100.0, 0.3);
        osc.set_wavetable(saw);
        assert_eq!(osc.wavetable().size(), 2048);
        assert!((osc.phase() - 0.3).abs() < 1e-6);
        Ok(())
    }
}

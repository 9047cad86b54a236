//! Short time Fourier analysis and overlap-add resynthesis of a sample stream.

use std::{f32::consts::TAU, sync::Arc};

use realfft::{num_complex::Complex, ComplexToReal, RealFftPlanner, RealToComplex};

use crate::{
    utils::{db_to_linear, linear_to_db, wrap_phase, RingBuffer, WindowType},
    Error,
};

// -------------------------------------------------------------------------------------------------

/// Direction of a spectral transform.
#[derive(Debug, Copy, Clone, PartialEq, Eq, strum::Display)]
pub enum Transform {
    /// Waveform to spectrum.
    Fft,
    /// Spectrum to waveform.
    Ifft,
}

/// The domain an [`Analysis`] currently holds its data in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, strum::Display)]
pub enum AnalysisState {
    Waveform,
    Spectrum,
}

/// Per bin values which can be read from and written into an [`Analysis`] spectrum.
#[derive(Debug, Copy, Clone, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum BinParameter {
    /// Real part of the complex bin.
    Real,
    /// Imaginary part of the complex bin.
    Imag,
    /// Linear amplitude, not normalized.
    Amplitude,
    /// Normalized amplitude in decibels.
    Magnitude,
    /// Phase in turns, `[0, 1)`.
    Phase,
    /// Bin center frequency in Hz. Read only.
    Frequency,
}

// -------------------------------------------------------------------------------------------------

/// Read-only view of the most recently analysed spectral frame.
#[derive(Debug, Copy, Clone)]
pub struct Frame<'a> {
    /// Linear amplitudes, `2 * |X| / (num_bins - 1)`.
    pub amplitudes: &'a [f32],
    /// Normalized amplitudes in decibels.
    pub magnitudes: &'a [f32],
    /// Phases in turns.
    pub phases: &'a [f32],
    /// Bin center frequencies in Hz.
    pub frequencies: &'a [f32],
    /// Factor which normalizes the frame's loudest bin amplitude to 1.
    pub norm_factor: f32,
    /// Inverse of `norm_factor`.
    pub denorm_factor: f32,
}

impl Frame<'_> {
    /// Number of bins in the frame.
    pub fn len(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amplitudes.is_empty()
    }
}

// -------------------------------------------------------------------------------------------------

/// Streaming STFT analysis with overlap-add resynthesis.
///
/// Samples are pushed in one by one with [`Analysis::write`]. Whenever a new frame got
/// completed, the last `window_size` input samples can be transformed into a spectrum with
/// [`Analysis::transform`]. A (possibly modified) spectrum can then be transformed back and is
/// overlap-added into an output buffer, which gets drained via [`Analysis::read`].
///
/// All buffers are allocated in `new`: writing, transforming and reading never allocate.
pub struct Analysis {
    window_type: WindowType,
    window_size: usize,
    hop_size: usize,
    transform_size: usize,
    num_bins: usize,
    sample_rate: u32,
    window: Vec<f32>,
    window_sum: f32,
    input: RingBuffer<f32>,
    output: RingBuffer<f32>,
    appetite: usize,
    num_pending: usize,
    num_frames: u64,
    state: AnalysisState,
    forward: Arc<dyn RealToComplex<f32>>,
    inverse: Arc<dyn ComplexToReal<f32>>,
    signal: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    inverse_spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    amplitudes: Vec<f32>,
    magnitudes: Vec<f32>,
    phases: Vec<f32>,
    frequencies: Vec<f32>,
    norm_factor: f32,
    denorm_factor: f32,
}

impl Analysis {
    pub const MIN_WINDOW_SIZE: usize = 64;
    pub const MAX_WINDOW_SIZE: usize = 32768;

    /// Frames with a loudest bin below this level are not normalized.
    const SILENCE_FLOOR_DB: f32 = -120.0;
    /// Added to normalized amplitudes before converting them to decibels.
    const MAGNITUDE_EPSILON: f32 = 1e-7;

    /// Create a new analysis with the given window type and size, hop size factor and sample
    /// rate. With `zero_padding`, frames are padded to twice the window size before they get
    /// transformed, which doubles the spectral resolution.
    pub fn new(
        window_type: WindowType,
        window_size: usize,
        hop_factor: usize,
        sample_rate: u32,
        zero_padding: bool,
    ) -> Result<Self, Error> {
        if !window_size.is_power_of_two()
            || !(Self::MIN_WINDOW_SIZE..=Self::MAX_WINDOW_SIZE).contains(&window_size)
        {
            return Err(Error::ParameterError(format!(
                "Window size must be a power of two in range [{}, {}], but is {window_size}",
                Self::MIN_WINDOW_SIZE,
                Self::MAX_WINDOW_SIZE
            )));
        }
        if !hop_factor.is_power_of_two() || hop_factor > window_size {
            return Err(Error::ParameterError(format!(
                "Hop factor must be a power of two <= {window_size}, but is {hop_factor}"
            )));
        }
        if sample_rate == 0 {
            return Err(Error::ParameterError("Sample rate must be > 0".to_string()));
        }

        let hop_size = window_size / hop_factor;
        let transform_size = if zero_padding {
            window_size * 2
        } else {
            window_size
        };
        let num_bins = transform_size / 2 + 1;

        let window = window_type.generate(window_size);
        let window_sum = window.iter().sum::<f32>();
        if window_sum <= 0.0 {
            return Err(Error::ParameterError(format!(
                "{window_type} window has no energy"
            )));
        }

        let mut planner = RealFftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(transform_size);
        let inverse = planner.plan_fft_inverse(transform_size);
        let scratch_len = forward.get_scratch_len().max(inverse.get_scratch_len());

        let bin_width = sample_rate as f32 / transform_size as f32;
        let frequencies = (0..num_bins)
            .map(|bin| bin as f32 * bin_width)
            .collect::<Vec<_>>();

        log::debug!(
            "Analysis: {window_type} window of {window_size} samples, hop {hop_size}, \
            transform size {transform_size}, {num_bins} bins at {sample_rate} Hz"
        );

        Ok(Self {
            window_type,
            window_size,
            hop_size,
            transform_size,
            num_bins,
            sample_rate,
            window,
            window_sum,
            input: RingBuffer::new(window_size)?,
            output: RingBuffer::new(window_size * 2)?,
            appetite: window_size,
            num_pending: 0,
            num_frames: 0,
            state: AnalysisState::Waveform,
            forward,
            inverse,
            signal: vec![0.0; transform_size],
            spectrum: vec![Complex::default(); num_bins],
            inverse_spectrum: vec![Complex::default(); num_bins],
            scratch: vec![Complex::default(); scratch_len],
            amplitudes: vec![0.0; num_bins],
            magnitudes: vec![linear_to_db(Self::MAGNITUDE_EPSILON); num_bins],
            phases: vec![0.0; num_bins],
            frequencies,
            norm_factor: 1.0,
            denorm_factor: 1.0,
        })
    }

    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Size of the transform, which is twice the window size when zero padding is enabled.
    pub fn transform_size(&self) -> usize {
        self.transform_size
    }

    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frequency distance between two adjacent bins in Hz.
    pub fn bin_width(&self) -> f32 {
        self.sample_rate as f32 / self.transform_size as f32
    }

    /// The analysis window.
    pub fn window(&self) -> &[f32] {
        &self.window
    }

    /// Factor which compensates the amplitude loss of the analysis window: a sinusoid with
    /// amplitude `a` shows up with a bin amplitude of `a / window_gain()`.
    pub fn window_gain(&self) -> f32 {
        (self.num_bins - 1) as f32 / self.window_sum
    }

    /// Delay in samples between a written and the corresponding resynthesized sample.
    pub fn latency(&self) -> usize {
        self.window_size
    }

    pub fn state(&self) -> AnalysisState {
        self.state
    }

    /// Number of forward transforms since creation or the last reset.
    pub fn num_frames(&self) -> u64 {
        self.num_frames
    }

    /// Access to the most recent frame's bin values.
    pub fn frame(&self) -> Frame<'_> {
        Frame {
            amplitudes: &self.amplitudes,
            magnitudes: &self.magnitudes,
            phases: &self.phases,
            frequencies: &self.frequencies,
            norm_factor: self.norm_factor,
            denorm_factor: self.denorm_factor,
        }
    }

    /// Rewind to the initial state: clears all buffers and the current frame.
    pub fn reset(&mut self) {
        self.input.clear();
        self.output.clear();
        self.appetite = self.window_size;
        self.num_pending = 0;
        self.num_frames = 0;
        self.state = AnalysisState::Waveform;
        self.spectrum.fill(Complex::default());
        self.amplitudes.fill(0.0);
        self.magnitudes.fill(linear_to_db(Self::MAGNITUDE_EPSILON));
        self.phases.fill(0.0);
        self.norm_factor = 1.0;
        self.denorm_factor = 1.0;
    }

    /// Push a new input sample. Returns true when a new frame is ready to be transformed,
    /// which is the case after the first `window_size` samples and then every `hop_size`
    /// samples.
    #[inline]
    pub fn write(&mut self, sample: f32) -> bool {
        self.input.write(sample);
        // keep the read cursor on the oldest sample of the window
        self.input.skip(1);
        self.num_pending += 1;
        if self.num_pending >= self.appetite {
            self.num_pending = 0;
            self.appetite = self.hop_size;
            true
        } else {
            false
        }
    }

    /// Pull the next resynthesized output sample. Call once per [`Self::write`], after the
    /// transforms of the same sample got applied.
    #[inline]
    pub fn read(&mut self) -> f32 {
        let sample = self.output.take();
        // keep the write cursor on the next sample to read, so overlap-add offsets are
        // relative to it
        self.output.advance(1);
        sample
    }

    /// Run the forward or inverse transform.
    ///
    /// Panics when the analysis is not in the state the transform expects: [`Transform::Fft`]
    /// requires [`AnalysisState::Waveform`], [`Transform::Ifft`] requires
    /// [`AnalysisState::Spectrum`]. On FFT failures, the state still changes, but the frame
    /// gets skipped.
    pub fn transform(&mut self, transform: Transform) -> Result<(), Error> {
        match transform {
            Transform::Fft => {
                assert!(
                    self.state == AnalysisState::Waveform,
                    "FFT requires the analysis to be in waveform state"
                );
                self.state = AnalysisState::Spectrum;
                self.num_frames += 1;
                self.forward_transform()
            }
            Transform::Ifft => {
                assert!(
                    self.state == AnalysisState::Spectrum,
                    "IFFT requires the analysis to be in spectrum state"
                );
                self.state = AnalysisState::Waveform;
                self.inverse_transform()
            }
        }
    }

    /// Return to waveform state without resynthesizing the current spectrum.
    pub fn release(&mut self) {
        assert!(
            self.state == AnalysisState::Spectrum,
            "Release requires the analysis to be in spectrum state"
        );
        self.state = AnalysisState::Waveform;
    }

    /// Write a sample, transform forward and back when a frame got completed and read the
    /// next output sample: a plain STFT passthrough.
    pub fn process(&mut self, sample: f32) -> f32 {
        if self.write(sample) {
            if let Err(err) = self.transform(Transform::Fft) {
                log::warn!("Forward transform failed: {err}");
            }
            if let Err(err) = self.transform(Transform::Ifft) {
                log::warn!("Inverse transform failed: {err}");
            }
        }
        self.read()
    }

    /// Read a bin value from the current frame.
    pub fn get(&self, index: usize, parameter: BinParameter) -> Result<f32, Error> {
        self.check_bin_index(index)?;
        let value = match parameter {
            BinParameter::Real => self.spectrum[index].re,
            BinParameter::Imag => self.spectrum[index].im,
            BinParameter::Amplitude => self.amplitudes[index],
            BinParameter::Magnitude => self.magnitudes[index],
            BinParameter::Phase => self.phases[index],
            BinParameter::Frequency => self.frequencies[index],
        };
        Ok(value)
    }

    /// Modify a bin value in the current frame. Amplitude, magnitude and phase changes are
    /// written back into the complex spectrum, so they apply to the next inverse transform.
    pub fn set(&mut self, index: usize, parameter: BinParameter, value: f32) -> Result<(), Error> {
        self.check_bin_index(index)?;
        if !value.is_finite() {
            return Err(Error::ParameterError(format!(
                "Bin {parameter} value must be finite, but is {value}"
            )));
        }
        match parameter {
            BinParameter::Real => {
                self.spectrum[index].re = value;
                self.update_bin_from_spectrum(index);
            }
            BinParameter::Imag => {
                self.spectrum[index].im = value;
                self.update_bin_from_spectrum(index);
            }
            BinParameter::Amplitude => {
                let amplitude = value.max(0.0);
                self.amplitudes[index] = amplitude;
                self.magnitudes[index] =
                    linear_to_db(amplitude * self.norm_factor + Self::MAGNITUDE_EPSILON);
                self.update_spectrum_from_bin(index);
            }
            BinParameter::Magnitude => {
                self.magnitudes[index] = value;
                self.amplitudes[index] = db_to_linear(value) * self.denorm_factor;
                self.update_spectrum_from_bin(index);
            }
            BinParameter::Phase => {
                self.phases[index] = wrap_phase(value);
                self.update_spectrum_from_bin(index);
            }
            BinParameter::Frequency => {
                return Err(Error::ParameterError("Bin frequencies are read-only".to_string()));
            }
        }
        Ok(())
    }

    fn check_bin_index(&self, index: usize) -> Result<(), Error> {
        if index >= self.num_bins {
            return Err(Error::BinIndexOutOfRange {
                index,
                num_bins: self.num_bins,
            });
        }
        Ok(())
    }

    fn amplitude_scale(&self) -> f32 {
        2.0 / (self.num_bins - 1) as f32
    }

    fn update_bin_from_spectrum(&mut self, index: usize) {
        let bin = self.spectrum[index];
        let amplitude = bin.norm() * self.amplitude_scale();
        self.amplitudes[index] = amplitude;
        self.magnitudes[index] =
            linear_to_db(amplitude * self.norm_factor + Self::MAGNITUDE_EPSILON);
        self.phases[index] = wrap_phase(bin.im.atan2(bin.re) / TAU);
    }

    fn update_spectrum_from_bin(&mut self, index: usize) {
        let norm = self.amplitudes[index] / self.amplitude_scale();
        self.spectrum[index] = Complex::from_polar(norm, self.phases[index] * TAU);
    }

    fn forward_transform(&mut self) -> Result<(), Error> {
        self.signal.fill(0.0);
        for (index, (sample, window)) in self.signal[..self.window_size]
            .iter_mut()
            .zip(&self.window)
            .enumerate()
        {
            *sample = self.input.peek(index) * window;
        }

        let scratch_len = self.forward.get_scratch_len();
        if let Err(err) = self.forward.process_with_scratch(
            &mut self.signal,
            &mut self.spectrum,
            &mut self.scratch[..scratch_len],
        ) {
            log::error!("Failed to process forward FFT: {err}");
            self.spectrum.fill(Complex::default());
            self.amplitudes.fill(0.0);
            self.magnitudes.fill(linear_to_db(Self::MAGNITUDE_EPSILON));
            self.phases.fill(0.0);
            self.norm_factor = 1.0;
            self.denorm_factor = 1.0;
            return Err(err.into());
        }

        let scale = self.amplitude_scale();
        let mut max_amplitude = 0.0f32;
        for (index, bin) in self.spectrum.iter().enumerate() {
            let amplitude = bin.norm() * scale;
            self.amplitudes[index] = amplitude;
            self.phases[index] = wrap_phase(bin.im.atan2(bin.re) / TAU);
            if index > 0 && index < self.num_bins - 1 {
                max_amplitude = max_amplitude.max(amplitude);
            }
        }
        if linear_to_db(max_amplitude) < Self::SILENCE_FLOOR_DB {
            self.norm_factor = 1.0;
            self.denorm_factor = 1.0;
        } else {
            self.norm_factor = 1.0 / max_amplitude;
            self.denorm_factor = max_amplitude;
        }
        for (magnitude, amplitude) in self.magnitudes.iter_mut().zip(&self.amplitudes) {
            *magnitude = linear_to_db(amplitude * self.norm_factor + Self::MAGNITUDE_EPSILON);
        }
        Ok(())
    }

    fn inverse_transform(&mut self) -> Result<(), Error> {
        self.inverse_spectrum.copy_from_slice(&self.spectrum);
        // DC and Nyquist bins of a real signal have no imaginary part
        self.inverse_spectrum[0].im = 0.0;
        self.inverse_spectrum[self.num_bins - 1].im = 0.0;

        let scratch_len = self.inverse.get_scratch_len();
        if let Err(err) = self.inverse.process_with_scratch(
            &mut self.inverse_spectrum,
            &mut self.signal,
            &mut self.scratch[..scratch_len],
        ) {
            log::error!("Failed to process inverse FFT: {err}");
            return Err(err.into());
        }

        let gain = self.hop_size as f32 / (self.window_sum * self.transform_size as f32);
        for (offset, sample) in self.signal[..self.window_size].iter().enumerate() {
            self.output.accumulate(1 + offset, sample * gain);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Analysis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analysis")
            .field("window_type", &self.window_type)
            .field("window_size", &self.window_size)
            .field("hop_size", &self.hop_size)
            .field("transform_size", &self.transform_size)
            .field("sample_rate", &self.sample_rate)
            .field("state", &self.state)
            .field("num_frames", &self.num_frames)
            .finish_non_exhaustive()
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use super::*;

    fn sine(frequency: f32, amplitude: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * frequency * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn round_trip() -> Result<(), Error> {
        for zero_padding in [false, true] {
            let mut analysis = Analysis::new(WindowType::Hann, 512, 4, 44100, zero_padding)?;
            let latency = analysis.latency();
            // bin centered sinusoid
            let frequency = 16.0 * analysis.bin_width();
            let input = sine(frequency, 0.5, 44100, 512 * 8);
            let output = input
                .iter()
                .map(|sample| analysis.process(*sample))
                .collect::<Vec<_>>();
            for t in 2 * latency..input.len() {
                assert!(
                    (output[t] - input[t - latency]).abs() < 1e-4,
                    "sample {t} differs: {} != {}",
                    output[t],
                    input[t - latency]
                );
            }
        }
        Ok(())
    }

    #[test]
    fn frame_schedule() -> Result<(), Error> {
        let mut analysis = Analysis::new(WindowType::Hann, 256, 4, 44100, true)?;
        let ready = (0..256 + 3 * 64)
            .filter_map(|i| analysis.write(0.0).then_some(i))
            .collect::<Vec<_>>();
        assert_eq!(ready, vec![255, 255 + 64, 255 + 128, 255 + 192]);
        assert_eq!(analysis.transform_size(), 512);
        assert_eq!(analysis.num_bins(), 257);
        Ok(())
    }

    #[test]
    fn amplitudes_and_normalization() -> Result<(), Error> {
        let mut analysis = Analysis::new(WindowType::Hann, 1024, 4, 44100, true)?;
        let bin = 40;
        let frequency = bin as f32 * analysis.bin_width();
        for sample in sine(frequency, 0.5, 44100, 1024) {
            analysis.write(sample);
        }
        analysis.transform(Transform::Fft)?;
        let frame = analysis.frame();
        assert_eq!(frame.len(), analysis.num_bins());
        // window gain corrected amplitude matches the input amplitude
        let amplitude = frame.amplitudes[bin] * analysis.window_gain();
        assert!((amplitude - 0.5).abs() < 1e-3, "amplitude is {amplitude}");
        assert!((frame.denorm_factor - frame.amplitudes[bin]).abs() < 1e-6);
        assert!((frame.norm_factor * frame.denorm_factor - 1.0).abs() < 1e-6);
        assert!(frame.magnitudes[bin].abs() < 1e-3);
        assert!(frame.magnitudes[bin + 10] < -40.0);
        assert!((frame.frequencies[bin] - frequency).abs() < 1e-3);
        analysis.release();
        assert_eq!(analysis.state(), AnalysisState::Waveform);
        Ok(())
    }

    #[test]
    fn silent_frames_are_not_normalized() -> Result<(), Error> {
        let mut analysis = Analysis::new(WindowType::Hann, 64, 2, 44100, false)?;
        for _ in 0..64 {
            analysis.write(1e-9);
        }
        analysis.transform(Transform::Fft)?;
        assert_eq!(analysis.frame().norm_factor, 1.0);
        assert_eq!(analysis.frame().denorm_factor, 1.0);
        Ok(())
    }

    #[test]
    fn bin_access() -> Result<(), Error> {
        let mut analysis = Analysis::new(WindowType::Hann, 256, 4, 48000, false)?;
        for sample in sine(3000.0, 0.8, 48000, 256) {
            analysis.write(sample);
        }
        analysis.transform(Transform::Fft)?;
        let num_bins = analysis.num_bins();
        assert!(matches!(
            analysis.get(num_bins, BinParameter::Real),
            Err(Error::BinIndexOutOfRange { index, .. }) if index == num_bins
        ));
        assert!(analysis.set(num_bins, BinParameter::Phase, 0.0).is_err());
        assert!(matches!(
            analysis.set(3, BinParameter::Frequency, 100.0),
            Err(Error::ParameterError(_))
        ));
        assert_eq!(analysis.get(2, BinParameter::Frequency)?, 2.0 * 48000.0 / 256.0);

        // polar edits are written back into the complex bin
        analysis.set(16, BinParameter::Amplitude, 0.25)?;
        analysis.set(16, BinParameter::Phase, 0.25)?;
        let scale = (num_bins - 1) as f32 / 2.0;
        assert!(analysis.get(16, BinParameter::Real)?.abs() < 1e-4);
        assert!((analysis.get(16, BinParameter::Imag)? - 0.25 * scale).abs() < 1e-3);

        // complex edits update the polar values
        analysis.set(20, BinParameter::Real, -scale)?;
        analysis.set(20, BinParameter::Imag, 0.0)?;
        assert!((analysis.get(20, BinParameter::Amplitude)? - 1.0).abs() < 1e-5);
        assert!((analysis.get(20, BinParameter::Phase)? - 0.5).abs() < 1e-5);

        let denorm = analysis.frame().denorm_factor;
        analysis.set(30, BinParameter::Magnitude, -6.0)?;
        let expected = db_to_linear(-6.0) * denorm;
        assert!((analysis.get(30, BinParameter::Amplitude)? - expected).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn silencing_a_bin_removes_it_from_the_output() -> Result<(), Error> {
        let mut analysis = Analysis::new(WindowType::Hann, 256, 4, 44100, false)?;
        let bin = 8;
        let frequency = bin as f32 * analysis.bin_width();
        let mut peak = 0.0f32;
        for (t, sample) in sine(frequency, 1.0, 44100, 256 * 12).into_iter().enumerate() {
            if analysis.write(sample) {
                analysis.transform(Transform::Fft)?;
                for index in bin - 2..=bin + 2 {
                    analysis.set(index, BinParameter::Amplitude, 0.0)?;
                }
                analysis.transform(Transform::Ifft)?;
            }
            let output = analysis.read();
            if t >= 512 {
                peak = peak.max(output.abs());
            }
        }
        assert!(peak < 1e-3, "peak is {peak}");
        Ok(())
    }

    #[test]
    #[should_panic]
    fn inverse_transform_requires_spectrum() {
        let mut analysis =
            Analysis::new(WindowType::Hann, 64, 4, 44100, false).expect("valid analysis");
        let _ = analysis.transform(Transform::Ifft);
    }

    #[test]
    #[should_panic]
    fn forward_transform_requires_waveform() {
        let mut analysis =
            Analysis::new(WindowType::Hann, 64, 4, 44100, false).expect("valid analysis");
        let _ = analysis.transform(Transform::Fft);
        let _ = analysis.transform(Transform::Fft);
    }

    #[test]
    fn rejects_invalid_configurations() {
        assert!(Analysis::new(WindowType::Hann, 1000, 4, 44100, true).is_err());
        assert!(Analysis::new(WindowType::Hann, 32, 4, 44100, true).is_err());
        assert!(Analysis::new(WindowType::Hann, 1024, 3, 44100, true).is_err());
        assert!(Analysis::new(WindowType::Hann, 64, 128, 44100, true).is_err());
        assert!(Analysis::new(WindowType::Hann, 1024, 4, 0, true).is_err());
    }
}

//! Multi-channel processing of interleaved sample buffers.

use crate::{
    model::{ModelOptions, SinusoidalModel},
    oscillator::WaveformType,
    Error,
};

// -------------------------------------------------------------------------------------------------

/// How a [`SinusoidalProcessor`] renders its output.
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
pub enum ProcessingMode {
    /// Additive resynthesis from the tracked partials.
    #[default]
    Resynthesis,
    /// Plain STFT: forward and inverse transform with overlap-add, delayed by the window size.
    Passthrough,
}

// -------------------------------------------------------------------------------------------------

/// Runs one [`SinusoidalModel`] per channel on interleaved buffers.
#[derive(Debug)]
pub struct SinusoidalProcessor {
    models: Vec<SinusoidalModel>,
    mode: ProcessingMode,
}

impl SinusoidalProcessor {
    /// Create a new processor for the given number of channels, using the same options for
    /// all channels. When a seed is set, each channel uses its own seed derived from it.
    pub fn new(channel_count: usize, options: ModelOptions) -> Result<Self, Error> {
        if channel_count == 0 {
            return Err(Error::ParameterError(
                "Processor needs at least one channel".to_string(),
            ));
        }
        let models = (0..channel_count)
            .map(|channel| {
                let mut options = options;
                options.seed = options.seed.map(|seed| seed.wrapping_add(channel as u64));
                SinusoidalModel::new(options)
            })
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("Sinusoidal processor: {channel_count} channels");
        Ok(Self {
            models,
            mode: ProcessingMode::default(),
        })
    }

    pub fn channel_count(&self) -> usize {
        self.models.len()
    }

    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }

    /// Switch the processing mode. Resets all channels, so both modes start from silence.
    pub fn set_mode(&mut self, mode: ProcessingMode) {
        if mode != self.mode {
            self.mode = mode;
            self.reset();
        }
    }

    /// Access a single channel's model.
    pub fn model(&self, channel: usize) -> Option<&SinusoidalModel> {
        self.models.get(channel)
    }

    pub fn models(&self) -> &[SinusoidalModel] {
        &self.models
    }

    /// Delay in sample frames between input and output in passthrough mode.
    pub fn latency(&self) -> usize {
        self.models[0].analysis().latency()
    }

    /// Switch the oscillator waveform of all channels. Returns true when it changed.
    pub fn set_waveform(&mut self, waveform: WaveformType) -> bool {
        let mut changed = false;
        for model in &mut self.models {
            changed |= model.set_waveform(waveform);
        }
        changed
    }

    /// Clear all buffers and tracks of all channels.
    pub fn reset(&mut self) {
        for model in &mut self.models {
            model.reset();
        }
    }

    /// Process the given interleaved buffer in place. The buffer length must be a multiple of
    /// the channel count: trailing partial frames are left untouched.
    pub fn process(&mut self, buffer: &mut [f32]) {
        debug_assert!(
            buffer.len() % self.models.len() == 0,
            "Buffer length must be a multiple of the channel count"
        );
        Self::assert_no_alloc(|| self.process_frames(buffer));
    }

    fn process_frames(&mut self, buffer: &mut [f32]) {
        let channel_count = self.models.len();
        match self.mode {
            ProcessingMode::Resynthesis => {
                for frame in buffer.chunks_exact_mut(channel_count) {
                    for (sample, model) in frame.iter_mut().zip(&mut self.models) {
                        *sample = model.process(*sample);
                    }
                }
            }
            ProcessingMode::Passthrough => {
                for frame in buffer.chunks_exact_mut(channel_count) {
                    for (sample, model) in frame.iter_mut().zip(&mut self.models) {
                        *sample = model.analysis_mut().process(*sample);
                    }
                }
            }
        }
    }

    fn assert_no_alloc<T, F: FnOnce() -> T>(func: F) -> T {
        #[cfg(feature = "assert-allocs")]
        return assert_no_alloc::assert_no_alloc::<T, F>(func);

        #[cfg(not(feature = "assert-allocs"))]
        return func();
    }
}

// -------------------------------------------------------------------------------------------------

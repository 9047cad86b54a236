//! Sinusoidal analysis and additive resynthesis of a single channel.

use std::sync::Arc;

use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::{
    analysis::{Analysis, AnalysisState, Frame, Transform},
    oscillator::{Oscillator, WaveformType, Wavetable},
    utils::{smoothed::LinearSmoothedValue, wrap_phase, SmoothedValue, WindowType},
    Error,
};

// -------------------------------------------------------------------------------------------------

pub mod matching;
pub mod peaks;
pub mod track;

pub use matching::TrackMatch;
pub use peaks::{Threshold, ThresholdCurve};
pub use track::{Track, TrackLifetime, TrackStatus};

// -------------------------------------------------------------------------------------------------

/// How the summed oscillator output of the model gets scaled.
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
pub enum OutputNormalization {
    /// Plain sum of all active partials.
    #[default]
    None,
    /// Divide by the number of active partials.
    ActiveCount,
    /// Divide by the square root of the number of active partials.
    SqrtActiveCount,
    /// Weight each partial by its age relative to the oldest one: `ln(1 + age) / ln(1 + oldest)`.
    LongestTrackFade,
}

impl OutputNormalization {
    /// Output gain for the given number of active tracks.
    pub fn gain(&self, num_active: usize) -> f32 {
        let count = num_active.max(1) as f32;
        match self {
            OutputNormalization::None | OutputNormalization::LongestTrackFade => 1.0,
            OutputNormalization::ActiveCount => 1.0 / count,
            OutputNormalization::SqrtActiveCount => 1.0 / count.sqrt(),
        }
    }

    /// Per track gain for a track with the given age, when the oldest active track has an age of
    /// `longest_track`.
    pub fn track_gain(&self, age: u32, longest_track: u32) -> f32 {
        match self {
            OutputNormalization::LongestTrackFade if longest_track > 0 => {
                ((age as f32).ln_1p() / (longest_track as f32).ln_1p()).min(1.0)
            }
            _ => 1.0,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Options to configure a [`SinusoidalModel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelOptions {
    /// Analysis window function. By default [`WindowType::Hann`].
    pub window_type: WindowType,
    /// Analysis window size in samples. A power of two in range `[64, 32768]`, by default 1024.
    pub window_size: usize,
    /// Hop size is `window_size / hop_factor`. A power of two, by default 4.
    pub hop_factor: usize,
    /// Sample rate in Hz. By default 44100.
    pub sample_rate: u32,
    /// Pad analysis frames to twice the window size. By default true.
    pub zero_padding: bool,
    /// Oscillator waveform. By default [`WaveformType::Sine`].
    pub waveform: WaveformType,
    /// Oscillator wavetable size. A power of two in range `[16, 65536]`, by default 2048.
    pub wavetable_size: usize,
    /// Number of harmonics for non sine waveforms. By default 16.
    pub wavetable_harmonics: usize,
    /// Size of the track pool. By default None: one track per bin.
    pub max_tracks: Option<usize>,
    /// Consecutive matches a new track needs to get audible. By default 10.
    pub track_birth: u32,
    /// Consecutive misses after which a dying track is dead. By default 5.
    pub track_death: u32,
    /// Minimum normalized peak magnitude: `20 * log10(curve(factor * frequency))`.
    pub magnitude_threshold: Threshold,
    /// Minimum peak prominence over its louder neighbor: `factor * curve(frequency / 1000)`.
    pub peak_threshold: Threshold,
    /// Maximum frequency deviation in Hz of continued tracks: `factor * curve(frequency)`.
    pub frequency_threshold: Threshold,
    /// Output scaling. By default [`OutputNormalization::None`].
    pub normalization: OutputNormalization,
    /// Seed for the track eviction randomness. By default None: seeded from OS entropy.
    pub seed: Option<u64>,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            window_type: WindowType::Hann,
            window_size: 1024,
            hop_factor: 4,
            sample_rate: 44100,
            zero_padding: true,
            waveform: WaveformType::Sine,
            wavetable_size: 2048,
            wavetable_harmonics: 16,
            max_tracks: None,
            track_birth: 10,
            track_death: 5,
            magnitude_threshold: Threshold::new(ThresholdCurve::OneOverX, 0.02),
            peak_threshold: Threshold::new(ThresholdCurve::LogX, 0.01),
            frequency_threshold: Threshold::new(ThresholdCurve::LogX, 4.0),
            normalization: OutputNormalization::None,
            seed: None,
        }
    }
}

impl ModelOptions {
    pub fn window(mut self, window_type: WindowType, window_size: usize) -> Self {
        self.window_type = window_type;
        self.window_size = window_size;
        self
    }

    pub fn hop_factor(mut self, hop_factor: usize) -> Self {
        self.hop_factor = hop_factor;
        self
    }

    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn zero_padding(mut self, zero_padding: bool) -> Self {
        self.zero_padding = zero_padding;
        self
    }

    pub fn waveform(mut self, waveform: WaveformType) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn wavetable(mut self, size: usize, harmonics: usize) -> Self {
        self.wavetable_size = size;
        self.wavetable_harmonics = harmonics;
        self
    }

    pub fn max_tracks(mut self, max_tracks: usize) -> Self {
        self.max_tracks = Some(max_tracks);
        self
    }

    pub fn track_lifetime(mut self, birth: u32, death: u32) -> Self {
        self.track_birth = birth;
        self.track_death = death;
        self
    }

    pub fn magnitude_threshold(mut self, curve: ThresholdCurve, factor: f32) -> Self {
        self.magnitude_threshold = Threshold::new(curve, factor);
        self
    }

    pub fn peak_threshold(mut self, curve: ThresholdCurve, factor: f32) -> Self {
        self.peak_threshold = Threshold::new(curve, factor);
        self
    }

    pub fn frequency_threshold(mut self, curve: ThresholdCurve, factor: f32) -> Self {
        self.frequency_threshold = Threshold::new(curve, factor);
        self
    }

    pub fn normalization(mut self, normalization: OutputNormalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of spectral bins the options result in.
    pub fn num_bins(&self) -> usize {
        let transform_size = if self.zero_padding {
            self.window_size * 2
        } else {
            self.window_size
        };
        transform_size / 2 + 1
    }

    /// Validate all parameters. Returns Error::ParameterError on errors.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.window_size.is_power_of_two()
            || !(Analysis::MIN_WINDOW_SIZE..=Analysis::MAX_WINDOW_SIZE).contains(&self.window_size)
        {
            return Err(Error::ParameterError(format!(
                "model options 'window_size' value is '{}'",
                self.window_size
            )));
        }
        if !self.hop_factor.is_power_of_two() || self.hop_factor > self.window_size {
            return Err(Error::ParameterError(format!(
                "model options 'hop_factor' value is '{}'",
                self.hop_factor
            )));
        }
        if self.sample_rate == 0 {
            return Err(Error::ParameterError(
                "model options 'sample_rate' value is '0'".to_string(),
            ));
        }
        if !self.wavetable_size.is_power_of_two()
            || !(Wavetable::MIN_SIZE..=Wavetable::MAX_SIZE).contains(&self.wavetable_size)
        {
            return Err(Error::ParameterError(format!(
                "model options 'wavetable_size' value is '{}'",
                self.wavetable_size
            )));
        }
        if self.wavetable_harmonics < 1 || self.wavetable_harmonics > self.wavetable_size / 2 {
            return Err(Error::ParameterError(format!(
                "model options 'wavetable_harmonics' value is '{}'",
                self.wavetable_harmonics
            )));
        }
        if let Some(max_tracks) = self.max_tracks {
            if max_tracks < 1 || max_tracks > self.num_bins() {
                return Err(Error::ParameterError(format!(
                    "model options 'max_tracks' value is '{max_tracks}'"
                )));
            }
        }
        if self.track_birth < 1 || self.track_death < 1 {
            return Err(Error::ParameterError(format!(
                "model options 'track_birth', 'track_death' values are '{}', '{}'",
                self.track_birth, self.track_death
            )));
        }
        if !(self.magnitude_threshold.factor > 0.0 && self.magnitude_threshold.factor.is_finite())
        {
            return Err(Error::ParameterError(format!(
                "model options 'magnitude_threshold' factor is '{}'",
                self.magnitude_threshold.factor
            )));
        }
        if !(self.peak_threshold.factor >= 0.0 && self.peak_threshold.factor.is_finite()) {
            return Err(Error::ParameterError(format!(
                "model options 'peak_threshold' factor is '{}'",
                self.peak_threshold.factor
            )));
        }
        if !(self.frequency_threshold.factor > 0.0 && self.frequency_threshold.factor.is_finite())
        {
            return Err(Error::ParameterError(format!(
                "model options 'frequency_threshold' factor is '{}'",
                self.frequency_threshold.factor
            )));
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

/// What happened to a track slot in the current breakpoint.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
enum TrackEvent {
    #[default]
    None,
    Matched,
    Spawned,
    Missed,
}

// -------------------------------------------------------------------------------------------------

/// Sinusoidal model of a mono signal.
///
/// Input samples are analysed into spectral frames. Every hop, spectral peaks get detected and
/// continued into tracks from frame to frame, and each track drives a wavetable oscillator. The
/// output is the sum of all audible oscillators.
///
/// ```rust,no_run
/// use partials::{ModelOptions, SinusoidalModel};
///
/// let mut model = SinusoidalModel::new(ModelOptions::default().track_lifetime(4, 4))?;
/// let input = vec![0.0; 44100];
/// let output = input
///     .iter()
///     .map(|sample| model.process(*sample))
///     .collect::<Vec<_>>();
/// # Ok::<(), partials::Error>(())
/// ```
///
/// All buffers are allocated in `new`: `write`, `transform`, `breakpoint` and `read` don't
/// allocate, so the model can be driven from a real-time audio thread.
#[derive(Debug)]
pub struct SinusoidalModel {
    options: ModelOptions,
    analysis: Analysis,
    wavetable: Arc<Wavetable>,
    tracks: Vec<Track>,
    events: Vec<TrackEvent>,
    oscillators: Vec<Oscillator>,
    track_gains: Vec<f32>,
    peaks: Vec<TrackMatch>,
    num_peaks: usize,
    spawn_order: Vec<usize>,
    magnitude_thresholds: Vec<f32>,
    peak_thresholds: Vec<f32>,
    lifetime: TrackLifetime,
    rng: SmallRng,
    output_gain: LinearSmoothedValue,
    num_active: usize,
    longest_track: u32,
    num_evictions: u64,
}

impl SinusoidalModel {
    /// Create a new model with the given options.
    pub fn new(options: ModelOptions) -> Result<Self, Error> {
        options.validate()?;

        let analysis = Analysis::new(
            options.window_type,
            options.window_size,
            options.hop_factor,
            options.sample_rate,
            options.zero_padding,
        )?;
        let wavetable = Arc::new(Wavetable::new(
            options.waveform,
            options.wavetable_size,
            options.wavetable_harmonics,
        )?);

        let num_bins = analysis.num_bins();
        let max_tracks = options.max_tracks.unwrap_or(num_bins);
        // strict local maxima are at least two bins apart
        let max_peaks = num_bins / 2 + 1;

        let frequencies = analysis.frame().frequencies;
        let magnitude_thresholds = frequencies
            .iter()
            .map(|frequency| options.magnitude_threshold.magnitude(*frequency))
            .collect();
        let peak_thresholds = frequencies
            .iter()
            .map(|frequency| options.peak_threshold.peak(*frequency))
            .collect();

        let rng = match options.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };

        log::debug!(
            "Sinusoidal model: {num_bins} bins, {max_tracks} tracks, {} waveform of {} samples",
            options.waveform,
            options.wavetable_size
        );

        Ok(Self {
            options,
            oscillators: vec![
                Oscillator::new(Arc::clone(&wavetable), options.sample_rate);
                max_tracks
            ],
            wavetable,
            analysis,
            tracks: vec![Track::new(); max_tracks],
            events: vec![TrackEvent::None; max_tracks],
            track_gains: vec![1.0; max_tracks],
            peaks: vec![TrackMatch::default(); max_peaks],
            num_peaks: 0,
            spawn_order: Vec::with_capacity(max_peaks),
            magnitude_thresholds,
            peak_thresholds,
            lifetime: TrackLifetime {
                birth: options.track_birth,
                death: options.track_death,
            },
            rng,
            output_gain: LinearSmoothedValue::new(1.0),
            num_active: 0,
            longest_track: 0,
            num_evictions: 0,
        })
    }

    /// Reconfigure the model. Allocates, so should not be called in real-time threads.
    pub fn init(&mut self, options: ModelOptions) -> Result<(), Error> {
        *self = Self::new(options)?;
        Ok(())
    }

    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    /// The model's analysis, e.g. to inspect its configuration.
    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    /// Mutable access to the model's analysis, e.g. to edit bins before a breakpoint.
    pub fn analysis_mut(&mut self) -> &mut Analysis {
        &mut self.analysis
    }

    /// The most recently analysed frame.
    pub fn frame(&self) -> Frame<'_> {
        self.analysis.frame()
    }

    /// The track pool. Dead tracks are unused slots.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Peaks detected in the last breakpoint.
    pub fn peaks(&self) -> &[TrackMatch] {
        &self.peaks[..self.num_peaks]
    }

    /// Number of audible tracks after the last breakpoint.
    pub fn num_active(&self) -> usize {
        self.num_active
    }

    /// Age in frames of the oldest audible track after the last breakpoint.
    pub fn longest_track(&self) -> u32 {
        self.longest_track
    }

    /// Number of tracks that got replaced by new ones, because the pool was full.
    pub fn num_evictions(&self) -> u64 {
        self.num_evictions
    }

    pub fn waveform(&self) -> WaveformType {
        self.wavetable.waveform()
    }

    /// Switch the oscillator waveform. Returns true when the waveform changed. Allocates a new
    /// wavetable when it changes, so should not be called in real-time threads.
    pub fn set_waveform(&mut self, waveform: WaveformType) -> bool {
        let mut wavetable = Wavetable::clone(&self.wavetable);
        if !wavetable.set_waveform(waveform, false) {
            return false;
        }
        self.options.waveform = waveform;
        self.wavetable = Arc::new(wavetable);
        for oscillator in &mut self.oscillators {
            oscillator.set_wavetable(Arc::clone(&self.wavetable));
        }
        true
    }

    /// Clear all buffers, tracks and oscillators.
    pub fn reset(&mut self) {
        self.analysis.reset();
        for track in &mut self.tracks {
            track.kill();
        }
        for oscillator in &mut self.oscillators {
            oscillator.stop();
        }
        self.events.fill(TrackEvent::None);
        self.track_gains.fill(1.0);
        self.num_peaks = 0;
        self.output_gain.init(1.0);
        self.num_active = 0;
        self.longest_track = 0;
    }

    /// Push a new input sample. Returns true when a new frame is ready for analysis.
    #[inline]
    pub fn write(&mut self, sample: f32) -> bool {
        self.analysis.write(sample)
    }

    /// Run a forward or inverse transform on the analysis. See [`Analysis::transform`].
    pub fn transform(&mut self, transform: Transform) -> Result<(), Error> {
        self.analysis.transform(transform)
    }

    /// Detect peaks in the current spectrum, continue, spawn and decay tracks and update the
    /// oscillators. Releases the analysis back into waveform state.
    ///
    /// Panics when the analysis does not hold a spectrum.
    pub fn breakpoint(&mut self) {
        assert!(
            self.analysis.state() == AnalysisState::Spectrum,
            "Breakpoints need a spectrum: run a forward transform first"
        );

        let frame = self.analysis.frame();
        let amplitude_scale = frame.denorm_factor * self.analysis.window_gain();
        self.num_peaks = peaks::detect_peaks(
            &frame,
            &self.magnitude_thresholds,
            &self.peak_thresholds,
            self.analysis.bin_width(),
            &mut self.peaks,
        );

        self.continue_tracks();
        self.spawn_tracks();

        // decay all tracks which got neither continued nor spawned
        for (track, event) in self.tracks.iter_mut().zip(self.events.iter_mut()) {
            if !track.is_dead() && *event == TrackEvent::None {
                track.update(None, self.lifetime);
                *event = TrackEvent::Missed;
            }
        }

        let hop_size = self.analysis.hop_size() as u32;
        let newest_sample_time =
            (self.analysis.window_size() - 1) as f32 / self.analysis.sample_rate() as f32;
        for ((track, event), oscillator) in self
            .tracks
            .iter()
            .zip(&self.events)
            .zip(self.oscillators.iter_mut())
        {
            let amplitude = track.amplitude() * amplitude_scale;
            match event {
                TrackEvent::Matched => {
                    let phase = Self::oscillator_phase(track, newest_sample_time);
                    oscillator.update(amplitude, track.frequency(), phase, hop_size);
                }
                TrackEvent::Spawned => {
                    let phase = Self::oscillator_phase(track, newest_sample_time);
                    oscillator.start(amplitude, track.frequency(), phase);
                }
                TrackEvent::Missed if track.is_dead() => oscillator.stop(),
                TrackEvent::Missed | TrackEvent::None => {}
            }
        }

        self.update_normalization(hop_size);
        self.analysis.release();
    }

    /// Generate the next output sample from the oscillator bank.
    #[inline]
    pub fn read(&mut self) -> f32 {
        let gain = self.output_gain.next();
        let mut output = 0.0;
        for ((track, oscillator), track_gain) in self
            .tracks
            .iter()
            .zip(self.oscillators.iter_mut())
            .zip(&self.track_gains)
        {
            if track.is_dead() {
                continue;
            }
            let sample = oscillator.next();
            if track.is_active() {
                output += sample * track_gain;
            }
        }
        output * gain
    }

    /// Write a sample, run the analysis and a breakpoint when a frame got completed and read
    /// the next output sample.
    pub fn process(&mut self, sample: f32) -> f32 {
        if self.write(sample) {
            match self.transform(Transform::Fft) {
                Ok(()) => self.breakpoint(),
                Err(err) => {
                    log::warn!("Skipping frame: {err}");
                    self.analysis.release();
                }
            }
        }
        self.read()
    }

    /// Process the given mono buffer in place.
    pub fn process_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer {
            *sample = self.process(*sample);
        }
    }

    fn continue_tracks(&mut self) {
        let peaks = &mut self.peaks[..self.num_peaks];
        let frequency_threshold = self.options.frequency_threshold;
        for (track, event) in self.tracks.iter_mut().zip(self.events.iter_mut()) {
            *event = TrackEvent::None;
            if track.is_dead() {
                continue;
            }
            let threshold = frequency_threshold.frequency(track.frequency());
            if let Some(index) = matching::find_best_match(track, peaks, threshold) {
                peaks[index].is_assigned = true;
                track.update(Some(&peaks[index]), self.lifetime);
                *event = TrackEvent::Matched;
            }
        }
    }

    fn spawn_tracks(&mut self) {
        let peaks = &self.peaks[..self.num_peaks];
        self.spawn_order.clear();
        self.spawn_order
            .extend((0..peaks.len()).filter(|index| !peaks[*index].is_assigned));
        // loudest first
        self.spawn_order.sort_unstable_by(|a, b| {
            peaks[*b]
                .magnitude
                .total_cmp(&peaks[*a].magnitude)
                .then_with(|| peaks[*a].bin_index.cmp(&peaks[*b].bin_index))
        });

        for order_index in 0..self.spawn_order.len() {
            let peak_index = self.spawn_order[order_index];
            let slot = match self.tracks.iter().position(Track::is_dead) {
                Some(slot) => slot,
                None => match self.evictable_slot() {
                    Some(slot) => {
                        self.tracks[slot].kill();
                        self.num_evictions += 1;
                        slot
                    }
                    // all tracks got continued or spawned in this frame
                    None => break,
                },
            };
            self.tracks[slot].init(&self.peaks[peak_index]);
            self.peaks[peak_index].is_assigned = true;
            self.events[slot] = TrackEvent::Spawned;
        }
    }

    // Randomly pick a live track which did not get continued or spawned in this frame.
    fn evictable_slot(&mut self) -> Option<usize> {
        let is_evictable = |(track, event): &(&Track, &TrackEvent)| {
            !track.is_dead() && **event == TrackEvent::None
        };
        let count = self.tracks.iter().zip(&self.events).filter(is_evictable).count();
        if count == 0 {
            return None;
        }
        let nth = self.rng.random_range(0..count);
        self.tracks
            .iter()
            .zip(&self.events)
            .enumerate()
            .filter(|(_, entry)| is_evictable(entry))
            .nth(nth)
            .map(|(slot, _)| slot)
    }

    // Track phases are cosine phases at the oldest sample of the analysis window. Oscillators
    // play sine tables and continue from the newest sample on.
    fn oscillator_phase(track: &Track, newest_sample_time: f32) -> f32 {
        wrap_phase(track.phase() + 0.25 + track.frequency() * newest_sample_time)
    }

    fn update_normalization(&mut self, hop_size: u32) {
        let (num_active, longest_track) = self
            .tracks
            .iter()
            .filter(|track| track.is_active())
            .fold((0, 0), |(count, longest), track| {
                (count + 1, longest.max(track.alive_frames()))
            });
        self.num_active = num_active;
        self.longest_track = longest_track;

        let normalization = self.options.normalization;
        for (gain, track) in self.track_gains.iter_mut().zip(&self.tracks) {
            *gain = normalization.track_gain(track.alive_frames(), longest_track);
        }
        self.output_gain
            .set_target_with_duration(normalization.gain(num_active), Some(hop_size));
    }
}

// -------------------------------------------------------------------------------------------------

//! Lifecycle of the partial tracks in a model's track pool.

use super::matching::TrackMatch;

// -------------------------------------------------------------------------------------------------

/// Lifecycle state of a [`Track`].
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, strum::Display)]
pub enum TrackStatus {
    /// Unused pool slot.
    #[default]
    Dead,
    /// Newly spawned, not yet audible. Dies on the first miss.
    Birth,
    /// Established and audible.
    Alive,
    /// Audible, but missed in the recent frames.
    Dying,
}

/// Number of consecutive frames a track needs to get born or to die.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TrackLifetime {
    /// Matches needed to move from [`TrackStatus::Birth`] to [`TrackStatus::Alive`].
    pub birth: u32,
    /// Misses while [`TrackStatus::Dying`] after which a track is dead.
    pub death: u32,
}

impl Default for TrackLifetime {
    fn default() -> Self {
        Self {
            birth: 10,
            death: 5,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// A sinusoidal partial, followed across analysis frames.
///
/// Amplitudes are normalized to the loudest bin of the frame the track got last matched in.
/// Frequencies are in Hz and phases in turns.
#[derive(Debug, Default, Clone)]
pub struct Track {
    amplitude: f32,
    frequency: f32,
    phase: f32,
    alive_frames: u32,
    birth_frames: u32,
    dying_frames: u32,
    status: TrackStatus,
}

impl Track {
    /// Create a new dead track.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Number of frames this track got matched in since it got spawned.
    pub fn alive_frames(&self) -> u32 {
        self.alive_frames
    }

    pub fn birth_frames(&self) -> u32 {
        self.birth_frames
    }

    pub fn dying_frames(&self) -> u32 {
        self.dying_frames
    }

    pub fn status(&self) -> TrackStatus {
        self.status
    }

    /// True when the track is audible: alive or dying.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self.status, TrackStatus::Alive | TrackStatus::Dying)
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.status == TrackStatus::Dead
    }

    /// Spawn a dead track from the given peak.
    pub fn init(&mut self, peak: &TrackMatch) {
        assert!(self.is_dead(), "Only dead tracks can be initialized");
        self.amplitude = peak.amplitude;
        self.frequency = peak.frequency;
        self.phase = peak.phase;
        self.alive_frames = 0;
        self.birth_frames = 0;
        self.dying_frames = 0;
        self.status = TrackStatus::Birth;
    }

    /// Advance the lifecycle by one frame: `Some` when the track got matched to a peak in this
    /// frame, else `None`. Returns the new status.
    pub fn update(&mut self, peak: Option<&TrackMatch>, lifetime: TrackLifetime) -> TrackStatus {
        assert!(!self.is_dead(), "Dead tracks can't be updated");
        match peak {
            Some(peak) => {
                self.amplitude = peak.amplitude;
                self.frequency = peak.frequency;
                self.phase = peak.phase;
                self.alive_frames += 1;
                match self.status {
                    TrackStatus::Birth => {
                        self.birth_frames += 1;
                        if self.birth_frames >= lifetime.birth {
                            self.status = TrackStatus::Alive;
                        }
                    }
                    TrackStatus::Dying => {
                        self.dying_frames = 0;
                        self.status = TrackStatus::Alive;
                    }
                    TrackStatus::Alive | TrackStatus::Dead => {}
                }
            }
            None => match self.status {
                TrackStatus::Birth => self.kill(),
                TrackStatus::Alive => self.status = TrackStatus::Dying,
                TrackStatus::Dying => {
                    self.dying_frames += 1;
                    if self.dying_frames >= lifetime.death {
                        self.kill();
                    }
                }
                TrackStatus::Dead => {}
            },
        }
        self.status
    }

    /// Immediately move the track into the dead state, clearing its parameters.
    pub fn kill(&mut self) {
        *self = Self::default();
    }
}

// -------------------------------------------------------------------------------------------------

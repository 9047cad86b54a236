//! Frame to frame peak continuation.

use std::cmp::Ordering;

use super::track::Track;
use crate::utils::phase_difference;

// -------------------------------------------------------------------------------------------------

/// A spectral peak of the current frame and its assignment state.
///
/// Peaks live in a preallocated pool and get recycled every frame.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct TrackMatch {
    /// Bin the peak got detected in.
    pub bin_index: usize,
    /// True when the peak got detected in the current frame.
    pub is_detected: bool,
    /// True when the peak got assigned to a track, either by continuation or by spawning.
    pub is_assigned: bool,
    /// Interpolated, normalized amplitude.
    pub amplitude: f32,
    /// Interpolated frequency in Hz.
    pub frequency: f32,
    /// Interpolated phase in turns, of a cosine starting at the oldest sample of the window.
    pub phase: f32,
    /// Interpolated, normalized magnitude in decibels.
    pub magnitude: f32,
    /// Distance to the track currently looking for a continuation.
    pub distance_squared: f32,
}

impl TrackMatch {
    /// Squared distance to the given track in normalized amplitude, frequency and phase
    /// space. Frequency distances are relative to the given threshold.
    pub fn distance_squared_to(&self, track: &Track, frequency_threshold: f32) -> f32 {
        let frequency = if frequency_threshold > 0.0 {
            (self.frequency - track.frequency()) / frequency_threshold
        } else {
            0.0
        };
        let amplitude = self.amplitude - track.amplitude();
        // wrapped differences are in [-0.5, 0.5)
        let phase = 2.0 * phase_difference(track.phase(), self.phase);
        frequency * frequency + amplitude * amplitude + phase * phase
    }

    /// Candidate order: frequency distance, then overall distance, then bin index.
    fn rank(&self, other: &Self, track: &Track) -> Ordering {
        let self_distance = (self.frequency - track.frequency()).abs();
        let other_distance = (other.frequency - track.frequency()).abs();
        self_distance
            .total_cmp(&other_distance)
            .then_with(|| self.distance_squared.total_cmp(&other.distance_squared))
            .then_with(|| self.bin_index.cmp(&other.bin_index))
    }
}

// -------------------------------------------------------------------------------------------------

/// Find the best unassigned continuation for the given track within the frequency threshold.
///
/// Updates the distances of all candidates and returns the index of the best one in `peaks`.
pub(crate) fn find_best_match(
    track: &Track,
    peaks: &mut [TrackMatch],
    frequency_threshold: f32,
) -> Option<usize> {
    let mut best: Option<usize> = None;
    for index in 0..peaks.len() {
        let peak = &mut peaks[index];
        if !peak.is_detected
            || peak.is_assigned
            || (peak.frequency - track.frequency()).abs() > frequency_threshold
        {
            continue;
        }
        peak.distance_squared = peak.distance_squared_to(track, frequency_threshold);
        best = match best {
            Some(best_index) if peaks[best_index].rank(&peaks[index], track).is_le() => {
                Some(best_index)
            }
            _ => Some(index),
        };
    }
    best
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::track::TrackLifetime;

    fn peak(bin_index: usize, frequency: f32, amplitude: f32, phase: f32) -> TrackMatch {
        TrackMatch {
            bin_index,
            is_detected: true,
            amplitude,
            frequency,
            phase,
            ..TrackMatch::default()
        }
    }

    fn track(frequency: f32, amplitude: f32, phase: f32) -> Track {
        let mut track = Track::new();
        track.init(&peak(0, frequency, amplitude, phase));
        track
    }

    #[test]
    fn picks_closest_frequency() {
        let track = track(440.0, 0.5, 0.0);
        let mut peaks = [
            peak(10, 430.0, 0.5, 0.0),
            peak(11, 445.0, 0.1, 0.4),
            peak(12, 441.0, 1.0, 0.5),
            peak(30, 1000.0, 0.5, 0.0),
        ];
        assert_eq!(find_best_match(&track, &mut peaks, 20.0), Some(2));
        // out of threshold peaks are ignored
        assert_eq!(find_best_match(&track, &mut peaks[3..], 20.0), None);
    }

    #[test]
    fn skips_assigned_and_undetected_peaks() {
        let track = track(440.0, 0.5, 0.0);
        let mut peaks = [peak(10, 440.0, 0.5, 0.0), peak(11, 450.0, 0.5, 0.0)];
        peaks[0].is_assigned = true;
        assert_eq!(find_best_match(&track, &mut peaks, 20.0), Some(1));
        peaks[1].is_detected = false;
        assert_eq!(find_best_match(&track, &mut peaks, 20.0), None);
    }

    #[test]
    fn ties_break_by_distance_then_bin() {
        let track = track(440.0, 0.5, 0.0);
        let mut peaks = [
            peak(12, 430.0, 0.5, 0.0),
            peak(11, 450.0, 0.9, 0.0),
            peak(13, 450.0, 0.5, 0.0),
        ];
        // equal frequency distances: closer amplitude, then lower bin wins
        assert_eq!(find_best_match(&track, &mut peaks, 20.0), Some(0));
        assert!(peaks[1].distance_squared > peaks[0].distance_squared);

        let mut peaks = [peak(14, 450.0, 0.5, 0.0), peak(13, 450.0, 0.5, 0.0)];
        assert_eq!(find_best_match(&track, &mut peaks, 20.0), Some(1));
    }

    #[test]
    fn phase_distance_wraps() {
        let track = track(440.0, 0.5, 0.95);
        let near = peak(10, 440.0, 0.5, 0.05);
        let far = peak(10, 440.0, 0.5, 0.5);
        assert!(near.distance_squared_to(&track, 20.0) < far.distance_squared_to(&track, 20.0));
        assert!((near.distance_squared_to(&track, 20.0) - 0.04).abs() < 1e-5);
    }

    #[test]
    fn matched_tracks_keep_their_age() {
        let lifetime = TrackLifetime::default();
        let mut track = track(440.0, 0.5, 0.0);
        let mut peaks = [peak(10, 441.0, 0.5, 0.0)];
        if let Some(index) = find_best_match(&track, &mut peaks, 20.0) {
            peaks[index].is_assigned = true;
            track.update(Some(&peaks[index]), lifetime);
        }
        assert_eq!(track.frequency(), 441.0);
        assert_eq!(track.alive_frames(), 1);
    }
}

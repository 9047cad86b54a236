//! Spectral peak detection and the frequency dependent thresholds it uses.

use super::matching::TrackMatch;
use crate::{
    analysis::Frame,
    utils::{db_to_linear, linear_to_db, phase_difference, wrap_phase},
};

// -------------------------------------------------------------------------------------------------

/// Frequency dependent curve shapes for detection and matching thresholds.
///
/// Logarithmic curves use `ln(1 + x)`, so they are zero at zero and positive above.
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
pub enum ThresholdCurve {
    /// `1 / x`
    #[default]
    OneOverX,
    /// `ln(1 + x)`
    LogX,
    /// `ln(1 + x) / x`
    LogXOverX,
    /// `ln(1 + x)^2 / x`
    LogXSqOverX,
    /// `1`
    Constant,
}

impl ThresholdCurve {
    /// Evaluate the curve at `x`. Inputs are clamped to the smallest positive float, so
    /// results stay finite.
    pub fn apply(&self, x: f32) -> f32 {
        let x = if x.is_nan() {
            f32::MIN_POSITIVE
        } else {
            x.max(f32::MIN_POSITIVE)
        };
        match self {
            ThresholdCurve::OneOverX => 1.0 / x,
            ThresholdCurve::LogX => x.ln_1p(),
            ThresholdCurve::LogXOverX => x.ln_1p() / x,
            ThresholdCurve::LogXSqOverX => {
                let log = x.ln_1p();
                log * log / x
            }
            ThresholdCurve::Constant => 1.0,
        }
    }
}

/// A threshold curve, scaled by a constant factor.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Threshold {
    pub curve: ThresholdCurve,
    pub factor: f32,
}

impl Threshold {
    pub const fn new(curve: ThresholdCurve, factor: f32) -> Self {
        Self { curve, factor }
    }

    /// Minimum normalized magnitude in dB a peak at the given frequency needs to have.
    pub fn magnitude(&self, frequency: f32) -> f32 {
        linear_to_db(self.curve.apply(self.factor * frequency))
    }

    /// Minimum linear prominence over its neighbors a peak at the given frequency needs.
    pub fn peak(&self, frequency: f32) -> f32 {
        self.factor * self.curve.apply(frequency / 1000.0)
    }

    /// Maximum frequency deviation in Hz a track at the given frequency may continue with.
    pub fn frequency(&self, frequency: f32) -> f32 {
        self.factor * self.curve.apply(frequency)
    }
}

// -------------------------------------------------------------------------------------------------

/// Parabolic interpolation of a peak from the magnitudes of its bin and the bin's neighbors.
///
/// Returns the peak's offset from the center bin in bins, clamped to `[-1, 1]`, and its
/// interpolated magnitude. Falls back to the center bin for degenerate parabolas.
pub fn interpolate_peak(alpha: f32, beta: f32, gamma: f32) -> (f32, f32) {
    let denominator = alpha - 2.0 * beta + gamma;
    if denominator.abs() < 1e-12 || !denominator.is_finite() {
        return (0.0, beta);
    }
    let offset = 0.5 * (alpha - gamma) / denominator;
    if !offset.is_finite() {
        return (0.0, beta);
    }
    let offset = offset.clamp(-1.0, 1.0);
    let magnitude = beta - 0.25 * (alpha - gamma) * offset;
    (offset, magnitude)
}

/// Detect significant peaks in the given frame and write them into the start of `peaks`.
///
/// A peak is a bin which is louder than its magnitude threshold and the top of a strictly rising
/// and falling run of two bins on each side: `m[i-2] < m[i-1] < m[i] > m[i+1] > m[i+2]`, so
/// plateaus are never peaks. After interpolation, its prominence over the louder direct neighbor
/// must exceed the peak threshold. Returns the number of detected peaks. `peaks` needs room for
/// `frame.len() / 2` peaks. Peaks which don't fit get dropped.
pub fn detect_peaks(
    frame: &Frame<'_>,
    magnitude_thresholds: &[f32],
    peak_thresholds: &[f32],
    bin_width: f32,
    peaks: &mut [TrackMatch],
) -> usize {
    let magnitudes = frame.magnitudes;
    let phases = frame.phases;
    let num_bins = frame.len();
    debug_assert!(magnitude_thresholds.len() == num_bins && peak_thresholds.len() == num_bins);
    if num_bins < 5 {
        return 0;
    }
    let nyquist = bin_width * (num_bins - 1) as f32;

    let mut num_peaks = 0;
    for bin in 2..num_bins - 2 {
        if num_peaks >= peaks.len() {
            break;
        }
        let magnitude = magnitudes[bin];
        let left = magnitudes[bin - 1];
        let right = magnitudes[bin + 1];
        if magnitude <= magnitude_thresholds[bin]
            || magnitudes[bin - 2] >= left
            || left >= magnitude
            || magnitude <= right
            || right <= magnitudes[bin + 2]
        {
            continue;
        }

        let (offset, peak_magnitude) = interpolate_peak(left, magnitude, right);

        let prominence = db_to_linear(peak_magnitude - left.max(right)) - 1.0;
        if prominence <= peak_thresholds[bin] {
            continue;
        }

        // interpolate phase between the two bins around the refined location
        let (from, to, fraction) = if offset >= 0.0 {
            (bin, bin + 1, offset)
        } else {
            (bin - 1, bin, 1.0 + offset)
        };
        let phase =
            wrap_phase(phases[from] + phase_difference(phases[from], phases[to]) * fraction);

        peaks[num_peaks] = TrackMatch {
            bin_index: bin,
            is_detected: true,
            is_assigned: false,
            amplitude: db_to_linear(peak_magnitude),
            frequency: ((bin as f32 + offset) * bin_width).clamp(0.0, nyquist),
            phase,
            magnitude: peak_magnitude,
            distance_squared: 0.0,
        };
        num_peaks += 1;
    }
    num_peaks
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use strum::IntoEnumIterator;

    use super::*;
    use crate::{
        analysis::{Analysis, Transform},
        utils::WindowType,
        Error,
    };

    #[test]
    fn curves_are_positive_and_finite() {
        for curve in ThresholdCurve::iter() {
            for x in [0.001, 0.5, 1.0, 100.0, 22050.0] {
                let value = curve.apply(x);
                assert!(value.is_finite() && value > 0.0, "{curve}({x}) = {value}");
            }
            assert!(curve.apply(0.0).is_finite());
        }
        assert!((ThresholdCurve::LogX.apply(1.0) - 2.0f32.ln()).abs() < 1e-6);
        assert_eq!(ThresholdCurve::OneOverX.apply(4.0), 0.25);
    }

    #[test]
    fn thresholds() {
        let magnitude = Threshold::new(ThresholdCurve::OneOverX, 0.02);
        // 1 / (0.02 * 500) = 0.1 = -20 dB
        assert!((magnitude.magnitude(500.0) + 20.0).abs() < 1e-4);
        // higher frequencies use lower thresholds
        assert!(magnitude.magnitude(5000.0) < magnitude.magnitude(500.0));

        let frequency = Threshold::new(ThresholdCurve::LogX, 4.0);
        assert!((frequency.frequency(440.0) - 4.0 * 441.0f32.ln()).abs() < 1e-4);

        let peak = Threshold::new(ThresholdCurve::LogX, 0.01);
        assert!((peak.peak(1000.0) - 0.01 * 2.0f32.ln()).abs() < 1e-6);
    }

    #[test]
    fn parabolic_interpolation() {
        // symmetric: peak at the center
        assert_eq!(interpolate_peak(-6.0, 0.0, -6.0), (0.0, 0.0));
        // sampled from y = -(x - 0.25)^2
        let y = |x: f32| -(x - 0.25) * (x - 0.25);
        let (offset, magnitude) = interpolate_peak(y(-1.0), y(0.0), y(1.0));
        assert!((offset - 0.25).abs() < 1e-6);
        assert!(magnitude.abs() < 1e-6);
        // degenerate
        assert_eq!(interpolate_peak(1.0, 1.0, 1.0), (0.0, 1.0));
        assert_eq!(interpolate_peak(f32::NAN, 1.0, 1.0), (0.0, 1.0));
        // clamped
        assert_eq!(interpolate_peak(0.0, 1.0, 1.5).0, 1.0);
    }

    #[test]
    fn peak_localization() -> Result<(), Error> {
        let sample_rate = 44100;
        let mut analysis = Analysis::new(WindowType::Hann, 2048, 4, sample_rate, true)?;
        let bin_width = analysis.bin_width();
        let num_bins = analysis.num_bins();
        for fraction in [0.0, 0.2, 0.37, 0.45, 0.81] {
            let frequency = (100.0 + fraction) * bin_width;
            analysis.reset();
            for i in 0..analysis.window_size() {
                let t = i as f32 / sample_rate as f32;
                analysis.write((2.0 * PI * frequency * t).sin());
            }
            analysis.transform(Transform::Fft)?;

            let magnitude_thresholds = vec![-60.0; num_bins];
            let peak_thresholds = vec![0.0; num_bins];
            let mut peaks = vec![TrackMatch::default(); num_bins];
            let num_peaks = detect_peaks(
                &analysis.frame(),
                &magnitude_thresholds,
                &peak_thresholds,
                bin_width,
                &mut peaks,
            );
            assert_eq!(num_peaks, 1, "expected a single peak at {frequency} Hz");
            let error = (peaks[0].frequency - frequency).abs() / bin_width;
            assert!(error < 0.1, "peak off by {error} bins at {frequency} Hz");
            assert!(peaks[0].magnitude.abs() < 0.5);
            assert!((peaks[0].amplitude - 1.0).abs() < 0.06);
            analysis.release();
        }
        Ok(())
    }

    fn detect(magnitudes: &[f32]) -> usize {
        let len = magnitudes.len();
        let zeros = vec![0.0; len];
        let frame = Frame {
            amplitudes: &zeros,
            magnitudes,
            phases: &zeros,
            frequencies: &zeros,
            norm_factor: 1.0,
            denorm_factor: 1.0,
        };
        let mut peaks = vec![TrackMatch::default(); len];
        detect_peaks(&frame, &vec![-200.0; len], &zeros, 10.0, &mut peaks)
    }

    #[test]
    fn peaks_need_strictly_monotone_flanks() {
        const LOW: f32 = -100.0;
        assert_eq!(detect(&[LOW, LOW, -20.0, -10.0, 0.0, -10.0, -20.0, LOW, LOW]), 1);
        // dips next to the peak
        assert_eq!(detect(&[LOW, LOW, -10.0, -30.0, 0.0, -30.0, -10.0, LOW, LOW]), 0);
        assert_eq!(detect(&[LOW, LOW, -20.0, -10.0, 0.0, -30.0, -10.0, LOW, LOW]), 0);
        // plateaus
        assert_eq!(detect(&[LOW, -20.0, -10.0, 0.0, 0.0, -10.0, -20.0, LOW, LOW]), 0);
        assert_eq!(detect(&[LOW, LOW, -20.0, -10.0, 0.0, -10.0, -10.0, LOW, LOW]), 0);
    }

    #[test]
    fn thresholds_reject_peaks() -> Result<(), Error> {
        let mut analysis = Analysis::new(WindowType::Hann, 512, 4, 44100, false)?;
        let bin_width = analysis.bin_width();
        let num_bins = analysis.num_bins();
        for i in 0..512 {
            let t = i as f32 / 44100.0;
            analysis.write((2.0 * PI * 40.0 * bin_width * t).sin());
        }
        analysis.transform(Transform::Fft)?;
        let mut peaks = vec![TrackMatch::default(); num_bins];

        let strict_magnitudes = vec![10.0; num_bins];
        let peak_thresholds = vec![0.0; num_bins];
        let num_peaks = detect_peaks(
            &analysis.frame(),
            &strict_magnitudes,
            &peak_thresholds,
            bin_width,
            &mut peaks,
        );
        assert_eq!(num_peaks, 0);

        let magnitudes = vec![-60.0; num_bins];
        let strict_peaks = vec![1000.0; num_bins];
        let num_peaks = detect_peaks(
            &analysis.frame(),
            &magnitudes,
            &strict_peaks,
            bin_width,
            &mut peaks,
        );
        assert_eq!(num_peaks, 0);
        Ok(())
    }
}

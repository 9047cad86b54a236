//! Analysis window functions.

use std::f64::consts::PI;

// -------------------------------------------------------------------------------------------------

/// Window function kinds, applied to each analysis frame before the forward transform.
///
/// Cosine windows are generated in their periodic form, so they overlap-add to a constant at a
/// hop of a quarter of the window size.
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
pub enum WindowType {
    Rectangular,
    #[default]
    Hann,
    Hamming,
    Blackman,
    Gaussian,
}

impl WindowType {
    const GAUSSIAN_SIGMA: f64 = 0.4;

    /// Window value at `index` for a window of `len` samples.
    pub fn value(&self, index: usize, len: usize) -> f32 {
        debug_assert!(index < len, "Invalid window index");
        let n = index as f64;
        let size = len as f64;
        let value = match self {
            WindowType::Rectangular => 1.0,
            WindowType::Hann => 0.5 - 0.5 * (2.0 * PI * n / size).cos(),
            WindowType::Hamming => 0.54 - 0.46 * (2.0 * PI * n / size).cos(),
            WindowType::Blackman => {
                0.42 - 0.5 * (2.0 * PI * n / size).cos() + 0.08 * (4.0 * PI * n / size).cos()
            }
            WindowType::Gaussian => {
                let half = size / 2.0;
                let x = (n - half) / (Self::GAUSSIAN_SIGMA * half);
                (-0.5 * x * x).exp()
            }
        };
        value as f32
    }

    /// Fill the given slice with the window, using the slice length as window size.
    pub fn generate_into(&self, window: &mut [f32]) {
        let len = window.len();
        for (index, value) in window.iter_mut().enumerate() {
            *value = self.value(index, len);
        }
    }

    /// Allocate and generate a window of the given size.
    pub fn generate(&self, len: usize) -> Vec<f32> {
        let mut window = vec![0.0; len];
        self.generate_into(&mut window);
        window
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn hann_shape() {
        let window = WindowType::Hann.generate(64);
        assert_eq!(window[0], 0.0);
        assert!((window[32] - 1.0).abs() < 1e-6);
        // periodic: symmetric around the center, excluding the first sample
        for i in 1..32 {
            assert!((window[i] - window[64 - i]).abs() < 1e-6);
        }
    }

    #[test]
    fn overlap_adds_to_constant() {
        const SIZE: usize = 256;
        const HOP: usize = SIZE / 4;
        for window_type in [WindowType::Hann, WindowType::Hamming, WindowType::Blackman] {
            let window = window_type.generate(SIZE);
            let sums = (0..HOP)
                .map(|offset| window.iter().skip(offset).step_by(HOP).sum::<f32>())
                .collect::<Vec<_>>();
            for sum in &sums {
                assert!(
                    (sum - sums[0]).abs() < 1e-4,
                    "{window_type} does not overlap-add to a constant"
                );
            }
        }
    }

    #[test]
    fn values_in_range() {
        for window_type in WindowType::iter() {
            let window = window_type.generate(128);
            assert!(window.iter().all(|v| v.is_finite() && *v >= -1e-6 && *v <= 1.0 + 1e-6));
        }
        let gaussian = WindowType::Gaussian.generate(128);
        assert_eq!(gaussian[64], 1.0);
        assert!(gaussian[0] < 0.1);
    }

    #[test]
    fn parses_names() {
        assert_eq!("Blackman".parse::<WindowType>(), Ok(WindowType::Blackman));
        assert!("Kaiser".parse::<WindowType>().is_err());
        assert_eq!(WindowType::default().to_string(), "Hann");
    }
}

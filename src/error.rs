use std::{error, fmt, io};

// -------------------------------------------------------------------------------------------------

/// Provides an enumeration of all possible errors reported by partials.
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// Invalid configuration or parameter value.
    ParameterError(String),
    /// A spectral bin index outside of `[0, num_bins)` was accessed.
    BinIndexOutOfRange { index: usize, num_bins: usize },
    /// The FFT backend failed to process a frame.
    TransformError(String),
    IoError(io::Error),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParameterError(str) => write!(f, "Invalid parameter: {str}"),
            Self::BinIndexOutOfRange { index, num_bins } => {
                write!(f, "Bin index {index} is out of range (num bins: {num_bins})")
            }
            Self::TransformError(str) => write!(f, "Transform failed: {str}"),
            Self::IoError(err) => err.fmt(f),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

impl From<realfft::FftError> for Error {
    fn from(err: realfft::FftError) -> Self {
        Error::TransformError(err.to_string())
    }
}

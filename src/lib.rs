#![doc = include_str!("../README.md")]
#![cfg_attr(all(doc, docsrs), feature(doc_auto_cfg))]

// private mods (will be partly re-exported)
mod analysis;
mod error;
mod model;
mod oscillator;
mod processor;

// public, flat re-exports
pub use error::Error;

pub use analysis::{Analysis, AnalysisState, BinParameter, Frame, Transform};
pub use model::{ModelOptions, OutputNormalization, SinusoidalModel};
pub use oscillator::WaveformType;
pub use processor::{ProcessingMode, SinusoidalProcessor};
pub use utils::WindowType;

// public mods
pub mod utils;

pub mod tracks {
    //! Partial tracking: peaks, tracks and the thresholds which connect them.

    pub use super::model::{
        Threshold, ThresholdCurve, Track, TrackLifetime, TrackMatch, TrackStatus,
    };
}

pub mod oscillators {
    //! Wavetable oscillators, which render tracks.

    pub use super::oscillator::{Oscillator, WaveformType, Wavetable};
}

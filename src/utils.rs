//! Shared, real-time safe DSP helpers.

pub mod noise;
pub mod ring_buffer;
pub mod smoothed;
pub mod window;

pub use noise::PinkNoise;
pub use ring_buffer::RingBuffer;
pub use smoothed::{LinearSmoothedValue, SmoothedValue};
pub use window::WindowType;

// -------------------------------------------------------------------------------------------------

pub(crate) const MINUS_INF_IN_DB: f32 = -200.0f32;

const LIN_TO_DB_FACTOR: f32 = 20.0f32 / std::f32::consts::LN_10;
const DB_TO_LIN_FACTOR: f32 = std::f32::consts::LN_10 / 20.0f32;

// -------------------------------------------------------------------------------------------------

/// Convert a linear amplitude into decibels. Amplitudes at or below 1e-12 map to -200 dB.
pub fn linear_to_db(value: f32) -> f32 {
    if value == 1.0 {
        return 0.0; // avoid rounding errors at exactly 0 dB
    } else if value > 1e-12f32 {
        return value.ln() * LIN_TO_DB_FACTOR;
    }
    MINUS_INF_IN_DB
}

/// Convert decibels into a linear amplitude. Values at or below -200 dB are treated as silence.
pub fn db_to_linear(value: f32) -> f32 {
    if value == 0.0f32 {
        return 1.0f32; // avoid rounding errors at exactly 0 dB
    } else if value > MINUS_INF_IN_DB {
        return (value * DB_TO_LIN_FACTOR).exp();
    }
    0.0f32
}

// -------------------------------------------------------------------------------------------------

/// Wrap a phase, given in turns, into the range `[0, 1)`.
#[inline]
pub fn wrap_phase(turns: f32) -> f32 {
    let wrapped = turns - turns.floor();
    // floor of tiny negative values can round up to exactly 1.0
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// Shortest signed distance in turns from phase `from` to phase `to`, in `[-0.5, 0.5)`.
#[inline]
pub fn phase_difference(from: f32, to: f32) -> f32 {
    wrap_phase(to - from + 0.5) - 0.5
}

// -------------------------------------------------------------------------------------------------

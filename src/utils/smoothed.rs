use std::fmt::{Debug, Display};

// -------------------------------------------------------------------------------------------------

/// Provides smooth transitions between a current and target f32 value.
/// Smoothing usually needs to be applied to avoid clicks in e.g. volume or frequency changes.
pub trait SmoothedValue: Debug {
    /// Access to the current, possibly ramped value.
    #[must_use]
    fn current(&self) -> f32;
    /// Access to the target value.
    #[must_use]
    fn target(&self) -> f32;

    /// Ramp, if needed, and get the current ramped value, else returns the target value.
    #[must_use]
    fn next(&mut self) -> f32 {
        if self.need_ramp() {
            self.ramp();
            self.current()
        } else {
            self.target()
        }
    }

    /// Test if ramping is necessary.
    #[must_use]
    fn need_ramp(&self) -> bool;
    /// Move current to target value, when ramping is necessary, else does nothing.
    fn ramp(&mut self);

    /// Set current and target to the same value.
    fn init(&mut self, value: f32);
    /// Set a new target value and ramp current, when current is different from the target.
    fn set_target(&mut self, target: f32);
}

impl Display for dyn SmoothedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.need_ramp() {
            f.write_fmt(format_args!("{}(->{})", self.current(), self.target()))
        } else {
            f.write_fmt(format_args!("{}", self.target()))
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Linear smoothed value, which ramps towards its target in a fixed number of steps.
///
/// Steps are counted in calls to `ramp` or `next`, which usually happen once per sample frame,
/// so durations are specified in sample frames and do not depend on the sample rate.
#[derive(Debug, Clone)]
pub struct LinearSmoothedValue {
    current: f32,
    target: f32,
    step: f32,
    num_pending_steps: u32,
    duration: u32,
}

impl LinearSmoothedValue {
    pub const DEFAULT_DURATION: u32 = 64;

    pub const fn new(value: f32) -> Self {
        Self::with_duration(value, Self::DEFAULT_DURATION)
    }

    pub const fn with_duration(value: f32, duration: u32) -> Self {
        Self {
            current: value,
            target: value,
            step: 0.0,
            num_pending_steps: 0,
            duration,
        }
    }

    /// Default ramp duration in steps, used in [`SmoothedValue::set_target`].
    #[inline(always)]
    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: u32) {
        self.duration = duration;
    }

    /// Number of steps left until current reaches the target.
    #[inline(always)]
    pub fn pending_steps(&self) -> u32 {
        self.num_pending_steps
    }

    /// Set a new target, reaching it in exactly `duration` steps, or the default duration
    /// when `None` is passed. A zero duration applies the target immediately.
    pub fn set_target_with_duration(&mut self, target: f32, duration: Option<u32>) {
        self.target = target;
        let steps = duration.unwrap_or(self.duration);
        if steps == 0 || self.current == self.target {
            self.current = self.target;
            self.num_pending_steps = 0;
        } else {
            self.step = (self.target - self.current) / steps as f32;
            self.num_pending_steps = steps;
        }
    }

    pub fn reset(&mut self) {
        self.init(self.target);
    }
}

impl SmoothedValue for LinearSmoothedValue {
    #[inline(always)]
    fn current(&self) -> f32 {
        self.current
    }

    #[inline(always)]
    fn target(&self) -> f32 {
        self.target
    }

    #[inline(always)]
    fn need_ramp(&self) -> bool {
        self.num_pending_steps > 0
    }

    #[inline]
    fn ramp(&mut self) {
        if self.num_pending_steps > 0 {
            self.current += self.step;
            self.num_pending_steps -= 1;
            if self.num_pending_steps == 0 {
                // avoid accumulated rounding errors
                self.current = self.target;
            }
        }
    }

    fn init(&mut self, value: f32) {
        self.target = value;
        self.current = value;
        self.num_pending_steps = 0;
    }

    fn set_target(&mut self, target: f32) {
        self.set_target_with_duration(target, None);
    }
}

impl Default for LinearSmoothedValue {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl From<f32> for LinearSmoothedValue {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

// -------------------------------------------------------------------------------------------------

use crate::calc::clamp;

/// Shape of the decelerating glide after a flick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InertiaOptions {
    /// Scales release velocity into the natural glide distance.
    pub power: f64,
    pub time_constant_ms: f64,
    /// Distance from the target at which the glide snaps and completes.
    pub rest_delta: f64,
    pub min: f64,
    pub max: f64,
}

impl InertiaOptions {
    /// Derives the glide shape from the timeline's friction and threshold.
    pub fn for_friction(friction: f64, velocity_threshold: f64, min: f64, max: f64) -> Self {
        Self {
            power: 0.8,
            time_constant_ms: 700.0 * (1.0 - friction) + 100.0,
            rest_delta: velocity_threshold,
            min,
            max,
        }
    }
}

/// Exponential approach `target - amplitude * e^(-t / tc)`.
#[derive(Debug, Clone)]
pub struct InertiaAnimation {
    target: f64,
    amplitude: f64,
    options: InertiaOptions,
    started_ms: f64,
}

impl InertiaAnimation {
    /// Starts a glide from `from` with the given release `velocity`.
    /// `modify_target` receives the natural resting point and may replace it.
    pub fn new(
        now_ms: f64,
        from: f64,
        velocity: f64,
        options: InertiaOptions,
        modify_target: impl FnOnce(f64) -> f64,
    ) -> Self {
        let natural = from + options.power * velocity;
        let target = clamp(modify_target(natural), options.min, options.max);
        Self {
            target,
            amplitude: target - from,
            options,
            started_ms: now_ms,
        }
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Position at `now_ms` and whether the glide has settled.
    pub fn step(&self, now_ms: f64) -> (f64, bool) {
        let elapsed = (now_ms - self.started_ms).max(0.0);
        let tc = self.options.time_constant_ms.max(1.0);
        let delta = -self.amplitude * (-elapsed / tc).exp();
        if delta.abs() <= self.options.rest_delta {
            return (self.target, true);
        }
        let position = clamp(self.target + delta, self.options.min, self.options.max);
        (position, false)
    }
}

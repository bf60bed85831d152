use crate::calc::clamp;

/// Damped-oscillator parameters for seeking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConfig {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
    /// Position tolerance for settling, in seconds.
    pub rest_delta: f64,
    /// Speed tolerance for settling, in seconds per second.
    pub rest_speed: f64,
}

impl SpringConfig {
    /// Soft approach used for general seeks.
    pub const SMOOTH: SpringConfig = SpringConfig {
        stiffness: 120.0,
        damping: 20.0,
        mass: 1.0,
        rest_delta: 0.01,
        rest_speed: 0.05,
    };

    /// Quick, lightly damped approach used when jumping to an event.
    pub const SNAPPY: SpringConfig = SpringConfig {
        stiffness: 400.0,
        damping: 35.0,
        mass: 1.0,
        rest_delta: 0.01,
        rest_speed: 0.05,
    };

    pub fn critical_damping(&self) -> f64 {
        2.0 * (self.stiffness.max(0.0001) * self.mass.max(0.0001)).sqrt()
    }
}

const MAX_SUBSTEP_SECS: f64 = 0.004;

#[derive(Debug, Clone)]
pub struct SpringAnimation {
    position: f64,
    velocity: f64,
    target: f64,
    config: SpringConfig,
    min: f64,
    max: f64,
    last_ms: f64,
}

impl SpringAnimation {
    pub fn new(
        now_ms: f64,
        from: f64,
        target: f64,
        velocity: f64,
        config: SpringConfig,
        min: f64,
        max: f64,
    ) -> Self {
        Self {
            position: clamp(from, min, max),
            velocity,
            target: clamp(target, min, max),
            config,
            min,
            max,
            last_ms: now_ms,
        }
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Integrates up to `now_ms` with semi-implicit Euler substeps.
    pub fn step(&mut self, now_ms: f64) -> (f64, bool) {
        let mut remaining = ((now_ms - self.last_ms) / 1000.0).max(0.0);
        self.last_ms = self.last_ms.max(now_ms);

        let k = self.config.stiffness.max(0.0001);
        let c = self.config.damping.max(0.0);
        let m = self.config.mass.max(0.0001);

        while remaining > 0.0 {
            let dt = remaining.min(MAX_SUBSTEP_SECS);
            remaining -= dt;
            let acceleration = (k * (self.target - self.position) - c * self.velocity) / m;
            self.velocity += acceleration * dt;
            self.position += self.velocity * dt;

            if self.position < self.min || self.position > self.max {
                self.position = clamp(self.position, self.min, self.max);
                self.velocity = 0.0;
            }
        }

        let settled = self.velocity.abs() < self.config.rest_speed
            && (self.target - self.position).abs() < self.config.rest_delta;
        if settled {
            self.position = self.target;
            self.velocity = 0.0;
        }
        (self.position, settled)
    }
}

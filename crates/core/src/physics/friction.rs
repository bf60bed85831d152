use crate::calc::clamp;

/// Frame length the friction coefficient is expressed against.
pub const FRICTION_REFERENCE_MS: f64 = 16.67;

/// Upper bound on simulated frames when projecting a momentum target.
pub const MAX_MOMENTUM_STEPS: usize = 1000;

/// Exponential decay of `velocity` over `dt_ms`, normalised to a 60 Hz frame
/// so a given `friction` behaves the same at any frame rate.
pub fn apply_friction(velocity: f64, friction: f64, dt_ms: f64) -> f64 {
    if !(dt_ms > 0.0) {
        return velocity;
    }
    velocity * friction.powf(dt_ms / FRICTION_REFERENCE_MS)
}

/// Inputs for projecting where a released scrub settles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentumParams {
    pub friction: f64,
    pub velocity_threshold: f64,
    pub min: f64,
    pub max: f64,
}

/// Simulates friction at ~60 Hz until the velocity drops under the threshold
/// and returns the clamped resting position. Pure.
pub fn momentum_target(time: f64, velocity: f64, params: &MomentumParams) -> f64 {
    let step_secs = FRICTION_REFERENCE_MS / 1000.0;
    let mut position = time;
    let mut velocity = velocity;
    let mut steps = 0;
    while velocity.abs() > params.velocity_threshold && steps < MAX_MOMENTUM_STEPS {
        position += velocity * step_secs;
        velocity = apply_friction(velocity, params.friction, FRICTION_REFERENCE_MS);
        steps += 1;
    }
    clamp(position, params.min, params.max)
}

/// Explicit per-frame friction integration. Contact with either bound is
/// inelastic: the position clamps and velocity drops to zero.
#[derive(Debug, Clone)]
pub struct FrictionLoop {
    position: f64,
    velocity: f64,
    params: MomentumParams,
    last_ms: f64,
}

impl FrictionLoop {
    pub fn new(now_ms: f64, position: f64, velocity: f64, params: MomentumParams) -> Self {
        Self {
            position: clamp(position, params.min, params.max),
            velocity,
            params,
            last_ms: now_ms,
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Advances to `now_ms`; returns the new position and whether motion ended.
    pub fn step(&mut self, now_ms: f64) -> (f64, bool) {
        let dt = now_ms - self.last_ms;
        if dt > 0.0 {
            self.last_ms = now_ms;
            self.position += self.velocity * dt / 1000.0;
            self.velocity = apply_friction(self.velocity, self.params.friction, dt);

            if self.position <= self.params.min {
                self.position = self.params.min;
                self.velocity = 0.0;
            } else if self.position >= self.params.max {
                self.position = self.params.max;
                self.velocity = 0.0;
            }
        }
        let done = self.velocity.abs() < self.params.velocity_threshold;
        (self.position, done)
    }
}

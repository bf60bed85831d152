//! Momentum, spring seeking and friction drivers for the playhead.
//!
//! A [`PhysicsEngine`] owns at most one active driver. Starting a driver
//! synchronously stops the previous one and drops its handlers, so a
//! cancelled motion never reports completion.

mod friction;
mod inertia;
mod spring;
mod velocity;

use std::fmt;

use crate::{calc::clamp, frame::FrameLoop, TimelineConfig};

pub use friction::{
    apply_friction, momentum_target, FrictionLoop, MomentumParams, FRICTION_REFERENCE_MS,
    MAX_MOMENTUM_STEPS,
};
pub use inertia::{InertiaAnimation, InertiaOptions};
pub use spring::{SpringAnimation, SpringConfig};
pub use velocity::{VelocityTracker, VELOCITY_SAMPLES, VELOCITY_WINDOW_MS};

/// Callbacks attached to one driver run.
#[derive(Default)]
pub struct MotionHandlers {
    on_update: Option<Box<dyn FnMut(f64)>>,
    on_complete: Option<Box<dyn FnOnce()>>,
}

impl MotionHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_update(mut self, f: impl FnMut(f64) + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for MotionHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionHandlers")
            .field("on_update", &self.on_update.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKind {
    Momentum,
    Spring,
    Friction,
}

/// Result of advancing the active driver by one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionFrame {
    pub kind: MotionKind,
    pub value: f64,
    pub completed: bool,
}

#[derive(Debug)]
enum Motion {
    Inertia(InertiaAnimation),
    Spring(SpringAnimation),
    Friction(FrictionLoop),
}

impl Motion {
    fn kind(&self) -> MotionKind {
        match self {
            Motion::Inertia(_) => MotionKind::Momentum,
            Motion::Spring(_) => MotionKind::Spring,
            Motion::Friction(_) => MotionKind::Friction,
        }
    }

    fn step(&mut self, now_ms: f64) -> (f64, bool) {
        match self {
            Motion::Inertia(glide) => glide.step(now_ms),
            Motion::Spring(spring) => spring.step(now_ms),
            Motion::Friction(friction) => friction.step(now_ms),
        }
    }
}

#[derive(Debug)]
struct ActiveMotion {
    motion: Motion,
    handlers: MotionHandlers,
}

/// Drives the playhead through momentum glides and spring seeks.
#[derive(Debug)]
pub struct PhysicsEngine {
    friction: f64,
    velocity_threshold: f64,
    duration: f64,
    active: Option<ActiveMotion>,
    frames: FrameLoop,
    value: f64,
    destroyed: bool,
}

impl PhysicsEngine {
    pub fn new(config: &TimelineConfig) -> Self {
        Self {
            friction: config.friction,
            velocity_threshold: config.velocity_threshold,
            duration: config.duration,
            active: None,
            frames: FrameLoop::new(),
            value: 0.0,
            destroyed: false,
        }
    }

    /// Adopts a new configuration. Any running driver is stopped.
    pub fn configure(&mut self, config: &TimelineConfig) {
        self.stop();
        self.friction = config.friction;
        self.velocity_threshold = config.velocity_threshold;
        self.duration = config.duration;
        self.value = clamp(self.value, 0.0, self.duration);
    }

    /// Speed a release must exceed, in seconds per second, to glide.
    pub fn momentum_gate(&self) -> f64 {
        self.velocity_threshold * 10.0
    }

    pub fn momentum_params(&self) -> MomentumParams {
        MomentumParams {
            friction: self.friction,
            velocity_threshold: self.velocity_threshold,
            min: 0.0,
            max: self.duration,
        }
    }

    /// Glides from `time` with release `velocity` (seconds per second) to the
    /// friction-projected resting point. Returns `false` without touching the
    /// current driver when the velocity is under the flick gate.
    pub fn start_momentum(
        &mut self,
        now_ms: f64,
        time: f64,
        velocity: f64,
        handlers: MotionHandlers,
    ) -> bool {
        if self.destroyed || !velocity.is_finite() || velocity.abs() <= self.momentum_gate() {
            return false;
        }
        self.stop();

        let params = self.momentum_params();
        let target = momentum_target(time, velocity, &params);
        let options = InertiaOptions::for_friction(
            self.friction,
            self.velocity_threshold,
            0.0,
            self.duration,
        );
        let from = clamp(time, 0.0, self.duration);
        let glide = InertiaAnimation::new(now_ms, from, velocity, options, |_| target);
        tracing::debug!(time, velocity, target, "momentum started");
        self.begin(Motion::Inertia(glide), handlers, time);
        true
    }

    /// Springs from `from` to `target` with the smooth preset.
    pub fn seek_with_spring(
        &mut self,
        now_ms: f64,
        from: f64,
        target: f64,
        handlers: MotionHandlers,
    ) {
        self.start_spring(now_ms, from, target, SpringConfig::SMOOTH, handlers);
    }

    /// Springs to an event timestamp with the snappy preset.
    pub fn seek_to_event_with_spring(
        &mut self,
        now_ms: f64,
        from: f64,
        event_time: f64,
        handlers: MotionHandlers,
    ) {
        self.start_spring(now_ms, from, event_time, SpringConfig::SNAPPY, handlers);
    }

    pub fn start_spring(
        &mut self,
        now_ms: f64,
        from: f64,
        target: f64,
        config: SpringConfig,
        handlers: MotionHandlers,
    ) {
        if self.destroyed {
            return;
        }
        self.stop();
        let spring = SpringAnimation::new(now_ms, from, target, 0.0, config, 0.0, self.duration);
        tracing::debug!(from, target = spring.target(), "spring seek started");
        self.begin(Motion::Spring(spring), handlers, from);
    }

    /// Per-frame friction integration without a precomputed target.
    pub fn start_friction_loop(
        &mut self,
        now_ms: f64,
        time: f64,
        velocity: f64,
        handlers: MotionHandlers,
    ) -> bool {
        if self.destroyed || !velocity.is_finite() || velocity.abs() < self.velocity_threshold {
            return false;
        }
        self.stop();
        let motion = FrictionLoop::new(now_ms, time, velocity, self.momentum_params());
        tracing::debug!(time, velocity, "friction loop started");
        self.begin(Motion::Friction(motion), handlers, time);
        true
    }

    fn begin(&mut self, motion: Motion, handlers: MotionHandlers, from: f64) {
        self.value = clamp(from, 0.0, self.duration);
        self.frames.request();
        self.active = Some(ActiveMotion { motion, handlers });
    }

    /// Advances the active driver. Calls `on_update` with the committed value
    /// and, on natural completion only, `on_complete`.
    pub fn tick(&mut self, now_ms: f64) -> Option<MotionFrame> {
        let active = self.active.as_mut()?;
        let kind = active.motion.kind();
        let (raw, completed) = active.motion.step(now_ms);
        let value = clamp(raw, 0.0, self.duration);
        self.value = value;

        if let Some(on_update) = active.handlers.on_update.as_mut() {
            on_update(value);
        }

        if completed {
            self.frames.cancel();
            if let Some(finished) = self.active.take() {
                tracing::debug!(?kind, value, "motion settled");
                if let Some(on_complete) = finished.handlers.on_complete {
                    on_complete();
                }
            }
        }

        Some(MotionFrame {
            kind,
            value,
            completed,
        })
    }

    /// Cancels the active driver, leaving the last committed value in place.
    /// `on_complete` is not called. Returns whether a driver was running.
    pub fn stop(&mut self) -> bool {
        self.frames.cancel();
        match self.active.take() {
            Some(active) => {
                tracing::debug!(
                    kind = ?active.motion.kind(),
                    value = self.value,
                    "motion cancelled"
                );
                true
            }
            None => false,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_kind(&self) -> Option<MotionKind> {
        self.active.as_ref().map(|a| a.motion.kind())
    }

    /// Last value written by a driver.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn has_pending_frame(&self) -> bool {
        self.frames.is_live()
    }

    /// Releases the driver and frame request. Later starts are ignored.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.stop();
        self.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

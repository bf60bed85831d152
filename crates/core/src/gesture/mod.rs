//! Unified pointer/touch gesture recognition.
//!
//! Raw contacts go in through [`GestureRecognizer`]; classified
//! [`GestureEvent`]s come out of the single [`GestureReceiver`] handed back by
//! [`GestureRecognizer::attach`]. Every contact is a pointer id, so mouse, pen
//! and touch share one path. Two simultaneous contacts switch to pinch.

use std::{
    collections::BTreeMap,
    sync::mpsc::{self, Receiver, Sender},
};

use serde::{Deserialize, Serialize};

use crate::{calc::clamp, physics::VelocityTracker, GestureConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GestureKind {
    Tap,
    Drag,
    Flick,
    Pinch,
    LongPress,
}

/// Position inside the surface, each axis in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

/// One classified gesture message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureEvent {
    pub kind: GestureKind,
    pub position: NormalizedPoint,
    /// Horizontal velocity in surface widths per second.
    pub velocity: f64,
    /// Distance ratio against the start of a pinch.
    pub scale: Option<f64>,
    pub is_start: bool,
    pub is_end: bool,
    pub timestamp_ms: f64,
}

/// Receiving end of the recognizer's event channel.
#[derive(Debug)]
pub struct GestureReceiver {
    rx: Receiver<GestureEvent>,
}

impl GestureReceiver {
    /// Takes every event queued so far, oldest first.
    pub fn drain(&self) -> Vec<GestureEvent> {
        self.rx.try_iter().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: f64,
    y: f64,
}

impl Point {
    fn distance(self, other: Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    fn midpoint(self, other: Point) -> Point {
        Point {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Press {
    pointer_id: u32,
    start: Point,
    start_ms: f64,
    last: Point,
    last_ms: f64,
    /// Exponentially smoothed horizontal velocity in px/s.
    smoothed_velocity: f64,
    tracker: VelocityTracker,
    long_press_fired: bool,
}

impl Press {
    fn displacement(&self) -> f64 {
        self.start.distance(self.last)
    }
}

#[derive(Debug, Clone)]
struct Pinch {
    ids: [u32; 2],
    initial_distance: f64,
    scale: f64,
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Pressed(Press),
    Pinching(Pinch),
    /// A pinch ended while contacts remain down; wait for them to lift.
    Draining,
}

/// Classifies pointer streams into tap, drag, flick, pinch and long-press.
#[derive(Debug)]
pub struct GestureRecognizer {
    config: GestureConfig,
    width: f64,
    height: f64,
    contacts: BTreeMap<u32, Point>,
    phase: Phase,
    long_press_deadline: Option<f64>,
    tx: Option<Sender<GestureEvent>>,
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            width: 0.0,
            height: 0.0,
            contacts: BTreeMap::new(),
            phase: Phase::Idle,
            long_press_deadline: None,
            tx: None,
        }
    }

    /// Binds the recognizer to a surface of the given size and opens a fresh
    /// event channel. Re-attaching detaches first.
    pub fn attach(&mut self, width: f64, height: f64) -> GestureReceiver {
        self.detach();
        let (tx, rx) = mpsc::channel();
        self.tx = Some(tx);
        self.resize(width, height);
        tracing::debug!(width, height, "gesture recognizer attached");
        GestureReceiver { rx }
    }

    /// Drops the channel, pending timer and any in-flight interaction.
    /// Safe to call repeatedly.
    pub fn detach(&mut self) {
        if self.tx.take().is_some() {
            tracing::debug!("gesture recognizer detached");
        }
        self.long_press_deadline = None;
        self.contacts.clear();
        self.phase = Phase::Idle;
    }

    pub fn is_attached(&self) -> bool {
        self.tx.is_some()
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
    }

    pub fn has_pending_timer(&self) -> bool {
        self.long_press_deadline.is_some()
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    pub fn pointer_down(&mut self, pointer_id: u32, x: f64, y: f64, now_ms: f64) {
        if !self.is_attached() {
            return;
        }
        let point = Point { x, y };
        self.contacts.insert(pointer_id, point);

        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => {
                let mut tracker = VelocityTracker::new();
                tracker.push(now_ms, x);
                self.phase = Phase::Pressed(Press {
                    pointer_id,
                    start: point,
                    start_ms: now_ms,
                    last: point,
                    last_ms: now_ms,
                    smoothed_velocity: 0.0,
                    tracker,
                    long_press_fired: false,
                });
                self.long_press_deadline = Some(now_ms + self.config.long_press_ms);
                self.emit(GestureKind::Drag, point, 0.0, None, true, false, now_ms);
            }
            Phase::Pressed(press) => {
                self.long_press_deadline = None;
                let first = self.contacts.get(&press.pointer_id).copied().unwrap_or(press.last);
                let initial_distance = first.distance(point);
                self.phase = Phase::Pinching(Pinch {
                    ids: [press.pointer_id, pointer_id],
                    initial_distance,
                    scale: 1.0,
                });
                self.emit(
                    GestureKind::Pinch,
                    first.midpoint(point),
                    0.0,
                    Some(1.0),
                    true,
                    false,
                    now_ms,
                );
            }
            other => {
                // Extra contacts beyond two do not change the interaction.
                self.phase = other;
            }
        }
    }

    pub fn pointer_move(&mut self, pointer_id: u32, x: f64, y: f64, now_ms: f64) {
        if !self.is_attached() || !self.contacts.contains_key(&pointer_id) {
            return;
        }
        let point = Point { x, y };
        self.contacts.insert(pointer_id, point);

        let mut outgoing = None;
        match &mut self.phase {
            Phase::Pressed(press) if press.pointer_id == pointer_id => {
                let dt = now_ms - press.last_ms;
                if dt > 0.0 {
                    let instant = (x - press.last.x) / dt * 1000.0;
                    let w = self.config.velocity_smoothing;
                    press.smoothed_velocity = w * instant + (1.0 - w) * press.smoothed_velocity;
                }
                press.last = point;
                press.last_ms = now_ms;
                press.tracker.push(now_ms, x);
                if press.displacement() > self.config.tap_slop_px {
                    self.long_press_deadline = None;
                }
                outgoing = Some((GestureKind::Drag, point, press.smoothed_velocity, None));
            }
            Phase::Pinching(pinch) if pinch.ids.contains(&pointer_id) => {
                let a = self.contacts.get(&pinch.ids[0]).copied();
                let b = self.contacts.get(&pinch.ids[1]).copied();
                if let (Some(a), Some(b)) = (a, b) {
                    pinch.scale = if pinch.initial_distance > f64::EPSILON {
                        a.distance(b) / pinch.initial_distance
                    } else {
                        1.0
                    };
                    outgoing = Some((GestureKind::Pinch, a.midpoint(b), 0.0, Some(pinch.scale)));
                }
            }
            _ => {}
        }

        if let Some((kind, at, velocity_px, scale)) = outgoing {
            self.emit(kind, at, velocity_px, scale, false, false, now_ms);
        }
    }

    pub fn pointer_up(&mut self, pointer_id: u32, x: f64, y: f64, now_ms: f64) {
        if !self.is_attached() {
            return;
        }
        if let Some(point) = self.contacts.get_mut(&pointer_id) {
            *point = Point { x, y };
        }
        self.release(pointer_id, now_ms, false);
    }

    /// The host lost the pointer (capture lost, touch cancelled).
    pub fn pointer_cancel(&mut self, pointer_id: u32, now_ms: f64) {
        if !self.is_attached() {
            return;
        }
        self.release(pointer_id, now_ms, true);
    }

    fn release(&mut self, pointer_id: u32, now_ms: f64, cancelled: bool) {
        let Some(point) = self.contacts.remove(&pointer_id) else {
            return;
        };

        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Pressed(press) if press.pointer_id == pointer_id => {
                self.long_press_deadline = None;
                if cancelled {
                    self.emit(GestureKind::Drag, point, 0.0, None, false, true, now_ms);
                } else {
                    let (kind, velocity_px) = self.classify(&press, point, now_ms);
                    self.emit(kind, point, velocity_px, None, false, true, now_ms);
                }
            }
            Phase::Pinching(pinch) if pinch.ids.contains(&pointer_id) => {
                let other = pinch.ids.iter().find(|id| **id != pointer_id).copied();
                let center = other
                    .and_then(|id| self.contacts.get(&id).copied())
                    .map(|p| p.midpoint(point))
                    .unwrap_or(point);
                self.emit(
                    GestureKind::Pinch,
                    center,
                    0.0,
                    Some(pinch.scale),
                    false,
                    true,
                    now_ms,
                );
                self.phase = Phase::Draining;
            }
            other => self.phase = other,
        }

        if self.contacts.is_empty() {
            self.phase = Phase::Idle;
        }
    }

    /// Total classification of a release: tap, flick, or plain drag end.
    fn classify(&self, press: &Press, release: Point, now_ms: f64) -> (GestureKind, f64) {
        let displacement = press.start.distance(release);
        let duration = now_ms - press.start_ms;
        let velocity = press.tracker.velocity_at(now_ms);

        if displacement < self.config.tap_slop_px && duration < self.config.tap_max_duration_ms {
            (GestureKind::Tap, 0.0)
        } else if velocity.abs() > self.config.flick_velocity_px {
            (GestureKind::Flick, velocity)
        } else {
            (GestureKind::Drag, velocity)
        }
    }

    /// Fires the long-press once its deadline passes, provided the contact is
    /// still down and has stayed within the tap slop.
    pub fn poll(&mut self, now_ms: f64) {
        let Some(deadline) = self.long_press_deadline else {
            return;
        };
        if now_ms < deadline {
            return;
        }
        self.long_press_deadline = None;

        let mut fire_at = None;
        if let Phase::Pressed(press) = &mut self.phase {
            if !press.long_press_fired && press.displacement() < self.config.tap_slop_px {
                press.long_press_fired = true;
                fire_at = Some(press.last);
            }
        }
        if let Some(point) = fire_at {
            self.emit(GestureKind::LongPress, point, 0.0, None, true, false, now_ms);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn emit(
        &self,
        kind: GestureKind,
        at: Point,
        velocity_px: f64,
        scale: Option<f64>,
        is_start: bool,
        is_end: bool,
        now_ms: f64,
    ) {
        let Some(tx) = &self.tx else {
            return;
        };
        let event = GestureEvent {
            kind,
            position: self.normalize(at),
            velocity: if self.width > 0.0 {
                velocity_px / self.width
            } else {
                0.0
            },
            scale,
            is_start,
            is_end,
            timestamp_ms: now_ms,
        };
        // A dropped receiver only means nobody is listening anymore.
        let _ = tx.send(event);
    }

    fn normalize(&self, at: Point) -> NormalizedPoint {
        let axis = |value: f64, extent: f64| {
            if extent > 0.0 {
                clamp(value / extent, 0.0, 1.0)
            } else {
                0.0
            }
        };
        NormalizedPoint {
            x: axis(at.x, self.width),
            y: axis(at.y, self.height),
        }
    }
}

impl Drop for GestureRecognizer {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attached() -> (GestureRecognizer, GestureReceiver) {
        let mut recognizer = GestureRecognizer::new(GestureConfig::default());
        let rx = recognizer.attach(1000.0, 100.0);
        (recognizer, rx)
    }

    fn terminal(events: &[GestureEvent]) -> Vec<&GestureEvent> {
        events.iter().filter(|e| e.is_end).collect()
    }

    #[test]
    fn short_press_is_a_single_tap() {
        let (mut recognizer, rx) = attached();
        recognizer.pointer_down(1, 500.0, 50.0, 0.0);
        recognizer.pointer_move(1, 503.0, 52.0, 40.0);
        recognizer.pointer_up(1, 504.0, 52.0, 100.0);

        let events = rx.drain();
        let taps: Vec<_> = events.iter().filter(|e| e.kind == GestureKind::Tap).collect();
        assert_eq!(taps.len(), 1);
        assert!(taps[0].is_end);
        assert!((taps[0].position.x - 0.504).abs() < 1e-9);
        assert_eq!(terminal(&events).len(), 1);
        assert!(!recognizer.has_pending_timer());
    }

    #[test]
    fn fast_swipe_is_a_flick() {
        let (mut recognizer, rx) = attached();
        recognizer.pointer_down(1, 100.0, 50.0, 0.0);
        recognizer.pointer_move(1, 400.0, 50.0, 50.0);
        recognizer.pointer_up(1, 400.0, 50.0, 50.0);

        let events = rx.drain();
        let ends = terminal(&events);
        assert_eq!(ends.len(), 1);
        assert_eq!(ends[0].kind, GestureKind::Flick);
        assert!(ends[0].velocity * 1000.0 > 500.0);
    }

    #[test]
    fn slow_drag_ends_as_drag() {
        let (mut recognizer, rx) = attached();
        recognizer.pointer_down(1, 100.0, 50.0, 0.0);
        for step in 1..=10 {
            recognizer.pointer_move(1, 100.0 + step as f64 * 2.0, 50.0, step as f64 * 40.0);
        }
        recognizer.pointer_up(1, 120.0, 50.0, 420.0);

        let events = rx.drain();
        let ends = terminal(&events);
        assert_eq!(ends.len(), 1);
        assert_eq!(ends[0].kind, GestureKind::Drag);
        assert!(events[0].is_start);
    }

    #[test]
    fn moves_emit_smoothed_drag_updates() {
        let (mut recognizer, rx) = attached();
        recognizer.pointer_down(1, 0.0, 0.0, 0.0);
        recognizer.pointer_move(1, 100.0, 0.0, 100.0);
        let events = rx.drain();
        let update = events.last().unwrap();
        assert_eq!(update.kind, GestureKind::Drag);
        // 0.3 * 1000 px/s over a 1000px surface.
        assert!((update.velocity - 0.3).abs() < 1e-9);
    }

    #[test]
    fn two_contacts_pinch() {
        let (mut recognizer, rx) = attached();
        recognizer.pointer_down(1, 100.0, 50.0, 0.0);
        recognizer.pointer_down(2, 200.0, 50.0, 5.0);
        recognizer.pointer_move(2, 300.0, 50.0, 30.0);

        let events = rx.drain();
        let pinch = events
            .iter()
            .rev()
            .find(|e| e.kind == GestureKind::Pinch)
            .unwrap();
        assert!((pinch.scale.unwrap() - 2.0).abs() < 1e-9);
        assert!((pinch.position.x - 0.2).abs() < 1e-9);
        assert!(!recognizer.has_pending_timer());

        recognizer.pointer_up(1, 100.0, 50.0, 60.0);
        recognizer.pointer_up(2, 300.0, 50.0, 70.0);
        let events = rx.drain();
        assert_eq!(terminal(&events).len(), 1);
        assert_eq!(events[0].kind, GestureKind::Pinch);
        assert!(!recognizer.is_active());
    }

    #[test]
    fn long_press_fires_once_when_still() {
        let (mut recognizer, rx) = attached();
        recognizer.pointer_down(1, 500.0, 50.0, 0.0);
        recognizer.poll(499.0);
        recognizer.poll(500.0);
        recognizer.poll(900.0);
        recognizer.pointer_up(1, 500.0, 50.0, 1000.0);

        let events = rx.drain();
        let long_presses = events
            .iter()
            .filter(|e| e.kind == GestureKind::LongPress)
            .count();
        assert_eq!(long_presses, 1);
        let ends = terminal(&events);
        assert_eq!(ends.len(), 1);
        assert_eq!(ends[0].kind, GestureKind::Drag);
    }

    #[test]
    fn movement_cancels_long_press() {
        let (mut recognizer, rx) = attached();
        recognizer.pointer_down(1, 500.0, 50.0, 0.0);
        recognizer.pointer_move(1, 530.0, 50.0, 100.0);
        assert!(!recognizer.has_pending_timer());
        recognizer.poll(600.0);
        assert!(rx
            .drain()
            .iter()
            .all(|e| e.kind != GestureKind::LongPress));
    }

    #[test]
    fn detach_clears_timer_and_ignores_input() {
        let (mut recognizer, rx) = attached();
        recognizer.pointer_down(1, 500.0, 50.0, 0.0);
        assert!(recognizer.has_pending_timer());
        recognizer.detach();
        recognizer.detach();
        assert!(!recognizer.has_pending_timer());
        recognizer.poll(1000.0);
        recognizer.pointer_up(1, 500.0, 50.0, 100.0);
        let events = rx.drain();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_start);
    }

    #[test]
    fn cancel_yields_drag_end() {
        let (mut recognizer, rx) = attached();
        recognizer.pointer_down(1, 500.0, 50.0, 0.0);
        recognizer.pointer_cancel(1, 20.0);
        let events = rx.drain();
        let ends = terminal(&events);
        assert_eq!(ends.len(), 1);
        assert_eq!(ends[0].kind, GestureKind::Drag);
        assert_eq!(ends[0].velocity, 0.0);
    }
}

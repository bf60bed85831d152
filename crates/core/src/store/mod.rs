//! Central timeline store.
//!
//! The only place timeline state is mutated. Every action runs to completion
//! against `&mut self`, so derived values (highlight, viewport, filtered
//! events) are recomputed inside the same action that invalidated them and no
//! reader ever sees a half-applied update.

pub mod selectors;
mod state;

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    calc::{calculate_zoom_focal_point, clamp, ZoomState},
    event::{apply_filters, find_nearest_event, sort_events},
    signal::TimeSignal,
    EventType, FilterState, RevealPhase, Result, ScrubError, SecurityEvent, Severity,
    TimelineConfig, TimelineConfigPatch,
};

pub use state::{PhysicsState, SelectionState, TimelineState, ViewportState};

/// Discrete state handed to batched consumers.
pub type TimelineSnapshot = TimelineState;

/// Weight of the newest sample when smoothing drag velocity.
const DRAG_SMOOTHING: f64 = 0.3;
/// Keyboard step sizes in seconds.
const FINE_STEP_SECS: f64 = 1.0;
const COARSE_STEP_SECS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepDirection {
    Backward,
    Forward,
}

/// Velocity handed to the physics engine when a drag ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragRelease {
    /// Timeline seconds per second.
    pub velocity: f64,
    pub has_momentum: bool,
}

type Listener = Box<dyn FnMut(&TimelineState)>;

/// Handle returned by [`TimelineStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub struct TimelineStore {
    state: TimelineState,
    time: TimeSignal,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    pinch_base_zoom: Option<f64>,
}

impl TimelineStore {
    pub fn new() -> Self {
        Self::with_config(TimelineConfig::default())
    }

    pub fn with_config(config: TimelineConfig) -> Self {
        Self {
            state: TimelineState::new(config),
            time: TimeSignal::new(0.0),
            listeners: Vec::new(),
            next_listener: 0,
            pinch_base_zoom: None,
        }
    }

    pub fn state(&self) -> &TimelineState {
        &self.state
    }

    /// Owned copy of the current state for batched consumers.
    pub fn snapshot(&self) -> TimelineSnapshot {
        self.state.clone()
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.state.config
    }

    pub fn current_time(&self) -> f64 {
        self.state.current_time
    }

    pub fn duration(&self) -> f64 {
        self.state.config.duration
    }

    /// Continuously updating playhead for frame-accurate consumers.
    pub fn time_signal(&self) -> TimeSignal {
        self.time.clone()
    }

    /// Registers a listener notified with the full state after each action.
    pub fn subscribe(&mut self, listener: impl FnMut(&TimelineState) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.retain(|(existing, _)| *existing != id);
    }

    fn notify(&mut self) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state);
        }
    }

    /// Drops every listener and detaches time subscribers.
    pub fn clear_subscribers(&mut self) {
        self.listeners.clear();
        self.time.clear_subscribers();
    }

    // ---------------------------------------------------------------- session

    /// Loads a session. Config is merged over defaults, events are sorted and
    /// filtered once, and every per-session field starts fresh. Filters and
    /// container size carry over. Calling it twice with the same input yields
    /// the same state.
    pub fn initialize(
        &mut self,
        events: &[SecurityEvent],
        patch: &TimelineConfigPatch,
    ) -> Result<()> {
        let config = TimelineConfig::from_patch(patch)?;
        let filters = self.state.filters.clone();
        let (width, height) = (
            self.state.viewport.container_width,
            self.state.viewport.container_height,
        );

        let mut state = TimelineState::new(config);
        state.sorted_events = sort_events(events);
        state.filters = filters;
        state.filtered_events = apply_filters(&state.sorted_events, &state.filters);
        state.viewport.container_width = width;
        state.viewport.container_height = height;
        self.state = state;
        self.pinch_base_zoom = None;

        tracing::debug!(
            events = self.state.sorted_events.len(),
            duration = self.state.config.duration,
            "timeline initialized"
        );
        self.commit_time(0.0);
        Ok(())
    }

    pub fn set_container_size(&mut self, width: f64, height: f64) {
        self.state.viewport.container_width = width.max(0.0);
        self.state.viewport.container_height = height.max(0.0);
        self.recompute_viewport();
        self.notify();
    }

    // ------------------------------------------------------------------- time

    /// Single funnel for every time change: clamp, then recompute the
    /// highlighted event, then publish.
    fn commit_time(&mut self, time: f64) {
        let duration = self.state.config.duration;
        let clamped = clamp(time, 0.0, duration);
        if time.is_finite() && (time < 0.0 || time > duration) {
            tracing::trace!(requested = time, clamped, "seek clamped");
        }
        self.state.current_time = clamped;
        self.update_highlighted_event_inner();
        self.time.set(clamped);
        self.notify();
    }

    pub fn seek(&mut self, time: f64) {
        self.commit_time(time);
    }

    pub fn seek_relative(&mut self, delta: f64) {
        self.commit_time(self.state.current_time + delta);
    }

    pub fn seek_to_start(&mut self) {
        self.commit_time(0.0);
    }

    pub fn seek_to_end(&mut self) {
        self.commit_time(self.state.config.duration);
    }

    /// Seeks to an event and selects it.
    pub fn seek_to_event(&mut self, event_id: &str) -> Result<f64> {
        let timestamp = self
            .event(event_id)
            .map(|event| event.timestamp)
            .ok_or_else(|| ScrubError::UnknownEvent(event_id.to_string()))?;
        self.state.selection.selected_event_id = Some(event_id.to_string());
        self.commit_time(timestamp);
        Ok(self.state.current_time)
    }

    /// Seeks to the first visible event strictly after the playhead.
    pub fn seek_to_next_event(&mut self) -> Option<f64> {
        let target = selectors::next_event(&self.state)?.id.clone();
        self.seek_to_event(&target).ok()
    }

    /// Seeks to the last visible event strictly before the playhead.
    pub fn seek_to_previous_event(&mut self) -> Option<f64> {
        let target = selectors::previous_event(&self.state)?.id.clone();
        self.seek_to_event(&target).ok()
    }

    /// Keyboard pass-through: one fine or coarse step.
    pub fn step_seek(&mut self, direction: StepDirection, coarse: bool) {
        let step = if coarse { COARSE_STEP_SECS } else { FINE_STEP_SECS };
        match direction {
            StepDirection::Backward => self.seek_relative(-step),
            StepDirection::Forward => self.seek_relative(step),
        }
    }

    /// Recomputes the highlighted event for the current time.
    pub fn update_highlighted_event(&mut self) {
        self.update_highlighted_event_inner();
        self.notify();
    }

    fn update_highlighted_event_inner(&mut self) {
        let highlighted = find_nearest_event(
            &self.state.filtered_events,
            self.state.current_time,
            self.state.config.highlight_threshold,
        )
        .map(|event| event.id.clone());
        self.state.selection.highlighted_event_id = highlighted;
    }

    pub fn event(&self, event_id: &str) -> Option<&SecurityEvent> {
        self.state.sorted_events.iter().find(|e| e.id == event_id)
    }

    // --------------------------------------------------------------- playback

    /// Starts playback. Refused while a drag is in progress.
    pub fn play(&mut self) -> bool {
        if self.state.physics.is_dragging {
            return false;
        }
        if !self.state.playback.is_playing {
            self.state.playback.is_playing = true;
            self.notify();
        }
        true
    }

    pub fn pause(&mut self) {
        if self.state.playback.is_playing {
            self.state.playback.is_playing = false;
            self.notify();
        }
    }

    pub fn toggle_play(&mut self) -> bool {
        if self.state.playback.is_playing {
            self.pause();
            false
        } else {
            self.play()
        }
    }

    /// Snaps to the nearest ladder speed and returns it.
    pub fn set_speed(&mut self, speed: f64) -> f64 {
        let snapped = crate::config::nearest_speed(&self.state.config.playback_speeds, speed);
        self.state.playback.speed = snapped;
        self.notify();
        snapped
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.state.playback.is_looping = looping;
        self.notify();
    }

    pub fn toggle_loop(&mut self) -> bool {
        let looping = !self.state.playback.is_looping;
        self.set_looping(looping);
        looping
    }

    // ------------------------------------------------------------------- zoom

    /// Zooms to `level` keeping the point at `center` (normalised within the
    /// viewport, default middle) fixed. Returns the clamped level.
    pub fn zoom_to(&mut self, level: f64, center: Option<f64>) -> f64 {
        let config = &self.state.config;
        let requested = if level.is_finite() { level } else { config.min_zoom };
        let new_level = clamp(requested, config.min_zoom, config.max_zoom);
        let old = self.state.zoom;
        let center = clamp(center.unwrap_or(0.5), 0.0, 1.0);

        self.state.zoom = ZoomState {
            level: new_level,
            focal_point: calculate_zoom_focal_point(old.focal_point, old.level, new_level, center),
            is_zooming: old.is_zooming,
        };
        self.recompute_viewport();
        self.notify();
        new_level
    }

    pub fn zoom_in(&mut self, center: Option<f64>) -> f64 {
        let level = self.state.zoom.level * self.state.config.zoom_step;
        self.zoom_to(level, center)
    }

    pub fn zoom_out(&mut self, center: Option<f64>) -> f64 {
        let level = self.state.zoom.level / self.state.config.zoom_step;
        self.zoom_to(level, center)
    }

    pub fn reset_zoom(&mut self) {
        self.state.zoom = ZoomState {
            level: self.state.config.min_zoom,
            ..ZoomState::default()
        };
        self.recompute_viewport();
        self.notify();
    }

    /// Pans by moving the focal point; clamped so the window stays inside the
    /// session.
    pub fn set_focal_point(&mut self, focal_point: f64) {
        let level = self.state.zoom.level.max(1.0);
        let (lo, hi) = (0.5 / level, 1.0 - 0.5 / level);
        self.state.zoom.focal_point = if lo > hi {
            0.5
        } else {
            clamp(focal_point, lo, hi)
        };
        self.recompute_viewport();
        self.notify();
    }

    pub fn set_zooming(&mut self, zooming: bool) {
        self.state.zoom.is_zooming = zooming;
        self.notify();
    }

    /// Records the zoom level a pinch scales from.
    pub fn begin_pinch(&mut self) {
        self.pinch_base_zoom = Some(self.state.zoom.level);
        self.set_zooming(true);
    }

    pub fn update_pinch(&mut self, scale: f64, center: f64) -> f64 {
        let base = *self.pinch_base_zoom.get_or_insert(self.state.zoom.level);
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        self.zoom_to(base * scale, Some(center))
    }

    pub fn end_pinch(&mut self) {
        self.pinch_base_zoom = None;
        self.set_zooming(false);
    }

    fn recompute_viewport(&mut self) {
        let duration = self.state.config.duration;
        let zoom = self.state.zoom;
        self.state.viewport.recompute(duration, &zoom);
    }

    // ---------------------------------------------------------------- filters

    pub fn set_severity_filter(&mut self, severities: BTreeSet<Severity>) {
        self.state.filters.severities = severities;
        self.refilter();
    }

    pub fn toggle_severity(&mut self, severity: Severity) {
        let set = &mut self.state.filters.severities;
        if !set.remove(&severity) {
            set.insert(severity);
        }
        self.refilter();
    }

    pub fn set_type_filter(&mut self, types: BTreeSet<EventType>) {
        self.state.filters.types = types;
        self.refilter();
    }

    pub fn toggle_type(&mut self, event_type: EventType) {
        let set = &mut self.state.filters.types;
        if !set.remove(&event_type) {
            set.insert(event_type);
        }
        self.refilter();
    }

    pub fn reset_filters(&mut self) {
        self.state.filters = FilterState::default();
        self.refilter();
    }

    fn refilter(&mut self) {
        self.state.filtered_events = apply_filters(&self.state.sorted_events, &self.state.filters);
        self.update_highlighted_event_inner();
        self.notify();
    }

    // ------------------------------------------------------------------- drag

    /// Begins a scrub at pointer `x` (container pixels). Pauses playback.
    pub fn start_drag(&mut self, x: f64, now_ms: f64) {
        self.state.playback.is_playing = false;
        self.state.physics = PhysicsState {
            velocity: 0.0,
            has_momentum: false,
            is_dragging: true,
            last_pointer_x: x,
            last_timestamp_ms: now_ms,
        };
        self.notify();
    }

    /// Moves the playhead by the pixel delta under the current zoom and
    /// updates the smoothed velocity.
    pub fn update_drag(&mut self, x: f64, now_ms: f64) {
        if !self.state.physics.is_dragging || !x.is_finite() {
            return;
        }
        let width = self.state.viewport.container_width;
        let span = self.state.viewport.visible_duration();
        let dx = x - self.state.physics.last_pointer_x;
        let delta_time = if width > 0.0 { dx / width * span } else { 0.0 };

        let dt = now_ms - self.state.physics.last_timestamp_ms;
        if dt > 0.0 {
            let instant = delta_time / (dt / 1000.0);
            let physics = &mut self.state.physics;
            physics.velocity = DRAG_SMOOTHING * instant + (1.0 - DRAG_SMOOTHING) * physics.velocity;
        }
        self.state.physics.last_pointer_x = x;
        self.state.physics.last_timestamp_ms = now_ms;

        self.commit_time(self.state.current_time + delta_time);
    }

    /// Ends the scrub and reports whether the release should glide.
    pub fn end_drag(&mut self) -> DragRelease {
        let velocity = if self.state.physics.is_dragging {
            self.state.physics.velocity
        } else {
            0.0
        };
        let has_momentum = velocity.abs() > self.state.config.velocity_threshold * 10.0;
        self.state.physics = if has_momentum {
            PhysicsState {
                velocity,
                has_momentum,
                is_dragging: false,
                ..self.state.physics.clone()
            }
        } else {
            PhysicsState::default()
        };
        self.notify();
        DragRelease {
            velocity,
            has_momentum,
        }
    }

    /// Overrides the release velocity, e.g. with a flick measured by the
    /// gesture layer.
    pub fn set_release_velocity(&mut self, velocity: f64) -> DragRelease {
        let has_momentum =
            velocity.is_finite() && velocity.abs() > self.state.config.velocity_threshold * 10.0;
        self.state.physics.velocity = if velocity.is_finite() { velocity } else { 0.0 };
        self.state.physics.has_momentum = has_momentum;
        self.state.physics.is_dragging = false;
        self.notify();
        DragRelease {
            velocity: self.state.physics.velocity,
            has_momentum,
        }
    }

    /// Clears leftover momentum bookkeeping once motion settles or is cut.
    pub fn reset_physics(&mut self) {
        if self.state.physics != PhysicsState::default() {
            self.state.physics = PhysicsState::default();
            self.notify();
        }
    }

    // -------------------------------------------------------------- selection

    pub fn select_event(&mut self, event_id: Option<String>) {
        self.state.selection.selected_event_id = event_id;
        self.notify();
    }

    pub fn hover_event(&mut self, event_id: Option<String>) {
        self.state.selection.hovered_event_id = event_id;
        self.notify();
    }

    pub fn expand_event(&mut self, event_id: Option<String>) {
        self.state.selection.expanded_event_id = event_id;
        self.notify();
    }

    pub fn toggle_expanded(&mut self, event_id: &str) {
        let expanded = &mut self.state.selection.expanded_event_id;
        if expanded.as_deref() == Some(event_id) {
            *expanded = None;
        } else {
            *expanded = Some(event_id.to_string());
        }
        self.notify();
    }

    pub fn clear_selection(&mut self) {
        let highlighted = self.state.selection.highlighted_event_id.take();
        self.state.selection = SelectionState {
            highlighted_event_id: highlighted,
            ..SelectionState::default()
        };
        self.notify();
    }

    // -------------------------------------------------------------- animation

    /// Moves the reveal forward. Returns `false` (and changes nothing) when
    /// `phase` is not strictly later than the current one.
    pub fn advance_reveal_phase(&mut self, phase: RevealPhase) -> bool {
        if phase <= self.state.animation.reveal_phase {
            return false;
        }
        self.state.animation.reveal_phase = phase;
        self.notify();
        true
    }

    pub fn reset_reveal(&mut self) {
        self.state.animation.reveal_phase = RevealPhase::Hidden;
        self.state.animation.morphing_event_id = None;
        self.notify();
    }

    pub fn set_morphing_event(&mut self, event_id: Option<String>) {
        self.state.animation.morphing_event_id = event_id;
        self.notify();
    }
}

impl Default for TimelineStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TimelineStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineStore")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    fn event(id: &str, timestamp: f64, severity: Severity, event_type: EventType) -> SecurityEvent {
        SecurityEvent::new(id, timestamp, event_type, severity, id)
    }

    fn sample_events() -> Vec<SecurityEvent> {
        vec![
            event("late", 80.0, Severity::Critical, EventType::VmDetected),
            event("early", 10.0, Severity::Info, EventType::WindowFocus),
            event("mid", 40.0, Severity::Warning, EventType::Clipboard),
        ]
    }

    fn store() -> TimelineStore {
        let mut store = TimelineStore::new();
        store
            .initialize(&sample_events(), &TimelineConfigPatch::with_duration(100.0))
            .unwrap();
        store.set_container_size(1000.0, 80.0);
        store
    }

    fn expected_highlight(state: &TimelineState) -> Option<String> {
        state
            .filtered_events
            .iter()
            .map(|e| (e, (e.timestamp - state.current_time).abs()))
            .filter(|(_, d)| *d <= state.config.highlight_threshold)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(e, _)| e.id.clone())
    }

    #[test]
    fn seek_is_always_clamped() {
        let mut store = store();
        for t in [-50.0, 0.0, 12.5, 100.0, 1e9, f64::NEG_INFINITY, f64::NAN] {
            store.seek(t);
            let now = store.current_time();
            assert!((0.0..=100.0).contains(&now), "{t} -> {now}");
        }
        store.seek(30.0);
        store.seek_relative(-100.0);
        assert_eq!(store.current_time(), 0.0);
        store.seek_to_end();
        assert_eq!(store.current_time(), 100.0);
    }

    #[test]
    fn zoom_is_always_clamped() {
        let mut store = store();
        for z in [-3.0, 0.0, 0.5, 2.0, 5.0, 99.0, f64::NAN] {
            let level = store.zoom_to(z, None);
            assert!((1.0..=5.0).contains(&level));
            assert_eq!(store.state().zoom.level, level);
        }
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut a = store();
        let first = a.snapshot();
        a.seek(55.0);
        a.zoom_to(3.0, Some(0.8));
        a.select_event(Some("mid".into()));
        a.initialize(&sample_events(), &TimelineConfigPatch::with_duration(100.0))
            .unwrap();
        assert_eq!(a.snapshot(), first);

        let ids: Vec<_> = first.sorted_events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["early", "mid", "late"]);
    }

    #[test]
    fn initialize_rejects_bad_config() {
        let mut store = TimelineStore::new();
        let patch = TimelineConfigPatch {
            friction: Some(2.0),
            ..Default::default()
        };
        assert!(store.initialize(&[], &patch).is_err());
    }

    #[test]
    fn highlight_follows_every_time_change() {
        let mut store = store();
        let actions: Vec<Box<dyn Fn(&mut TimelineStore)>> = vec![
            Box::new(|s| s.seek(12.0)),
            Box::new(|s| s.seek(25.0)),
            Box::new(|s| s.seek_relative(17.0)),
            Box::new(|s| s.seek_to_end()),
            Box::new(|s| s.step_seek(StepDirection::Backward, true)),
            Box::new(|s| s.seek_to_start()),
            Box::new(|s| {
                s.seek_to_event("late").unwrap();
            }),
        ];
        for action in actions {
            action(&mut store);
            let state = store.state();
            assert_eq!(state.selection.highlighted_event_id, expected_highlight(state));
        }
    }

    #[test]
    fn seek_to_unknown_event_errors() {
        let mut store = store();
        store.seek(5.0);
        let err = store.seek_to_event("nope").unwrap_err();
        assert!(matches!(err, ScrubError::UnknownEvent(_)));
        assert_eq!(store.current_time(), 5.0);
    }

    #[test]
    fn filters_recompute_synchronously() {
        let mut store = store();
        store.seek(10.0);
        assert_eq!(
            store.state().selection.highlighted_event_id.as_deref(),
            Some("early")
        );

        store.toggle_severity(Severity::Info);
        let state = store.state();
        assert_eq!(
            state.filtered_events,
            apply_filters(&state.sorted_events, &state.filters)
        );
        assert!(state.filtered_events.iter().all(|e| e.id != "early"));
        assert_eq!(state.selection.highlighted_event_id, None);

        store.set_type_filter([EventType::VmDetected].into_iter().collect());
        assert_eq!(store.state().filtered_events.len(), 1);
        store.reset_filters();
        assert_eq!(store.state().filtered_events.len(), 3);
    }

    #[test]
    fn zoom_keeps_viewport_in_sync() {
        let mut store = store();
        store.zoom_to(4.0, Some(1.0));
        let state = store.state();
        let range = crate::calc::calculate_visible_range(100.0, &state.zoom);
        assert_eq!(state.viewport.visible_start, range.start);
        assert_eq!(state.viewport.visible_end, range.end);
        assert!((state.viewport.visible_duration() - 25.0).abs() < 1e-9);

        store.reset_zoom();
        assert_eq!(store.state().viewport.visible_start, 0.0);
        assert_eq!(store.state().viewport.visible_end, 100.0);
    }

    #[test]
    fn zoom_steps_by_configured_factor() {
        let mut store = store();
        assert!((store.zoom_in(None) - 1.5).abs() < 1e-9);
        assert!((store.zoom_in(None) - 2.25).abs() < 1e-9);
        assert!((store.zoom_out(None) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn pinch_scales_from_base_level() {
        let mut store = store();
        store.zoom_to(2.0, None);
        store.begin_pinch();
        assert!(store.state().zoom.is_zooming);
        store.update_pinch(1.5, 0.5);
        assert!((store.update_pinch(2.0, 0.5) - 4.0).abs() < 1e-9);
        store.end_pinch();
        assert!(!store.state().zoom.is_zooming);
    }

    #[test]
    fn drag_pauses_playback_and_moves_time() {
        let mut store = store();
        store.play();
        store.seek(50.0);
        store.start_drag(500.0, 0.0);
        assert!(!store.state().playback.is_playing);
        assert!(!store.play());

        // 100px of 1000px at zoom 1 over 100s is 10s.
        store.update_drag(600.0, 16.0);
        assert!((store.current_time() - 60.0).abs() < 1e-9);
        assert!(store.state().physics.velocity > 0.0);

        let release = store.end_drag();
        assert!(release.has_momentum);
        assert!(!store.state().physics.is_dragging);
        assert!(store.play());
    }

    #[test]
    fn slow_drag_release_resets_physics() {
        let mut store = store();
        store.start_drag(500.0, 0.0);
        store.update_drag(501.0, 1000.0);
        let release = store.end_drag();
        assert!(!release.has_momentum);
        assert_eq!(store.state().physics, PhysicsState::default());
    }

    #[test]
    fn drag_respects_bounds() {
        let mut store = store();
        store.seek(95.0);
        store.start_drag(0.0, 0.0);
        store.update_drag(5000.0, 10.0);
        assert_eq!(store.current_time(), 100.0);
    }

    #[test]
    fn speed_snaps_to_ladder() {
        let mut store = store();
        assert_eq!(store.set_speed(1.7), 1.5);
        assert_eq!(store.state().playback.speed, 1.5);
        assert!(store.toggle_loop());
    }

    #[test]
    fn reveal_only_moves_forward() {
        let mut store = store();
        assert!(store.advance_reveal_phase(RevealPhase::MarkersStagger));
        assert!(!store.advance_reveal_phase(RevealPhase::TrackReveal));
        assert!(!store.advance_reveal_phase(RevealPhase::MarkersStagger));
        assert!(store.advance_reveal_phase(RevealPhase::Complete));
        store.reset_reveal();
        assert_eq!(store.state().animation.reveal_phase, RevealPhase::Hidden);
    }

    #[test]
    fn selection_fields_are_independent() {
        let mut store = store();
        store.select_event(Some("early".into()));
        store.hover_event(Some("mid".into()));
        store.toggle_expanded("late");
        let selection = &store.state().selection;
        assert_eq!(selection.selected_event_id.as_deref(), Some("early"));
        assert_eq!(selection.hovered_event_id.as_deref(), Some("mid"));
        assert_eq!(selection.expanded_event_id.as_deref(), Some("late"));
        store.toggle_expanded("late");
        assert_eq!(store.state().selection.expanded_event_id, None);
    }

    #[test]
    fn next_and_previous_event_navigation() {
        let mut store = store();
        store.seek(20.0);
        assert_eq!(store.seek_to_next_event(), Some(40.0));
        assert_eq!(store.seek_to_next_event(), Some(80.0));
        assert_eq!(store.seek_to_next_event(), None);
        assert_eq!(store.seek_to_previous_event(), Some(40.0));
    }

    #[test]
    fn listeners_and_time_signal_see_committed_state() {
        let mut store = store();
        let notified = Rc::new(Cell::new(0));
        let seen_time = Rc::new(Cell::new(-1.0));
        let counter = notified.clone();
        let id = store.subscribe(move |_| counter.set(counter.get() + 1));
        let sink = seen_time.clone();
        store.time_signal().subscribe(move |t| sink.set(*t));

        store.seek(33.0);
        assert_eq!(seen_time.get(), 33.0);
        assert!(notified.get() >= 1);

        store.unsubscribe(id);
        let before = notified.get();
        store.seek(34.0);
        assert_eq!(notified.get(), before);
    }
}

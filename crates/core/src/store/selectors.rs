//! Derived values computed from a state snapshot.

use crate::{
    calc::{format_time, inverse_lerp, time_to_normalized},
    event::events_in_range,
    SecurityEvent,
};

use super::TimelineState;

pub fn formatted_current_time(state: &TimelineState) -> String {
    format_time(state.current_time)
}

pub fn formatted_duration(state: &TimelineState) -> String {
    format_time(state.duration())
}

/// Playhead position in `[0, 1]`.
pub fn progress(state: &TimelineState) -> f64 {
    time_to_normalized(state.current_time, state.duration())
}

pub fn remaining_time(state: &TimelineState) -> f64 {
    (state.duration() - state.current_time).max(0.0)
}

/// Filtered events inside the current viewport.
pub fn visible_events(state: &TimelineState) -> &[SecurityEvent] {
    events_in_range(
        &state.filtered_events,
        state.viewport.visible_start,
        state.viewport.visible_end,
    )
}

/// Horizontal position of `event` within the viewport, as a percentage.
/// Events outside the window fall below 0 or above 100.
pub fn event_percent(state: &TimelineState, event: &SecurityEvent) -> f64 {
    inverse_lerp(
        state.viewport.visible_start,
        state.viewport.visible_end,
        event.timestamp,
    ) * 100.0
}

pub fn can_zoom_in(state: &TimelineState) -> bool {
    state.zoom.level < state.config.max_zoom
}

pub fn can_zoom_out(state: &TimelineState) -> bool {
    state.zoom.level > state.config.min_zoom
}

/// First filtered event strictly after the playhead.
pub fn next_event(state: &TimelineState) -> Option<&SecurityEvent> {
    let split = state
        .filtered_events
        .partition_point(|e| e.timestamp <= state.current_time);
    state.filtered_events.get(split)
}

/// Last filtered event strictly before the playhead.
pub fn previous_event(state: &TimelineState) -> Option<&SecurityEvent> {
    let split = state
        .filtered_events
        .partition_point(|e| e.timestamp < state.current_time);
    split.checked_sub(1).and_then(|i| state.filtered_events.get(i))
}

pub fn highlighted_event(state: &TimelineState) -> Option<&SecurityEvent> {
    let id = state.selection.highlighted_event_id.as_deref()?;
    state.filtered_events.iter().find(|e| e.id == id)
}

pub fn selected_event(state: &TimelineState) -> Option<&SecurityEvent> {
    let id = state.selection.selected_event_id.as_deref()?;
    state.sorted_events.iter().find(|e| e.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{calc::ZoomState, EventType, Severity, TimelineConfig, TimelineConfigPatch};

    fn state() -> TimelineState {
        let patch = TimelineConfigPatch::with_duration(100.0);
        let config = TimelineConfig::from_patch(&patch).unwrap();
        let mut state = TimelineState::new(config);
        let events: Vec<_> = [("a", 10.0), ("b", 40.0), ("c", 80.0)]
            .into_iter()
            .map(|(id, t)| SecurityEvent::new(id, t, EventType::Process, Severity::Info, id))
            .collect();
        state.sorted_events = events.clone();
        state.filtered_events = events;
        state
    }

    #[test]
    fn progress_and_remaining() {
        let mut state = state();
        state.current_time = 25.0;
        assert!((progress(&state) - 0.25).abs() < 1e-9);
        assert_eq!(remaining_time(&state), 75.0);
        assert_eq!(formatted_current_time(&state), "0:25");
        assert_eq!(formatted_duration(&state), "1:40");
    }

    #[test]
    fn visible_events_follow_viewport() {
        let mut state = state();
        state.zoom = ZoomState {
            level: 4.0,
            focal_point: 0.125,
            is_zooming: false,
        };
        let zoom = state.zoom;
        state.viewport.recompute(100.0, &zoom);
        let ids: Vec<_> = visible_events(&state).iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a"]);
        assert!((event_percent(&state, &state.filtered_events[0]) - 40.0).abs() < 1e-9);
        assert!(event_percent(&state, &state.filtered_events[2]) > 100.0);
    }

    #[test]
    fn zoom_availability() {
        let mut state = state();
        assert!(can_zoom_in(&state));
        assert!(!can_zoom_out(&state));
        state.zoom.level = state.config.max_zoom;
        assert!(!can_zoom_in(&state));
        assert!(can_zoom_out(&state));
    }

    #[test]
    fn neighbours_are_strict() {
        let mut state = state();
        state.current_time = 40.0;
        assert_eq!(next_event(&state).map(|e| e.id.as_str()), Some("c"));
        assert_eq!(previous_event(&state).map(|e| e.id.as_str()), Some("a"));
        state.current_time = 0.0;
        assert!(previous_event(&state).is_none());
    }
}

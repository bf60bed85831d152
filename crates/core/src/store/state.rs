use serde::{Deserialize, Serialize};

use crate::{
    calc::{calculate_visible_range, VisibleRange, ZoomState},
    AnimationState, FilterState, PlaybackState, SecurityEvent, TimelineConfig,
};

/// Ephemeral drag bookkeeping, reset after every gesture.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicsState {
    /// Smoothed scrub velocity in timeline seconds per second.
    pub velocity: f64,
    pub has_momentum: bool,
    pub is_dragging: bool,
    pub last_pointer_x: f64,
    pub last_timestamp_ms: f64,
}

/// Four independent event references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub selected_event_id: Option<String>,
    pub hovered_event_id: Option<String>,
    pub highlighted_event_id: Option<String>,
    pub expanded_event_id: Option<String>,
}

/// Derived from zoom and duration; never edited on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    pub visible_start: f64,
    pub visible_end: f64,
    pub container_width: f64,
    pub container_height: f64,
}

impl ViewportState {
    pub fn visible_range(&self) -> VisibleRange {
        VisibleRange {
            start: self.visible_start,
            end: self.visible_end,
        }
    }

    pub fn visible_duration(&self) -> f64 {
        self.visible_end - self.visible_start
    }

    pub(crate) fn recompute(&mut self, duration: f64, zoom: &ZoomState) {
        let range = calculate_visible_range(duration, zoom);
        self.visible_start = range.start;
        self.visible_end = range.end;
    }
}

/// Everything the store owns. Cloned as the discrete snapshot handed to
/// batched consumers and selectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineState {
    pub config: TimelineConfig,
    pub sorted_events: Vec<SecurityEvent>,
    pub filtered_events: Vec<SecurityEvent>,
    pub current_time: f64,
    pub playback: PlaybackState,
    pub zoom: ZoomState,
    pub filters: FilterState,
    pub physics: PhysicsState,
    pub selection: SelectionState,
    pub viewport: ViewportState,
    pub animation: AnimationState,
}

impl TimelineState {
    pub fn new(config: TimelineConfig) -> Self {
        let zoom = ZoomState {
            level: config.min_zoom,
            ..ZoomState::default()
        };
        let mut viewport = ViewportState::default();
        viewport.recompute(config.duration, &zoom);
        Self {
            playback: PlaybackState {
                speed: config.default_speed(),
                ..PlaybackState::default()
            },
            config,
            sorted_events: Vec::new(),
            filtered_events: Vec::new(),
            current_time: 0.0,
            zoom,
            filters: FilterState::default(),
            physics: PhysicsState::default(),
            selection: SelectionState::default(),
            viewport,
            animation: AnimationState::default(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.config.duration
    }
}

impl Default for TimelineState {
    fn default() -> Self {
        Self::new(TimelineConfig::default())
    }
}

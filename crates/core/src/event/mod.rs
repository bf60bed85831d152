use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{config::TimelineConfigPatch, Result, ScrubError};

/// Category of a recorded security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    WindowFocus,
    Clipboard,
    Process,
    ScreenRecording,
    VmDetected,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        EventType::WindowFocus,
        EventType::Clipboard,
        EventType::Process,
        EventType::ScreenRecording,
        EventType::VmDetected,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Info, Severity::Warning, Severity::Critical];
}

/// A single event captured during a monitored session. Owned by the caller;
/// the store keeps a sorted copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub id: String,
    /// Offset from session start in seconds.
    pub timestamp: f64,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub severity: Severity,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl SecurityEvent {
    pub fn new(
        id: impl Into<String>,
        timestamp: f64,
        event_type: EventType,
        severity: Severity,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            event_type,
            severity,
            title: title.into(),
            description: String::new(),
            metadata: None,
        }
    }
}

/// Returns a copy of `events` ordered by timestamp. Ties keep input order.
pub fn sort_events(events: &[SecurityEvent]) -> Vec<SecurityEvent> {
    let mut sorted = events.to_vec();
    sorted.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    sorted
}

/// Active severity and type sets. An empty set means "show all".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub severities: BTreeSet<Severity>,
    pub types: BTreeSet<EventType>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            severities: Severity::ALL.into_iter().collect(),
            types: EventType::ALL.into_iter().collect(),
        }
    }
}

impl FilterState {
    pub fn matches(&self, event: &SecurityEvent) -> bool {
        (self.severities.is_empty() || self.severities.contains(&event.severity))
            && (self.types.is_empty() || self.types.contains(&event.event_type))
    }
}

/// Keeps events accepted by `filters`, preserving order.
pub fn apply_filters(events: &[SecurityEvent], filters: &FilterState) -> Vec<SecurityEvent> {
    events
        .iter()
        .filter(|event| filters.matches(event))
        .cloned()
        .collect()
}

/// Nearest event to `time` within `threshold` seconds in a timestamp-sorted
/// slice. Equidistant neighbours resolve to the earlier event.
pub fn find_nearest_event(
    sorted: &[SecurityEvent],
    time: f64,
    threshold: f64,
) -> Option<&SecurityEvent> {
    if sorted.is_empty() || !time.is_finite() {
        return None;
    }
    let split = sorted.partition_point(|event| event.timestamp < time);
    let before = split.checked_sub(1).and_then(|i| sorted.get(i));
    let after = sorted.get(split);

    let nearest = match (before, after) {
        (Some(b), Some(a)) => {
            if (time - b.timestamp).abs() <= (a.timestamp - time).abs() {
                b
            } else {
                a
            }
        }
        (Some(b), None) => b,
        (None, Some(a)) => a,
        (None, None) => return None,
    };

    ((nearest.timestamp - time).abs() <= threshold).then_some(nearest)
}

/// Events with `start <= timestamp <= end` from a timestamp-sorted slice.
pub fn events_in_range(sorted: &[SecurityEvent], start: f64, end: f64) -> &[SecurityEvent] {
    let lo = sorted.partition_point(|event| event.timestamp < start);
    let hi = sorted.partition_point(|event| event.timestamp <= end);
    if lo >= hi {
        &[]
    } else {
        &sorted[lo..hi]
    }
}

/// Recorded session as loaded from disk or handed over by a host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub duration: f64,
    pub events: Vec<SecurityEvent>,
    #[serde(default)]
    pub config: Option<TimelineConfigPatch>,
}

impl SessionData {
    pub fn from_json(json: &str) -> Result<Self> {
        let session: SessionData = serde_json::from_str(json)?;
        if !session.duration.is_finite() || session.duration < 0.0 {
            return Err(ScrubError::msg(format!(
                "session duration must be a non-negative number, got {}",
                session.duration
            )));
        }
        Ok(session)
    }

    /// Config patch with the session duration folded in.
    pub fn config_patch(&self) -> TimelineConfigPatch {
        TimelineConfigPatch {
            duration: Some(self.duration),
            ..self.config.clone().unwrap_or_default()
        }
    }
}

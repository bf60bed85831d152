//! Pure coordinate and interpolation helpers.
//!
//! Every transform guards zero widths and durations by returning `0.0`, so
//! callers never observe NaN or infinities from a collapsed container.

use serde::{Deserialize, Serialize};

use crate::SecurityEvent;

/// Candidate label spacings in seconds, smallest first.
pub const LABEL_INTERVALS: [f64; 8] = [1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 600.0, 1800.0];

/// Zoom level together with the normalised time-position held fixed while
/// zooming.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomState {
    pub level: f64,
    pub focal_point: f64,
    pub is_zooming: bool,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self {
            level: 1.0,
            focal_point: 0.5,
            is_zooming: false,
        }
    }
}

/// Visible sub-range of the session in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibleRange {
    pub start: f64,
    pub end: f64,
}

impl VisibleRange {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }
}

#[inline]
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.max(min).min(max)
}

#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[inline]
pub fn inverse_lerp(a: f64, b: f64, value: f64) -> f64 {
    if b == a {
        0.0
    } else {
        (value - a) / (b - a)
    }
}

/// Hermite interpolation between `edge0` and `edge1`, clamped to [0, 1].
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    if edge1 == edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = clamp((x - edge0) / (edge1 - edge0), 0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Window of width `duration / zoom.level` centred on the focal point, shifted
/// (never shrunk) to stay inside `[0, duration]`.
pub fn calculate_visible_range(duration: f64, zoom: &ZoomState) -> VisibleRange {
    if !(duration > 0.0) {
        return VisibleRange { start: 0.0, end: 0.0 };
    }
    let level = if zoom.level > 0.0 { zoom.level } else { 1.0 };
    let width = (duration / level).min(duration);
    let center = clamp(zoom.focal_point, 0.0, 1.0) * duration;

    let mut start = center - width / 2.0;
    let mut end = center + width / 2.0;
    if start < 0.0 {
        end -= start;
        start = 0.0;
    }
    if end > duration {
        start -= end - duration;
        end = duration;
    }
    VisibleRange {
        start: start.max(0.0),
        end,
    }
}

/// Maps a container-relative pixel offset to absolute session time.
pub fn pixel_to_time(px: f64, width: f64, duration: f64, zoom: &ZoomState) -> f64 {
    if !(width > 0.0) || !(duration > 0.0) || !px.is_finite() {
        return 0.0;
    }
    let range = calculate_visible_range(duration, zoom);
    range.start + (px / width) * range.duration()
}

/// Maps absolute session time to a container-relative pixel offset.
pub fn time_to_pixel(time: f64, width: f64, duration: f64, zoom: &ZoomState) -> f64 {
    if !(width > 0.0) || !(duration > 0.0) || !time.is_finite() {
        return 0.0;
    }
    let range = calculate_visible_range(duration, zoom);
    let span = range.duration();
    if span <= 0.0 {
        return 0.0;
    }
    (time - range.start) / span * width
}

pub fn time_to_normalized(time: f64, duration: f64) -> f64 {
    if !(duration > 0.0) {
        return 0.0;
    }
    clamp(time / duration, 0.0, 1.0)
}

pub fn normalized_to_time(normalized: f64, duration: f64) -> f64 {
    if !(duration > 0.0) {
        return 0.0;
    }
    clamp(normalized, 0.0, 1.0) * duration
}

pub fn time_to_percent(time: f64, duration: f64) -> f64 {
    time_to_normalized(time, duration) * 100.0
}

pub fn percent_to_time(percent: f64, duration: f64) -> f64 {
    normalized_to_time(percent / 100.0, duration)
}

/// Focal point after a zoom step so that the position under `zoom_center`
/// (normalised within the viewport) stays visually fixed.
pub fn calculate_zoom_focal_point(
    old_focal: f64,
    old_zoom: f64,
    new_zoom: f64,
    zoom_center: f64,
) -> f64 {
    if !(old_zoom > 0.0) || !(new_zoom > 0.0) {
        return 0.5;
    }
    let shifted = old_focal + (zoom_center - 0.5) * (1.0 / old_zoom - 1.0 / new_zoom);
    let lo = 0.5 / new_zoom;
    let hi = 1.0 - 0.5 / new_zoom;
    if lo > hi {
        return 0.5;
    }
    clamp(shifted, lo, hi)
}

/// Converts a pointer velocity in pixels per second into timeline seconds per
/// second for the current viewport.
pub fn px_velocity_to_time_velocity(velocity_px: f64, width: f64, visible_duration: f64) -> f64 {
    if !(width > 0.0) || !velocity_px.is_finite() {
        return 0.0;
    }
    normalized_velocity_to_time_velocity(velocity_px / width, visible_duration)
}

/// Converts container-widths per second into timeline seconds per second.
pub fn normalized_velocity_to_time_velocity(velocity: f64, visible_duration: f64) -> f64 {
    if !velocity.is_finite() || !(visible_duration > 0.0) {
        return 0.0;
    }
    velocity * visible_duration
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeLabel {
    pub time: f64,
    pub position_px: f64,
    pub text: String,
}

/// Picks the smallest ladder interval yielding at most `desired_labels` labels
/// (further capped by how many fit at `min_spacing`) and emits one label per
/// multiple of it inside `range`.
pub fn generate_time_labels(
    range: VisibleRange,
    container_width: f64,
    min_spacing: f64,
    desired_labels: usize,
) -> Vec<TimeLabel> {
    let span = range.duration();
    if !(container_width > 0.0) || !(span > 0.0) {
        return Vec::new();
    }
    let fit = if min_spacing > 0.0 {
        (container_width / min_spacing).floor() as usize
    } else {
        desired_labels
    };
    let max_labels = desired_labels.min(fit).max(1) as f64;

    let interval = label_interval(span, max_labels);
    let mut labels = Vec::new();
    let mut tick = (range.start / interval).ceil();
    loop {
        let time = tick * interval;
        if time > range.end + f64::EPSILON {
            break;
        }
        labels.push(TimeLabel {
            time,
            position_px: (time - range.start) / span * container_width,
            text: format_time(time),
        });
        tick += 1.0;
    }
    labels
}

fn label_interval(span: f64, max_labels: f64) -> f64 {
    LABEL_INTERVALS
        .iter()
        .copied()
        .find(|interval| span / interval <= max_labels)
        .unwrap_or(LABEL_INTERVALS[LABEL_INTERVALS.len() - 1])
}

/// Formats seconds as `m:ss`, or `h:mm:ss` past the hour.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() {
        seconds.max(0.0).floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Snaps to the nearest event timestamp when one lies within `threshold`.
pub fn snap_to_event(time: f64, events: &[SecurityEvent], threshold: f64) -> f64 {
    events
        .iter()
        .map(|event| event.timestamp)
        .filter(|ts| (ts - time).abs() <= threshold)
        .min_by(|a, b| (a - time).abs().total_cmp(&(b - time).abs()))
        .unwrap_or(time)
}

/// Snaps to the nearest multiple of `interval` when within `threshold`.
pub fn snap_to_interval(time: f64, interval: f64, threshold: f64) -> f64 {
    if !(interval > 0.0) {
        return time;
    }
    let snapped = (time / interval).round() * interval;
    if (snapped - time).abs() <= threshold {
        snapped
    } else {
        time
    }
}

use serde::{Deserialize, Serialize};

use crate::{Result, ScrubError};

/// Immutable timeline configuration. Replaced wholesale on reconfiguration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineConfig {
    /// Session length in seconds.
    pub duration: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Multiplicative factor applied by zoom in/out.
    pub zoom_step: f64,
    /// Per-frame velocity retention in (0, 1), normalised to 60 Hz.
    pub friction: f64,
    /// Timeline seconds per second below which motion is considered settled.
    pub velocity_threshold: f64,
    /// Maximum distance in seconds for an event to count as highlighted.
    pub highlight_threshold: f64,
    pub auto_scroll_duration_ms: f64,
    /// Discrete playback speed ladder, ascending.
    pub playback_speeds: Vec<f64>,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            duration: 300.0,
            min_zoom: 1.0,
            max_zoom: 5.0,
            zoom_step: 1.5,
            friction: 0.92,
            velocity_threshold: 0.5,
            highlight_threshold: 5.0,
            auto_scroll_duration_ms: 800.0,
            playback_speeds: vec![0.5, 1.0, 1.5, 2.0, 4.0],
        }
    }
}

impl TimelineConfig {
    /// Merges the provided patch over the defaults and validates the result.
    pub fn from_patch(patch: &TimelineConfigPatch) -> Result<Self> {
        Self::default().merged(patch)
    }

    /// Returns a copy of `self` with every field set in `patch` replaced.
    pub fn merged(&self, patch: &TimelineConfigPatch) -> Result<Self> {
        let mut config = self.clone();
        if let Some(duration) = patch.duration {
            config.duration = duration;
        }
        if let Some(min_zoom) = patch.min_zoom {
            config.min_zoom = min_zoom;
        }
        if let Some(max_zoom) = patch.max_zoom {
            config.max_zoom = max_zoom;
        }
        if let Some(zoom_step) = patch.zoom_step {
            config.zoom_step = zoom_step;
        }
        if let Some(friction) = patch.friction {
            config.friction = friction;
        }
        if let Some(threshold) = patch.velocity_threshold {
            config.velocity_threshold = threshold;
        }
        if let Some(threshold) = patch.highlight_threshold {
            config.highlight_threshold = threshold;
        }
        if let Some(ms) = patch.auto_scroll_duration_ms {
            config.auto_scroll_duration_ms = ms;
        }
        if let Some(speeds) = &patch.playback_speeds {
            config.playback_speeds = speeds.clone();
        }
        config.playback_speeds.sort_by(|a, b| a.total_cmp(b));
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the timeline cannot operate under.
    pub fn validate(&self) -> Result<()> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(ScrubError::config(format!(
                "duration must be finite and non-negative, got {}",
                self.duration
            )));
        }
        if !(self.min_zoom > 0.0) || self.min_zoom > self.max_zoom || !self.max_zoom.is_finite() {
            return Err(ScrubError::config(format!(
                "zoom range [{}, {}] is not a valid positive range",
                self.min_zoom, self.max_zoom
            )));
        }
        if !(self.zoom_step > 1.0) {
            return Err(ScrubError::config("zoom step must be greater than 1"));
        }
        if !(self.friction > 0.0 && self.friction < 1.0) {
            return Err(ScrubError::config(format!(
                "friction must lie in (0, 1), got {}",
                self.friction
            )));
        }
        if !(self.velocity_threshold > 0.0) {
            return Err(ScrubError::config("velocity threshold must be positive"));
        }
        if !(self.highlight_threshold >= 0.0) {
            return Err(ScrubError::config("highlight threshold must be non-negative"));
        }
        if self.playback_speeds.is_empty() {
            return Err(ScrubError::config("playback speed ladder is empty"));
        }
        if self
            .playback_speeds
            .iter()
            .any(|speed| !speed.is_finite() || *speed <= 0.0)
        {
            return Err(ScrubError::config("playback speeds must be finite and positive"));
        }
        Ok(())
    }

    /// Default ladder entry used when playback starts fresh.
    pub fn default_speed(&self) -> f64 {
        nearest_speed(&self.playback_speeds, 1.0)
    }
}

/// Snaps `requested` to the nearest entry of `ladder`.
pub fn nearest_speed(ladder: &[f64], requested: f64) -> f64 {
    ladder
        .iter()
        .copied()
        .min_by(|a, b| (a - requested).abs().total_cmp(&(b - requested).abs()))
        .unwrap_or(1.0)
}

/// Partial configuration as supplied by callers. Unset fields keep defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimelineConfigPatch {
    pub duration: Option<f64>,
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
    pub zoom_step: Option<f64>,
    pub friction: Option<f64>,
    pub velocity_threshold: Option<f64>,
    pub highlight_threshold: Option<f64>,
    pub auto_scroll_duration_ms: Option<f64>,
    pub playback_speeds: Option<Vec<f64>>,
}

impl TimelineConfigPatch {
    pub fn with_duration(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            ..Default::default()
        }
    }
}

/// Thresholds used by the gesture recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GestureConfig {
    /// Displacement in pixels under which a release may count as a tap.
    pub tap_slop_px: f64,
    pub tap_max_duration_ms: f64,
    pub long_press_ms: f64,
    /// Release speed in pixels per second above which a drag becomes a flick.
    pub flick_velocity_px: f64,
    /// Weight of the newest sample in the exponential velocity smoothing.
    pub velocity_smoothing: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            tap_slop_px: 10.0,
            tap_max_duration_ms: 300.0,
            long_press_ms: 500.0,
            flick_velocity_px: 500.0,
            velocity_smoothing: 0.3,
        }
    }
}

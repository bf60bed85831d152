//! Reveal and morph choreography.
//!
//! The orchestrator only reads timestamps and marker counts and reports what
//! should change; the store applies those changes and enforces ordering.

use serde::{Deserialize, Serialize};

use crate::{calc::smoothstep, frame::FrameLoop};

/// Intro sequence phases, in the only order they may advance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum RevealPhase {
    #[default]
    Hidden,
    TrackReveal,
    MarkersStagger,
    ControlsFade,
    Complete,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationState {
    pub reveal_phase: RevealPhase,
    pub morphing_event_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealTimings {
    pub track_ms: f64,
    pub marker_stagger_ms: f64,
    pub marker_stagger_cap_ms: f64,
    /// Fade-in length of each individual marker.
    pub marker_fade_ms: f64,
    pub controls_ms: f64,
}

impl Default for RevealTimings {
    fn default() -> Self {
        Self {
            track_ms: 600.0,
            marker_stagger_ms: 40.0,
            marker_stagger_cap_ms: 1000.0,
            marker_fade_ms: 300.0,
            controls_ms: 400.0,
        }
    }
}

impl RevealTimings {
    fn stagger_span(&self, marker_count: usize) -> f64 {
        let spread = marker_count.saturating_sub(1) as f64 * self.marker_stagger_ms;
        spread.min(self.marker_stagger_cap_ms) + self.marker_fade_ms
    }

    /// Phase reached `elapsed_ms` after the sequence started.
    pub fn phase_at(&self, elapsed_ms: f64, marker_count: usize) -> RevealPhase {
        let markers_at = self.track_ms;
        let controls_at = markers_at + self.stagger_span(marker_count);
        let complete_at = controls_at + self.controls_ms;
        if elapsed_ms < 0.0 {
            RevealPhase::Hidden
        } else if elapsed_ms < markers_at {
            RevealPhase::TrackReveal
        } else if elapsed_ms < controls_at {
            RevealPhase::MarkersStagger
        } else if elapsed_ms < complete_at {
            RevealPhase::ControlsFade
        } else {
            RevealPhase::Complete
        }
    }

    /// Start offset of marker `index` relative to the sequence start.
    pub fn marker_delay_ms(&self, index: usize) -> f64 {
        self.track_ms + (index as f64 * self.marker_stagger_ms).min(self.marker_stagger_cap_ms)
    }
}

/// Outputs the store should apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choreography {
    Phase(RevealPhase),
    MorphStarted(String),
    MorphFinished(String),
}

#[derive(Debug, Clone)]
struct Morph {
    event_id: String,
    started_ms: f64,
}

pub const MORPH_DURATION_MS: f64 = 350.0;

#[derive(Debug, Default)]
pub struct AnimationOrchestrator {
    timings: RevealTimings,
    marker_count: usize,
    started_ms: Option<f64>,
    phase: RevealPhase,
    morph: Option<Morph>,
    frames: FrameLoop,
}

impl AnimationOrchestrator {
    pub fn new(timings: RevealTimings) -> Self {
        Self {
            timings,
            ..Default::default()
        }
    }

    pub fn timings(&self) -> &RevealTimings {
        &self.timings
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    /// Begins the reveal. Has no effect once a sequence is underway.
    pub fn start_reveal(&mut self, now_ms: f64, marker_count: usize) -> Option<Choreography> {
        if self.started_ms.is_some() {
            return None;
        }
        self.started_ms = Some(now_ms);
        self.marker_count = marker_count;
        self.phase = RevealPhase::TrackReveal;
        self.frames.ensure();
        Some(Choreography::Phase(self.phase))
    }

    /// Returns to `Hidden` so the reveal can run again.
    pub fn reset(&mut self) {
        self.started_ms = None;
        self.phase = RevealPhase::Hidden;
        self.morph = None;
        self.frames.cancel();
    }

    pub fn start_morph(&mut self, event_id: impl Into<String>, now_ms: f64) -> Choreography {
        let event_id = event_id.into();
        self.morph = Some(Morph {
            event_id: event_id.clone(),
            started_ms: now_ms,
        });
        self.frames.ensure();
        Choreography::MorphStarted(event_id)
    }

    /// Eased morph progress in [0, 1], or `None` when no morph runs.
    pub fn morph_progress(&self, now_ms: f64) -> Option<f64> {
        self.morph
            .as_ref()
            .map(|m| smoothstep(m.started_ms, m.started_ms + MORPH_DURATION_MS, now_ms))
    }

    /// Eased fade-in of marker `index` in [0, 1].
    pub fn marker_progress(&self, index: usize, now_ms: f64) -> f64 {
        match self.started_ms {
            None => 0.0,
            Some(_) if self.phase == RevealPhase::Complete => 1.0,
            Some(start) => {
                let begin = start + self.timings.marker_delay_ms(index);
                smoothstep(begin, begin + self.timings.marker_fade_ms, now_ms)
            }
        }
    }

    /// Eased progress of the current phase's own animation.
    pub fn track_progress(&self, now_ms: f64) -> f64 {
        match self.started_ms {
            None => 0.0,
            Some(start) => smoothstep(start, start + self.timings.track_ms, now_ms),
        }
    }

    pub fn is_animating(&self) -> bool {
        self.frames.is_live()
    }

    /// Advances phases and morphs, reporting every change in order.
    pub fn tick(&mut self, now_ms: f64) -> Vec<Choreography> {
        let mut out = Vec::new();
        if !self.frames.is_live() {
            return out;
        }

        if let Some(start) = self.started_ms {
            let phase = self.timings.phase_at(now_ms - start, self.marker_count);
            if phase > self.phase {
                self.phase = phase;
                out.push(Choreography::Phase(phase));
            }
        }

        if let Some(morph) = &self.morph {
            if now_ms - morph.started_ms >= MORPH_DURATION_MS {
                let finished = morph.event_id.clone();
                self.morph = None;
                out.push(Choreography::MorphFinished(finished));
            }
        }

        let reveal_running = self.started_ms.is_some() && self.phase < RevealPhase::Complete;
        if !reveal_running && self.morph.is_none() {
            self.frames.cancel();
        }
        out
    }

    pub fn destroy(&mut self) {
        self.morph = None;
        self.frames.cancel();
    }
}

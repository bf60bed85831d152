use std::collections::VecDeque;

/// Samples retained by [`VelocityTracker`].
pub const VELOCITY_SAMPLES: usize = 5;
/// Samples older than this, relative to the query time, are ignored.
pub const VELOCITY_WINDOW_MS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    at_ms: f64,
    position: f64,
}

/// Rolling position history producing a recency-weighted release velocity.
#[derive(Debug, Clone, Default)]
pub struct VelocityTracker {
    samples: VecDeque<Sample>,
}

impl VelocityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, at_ms: f64, position: f64) {
        if !at_ms.is_finite() || !position.is_finite() {
            return;
        }
        if let Some(last) = self.samples.back() {
            if at_ms < last.at_ms {
                // Clock went backwards; start over rather than mix timelines.
                self.samples.clear();
            }
        }
        self.samples.push_back(Sample { at_ms, position });
        while self.samples.len() > VELOCITY_SAMPLES {
            self.samples.pop_front();
        }
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Units per second over samples no older than the window at `now_ms`.
    /// Later segments weigh more. Returns `0.0` with fewer than two samples.
    pub fn velocity_at(&self, now_ms: f64) -> f64 {
        let cutoff = now_ms - VELOCITY_WINDOW_MS;
        let recent: Vec<&Sample> = self.samples.iter().filter(|s| s.at_ms >= cutoff).collect();
        if recent.len() < 2 {
            return 0.0;
        }

        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        for (index, pair) in recent.windows(2).enumerate() {
            let dt = pair[1].at_ms - pair[0].at_ms;
            if dt <= 0.0 {
                continue;
            }
            let weight = (index + 1) as f64;
            weighted += (pair[1].position - pair[0].position) / dt * 1000.0 * weight;
            total_weight += weight;
        }

        if total_weight > 0.0 {
            weighted / total_weight
        } else {
            0.0
        }
    }

    /// Velocity as of the newest sample.
    pub fn velocity(&self) -> f64 {
        self.samples
            .back()
            .map(|last| self.velocity_at(last.at_ms))
            .unwrap_or(0.0)
    }
}

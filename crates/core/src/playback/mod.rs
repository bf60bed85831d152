use serde::{Deserialize, Serialize};

use crate::{calc::clamp, config::nearest_speed, frame::FrameLoop, TimelineConfig};

/// Playback flags mirrored into the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub is_playing: bool,
    /// Always an entry of the configured speed ladder.
    pub speed: f64,
    pub is_looping: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            is_playing: false,
            speed: 1.0,
            is_looping: false,
        }
    }
}

/// Outcome of a single playback frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackTick {
    /// Time advanced normally.
    Update(f64),
    /// Time passed the end and wrapped to the contained value.
    Loop(f64),
    /// Time reached the end with looping off; playback stopped.
    End(f64),
}

impl PlaybackTick {
    pub fn time(&self) -> f64 {
        match *self {
            PlaybackTick::Update(t) | PlaybackTick::Loop(t) | PlaybackTick::End(t) => t,
        }
    }
}

/// Frame-driven autoplay. Elapsed wall time between frames times the speed
/// is added to the playhead.
#[derive(Debug)]
pub struct PlaybackService {
    speeds: Vec<f64>,
    duration: f64,
    time: f64,
    speed: f64,
    looping: bool,
    frames: FrameLoop,
    last_frame_ms: Option<f64>,
    destroyed: bool,
}

impl PlaybackService {
    pub fn new(config: &TimelineConfig) -> Self {
        Self {
            speeds: config.playback_speeds.clone(),
            duration: config.duration,
            time: 0.0,
            speed: config.default_speed(),
            looping: false,
            frames: FrameLoop::new(),
            last_frame_ms: None,
            destroyed: false,
        }
    }

    /// Adopts a new configuration. Playback pauses and the speed re-snaps.
    pub fn configure(&mut self, config: &TimelineConfig) {
        self.pause();
        self.speeds = config.playback_speeds.clone();
        self.duration = config.duration;
        self.speed = nearest_speed(&self.speeds, self.speed);
        self.time = clamp(self.time, 0.0, self.duration);
    }

    pub fn play(&mut self) {
        if self.destroyed || self.frames.is_live() {
            return;
        }
        if self.time >= self.duration && !self.looping {
            self.time = 0.0;
        }
        self.frames.request();
        self.last_frame_ms = None;
        tracing::debug!(time = self.time, speed = self.speed, "playback started");
    }

    /// Stops advancing. No tick acts after this returns.
    pub fn pause(&mut self) {
        if self.frames.cancel() {
            tracing::debug!(time = self.time, "playback paused");
        }
        self.last_frame_ms = None;
    }

    pub fn toggle(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Pauses and rewinds to the start.
    pub fn stop(&mut self) {
        self.pause();
        self.time = 0.0;
    }

    pub fn is_playing(&self) -> bool {
        self.frames.is_live()
    }

    /// Snaps `requested` to the nearest ladder entry and returns it.
    pub fn set_speed(&mut self, requested: f64) -> f64 {
        self.speed = nearest_speed(&self.speeds, requested);
        self.speed
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Moves the playhead without affecting the running state, e.g. after
    /// another driver finished.
    pub fn sync_time(&mut self, time: f64) {
        self.time = clamp(time, 0.0, self.duration);
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            is_playing: self.is_playing(),
            speed: self.speed,
            is_looping: self.looping,
        }
    }

    /// Advances by the wall time since the previous frame. The first frame
    /// after `play` only records its timestamp.
    pub fn tick(&mut self, now_ms: f64) -> Option<PlaybackTick> {
        if !self.frames.is_live() {
            return None;
        }
        let last = self.last_frame_ms.replace(now_ms)?;
        let elapsed_secs = ((now_ms - last) / 1000.0).max(0.0);
        let next = self.time + elapsed_secs * self.speed;

        if next >= self.duration {
            if self.looping && self.duration > 0.0 {
                self.time = next % self.duration;
                tracing::debug!(time = self.time, "playback looped");
                return Some(PlaybackTick::Loop(self.time));
            }
            self.time = self.duration;
            self.pause();
            tracing::debug!("playback reached end");
            return Some(PlaybackTick::End(self.time));
        }

        self.time = next;
        Some(PlaybackTick::Update(self.time))
    }

    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.pause();
        self.destroyed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TimelineConfigPatch;

    fn service(duration: f64) -> PlaybackService {
        let patch = TimelineConfigPatch::with_duration(duration);
        PlaybackService::new(&TimelineConfig::from_patch(&patch).unwrap())
    }

    #[test]
    fn wraps_once_when_looping() {
        let mut playback = service(10.0);
        playback.set_looping(true);
        playback.set_speed(1.0);
        playback.sync_time(9.5);
        playback.play();

        let mut loops = 0;
        let mut now = 0.0;
        assert!(playback.tick(now).is_none());
        for _ in 0..10 {
            now += 100.0;
            if let Some(PlaybackTick::Loop(_)) = playback.tick(now) {
                loops += 1;
            }
        }
        assert_eq!(loops, 1);
        assert!((playback.time() - 0.5).abs() < 1e-9);
        assert!(playback.is_playing());
    }

    #[test]
    fn single_large_frame_wraps_by_modulo() {
        let mut playback = service(10.0);
        playback.set_looping(true);
        playback.sync_time(9.5);
        playback.play();
        playback.tick(0.0);
        assert_eq!(playback.tick(1000.0), Some(PlaybackTick::Loop(0.5)));
    }

    #[test]
    fn stops_at_end_without_loop() {
        let mut playback = service(10.0);
        playback.sync_time(9.0);
        playback.set_speed(2.0);
        playback.play();
        playback.tick(0.0);
        assert_eq!(playback.tick(1000.0), Some(PlaybackTick::End(10.0)));
        assert!(!playback.is_playing());
        assert_eq!(playback.tick(1100.0), None);
    }

    #[test]
    fn speed_follows_ladder() {
        let mut playback = service(10.0);
        playback.set_speed(3.2);
        assert_eq!(playback.speed(), 4.0);
        playback.sync_time(0.0);
        playback.play();
        playback.tick(0.0);
        assert_eq!(playback.tick(500.0), Some(PlaybackTick::Update(2.0)));
    }

    #[test]
    fn pause_is_synchronous_and_idempotent() {
        let mut playback = service(10.0);
        playback.play();
        playback.play();
        playback.tick(0.0);
        playback.tick(100.0);
        playback.pause();
        playback.pause();
        let frozen = playback.time();
        assert_eq!(playback.tick(1000.0), None);
        assert_eq!(playback.time(), frozen);
    }

    #[test]
    fn stop_rewinds() {
        let mut playback = service(10.0);
        playback.sync_time(4.0);
        playback.play();
        playback.stop();
        assert_eq!(playback.time(), 0.0);
        assert!(!playback.is_playing());
    }

    #[test]
    fn play_at_end_restarts() {
        let mut playback = service(10.0);
        playback.sync_time(10.0);
        playback.play();
        assert_eq!(playback.time(), 0.0);
    }

    #[test]
    fn destroyed_service_ignores_play() {
        let mut playback = service(10.0);
        playback.play();
        playback.destroy();
        playback.destroy();
        playback.play();
        assert!(!playback.is_playing());
    }
}

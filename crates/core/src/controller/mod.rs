//! Per-widget owner that wires the drivers to the store.
//!
//! The host forwards raw pointer input and calls [`TimelineController::frame`]
//! once per display frame. Everything that writes the playhead runs from that
//! call, gated by [`ActiveDriver`], so two drivers never write in the same
//! frame.

use std::{cell::RefCell, collections::VecDeque, fmt, rc::Rc};

use crate::{
    calc::{clamp, lerp, normalized_velocity_to_time_velocity, smoothstep},
    event::find_nearest_event,
    gesture::{GestureEvent, GestureKind, GestureReceiver, GestureRecognizer},
    orchestrator::{AnimationOrchestrator, Choreography, RevealTimings},
    physics::{MotionHandlers, MotionKind, PhysicsEngine},
    playback::{PlaybackService, PlaybackTick},
    store::{DragRelease, TimelineState, TimelineStore},
    GestureConfig, Result, SecurityEvent, SessionData, TimelineConfig, TimelineConfigPatch,
};

/// Which driver currently owns the playhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveDriver {
    #[default]
    Idle,
    Drag,
    Physics(MotionKind),
    Playback,
}

#[derive(Debug, Clone, PartialEq)]
enum SeekRequest {
    Time(f64),
    Animated(f64),
    Event(String),
}

/// Cloneable seek entry point for external UI such as an event list.
/// Requests are applied at the start of the next frame.
#[derive(Clone, Default)]
pub struct SeekHandle {
    queue: Rc<RefCell<VecDeque<SeekRequest>>>,
}

impl SeekHandle {
    pub fn seek_to(&self, time: f64) {
        self.queue.borrow_mut().push_back(SeekRequest::Time(time));
    }

    /// Springs to `time` instead of jumping.
    pub fn glide_to(&self, time: f64) {
        self.queue.borrow_mut().push_back(SeekRequest::Animated(time));
    }

    pub fn seek_to_event(&self, event_id: impl Into<String>) {
        self.queue
            .borrow_mut()
            .push_back(SeekRequest::Event(event_id.into()));
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    fn take(&self) -> VecDeque<SeekRequest> {
        std::mem::take(&mut *self.queue.borrow_mut())
    }
}

impl fmt::Debug for SeekHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeekHandle")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Smooth pan keeping the playhead inside a zoomed viewport.
#[derive(Debug, Clone, Copy)]
struct AutoScroll {
    from: f64,
    to: f64,
    started_ms: f64,
}

type ReadyCallback = Box<dyn FnOnce(SeekHandle)>;

pub struct TimelineController {
    store: TimelineStore,
    physics: PhysicsEngine,
    playback: PlaybackService,
    gestures: GestureRecognizer,
    receiver: Option<GestureReceiver>,
    orchestrator: AnimationOrchestrator,
    driver: ActiveDriver,
    seeks: SeekHandle,
    ready: Vec<ReadyCallback>,
    loaded: bool,
    auto_scroll: Option<AutoScroll>,
    destroyed: bool,
}

impl TimelineController {
    pub fn new(gesture_config: GestureConfig) -> Self {
        let config = TimelineConfig::default();
        Self {
            store: TimelineStore::with_config(config.clone()),
            physics: PhysicsEngine::new(&config),
            playback: PlaybackService::new(&config),
            gestures: GestureRecognizer::new(gesture_config),
            receiver: None,
            orchestrator: AnimationOrchestrator::new(RevealTimings::default()),
            driver: ActiveDriver::Idle,
            seeks: SeekHandle::default(),
            ready: Vec::new(),
            loaded: false,
            auto_scroll: None,
            destroyed: false,
        }
    }

    pub fn store(&self) -> &TimelineStore {
        &self.store
    }

    /// Direct store access for discrete actions (filters, selection, zoom).
    /// A seek made here while playing is picked up by the next playback
    /// frame; prefer [`TimelineController::seek`] so other drivers stop too.
    pub fn store_mut(&mut self) -> &mut TimelineStore {
        &mut self.store
    }

    pub fn state(&self) -> &TimelineState {
        self.store.state()
    }

    pub fn driver(&self) -> ActiveDriver {
        self.driver
    }

    pub fn orchestrator(&self) -> &AnimationOrchestrator {
        &self.orchestrator
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Mounts the widget surface and starts listening for gestures.
    pub fn attach(&mut self, width: f64, height: f64) {
        if self.destroyed {
            return;
        }
        self.receiver = Some(self.gestures.attach(width, height));
        self.store.set_container_size(width, height);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.gestures.resize(width, height);
        self.store.set_container_size(width, height);
    }

    /// Loads events and config, then plays the reveal sequence.
    pub fn load(
        &mut self,
        events: &[SecurityEvent],
        patch: &TimelineConfigPatch,
        now_ms: f64,
    ) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.halt_drivers();
        self.store.initialize(events, patch)?;
        let config = self.store.config().clone();
        self.physics.configure(&config);
        self.playback.configure(&config);
        self.playback.sync_time(0.0);
        self.auto_scroll = None;

        self.orchestrator.reset();
        self.store.reset_reveal();
        if let Some(Choreography::Phase(phase)) =
            self.orchestrator.start_reveal(now_ms, self.store.state().filtered_events.len())
        {
            self.store.advance_reveal_phase(phase);
        }

        self.loaded = true;
        for callback in self.ready.drain(..) {
            callback(self.seeks.clone());
        }
        Ok(())
    }

    pub fn load_session(&mut self, session: &SessionData, now_ms: f64) -> Result<()> {
        self.load(&session.events, &session.config_patch(), now_ms)
    }

    /// Hands a [`SeekHandle`] to `callback` once a session is loaded.
    pub fn on_ready(&mut self, callback: impl FnOnce(SeekHandle) + 'static) {
        if self.destroyed {
            return;
        }
        if self.loaded {
            callback(self.seeks.clone());
        } else {
            self.ready.push(Box::new(callback));
        }
    }

    pub fn seek_handle(&self) -> SeekHandle {
        self.seeks.clone()
    }

    // ------------------------------------------------------------------ input

    pub fn pointer_down(&mut self, pointer_id: u32, x: f64, y: f64, now_ms: f64) {
        self.gestures.pointer_down(pointer_id, x, y, now_ms);
    }

    pub fn pointer_move(&mut self, pointer_id: u32, x: f64, y: f64, now_ms: f64) {
        self.gestures.pointer_move(pointer_id, x, y, now_ms);
    }

    pub fn pointer_up(&mut self, pointer_id: u32, x: f64, y: f64, now_ms: f64) {
        self.gestures.pointer_up(pointer_id, x, y, now_ms);
    }

    pub fn pointer_cancel(&mut self, pointer_id: u32, now_ms: f64) {
        self.gestures.pointer_cancel(pointer_id, now_ms);
    }

    // --------------------------------------------------------------- playback

    /// Starts autoplay. Refused while the user is dragging.
    pub fn play(&mut self) -> bool {
        if self.destroyed || self.driver == ActiveDriver::Drag {
            return false;
        }
        if !self.store.play() {
            return false;
        }
        self.physics.stop();
        self.store.reset_physics();
        let playback = &self.store.state().playback;
        self.playback.set_speed(playback.speed);
        self.playback.set_looping(playback.is_looping);
        self.playback.sync_time(self.store.current_time());
        self.playback.play();
        // Playing from the end rewinds.
        if self.playback.time() != self.store.current_time() {
            self.store.seek(self.playback.time());
        }
        self.driver = ActiveDriver::Playback;
        true
    }

    pub fn pause(&mut self) {
        self.playback.pause();
        self.store.pause();
        if self.driver == ActiveDriver::Playback {
            self.driver = ActiveDriver::Idle;
        }
    }

    pub fn toggle_play(&mut self) -> bool {
        if self.store.state().playback.is_playing {
            self.pause();
            false
        } else {
            self.play()
        }
    }

    pub fn set_speed(&mut self, speed: f64) -> f64 {
        let snapped = self.store.set_speed(speed);
        self.playback.set_speed(snapped);
        snapped
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.store.set_looping(looping);
        self.playback.set_looping(looping);
    }

    // ------------------------------------------------------------------ seeks

    /// Immediate seek that cancels whatever was driving the playhead.
    pub fn seek(&mut self, time: f64) {
        self.halt_drivers();
        self.store.seek(time);
    }

    /// Animated seek with the smooth spring.
    pub fn glide_to(&mut self, time: f64, now_ms: f64) {
        self.halt_drivers();
        let from = self.store.current_time();
        self.physics
            .seek_with_spring(now_ms, from, time, MotionHandlers::new());
        self.claim_physics();
    }

    /// Springs to an event, selects it, and starts its morph.
    pub fn glide_to_event(&mut self, event_id: &str, now_ms: f64) -> Result<()> {
        let timestamp = self
            .store
            .event(event_id)
            .map(|event| event.timestamp)
            .ok_or_else(|| crate::ScrubError::UnknownEvent(event_id.to_string()))?;
        self.halt_drivers();
        let from = self.store.current_time();
        self.physics
            .seek_to_event_with_spring(now_ms, from, timestamp, MotionHandlers::new());
        self.claim_physics();
        self.store.select_event(Some(event_id.to_string()));
        let morph = self.orchestrator.start_morph(event_id, now_ms);
        self.apply_choreography(morph);
        Ok(())
    }

    fn halt_drivers(&mut self) {
        if self.physics.stop() || self.driver == ActiveDriver::Drag {
            self.store.reset_physics();
        }
        if self.playback.is_playing() {
            self.playback.pause();
            self.store.pause();
        }
        self.driver = ActiveDriver::Idle;
    }

    fn claim_physics(&mut self) {
        self.driver = match self.physics.active_kind() {
            Some(kind) => ActiveDriver::Physics(kind),
            None => ActiveDriver::Idle,
        };
    }

    // ------------------------------------------------------------------ frame

    /// Pumps every driver once. Call from the host's frame callback.
    pub fn frame(&mut self, now_ms: f64) {
        if self.destroyed {
            return;
        }
        self.apply_seek_requests(now_ms);

        self.gestures.poll(now_ms);
        let gestures = self
            .receiver
            .as_ref()
            .map(GestureReceiver::drain)
            .unwrap_or_default();
        for gesture in gestures {
            self.handle_gesture(gesture);
        }

        match self.driver {
            ActiveDriver::Physics(_) => self.tick_physics(now_ms),
            ActiveDriver::Playback => self.tick_playback(now_ms),
            ActiveDriver::Idle | ActiveDriver::Drag => {}
        }

        for change in self.orchestrator.tick(now_ms) {
            self.apply_choreography(change);
        }
        self.tick_auto_scroll(now_ms);
    }

    fn apply_seek_requests(&mut self, now_ms: f64) {
        for request in self.seeks.take() {
            match request {
                SeekRequest::Time(time) => self.seek(time),
                SeekRequest::Animated(time) => self.glide_to(time, now_ms),
                SeekRequest::Event(id) => {
                    if let Err(err) = self.glide_to_event(&id, now_ms) {
                        tracing::warn!(%err, "seek request rejected");
                    }
                }
            }
        }
    }

    fn tick_physics(&mut self, now_ms: f64) {
        let Some(frame) = self.physics.tick(now_ms) else {
            self.driver = ActiveDriver::Idle;
            return;
        };
        self.store.seek(frame.value);
        if frame.completed {
            self.store.reset_physics();
            self.driver = ActiveDriver::Idle;
        }
    }

    fn tick_playback(&mut self, now_ms: f64) {
        // Picks up seeks made directly on the store since the last frame.
        self.playback.sync_time(self.store.current_time());
        let Some(tick) = self.playback.tick(now_ms) else {
            if !self.playback.is_playing() {
                self.driver = ActiveDriver::Idle;
            }
            return;
        };
        self.store.seek(tick.time());
        if let PlaybackTick::End(_) = tick {
            self.store.pause();
            self.driver = ActiveDriver::Idle;
        }
        self.follow_playhead(now_ms);
    }

    fn apply_choreography(&mut self, change: Choreography) {
        match change {
            Choreography::Phase(phase) => {
                self.store.advance_reveal_phase(phase);
            }
            Choreography::MorphStarted(id) => self.store.set_morphing_event(Some(id)),
            Choreography::MorphFinished(id) => {
                let current = self.store.state().animation.morphing_event_id.as_deref();
                if current == Some(id.as_str()) {
                    self.store.set_morphing_event(None);
                }
            }
        }
    }

    // ------------------------------------------------------------ auto-scroll

    /// Starts a pan when playback carries the playhead out of a zoomed view.
    fn follow_playhead(&mut self, now_ms: f64) {
        let state = self.store.state();
        if self.auto_scroll.is_some() || state.zoom.level <= 1.0 {
            return;
        }
        if state.viewport.visible_range().contains(state.current_time) {
            return;
        }
        let duration = state.duration();
        if duration <= 0.0 {
            return;
        }
        self.auto_scroll = Some(AutoScroll {
            from: state.zoom.focal_point,
            to: state.current_time / duration,
            started_ms: now_ms,
        });
    }

    fn tick_auto_scroll(&mut self, now_ms: f64) {
        let Some(scroll) = self.auto_scroll else {
            return;
        };
        let span = self.store.config().auto_scroll_duration_ms;
        let t = smoothstep(scroll.started_ms, scroll.started_ms + span, now_ms);
        self.store.set_focal_point(lerp(scroll.from, scroll.to, t));
        if t >= 1.0 {
            self.auto_scroll = None;
        }
    }

    // --------------------------------------------------------------- gestures

    fn handle_gesture(&mut self, gesture: GestureEvent) {
        let width = self.store.state().viewport.container_width;
        let x_px = gesture.position.x * width;
        let at = gesture.timestamp_ms;

        match gesture.kind {
            GestureKind::Drag if gesture.is_start => {
                self.halt_drivers();
                self.auto_scroll = None;
                self.store.start_drag(x_px, at);
                self.driver = ActiveDriver::Drag;
            }
            GestureKind::Drag if gesture.is_end => {
                if self.driver != ActiveDriver::Drag {
                    return;
                }
                let release = self.store.end_drag();
                self.release_momentum(release, at);
            }
            GestureKind::Drag => {
                if self.driver == ActiveDriver::Drag {
                    self.store.update_drag(x_px, at);
                }
            }
            GestureKind::Flick => {
                if self.driver != ActiveDriver::Drag {
                    return;
                }
                self.store.update_drag(x_px, at);
                let visible = self.store.state().viewport.visible_duration();
                let velocity = normalized_velocity_to_time_velocity(gesture.velocity, visible);
                let release = self.store.set_release_velocity(velocity);
                self.release_momentum(release, at);
            }
            GestureKind::Tap => {
                if self.driver == ActiveDriver::Drag {
                    self.store.reset_physics();
                    self.driver = ActiveDriver::Idle;
                }
                self.tap(gesture.position.x, at);
            }
            GestureKind::Pinch => self.pinch(&gesture),
            GestureKind::LongPress => {
                let time = self.time_at(gesture.position.x);
                let state = self.store.state();
                let nearest = find_nearest_event(
                    &state.filtered_events,
                    time,
                    state.config.highlight_threshold,
                )
                .map(|event| event.id.clone());
                if let Some(id) = nearest {
                    self.store.toggle_expanded(&id);
                }
            }
        }
    }

    /// Hands a drag release to the momentum driver when fast enough.
    fn release_momentum(&mut self, release: DragRelease, now_ms: f64) {
        self.driver = ActiveDriver::Idle;
        if !release.has_momentum {
            self.store.reset_physics();
            return;
        }
        let from = self.store.current_time();
        if self
            .physics
            .start_momentum(now_ms, from, release.velocity, MotionHandlers::new())
        {
            self.claim_physics();
        } else {
            self.store.reset_physics();
        }
    }

    /// Seeks to the tapped position, snapping onto a nearby event.
    fn tap(&mut self, x: f64, now_ms: f64) {
        let time = self.time_at(x);
        let state = self.store.state();
        let snap = find_nearest_event(
            &state.filtered_events,
            time,
            state.config.highlight_threshold,
        )
        .map(|event| event.id.clone());
        match snap {
            Some(id) => {
                if let Err(err) = self.glide_to_event(&id, now_ms) {
                    tracing::warn!(%err, "tap snap failed");
                }
            }
            None => {
                self.store.select_event(None);
                self.glide_to(time, now_ms);
            }
        }
    }

    fn pinch(&mut self, gesture: &GestureEvent) {
        let scale = gesture.scale.unwrap_or(1.0);
        if gesture.is_start {
            if self.driver == ActiveDriver::Drag {
                self.store.reset_physics();
                self.driver = ActiveDriver::Idle;
            }
            self.auto_scroll = None;
            self.store.begin_pinch();
            return;
        }
        self.store.update_pinch(scale, gesture.position.x);
        if gesture.is_end {
            self.store.end_pinch();
        }
    }

    /// Session time under a normalised x position in the viewport.
    fn time_at(&self, x: f64) -> f64 {
        let viewport = &self.store.state().viewport;
        viewport.visible_start + clamp(x, 0.0, 1.0) * viewport.visible_duration()
    }

    /// Tears down every driver, timer and listener. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.physics.destroy();
        self.playback.destroy();
        self.gestures.detach();
        self.receiver = None;
        self.orchestrator.destroy();
        self.store.clear_subscribers();
        self.seeks.take();
        self.ready.clear();
        self.auto_scroll = None;
        self.driver = ActiveDriver::Idle;
        self.destroyed = true;
        tracing::debug!("timeline controller destroyed");
    }
}

impl Default for TimelineController {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl Drop for TimelineController {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for TimelineController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineController")
            .field("driver", &self.driver)
            .field("loaded", &self.loaded)
            .field("destroyed", &self.destroyed)
            .field("store", &self.store)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::{EventType, RevealPhase, Severity};

    const WIDTH: f64 = 1000.0;

    fn events() -> Vec<SecurityEvent> {
        vec![
            SecurityEvent::new("a", 20.0, EventType::Process, Severity::Info, "a"),
            SecurityEvent::new("b", 50.0, EventType::Clipboard, Severity::Critical, "b"),
        ]
    }

    fn controller() -> TimelineController {
        let mut controller = TimelineController::default();
        controller.attach(WIDTH, 60.0);
        controller
            .load(&events(), &TimelineConfigPatch::with_duration(100.0), 0.0)
            .unwrap();
        controller
    }

    fn run_frames(controller: &mut TimelineController, from_ms: f64, frames: usize) -> f64 {
        let mut now = from_ms;
        for _ in 0..frames {
            now += 16.0;
            controller.frame(now);
        }
        now
    }

    #[test]
    fn reveal_runs_to_completion() {
        let mut controller = controller();
        assert_eq!(
            controller.state().animation.reveal_phase,
            RevealPhase::TrackReveal
        );
        run_frames(&mut controller, 0.0, 200);
        assert_eq!(
            controller.state().animation.reveal_phase,
            RevealPhase::Complete
        );
    }

    #[test]
    fn playback_advances_and_drag_pauses_it() {
        let mut controller = controller();
        assert!(controller.play());
        assert_eq!(controller.driver(), ActiveDriver::Playback);
        controller.frame(0.0);
        controller.frame(1000.0);
        assert!((controller.state().current_time - 1.0).abs() < 1e-9);

        controller.pointer_down(1, 500.0, 30.0, 1010.0);
        controller.frame(1016.0);
        assert_eq!(controller.driver(), ActiveDriver::Drag);
        assert!(!controller.state().playback.is_playing);
        assert!(!controller.play());

        let frozen = controller.state().current_time;
        controller.frame(2000.0);
        assert_eq!(controller.state().current_time, frozen);
    }

    #[test]
    fn drag_scrubs_then_glides() {
        let mut controller = controller();
        controller.seek(50.0);
        controller.pointer_down(1, 500.0, 30.0, 0.0);
        controller.pointer_move(1, 550.0, 30.0, 16.0);
        controller.pointer_move(1, 600.0, 30.0, 32.0);
        controller.frame(33.0);
        assert!((controller.state().current_time - 60.0).abs() < 1e-9);

        controller.pointer_move(1, 650.0, 30.0, 48.0);
        controller.pointer_up(1, 650.0, 30.0, 50.0);
        controller.frame(51.0);
        assert!(matches!(
            controller.driver(),
            ActiveDriver::Physics(MotionKind::Momentum)
        ));

        let released = controller.state().current_time;
        run_frames(&mut controller, 51.0, 400);
        let settled = controller.state().current_time;
        assert!(settled > released);
        assert!(settled <= 100.0);
        assert_eq!(controller.driver(), ActiveDriver::Idle);
        assert!(!controller.state().physics.has_momentum);
    }

    #[test]
    fn tap_near_event_springs_and_selects() {
        let mut controller = controller();
        // x = 0.21 of a 100s view is 21s, inside the 5s threshold of "a".
        controller.pointer_down(1, 210.0, 30.0, 0.0);
        controller.pointer_up(1, 210.0, 30.0, 80.0);
        controller.frame(81.0);
        assert_eq!(
            controller.state().selection.selected_event_id.as_deref(),
            Some("a")
        );
        assert_eq!(
            controller.state().animation.morphing_event_id.as_deref(),
            Some("a")
        );
        run_frames(&mut controller, 81.0, 200);
        assert!((controller.state().current_time - 20.0).abs() < 0.05);
        assert_eq!(controller.state().animation.morphing_event_id, None);
        assert_eq!(
            controller.state().selection.highlighted_event_id.as_deref(),
            Some("a")
        );
    }

    #[test]
    fn drag_preempts_spring_seek() {
        let mut controller = controller();
        controller.glide_to(90.0, 0.0);
        controller.frame(16.0);
        assert!(matches!(
            controller.driver(),
            ActiveDriver::Physics(MotionKind::Spring)
        ));

        controller.pointer_down(1, 500.0, 30.0, 20.0);
        controller.frame(21.0);
        assert_eq!(controller.driver(), ActiveDriver::Drag);
        assert!(!controller.physics.is_animating());
    }

    #[test]
    fn pinch_zooms_viewport() {
        let mut controller = controller();
        controller.pointer_down(1, 400.0, 30.0, 0.0);
        controller.pointer_down(2, 600.0, 30.0, 5.0);
        controller.pointer_move(2, 800.0, 30.0, 20.0);
        controller.frame(21.0);
        assert!(controller.state().zoom.is_zooming);
        assert!((controller.state().zoom.level - 2.0).abs() < 1e-9);

        controller.pointer_up(2, 800.0, 30.0, 40.0);
        controller.pointer_up(1, 400.0, 30.0, 45.0);
        controller.frame(46.0);
        assert!(!controller.state().zoom.is_zooming);
        assert_eq!(controller.driver(), ActiveDriver::Idle);
    }

    #[test]
    fn seek_handle_is_delivered_and_applied() {
        let mut controller = TimelineController::default();
        controller.attach(WIDTH, 60.0);
        let slot: Rc<RefCell<Option<SeekHandle>>> = Rc::default();
        let sink = slot.clone();
        controller.on_ready(move |handle| *sink.borrow_mut() = Some(handle));
        assert!(slot.borrow().is_none());

        controller
            .load(&events(), &TimelineConfigPatch::with_duration(100.0), 0.0)
            .unwrap();
        let handle = slot.borrow_mut().take().unwrap();
        handle.seek_to(42.0);
        assert_eq!(controller.state().current_time, 0.0);
        controller.frame(16.0);
        assert_eq!(controller.state().current_time, 42.0);

        handle.seek_to_event("missing");
        controller.frame(32.0);
        assert_eq!(controller.state().current_time, 42.0);
    }

    #[test]
    fn long_press_expands_nearest_event() {
        let mut controller = controller();
        controller.pointer_down(1, 500.0, 30.0, 0.0);
        controller.frame(600.0);
        assert_eq!(
            controller.state().selection.expanded_event_id.as_deref(),
            Some("b")
        );
    }

    #[test]
    fn autoscroll_follows_playhead_when_zoomed() {
        let mut controller = controller();
        controller.store_mut().zoom_to(4.0, Some(0.0));
        assert_eq!(controller.state().viewport.visible_end, 25.0);
        controller.seek(24.9);
        controller.play();
        controller.frame(0.0);
        controller.frame(200.0);
        run_frames(&mut controller, 200.0, 60);
        let viewport = &controller.state().viewport;
        assert!(viewport.visible_range().contains(controller.state().current_time));
    }

    #[test]
    fn seek_during_drag_releases_the_drag() {
        let mut controller = controller();
        let seeks = controller.seek_handle();
        controller.pointer_down(1, 500.0, 30.0, 0.0);
        controller.pointer_move(1, 560.0, 30.0, 16.0);
        controller.frame(17.0);
        assert_eq!(controller.driver(), ActiveDriver::Drag);

        seeks.seek_to(30.0);
        controller.frame(33.0);
        assert_eq!(controller.state().current_time, 30.0);
        assert_eq!(controller.driver(), ActiveDriver::Idle);
        assert!(!controller.state().physics.is_dragging);

        // The rest of the interrupted scrub no longer moves the playhead.
        controller.pointer_move(1, 600.0, 30.0, 40.0);
        controller.pointer_up(1, 600.0, 30.0, 50.0);
        controller.frame(51.0);
        assert_eq!(controller.state().current_time, 30.0);
        assert!(!controller.physics.is_animating());

        assert!(controller.play());
        assert_eq!(controller.driver(), ActiveDriver::Playback);
    }

    #[test]
    fn direct_store_seek_survives_playback() {
        let mut controller = controller();
        assert!(controller.play());
        controller.frame(0.0);
        controller.frame(100.0);
        assert!((controller.state().current_time - 0.1).abs() < 1e-9);

        controller.store_mut().seek(50.0);
        controller.frame(1100.0);
        assert!((controller.state().current_time - 51.0).abs() < 1e-9);
        assert_eq!(controller.driver(), ActiveDriver::Playback);
    }

    #[test]
    fn destroy_is_idempotent_and_releases_listeners() {
        let mut controller = controller();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        controller
            .store_mut()
            .subscribe(move |_| counter.set(counter.get() + 1));
        controller.play();
        controller.destroy();
        controller.destroy();
        assert!(controller.is_destroyed());
        assert!(!controller.play());

        let before = calls.get();
        controller.frame(100.0);
        controller.pointer_down(1, 10.0, 10.0, 110.0);
        controller.frame(120.0);
        assert_eq!(calls.get(), before);
        assert!(!controller.gestures.is_attached());
        assert!(!controller.gestures.has_pending_timer());
    }
}

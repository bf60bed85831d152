//! Core library for the session scrubber.
//!
//! A recorded monitoring session is shown as a zoomable timeline with its
//! security events laid over it. The store owns all timeline state; physics,
//! playback and gesture recognition are independent drivers that the
//! controller pumps once per host frame and commits through the store's
//! actions. Nothing here renders or owns a clock; every driver is handed the
//! host's frame timestamp.

pub mod calc;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod frame;
pub mod gesture;
pub mod orchestrator;
pub mod physics;
pub mod playback;
pub mod signal;
pub mod store;

pub use calc::{VisibleRange, ZoomState};
pub use config::{GestureConfig, TimelineConfig, TimelineConfigPatch};
pub use controller::{ActiveDriver, SeekHandle, TimelineController};
pub use error::{Result, ScrubError};
pub use event::{EventType, FilterState, SecurityEvent, SessionData, Severity};
pub use frame::{FrameHandle, FrameLoop};
pub use gesture::{GestureEvent, GestureKind, GestureReceiver, GestureRecognizer};
pub use orchestrator::{AnimationOrchestrator, AnimationState, RevealPhase};
pub use physics::{MotionHandlers, MotionKind, PhysicsEngine, SpringConfig};
pub use playback::{PlaybackService, PlaybackState, PlaybackTick};
pub use signal::{Signal, TimeSignal};
pub use store::{StepDirection, TimelineSnapshot, TimelineState, TimelineStore};

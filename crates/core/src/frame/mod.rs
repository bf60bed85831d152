//! Host frame-callback bookkeeping.
//!
//! The host calls into drivers once per display frame with a millisecond
//! timestamp. A [`FrameLoop`] tracks whether a driver currently wants those
//! callbacks and guarantees a single live request per driver.

/// Token for an outstanding frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

#[derive(Debug, Default)]
pub struct FrameLoop {
    live: Option<FrameHandle>,
    issued: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a fresh handle, cancelling any handle that was still live.
    pub fn request(&mut self) -> FrameHandle {
        self.issued += 1;
        let handle = FrameHandle(self.issued);
        self.live = Some(handle);
        handle
    }

    /// Issues a handle only when none is live.
    pub fn ensure(&mut self) -> FrameHandle {
        match self.live {
            Some(handle) => handle,
            None => self.request(),
        }
    }

    /// Cancels the live handle. Returns whether one was live.
    pub fn cancel(&mut self) -> bool {
        self.live.take().is_some()
    }

    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }
}

/// Milliseconds of a 60 Hz frame, the reference step for friction.
pub const FRAME_MS: f64 = 1000.0 / 60.0;

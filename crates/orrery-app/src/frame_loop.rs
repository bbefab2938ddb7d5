//! Frame-driven loop with graceful cancellation.
//!
//! The scene animates by a fixed amount per frame, so there is no fixed-step
//! accumulator: each tick runs the frame callback exactly once. A
//! [`CancellationToken`] ends the loop, either from outside (window close) or
//! when a frame limit is reached.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Frames slower than this are reported.
pub const SLOW_FRAME: Duration = Duration::from_millis(250);

/// Shared flag that stops a [`FrameLoop`]. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Per-frame bookkeeping for the render loop.
#[derive(Debug)]
pub struct FrameLoop {
    token: CancellationToken,
    max_frames: Option<u64>,
    frame_count: u64,
    previous_time: Instant,
    last_frame_time: Duration,
}

impl FrameLoop {
    /// A loop that runs until `token` is cancelled, or for `max_frames` frames.
    pub fn new(token: CancellationToken, max_frames: Option<u64>) -> Self {
        Self {
            token,
            max_frames,
            frame_count: 0,
            previous_time: Instant::now(),
            last_frame_time: Duration::ZERO,
        }
    }

    /// Runs one frame unless cancelled. Returns whether the frame ran; once it
    /// returns `false` the caller should stop scheduling frames.
    pub fn tick(&mut self, frame_fn: impl FnOnce(u64)) -> bool {
        if self.token.is_cancelled() {
            return false;
        }

        let now = Instant::now();
        self.last_frame_time = now.duration_since(self.previous_time);
        self.previous_time = now;
        if self.frame_count > 0 && self.last_frame_time > SLOW_FRAME {
            warn!(
                "Frame {} took {:.1}ms",
                self.frame_count,
                self.last_frame_time.as_secs_f64() * 1000.0
            );
        }

        frame_fn(self.frame_count);
        self.frame_count += 1;

        if self.max_frames.is_some_and(|max| self.frame_count >= max) {
            debug!("Frame limit {} reached", self.frame_count);
            self.token.cancel();
        }
        true
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns the total number of frames run.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Wall time between the two most recent frames.
    pub fn last_frame_time(&self) -> Duration {
        self.last_frame_time
    }
}

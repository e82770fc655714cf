//! Render loop state machine on top of a host refresh primitive.
//!
//! The host only needs to provide [`FrameScheduler`]: request one callback,
//! cancel a pending one. Everything else (visibility gating, frame-rate
//! capping, destroyed-state guards) lives in [`RenderLoop`] so it can be
//! driven by a fake clock in tests.
//!
//! ```text
//!   Idle --start--> Running <--visibility--> Paused
//!     ^                |                        |
//!     +-----halt-------+------------------------+
//!   Running/Paused/Idle --destroy--> Destroyed (terminal)
//! ```

use crate::config::QualityTier;
use crate::error::{FxError, FxResult};
use crate::frame::{FrameContext, FrameThrottle};

/// Cancellation token for one requested refresh callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub i64);

/// Host refresh primitive (`requestAnimationFrame`, a winit redraw request,
/// a manual test clock).
pub trait FrameScheduler {
    /// Ask for one callback at the next refresh opportunity.
    fn request_frame(&mut self) -> FxResult<FrameRequest>;
    /// Cancel a request that has not fired yet. Unknown or already fired
    /// requests are ignored.
    fn cancel_frame(&mut self, request: FrameRequest);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Paused,
    Destroyed,
}

/// Counters kept for diagnostics and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub callbacks: u64,
    pub executed: u64,
    pub skipped_hidden: u64,
    pub skipped_throttle: u64,
}

pub struct RenderLoop<S: FrameScheduler> {
    scheduler: S,
    state: LoopState,
    pending: Option<FrameRequest>,
    throttle: FrameThrottle,
    stats: LoopStats,
}

impl<S: FrameScheduler> RenderLoop<S> {
    pub fn new(scheduler: S, tier: &QualityTier) -> Self {
        Self {
            scheduler,
            state: LoopState::Idle,
            pending: None,
            throttle: FrameThrottle::new(tier),
            stats: LoopStats::default(),
        }
    }

    #[inline]
    pub fn state(&self) -> LoopState {
        self.state
    }

    #[inline]
    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    #[inline]
    pub fn pending(&self) -> Option<FrameRequest> {
        self.pending
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn set_tier(&mut self, tier: &QualityTier) {
        self.throttle.set_tier(tier);
    }

    /// `Idle -> Running`: request the first callback.
    pub fn start(&mut self) -> FxResult<()> {
        match self.state {
            LoopState::Destroyed => return Err(FxError::AlreadyReleased),
            LoopState::Running | LoopState::Paused => return Ok(()),
            LoopState::Idle => {}
        }
        let request = self.scheduler.request_frame()?;
        self.pending = Some(request);
        self.throttle.reset();
        self.state = LoopState::Running;
        log::info!("[loop] started");
        Ok(())
    }

    /// Entry point of every host callback.
    ///
    /// Re-schedules before anything else so a later cancel always has a
    /// pending request to cancel, applies visibility gating and the frame
    /// cap, and returns the frame to execute, if any.
    pub fn begin_frame(&mut self, timestamp_ms: f64, visible: bool) -> Option<FrameContext> {
        match self.state {
            LoopState::Destroyed | LoopState::Idle => return None,
            LoopState::Running | LoopState::Paused => {}
        }
        self.pending = None;
        self.stats.callbacks += 1;
        match self.scheduler.request_frame() {
            Ok(request) => self.pending = Some(request),
            Err(e) => {
                log::error!("[loop] could not schedule next frame: {}", e);
                self.halt();
                return None;
            }
        }

        match (self.state, visible) {
            (LoopState::Running, false) => {
                self.state = LoopState::Paused;
                log::info!("[loop] paused (hidden)");
            }
            (LoopState::Paused, true) => {
                self.state = LoopState::Running;
                log::info!("[loop] resumed");
            }
            _ => {}
        }
        if self.state == LoopState::Paused {
            self.stats.skipped_hidden += 1;
            return None;
        }

        let Some(dt_sec) = self.throttle.admit(timestamp_ms) else {
            self.stats.skipped_throttle += 1;
            return None;
        };
        self.stats.executed += 1;
        Some(FrameContext {
            timestamp_ms,
            dt_sec,
            visible,
        })
    }

    /// Stop scheduling and return to `Idle`; the loop may be started again.
    pub fn halt(&mut self) {
        if let Some(request) = self.pending.take() {
            self.scheduler.cancel_frame(request);
        }
        if self.state != LoopState::Destroyed {
            self.state = LoopState::Idle;
        }
    }

    /// Terminal transition. Returns `false` when already destroyed.
    pub fn destroy(&mut self) -> bool {
        if self.state == LoopState::Destroyed {
            return false;
        }
        if let Some(request) = self.pending.take() {
            self.scheduler.cancel_frame(request);
        }
        self.state = LoopState::Destroyed;
        true
    }
}

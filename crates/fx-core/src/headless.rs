//! CPU-only host used by tests and the native `--headless` benchmark.
//!
//! Every acquisition is recorded in a shared [`ResourceLedger`], so a test can
//! assert that activate/deactivate cycles leave nothing behind.

use crate::bridge::{InstanceRecord, SceneUniforms};
use crate::effect::EffectKind;
use crate::error::{FxError, FxResult, TickError};
use crate::interaction::HostRect;
use crate::lifecycle::{Host, Instance, ListenerSet, SharedInput, TickOutcome};
use crate::scheduler::{FrameRequest, FrameScheduler};
use crate::surface::{GpuBackend, SurfaceSize};
use fnv::FnvHashMap;
use std::cell::RefCell;
use std::rc::Rc;

pub const GPU_CONTEXT: &str = "gpu";
pub const GPU_PROGRAM: &str = "program";
pub const LISTENER: &str = "listener";

/// Events a headless listener set subscribes to.
const LISTENER_EVENTS: [&str; 4] = ["pointermove", "pointerleave", "resize", "visibilitychange"];

#[derive(Clone, Copy, Debug, Default)]
struct Counter {
    live: i64,
    total: u64,
}

/// Live/total counters per resource kind.
#[derive(Clone, Default)]
pub struct ResourceLedger(Rc<RefCell<FnvHashMap<&'static str, Counter>>>);

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, kind: &'static str) {
        let mut map = self.0.borrow_mut();
        let c = map.entry(kind).or_default();
        c.live += 1;
        c.total += 1;
    }

    pub fn release(&self, kind: &'static str) {
        let mut map = self.0.borrow_mut();
        map.entry(kind).or_default().live -= 1;
    }

    /// Currently held; negative means a double release.
    pub fn live(&self, kind: &str) -> i64 {
        self.0.borrow().get(kind).map_or(0, |c| c.live)
    }

    pub fn total(&self, kind: &str) -> u64 {
        self.0.borrow().get(kind).map_or(0, |c| c.total)
    }

    /// No resource of any kind is held.
    pub fn is_clean(&self) -> bool {
        self.0.borrow().values().all(|c| c.live == 0)
    }
}

// ---------------- Scheduler ----------------

#[derive(Default)]
struct ClockState {
    next_id: i64,
    pending: Vec<FrameRequest>,
    requested: u64,
    cancelled: u64,
    fail_requests: bool,
}

/// Test side of the manual refresh primitive: decides when callbacks fire.
#[derive(Clone, Default)]
pub struct ManualClock(Rc<RefCell<ClockState>>);

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduler(&self) -> ManualScheduler {
        ManualScheduler(self.clone())
    }

    /// Requests waiting to fire.
    pub fn pending(&self) -> usize {
        self.0.borrow().pending.len()
    }

    pub fn requested(&self) -> u64 {
        self.0.borrow().requested
    }

    pub fn cancelled(&self) -> u64 {
        self.0.borrow().cancelled
    }

    /// Fire every pending request, as the host would at a refresh.
    pub fn take_due(&self) -> Vec<FrameRequest> {
        std::mem::take(&mut self.0.borrow_mut().pending)
    }

    /// Make subsequent `request_frame` calls fail.
    pub fn fail_requests(&self, fail: bool) {
        self.0.borrow_mut().fail_requests = fail;
    }
}

pub struct ManualScheduler(ManualClock);

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FxResult<FrameRequest> {
        let mut clock = (self.0).0.borrow_mut();
        if clock.fail_requests {
            return Err(FxError::Scheduler("manual clock refused request".into()));
        }
        clock.next_id += 1;
        let request = FrameRequest(clock.next_id);
        clock.pending.push(request);
        clock.requested += 1;
        Ok(request)
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        let mut clock = (self.0).0.borrow_mut();
        let before = clock.pending.len();
        clock.pending.retain(|r| *r != request);
        if clock.pending.len() != before {
            clock.cancelled += 1;
        }
    }
}

// ---------------- Backend ----------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BackendCounts {
    pub programs: u64,
    pub resizes: u64,
    pub writes: u64,
    pub draws: u64,
}

pub struct HeadlessBackend {
    ledger: ResourceLedger,
    program: Option<EffectKind>,
    size: SurfaceSize,
    counts: BackendCounts,
    last_uniforms: SceneUniforms,
    last_instance_count: usize,
    draw_failure: Option<TickError>,
    resize_failure: Option<TickError>,
    refuse_programs: bool,
    released: bool,
}

impl HeadlessBackend {
    pub fn new(ledger: ResourceLedger) -> Self {
        ledger.acquire(GPU_CONTEXT);
        Self {
            ledger,
            program: None,
            size: SurfaceSize::default(),
            counts: BackendCounts::default(),
            last_uniforms: SceneUniforms::default(),
            last_instance_count: 0,
            draw_failure: None,
            resize_failure: None,
            refuse_programs: false,
            released: false,
        }
    }

    pub fn counts(&self) -> BackendCounts {
        self.counts
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn program(&self) -> Option<EffectKind> {
        self.program
    }

    pub fn last_uniforms(&self) -> &SceneUniforms {
        &self.last_uniforms
    }

    pub fn last_instance_count(&self) -> usize {
        self.last_instance_count
    }

    /// Every following draw fails with `error` until cleared with `None`.
    pub fn fail_draws(&mut self, error: Option<TickError>) {
        self.draw_failure = error;
    }

    /// The next resize fails with `error`; later ones succeed.
    pub fn fail_next_resize(&mut self, error: TickError) {
        self.resize_failure = Some(error);
    }
}

impl GpuBackend for HeadlessBackend {
    fn build_program(&mut self, kind: EffectKind) -> FxResult<()> {
        if self.released {
            return Err(FxError::AlreadyReleased);
        }
        if self.refuse_programs {
            return Err(FxError::ContextCreation(format!("{:?} program rejected", kind)));
        }
        if self.program.replace(kind).is_some() {
            self.ledger.release(GPU_PROGRAM);
        }
        self.ledger.acquire(GPU_PROGRAM);
        self.counts.programs += 1;
        Ok(())
    }

    fn resize(&mut self, size: SurfaceSize) -> Result<(), TickError> {
        if let Some(error) = self.resize_failure.take() {
            return Err(error);
        }
        self.size = size;
        self.counts.resizes += 1;
        Ok(())
    }

    fn write(
        &mut self,
        uniforms: &SceneUniforms,
        instances: &[InstanceRecord],
    ) -> Result<(), TickError> {
        self.last_uniforms = *uniforms;
        self.last_instance_count = instances.len();
        self.counts.writes += 1;
        Ok(())
    }

    fn draw(&mut self, _instance_count: u32) -> Result<(), TickError> {
        if let Some(error) = &self.draw_failure {
            return Err(error.clone());
        }
        self.counts.draws += 1;
        Ok(())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if self.program.take().is_some() {
            self.ledger.release(GPU_PROGRAM);
        }
        self.ledger.release(GPU_CONTEXT);
    }
}

impl Drop for HeadlessBackend {
    fn drop(&mut self) {
        self.release();
    }
}

// ---------------- Listeners ----------------

pub struct HeadlessListeners {
    ledger: ResourceLedger,
    input: SharedInput,
}

impl HeadlessListeners {
    pub fn input(&self) -> &SharedInput {
        &self.input
    }
}

impl ListenerSet for HeadlessListeners {
    fn detach(&mut self) {
        for _ in LISTENER_EVENTS {
            self.ledger.release(LISTENER);
        }
    }
}

// ---------------- Host ----------------

/// Which activation step should fail, for partial-setup tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FailurePlan {
    pub context: bool,
    pub program: bool,
    pub listeners: bool,
    pub scheduler: bool,
}

pub struct HeadlessHost {
    pub bounds: HostRect,
    pub device_pixel_ratio: f32,
    pub fail: FailurePlan,
    ledger: ResourceLedger,
    clock: ManualClock,
}

impl HeadlessHost {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            bounds: HostRect::new(0.0, 0.0, width, height),
            device_pixel_ratio: 1.0,
            fail: FailurePlan::default(),
            ledger: ResourceLedger::new(),
            clock: ManualClock::new(),
        }
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }
}

impl Host for HeadlessHost {
    type Backend = HeadlessBackend;
    type Scheduler = ManualScheduler;
    type Listeners = HeadlessListeners;

    fn bounds(&self) -> HostRect {
        self.bounds
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    fn create_backend(&mut self) -> FxResult<HeadlessBackend> {
        if self.fail.context {
            return Err(FxError::ContextCreation("headless context disabled".into()));
        }
        let mut backend = HeadlessBackend::new(self.ledger.clone());
        backend.refuse_programs = self.fail.program;
        Ok(backend)
    }

    fn attach_listeners(&mut self, input: SharedInput) -> FxResult<HeadlessListeners> {
        if self.fail.listeners {
            return Err(FxError::Listener("headless listeners disabled".into()));
        }
        for _ in LISTENER_EVENTS {
            self.ledger.acquire(LISTENER);
        }
        Ok(HeadlessListeners {
            ledger: self.ledger.clone(),
            input,
        })
    }

    fn create_scheduler(&mut self) -> FxResult<ManualScheduler> {
        if self.fail.scheduler {
            return Err(FxError::Scheduler("headless scheduler disabled".into()));
        }
        Ok(self.clock.scheduler())
    }
}

/// Outcome tally of [`drive`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriveReport {
    pub callbacks: u64,
    pub rendered: u64,
    pub skipped: u64,
    pub halted: u64,
}

/// Fire `count` refreshes `step_ms` apart, starting at `start_ms`.
///
/// A refresh only reaches the instance when a request is pending, as with a
/// real host refresh primitive.
pub fn drive(
    instance: &mut Instance<HeadlessHost>,
    clock: &ManualClock,
    start_ms: f64,
    step_ms: f64,
    count: u32,
) -> DriveReport {
    let mut report = DriveReport::default();
    for n in 0..count {
        if clock.take_due().is_empty() {
            continue;
        }
        report.callbacks += 1;
        match instance.on_frame(start_ms + n as f64 * step_ms) {
            TickOutcome::Rendered => report.rendered += 1,
            TickOutcome::Skipped => report.skipped += 1,
            TickOutcome::Halted => report.halted += 1,
        }
    }
    report
}

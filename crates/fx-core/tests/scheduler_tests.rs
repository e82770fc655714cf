// Host-side tests for the frame throttle and the render loop state machine,
// driven by the manual clock.

use fx_core::config::Quality;
use fx_core::error::FxError;
use fx_core::frame::FrameThrottle;
use fx_core::headless::ManualClock;
use fx_core::scheduler::{FrameScheduler, LoopState, RenderLoop};

#[test]
fn throttle_admits_first_frame_immediately() {
    let mut t = FrameThrottle::new(&Quality::High.tier());
    assert_eq!(t.admit(1234.0), Some(0.0));
    assert_eq!(t.admit(1240.0), None);
    let dt = t.admit(1251.0).unwrap();
    assert!((dt - 0.017).abs() < 1e-6);
}

#[test]
fn throttle_resyncs_when_clock_goes_backwards() {
    let mut t = FrameThrottle::new(&Quality::Low.tier());
    assert!(t.admit(1000.0).is_some());
    assert_eq!(t.admit(500.0), None);
    // 50 ms after the resync point
    assert!(t.admit(550.0).is_some());
}

#[test]
fn low_quality_caps_simulation_steps() {
    let clock = ManualClock::new();
    let mut lp = RenderLoop::new(clock.scheduler(), &Quality::Low.tier());
    lp.start().unwrap();
    let mut executed = 0;
    for n in 0..100 {
        assert_eq!(clock.take_due().len(), 1);
        if lp.begin_frame(n as f64 * 16.0, true).is_some() {
            executed += 1;
        }
    }
    // ceil(100 * 16 / 50)
    assert!(executed <= 32, "executed {} steps", executed);
    assert!(executed >= 20);
    assert_eq!(lp.stats().callbacks, 100);
    assert_eq!(lp.stats().executed, executed);
    assert_eq!(lp.stats().skipped_throttle, 100 - executed);
}

#[test]
fn every_callback_reschedules_before_running() {
    let clock = ManualClock::new();
    let mut lp = RenderLoop::new(clock.scheduler(), &Quality::High.tier());
    lp.start().unwrap();
    assert_eq!(clock.pending(), 1);
    clock.take_due();
    lp.begin_frame(0.0, true);
    assert_eq!(clock.pending(), 1);
    assert!(lp.pending().is_some());
}

#[test]
fn hidden_frames_pause_and_resume() {
    let clock = ManualClock::new();
    let mut lp = RenderLoop::new(clock.scheduler(), &Quality::High.tier());
    lp.start().unwrap();
    assert_eq!(lp.state(), LoopState::Running);

    clock.take_due();
    assert!(lp.begin_frame(0.0, false).is_none());
    assert_eq!(lp.state(), LoopState::Paused);
    // still scheduled while paused
    assert_eq!(clock.pending(), 1);

    clock.take_due();
    assert!(lp.begin_frame(100.0, true).is_some());
    assert_eq!(lp.state(), LoopState::Running);
    assert_eq!(lp.stats().skipped_hidden, 1);
}

#[test]
fn destroy_cancels_pending_request_and_is_terminal() {
    let clock = ManualClock::new();
    let mut lp = RenderLoop::new(clock.scheduler(), &Quality::High.tier());
    lp.start().unwrap();
    assert!(lp.destroy());
    assert_eq!(clock.pending(), 0);
    assert_eq!(clock.cancelled(), 1);
    assert_eq!(lp.state(), LoopState::Destroyed);

    assert!(!lp.destroy());
    assert!(lp.begin_frame(0.0, true).is_none());
    assert_eq!(lp.start(), Err(FxError::AlreadyReleased));
}

#[test]
fn halt_returns_to_idle_and_can_restart() {
    let clock = ManualClock::new();
    let mut lp = RenderLoop::new(clock.scheduler(), &Quality::High.tier());
    lp.start().unwrap();
    lp.halt();
    assert_eq!(lp.state(), LoopState::Idle);
    assert_eq!(clock.pending(), 0);
    assert!(lp.begin_frame(0.0, true).is_none());

    lp.start().unwrap();
    assert_eq!(lp.state(), LoopState::Running);
    assert_eq!(clock.pending(), 1);
}

#[test]
fn scheduling_failure_halts_the_loop() {
    let clock = ManualClock::new();
    let mut lp = RenderLoop::new(clock.scheduler(), &Quality::High.tier());
    lp.start().unwrap();
    clock.take_due();
    clock.fail_requests(true);
    assert!(lp.begin_frame(0.0, true).is_none());
    assert_eq!(lp.state(), LoopState::Idle);
    assert!(lp.pending().is_none());
}

#[test]
fn cancel_of_unknown_request_is_ignored() {
    let clock = ManualClock::new();
    let mut sched = clock.scheduler();
    let req = sched.request_frame().unwrap();
    sched.cancel_frame(fx_core::scheduler::FrameRequest(req.0 + 100));
    assert_eq!(clock.pending(), 1);
    sched.cancel_frame(req);
    sched.cancel_frame(req);
    assert_eq!(clock.pending(), 0);
    assert_eq!(clock.cancelled(), 1);
}

use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide "run exactly once" latch for shared setup (logger init,
/// global stylesheet injection).
pub struct InitOnce(AtomicBool);

impl InitOnce {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Run `f` if nobody has yet. Returns whether `f` ran.
    pub fn run<F: FnOnce()>(&self, f: F) -> bool {
        if self.0.swap(true, Ordering::SeqCst) {
            return false;
        }
        f();
        true
    }

    pub fn is_done(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for InitOnce {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-instance latch so a recurring failure is reported once, not every frame.
#[derive(Debug, Default)]
pub struct LogOnce {
    fired: bool,
}

impl LogOnce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time only.
    pub fn first(&mut self) -> bool {
        !std::mem::replace(&mut self.fired, true)
    }

    pub fn reset(&mut self) {
        self.fired = false;
    }
}

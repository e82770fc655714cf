use crate::config::QualityTier;

/// Per-tick record handed to the simulation and the uniform bridge.
///
/// Created when the scheduler admits a callback and dropped at the end of the
/// tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameContext {
    /// Host refresh timestamp in milliseconds.
    pub timestamp_ms: f64,
    /// Seconds since the previous executed frame (unclamped).
    pub dt_sec: f32,
    pub visible: bool,
}

/// Frame-rate cap independent of the host's refresh rate.
///
/// A callback is admitted only when at least `1000 / target_fps` ms have
/// passed since the last admitted one.
#[derive(Clone, Debug)]
pub struct FrameThrottle {
    interval_ms: f64,
    last_frame_ms: Option<f64>,
}

impl FrameThrottle {
    pub fn new(tier: &QualityTier) -> Self {
        Self {
            interval_ms: tier.frame_interval_ms(),
            last_frame_ms: None,
        }
    }

    pub fn set_tier(&mut self, tier: &QualityTier) {
        self.interval_ms = tier.frame_interval_ms();
    }

    #[inline]
    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Returns the elapsed seconds since the last admitted frame when the
    /// callback at `timestamp_ms` should run, `None` when it is throttled.
    pub fn admit(&mut self, timestamp_ms: f64) -> Option<f32> {
        let Some(last) = self.last_frame_ms else {
            self.last_frame_ms = Some(timestamp_ms);
            return Some(0.0);
        };
        let elapsed = timestamp_ms - last;
        if !elapsed.is_finite() || elapsed < 0.0 {
            // host clock jumped backwards; resync without running
            self.last_frame_ms = Some(timestamp_ms);
            return None;
        }
        if elapsed < self.interval_ms {
            return None;
        }
        self.last_frame_ms = Some(timestamp_ms);
        Some((elapsed / 1000.0) as f32)
    }

    pub fn reset(&mut self) {
        self.last_frame_ms = None;
    }
}

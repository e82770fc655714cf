//! Simulation steps for every effect family.
//!
//! Each family is a unit type implementing [`Simulation`]. `advance` mutates
//! the state in place (no allocation per tick); [`step`] is the pure
//! `(state, dt, config, signal) -> state'` form used for reproducibility
//! checks.
//!
//! dt policy: every family first clamps dt to [`MAX_FRAME_DT`]. Physics
//! families (ribbons, ballpit) then split it into at most [`MAX_SUBSTEPS`]
//! sub-steps of at most one reference frame; shader families (orb, grid
//! distortion) take a single clamped step.

pub mod ballpit;
pub mod grid;
pub mod orb;
pub mod ribbons;
pub mod trail;

use crate::config::QualityTier;
use crate::constants::{MAX_FRAME_DT, MAX_SUBSTEPS, REFERENCE_FRAME_DT};
use crate::interaction::InteractionSignal;
use glam::Vec3;

pub trait Simulation {
    type Config;
    type State: Clone;

    /// Fresh state for a configuration at a quality tier.
    fn init(config: &Self::Config, tier: &QualityTier) -> Self::State;

    fn advance(
        state: &mut Self::State,
        dt_sec: f32,
        config: &Self::Config,
        signal: &InteractionSignal,
    );
}

/// Pure form of [`Simulation::advance`].
pub fn step<S: Simulation>(
    state: &S::State,
    dt_sec: f32,
    config: &S::Config,
    signal: &InteractionSignal,
) -> S::State {
    let mut next = state.clone();
    S::advance(&mut next, dt_sec, config, signal);
    next
}

/// Clamp a frame delta into `[0, MAX_FRAME_DT]`; non-finite input becomes 0.
#[inline]
pub fn clamp_dt(dt_sec: f32) -> f32 {
    if !dt_sec.is_finite() || dt_sec <= 0.0 {
        0.0
    } else {
        dt_sec.min(MAX_FRAME_DT)
    }
}

/// Fixed sub-step split of a clamped delta.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubSteps {
    pub count: u32,
    /// Seconds per sub-step.
    pub dt: f32,
    /// Sub-step length in reference frames (`dt / REFERENCE_FRAME_DT`, <= 1).
    pub scale: f32,
}

pub fn substeps(dt_sec: f32) -> SubSteps {
    let dt = clamp_dt(dt_sec);
    if dt == 0.0 {
        return SubSteps {
            count: 0,
            dt: 0.0,
            scale: 0.0,
        };
    }
    let count = ((dt / REFERENCE_FRAME_DT).ceil() as u32).clamp(1, MAX_SUBSTEPS);
    let sub = dt / count as f32;
    SubSteps {
        count,
        dt: sub,
        scale: sub / REFERENCE_FRAME_DT,
    }
}

/// Spring/friction integration for one sub-step of `scale` reference frames.
///
/// At `scale == 1` this is exactly
/// `v += (target - p) * spring; v *= friction; p += v`.
#[inline]
pub fn spring_step(
    position: &mut Vec3,
    velocity: &mut Vec3,
    target: Vec3,
    spring: f32,
    friction: f32,
    scale: f32,
) {
    *velocity += (target - *position) * spring * scale;
    *velocity *= friction.powf(scale);
    *position += *velocity * scale;
}

/// Per-index seed mix so siblings get independent but reproducible streams.
#[inline]
pub(crate) fn mix_seed(seed: u64, index: usize) -> u64 {
    seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

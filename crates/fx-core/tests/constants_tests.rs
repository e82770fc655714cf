// Host-side tests for tuning constants and their relationships.

use fx_core::constants::*;

#[test]
#[allow(clippy::assertions_on_constants)]
fn frame_timing_constants_are_consistent() {
    assert!(MAX_FRAME_DT > REFERENCE_FRAME_DT);
    // the clamp must be coverable by the sub-step budget
    let needed = (MAX_FRAME_DT / REFERENCE_FRAME_DT).ceil() as u32;
    assert!(needed <= MAX_SUBSTEPS);
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn smoothing_factors_are_fractions() {
    assert!(HOVER_SMOOTHING > 0.0 && HOVER_SMOOTHING < 1.0);
    assert!(POINTER_VELOCITY_DECAY > 0.0 && POINTER_VELOCITY_DECAY < 1.0);
    assert!(BALLPIT_CURSOR_FOLLOW > 0.0 && BALLPIT_CURSOR_FOLLOW <= 1.0);
    assert!(HOVER_SNAP_EPSILON > 0.0 && HOVER_SNAP_EPSILON < HOVER_SMOOTHING);
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn pointer_window_matches_one_reference_frame() {
    let frame_ms = (REFERENCE_FRAME_DT * 1000.0) as f64;
    assert!((POINTER_COALESCE_MS - frame_ms).abs() < 1.0);
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn effect_constants_are_positive() {
    assert!(ORB_HOVER_RADIUS > 0.0 && ORB_HOVER_RADIUS <= 1.0);
    assert!(ORB_ROTATION_SPEED > 0.0);
    assert!(RIBBON_MAX_COLORS >= 1);
    assert!(RIBBON_SPRING_JITTER > 0.0);
    assert!(RIBBON_FRICTION_JITTER > 0.0);
    assert!(RIBBON_THICKNESS_JITTER > 0.0);
    assert!(GRID_MIN_SIZE >= 2);
    assert!(GRID_FORCE_SCALE > 0.0);
    assert!(MIN_BACKING_PX >= 1);
}

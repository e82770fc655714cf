// Host-side tests for pointer coalescing, coordinate mapping and hover smoothing.

use fx_core::interaction::{HostRect, HoverRegion, InteractionAdapter};
use glam::Vec2;
use proptest::prelude::*;

fn square() -> InteractionAdapter {
    InteractionAdapter::new(HostRect::new(0.0, 0.0, 100.0, 100.0), HoverRegion::Element)
}

#[test]
fn client_coordinates_map_to_normalized_space() {
    let mut a = InteractionAdapter::new(
        HostRect::new(10.0, 20.0, 200.0, 100.0),
        HoverRegion::Element,
    );
    a.on_pointer_move(110.0, 70.0, 0.0);
    let s = a.signal();
    assert_eq!(s.uv, Vec2::new(0.5, 0.5));
    assert_eq!(s.pointer, Vec2::ZERO);
    assert!(s.inside);

    a.on_pointer_move(10.0, 20.0, 100.0);
    let s = a.signal();
    assert_eq!(s.uv, Vec2::new(0.0, 0.0));
    assert_eq!(s.pointer, Vec2::new(-1.0, 1.0));
}

#[test]
fn moves_within_window_are_coalesced_latest_wins() {
    let mut a = square();
    assert!(a.on_pointer_move(10.0, 10.0, 0.0));
    assert!(!a.on_pointer_move(20.0, 20.0, 5.0));
    assert!(!a.on_pointer_move(30.0, 30.0, 10.0));
    assert_eq!(a.signal().uv, Vec2::new(0.1, 0.1));

    a.flush(12.0);
    assert_eq!(a.signal().uv, Vec2::new(0.1, 0.1));

    a.flush(16.0);
    assert_eq!(a.signal().uv, Vec2::new(0.3, 0.3));
    assert_eq!(a.move_counts(), (2, 2));
}

#[test]
fn moves_outside_window_apply_immediately() {
    let mut a = square();
    for n in 0..5 {
        assert!(a.on_pointer_move(n as f32 * 10.0, 50.0, n as f64 * 20.0));
    }
    assert_eq!(a.move_counts(), (5, 0));
}

#[test]
fn leave_clears_target_and_velocity() {
    let mut a = square();
    a.on_pointer_move(10.0, 10.0, 0.0);
    a.on_pointer_move(50.0, 50.0, 50.0);
    assert!(a.signal().velocity.length() > 0.0);
    assert_eq!(a.signal().hover_target, 1.0);

    a.on_pointer_leave();
    let s = a.signal();
    assert_eq!(s.hover_target, 0.0);
    assert_eq!(s.velocity, Vec2::ZERO);
    assert!(!s.inside);
}

#[test]
fn disc_region_uses_size_normalized_distance() {
    let mut a = InteractionAdapter::new(
        HostRect::new(0.0, 0.0, 200.0, 100.0),
        HoverRegion::Disc { radius: 0.8 },
    );
    a.on_pointer_move(100.0, 50.0, 0.0);
    assert_eq!(a.signal().hover_target, 1.0);

    // inside the element, outside the disc
    a.on_pointer_move(180.0, 50.0, 100.0);
    assert!(a.signal().inside);
    assert_eq!(a.signal().hover_target, 0.0);
}

#[test]
fn forced_hover_pins_target() {
    let mut a = square();
    a.set_forced_hover(true);
    assert_eq!(a.signal().hover_target, 1.0);
    a.on_pointer_leave();
    assert_eq!(a.signal().hover_target, 1.0);
}

#[test]
fn resize_relocates_pointer_and_is_consumed_once() {
    let mut a = square();
    a.on_pointer_move(50.0, 50.0, 0.0);
    a.on_resize(HostRect::new(0.0, 0.0, 200.0, 100.0));
    assert_eq!(a.signal().uv, Vec2::new(0.25, 0.5));
    // relocation is not a movement
    assert_eq!(a.signal().velocity, Vec2::ZERO);
    assert_eq!(a.take_resize(), Some(HostRect::new(0.0, 0.0, 200.0, 100.0)));
    assert_eq!(a.take_resize(), None);

    a.on_resize(HostRect::new(0.0, 0.0, 200.0, 100.0));
    assert_eq!(a.take_resize(), None);
}

#[test]
fn visibility_requires_document_and_viewport() {
    let mut a = square();
    assert!(a.is_visible());
    a.set_in_viewport(false);
    assert!(!a.is_visible());
    a.set_in_viewport(true);
    a.set_document_visible(false);
    assert!(!a.is_visible());
}

#[test]
fn hover_reaches_target_at_reference_rate() {
    let mut a = square();
    a.on_pointer_move(50.0, 50.0, 0.0);
    a.advance(1.0 / 60.0);
    assert!((a.signal().hover - 0.1).abs() < 1e-5);
    for _ in 0..200 {
        a.advance(1.0 / 60.0);
    }
    assert_eq!(a.signal().hover, 1.0);
}

#[test]
fn hover_convergence_is_frame_rate_independent() {
    let mut fast = square();
    let mut slow = square();
    fast.on_pointer_move(50.0, 50.0, 0.0);
    slow.on_pointer_move(50.0, 50.0, 0.0);
    for _ in 0..6 {
        fast.advance(1.0 / 60.0);
    }
    for _ in 0..2 {
        slow.advance(1.0 / 20.0);
    }
    assert!((fast.signal().hover - slow.signal().hover).abs() < 1e-4);
}

proptest! {
    #[test]
    fn hover_step_is_monotonic_and_bounded(dts in prop::collection::vec(0.0f32..0.5, 1..60)) {
        let mut a = square();
        a.on_pointer_move(50.0, 50.0, 0.0);
        let mut prev = a.signal().hover;
        for dt in &dts {
            a.advance(*dt);
            let h = a.signal().hover;
            prop_assert!((0.0..=1.0).contains(&h));
            prop_assert!(h >= prev);
            prev = h;
        }

        a.on_pointer_leave();
        for dt in &dts {
            a.advance(*dt);
            let h = a.signal().hover;
            prop_assert!((0.0..=1.0).contains(&h));
            prop_assert!(h <= prev);
            prev = h;
        }
    }
}

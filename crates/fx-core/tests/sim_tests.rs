// Host-side tests for the simulation steps: determinism, dt clamping,
// trail capacity and per-family behavior.

use fx_core::config::*;
use fx_core::constants::MAX_FRAME_DT;
use fx_core::interaction::InteractionSignal;
use fx_core::sim::ballpit::BallpitSim;
use fx_core::sim::grid::GridSim;
use fx_core::sim::orb::OrbSim;
use fx_core::sim::ribbons::RibbonsSim;
use fx_core::sim::trail::Trail;
use fx_core::sim::{step, substeps, Simulation};
use glam::{Vec2, Vec3};
use proptest::prelude::*;

fn signal_at(x: f32, y: f32) -> InteractionSignal {
    InteractionSignal {
        pointer: Vec2::new(x, y),
        uv: Vec2::new((x + 1.0) * 0.5, (1.0 - y) * 0.5),
        inside: true,
        hover: 1.0,
        hover_target: 1.0,
        ..Default::default()
    }
}

fn small_ballpit() -> BallpitConfig {
    BallpitConfig {
        count: 24,
        seed: 7,
        ..Default::default()
    }
}

// ---------------- dt policy ----------------

#[test]
fn substeps_cover_clamped_dt() {
    let s = substeps(1.0 / 60.0);
    assert_eq!(s.count, 1);
    assert!((s.scale - 1.0).abs() < 1e-5);

    let s = substeps(5.0);
    assert_eq!(s.count, 4);
    assert!((s.dt * s.count as f32 - MAX_FRAME_DT).abs() < 1e-6);
    assert!(s.scale <= 1.0 + 1e-5);

    assert_eq!(substeps(0.0).count, 0);
    assert_eq!(substeps(f32::NAN).count, 0);
    assert_eq!(substeps(-1.0).count, 0);
}

#[test]
fn huge_dt_is_clamped_for_shader_families() {
    let cfg = OrbConfig::default();
    let tier = cfg.quality.tier();
    let s = step::<OrbSim>(&OrbSim::init(&cfg, &tier), 5.0, &cfg, &signal_at(0.0, 0.0));
    assert!((s.time - MAX_FRAME_DT).abs() < 1e-6);
    assert!((s.rotation - MAX_FRAME_DT * 0.3).abs() < 1e-6);
}

#[test]
fn huge_dt_produces_no_divergence() {
    let cfg = small_ballpit();
    let mut state = BallpitSim::init(&cfg, &cfg.quality.tier());
    let signal = signal_at(0.9, -0.9);
    for _ in 0..50 {
        BallpitSim::advance(&mut state, 5.0, &cfg, &signal);
    }
    for body in &state.bodies {
        assert!(body.position.is_finite());
        assert!(body.velocity.is_finite());
    }

    let cfg = RibbonsConfig::default();
    let mut state = RibbonsSim::init(&cfg, &cfg.quality.tier());
    for _ in 0..50 {
        RibbonsSim::advance(&mut state, 5.0, &cfg, &signal);
    }
    for r in &state.ribbons {
        assert!(r.head.is_finite());
        assert!(r.trail.iter_newest().all(|p| p.position.is_finite()));
    }

    let cfg = GridDistortionConfig::default();
    let mut state = GridSim::init(&cfg, &cfg.quality.tier());
    let mut moving = signal_at(0.0, 0.0);
    moving.velocity = Vec2::new(0.5, 0.5);
    for _ in 0..50 {
        GridSim::advance(&mut state, 5.0, &cfg, &moving);
    }
    assert!(state.offsets.iter().all(|o| o.is_finite()));
}

// ---------------- determinism ----------------

proptest! {
    #[test]
    fn ballpit_is_deterministic(
        dts in prop::collection::vec(0.0f32..0.2, 1..30),
        x in -1.0f32..1.0,
        y in -1.0f32..1.0,
    ) {
        let cfg = small_ballpit();
        let tier = cfg.quality.tier();
        let signal = signal_at(x, y);
        let mut a = BallpitSim::init(&cfg, &tier);
        let mut b = BallpitSim::init(&cfg, &tier);
        prop_assert_eq!(&a, &b);
        for dt in &dts {
            a = step::<BallpitSim>(&a, *dt, &cfg, &signal);
            BallpitSim::advance(&mut b, *dt, &cfg, &signal);
        }
        prop_assert_eq!(a, b);
    }

    #[test]
    fn ribbons_are_deterministic(dts in prop::collection::vec(0.0f32..0.2, 1..30)) {
        let cfg = RibbonsConfig {
            colors: vec![Rgb::WHITE, Rgb::BLACK, Rgb::from_packed(0x5227ff)],
            ..Default::default()
        };
        let tier = cfg.quality.tier();
        let signal = signal_at(0.3, 0.6);
        let mut a = RibbonsSim::init(&cfg, &tier);
        let mut b = RibbonsSim::init(&cfg, &tier);
        for dt in &dts {
            RibbonsSim::advance(&mut a, *dt, &cfg, &signal);
            RibbonsSim::advance(&mut b, *dt, &cfg, &signal);
        }
        prop_assert_eq!(a, b);
    }

    #[test]
    fn trail_never_exceeds_capacity_and_evicts_oldest(
        capacity in 1usize..16,
        ops in prop::collection::vec(prop_oneof![Just(None), (0.0f32..40.0).prop_map(Some)], 1..200),
    ) {
        let mut trail = Trail::new(capacity, 500.0);
        for (i, op) in ops.iter().enumerate() {
            match op {
                None => {
                    let oldest_age = trail.oldest().map(|p| p.age);
                    if let Some(evicted) = trail.push(Vec3::splat(i as f32)) {
                        prop_assert_eq!(Some(evicted.age), oldest_age);
                        prop_assert!(trail.iter_newest().all(|p| p.age <= evicted.age));
                    }
                }
                Some(dt) => trail.age_by(*dt),
            }
            prop_assert!(trail.len() <= capacity);
            prop_assert!(trail.iter_newest().all(|p| p.age <= trail.max_age()));
        }
    }
}

#[test]
fn different_seeds_place_bodies_differently() {
    let a = small_ballpit();
    let b = BallpitConfig { seed: 8, ..a.clone() };
    let tier = Quality::High.tier();
    assert_ne!(BallpitSim::init(&a, &tier), BallpitSim::init(&b, &tier));
}

// ---------------- trail ----------------

#[test]
fn full_trail_drops_oldest_first() {
    let mut t = Trail::new(3, 1000.0);
    t.push(Vec3::X);
    t.age_by(10.0);
    t.push(Vec3::Y);
    t.age_by(10.0);
    t.push(Vec3::Z);
    let evicted = t.push(Vec3::ONE).unwrap();
    assert_eq!(evicted.position, Vec3::X);
    assert_eq!(t.len(), 3);
    assert_eq!(t.newest().unwrap().position, Vec3::ONE);
    assert_eq!(t.oldest().unwrap().position, Vec3::Y);
}

#[test]
fn expired_points_are_dropped() {
    let mut t = Trail::new(10, 100.0);
    t.push(Vec3::X);
    t.age_by(60.0);
    t.push(Vec3::Y);
    t.age_by(60.0);
    assert_eq!(t.len(), 1);
    assert_eq!(t.newest().unwrap().position, Vec3::Y);
    t.set_max_age(50.0);
    assert!(t.is_empty());
}

// ---------------- orb ----------------

#[test]
fn orb_rotates_only_while_hovered() {
    let cfg = OrbConfig::default();
    let tier = cfg.quality.tier();
    let mut s = OrbSim::init(&cfg, &tier);
    let idle = InteractionSignal::default();
    OrbSim::advance(&mut s, 1.0 / 30.0, &cfg, &idle);
    assert_eq!(s.rotation, 0.0);

    OrbSim::advance(&mut s, 1.0 / 30.0, &cfg, &signal_at(0.0, 0.0));
    assert!((s.rotation - 0.01).abs() < 1e-6);

    let pinned = OrbConfig {
        force_hover_state: true,
        ..cfg.clone()
    };
    OrbSim::advance(&mut s, 1.0 / 30.0, &pinned, &idle);
    assert!((s.rotation - 0.02).abs() < 1e-6);

    let still = OrbConfig {
        rotate_on_hover: false,
        ..cfg
    };
    OrbSim::advance(&mut s, 1.0 / 30.0, &still, &signal_at(0.0, 0.0));
    assert!((s.rotation - 0.02).abs() < 1e-6);
}

#[test]
fn orb_intro_finishes_after_duration() {
    let cfg = OrbConfig {
        intro_duration: 0.5,
        ..Default::default()
    };
    let mut s = OrbSim::init(&cfg, &cfg.quality.tier());
    let signal = InteractionSignal::default();
    let mut steps = 0;
    while !OrbSim::finished(&s, &cfg) {
        OrbSim::advance(&mut s, 1.0 / 30.0, &cfg, &signal);
        steps += 1;
        assert!(steps < 100);
    }
    assert!(s.time >= 0.5);
    assert!(!OrbSim::finished(&s, &OrbConfig::default()));
}

// ---------------- ribbons ----------------

#[test]
fn ribbon_heads_settle_on_cursor_plus_offset() {
    let cfg = RibbonsConfig {
        colors: vec![Rgb::WHITE, Rgb::BLACK],
        ..Default::default()
    };
    let mut s = RibbonsSim::init(&cfg, &cfg.quality.tier());
    let signal = signal_at(0.5, 0.25);
    for _ in 0..600 {
        RibbonsSim::advance(&mut s, 1.0 / 60.0, &cfg, &signal);
    }
    for r in &s.ribbons {
        let target = Vec3::new(0.5, 0.25, 0.0) + r.offset;
        assert!(r.head.distance(target) < 0.01, "head {:?} target {:?}", r.head, target);
        assert!(r.trail.len() <= r.trail.capacity());
        assert!(!r.trail.is_empty());
    }
}

#[test]
fn ribbon_jitter_stays_within_documented_spread() {
    let cfg = RibbonsConfig {
        colors: vec![Rgb::WHITE; 8],
        ..Default::default()
    };
    let s = RibbonsSim::init(&cfg, &cfg.quality.tier());
    assert_eq!(s.ribbons.len(), 8);
    for r in &s.ribbons {
        assert!((r.spring - cfg.base_spring).abs() <= 0.025 + 1e-6);
        assert!((r.friction - cfg.base_friction).abs() <= 0.025 + 1e-6);
        assert!((r.thickness - cfg.base_thickness).abs() <= 1.5 + 1e-5);
    }
    // offsets spread symmetrically around the cursor
    let mean_x: f32 = s.ribbons.iter().map(|r| r.offset.x).sum::<f32>() / 8.0;
    assert!(mean_x.abs() < 0.01);
}

#[test]
fn ribbon_capacity_scales_with_quality() {
    let cfg = RibbonsConfig {
        quality: Quality::Low,
        ..Default::default()
    };
    let s = RibbonsSim::init(&cfg, &cfg.quality.tier());
    assert_eq!(s.ribbons[0].trail.capacity(), 25);
}

// ---------------- ballpit ----------------

#[test]
fn ballpit_body_zero_follows_cursor() {
    let cfg = small_ballpit();
    let mut s = BallpitSim::init(&cfg, &cfg.quality.tier());
    assert_eq!(s.bodies[0].radius, cfg.size0);
    let signal = signal_at(0.5, 0.5);
    for _ in 0..300 {
        BallpitSim::advance(&mut s, 1.0 / 60.0, &cfg, &signal);
    }
    let target = Vec3::new(0.5 * cfg.max_x, 0.5 * cfg.max_y, 0.0);
    assert!(s.bodies[0].position.distance(target) < 1e-3);
}

#[test]
fn ballpit_bodies_stay_inside_walls() {
    let cfg = BallpitConfig {
        follow_cursor: false,
        ..small_ballpit()
    };
    let mut s = BallpitSim::init(&cfg, &cfg.quality.tier());
    let signal = InteractionSignal::default();
    for _ in 0..600 {
        BallpitSim::advance(&mut s, 1.0 / 60.0, &cfg, &signal);
    }
    for b in &s.bodies {
        assert!(b.position.x.abs() <= cfg.max_x + 1e-3);
        assert!(b.position.z.abs() <= cfg.max_z + 1e-3);
        assert!(b.position.y >= -cfg.max_y - 1e-3);
        assert!(b.velocity.is_finite());
    }
}

#[test]
fn ballpit_sizes_and_count_follow_config() {
    let cfg = BallpitConfig {
        count: 40,
        quality: Quality::Low,
        ..small_ballpit()
    };
    let s = BallpitSim::init(&cfg, &cfg.quality.tier());
    assert_eq!(s.bodies.len(), 20);
    for b in s.bodies.iter().skip(1) {
        assert!(b.radius >= cfg.min_size && b.radius <= cfg.max_size);
    }
}

// ---------------- grid ----------------

#[test]
fn grid_push_hits_cells_near_cursor_only() {
    let cfg = GridDistortionConfig::default();
    let mut s = GridSim::init(&cfg, &cfg.quality.tier());
    assert_eq!(s.size, 15);
    let mut signal = signal_at(0.0, 0.0);
    signal.velocity = Vec2::new(0.01, 0.0);
    GridSim::advance(&mut s, 1.0 / 60.0, &cfg, &signal);

    let near = s.offset(7, 7).unwrap();
    assert!(near.x > 0.0);
    assert!(near.y.abs() < 1e-6);
    assert_eq!(s.offset(0, 0), Some(Vec2::ZERO));
    assert_eq!(s.offset(14, 14), Some(Vec2::ZERO));
    assert_eq!(s.offset(15, 0), None);
}

#[test]
fn grid_relaxes_back_to_rest() {
    let cfg = GridDistortionConfig::default();
    let mut s = GridSim::init(&cfg, &cfg.quality.tier());
    let mut signal = signal_at(0.0, 0.0);
    signal.velocity = Vec2::new(0.02, -0.02);
    GridSim::advance(&mut s, 1.0 / 60.0, &cfg, &signal);
    let peak = s.max_displacement();
    assert!(peak > 0.0);

    let away = InteractionSignal::default();
    for _ in 0..120 {
        GridSim::advance(&mut s, 1.0 / 60.0, &cfg, &away);
    }
    assert!(s.max_displacement() < peak * 1e-3);
}

#[test]
fn grid_size_never_drops_below_minimum() {
    let cfg = GridDistortionConfig {
        grid: 6,
        quality: Quality::Low,
        ..Default::default()
    };
    let s = GridSim::init(&cfg, &cfg.quality.tier());
    assert_eq!(s.size, 6);
    assert_eq!(s.offsets.len(), 36);
}

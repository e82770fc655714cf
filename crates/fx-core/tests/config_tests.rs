// Host-side tests for option parsing, defaults and range clamping.

use fx_core::config::*;

#[test]
fn missing_options_fall_back_to_defaults() {
    let cfg: EffectConfig = serde_json::from_str(r#"{"effect":"orb","hue":30}"#).unwrap();
    match cfg {
        EffectConfig::Orb(orb) => {
            assert_eq!(orb.hue, 30.0);
            assert_eq!(orb.hover_intensity, 0.2);
            assert!(orb.rotate_on_hover);
            assert!(!orb.force_hover_state);
            assert_eq!(orb.quality, Quality::Medium);
        }
        other => panic!("expected orb, got {:?}", other),
    }
}

#[test]
fn unknown_options_are_ignored() {
    let cfg: EffectConfig =
        serde_json::from_str(r#"{"effect":"ballpit","count":10,"sparkle":true}"#).unwrap();
    match cfg {
        EffectConfig::Ballpit(b) => {
            assert_eq!(b.count, 10);
            assert_eq!(b.gravity, 0.5);
        }
        other => panic!("expected ballpit, got {:?}", other),
    }
}

#[test]
fn grid_distortion_tag_is_camel_case() {
    let cfg: EffectConfig =
        serde_json::from_str(r#"{"effect":"gridDistortion","grid":20,"quality":"low"}"#).unwrap();
    assert_eq!(cfg.name(), "gridDistortion");
    assert_eq!(cfg.quality(), Quality::Low);
}

#[test]
fn colors_accept_hex_packed_and_float_forms() {
    let cfg: EffectConfig = serde_json::from_str(
        r##"{"effect":"ribbons","colors":["#ff0000", 65280, [0, 0, 1]]}"##,
    )
    .unwrap();
    let EffectConfig::Ribbons(r) = cfg else {
        panic!("expected ribbons");
    };
    assert_eq!(r.colors.len(), 3);
    assert_eq!(r.colors[0], Rgb([1.0, 0.0, 0.0]));
    assert_eq!(r.colors[1], Rgb([0.0, 1.0, 0.0]));
    assert_eq!(r.colors[2], Rgb([0.0, 0.0, 1.0]));
}

#[test]
fn invalid_color_string_is_rejected() {
    let res: Result<EffectConfig, _> =
        serde_json::from_str(r#"{"effect":"ribbons","colors":["not-a-color"]}"#);
    assert!(res.is_err());
}

#[test]
fn short_hex_expands() {
    assert_eq!(Rgb::from_hex("#fff"), Some(Rgb::WHITE));
    assert_eq!(Rgb::from_hex("000"), Some(Rgb::BLACK));
    assert_eq!(Rgb::from_hex("#12345"), None);
}

#[test]
fn out_of_range_values_clamp_to_nearest_bound() {
    let orb = OrbConfig {
        hue: 500.0,
        hover_intensity: -1.0,
        scale: f32::NAN,
        ..Default::default()
    }
    .sanitized();
    assert_eq!(orb.hue, 180.0);
    assert_eq!(orb.hover_intensity, 0.0);
    assert_eq!(orb.scale, 0.1);

    let grid = GridDistortionConfig {
        grid: 1,
        relaxation: 2.0,
        ..Default::default()
    }
    .sanitized();
    assert_eq!(grid.grid, 6);
    assert_eq!(grid.relaxation, 0.999);
}

#[test]
fn ribbon_color_list_is_bounded() {
    let empty = RibbonsConfig {
        colors: vec![],
        ..Default::default()
    }
    .sanitized();
    assert_eq!(empty.colors.len(), 1);

    let many = RibbonsConfig {
        colors: vec![Rgb::WHITE; 20],
        ..Default::default()
    }
    .sanitized();
    assert_eq!(many.colors.len(), fx_core::constants::RIBBON_MAX_COLORS);
}

#[test]
fn reversed_size_range_is_swapped() {
    let b = BallpitConfig {
        min_size: 2.0,
        max_size: 0.5,
        ..Default::default()
    }
    .sanitized();
    assert!(b.min_size <= b.max_size);
    assert_eq!(b.min_size, 0.5);
    assert_eq!(b.max_size, 2.0);
}

#[test]
fn quality_tiers_match_documented_values() {
    let low = Quality::Low.tier();
    assert_eq!(low.target_fps, 20.0);
    assert_eq!(low.max_pixel_ratio, 0.5);
    assert_eq!(low.frame_interval_ms(), 50.0);

    let high = Quality::High.tier();
    assert_eq!(high.target_fps, 60.0);
    assert_eq!(high.detail, 1.0);

    assert_eq!(Quality::parse("MEDIUM"), Some(Quality::Medium));
    assert_eq!(Quality::parse("ultra"), None);
}

#[test]
fn pixel_ratio_is_capped_by_tier() {
    let medium = Quality::Medium.tier();
    assert_eq!(medium.pixel_ratio(2.0), 0.75);
    assert_eq!(medium.pixel_ratio(0.5), 0.5);
    assert_eq!(medium.pixel_ratio(f32::NAN), 0.75);
    assert_eq!(Quality::High.tier().pixel_ratio(0.0), 1.0);
}

#[test]
fn detail_scales_counts_but_respects_minimum() {
    assert_eq!(Quality::High.tier().scale_count(200, 1), 200);
    assert_eq!(Quality::Low.tier().scale_count(200, 1), 100);
    assert_eq!(Quality::Low.tier().scale_count(1, 1), 1);
    assert_eq!(Quality::Low.tier().scale_count(6, 6), 6);
}

#[test]
fn state_invalidation_rules() {
    let base = EffectConfig::default_for("ballpit").unwrap();
    let mut recolored = base.clone();
    if let EffectConfig::Ballpit(b) = &mut recolored {
        b.gravity = 1.0;
        b.colors = vec![Rgb::WHITE];
    }
    assert!(!base.invalidates_state(&recolored));

    let mut recounted = base.clone();
    if let EffectConfig::Ballpit(b) = &mut recounted {
        b.count = 10;
    }
    assert!(base.invalidates_state(&recounted));

    let mut requalified = base.clone();
    requalified.set_quality(Quality::Low);
    assert!(base.invalidates_state(&requalified));

    let orb = EffectConfig::default_for("orb").unwrap();
    assert!(base.invalidates_state(&orb));
}

#[test]
fn default_for_accepts_family_aliases() {
    for name in ["gridDistortion", "grid-distortion", "grid"] {
        assert_eq!(
            EffectConfig::default_for(name).map(|c| c.name()),
            Some("gridDistortion")
        );
    }
    assert!(EffectConfig::default_for("plasma").is_none());
}

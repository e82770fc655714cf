//! Declarative configuration surface for every effect family.
//!
//! All option records deserialize with `#[serde(default)]`, so a partial
//! options object falls back to the documented defaults and unknown keys are
//! ignored. Range validation happens in `sanitized()`: out-of-range values are
//! clamped to the nearest bound and reported once through the log, the
//! render loop never aborts on a bad value.

use crate::constants::RIBBON_MAX_COLORS;
use crate::error::FxError;
use serde::{Deserialize, Serialize};

/// Named quality bundle selected by the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    #[default]
    Medium,
    High,
}

/// What a quality level actually costs: frame rate cap, pixel density cap and
/// how much simulation detail (body counts, grid size) is kept.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QualityTier {
    pub target_fps: f32,
    pub max_pixel_ratio: f32,
    /// 0.0 (coarsest) ..= 1.0 (full detail)
    pub detail: f32,
}

impl Quality {
    pub fn tier(self) -> QualityTier {
        match self {
            Quality::Low => QualityTier {
                target_fps: 20.0,
                max_pixel_ratio: 0.5,
                detail: 0.0,
            },
            Quality::Medium => QualityTier {
                target_fps: 30.0,
                max_pixel_ratio: 0.75,
                detail: 0.5,
            },
            Quality::High => QualityTier {
                target_fps: 60.0,
                max_pixel_ratio: 1.0,
                detail: 1.0,
            },
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "low" => Some(Quality::Low),
            "medium" => Some(Quality::Medium),
            "high" => Some(Quality::High),
            _ => None,
        }
    }
}

impl QualityTier {
    /// Minimum spacing between executed frames, in milliseconds.
    #[inline]
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.target_fps as f64
    }

    /// Effective pixel ratio for a display reporting `device_pixel_ratio`.
    #[inline]
    pub fn pixel_ratio(&self, device_pixel_ratio: f32) -> f32 {
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        dpr.min(self.max_pixel_ratio)
    }

    /// Scale a configured body/point count by the detail level.
    ///
    /// Full detail keeps the count, the coarsest tier keeps half of it.
    #[inline]
    pub fn scale_count(&self, count: u32, min: u32) -> u32 {
        let factor = 0.5 + 0.5 * self.detail.clamp(0.0, 1.0);
        ((count as f32 * factor).round() as u32).max(min)
    }
}

// ---------------- Colors ----------------

/// Linear RGB triple in `[0, 1]`.
///
/// Accepts `"#rrggbb"`/`"#rgb"` strings, packed `0xRRGGBB` integers or
/// `[r, g, b]` float arrays.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr", into = "[f32; 3]")]
pub struct Rgb(pub [f32; 3]);

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Packed(u32),
    Hex(String),
    Floats([f32; 3]),
}

impl Rgb {
    pub const BLACK: Rgb = Rgb([0.0, 0.0, 0.0]);
    pub const WHITE: Rgb = Rgb([1.0, 1.0, 1.0]);

    pub fn from_packed(packed: u32) -> Self {
        let r = ((packed >> 16) & 0xff) as f32 / 255.0;
        let g = ((packed >> 8) & 0xff) as f32 / 255.0;
        let b = (packed & 0xff) as f32 / 255.0;
        Rgb([r, g, b])
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        match digits.len() {
            6 => u32::from_str_radix(digits, 16).ok().map(Rgb::from_packed),
            3 => {
                let short = u32::from_str_radix(digits, 16).ok()?;
                let r = (short >> 8) & 0xf;
                let g = (short >> 4) & 0xf;
                let b = short & 0xf;
                Some(Rgb::from_packed(
                    (r * 17) << 16 | (g * 17) << 8 | (b * 17),
                ))
            }
            _ => None,
        }
    }

    #[inline]
    pub fn to_rgba(self, alpha: f32) -> [f32; 4] {
        [self.0[0], self.0[1], self.0[2], alpha]
    }

    fn clamped(self) -> Self {
        Rgb(self.0.map(|c| if c.is_finite() { c.clamp(0.0, 1.0) } else { 0.0 }))
    }
}

impl TryFrom<ColorRepr> for Rgb {
    type Error = String;

    fn try_from(repr: ColorRepr) -> Result<Self, Self::Error> {
        match repr {
            ColorRepr::Packed(p) => Ok(Rgb::from_packed(p & 0x00ff_ffff)),
            ColorRepr::Hex(s) => Rgb::from_hex(&s).ok_or_else(|| format!("invalid color `{s}`")),
            ColorRepr::Floats(f) => Ok(Rgb(f).clamped()),
        }
    }
}

impl From<Rgb> for [f32; 3] {
    fn from(c: Rgb) -> Self {
        c.0
    }
}

// ---------------- Range clamping ----------------

fn clamp_f32(field: &'static str, value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        report(field, value as f64, min as f64, max as f64);
        return min;
    }
    if value < min || value > max {
        report(field, value as f64, min as f64, max as f64);
        return value.clamp(min, max);
    }
    value
}

fn clamp_u32(field: &'static str, value: u32, min: u32, max: u32) -> u32 {
    if value < min || value > max {
        report(field, value as f64, min as f64, max as f64);
        return value.clamp(min, max);
    }
    value
}

fn report(field: &'static str, value: f64, min: f64, max: f64) {
    log::warn!(
        "[config] {}",
        FxError::Configuration {
            field,
            value,
            min,
            max
        }
    );
}

// ---------------- Orb ----------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrbConfig {
    /// Hue rotation in degrees.
    pub hue: f32,
    pub hover_intensity: f32,
    pub rotate_on_hover: bool,
    pub force_hover_state: bool,
    pub scale: f32,
    pub quality: Quality,
    /// Seconds of intro animation before the completion callback fires; 0 disables it.
    pub intro_duration: f32,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            hue: 0.0,
            hover_intensity: 0.2,
            rotate_on_hover: true,
            force_hover_state: false,
            scale: 1.0,
            quality: Quality::Medium,
            intro_duration: 0.0,
        }
    }
}

impl OrbConfig {
    pub fn sanitized(&self) -> Self {
        Self {
            hue: clamp_f32("hue", self.hue, -180.0, 180.0),
            hover_intensity: clamp_f32("hoverIntensity", self.hover_intensity, 0.0, 1.0),
            scale: clamp_f32("scale", self.scale, 0.1, 4.0),
            intro_duration: clamp_f32("introDuration", self.intro_duration, 0.0, 60.0),
            ..self.clone()
        }
    }
}

// ---------------- Ribbons ----------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RibbonsConfig {
    pub colors: Vec<Rgb>,
    pub base_spring: f32,
    pub base_friction: f32,
    pub base_thickness: f32,
    pub offset_factor: f32,
    /// Milliseconds a trail point survives.
    pub max_age: f32,
    pub point_count: u32,
    pub speed_multiplier: f32,
    pub enable_fade: bool,
    pub enable_shader_effect: bool,
    pub effect_amplitude: f32,
    pub background_color: [f32; 4],
    pub quality: Quality,
}

impl Default for RibbonsConfig {
    fn default() -> Self {
        Self {
            colors: vec![Rgb::from_packed(0x5227ff)],
            base_spring: 0.03,
            base_friction: 0.9,
            base_thickness: 30.0,
            offset_factor: 0.02,
            max_age: 500.0,
            point_count: 50,
            speed_multiplier: 0.5,
            enable_fade: true,
            enable_shader_effect: true,
            effect_amplitude: 2.0,
            background_color: [0.0, 0.0, 0.0, 0.0],
            quality: Quality::High,
        }
    }
}

impl RibbonsConfig {
    pub fn sanitized(&self) -> Self {
        let mut colors = self.colors.clone();
        if colors.is_empty() {
            report("colors.len", 0.0, 1.0, RIBBON_MAX_COLORS as f64);
            colors = Self::default().colors;
        }
        if colors.len() > RIBBON_MAX_COLORS {
            report(
                "colors.len",
                colors.len() as f64,
                1.0,
                RIBBON_MAX_COLORS as f64,
            );
            colors.truncate(RIBBON_MAX_COLORS);
        }
        Self {
            colors,
            base_spring: clamp_f32("baseSpring", self.base_spring, 0.0, 0.25),
            base_friction: clamp_f32("baseFriction", self.base_friction, 0.0, 0.99),
            base_thickness: clamp_f32("baseThickness", self.base_thickness, 1.0, 60.0),
            offset_factor: clamp_f32("offsetFactor", self.offset_factor, 0.0, 0.2),
            max_age: clamp_f32("maxAge", self.max_age, 50.0, 2000.0),
            point_count: clamp_u32("pointCount", self.point_count, 2, 200),
            speed_multiplier: clamp_f32("speedMultiplier", self.speed_multiplier, 0.1, 2.0),
            effect_amplitude: clamp_f32("effectAmplitude", self.effect_amplitude, 0.0, 10.0),
            background_color: self
                .background_color
                .map(|c| if c.is_finite() { c.clamp(0.0, 1.0) } else { 0.0 }),
            ..self.clone()
        }
    }
}

// ---------------- Ballpit ----------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BallpitConfig {
    pub count: u32,
    pub gravity: f32,
    pub friction: f32,
    pub wall_bounce: f32,
    pub follow_cursor: bool,
    pub colors: Vec<Rgb>,
    pub ambient_color: Rgb,
    pub ambient_intensity: f32,
    pub light_intensity: f32,
    pub min_size: f32,
    pub max_size: f32,
    pub size0: f32,
    pub max_velocity: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub max_z: f32,
    pub quality: Quality,
    /// Seed for the initial body placement.
    pub seed: u64,
}

impl Default for BallpitConfig {
    fn default() -> Self {
        Self {
            count: 200,
            gravity: 0.5,
            friction: 0.9975,
            wall_bounce: 0.95,
            follow_cursor: true,
            colors: vec![Rgb::BLACK],
            ambient_color: Rgb::WHITE,
            ambient_intensity: 1.0,
            light_intensity: 200.0,
            min_size: 0.5,
            max_size: 1.0,
            size0: 1.0,
            max_velocity: 0.15,
            max_x: 5.0,
            max_y: 5.0,
            max_z: 2.0,
            quality: Quality::High,
            seed: 0,
        }
    }
}

impl BallpitConfig {
    pub fn sanitized(&self) -> Self {
        let mut min_size = clamp_f32("minSize", self.min_size, 0.1, 2.0);
        let mut max_size = clamp_f32("maxSize", self.max_size, 0.1, 3.0);
        if min_size > max_size {
            std::mem::swap(&mut min_size, &mut max_size);
        }
        let colors = if self.colors.is_empty() {
            vec![Rgb::BLACK]
        } else {
            self.colors.clone()
        };
        Self {
            count: clamp_u32("count", self.count, 1, 500),
            gravity: clamp_f32("gravity", self.gravity, 0.0, 2.0),
            friction: clamp_f32("friction", self.friction, 0.8, 1.0),
            wall_bounce: clamp_f32("wallBounce", self.wall_bounce, 0.0, 1.0),
            colors,
            ambient_intensity: clamp_f32("ambientIntensity", self.ambient_intensity, 0.0, 4.0),
            light_intensity: clamp_f32("lightIntensity", self.light_intensity, 0.0, 1000.0),
            min_size,
            max_size,
            size0: clamp_f32("size0", self.size0, 0.1, 3.0),
            max_velocity: clamp_f32("maxVelocity", self.max_velocity, 0.01, 1.0),
            max_x: clamp_f32("maxX", self.max_x, 0.5, 20.0),
            max_y: clamp_f32("maxY", self.max_y, 0.5, 20.0),
            max_z: clamp_f32("maxZ", self.max_z, 0.5, 10.0),
            ..self.clone()
        }
    }
}

// ---------------- Grid distortion ----------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridDistortionConfig {
    /// Cells per side of the distortion field.
    pub grid: u32,
    /// Radius of the cursor influence, as a fraction of the grid.
    pub mouse: f32,
    pub strength: f32,
    /// Per-frame decay of displaced cells back to rest.
    pub relaxation: f32,
    pub quality: Quality,
}

impl Default for GridDistortionConfig {
    fn default() -> Self {
        Self {
            grid: 15,
            mouse: 0.1,
            strength: 0.15,
            relaxation: 0.9,
            quality: Quality::High,
        }
    }
}

impl GridDistortionConfig {
    pub fn sanitized(&self) -> Self {
        Self {
            grid: clamp_u32("grid", self.grid, 6, 200),
            mouse: clamp_f32("mouse", self.mouse, 0.0, 1.0),
            strength: clamp_f32("strength", self.strength, 0.0, 1.0),
            relaxation: clamp_f32("relaxation", self.relaxation, 0.0, 0.999),
            ..self.clone()
        }
    }
}

// ---------------- Tagged union ----------------

/// Options for one widget instance, tagged by effect family.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "camelCase")]
pub enum EffectConfig {
    Orb(OrbConfig),
    Ribbons(RibbonsConfig),
    Ballpit(BallpitConfig),
    GridDistortion(GridDistortionConfig),
}

impl Default for EffectConfig {
    fn default() -> Self {
        EffectConfig::Orb(OrbConfig::default())
    }
}

impl EffectConfig {
    /// Default options for an effect family name (`orb`, `ribbons`, `ballpit`,
    /// `gridDistortion`/`grid`).
    pub fn default_for(name: &str) -> Option<Self> {
        match name {
            "orb" => Some(EffectConfig::Orb(OrbConfig::default())),
            "ribbons" => Some(EffectConfig::Ribbons(RibbonsConfig::default())),
            "ballpit" => Some(EffectConfig::Ballpit(BallpitConfig::default())),
            "gridDistortion" | "grid-distortion" | "grid" => {
                Some(EffectConfig::GridDistortion(GridDistortionConfig::default()))
            }
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EffectConfig::Orb(_) => "orb",
            EffectConfig::Ribbons(_) => "ribbons",
            EffectConfig::Ballpit(_) => "ballpit",
            EffectConfig::GridDistortion(_) => "gridDistortion",
        }
    }

    pub fn quality(&self) -> Quality {
        match self {
            EffectConfig::Orb(c) => c.quality,
            EffectConfig::Ribbons(c) => c.quality,
            EffectConfig::Ballpit(c) => c.quality,
            EffectConfig::GridDistortion(c) => c.quality,
        }
    }

    pub fn set_quality(&mut self, quality: Quality) {
        match self {
            EffectConfig::Orb(c) => c.quality = quality,
            EffectConfig::Ribbons(c) => c.quality = quality,
            EffectConfig::Ballpit(c) => c.quality = quality,
            EffectConfig::GridDistortion(c) => c.quality = quality,
        }
    }

    pub fn sanitized(&self) -> Self {
        match self {
            EffectConfig::Orb(c) => EffectConfig::Orb(c.sanitized()),
            EffectConfig::Ribbons(c) => EffectConfig::Ribbons(c.sanitized()),
            EffectConfig::Ballpit(c) => EffectConfig::Ballpit(c.sanitized()),
            EffectConfig::GridDistortion(c) => EffectConfig::GridDistortion(c.sanitized()),
        }
    }

    /// Whether swapping `self` for `next` invalidates the simulation state.
    ///
    /// Changing family or quality always does; within a family only options
    /// that shape the state (body counts, grid size, seeds) do.
    pub fn invalidates_state(&self, next: &EffectConfig) -> bool {
        if self.quality() != next.quality() {
            return true;
        }
        match (self, next) {
            (EffectConfig::Orb(_), EffectConfig::Orb(_)) => false,
            (EffectConfig::Ribbons(a), EffectConfig::Ribbons(b)) => {
                a.colors.len() != b.colors.len() || a.point_count != b.point_count
            }
            (EffectConfig::Ballpit(a), EffectConfig::Ballpit(b)) => {
                a.count != b.count
                    || a.seed != b.seed
                    || a.min_size != b.min_size
                    || a.max_size != b.max_size
                    || a.size0 != b.size0
                    || a.follow_cursor != b.follow_cursor
            }
            (EffectConfig::GridDistortion(a), EffectConfig::GridDistortion(b)) => a.grid != b.grid,
            _ => true,
        }
    }
}

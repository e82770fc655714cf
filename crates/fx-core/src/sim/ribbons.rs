use super::trail::Trail;
use super::{mix_seed, spring_step, substeps, Simulation};
use crate::bridge::{InstanceRecord, SceneUniforms};
use crate::config::{QualityTier, Rgb, RibbonsConfig};
use crate::constants::{
    REFERENCE_FRAME_DT, RIBBON_FRICTION_JITTER, RIBBON_SPRING_JITTER, RIBBON_THICKNESS_JITTER,
};
use crate::interaction::InteractionSignal;
use glam::Vec3;
use rand::prelude::*;
use smallvec::SmallVec;

// speed_multiplier at which trail points age in real time
const REAL_TIME_SPEED: f32 = 0.5;
const RIBBON_SEED: u64 = 0x5227_ff00;

pub struct RibbonsSim;

/// Per-ribbon parameters derived from the options and the ribbon index.
struct RibbonShape {
    offset: Vec3,
    spring: f32,
    friction: f32,
    thickness: f32,
}

impl RibbonShape {
    /// Same jitter for the same index on every call.
    fn derive(config: &RibbonsConfig, index: usize) -> Self {
        let center = (config.colors.len() as f32 - 1.0) * 0.5;
        let mut rng = StdRng::seed_from_u64(mix_seed(RIBBON_SEED, index));
        let mut jitter = |span: f32| (rng.gen::<f32>() - 0.5) * span;
        let spring = (config.base_spring + jitter(RIBBON_SPRING_JITTER)).max(0.0);
        let friction = (config.base_friction + jitter(RIBBON_FRICTION_JITTER)).clamp(0.0, 0.99);
        let thickness = (config.base_thickness + jitter(RIBBON_THICKNESS_JITTER)).max(1.0);
        let offset = Vec3::new(
            (index as f32 - center) * config.offset_factor + jitter(0.01),
            jitter(0.1),
            0.0,
        );
        Self {
            offset,
            spring,
            friction,
            thickness,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ribbon {
    pub head: Vec3,
    pub velocity: Vec3,
    pub offset: Vec3,
    pub spring: f32,
    pub friction: f32,
    pub thickness: f32,
    pub color: Rgb,
    pub trail: Trail,
    since_sample_ms: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RibbonsState {
    pub ribbons: SmallVec<[Ribbon; 4]>,
    pub time: f32,
}

impl RibbonsState {
    /// Spacing between trail samples so `capacity` points span `max_age`.
    fn sample_interval_ms(trail: &Trail) -> f32 {
        trail.max_age() / (trail.capacity().max(2) - 1) as f32
    }
}

impl Simulation for RibbonsSim {
    type Config = RibbonsConfig;
    type State = RibbonsState;

    fn init(config: &RibbonsConfig, tier: &QualityTier) -> RibbonsState {
        let capacity = tier.scale_count(config.point_count, 2) as usize;
        let ribbons = config
            .colors
            .iter()
            .enumerate()
            .map(|(i, color)| {
                let shape = RibbonShape::derive(config, i);
                Ribbon {
                    head: Vec3::ZERO,
                    velocity: Vec3::ZERO,
                    offset: shape.offset,
                    spring: shape.spring,
                    friction: shape.friction,
                    thickness: shape.thickness,
                    color: *color,
                    trail: Trail::new(capacity, config.max_age),
                    since_sample_ms: 0.0,
                }
            })
            .collect();
        RibbonsState {
            ribbons,
            time: 0.0,
        }
    }

    /// Physics family: sub-stepped at the reference rate.
    fn advance(
        state: &mut RibbonsState,
        dt_sec: f32,
        config: &RibbonsConfig,
        signal: &InteractionSignal,
    ) {
        let steps = substeps(dt_sec);
        let cursor = Vec3::new(signal.pointer.x, signal.pointer.y, 0.0);
        let age_rate = config.speed_multiplier / REAL_TIME_SPEED;
        for _ in 0..steps.count {
            state.time += steps.dt;
            let sub_ms = steps.dt * 1000.0 * age_rate;
            for ribbon in state.ribbons.iter_mut() {
                if ribbon.trail.max_age() != config.max_age {
                    ribbon.trail.set_max_age(config.max_age);
                }
                let target = cursor + ribbon.offset;
                spring_step(
                    &mut ribbon.head,
                    &mut ribbon.velocity,
                    target,
                    ribbon.spring,
                    ribbon.friction,
                    steps.scale,
                );
                ribbon.trail.age_by(sub_ms);
                ribbon.since_sample_ms += sub_ms;
                let interval = RibbonsState::sample_interval_ms(&ribbon.trail);
                if ribbon.trail.is_empty() || ribbon.since_sample_ms >= interval {
                    ribbon.trail.push(ribbon.head);
                    ribbon.since_sample_ms = (ribbon.since_sample_ms - interval).clamp(0.0, interval);
                }
            }
        }
    }
}

impl RibbonsSim {
    /// Re-derive colours and spring parameters from `config` for a swap that
    /// keeps the ribbon count; heads and trails carry over.
    pub fn apply(state: &mut RibbonsState, config: &RibbonsConfig) {
        for (i, (ribbon, color)) in state.ribbons.iter_mut().zip(&config.colors).enumerate() {
            let shape = RibbonShape::derive(config, i);
            ribbon.offset = shape.offset;
            ribbon.spring = shape.spring;
            ribbon.friction = shape.friction;
            ribbon.thickness = shape.thickness;
            ribbon.color = *color;
        }
    }

    /// params[0] = [ribbon_count, enable_fade, enable_shader_effect, effect_amplitude]
    /// params[1] = [reference_dt, 0, 0, 0]
    ///
    /// Instances: trail points, newest first per ribbon; `size` is the
    /// thickness in pixels, `color.a` the fade factor (1 - age / max_age) or
    /// 1 when fading is off, `position.z` the ribbon index.
    pub fn pack(
        state: &RibbonsState,
        config: &RibbonsConfig,
        u: &mut SceneUniforms,
        out: &mut Vec<InstanceRecord>,
    ) {
        u.time = state.time;
        u.params[0] = [
            state.ribbons.len() as f32,
            if config.enable_fade { 1.0 } else { 0.0 },
            if config.enable_shader_effect { 1.0 } else { 0.0 },
            config.effect_amplitude,
        ];
        u.params[1] = [REFERENCE_FRAME_DT, 0.0, 0.0, 0.0];
        u.background = config.background_color;
        for (index, ribbon) in state.ribbons.iter().enumerate() {
            let max_age = ribbon.trail.max_age().max(1.0);
            for point in ribbon.trail.iter_newest() {
                let alpha = if config.enable_fade {
                    (1.0 - point.age / max_age).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                out.push(InstanceRecord {
                    position: [point.position.x, point.position.y, index as f32],
                    size: ribbon.thickness,
                    color: ribbon.color.to_rgba(alpha),
                });
            }
        }
    }
}

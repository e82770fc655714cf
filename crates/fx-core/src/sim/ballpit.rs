use super::{mix_seed, substeps, Simulation};
use crate::bridge::{InstanceRecord, SceneUniforms};
use crate::config::{BallpitConfig, QualityTier};
use crate::constants::BALLPIT_CURSOR_FOLLOW;
use crate::interaction::InteractionSignal;
use glam::Vec3;
use rand::prelude::*;

pub struct BallpitSim;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
    pub color_index: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BallpitState {
    pub bodies: Vec<Body>,
    pub time: f32,
    /// Body 0 tracks the cursor instead of integrating.
    pub control_sphere: bool,
}

impl Simulation for BallpitSim {
    type Config = BallpitConfig;
    type State = BallpitState;

    fn init(config: &BallpitConfig, tier: &QualityTier) -> BallpitState {
        let count = tier.scale_count(config.count, 1) as usize;
        let palette = config.colors.len().max(1);
        let bodies = (0..count)
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(mix_seed(config.seed, i));
                let mut span = |max: f32| (rng.gen::<f32>() * 2.0 - 1.0) * max;
                let position = Vec3::new(span(config.max_x), span(config.max_y), span(config.max_z));
                let radius = if i == 0 {
                    config.size0
                } else {
                    config.min_size + rng.gen::<f32>() * (config.max_size - config.min_size)
                };
                Body {
                    position,
                    velocity: Vec3::ZERO,
                    radius,
                    color_index: i % palette,
                }
            })
            .collect();
        BallpitState {
            bodies,
            time: 0.0,
            control_sphere: config.follow_cursor,
        }
    }

    fn advance(
        state: &mut BallpitState,
        dt_sec: f32,
        config: &BallpitConfig,
        signal: &InteractionSignal,
    ) {
        let steps = substeps(dt_sec);
        let bounds = Vec3::new(config.max_x, config.max_y, config.max_z);
        let cursor = Vec3::new(signal.pointer.x * bounds.x, signal.pointer.y * bounds.y, 0.0);
        let first = usize::from(state.control_sphere);
        for _ in 0..steps.count {
            state.time += steps.dt;
            if state.control_sphere {
                if let Some(lead) = state.bodies.first_mut() {
                    let follow = 1.0 - (1.0 - BALLPIT_CURSOR_FOLLOW).powf(steps.scale);
                    lead.position = lead.position.lerp(cursor, follow);
                    lead.velocity = Vec3::ZERO;
                }
            }
            for body in state.bodies.iter_mut().skip(first) {
                body.velocity.y -= steps.dt * config.gravity * body.radius;
                body.velocity *= config.friction.powf(steps.scale);
                body.velocity = body.velocity.clamp_length_max(config.max_velocity);
                body.position += body.velocity * steps.scale;
            }
            resolve_collisions(&mut state.bodies, first);
            for body in state.bodies.iter_mut().skip(first) {
                bounce_walls(body, bounds, config);
            }
        }
    }
}

fn resolve_collisions(bodies: &mut [Body], first: usize) {
    let n = bodies.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let (head, tail) = bodies.split_at_mut(j);
            let a = &mut head[i];
            let b = &mut tail[0];
            let delta = b.position - a.position;
            let dist = delta.length();
            let min_dist = a.radius + b.radius;
            if dist >= min_dist {
                continue;
            }
            let normal = delta.try_normalize().unwrap_or(Vec3::X);
            let overlap = min_dist - dist;
            // The cursor-driven sphere is immovable; push only the other body.
            if i < first {
                b.position += normal * overlap;
                b.velocity += normal * b.velocity.length();
                continue;
            }
            let correction = normal * (overlap * 0.5);
            a.position -= correction;
            b.position += correction;
            let va = a.velocity;
            let vb = b.velocity;
            a.velocity += normal * (vb - va).dot(normal).min(0.0);
            b.velocity -= normal * (vb - va).dot(normal).min(0.0);
        }
    }
}

fn bounce_walls(body: &mut Body, bounds: Vec3, config: &BallpitConfig) {
    let r = body.radius;
    if body.position.x + r > bounds.x {
        body.position.x = bounds.x - r;
        body.velocity.x = -body.velocity.x * config.wall_bounce;
    } else if body.position.x - r < -bounds.x {
        body.position.x = -bounds.x + r;
        body.velocity.x = -body.velocity.x * config.wall_bounce;
    }
    if config.gravity == 0.0 && body.position.y + r > bounds.y {
        body.position.y = bounds.y - r;
        body.velocity.y = -body.velocity.y * config.wall_bounce;
    }
    if body.position.y - r < -bounds.y {
        body.position.y = -bounds.y + r;
        body.velocity.y = -body.velocity.y * config.wall_bounce;
    }
    if body.position.z + r > bounds.z {
        body.position.z = bounds.z - r;
        body.velocity.z = -body.velocity.z * config.wall_bounce;
    } else if body.position.z - r < -bounds.z {
        body.position.z = -bounds.z + r;
        body.velocity.z = -body.velocity.z * config.wall_bounce;
    }
}

impl BallpitSim {
    /// params[0] = [max_x, max_y, max_z, light_intensity]
    /// params[1] = [ambient_r, ambient_g, ambient_b, ambient_intensity]
    pub fn pack(
        state: &BallpitState,
        config: &BallpitConfig,
        u: &mut SceneUniforms,
        out: &mut Vec<InstanceRecord>,
    ) {
        u.time = state.time;
        u.params[0] = [config.max_x, config.max_y, config.max_z, config.light_intensity];
        let [r, g, b] = config.ambient_color.0;
        u.params[1] = [r, g, b, config.ambient_intensity];
        out.extend(state.bodies.iter().map(|body| {
            let color = config
                .colors
                .get(body.color_index)
                .copied()
                .unwrap_or(crate::config::Rgb::BLACK);
            InstanceRecord {
                position: body.position.to_array(),
                size: body.radius,
                color: color.to_rgba(1.0),
            }
        }));
    }
}

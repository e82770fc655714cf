use super::{clamp_dt, Simulation};
use crate::bridge::{InstanceRecord, SceneUniforms};
use crate::config::{GridDistortionConfig, QualityTier};
use crate::constants::{GRID_FORCE_SCALE, GRID_MIN_SIZE, REFERENCE_FRAME_DT};
use crate::interaction::InteractionSignal;
use glam::Vec2;

pub struct GridSim;

/// Row-major `size * size` displacement field; row 0 is the bottom edge.
#[derive(Clone, Debug, PartialEq)]
pub struct GridState {
    pub size: u32,
    pub offsets: Vec<Vec2>,
    pub time: f32,
}

impl GridState {
    #[inline]
    pub fn offset(&self, col: u32, row: u32) -> Option<Vec2> {
        if col >= self.size || row >= self.size {
            return None;
        }
        self.offsets.get((row * self.size + col) as usize).copied()
    }

    pub fn max_displacement(&self) -> f32 {
        self.offsets.iter().map(|o| o.length()).fold(0.0, f32::max)
    }
}

impl Simulation for GridSim {
    type Config = GridDistortionConfig;
    type State = GridState;

    fn init(config: &GridDistortionConfig, tier: &QualityTier) -> GridState {
        let size = tier.scale_count(config.grid, GRID_MIN_SIZE);
        GridState {
            size,
            offsets: vec![Vec2::ZERO; (size * size) as usize],
            time: 0.0,
        }
    }

    fn advance(
        state: &mut GridState,
        dt_sec: f32,
        config: &GridDistortionConfig,
        signal: &InteractionSignal,
    ) {
        let dt = clamp_dt(dt_sec);
        if dt == 0.0 {
            return;
        }
        state.time += dt;
        let scale = dt / REFERENCE_FRAME_DT;
        let decay = config.relaxation.powf(scale);
        for o in state.offsets.iter_mut() {
            *o *= decay;
        }
        if !signal.inside {
            return;
        }
        let size = state.size as f32;
        let cursor = Vec2::new(signal.uv.x * size, (1.0 - signal.uv.y) * size);
        let max_dist = size * config.mouse;
        if max_dist <= 0.0 {
            return;
        }
        // uv velocity is y-down; the field is y-up.
        let push = Vec2::new(signal.velocity.x, -signal.velocity.y)
            * (config.strength * GRID_FORCE_SCALE * scale);
        for row in 0..state.size {
            for col in 0..state.size {
                let cell = Vec2::new(col as f32, row as f32);
                let dist = cell.distance(cursor);
                if dist >= max_dist {
                    continue;
                }
                let power = max_dist / dist.max(1.0);
                let idx = (row * state.size + col) as usize;
                state.offsets[idx] += push * power;
            }
        }
    }
}

impl GridSim {
    /// params[0] = [size, mouse, strength, relaxation]
    ///
    /// Instances: one per cell in row-major order, displacement in
    /// `position.xy`.
    pub fn pack(
        state: &GridState,
        config: &GridDistortionConfig,
        u: &mut SceneUniforms,
        out: &mut Vec<InstanceRecord>,
    ) {
        u.time = state.time;
        u.params[0] = [
            state.size as f32,
            config.mouse,
            config.strength,
            config.relaxation,
        ];
        out.extend(state.offsets.iter().map(|o| InstanceRecord {
            position: [o.x, o.y, 0.0],
            ..Default::default()
        }));
    }
}

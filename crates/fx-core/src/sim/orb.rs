use super::{clamp_dt, Simulation};
use crate::bridge::SceneUniforms;
use crate::config::{OrbConfig, QualityTier};
use crate::constants::ORB_ROTATION_SPEED;
use crate::interaction::InteractionSignal;

pub struct OrbSim;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrbState {
    /// Accumulated (clamped) simulation time in seconds.
    pub time: f32,
    pub rotation: f32,
    pub hover: f32,
    /// Quality value fed to the shader's noise detail.
    pub detail: f32,
}

impl Simulation for OrbSim {
    type Config = OrbConfig;
    type State = OrbState;

    fn init(_config: &OrbConfig, tier: &QualityTier) -> OrbState {
        OrbState {
            detail: tier.detail,
            ..Default::default()
        }
    }

    fn advance(state: &mut OrbState, dt_sec: f32, config: &OrbConfig, signal: &InteractionSignal) {
        let dt = clamp_dt(dt_sec);
        state.time += dt;
        let target = if config.force_hover_state {
            1.0
        } else {
            signal.hover_target
        };
        if config.rotate_on_hover && target > 0.5 {
            state.rotation += dt * ORB_ROTATION_SPEED;
        }
        state.hover = signal.hover;
    }
}

impl OrbSim {
    pub fn finished(state: &OrbState, config: &OrbConfig) -> bool {
        config.intro_duration > 0.0 && state.time >= config.intro_duration
    }

    /// params[0] = [hue, hover_intensity, rotation, scale]
    /// params[1] = [quality, intro_progress, 0, 0]
    pub fn pack(state: &OrbState, config: &OrbConfig, u: &mut SceneUniforms) {
        u.time = state.time;
        u.hover = state.hover;
        u.params[0] = [
            config.hue,
            config.hover_intensity,
            state.rotation,
            config.scale,
        ];
        let intro = if config.intro_duration > 0.0 {
            (state.time / config.intro_duration).min(1.0)
        } else {
            1.0
        };
        u.params[1] = [state.detail, intro, 0.0, 0.0];
    }
}

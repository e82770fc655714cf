//! One running effect: sanitized configuration plus its simulation state.

use crate::bridge::{InstanceRecord, SceneUniforms};
use crate::config::{EffectConfig, QualityTier};
use crate::constants::ORB_HOVER_RADIUS;
use crate::interaction::{HoverRegion, InteractionSignal};
use crate::sim::ballpit::{BallpitSim, BallpitState};
use crate::sim::grid::{GridSim, GridState};
use crate::sim::orb::{OrbSim, OrbState};
use crate::sim::ribbons::{RibbonsSim, RibbonsState};
use crate::sim::Simulation;
use crate::surface::SurfaceSize;

/// Effect family, selecting the GPU program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Orb,
    Ribbons,
    Ballpit,
    GridDistortion,
}

impl EffectKind {
    pub fn of(config: &EffectConfig) -> Self {
        match config {
            EffectConfig::Orb(_) => EffectKind::Orb,
            EffectConfig::Ribbons(_) => EffectKind::Ribbons,
            EffectConfig::Ballpit(_) => EffectKind::Ballpit,
            EffectConfig::GridDistortion(_) => EffectKind::GridDistortion,
        }
    }

    /// Whether the program draws instances, rather than one fullscreen pass.
    pub fn is_instanced(self) -> bool {
        matches!(self, EffectKind::Ribbons | EffectKind::Ballpit)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum SimState {
    Orb(OrbState),
    Ribbons(RibbonsState),
    Ballpit(BallpitState),
    Grid(GridState),
}

#[derive(Clone, Debug)]
pub struct Effect {
    config: EffectConfig,
    state: SimState,
    pointer: [f32; 2],
}

impl Effect {
    /// Sanitize `config` and build fresh state for it.
    pub fn new(config: &EffectConfig) -> Self {
        let config = config.sanitized();
        let state = Self::init_state(&config);
        Self {
            config,
            state,
            pointer: [0.0, 0.0],
        }
    }

    fn init_state(config: &EffectConfig) -> SimState {
        let tier = config.quality().tier();
        match config {
            EffectConfig::Orb(c) => SimState::Orb(OrbSim::init(c, &tier)),
            EffectConfig::Ribbons(c) => SimState::Ribbons(RibbonsSim::init(c, &tier)),
            EffectConfig::Ballpit(c) => SimState::Ballpit(BallpitSim::init(c, &tier)),
            EffectConfig::GridDistortion(c) => SimState::Grid(GridSim::init(c, &tier)),
        }
    }

    #[inline]
    pub fn kind(&self) -> EffectKind {
        EffectKind::of(&self.config)
    }

    #[inline]
    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    #[inline]
    pub fn tier(&self) -> QualityTier {
        self.config.quality().tier()
    }

    pub fn hover_region(&self) -> HoverRegion {
        match self.config {
            EffectConfig::Orb(_) => HoverRegion::Disc {
                radius: ORB_HOVER_RADIUS,
            },
            _ => HoverRegion::Element,
        }
    }

    pub fn forces_hover(&self) -> bool {
        matches!(&self.config, EffectConfig::Orb(c) if c.force_hover_state)
    }

    /// Number of simulated elements (bodies, trail points, grid cells).
    pub fn element_count(&self) -> usize {
        match &self.state {
            SimState::Orb(_) => 0,
            SimState::Ribbons(s) => s.ribbons.iter().map(|r| r.trail.len()).sum(),
            SimState::Ballpit(s) => s.bodies.len(),
            SimState::Grid(s) => s.offsets.len(),
        }
    }

    pub fn orb_state(&self) -> Option<&OrbState> {
        match &self.state {
            SimState::Orb(s) => Some(s),
            _ => None,
        }
    }

    pub fn ribbons_state(&self) -> Option<&RibbonsState> {
        match &self.state {
            SimState::Ribbons(s) => Some(s),
            _ => None,
        }
    }

    pub fn ballpit_state(&self) -> Option<&BallpitState> {
        match &self.state {
            SimState::Ballpit(s) => Some(s),
            _ => None,
        }
    }

    pub fn grid_state(&self) -> Option<&GridState> {
        match &self.state {
            SimState::Grid(s) => Some(s),
            _ => None,
        }
    }

    pub fn advance(&mut self, dt_sec: f32, signal: &InteractionSignal) {
        self.pointer = signal.pointer.to_array();
        match (&mut self.state, &self.config) {
            (SimState::Orb(s), EffectConfig::Orb(c)) => OrbSim::advance(s, dt_sec, c, signal),
            (SimState::Ribbons(s), EffectConfig::Ribbons(c)) => {
                RibbonsSim::advance(s, dt_sec, c, signal)
            }
            (SimState::Ballpit(s), EffectConfig::Ballpit(c)) => {
                BallpitSim::advance(s, dt_sec, c, signal)
            }
            (SimState::Grid(s), EffectConfig::GridDistortion(c)) => {
                GridSim::advance(s, dt_sec, c, signal)
            }
            _ => log::error!("[effect] state does not match config {}", self.config.name()),
        }
    }

    /// Replace the configuration; the state is rebuilt only when the new
    /// options invalidate it, otherwise per-element parameters copied at
    /// init are refreshed. Returns whether the state was reset.
    pub fn reconfigure(&mut self, next: &EffectConfig) -> bool {
        let next = next.sanitized();
        let reset = self.config.invalidates_state(&next);
        self.config = next;
        if reset {
            self.state = Self::init_state(&self.config);
            log::info!("[effect] state reset for {}", self.config.name());
        } else if let (SimState::Ribbons(s), EffectConfig::Ribbons(c)) =
            (&mut self.state, &self.config)
        {
            RibbonsSim::apply(s, c);
        }
        reset
    }

    /// Whether a one-shot animation has run to completion.
    pub fn finished(&self) -> bool {
        match (&self.state, &self.config) {
            (SimState::Orb(s), EffectConfig::Orb(c)) => OrbSim::finished(s, c),
            _ => false,
        }
    }

    /// Fill uniform parameters and instance records for the current state.
    pub fn pack(&self, _size: SurfaceSize, u: &mut SceneUniforms, out: &mut Vec<InstanceRecord>) {
        u.pointer = self.pointer;
        match (&self.state, &self.config) {
            (SimState::Orb(s), EffectConfig::Orb(c)) => OrbSim::pack(s, c, u),
            (SimState::Ribbons(s), EffectConfig::Ribbons(c)) => RibbonsSim::pack(s, c, u, out),
            (SimState::Ballpit(s), EffectConfig::Ballpit(c)) => BallpitSim::pack(s, c, u, out),
            (SimState::Grid(s), EffectConfig::GridDistortion(c)) => GridSim::pack(s, c, u, out),
            _ => {}
        }
    }
}

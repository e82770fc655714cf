pub mod bridge;
pub mod config;
pub mod constants;
pub mod effect;
pub mod error;
pub mod frame;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod headless;
pub mod interaction;
pub mod lifecycle;
pub mod once;
pub mod scheduler;
pub mod sim;
pub mod surface;

pub static COMMON_WGSL: &str = include_str!("../shaders/common.wgsl");
pub static ORB_WGSL: &str = include_str!("../shaders/orb.wgsl");
pub static RIBBONS_WGSL: &str = include_str!("../shaders/ribbons.wgsl");
pub static BALLPIT_WGSL: &str = include_str!("../shaders/ballpit.wgsl");
pub static GRID_WGSL: &str = include_str!("../shaders/grid.wgsl");

pub use bridge::{InstanceRecord, SceneUniforms, UniformBridge};
pub use config::{EffectConfig, Quality, QualityTier, Rgb};
pub use effect::{Effect, EffectKind};
pub use error::{FxError, FxResult, TickError};
pub use frame::{FrameContext, FrameThrottle};
pub use interaction::{HostRect, HoverRegion, InteractionAdapter, InteractionSignal};
pub use lifecycle::{Host, Instance, ListenerGuard, ListenerSet, SharedInput, TickOutcome};
pub use scheduler::{FrameRequest, FrameScheduler, LoopState, LoopStats, RenderLoop};
pub use surface::{GpuBackend, SurfaceManager, SurfaceSize};

impl EffectKind {
    /// Fragment/vertex source for the family, to be appended to [`COMMON_WGSL`].
    pub fn shader_source(self) -> &'static str {
        match self {
            EffectKind::Orb => ORB_WGSL,
            EffectKind::Ribbons => RIBBONS_WGSL,
            EffectKind::Ballpit => BALLPIT_WGSL,
            EffectKind::GridDistortion => GRID_WGSL,
        }
    }
}

// Shared loop/interaction tuning constants used by both web and native frontends.

// Frame timing
pub const MAX_FRAME_DT: f32 = 1.0 / 15.0; // largest dt a simulation step will ever see
pub const REFERENCE_FRAME_DT: f32 = 1.0 / 60.0; // per-frame physics constants are tuned at this rate
pub const MAX_SUBSTEPS: u32 = 4; // MAX_FRAME_DT / REFERENCE_FRAME_DT

// Pointer handling
pub const POINTER_COALESCE_MS: f64 = 16.0; // accept at most one pointer move per window
pub const HOVER_SMOOTHING: f32 = 0.1; // fraction of the remaining distance covered per reference frame
pub const HOVER_SNAP_EPSILON: f32 = 1e-4; // below this distance the hover blend snaps to its target
pub const POINTER_VELOCITY_DECAY: f32 = 0.9; // per reference frame

// Surface sizing
pub const MIN_BACKING_PX: u32 = 1;

// Orb
pub const ORB_HOVER_RADIUS: f32 = 0.8; // size-normalized disc that counts as hovering
pub const ORB_ROTATION_SPEED: f32 = 0.3; // radians per second while hovered

// Ribbons
pub const RIBBON_SPRING_JITTER: f32 = 0.05; // full span, ± half
pub const RIBBON_FRICTION_JITTER: f32 = 0.05; // full span, ± half
pub const RIBBON_THICKNESS_JITTER: f32 = 3.0; // full span, ± half
pub const RIBBON_MAX_COLORS: usize = 8;

// Ballpit
pub const BALLPIT_CURSOR_FOLLOW: f32 = 0.1; // lerp factor of the controlled sphere per reference frame

// Grid distortion
pub const GRID_MIN_SIZE: u32 = 6;
pub const GRID_FORCE_SCALE: f32 = 100.0;

use crate::effect::Effect;
use crate::error::TickError;
use crate::frame::FrameContext;
use crate::surface::{GpuBackend, SurfaceManager};

/// Uniform block shared by every effect program (see `shaders/common.wgsl`).
///
/// `params` carries family-specific values; each family documents its own
/// slot layout next to its `pack` function.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub dt: f32,
    pub pointer: [f32; 2],
    pub hover: f32,
    pub instance_count: u32,
    pub params: [[f32; 4]; 4],
    pub background: [f32; 4],
}

/// One storage-buffer element: a body, a trail point or a grid cell offset.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRecord {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 4],
}

/// Mirrors simulation state and configuration into GPU parameters.
///
/// The instance vector is cleared, never dropped, so once it reached its
/// peak size the steady-state path performs no allocation.
#[derive(Default)]
pub struct UniformBridge {
    uniforms: SceneUniforms,
    instances: Vec<InstanceRecord>,
}

impl UniformBridge {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn uniforms(&self) -> &SceneUniforms {
        &self.uniforms
    }

    #[inline]
    pub fn instances(&self) -> &[InstanceRecord] {
        &self.instances
    }

    /// Pack `effect` for `frame` and push it to the surface's backend.
    ///
    /// Must run after the simulation step and before the draw of the same
    /// tick. Returns the number of instances written.
    pub fn sync<B: GpuBackend>(
        &mut self,
        surface: &mut SurfaceManager<B>,
        effect: &Effect,
        frame: &FrameContext,
    ) -> Result<u32, TickError> {
        let size = surface.size();
        self.instances.clear();
        self.uniforms = SceneUniforms {
            resolution: [size.width as f32, size.height as f32],
            dt: frame.dt_sec,
            ..SceneUniforms::default()
        };
        effect.pack(size, &mut self.uniforms, &mut self.instances);
        let count = self.instances.len() as u32;
        self.uniforms.instance_count = count;
        match surface.backend_mut() {
            Some(backend) => backend.write(&self.uniforms, &self.instances)?,
            None => return Ok(0),
        }
        Ok(count)
    }
}

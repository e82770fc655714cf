//! Drawing surface ownership.
//!
//! [`SurfaceManager`] wraps a platform [`GpuBackend`] and enforces the
//! lifecycle rules every backend would otherwise have to re-implement:
//! resize is a no-op for unchanged dimensions, destroy runs exactly once, and
//! nothing reaches the backend after destroy.

use crate::bridge::{InstanceRecord, SceneUniforms};
use crate::constants::MIN_BACKING_PX;
use crate::effect::EffectKind;
use crate::error::{FxError, FxResult, TickError};
use crate::interaction::HostRect;

/// Backing store dimensions in device pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    /// CSS size times the effective pixel ratio, at least 1x1.
    pub fn from_css(width: f32, height: f32, pixel_ratio: f32) -> Self {
        let to_px = |css: f32| {
            let px = (css.max(0.0) * pixel_ratio).round();
            if px.is_finite() {
                (px as u32).max(MIN_BACKING_PX)
            } else {
                MIN_BACKING_PX
            }
        };
        Self {
            width: to_px(width),
            height: to_px(height),
        }
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

/// Platform drawing surface + GPU context.
///
/// Implementations: `fx-web` (wgpu on a canvas), `fx-native` (wgpu on a
/// winit window) and [`crate::headless::HeadlessBackend`].
pub trait GpuBackend {
    /// Compile the program and geometry for an effect family, replacing any
    /// previous one.
    fn build_program(&mut self, kind: EffectKind) -> FxResult<()>;
    /// Reallocate the backing store.
    fn resize(&mut self, size: SurfaceSize) -> Result<(), TickError>;
    /// Copy uniforms and per-instance records into GPU buffers.
    fn write(
        &mut self,
        uniforms: &SceneUniforms,
        instances: &[InstanceRecord],
    ) -> Result<(), TickError>;
    /// Issue the draw for the current program.
    fn draw(&mut self, instance_count: u32) -> Result<(), TickError>;
    /// Release every GPU resource and detach from the host.
    fn release(&mut self);
}

pub struct SurfaceManager<B: GpuBackend> {
    backend: Option<B>,
    kind: EffectKind,
    size: SurfaceSize,
    pixel_ratio: f32,
    reallocations: u64,
}

impl<B: GpuBackend> SurfaceManager<B> {
    /// Take ownership of a freshly created backend, build the initial program
    /// and size the backing store to `bounds`.
    ///
    /// On failure the backend is released before the error is returned.
    pub fn create(
        mut backend: B,
        kind: EffectKind,
        bounds: HostRect,
        pixel_ratio: f32,
    ) -> FxResult<Self> {
        if let Err(e) = backend.build_program(kind) {
            backend.release();
            return Err(e);
        }
        let size = SurfaceSize::from_css(bounds.width, bounds.height, pixel_ratio);
        if let Err(e) = backend.resize(size) {
            backend.release();
            return Err(FxError::ContextCreation(e.to_string()));
        }
        log::info!(
            "[surface] created {}x{} @{:.2} for {:?}",
            size.width,
            size.height,
            pixel_ratio,
            kind
        );
        Ok(Self {
            backend: Some(backend),
            kind,
            size,
            pixel_ratio,
            reallocations: 1,
        })
    }

    #[inline]
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    #[inline]
    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    #[inline]
    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Number of backing-store allocations so far (including the initial one).
    #[inline]
    pub fn reallocations(&self) -> u64 {
        self.reallocations
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.backend.is_none()
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.backend.as_mut()
    }

    /// Resize the backing store for a CSS size and pixel ratio.
    ///
    /// Returns `Ok(false)` without touching the GPU when the resulting
    /// dimensions are unchanged, the host is collapsed, or the surface is
    /// destroyed.
    pub fn resize(
        &mut self,
        css_width: f32,
        css_height: f32,
        pixel_ratio: f32,
    ) -> Result<bool, TickError> {
        let Some(backend) = self.backend.as_mut() else {
            return Ok(false);
        };
        if !(css_width > 0.0 && css_height > 0.0) {
            return Ok(false);
        }
        let size = SurfaceSize::from_css(css_width, css_height, pixel_ratio);
        if size == self.size {
            self.pixel_ratio = pixel_ratio;
            return Ok(false);
        }
        backend.resize(size)?;
        self.pixel_ratio = pixel_ratio;
        self.size = size;
        self.reallocations += 1;
        Ok(true)
    }

    /// Swap the GPU program for another effect family.
    pub fn rebuild_program(&mut self, kind: EffectKind) -> FxResult<()> {
        let backend = self.backend.as_mut().ok_or(FxError::AlreadyReleased)?;
        backend.build_program(kind)?;
        self.kind = kind;
        Ok(())
    }

    pub fn draw(&mut self, instance_count: u32) -> Result<(), TickError> {
        match self.backend.as_mut() {
            Some(backend) => backend.draw(instance_count),
            None => Ok(()),
        }
    }

    /// Release the backend. Returns `false` when it was already released.
    pub fn destroy(&mut self) -> bool {
        match self.backend.take() {
            Some(mut backend) => {
                backend.release();
                log::info!("[surface] destroyed");
                true
            }
            None => false,
        }
    }
}

impl<B: GpuBackend> Drop for SurfaceManager<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}

//! Acquisition and release of everything one widget instance owns.
//!
//! Activation acquires the surface, then the listeners, then the scheduler;
//! each step is held by an owning guard, so an error part-way through drops
//! (and thereby releases) exactly what was already acquired. Deactivation
//! runs the reverse: stop the loop, detach listeners, destroy the surface.

use crate::bridge::UniformBridge;
use crate::config::EffectConfig;
use crate::effect::{Effect, EffectKind};
use crate::error::{FxError, FxResult, TickError};
use crate::frame::FrameContext;
use crate::interaction::{HostRect, InteractionAdapter};
use crate::once::LogOnce;
use crate::scheduler::{FrameScheduler, LoopState, LoopStats, RenderLoop};
use crate::surface::{GpuBackend, SurfaceManager};
use std::cell::RefCell;
use std::rc::Rc;

/// Input state shared between event listeners and the render loop.
pub type SharedInput = Rc<RefCell<InteractionAdapter>>;

/// Event subscriptions that can be removed again.
pub trait ListenerSet {
    /// Remove every subscription. Called at most once by [`ListenerGuard`].
    fn detach(&mut self);
}

/// Owns a [`ListenerSet`] and detaches it exactly once, on request or on drop.
pub struct ListenerGuard<L: ListenerSet>(Option<L>);

impl<L: ListenerSet> ListenerGuard<L> {
    pub fn new(listeners: L) -> Self {
        Self(Some(listeners))
    }

    pub fn is_attached(&self) -> bool {
        self.0.is_some()
    }

    /// Returns `false` when already detached.
    pub fn detach(&mut self) -> bool {
        match self.0.take() {
            Some(mut listeners) => {
                listeners.detach();
                true
            }
            None => false,
        }
    }
}

impl<L: ListenerSet> Drop for ListenerGuard<L> {
    fn drop(&mut self) {
        self.detach();
    }
}

/// The embedding environment: a host element, its GPU surface, its event
/// sources and its refresh primitive.
pub trait Host {
    type Backend: GpuBackend;
    type Scheduler: FrameScheduler;
    type Listeners: ListenerSet;

    /// Host element rectangle in CSS pixels.
    fn bounds(&self) -> HostRect;
    fn device_pixel_ratio(&self) -> f32;
    fn create_backend(&mut self) -> FxResult<Self::Backend>;
    fn attach_listeners(&mut self, input: SharedInput) -> FxResult<Self::Listeners>;
    fn create_scheduler(&mut self) -> FxResult<Self::Scheduler>;
}

/// Fire-once completion callback.
#[derive(Default)]
pub struct Completion {
    callback: Option<Box<dyn FnOnce()>>,
    fired: bool,
}

impl Completion {
    pub fn set<F: FnOnce() + 'static>(&mut self, callback: F) {
        if !self.fired {
            self.callback = Some(Box::new(callback));
        }
    }

    /// Invoke the callback the first time only. Returns whether this call fired.
    pub fn fire(&mut self) -> bool {
        if self.fired {
            return false;
        }
        self.fired = true;
        if let Some(callback) = self.callback.take() {
            callback();
        }
        true
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Hidden, throttled, or the tick failed transiently.
    Skipped,
    Rendered,
    /// The loop is not running (idle after a fatal error, or destroyed).
    Halted,
}

pub struct Instance<H: Host> {
    render_loop: RenderLoop<H::Scheduler>,
    listeners: ListenerGuard<H::Listeners>,
    surface: SurfaceManager<H::Backend>,
    input: SharedInput,
    effect: Effect,
    bridge: UniformBridge,
    device_pixel_ratio: f32,
    resize_needed: bool,
    pending_config: Option<EffectConfig>,
    completion: Completion,
    transient_log: LogOnce,
    fatal_log: LogOnce,
}

impl<H: Host> Instance<H> {
    /// Acquire surface, listeners and scheduler for `config` and start the
    /// render loop.
    pub fn activate(host: &mut H, config: &EffectConfig) -> FxResult<Self> {
        let effect = Effect::new(config);
        let tier = effect.tier();
        let bounds = host.bounds();
        let device_pixel_ratio = host.device_pixel_ratio();

        let backend = host.create_backend()?;
        let surface = SurfaceManager::create(
            backend,
            effect.kind(),
            bounds,
            tier.pixel_ratio(device_pixel_ratio),
        )?;

        let mut adapter = InteractionAdapter::new(bounds, effect.hover_region());
        adapter.set_forced_hover(effect.forces_hover());
        let input = Rc::new(RefCell::new(adapter));
        let listeners = ListenerGuard::new(host.attach_listeners(Rc::clone(&input))?);

        let scheduler = host.create_scheduler()?;
        let mut render_loop = RenderLoop::new(scheduler, &tier);
        render_loop.start()?;

        log::info!("[lifecycle] activated {}", effect.config().name());
        Ok(Self {
            render_loop,
            listeners,
            surface,
            input,
            effect,
            bridge: UniformBridge::new(),
            device_pixel_ratio,
            resize_needed: false,
            pending_config: None,
            completion: Completion::default(),
            transient_log: LogOnce::new(),
            fatal_log: LogOnce::new(),
        })
    }

    #[inline]
    pub fn state(&self) -> LoopState {
        self.render_loop.state()
    }

    #[inline]
    pub fn stats(&self) -> LoopStats {
        self.render_loop.stats()
    }

    pub fn is_destroyed(&self) -> bool {
        self.render_loop.state() == LoopState::Destroyed
    }

    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    pub fn surface(&self) -> &SurfaceManager<H::Backend> {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut SurfaceManager<H::Backend> {
        &mut self.surface
    }

    pub fn bridge(&self) -> &UniformBridge {
        &self.bridge
    }

    pub fn input(&self) -> SharedInput {
        Rc::clone(&self.input)
    }

    pub fn render_loop(&self) -> &RenderLoop<H::Scheduler> {
        &self.render_loop
    }

    pub fn listeners_attached(&self) -> bool {
        self.listeners.is_attached()
    }

    pub fn completion_fired(&self) -> bool {
        self.completion.has_fired()
    }

    /// Restart a loop that was halted (e.g. after a fatal tick).
    pub fn resume(&mut self) -> FxResult<()> {
        self.render_loop.start()
    }

    pub fn set_on_complete<F: FnOnce() + 'static>(&mut self, callback: F) {
        self.completion.set(callback);
    }

    /// Queue a configuration swap, applied at the start of the next tick.
    pub fn update_config(&mut self, config: EffectConfig) -> FxResult<()> {
        if self.is_destroyed() {
            return Err(FxError::AlreadyReleased);
        }
        self.pending_config = Some(config);
        Ok(())
    }

    /// The display's pixel ratio changed; the backing store follows on the
    /// next tick.
    pub fn set_device_pixel_ratio(&mut self, ratio: f32) {
        if ratio != self.device_pixel_ratio {
            self.device_pixel_ratio = ratio;
            self.resize_needed = true;
        }
    }

    /// Host refresh callback.
    pub fn on_frame(&mut self, timestamp_ms: f64) -> TickOutcome {
        let visible = match self.input.try_borrow() {
            Ok(input) => input.is_visible(),
            Err(_) => true,
        };
        let Some(frame) = self.render_loop.begin_frame(timestamp_ms, visible) else {
            return match self.render_loop.state() {
                LoopState::Running | LoopState::Paused => TickOutcome::Skipped,
                LoopState::Idle | LoopState::Destroyed => TickOutcome::Halted,
            };
        };
        match self.tick(&frame) {
            Ok(()) => TickOutcome::Rendered,
            Err(e) if e.is_fatal() => {
                if self.fatal_log.first() {
                    log::error!("[lifecycle] {}; stopping", e);
                }
                self.render_loop.halt();
                TickOutcome::Halted
            }
            Err(e) => {
                if self.transient_log.first() {
                    log::warn!("[lifecycle] {}; frame skipped", e);
                }
                TickOutcome::Skipped
            }
        }
    }

    fn tick(&mut self, frame: &FrameContext) -> Result<(), TickError> {
        self.apply_pending_config()?;

        let (signal, resized) = {
            let mut input = self
                .input
                .try_borrow_mut()
                .map_err(|_| TickError::Transient("input state busy".into()))?;
            input.flush(frame.timestamp_ms);
            let resized = input.take_resize();
            input.advance(frame.dt_sec);
            (input.signal(), resized)
        };
        // stays set until a resize succeeds, so a failed one is retried
        if resized.is_some() {
            self.resize_needed = true;
        }
        if self.resize_needed {
            let bounds = match resized {
                Some(bounds) => bounds,
                None => self.current_bounds(),
            };
            self.resize_to(bounds)?;
        }

        self.effect.advance(frame.dt_sec, &signal);
        let count = self.bridge.sync(&mut self.surface, &self.effect, frame)?;
        self.surface.draw(count)?;

        if self.effect.finished() && self.completion.fire() {
            log::info!("[lifecycle] {} completed", self.effect.config().name());
        }
        Ok(())
    }

    fn current_bounds(&self) -> HostRect {
        match self.input.try_borrow() {
            Ok(input) => input.bounds(),
            Err(_) => HostRect::default(),
        }
    }

    fn resize_to(&mut self, bounds: HostRect) -> Result<(), TickError> {
        let ratio = self.effect.tier().pixel_ratio(self.device_pixel_ratio);
        self.surface.resize(bounds.width, bounds.height, ratio)?;
        self.resize_needed = false;
        Ok(())
    }

    fn apply_pending_config(&mut self) -> Result<(), TickError> {
        let Some(next) = self.pending_config.take() else {
            return Ok(());
        };
        let kind = EffectKind::of(&next);
        if kind != self.surface.kind() {
            self.surface
                .rebuild_program(kind)
                .map_err(|e| TickError::Fatal(e.to_string()))?;
        }
        let quality_changed = next.quality() != self.effect.config().quality();
        self.effect.reconfigure(&next);
        if let Ok(mut input) = self.input.try_borrow_mut() {
            input.set_region(self.effect.hover_region());
            input.set_forced_hover(self.effect.forces_hover());
        }
        if quality_changed {
            self.render_loop.set_tier(&self.effect.tier());
            self.resize_needed = true;
        }
        log::info!("[lifecycle] reconfigured {}", self.effect.config().name());
        Ok(())
    }

    /// Stop the loop, detach listeners, destroy the surface. Returns `false`
    /// when the instance was already deactivated.
    pub fn deactivate(&mut self) -> bool {
        if !self.render_loop.destroy() {
            return false;
        }
        self.listeners.detach();
        self.surface.destroy();
        self.pending_config = None;
        log::info!("[lifecycle] deactivated");
        true
    }
}

impl<H: Host> Drop for Instance<H> {
    fn drop(&mut self) {
        self.deactivate();
    }
}

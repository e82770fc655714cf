//! Desktop viewer for canvasfx effects.
//!
//! ```text
//! fx-native [effect] [quality] [config.json]
//! fx-native --headless N [effect] [quality] [config.json]
//! ```

use anyhow::Context;
use fx_core::gpu::WgpuBackend;
use fx_core::headless::{self, DriveReport, HeadlessHost};
use fx_core::{
    EffectConfig, FrameRequest, FrameScheduler, FxError, FxResult, Host, HostRect, Instance,
    ListenerSet, Quality, SharedInput, SurfaceSize, TickOutcome,
};
use instant::Instant;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::window::{Window, WindowBuilder};

const HEADLESS_WIDTH: f32 = 800.0;
const HEADLESS_HEIGHT: f32 = 600.0;
const HEADLESS_STEP_MS: f64 = 1000.0 / 60.0;

// ---------------- Arguments ----------------

#[derive(Debug)]
struct Args {
    headless_frames: Option<u32>,
    config: EffectConfig,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Args> {
    let mut headless_frames = None;
    let mut effect: Option<String> = None;
    let mut quality = None;
    let mut file = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--headless" {
            let n = args.next().context("--headless needs a frame count")?;
            headless_frames = Some(n.parse::<u32>().context("frame count")?);
        } else if arg.ends_with(".json") {
            file = Some(arg);
        } else if let Some(q) = Quality::parse(&arg) {
            quality = Some(q);
        } else {
            effect = Some(arg);
        }
    }

    let mut config = match &effect {
        Some(name) => EffectConfig::default_for(name)
            .with_context(|| format!("unknown effect `{}`", name))?,
        None => EffectConfig::default(),
    };
    if let Some(path) = file {
        let text = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
        let loaded: EffectConfig =
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path))?;
        if effect.is_some() && loaded.name() != config.name() {
            log::warn!(
                "[config] {} describes {}; ignoring effect argument",
                path,
                loaded.name()
            );
        }
        config = loaded;
    }
    if let Some(q) = quality {
        config.set_quality(q);
    }
    Ok(Args {
        headless_frames,
        config,
    })
}

// ---------------- Headless benchmark ----------------

fn run_headless(config: &EffectConfig, frames: u32) -> anyhow::Result<()> {
    let mut host = HeadlessHost::new(HEADLESS_WIDTH, HEADLESS_HEIGHT);
    let clock = host.clock().clone();
    let mut instance = Instance::activate(&mut host, config)?;
    let input = instance.input();

    let started = Instant::now();
    let mut report = DriveReport::default();
    for n in 0..frames {
        let t = n as f64 * HEADLESS_STEP_MS;
        // sweep the pointer around the host centre
        let angle = (t / 1000.0) as f32;
        if let Ok(mut input) = input.try_borrow_mut() {
            input.on_pointer_move(
                HEADLESS_WIDTH * (0.5 + 0.3 * angle.cos()),
                HEADLESS_HEIGHT * (0.5 + 0.3 * angle.sin()),
                t,
            );
        }
        let step = headless::drive(&mut instance, &clock, t, HEADLESS_STEP_MS, 1);
        report.callbacks += step.callbacks;
        report.rendered += step.rendered;
        report.skipped += step.skipped;
        report.halted += step.halted;
    }
    let elapsed = started.elapsed();

    let counts = instance
        .surface()
        .backend()
        .map(|b| b.counts())
        .unwrap_or_default();
    let stats = instance.stats();
    log::info!(
        "[bench] {}: {} callbacks, {} executed, {} throttled, {} skipped, {} halted in {:.1?}",
        config.name(),
        report.callbacks,
        stats.executed,
        stats.skipped_throttle,
        report.skipped,
        report.halted,
        elapsed
    );
    log::info!(
        "[bench] {} elements, {} writes, {} draws",
        instance.effect().element_count(),
        counts.writes,
        counts.draws
    );

    instance.deactivate();
    anyhow::ensure!(
        host.ledger().is_clean(),
        "resources still held after deactivate"
    );
    Ok(())
}

// ---------------- Window host ----------------

type PendingRedraw = Rc<Cell<Option<FrameRequest>>>;
type InputSlot = Rc<RefCell<Option<SharedInput>>>;

/// `request_redraw` as a [`FrameScheduler`]; at most one redraw is pending.
struct RedrawScheduler {
    window: Arc<Window>,
    next_id: i64,
    pending: PendingRedraw,
}

impl FrameScheduler for RedrawScheduler {
    fn request_frame(&mut self) -> FxResult<FrameRequest> {
        self.next_id += 1;
        let request = FrameRequest(self.next_id);
        self.pending.set(Some(request));
        self.window.request_redraw();
        Ok(request)
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.pending.get() == Some(request) {
            self.pending.set(None);
        }
    }
}

/// Window events reach the input state only while attached.
struct NativeListeners {
    slot: InputSlot,
}

impl ListenerSet for NativeListeners {
    fn detach(&mut self) {
        self.slot.borrow_mut().take();
    }
}

struct NativeHost {
    window: Arc<Window>,
    gpu: Option<WgpuBackend<'static>>,
    input: InputSlot,
    pending: PendingRedraw,
}

impl Host for NativeHost {
    type Backend = WgpuBackend<'static>;
    type Scheduler = RedrawScheduler;
    type Listeners = NativeListeners;

    fn bounds(&self) -> HostRect {
        window_rect(&self.window, self.window.inner_size())
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.window.scale_factor() as f32
    }

    fn create_backend(&mut self) -> FxResult<WgpuBackend<'static>> {
        self.gpu
            .take()
            .ok_or_else(|| FxError::ContextCreation("window surface already in use".into()))
    }

    fn attach_listeners(&mut self, input: SharedInput) -> FxResult<NativeListeners> {
        *self.input.borrow_mut() = Some(input);
        Ok(NativeListeners {
            slot: Rc::clone(&self.input),
        })
    }

    fn create_scheduler(&mut self) -> FxResult<RedrawScheduler> {
        Ok(RedrawScheduler {
            window: Arc::clone(&self.window),
            next_id: 0,
            pending: Rc::clone(&self.pending),
        })
    }
}

/// Window client area in logical pixels.
fn window_rect(window: &Window, size: PhysicalSize<u32>) -> HostRect {
    let logical = size.to_logical::<f32>(window.scale_factor());
    HostRect::new(0.0, 0.0, logical.width, logical.height)
}

fn with_input(slot: &InputSlot, f: impl FnOnce(&mut fx_core::InteractionAdapter)) {
    if let Some(input) = slot.borrow().as_ref() {
        if let Ok(mut input) = input.try_borrow_mut() {
            f(&mut input);
        }
    }
}

fn run_window(config: EffectConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(format!("canvasfx - {}", config.name()))
            .build(&event_loop)
            .context("window")?,
    );

    let ratio = config
        .quality()
        .tier()
        .pixel_ratio(window.scale_factor() as f32);
    let rect = window_rect(&window, window.inner_size());
    let size = SurfaceSize::from_css(rect.width, rect.height, ratio);
    let instance = wgpu::Instance::default();
    let surface = instance
        .create_surface(Arc::clone(&window))
        .map_err(|e| FxError::ContextCreation(e.to_string()))?;
    let gpu = pollster::block_on(WgpuBackend::new(&instance, surface, size))?;

    let input: InputSlot = Rc::new(RefCell::new(None));
    let pending: PendingRedraw = Rc::new(Cell::new(None));
    let mut host = NativeHost {
        window: Arc::clone(&window),
        gpu: Some(gpu),
        input: Rc::clone(&input),
        pending: Rc::clone(&pending),
    };
    let mut active = Some(Instance::activate(&mut host, &config)?);
    let started = Instant::now();
    let now_ms = move || started.elapsed().as_secs_f64() * 1000.0;

    event_loop.run(move |event, elwt| {
        let Event::WindowEvent { event, .. } = event else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => {
                if let Some(mut instance) = active.take() {
                    instance.deactivate();
                }
                elwt.exit();
            }
            WindowEvent::Resized(size) => {
                let rect = window_rect(&window, size);
                with_input(&input, |i| i.on_resize(rect));
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(instance) = active.as_mut() {
                    instance.set_device_pixel_ratio(scale_factor as f32);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f32>(window.scale_factor());
                let t = now_ms();
                with_input(&input, |i| {
                    i.on_pointer_move(logical.x, logical.y, t);
                });
            }
            WindowEvent::CursorLeft { .. } => with_input(&input, |i| i.on_pointer_leave()),
            WindowEvent::Occluded(occluded) => {
                with_input(&input, |i| i.set_document_visible(!occluded))
            }
            WindowEvent::RedrawRequested => {
                // only redraws the loop asked for count as refresh callbacks
                if pending.take().is_none() {
                    return;
                }
                if let Some(instance) = active.as_mut() {
                    if instance.on_frame(now_ms()) == TickOutcome::Halted {
                        log::error!("[native] render loop halted; exiting");
                        instance.deactivate();
                        elwt.exit();
                    }
                }
            }
            _ => {}
        }
    })?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    log::info!("[native] {:?}", args.config);
    match args.headless_frames {
        Some(frames) => run_headless(&args.config, frames),
        None => run_window(args.config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> anyhow::Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_arguments_mount_the_default_orb() {
        let parsed = args(&[]).unwrap();
        assert_eq!(parsed.config.name(), "orb");
        assert!(parsed.headless_frames.is_none());
    }

    #[test]
    fn effect_and_quality_in_either_order() {
        let a = args(&["ballpit", "low"]).unwrap();
        let b = args(&["low", "ballpit"]).unwrap();
        assert_eq!(a.config, b.config);
        assert_eq!(a.config.quality(), Quality::Low);
    }

    #[test]
    fn headless_needs_a_count() {
        assert!(args(&["--headless"]).is_err());
        assert!(args(&["--headless", "many"]).is_err());
        assert_eq!(args(&["--headless", "30"]).unwrap().headless_frames, Some(30));
    }

    #[test]
    fn unknown_effect_is_an_error() {
        assert!(args(&["fireworks"]).is_err());
    }

    #[test]
    fn headless_run_releases_everything() {
        let config = EffectConfig::default_for("ribbons").unwrap();
        run_headless(&config, 120).unwrap();
    }
}

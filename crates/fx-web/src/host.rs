//! Browser [`Host`]: a container element, its canvas, DOM listeners and RAF.

use fx_core::gpu::WgpuBackend;
use fx_core::{
    EffectKind, FxError, FxResult, GpuBackend, Host, HostRect, InstanceRecord, ListenerSet,
    SceneUniforms, SharedInput, SurfaceSize, TickError,
};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

use crate::dom;
use crate::frame::{RafScheduler, RafSlot};

// ---------------- Backend ----------------

/// wgpu backend bound to a canvas the widget created; releasing it also
/// removes the canvas from the page.
pub struct CanvasBackend {
    gpu: WgpuBackend<'static>,
    canvas: web::HtmlCanvasElement,
    released: bool,
}

impl GpuBackend for CanvasBackend {
    fn build_program(&mut self, kind: EffectKind) -> FxResult<()> {
        self.gpu.build_program(kind)
    }

    fn resize(&mut self, size: SurfaceSize) -> Result<(), TickError> {
        self.canvas.set_width(size.width);
        self.canvas.set_height(size.height);
        self.gpu.resize(size)
    }

    fn write(
        &mut self,
        uniforms: &SceneUniforms,
        instances: &[InstanceRecord],
    ) -> Result<(), TickError> {
        self.gpu.write(uniforms, instances)
    }

    fn draw(&mut self, instance_count: u32) -> Result<(), TickError> {
        self.gpu.draw(instance_count)
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.gpu.release();
        dom::remove_canvas(&self.canvas);
    }
}

impl Drop for CanvasBackend {
    fn drop(&mut self) {
        self.release();
    }
}

// ---------------- Listeners ----------------

type EventClosure = Closure<dyn FnMut(web::Event)>;
type ObserverClosure = Closure<dyn FnMut(js_sys::Array)>;

struct Subscription {
    target: web::EventTarget,
    event: &'static str,
    callback: EventClosure,
}

#[derive(Default)]
pub struct DomListeners {
    subscriptions: Vec<Subscription>,
    observer: Option<(web::IntersectionObserver, ObserverClosure)>,
}

impl DomListeners {
    fn subscribe(
        &mut self,
        target: &web::EventTarget,
        event: &'static str,
        handler: impl FnMut(web::Event) + 'static,
    ) -> FxResult<()> {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web::Event)>);
        target
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .map_err(|e| FxError::Listener(format!("{}: {:?}", event, e)))?;
        self.subscriptions.push(Subscription {
            target: target.clone(),
            event,
            callback,
        });
        Ok(())
    }

    fn observe(&mut self, element: &web::Element, input: SharedInput) -> FxResult<()> {
        let callback = Closure::wrap(Box::new(move |entries: js_sys::Array| {
            let latest = entries
                .iter()
                .filter_map(|e| e.dyn_into::<web::IntersectionObserverEntry>().ok())
                .last();
            if let (Some(entry), Ok(mut input)) = (latest, input.try_borrow_mut()) {
                input.set_in_viewport(entry.is_intersecting());
            }
        }) as Box<dyn FnMut(js_sys::Array)>);
        let observer = web::IntersectionObserver::new(callback.as_ref().unchecked_ref())
            .map_err(|e| FxError::Listener(format!("IntersectionObserver: {:?}", e)))?;
        observer.observe(element);
        self.observer = Some((observer, callback));
        Ok(())
    }
}

impl ListenerSet for DomListeners {
    fn detach(&mut self) {
        for sub in self.subscriptions.drain(..) {
            if let Err(e) = sub
                .target
                .remove_event_listener_with_callback(sub.event, sub.callback.as_ref().unchecked_ref())
            {
                log::warn!("[input] removing {} failed: {:?}", sub.event, e);
            }
        }
        if let Some((observer, _callback)) = self.observer.take() {
            observer.disconnect();
        }
    }
}

// ---------------- Host ----------------

pub struct WebHost {
    window: web::Window,
    document: web::Document,
    container: web::HtmlElement,
    event_source: web::EventTarget,
    canvas: web::HtmlCanvasElement,
    gpu: Option<WgpuBackend<'static>>,
    raf: RafSlot,
}

impl WebHost {
    pub fn new(
        window: web::Window,
        document: web::Document,
        container: web::HtmlElement,
        event_source: Option<web::EventTarget>,
        canvas: web::HtmlCanvasElement,
        gpu: WgpuBackend<'static>,
        raf: RafSlot,
    ) -> Self {
        let event_source = event_source.unwrap_or_else(|| container.clone().into());
        Self {
            window,
            document,
            container,
            event_source,
            canvas,
            gpu: Some(gpu),
            raf,
        }
    }

    fn wire(&self, listeners: &mut DomListeners, input: &SharedInput) -> FxResult<()> {
        {
            let input = input.clone();
            let container = self.container.clone();
            listeners.subscribe(&self.event_source, "pointermove", move |ev| {
                let Some(ev) = ev.dyn_ref::<web::PointerEvent>() else {
                    return;
                };
                if let Ok(mut input) = input.try_borrow_mut() {
                    // the host may have scrolled since the last resize
                    input.on_resize(dom::host_rect(&container));
                    input.on_pointer_move(ev.client_x() as f32, ev.client_y() as f32, ev.time_stamp());
                }
            })?;
        }
        {
            let input = input.clone();
            listeners.subscribe(&self.event_source, "pointerleave", move |_| {
                if let Ok(mut input) = input.try_borrow_mut() {
                    input.on_pointer_leave();
                }
            })?;
        }
        {
            let input = input.clone();
            let container = self.container.clone();
            listeners.subscribe(self.window.as_ref(), "resize", move |_| {
                if let Ok(mut input) = input.try_borrow_mut() {
                    input.on_resize(dom::host_rect(&container));
                }
            })?;
        }
        {
            let input = input.clone();
            let document = self.document.clone();
            listeners.subscribe(self.document.as_ref(), "visibilitychange", move |_| {
                if let Ok(mut input) = input.try_borrow_mut() {
                    input.set_document_visible(dom::document_visible(&document));
                }
            })?;
        }
        listeners.observe(self.container.as_ref(), input.clone())
    }
}

impl Host for WebHost {
    type Backend = CanvasBackend;
    type Scheduler = RafScheduler;
    type Listeners = DomListeners;

    fn bounds(&self) -> HostRect {
        dom::host_rect(self.container.as_ref())
    }

    fn device_pixel_ratio(&self) -> f32 {
        dom::device_pixel_ratio()
    }

    fn create_backend(&mut self) -> FxResult<CanvasBackend> {
        let gpu = self
            .gpu
            .take()
            .ok_or_else(|| FxError::ContextCreation("canvas context already in use".into()))?;
        Ok(CanvasBackend {
            gpu,
            canvas: self.canvas.clone(),
            released: false,
        })
    }

    fn attach_listeners(&mut self, input: SharedInput) -> FxResult<DomListeners> {
        if let Ok(mut state) = input.try_borrow_mut() {
            state.set_document_visible(dom::document_visible(&self.document));
        }
        let mut listeners = DomListeners::default();
        if let Err(e) = self.wire(&mut listeners, &input) {
            listeners.detach();
            return Err(e);
        }
        log::info!("[input] listeners attached");
        Ok(listeners)
    }

    fn create_scheduler(&mut self) -> FxResult<RafScheduler> {
        Ok(RafScheduler::new(self.window.clone(), self.raf.clone()))
    }
}

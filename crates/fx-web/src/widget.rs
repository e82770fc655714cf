use fx_core::gpu::WgpuBackend;
use fx_core::{EffectConfig, FxError, FxResult, Instance, SurfaceSize};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

use crate::dom;
use crate::frame::{self, InstanceSlot, RafSlot};
use crate::host::WebHost;

/// One mounted effect.
///
/// A widget whose GPU context could not be created still mounts: `failure`
/// carries the reason and every other method is a no-op, so the page keeps
/// working without the effect.
#[wasm_bindgen]
pub struct FxWidget {
    instance: InstanceSlot,
    raf: RafSlot,
    failure: Option<String>,
}

#[wasm_bindgen]
impl FxWidget {
    /// Mount an effect into `container`. `options` is a plain object such as
    /// `{ effect: "ribbons", colors: ["#ff0044"] }`; pointer events are read
    /// from `event_source` when given, else from the container.
    pub async fn mount(
        container: web::HtmlElement,
        options: JsValue,
        event_source: Option<web::EventTarget>,
    ) -> Result<FxWidget, JsValue> {
        let config = parse_options(&options)?;
        let window = web::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        dom::inject_stylesheet(&document);
        let canvas = dom::create_canvas(&document, &container)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let rect = dom::host_rect(container.as_ref());
        let ratio = config.quality().tier().pixel_ratio(dom::device_pixel_ratio());
        let size = SurfaceSize::from_css(rect.width, rect.height, ratio);
        let gpu = match create_gpu(&canvas, size).await {
            Ok(gpu) => gpu,
            Err(e) => {
                dom::remove_canvas(&canvas);
                return Ok(Self::failed(e));
            }
        };

        let instance: InstanceSlot = Rc::new(RefCell::new(None));
        let raf = frame::install(&instance);
        let mut host = WebHost::new(
            window,
            document,
            container,
            event_source,
            canvas.clone(),
            gpu,
            raf.clone(),
        );
        match Instance::activate(&mut host, &config) {
            Ok(active) => {
                *instance.borrow_mut() = Some(active);
                Ok(Self {
                    instance,
                    raf,
                    failure: None,
                })
            }
            Err(e) => {
                raf.borrow_mut().take();
                dom::remove_canvas(&canvas);
                Ok(Self::failed(e))
            }
        }
    }

    /// Swap options; applied on the next frame.
    pub fn update(&self, options: JsValue) -> Result<(), JsValue> {
        let config = parse_options(&options)?;
        let Ok(mut slot) = self.instance.try_borrow_mut() else {
            return Err(JsValue::from_str("widget busy"));
        };
        match slot.as_mut().map(|i| i.update_config(config)) {
            Some(Err(FxError::AlreadyReleased)) | None => {
                log::warn!("[widget] update on an unmounted widget ignored");
                Ok(())
            }
            Some(Err(e)) => Err(JsValue::from_str(&e.to_string())),
            Some(Ok(())) => Ok(()),
        }
    }

    /// Register a callback for one-shot effects. It runs at most once, after
    /// the frame that finished the effect.
    #[wasm_bindgen(js_name = setOnComplete)]
    pub fn set_on_complete(&self, callback: js_sys::Function) {
        if let Ok(mut slot) = self.instance.try_borrow_mut() {
            if let Some(instance) = slot.as_mut() {
                instance.set_on_complete(move || {
                    spawn_local(async move {
                        if let Err(e) = callback.call0(&JsValue::NULL) {
                            log::error!("[widget] completion callback threw: {:?}", e);
                        }
                    });
                });
            }
        }
    }

    /// Stop rendering and release the canvas, GPU context and listeners.
    /// Calling it again does nothing.
    pub fn destroy(&self) {
        let taken = match self.instance.try_borrow_mut() {
            Ok(mut slot) => slot.take(),
            Err(_) => {
                log::warn!("[widget] destroy during a frame ignored");
                return;
            }
        };
        if let Some(mut instance) = taken {
            instance.deactivate();
        }
        self.raf.borrow_mut().take();
    }

    #[wasm_bindgen(getter)]
    pub fn failure(&self) -> Option<String> {
        self.failure.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn running(&self) -> bool {
        match self.instance.try_borrow() {
            Ok(slot) => slot.as_ref().is_some_and(|i| !i.is_destroyed()),
            Err(_) => true,
        }
    }
}

impl FxWidget {
    fn failed(error: FxError) -> Self {
        log::warn!("[widget] effect disabled: {}", error);
        Self {
            instance: Rc::new(RefCell::new(None)),
            raf: Rc::new(RefCell::new(None)),
            failure: Some(error.to_string()),
        }
    }
}

fn parse_options(options: &JsValue) -> Result<EffectConfig, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(EffectConfig::default());
    }
    let json: String = js_sys::JSON::stringify(options)?.into();
    serde_json::from_str(&json).map_err(|e| JsValue::from_str(&format!("invalid options: {e}")))
}

async fn create_gpu(
    canvas: &web::HtmlCanvasElement,
    size: SurfaceSize,
) -> FxResult<WgpuBackend<'static>> {
    let instance = wgpu::Instance::default();
    let surface = instance
        .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
        .map_err(|e| FxError::ContextCreation(e.to_string()))?;
    WgpuBackend::new(&instance, surface, size).await
}

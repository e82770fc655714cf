//! `requestAnimationFrame` as a [`FrameScheduler`].

use fx_core::{FrameRequest, FrameScheduler, FxError, FxResult, Instance};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

use crate::dom;
use crate::host::WebHost;

pub type RafClosure = Closure<dyn FnMut(f64)>;
/// The single RAF callback of one widget, shared with its scheduler.
pub type RafSlot = Rc<RefCell<Option<RafClosure>>>;
pub type InstanceSlot = Rc<RefCell<Option<Instance<WebHost>>>>;

/// Build the RAF callback for `instance`. The callback holds only a weak
/// reference, so dropping the widget ends the loop.
pub fn install(instance: &InstanceSlot) -> RafSlot {
    let weak: Weak<RefCell<Option<Instance<WebHost>>>> = Rc::downgrade(instance);
    let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
        let Some(slot) = weak.upgrade() else {
            return;
        };
        let Ok(mut guard) = slot.try_borrow_mut() else {
            log::warn!("[raf] instance busy; frame dropped");
            return;
        };
        if let Some(instance) = guard.as_mut() {
            instance.set_device_pixel_ratio(dom::device_pixel_ratio());
            instance.on_frame(timestamp_ms);
        }
    }) as Box<dyn FnMut(f64)>);
    Rc::new(RefCell::new(Some(closure)))
}

pub struct RafScheduler {
    window: web::Window,
    callback: RafSlot,
}

impl RafScheduler {
    pub fn new(window: web::Window, callback: RafSlot) -> Self {
        Self { window, callback }
    }
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> FxResult<FrameRequest> {
        let slot = self
            .callback
            .try_borrow()
            .map_err(|_| FxError::Scheduler("raf callback busy".into()))?;
        let closure = slot
            .as_ref()
            .ok_or_else(|| FxError::Scheduler("raf callback dropped".into()))?;
        self.window
            .request_animation_frame(closure.as_ref().unchecked_ref())
            .map(|id| FrameRequest(id as i64))
            .map_err(|e| FxError::Scheduler(format!("{:?}", e)))
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if let Err(e) = self.window.cancel_animation_frame(request.0 as i32) {
            log::warn!("[raf] cancel failed: {:?}", e);
        }
    }
}

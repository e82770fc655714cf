#![cfg(target_arch = "wasm32")]
//! WASM front-end: mounts `fx-core` effects onto canvases inside page
//! elements. See [`widget::FxWidget`] for the JS-facing API.

use fx_core::once::InitOnce;
use wasm_bindgen::prelude::*;

mod dom;
mod frame;
mod host;
pub mod widget;

pub use widget::FxWidget;

static LOGGER: InitOnce = InitOnce::new();

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    LOGGER.run(|| {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).ok();
        log::info!("fx-web starting");
    });
    Ok(())
}

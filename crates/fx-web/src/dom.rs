use fx_core::once::InitOnce;
use fx_core::HostRect;
use wasm_bindgen::JsCast;
use web_sys as web;

static STYLESHEET: InitOnce = InitOnce::new();

/// Host container rules shared by every mounted widget.
const WIDGET_CSS: &str = "\
.canvasfx-host{position:relative;overflow:hidden}\
.canvasfx-host>canvas.canvasfx-canvas{position:absolute;inset:0;width:100%;height:100%;display:block;touch-action:none}";

const HOST_CLASS: &str = "canvasfx-host";
const CANVAS_CLASS: &str = "canvasfx-canvas";

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

#[inline]
pub fn device_pixel_ratio() -> f32 {
    web::window().map_or(1.0, |w| w.device_pixel_ratio() as f32)
}

/// Append the widget stylesheet to `<head>` the first time any widget mounts.
pub fn inject_stylesheet(document: &web::Document) {
    STYLESHEET.run(|| {
        let result = document
            .create_element("style")
            .and_then(|style| {
                style.set_text_content(Some(WIDGET_CSS));
                match document.head() {
                    Some(head) => head.append_child(&style).map(|_| ()),
                    None => Ok(()),
                }
            });
        match result {
            Ok(()) => log::info!("[dom] stylesheet injected"),
            Err(e) => log::warn!("[dom] stylesheet injection failed: {:?}", e),
        }
    });
}

/// Create the drawing canvas as the last child of `container`.
pub fn create_canvas(
    document: &web::Document,
    container: &web::HtmlElement,
) -> anyhow::Result<web::HtmlCanvasElement> {
    let canvas: web::HtmlCanvasElement = document
        .create_element("canvas")
        .map_err(|e| anyhow::anyhow!("create canvas: {:?}", e))?
        .dyn_into()
        .map_err(|e| anyhow::anyhow!("not a canvas: {:?}", e))?;
    canvas.set_class_name(CANVAS_CLASS);
    container
        .class_list()
        .add_1(HOST_CLASS)
        .map_err(|e| anyhow::anyhow!("host class: {:?}", e))?;
    container
        .append_child(&canvas)
        .map_err(|e| anyhow::anyhow!("append canvas: {:?}", e))?;
    Ok(canvas)
}

/// Detach `canvas` and drop the host class that `create_canvas` added to
/// its container.
pub fn remove_canvas(canvas: &web::HtmlCanvasElement) {
    if let Some(container) = canvas.parent_element() {
        if let Err(e) = container.class_list().remove_1(HOST_CLASS) {
            log::warn!("[dom] host class removal failed: {:?}", e);
        }
    }
    canvas.remove();
}

/// Bounding rectangle of `el` in CSS pixels.
pub fn host_rect(el: &web::Element) -> HostRect {
    let r = el.get_bounding_client_rect();
    HostRect::new(
        r.left() as f32,
        r.top() as f32,
        r.width() as f32,
        r.height() as f32,
    )
}

pub fn document_visible(document: &web::Document) -> bool {
    document.visibility_state() == web::VisibilityState::Visible
}

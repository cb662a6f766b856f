mod app;
mod renderer;
mod tooltip;

pub use app::EmberApp;
pub use tooltip::FlameTooltip;

// WASM entry point
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let web_options = eframe::WebOptions::default();
    wasm_bindgen_futures::spawn_local(async {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            web_sys::console::error_1(&"emberview: no document".into());
            return;
        };
        let Some(canvas) = document
            .get_element_by_id("emberview_canvas")
            .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        else {
            web_sys::console::error_1(&"emberview: no canvas element 'emberview_canvas'".into());
            return;
        };

        let start_result = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| Ok(Box::new(EmberApp::new(cc)))),
            )
            .await;
        if let Err(e) = start_result {
            web_sys::console::error_1(&format!("emberview: failed to start eframe: {e:?}").into());
        }
    });
    Ok(())
}

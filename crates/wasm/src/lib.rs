//! Bridge exposing the flame-graph engine to a JS canvas host.
//!
//! Engines live in a handle table; every call takes the handle returned
//! by [`create_flamegraph`]. Command streams and hover updates cross
//! the boundary as JSON.

use std::sync::Mutex;

use emberview_core::engine::{
    ContextMenu, EngineConfig, Flamegraph, TooltipBuilder,
};
use emberview_core::model::{FlamegraphData, Frame, ValueMode};
use emberview_protocol::Point;
use wasm_bindgen::prelude::*;

static ENGINES: Mutex<Vec<Option<Flamegraph>>> = Mutex::new(Vec::new());

/// Plain-text tooltip for hosts without their own generator.
struct BridgeTooltip;

impl TooltipBuilder for BridgeTooltip {
    fn generate(
        &self,
        data: &FlamegraphData,
        frame: &Frame,
        root_total_samples: u64,
        _root_total_weight: u64,
    ) -> String {
        let percent = if root_total_samples == 0 {
            0.0
        } else {
            100.0 * frame.total_samples as f64 / root_total_samples as f64
        };
        format!(
            "{}\n{} samples ({percent:.2}%)",
            data.title(frame),
            frame.total_samples
        )
    }
}

/// The host renders its own menu from the hover/context state.
struct BridgeMenu;

impl ContextMenu for BridgeMenu {
    fn show(&mut self, _at: Point) {}
    fn hide(&mut self) {}
}

fn with_engine<T>(
    handle: usize,
    f: impl FnOnce(&mut Flamegraph) -> Result<T, JsError>,
) -> Result<T, JsError> {
    let mut engines = ENGINES
        .lock()
        .map_err(|_| JsError::new("engine table poisoned"))?;
    let engine = engines
        .get_mut(handle)
        .and_then(Option::as_mut)
        .ok_or_else(|| JsError::new("invalid or closed engine handle"))?;
    f(engine)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&e.to_string()))
}

/// Decode flame-graph JSON and build an engine over it. Returns a
/// handle for the other calls.
#[wasm_bindgen]
pub fn create_flamegraph(
    data: &[u8],
    width: f64,
    height: f64,
    use_weight: bool,
) -> Result<usize, JsError> {
    let graph: FlamegraphData =
        serde_json::from_slice(data).map_err(|e| JsError::new(&e.to_string()))?;
    let mode = if use_weight {
        ValueMode::Weight
    } else {
        ValueMode::Samples
    };
    let engine = Flamegraph::new(
        graph,
        EngineConfig {
            width,
            height,
            mode,
        },
        Box::new(BridgeTooltip),
        Box::new(BridgeMenu),
    )
    .map_err(|e| JsError::new(&e.to_string()))?;

    let mut engines = ENGINES
        .lock()
        .map_err(|_| JsError::new("engine table poisoned"))?;
    let handle = engines.len();
    engines.push(Some(engine));
    Ok(handle)
}

/// Render at the current zoom/search state; returns commands as JSON.
#[wasm_bindgen]
pub fn draw_root(handle: usize) -> Result<String, JsError> {
    with_engine(handle, |engine| to_json(&engine.draw_root()))
}

/// Apply a search pattern; returns `{percent, commands}` as JSON.
/// An invalid pattern is a reported error, not an exception trace.
#[wasm_bindgen]
pub fn search(handle: usize, pattern: &str) -> Result<String, JsError> {
    with_engine(handle, |engine| {
        let outcome = engine
            .search(pattern)
            .map_err(|e| JsError::new(&e.to_string()))?;
        #[derive(serde::Serialize)]
        struct Outcome<'a> {
            percent: &'a str,
            commands: &'a [emberview_protocol::RenderCommand],
        }
        to_json(&Outcome {
            percent: &outcome.percent,
            commands: &outcome.commands,
        })
    })
}

#[wasm_bindgen]
pub fn reset_search(handle: usize) -> Result<String, JsError> {
    with_engine(handle, |engine| to_json(&engine.reset_search()))
}

#[wasm_bindgen]
pub fn reset_zoom(handle: usize) -> Result<String, JsError> {
    with_engine(handle, |engine| to_json(&engine.reset_zoom()))
}

#[wasm_bindgen]
pub fn resize(handle: usize, width: f64, height: f64) -> Result<String, JsError> {
    with_engine(handle, |engine| to_json(&engine.resize(width, height)))
}

/// Queue a pointer move (latest wins until the next animation frame).
#[wasm_bindgen]
pub fn pointer_moved(handle: usize, x: f64, y: f64) -> Result<(), JsError> {
    with_engine(handle, |engine| {
        engine.pointer_moved(x, y);
        Ok(())
    })
}

#[wasm_bindgen]
pub fn pointer_left(handle: usize) -> Result<(), JsError> {
    with_engine(handle, |engine| {
        engine.pointer_left();
        Ok(())
    })
}

/// Pump the engine once per requestAnimationFrame; returns the hover
/// update (highlight overlay + tooltip content) as JSON.
#[wasm_bindgen]
pub fn animation_frame(handle: usize) -> Result<String, JsError> {
    with_engine(handle, |engine| to_json(&engine.on_animation_frame()))
}

/// Zoom into the frame at the position; returns commands as JSON, or
/// `null` when the click hits nothing new.
#[wasm_bindgen]
pub fn click(handle: usize, x: f64, y: f64) -> Result<Option<String>, JsError> {
    with_engine(handle, |engine| {
        engine
            .click(x, y)
            .map(|commands| to_json(&commands))
            .transpose()
    })
}

#[wasm_bindgen]
pub fn context_click(handle: usize, x: f64, y: f64) -> Result<(), JsError> {
    with_engine(handle, |engine| {
        engine.context_click(x, y);
        Ok(())
    })
}

#[wasm_bindgen]
pub fn close_context_menu(handle: usize) -> Result<(), JsError> {
    with_engine(handle, |engine| {
        engine.close_context_menu();
        Ok(())
    })
}

#[wasm_bindgen]
pub fn update_scroll_position_y(handle: usize, offset: f64) -> Result<(), JsError> {
    with_engine(handle, |engine| {
        engine.update_scroll_position_y(offset);
        Ok(())
    })
}

/// Full content height in canvas pixels (levels × row height).
#[wasm_bindgen]
pub fn content_height(handle: usize) -> Result<f64, JsError> {
    with_engine(handle, |engine| Ok(engine.content_height()))
}

/// Tear down the engine and free its slot.
#[wasm_bindgen]
pub fn close(handle: usize) -> Result<(), JsError> {
    let mut engines = ENGINES
        .lock()
        .map_err(|_| JsError::new("engine table poisoned"))?;
    if let Some(slot) = engines.get_mut(handle) {
        if let Some(engine) = slot.as_mut() {
            engine.close();
        }
        *slot = None;
    }
    Ok(())
}

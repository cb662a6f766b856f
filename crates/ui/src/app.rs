use std::sync::{Arc, Mutex};

use eframe::egui;
use emberview_core::engine::{
    ContextMenu, EngineConfig, Flamegraph, HighlightBox, HoverUpdate,
};
use emberview_core::model::{FlamegraphData, ValueMode};
use emberview_protocol::{Point, RenderCommand};

use crate::renderer;
use crate::tooltip::FlameTooltip;

/// Shared state behind the engine's context-menu collaborator. The
/// engine drives visibility; the app reads it each frame to lay the
/// menu out.
struct MenuState {
    open: bool,
    at: Point,
}

#[derive(Clone)]
pub(crate) struct MenuHandle(Arc<Mutex<MenuState>>);

impl MenuHandle {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(MenuState {
            open: false,
            at: Point::new(0.0, 0.0),
        })))
    }

    fn is_open(&self) -> bool {
        self.0.lock().map(|s| s.open).unwrap_or(false)
    }

    fn position(&self) -> Point {
        self.0
            .lock()
            .map(|s| s.at)
            .unwrap_or(Point::new(0.0, 0.0))
    }

    fn close(&self) {
        if let Ok(mut state) = self.0.lock() {
            state.open = false;
        }
    }
}

impl ContextMenu for MenuHandle {
    fn show(&mut self, at: Point) {
        if let Ok(mut state) = self.0.lock() {
            state.open = true;
            state.at = at;
        }
    }

    fn hide(&mut self) {
        self.close();
    }
}

/// Main application state: one flame-graph engine per loaded profile.
pub struct EmberApp {
    /// Decoded input, retained so the engine can be rebuilt when the
    /// active unit changes.
    graph: Option<FlamegraphData>,
    engine: Option<Flamegraph>,
    /// Command stream of the last draw.
    commands: Vec<RenderCommand>,

    highlight: Option<HighlightBox>,
    tooltip_text: Option<String>,

    search_text: String,
    match_percent: Option<String>,
    use_weight: bool,

    menu: MenuHandle,
    last_scroll_y: f64,

    error: Option<String>,
    /// Profile bytes arriving from an async load (wasm fetch, drop).
    pending_data: Arc<Mutex<Option<Vec<u8>>>>,
}

impl EmberApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());

        let pending_data: Arc<Mutex<Option<Vec<u8>>>> = Arc::new(Mutex::new(None));

        // On wasm, #demo in the URL hash auto-loads the bundled profile.
        #[cfg(target_arch = "wasm32")]
        {
            if let Some(window) = web_sys::window() {
                let hash = window.location().hash().unwrap_or_default();
                if hash == "#demo" {
                    let pending = pending_data.clone();
                    let ctx = cc.egui_ctx.clone();
                    wasm_bindgen_futures::spawn_local(async move {
                        match Self::fetch_bytes("/assets/demo.json").await {
                            Ok(bytes) => {
                                if let Ok(mut lock) = pending.lock() {
                                    *lock = Some(bytes);
                                }
                                ctx.request_repaint();
                            }
                            Err(e) => {
                                web_sys::console::error_1(
                                    &format!("emberview: fetch error: {e}").into(),
                                );
                            }
                        }
                    });
                }
            }
        }

        Self {
            graph: None,
            engine: None,
            commands: Vec::new(),
            highlight: None,
            tooltip_text: None,
            search_text: String::new(),
            match_percent: None,
            use_weight: false,
            menu: MenuHandle::new(),
            last_scroll_y: 0.0,
            error: None,
            pending_data,
        }
    }

    fn mode(&self) -> ValueMode {
        if self.use_weight {
            ValueMode::Weight
        } else {
            ValueMode::Samples
        }
    }

    fn load_graph(&mut self, data: &[u8]) {
        match serde_json::from_slice::<FlamegraphData>(data) {
            Ok(graph) => {
                self.graph = Some(graph);
                self.error = None;
                self.match_percent = None;
                self.search_text.clear();
                self.rebuild_engine(1000.0);
            }
            Err(e) => {
                self.error = Some(format!("Failed to decode profile: {e}"));
            }
        }
    }

    /// (Re)create the engine over the retained graph, on load and on
    /// unit switch. The previous engine is torn down first.
    fn rebuild_engine(&mut self, width: f64) {
        if let Some(engine) = &mut self.engine {
            engine.close();
        }
        self.engine = None;
        self.highlight = None;
        self.tooltip_text = None;

        let Some(graph) = &self.graph else {
            return;
        };
        let mode = self.mode();
        let height = graph.levels.len() as f64 * emberview_core::FRAME_HEIGHT;
        match Flamegraph::new(
            graph.clone(),
            EngineConfig {
                width,
                height,
                mode,
            },
            Box::new(FlameTooltip::new(mode)),
            Box::new(self.menu.clone()),
        ) {
            Ok(mut engine) => {
                self.commands = engine.draw_root();
                self.engine = Some(engine);
            }
            Err(e) => {
                self.error = Some(format!("Failed to build flame graph: {e}"));
            }
        }
    }

    fn run_search(&mut self) {
        let Some(engine) = &mut self.engine else {
            return;
        };
        if self.search_text.is_empty() {
            self.commands = engine.reset_search();
            self.match_percent = None;
            return;
        }
        match engine.search(&self.search_text) {
            Ok(outcome) => {
                self.commands = outcome.commands;
                self.match_percent = Some(outcome.percent);
                self.error = None;
            }
            Err(e) => {
                self.error = Some(e.to_string());
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    async fn fetch_bytes(url: &str) -> Result<Vec<u8>, String> {
        use wasm_bindgen::JsCast;
        use wasm_bindgen_futures::JsFuture;

        let window = web_sys::window().ok_or("no window")?;
        let resp_value = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(|e| format!("{e:?}"))?;
        let resp: web_sys::Response = resp_value.dyn_into().map_err(|_| "not a Response")?;
        if !resp.ok() {
            return Err(format!("HTTP {}", resp.status()));
        }
        let buf = JsFuture::from(resp.array_buffer().map_err(|e| format!("{e:?}"))?)
            .await
            .map_err(|e| format!("{e:?}"))?;
        let uint8 = js_sys::Uint8Array::new(&buf);
        Ok(uint8.to_vec())
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("emberview");
            ui.separator();

            if ui.button("Open").clicked() {
                #[cfg(not(target_arch = "wasm32"))]
                {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Flame graph", &["json"])
                        .pick_file()
                    {
                        match std::fs::read(&path) {
                            Ok(data) => self.load_graph(&data),
                            Err(e) => {
                                self.error = Some(format!("Failed to read file: {e}"));
                            }
                        }
                    }
                }
            }

            ui.separator();

            let before = self.use_weight;
            ui.radio_value(&mut self.use_weight, false, "Samples");
            ui.radio_value(&mut self.use_weight, true, "Weight");
            if before != self.use_weight {
                let width = self.engine.as_ref().map_or(1000.0, |e| e.canvas_size().0);
                self.rebuild_engine(width);
            }

            ui.separator();

            let response = ui.add(
                egui::TextEdit::singleline(&mut self.search_text)
                    .hint_text("regex search")
                    .desired_width(200.0),
            );
            let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Search").clicked() || submitted {
                self.run_search();
            }
            if ui.button("Clear").clicked() {
                self.search_text.clear();
                self.run_search();
            }
            if let Some(percent) = &self.match_percent {
                ui.label(format!("Matched: {percent}%"));
            }

            ui.separator();

            if ui.button("Reset zoom").clicked() {
                if let Some(engine) = &mut self.engine {
                    self.commands = engine.reset_zoom();
                }
            }
        });
    }

    fn flamegraph_panel(&mut self, ui: &mut egui::Ui) {
        let Some(content_height) = self.engine.as_ref().map(|e| e.content_height()) else {
            ui.centered_and_justified(|ui| {
                ui.label("Drop a flame-graph JSON here or click Open");
            });
            return;
        };

        let output = egui::ScrollArea::vertical().show(ui, |ui| {
            let width = ui.available_width().max(100.0);
            let (rect, response) = ui.allocate_exact_size(
                egui::vec2(width, content_height as f32),
                egui::Sense::click(),
            );

            let Some(engine) = &mut self.engine else {
                return;
            };

            // Resize tracks the panel width; zoom state is preserved.
            if (f64::from(width) - engine.canvas_size().0).abs() > 0.5 {
                self.commands = engine.resize(f64::from(width), content_height);
            }

            // Pointer plumbing: offsets are canvas-local.
            if let Some(pos) = response.hover_pos() {
                let offset = pos - rect.min;
                engine.pointer_moved(f64::from(offset.x), f64::from(offset.y));
            } else {
                engine.pointer_left();
            }
            if response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    let offset = pos - rect.min;
                    if let Some(commands) =
                        engine.click(f64::from(offset.x), f64::from(offset.y))
                    {
                        self.commands = commands;
                        self.highlight = None;
                    }
                }
            }
            if response.secondary_clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    let offset = pos - rect.min;
                    engine.context_click(f64::from(offset.x), f64::from(offset.y));
                }
            }

            // One pointer event and one speculative render per frame.
            let tick = engine.on_animation_frame();
            match tick.hover {
                HoverUpdate::Idle => {}
                HoverUpdate::Cleared => {
                    self.highlight = None;
                    self.tooltip_text = None;
                }
                HoverUpdate::Hover {
                    highlight, tooltip, ..
                } => {
                    // While the context menu pins a frame the overlay
                    // stays frozen; only adopt fresh geometry.
                    if let Some(hl) = highlight {
                        self.highlight = Some(hl);
                    }
                    self.tooltip_text = Some(tooltip);
                }
            }

            let painter = ui.painter_at(rect);
            renderer::paint_commands(&painter, &self.commands, rect.min, rect.size());
            self.paint_highlight(&painter, rect.min);
            self.context_menu_ui(ui, rect.min);

            if self.tooltip_text.is_some() && response.hovered() {
                let text = self.tooltip_text.clone().unwrap_or_default();
                #[allow(deprecated)]
                egui::show_tooltip_at_pointer(
                    ui.ctx(),
                    ui.layer_id(),
                    egui::Id::new("frame_tooltip"),
                    |ui| {
                        ui.label(text);
                    },
                );
            }
        });

        // Scrolling dismisses the tooltip and the context menu.
        let scroll_y = f64::from(output.state.offset.y);
        if (scroll_y - self.last_scroll_y).abs() > 0.5 {
            self.last_scroll_y = scroll_y;
            self.tooltip_text = None;
            if let Some(engine) = &mut self.engine {
                engine.update_scroll_position_y(scroll_y);
            }
        }
    }

    fn paint_highlight(&self, painter: &egui::Painter, origin: egui::Pos2) {
        let Some(hl) = &self.highlight else {
            return;
        };
        let rect = egui::Rect::from_min_size(
            egui::Pos2::new(
                origin.x + hl.rect.x as f32,
                origin.y + hl.rect.y as f32,
            ),
            egui::vec2(hl.rect.w as f32, hl.rect.h as f32),
        );
        painter.rect_filled(
            rect,
            egui::CornerRadius::ZERO,
            egui::Color32::from_rgb(0xff, 0xff, 0xe0),
        );
        painter.text(
            egui::Pos2::new(rect.left() + 3.0, rect.center().y),
            egui::Align2::LEFT_CENTER,
            hl.title.as_str(),
            egui::FontId::proportional(12.0),
            egui::Color32::BLACK,
        );
    }

    fn context_menu_ui(&mut self, ui: &mut egui::Ui, origin: egui::Pos2) {
        if !self.menu.is_open() {
            return;
        }
        let at = self.menu.position();
        let screen_pos = egui::Pos2::new(origin.x + at.x as f32, origin.y + at.y as f32);

        let mut close_menu = false;
        egui::Area::new(egui::Id::new("frame_context_menu"))
            .fixed_pos(screen_pos)
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    let title = self
                        .engine
                        .as_ref()
                        .and_then(|e| e.context_frame())
                        .map(|f| {
                            self.graph
                                .as_ref()
                                .map_or_else(String::new, |g| g.title(f).to_string())
                        });

                    if let Some(title) = &title {
                        ui.label(egui::RichText::new(title.clone()).strong());
                        ui.separator();
                        if ui.button("Zoom into frame").clicked() {
                            if let Some(engine) = &mut self.engine {
                                if let Some(commands) = engine.click(at.x, at.y) {
                                    self.commands = commands;
                                    self.highlight = None;
                                }
                            }
                            close_menu = true;
                        }
                        if ui.button("Copy frame title").clicked() {
                            ui.ctx().copy_text(title.clone());
                            close_menu = true;
                        }
                    }
                    if ui.button("Close").clicked() {
                        close_menu = true;
                    }
                });
            });

        if close_menu {
            self.menu.close();
            if let Some(engine) = &mut self.engine {
                engine.close_context_menu();
            }
        }
    }
}

impl eframe::App for EmberApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Async-loaded profile bytes (wasm fetch).
        let pending = {
            let mut lock = self.pending_data.lock().unwrap_or_else(|e| e.into_inner());
            lock.take()
        };
        if let Some(data) = pending {
            self.load_graph(&data);
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.toolbar(ui);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(err) = &self.error {
                    ui.colored_label(egui::Color32::RED, err);
                } else if let Some(engine) = &self.engine {
                    let root = engine.data().root();
                    ui.label(format!(
                        "{} levels | {} samples | zoom level {}",
                        engine.data().levels.len(),
                        root.total_samples,
                        engine.current_root_level(),
                    ));
                } else {
                    ui.label("No profile loaded");
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.flamegraph_panel(ui);
        });

        // Dropped files load like opened ones.
        let dropped: Option<Vec<u8>> = ctx.input(|i| {
            i.raw
                .dropped_files
                .first()
                .and_then(|f| f.bytes.as_ref())
                .map(|b| b.to_vec())
        });
        if let Some(data) = dropped {
            self.load_graph(&data);
        }
    }
}

impl Drop for EmberApp {
    fn drop(&mut self) {
        if let Some(engine) = &mut self.engine {
            engine.close();
        }
    }
}

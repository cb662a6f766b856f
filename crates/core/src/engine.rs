//! The flame-graph engine: one instance per canvas, owning all mutable
//! interaction state (zoom root, search pattern, visible frames, scroll
//! offset, hover and context-menu frames) plus the pointer queue and
//! the speculative pre-render scheduler.
//!
//! Hosts feed pointer and lifecycle events in, pump
//! [`Flamegraph::on_animation_frame`] once per frame, and paint the
//! returned command stream. Tooltip content and the context menu are
//! injected collaborators, never globals.

use emberview_protocol::{FrameRef, Point, Rect, RenderCommand, SharedStr};
use log::{debug, warn};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::hit::{self, VisibleFrame};
use crate::model::{DataError, FlamegraphData, Frame, ValueMode};
use crate::prerender::{Prerendered, PrerenderScheduler};
use crate::render::{FRAME_HEIGHT, RenderedView, render_view};
use crate::search::coverage_percent;

/// Generates renderable tooltip content for the hovered frame.
/// Content is the host's business; the engine only transports it.
pub trait TooltipBuilder: Send {
    fn generate(
        &self,
        data: &FlamegraphData,
        frame: &Frame,
        root_total_samples: u64,
        root_total_weight: u64,
    ) -> String;
}

/// Host-side context menu. The engine drives visibility and tracks
/// which frame the open menu refers to.
pub trait ContextMenu: Send {
    fn show(&mut self, at: Point);
    fn hide(&mut self);
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    InvalidData(#[from] DataError),
    #[error("profile root spans no {0:?}; nothing to draw")]
    EmptyProfile(ValueMode),
    #[error("canvas size {width}x{height} is not drawable")]
    InvalidCanvas { width: f64, height: f64 },
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub width: f64,
    pub height: f64,
    pub mode: ValueMode,
}

/// Descriptor of the floating highlight overlay: position and width in
/// canvas coordinates plus the full (untruncated) frame title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightBox {
    pub rect: Rect,
    pub title: SharedStr,
}

/// What the hover state did this tick.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HoverUpdate {
    /// No pointer event was pending.
    Idle,
    /// The pointer sits over empty canvas: hide overlay and tooltip.
    Cleared,
    /// A frame is under the pointer.
    Hover {
        frame: FrameRef,
        /// `None` while the context menu is open (overlay frozen).
        highlight: Option<HighlightBox>,
        tooltip: String,
    },
}

/// Result of one animation-frame pump.
#[derive(Debug, Serialize)]
pub struct FrameTick {
    pub hover: HoverUpdate,
    /// Whether a speculative view was rendered this tick.
    pub prerendered: bool,
}

pub struct SearchOutcome {
    /// Percentage of the zoom root covered by matches ("0.00".."100").
    pub percent: String,
    pub commands: Vec<RenderCommand>,
}

struct PointerEvent {
    x: f64,
    y: f64,
}

pub struct Flamegraph {
    data: FlamegraphData,
    mode: ValueMode,

    canvas_width: f64,
    canvas_height: f64,
    px_per_unit: f64,

    current_root: FrameRef,
    current_pattern: Option<Regex>,
    visible: Vec<Vec<VisibleFrame>>,
    scroll_y: f64,

    hl_frame: Option<FrameRef>,
    context_frame: Option<FrameRef>,

    // Pointer moves are queued latest-wins and processed once per tick.
    pending_pointer: Option<PointerEvent>,
    prerender: PrerenderScheduler,

    tooltip: Box<dyn TooltipBuilder>,
    context_menu: Box<dyn ContextMenu>,

    closed: bool,
}

impl Flamegraph {
    /// Build an engine over validated data. Malformed data or an
    /// undrawable canvas is a fatal configuration error; there is no
    /// runtime recovery from either.
    pub fn new(
        data: FlamegraphData,
        config: EngineConfig,
        tooltip: Box<dyn TooltipBuilder>,
        context_menu: Box<dyn ContextMenu>,
    ) -> Result<Self, EngineError> {
        data.validate()?;
        if data.root().total(config.mode) == 0 {
            return Err(EngineError::EmptyProfile(config.mode));
        }
        if !(config.width.is_finite() && config.width > 0.0)
            || !(config.height.is_finite() && config.height > 0.0)
        {
            return Err(EngineError::InvalidCanvas {
                width: config.width,
                height: config.height,
            });
        }

        let mut engine = Self {
            data,
            mode: config.mode,
            canvas_width: config.width,
            canvas_height: config.height,
            px_per_unit: 0.0,
            current_root: FrameRef::new(0, 0),
            current_pattern: None,
            visible: Vec::new(),
            scroll_y: 0.0,
            hl_frame: None,
            context_frame: None,
            pending_pointer: None,
            prerender: PrerenderScheduler::new(),
            tooltip,
            context_menu,
            closed: false,
        };
        // Initial layout so hit-testing works before the first
        // host-driven draw.
        let _ = engine.draw(FrameRef::new(0, 0));
        Ok(engine)
    }

    fn frame(&self, r: FrameRef) -> &Frame {
        &self.data.levels[r.level()][r.index()]
    }

    fn install(&mut self, root: FrameRef, view: RenderedView) -> RenderedView {
        self.current_root = root;
        self.px_per_unit = view.px_per_unit;
        self.visible = view.visible;
        RenderedView {
            commands: view.commands,
            visible: Vec::new(),
            highlighted: view.highlighted,
            px_per_unit: view.px_per_unit,
        }
    }

    fn draw(&mut self, root: FrameRef) -> RenderedView {
        let view = render_view(
            &self.data,
            self.mode,
            root,
            self.current_pattern.as_ref(),
            self.canvas_width,
        );
        debug!(
            "draw: root level {} index {}, {} commands",
            root.level(),
            root.index(),
            view.commands.len()
        );
        self.install(root, view)
    }

    /// Redraw at the current zoom root and search pattern.
    pub fn draw_root(&mut self) -> Vec<RenderCommand> {
        if self.closed {
            return Vec::new();
        }
        self.draw(self.current_root).commands
    }

    /// Set the search pattern, redraw, and report the percentage of the
    /// zoom root covered by matching frames.
    pub fn search(&mut self, pattern: &str) -> Result<SearchOutcome, SearchError> {
        let regex = Regex::new(pattern)?;
        if self.closed {
            return Ok(SearchOutcome {
                percent: "0.00".to_string(),
                commands: Vec::new(),
            });
        }
        self.current_pattern = Some(regex);
        self.prerender.invalidate();
        let view = self.draw(self.current_root);
        let covered = view.highlighted.covered_total();
        let root_value = self.frame(self.current_root).total(self.mode);
        Ok(SearchOutcome {
            percent: coverage_percent(covered, root_value),
            commands: view.commands,
        })
    }

    /// Clear the search pattern and redraw.
    pub fn reset_search(&mut self) -> Vec<RenderCommand> {
        if self.closed {
            return Vec::new();
        }
        self.current_pattern = None;
        self.prerender.invalidate();
        self.draw(self.current_root).commands
    }

    /// Return to the synthetic root view; search state is preserved.
    pub fn reset_zoom(&mut self) -> Vec<RenderCommand> {
        if self.closed {
            return Vec::new();
        }
        self.draw(FrameRef::new(0, 0)).commands
    }

    /// Adopt a new canvas size. Zoom and search state are preserved;
    /// only the pixel scale changes. Any speculative buffer is sized
    /// for the old canvas and is discarded.
    pub fn resize(&mut self, width: f64, height: f64) -> Vec<RenderCommand> {
        if self.closed {
            return Vec::new();
        }
        if !(width.is_finite() && width > 0.0) || !(height.is_finite() && height > 0.0) {
            warn!("resize to {width}x{height} ignored");
            return self.draw(self.current_root).commands;
        }
        self.canvas_width = width;
        self.canvas_height = height;
        if self.prerender.has_buffer() || self.prerender.has_pending() {
            warn!("resize discards speculative pre-render");
            self.prerender.invalidate();
        }
        self.draw(self.current_root).commands
    }

    /// Record the host's vertical scroll offset. Scrolling dismisses
    /// the context menu; the host hides the tooltip alongside.
    pub fn update_scroll_position_y(&mut self, offset: f64) {
        if self.closed {
            return;
        }
        self.scroll_y = offset;
        self.context_frame = None;
        self.context_menu.hide();
    }

    /// Queue a pointer move. Latest wins: an unprocessed earlier event
    /// is dropped, never queued behind.
    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        if self.closed {
            return;
        }
        self.pending_pointer = Some(PointerEvent { x, y });
    }

    /// The pointer left the canvas: drop any queued move and clear the
    /// hover unless the context menu holds it open.
    pub fn pointer_left(&mut self) {
        self.pending_pointer = None;
        if self.context_frame.is_none() {
            self.hl_frame = None;
        }
    }

    /// Process at most one queued pointer event and at most one pending
    /// speculative render. Call once per animation frame.
    pub fn on_animation_frame(&mut self) -> FrameTick {
        if self.closed {
            return FrameTick {
                hover: HoverUpdate::Idle,
                prerendered: false,
            };
        }
        let hover = match self.pending_pointer.take() {
            None => HoverUpdate::Idle,
            Some(event) => self.process_pointer(event),
        };
        let prerendered = self.run_prerender();
        FrameTick { hover, prerendered }
    }

    fn process_pointer(&mut self, event: PointerEvent) -> HoverUpdate {
        let hit = hit::level_at(event.y, self.data.levels.len())
            .and_then(|level| hit::lookup_frame(&self.visible[level], event.x));

        let Some(visible) = hit else {
            self.hl_frame = None;
            return if self.context_frame.is_some() {
                // Menu open: leave the frozen overlay alone.
                HoverUpdate::Idle
            } else {
                HoverUpdate::Cleared
            };
        };

        self.hl_frame = Some(visible.frame);

        let highlight = if self.context_frame.is_none() {
            let frame = self.frame(visible.frame);
            let root = self.frame(self.current_root);
            let left = (frame.left(self.mode) as f64 - root.left(self.mode) as f64).max(0.0)
                * self.px_per_unit;
            let width =
                frame.total(self.mode).min(root.total(self.mode)) as f64 * self.px_per_unit;
            let top = visible.frame.level() as f64 * FRAME_HEIGHT;
            Some(HighlightBox {
                rect: Rect::new(left, top, width, FRAME_HEIGHT),
                title: self.data.title(frame),
            })
        } else {
            None
        };

        let root_frame = self.data.root();
        let tooltip = self.tooltip.generate(
            &self.data,
            self.frame(visible.frame),
            root_frame.total_samples,
            root_frame.total_weight,
        );

        // The hovered frame is the likely next zoom root.
        if visible.frame != self.current_root
            && !self.prerender.is_buffered(visible.frame, self.canvas_width)
        {
            self.prerender.schedule(visible.frame);
        }

        HoverUpdate::Hover {
            frame: visible.frame,
            highlight,
            tooltip,
        }
    }

    fn run_prerender(&mut self) -> bool {
        let Some(target) = self.prerender.take_pending() else {
            return false;
        };
        let view = render_view(
            &self.data,
            self.mode,
            target,
            self.current_pattern.as_ref(),
            self.canvas_width,
        );
        self.prerender.store(Prerendered {
            root: target,
            canvas_width: self.canvas_width,
            view,
        });
        true
    }

    /// Zoom into the frame under the pointer, if any. Clicking the
    /// current root (or empty canvas) does nothing. A matching
    /// speculative buffer is installed directly instead of redrawing.
    pub fn click(&mut self, x: f64, y: f64) -> Option<Vec<RenderCommand>> {
        if self.closed {
            return None;
        }
        let level = hit::level_at(y, self.data.levels.len())?;
        let visible = hit::lookup_frame(&self.visible[level], x)?;
        if visible.frame == self.current_root {
            return None;
        }
        if let Some(view) = self.prerender.take_if_matches(visible.frame, self.canvas_width) {
            debug!(
                "zoom: installing speculative view for level {} index {}",
                visible.frame.level(),
                visible.frame.index()
            );
            return Some(self.install(visible.frame, view).commands);
        }
        Some(self.draw(visible.frame).commands)
    }

    /// Open the context menu at the event position and pin the hovered
    /// frame as the menu's subject. While pinned, hover-highlight
    /// updates are suppressed.
    pub fn context_click(&mut self, x: f64, y: f64) {
        if self.closed {
            return;
        }
        let hit = hit::level_at(y, self.data.levels.len())
            .and_then(|level| hit::lookup_frame(&self.visible[level], x));
        self.hl_frame = hit.map(|v| v.frame);
        self.context_frame = self.hl_frame;
        self.context_menu.show(Point::new(x, y));
    }

    /// Release the context-menu pin (the host closed the menu).
    pub fn close_context_menu(&mut self) {
        self.context_frame = None;
    }

    pub fn highlighted_frame(&self) -> Option<&Frame> {
        self.hl_frame.map(|r| self.frame(r))
    }

    pub fn context_frame(&self) -> Option<&Frame> {
        self.context_frame.map(|r| self.frame(r))
    }

    pub fn current_root(&self) -> FrameRef {
        self.current_root
    }

    pub fn current_root_level(&self) -> usize {
        self.current_root.level()
    }

    pub fn px_per_unit(&self) -> f64 {
        self.px_per_unit
    }

    pub fn canvas_size(&self) -> (f64, f64) {
        (self.canvas_width, self.canvas_height)
    }

    pub fn scroll_position_y(&self) -> f64 {
        self.scroll_y
    }

    pub fn mode(&self) -> ValueMode {
        self.mode
    }

    pub fn data(&self) -> &FlamegraphData {
        &self.data
    }

    /// Per-level visible frames of the last draw, ascending by x.
    pub fn visible_frames(&self) -> &[Vec<VisibleFrame>] {
        &self.visible
    }

    /// Content height of the full graph in pixels.
    pub fn content_height(&self) -> f64 {
        self.data.levels.len() as f64 * FRAME_HEIGHT
    }

    /// Tear down: cancel queued pointer work and the speculative
    /// render, release the buffer, and hide the collaborators. The
    /// engine stays inert afterwards; every operation becomes a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.pending_pointer = None;
        self.prerender.invalidate();
        self.hl_frame = None;
        self.context_frame = None;
        self.context_menu.hide();
        debug!("engine closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

use std::io::stdout;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use emberview_core::engine::{
    ContextMenu, EngineConfig, Flamegraph, HoverUpdate, TooltipBuilder,
};
use emberview_core::model::{FlamegraphData, Frame, ValueMode};
use emberview_core::render::FRAME_HEIGHT;
use emberview_protocol::{Color as ProtoColor, Point, RenderCommand};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::Rect,
    style::{Color, Style},
    widgets::Block,
};

/// One terminal cell covers this many canvas pixels, so the engine's
/// 7px-per-character label budget maps to exactly one character per
/// cell.
const PX_PER_CELL: f64 = 7.0;

struct StatusTooltip;

impl TooltipBuilder for StatusTooltip {
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
            "{} — {} [{} samples, {percent:.2}%]",
            data.title(frame),
            frame.frame_type.label(),
            frame.total_samples,
        )
    }
}

/// Terminals have no floating menus; the collaborator is inert.
struct NoMenu;

impl ContextMenu for NoMenu {
    fn show(&mut self, _at: Point) {}
    fn hide(&mut self) {}
}

fn to_tui_color(color: ProtoColor, dimmed: bool) -> Color {
    if dimmed {
        // Halfway toward white, like the canvas dim overlay.
        Color::Rgb(
            ((u16::from(color.r) + 255) / 2) as u8,
            ((u16::from(color.g) + 255) / 2) as u8,
            ((u16::from(color.b) + 255) / 2) as u8,
        )
    } else {
        Color::Rgb(color.r, color.g, color.b)
    }
}

enum InputMode {
    Browse,
    Search(String),
}

pub fn run(graph: FlamegraphData, mode: ValueMode) -> Result<()> {
    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, graph, mode);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    graph: FlamegraphData,
    mode: ValueMode,
) -> Result<()> {
    let size = terminal.size()?;
    let cols = f64::from(size.width.max(20));
    let content_rows = f64::from(size.height.saturating_sub(2).max(5));

    let mut engine = Flamegraph::new(
        graph,
        EngineConfig {
            width: cols * PX_PER_CELL,
            height: content_rows * FRAME_HEIGHT,
            mode,
        },
        Box::new(StatusTooltip),
        Box::new(NoMenu),
    )?;

    let mut commands = engine.draw_root();
    let mut cursor: (u16, u16) = (0, 0); // (col, level row on screen)
    let mut scroll_rows: u16 = 0;
    let mut input = InputMode::Browse;
    let mut match_percent: Option<String> = None;
    let mut status = String::new();

    loop {
        let term_size = terminal.size()?;
        let new_cols = f64::from(term_size.width.max(20));
        if (new_cols * PX_PER_CELL - engine.canvas_size().0).abs() > 0.5 {
            commands = engine.resize(
                new_cols * PX_PER_CELL,
                f64::from(term_size.height.saturating_sub(2).max(5)) * FRAME_HEIGHT,
            );
        }

        // Cursor position in canvas pixels drives the hover pipeline.
        let level = u32::from(cursor.1) + u32::from(scroll_rows);
        engine.pointer_moved(
            (f64::from(cursor.0) + 0.5) * PX_PER_CELL,
            f64::from(level) * FRAME_HEIGHT + FRAME_HEIGHT / 2.0,
        );
        let tick = engine.on_animation_frame();
        match tick.hover {
            HoverUpdate::Hover { tooltip, .. } => status = tooltip,
            HoverUpdate::Cleared => status.clear(),
            HoverUpdate::Idle => {}
        }

        terminal.draw(|frame| {
            let area = frame.area();

            // Header: title, search state, key help.
            let header_area = Rect::new(0, 0, area.width, 1);
            let header_text = match &input {
                InputMode::Search(text) => format!(" /{text}▏ (Enter to search, Esc to cancel)"),
                InputMode::Browse => {
                    let matched = match_percent
                        .as_ref()
                        .map(|p| format!(" | matched {p}%"))
                        .unwrap_or_default();
                    format!(
                        " emberview — arrows move | Enter zoom | r reset | / search | q quit{matched}"
                    )
                }
            };
            let header = Block::default()
                .title(header_text)
                .style(Style::default().fg(Color::White).bg(Color::DarkGray));
            frame.render_widget(header, header_area);

            // Flame rows.
            let content = Rect::new(0, 1, area.width, area.height.saturating_sub(2));
            let buf = frame.buffer_mut();
            for command in &commands {
                let RenderCommand::DrawFrame {
                    rect,
                    color,
                    label,
                    dimmed,
                    ..
                } = command
                else {
                    continue;
                };

                let row_abs = (rect.y / FRAME_HEIGHT) as u16;
                if row_abs < scroll_rows {
                    continue;
                }
                let row = row_abs - scroll_rows;
                if row >= content.height {
                    continue;
                }

                let col = (rect.x / PX_PER_CELL).round().max(0.0) as u16;
                let width = ((rect.w / PX_PER_CELL).round() as u16).max(1);
                if col >= content.width {
                    continue;
                }
                let width = width.min(content.width - col);

                let fg = to_tui_color(*color, *dimmed);
                let label_str = label.as_deref().unwrap_or("");
                let display: String = if usize::from(width) >= label_str.len() + 2 {
                    format!(" {label_str:<w$}", w = usize::from(width).saturating_sub(2))
                } else {
                    "█".repeat(usize::from(width))
                };

                for (i, ch) in display.chars().take(usize::from(width)).enumerate() {
                    let x = content.x + col + i as u16;
                    let y = content.y + row;
                    if x < content.x + content.width && y < content.y + content.height {
                        let cell = &mut buf[(x, y)];
                        if label_str.is_empty() {
                            cell.set_char(ch).set_fg(fg).set_bg(Color::Black);
                        } else {
                            cell.set_char(ch).set_fg(Color::Black).set_bg(fg);
                        }
                    }
                }
            }

            // Cursor marker.
            let cx = content.x + cursor.0.min(content.width.saturating_sub(1));
            let cy = content.y + cursor.1.min(content.height.saturating_sub(1));
            if cx < content.x + content.width && cy < content.y + content.height {
                buf[(cx, cy)].set_style(Style::default().fg(Color::White).bg(Color::Blue));
            }

            // Status line: the hovered frame's tooltip.
            let status_area = Rect::new(0, area.height.saturating_sub(1), area.width, 1);
            let status_bar = Block::default()
                .title(format!(" {status}"))
                .style(Style::default().fg(Color::White).bg(Color::DarkGray));
            frame.render_widget(status_bar, status_area);
        })?;

        if !event::poll(std::time::Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match &mut input {
            InputMode::Search(text) => match key.code {
                KeyCode::Esc => input = InputMode::Browse,
                KeyCode::Backspace => {
                    text.pop();
                }
                KeyCode::Enter => {
                    let pattern = text.clone();
                    input = InputMode::Browse;
                    match engine.search(&pattern) {
                        Ok(outcome) => {
                            commands = outcome.commands;
                            match_percent = Some(outcome.percent);
                        }
                        Err(e) => status = e.to_string(),
                    }
                }
                KeyCode::Char(c) => text.push(c),
                _ => {}
            },
            InputMode::Browse => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Left => cursor.0 = cursor.0.saturating_sub(1),
                KeyCode::Right => cursor.0 = cursor.0.saturating_add(1),
                KeyCode::Up => {
                    if cursor.1 == 0 {
                        let new_scroll = scroll_rows.saturating_sub(1);
                        if new_scroll != scroll_rows {
                            scroll_rows = new_scroll;
                            engine.update_scroll_position_y(
                                f64::from(scroll_rows) * FRAME_HEIGHT,
                            );
                        }
                    } else {
                        cursor.1 -= 1;
                    }
                }
                KeyCode::Down => {
                    cursor.1 = cursor.1.saturating_add(1);
                }
                KeyCode::PageDown => {
                    scroll_rows = scroll_rows.saturating_add(5);
                    engine.update_scroll_position_y(f64::from(scroll_rows) * FRAME_HEIGHT);
                }
                KeyCode::PageUp => {
                    scroll_rows = scroll_rows.saturating_sub(5);
                    engine.update_scroll_position_y(f64::from(scroll_rows) * FRAME_HEIGHT);
                }
                KeyCode::Enter => {
                    let level = u32::from(cursor.1) + u32::from(scroll_rows);
                    if let Some(new_commands) = engine.click(
                        (f64::from(cursor.0) + 0.5) * PX_PER_CELL,
                        f64::from(level) * FRAME_HEIGHT + FRAME_HEIGHT / 2.0,
                    ) {
                        commands = new_commands;
                    }
                }
                KeyCode::Char('r') => {
                    commands = engine.reset_zoom();
                }
                KeyCode::Char('c') => {
                    commands = engine.reset_search();
                    match_percent = None;
                }
                KeyCode::Char('/') => input = InputMode::Search(String::new()),
                _ => {}
            },
        }
    }

    engine.close();
    Ok(())
}

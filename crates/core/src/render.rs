//! The draw pass: geometry, culling, label truncation, match recording.
//!
//! Pure with respect to engine state: both the authoritative draw and
//! the speculative pre-render call [`render_view`] with an explicit
//! root, so the two paths cannot disagree.

use emberview_protocol::{Color, FrameRef, Rect, RenderCommand, SharedStr};
use regex::Regex;

use crate::color::{self, HIGHLIGHTED_COLOR};
use crate::hit::VisibleFrame;
use crate::model::{FlamegraphData, ValueMode};
use crate::search::HighlightSet;

/// Height of one level row in pixels (icicle layout, root on top).
pub const FRAME_HEIGHT: f64 = 20.0;

/// Below this width a label is unreadable and not drawn.
const MIN_LABEL_WIDTH: f64 = 21.0;

/// Monospace-ish budget used to fit labels, px per character.
const CHAR_WIDTH: f64 = 7.0;

pub const CANVAS_BACKGROUND: Color = Color::WHITE;

/// Product of one draw pass over the whole graph at a given zoom root.
pub struct RenderedView {
    pub commands: Vec<RenderCommand>,
    /// Per level, the frames intersecting the visible window, in
    /// ascending x order (hit-testing relies on this).
    pub visible: Vec<Vec<VisibleFrame>>,
    /// Spans whose titles matched the pattern, for coverage reporting.
    pub highlighted: HighlightSet,
    pub px_per_unit: f64,
}

/// Lay out every level against the window spanned by `root` and emit
/// the command stream. Frames outside `[x_start, x_end)` are culled
/// before any geometry is computed, so cost is bounded by the visible
/// frame count, not the tree size.
pub fn render_view(
    data: &FlamegraphData,
    mode: ValueMode,
    root: FrameRef,
    pattern: Option<&Regex>,
    canvas_width: f64,
) -> RenderedView {
    let root_frame = &data.levels[root.level()][root.index()];
    let root_value = root_frame.total(mode);
    let px_per_unit = canvas_width / root_value as f64;

    let x_start = root_frame.left(mode);
    let x_end = x_start + root_value;

    let mut commands = Vec::new();
    commands.push(RenderCommand::Clear {
        color: CANVAS_BACKGROUND,
    });

    let mut visible: Vec<Vec<VisibleFrame>> = vec![Vec::new(); data.levels.len()];
    let mut highlighted = HighlightSet::new();

    for (level_no, level) in data.levels.iter().enumerate() {
        let y = level_no as f64 * FRAME_HEIGHT;
        let dimmed = level_no < root.level();

        for (index, frame) in level.iter().enumerate() {
            if frame.left(mode) >= x_end || frame.right(mode) <= x_start {
                continue;
            }

            let title = data.title(frame);
            let matched = pattern.is_some_and(|p| p.is_match(&title));
            if matched {
                highlighted.record(frame.left(mode), frame.total(mode));
            }

            let x = (frame.left(mode) as f64 - x_start as f64) * px_per_unit;
            let width = frame.total(mode) as f64 * px_per_unit;
            let rect = Rect::new(x, y, width, FRAME_HEIGHT);
            let frame_ref = FrameRef::new(level_no, index);

            visible[level_no].push(VisibleFrame {
                rect,
                frame: frame_ref,
            });

            let fill = if matched {
                HIGHLIGHTED_COLOR
            } else {
                color::resolve(frame, mode)
            };

            commands.push(RenderCommand::DrawFrame {
                rect,
                color: fill,
                label: truncate_label(&title, width),
                dimmed,
                frame: frame_ref,
            });
        }
    }

    RenderedView {
        commands,
        visible,
        highlighted,
        px_per_unit,
    }
}

/// Fit a title into `width` pixels: full when it fits, `..`-terminated
/// prefix otherwise, nothing below the readability threshold.
/// Truncation counts characters, so multi-byte titles never split.
fn truncate_label(title: &SharedStr, width: f64) -> Option<SharedStr> {
    if width < MIN_LABEL_WIDTH {
        return None;
    }
    let budget = (width / CHAR_WIDTH) as usize;
    let len = title.chars().count();
    if len <= budget {
        return Some(title.clone());
    }
    let keep = budget.saturating_sub(2);
    let truncated: String = title.chars().take(keep).collect();
    Some(SharedStr::from(format!("{truncated}..")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Frame, FrameType};

    fn frame(left: u64, total: u64, title_index: u32) -> Frame {
        Frame {
            left_samples: left,
            left_weight: left,
            total_samples: total,
            total_weight: total,
            self_samples: None,
            self_weight: None,
            title_index,
            frame_type: FrameType::JitCompiled,
            position: None,
            sample_types: None,
            diff_details: None,
            before_marker: false,
        }
    }

    fn sample_graph() -> FlamegraphData {
        FlamegraphData {
            depth: 3,
            levels: vec![
                vec![frame(0, 100, 0)],
                vec![frame(0, 60, 1), frame(60, 40, 2)],
                vec![frame(0, 60, 3)],
            ],
            title_pool: ["all", "alpha", "beta", "alpha_child"]
                .iter()
                .map(|t| SharedStr::from(*t))
                .collect(),
        }
    }

    fn draw_rects(view: &RenderedView) -> Vec<(Rect, FrameRef)> {
        view.commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawFrame { rect, frame, .. } => Some((*rect, *frame)),
                RenderCommand::Clear { .. } => None,
            })
            .collect()
    }

    #[test]
    fn root_view_shows_everything() {
        let data = sample_graph();
        let view = render_view(&data, ValueMode::Samples, FrameRef::new(0, 0), None, 1000.0);
        assert_eq!(draw_rects(&view).len(), 4);
        assert!((view.px_per_unit - 10.0).abs() < 1e-9);

        // Sibling at level 1 starts where the first ends, scaled.
        let rects = draw_rects(&view);
        assert!((rects[2].0.x - 600.0).abs() < 1e-9);
        assert!((rects[2].0.w - 400.0).abs() < 1e-9);
    }

    #[test]
    fn zoom_culls_non_overlapping_frames() {
        let data = sample_graph();
        // Zoom into "beta" (level 1, index 1): alpha and its child fall
        // outside the window and are culled before geometry.
        let view = render_view(&data, ValueMode::Samples, FrameRef::new(1, 1), None, 1000.0);
        let rects = draw_rects(&view);
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[1].1, FrameRef::new(1, 1));
        // beta fills the full canvas.
        assert!((rects[1].0.w - 1000.0).abs() < 1e-9);
        // Visible lists stay ascending and carry only window frames.
        assert_eq!(view.visible[1].len(), 1);
        assert!(view.visible[2].is_empty());
    }

    #[test]
    fn levels_above_root_are_dimmed() {
        let data = sample_graph();
        let view = render_view(&data, ValueMode::Samples, FrameRef::new(1, 0), None, 1000.0);
        let mut dims = Vec::new();
        for cmd in &view.commands {
            if let RenderCommand::DrawFrame { frame, dimmed, .. } = cmd {
                dims.push((frame.level(), *dimmed));
            }
        }
        assert!(dims.contains(&(0, true)));
        assert!(dims.contains(&(1, false)));
        assert!(dims.contains(&(2, false)));
    }

    #[test]
    fn matches_recorded_during_draw() {
        let data = sample_graph();
        let pattern = Regex::new("alpha").expect("valid pattern");
        let view = render_view(
            &data,
            ValueMode::Samples,
            FrameRef::new(0, 0),
            Some(&pattern),
            1000.0,
        );
        // "alpha" and "alpha_child" share left=0; union counts 60 once.
        assert_eq!(view.highlighted.covered_total(), 60);

        let highlighted_fills = view
            .commands
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    RenderCommand::DrawFrame { color, .. } if *color == HIGHLIGHTED_COLOR
                )
            })
            .count();
        assert_eq!(highlighted_fills, 2);
    }

    #[test]
    fn narrow_frames_lose_labels() {
        let data = sample_graph();
        // 100 units over 50px: the 40-unit frame is 20px wide, below
        // the 21px readability threshold.
        let view = render_view(&data, ValueMode::Samples, FrameRef::new(0, 0), None, 50.0);
        for cmd in &view.commands {
            if let RenderCommand::DrawFrame { frame, label, .. } = cmd
                && *frame == FrameRef::new(1, 1)
            {
                assert!(label.is_none());
            }
        }
    }

    #[test]
    fn truncation_is_char_safe() {
        let title = SharedStr::from("конструктор::обработать");
        let label = truncate_label(&title, 56.0).expect("wide enough");
        // 8-char budget, 2 reserved for the ellipsis.
        assert_eq!(label.as_str(), "констр..");

        let short = SharedStr::from("main");
        assert_eq!(truncate_label(&short, 56.0).expect("fits"), "main");
        assert!(truncate_label(&short, 20.9).is_none());
    }
}

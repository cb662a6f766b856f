//! End-to-end interaction tests over the engine: the zoom scenario,
//! hit-test equivalence under zoom, search coverage bounds, and the
//! resize/reset invariants.

use emberview_core::engine::{
    ContextMenu, EngineConfig, Flamegraph, HoverUpdate, TooltipBuilder,
};
use emberview_core::hit;
use emberview_core::model::{FlamegraphData, Frame, FrameType, ValueMode};
use emberview_protocol::{FrameRef, Point, RenderCommand, SharedStr};

struct PlainTooltip;

impl TooltipBuilder for PlainTooltip {
    fn generate(
        &self,
        data: &FlamegraphData,
        frame: &Frame,
        _root_total_samples: u64,
        _root_total_weight: u64,
    ) -> String {
        data.title(frame).to_string()
    }
}

struct NoMenu;

impl ContextMenu for NoMenu {
    fn show(&mut self, _at: Point) {}
    fn hide(&mut self) {}
}

fn frame(left: u64, total: u64, title_index: u32) -> Frame {
    Frame {
        left_samples: left,
        left_weight: left * 10,
        total_samples: total,
        total_weight: total * 10,
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

fn titles(names: &[&str]) -> Vec<SharedStr> {
    names.iter().map(|n| SharedStr::from(*n)).collect()
}

/// The scenario graph: root(100) -> [A(60), B(40)], A -> A1(60).
fn scenario_graph() -> FlamegraphData {
    FlamegraphData {
        depth: 3,
        levels: vec![
            vec![frame(0, 100, 0)],
            vec![frame(0, 60, 1), frame(60, 40, 2)],
            vec![frame(0, 60, 3)],
        ],
        title_pool: titles(&["root", "A", "B", "A1"]),
    }
}

fn engine_over(data: FlamegraphData, width: f64) -> Flamegraph {
    Flamegraph::new(
        data,
        EngineConfig {
            width,
            height: 600.0,
            mode: ValueMode::Samples,
        },
        Box::new(PlainTooltip),
        Box::new(NoMenu),
    )
    .expect("valid engine")
}

fn rect_of(commands: &[RenderCommand], target: FrameRef) -> Option<emberview_protocol::Rect> {
    commands.iter().find_map(|c| match c {
        RenderCommand::DrawFrame { rect, frame, .. } if *frame == target => Some(*rect),
        _ => None,
    })
}

#[test]
fn zoom_scenario_and_reset() {
    let mut fg = engine_over(scenario_graph(), 1000.0);

    // Click A (level 1 spans x 0..600 at root zoom).
    let commands = fg.click(10.0, 30.0).expect("zooms into A");
    assert_eq!(fg.current_root(), FrameRef::new(1, 0));
    assert_eq!(fg.current_root_level(), 1);
    // px_per_unit = canvasWidth / 60.
    assert!((fg.px_per_unit() - 1000.0 / 60.0).abs() < 1e-9);

    // A1 fills the full canvas width.
    let a1 = rect_of(&commands, FrameRef::new(2, 0)).expect("A1 drawn");
    assert!((a1.w - 1000.0).abs() < 1e-6);
    // B is culled entirely.
    assert!(rect_of(&commands, FrameRef::new(1, 1)).is_none());
    // The root row above the zoom root is dimmed.
    let dimmed_root = commands.iter().any(|c| {
        matches!(
            c,
            RenderCommand::DrawFrame { frame, dimmed: true, .. }
                if *frame == FrameRef::new(0, 0)
        )
    });
    assert!(dimmed_root);

    // Reset restores the root view and its scale.
    let commands = fg.reset_zoom();
    assert_eq!(fg.current_root(), FrameRef::new(0, 0));
    assert!((fg.px_per_unit() - 10.0).abs() < 1e-9);
    let a = rect_of(&commands, FrameRef::new(1, 0)).expect("A drawn");
    let b = rect_of(&commands, FrameRef::new(1, 1)).expect("B drawn");
    assert!((a.w - 600.0).abs() < 1e-6, "A occupies 60% of width");
    assert!((b.w - 400.0).abs() < 1e-6, "B occupies 40% of width");
}

#[test]
fn clicking_current_root_or_empty_space_does_nothing() {
    let mut fg = engine_over(scenario_graph(), 1000.0);
    assert!(fg.click(500.0, 5.0).is_none(), "root is the current root");
    assert!(fg.click(700.0, 45.0).is_none(), "no frame at level 2 x=700");
    assert!(fg.click(500.0, 500.0).is_none(), "below the graph");
}

/// Binary-search hit-testing equals a linear scan for every pixel
/// column and row, at root zoom and when zoomed, across layouts with
/// gaps, touching edges, and sub-pixel frames.
#[test]
fn hit_testing_matches_linear_scan_everywhere() {
    // A deterministic generator (LCG) builds irregular sibling layouts.
    let mut state = 0x2545_f491_4f6c_dd1du64;
    let mut next = move |bound: u64| {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 33) % bound
    };

    for _ in 0..10 {
        // Level 1: random partition of the root span with random gaps.
        let mut level1 = Vec::new();
        let mut cursor = 0u64;
        while cursor < 950 {
            let gap = next(20);
            let width = 1 + next(120);
            let left = cursor + gap;
            if left + width > 1000 {
                break;
            }
            level1.push(frame(left, width, 1));
            cursor = left + width;
        }
        if level1.is_empty() {
            level1.push(frame(0, 500, 1));
        }
        // Level 2: a child inside every other level-1 frame.
        let mut level2 = Vec::new();
        for (i, f) in level1.iter().enumerate() {
            if i % 2 == 0 {
                let w = 1 + next(f.total_samples);
                level2.push(frame(f.left_samples, w, 2));
            }
        }

        let data = FlamegraphData {
            depth: 3,
            levels: vec![vec![frame(0, 1000, 0)], level1.clone(), level2],
            title_pool: titles(&["root", "x", "y"]),
        };
        let mut fg = engine_over(data, 800.0);

        let zoom_targets = [None, Some(FrameRef::new(1, 0))];
        for target in zoom_targets {
            if let Some(t) = target {
                // Zoom by clicking the frame's on-screen position.
                let rect = fg.visible_frames()[t.level()]
                    .iter()
                    .find(|v| v.frame == t)
                    .map(|v| v.rect);
                if let Some(r) = rect {
                    fg.click(r.x + r.w / 2.0, r.y + 1.0);
                }
            }
            for level in 0..3usize {
                let frames = &fg.visible_frames()[level];
                let mut x = -1.0;
                while x <= 801.0 {
                    assert_eq!(
                        hit::lookup_frame(frames, x),
                        hit::lookup_frame_linear_reference(frames, x),
                        "level {level} column {x}"
                    );
                    x += 0.25;
                }
            }
            fg.reset_zoom();
        }
    }
}

#[test]
fn search_bounds_and_monotonicity() {
    let mut fg = engine_over(scenario_graph(), 1000.0);

    // No match at all.
    let outcome = fg.search("does_not_exist").expect("valid pattern");
    assert_eq!(outcome.percent, "0.00");

    // The root's own title covers everything.
    let outcome = fg.search("root").expect("valid pattern");
    assert_eq!(outcome.percent, "100");

    // Widening the pattern never decreases coverage.
    let narrow = fg.search("^A1$").expect("valid pattern").percent;
    let wide = fg.search("^A").expect("valid pattern").percent;
    let narrow: f64 = narrow.parse().expect("numeric");
    let wide: f64 = wide.parse().expect("numeric");
    assert!(wide >= narrow, "widening {narrow} -> {wide}");

    // Matching everything saturates.
    let all = fg.search(".").expect("valid pattern");
    assert_eq!(all.percent, "100");

    fg.reset_search();
}

#[test]
fn search_union_not_sum() {
    // Nested matches starting at the same or covered offsets count
    // once: spans (0,10) and (5,3) yield 10, never 13.
    let data = FlamegraphData {
        depth: 3,
        levels: vec![
            vec![frame(0, 20, 0)],
            vec![frame(0, 10, 1), frame(10, 5, 2)],
            vec![frame(5, 3, 1)],
        ],
        title_pool: titles(&["root", "match_me", "other"]),
    };
    let mut fg = engine_over(data, 1000.0);
    let outcome = fg.search("match_me").expect("valid pattern");
    // 10 of 20 => 50%, not 13 of 20.
    assert_eq!(outcome.percent, "50.00");
}

#[test]
fn invalid_pattern_is_reported_not_thrown() {
    let mut fg = engine_over(scenario_graph(), 1000.0);
    let err = fg.search("(unclosed");
    assert!(err.is_err());
    // Engine state is untouched: a later valid search still works.
    let outcome = fg.search("A").expect("valid pattern");
    assert_eq!(outcome.percent, "60.00");
}

#[test]
fn search_survives_zoom_and_reset() {
    let mut fg = engine_over(scenario_graph(), 1000.0);
    fg.search("A1").expect("valid pattern");
    fg.click(10.0, 30.0).expect("zoom into A");
    // Pattern still applied after zoom: A1 covers the whole of A.
    let outcome = fg.search("A1").expect("valid pattern");
    assert_eq!(outcome.percent, "100");
}

#[test]
fn resize_preserves_zoom_state() {
    // Only the pixel scale changes.
    let mut fg = engine_over(scenario_graph(), 1000.0);
    fg.click(10.0, 30.0).expect("zoom into A");
    let root_before = fg.current_root();

    fg.resize(500.0, 300.0);
    assert_eq!(fg.current_root(), root_before);
    assert_eq!(fg.current_root_level(), 1);
    assert!((fg.px_per_unit() - 500.0 / 60.0).abs() < 1e-9);
    assert_eq!(fg.canvas_size(), (500.0, 300.0));
}

#[test]
fn weight_mode_uses_weight_coordinates() {
    let mut fg = Flamegraph::new(
        scenario_graph(),
        EngineConfig {
            width: 1000.0,
            height: 600.0,
            mode: ValueMode::Weight,
        },
        Box::new(PlainTooltip),
        Box::new(NoMenu),
    )
    .expect("valid engine");
    // Weight totals are 10x the sample totals.
    assert!((fg.px_per_unit() - 1.0).abs() < 1e-9);
    let commands = fg.click(10.0, 30.0).expect("zoom into A");
    assert!((fg.px_per_unit() - 1000.0 / 600.0).abs() < 1e-9);
    let a1 = rect_of(&commands, FrameRef::new(2, 0)).expect("A1 drawn");
    assert!((a1.w - 1000.0).abs() < 1e-6);
}

#[test]
fn speculative_prerender_feeds_click() {
    let mut fg = engine_over(scenario_graph(), 1000.0);

    // Hover B, then A: the later target replaces the earlier one.
    fg.pointer_moved(700.0, 25.0);
    fg.pointer_moved(100.0, 25.0);
    let tick = fg.on_animation_frame();
    assert!(matches!(tick.hover, HoverUpdate::Hover { frame, .. } if frame == FrameRef::new(1, 0)));
    assert!(tick.prerendered);

    // Click the hovered frame: the buffered view is installed.
    let commands = fg.click(100.0, 25.0).expect("zoom into A");
    assert_eq!(fg.current_root(), FrameRef::new(1, 0));
    let a1 = rect_of(&commands, FrameRef::new(2, 0)).expect("A1 drawn");
    assert!((a1.w - 1000.0).abs() < 1e-6);

    // The buffer is consumed; hovering the same frame again while it is
    // the root schedules nothing.
    fg.pointer_moved(100.0, 25.0);
    let tick = fg.on_animation_frame();
    assert!(!tick.prerendered, "current root is never pre-rendered");
}

#[test]
fn prerendered_view_equals_authoritative_draw() {
    let mut speculative = engine_over(scenario_graph(), 1000.0);
    speculative.pointer_moved(100.0, 25.0);
    speculative.on_animation_frame();
    let via_buffer = speculative.click(100.0, 25.0).expect("zoom");

    let mut direct = engine_over(scenario_graph(), 1000.0);
    let via_draw = direct.click(100.0, 25.0).expect("zoom");

    assert_eq!(via_buffer.len(), via_draw.len());
    for (a, b) in via_buffer.iter().zip(via_draw.iter()) {
        match (a, b) {
            (
                RenderCommand::DrawFrame { rect: ra, color: ca, frame: fa, dimmed: da, .. },
                RenderCommand::DrawFrame { rect: rb, color: cb, frame: fb, dimmed: db, .. },
            ) => {
                assert_eq!(fa, fb);
                assert_eq!(ca, cb);
                assert_eq!(da, db);
                assert!((ra.x - rb.x).abs() < 1e-9 && (ra.w - rb.w).abs() < 1e-9);
            }
            (RenderCommand::Clear { .. }, RenderCommand::Clear { .. }) => {}
            _ => panic!("command streams diverge"),
        }
    }
}

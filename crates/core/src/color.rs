//! Frame color resolution.
//!
//! Non-differential frames get a fixed color per [`FrameType`], with the
//! marker-ignore override for frames preceding an automated-analysis
//! marker. Differential frames reconstruct the primary/secondary pair
//! from `(total, diff)` and map it onto a diverging ramp.

use emberview_protocol::Color;

use crate::model::{Frame, FrameType, ValueMode};

/// Fill for frames matching the active search pattern.
pub const HIGHLIGHTED_COLOR: Color = Color::rgb(0xee, 0x00, 0xee);

/// Fill for frames before an analysis marker (`before_marker`).
const MARKER_IGNORE_COLOR: Color = Color::rgb(0xb3, 0xb3, 0xb3);

/// Diverging ramp, weakest to strongest. Green marks a decrease against
/// the reference profile, red an increase; the last step is reserved for
/// subtrees present in only one side.
const GREEN_RAMP: [Color; 6] = [
    Color::rgb(0xe5, 0xff, 0xcc),
    Color::rgb(0xe5, 0xff, 0xbb),
    Color::rgb(0xcc, 0xff, 0x99),
    Color::rgb(0xb2, 0xff, 0x66),
    Color::rgb(0x99, 0xff, 0x33),
    Color::rgb(0x66, 0xcc, 0x00),
];

const RED_RAMP: [Color; 6] = [
    Color::rgb(0xff, 0xee, 0xee),
    Color::rgb(0xff, 0xdd, 0xdd),
    Color::rgb(0xff, 0xcc, 0xcc),
    Color::rgb(0xff, 0xaa, 0xaa),
    Color::rgb(0xff, 0x88, 0x88),
    Color::rgb(0xff, 0x33, 0x33),
];

const NEUTRAL_COLOR: Color = Color::rgb(0xe6, 0xe6, 0xe6);

impl FrameType {
    /// Fixed display color of this frame kind.
    pub fn color(self) -> Color {
        match self {
            FrameType::Interpreted => Color::rgb(0xb2, 0xe1, 0xb2),
            FrameType::JitCompiled => Color::rgb(0x50, 0xe1, 0x50),
            FrameType::C1Compiled => Color::rgb(0xcc, 0xe8, 0x80),
            FrameType::Inlined => Color::rgb(0x46, 0xc4, 0xbf),
            FrameType::Native => Color::rgb(0xe1, 0x5a, 0x5a),
            FrameType::Cpp => Color::rgb(0xc8, 0xc8, 0x3c),
            FrameType::Kernel => Color::rgb(0xe1, 0x7d, 0x00),
            FrameType::ThreadNameSynthetic => Color::rgb(0x8a, 0xa0, 0xc8),
            FrameType::AllocatedObjectSynthetic => Color::rgb(0x00, 0xb6, 0xb2),
            FrameType::AllocatedObjectInNewTlabSynthetic => Color::rgb(0x55, 0xc2, 0xe1),
            FrameType::AllocatedObjectOutsideTlabSynthetic => Color::rgb(0x34, 0x96, 0xd4),
            FrameType::BlockingObjectSynthetic => Color::rgb(0xd8, 0x86, 0x4f),
            FrameType::LambdaSynthetic => Color::rgb(0xb3, 0xa2, 0xc7),
            FrameType::HighlightedWarning => Color::rgb(0xe1, 0x00, 0x00),
            FrameType::Unknown => Color::rgb(0xd0, 0xd0, 0xd0),
        }
    }
}

/// Resolve a frame's fill color in the active unit.
pub fn resolve(frame: &Frame, mode: ValueMode) -> Color {
    if let Some(diff) = frame.diff_details {
        let total = frame.total(mode) as i64;
        let delta = diff.delta(mode);
        // total = primary + secondary and delta = primary - secondary,
        // so total + delta is 2·primary and the division is exact.
        let primary = (total + delta) / 2;
        let secondary = (total - delta) / 2;
        return resolve_diff(primary, secondary, frame.frame_type);
    }
    if frame.before_marker {
        MARKER_IGNORE_COLOR
    } else {
        frame.frame_type.color()
    }
}

/// Map a reconstructed primary/secondary pair onto the diverging ramp.
///
/// Relative magnitude `|p - s| / (p + s)` is rounded to four decimal
/// places before bucketing so values straddling a threshold land
/// deterministically.
pub fn resolve_diff(primary: i64, secondary: i64, frame_type: FrameType) -> Color {
    if frame_type == FrameType::LambdaSynthetic {
        return frame_type.color();
    }

    let total = primary + secondary;
    if total <= 0 {
        return NEUTRAL_COLOR;
    }

    // Subtree present in only one profile: strongest step.
    if secondary == 0 {
        return RED_RAMP[5];
    }
    if primary == 0 {
        return GREEN_RAMP[5];
    }

    let pct = round_places((primary - secondary).abs() as f64 / total as f64, 10_000.0);

    let index = if pct <= 0.02 {
        return NEUTRAL_COLOR;
    } else if pct <= 0.05 {
        0
    } else if pct <= 0.1 {
        1
    } else if pct <= 0.4 {
        2
    } else if pct <= 0.8 {
        3
    } else {
        4
    };

    if primary < secondary {
        GREEN_RAMP[index]
    } else {
        RED_RAMP[index]
    }
}

fn round_places(value: f64, shifter: f64) -> f64 {
    (value * shifter).round() / shifter
}

use serde::{Deserialize, Serialize};

use crate::shared_str::SharedStr;
use crate::types::{Color, Rect};

/// Stable identity of a frame within one loaded profile: its depth level
/// and its index inside that level's ordered frame list.
///
/// Render commands, hit-testing, and the zoom root all refer to frames
/// through this pair, so renderers never need the data model itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRef {
    pub level: u32,
    pub index: u32,
}

impl FrameRef {
    pub fn new(level: usize, index: usize) -> Self {
        Self {
            level: level as u32,
            index: index as u32,
        }
    }

    #[inline]
    pub fn level(self) -> usize {
        self.level as usize
    }

    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// A single, stateless render instruction.
///
/// The engine emits a `Vec<RenderCommand>` per draw. Renderers consume
/// the list sequentially; each command carries everything it needs, so
/// the same stream drives the egui canvas, the terminal renderer, and
/// the wasm bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Fill the whole canvas with a background color.
    Clear { color: Color },

    /// Draw one frame cell: filled rect, 1px border, and an optional
    /// pre-truncated label anchored at the left edge.
    ///
    /// `dimmed` marks rows above the current zoom root; renderers
    /// composite a translucent white overlay on top of the fill.
    DrawFrame {
        rect: Rect,
        color: Color,
        label: Option<SharedStr>,
        dimmed: bool,
        frame: FrameRef,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_ref_roundtrips_usize() {
        let r = FrameRef::new(3, 17);
        assert_eq!(r.level(), 3);
        assert_eq!(r.index(), 17);
    }

    #[test]
    fn command_serde_roundtrip() {
        let cmd = RenderCommand::DrawFrame {
            rect: Rect::new(0.0, 20.0, 120.0, 20.0),
            color: Color::rgb(0x50, 0xe1, 0x50),
            label: Some(SharedStr::from("Thread.run")),
            dimmed: false,
            frame: FrameRef::new(1, 0),
        };
        let json = serde_json::to_string(&cmd).expect("serialize");
        let back: RenderCommand = serde_json::from_str(&json).expect("deserialize");
        match back {
            RenderCommand::DrawFrame { label, frame, .. } => {
                assert_eq!(label.as_deref(), Some("Thread.run"));
                assert_eq!(frame, FrameRef::new(1, 0));
            }
            RenderCommand::Clear { .. } => panic!("wrong variant"),
        }
    }
}

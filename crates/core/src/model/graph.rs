use emberview_protocol::SharedStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::frame::{Frame, ValueMode};

/// All frames at one call-stack depth, sorted ascending by their left
/// offset and non-overlapping in sample space.
pub type Level = Vec<Frame>;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("graph has zero depth")]
    ZeroDepth,
    #[error("root level must contain exactly one synthetic root frame, found {0}")]
    MalformedRoot(usize),
    #[error("level {level} is not sorted or overlaps at frame {index}")]
    UnorderedLevel { level: usize, index: usize },
    #[error("frame at level {level} index {index} references missing title {title_index}")]
    BadTitleIndex {
        level: usize,
        index: usize,
        title_index: u32,
    },
}

/// One loaded profile (or one differential pair), immutable for the life
/// of an engine instance.
///
/// Frames reference their display titles through `title_pool` indices so
/// repeated method names are stored once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlamegraphData {
    pub depth: usize,
    pub levels: Vec<Level>,
    pub title_pool: Vec<SharedStr>,
}

impl FlamegraphData {
    /// Check the invariants the draw loop, binary-search hit-testing, and
    /// the highlight sweep all rely on. Run once at engine construction;
    /// a failure is a fatal configuration error, not a runtime condition.
    pub fn validate(&self) -> Result<(), DataError> {
        if self.depth == 0 || self.levels.is_empty() {
            return Err(DataError::ZeroDepth);
        }
        if self.levels[0].len() != 1 {
            return Err(DataError::MalformedRoot(self.levels[0].len()));
        }
        for (level_no, level) in self.levels.iter().enumerate() {
            for (index, frame) in level.iter().enumerate() {
                if frame.title_index as usize >= self.title_pool.len() {
                    return Err(DataError::BadTitleIndex {
                        level: level_no,
                        index,
                        title_index: frame.title_index,
                    });
                }
                if index > 0 {
                    let prev = &level[index - 1];
                    let ordered = |mode| {
                        frame.left(mode) >= prev.right(mode)
                    };
                    if !ordered(ValueMode::Samples) || !ordered(ValueMode::Weight) {
                        return Err(DataError::UnorderedLevel {
                            level: level_no,
                            index,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// The synthetic root spanning the whole profile.
    pub fn root(&self) -> &Frame {
        &self.levels[0][0]
    }

    /// Frame lookup by level/index, if both are in range.
    pub fn get(&self, level: usize, index: usize) -> Option<&Frame> {
        self.levels.get(level)?.get(index)
    }

    /// Display title of a frame, or the empty string for an index that
    /// escaped validation (never happens for validated data).
    pub fn title(&self, frame: &Frame) -> SharedStr {
        self.title_pool
            .get(frame.title_index as usize)
            .cloned()
            .unwrap_or_else(|| SharedStr::from(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::frame::FrameType;

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

    fn graph(levels: Vec<Level>, titles: &[&str]) -> FlamegraphData {
        FlamegraphData {
            depth: levels.len(),
            levels,
            title_pool: titles.iter().map(|t| SharedStr::from(*t)).collect(),
        }
    }

    #[test]
    fn accepts_well_formed_graph() {
        let g = graph(
            vec![
                vec![frame(0, 100, 0)],
                vec![frame(0, 60, 1), frame(60, 40, 2)],
            ],
            &["all", "a", "b"],
        );
        assert!(g.validate().is_ok());
        assert_eq!(g.root().total_samples, 100);
        assert_eq!(g.title(g.root()), "all");
    }

    #[test]
    fn rejects_zero_depth() {
        let g = graph(vec![], &[]);
        assert!(matches!(g.validate(), Err(DataError::ZeroDepth)));

        let mut g = graph(vec![vec![frame(0, 1, 0)]], &["all"]);
        g.depth = 0;
        assert!(matches!(g.validate(), Err(DataError::ZeroDepth)));
    }

    #[test]
    fn rejects_multi_frame_root() {
        let g = graph(vec![vec![frame(0, 5, 0), frame(5, 5, 0)]], &["all"]);
        assert!(matches!(g.validate(), Err(DataError::MalformedRoot(2))));
    }

    #[test]
    fn rejects_overlapping_siblings() {
        let g = graph(
            vec![
                vec![frame(0, 100, 0)],
                vec![frame(0, 60, 0), frame(50, 40, 0)],
            ],
            &["all"],
        );
        assert!(matches!(
            g.validate(),
            Err(DataError::UnorderedLevel { level: 1, index: 1 })
        ));
    }

    #[test]
    fn rejects_out_of_range_title() {
        let g = graph(vec![vec![frame(0, 10, 3)]], &["all"]);
        assert!(matches!(
            g.validate(),
            Err(DataError::BadTitleIndex { title_index: 3, .. })
        ));
    }

    #[test]
    fn decodes_payload_shape() {
        let json = r#"{
            "depth": 2,
            "levels": [
                [{"leftSamples": 0, "totalSamples": 10, "titleIndex": 0, "type": "THREAD_NAME_SYNTHETIC"}],
                [{"leftSamples": 0, "totalSamples": 10, "titleIndex": 1, "type": "JIT_COMPILED"}]
            ],
            "titlePool": ["all", "Thread.run"]
        }"#;
        let g: FlamegraphData = serde_json::from_str(json).expect("decode graph");
        assert!(g.validate().is_ok());
        assert_eq!(g.depth, 2);
        assert_eq!(g.title(&g.levels[1][0]), "Thread.run");
    }
}

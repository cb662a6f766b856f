//! Pointer-to-frame hit testing.
//!
//! A pointer position resolves to a row by integer division, then to a
//! frame by binary search over that row's visible-frame list. The list
//! is produced by the draw pass in ascending x order with no overlaps,
//! which is exactly what the search relies on.

use emberview_protocol::{FrameRef, Rect};

use crate::render::FRAME_HEIGHT;

/// A frame's screen rectangle for the current zoom state, recorded by
/// the draw pass. Rebuilt on every draw, discarded with the next one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleFrame {
    pub rect: Rect,
    pub frame: FrameRef,
}

/// Resolve a vertical pixel offset to a level row. Positions outside
/// `[0, level_count)` rows mean no hit.
pub fn level_at(offset_y: f64, level_count: usize) -> Option<usize> {
    if offset_y < 0.0 {
        return None;
    }
    let level = (offset_y / FRAME_HEIGHT) as usize;
    (level < level_count).then_some(level)
}

/// Binary-search the row's visible frames for the one covering
/// `offset_x`. `O(log k)` in the number of visible frames on the row.
pub fn lookup_frame(frames: &[VisibleFrame], offset_x: f64) -> Option<VisibleFrame> {
    let mut lo = 0usize;
    let mut hi = frames.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let rect = frames[mid].rect;
        if offset_x < rect.x {
            hi = mid;
        } else if offset_x > rect.x + rect.w {
            lo = mid + 1;
        } else {
            // A pointer exactly on the shared edge of touching frames
            // (or on a run of zero-width frames) is covered by more
            // than one; the leftmost wins, as in a front-to-back scan.
            let mut first = mid;
            while first > 0 && frames[first - 1].rect.contains_x(offset_x) {
                first -= 1;
            }
            return Some(frames[first]);
        }
    }
    None
}

/// Reference implementation: scan every visible frame on the row.
///
/// `O(k)`; exists so the binary search can be checked for
/// observational equivalence against it.
pub fn lookup_frame_linear_reference(
    frames: &[VisibleFrame],
    offset_x: f64,
) -> Option<VisibleFrame> {
    frames
        .iter()
        .find(|vf| vf.rect.contains_x(offset_x))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(spans: &[(f64, f64)]) -> Vec<VisibleFrame> {
        spans
            .iter()
            .enumerate()
            .map(|(i, &(x, w))| VisibleFrame {
                rect: Rect::new(x, 0.0, w, FRAME_HEIGHT),
                frame: FrameRef::new(0, i),
            })
            .collect()
    }

    #[test]
    fn level_resolution() {
        assert_eq!(level_at(0.0, 3), Some(0));
        assert_eq!(level_at(19.9, 3), Some(0));
        assert_eq!(level_at(20.0, 3), Some(1));
        assert_eq!(level_at(59.9, 3), Some(2));
        assert_eq!(level_at(60.0, 3), None);
        assert_eq!(level_at(-1.0, 3), None);
    }

    #[test]
    fn finds_frame_in_gapped_row() {
        let frames = row(&[(0.0, 10.0), (25.0, 10.0), (60.0, 30.0)]);
        assert_eq!(lookup_frame(&frames, 5.0), Some(frames[0]));
        assert_eq!(lookup_frame(&frames, 30.0), Some(frames[1]));
        assert_eq!(lookup_frame(&frames, 89.0), Some(frames[2]));
        // Gaps between frames are misses.
        assert_eq!(lookup_frame(&frames, 15.0), None);
        assert_eq!(lookup_frame(&frames, 95.0), None);
    }

    #[test]
    fn empty_row_is_a_miss() {
        assert_eq!(lookup_frame(&[], 10.0), None);
    }

    #[test]
    fn shared_edge_resolves_to_left_frame() {
        let frames = row(&[(0.0, 10.0), (10.0, 10.0), (20.0, 10.0)]);
        assert_eq!(lookup_frame(&frames, 10.0), Some(frames[0]));
        assert_eq!(lookup_frame(&frames, 20.0), Some(frames[1]));
        assert_eq!(lookup_frame(&frames, 30.0), Some(frames[2]));
    }

    #[test]
    fn matches_linear_scan_on_every_column() {
        // Sweep every half-pixel column across
        // rows of varying shape and compare against the reference scan.
        let rows = [
            row(&[]),
            row(&[(0.0, 100.0)]),
            row(&[(0.0, 10.0), (10.0, 10.0), (20.0, 0.5)]),
            row(&[(3.0, 7.5), (12.0, 1.0), (40.0, 0.0), (41.0, 20.0)]),
        ];
        for frames in &rows {
            let mut x = -2.0;
            while x <= 105.0 {
                assert_eq!(
                    lookup_frame(frames, x),
                    lookup_frame_linear_reference(frames, x),
                    "column {x}"
                );
                x += 0.5;
            }
        }
    }
}

//! Speculative pre-rendering for smooth zoom.
//!
//! Hovering a frame makes it the likely next zoom root, so the engine
//! renders that view ahead of time. Scheduling is debounced to one
//! target per animation tick and a new hover target replaces (cancels)
//! any pending one. The finished product is kept until a click installs
//! it, the hover moves on, or a resize invalidates its geometry.
//!
//! This is latency hiding only: the buffered view comes from the same
//! pure draw pass as the authoritative one, so installing it and
//! redrawing from scratch are indistinguishable.

use emberview_protocol::FrameRef;

use crate::render::RenderedView;

/// A finished speculative render, valid for one root at one canvas width.
pub struct Prerendered {
    pub root: FrameRef,
    pub canvas_width: f64,
    pub view: RenderedView,
}

#[derive(Default)]
pub struct PrerenderScheduler {
    pending: Option<FrameRef>,
    buffer: Option<Prerendered>,
}

impl PrerenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a speculative render of `root`, replacing any pending
    /// request that has not run yet.
    pub fn schedule(&mut self, root: FrameRef) {
        self.pending = Some(root);
    }

    /// The target to render this tick, if any. Taking it clears the
    /// request, so at most one speculative render runs per tick.
    pub fn take_pending(&mut self) -> Option<FrameRef> {
        self.pending.take()
    }

    /// Whether the buffer already holds this root at this width; used
    /// to skip re-rendering while hovering in place.
    pub fn is_buffered(&self, root: FrameRef, canvas_width: f64) -> bool {
        self.buffer
            .as_ref()
            .is_some_and(|p| p.root == root && p.canvas_width == canvas_width)
    }

    pub fn store(&mut self, prerendered: Prerendered) {
        self.buffer = Some(prerendered);
    }

    /// Consume the buffer if it matches the clicked root and the live
    /// canvas width; a stale buffer stays put and ages out on the next
    /// store or invalidation.
    pub fn take_if_matches(&mut self, root: FrameRef, canvas_width: f64) -> Option<RenderedView> {
        if self.is_buffered(root, canvas_width) {
            self.buffer.take().map(|p| p.view)
        } else {
            None
        }
    }

    /// Drop both the pending request and the buffer (resize, teardown).
    pub fn invalidate(&mut self) {
        self.pending = None;
        self.buffer = None;
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn has_buffer(&self) -> bool {
        self.buffer.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::HighlightSet;

    fn view() -> RenderedView {
        RenderedView {
            commands: Vec::new(),
            visible: Vec::new(),
            highlighted: HighlightSet::new(),
            px_per_unit: 1.0,
        }
    }

    #[test]
    fn new_target_replaces_pending() {
        let mut sched = PrerenderScheduler::new();
        sched.schedule(FrameRef::new(1, 0));
        sched.schedule(FrameRef::new(2, 3));
        assert_eq!(sched.take_pending(), Some(FrameRef::new(2, 3)));
        assert_eq!(sched.take_pending(), None);
    }

    #[test]
    fn buffer_matches_root_and_width() {
        let mut sched = PrerenderScheduler::new();
        sched.store(Prerendered {
            root: FrameRef::new(1, 0),
            canvas_width: 800.0,
            view: view(),
        });
        assert!(sched.is_buffered(FrameRef::new(1, 0), 800.0));
        assert!(!sched.is_buffered(FrameRef::new(1, 0), 640.0));
        assert!(!sched.is_buffered(FrameRef::new(1, 1), 800.0));

        assert!(sched.take_if_matches(FrameRef::new(1, 1), 800.0).is_none());
        assert!(sched.has_buffer());
        assert!(sched.take_if_matches(FrameRef::new(1, 0), 800.0).is_some());
        assert!(!sched.has_buffer());
    }

    #[test]
    fn invalidate_clears_everything() {
        let mut sched = PrerenderScheduler::new();
        sched.schedule(FrameRef::new(1, 0));
        sched.store(Prerendered {
            root: FrameRef::new(1, 0),
            canvas_width: 800.0,
            view: view(),
        });
        sched.invalidate();
        assert!(!sched.has_pending());
        assert!(!sched.has_buffer());
    }
}

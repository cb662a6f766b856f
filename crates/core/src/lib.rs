pub mod color;
pub mod engine;
pub mod hit;
pub mod model;
pub mod prerender;
pub mod render;
pub mod search;

pub use engine::{
    ContextMenu, EngineConfig, EngineError, Flamegraph, FrameTick, HighlightBox, HoverUpdate,
    SearchError, SearchOutcome, TooltipBuilder,
};
pub use model::{FlamegraphData, Frame, FrameType, ValueMode};
pub use render::FRAME_HEIGHT;

pub mod frame;
pub mod graph;

pub use frame::{DiffDetails, Frame, FramePosition, FrameSampleTypes, FrameType, ValueMode};
pub use graph::{DataError, FlamegraphData, Level};

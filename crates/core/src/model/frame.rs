use serde::{Deserialize, Serialize};

/// Which of the two parallel coordinate systems sizes the graph:
/// raw sample counts, or the sampled weight (bytes allocated, time
/// blocked, …). Selected once per engine view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueMode {
    Samples,
    Weight,
}

/// Kind of a call-stack frame, as classified by the profiler.
///
/// Synthetic kinds are inserted rows that never existed on a real stack
/// (thread names, allocated types, blocking objects, lambda call sites).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrameType {
    Interpreted,
    JitCompiled,
    C1Compiled,
    Inlined,
    Native,
    Cpp,
    Kernel,
    ThreadNameSynthetic,
    AllocatedObjectSynthetic,
    AllocatedObjectInNewTlabSynthetic,
    AllocatedObjectOutsideTlabSynthetic,
    BlockingObjectSynthetic,
    LambdaSynthetic,
    HighlightedWarning,
    Unknown,
}

impl FrameType {
    /// Human-readable kind label for tooltips and status lines.
    pub fn label(self) -> &'static str {
        match self {
            FrameType::Interpreted => "Interpreted",
            FrameType::JitCompiled => "JIT-compiled",
            FrameType::C1Compiled => "C1-compiled",
            FrameType::Inlined => "Inlined",
            FrameType::Native => "Native",
            FrameType::Cpp => "C++",
            FrameType::Kernel => "Kernel",
            FrameType::ThreadNameSynthetic => "Thread",
            FrameType::AllocatedObjectSynthetic => "Allocated Object",
            FrameType::AllocatedObjectInNewTlabSynthetic => "Allocated Object (in new TLAB)",
            FrameType::AllocatedObjectOutsideTlabSynthetic => "Allocated Object (outside TLAB)",
            FrameType::BlockingObjectSynthetic => "Blocking Object",
            FrameType::LambdaSynthetic => "Lambda",
            FrameType::HighlightedWarning => "Warning",
            FrameType::Unknown => "Unknown",
        }
    }

    /// Whether this frame row was synthesized rather than sampled.
    pub fn is_synthetic(self) -> bool {
        matches!(
            self,
            FrameType::ThreadNameSynthetic
                | FrameType::AllocatedObjectSynthetic
                | FrameType::AllocatedObjectInNewTlabSynthetic
                | FrameType::AllocatedObjectOutsideTlabSynthetic
                | FrameType::BlockingObjectSynthetic
                | FrameType::LambdaSynthetic
        )
    }
}

/// Bytecode index and source line of the sampled call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramePosition {
    #[serde(default)]
    pub bci: i32,
    #[serde(default)]
    pub line: i32,
}

/// Per-compilation-tier breakdown of this frame's samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSampleTypes {
    #[serde(default)]
    pub inlined: u64,
    #[serde(default)]
    pub c1: u64,
    #[serde(default)]
    pub interpret: u64,
    #[serde(default)]
    pub jit: u64,
}

/// Signed deltas of a differential frame against the reference profile.
///
/// `samples`/`weight` hold `primary - secondary`; the matching totals on
/// the frame hold `primary + secondary`, so both sides reconstruct
/// exactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffDetails {
    pub samples: i64,
    pub weight: i64,
    #[serde(default)]
    pub percent_samples: f64,
    #[serde(default)]
    pub percent_weight: f64,
}

impl DiffDetails {
    /// Signed delta in the active unit.
    pub fn delta(&self, mode: ValueMode) -> i64 {
        match mode {
            ValueMode::Samples => self.samples,
            ValueMode::Weight => self.weight,
        }
    }

    /// Relative change percentage in the active unit.
    pub fn percent(&self, mode: ValueMode) -> f64 {
        match mode {
            ValueMode::Samples => self.percent_samples,
            ValueMode::Weight => self.percent_weight,
        }
    }
}

/// One call-stack node aggregated over samples at one depth.
///
/// Spans a contiguous range of sample space at its level:
/// `[left, left + total)` in each of the two units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub left_samples: u64,
    #[serde(default)]
    pub left_weight: u64,
    pub total_samples: u64,
    #[serde(default)]
    pub total_weight: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_samples: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_weight: Option<u64>,
    pub title_index: u32,
    #[serde(rename = "type")]
    pub frame_type: FrameType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<FramePosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_types: Option<FrameSampleTypes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_details: Option<DiffDetails>,
    #[serde(default)]
    pub before_marker: bool,
}

impl Frame {
    /// Cumulative offset of this frame's span in the active unit.
    #[inline]
    pub fn left(&self, mode: ValueMode) -> u64 {
        match mode {
            ValueMode::Samples => self.left_samples,
            ValueMode::Weight => self.left_weight,
        }
    }

    /// Span width (self + descendants) in the active unit.
    #[inline]
    pub fn total(&self, mode: ValueMode) -> u64 {
        match mode {
            ValueMode::Samples => self.total_samples,
            ValueMode::Weight => self.total_weight,
        }
    }

    /// Portion not attributed to children, in the active unit.
    pub fn self_value(&self, mode: ValueMode) -> Option<u64> {
        match mode {
            ValueMode::Samples => self.self_samples,
            ValueMode::Weight => self.self_weight,
        }
    }

    /// End of the span (`left + total`) in the active unit.
    #[inline]
    pub fn right(&self, mode: ValueMode) -> u64 {
        self.left(mode) + self.total(mode)
    }
}

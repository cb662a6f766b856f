//! Search highlighting and union coverage.
//!
//! Recursive call patterns produce multiple matching frames that start
//! at the same left offset on different levels; summing their spans
//! would double-count coverage. The set keeps only the widest match per
//! offset and the sweep unions the surviving intervals.

use std::collections::HashMap;

/// Matching spans collected during one draw pass, keyed by left offset
/// in the active unit.
#[derive(Debug, Default)]
pub struct HighlightSet {
    spans: HashMap<u64, u64>,
}

impl HighlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a matching frame's span. A span already dominated by an
    /// earlier match at the same offset is ignored.
    pub fn record(&mut self, left: u64, value: u64) {
        let entry = self.spans.entry(left).or_insert(value);
        if *entry < value {
            *entry = value;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Union of the recorded intervals: sort offsets ascending, then
    /// sweep with an advancing cursor so nested spans count once.
    pub fn covered_total(&self) -> u64 {
        let mut offsets: Vec<u64> = self.spans.keys().copied().collect();
        offsets.sort_unstable();

        let mut total = 0u64;
        let mut cursor = 0u64;
        for offset in offsets {
            if offset >= cursor {
                let value = self.spans[&offset];
                total += value;
                cursor = offset + value;
            }
        }
        total
    }
}

/// Percentage of the zoom root covered by matches, two decimals,
/// saturating at `"100"` to guard floating-point overshoot.
pub fn coverage_percent(covered: u64, root_value: u64) -> String {
    if covered >= root_value {
        "100".to_string()
    } else {
        format!("{:.2}", 100.0 * covered as f64 / root_value as f64)
    }
}

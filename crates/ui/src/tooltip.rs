use emberview_core::engine::TooltipBuilder;
use emberview_core::model::{FlamegraphData, Frame, ValueMode};

/// Plain-text tooltip content for the hovered frame: title, kind,
/// totals with percent-of-root, self values, call-site position, the
/// compilation-tier breakdown, and the differential delta when present.
pub struct FlameTooltip {
    mode: ValueMode,
}

impl FlameTooltip {
    pub fn new(mode: ValueMode) -> Self {
        Self { mode }
    }

    fn percent(part: u64, whole: u64) -> String {
        if whole == 0 {
            "0.00".to_string()
        } else {
            format!("{:.2}", 100.0 * part as f64 / whole as f64)
        }
    }
}

impl TooltipBuilder for FlameTooltip {
    fn generate(
        &self,
        data: &FlamegraphData,
        frame: &Frame,
        root_total_samples: u64,
        root_total_weight: u64,
    ) -> String {
        let mut lines = Vec::new();
        lines.push(data.title(frame).to_string());
        lines.push(format!("Type: {}", frame.frame_type.label()));
        lines.push(format!(
            "Samples (total): {} ({}%)",
            frame.total_samples,
            Self::percent(frame.total_samples, root_total_samples)
        ));
        if frame.total_weight > 0 {
            lines.push(format!(
                "Weight (total): {} ({}%)",
                frame.total_weight,
                Self::percent(frame.total_weight, root_total_weight)
            ));
        }
        if let Some(self_samples) = frame.self_samples {
            lines.push(format!("Samples (self): {self_samples}"));
        }
        if let Some(self_weight) = frame.self_weight {
            lines.push(format!("Weight (self): {self_weight}"));
        }
        if let Some(position) = frame.position {
            lines.push(format!("Position: bci {}, line {}", position.bci, position.line));
        }
        if let Some(tiers) = frame.sample_types {
            let mut parts = Vec::new();
            if tiers.jit > 0 {
                parts.push(format!("JIT {}", tiers.jit));
            }
            if tiers.inlined > 0 {
                parts.push(format!("inlined {}", tiers.inlined));
            }
            if tiers.c1 > 0 {
                parts.push(format!("C1 {}", tiers.c1));
            }
            if tiers.interpret > 0 {
                parts.push(format!("interpreted {}", tiers.interpret));
            }
            if !parts.is_empty() {
                lines.push(format!("Tiers: {}", parts.join(", ")));
            }
        }
        if let Some(diff) = frame.diff_details {
            let delta = diff.delta(self.mode);
            let percent = diff.percent(self.mode);
            if delta > 0 {
                lines.push(format!("Added: {delta} ({percent}%)"));
            } else if delta < 0 {
                lines.push(format!("Removed: {} ({percent}%)", delta.unsigned_abs()));
            } else {
                lines.push("No difference".to_string());
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emberview_core::model::{DiffDetails, FrameType};
    use emberview_protocol::SharedStr;

    fn data() -> FlamegraphData {
        FlamegraphData {
            depth: 1,
            levels: vec![vec![Frame {
                left_samples: 0,
                left_weight: 0,
                total_samples: 25,
                total_weight: 4096,
                self_samples: Some(5),
                self_weight: None,
                title_index: 0,
                frame_type: FrameType::Native,
                position: None,
                sample_types: None,
                diff_details: None,
                before_marker: false,
            }]],
            title_pool: vec![SharedStr::from("malloc")],
        }
    }

    #[test]
    fn basic_content() {
        let data = data();
        let tooltip = FlameTooltip::new(ValueMode::Samples);
        let text = tooltip.generate(&data, data.root(), 100, 8192);
        assert!(text.starts_with("malloc\n"));
        assert!(text.contains("Type: Native"));
        assert!(text.contains("Samples (total): 25 (25.00%)"));
        assert!(text.contains("Weight (total): 4096 (50.00%)"));
        assert!(text.contains("Samples (self): 5"));
    }

    #[test]
    fn diff_content() {
        let mut data = data();
        data.levels[0][0].diff_details = Some(DiffDetails {
            samples: -10,
            weight: 0,
            percent_samples: 40.0,
            percent_weight: 0.0,
        });
        let tooltip = FlameTooltip::new(ValueMode::Samples);
        let text = tooltip.generate(&data, data.root(), 100, 8192);
        assert!(text.contains("Removed: 10 (40%)"));
    }
}

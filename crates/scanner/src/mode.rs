use serde::{Deserialize, Serialize};

/// Named envelope of confidence floor, recency window and result cap used
/// when retrieving candidate mentions. The table is a fixed contract so
/// precision behavior stays comparable across entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecisionMode {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeEnvelope {
    pub min_confidence: f64,
    pub window_hours: i64,
    pub result_cap: usize,
}

impl PrecisionMode {
    pub fn envelope(self) -> ModeEnvelope {
        match self {
            PrecisionMode::High => ModeEnvelope {
                min_confidence: 0.8,
                window_hours: 12,
                result_cap: 50,
            },
            PrecisionMode::Medium => ModeEnvelope {
                min_confidence: 0.6,
                window_hours: 24,
                result_cap: 100,
            },
            PrecisionMode::Low => ModeEnvelope {
                min_confidence: 0.4,
                window_hours: 48,
                result_cap: 200,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_table_is_exact() {
        let high = PrecisionMode::High.envelope();
        assert_eq!((high.min_confidence, high.window_hours, high.result_cap), (0.8, 12, 50));

        let medium = PrecisionMode::Medium.envelope();
        assert_eq!(
            (medium.min_confidence, medium.window_hours, medium.result_cap),
            (0.6, 24, 100)
        );

        let low = PrecisionMode::Low.envelope();
        assert_eq!((low.min_confidence, low.window_hours, low.result_cap), (0.4, 48, 200));
    }
}

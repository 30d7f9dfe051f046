use serde::{Deserialize, Serialize};

use crate::schema::{Decision, MatchResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

/// Aggregate precision statistics over a batch of match results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecisionStats {
    pub total_scanned: usize,
    pub accepted: usize,
    pub pending: usize,
    pub rejected: usize,
    pub false_positives_blocked: usize,
    pub avg_precision_score: f64,
    pub confidence_level: ConfidenceLevel,
}

impl PrecisionStats {
    pub fn from_results(results: &[MatchResult]) -> Self {
        let total = results.len();
        let accepted = results
            .iter()
            .filter(|r| r.decision == Decision::Accepted)
            .count();
        let pending = results
            .iter()
            .filter(|r| r.decision == Decision::Pending)
            .count();
        let rejected = results
            .iter()
            .filter(|r| r.decision == Decision::Rejected)
            .count();
        let false_positives_blocked = results
            .iter()
            .filter(|r| r.false_positive_detected)
            .count();

        let avg_precision_score = if total > 0 {
            results.iter().map(|r| r.match_score).sum::<f64>() / total as f64
        } else {
            0.0
        };

        let confidence_level = if avg_precision_score >= 0.8 {
            ConfidenceLevel::High
        } else if avg_precision_score >= 0.6 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        };

        Self {
            total_scanned: total,
            accepted,
            pending,
            rejected,
            false_positives_blocked,
            avg_precision_score,
            confidence_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(score: f64, decision: Decision, fp: bool) -> MatchResult {
        MatchResult {
            entity_name: "Acme Corp".to_string(),
            content_snippet: String::new(),
            match_score: score,
            decision,
            false_positive_detected: fp,
            reasoning: Vec::new(),
        }
    }

    #[test]
    fn empty_batch_is_low_confidence_zero_score() {
        let stats = PrecisionStats::from_results(&[]);
        assert_eq!(stats.total_scanned, 0);
        assert_eq!(stats.avg_precision_score, 0.0);
        assert_eq!(stats.confidence_level, ConfidenceLevel::Low);
    }

    #[test]
    fn counts_and_confidence_band() {
        let stats = PrecisionStats::from_results(&[
            result(0.9, Decision::Accepted, false),
            result(0.8, Decision::Accepted, false),
            result(0.5, Decision::Pending, false),
            result(0.0, Decision::Rejected, true),
        ]);
        assert_eq!(stats.accepted, 2);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.false_positives_blocked, 1);
        assert!((stats.avg_precision_score - 0.55).abs() < 1e-9);
        assert_eq!(stats.confidence_level, ConfidenceLevel::Low);
    }
}

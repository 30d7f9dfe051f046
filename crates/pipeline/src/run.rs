use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fingerprint::{ContentItem, MatchResult, Severity};
use scanner::PrecisionMode;

use crate::strategy::Strategy;
use crate::templates::ContentTemplate;

/// Pipeline invocation contract for external collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub entity_name: String,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    pub precision_mode: PrecisionMode,
    pub live_data_only: bool,
    pub block_simulations: bool,
    pub source: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

impl SeverityCounts {
    pub fn tally(items: &[ContentItem]) -> Self {
        let mut counts = Self::default();
        for item in items {
            match item.severity {
                Severity::Low => counts.low += 1,
                Severity::Medium => counts.medium += 1,
                Severity::High => counts.high += 1,
                Severity::Critical => counts.critical += 1,
            }
        }
        counts
    }
}

/// Stage 1 output: everything on record for the entity, tallied by severity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityScanSummary {
    pub threats_detected: usize,
    pub severity_counts: SeverityCounts,
    pub items: Vec<ContentItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedItem {
    pub item: ContentItem,
    pub match_result: MatchResult,
}

/// Stage 2 output: the verified/excluded partition with its mean score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecisionSummary {
    pub total_processed: usize,
    pub verified: Vec<VerifiedItem>,
    pub false_positives_blocked: usize,
    pub excluded: usize,
    pub precision_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_processing_ms: u64,
    pub precision_rate: f64,
    pub pipeline_efficiency: f64,
    pub throughput_per_sec: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentVerdict {
    pub ready_for_deployment: bool,
    pub suggested_actions: Vec<String>,
}

/// One execution of the orchestrator for one entity. Immutable once
/// finished; persisted by the audit sink keyed by (entity, finished_at).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub run_id: String,
    pub entity_name: String,
    pub entity_scan: EntityScanSummary,
    pub precision: PrecisionSummary,
    pub strategies: Vec<Strategy>,
    pub templates: Vec<ContentTemplate>,
    pub performance: PerformanceSummary,
    pub deployment: DeploymentVerdict,
    pub ready_for_deployment: bool,
    pub suggested_actions: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Per-keyword result for keyword-scoped invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordCiaResult {
    pub keyword: String,
    pub threats: Vec<ContentItem>,
    pub entity_matches: Vec<MatchResult>,
    pub precision_score: f64,
    pub recommendations: Vec<String>,
    pub live_validated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResponse {
    pub run: PipelineRun,
    pub keyword_results: Vec<KeywordCiaResult>,
}

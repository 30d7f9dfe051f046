use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use fingerprint::{score, Decision, MatchRegime};
use gate::{GateError, LiveDataGate};
use scanner::{PrecisionScanner, ScanError};
use store::{AuditSink, ContentStore, FingerprintStore, RunAuditRecord, StoreError};

use crate::keyword::keyword_results;
use crate::performance;
use crate::readiness;
use crate::run::{
    EntityScanSummary, PipelineRequest, PipelineResponse, PipelineRun, PrecisionSummary,
    SeverityCounts, VerifiedItem,
};
use crate::strategy::{generate_strategies, StrategyPlaybook};
use crate::templates::suggest_templates;

const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("stage '{stage}' timed out after {timeout_secs}s")]
    StageTimeout { stage: &'static str, timeout_secs: u64 },
}

impl From<ScanError> for PipelineError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::Gate(e) => PipelineError::Gate(e),
            ScanError::Store(e) => PipelineError::Store(e),
        }
    }
}

/// Runs the six stages in order for one entity: historical scan, precision
/// verification, strategy generation, template suggestion, performance
/// analysis and deployment readiness. Stages 3 through 6 are pure
/// transformations of earlier output and cannot fail; every run that gets
/// past stage 1 therefore produces a complete, auditable record.
pub struct Orchestrator {
    fingerprints: Arc<dyn FingerprintStore>,
    content: Arc<dyn ContentStore>,
    audit: Arc<dyn AuditSink>,
    scanner: PrecisionScanner,
    gate: LiveDataGate,
    playbook: StrategyPlaybook,
    io_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        fingerprints: Arc<dyn FingerprintStore>,
        content: Arc<dyn ContentStore>,
        audit: Arc<dyn AuditSink>,
        gate: LiveDataGate,
    ) -> Self {
        Self {
            scanner: PrecisionScanner::new(content.clone(), gate.clone()),
            fingerprints,
            content,
            audit,
            gate,
            playbook: StrategyPlaybook::default(),
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    pub fn with_playbook(mut self, playbook: StrategyPlaybook) -> Self {
        self.playbook = playbook;
        self
    }

    pub async fn execute(&self, req: &PipelineRequest) -> Result<PipelineResponse, PipelineError> {
        let entity = req.entity_name.trim().to_string();
        self.gate.check_clear(&req.source)?;

        if req.block_simulations && !self.gate.validate(&entity, &req.source) {
            let err = self.gate.block_simulation(&req.source);
            self.audit_failure(&entity, "gate", &err.to_string(), serde_json::Value::Null)
                .await;
            return Err(err.into());
        }

        // Validation runs before any write so a rejected request leaves the
        // store untouched.
        if req.live_data_only {
            self.gate.ensure_live(&entity, &req.source)?;
        }

        let existing = match self
            .io("fingerprint_lookup", self.fingerprints.get(&entity))
            .await
        {
            Ok(existing) => existing,
            Err(err) => {
                self.audit_failure(&entity, "fingerprint_lookup", &err.to_string(), serde_json::Value::Null)
                    .await;
                return Err(err);
            }
        };
        let fp = match existing {
            Some(fp) => fp,
            None => {
                // Baselines are live-data-only, so the name must validate
                // before one is persisted.
                self.gate.ensure_live(&entity, &req.source)?;
                match self
                    .io("fingerprint_provision", self.fingerprints.ensure(&entity, &req.source))
                    .await
                {
                    Ok(fp) => fp,
                    Err(err) => {
                        self.audit_failure(
                            &entity,
                            "fingerprint_provision",
                            &err.to_string(),
                            serde_json::Value::Null,
                        )
                        .await;
                        return Err(err);
                    }
                }
            }
        };
        if fp.live_data_only {
            self.gate.ensure_live(&entity, &req.source)?;
        }

        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let clock = Instant::now();
        info!(run_id = %run_id, entity = %entity, "pipeline run started");

        // Stage 1: everything on record for the entity. A store failure here
        // aborts the run with an audited failure row.
        let items = match self.io("entity_scan", self.content.scan_all(&entity)).await {
            Ok(items) => items,
            Err(err) => {
                self.audit_failure(&entity, "entity_scan", &err.to_string(), serde_json::Value::Null)
                    .await;
                return Err(err);
            }
        };
        let entity_scan = EntityScanSummary {
            threats_detected: items.len(),
            severity_counts: SeverityCounts::tally(&items),
            items,
        };

        // Stage 2: fingerprint verification. An item survives unless the
        // matcher rejects it outright or flags a blocklisted term; pending
        // items stay in, with the readiness bar in stage 6 as the backstop.
        let mut verified = Vec::new();
        let mut false_positives_blocked = 0usize;
        let mut excluded = 0usize;
        for item in &entity_scan.items {
            let result = score(
                &item.content,
                item.title.as_deref().unwrap_or(""),
                &fp,
                MatchRegime::Combined,
            );
            if result.false_positive_detected {
                false_positives_blocked += 1;
            }
            if result.false_positive_detected || result.decision == Decision::Rejected {
                excluded += 1;
            } else {
                verified.push(VerifiedItem {
                    item: item.clone(),
                    match_result: result,
                });
            }
        }
        let precision_score = if verified.is_empty() {
            0.0
        } else {
            verified.iter().map(|v| v.match_result.match_score).sum::<f64>()
                / verified.len() as f64
        };
        let precision = PrecisionSummary {
            total_processed: entity_scan.items.len(),
            verified,
            false_positives_blocked,
            excluded,
            precision_score,
        };

        // Stages 3-6 are pure and infallible.
        let strategies = generate_strategies(&precision.verified, &self.playbook);
        let templates = suggest_templates(&strategies);
        let performance = performance::analyze(
            clock.elapsed(),
            entity_scan.threats_detected,
            precision.verified.len(),
        );
        let deployment =
            readiness::assess(precision.precision_score, strategies.len(), templates.len());

        let keyword_results = match &req.keywords {
            Some(keywords) if !keywords.is_empty() => {
                let scan = keyword_results(&self.scanner, &self.gate, &fp, keywords, req.precision_mode);
                match self.io("keyword_scan", scan).await {
                    Ok(results) => results,
                    Err(err) => {
                        let partial = json!({
                            "threats_detected": entity_scan.threats_detected,
                            "verified": precision.verified.len(),
                            "false_positives_blocked": precision.false_positives_blocked,
                            "precision_score": precision.precision_score,
                            "strategies": strategies.len(),
                            "templates": templates.len(),
                        });
                        self.audit_failure(&entity, "keyword_scan", &err.to_string(), partial)
                            .await;
                        return Err(err);
                    }
                }
            }
            _ => Vec::new(),
        };

        let finished_at = Utc::now();
        let run = PipelineRun {
            run_id,
            entity_name: entity,
            ready_for_deployment: deployment.ready_for_deployment,
            suggested_actions: deployment.suggested_actions.clone(),
            entity_scan,
            precision,
            strategies,
            templates,
            performance,
            deployment,
            started_at,
            finished_at,
        };

        let record = RunAuditRecord {
            entity_name: run.entity_name.clone(),
            finished_at: run.finished_at,
            ready_for_deployment: run.ready_for_deployment,
            stage_summary: json!({
                "run_id": run.run_id,
                "threats_detected": run.entity_scan.threats_detected,
                "verified": run.precision.verified.len(),
                "false_positives_blocked": run.precision.false_positives_blocked,
                "precision_score": run.precision.precision_score,
                "strategies": run.strategies.len(),
                "templates": run.templates.len(),
                "pipeline_efficiency": run.performance.pipeline_efficiency,
            }),
        };
        self.io("audit", self.audit.record_run(&record)).await?;

        info!(
            run_id = %run.run_id,
            entity = %run.entity_name,
            verified = run.precision.verified.len(),
            strategies = run.strategies.len(),
            ready = run.ready_for_deployment,
            "pipeline run complete"
        );

        Ok(PipelineResponse {
            run,
            keyword_results,
        })
    }

    async fn audit_failure(
        &self,
        entity: &str,
        stage: &str,
        reason: &str,
        partial: serde_json::Value,
    ) {
        if let Err(err) = self.audit.record_failure(entity, stage, reason, partial).await {
            warn!(entity = entity, stage = stage, error = %err, "could not record failure");
        }
    }

    async fn io<T, E, F>(&self, stage: &'static str, fut: F) -> Result<T, PipelineError>
    where
        F: Future<Output = Result<T, E>>,
        PipelineError: From<E>,
    {
        match tokio::time::timeout(self.io_timeout, fut).await {
            Ok(result) => result.map_err(PipelineError::from),
            Err(_) => Err(PipelineError::StageTimeout {
                stage,
                timeout_secs: self.io_timeout.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration as ChronoDuration};
    use fingerprint::{ContentItem, Severity};
    use scanner::PrecisionMode;
    use store::MemoryStore;

    /// Content store whose windowed query never returns in time.
    struct SlowWindowStore {
        inner: Arc<MemoryStore>,
    }

    #[async_trait::async_trait]
    impl ContentStore for SlowWindowStore {
        async fn insert(&self, item: ContentItem) -> Result<(), StoreError> {
            self.inner.insert(item).await
        }

        async fn scan_window(
            &self,
            entity_name: &str,
            min_confidence: f64,
            since: DateTime<Utc>,
            limit: usize,
        ) -> Result<Vec<ContentItem>, StoreError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            self.inner
                .scan_window(entity_name, min_confidence, since, limit)
                .await
        }

        async fn scan_all(&self, entity_name: &str) -> Result<Vec<ContentItem>, StoreError> {
            self.inner.scan_all(entity_name).await
        }
    }

    fn item(id: &str, content: &str, threat_type: &str) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            content: content.to_string(),
            title: None,
            platform: "news".to_string(),
            url: None,
            source_type: "live_osint".to_string(),
            severity: Severity::High,
            threat_type: threat_type.to_string(),
            confidence_score: 0.9,
            created_at: Utc::now() - ChronoDuration::hours(1),
        }
    }

    fn request(entity: &str) -> PipelineRequest {
        PipelineRequest {
            entity_name: entity.to_string(),
            keywords: None,
            precision_mode: PrecisionMode::High,
            live_data_only: true,
            block_simulations: true,
            source: "api".to_string(),
        }
    }

    fn orchestrator(store: Arc<MemoryStore>, gate: LiveDataGate) -> Orchestrator {
        Orchestrator::new(store.clone(), store.clone(), store, gate)
    }

    #[tokio::test]
    async fn full_run_partitions_and_strategizes() {
        let store = Arc::new(MemoryStore::new());
        let mut fp = fingerprint::EntityFingerprint::new(
            "Acme Corp",
            fingerprint::EntityType::Organization,
            "intake",
        )
        .unwrap();
        fp.false_positive_blocklist = vec!["mock".to_string()];
        store.upsert(fp).await.unwrap();
        store
            .insert(item("synthetic", "mock Acme Corp test coverage", "reputation"))
            .await
            .unwrap();
        store
            .insert(item("lawsuit", "Acme Corp faces lawsuit over data practices", "legal"))
            .await
            .unwrap();
        store
            .insert(item("unrelated", "Local bakery opens downtown", "reputation"))
            .await
            .unwrap();

        let orch = orchestrator(store.clone(), LiveDataGate::new());
        let response = orch.execute(&request("Acme Corp")).await.unwrap();
        let run = &response.run;

        // The unrelated item never mentions the entity and is not scanned.
        assert_eq!(run.entity_scan.threats_detected, 2);
        assert_eq!(run.precision.verified.len(), 1);
        assert_eq!(run.precision.verified[0].item.id, "lawsuit");
        assert_eq!(run.precision.false_positives_blocked, 1);
        assert_eq!(run.precision.excluded, 1);
        assert!(
            (run.precision.precision_score
                - run.precision.verified[0].match_result.match_score)
                .abs()
                < 1e-9
        );

        assert_eq!(run.strategies.len(), 1);
        assert_eq!(run.strategies[0].threat_type, "legal");
        assert_eq!(run.templates.len(), 2);

        // A single pending-grade match does not clear the deployment bar.
        assert!(!run.ready_for_deployment);
        assert!(!run.suggested_actions.is_empty());
        assert_eq!(store.audit_rows().len(), 1);
    }

    #[tokio::test]
    async fn empty_record_is_a_valid_run() {
        let store = Arc::new(MemoryStore::new());
        let orch = orchestrator(store.clone(), LiveDataGate::new());

        let response = orch.execute(&request("Acme Corp")).await.unwrap();
        let run = &response.run;
        assert_eq!(run.entity_scan.threats_detected, 0);
        assert_eq!(run.precision.precision_score, 0.0);
        assert!(run.strategies.is_empty());
        assert!(run.templates.is_empty());
        assert!(!run.ready_for_deployment);
        assert!(run
            .suggested_actions
            .contains(&readiness::ACTION_GENERATE_STRATEGIES.to_string()));
        assert_eq!(store.audit_rows().len(), 1);
    }

    #[tokio::test]
    async fn synthetic_entity_latches_the_gate() {
        let store = Arc::new(MemoryStore::new());
        let gate = LiveDataGate::new();
        let orch = orchestrator(store.clone(), gate.clone());

        let err = orch.execute(&request("Mock Corp")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Gate(GateError::SimulationBlocked { .. })));
        assert!(gate.simulation_detected());
        assert_eq!(store.audit_rows().len(), 1);

        // Contamination is terminal for this gate: clean entities are
        // refused too.
        let err = orch.execute(&request("Acme Corp")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Gate(GateError::SimulationBlocked { .. })));
    }

    #[tokio::test]
    async fn live_only_violation_is_recoverable() {
        let store = Arc::new(MemoryStore::new());
        let gate = LiveDataGate::new();
        let orch = orchestrator(store.clone(), gate.clone());

        let mut req = request("Sample Industries");
        req.block_simulations = false;

        let err = orch.execute(&req).await.unwrap_err();
        assert!(matches!(err, PipelineError::Gate(GateError::Validation { .. })));
        // Nothing was persisted for the rejected name.
        assert!(store.get("Sample Industries").await.unwrap().is_none());
        // No latch: the caller can retry with corrected input.
        assert!(!gate.simulation_detected());
        assert!(orch.execute(&request("Acme Corp")).await.is_ok());
    }

    #[tokio::test]
    async fn synthetic_name_is_never_provisioned_a_baseline() {
        let store = Arc::new(MemoryStore::new());
        let gate = LiveDataGate::new();
        let orch = orchestrator(store.clone(), gate.clone());

        // Even without live_data_only on the request, provisioning a
        // baseline would create a live-only fingerprint, so the name is
        // validated before the write.
        let mut req = request("Sample Industries");
        req.block_simulations = false;
        req.live_data_only = false;

        let err = orch.execute(&req).await.unwrap_err();
        assert!(matches!(err, PipelineError::Gate(GateError::Validation { .. })));
        assert!(store.get("Sample Industries").await.unwrap().is_none());
        assert!(!gate.simulation_detected());
    }

    #[tokio::test]
    async fn keyword_scoped_results_ride_along() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(item("lawsuit", "Acme Corp faces lawsuit over data practices", "legal"))
            .await
            .unwrap();
        store
            .insert(item("earnings", "Acme Corp posts record earnings", "reputation"))
            .await
            .unwrap();

        let orch = orchestrator(store, LiveDataGate::new());
        let mut req = request("Acme Corp");
        req.keywords = Some(vec!["lawsuit".to_string()]);

        let response = orch.execute(&req).await.unwrap();
        assert_eq!(response.keyword_results.len(), 1);
        let kw = &response.keyword_results[0];
        assert_eq!(kw.keyword, "lawsuit");
        assert!(kw.live_validated);
        assert_eq!(kw.threats.len(), 1);
        assert_eq!(kw.threats[0].id, "lawsuit");
        assert!(kw.precision_score > 0.0);
        assert!(!kw.recommendations.is_empty());
    }

    #[tokio::test]
    async fn keyword_stage_timeout_is_audited_with_partial_output() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(item("lawsuit", "Acme Corp faces lawsuit over data practices", "legal"))
            .await
            .unwrap();
        let content = Arc::new(SlowWindowStore {
            inner: store.clone(),
        });
        let orch = Orchestrator::new(store.clone(), content, store.clone(), LiveDataGate::new())
            .with_io_timeout(Duration::from_millis(20));

        let mut req = request("Acme Corp");
        req.keywords = Some(vec!["lawsuit".to_string()]);

        let err = orch.execute(&req).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::StageTimeout {
                stage: "keyword_scan",
                ..
            }
        ));

        // The failure row carries the stage outputs completed before the
        // keyword scan stalled.
        let rows = store.audit_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["stage"], "keyword_scan");
        assert_eq!(rows[0]["partial"]["verified"], 1);
        assert_eq!(rows[0]["partial"]["strategies"], 1);
        assert_eq!(rows[0]["partial"]["threats_detected"], 1);
    }
}

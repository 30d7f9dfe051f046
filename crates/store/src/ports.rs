use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fingerprint::{EntityFingerprint, EntityType};

use crate::error::StoreError;
use fingerprint::ContentItem;

/// Durable record of each tracked entity's matching rules.
///
/// Writes are idempotent upserts keyed by `primary_name` with last-write-wins
/// `last_updated`, so racing creators converge on one record. Fingerprints
/// are never hard-deleted, only superseded.
#[async_trait]
pub trait FingerprintStore: Send + Sync {
    async fn get(&self, primary_name: &str) -> Result<Option<EntityFingerprint>, StoreError>;

    async fn upsert(&self, fp: EntityFingerprint) -> Result<EntityFingerprint, StoreError>;

    /// Union-merge newly discovered aliases into an existing fingerprint.
    async fn append_aliases(
        &self,
        primary_name: &str,
        aliases: &[String],
    ) -> Result<EntityFingerprint, StoreError>;

    /// Fetch the fingerprint, auto-provisioning a baseline one (generic
    /// placeholder blocklist, live-data-only) on first reference.
    async fn ensure(
        &self,
        primary_name: &str,
        created_source: &str,
    ) -> Result<EntityFingerprint, StoreError> {
        if let Some(fp) = self.get(primary_name).await? {
            return Ok(fp);
        }
        let fp = baseline_fingerprint(primary_name, created_source)
            .map_err(|_| StoreError::NotFound(primary_name.to_string()))?;
        self.upsert(fp).await
    }
}

/// Baseline fingerprint for an entity referenced before anyone defined it:
/// the generic placeholder terms go straight onto the blocklist.
pub fn baseline_fingerprint(
    primary_name: &str,
    created_source: &str,
) -> anyhow::Result<EntityFingerprint> {
    let mut fp = EntityFingerprint::new(primary_name, EntityType::Organization, created_source)?;
    fp.false_positive_blocklist = gate::SYNTHETIC_MARKERS
        .iter()
        .map(|m| m.to_string())
        .collect();
    Ok(fp)
}

/// Candidate-mention storage. Items are produced by external ingestion
/// collaborators and read-only to the core.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn insert(&self, item: ContentItem) -> Result<(), StoreError>;

    /// Windowed query used by the precision scanner: live-sourced items
    /// mentioning the entity, at or above the confidence floor, inside the
    /// window, newest-first, capped.
    async fn scan_window(
        &self,
        entity_name: &str,
        min_confidence: f64,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ContentItem>, StoreError>;

    /// Unbounded historical query used by pipeline stage 1, newest-first.
    async fn scan_all(&self, entity_name: &str) -> Result<Vec<ContentItem>, StoreError>;
}

/// One audit row per pipeline invocation, keyed by (entity, finished_at).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunAuditRecord {
    pub entity_name: String,
    pub finished_at: DateTime<Utc>,
    pub ready_for_deployment: bool,
    pub stage_summary: serde_json::Value,
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record_run(&self, record: &RunAuditRecord) -> Result<(), StoreError>;

    /// Failed runs keep their partial stage output for diagnostics.
    async fn record_failure(
        &self,
        entity_name: &str,
        stage: &str,
        reason: &str,
        partial: serde_json::Value,
    ) -> Result<(), StoreError>;
}

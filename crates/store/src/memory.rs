use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use fingerprint::{ContentItem, EntityFingerprint};

use crate::error::StoreError;
use crate::ports::{AuditSink, ContentStore, FingerprintStore, RunAuditRecord};

/// In-memory adapter backing tests and single-process deployments. Safe
/// under concurrent callers; all maps are keyed for idempotent writes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    fingerprints: DashMap<String, EntityFingerprint>,
    items: DashMap<String, ContentItem>,
    audit: DashMap<String, serde_json::Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn audit_rows(&self) -> Vec<serde_json::Value> {
        self.audit.iter().map(|r| r.value().clone()).collect()
    }

    fn mentions(item: &ContentItem, entity_lower: &str) -> bool {
        item.content.to_lowercase().contains(entity_lower)
            || item
                .title
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(entity_lower))
    }
}

#[async_trait]
impl FingerprintStore for MemoryStore {
    async fn get(&self, primary_name: &str) -> Result<Option<EntityFingerprint>, StoreError> {
        Ok(self
            .fingerprints
            .get(&primary_name.to_lowercase())
            .map(|r| r.value().clone()))
    }

    async fn upsert(&self, mut fp: EntityFingerprint) -> Result<EntityFingerprint, StoreError> {
        fp.last_updated = Utc::now();
        self.fingerprints
            .insert(fp.primary_name.to_lowercase(), fp.clone());
        Ok(fp)
    }

    async fn append_aliases(
        &self,
        primary_name: &str,
        aliases: &[String],
    ) -> Result<EntityFingerprint, StoreError> {
        let key = primary_name.to_lowercase();
        let mut entry = self
            .fingerprints
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound(primary_name.to_string()))?;
        entry.append_aliases(aliases);
        Ok(entry.clone())
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn insert(&self, item: ContentItem) -> Result<(), StoreError> {
        self.items.insert(item.id.clone(), item);
        Ok(())
    }

    async fn scan_window(
        &self,
        entity_name: &str,
        min_confidence: f64,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ContentItem>, StoreError> {
        let entity_lower = entity_name.to_lowercase();
        let mut matched: Vec<ContentItem> = self
            .items
            .iter()
            .filter(|r| {
                let item = r.value();
                item.is_live_sourced()
                    && item.confidence_score >= min_confidence
                    && item.created_at >= since
                    && Self::mentions(item, &entity_lower)
            })
            .map(|r| r.value().clone())
            .collect();

        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched.truncate(limit);
        Ok(matched)
    }

    async fn scan_all(&self, entity_name: &str) -> Result<Vec<ContentItem>, StoreError> {
        let entity_lower = entity_name.to_lowercase();
        let mut matched: Vec<ContentItem> = self
            .items
            .iter()
            .filter(|r| Self::mentions(r.value(), &entity_lower))
            .map(|r| r.value().clone())
            .collect();

        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }
}

#[async_trait]
impl AuditSink for MemoryStore {
    async fn record_run(&self, record: &RunAuditRecord) -> Result<(), StoreError> {
        let key = format!("{}:{}", record.entity_name, record.finished_at.to_rfc3339());
        self.audit.insert(key, serde_json::to_value(record)?);
        Ok(())
    }

    async fn record_failure(
        &self,
        entity_name: &str,
        stage: &str,
        reason: &str,
        partial: serde_json::Value,
    ) -> Result<(), StoreError> {
        self.audit.insert(
            Uuid::new_v4().to_string(),
            serde_json::json!({
                "entity_name": entity_name,
                "stage": stage,
                "reason": reason,
                "partial": partial,
                "failed_at": Utc::now().to_rfc3339(),
            }),
        );
        Ok(())
    }
}

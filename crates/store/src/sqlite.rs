use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::info;
use uuid::Uuid;

use fingerprint::{ContentItem, EntityFingerprint, EntityType, Severity};

use crate::error::StoreError;
use crate::ports::{AuditSink, ContentStore, FingerprintStore, RunAuditRecord};

/// SQLite adapter. Set-valued fingerprint fields are stored as JSON text;
/// uniqueness on the case-folded primary name gives idempotent creation
/// under racing callers.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePool::connect(url).await?;
        Ok(Self { pool })
    }

    /// Single-connection in-memory database, used by tests.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entity_fingerprints (
                name_key TEXT PRIMARY KEY,
                entity_id TEXT NOT NULL,
                primary_name TEXT NOT NULL,
                entity_type TEXT NOT NULL,
                alternate_names TEXT NOT NULL,
                industries TEXT NOT NULL,
                known_associates TEXT NOT NULL,
                controversial_topics TEXT NOT NULL,
                false_positive_blocklist TEXT NOT NULL,
                live_data_only INTEGER NOT NULL,
                created_source TEXT NOT NULL,
                created_at TEXT NOT NULL,
                last_updated TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS content_items (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                title TEXT,
                platform TEXT NOT NULL,
                url TEXT,
                source_type TEXT NOT NULL,
                severity TEXT NOT NULL,
                threat_type TEXT NOT NULL,
                confidence_score REAL NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pipeline_ops_log (
                id TEXT PRIMARY KEY,
                entity_name TEXT NOT NULL,
                operation TEXT NOT NULL,
                success INTEGER NOT NULL,
                detail TEXT NOT NULL,
                finished_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("sqlite schema initialized");
        Ok(())
    }

    fn fingerprint_from_row(row: &SqliteRow) -> Result<EntityFingerprint, StoreError> {
        let entity_type: String = row.try_get("entity_type")?;
        let entity_type = EntityType::parse(&entity_type)
            .ok_or_else(|| StoreError::Storage(format!("bad entity_type '{}'", entity_type)))?;

        let sets = |col: &str| -> Result<Vec<String>, StoreError> {
            let raw: String = row.try_get(col)?;
            Ok(serde_json::from_str(&raw)?)
        };

        Ok(EntityFingerprint {
            entity_id: row.try_get("entity_id")?,
            primary_name: row.try_get("primary_name")?,
            entity_type,
            alternate_names: sets("alternate_names")?,
            industries: sets("industries")?,
            known_associates: sets("known_associates")?,
            controversial_topics: sets("controversial_topics")?,
            false_positive_blocklist: sets("false_positive_blocklist")?,
            live_data_only: row.try_get::<i64, _>("live_data_only")? != 0,
            created_source: row.try_get("created_source")?,
            created_at: row.try_get("created_at")?,
            last_updated: row.try_get("last_updated")?,
        })
    }

    fn item_from_row(row: &SqliteRow) -> Result<ContentItem, StoreError> {
        let severity: String = row.try_get("severity")?;
        let severity = Severity::parse(&severity)
            .ok_or_else(|| StoreError::Storage(format!("bad severity '{}'", severity)))?;

        Ok(ContentItem {
            id: row.try_get("id")?,
            content: row.try_get("content")?,
            title: row.try_get("title")?,
            platform: row.try_get("platform")?,
            url: row.try_get("url")?,
            source_type: row.try_get("source_type")?,
            severity,
            threat_type: row.try_get("threat_type")?,
            confidence_score: row.try_get("confidence_score")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl FingerprintStore for SqliteStore {
    async fn get(&self, primary_name: &str) -> Result<Option<EntityFingerprint>, StoreError> {
        let row = sqlx::query("SELECT * FROM entity_fingerprints WHERE name_key = ?1")
            .bind(primary_name.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::fingerprint_from_row).transpose()
    }

    async fn upsert(&self, mut fp: EntityFingerprint) -> Result<EntityFingerprint, StoreError> {
        fp.last_updated = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO entity_fingerprints (
                name_key, entity_id, primary_name, entity_type,
                alternate_names, industries, known_associates,
                controversial_topics, false_positive_blocklist,
                live_data_only, created_source, created_at, last_updated
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(name_key) DO UPDATE SET
                entity_type = excluded.entity_type,
                alternate_names = excluded.alternate_names,
                industries = excluded.industries,
                known_associates = excluded.known_associates,
                controversial_topics = excluded.controversial_topics,
                false_positive_blocklist = excluded.false_positive_blocklist,
                live_data_only = excluded.live_data_only,
                last_updated = excluded.last_updated
            "#,
        )
        .bind(fp.primary_name.to_lowercase())
        .bind(&fp.entity_id)
        .bind(&fp.primary_name)
        .bind(fp.entity_type.as_str())
        .bind(serde_json::to_string(&fp.alternate_names)?)
        .bind(serde_json::to_string(&fp.industries)?)
        .bind(serde_json::to_string(&fp.known_associates)?)
        .bind(serde_json::to_string(&fp.controversial_topics)?)
        .bind(serde_json::to_string(&fp.false_positive_blocklist)?)
        .bind(fp.live_data_only as i64)
        .bind(&fp.created_source)
        .bind(fp.created_at)
        .bind(fp.last_updated)
        .execute(&self.pool)
        .await?;

        Ok(fp)
    }

    async fn append_aliases(
        &self,
        primary_name: &str,
        aliases: &[String],
    ) -> Result<EntityFingerprint, StoreError> {
        let mut fp = self
            .get(primary_name)
            .await?
            .ok_or_else(|| StoreError::NotFound(primary_name.to_string()))?;
        fp.append_aliases(aliases);
        self.upsert(fp).await
    }
}

#[async_trait]
impl ContentStore for SqliteStore {
    async fn insert(&self, item: ContentItem) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO content_items (
                id, content, title, platform, url, source_type,
                severity, threat_type, confidence_score, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&item.id)
        .bind(&item.content)
        .bind(&item.title)
        .bind(&item.platform)
        .bind(&item.url)
        .bind(&item.source_type)
        .bind(item.severity.as_str())
        .bind(&item.threat_type)
        .bind(item.confidence_score)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn scan_window(
        &self,
        entity_name: &str,
        min_confidence: f64,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ContentItem>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM content_items
            WHERE (instr(lower(content), ?1) > 0
                   OR instr(lower(coalesce(title, '')), ?1) > 0)
              AND source_type LIKE 'live%'
              AND confidence_score >= ?2
              AND created_at >= ?3
            ORDER BY created_at DESC
            LIMIT ?4
            "#,
        )
        .bind(entity_name.to_lowercase())
        .bind(min_confidence)
        .bind(since)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::item_from_row).collect()
    }

    async fn scan_all(&self, entity_name: &str) -> Result<Vec<ContentItem>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM content_items
            WHERE instr(lower(content), ?1) > 0
               OR instr(lower(coalesce(title, '')), ?1) > 0
            ORDER BY created_at DESC
            "#,
        )
        .bind(entity_name.to_lowercase())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::item_from_row).collect()
    }
}

#[async_trait]
impl AuditSink for SqliteStore {
    async fn record_run(&self, record: &RunAuditRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO pipeline_ops_log
                (id, entity_name, operation, success, detail, finished_at)
            VALUES (?1, ?2, 'pipeline_run', ?3, ?4, ?5)
            "#,
        )
        .bind(format!(
            "{}:{}",
            record.entity_name.to_lowercase(),
            record.finished_at.to_rfc3339()
        ))
        .bind(&record.entity_name)
        .bind(record.ready_for_deployment as i64)
        .bind(serde_json::to_string(&record.stage_summary)?)
        .bind(record.finished_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_failure(
        &self,
        entity_name: &str,
        stage: &str,
        reason: &str,
        partial: serde_json::Value,
    ) -> Result<(), StoreError> {
        let detail = serde_json::json!({
            "stage": stage,
            "reason": reason,
            "partial": partial,
        });
        sqlx::query(
            r#"
            INSERT INTO pipeline_ops_log
                (id, entity_name, operation, success, detail, finished_at)
            VALUES (?1, ?2, 'pipeline_failure', 0, ?3, ?4)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(entity_name)
        .bind(serde_json::to_string(&detail)?)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::baseline_fingerprint;
    use chrono::Duration;

    async fn store() -> SqliteStore {
        let store = SqliteStore::in_memory().await.unwrap();
        store.init_schema().await.unwrap();
        store
    }

    #[tokio::test]
    async fn fingerprint_round_trips_with_set_fields() {
        let store = store().await;
        let mut fp = baseline_fingerprint("Acme Corp", "api").unwrap();
        fp.alternate_names = vec!["Acme".to_string(), "Acme Holdings".to_string()];
        fp.industries = vec!["manufacturing".to_string()];
        store.upsert(fp.clone()).await.unwrap();

        let loaded = store.get("ACME CORP").await.unwrap().unwrap();
        assert_eq!(loaded.primary_name, "Acme Corp");
        assert_eq!(loaded.alternate_names, fp.alternate_names);
        assert_eq!(loaded.industries, fp.industries);
        assert_eq!(
            loaded.false_positive_blocklist,
            fp.false_positive_blocklist
        );
        assert!(loaded.live_data_only);
    }

    #[tokio::test]
    async fn upsert_converges_racing_creators() {
        let store = store().await;
        let fp = baseline_fingerprint("Acme Corp", "caller_a").unwrap();
        store.upsert(fp.clone()).await.unwrap();
        store.upsert(fp).await.unwrap();

        let row = sqlx::query("SELECT COUNT(*) AS n FROM entity_fingerprints")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        let n: i64 = row.try_get("n").unwrap();
        assert_eq!(n, 1);
    }

    #[tokio::test]
    async fn scan_window_applies_floor_window_and_cap() {
        let store = store().await;
        for (id, confidence, age_hours) in
            [("a", 0.9, 1i64), ("b", 0.75, 2), ("c", 0.9, 30), ("d", 0.2, 1)]
        {
            store
                .insert(ContentItem {
                    id: id.to_string(),
                    content: format!("Acme Corp item {}", id),
                    title: None,
                    platform: "news".to_string(),
                    url: None,
                    source_type: "live_osint".to_string(),
                    severity: Severity::High,
                    threat_type: "reputation".to_string(),
                    confidence_score: confidence,
                    created_at: Utc::now() - Duration::hours(age_hours),
                })
                .await
                .unwrap();
        }

        let since = Utc::now() - Duration::hours(12);
        let high = store.scan_window("acme corp", 0.8, since, 50).await.unwrap();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].id, "a");

        let medium = store.scan_window("acme corp", 0.6, since, 50).await.unwrap();
        let ids: Vec<&str> = medium.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}

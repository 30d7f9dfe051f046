use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use fingerprint::ContentItem;
use gate::{GateError, LiveDataGate};
use store::{ContentStore, StoreError};

use crate::false_positive::structural_false_positive;
use crate::mode::PrecisionMode;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanFilters {
    pub enable_false_positive_filter: bool,
    pub keywords: Option<Vec<String>>,
}

impl Default for ScanFilters {
    fn default() -> Self {
        Self {
            enable_false_positive_filter: true,
            keywords: None,
        }
    }
}

/// Retrieves candidate content for an entity within a precision mode's
/// envelope and sieves structural false positives. Entity relevance for
/// the final verdict stays with the matcher; this is the first pass.
pub struct PrecisionScanner {
    content: Arc<dyn ContentStore>,
    gate: LiveDataGate,
}

impl PrecisionScanner {
    pub fn new(content: Arc<dyn ContentStore>, gate: LiveDataGate) -> Self {
        Self { content, gate }
    }

    /// An empty result set is a valid, non-error outcome; store errors are
    /// surfaced, not swallowed.
    pub async fn scan(
        &self,
        entity_name: &str,
        mode: PrecisionMode,
        filters: &ScanFilters,
    ) -> Result<Vec<ContentItem>, ScanError> {
        self.gate.check_clear("precision_scan")?;

        let envelope = mode.envelope();
        let since = Utc::now() - Duration::hours(envelope.window_hours);
        let candidates = self
            .content
            .scan_window(entity_name, envelope.min_confidence, since, envelope.result_cap)
            .await?;
        let total = candidates.len();

        let mut kept = Vec::with_capacity(candidates.len());
        let mut excluded = 0usize;
        for item in candidates {
            if let Some(keywords) = &filters.keywords {
                // Same haystack as the store query: title plus body.
                let folded = format!(
                    "{} {}",
                    item.title.as_deref().unwrap_or(""),
                    item.content
                )
                .to_lowercase();
                let hit = keywords
                    .iter()
                    .any(|k| folded.contains(&k.trim().to_lowercase()));
                if !hit {
                    continue;
                }
            }

            if filters.enable_false_positive_filter {
                if let Some(reason) = structural_false_positive(&item.content, entity_name) {
                    debug!(entity = entity_name, item = %item.id, reason = %reason, "item sieved");
                    excluded += 1;
                    continue;
                }
            }
            kept.push(item);
        }

        info!(
            entity = entity_name,
            mode = ?mode,
            retrieved = total,
            kept = kept.len(),
            false_positives = excluded,
            "precision scan complete"
        );
        Ok(kept)
    }
}

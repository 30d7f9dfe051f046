use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Individual,
    Organization,
    Brand,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Individual => "individual",
            EntityType::Organization => "organization",
            EntityType::Brand => "brand",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "individual" => Some(EntityType::Individual),
            "organization" => Some(EntityType::Organization),
            "brand" => Some(EntityType::Brand),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accepted,
    Rejected,
    Pending,
}

/// Identity and matching rules for one tracked entity.
///
/// Never hard-deleted: updates supersede the previous record via upsert on
/// `primary_name` with a `last_updated` bump.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityFingerprint {
    pub entity_id: String,
    pub primary_name: String,
    pub entity_type: EntityType,
    pub alternate_names: Vec<String>,
    pub industries: Vec<String>,
    pub known_associates: Vec<String>,
    pub controversial_topics: Vec<String>,
    pub false_positive_blocklist: Vec<String>,
    pub live_data_only: bool,
    pub created_source: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl EntityFingerprint {
    pub fn new(primary_name: &str, entity_type: EntityType, created_source: &str) -> Result<Self> {
        let primary_name = primary_name.trim();
        if primary_name.is_empty() {
            anyhow::bail!("fingerprint primary_name must be non-empty");
        }

        let now = Utc::now();
        Ok(Self {
            entity_id: crate::entity_id_for(primary_name),
            primary_name: primary_name.to_string(),
            entity_type,
            alternate_names: Vec::new(),
            industries: Vec::new(),
            known_associates: Vec::new(),
            controversial_topics: Vec::new(),
            false_positive_blocklist: Vec::new(),
            live_data_only: true,
            created_source: created_source.to_string(),
            created_at: now,
            last_updated: now,
        })
    }

    /// Merge newly discovered aliases, keeping existing order and skipping
    /// duplicates (case-insensitive).
    pub fn append_aliases(&mut self, aliases: &[String]) {
        for alias in aliases {
            let alias = alias.trim();
            if alias.is_empty() {
                continue;
            }
            let known = self
                .alternate_names
                .iter()
                .any(|a| a.eq_ignore_ascii_case(alias));
            if !known && !alias.eq_ignore_ascii_case(&self.primary_name) {
                self.alternate_names.push(alias.to_string());
            }
        }
        self.last_updated = Utc::now();
    }
}

/// One externally supplied candidate mention. Read-only to this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub content: String,
    pub title: Option<String>,
    pub platform: String,
    pub url: Option<String>,
    pub source_type: String,
    pub severity: Severity,
    pub threat_type: String,
    pub confidence_score: f64,
    pub created_at: DateTime<Utc>,
}

impl ContentItem {
    /// Ingestion collaborators tag live OSINT sources with a `live` prefix
    /// (`live_osint`, `live_rss`, ...). Anything else is treated as replayed
    /// or fixture data.
    pub fn is_live_sourced(&self) -> bool {
        self.source_type.starts_with("live")
    }
}

/// Outcome of scoring one piece of content against a fingerprint.
///
/// `reasoning` is a human-readable trace of contributing factors in
/// evaluation order; it is part of the public result, not a debug log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub entity_name: String,
    pub content_snippet: String,
    pub match_score: f64,
    pub decision: Decision,
    pub false_positive_detected: bool,
    pub reasoning: Vec<String>,
}

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::run::VerifiedItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    /// Urgency is driven by how many verified items share the threat type.
    pub fn from_count(count: usize) -> Self {
        if count > 3 {
            Urgency::High
        } else if count > 1 {
            Urgency::Medium
        } else {
            Urgency::Low
        }
    }
}

/// One counter-narrative strategy per distinct threat type present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    pub id: String,
    pub threat_type: String,
    pub recommended_approach: String,
    pub suggested_tone: String,
    pub urgency: Urgency,
    pub target_platforms: Vec<String>,
    pub content_themes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybookEntry {
    pub approach: String,
    pub tone: String,
    pub theme_additions: Vec<String>,
}

/// Threat-type lookup table for strategy generation. Kept as explicit,
/// auditable configuration so new threat types can be added without
/// touching matcher logic; unknown types fall back to the default entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyPlaybook {
    pub entries: HashMap<String, PlaybookEntry>,
    pub default_entry: PlaybookEntry,
    pub base_themes: Vec<String>,
}

impl StrategyPlaybook {
    pub fn lookup(&self, threat_type: &str) -> &PlaybookEntry {
        self.entries.get(threat_type).unwrap_or(&self.default_entry)
    }

    /// Fixed base themes concatenated with the per-type additions.
    pub fn themes_for(&self, threat_type: &str) -> Vec<String> {
        let mut themes = self.base_themes.clone();
        themes.extend(self.lookup(threat_type).theme_additions.iter().cloned());
        themes
    }
}

impl Default for StrategyPlaybook {
    fn default() -> Self {
        let entry = |approach: &str, tone: &str, additions: &[&str]| PlaybookEntry {
            approach: approach.to_string(),
            tone: tone.to_string(),
            theme_additions: additions.iter().map(|s| s.to_string()).collect(),
        };

        let mut entries = HashMap::new();
        entries.insert(
            "reputation".to_string(),
            entry(
                "Proactive reputation management",
                "professional",
                &[
                    "Professional achievements",
                    "Client testimonials",
                    "Industry recognition",
                ],
            ),
        );
        entries.insert(
            "legal".to_string(),
            entry(
                "Legal compliance and transparency",
                "formal",
                &["Compliance measures", "Legal transparency", "Due process"],
            ),
        );
        entries.insert(
            "social".to_string(),
            entry(
                "Community engagement and dialogue",
                "empathetic",
                &[
                    "Community engagement",
                    "Social responsibility",
                    "Dialogue and listening",
                ],
            ),
        );
        entries.insert(
            "media".to_string(),
            entry(
                "Strategic media relations",
                "confident",
                &[
                    "Factual clarification",
                    "Context provision",
                    "Expert perspectives",
                ],
            ),
        );

        Self {
            entries,
            default_entry: entry("Balanced response strategy", "balanced", &[]),
            base_themes: vec![
                "Transparency and accountability".to_string(),
                "Commitment to improvement".to_string(),
                "Value to community".to_string(),
            ],
        }
    }
}

/// Group verified items by threat type and emit one strategy per group.
/// Zero verified items is a valid input producing zero strategies.
pub fn generate_strategies(
    verified: &[VerifiedItem],
    playbook: &StrategyPlaybook,
) -> Vec<Strategy> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut platforms: BTreeSet<&str> = BTreeSet::new();
    for v in verified {
        *counts.entry(v.item.threat_type.as_str()).or_default() += 1;
        platforms.insert(v.item.platform.as_str());
    }
    let target_platforms: Vec<String> = platforms.iter().map(|p| p.to_string()).collect();

    counts
        .into_iter()
        .map(|(threat_type, count)| {
            let entry = playbook.lookup(threat_type);
            Strategy {
                id: Uuid::new_v4().to_string(),
                threat_type: threat_type.to_string(),
                recommended_approach: entry.approach.clone(),
                suggested_tone: entry.tone.clone(),
                urgency: Urgency::from_count(count),
                target_platforms: target_platforms.clone(),
                content_themes: playbook.themes_for(threat_type),
            }
        })
        .collect()
}

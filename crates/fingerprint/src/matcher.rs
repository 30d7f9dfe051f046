use serde::{Deserialize, Serialize};

use crate::schema::{Decision, EntityFingerprint, MatchResult};

/// Score at or above which a match is accepted without review.
pub const ACCEPT_THRESHOLD: f64 = 0.7;
/// Score below which a match is rejected outright.
pub const REJECT_THRESHOLD: f64 = 0.4;

const SNIPPET_CHARS: usize = 200;

/// Weighting regime for the primary-name signal.
///
/// `Standalone` is the entity-existence check: the name match is the whole
/// signal, so it carries 0.6. `Combined` is precision-scan verification:
/// query construction has already established relevance, so the name match
/// carries 0.4 and alias/context signals fill in the rest. Call sites pick
/// one regime and stick with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchRegime {
    Standalone,
    Combined,
}

struct Weights {
    primary: f64,
    alias: f64,
    context: f64,
    category_cap: f64,
}

impl MatchRegime {
    fn weights(self) -> Weights {
        match self {
            MatchRegime::Standalone => Weights {
                primary: 0.6,
                alias: 0.3,
                context: 0.1,
                category_cap: 0.2,
            },
            MatchRegime::Combined => Weights {
                primary: 0.4,
                alias: 0.2,
                context: 0.05,
                category_cap: 0.15,
            },
        }
    }
}

/// Score content against an entity fingerprint. Pure and deterministic:
/// identical inputs produce identical results, including reasoning order.
pub fn score(
    content: &str,
    title: &str,
    fp: &EntityFingerprint,
    regime: MatchRegime,
) -> MatchResult {
    let folded = format!("{} {}", title, content).to_lowercase();
    let snippet: String = content.chars().take(SNIPPET_CHARS).collect();
    let weights = regime.weights();

    // Exclusion always runs first and always wins, regardless of any
    // positive signal present.
    for term in &fp.false_positive_blocklist {
        let term = term.trim().to_lowercase();
        if !term.is_empty() && folded.contains(&term) {
            return MatchResult {
                entity_name: fp.primary_name.clone(),
                content_snippet: snippet,
                match_score: 0.0,
                decision: Decision::Rejected,
                false_positive_detected: true,
                reasoning: vec![format!("blocklist term '{}' present", term)],
            };
        }
    }

    let mut total = 0.0;
    let mut reasoning = Vec::new();

    if folded.contains(&fp.primary_name.to_lowercase()) {
        total += weights.primary;
        reasoning.push("primary name matched".to_string());
    }

    // Aliases count at most once: first match wins, stop scanning.
    for alias in &fp.alternate_names {
        let alias_lower = alias.trim().to_lowercase();
        if !alias_lower.is_empty() && folded.contains(&alias_lower) {
            total += weights.alias;
            reasoning.push(format!("alias '{}' matched", alias.trim()));
            break;
        }
    }

    total += score_category(
        &folded,
        &fp.industries,
        &weights,
        "industry",
        &mut reasoning,
    );
    total += score_category(
        &folded,
        &fp.known_associates,
        &weights,
        "known associate",
        &mut reasoning,
    );
    total += score_category(
        &folded,
        &fp.controversial_topics,
        &weights,
        "controversial topic",
        &mut reasoning,
    );

    let match_score = total.min(1.0);
    let decision = if match_score >= ACCEPT_THRESHOLD {
        Decision::Accepted
    } else if match_score < REJECT_THRESHOLD {
        Decision::Rejected
    } else {
        Decision::Pending
    };

    MatchResult {
        entity_name: fp.primary_name.clone(),
        content_snippet: snippet,
        match_score,
        decision,
        false_positive_detected: false,
        reasoning,
    }
}

/// Context signals are low-weight and capped per category so that context
/// alone can never cross the acceptance threshold.
fn score_category(
    folded: &str,
    terms: &[String],
    weights: &Weights,
    label: &str,
    reasoning: &mut Vec<String>,
) -> f64 {
    let mut subtotal = 0.0;
    for term in terms {
        if subtotal + weights.context > weights.category_cap {
            break;
        }
        let term_lower = term.trim().to_lowercase();
        if !term_lower.is_empty() && folded.contains(&term_lower) {
            subtotal += weights.context;
            reasoning.push(format!("{} '{}' present", label, term.trim()));
        }
    }
    subtotal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EntityType;

    fn fixture_fp() -> EntityFingerprint {
        let mut fp = EntityFingerprint::new("Acme Corp", EntityType::Organization, "api").unwrap();
        fp.alternate_names = vec!["Acme".to_string(), "ACME Holdings".to_string()];
        fp.industries = vec!["manufacturing".to_string(), "logistics".to_string()];
        fp.known_associates = vec!["Jane Doe".to_string()];
        fp.controversial_topics = vec!["lawsuit".to_string(), "recall".to_string()];
        fp.false_positive_blocklist = vec!["acme cartoons".to_string()];
        fp
    }

    #[test]
    fn blocklist_always_wins() {
        let fp = fixture_fp();
        let result = score(
            "Acme Corp and acme cartoons announce a lawsuit settlement",
            "Acme Corp news",
            &fp,
            MatchRegime::Standalone,
        );
        assert_eq!(result.decision, Decision::Rejected);
        assert_eq!(result.match_score, 0.0);
        assert!(result.false_positive_detected);
        assert_eq!(
            result.reasoning,
            vec!["blocklist term 'acme cartoons' present".to_string()]
        );
    }

    #[test]
    fn primary_name_alone_scores_standalone_weight() {
        let fp = fixture_fp();
        let result = score("Acme Corp held its annual meeting", "", &fp, MatchRegime::Standalone);
        assert!(result.match_score >= 0.6);
        assert_eq!(result.reasoning[0], "primary name matched");
    }

    #[test]
    fn combined_regime_uses_lower_primary_weight() {
        let fp = fixture_fp();
        let result = score("Acme Corp held its annual meeting", "", &fp, MatchRegime::Combined);
        // Primary 0.4 plus alias 0.2: "Acme" is a substring of the text too.
        assert!((result.match_score - 0.6).abs() < 1e-9);
        assert_eq!(result.decision, Decision::Pending);
    }

    #[test]
    fn alias_counted_at_most_once() {
        let fp = fixture_fp();
        let single = score(
            "Report mentions Acme in passing",
            "",
            &fp,
            MatchRegime::Combined,
        );
        let double = score(
            "Report mentions Acme and ACME Holdings",
            "",
            &fp,
            MatchRegime::Combined,
        );
        assert_eq!(single.match_score, double.match_score);
        assert_eq!(
            double
                .reasoning
                .iter()
                .filter(|r| r.starts_with("alias"))
                .count(),
            1
        );
    }

    #[test]
    fn context_alone_cannot_reach_acceptance() {
        let fp = fixture_fp();
        let result = score(
            "manufacturing logistics Jane Doe lawsuit recall",
            "",
            &fp,
            MatchRegime::Standalone,
        );
        assert!(result.match_score < ACCEPT_THRESHOLD);
        assert_ne!(result.decision, Decision::Accepted);
    }

    #[test]
    fn full_signal_is_accepted() {
        let fp = fixture_fp();
        let result = score(
            "Acme Corp faces a lawsuit over its logistics arm",
            "Jane Doe responds",
            &fp,
            MatchRegime::Combined,
        );
        assert_eq!(result.decision, Decision::Accepted);
        assert!(result.match_score >= ACCEPT_THRESHOLD);
    }

    #[test]
    fn scoring_is_idempotent_including_reasoning_order() {
        let fp = fixture_fp();
        let content = "Acme Corp faces a lawsuit over its manufacturing recall";
        let a = score(content, "title", &fp, MatchRegime::Combined);
        let b = score(content, "title", &fp, MatchRegime::Combined);
        assert_eq!(a, b);
    }

    #[test]
    fn unrelated_content_is_rejected() {
        let fp = fixture_fp();
        let result = score(
            "Local bakery wins regional award",
            "",
            &fp,
            MatchRegime::Combined,
        );
        assert_eq!(result.decision, Decision::Rejected);
        assert_eq!(result.match_score, 0.0);
        assert!(result.reasoning.is_empty());
    }

    #[test]
    fn snippet_is_bounded() {
        let fp = fixture_fp();
        let long = format!("Acme Corp {}", "x".repeat(500));
        let result = score(&long, "", &fp, MatchRegime::Standalone);
        assert_eq!(result.content_snippet.chars().count(), 200);
    }
}

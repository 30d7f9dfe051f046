use fingerprint::{score, Decision, EntityFingerprint, MatchRegime, MatchResult, PrecisionStats};
use gate::LiveDataGate;
use scanner::{PrecisionMode, PrecisionScanner, ScanFilters};

use crate::orchestrator::PipelineError;
use crate::run::KeywordCiaResult;

/// Keyword-scoped precision results: one entry per keyword, each with its
/// own threat slice, match trace and tuning recommendations.
pub async fn keyword_results(
    scanner: &PrecisionScanner,
    gate: &LiveDataGate,
    fp: &EntityFingerprint,
    keywords: &[String],
    mode: PrecisionMode,
) -> Result<Vec<KeywordCiaResult>, PipelineError> {
    let mut results = Vec::with_capacity(keywords.len());

    for keyword in keywords {
        let filters = ScanFilters {
            enable_false_positive_filter: true,
            keywords: Some(vec![keyword.clone()]),
        };
        let threats = scanner.scan(&fp.primary_name, mode, &filters).await?;

        let entity_matches: Vec<MatchResult> = threats
            .iter()
            .map(|item| {
                score(
                    &item.content,
                    item.title.as_deref().unwrap_or(""),
                    fp,
                    MatchRegime::Combined,
                )
            })
            .collect();

        let verified: Vec<&MatchResult> = entity_matches
            .iter()
            .filter(|m| !m.false_positive_detected && m.decision != Decision::Rejected)
            .collect();
        let precision_score = if verified.is_empty() {
            0.0
        } else {
            verified.iter().map(|m| m.match_score).sum::<f64>() / verified.len() as f64
        };

        let stats = PrecisionStats::from_results(&entity_matches);
        results.push(KeywordCiaResult {
            keyword: keyword.clone(),
            live_validated: gate.validate(keyword, "keyword_scan"),
            recommendations: recommendations(fp, &stats),
            threats,
            entity_matches,
            precision_score,
        });
    }

    Ok(results)
}

/// Fingerprint-tuning advice derived from the fingerprint's shape and the
/// batch statistics.
fn recommendations(fp: &EntityFingerprint, stats: &PrecisionStats) -> Vec<String> {
    let mut recs = Vec::new();
    if fp.alternate_names.len() < 3 {
        recs.push("Add more aliases and variations to improve recall".to_string());
    }
    if fp.industries.is_empty() {
        recs.push("Add industry context to help eliminate false positives".to_string());
    }
    if stats.total_scanned > 0 && stats.avg_precision_score < 0.8 {
        recs.push("Expand the false-positive blocklist".to_string());
    }
    recs
}

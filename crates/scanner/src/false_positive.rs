use gate::SYNTHETIC_MARKERS;

/// Metadata-style tokens. The entity name appearing immediately after one
/// of these means the name is being used as a data label, not a genuine
/// mention.
pub const METADATA_TOKENS: &[&str] = &[
    "username:",
    "handle:",
    "tag:",
    "label:",
    "variable:",
    "function:",
    "class:",
    "id:",
];

/// Structural false-positive check, evaluated per item during scanning and
/// independent of any fingerprint. Cheaper and earlier than the matcher's
/// blocklist: a flagged item never reaches scoring.
///
/// Returns the exclusion reason, or `None` when the item is clean.
pub fn structural_false_positive(content: &str, entity_name: &str) -> Option<String> {
    let folded = content.to_lowercase();

    for marker in SYNTHETIC_MARKERS {
        if folded.contains(marker) {
            return Some(format!("placeholder marker '{}' in content", marker));
        }
    }

    let entity_lower = entity_name.trim().to_lowercase();
    if entity_lower.is_empty() {
        return None;
    }
    for token in METADATA_TOKENS {
        let mut search_from = 0;
        while let Some(pos) = folded[search_from..].find(token) {
            let abs = search_from + pos;
            let at_word_start = abs == 0
                || folded[..abs]
                    .chars()
                    .next_back()
                    .is_some_and(|c| !c.is_alphanumeric());
            let after = &folded[abs + token.len()..];
            if at_word_start && after.trim_start().starts_with(&entity_lower) {
                return Some(format!("entity name used as '{}' data label", token));
            }
            search_from = abs + token.len();
        }
    }

    None
}

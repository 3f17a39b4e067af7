//! Closed-set aspect tagging for policy comments.
//!
//! Each aspect has a fixed keyword list; an aspect is assigned when the
//! first of its keywords appears in the text. Aspects are independent; a
//! comment may carry zero or many.

/// The closed aspect set with its trigger keywords.
pub const ASPECT_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "clarity",
        &["clear", "unclear", "confusing", "ambiguous", "vague", "specific"],
    ),
    (
        "timelines",
        &["time", "deadline", "schedule", "delay", "urgent", "timeline"],
    ),
    (
        "compliance_cost",
        &["cost", "expensive", "affordable", "budget", "financial", "burden"],
    ),
    (
        "scope",
        &["scope", "coverage", "include", "exclude", "broad", "narrow"],
    ),
    (
        "definitions",
        &["define", "definition", "meaning", "terminology"],
    ),
    (
        "enforcement",
        &["enforce", "penalty", "violation", "compliance", "monitoring"],
    ),
    (
        "it_data",
        &["digital", "online", "data", "technology", "system", "portal"],
    ),
    (
        "forms_process",
        &["form", "procedure", "process", "paperwork", "documentation"],
    ),
    (
        "legal_consistency",
        &["law", "legal", "constitution", "conflict", "consistent"],
    ),
    (
        "msme_impact",
        &["small", "medium", "startup", "msme", "business"],
    ),
];

/// Extract aspect tags from text, first keyword match wins per aspect.
///
/// Tags come back in table order, so output is deterministic.
pub fn extract(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    ASPECT_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(aspect, _)| aspect.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_aspect() {
        let aspects = extract("The deadline is far too aggressive.");
        assert_eq!(aspects, vec!["timelines"]);
    }

    #[test]
    fn multiple_aspects_in_table_order() {
        let aspects = extract("The vague wording will raise costs for every startup.");
        assert_eq!(aspects, vec!["clarity", "compliance_cost", "msme_impact"]);
    }

    #[test]
    fn no_aspects() {
        assert!(extract("Excellent initiative!").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(extract("The PORTAL keeps failing"), vec!["it_data"]);
    }
}

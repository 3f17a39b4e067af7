//! Clause reference extraction and normalisation.
//!
//! Comments cite draft clauses in many surface forms: "Section 8(2)(b)",
//! "rule 5", "clause 4.2", bare "8.2.1", "(2)(b)". All of them normalise to
//! a bare numbering token ("8(2)(b)", "5", "4.2", ...) so a citation in a
//! comment can be compared against a clause's `reference` with plain string
//! equality.

use std::sync::LazyLock;

use regex::Regex;

/// Keyword-prefixed citations: "Section 8(2)(b)", "rule 5", "Paragraph 4.2".
static KEYWORD_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:section|rule|chapter|part|clause|article|paragraph|para)\s+(\d+(?:\.\d+)*(?:\(\d+\))*(?:\([a-z]\))*)",
    )
    .expect("keyword reference pattern")
});

/// Bare parenthesised citations: "5(3)", "8(2)(b)", "8(b)".
static PAREN_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+(?:\((?:\d+|[a-z])\))+").expect("paren reference pattern"));

/// Dotted citations: "8.2", "8.2.1".
static DOTTED_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\.\d+(?:\.\d+)*\b").expect("dotted reference pattern"));

/// Paired sub-clause citations with the number also parenthesised: "(2)(b)".
static PAIR_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d+)\)\(([a-z])\)").expect("pair reference pattern"));

/// Normalise a clause citation to its bare numbering token.
///
/// Strips a leading keyword ("Section", "rule", ...), lowercases, removes
/// internal whitespace so "5 (3)" equals "5(3)", and drops a trailing
/// list-style dot ("4." becomes "4").
pub fn normalize_reference(raw: &str) -> String {
    let mut s = raw.trim().to_ascii_lowercase();

    // Longest keywords first so "paragraph" is not half-stripped by "para".
    for kw in [
        "paragraph", "section", "chapter", "article", "clause", "para", "part", "rule",
    ] {
        if let Some(rest) = s.strip_prefix(kw) {
            s = rest.trim_start().to_string();
            break;
        }
    }

    s.retain(|c| !c.is_whitespace());
    s.trim_end_matches('.').to_string()
}

/// Extract all clause citations from free text, normalised and deduplicated,
/// in order of first appearance.
pub fn extract_references(text: &str) -> Vec<String> {
    fn push(out: &mut Vec<String>, reference: String) {
        if !reference.is_empty() && !out.contains(&reference) {
            out.push(reference);
        }
    }

    let mut out = Vec::new();
    for cap in KEYWORD_REF.captures_iter(text) {
        push(&mut out, normalize_reference(&cap[1]));
    }
    for m in PAREN_REF.find_iter(text) {
        push(&mut out, normalize_reference(m.as_str()));
    }
    for m in DOTTED_REF.find_iter(text) {
        push(&mut out, normalize_reference(m.as_str()));
    }
    for cap in PAIR_REF.captures_iter(text) {
        // Skip pairs that are the tail of a larger citation like "8(2)(b)".
        let start = cap.get(0).map(|m| m.start()).unwrap_or(0);
        if start > 0 && text.as_bytes()[start - 1].is_ascii_digit() {
            continue;
        }
        push(&mut out, format!("{}({})", &cap[1], &cap[2]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_exact_values() {
        assert_eq!(normalize_reference("Section 5(3)"), "5(3)");
        assert_eq!(normalize_reference("rule 8"), "8");
        assert_eq!(normalize_reference("5 (3)"), "5(3)");
        assert_eq!(normalize_reference("4."), "4");
        assert_eq!(normalize_reference("Clause 4.2"), "4.2");
        assert_eq!(normalize_reference("  8(2)(B)  "), "8(2)(b)");
    }

    #[test]
    fn normalize_empty() {
        assert_eq!(normalize_reference(""), "");
        assert_eq!(normalize_reference("   "), "");
    }

    #[test]
    fn keyword_citations() {
        let refs = extract_references("As per Section 8(2)(b), and also see rule 5.");
        assert_eq!(refs, vec!["8(2)(b)", "5"]);
    }

    #[test]
    fn bare_paren_citations() {
        let refs = extract_references("The limit in 5(3) is too strict, as is 8(b).");
        assert_eq!(refs, vec!["5(3)", "8(b)"]);
    }

    #[test]
    fn dotted_citations() {
        let refs = extract_references("Point 8.2.1 contradicts 8.2");
        assert_eq!(refs, vec!["8.2.1", "8.2"]);
    }

    #[test]
    fn paired_sub_clause() {
        let refs = extract_references("the carve-out in (2)(b) should go");
        assert_eq!(refs, vec!["2(b)"]);
    }

    #[test]
    fn duplicates_collapse() {
        let refs = extract_references("Section 5(3) conflicts with 5(3).");
        assert_eq!(refs, vec!["5(3)"]);
    }

    #[test]
    fn plain_numbers_are_not_citations() {
        // "15 working days" must not produce a reference.
        let refs = extract_references("processing within 15 working days is too long");
        assert!(refs.is_empty(), "got {refs:?}");
    }

    #[test]
    fn no_citations_in_prose() {
        assert!(extract_references("Excellent initiative!").is_empty());
        assert!(extract_references("").is_empty());
    }
}

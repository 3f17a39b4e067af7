//! Draft construction: from pre-split clause texts or from raw document text.
//!
//! Raw drafts are split on numbered lines ("4.", "(2)", "3)"). When a
//! document carries no usable numbering the splitter falls back to
//! paragraphs, and finally to one clause covering the whole document, so a
//! non-empty draft always yields at least one linking target.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::clause_ref::normalize_reference;
use crate::types::{Clause, Draft};

/// Lines that open a new clause: "4. ...", "4) ...", "(2) ...", "4.2 ...".
static CLAUSE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(\d+(?:\.\d+)*)[.)]|\((\d+)\))\s+\S").expect("clause line pattern")
});

const MIN_PARAGRAPH_LEN: usize = 50;
const MAX_CLAUSE_LEN: usize = 2000;

impl Draft {
    /// Build a draft from clause texts that are already split.
    ///
    /// Each clause's reference is taken from its leading numbering token
    /// when present, otherwise the 1-based position is used.
    pub fn from_clause_texts(
        id: impl Into<String>,
        title: impl Into<String>,
        clause_texts: Vec<String>,
    ) -> Self {
        let clauses = clause_texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| {
                let reference = leading_reference(&text)
                    .unwrap_or_else(|| (index + 1).to_string());
                Clause {
                    reference,
                    index,
                    text: truncate(&text),
                }
            })
            .collect();
        Self {
            id: id.into(),
            title: title.into(),
            clauses,
        }
    }

    /// Build a draft by extracting clauses from raw document text.
    pub fn parse(id: impl Into<String>, title: impl Into<String>, content: &str) -> Self {
        let content = content.trim();
        let mut clauses = split_numbered(content);

        if clauses.is_empty() {
            clauses = split_paragraphs(content);
        }
        if clauses.is_empty() && !content.is_empty() {
            clauses.push(Clause {
                reference: "full-document".to_string(),
                index: 0,
                text: truncate(content),
            });
        }

        let draft = Self {
            id: id.into(),
            title: title.into(),
            clauses,
        };
        debug!(
            draft_id = %draft.id,
            clauses = draft.clauses.len(),
            "extracted clauses from draft"
        );
        draft
    }

    pub fn clause_by_reference(&self, reference: &str) -> Option<&Clause> {
        self.clauses.iter().find(|c| c.reference == reference)
    }
}

/// Split on numbered lines; continuation lines attach to the open clause.
///
/// Parenthesised sub-clause lines ("(1)", "(2)") are qualified with the
/// enclosing top-level number ("4(1)") so every clause reference in a draft
/// is unique.
fn split_numbered(content: &str) -> Vec<Clause> {
    let mut clauses: Vec<Clause> = Vec::new();
    let mut current: Option<(String, String)> = None;
    let mut parent: Option<String> = None;

    for line in content.lines() {
        if let Some(cap) = CLAUSE_LINE.captures(line) {
            if let Some((reference, text)) = current.take() {
                push_clause(&mut clauses, reference, text);
            }
            let reference = match cap.get(1) {
                Some(top) => {
                    let reference = normalize_reference(top.as_str());
                    parent = Some(reference.clone());
                    reference
                }
                None => {
                    let sub = cap.get(2).map(|m| m.as_str()).unwrap_or_default();
                    match &parent {
                        Some(top) => format!("{top}({sub})"),
                        None => sub.to_string(),
                    }
                }
            };
            current = Some((reference, line.trim().to_string()));
        } else if let Some((_, text)) = current.as_mut() {
            if !line.trim().is_empty() {
                text.push(' ');
                text.push_str(line.trim());
            }
        }
    }
    if let Some((reference, text)) = current {
        push_clause(&mut clauses, reference, text);
    }
    clauses
}

fn split_paragraphs(content: &str) -> Vec<Clause> {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| p.len() >= MIN_PARAGRAPH_LEN)
        .enumerate()
        .map(|(index, text)| Clause {
            reference: format!("para-{}", index + 1),
            index,
            text: truncate(text),
        })
        .collect()
}

fn push_clause(clauses: &mut Vec<Clause>, reference: String, text: String) {
    let index = clauses.len();
    clauses.push(Clause {
        reference,
        index,
        text: truncate(&text),
    });
}

fn leading_reference(text: &str) -> Option<String> {
    CLAUSE_LINE.captures(text.trim()).map(|cap| {
        let token = cap
            .get(1)
            .or_else(|| cap.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        normalize_reference(token)
    })
}

fn truncate(text: &str) -> String {
    if text.len() <= MAX_CLAUSE_LEN {
        return text.to_string();
    }
    // Cut on a char boundary at or below the cap.
    let mut end = MAX_CLAUSE_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

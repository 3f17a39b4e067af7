//! Sentiment/stance classification boundary and the deterministic fallback.
//!
//! The pluggable model sits behind [`SentimentModel`]; [`LexiconClassifier`]
//! is the rule-based implementation that also serves as the recovery path
//! when the model fails or times out. It scores positive/negative keyword
//! counts with extra weight for word-boundary matches, maps the margin to a
//! confidence, and derives stance from explicit support/oppose keywords
//! before falling back to the sentiment polarity.

use manthan_core::types::{Sentiment, Stance};

use crate::aspects;

/// Raw output of a classification function, before the confidence gate.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub sentiment: Sentiment,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    pub stance: Stance,
    pub aspects: Vec<String>,
}

/// A pluggable classification function. May fail; callers recover via
/// [`LexiconClassifier`].
pub trait SentimentModel: Send + Sync {
    fn predict(&self, text: &str) -> anyhow::Result<Prediction>;
}

const POSITIVE_WORDS: &[&str] = &[
    "support",
    "good",
    "excellent",
    "appreciate",
    "reasonable",
    "efficient",
    "helpful",
    "commendable",
    "beneficial",
    "welcome",
    "agree",
    "favor",
    "approve",
    "endorse",
    "praise",
    "outstanding",
    "effective",
    "valuable",
];

const NEGATIVE_WORDS: &[&str] = &[
    "problematic",
    "harsh",
    "insufficient",
    "oppose",
    "concerned",
    "barriers",
    "costs",
    "prohibitive",
    "vague",
    "disagree",
    "reject",
    "inadequate",
    "flawed",
    "unrealistic",
    "burden",
    "difficult",
    "too long",
    "too slow",
    "too strict",
    "harmful",
];

const SUPPORT_WORDS: &[&str] = &[
    "support", "agree", "approve", "endorse", "welcome", "appreciate", "favor",
];

const OPPOSE_WORDS: &[&str] = &[
    "oppose", "disagree", "reject", "against", "object", "protest", "withdraw",
];

/// Deterministic keyword-count classifier over a fixed lexicon.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconClassifier;

impl LexiconClassifier {
    pub fn classify(&self, text: &str) -> Prediction {
        let lower = text.to_lowercase();

        let positive = score(&lower, POSITIVE_WORDS);
        let negative = score(&lower, NEGATIVE_WORDS);

        let (sentiment, confidence) = if positive > negative {
            (Sentiment::Positive, margin_confidence(positive - negative))
        } else if negative > positive {
            (Sentiment::Negative, margin_confidence(negative - positive))
        } else {
            (Sentiment::Neutral, 0.5)
        };

        Prediction {
            sentiment,
            confidence,
            stance: stance_of(&lower, sentiment),
            aspects: aspects::extract(text),
        }
    }
}

impl SentimentModel for LexiconClassifier {
    fn predict(&self, text: &str) -> anyhow::Result<Prediction> {
        Ok(self.classify(text))
    }
}

/// Count lexicon hits; matches flanked by word boundaries score double.
fn score(lower: &str, words: &[&str]) -> u32 {
    let mut total = 0;
    for word in words {
        if lower.contains(word) {
            let bounded = format!(" {word} ");
            if lower.contains(&bounded) || lower.starts_with(word) || lower.ends_with(word) {
                total += 2;
            } else {
                total += 1;
            }
        }
    }
    total
}

/// Map the keyword margin onto `[0.6, 0.95]`.
fn margin_confidence(margin: u32) -> f32 {
    (0.6 + margin as f32 * 0.05).min(0.95)
}

/// Explicit support/oppose keywords override the sentiment-derived stance.
fn stance_of(lower: &str, sentiment: Sentiment) -> Stance {
    let support = SUPPORT_WORDS.iter().filter(|w| lower.contains(*w)).count();
    let oppose = OPPOSE_WORDS.iter().filter(|w| lower.contains(*w)).count();

    if support > oppose {
        Stance::Supports
    } else if oppose > support {
        Stance::Opposes
    } else {
        match sentiment {
            Sentiment::Positive => Stance::Supports,
            Sentiment::Negative => Stance::Opposes,
            Sentiment::Neutral => Stance::Neutral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_comment() {
        let p = LexiconClassifier.classify("I support this excellent initiative.");
        assert_eq!(p.sentiment, Sentiment::Positive);
        assert_eq!(p.stance, Stance::Supports);
        assert!(p.confidence > 0.6);
    }

    #[test]
    fn negative_comment() {
        let p = LexiconClassifier.classify("The 15-day processing timeline is too long");
        assert_eq!(p.sentiment, Sentiment::Negative);
        assert_eq!(p.stance, Stance::Opposes);
    }

    #[test]
    fn neutral_when_no_lexicon_hits() {
        let p = LexiconClassifier.classify("The rules mention forms in chapter two.");
        assert_eq!(p.sentiment, Sentiment::Neutral);
        assert_eq!(p.stance, Stance::Neutral);
        assert_eq!(p.confidence, 0.5);
    }

    #[test]
    fn empty_text_is_valid_neutral() {
        let p = LexiconClassifier.classify("");
        assert_eq!(p.sentiment, Sentiment::Neutral);
        assert_eq!(p.confidence, 0.5);
        assert!(p.aspects.is_empty());
    }

    #[test]
    fn stance_keywords_override_sentiment() {
        // Positive sentiment words but an explicit objection.
        let p = LexiconClassifier.classify("Good intent, but we object and protest this rule.");
        assert_eq!(p.stance, Stance::Opposes);
    }

    #[test]
    fn confidence_grows_with_margin_and_caps() {
        let weak = LexiconClassifier.classify("This is helpful.");
        let strong = LexiconClassifier
            .classify("Excellent, helpful, beneficial, effective, valuable and reasonable.");
        assert!(strong.confidence > weak.confidence);
        assert!(strong.confidence <= 0.95);
    }

    #[test]
    fn deterministic() {
        let a = LexiconClassifier.classify("The burden is prohibitive.");
        let b = LexiconClassifier.classify("The burden is prohibitive.");
        assert_eq!(a, b);
    }

    #[test]
    fn aspects_ride_along() {
        let p = LexiconClassifier.classify("The vague deadline imposes a heavy burden.");
        assert!(p.aspects.contains(&"clarity".to_string()));
        assert!(p.aspects.contains(&"timelines".to_string()));
    }
}

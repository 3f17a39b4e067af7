//! Classifier routing: model first, deterministic lexicon on failure.
//!
//! The model call runs on the blocking pool under a hard timeout. Any
//! failure path (model error, panic, timeout) degrades to the
//! [`LexiconClassifier`] so a classification is always produced; the outcome
//! records which method answered. A confidence below the configured
//! threshold flags the result for human review without changing it.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use manthan_ai::{LexiconClassifier, Prediction, SentimentModel};
use manthan_core::types::{Classification, Method};

pub struct ClassifierRouter {
    model: Option<Arc<dyn SentimentModel>>,
    fallback: LexiconClassifier,
    timeout: Duration,
    confidence_threshold: f32,
}

impl ClassifierRouter {
    pub fn new(
        model: Option<Arc<dyn SentimentModel>>,
        timeout: Duration,
        confidence_threshold: f32,
    ) -> Self {
        Self {
            model,
            fallback: LexiconClassifier,
            timeout,
            confidence_threshold,
        }
    }

    /// Classify one normalized comment text.
    pub async fn classify(&self, text: &str) -> Classification {
        if let Some(model) = &self.model {
            match self.predict_with_model(model, text).await {
                Ok(prediction) => return self.gate(prediction, Method::Model),
                Err(err) => {
                    warn!(error = %err, "classifier model failed, using lexicon fallback");
                }
            }
        }
        self.gate(self.fallback.classify(text), Method::Lexicon)
    }

    async fn predict_with_model(
        &self,
        model: &Arc<dyn SentimentModel>,
        text: &str,
    ) -> anyhow::Result<Prediction> {
        let model = Arc::clone(model);
        let text = text.to_string();
        let handle = tokio::task::spawn_blocking(move || model.predict(&text));
        match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(anyhow::anyhow!("classifier task failed: {join_err}")),
            Err(_) => Err(anyhow::anyhow!(
                "classifier timed out after {:?}",
                self.timeout
            )),
        }
    }

    fn gate(&self, prediction: Prediction, method: Method) -> Classification {
        let needs_review = prediction.confidence < self.confidence_threshold;
        Classification {
            sentiment: prediction.sentiment,
            confidence: prediction.confidence,
            stance: prediction.stance,
            aspects: prediction.aspects,
            method,
            needs_review,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manthan_core::types::{Sentiment, Stance};

    struct FixedModel(Prediction);

    impl SentimentModel for FixedModel {
        fn predict(&self, _text: &str) -> anyhow::Result<Prediction> {
            Ok(self.0.clone())
        }
    }

    struct FailingModel;

    impl SentimentModel for FailingModel {
        fn predict(&self, _text: &str) -> anyhow::Result<Prediction> {
            anyhow::bail!("model backend unavailable")
        }
    }

    struct SlowModel;

    impl SentimentModel for SlowModel {
        fn predict(&self, _text: &str) -> anyhow::Result<Prediction> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(Prediction {
                sentiment: Sentiment::Positive,
                confidence: 0.99,
                stance: Stance::Supports,
                aspects: vec![],
            })
        }
    }

    fn prediction(confidence: f32) -> Prediction {
        Prediction {
            sentiment: Sentiment::Negative,
            confidence,
            stance: Stance::Opposes,
            aspects: vec!["timelines".to_string()],
        }
    }

    #[tokio::test]
    async fn model_answer_is_used_when_it_succeeds() {
        let router = ClassifierRouter::new(
            Some(Arc::new(FixedModel(prediction(0.9)))),
            Duration::from_secs(1),
            0.7,
        );
        let c = router.classify("the timeline is too long").await;
        assert_eq!(c.method, Method::Model);
        assert_eq!(c.sentiment, Sentiment::Negative);
        assert!(!c.needs_review);
    }

    #[tokio::test]
    async fn model_failure_falls_back_to_lexicon() {
        let router = ClassifierRouter::new(Some(Arc::new(FailingModel)), Duration::from_secs(1), 0.7);
        let c = router.classify("I support this excellent initiative").await;
        assert_eq!(c.method, Method::Lexicon);
        assert_eq!(c.sentiment, Sentiment::Positive);
    }

    #[tokio::test]
    async fn model_timeout_falls_back_to_lexicon() {
        let router = ClassifierRouter::new(Some(Arc::new(SlowModel)), Duration::from_millis(20), 0.7);
        let c = router.classify("I support this excellent initiative").await;
        assert_eq!(c.method, Method::Lexicon);
        assert_eq!(c.sentiment, Sentiment::Positive);
    }

    #[tokio::test]
    async fn no_model_uses_lexicon_directly() {
        let router = ClassifierRouter::new(None, Duration::from_secs(1), 0.7);
        let c = router.classify("the burden is prohibitive").await;
        assert_eq!(c.method, Method::Lexicon);
        assert_eq!(c.sentiment, Sentiment::Negative);
    }

    #[tokio::test]
    async fn low_confidence_flags_review_without_changing_the_answer() {
        let router = ClassifierRouter::new(
            Some(Arc::new(FixedModel(prediction(0.6)))),
            Duration::from_secs(1),
            0.7,
        );
        let c = router.classify("anything").await;
        assert!(c.needs_review);
        assert_eq!(c.sentiment, Sentiment::Negative);
        assert_eq!(c.method, Method::Model);
    }

    #[tokio::test]
    async fn at_threshold_confidence_is_not_flagged() {
        let router = ClassifierRouter::new(
            Some(Arc::new(FixedModel(prediction(0.7)))),
            Duration::from_secs(1),
            0.7,
        );
        let c = router.classify("anything").await;
        assert!(!c.needs_review);
    }
}

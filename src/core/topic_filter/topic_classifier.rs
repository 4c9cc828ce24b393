// Classifier port. The ONNX implementation lives in infra; tests use fakes.

use super::topic_filter_service::TopicFilterError;
use super::topic_models::TopicLabel;
use async_trait::async_trait;

/// Predicts which topic a piece of text belongs to.
#[async_trait]
pub trait TopicClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<TopicLabel, TopicFilterError>;
}

/// Index of the highest logit. Ties go to the lowest index and NaN never wins.
pub fn argmax(logits: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &value) in logits.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((i, value)),
        }
    }
    best.map(|(i, _)| i)
}

/// Turn a row of logits into a label.
pub fn label_from_logits(logits: &[f32]) -> Result<TopicLabel, TopicFilterError> {
    if logits.len() != TopicLabel::ALL.len() {
        return Err(TopicFilterError::Classifier(format!(
            "expected {} logits, got {}",
            TopicLabel::ALL.len(),
            logits.len()
        )));
    }

    argmax(logits)
        .and_then(TopicLabel::from_class_index)
        .ok_or_else(|| TopicFilterError::Classifier("no usable logits".to_string()))
}

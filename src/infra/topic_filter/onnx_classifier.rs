// Local ONNX topic classifier.
//
// Runs a fine-tuned RoBERTa sequence classifier exported to ONNX, fully on the
// local CPU. The model predicts one of four news-style topics, in class order:
// World, Sports, Business, Sci/Tech.
//
// Expected model directory layout:
//   model.onnx      - exported sequence-classification graph
//   tokenizer.json  - HuggingFace fast tokenizer
//   config.json     - optional, HuggingFace config (id2label is checked)

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use crate::core::topic_filter::{label_from_logits, TopicClassifier, TopicFilterError, TopicLabel};

/// RoBERTa's position embedding limit.
pub const DEFAULT_MAX_SEQ_LEN: usize = 512;

/// The subset of a HuggingFace `config.json` we care about.
#[derive(Debug, Default, Deserialize)]
struct ModelConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

/// ONNX-backed implementation of `TopicClassifier`.
pub struct OnnxTopicClassifier {
    // Session::run takes &mut self, and inference runs on spawn_blocking,
    // so the session is shared as Arc<Mutex<_>>.
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
}

impl OnnxTopicClassifier {
    /// Load and sanity-check the model. Any error here means the bot cannot
    /// serve and should not start.
    pub fn load(model_dir: &Path, max_seq_len: usize) -> Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let config_path = model_dir.join("config.json");

        if !model_path.exists() {
            anyhow::bail!("Model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        if config_path.exists() {
            let text = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            let config: ModelConfig = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?;
            check_label_map(&config.id2label)?;
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_seq_len,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Invalid truncation settings: {}", e))?;

        let classifier = Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
        };

        // Probe once so a model with the wrong head fails now, not on the
        // first user message.
        let logits = run_inference(&classifier.session, &classifier.tokenizer, "hello world")
            .context("Probe inference failed")?;
        label_from_logits(&logits).map_err(|e| anyhow::anyhow!("Incompatible model: {}", e))?;

        info!("Loaded topic classifier from {}", model_dir.display());

        Ok(classifier)
    }
}

#[async_trait]
impl TopicClassifier for OnnxTopicClassifier {
    async fn classify(&self, text: &str) -> Result<TopicLabel, TopicFilterError> {
        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let text = text.to_string();

        // Tokenization and inference are CPU-bound; keep them off the
        // async workers so gateway events keep flowing.
        let logits = tokio::task::spawn_blocking(move || run_inference(&session, &tokenizer, &text))
            .await
            .map_err(|e| TopicFilterError::Classifier(format!("inference task panicked: {}", e)))?
            .map_err(|e| TopicFilterError::Classifier(format!("{:#}", e)))?;

        let label = label_from_logits(&logits)?;
        debug!(?logits, label = %label, "Classified message");
        Ok(label)
    }
}

/// Tokenize one text and return its row of logits.
fn run_inference(session: &Mutex<Session>, tokenizer: &Tokenizer, text: &str) -> Result<Vec<f32>> {
    let encoding = tokenizer
        .encode(text, true)
        .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

    let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
    let attention_mask: Vec<i64> = encoding
        .get_attention_mask()
        .iter()
        .map(|&m| m as i64)
        .collect();
    let shape = [1i64, input_ids.len() as i64];

    let input_ids_tensor =
        Tensor::from_array((shape, input_ids)).context("Failed to create input_ids tensor")?;
    let attention_mask_tensor = Tensor::from_array((shape, attention_mask))
        .context("Failed to create attention_mask tensor")?;

    let mut session = session
        .lock()
        .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

    let outputs = session
        .run(ort::inputs! {
            "input_ids" => input_ids_tensor,
            "attention_mask" => attention_mask_tensor
        })
        .context("ONNX inference failed")?;

    // Output shape: [1, num_labels]
    let (_shape, data) = outputs[0]
        .try_extract_tensor::<f32>()
        .context("Failed to extract logits")?;

    Ok(data.to_vec())
}

/// Make sure a model's `id2label` agrees with our fixed label order.
///
/// Generic `LABEL_<n>` names are accepted since fine-tuning scripts often
/// leave them in place.
fn check_label_map(id2label: &HashMap<String, String>) -> Result<()> {
    if id2label.is_empty() {
        return Ok(());
    }
    if id2label.len() != TopicLabel::ALL.len() {
        anyhow::bail!(
            "Model has {} labels, expected {} ({})",
            id2label.len(),
            TopicLabel::ALL.len(),
            TopicLabel::choices()
        );
    }

    for (id, name) in id2label {
        let index: usize = id
            .parse()
            .with_context(|| format!("Non-numeric label id in config.json: {}", id))?;
        let expected = TopicLabel::from_class_index(index)
            .with_context(|| format!("Label id {} is out of range", index))?;

        if name.starts_with("LABEL_") {
            continue;
        }
        if !name.eq_ignore_ascii_case(expected.as_str()) {
            anyhow::bail!(
                "Label {} is '{}' in config.json, expected '{}'",
                index,
                name,
                expected
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_named_labels_in_order_are_accepted() {
        let map = label_map(&[("0", "World"), ("1", "Sports"), ("2", "Business"), ("3", "Sci/Tech")]);
        assert!(check_label_map(&map).is_ok());
    }

    #[test]
    fn test_generic_labels_are_accepted() {
        let map = label_map(&[("0", "LABEL_0"), ("1", "LABEL_1"), ("2", "LABEL_2"), ("3", "LABEL_3")]);
        assert!(check_label_map(&map).is_ok());
        assert!(check_label_map(&HashMap::new()).is_ok());
    }

    #[test]
    fn test_reordered_labels_are_rejected() {
        let map = label_map(&[("0", "Sports"), ("1", "World"), ("2", "Business"), ("3", "Sci/Tech")]);
        assert!(check_label_map(&map).is_err());
    }

    #[test]
    fn test_wrong_label_count_is_rejected() {
        let map = label_map(&[("0", "negative"), ("1", "positive")]);
        assert!(check_label_map(&map).is_err());
    }

    #[test]
    fn test_config_json_parses_id2label() {
        let config: ModelConfig = serde_json::from_str(
            r#"{"architectures": ["RobertaForSequenceClassification"],
                "id2label": {"0": "World", "1": "Sports", "2": "Business", "3": "Sci/Tech"}}"#,
        )
        .unwrap();
        assert_eq!(config.id2label.len(), 4);
        assert!(check_label_map(&config.id2label).is_ok());
    }

    #[test]
    fn test_missing_model_dir_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let err = OnnxTopicClassifier::load(dir.path(), DEFAULT_MAX_SEQ_LEN)
            .err()
            .expect("load should fail without model files");
        assert!(err.to_string().contains("Model file not found"));
    }

    #[test]
    fn test_missing_tokenizer_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("model.onnx"), b"not a model").unwrap();
        let err = OnnxTopicClassifier::load(dir.path(), DEFAULT_MAX_SEQ_LEN)
            .err()
            .expect("load should fail without tokenizer");
        assert!(err.to_string().contains("Tokenizer file not found"));
    }
}

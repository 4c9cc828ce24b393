// Implementations of the topic filter ports.

pub mod csv_log;
pub mod onnx_classifier;

pub use csv_log::CsvFilteredMessageLog;
pub use onnx_classifier::{OnnxTopicClassifier, DEFAULT_MAX_SEQ_LEN};

// Discord commands module.
// Each feature gets its own command file.

use crate::core::topic_filter::TopicFilterService;
use crate::infra::topic_filter::{CsvFilteredMessageLog, OnnxTopicClassifier};
use std::sync::Arc;

pub mod topic;

// Bot presence management
pub mod presence;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state handed to every command and event handler.
pub struct Data {
    pub topic_filter: Arc<TopicFilterService<OnnxTopicClassifier, CsvFilteredMessageLog>>,
}

// Topic filter domain models.
//
// Pure types with no Discord dependencies. The Discord layer converts
// serenity messages into `InboundMessage` before anything here sees them.

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// The fixed set of topics the classifier can predict.
///
/// Variant order matches the model's output class indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicLabel {
    World,
    Sports,
    Business,
    SciTech,
}

impl TopicLabel {
    /// All labels, indexed by model class.
    pub const ALL: [TopicLabel; 4] = [
        TopicLabel::World,
        TopicLabel::Sports,
        TopicLabel::Business,
        TopicLabel::SciTech,
    ];

    /// The display name, which is also what operators type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicLabel::World => "World",
            TopicLabel::Sports => "Sports",
            TopicLabel::Business => "Business",
            TopicLabel::SciTech => "Sci/Tech",
        }
    }

    /// Map a model output class to its label.
    pub fn from_class_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Case-insensitive lookup. Surrounding whitespace is ignored.
    pub fn parse(input: &str) -> Option<Self> {
        let wanted = input.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.as_str().eq_ignore_ascii_case(wanted))
    }

    /// Comma-separated list of every label, for user-facing messages.
    pub fn choices() -> String {
        Self::ALL
            .iter()
            .map(|label| label.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for TopicLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chat message reduced to what the filter needs.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub channel_id: u64,
    pub author_name: String,
    pub author_is_bot: bool,
    pub content: String,
}

/// One row of the filtered-message log.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredMessage {
    pub timestamp: DateTime<Utc>,
    pub author_name: String,
    pub content: String,
    pub predicted: TopicLabel,
    pub allowed: TopicLabel,
}

/// Why a message was skipped before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Sent by a bot, including ourselves
    BotAuthor,
    /// Starts with the command prefix
    Command,
    /// The channel has no topic assigned
    NoTopic,
    /// Nothing to classify (attachment-only messages)
    EmptyContent,
}

/// Terminal state of the moderation workflow for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationOutcome {
    Ignored(IgnoreReason),
    /// Prediction matched the channel topic
    Allowed { topic: TopicLabel },
    /// Off-topic, warned, and deleted by us
    Deleted {
        predicted: TopicLabel,
        allowed: TopicLabel,
    },
    /// Off-topic, warned, but someone else removed it first
    AlreadyDeleted {
        predicted: TopicLabel,
        allowed: TopicLabel,
    },
}

/// Result of asking the platform to delete the original message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyGone,
}

/// Result of editing the warning reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Edited,
    /// The warning was removed by someone else
    WarningGone,
}

/// Tunables for the filter workflow.
#[derive(Debug, Clone)]
pub struct FilterSettings {
    /// Messages starting with this are commands and never filtered
    pub command_prefix: String,
    /// How many countdown edits happen before deletion
    pub countdown_secs: u32,
    /// Delay between countdown edits
    pub tick: Duration,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            command_prefix: "!".to_string(),
            countdown_secs: 10,
            tick: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(TopicLabel::parse("sports"), Some(TopicLabel::Sports));
        assert_eq!(TopicLabel::parse("  BUSINESS "), Some(TopicLabel::Business));
        assert_eq!(TopicLabel::parse("sci/tech"), Some(TopicLabel::SciTech));
        assert_eq!(TopicLabel::parse("World"), Some(TopicLabel::World));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(TopicLabel::parse("cooking"), None);
        assert_eq!(TopicLabel::parse(""), None);
        assert_eq!(TopicLabel::parse("scitech"), None);
    }

    #[test]
    fn test_class_index_mapping() {
        assert_eq!(TopicLabel::from_class_index(0), Some(TopicLabel::World));
        assert_eq!(TopicLabel::from_class_index(3), Some(TopicLabel::SciTech));
        assert_eq!(TopicLabel::from_class_index(4), None);
    }

    #[test]
    fn test_choices_lists_every_label() {
        assert_eq!(TopicLabel::choices(), "World, Sports, Business, Sci/Tech");
    }
}

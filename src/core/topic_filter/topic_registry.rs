// Channel -> allowed topic mapping.
//
// Lives for the lifetime of the process and is never persisted; a restart
// starts with every channel unfiltered.

use super::topic_models::TopicLabel;
use super::topic_filter_service::TopicFilterError;
use dashmap::DashMap;

/// In-memory registry of which topic each channel allows.
///
/// DashMap lets commands mutate the registry while message handlers on
/// other tasks read it, without a surrounding lock.
pub struct TopicRegistry {
    topics: DashMap<u64, TopicLabel>,
}

impl TopicRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            topics: DashMap::new(),
        }
    }

    /// Assign a topic to a channel, replacing any previous one.
    ///
    /// The input is matched case-insensitively against the label set and the
    /// canonical label is stored. On an unknown topic the registry is left
    /// untouched.
    pub fn set(&self, channel_id: u64, topic: &str) -> Result<TopicLabel, TopicFilterError> {
        let label = TopicLabel::parse(topic)
            .ok_or_else(|| TopicFilterError::UnknownTopic(topic.trim().to_string()))?;
        self.topics.insert(channel_id, label);
        Ok(label)
    }

    /// The channel's topic, or `None` when unset.
    pub fn get(&self, channel_id: u64) -> Option<TopicLabel> {
        self.topics.get(&channel_id).map(|entry| *entry)
    }

    /// Remove the channel's topic. Returns whether one was set.
    pub fn clear(&self, channel_id: u64) -> bool {
        self.topics.remove(&channel_id).is_some()
    }

    /// Every label a channel can be set to, in model class order. Fixed by
    /// the classifier, so it does not depend on what has been assigned.
    pub fn list_labels(&self) -> &'static [TopicLabel] {
        &TopicLabel::ALL
    }

    /// Number of channels with a topic assigned.
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// True when no channel is being filtered.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get_every_label() {
        let registry = TopicRegistry::new();

        for label in TopicLabel::ALL {
            let stored = registry.set(42, &label.as_str().to_lowercase()).unwrap();
            assert_eq!(stored, label);
            assert_eq!(registry.get(42), Some(label));
        }
    }

    #[test]
    fn test_set_overwrites_previous_topic() {
        let registry = TopicRegistry::new();
        registry.set(1, "World").unwrap();
        registry.set(1, "Sports").unwrap();

        assert_eq!(registry.get(1), Some(TopicLabel::Sports));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_set_keeps_prior_assignment() {
        let registry = TopicRegistry::new();
        registry.set(1, "Business").unwrap();

        let err = registry.set(1, "invalid").unwrap_err();
        assert!(matches!(err, TopicFilterError::UnknownTopic(ref t) if t == "invalid"));
        assert_eq!(registry.get(1), Some(TopicLabel::Business));
    }

    #[test]
    fn test_invalid_set_on_empty_channel_stays_unset() {
        let registry = TopicRegistry::new();
        assert!(registry.set(9, "gardening").is_err());
        assert_eq!(registry.get(9), None);
    }

    #[test]
    fn test_clear() {
        let registry = TopicRegistry::new();
        registry.set(1, "Sci/Tech").unwrap();
        registry.set(2, "World").unwrap();

        assert!(registry.clear(1));
        assert_eq!(registry.get(1), None);
        // Other channels are untouched
        assert_eq!(registry.get(2), Some(TopicLabel::World));
    }

    #[test]
    fn test_clear_unassigned_channel_is_noop() {
        let registry = TopicRegistry::new();
        assert!(!registry.clear(77));
        assert!(!registry.clear(77));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_list_labels() {
        let registry = TopicRegistry::new();
        assert_eq!(registry.list_labels(), &TopicLabel::ALL);

        // Assignments don't narrow the list
        registry.set(3, "Sports").unwrap();
        assert_eq!(registry.list_labels().len(), 4);
    }

    #[test]
    fn test_is_empty_tracks_assignments() {
        let registry = TopicRegistry::default();
        assert!(registry.is_empty());

        registry.set(1, "World").unwrap();
        assert!(!registry.is_empty());

        registry.clear(1);
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }
}

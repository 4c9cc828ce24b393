// Topic filter service - core business logic for per-channel topic moderation.
//
// This service handles:
// - Deciding whether a message is subject to filtering at all
// - Classifying it and comparing against the channel topic
// - The warn -> countdown -> delete sequence for off-topic messages
//
// NO Discord dependencies here. Platform side effects go through the
// `ModerationGateway` port, which the Discord layer implements per message.

use super::topic_classifier::TopicClassifier;
use super::topic_models::{
    DeleteOutcome, EditOutcome, FilterSettings, FilteredMessage, IgnoreReason, InboundMessage,
    ModerationOutcome, TopicLabel,
};
use super::topic_registry::TopicRegistry;
use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum TopicFilterError {
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Log store error: {0}")]
    LogStore(String),
}

// ============================================================================
// PORTS
// ============================================================================

/// Append-only sink for flagged messages.
#[async_trait]
pub trait FilteredMessageLog: Send + Sync {
    async fn append(&self, record: &FilteredMessage) -> Result<(), TopicFilterError>;
}

/// The chat platform operations the workflow needs, bound to one inbound
/// message.
#[async_trait]
pub trait ModerationGateway: Send + Sync {
    /// Handle to the warning reply so it can be edited later.
    type Warning: Send + Sync;

    /// Reply to the original message.
    async fn send_warning(&self, content: &str) -> Result<Self::Warning, TopicFilterError>;

    /// Replace the warning text. A warning that no longer exists is
    /// reported as `WarningGone`, not as an error.
    async fn edit_warning(
        &self,
        warning: &Self::Warning,
        content: &str,
    ) -> Result<EditOutcome, TopicFilterError>;

    /// Delete the original message. A message that no longer exists is
    /// reported as `AlreadyGone`, not as an error.
    async fn delete_original(&self) -> Result<DeleteOutcome, TopicFilterError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct TopicFilterService<C: TopicClassifier, L: FilteredMessageLog> {
    registry: TopicRegistry,
    classifier: C,
    log: L,
    settings: FilterSettings,
}

impl<C: TopicClassifier, L: FilteredMessageLog> TopicFilterService<C, L> {
    /// Create a service with an empty registry.
    pub fn new(classifier: C, log: L, settings: FilterSettings) -> Self {
        Self {
            registry: TopicRegistry::new(),
            classifier,
            log,
            settings,
        }
    }

    pub fn registry(&self) -> &TopicRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    /// Work out whether a message should be classified at all.
    ///
    /// Returns the channel's topic when it should.
    fn screen(&self, message: &InboundMessage) -> Result<TopicLabel, IgnoreReason> {
        if message.author_is_bot {
            return Err(IgnoreReason::BotAuthor);
        }
        if message.content.starts_with(&self.settings.command_prefix) {
            return Err(IgnoreReason::Command);
        }
        let allowed = self
            .registry
            .get(message.channel_id)
            .ok_or(IgnoreReason::NoTopic)?;
        if message.content.trim().is_empty() {
            return Err(IgnoreReason::EmptyContent);
        }
        Ok(allowed)
    }

    /// Run the full moderation workflow for one inbound message.
    ///
    /// Once a message is flagged the countdown always runs to completion,
    /// even if the channel's topic is changed or cleared meanwhile.
    pub async fn moderate<G: ModerationGateway>(
        &self,
        message: &InboundMessage,
        gateway: &G,
    ) -> Result<ModerationOutcome, TopicFilterError> {
        let allowed = match self.screen(message) {
            Ok(topic) => topic,
            Err(reason) => return Ok(ModerationOutcome::Ignored(reason)),
        };

        let predicted = self.classifier.classify(&message.content).await?;

        if predicted == allowed {
            tracing::debug!(
                channel_id = message.channel_id,
                topic = %allowed,
                "Message matches channel topic"
            );
            return Ok(ModerationOutcome::Allowed { topic: allowed });
        }

        tracing::info!(
            channel_id = message.channel_id,
            author = %message.author_name,
            predicted = %predicted,
            allowed = %allowed,
            "Off-topic message flagged"
        );

        let warning = gateway
            .send_warning(&warning_text(predicted, self.settings.countdown_secs))
            .await?;

        let record = FilteredMessage {
            timestamp: Utc::now(),
            author_name: message.author_name.clone(),
            content: message.content.clone(),
            predicted,
            allowed,
        };
        if let Err(e) = self.log.append(&record).await {
            // Losing a log row should not stop the deletion
            tracing::error!("Failed to record filtered message: {}", e);
        }

        // If the warning disappears mid-countdown the clock keeps running,
        // there is just nothing left to edit.
        let mut warning_visible = true;
        for remaining in (1..=self.settings.countdown_secs).rev() {
            if warning_visible {
                let edited = gateway
                    .edit_warning(&warning, &countdown_text(predicted, remaining))
                    .await?;
                if edited == EditOutcome::WarningGone {
                    tracing::debug!(
                        channel_id = message.channel_id,
                        "Countdown warning was removed"
                    );
                    warning_visible = false;
                }
            }
            tokio::time::sleep(self.settings.tick).await;
        }

        match gateway.delete_original().await? {
            DeleteOutcome::Deleted => {
                if warning_visible {
                    // The message is already gone, so a vanished warning
                    // does not change the outcome
                    let confirmed = gateway
                        .edit_warning(&warning, &deleted_text(predicted))
                        .await?;
                    if confirmed == EditOutcome::WarningGone {
                        tracing::debug!(
                            channel_id = message.channel_id,
                            "Warning removed before deletion could be confirmed"
                        );
                    }
                }
                tracing::info!(
                    channel_id = message.channel_id,
                    predicted = %predicted,
                    "Off-topic message deleted"
                );
                Ok(ModerationOutcome::Deleted { predicted, allowed })
            }
            DeleteOutcome::AlreadyGone => {
                tracing::debug!(
                    channel_id = message.channel_id,
                    "Off-topic message was already removed"
                );
                Ok(ModerationOutcome::AlreadyDeleted { predicted, allowed })
            }
        }
    }
}

/// First reply sent when a message is flagged.
pub fn warning_text(predicted: TopicLabel, countdown_secs: u32) -> String {
    format!(
        "⚠️ This message seems off-topic (Predicted: {}). It will be deleted in {} seconds.",
        predicted, countdown_secs
    )
}

pub fn countdown_text(predicted: TopicLabel, remaining: u32) -> String {
    format!(
        "⚠️ Off-topic message (Predicted: {}). Deleting in {} seconds...",
        predicted, remaining
    )
}

pub fn deleted_text(predicted: TopicLabel) -> String {
    format!("✅ Message deleted (Predicted: {})", predicted)
}

// ============================================================================
// TESTS
// ============================================================================

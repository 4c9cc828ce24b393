// Discord-specific topic filtering - feeds inbound messages to the core
// workflow and logs what happened.

use super::gateway::DiscordModerationGateway;
use crate::core::topic_filter::{
    FilteredMessageLog, InboundMessage, ModerationOutcome, TopicClassifier, TopicFilterService,
};
use crate::discord::Error;
use poise::serenity_prelude as serenity;

/// Run the topic filter for one message.
///
/// For a flagged message this returns only after the countdown finishes and
/// the message is gone, so callers should run it on its own task.
pub async fn handle_message_for_topic<C: TopicClassifier, L: FilteredMessageLog>(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    topic_filter: &TopicFilterService<C, L>,
) -> Result<ModerationOutcome, Error> {
    let inbound = InboundMessage {
        channel_id: msg.channel_id.get(),
        author_name: msg.author.name.clone(),
        author_is_bot: msg.author.bot,
        content: msg.content.clone(),
    };

    let gateway = DiscordModerationGateway::new(ctx, msg);
    let outcome = topic_filter.moderate(&inbound, &gateway).await?;

    if let ModerationOutcome::Ignored(reason) = &outcome {
        tracing::debug!(message_id = msg.id.get(), ?reason, "Topic filter skipped message");
    }

    Ok(outcome)
}

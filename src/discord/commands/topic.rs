// Discord commands for the topic filter.
//
// Same pattern as the other command files:
// 1. Extract primitive data from Discord types
// 2. Call the core registry
// 3. Format the response
//
// All four work as prefix commands (`!topicset sports`) and slash commands.

use crate::core::topic_filter::{TopicFilterError, TopicLabel};
use crate::discord::commands::presence;
use crate::discord::{Context, Error};

/// Set the allowed topic for this channel.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn topicset(
    ctx: Context<'_>,
    #[description = "One of: World, Sports, Business, Sci/Tech"]
    #[rest]
    topic: String,
) -> Result<(), Error> {
    let channel_id = ctx.channel_id().get();

    let reply = match ctx.data().topic_filter.registry().set(channel_id, &topic) {
        Ok(label) => {
            tracing::info!(
                channel_id,
                topic = %label,
                set_by = %ctx.author().name,
                "Channel topic set"
            );
            refresh_presence(ctx);
            set_reply(label)
        }
        Err(TopicFilterError::UnknownTopic(_)) => invalid_topic_reply(),
        Err(e) => return Err(e.into()),
    };

    ctx.say(reply).await?;
    Ok(())
}

/// Get the current topic for this channel.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn topicget(ctx: Context<'_>) -> Result<(), Error> {
    let topic = ctx
        .data()
        .topic_filter
        .registry()
        .get(ctx.channel_id().get());
    let prefix = &ctx.data().topic_filter.settings().command_prefix;

    ctx.say(get_reply(topic, prefix)).await?;
    Ok(())
}

/// List all topics the classifier can recognise.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn topiclist(ctx: Context<'_>) -> Result<(), Error> {
    let labels = ctx.data().topic_filter.registry().list_labels();
    ctx.say(list_reply(labels)).await?;
    Ok(())
}

/// Remove topic filtering from this channel.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn topicclear(ctx: Context<'_>) -> Result<(), Error> {
    let channel_id = ctx.channel_id().get();
    let registry = ctx.data().topic_filter.registry();
    let removed = registry.clear(channel_id);

    if removed {
        tracing::info!(
            channel_id,
            filtered_channels = registry.len(),
            "Channel topic cleared"
        );
        if registry.is_empty() {
            tracing::info!("No channels are topic-filtered any more");
        }
        refresh_presence(ctx);
    }

    ctx.say(clear_reply(removed)).await?;
    Ok(())
}

/// Keep the "Watching N channel topics" status in step with the registry.
fn refresh_presence(ctx: Context<'_>) {
    let topic_filter = &ctx.data().topic_filter;
    presence::show_filtered_channels(
        ctx.serenity_context(),
        topic_filter.registry().len(),
        &topic_filter.settings().command_prefix,
    );
}

fn set_reply(label: TopicLabel) -> String {
    format!("✅ Topic for this channel set to **{}**.", label)
}

fn invalid_topic_reply() -> String {
    format!("❌ Invalid topic. Choose from: {}", TopicLabel::choices())
}

fn get_reply(topic: Option<TopicLabel>, prefix: &str) -> String {
    match topic {
        Some(label) => format!("ℹ️ Current topic for this channel is **{}**.", label),
        None => format!(
            "ℹ️ No topic is set for this channel yet. Use `{}topicset <topic>` to set one.",
            prefix
        ),
    }
}

fn list_reply(labels: &[TopicLabel]) -> String {
    let names: Vec<&str> = labels.iter().map(|l| l.as_str()).collect();
    format!("📌 Available topics: {}", names.join(", "))
}

fn clear_reply(removed: bool) -> &'static str {
    if removed {
        "🧹 Topic filter cleared for this channel. All messages are now allowed."
    } else {
        "ℹ️ No topic is currently set for this channel."
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_reply_distinguishes_unset() {
        assert_eq!(
            get_reply(Some(TopicLabel::SciTech), "!"),
            "ℹ️ Current topic for this channel is **Sci/Tech**."
        );
        let unset = get_reply(None, "!");
        assert!(unset.contains("No topic is set"));
        assert!(unset.contains("`!topicset <topic>`"));
    }

    #[test]
    fn test_invalid_topic_reply_lists_choices() {
        assert_eq!(
            invalid_topic_reply(),
            "❌ Invalid topic. Choose from: World, Sports, Business, Sci/Tech"
        );
    }

    #[test]
    fn test_list_reply() {
        assert_eq!(
            list_reply(&TopicLabel::ALL),
            "📌 Available topics: World, Sports, Business, Sci/Tech"
        );
    }

    #[test]
    fn test_set_and_clear_replies() {
        assert_eq!(
            set_reply(TopicLabel::Business),
            "✅ Topic for this channel set to **Business**."
        );
        assert_ne!(clear_reply(true), clear_reply(false));
    }
}

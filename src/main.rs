// This is the entry point of the topic guard bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (ONNX model, CSV log)
// - `discord/` = Discord-specific adapters (commands, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::topic_filter::{FilterSettings, ModerationOutcome, TopicFilterService};
use crate::discord::commands::presence;
use crate::discord::topic_filter::handle_message_for_topic;
use crate::discord::{Data, Error};
use crate::infra::topic_filter::{
    CsvFilteredMessageLog, OnnxTopicClassifier, DEFAULT_MAX_SEQ_LEN,
};
use poise::serenity_prelude as serenity;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_MODEL_DIR: &str = "models/topic_classifier";
const DEFAULT_LOG_PATH: &str = "data/filtered_messages.csv";
const DEFAULT_COMMAND_PREFIX: &str = "!";

/// Settings read from the environment (or `.env`).
struct BotConfig {
    token: String,
    model_dir: PathBuf,
    max_seq_len: usize,
    log_path: PathBuf,
    command_prefix: String,
}

impl BotConfig {
    fn from_env() -> anyhow::Result<Self> {
        let token = std::env::var("DISCORD_TOKEN").map_err(|_| {
            anyhow::anyhow!(
                "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token."
            )
        })?;

        let model_dir = std::env::var("TOPIC_MODEL_DIR")
            .unwrap_or_else(|_| DEFAULT_MODEL_DIR.to_string())
            .into();
        let max_seq_len = std::env::var("TOPIC_MAX_SEQ_LEN")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MAX_SEQ_LEN);
        let log_path = std::env::var("TOPIC_LOG_PATH")
            .unwrap_or_else(|_| DEFAULT_LOG_PATH.to_string())
            .into();
        let command_prefix = std::env::var("COMMAND_PREFIX")
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_COMMAND_PREFIX.to_string());

        Ok(Self {
            token,
            model_dir,
            max_seq_len,
            log_path,
            command_prefix,
        })
    }
}

/// Prefix command parsing. Command names match exactly, so `!TopicSet`
/// is not a command.
fn prefix_options(prefix: &str) -> poise::PrefixFrameworkOptions<Data, Error> {
    poise::PrefixFrameworkOptions {
        prefix: Some(prefix.to_string()),
        case_insensitive_commands: false,
        ..Default::default()
    }
}

/// Event handler for non-command Discord events.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::Message { new_message } = event {
        // One task per message: a flagged message holds its task for the
        // whole countdown, and nothing else should wait on that.
        let ctx = ctx.clone();
        let message = new_message.clone();
        let topic_filter = Arc::clone(&data.topic_filter);

        tokio::spawn(async move {
            match handle_message_for_topic(&ctx, &message, topic_filter.as_ref()).await {
                Ok(ModerationOutcome::Deleted { .. } | ModerationOutcome::AlreadyDeleted { .. }) => {
                    tracing::debug!(message_id = message.id.get(), "Topic filter finished");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(
                        message_id = message.id.get(),
                        channel_id = message.channel_id.get(),
                        "Topic filter failed: {}",
                        e
                    );
                }
            }
        });
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file (if it exists), before the
    // subscriber so RUST_LOG can live there too
    dotenv::dotenv().ok();

    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{:#}", e);
            std::process::exit(1);
        }
    };

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    // The model is required; without it the bot has nothing to filter with.
    let classifier = match OnnxTopicClassifier::load(&config.model_dir, config.max_seq_len) {
        Ok(classifier) => classifier,
        Err(e) => {
            tracing::error!(
                "Failed to load topic classifier from {}: {:#}",
                config.model_dir.display(),
                e
            );
            std::process::exit(1);
        }
    };

    let filtered_log = CsvFilteredMessageLog::new(&config.log_path);
    tracing::info!(
        "Filtered messages will be logged to {}",
        filtered_log.path().display()
    );

    let settings = FilterSettings {
        command_prefix: config.command_prefix.clone(),
        ..Default::default()
    };
    let topic_filter = Arc::new(TopicFilterService::new(classifier, filtered_log, settings));

    // Create the data structure that will be shared across all commands
    let data = Data {
        topic_filter: Arc::clone(&topic_filter),
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS;

    let command_prefix = config.command_prefix.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                discord::commands::topic::topicset(),
                discord::commands::topic::topicget(),
                discord::commands::topic::topiclist(),
                discord::commands::topic::topicclear(),
            ],
            prefix_options: prefix_options(&config.command_prefix),
            // Event handler for messages and other events
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up...");

                // Slash commands can take up to an hour to propagate globally;
                // the prefix versions work immediately.
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                tracing::info!("Commands registered, bot is ready");
                presence::on_ready(ctx, &command_prefix);

                Ok(data)
            })
        })
        .build();

    let mut client = match serenity::ClientBuilder::new(&config.token, intents)
        .framework(framework)
        .await
    {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Error creating client: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = client.start().await {
        tracing::error!("Error running bot: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_commands_are_case_sensitive() {
        let options = prefix_options("!");
        assert_eq!(options.prefix.as_deref(), Some("!"));
        assert!(!options.case_insensitive_commands);
    }

    #[test]
    fn test_prefix_options_use_configured_prefix() {
        let options = prefix_options("?");
        assert_eq!(options.prefix.as_deref(), Some("?"));
        assert!(!options.case_insensitive_commands);
    }
}

// Bot presence on startup.
//
// Discord-layer glue only: we work with serenity's ActivityData and
// OnlineStatus and keep the logic short.

use poise::serenity_prelude as serenity;

/// Show how many channels are being filtered, e.g. "Watching 3 channel topics".
pub fn show_filtered_channels(ctx: &serenity::Context, filtered_channels: usize, prefix: &str) {
    let activity = serenity::ActivityData::watching(watching_text(filtered_channels, prefix));
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}

/// Called once the bot is ready. The registry always starts empty.
pub fn on_ready(ctx: &serenity::Context, prefix: &str) {
    show_filtered_channels(ctx, 0, prefix);
}

fn watching_text(filtered_channels: usize, prefix: &str) -> String {
    match filtered_channels {
        0 => format!("for {}topicset", prefix),
        1 => "1 channel topic".to_string(),
        n => format!("{} channel topics", n),
    }
}

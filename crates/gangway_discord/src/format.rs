//! Chat markup helpers.

use chrono::{DateTime, Utc};

/// Permalink to a message.
pub fn message_link(guild_id: &str, channel_id: &str, message_id: &str) -> String {
    format!("https://discord.com/channels/{guild_id}/{channel_id}/{message_id}")
}

/// User mention markup.
pub fn mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}

/// Relative timestamp markup ("3 minutes ago" client-side).
pub fn relative_timestamp(at: &DateTime<Utc>) -> String {
    format!("<t:{}:R>", at.timestamp())
}

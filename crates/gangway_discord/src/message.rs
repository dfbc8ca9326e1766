//! Message views returned by the gateway.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_new::new;

/// Acknowledgement of a message the bot just sent.
#[derive(Debug, Clone, PartialEq, Eq, new, Getters)]
pub struct SentMessage {
    /// Platform message id
    id: String,
    /// Channel the message landed in
    channel_id: String,
}

/// A fetched message, from the local cache when available.
#[derive(Debug, Clone, PartialEq, Eq, new, Getters)]
pub struct ChatMessage {
    /// Platform message id
    id: String,
    /// Containing channel
    channel_id: String,
    /// Author user id
    author_id: String,
    /// Creation timestamp
    created: DateTime<Utc>,
    /// Names of emojis currently reacted onto the message
    reaction_emojis: Vec<String>,
    /// Whether this view came from the local cache
    from_cache: bool,
}

impl ChatMessage {
    /// Whether the message already carries any of the given emojis.
    pub fn has_any_reaction(&self, emojis: &[&str]) -> bool {
        self.reaction_emojis
            .iter()
            .any(|name| emojis.contains(&name.as_str()))
    }
}

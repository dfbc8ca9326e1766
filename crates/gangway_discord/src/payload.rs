//! Gateway event payloads handed to the engines.
//!
//! These mirror the fields the pipeline actually reads from the platform's
//! gateway events, with ids as strings so the engines stay platform-neutral.

use derive_getters::Getters;
use derive_new::new;

/// Guild-member details attached to a reaction event.
#[derive(Debug, Clone, PartialEq, Eq, new, Getters)]
pub struct MemberInfo {
    /// Current display username
    username: String,
    /// Roles the member holds in the guild
    role_ids: Vec<String>,
}

/// A reaction added to some message.
#[derive(Debug, Clone, PartialEq, Eq, new, Getters)]
pub struct ReactionAdded {
    /// Guild id; absent for DM reactions
    guild_id: Option<String>,
    /// Channel containing the message
    channel_id: String,
    /// Message reacted to
    message_id: String,
    /// Emoji name
    emoji: String,
    /// Reacting user
    user_id: String,
    /// Member details when the event carried them
    member: Option<MemberInfo>,
}

/// A member left (or was removed from) a guild.
#[derive(Debug, Clone, PartialEq, Eq, new, Getters)]
pub struct MemberLeft {
    /// Guild the member left
    guild_id: String,
    /// Departing user
    user_id: String,
    /// Last known username
    username: String,
}

//! The chat-gateway seam.

use crate::{ChatMessage, SentMessage};
use async_trait::async_trait;
use gangway_error::GangwayResult;

/// Everything the engines need from the chat platform.
///
/// Implemented by [`crate::SerenityGateway`] in production and by in-memory
/// fakes in tests.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// The bot's own user id, for recognizing bot-authored messages.
    fn own_user_id(&self) -> String;

    /// Post a message to a channel, optionally as a reply and with link
    /// embeds suppressed.
    async fn send_message(
        &self,
        channel_id: &str,
        text: &str,
        reply_to: Option<&str>,
        suppress_embeds: bool,
    ) -> GangwayResult<SentMessage>;

    /// Send a direct message to a user.
    async fn send_dm(&self, user_id: &str, text: &str) -> GangwayResult<SentMessage>;

    /// Add the bot's reaction to a message.
    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> GangwayResult<()>;

    /// Remove the bot's own reaction from a message.
    async fn remove_own_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> GangwayResult<()>;

    /// Fetch a channel message, preferring the local cache.
    async fn fetch_message(&self, channel_id: &str, message_id: &str)
    -> GangwayResult<ChatMessage>;

    /// Fetch a message from the bot's DM channel with a user.
    async fn fetch_dm_message(
        &self,
        user_id: &str,
        message_id: &str,
    ) -> GangwayResult<ChatMessage>;

    /// Role ids a member currently holds.
    async fn member_role_ids(&self, guild_id: &str, user_id: &str) -> GangwayResult<Vec<String>>;

    /// Grant roles to a member, with an audit-log reason.
    async fn add_member_roles(
        &self,
        guild_id: &str,
        user_id: &str,
        role_ids: &[String],
        reason: &str,
    ) -> GangwayResult<()>;
}

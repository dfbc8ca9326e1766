//! Serenity-backed gateway implementation.

use crate::{ChatGateway, ChatMessage, SentMessage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gangway_error::{ChatError, GangwayResult};
use serenity::builder::CreateMessage;
use serenity::cache::Cache;
use serenity::http::Http;
use serenity::model::channel::{Message, MessageFlags, ReactionType};
use serenity::model::id::{ChannelId, GuildId, MessageId, RoleId, UserId};
use std::num::NonZeroU64;
use std::sync::Arc;
use tracing::debug;

/// [`ChatGateway`] over serenity's HTTP client and in-process cache.
pub struct SerenityGateway {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

impl SerenityGateway {
    /// Wrap a running client's HTTP handle and cache.
    pub fn new(http: Arc<Http>, cache: Arc<Cache>) -> Self {
        Self { http, cache }
    }

    async fn fetch_channel_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> GangwayResult<ChatMessage> {
        // The cache ref is not Send, so convert before the fetch fallback.
        let cached = self
            .cache
            .message(channel, message)
            .map(|m| convert_message(&m, true));
        if let Some(found) = cached {
            debug!(%channel, %message, "Message served from cache");
            return Ok(found);
        }
        let fetched = channel
            .message(&self.http, message)
            .await
            .map_err(chat_err)?;
        Ok(convert_message(&fetched, false))
    }
}

#[async_trait]
impl ChatGateway for SerenityGateway {
    fn own_user_id(&self) -> String {
        self.cache.current_user().id.to_string()
    }

    async fn send_message(
        &self,
        channel_id: &str,
        text: &str,
        reply_to: Option<&str>,
        suppress_embeds: bool,
    ) -> GangwayResult<SentMessage> {
        let channel = ChannelId::new(parse_id("channel", channel_id)?);
        let mut builder = CreateMessage::new().content(text);
        if let Some(reply_to) = reply_to {
            let reference = (channel, MessageId::new(parse_id("message", reply_to)?));
            builder = builder.reference_message(reference);
        }
        if suppress_embeds {
            builder = builder.flags(MessageFlags::SUPPRESS_EMBEDS);
        }
        let message = channel
            .send_message(&self.http, builder)
            .await
            .map_err(chat_err)?;
        Ok(SentMessage::new(
            message.id.to_string(),
            message.channel_id.to_string(),
        ))
    }

    async fn send_dm(&self, user_id: &str, text: &str) -> GangwayResult<SentMessage> {
        let user = UserId::new(parse_id("user", user_id)?);
        let channel = user
            .create_dm_channel(&self.http)
            .await
            .map_err(chat_err)?;
        let message = channel
            .id
            .send_message(&self.http, CreateMessage::new().content(text))
            .await
            .map_err(chat_err)?;
        Ok(SentMessage::new(
            message.id.to_string(),
            message.channel_id.to_string(),
        ))
    }

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> GangwayResult<()> {
        let channel = ChannelId::new(parse_id("channel", channel_id)?);
        let message = MessageId::new(parse_id("message", message_id)?);
        channel
            .create_reaction(&self.http, message, ReactionType::Unicode(emoji.to_string()))
            .await
            .map_err(chat_err)
    }

    async fn remove_own_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> GangwayResult<()> {
        let channel = ChannelId::new(parse_id("channel", channel_id)?);
        let message = MessageId::new(parse_id("message", message_id)?);
        channel
            .delete_reaction(
                &self.http,
                message,
                None,
                ReactionType::Unicode(emoji.to_string()),
            )
            .await
            .map_err(chat_err)
    }

    async fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> GangwayResult<ChatMessage> {
        let channel = ChannelId::new(parse_id("channel", channel_id)?);
        let message = MessageId::new(parse_id("message", message_id)?);
        self.fetch_channel_message(channel, message).await
    }

    async fn fetch_dm_message(
        &self,
        user_id: &str,
        message_id: &str,
    ) -> GangwayResult<ChatMessage> {
        let user = UserId::new(parse_id("user", user_id)?);
        let channel = user
            .create_dm_channel(&self.http)
            .await
            .map_err(chat_err)?;
        let message = MessageId::new(parse_id("message", message_id)?);
        self.fetch_channel_message(channel.id, message).await
    }

    async fn member_role_ids(&self, guild_id: &str, user_id: &str) -> GangwayResult<Vec<String>> {
        let guild = GuildId::new(parse_id("guild", guild_id)?);
        let user = UserId::new(parse_id("user", user_id)?);
        let member = guild.member(&self.http, user).await.map_err(chat_err)?;
        Ok(member.roles.iter().map(RoleId::to_string).collect())
    }

    async fn add_member_roles(
        &self,
        guild_id: &str,
        user_id: &str,
        role_ids: &[String],
        reason: &str,
    ) -> GangwayResult<()> {
        let guild = GuildId::new(parse_id("guild", guild_id)?);
        let user = UserId::new(parse_id("user", user_id)?);
        for role_id in role_ids {
            let role = RoleId::new(parse_id("role", role_id)?);
            self.http
                .add_member_role(guild, user, role, Some(reason))
                .await
                .map_err(chat_err)?;
        }
        Ok(())
    }
}

fn parse_id(kind: &str, value: &str) -> GangwayResult<u64> {
    value
        .parse::<NonZeroU64>()
        .map(NonZeroU64::get)
        .map_err(|_| ChatError::new(format!("invalid {kind} id '{value}'")).into())
}

fn chat_err(error: serenity::Error) -> gangway_error::GangwayError {
    ChatError::new(error.to_string()).into()
}

fn convert_message(message: &Message, from_cache: bool) -> ChatMessage {
    let created = DateTime::<Utc>::from_timestamp(message.timestamp.unix_timestamp(), 0)
        .unwrap_or_default();
    let reaction_emojis = message
        .reactions
        .iter()
        .map(|reaction| match &reaction.reaction_type {
            ReactionType::Unicode(name) => name.clone(),
            ReactionType::Custom { name, .. } => name.clone().unwrap_or_default(),
            _ => String::new(),
        })
        .collect();
    ChatMessage::new(
        message.id.to_string(),
        message.channel_id.to_string(),
        message.author.id.to_string(),
        created,
        reaction_emojis,
        from_cache,
    )
}

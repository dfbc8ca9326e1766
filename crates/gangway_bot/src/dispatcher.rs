//! Event dispatcher: routes gateway events to the engines.

use crate::{
    ApprovalEngine, ConfigCacheService, OnboardingEngine, PROCESSING_EMOJI, RoleCacheService,
};
use gangway_discord::{ChatGateway, MemberLeft, ReactionAdded};
use gangway_error::{GangwayErrorKind, GangwayResult};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

enum Route {
    Onboarding,
    Approval,
}

/// Front door for gateway events.
///
/// Classifies each reaction before touching the chat platform, so reactions
/// on unrelated messages cause no store calls and no chat writes. Relevant
/// events get a ⏳ processing indicator for their duration, and store errors
/// are reported back to the triggering channel instead of being swallowed.
pub struct Dispatcher {
    gateway: Arc<dyn ChatGateway>,
    config: Arc<ConfigCacheService>,
    roles: Arc<RoleCacheService>,
    onboarding: OnboardingEngine,
    approval: ApprovalEngine,
}

impl Dispatcher {
    /// Create a dispatcher.
    pub fn new(
        gateway: Arc<dyn ChatGateway>,
        config: Arc<ConfigCacheService>,
        roles: Arc<RoleCacheService>,
        onboarding: OnboardingEngine,
        approval: ApprovalEngine,
    ) -> Self {
        Self {
            gateway,
            config,
            roles,
            onboarding,
            approval,
        }
    }

    /// Handle a reaction-added event.
    #[instrument(skip(self, event), fields(message_id = %event.message_id(), emoji = %event.emoji()))]
    pub async fn handle_reaction(&self, event: &ReactionAdded) -> GangwayResult<()> {
        if *event.user_id() == self.gateway.own_user_id() {
            return Ok(());
        }
        let Some(route) = self.classify(event).await? else {
            debug!("Reaction is not for this pipeline");
            return Ok(());
        };

        if let Err(error) = self
            .gateway
            .add_reaction(event.channel_id(), event.message_id(), PROCESSING_EMOJI)
            .await
        {
            warn!(%error, "Failed to add processing indicator");
        }

        let result = match route {
            Route::Onboarding => self.onboarding.handle_reaction(event).await,
            Route::Approval => self.approval.handle_reaction(event).await,
        };

        if let Err(error) = self
            .gateway
            .remove_own_reaction(event.channel_id(), event.message_id(), PROCESSING_EMOJI)
            .await
        {
            warn!(%error, "Failed to remove processing indicator");
        }

        match result {
            Ok(()) => Ok(()),
            Err(e) if matches!(e.kind(), GangwayErrorKind::Store(_)) => {
                error!(error = %e, "Store error while handling reaction");
                let text = format!("Something went wrong talking to the record store: {e}");
                if let Err(report_error) = self
                    .gateway
                    .send_message(event.channel_id(), &text, Some(event.message_id()), true)
                    .await
                {
                    warn!(%report_error, "Failed to report store error in channel");
                }
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Handle a member leaving the guild.
    pub async fn handle_member_left(&self, event: &MemberLeft) -> GangwayResult<()> {
        self.approval.handle_member_left(event).await
    }

    async fn classify(&self, event: &ReactionAdded) -> GangwayResult<Option<Route>> {
        if self.roles.is_watched(event.message_id()).await? {
            return Ok(Some(Route::Onboarding));
        }
        let Some(guild_id) = event.guild_id().as_deref() else {
            return Ok(None);
        };
        if self.roles.is_approval_channel(event.channel_id()).await? {
            return Ok(Some(Route::Approval));
        }
        if self
            .config
            .default_approvals_channel(guild_id)
            .await?
            .as_deref()
            == Some(event.channel_id())
        {
            return Ok(Some(Route::Approval));
        }
        // Leave notifications live in the exit channel; removal reactions
        // arrive there.
        if self
            .config
            .exit_notification_channel(guild_id)
            .await?
            .as_deref()
            == Some(event.channel_id())
        {
            return Ok(Some(Route::Approval));
        }
        Ok(None)
    }
}

//! Approval/removal engine: moderator reactions on the bot's notifications.

use crate::{ALREADY_HANDLED_EMOJI, COMPLETION_EMOJI, ConfigCacheService};
use gangway_beta::BetaDistribution;
use gangway_core::{App, BetaStore, RequestApprovalFilter, Tester, TestingRequest};
use gangway_discord::{ChatGateway, MemberLeft, ReactionAdded};
use gangway_error::{BetaError, GangwayResult};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Drives beta-group membership, role grants, and request finalization from
/// moderator reactions.
pub struct ApprovalEngine {
    store: Arc<dyn BetaStore>,
    gateway: Arc<dyn ChatGateway>,
    config: Arc<ConfigCacheService>,
    beta: Arc<dyn BetaDistribution>,
}

impl ApprovalEngine {
    /// Create an engine.
    pub fn new(
        store: Arc<dyn BetaStore>,
        gateway: Arc<dyn ChatGateway>,
        config: Arc<ConfigCacheService>,
        beta: Arc<dyn BetaDistribution>,
    ) -> Self {
        Self {
            store,
            gateway,
            config,
            beta,
        }
    }

    /// Handle a reaction in an approval channel. Routes to approval or
    /// removal by the configured emoji sets; anything else is ignored.
    #[instrument(skip(self, event), fields(message_id = %event.message_id(), emoji = %event.emoji()))]
    pub async fn handle_reaction(&self, event: &ReactionAdded) -> GangwayResult<()> {
        let Some(guild_id) = event.guild_id().as_deref() else {
            return Ok(());
        };
        let message = self
            .gateway
            .fetch_message(event.channel_id(), event.message_id())
            .await?;
        if *message.author_id() != self.gateway.own_user_id() {
            debug!("Reaction on a message the bot did not author");
            return Ok(());
        }
        if self
            .config
            .approval_emojis(guild_id)
            .await?
            .contains(event.emoji())
        {
            return self.handle_approval(guild_id, event).await;
        }
        if self
            .config
            .removal_emojis(guild_id)
            .await?
            .contains(event.emoji())
        {
            return self.handle_removal(event).await;
        }
        debug!("Emoji is neither approval nor removal");
        Ok(())
    }

    /// Approve the request behind a notification message.
    pub async fn handle_approval(
        &self,
        guild_id: &str,
        event: &ReactionAdded,
    ) -> GangwayResult<()> {
        let Some(mut request) = self
            .store
            .fetch_request_by_message(event.message_id())
            .await?
        else {
            self.reply(event, "No testing request matches this notification.")
                .await;
            return Ok(());
        };
        let Some(tester) = self.store.fetch_tester(request.tester()).await? else {
            self.reply(event, "The tester on this request no longer exists.")
                .await;
            return Ok(());
        };
        let Some(app) = self.store.fetch_app(request.app()).await? else {
            self.reply(event, "The app on this request no longer exists.")
                .await;
            return Ok(());
        };
        let Some(email) = tester.email().clone() else {
            self.reply(event, "This tester has not registered an email yet.")
                .await;
            return Ok(());
        };

        // Approval is monotonic; re-approving still re-runs the membership
        // and role steps idempotently.
        let first_transition = !request.approved();
        request.approve();

        match self.ensure_group_membership(&app, &email, &tester).await {
            Ok(mutated) => {
                debug!(app = %app.name(), mutated, "Beta group membership ensured");
            }
            Err(error @ (BetaError::ApiKeyNotSet { .. } | BetaError::BetaGroupNotSet { .. })) => {
                self.reply(event, &format!("Cannot add this tester: {error}"))
                    .await;
                return Ok(());
            }
            Err(BetaError::InvalidAttribute { details }) => {
                self.reply(
                    event,
                    &format!(
                        "The distribution service rejected this tester: {}",
                        details.join("; ")
                    ),
                )
                .await;
                return Err(BetaError::InvalidAttribute { details }.into());
            }
            Err(other) => return Err(other.into()),
        }

        self.grant_app_roles(guild_id, &request, &app, &tester, event)
            .await?;

        if first_transition {
            let text = format!(
                "Your request to test {} has been approved! \
                 You should receive an invite at {email} shortly.",
                app.name()
            );
            if let Err(error) = self.gateway.send_dm(tester.discord_id(), &text).await {
                self.reply(event, &format!("Could not DM the tester: {error}"))
                    .await;
            }
        }

        let request = self.store.update_request(&request).await?;
        info!(app = %app.name(), tester = %tester.discord_id(), "Testing request approved");

        self.mark_notifications(event, &request).await;
        Ok(())
    }

    async fn ensure_group_membership(
        &self,
        app: &App,
        email: &str,
        tester: &Tester,
    ) -> Result<bool, BetaError> {
        let remote = self.beta.find_testers(email, app).await?;
        let already_member = match app.beta_group_id().as_deref() {
            Some(group_id) => remote.iter().any(|t| t.in_group(group_id)),
            None => false,
        };
        if already_member {
            return Ok(false);
        }
        self.beta
            .create_tester(
                app,
                email,
                tester.given_name().as_deref(),
                tester.family_name().as_deref(),
            )
            .await?;
        Ok(true)
    }

    /// Grant the app's roles if not already held; a grant failure is reported
    /// and re-raised because the approval is incomplete without it.
    async fn grant_app_roles(
        &self,
        guild_id: &str,
        request: &TestingRequest,
        app: &App,
        tester: &Tester,
        event: &ReactionAdded,
    ) -> GangwayResult<()> {
        let configured = if request.app_reaction_role_ids().is_empty() {
            app.reaction_role_ids().clone()
        } else {
            request.app_reaction_role_ids().clone()
        };
        if configured.is_empty() {
            return Ok(());
        }
        let held = self
            .gateway
            .member_role_ids(guild_id, tester.discord_id())
            .await?;
        let missing: Vec<String> = configured
            .into_iter()
            .filter(|role| !held.contains(role))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        if let Err(error) = self
            .gateway
            .add_member_roles(
                guild_id,
                tester.discord_id(),
                &missing,
                "Testing request approved",
            )
            .await
        {
            self.reply(event, &format!("Failed to grant tester roles: {error}"))
                .await;
            return Err(error);
        }
        Ok(())
    }

    /// Complete the acted-on message with ✅ and mark every other
    /// notification of the same request ✔️, skipping messages already marked.
    async fn mark_notifications(&self, event: &ReactionAdded, request: &TestingRequest) {
        if let Err(error) = self
            .gateway
            .add_reaction(event.channel_id(), event.message_id(), COMPLETION_EMOJI)
            .await
        {
            warn!(%error, "Failed to add completion reaction");
        }

        let mut others: Vec<&String> = Vec::new();
        if let Some(primary) = request.notification_message_id().as_ref() {
            others.push(primary);
        }
        others.extend(request.further_notification_message_ids().iter());

        for message_id in others {
            if message_id == event.message_id() {
                continue;
            }
            match self
                .gateway
                .fetch_message(event.channel_id(), message_id)
                .await
            {
                Ok(message) => {
                    if message.has_any_reaction(&[COMPLETION_EMOJI, ALREADY_HANDLED_EMOJI]) {
                        continue;
                    }
                    if let Err(error) = self
                        .gateway
                        .add_reaction(event.channel_id(), message_id, ALREADY_HANDLED_EMOJI)
                        .await
                    {
                        warn!(%error, message_id, "Failed to mark duplicate notification");
                    }
                }
                Err(error) => {
                    warn!(%error, message_id, "Failed to fetch duplicate notification");
                }
            }
        }
    }

    /// Remove a departed tester from their beta groups and retire the
    /// matching requests.
    #[instrument(skip(self, event), fields(message_id = %event.message_id()))]
    pub async fn handle_removal(&self, event: &ReactionAdded) -> GangwayResult<()> {
        let Some(tester) = self
            .store
            .find_tester_by_leave_message(event.message_id())
            .await?
        else {
            self.reply(event, "No tester is linked to this notification.")
                .await;
            return Ok(());
        };
        let Some(email) = tester.email().clone() else {
            self.reply(event, "This tester never registered an email.")
                .await;
            return Ok(());
        };
        let approved = self
            .store
            .list_requests(
                tester.discord_id(),
                None,
                RequestApprovalFilter::Approved,
                true,
            )
            .await?;
        if approved.is_empty() {
            self.reply(event, "This tester has no active approved requests.")
                .await;
            return Ok(());
        }

        let app_ids: BTreeSet<&String> = approved.iter().map(TestingRequest::app).collect();
        let mut group_ids: Vec<String> = Vec::new();
        for app_id in app_ids {
            let Some(app) = self.store.fetch_app(app_id).await? else {
                continue;
            };
            let Some(group_id) = app.beta_group_id().clone() else {
                continue;
            };
            match self.beta.find_testers(&email, &app).await {
                Ok(remote) => {
                    if remote.len() != 1 {
                        self.reply(
                            event,
                            &format!(
                                "Found {} remote testers for {email} in {}; aborting removal.",
                                remote.len(),
                                app.name()
                            ),
                        )
                        .await;
                        return Ok(());
                    }
                    if remote[0].in_group(&group_id) {
                        if let Err(error) =
                            self.beta.remove_from_group(&app, remote[0].id()).await
                        {
                            self.reply(
                                event,
                                &format!("Failed to remove tester from {}: {error}", app.name()),
                            )
                            .await;
                            return Ok(());
                        }
                        info!(app = %app.name(), tester = %tester.discord_id(), "Removed tester from beta group");
                    }
                    group_ids.push(group_id);
                }
                Err(error) => {
                    self.reply(
                        event,
                        &format!("Could not look up remote testers for {}: {error}", app.name()),
                    )
                    .await;
                    return Ok(());
                }
            }
        }

        let sharing_apps = self.store.find_apps_by_beta_group(&group_ids).await?;
        let sharing_ids: Vec<String> = sharing_apps.iter().map(|app| app.id().clone()).collect();
        let mut affected = self
            .store
            .list_requests(
                tester.discord_id(),
                Some(&sharing_ids),
                RequestApprovalFilter::Approved,
                true,
            )
            .await?;
        for request in &mut affected {
            request.set_removed(true);
        }
        info!(
            tester = %tester.discord_id(),
            requests = affected.len(),
            "Marking requests removed"
        );
        self.store.update_requests(&affected).await?;

        if let Err(error) = self
            .gateway
            .add_reaction(event.channel_id(), event.message_id(), COMPLETION_EMOJI)
            .await
        {
            warn!(%error, "Failed to add completion reaction");
        }
        Ok(())
    }

    /// Post the exit notification when an active tester leaves the guild.
    #[instrument(skip(self, event), fields(guild_id = %event.guild_id(), user_id = %event.user_id()))]
    pub async fn handle_member_left(&self, event: &MemberLeft) -> GangwayResult<()> {
        let Some(channel) = self
            .config
            .exit_notification_channel(event.guild_id())
            .await?
        else {
            return Ok(());
        };
        let active = self
            .store
            .list_requests(event.user_id(), None, RequestApprovalFilter::All, true)
            .await?;
        if active.is_empty() {
            return Ok(());
        }
        let Some(mut tester) = self.store.find_tester(event.user_id()).await? else {
            return Ok(());
        };

        let mut app_names: Vec<String> = Vec::new();
        for request in &active {
            let name = match request.app_name().clone() {
                Some(name) => Some(name),
                None => self
                    .store
                    .fetch_app(request.app())
                    .await?
                    .map(|app| app.name().clone()),
            };
            if let Some(name) = name {
                if !app_names.contains(&name) {
                    app_names.push(name);
                }
            }
        }
        // The event carries the freshest username; the stored one may predate
        // a rename.
        let text = format!(
            "**{}** is testing {} but has left!",
            event.username(),
            app_names.join(", ")
        );
        let sent = self.gateway.send_message(&channel, &text, None, true).await?;
        tester.push_leave_message_id(sent.id().clone());
        self.store.upsert_tester(&tester).await?;
        info!(user_id = %event.user_id(), "Posted tester exit notification");
        Ok(())
    }

    /// Best-effort diagnostic reply to the triggering message.
    async fn reply(&self, event: &ReactionAdded, text: &str) {
        if let Err(error) = self
            .gateway
            .send_message(event.channel_id(), text, Some(event.message_id()), true)
            .await
        {
            warn!(%error, "Failed to post diagnostic reply");
        }
    }
}

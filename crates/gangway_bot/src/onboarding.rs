//! Onboarding engine: reactions on watched messages become testing requests.

use crate::{ConfigCacheService, RoleCacheService};
use chrono::{Duration, Utc};
use gangway_cache::KeyedLocks;
use gangway_core::{App, BetaStore, ReactionRole, RequestApprovalFilter, Tester, TestingRequest};
use gangway_discord::{ChatGateway, ReactionAdded, mention, message_link, relative_timestamp};
use gangway_error::{GangwayError, GangwayResult};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Turns qualifying reactions into testers, testing requests, and approval
/// notifications.
pub struct OnboardingEngine {
    store: Arc<dyn BetaStore>,
    gateway: Arc<dyn ChatGateway>,
    config: Arc<ConfigCacheService>,
    roles: Arc<RoleCacheService>,
    locks: KeyedLocks,
    registration_throttle: Duration,
}

impl OnboardingEngine {
    /// Create an engine.
    pub fn new(
        store: Arc<dyn BetaStore>,
        gateway: Arc<dyn ChatGateway>,
        config: Arc<ConfigCacheService>,
        roles: Arc<RoleCacheService>,
        registration_throttle_minutes: u64,
    ) -> Self {
        Self {
            store,
            gateway,
            config,
            roles,
            locks: KeyedLocks::new(),
            registration_throttle: Duration::minutes(registration_throttle_minutes as i64),
        }
    }

    /// Handle a reaction on a watched message.
    #[instrument(skip(self, event), fields(message_id = %event.message_id(), user_id = %event.user_id()))]
    pub async fn handle_reaction(&self, event: &ReactionAdded) -> GangwayResult<()> {
        let Some(guild_id) = event.guild_id().as_deref() else {
            return Ok(());
        };
        let Some(role) = self
            .roles
            .reaction_role(guild_id, event.message_id(), event.emoji())
            .await?
        else {
            debug!("No reaction-role mapping for this emoji");
            return Ok(());
        };

        if *role.requires_rules_agreement()
            && !self.holds_agreement_role(guild_id, event).await?
        {
            self.send_rules_reminder(guild_id, event).await?;
            return Ok(());
        }

        if role.app_ids().is_empty() {
            return self.grant_plain_role(guild_id, event, &role).await;
        }

        let app_id = role.app_ids()[0].clone();
        let Some(app) = self.store.fetch_app(&app_id).await? else {
            warn!(app_id, "Reaction-role mapping points at a missing app");
            return Ok(());
        };

        // Steps behind the per-user lock: find-or-create tester and request,
        // and the registration-prompt branch. The notification goes out after
        // the lock is released.
        let (tester, request) = {
            let _guard = self
                .locks
                .acquire(&format!("user:{}", event.user_id()))
                .await;

            let tester = self.upsert_reacting_tester(event).await?;
            let request = self
                .find_or_create_request(&tester, &app, guild_id, event)
                .await?;

            if tester.email().is_none() {
                self.prompt_for_registration(&tester, &app, event).await?;
                return Ok(());
            }
            (tester, request)
        };

        self.notify_approvers(guild_id, &tester, &app, request, event)
            .await
    }

    async fn holds_agreement_role(
        &self,
        guild_id: &str,
        event: &ReactionAdded,
    ) -> GangwayResult<bool> {
        let Some(required) = self.config.rule_agreement_role(guild_id).await? else {
            // Gate configured on the mapping but no role configured: nobody
            // passes until the guild config is fixed.
            warn!(guild_id, "Rule agreement required but no role configured");
            return Ok(false);
        };
        let held = match event.member() {
            Some(member) => member.role_ids().clone(),
            None => {
                self.gateway
                    .member_role_ids(guild_id, event.user_id())
                    .await?
            }
        };
        Ok(held.contains(&required))
    }

    async fn send_rules_reminder(
        &self,
        guild_id: &str,
        event: &ReactionAdded,
    ) -> GangwayResult<()> {
        let mut text = "You need to agree to the rules before signing up to test apps.".to_string();
        if let Some(agreement) = self.config.rule_agreement_message(guild_id).await? {
            text.push_str(&format!(
                "\nPlease react to the rules message first: {}",
                message_link(guild_id, agreement.channel_id(), agreement.message_id())
            ));
        }
        info!(user_id = %event.user_id(), "Reminding user to agree to the rules");
        self.gateway.send_dm(event.user_id(), &text).await?;
        Ok(())
    }

    async fn grant_plain_role(
        &self,
        guild_id: &str,
        event: &ReactionAdded,
        role: &ReactionRole,
    ) -> GangwayResult<()> {
        let held = match event.member() {
            Some(member) => member.role_ids().clone(),
            None => {
                self.gateway
                    .member_role_ids(guild_id, event.user_id())
                    .await?
            }
        };
        if held.contains(role.role_id()) {
            debug!(role_id = %role.role_id(), "Role already held");
            return Ok(());
        }
        info!(role_id = %role.role_id(), user_id = %event.user_id(), "Granting reaction role");
        self.gateway
            .add_member_roles(
                guild_id,
                event.user_id(),
                std::slice::from_ref(role.role_id()),
                "Reaction role",
            )
            .await
    }

    async fn upsert_reacting_tester(&self, event: &ReactionAdded) -> GangwayResult<Tester> {
        let username = event
            .member()
            .as_ref()
            .map(|member| member.username().clone())
            .unwrap_or_else(|| event.user_id().clone());
        let mut tester = match self.store.find_tester(event.user_id()).await? {
            Some(existing) => existing,
            None => {
                info!(user_id = %event.user_id(), "Creating tester on first reaction");
                Tester::new(username.clone(), event.user_id().clone())
            }
        };
        tester.set_username(username);
        self.store.upsert_tester(&tester).await
    }

    async fn find_or_create_request(
        &self,
        tester: &Tester,
        app: &App,
        guild_id: &str,
        event: &ReactionAdded,
    ) -> GangwayResult<TestingRequest> {
        let app_ids = vec![app.id().clone()];
        let existing = self
            .store
            .list_requests(
                event.user_id(),
                Some(&app_ids),
                RequestApprovalFilter::All,
                true,
            )
            .await?;
        if let Some(request) = existing.into_iter().next_back() {
            debug!(app = %app.name(), "Reusing existing active request");
            return Ok(request);
        }
        let tester_ref = tester.id().clone().ok_or_else(|| {
            GangwayError::from(gangway_error::JsonError::new(
                "upserted tester has no record id",
            ))
        })?;
        info!(app = %app.name(), user_id = %event.user_id(), "Creating testing request");
        self.store
            .add_request(&TestingRequest::new(
                tester_ref,
                event.user_id().clone(),
                app.id().clone(),
                guild_id.to_string(),
            ))
            .await
    }

    /// Send the registration-prompt DM unless one went out recently.
    async fn prompt_for_registration(
        &self,
        tester: &Tester,
        app: &App,
        event: &ReactionAdded,
    ) -> GangwayResult<()> {
        if let Some(previous_id) = tester.registration_message_id().as_deref() {
            // An unfetchable previous prompt (deleted DM, stale id) falls
            // through to re-prompting.
            if let Ok(previous) = self
                .gateway
                .fetch_dm_message(event.user_id(), previous_id)
                .await
            {
                if Utc::now() - *previous.created() < self.registration_throttle {
                    debug!(user_id = %event.user_id(), "Registration prompt still fresh, not re-sending");
                    return Ok(());
                }
            }
        }
        let text = format!(
            "Thanks for signing up to test {}! \
             Before we can send you an invite, we need your email address. \
             Please reply here with the email you use for beta testing.",
            app.name()
        );
        info!(user_id = %event.user_id(), "Sending registration prompt");
        let sent = self.gateway.send_dm(event.user_id(), &text).await?;
        let mut tester = tester.clone();
        tester.set_registration_message_id(sent.id().clone());
        self.store.upsert_tester(&tester).await?;
        Ok(())
    }

    async fn notify_approvers(
        &self,
        guild_id: &str,
        tester: &Tester,
        app: &App,
        mut request: TestingRequest,
        event: &ReactionAdded,
    ) -> GangwayResult<()> {
        let channel = match app.approval_channel_id().clone() {
            Some(channel) => Some(channel),
            None => self.config.default_approvals_channel(guild_id).await?,
        };
        let Some(channel) = channel else {
            warn!(app = %app.name(), guild_id, "No approval channel configured");
            return Ok(());
        };
        let request_link = self.store.request_url(&request)?;
        let requester = mention(event.user_id());
        let email = tester.email().as_deref().unwrap_or_default();

        if let Some(primary_id) = request.notification_message_id().clone() {
            let first_asked = request
                .created()
                .as_ref()
                .map(|at| format!(" First asked {}.", relative_timestamp(at)))
                .unwrap_or_default();
            let text = format!(
                "{requester} ({}, {email}) asked again to test {}.{first_asked}\nOriginal request: {}",
                tester.display_name(),
                app.name(),
                message_link(guild_id, &channel, &primary_id)
            );
            let sent = self.gateway.send_message(&channel, &text, None, true).await?;
            request.push_further_notification_message_id(sent.id().clone());
        } else {
            let text = format!(
                "{requester} ({}, {email}) would like to test {}.\n{request_link}",
                tester.display_name(),
                app.name()
            );
            let sent = self.gateway.send_message(&channel, &text, None, true).await?;
            request.set_notification_message_id(sent.id().clone());
        }
        self.store.update_request(&request).await?;
        Ok(())
    }
}

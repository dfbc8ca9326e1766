//! Async seams between the engines and the record store.
//!
//! The engines depend on these traits rather than on the concrete REST
//! storages, so tests can substitute in-memory fakes.

use crate::{App, ConfigEntry, ReactionRole, Tester, TestingRequest};
use async_trait::async_trait;
use gangway_error::GangwayResult;

/// Approval-state filter for request listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestApprovalFilter {
    /// All requests regardless of approval state
    All,
    /// Only approved requests
    Approved,
    /// Only not-yet-approved requests
    Unapproved,
}

/// Access to the beta-testing tables of the record store.
#[async_trait]
pub trait BetaStore: Send + Sync {
    /// Find a tester by chat-platform user id.
    async fn find_tester(&self, discord_id: &str) -> GangwayResult<Option<Tester>>;

    /// Fetch a tester by store record id.
    async fn fetch_tester(&self, record_id: &str) -> GangwayResult<Option<Tester>>;

    /// Find the tester whose leave-notification list contains `message_id`.
    async fn find_tester_by_leave_message(&self, message_id: &str)
    -> GangwayResult<Option<Tester>>;

    /// Insert or update a tester, keyed by chat-platform user id.
    async fn upsert_tester(&self, tester: &Tester) -> GangwayResult<Tester>;

    /// Fetch an app by store record id.
    async fn fetch_app(&self, record_id: &str) -> GangwayResult<Option<App>>;

    /// Find every app whose beta group is one of `group_ids`.
    async fn find_apps_by_beta_group(&self, group_ids: &[String]) -> GangwayResult<Vec<App>>;

    /// Insert a new testing request.
    async fn add_request(&self, request: &TestingRequest) -> GangwayResult<TestingRequest>;

    /// Update an existing testing request.
    async fn update_request(&self, request: &TestingRequest) -> GangwayResult<TestingRequest>;

    /// Update a batch of existing testing requests.
    async fn update_requests(
        &self,
        requests: &[TestingRequest],
    ) -> GangwayResult<Vec<TestingRequest>>;

    /// List a tester's requests, optionally narrowed to specific apps and an
    /// approval state, sorted by creation time.
    async fn list_requests(
        &self,
        tester_discord_id: &str,
        app_ids: Option<&[String]>,
        approval: RequestApprovalFilter,
        exclude_removed: bool,
    ) -> GangwayResult<Vec<TestingRequest>>;

    /// Resolve the request whose primary or duplicate notification message
    /// matches `message_id`.
    async fn fetch_request_by_message(
        &self,
        message_id: &str,
    ) -> GangwayResult<Option<TestingRequest>>;

    /// All message ids with at least one reaction-role mapping.
    async fn list_watched_message_ids(&self) -> GangwayResult<Vec<String>>;

    /// All per-app approval channel ids.
    async fn list_approvals_channel_ids(&self) -> GangwayResult<Vec<String>>;

    /// All reaction-role mappings (bulk prefetch for the cache service).
    async fn list_reaction_roles(&self) -> GangwayResult<Vec<ReactionRole>>;

    /// Fetch one reaction-role mapping by its (guild, message, emoji) key.
    async fn fetch_reaction_role(
        &self,
        guild_id: &str,
        message_id: &str,
        reaction: &str,
    ) -> GangwayResult<Option<ReactionRole>>;

    /// Deep link to a request record, for approval notifications.
    fn request_url(&self, request: &TestingRequest) -> GangwayResult<String>;
}

/// Access to the per-guild configuration table.
#[async_trait]
pub trait RemoteConfig: Send + Sync {
    /// List every config entry across guilds.
    async fn list_config(&self) -> GangwayResult<Vec<ConfigEntry>>;

    /// Fetch one config entry by guild and key.
    async fn retrieve_config(&self, guild_id: &str, key: &str)
    -> GangwayResult<Option<ConfigEntry>>;
}

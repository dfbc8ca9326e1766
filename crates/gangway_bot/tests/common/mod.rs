//! In-memory fakes of the store, gateway, and distribution seams, plus a
//! fully wired pipeline harness.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gangway_beta::{BetaDistribution, BetaResult, BetaTester};
use gangway_bot::{
    ApprovalEngine, ConfigCacheService, Dispatcher, OnboardingEngine, RoleCacheService,
};
use gangway_core::{
    App, BetaStore, ConfigEntry, ReactionRole, Record, RemoteConfig, RequestApprovalFilter,
    Tester, TestingRequest, keys,
};
use gangway_discord::{ChatGateway, ChatMessage, MemberInfo, ReactionAdded, SentMessage};
use gangway_error::{BetaError, ChatError, GangwayResult, JsonError, StoreError};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const GUILD: &str = "guild-7";

// ---------------------------------------------------------------------------
// Record store fake

/// Record-backed store fake. Entities round-trip through the same
/// `from_record`/`to_payload` codecs the real storage uses, and every trait
/// call bumps a counter so tests can assert the store was left alone.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

#[derive(Default)]
struct StoreState {
    testers: Vec<Record>,
    apps: Vec<Record>,
    requests: Vec<Record>,
    reaction_roles: Vec<Record>,
    config: Vec<ConfigEntry>,
    next_id: u64,
}

impl InMemoryStore {
    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of store round-trips so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent lookup fail the way a store outage would.
    pub fn fail_store_calls(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn outage(&self) -> GangwayResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(
                StoreError::message("https://records.example", "service unavailable").into(),
            );
        }
        Ok(())
    }

    pub fn seed_app(
        &self,
        id: &str,
        name: &str,
        approval_channel: Option<&str>,
        role_ids: &[&str],
        beta_key_id: Option<&str>,
        beta_group_id: Option<&str>,
    ) {
        let mut fields = json!({ "Name": name }).as_object().cloned().unwrap();
        if let Some(channel) = approval_channel {
            fields.insert("Approval Channel".to_string(), json!(channel));
        }
        if !role_ids.is_empty() {
            fields.insert("Reaction Role IDs".to_string(), json!(role_ids));
        }
        if let Some(key) = beta_key_id {
            fields.insert("Beta Key ID".to_string(), json!(key));
        }
        if let Some(group) = beta_group_id {
            fields.insert("Beta Group ID".to_string(), json!(group));
        }
        self.state.lock().unwrap().apps.push(Record {
            id: id.to_string(),
            fields,
            created_time: None,
        });
    }

    pub fn seed_reaction_role(
        &self,
        id: &str,
        guild_id: &str,
        message_id: &str,
        reaction: &str,
        role_id: &str,
        app_ids: &[&str],
        requires_rules: bool,
    ) {
        let mut fields = json!({
            "Server ID": guild_id,
            "Message ID": message_id,
            "Reaction": reaction,
            "Role": role_id,
        })
        .as_object()
        .cloned()
        .unwrap();
        if !app_ids.is_empty() {
            fields.insert("Apps".to_string(), json!(app_ids));
        }
        if requires_rules {
            fields.insert("Requires Rules Agreement".to_string(), json!(true));
        }
        self.state.lock().unwrap().reaction_roles.push(Record {
            id: id.to_string(),
            fields,
            created_time: None,
        });
    }

    pub fn seed_config(&self, guild_id: &str, key: &str, value: &str) {
        self.state
            .lock()
            .unwrap()
            .config
            .push(ConfigEntry::new(guild_id, key, value));
    }

    pub fn seed_tester(&self, id: &str, username: &str, discord_id: &str, email: Option<&str>) {
        let mut fields = json!({ "Username": username, "Discord ID": discord_id })
            .as_object()
            .cloned()
            .unwrap();
        if let Some(email) = email {
            fields.insert("Email".to_string(), json!(email));
        }
        self.state.lock().unwrap().testers.push(Record {
            id: id.to_string(),
            fields,
            created_time: None,
        });
    }

    pub fn seed_approved_request(
        &self,
        id: &str,
        tester_record_id: &str,
        discord_id: &str,
        app_id: &str,
        guild_id: &str,
    ) {
        self.seed_request_record(id, tester_record_id, discord_id, app_id, guild_id, true);
    }

    pub fn seed_pending_request(
        &self,
        id: &str,
        tester_record_id: &str,
        discord_id: &str,
        app_id: &str,
        guild_id: &str,
    ) {
        self.seed_request_record(id, tester_record_id, discord_id, app_id, guild_id, false);
    }

    fn seed_request_record(
        &self,
        id: &str,
        tester_record_id: &str,
        discord_id: &str,
        app_id: &str,
        guild_id: &str,
        approved: bool,
    ) {
        let mut fields = json!({
            "Tester": [tester_record_id],
            "Tester Discord ID": [discord_id],
            "App": [app_id],
            "Server ID": guild_id,
            "Created": Utc::now().to_rfc3339(),
        })
        .as_object()
        .cloned()
        .unwrap();
        if approved {
            fields.insert("Approved".to_string(), json!(true));
        }
        self.state.lock().unwrap().requests.push(Record {
            id: id.to_string(),
            fields,
            created_time: None,
        });
    }

    /// Simulate the registration form landing an email on a tester.
    pub fn set_tester_email(&self, discord_id: &str, email: &str) {
        let mut state = self.state.lock().unwrap();
        let record = state
            .testers
            .iter_mut()
            .find(|r| r.opt_str("Discord ID").as_deref() == Some(discord_id))
            .unwrap();
        record.fields.insert("Email".to_string(), json!(email));
    }

    pub fn add_leave_message(&self, discord_id: &str, message_id: &str) {
        let mut state = self.state.lock().unwrap();
        let record = state
            .testers
            .iter_mut()
            .find(|r| r.opt_str("Discord ID").as_deref() == Some(discord_id))
            .unwrap();
        let joined = match record.opt_str("Leave Message IDs") {
            Some(existing) if !existing.is_empty() => format!("{existing},{message_id}"),
            _ => message_id.to_string(),
        };
        record
            .fields
            .insert("Leave Message IDs".to_string(), json!(joined));
    }

    pub fn all_requests(&self) -> Vec<TestingRequest> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .map(|r| TestingRequest::from_record(r).unwrap())
            .collect()
    }

    pub fn active_requests(&self, discord_id: &str, app_id: &str) -> Vec<TestingRequest> {
        self.all_requests()
            .into_iter()
            .filter(|r| {
                r.tester_discord_id() == discord_id && r.app() == app_id && !*r.removed()
            })
            .collect()
    }

    pub fn request(&self, record_id: &str) -> TestingRequest {
        self.all_requests()
            .into_iter()
            .find(|r| r.id().as_deref() == Some(record_id))
            .unwrap()
    }

    pub fn tester(&self, discord_id: &str) -> Option<Tester> {
        self.state
            .lock()
            .unwrap()
            .testers
            .iter()
            .find(|r| r.opt_str("Discord ID").as_deref() == Some(discord_id))
            .map(|r| Tester::from_record(r).unwrap())
    }
}

#[async_trait]
impl BetaStore for InMemoryStore {
    async fn find_tester(&self, discord_id: &str) -> GangwayResult<Option<Tester>> {
        self.tick();
        self.outage()?;
        let state = self.state.lock().unwrap();
        state
            .testers
            .iter()
            .find(|r| r.opt_str("Discord ID").as_deref() == Some(discord_id))
            .map(Tester::from_record)
            .transpose()
    }

    async fn fetch_tester(&self, record_id: &str) -> GangwayResult<Option<Tester>> {
        self.tick();
        let state = self.state.lock().unwrap();
        state
            .testers
            .iter()
            .find(|r| r.id == record_id)
            .map(Tester::from_record)
            .transpose()
    }

    async fn find_tester_by_leave_message(
        &self,
        message_id: &str,
    ) -> GangwayResult<Option<Tester>> {
        self.tick();
        let state = self.state.lock().unwrap();
        for record in &state.testers {
            let tester = Tester::from_record(record)?;
            if tester.leave_message_ids().iter().any(|id| id == message_id) {
                return Ok(Some(tester));
            }
        }
        Ok(None)
    }

    async fn upsert_tester(&self, tester: &Tester) -> GangwayResult<Tester> {
        self.tick();
        let payload = tester.to_payload();
        let mut state = self.state.lock().unwrap();
        if let Some(record) = state
            .testers
            .iter_mut()
            .find(|r| r.opt_str("Discord ID").as_deref() == Some(tester.discord_id().as_str()))
        {
            for (name, value) in payload.fields {
                record.fields.insert(name, value);
            }
            return Tester::from_record(record);
        }
        state.next_id += 1;
        let record = Record {
            id: format!("recT{}", state.next_id),
            fields: payload.fields,
            created_time: None,
        };
        state.testers.push(record.clone());
        Tester::from_record(&record)
    }

    async fn fetch_app(&self, record_id: &str) -> GangwayResult<Option<App>> {
        self.tick();
        self.outage()?;
        let state = self.state.lock().unwrap();
        state
            .apps
            .iter()
            .find(|r| r.id == record_id)
            .map(App::from_record)
            .transpose()
    }

    async fn find_apps_by_beta_group(&self, group_ids: &[String]) -> GangwayResult<Vec<App>> {
        self.tick();
        let state = self.state.lock().unwrap();
        let mut apps = Vec::new();
        for record in &state.apps {
            let app = App::from_record(record)?;
            if app
                .beta_group_id()
                .as_ref()
                .is_some_and(|group| group_ids.contains(group))
            {
                apps.push(app);
            }
        }
        Ok(apps)
    }

    async fn add_request(&self, request: &TestingRequest) -> GangwayResult<TestingRequest> {
        self.tick();
        let mut state = self.state.lock().unwrap();
        let mut fields = request.to_payload().fields;
        fields.insert(
            "Tester Discord ID".to_string(),
            json!([request.tester_discord_id()]),
        );
        fields.insert("Created".to_string(), json!(Utc::now().to_rfc3339()));
        // Lookup columns the store derives from the linked app record.
        if let Some(app) = state.apps.iter().find(|r| r.id == *request.app()) {
            fields.insert("App Name".to_string(), json!([app.str_field("Name")?]));
            if let Some(channel) = app.opt_str("Approval Channel") {
                fields.insert("Approval Channel".to_string(), json!([channel]));
            }
            let roles = app.str_list("Reaction Role IDs");
            if !roles.is_empty() {
                fields.insert("App Reaction Role IDs".to_string(), json!(roles));
            }
        }
        state.next_id += 1;
        let record = Record {
            id: format!("recR{}", state.next_id),
            fields,
            created_time: None,
        };
        state.requests.push(record.clone());
        TestingRequest::from_record(&record)
    }

    async fn update_request(&self, request: &TestingRequest) -> GangwayResult<TestingRequest> {
        let mut updated = self.update_requests(std::slice::from_ref(request)).await?;
        updated
            .pop()
            .ok_or_else(|| JsonError::new("update returned no records").into())
    }

    async fn update_requests(
        &self,
        requests: &[TestingRequest],
    ) -> GangwayResult<Vec<TestingRequest>> {
        self.tick();
        let mut state = self.state.lock().unwrap();
        let mut updated = Vec::with_capacity(requests.len());
        for request in requests {
            let payload = request.to_payload();
            let id = payload
                .id
                .ok_or_else(|| JsonError::new("cannot update a request without a record id"))?;
            let record = state
                .requests
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| JsonError::new(format!("no request record '{id}'")))?;
            for (name, value) in payload.fields {
                record.fields.insert(name, value);
            }
            updated.push(TestingRequest::from_record(record)?);
        }
        Ok(updated)
    }

    async fn list_requests(
        &self,
        tester_discord_id: &str,
        app_ids: Option<&[String]>,
        approval: RequestApprovalFilter,
        exclude_removed: bool,
    ) -> GangwayResult<Vec<TestingRequest>> {
        self.tick();
        let state = self.state.lock().unwrap();
        let mut matches = Vec::new();
        for record in &state.requests {
            let request = TestingRequest::from_record(record)?;
            if request.tester_discord_id() != tester_discord_id {
                continue;
            }
            if let Some(ids) = app_ids {
                if !ids.contains(request.app()) {
                    continue;
                }
            }
            let wanted = match approval {
                RequestApprovalFilter::All => true,
                RequestApprovalFilter::Approved => request.approved(),
                RequestApprovalFilter::Unapproved => !request.approved(),
            };
            if !wanted || (exclude_removed && *request.removed()) {
                continue;
            }
            matches.push(request);
        }
        matches.sort_by_key(|r| *r.created());
        Ok(matches)
    }

    async fn fetch_request_by_message(
        &self,
        message_id: &str,
    ) -> GangwayResult<Option<TestingRequest>> {
        self.tick();
        let state = self.state.lock().unwrap();
        for record in &state.requests {
            let request = TestingRequest::from_record(record)?;
            let is_primary = request.notification_message_id().as_deref() == Some(message_id);
            let is_further = request
                .further_notification_message_ids()
                .iter()
                .any(|id| id == message_id);
            if is_primary || is_further {
                return Ok(Some(request));
            }
        }
        Ok(None)
    }

    async fn list_watched_message_ids(&self) -> GangwayResult<Vec<String>> {
        self.tick();
        let state = self.state.lock().unwrap();
        Ok(state
            .reaction_roles
            .iter()
            .filter_map(|r| r.opt_str("Message ID"))
            .collect())
    }

    async fn list_approvals_channel_ids(&self) -> GangwayResult<Vec<String>> {
        self.tick();
        let state = self.state.lock().unwrap();
        Ok(state
            .apps
            .iter()
            .filter_map(|r| r.opt_str("Approval Channel"))
            .collect())
    }

    async fn list_reaction_roles(&self) -> GangwayResult<Vec<ReactionRole>> {
        self.tick();
        let state = self.state.lock().unwrap();
        state
            .reaction_roles
            .iter()
            .map(ReactionRole::from_record)
            .collect()
    }

    async fn fetch_reaction_role(
        &self,
        guild_id: &str,
        message_id: &str,
        reaction: &str,
    ) -> GangwayResult<Option<ReactionRole>> {
        self.tick();
        let state = self.state.lock().unwrap();
        for record in &state.reaction_roles {
            let role = ReactionRole::from_record(record)?;
            if role.guild_id() == guild_id
                && role.message_id() == message_id
                && role.reaction_name() == reaction
            {
                return Ok(Some(role));
            }
        }
        Ok(None)
    }

    fn request_url(&self, request: &TestingRequest) -> GangwayResult<String> {
        self.tick();
        let id = request
            .id()
            .clone()
            .ok_or_else(|| JsonError::new("request has no record id"))?;
        Ok(format!("https://records.example/Testing%20Requests/{id}"))
    }
}

#[async_trait]
impl RemoteConfig for InMemoryStore {
    async fn list_config(&self) -> GangwayResult<Vec<ConfigEntry>> {
        self.tick();
        Ok(self.state.lock().unwrap().config.clone())
    }

    async fn retrieve_config(
        &self,
        guild_id: &str,
        key: &str,
    ) -> GangwayResult<Option<ConfigEntry>> {
        self.tick();
        let state = self.state.lock().unwrap();
        Ok(state
            .config
            .iter()
            .find(|entry| entry.guild_id() == guild_id && entry.key() == key)
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// Chat gateway fake

#[derive(Debug, Clone)]
pub struct PostedMessage {
    pub id: String,
    pub channel_id: String,
    pub text: String,
    pub reply_to: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SentDm {
    pub message_id: String,
    pub user_id: String,
    pub text: String,
}

struct MessageEntry {
    channel_id: String,
    author_id: String,
    created: DateTime<Utc>,
    reactions: Vec<String>,
}

#[derive(Default)]
struct GatewayState {
    next_id: u64,
    messages: HashMap<String, MessageEntry>,
    posted: Vec<PostedMessage>,
    dms: Vec<SentDm>,
    member_roles: HashMap<(String, String), Vec<String>>,
    grants: HashMap<(String, String), Vec<String>>,
    reaction_log: Vec<(String, String, String)>,
}

/// Chat gateway fake with a message registry, so notifications the pipeline
/// sends can later be fetched, reacted on, and backdated.
#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<GatewayState>,
}

impl FakeGateway {
    /// Register a pre-existing bot-authored message, e.g. a leave notification
    /// from a previous session.
    pub fn register_bot_message(&self, message_id: &str, channel_id: &str) {
        self.state.lock().unwrap().messages.insert(
            message_id.to_string(),
            MessageEntry {
                channel_id: channel_id.to_string(),
                author_id: "bot".to_string(),
                created: Utc::now(),
                reactions: Vec::new(),
            },
        );
    }

    /// Rewrite a message's creation time, for throttle-window tests.
    pub fn backdate_message(&self, message_id: &str, created: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap();
        state.messages.get_mut(message_id).unwrap().created = created;
    }

    pub fn set_member_roles(&self, guild_id: &str, user_id: &str, roles: &[&str]) {
        self.state.lock().unwrap().member_roles.insert(
            (guild_id.to_string(), user_id.to_string()),
            roles.iter().map(|r| r.to_string()).collect(),
        );
    }

    pub fn posted(&self) -> Vec<PostedMessage> {
        self.state.lock().unwrap().posted.clone()
    }

    pub fn posted_in(&self, channel_id: &str) -> Vec<PostedMessage> {
        self.posted()
            .into_iter()
            .filter(|m| m.channel_id == channel_id)
            .collect()
    }

    pub fn dms_to(&self, user_id: &str) -> Vec<SentDm> {
        self.state
            .lock()
            .unwrap()
            .dms
            .iter()
            .filter(|dm| dm.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn reactions_on(&self, message_id: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .messages
            .get(message_id)
            .map(|entry| entry.reactions.clone())
            .unwrap_or_default()
    }

    /// Every add_reaction call made so far, as (channel, message, emoji).
    pub fn reaction_log(&self) -> Vec<(String, String, String)> {
        self.state.lock().unwrap().reaction_log.clone()
    }

    pub fn grants_for(&self, guild_id: &str, user_id: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .grants
            .get(&(guild_id.to_string(), user_id.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    fn store_message(state: &mut GatewayState, channel_id: &str) -> String {
        state.next_id += 1;
        let id = format!("m{}", state.next_id);
        state.messages.insert(
            id.clone(),
            MessageEntry {
                channel_id: channel_id.to_string(),
                author_id: "bot".to_string(),
                created: Utc::now(),
                reactions: Vec::new(),
            },
        );
        id
    }

    fn view(id: &str, entry: &MessageEntry) -> ChatMessage {
        ChatMessage::new(
            id.to_string(),
            entry.channel_id.clone(),
            entry.author_id.clone(),
            entry.created,
            entry.reactions.clone(),
            true,
        )
    }
}

#[async_trait]
impl ChatGateway for FakeGateway {
    fn own_user_id(&self) -> String {
        "bot".to_string()
    }

    async fn send_message(
        &self,
        channel_id: &str,
        text: &str,
        reply_to: Option<&str>,
        _suppress_embeds: bool,
    ) -> GangwayResult<SentMessage> {
        let mut state = self.state.lock().unwrap();
        let id = Self::store_message(&mut state, channel_id);
        state.posted.push(PostedMessage {
            id: id.clone(),
            channel_id: channel_id.to_string(),
            text: text.to_string(),
            reply_to: reply_to.map(|r| r.to_string()),
        });
        Ok(SentMessage::new(id, channel_id.to_string()))
    }

    async fn send_dm(&self, user_id: &str, text: &str) -> GangwayResult<SentMessage> {
        let channel = format!("dm-{user_id}");
        let mut state = self.state.lock().unwrap();
        let id = Self::store_message(&mut state, &channel);
        state.dms.push(SentDm {
            message_id: id.clone(),
            user_id: user_id.to_string(),
            text: text.to_string(),
        });
        Ok(SentMessage::new(id, channel))
    }

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> GangwayResult<()> {
        let mut state = self.state.lock().unwrap();
        state.reaction_log.push((
            channel_id.to_string(),
            message_id.to_string(),
            emoji.to_string(),
        ));
        if let Some(entry) = state.messages.get_mut(message_id) {
            entry.reactions.push(emoji.to_string());
        }
        Ok(())
    }

    async fn remove_own_reaction(
        &self,
        _channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> GangwayResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(entry) = state.messages.get_mut(message_id) {
            if let Some(pos) = entry.reactions.iter().position(|name| name == emoji) {
                entry.reactions.remove(pos);
            }
        }
        Ok(())
    }

    async fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> GangwayResult<ChatMessage> {
        let state = self.state.lock().unwrap();
        let entry = state
            .messages
            .get(message_id)
            .filter(|entry| entry.channel_id == channel_id)
            .ok_or_else(|| ChatError::new(format!("unknown message '{message_id}'")))?;
        Ok(Self::view(message_id, entry))
    }

    async fn fetch_dm_message(
        &self,
        user_id: &str,
        message_id: &str,
    ) -> GangwayResult<ChatMessage> {
        self.fetch_message(&format!("dm-{user_id}"), message_id).await
    }

    async fn member_role_ids(&self, guild_id: &str, user_id: &str) -> GangwayResult<Vec<String>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .member_roles
            .get(&(guild_id.to_string(), user_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn add_member_roles(
        &self,
        guild_id: &str,
        user_id: &str,
        role_ids: &[String],
        _reason: &str,
    ) -> GangwayResult<()> {
        let mut state = self.state.lock().unwrap();
        let key = (guild_id.to_string(), user_id.to_string());
        state
            .member_roles
            .entry(key.clone())
            .or_default()
            .extend(role_ids.iter().cloned());
        state
            .grants
            .entry(key)
            .or_default()
            .extend(role_ids.iter().cloned());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Beta-distribution fake

#[derive(Default)]
struct BetaState {
    remote: Vec<BetaTester>,
    next_id: u64,
    created: Vec<(String, String)>,
    removed: Vec<(String, String)>,
}

/// Distribution-service fake enforcing the same per-app credential checks as
/// the real client.
#[derive(Default)]
pub struct FakeBeta {
    state: Mutex<BetaState>,
}

impl FakeBeta {
    pub fn seed_remote(&self, tester: BetaTester) {
        self.state.lock().unwrap().remote.push(tester);
    }

    /// (app id, email) pairs passed to create_tester.
    pub fn created(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().created.clone()
    }

    /// (group id, remote tester id) pairs removed so far.
    pub fn removed(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().removed.clone()
    }
}

fn credentials(app: &App) -> BetaResult<(String, String)> {
    let key = app.beta_key_id().clone().ok_or_else(|| BetaError::ApiKeyNotSet {
        app_name: app.name().clone(),
    })?;
    let group = app
        .beta_group_id()
        .clone()
        .ok_or_else(|| BetaError::BetaGroupNotSet {
            app_name: app.name().clone(),
        })?;
    Ok((key, group))
}

#[async_trait]
impl BetaDistribution for FakeBeta {
    async fn find_testers(&self, email: &str, app: &App) -> BetaResult<Vec<BetaTester>> {
        credentials(app)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .remote
            .iter()
            .filter(|t| t.email() == email)
            .cloned()
            .collect())
    }

    async fn create_tester(
        &self,
        app: &App,
        email: &str,
        _given_name: Option<&str>,
        _family_name: Option<&str>,
    ) -> BetaResult<()> {
        let (_, group) = credentials(app)?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let tester = BetaTester::new(format!("bt{}", state.next_id), email, vec![group]);
        state.created.push((app.id().clone(), email.to_string()));
        state.remote.push(tester);
        Ok(())
    }

    async fn remove_from_group(&self, app: &App, tester_id: &str) -> BetaResult<()> {
        let (_, group) = credentials(app)?;
        let mut state = self.state.lock().unwrap();
        if let Some(pos) = state.remote.iter().position(|t| t.id() == tester_id) {
            let old = state.remote.remove(pos);
            let groups = old
                .beta_group_ids()
                .iter()
                .filter(|g| **g != group)
                .cloned()
                .collect();
            state
                .remote
                .push(BetaTester::new(old.id().clone(), old.email().clone(), groups));
        }
        state.removed.push((group, tester_id.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub gateway: Arc<FakeGateway>,
    pub beta: Arc<FakeBeta>,
    pub config_cache: Arc<ConfigCacheService>,
    pub role_cache: Arc<RoleCacheService>,
    pub dispatcher: Dispatcher,
}

pub fn harness() -> Harness {
    harness_with_throttle(30)
}

pub fn harness_with_throttle(registration_throttle_minutes: u64) -> Harness {
    let store = Arc::new(InMemoryStore::default());
    let gateway = Arc::new(FakeGateway::default());
    let beta = Arc::new(FakeBeta::default());
    let config_cache = Arc::new(ConfigCacheService::new(store.clone()));
    let role_cache = Arc::new(RoleCacheService::new(store.clone()));
    let onboarding = OnboardingEngine::new(
        store.clone(),
        gateway.clone(),
        config_cache.clone(),
        role_cache.clone(),
        registration_throttle_minutes,
    );
    let approval = ApprovalEngine::new(
        store.clone(),
        gateway.clone(),
        config_cache.clone(),
        beta.clone(),
    );
    let dispatcher = Dispatcher::new(
        gateway.clone(),
        config_cache.clone(),
        role_cache.clone(),
        onboarding,
        approval,
    );
    Harness {
        store,
        gateway,
        beta,
        config_cache,
        role_cache,
        dispatcher,
    }
}

/// One app with an approval channel, one signup mapping for it, and the two
/// moderator emoji sets.
pub fn seed_standard(h: &Harness) {
    h.store.seed_app(
        "recA1",
        "Snail Mail",
        Some("chan-approval"),
        &["role-beta"],
        Some("key-1"),
        Some("group-1"),
    );
    h.store.seed_reaction_role(
        "rr1",
        GUILD,
        "msg-signup",
        "🐌",
        "role-tester",
        &["recA1"],
        false,
    );
    h.store.seed_config(GUILD, keys::APPROVAL_EMOJIS, r#"["👍"]"#);
    h.store.seed_config(GUILD, keys::REMOVAL_EMOJIS, r#"["🗑️"]"#);
}

pub fn reaction(channel_id: &str, message_id: &str, emoji: &str, user_id: &str) -> ReactionAdded {
    reaction_with_roles(channel_id, message_id, emoji, user_id, &[])
}

pub fn reaction_with_roles(
    channel_id: &str,
    message_id: &str,
    emoji: &str,
    user_id: &str,
    roles: &[&str],
) -> ReactionAdded {
    ReactionAdded::new(
        Some(GUILD.to_string()),
        channel_id.to_string(),
        message_id.to_string(),
        emoji.to_string(),
        user_id.to_string(),
        Some(MemberInfo::new(
            format!("user-{user_id}"),
            roles.iter().map(|r| r.to_string()).collect(),
        )),
    )
}

pub fn signup_reaction(user_id: &str) -> ReactionAdded {
    reaction("chan-signup", "msg-signup", "🐌", user_id)
}

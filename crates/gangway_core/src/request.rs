//! Testing request entity — the central workflow record.

use crate::{Record, RecordPayload};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use gangway_error::GangwayResult;

/// Historical status column values.
///
/// The store carries both an `Approved` boolean and a `Status` string; see
/// [`TestingRequest::approved`] for how the two are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// Request approved by a moderator
    Approved,
    /// Request rejected by a moderator
    Rejected,
}

impl RequestStatus {
    /// Column value for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    /// Parse a column value; unknown values are treated as absent.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Approved" => Some(Self::Approved),
            "Rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// One tester's request to test one app, tracked through notification and
/// approval.
///
/// Invariant: at most one active (`removed == false`) request exists per
/// (tester, app) pair; a second reaction for the same pair reuses the
/// existing record.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct TestingRequest {
    /// Store record id, absent until first persisted
    id: Option<String>,
    /// Tester record reference
    tester: String,
    /// Denormalized tester chat-platform id
    tester_discord_id: String,
    /// App record reference
    app: String,
    /// Denormalized app name (formula column, read-only)
    app_name: Option<String>,
    /// Approval boolean as stored; use [`Self::approved`] instead
    #[getter(skip)]
    approved_flag: Option<bool>,
    /// Historical status column; read but never written
    #[getter(skip)]
    status: Option<RequestStatus>,
    /// Id of the primary approval-channel notification
    notification_message_id: Option<String>,
    /// Ids of duplicate ("further") notifications
    further_notification_message_ids: Vec<String>,
    /// Resolved approval channel (from the app record, read-only)
    approval_channel_id: Option<String>,
    /// Snapshot of the app's role ids at creation time (lookup column)
    app_reaction_role_ids: Vec<String>,
    /// Guild the request originated in
    guild_id: String,
    /// Creation timestamp assigned by the store
    created: Option<DateTime<Utc>>,
    /// Whether the tester has been removed from this beta
    removed: bool,
}

impl TestingRequest {
    /// Create a new, not-yet-persisted request.
    pub fn new(
        tester: impl Into<String>,
        tester_discord_id: impl Into<String>,
        app: impl Into<String>,
        guild_id: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            tester: tester.into(),
            tester_discord_id: tester_discord_id.into(),
            app: app.into(),
            app_name: None,
            approved_flag: None,
            status: None,
            notification_message_id: None,
            further_notification_message_ids: Vec::new(),
            approval_channel_id: None,
            app_reaction_role_ids: Vec::new(),
            guild_id: guild_id.into(),
            created: None,
            removed: false,
        }
    }

    /// Whether this request is approved.
    ///
    /// True when the boolean column is set or the historical status column
    /// reads `Approved`. Approval is monotonic: there is no way back.
    pub fn approved(&self) -> bool {
        self.approved_flag == Some(true) || self.status == Some(RequestStatus::Approved)
    }

    /// Mark the request approved. Writers only ever set the boolean; the
    /// status column stays untouched so historical records remain readable.
    pub fn approve(&mut self) {
        self.approved_flag = Some(true);
    }

    /// Record the primary notification message.
    pub fn set_notification_message_id(&mut self, message_id: impl Into<String>) {
        self.notification_message_id = Some(message_id.into());
    }

    /// Record a duplicate notification message.
    pub fn push_further_notification_message_id(&mut self, message_id: impl Into<String>) {
        self.further_notification_message_ids
            .push(message_id.into());
    }

    /// Mark the tester as removed from this beta.
    pub fn set_removed(&mut self, removed: bool) {
        self.removed = removed;
    }

    /// Decode from a store record.
    ///
    /// # Errors
    ///
    /// Fails when the reference columns are missing.
    pub fn from_record(record: &Record) -> GangwayResult<Self> {
        let created = record
            .opt_str("Created")
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|dt| dt.with_timezone(&Utc));
        if created.is_none() && record.fields.contains_key("Created") {
            tracing::error!(record_id = %record.id, "Failed to parse 'Created' timestamp");
        }
        let further_notification_message_ids = record
            .opt_str("Further Notification Message IDs")
            .map(|joined| joined.split(',').map(|s| s.to_string()).collect())
            .unwrap_or_default();
        Ok(Self {
            id: Some(record.id.clone()),
            tester: record.required_linked("Tester")?,
            tester_discord_id: record.required_linked("Tester Discord ID")?,
            app: record.required_linked("App")?,
            app_name: record.linked("App Name"),
            approved_flag: record.opt_bool("Approved"),
            status: record
                .opt_str("Status")
                .and_then(|s| RequestStatus::parse(&s)),
            notification_message_id: record.opt_str("Notification Message ID"),
            further_notification_message_ids,
            approval_channel_id: record.linked("Approval Channel"),
            app_reaction_role_ids: record.str_list("App Reaction Role IDs"),
            guild_id: record.str_field("Server ID")?,
            created,
            removed: record.bool_field("Removed"),
        })
    }

    /// Encode for insert or update. Read-only lookup columns (`App Name`,
    /// `Approval Channel`, `App Reaction Role IDs`, `Created`) are never
    /// written back.
    pub fn to_payload(&self) -> RecordPayload {
        let mut payload = RecordPayload::new(self.id.clone());
        payload.set_linked("Tester", &self.tester);
        payload.set_linked("App", &self.app);
        payload.set_str("Server ID", &self.guild_id);
        if let Some(approved) = self.approved_flag {
            payload.set_bool("Approved", approved);
        }
        payload.set_opt_str(
            "Notification Message ID",
            self.notification_message_id.as_deref(),
        );
        if !self.further_notification_message_ids.is_empty() {
            payload.set_str(
                "Further Notification Message IDs",
                self.further_notification_message_ids.join(","),
            );
        }
        if self.removed {
            payload.set_bool("Removed", true);
        }
        payload
    }
}

//! Tester entity.

use crate::{Record, RecordPayload};
use derive_getters::Getters;
use gangway_error::GangwayResult;

/// One real human tester, keyed by chat-platform user id.
///
/// Created on the first qualifying reaction, mutated on registration and
/// re-prompting, never hard-deleted. Upserted in the store by the
/// `Discord ID` column.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Tester {
    /// Store record id, absent until first persisted
    id: Option<String>,
    /// Display username, refreshed on every qualifying reaction
    username: String,
    /// Stable chat-platform user id (identity key)
    discord_id: String,
    /// Primary email, absent until the tester registers
    email: Option<String>,
    /// Optional contact email
    contact_email: Option<String>,
    /// Given name
    given_name: Option<String>,
    /// Family name
    family_name: Option<String>,
    /// Derived full name (read-only formula column)
    full_name: Option<String>,
    /// Id of the last registration-prompt DM, for re-prompt throttling
    registration_message_id: Option<String>,
    /// Ids of "tester left" notification messages referencing this tester
    leave_message_ids: Vec<String>,
}

impl Tester {
    /// Create a new, not-yet-persisted tester seen for the first time.
    pub fn new(username: impl Into<String>, discord_id: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
            discord_id: discord_id.into(),
            email: None,
            contact_email: None,
            given_name: None,
            family_name: None,
            full_name: None,
            registration_message_id: None,
            leave_message_ids: Vec::new(),
        }
    }

    /// Refresh the display username.
    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }

    /// Record the id of the registration prompt just sent.
    pub fn set_registration_message_id(&mut self, message_id: impl Into<String>) {
        self.registration_message_id = Some(message_id.into());
    }

    /// Append a "tester left" notification message id.
    pub fn push_leave_message_id(&mut self, message_id: impl Into<String>) {
        self.leave_message_ids.push(message_id.into());
    }

    /// Name shown in approval notifications: the derived full name when the
    /// store has one, otherwise the username.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.username)
    }

    /// Decode from a store record.
    ///
    /// # Errors
    ///
    /// Fails when the identity columns are missing.
    pub fn from_record(record: &Record) -> GangwayResult<Self> {
        let leave_message_ids = record
            .opt_str("Leave Message IDs")
            .map(|joined| {
                joined
                    .split(',')
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            id: Some(record.id.clone()),
            username: record.str_field("Username")?,
            discord_id: record.str_field("Discord ID")?,
            email: record.opt_str("Email"),
            contact_email: record.opt_str("Contact Email"),
            given_name: record.opt_str("Given Name"),
            family_name: record.opt_str("Family Name"),
            full_name: record.opt_str("Full Name"),
            registration_message_id: record.opt_str("Registration Message ID"),
            leave_message_ids,
        })
    }

    /// Encode for insert or upsert. The derived `Full Name` column is never
    /// written back.
    pub fn to_payload(&self) -> RecordPayload {
        let mut payload = RecordPayload::new(self.id.clone());
        payload.set_str("Username", &self.username);
        payload.set_str("Discord ID", &self.discord_id);
        payload.set_opt_str("Email", self.email.as_deref());
        payload.set_opt_str("Contact Email", self.contact_email.as_deref());
        payload.set_opt_str("Given Name", self.given_name.as_deref());
        payload.set_opt_str("Family Name", self.family_name.as_deref());
        payload.set_opt_str(
            "Registration Message ID",
            self.registration_message_id.as_deref(),
        );
        if !self.leave_message_ids.is_empty() {
            payload.set_str("Leave Message IDs", self.leave_message_ids.join(","));
        }
        payload
    }
}

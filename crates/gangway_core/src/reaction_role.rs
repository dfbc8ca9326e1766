//! Reaction-role mapping entity.

use crate::Record;
use derive_getters::Getters;
use gangway_error::GangwayResult;

/// A configured mapping from (guild, message, reaction) to a role grant
/// and/or app association.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct ReactionRole {
    /// Store record id
    id: String,
    /// Guild the watched message lives in
    guild_id: String,
    /// Watched message id
    message_id: String,
    /// Reaction emoji name
    reaction_name: String,
    /// Role granted for this reaction
    role_id: String,
    /// Associated app record ids; empty means plain role grant
    app_ids: Vec<String>,
    /// Whether the member must hold the rule-agreement role first
    requires_rules_agreement: bool,
}

impl ReactionRole {
    /// Construct directly; used by tests and fakes.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        guild_id: impl Into<String>,
        message_id: impl Into<String>,
        reaction_name: impl Into<String>,
        role_id: impl Into<String>,
        app_ids: Vec<String>,
        requires_rules_agreement: bool,
    ) -> Self {
        Self {
            id: id.into(),
            guild_id: guild_id.into(),
            message_id: message_id.into(),
            reaction_name: reaction_name.into(),
            role_id: role_id.into(),
            app_ids,
            requires_rules_agreement,
        }
    }

    /// Decode from a store record.
    ///
    /// # Errors
    ///
    /// Fails when any of the key columns are missing.
    pub fn from_record(record: &Record) -> GangwayResult<Self> {
        Ok(Self {
            id: record.id.clone(),
            guild_id: record.str_field("Server ID")?,
            message_id: record.str_field("Message ID")?,
            reaction_name: record.str_field("Reaction")?,
            role_id: record.str_field("Role")?,
            app_ids: record.str_list("Apps"),
            requires_rules_agreement: record.bool_field("Requires Rules Agreement"),
        })
    }
}

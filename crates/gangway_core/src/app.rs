//! App entity.

use crate::Record;
use derive_getters::Getters;
use gangway_error::GangwayResult;

/// One distributed application.
///
/// Managed out-of-band; read-only from this pipeline's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct App {
    /// Store record id
    id: String,
    /// Display name
    name: String,
    /// Per-app approval channel, overrides the guild default
    approval_channel_id: Option<String>,
    /// Roles granted when a request for this app is approved
    reaction_role_ids: Vec<String>,
    /// Beta-distribution API key identifier
    beta_key_id: Option<String>,
    /// Beta-distribution group id
    beta_group_id: Option<String>,
}

impl App {
    /// Construct directly; used by tests and fakes.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        approval_channel_id: Option<String>,
        reaction_role_ids: Vec<String>,
        beta_key_id: Option<String>,
        beta_group_id: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            approval_channel_id,
            reaction_role_ids,
            beta_key_id,
            beta_group_id,
        }
    }

    /// Decode from a store record.
    ///
    /// # Errors
    ///
    /// Fails when the name column is missing.
    pub fn from_record(record: &Record) -> GangwayResult<Self> {
        Ok(Self {
            id: record.id.clone(),
            name: record.str_field("Name")?,
            approval_channel_id: record.opt_str("Approval Channel"),
            reaction_role_ids: record.str_list("Reaction Role IDs"),
            beta_key_id: record.opt_str("Beta Key ID"),
            beta_group_id: record.opt_str("Beta Group ID"),
        })
    }
}

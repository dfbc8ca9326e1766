//! Per-guild configuration entries.

use crate::Record;
use derive_getters::Getters;
use gangway_error::{GangwayResult, JsonError};

/// One per-guild key/value setting from the record store.
///
/// Values are plain strings; some keys hold JSON parsed on demand via
/// [`ConfigEntry::parsed_value`].
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct ConfigEntry {
    /// Guild this entry applies to
    guild_id: String,
    /// Setting key (see [`crate::keys`])
    key: String,
    /// Raw value
    value: String,
}

impl ConfigEntry {
    /// Construct directly; used by tests and fakes.
    pub fn new(
        guild_id: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            guild_id: guild_id.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    /// Decode from a store record.
    ///
    /// # Errors
    ///
    /// Fails when any column is missing.
    pub fn from_record(record: &Record) -> GangwayResult<Self> {
        Ok(Self {
            guild_id: record.str_field("Server ID")?,
            key: record.str_field("Key")?,
            value: record.str_field("Value")?,
        })
    }

    /// Parse the value as JSON.
    ///
    /// # Errors
    ///
    /// Fails when the value is not valid JSON.
    pub fn parsed_value(&self) -> GangwayResult<serde_json::Value> {
        serde_json::from_str(&self.value).map_err(|e| {
            JsonError::new(format!(
                "config '{}' for guild {} is not valid JSON: {e}",
                self.key, self.guild_id
            ))
            .into()
        })
    }

    /// Parse the value as a JSON array of strings.
    ///
    /// # Errors
    ///
    /// Fails when the value is not a JSON string array.
    pub fn parsed_list(&self) -> GangwayResult<Vec<String>> {
        let value = self.parsed_value()?;
        value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| s.to_string())
                    .collect()
            })
            .ok_or_else(|| {
                JsonError::new(format!("config '{}' is not a JSON array", self.key)).into()
            })
    }
}

/// Pointer to the rules message a member must agree to, parsed from the
/// `rule_agreement_message` config value.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct AgreementMessage {
    /// Channel the rules message lives in
    channel_id: String,
    /// Rules message id
    message_id: String,
}

impl AgreementMessage {
    /// Extract from a `rule_agreement_message` config entry; `None` when the
    /// JSON lacks either pointer.
    pub fn from_entry(entry: &ConfigEntry) -> Option<Self> {
        let parsed = entry.parsed_value().ok()?;
        let channel_id = parsed.get("channel")?.as_str()?.to_string();
        let message_id = parsed.get("message")?.as_str()?.to_string();
        Some(Self {
            channel_id,
            message_id,
        })
    }
}

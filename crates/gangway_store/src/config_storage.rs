//! Typed storage over the per-guild configuration table.

use crate::StoreClient;
use async_trait::async_trait;
use gangway_core::{ConfigEntry, Formula, RemoteConfig};
use gangway_error::GangwayResult;

const CONFIG_TABLE: &str = "Config";

/// [`RemoteConfig`] implementation over the record store REST API.
///
/// Deliberately uncached: the config cache service owns freshness, so every
/// call here is a real round-trip.
pub struct ConfigStorage {
    client: StoreClient,
    config_url: String,
}

impl ConfigStorage {
    /// Create a storage over the config table of `client`'s base.
    pub fn new(client: StoreClient) -> Self {
        Self {
            config_url: client.table_url(CONFIG_TABLE),
            client,
        }
    }
}

#[async_trait]
impl RemoteConfig for ConfigStorage {
    async fn list_config(&self) -> GangwayResult<Vec<ConfigEntry>> {
        let records = self.client.list(&self.config_url, None, &[], &[]).await?;
        records.iter().map(ConfigEntry::from_record).collect()
    }

    async fn retrieve_config(
        &self,
        guild_id: &str,
        key: &str,
    ) -> GangwayResult<Option<ConfigEntry>> {
        let filter = Formula::and(vec![
            Formula::eq("Server ID", guild_id),
            Formula::eq("Key", key),
        ]);
        let record = self.client.first(&self.config_url, filter).await?;
        record.as_ref().map(ConfigEntry::from_record).transpose()
    }
}

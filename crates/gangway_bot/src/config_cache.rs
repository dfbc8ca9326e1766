//! Per-guild configuration cache.

use gangway_cache::{KeyedLocks, NegativeCache, TtlCache, TtlCacheConfig};
use gangway_core::{AgreementMessage, ConfigEntry, RemoteConfig, keys};
use gangway_error::GangwayResult;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Single-key lookups stay fresh for ten minutes between refresh cycles.
const ENTRY_TTL_SECS: u64 = 600;
const GUILD_CACHE_SIZE: usize = 100;

type GuildCaches = HashMap<String, TtlCache<String, ConfigEntry>>;

/// Cache-through access to per-guild settings.
///
/// A key confirmed absent goes into the negative cache so repeated events do
/// not hammer the store; the scheduled [`refresh`](Self::refresh) re-checks
/// everything. Concurrent misses on the same key collapse onto one fetch via
/// a keyed lock.
pub struct ConfigCacheService {
    config: Arc<dyn RemoteConfig>,
    entries: Mutex<GuildCaches>,
    negative: Mutex<NegativeCache<(String, String)>>,
    locks: KeyedLocks,
}

impl ConfigCacheService {
    /// Create a service over the given config storage.
    pub fn new(config: Arc<dyn RemoteConfig>) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
            negative: Mutex::new(NegativeCache::new()),
            locks: KeyedLocks::new(),
        }
    }

    /// Fetch one setting, from cache when possible.
    pub async fn get(&self, guild_id: &str, key: &str) -> GangwayResult<Option<ConfigEntry>> {
        let cache_key = (guild_id.to_string(), key.to_string());
        if self.negative.lock().await.is_absent(&cache_key) {
            return Ok(None);
        }
        if let Some(entry) = self.cached(guild_id, key).await {
            return Ok(Some(entry));
        }

        let _guard = self.locks.acquire(&format!("config:{guild_id}:{key}")).await;
        // Another task may have fetched while we waited.
        if let Some(entry) = self.cached(guild_id, key).await {
            return Ok(Some(entry));
        }
        debug!(guild_id, key, "Config cache miss, fetching");
        match self.config.retrieve_config(guild_id, key).await? {
            Some(entry) => {
                self.insert(entry.clone()).await;
                Ok(Some(entry))
            }
            None => {
                self.negative.lock().await.mark_absent(cache_key);
                Ok(None)
            }
        }
    }

    /// Re-fetch every guild's settings and forget confirmed-absent keys.
    pub async fn refresh(&self) -> GangwayResult<()> {
        let all = self.config.list_config().await?;
        info!(entries = all.len(), "Refreshed guild config cache");
        let mut entries = self.entries.lock().await;
        entries.clear();
        for entry in all {
            entries
                .entry(entry.guild_id().clone())
                .or_insert_with(new_guild_cache)
                .insert(entry.key().clone(), entry, None);
        }
        drop(entries);
        self.negative.lock().await.clear();
        Ok(())
    }

    /// Drop one guild's settings outright, forcing refetch on next access.
    pub async fn clear_guild(&self, guild_id: &str) {
        self.entries.lock().await.remove(guild_id);
        self.negative.lock().await.clear();
        info!(guild_id, "Cleared guild config cache");
    }

    async fn cached(&self, guild_id: &str, key: &str) -> Option<ConfigEntry> {
        let mut entries = self.entries.lock().await;
        entries.get_mut(guild_id)?.get(&key.to_string())
    }

    async fn insert(&self, entry: ConfigEntry) {
        let mut entries = self.entries.lock().await;
        entries
            .entry(entry.guild_id().clone())
            .or_insert_with(new_guild_cache)
            .insert(entry.key().clone(), entry, None);
    }

    /// The guild's default approval channel, if configured.
    pub async fn default_approvals_channel(&self, guild_id: &str) -> GangwayResult<Option<String>> {
        Ok(self
            .get(guild_id, keys::DEFAULT_APPROVALS_CHANNEL)
            .await?
            .map(|entry| entry.value().clone()))
    }

    /// The role members must hold before requesting gated apps.
    pub async fn rule_agreement_role(&self, guild_id: &str) -> GangwayResult<Option<String>> {
        Ok(self
            .get(guild_id, keys::RULE_AGREEMENT_ROLE)
            .await?
            .map(|entry| entry.value().clone()))
    }

    /// Pointer to the rules message, if configured.
    pub async fn rule_agreement_message(
        &self,
        guild_id: &str,
    ) -> GangwayResult<Option<AgreementMessage>> {
        Ok(self
            .get(guild_id, keys::RULE_AGREEMENT_MESSAGE)
            .await?
            .as_ref()
            .and_then(AgreementMessage::from_entry))
    }

    /// Emoji names that approve a testing request.
    pub async fn approval_emojis(&self, guild_id: &str) -> GangwayResult<Vec<String>> {
        match self.get(guild_id, keys::APPROVAL_EMOJIS).await? {
            Some(entry) => entry.parsed_list(),
            None => Ok(Vec::new()),
        }
    }

    /// Emoji names that trigger tester removal.
    pub async fn removal_emojis(&self, guild_id: &str) -> GangwayResult<Vec<String>> {
        match self.get(guild_id, keys::REMOVAL_EMOJIS).await? {
            Some(entry) => entry.parsed_list(),
            None => Ok(Vec::new()),
        }
    }

    /// Channel notified when an active tester leaves, if configured.
    pub async fn exit_notification_channel(
        &self,
        guild_id: &str,
    ) -> GangwayResult<Option<String>> {
        Ok(self
            .get(guild_id, keys::TESTER_EXIT_NOTIFICATION_CHANNEL)
            .await?
            .map(|entry| entry.value().clone()))
    }
}

fn new_guild_cache() -> TtlCache<String, ConfigEntry> {
    TtlCache::new(
        TtlCacheConfig::default()
            .with_default_ttl(ENTRY_TTL_SECS)
            .with_max_size(GUILD_CACHE_SIZE),
    )
}

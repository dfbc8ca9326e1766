//! Reaction-role and watched-message cache.

use gangway_cache::{NegativeCache, TtlCache, TtlCacheConfig};
use gangway_core::{BetaStore, ReactionRole};
use gangway_error::GangwayResult;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

const ROLE_TTL_SECS: u64 = 1800;
const ROLE_CACHE_SIZE: usize = 500;

type RoleKey = (String, String, String);

/// Cache of the store's reaction-role tables: the watched-message set, the
/// (guild, message, emoji) mapping, and the per-app approval channel set.
///
/// The sets load lazily on first use; individual mappings are fetched per key
/// on miss with a negative entry for confirmed-absent keys. The scheduled
/// [`refresh`](Self::refresh) replaces everything in bulk.
pub struct RoleCacheService {
    store: Arc<dyn BetaStore>,
    watched: Mutex<Option<HashSet<String>>>,
    approval_channels: Mutex<Option<HashSet<String>>>,
    roles: Mutex<TtlCache<RoleKey, ReactionRole>>,
    missing: Mutex<NegativeCache<RoleKey>>,
}

impl RoleCacheService {
    /// Create a service over the given store.
    pub fn new(store: Arc<dyn BetaStore>) -> Self {
        Self {
            store,
            watched: Mutex::new(None),
            approval_channels: Mutex::new(None),
            roles: Mutex::new(TtlCache::new(
                TtlCacheConfig::default()
                    .with_default_ttl(ROLE_TTL_SECS)
                    .with_max_size(ROLE_CACHE_SIZE),
            )),
            missing: Mutex::new(NegativeCache::new()),
        }
    }

    /// Whether any reaction-role mapping watches this message.
    pub async fn is_watched(&self, message_id: &str) -> GangwayResult<bool> {
        let mut watched = self.watched.lock().await;
        if watched.is_none() {
            let ids = self.store.list_watched_message_ids().await?;
            debug!(count = ids.len(), "Loaded watched-message set");
            *watched = Some(ids.into_iter().collect());
        }
        Ok(watched
            .as_ref()
            .is_some_and(|set| set.contains(message_id)))
    }

    /// Whether the channel is some app's approval channel.
    pub async fn is_approval_channel(&self, channel_id: &str) -> GangwayResult<bool> {
        let mut channels = self.approval_channels.lock().await;
        if channels.is_none() {
            let ids = self.store.list_approvals_channel_ids().await?;
            debug!(count = ids.len(), "Loaded approval-channel set");
            *channels = Some(ids.into_iter().collect());
        }
        Ok(channels
            .as_ref()
            .is_some_and(|set| set.contains(channel_id)))
    }

    /// Resolve the mapping for one (guild, message, emoji) key.
    pub async fn reaction_role(
        &self,
        guild_id: &str,
        message_id: &str,
        reaction: &str,
    ) -> GangwayResult<Option<ReactionRole>> {
        let key = (
            guild_id.to_string(),
            message_id.to_string(),
            reaction.to_string(),
        );
        if self.missing.lock().await.is_absent(&key) {
            return Ok(None);
        }
        if let Some(role) = self.roles.lock().await.get(&key) {
            return Ok(Some(role));
        }
        match self
            .store
            .fetch_reaction_role(guild_id, message_id, reaction)
            .await?
        {
            Some(role) => {
                self.roles.lock().await.insert(key, role.clone(), None);
                Ok(Some(role))
            }
            None => {
                self.missing.lock().await.mark_absent(key);
                Ok(None)
            }
        }
    }

    /// Bulk re-fetch every mapping and both id sets, replacing the caches
    /// wholesale and forgetting confirmed-absent keys.
    pub async fn refresh(&self) -> GangwayResult<()> {
        let all = self.store.list_reaction_roles().await?;
        let channels = self.store.list_approvals_channel_ids().await?;
        info!(
            mappings = all.len(),
            channels = channels.len(),
            "Refreshed reaction-role cache"
        );

        let mut watched_set = HashSet::new();
        let mut roles = self.roles.lock().await;
        roles.clear();
        for role in all {
            watched_set.insert(role.message_id().clone());
            let key = (
                role.guild_id().clone(),
                role.message_id().clone(),
                role.reaction_name().clone(),
            );
            roles.insert(key, role, None);
        }
        drop(roles);

        *self.watched.lock().await = Some(watched_set);
        *self.approval_channels.lock().await = Some(channels.into_iter().collect());
        self.missing.lock().await.clear();
        Ok(())
    }

    /// Drop everything, forcing lazy reload on next access.
    pub async fn clear(&self) {
        *self.watched.lock().await = None;
        *self.approval_channels.lock().await = None;
        self.roles.lock().await.clear();
        self.missing.lock().await.clear();
        info!("Cleared reaction-role cache");
    }
}

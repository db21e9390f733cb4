use crate::error::StoreError;
use crate::store::AutoresponseStore;
use std::sync::Arc;

/// Decides, per incoming message, whether automatic link scanning runs at
/// all. Reads a fresh snapshot of the guild's opt-in set on every check:
/// other commands may mutate the set concurrently, so cached membership
/// would go stale.
pub struct AutoresponseGate {
    store: Arc<AutoresponseStore>,
}

impl AutoresponseGate {
    pub fn new(store: Arc<AutoresponseStore>) -> Self {
        Self { store }
    }

    pub async fn should_scan(&self, guild_id: i64, channel_id: i64) -> Result<bool, StoreError> {
        let locations = self.store.select_by_guild(guild_id).await?;
        Ok(locations
            .iter()
            .any(|location| location.channel_id == channel_id))
    }
}

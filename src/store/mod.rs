use crate::error::StoreError;
use crate::model::AutoresponseLocation;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

const INITIALIZE: &str = "
CREATE TABLE IF NOT EXISTS autoresponse_locations (
    guild_id    INTEGER NOT NULL,
    channel_id  INTEGER NOT NULL,
    PRIMARY KEY (guild_id, channel_id)
) STRICT, WITHOUT ROWID;
";

const SELECT_ALL: &str = "
SELECT guild_id, channel_id FROM autoresponse_locations
ORDER BY guild_id, channel_id;
";

const SELECT_BY_GUILD: &str = "
SELECT guild_id, channel_id FROM autoresponse_locations
WHERE guild_id = ? ORDER BY channel_id;
";

const INSERT_LOCATION: &str = "
INSERT INTO autoresponse_locations (guild_id, channel_id) VALUES (?, ?)
ON CONFLICT (guild_id, channel_id) DO NOTHING;
";

const DELETE_LOCATION: &str = "
DELETE FROM autoresponse_locations WHERE guild_id = ? AND channel_id = ?;
";

const CLEAR_GUILD: &str = "
DELETE FROM autoresponse_locations WHERE guild_id = ?;
";

/// Persistent registry of channels opted in to automatic link scanning.
///
/// Batch writes are transactional: the whole batch lands or none of it
/// does, and both `add` and `remove` hand back the refreshed set for the
/// batch's guild so callers always act on a fresh snapshot.
pub struct AutoresponseStore {
    pool: SqlitePool,
}

impl AutoresponseStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new().connect(url).await?;
        Ok(Self { pool })
    }

    /// Private in-memory store, used by tests and ephemeral runs.
    pub async fn in_memory() -> Result<Self, StoreError> {
        // A pooled ":memory:" database vanishes per connection; pin the
        // pool to one connection so every query sees the same database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    pub async fn initialize(&self) -> Result<(), StoreError> {
        sqlx::query(INITIALIZE).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn select_all(&self) -> Result<Vec<AutoresponseLocation>, StoreError> {
        let rows = sqlx::query_as::<_, AutoresponseLocation>(SELECT_ALL)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn select_by_guild(
        &self,
        guild_id: i64,
    ) -> Result<Vec<AutoresponseLocation>, StoreError> {
        let rows = sqlx::query_as::<_, AutoresponseLocation>(SELECT_BY_GUILD)
            .bind(guild_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Opt a batch of channels in; returns the guild's full updated set.
    pub async fn add(
        &self,
        locations: &[AutoresponseLocation],
    ) -> Result<Vec<AutoresponseLocation>, StoreError> {
        let first = locations.first().ok_or(StoreError::EmptyBatch)?;
        let mut tx = self.pool.begin().await?;
        for location in locations {
            sqlx::query(INSERT_LOCATION)
                .bind(location.guild_id)
                .bind(location.channel_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        self.select_by_guild(first.guild_id).await
    }

    /// Opt a batch of channels out; returns the guild's full updated set.
    pub async fn remove(
        &self,
        locations: &[AutoresponseLocation],
    ) -> Result<Vec<AutoresponseLocation>, StoreError> {
        let first = locations.first().ok_or(StoreError::EmptyBatch)?;
        let mut tx = self.pool.begin().await?;
        for location in locations {
            sqlx::query(DELETE_LOCATION)
                .bind(location.guild_id)
                .bind(location.channel_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        self.select_by_guild(first.guild_id).await
    }

    pub async fn clear(&self, guild_id: i64) -> Result<(), StoreError> {
        sqlx::query(CLEAR_GUILD)
            .bind(guild_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

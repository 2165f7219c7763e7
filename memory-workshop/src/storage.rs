use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{migrate::MigrateDatabase, query, query_as, Pool, Sqlite, SqlitePool};

/// One table of JSON blobs keyed by name. The detail stores keep a whole
/// collection under a single key and rewrite it on every change, the same
/// storage model the embedded detail page uses.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn open(url: &str) -> sqlx::Result<Self> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?;
        }
        let pool = SqlitePool::connect(url).await?;
        Self::with_pool(pool).await
    }

    /// Wraps an existing pool, creating the blob table when it is missing.
    pub async fn with_pool(pool: Pool<Sqlite>) -> sqlx::Result<Self> {
        query(
            "CREATE TABLE IF NOT EXISTS app_storage(
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }
}

impl Storage {
    pub async fn read(&self, key: &str) -> sqlx::Result<Option<String>> {
        let row: Option<(String,)> = query_as("SELECT value FROM app_storage WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    pub async fn write(&self, key: &str, value: &str) -> sqlx::Result<()> {
        query("INSERT OR REPLACE INTO app_storage(key, value, updated_at) VALUES(?, ?, ?)")
            .bind(key)
            .bind(value)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map(|_| ())
    }

    /// Attempt to remove a key, returns true if a value was stored under it.
    pub async fn remove(&self, key: &str) -> sqlx::Result<bool> {
        let result = query("DELETE FROM app_storage WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn read_json<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        match self.read(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn write_json<T: Serialize>(&self, key: &str, value: &T) -> anyhow::Result<()> {
        let raw = serde_json::to_string(value)?;
        self.write(key, &raw).await?;
        Ok(())
    }
}

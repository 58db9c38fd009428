/// SQLite key-value backend
use crate::{
    error::{AppError, AppResult},
    store::KvBackend,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

/// SQLite backend storing one row per key in `kv_store`
#[derive(Clone)]
pub struct SqliteBackend {
    db: SqlitePool,
}

impl SqliteBackend {
    /// The pool must already have the migrations applied
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KvBackend for SqliteBackend {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.db)
            .await
            .map_err(AppError::Database)?;

        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.db)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&self.db)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT key FROM kv_store WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
        )
        .bind(prefix)
        .fetch_all(&self.db)
        .await
        .map_err(AppError::Database)?;

        Ok(rows.into_iter().map(|r| r.get::<String, _>("key")).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, DatabaseOptions};
    use tempfile::tempdir;

    async fn backend(dir: &std::path::Path) -> SqliteBackend {
        let pool = create_pool(&dir.join("store.sqlite"), DatabaseOptions::default())
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteBackend::new(pool)
    }

    #[tokio::test]
    async fn test_set_get_overwrite() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path()).await;

        assert_eq!(backend.get("users").await.unwrap(), None);

        backend.set("users", "[]").await.unwrap();
        backend.set("users", "[{\"id\":\"1\"}]").await.unwrap();
        assert_eq!(
            backend.get("users").await.unwrap(),
            Some("[{\"id\":\"1\"}]".to_string())
        );
    }

    #[tokio::test]
    async fn test_remove_and_prefix() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path()).await;

        backend.set("images_water", "[]").await.unwrap();
        backend.set("images_fire", "[]").await.unwrap();
        backend.set("forbidden_images_hellfire", "[]").await.unwrap();

        let keys = backend.keys_with_prefix("images_").await.unwrap();
        assert_eq!(keys, vec!["images_fire".to_string(), "images_water".to_string()]);

        backend.remove("images_fire").await.unwrap();
        assert_eq!(backend.get("images_fire").await.unwrap(), None);
        assert!(backend.get("forbidden_images_hellfire").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let backend = backend(dir.path()).await;
            backend.set("users", "[]").await.unwrap();
        }
        let reopened = backend(dir.path()).await;
        assert_eq!(reopened.get("users").await.unwrap(), Some("[]".to_string()));
    }
}

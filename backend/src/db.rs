//! Aggregate store backed by SQLite.
//!
//! Aggregates (`User`, `Challenge`, `ExerciseCard`) are stored as whole JSON
//! documents in a single `documents` table keyed by `(collection, id)`. Every
//! mutation is a read-entire-aggregate, modify-in-memory, write-entire-aggregate
//! cycle with no optimistic-concurrency token: two concurrent writers to the
//! same aggregate race, and the last full-document write wins. Callers that
//! touch two aggregates persist them one after the other and rely on idempotent
//! re-invocation to reconcile a crash between the writes.

use crate::domain::errors::CoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::{Challenge, ExerciseCard, User};
use sqlx::{migrate::MigrateDatabase, Row, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::debug;

pub const USERS: &str = "users";
pub const CHALLENGES: &str = "challenges";
pub const EXERCISES: &str = "exercises";

/// DbConnection manages document storage for all aggregates.
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection, creating the database and schema if
    /// they do not exist yet.
    pub async fn new(url: &str) -> Result<Self, CoreError> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?;
        }

        let pool = SqlitePool::connect(url).await?;
        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Initialize an in-memory test database with a unique name so tests do
    /// not share state.
    #[cfg(test)]
    pub async fn init_test() -> Result<Self, CoreError> {
        let test_id = uuid::Uuid::new_v4().to_string();
        let url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);
        Self::new(&url).await
    }

    async fn setup_schema(pool: &SqlitePool) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Write a whole document, replacing any previous version (last writer
    /// wins).
    pub async fn put<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        doc: &T,
    ) -> Result<(), CoreError> {
        let body = serde_json::to_string(doc)?;
        sqlx::query("INSERT OR REPLACE INTO documents (collection, id, body) VALUES (?, ?, ?)")
            .bind(collection)
            .bind(id)
            .bind(body)
            .execute(&*self.pool)
            .await?;
        debug!("stored document {}/{}", collection, id);
        Ok(())
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, CoreError> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await?;

        match row {
            Some(r) => {
                let body: String = r.get("body");
                Ok(Some(serde_json::from_str(&body)?))
            }
            None => Ok(None),
        }
    }

    /// Delete a document. Returns true if it existed.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Load every document in a collection. Filtering and sorting happen
    /// in-memory in the domain layer; collections are bounded by the per-user
    /// caps so this stays tractable.
    pub async fn list_all<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, CoreError> {
        let rows = sqlx::query("SELECT body FROM documents WHERE collection = ? ORDER BY id")
            .bind(collection)
            .fetch_all(&*self.pool)
            .await?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let body: String = row.get("body");
            docs.push(serde_json::from_str(&body)?);
        }
        Ok(docs)
    }

    pub async fn count(&self, collection: &str) -> Result<u64, CoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_one(&*self.pool)
            .await?;
        let n: i64 = row.get("n");
        Ok(n as u64)
    }

    // Typed helpers for the three aggregate roots.

    pub async fn load_user(&self, user_id: &str) -> Result<User, CoreError> {
        self.get(USERS, user_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("User".to_string()))
    }

    pub async fn save_user(&self, user: &User) -> Result<(), CoreError> {
        self.put(USERS, &user.id, user).await
    }

    pub async fn load_challenge(&self, challenge_id: &str) -> Result<Challenge, CoreError> {
        self.get(CHALLENGES, challenge_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Challenge".to_string()))
    }

    pub async fn save_challenge(&self, challenge: &Challenge) -> Result<(), CoreError> {
        self.put(CHALLENGES, &challenge.id, challenge).await
    }

    pub async fn load_exercise(&self, exercise_id: &str) -> Result<ExerciseCard, CoreError> {
        self.get(EXERCISES, exercise_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Exercise".to_string()))
    }

    pub async fn save_exercise(&self, exercise: &ExerciseCard) -> Result<(), CoreError> {
        self.put(EXERCISES, &exercise.id, exercise).await
    }
}

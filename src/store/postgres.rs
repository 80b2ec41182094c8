use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Alert, Store, User};

const USERS: &str = "users";
const ALERTS: &str = "alerts";

/// Postgres-backed document store: one `documents` table keyed by
/// `(collection, id)` with a JSONB body. Field lookups go through JSONB
/// operators, so the shape matches the document database this replaces.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body JSONB NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("create documents table")?;
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Value>> {
        let body = sqlx::query_scalar::<_, Value>(
            r#"SELECT body FROM documents WHERE collection = $1 AND id = $2"#,
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("get document")?;
        Ok(body)
    }

    async fn insert(&self, collection: &str, id: &str, body: Value) -> anyhow::Result<()> {
        sqlx::query(r#"INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)"#)
            .bind(collection)
            .bind(id)
            .bind(body)
            .execute(&self.pool)
            .await
            .context("insert document")?;
        Ok(())
    }

    async fn upsert(&self, collection: &str, id: &str, body: Value) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO UPDATE SET body = EXCLUDED.body
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(body)
        .execute(&self.pool)
        .await
        .context("upsert document")?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()> {
        sqlx::query(r#"DELETE FROM documents WHERE collection = $1 AND id = $2"#)
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("delete document")?;
        Ok(())
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> anyhow::Result<Option<Value>> {
        let body = sqlx::query_scalar::<_, Value>(
            r#"SELECT body FROM documents WHERE collection = $1 AND body->>$2 = $3 LIMIT 1"#,
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .context("find document by field")?;
        Ok(body)
    }

    async fn list_ordered(&self, collection: &str, order_field: &str) -> anyhow::Result<Vec<Value>> {
        // RFC3339 timestamps sort chronologically as strings.
        let bodies = sqlx::query_scalar::<_, Value>(
            r#"SELECT body FROM documents WHERE collection = $1 ORDER BY body->>$2 DESC"#,
        )
        .bind(collection)
        .bind(order_field)
        .fetch_all(&self.pool)
        .await
        .context("list documents")?;
        Ok(bodies)
    }
}

fn decode<T: serde::de::DeserializeOwned>(body: Value) -> anyhow::Result<T> {
    serde_json::from_value(body).context("decode document body")
}

fn encode<T: serde::Serialize>(record: &T) -> anyhow::Result<Value> {
    serde_json::to_value(record).context("encode document body")
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        self.get(USERS, &id.to_string()).await?.map(decode).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        self.find_by_field(USERS, "email", email)
            .await?
            .map(decode)
            .transpose()
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        self.list_ordered(USERS, "createdAt")
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    async fn insert_user(&self, user: &User) -> anyhow::Result<()> {
        self.insert(USERS, &user.id.to_string(), encode(user)?).await
    }

    async fn upsert_user(&self, user: &User) -> anyhow::Result<()> {
        self.upsert(USERS, &user.id.to_string(), encode(user)?).await
    }

    async fn delete_user(&self, id: Uuid) -> anyhow::Result<()> {
        self.delete(USERS, &id.to_string()).await
    }

    async fn find_alert_by_id(&self, id: Uuid) -> anyhow::Result<Option<Alert>> {
        self.get(ALERTS, &id.to_string()).await?.map(decode).transpose()
    }

    async fn list_alerts(&self) -> anyhow::Result<Vec<Alert>> {
        self.list_ordered(ALERTS, "timestamp")
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    async fn list_alerts_by_creator(&self, user_id: Uuid) -> anyhow::Result<Vec<Alert>> {
        let bodies = sqlx::query_scalar::<_, Value>(
            r#"
            SELECT body FROM documents
            WHERE collection = $1 AND body->'createdBy'->>'id' = $2
            ORDER BY body->>'timestamp' DESC
            "#,
        )
        .bind(ALERTS)
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("list alerts by creator")?;
        bodies.into_iter().map(decode).collect()
    }

    async fn insert_alert(&self, alert: &Alert) -> anyhow::Result<()> {
        self.insert(ALERTS, &alert.id.to_string(), encode(alert)?).await
    }

    async fn upsert_alert(&self, alert: &Alert) -> anyhow::Result<()> {
        self.upsert(ALERTS, &alert.id.to_string(), encode(alert)?).await
    }

    async fn delete_alert(&self, id: Uuid) -> anyhow::Result<()> {
        self.delete(ALERTS, &id.to_string()).await
    }
}

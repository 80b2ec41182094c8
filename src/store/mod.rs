use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

/// User document. Serialized form is the store/wire format (camelCase);
/// `passwordHash` never leaves the store layer — API responses use DTOs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub blocked: bool,
    #[serde(with = "time::serde::rfc3339", default = "OffsetDateTime::now_utc")]
    pub created_at: OffsetDateTime,
}

/// Snapshot of the submitting user embedded in each alert. Not a live
/// reference: later changes to the user do not propagate here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorSnapshot {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub verified: bool,
}

impl From<&User> for CreatorSnapshot {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            verified: user.verified,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub alert_type: String,
    pub location: String,
    pub severity: String,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(default)]
    pub verified: bool,
    pub created_by: CreatorSnapshot,
}

/// Document-store seam. The handlers only ever need exact-match lookups,
/// ordered listings, insert, upsert and delete — no ranges, joins or
/// transactions.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    /// All users, newest first.
    async fn list_users(&self) -> anyhow::Result<Vec<User>>;
    async fn insert_user(&self, user: &User) -> anyhow::Result<()>;
    async fn upsert_user(&self, user: &User) -> anyhow::Result<()>;
    async fn delete_user(&self, id: Uuid) -> anyhow::Result<()>;

    async fn find_alert_by_id(&self, id: Uuid) -> anyhow::Result<Option<Alert>>;
    /// All alerts, newest first.
    async fn list_alerts(&self) -> anyhow::Result<Vec<Alert>>;
    async fn list_alerts_by_creator(&self, user_id: Uuid) -> anyhow::Result<Vec<Alert>>;
    async fn insert_alert(&self, alert: &Alert) -> anyhow::Result<()>;
    async fn upsert_alert(&self, alert: &Alert) -> anyhow::Result<()>;
    async fn delete_alert(&self, id: Uuid) -> anyhow::Result<()>;
}

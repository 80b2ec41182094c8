use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use super::{Alert, Store, User};

/// In-memory store for tests and local development. Same observable
/// behavior as the real backend for keys within their collection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    alerts: RwLock<HashMap<Uuid, Alert>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        Ok(users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn insert_user(&self, user: &User) -> anyhow::Result<()> {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn upsert_user(&self, user: &User) -> anyhow::Result<()> {
        self.insert_user(user).await
    }

    async fn delete_user(&self, id: Uuid) -> anyhow::Result<()> {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        users.remove(&id);
        Ok(())
    }

    async fn find_alert_by_id(&self, id: Uuid) -> anyhow::Result<Option<Alert>> {
        let alerts = self.alerts.read().unwrap_or_else(|e| e.into_inner());
        Ok(alerts.get(&id).cloned())
    }

    async fn list_alerts(&self) -> anyhow::Result<Vec<Alert>> {
        let alerts = self.alerts.read().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<Alert> = alerts.values().cloned().collect();
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(all)
    }

    async fn list_alerts_by_creator(&self, user_id: Uuid) -> anyhow::Result<Vec<Alert>> {
        let alerts = self.alerts.read().unwrap_or_else(|e| e.into_inner());
        let mut mine: Vec<Alert> = alerts
            .values()
            .filter(|a| a.created_by.id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(mine)
    }

    async fn insert_alert(&self, alert: &Alert) -> anyhow::Result<()> {
        let mut alerts = self.alerts.write().unwrap_or_else(|e| e.into_inner());
        alerts.insert(alert.id, alert.clone());
        Ok(())
    }

    async fn upsert_alert(&self, alert: &Alert) -> anyhow::Result<()> {
        self.insert_alert(alert).await
    }

    async fn delete_alert(&self, id: Uuid) -> anyhow::Result<()> {
        let mut alerts = self.alerts.write().unwrap_or_else(|e| e.into_inner());
        alerts.remove(&id);
        Ok(())
    }
}

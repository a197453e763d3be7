use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Result of an insert; conflicts on either unique key are reported, not raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    UsernameTaken,
    EmailTaken,
}

/// Registered users keyed by username.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<UserRecord>>;

    async fn email_taken(&self, email: &str) -> anyhow::Result<bool>;

    /// Must check both username and email atomically with the write.
    async fn insert(&self, user: UserRecord) -> anyhow::Result<InsertOutcome>;
}

#[async_trait::async_trait]
impl<T: UserDirectory + ?Sized> UserDirectory for std::sync::Arc<T> {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<UserRecord>> {
        (**self).find_by_username(username).await
    }

    async fn email_taken(&self, email: &str) -> anyhow::Result<bool> {
        (**self).email_taken(email).await
    }

    async fn insert(&self, user: UserRecord) -> anyhow::Result<InsertOutcome> {
        (**self).insert(user).await
    }
}

#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: tokio::sync::Mutex<HashMap<String, UserRecord>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<UserRecord>> {
        Ok(self.users.lock().await.get(username).cloned())
    }

    async fn email_taken(&self, email: &str) -> anyhow::Result<bool> {
        Ok(self.users.lock().await.values().any(|u| u.email == email))
    }

    async fn insert(&self, user: UserRecord) -> anyhow::Result<InsertOutcome> {
        let mut guard = self.users.lock().await;
        if guard.contains_key(&user.username) {
            return Ok(InsertOutcome::UsernameTaken);
        }
        if guard.values().any(|u| u.email == user.email) {
            return Ok(InsertOutcome::EmailTaken);
        }
        guard.insert(user.username.clone(), user);
        Ok(InsertOutcome::Inserted)
    }
}

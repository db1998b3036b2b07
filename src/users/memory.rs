use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo::UserStore;
use super::repo_types::{NewUser, StoreError, User, UserPatch};

/// Process-local store for running without a database.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
    offline: AtomicBool,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with [`StoreError::Unavailable`].
    #[cfg(test)]
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        self.ensure_online()?;
        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            login: user.login,
            password_hash: user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        self.users.write().await.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, StoreError> {
        self.ensure_online()?;
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| u.login == login)
            .min_by_key(|u| u.created_at)
            .cloned())
    }

    async fn update_by_id(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError> {
        self.ensure_online()?;
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(login) = patch.login {
            user.login = login;
        }
        Ok(Some(user.clone()))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.ensure_online()?;
        Ok(self.users.write().await.remove(&id))
    }
}

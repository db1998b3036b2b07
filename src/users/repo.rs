use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewUser, StoreError, User, UserPatch};

/// Persistence for user records. Every call is a single store round trip.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, StoreError>;
    async fn update_by_id(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError>;
    async fn delete_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, login, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, login, password_hash, created_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.login)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    /// Logins are not unique; the oldest matching record wins.
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, login, password_hash, created_at
            FROM users
            WHERE login = $1
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn update_by_id(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET email = COALESCE($2, email),
                   login = COALESCE($3, login)
             WHERE id = $1
            RETURNING id, email, login, password_hash, created_at
            "#,
        )
        .bind(id)
        .bind(patch.email)
        .bind(patch.login)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            DELETE FROM users
             WHERE id = $1
            RETURNING id, email, login, password_hash, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{LoginRequest, PublicUser, RegisterRequest, UpdateUserRequest};
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password_async, verify_password_async};
use crate::config::AccessPolicy;
use crate::errors::AccountError;
use crate::users::{NewUser, UserPatch, UserStore};

/// Register, login, update and delete over a shared [`UserStore`].
/// Holds no per-request state.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    keys: JwtKeys,
    policy: AccessPolicy,
}

impl AccountService {
    pub fn new(store: Arc<dyn UserStore>, keys: JwtKeys, policy: AccessPolicy) -> Self {
        Self {
            store,
            keys,
            policy,
        }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<PublicUser, AccountError> {
        let password_hash = hash_password_async(req.password)
            .await
            .map_err(|e| AccountError::Internal(e.into()))?;

        let user = self
            .store
            .create(NewUser {
                email: req.email,
                login: req.login,
                password_hash,
            })
            .await
            .map_err(AccountError::store("register user"))?;

        info!(user_id = %user.id, login = %user.login, "user registered");
        Ok(user.into())
    }

    /// Unknown login and wrong password fail identically.
    pub async fn login(&self, req: LoginRequest) -> Result<String, AccountError> {
        let user = self
            .store
            .find_by_login(&req.login)
            .await
            .map_err(AccountError::store("log in"))?;

        let Some(user) = user else {
            warn!(login = %req.login, "login unknown user");
            return Err(AccountError::InvalidCredentials);
        };

        let ok = verify_password_async(req.password, user.password_hash.clone())
            .await
            .map_err(|e| AccountError::Internal(e.into()))?;
        if !ok {
            warn!(login = %req.login, user_id = %user.id, "login invalid password");
            return Err(AccountError::InvalidCredentials);
        }

        let token = self
            .keys
            .issue(user.id)
            .map_err(|e| AccountError::Internal(e.into()))?;
        info!(user_id = %user.id, "user logged in");
        Ok(token)
    }

    /// Resolves a bearer token to its subject. Every failure is `Forbidden`.
    pub fn authenticate(&self, token: &str) -> Result<Uuid, AccountError> {
        match self.keys.verify(token) {
            Ok(claims) => Ok(claims.sub),
            Err(e) => {
                warn!(reason = %e, "token rejected");
                Err(AccountError::Forbidden)
            }
        }
    }

    fn authorize(&self, actor: Uuid, target: Uuid) -> Result<(), AccountError> {
        match self.policy {
            AccessPolicy::Any => Ok(()),
            AccessPolicy::SelfOnly if actor == target => Ok(()),
            AccessPolicy::SelfOnly => {
                warn!(%actor, %target, "subject may not modify another user");
                Err(AccountError::Forbidden)
            }
        }
    }

    pub async fn update(
        &self,
        actor: Uuid,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<PublicUser, AccountError> {
        self.authorize(actor, id)?;
        let patch = UserPatch {
            email: req.email,
            login: req.login,
        };
        let user = self
            .store
            .update_by_id(id, patch)
            .await
            .map_err(AccountError::store("update user"))?
            .ok_or(AccountError::NotFound)?;

        info!(user_id = %user.id, %actor, "user updated");
        Ok(user.into())
    }

    pub async fn delete(&self, actor: Uuid, id: Uuid) -> Result<(), AccountError> {
        self.authorize(actor, id)?;
        let user = self
            .store
            .delete_by_id(id)
            .await
            .map_err(AccountError::store("delete user"))?
            .ok_or(AccountError::NotFound)?;

        info!(user_id = %user.id, %actor, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::users::InMemoryUserStore;

    fn service(policy: AccessPolicy) -> AccountService {
        let keys = JwtKeys::from(&JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 60,
        });
        AccountService::new(Arc::new(InMemoryUserStore::new()), keys, policy)
    }

    fn alice() -> RegisterRequest {
        RegisterRequest {
            email: "a@b.com".into(),
            login: "alice".into(),
            password: "secret".into(),
        }
    }

    fn login(login: &str, password: &str) -> LoginRequest {
        LoginRequest {
            login: login.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn register_then_login_issues_token_for_user() {
        let svc = service(AccessPolicy::Any);
        let user = svc.register(alice()).await.unwrap();
        let token = svc.login(login("alice", "secret")).await.unwrap();
        assert!(!token.is_empty());
        assert_eq!(svc.authenticate(&token).unwrap(), user.id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_login_are_indistinguishable() {
        let svc = service(AccessPolicy::Any);
        svc.register(alice()).await.unwrap();
        let wrong = svc.login(login("alice", "wrong")).await.unwrap_err();
        let unknown = svc.login(login("mallory", "secret")).await.unwrap_err();
        assert!(matches!(wrong, AccountError::InvalidCredentials));
        assert!(matches!(unknown, AccountError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn authenticate_rejects_garbage() {
        let svc = service(AccessPolicy::Any);
        assert!(matches!(
            svc.authenticate("not-a-token"),
            Err(AccountError::Forbidden)
        ));
    }

    // Known authorization gap: under the default policy a token for one user may
    // modify any other user.
    #[tokio::test]
    async fn any_policy_lets_any_subject_update_any_user() {
        let svc = service(AccessPolicy::Any);
        let target = svc.register(alice()).await.unwrap();
        let stranger = Uuid::new_v4();
        let updated = svc
            .update(
                stranger,
                target.id,
                UpdateUserRequest {
                    email: Some("owned@b.com".into()),
                    login: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, "owned@b.com");
        assert_eq!(updated.login, "alice");
    }

    #[tokio::test]
    async fn self_policy_requires_matching_subject() {
        let svc = service(AccessPolicy::SelfOnly);
        let target = svc.register(alice()).await.unwrap();
        let err = svc.delete(Uuid::new_v4(), target.id).await.unwrap_err();
        assert!(matches!(err, AccountError::Forbidden));
        svc.delete(target.id, target.id).await.unwrap();
    }

    #[tokio::test]
    async fn update_does_not_change_password() {
        let svc = service(AccessPolicy::Any);
        let user = svc.register(alice()).await.unwrap();
        svc.update(
            user.id,
            user.id,
            UpdateUserRequest {
                email: None,
                login: Some("alice2".into()),
            },
        )
        .await
        .unwrap();
        assert!(svc.login(login("alice2", "secret")).await.is_ok());
        assert!(matches!(
            svc.login(login("alice", "secret")).await,
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn missing_targets_are_not_found() {
        let svc = service(AccessPolicy::Any);
        let actor = Uuid::new_v4();
        let id = Uuid::new_v4();
        assert!(matches!(
            svc.update(actor, id, UpdateUserRequest::default()).await,
            Err(AccountError::NotFound)
        ));
        assert!(matches!(svc.delete(actor, id).await, Err(AccountError::NotFound)));
    }
}

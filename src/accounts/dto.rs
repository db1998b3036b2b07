use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AccountError;
use crate::users::User;

/// Field-presence checks run by the `ValidJson` extractor.
pub trait Validate {
    fn validate(&self) -> Result<(), AccountError>;

    /// Value used when the request carries no body at all. `None` makes the body required.
    fn when_absent() -> Option<Self>
    where
        Self: Sized,
    {
        None
    }
}

fn require(field: &str, value: &str) -> Result<(), AccountError> {
    if value.trim().is_empty() {
        return Err(AccountError::MalformedRequest(format!("`{field}` must not be empty")));
    }
    Ok(())
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub login: String,
    pub password: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), AccountError> {
        require("email", &self.email)?;
        require("login", &self.login)?;
        require("password", &self.password)
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), AccountError> {
        require("login", &self.login)?;
        require("password", &self.password)
    }
}

/// Request body for `PUT /users/{id}`. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub login: Option<String>,
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), AccountError> {
        if let Some(email) = &self.email {
            require("email", email)?;
        }
        if let Some(login) = &self.login {
            require("login", login)?;
        }
        Ok(())
    }

    fn when_absent() -> Option<Self> {
        Some(Self::default())
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub login: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            login: user.login,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_requires_every_field() {
        let ok = RegisterRequest {
            email: "a@b.com".into(),
            login: "alice".into(),
            password: "secret".into(),
        };
        assert!(ok.validate().is_ok());

        let blank_login = RegisterRequest {
            login: " ".into(),
            ..ok
        };
        assert!(matches!(
            blank_login.validate(),
            Err(AccountError::MalformedRequest(msg)) if msg.contains("login")
        ));
    }

    #[test]
    fn update_accepts_empty_patch_but_not_blank_values() {
        assert!(UpdateUserRequest::default().validate().is_ok());
        let blank = UpdateUserRequest {
            email: Some(String::new()),
            login: None,
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn only_update_has_a_default_for_missing_body() {
        assert!(UpdateUserRequest::when_absent().is_some());
        assert!(RegisterRequest::when_absent().is_none());
        assert!(LoginRequest::when_absent().is_none());
    }

    #[test]
    fn public_user_has_no_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "test@example.com".into(),
            login: "test".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: time::OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }
}

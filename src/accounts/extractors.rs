use axum::{
    async_trait,
    body::Bytes,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::header::CONTENT_TYPE,
    Json,
};
use serde::de::DeserializeOwned;

use super::dto::Validate;
use crate::errors::AccountError;

/// JSON body that must deserialize and pass [`Validate`], else `MalformedRequest`.
///
/// A request with no `Content-Type` and an empty body falls back to
/// [`Validate::when_absent`] when the target type provides one.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = AccountError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !req.headers().contains_key(CONTENT_TYPE) {
            if let Some(default) = T::when_absent() {
                let body = Bytes::from_request(req, state)
                    .await
                    .map_err(|e| AccountError::MalformedRequest(e.body_text()))?;
                if !body.is_empty() {
                    return Err(AccountError::MalformedRequest(
                        "Expected request with `Content-Type: application/json`".into(),
                    ));
                }
                return Ok(ValidJson(default));
            }
        }

        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| AccountError::MalformedRequest(e.body_text()))?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}

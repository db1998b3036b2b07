use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::dto::{
    LoginRequest, MessageResponse, PublicUser, RegisterRequest, TokenResponse, UpdateUserRequest,
};
use super::extractors::ValidJson;
use crate::{auth::extractors::AuthUser, errors::AccountError, state::AppState};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/users/:id", put(update_user).delete(delete_user))
}

/// A path id that is not a UUID cannot name a stored user.
fn parse_user_id(raw: &str) -> Result<Uuid, AccountError> {
    raw.parse::<Uuid>().map_err(|_| {
        warn!(id = %raw, "user id is not a uuid");
        AccountError::NotFound
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AccountError> {
    state.accounts.register(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AccountError> {
    let token = state.accounts.login(payload).await?;
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateUserRequest>,
) -> Result<Json<PublicUser>, AccountError> {
    let id = parse_user_id(&id)?;
    let user = state.accounts.update(actor, id, payload).await?;
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AccountError> {
    let id = parse_user_id(&id)?;
    state.accounts.delete(actor, id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

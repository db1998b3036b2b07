use crate::state::AppState;
use axum::Router;

mod dto;
mod extractors;
pub mod handlers;
mod services;

pub use services::AccountService;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::account_routes())
}

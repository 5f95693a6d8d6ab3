use axum::Router;

use crate::state::AppState;

pub mod claims;
pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod service;
pub mod tokens;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}

pub mod dto;
pub mod filter;
pub mod handlers;
pub mod repo;
pub mod repo_types;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::directory_routes())
        .merge(handlers::perk_routes())
}

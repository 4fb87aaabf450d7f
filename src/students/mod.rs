use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod memory;
pub mod model;
pub mod pg;
pub mod repo;
pub mod services;
mod validate;

pub fn router(max_file_bytes: usize) -> Router<AppState> {
    Router::new()
        .merge(handlers::register_routes(max_file_bytes))
        .merge(handlers::admin_routes())
}

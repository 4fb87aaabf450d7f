use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::instrument;

use super::{dto::PublicProfile, services::authenticate};
use crate::{
    error::{msg, AppError},
    response::ApiResponse,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/api/login", post(login))
}

/// POST /api/login `{emailOrPhone, password}`
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<super::dto::LoginRequest>, JsonRejection>,
) -> Result<ApiResponse<PublicProfile>, AppError> {
    let Json(payload) = payload?;
    let outcome = authenticate(&state, payload).await?;
    Ok(ApiResponse::data(outcome.profile)
        .with_msg(msg::LOGGED_IN)
        .with_token(outcome.token))
}

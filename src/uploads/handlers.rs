use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::instrument;

use super::services::{ext_from_mime, AttachmentKind};
use crate::{
    error::{msg, AppError},
    state::AppState,
};

pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/uploads/:kind/:file_name", get(serve_upload))
}

/// GET /uploads/:kind/:file_name
#[instrument(skip(state))]
pub async fn serve_upload(
    State(state): State<AppState>,
    Path((kind, file_name)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let kind = AttachmentKind::from_dir(&kind).ok_or(AppError::NotFound(msg::FILE_NOT_FOUND))?;
    if file_name.contains(['/', '\\']) || file_name.starts_with('.') {
        return Err(AppError::NotFound(msg::FILE_NOT_FOUND));
    }
    let key = format!("{}/{}", kind.dir(), file_name);

    let body = state
        .bounded("storage get", state.storage.get_object(&key))
        .await?
        .map_err(AppError::Io)?
        .ok_or(AppError::NotFound(msg::FILE_NOT_FOUND))?;

    // anything outside the upload allow-list goes out as an opaque download
    let content_type = mime_guess::from_path(&file_name)
        .first()
        .map(|m| m.essence_str().to_string())
        .filter(|ct| ext_from_mime(ct).is_some())
        .unwrap_or_else(|| "application/octet-stream".to_string());
    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
        ],
        body,
    ))
}

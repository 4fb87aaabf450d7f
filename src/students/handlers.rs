use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        DefaultBodyLimit, Multipart, Path, State,
    },
    response::Html,
    routing::{get, post, put},
    Json, Router,
};
use axum::extract::multipart::MultipartRejection;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CreatedStudent, RegistrationForm},
    model::{Student, StudentPatch},
    services,
};
use crate::{
    error::{msg, AppError},
    response::ApiResponse,
    state::AppState,
    uploads::services::{AttachmentKind, UploadItem},
};

/// Room for both attachments at the ceiling plus the text fields, so an
/// oversized file reaches the upload check instead of the body limit.
pub fn register_body_limit(max_file_bytes: usize) -> usize {
    AttachmentKind::ALL.len() * max_file_bytes + 1024 * 1024
}

pub fn register_routes(max_file_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/register", post(register).get(register_info))
        .layer(DefaultBodyLimit::max(register_body_limit(max_file_bytes)))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/students", get(list_students))
        .route("/api/students/:id", put(update_student).delete(delete_student))
        .route("/api/students/:id/activate", put(activate_student))
}

/// GET /api/register
pub async fn register_info() -> Html<&'static str> {
    Html(
        "<h1>Register Endpoint</h1>\
         <p>This endpoint accepts <strong>POST</strong> requests with multipart form-data to register a student.</p>\
         <p>Fields: firstName, middleName, lastName, phone, fatherPhone, gender, government, grade, \
         email (optional), password, confirmPassword. Files: nationalIdCopy, userLogo (optional).</p>",
    )
}

/// POST /api/register (multipart)
#[instrument(skip(state, mp))]
pub async fn register(
    State(state): State<AppState>,
    mp: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<CreatedStudent>, AppError> {
    let mut mp = mp.map_err(|e| {
        warn!(rejection = %e, "register without multipart body");
        AppError::Validation(msg::BAD_REQUEST.into())
    })?;

    let mut form = RegistrationForm::default();
    let mut files: Vec<UploadItem> = Vec::new();
    while let Some(field) = mp.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match AttachmentKind::from_field(&name) {
            Some(kind) => {
                // one file per slot; later parts with the same name are ignored
                if files.iter().any(|f| f.kind == kind) {
                    continue;
                }
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let body = field.bytes().await?;
                // browsers send an empty unnamed part for an untouched file input
                if body.is_empty() && file_name.is_empty() {
                    continue;
                }
                files.push(UploadItem {
                    kind,
                    file_name,
                    content_type,
                    body,
                });
            }
            None => {
                let value = field.text().await?;
                form.set(&name, value);
            }
        }
    }

    let id = services::register(&state, form, files).await?;
    Ok(ApiResponse::data(CreatedStudent { id })
        .with_msg(msg::REGISTERED)
        .created())
}

/// GET /api/students
#[instrument(skip(state))]
pub async fn list_students(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Student>>, AppError> {
    let students = services::list_students(&state).await?;
    Ok(ApiResponse::data(students))
}

/// PUT /api/students/:id
#[instrument(skip(state, patch))]
pub async fn update_student(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    patch: Result<Json<StudentPatch>, JsonRejection>,
) -> Result<ApiResponse<Student>, AppError> {
    let Path(id) = id?;
    let Json(patch) = patch?;
    let student = services::update_student(&state, id, patch).await?;
    Ok(ApiResponse::data(student).with_msg(msg::UPDATED))
}

/// DELETE /api/students/:id
#[instrument(skip(state))]
pub async fn delete_student(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResponse<()>, AppError> {
    let Path(id) = id?;
    services::delete_student(&state, id).await?;
    Ok(ApiResponse::message(msg::DELETED))
}

/// PUT /api/students/:id/activate
#[instrument(skip(state))]
pub async fn activate_student(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResponse<Student>, AppError> {
    let Path(id) = id?;
    let student = services::activate_student(&state, id).await?;
    Ok(ApiResponse::data(student).with_msg(msg::ACTIVATED))
}

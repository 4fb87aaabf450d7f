use axum::extract::FromRef;
use tracing::{info, instrument, warn};

use super::dto::{LoginOutcome, LoginRequest, PublicProfile};
use super::jwt::JwtKeys;
use crate::{
    error::{msg, AppError},
    state::AppState,
};

/// lookup → activation gate → password check → token.
#[instrument(skip(st, req))]
pub async fn authenticate(st: &AppState, req: LoginRequest) -> Result<LoginOutcome, AppError> {
    let identifier = req.email_or_phone.trim();
    if identifier.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(msg::MISSING_FIELDS.into()));
    }

    let student = st
        .bounded("store find", st.store.find_by_phone_or_email(identifier))
        .await??
        .ok_or_else(|| {
            warn!("login for unknown identifier");
            AppError::NotFound(msg::ACCOUNT_NOT_FOUND)
        })?;

    if !student.is_active {
        warn!(student_id = %student.id, "login before activation");
        return Err(AppError::Forbidden);
    }

    let ok = st
        .hasher
        .verify_blocking(req.password, student.password_hash.clone())
        .await?;
    if !ok {
        warn!(student_id = %student.id, "login invalid password");
        return Err(AppError::Unauthorized);
    }

    let token = JwtKeys::from_ref(st).sign(student.id)?;
    info!(student_id = %student.id, "student logged in");
    Ok(LoginOutcome {
        token,
        profile: PublicProfile {
            id: student.id,
            name: student.first_name,
        },
    })
}

use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::RegistrationForm;
use super::model::{NewStudent, Student, StudentPatch};
use super::validate::normalize_email;
use crate::{
    error::{msg, AppError},
    state::AppState,
    uploads::services::{remove_attachments, store_attachments, UploadItem},
};

/// presence → password match → duplicate pre-check → hash → attachments → create.
///
/// The first failing step ends the workflow. Attachments are only written once
/// every earlier step passed, and are removed again if the record is not created.
#[instrument(skip(st, form, attachments), fields(files = attachments.len()))]
pub async fn register(
    st: &AppState,
    form: RegistrationForm,
    attachments: Vec<UploadItem>,
) -> Result<Uuid, AppError> {
    let missing = form.missing_fields();
    if !missing.is_empty() {
        warn!(?missing, "registration missing required fields");
        return Err(AppError::Validation(msg::MISSING_FIELDS.into()));
    }

    let password = form.password.unwrap_or_default();
    if Some(&password) != form.confirm_password.as_ref() {
        warn!("registration password mismatch");
        return Err(AppError::Validation(msg::PASSWORD_MISMATCH.into()));
    }

    let phone = form.phone.unwrap_or_default().trim().to_string();
    let email = normalize_email(form.email.as_ref());
    let taken = st
        .bounded(
            "store exists",
            st.store.exists_by_phone_or_email(&phone, email.as_deref()),
        )
        .await??;
    if taken {
        warn!("registration for existing phone or email");
        return Err(AppError::Conflict);
    }

    let password_hash = st.hasher.hash_blocking(password).await?;

    let stored = store_attachments(st, attachments).await?;

    let new = NewStudent {
        first_name: form.first_name.unwrap_or_default(),
        middle_name: form.middle_name.unwrap_or_default(),
        last_name: form.last_name.unwrap_or_default(),
        phone,
        father_phone: form.father_phone.unwrap_or_default(),
        gender: form.gender.unwrap_or_default(),
        government: form.government.unwrap_or_default(),
        grade: form.grade.unwrap_or_default(),
        email,
        password_hash,
        national_id_path: stored.national_id_path.clone(),
        user_logo: stored.user_logo.clone(),
        is_active: st.config.default_active,
    };

    let created = st
        .bounded("store create", st.store.create(new))
        .await
        .and_then(|r| r.map_err(AppError::from));
    match created {
        Ok(student) => {
            info!(student_id = %student.id, active = student.is_active, "student registered");
            Ok(student.id)
        }
        Err(e) => {
            if matches!(e, AppError::Conflict) {
                warn!("duplicate phone or email detected at insert");
            }
            remove_attachments(st, stored.paths()).await;
            Err(e)
        }
    }
}

#[instrument(skip(st))]
pub async fn list_students(st: &AppState) -> Result<Vec<Student>, AppError> {
    Ok(st.bounded("store list", st.store.list_all()).await??)
}

#[instrument(skip(st, patch))]
pub async fn update_student(
    st: &AppState,
    id: Uuid,
    patch: StudentPatch,
) -> Result<Student, AppError> {
    let updated = st
        .bounded("store update", st.store.update_by_id(id, patch))
        .await??
        .ok_or(AppError::NotFound(msg::STUDENT_NOT_FOUND))?;
    info!(student_id = %id, "student updated");
    Ok(updated)
}

#[instrument(skip(st))]
pub async fn delete_student(st: &AppState, id: Uuid) -> Result<(), AppError> {
    let removed = st
        .bounded("store delete", st.store.delete_by_id(id))
        .await??
        .ok_or(AppError::NotFound(msg::STUDENT_NOT_FOUND))?;
    remove_attachments(st, removed.attachment_paths()).await;
    info!(student_id = %id, "student deleted");
    Ok(())
}

#[instrument(skip(st))]
pub async fn activate_student(st: &AppState, id: Uuid) -> Result<Student, AppError> {
    let student = st
        .bounded("store activate", st.store.set_active(id, true))
        .await??
        .ok_or(AppError::NotFound(msg::STUDENT_NOT_FOUND))?;
    info!(student_id = %id, "student activated");
    Ok(student)
}

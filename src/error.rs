use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::students::repo::StoreError;

/// User-facing messages, in the language the clients of this service read.
pub mod msg {
    pub const MISSING_FIELDS: &str = "من فضلك اكمل كل البيانات المطلوبة.";
    pub const PASSWORD_MISMATCH: &str = "كلمة السر غير متطابقة.";
    pub const DUPLICATE: &str = "رقم الهاتف أو البريد مسجل من قبل.";
    pub const STUDENT_NOT_FOUND: &str = "الطالب غير موجود";
    pub const ACCOUNT_NOT_FOUND: &str = "الحساب غير موجود.";
    pub const NOT_ACTIVATED: &str = "حسابك لم يتم تفعيله بعد.";
    pub const WRONG_PASSWORD: &str = "كلمة المرور غير صحيحة.";
    pub const BAD_FILE_TYPE: &str = "نوع الملف غير مسموح (فقط صور أو PDF)";
    pub const FILE_TOO_LARGE: &str = "حجم الملف أكبر من المسموح (5 ميجابايت).";
    pub const FILE_NOT_FOUND: &str = "الملف غير موجود";
    pub const BAD_REQUEST: &str = "البيانات المرسلة غير صالحة.";
    pub const TIMEOUT: &str = "انتهت مهلة العملية، حاول مرة أخرى.";
    pub const UNEXPECTED: &str = "حدث خطأ غير متوقع.";

    pub const REGISTERED: &str = "تم إنشاء الحساب بنجاح";
    pub const UPDATED: &str = "تم تعديل البيانات بنجاح";
    pub const DELETED: &str = "تم حذف الطالب بنجاح";
    pub const ACTIVATED: &str = "تم تفعيل الحساب بنجاح";
    pub const LOGGED_IN: &str = "تم تسجيل الدخول بنجاح";
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{}", msg::DUPLICATE)]
    Conflict,
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{}", msg::NOT_ACTIVATED)]
    Forbidden,
    #[error("{}", msg::WRONG_PASSWORD)]
    Unauthorized,
    #[error("{}", msg::BAD_FILE_TYPE)]
    UnsupportedMediaType,
    #[error("{}", msg::FILE_TOO_LARGE)]
    PayloadTooLarge,
    #[error("storage failure: {0:#}")]
    Io(anyhow::Error),
    #[error("{op} timed out")]
    Timeout { op: &'static str },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Timeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Io(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Timeout { .. } => msg::TIMEOUT.to_string(),
            // 5xx keep the underlying message visible to the caller.
            AppError::Io(e) | AppError::Internal(e) => {
                let detail = format!("{e:#}");
                if detail.is_empty() {
                    msg::UNEXPECTED.to_string()
                } else {
                    detail
                }
            }
            other => other.to_string(),
        }
    }
}

#[derive(Debug, serde::Serialize)]
struct ErrorBody {
    ok: bool,
    msg: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, %status, "request failed");
        }
        let body = ErrorBody {
            ok: false,
            msg: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(violations) => AppError::Validation(
                violations
                    .iter()
                    .map(|v| v.message)
                    .collect::<Vec<_>>()
                    .join("، "),
            ),
            // A unique index fired after the pre-check passed: same answer as the pre-check.
            StoreError::DuplicateKey { .. } => AppError::Conflict,
            StoreError::Database(e) => AppError::Internal(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(r: JsonRejection) -> Self {
        if r.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge;
        }
        tracing::warn!(rejection = %r.body_text(), "json body rejected");
        AppError::Validation(msg::BAD_REQUEST.into())
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge;
        }
        tracing::warn!(error = %e.body_text(), "multipart body rejected");
        AppError::Validation(msg::BAD_REQUEST.into())
    }
}

impl From<PathRejection> for AppError {
    fn from(_: PathRejection) -> Self {
        AppError::NotFound(msg::STUDENT_NOT_FOUND)
    }
}

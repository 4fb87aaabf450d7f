use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::model::{NewStudent, Student, StudentPatch};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failed for {}", .0.iter().map(|v| v.field).collect::<Vec<_>>().join(", "))]
    Validation(Vec<FieldViolation>),
    #[error("duplicate value for unique field `{field}`")]
    DuplicateKey { field: &'static str },
    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// Persistence for student records.
///
/// `phone` is unique; `email` is unique among records that have one. Both
/// constraints are enforced at write time by `create` and `update_by_id`,
/// independently of any earlier `exists_by_phone_or_email` check.
#[async_trait]
pub trait StudentStore: Send + Sync {
    /// First student whose phone equals `identifier` or whose email equals it
    /// (emails compare case-insensitively).
    async fn find_by_phone_or_email(&self, identifier: &str) -> Result<Option<Student>, StoreError>;

    /// `None` email only checks the phone; absent emails never collide.
    async fn exists_by_phone_or_email(
        &self,
        phone: &str,
        email: Option<&str>,
    ) -> Result<bool, StoreError>;

    async fn create(&self, student: NewStudent) -> Result<Student, StoreError>;

    async fn update_by_id(&self, id: Uuid, patch: StudentPatch) -> Result<Option<Student>, StoreError>;

    /// Returns the removed record so its attachments can be cleaned up.
    async fn delete_by_id(&self, id: Uuid) -> Result<Option<Student>, StoreError>;

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<Student>, StoreError>;

    /// Newest `created_at` first.
    async fn list_all(&self) -> Result<Vec<Student>, StoreError>;
}

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "ذكر", alias = "male", alias = "Male")]
    Male,
    #[serde(rename = "أنثى", alias = "female", alias = "Female")]
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "ذكر",
            Gender::Female => "أنثى",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "ذكر" => Some(Gender::Male),
            "أنثى" => Some(Gender::Female),
            other if other.eq_ignore_ascii_case("male") => Some(Gender::Male),
            other if other.eq_ignore_ascii_case("female") => Some(Gender::Female),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown gender value `{0}`")]
pub struct UnknownGender(String);

impl TryFrom<String> for Gender {
    type Error = UnknownGender;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Gender::parse(&value).ok_or(UnknownGender(value))
    }
}

/// Student record. `password_hash` never leaves the process: every JSON
/// rendering of a student goes through this `Serialize` impl.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub phone: String,
    pub father_phone: String,
    #[sqlx(try_from = "String")]
    pub gender: Gender,
    pub government: String,
    pub grade: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_id_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_logo: Option<String>,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Student {
    /// Public paths of the attachments this record points at.
    pub fn attachment_paths(&self) -> impl Iterator<Item = &str> {
        self.national_id_path
            .as_deref()
            .into_iter()
            .chain(self.user_logo.as_deref())
    }
}

/// Fields for a new record, as handed to the store.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub phone: String,
    pub father_phone: String,
    pub gender: String,
    pub government: String,
    pub grade: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub national_id_path: Option<String>,
    pub user_logo: Option<String>,
    pub is_active: bool,
}

/// Allow-listed partial update. Anything outside this list (`passwordHash`,
/// `isActive`, `id`, timestamps) is rejected at deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StudentPatch {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub father_phone: Option<String>,
    pub gender: Option<String>,
    pub government: Option<String>,
    pub grade: Option<String>,
    /// An empty string removes the email.
    pub email: Option<String>,
}

impl StudentPatch {
    /// Writes the patch onto `target`. Callers validate afterwards.
    pub fn apply_to(&self, target: &mut Student) -> Result<(), super::repo::StoreError> {
        use super::validate::normalize_email;

        fn set(slot: &mut String, value: &Option<String>) {
            if let Some(v) = value {
                *slot = v.trim().to_string();
            }
        }
        set(&mut target.first_name, &self.first_name);
        set(&mut target.middle_name, &self.middle_name);
        set(&mut target.last_name, &self.last_name);
        set(&mut target.phone, &self.phone);
        set(&mut target.father_phone, &self.father_phone);
        set(&mut target.government, &self.government);
        set(&mut target.grade, &self.grade);
        if let Some(raw) = &self.gender {
            target.gender = Gender::parse(raw).ok_or_else(|| {
                super::repo::StoreError::Validation(vec![super::validate::GENDER_VIOLATION])
            })?;
        }
        if let Some(raw) = &self.email {
            target.email = normalize_email(Some(raw));
        }
        Ok(())
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Phone number or email.
    #[serde(default)]
    pub email_or_phone: String,
    #[serde(default)]
    pub password: String,
}

/// Public part of the student returned on login.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PublicProfile {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub profile: PublicProfile,
}

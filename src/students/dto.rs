use serde::Serialize;
use uuid::Uuid;

/// Text fields of a registration submission. Everything is optional here;
/// presence is checked by the registration workflow.
#[derive(Debug, Default, Clone)]
pub struct RegistrationForm {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub father_phone: Option<String>,
    pub gender: Option<String>,
    pub government: Option<String>,
    pub grade: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

impl RegistrationForm {
    /// Stores a multipart text part; unknown names are ignored.
    pub fn set(&mut self, name: &str, value: String) {
        let slot = match name {
            "firstName" => &mut self.first_name,
            "middleName" => &mut self.middle_name,
            "lastName" => &mut self.last_name,
            "phone" => &mut self.phone,
            "fatherPhone" => &mut self.father_phone,
            "gender" => &mut self.gender,
            "government" => &mut self.government,
            "grade" => &mut self.grade,
            "email" => &mut self.email,
            "password" => &mut self.password,
            "confirmPassword" => &mut self.confirm_password,
            _ => return,
        };
        *slot = Some(value);
    }

    /// Names of required fields that are absent or blank. The password is
    /// taken verbatim: only an absent or empty one is missing.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let required = [
            ("firstName", &self.first_name),
            ("middleName", &self.middle_name),
            ("lastName", &self.last_name),
            ("phone", &self.phone),
            ("fatherPhone", &self.father_phone),
            ("gender", &self.gender),
            ("government", &self.government),
            ("grade", &self.grade),
        ];
        let mut missing: Vec<&'static str> = required
            .into_iter()
            .filter(|(_, v)| v.as_deref().map_or(true, |s| s.trim().is_empty()))
            .map(|(name, _)| name)
            .collect();
        if self.password.as_deref().map_or(true, str::is_empty) {
            missing.push("password");
        }
        missing
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedStudent {
    pub id: Uuid,
}

use lazy_static::lazy_static;
use regex::Regex;

use super::model::{Gender, NewStudent, Student};
use super::repo::{FieldViolation, StoreError};

lazy_static! {
    static ref PHONE_RE: Regex = Regex::new(r"^01[0-9]{9}$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^\S+@\S+\.\S+$").unwrap();
}

const BAD_PHONE: &str = "رقم الهاتف غير صحيح";
const BAD_EMAIL: &str = "البريد الإلكتروني غير صحيح";

pub(crate) const GENDER_VIOLATION: FieldViolation = FieldViolation {
    field: "gender",
    message: "النوع يجب أن يكون ذكر أو أنثى",
};

fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Trims and lowercases; blank input means "no email".
pub fn normalize_email(raw: Option<&String>) -> Option<String> {
    raw.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty())
}

fn required(field: &'static str, value: &str, out: &mut Vec<FieldViolation>) {
    if value.trim().is_empty() {
        out.push(FieldViolation {
            field,
            message: required_message(field),
        });
    }
}

fn required_message(field: &'static str) -> &'static str {
    match field {
        "firstName" => "الاسم الأول مطلوب",
        "middleName" => "الاسم الأوسط مطلوب",
        "lastName" => "اسم العائلة مطلوب",
        "phone" => "رقم الهاتف مطلوب",
        "fatherPhone" => "رقم هاتف ولي الأمر مطلوب",
        "government" => "المحافظة مطلوبة",
        "grade" => "الصف الدراسي مطلوب",
        "passwordHash" => "كلمة السر مطلوبة",
        _ => "حقل مطلوب",
    }
}

struct Fields<'a> {
    first_name: &'a str,
    middle_name: &'a str,
    last_name: &'a str,
    phone: &'a str,
    father_phone: &'a str,
    government: &'a str,
    grade: &'a str,
    email: Option<&'a str>,
    password_hash: &'a str,
}

fn check(f: Fields<'_>, out: &mut Vec<FieldViolation>) {
    required("firstName", f.first_name, out);
    required("middleName", f.middle_name, out);
    required("lastName", f.last_name, out);
    required("phone", f.phone, out);
    required("fatherPhone", f.father_phone, out);
    required("government", f.government, out);
    required("grade", f.grade, out);
    required("passwordHash", f.password_hash, out);

    if !f.phone.is_empty() && !is_valid_phone(f.phone) {
        out.push(FieldViolation { field: "phone", message: BAD_PHONE });
    }
    if !f.father_phone.is_empty() && !is_valid_phone(f.father_phone) {
        out.push(FieldViolation { field: "fatherPhone", message: BAD_PHONE });
    }
    if let Some(email) = f.email {
        if !is_valid_email(email) {
            out.push(FieldViolation { field: "email", message: BAD_EMAIL });
        }
    }
}

impl NewStudent {
    /// Trims text fields and lowercases the email, the way they are stored.
    pub fn normalize(mut self) -> Self {
        for slot in [
            &mut self.first_name,
            &mut self.middle_name,
            &mut self.last_name,
            &mut self.phone,
            &mut self.father_phone,
            &mut self.gender,
            &mut self.government,
            &mut self.grade,
        ] {
            *slot = slot.trim().to_string();
        }
        self.email = normalize_email(self.email.as_ref());
        self
    }

    /// Checks the normalized record and resolves its gender.
    pub fn validate(&self) -> Result<Gender, StoreError> {
        let mut violations = Vec::new();
        check(
            Fields {
                first_name: &self.first_name,
                middle_name: &self.middle_name,
                last_name: &self.last_name,
                phone: &self.phone,
                father_phone: &self.father_phone,
                government: &self.government,
                grade: &self.grade,
                email: self.email.as_deref(),
                password_hash: &self.password_hash,
            },
            &mut violations,
        );
        let gender = Gender::parse(&self.gender);
        if gender.is_none() {
            violations.push(GENDER_VIOLATION);
        }
        match gender {
            Some(g) if violations.is_empty() => Ok(g),
            _ => Err(StoreError::Validation(violations)),
        }
    }
}

impl Student {
    /// Same field rules as creation, run after a patch was applied.
    pub fn validate(&self) -> Result<(), StoreError> {
        let mut violations = Vec::new();
        check(
            Fields {
                first_name: &self.first_name,
                middle_name: &self.middle_name,
                last_name: &self.last_name,
                phone: &self.phone,
                father_phone: &self.father_phone,
                government: &self.government,
                grade: &self.grade,
                email: self.email.as_deref(),
                password_hash: &self.password_hash,
            },
            &mut violations,
        );
        if violations.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Validation(violations))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_student() -> NewStudent {
        NewStudent {
            first_name: " Omar ".into(),
            middle_name: "Ali".into(),
            last_name: "Hassan".into(),
            phone: "01012345678".into(),
            father_phone: "01198765432".into(),
            gender: "ذكر".into(),
            government: "Giza".into(),
            grade: "2".into(),
            email: Some("  Omar@Example.COM ".into()),
            password_hash: "hash".into(),
            national_id_path: None,
            user_logo: None,
            is_active: false,
        }
    }

    #[test]
    fn phone_pattern() {
        assert!(is_valid_phone("01012345678"));
        assert!(!is_valid_phone("0101234567"));
        assert!(!is_valid_phone("02012345678"));
        assert!(!is_valid_phone("010123456789"));
        assert!(!is_valid_phone("0101234567a"));
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.d"));
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        let s = new_student().normalize();
        assert_eq!(s.first_name, "Omar");
        assert_eq!(s.email.as_deref(), Some("omar@example.com"));
        assert_eq!(s.validate().unwrap(), Gender::Male);
    }

    #[test]
    fn blank_email_becomes_absent() {
        let mut s = new_student();
        s.email = Some("   ".into());
        assert_eq!(s.normalize().email, None);
    }

    #[test]
    fn validation_enumerates_each_bad_field() {
        let mut s = new_student();
        s.phone = "123".into();
        s.father_phone = "abc".into();
        s.gender = "x".into();
        s.grade = "  ".into();
        let s = s.normalize();
        let Err(StoreError::Validation(v)) = s.validate() else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = v.iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["grade", "phone", "fatherPhone", "gender"]);
    }
}

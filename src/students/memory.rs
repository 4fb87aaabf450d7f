//! In-process record store. Used when no `DATABASE_URL` is configured and by tests.

use async_trait::async_trait;
use parking_lot::RwLock;
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::{NewStudent, Student, StudentPatch};
use super::repo::{StoreError, StudentStore};

#[derive(Default)]
pub struct MemoryStudentStore {
    // insertion order, oldest first
    rows: RwLock<Vec<Student>>,
}

impl MemoryStudentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

fn unique_conflict(rows: &[Student], candidate: &Student) -> Option<&'static str> {
    rows.iter()
        .filter(|r| r.id != candidate.id)
        .find_map(|r| {
            if r.phone == candidate.phone {
                Some("phone")
            } else if r.email.is_some() && r.email == candidate.email {
                Some("email")
            } else {
                None
            }
        })
}

#[async_trait]
impl StudentStore for MemoryStudentStore {
    async fn find_by_phone_or_email(&self, identifier: &str) -> Result<Option<Student>, StoreError> {
        let email = identifier.to_lowercase();
        Ok(self
            .rows
            .read()
            .iter()
            .find(|s| s.phone == identifier || s.email.as_deref() == Some(email.as_str()))
            .cloned())
    }

    async fn exists_by_phone_or_email(
        &self,
        phone: &str,
        email: Option<&str>,
    ) -> Result<bool, StoreError> {
        let email = email.map(str::to_lowercase);
        Ok(self.rows.read().iter().any(|s| {
            s.phone == phone || (email.is_some() && s.email.as_deref() == email.as_deref())
        }))
    }

    async fn create(&self, student: NewStudent) -> Result<Student, StoreError> {
        let student = student.normalize();
        let gender = student.validate()?;
        let now = OffsetDateTime::now_utc();
        let row = Student {
            id: Uuid::new_v4(),
            first_name: student.first_name,
            middle_name: student.middle_name,
            last_name: student.last_name,
            phone: student.phone,
            father_phone: student.father_phone,
            gender,
            government: student.government,
            grade: student.grade,
            email: student.email,
            password_hash: student.password_hash,
            national_id_path: student.national_id_path,
            user_logo: student.user_logo,
            is_active: student.is_active,
            created_at: now,
            updated_at: now,
        };

        let mut rows = self.rows.write();
        if let Some(field) = unique_conflict(&rows, &row) {
            return Err(StoreError::DuplicateKey { field });
        }
        rows.push(row.clone());
        Ok(row)
    }

    async fn update_by_id(&self, id: Uuid, patch: StudentPatch) -> Result<Option<Student>, StoreError> {
        let mut rows = self.rows.write();
        let Some(pos) = rows.iter().position(|s| s.id == id) else {
            return Ok(None);
        };
        let mut updated = rows[pos].clone();
        patch.apply_to(&mut updated)?;
        updated.validate()?;
        if let Some(field) = unique_conflict(&rows, &updated) {
            return Err(StoreError::DuplicateKey { field });
        }
        updated.updated_at = OffsetDateTime::now_utc();
        rows[pos] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<Option<Student>, StoreError> {
        let mut rows = self.rows.write();
        Ok(rows
            .iter()
            .position(|s| s.id == id)
            .map(|pos| rows.remove(pos)))
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<Student>, StoreError> {
        let mut rows = self.rows.write();
        Ok(rows.iter_mut().find(|s| s.id == id).map(|s| {
            s.is_active = active;
            s.updated_at = OffsetDateTime::now_utc();
            s.clone()
        }))
    }

    async fn list_all(&self) -> Result<Vec<Student>, StoreError> {
        let mut out: Vec<Student> = self.rows.read().iter().rev().cloned().collect();
        // stable: equal timestamps keep newest insertion first
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_student(phone: &str, email: Option<&str>) -> NewStudent {
        NewStudent {
            first_name: "Omar".into(),
            middle_name: "Ali".into(),
            last_name: "Hassan".into(),
            phone: phone.into(),
            father_phone: "01198765432".into(),
            gender: "male".into(),
            government: "Cairo".into(),
            grade: "1".into(),
            email: email.map(String::from),
            password_hash: "hash".into(),
            national_id_path: None,
            user_logo: None,
            is_active: false,
        }
    }

    #[tokio::test]
    async fn create_enforces_unique_phone() {
        let store = MemoryStudentStore::new();
        store.create(new_student("01000000001", None)).await.unwrap();
        let err = store
            .create(new_student("01000000001", Some("x@y.io")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { field: "phone" }));
    }

    #[tokio::test]
    async fn email_uniqueness_is_sparse() {
        let store = MemoryStudentStore::new();
        store.create(new_student("01000000001", None)).await.unwrap();
        store.create(new_student("01000000002", None)).await.unwrap();
        store
            .create(new_student("01000000003", Some("A@B.io")))
            .await
            .unwrap();
        let err = store
            .create(new_student("01000000004", Some("a@b.io")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { field: "email" }));
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn exists_checks_both_fields() {
        let store = MemoryStudentStore::new();
        store
            .create(new_student("01000000001", Some("a@b.io")))
            .await
            .unwrap();
        assert!(store.exists_by_phone_or_email("01000000001", None).await.unwrap());
        assert!(store
            .exists_by_phone_or_email("01099999999", Some("A@b.io"))
            .await
            .unwrap());
        assert!(!store.exists_by_phone_or_email("01099999999", None).await.unwrap());
    }

    #[tokio::test]
    async fn find_by_phone_or_email_matches_either() {
        let store = MemoryStudentStore::new();
        let s = store
            .create(new_student("01000000001", Some("a@b.io")))
            .await
            .unwrap();
        let by_phone = store.find_by_phone_or_email("01000000001").await.unwrap().unwrap();
        let by_email = store.find_by_phone_or_email("A@B.IO").await.unwrap().unwrap();
        assert_eq!(by_phone.id, s.id);
        assert_eq!(by_email.id, s.id);
        assert!(store.find_by_phone_or_email("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_rejects_invalid_fields() {
        let store = MemoryStudentStore::new();
        let err = store.create(new_student("12345", None)).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn update_revalidates_and_checks_uniqueness() {
        let store = MemoryStudentStore::new();
        let a = store.create(new_student("01000000001", None)).await.unwrap();
        store.create(new_student("01000000002", None)).await.unwrap();

        let bad = StudentPatch { phone: Some("nope".into()), ..Default::default() };
        assert!(matches!(
            store.update_by_id(a.id, bad).await.unwrap_err(),
            StoreError::Validation(_)
        ));

        let dup = StudentPatch { phone: Some("01000000002".into()), ..Default::default() };
        assert!(matches!(
            store.update_by_id(a.id, dup).await.unwrap_err(),
            StoreError::DuplicateKey { field: "phone" }
        ));

        let ok = StudentPatch { grade: Some("3".into()), ..Default::default() };
        let updated = store.update_by_id(a.id, ok).await.unwrap().unwrap();
        assert_eq!(updated.grade, "3");
        assert!(updated.updated_at >= a.updated_at);

        let missing = store
            .update_by_id(Uuid::new_v4(), StudentPatch::default())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = MemoryStudentStore::new();
        let first = store.create(new_student("01000000001", None)).await.unwrap();
        let second = store.create(new_student("01000000002", None)).await.unwrap();
        let list = store.list_all().await.unwrap();
        assert_eq!(list[0].id, second.id);
        assert_eq!(list[1].id, first.id);
    }

    #[tokio::test]
    async fn activate_and_delete() {
        let store = MemoryStudentStore::new();
        let s = store.create(new_student("01000000001", None)).await.unwrap();
        assert!(!s.is_active);
        let active = store.set_active(s.id, true).await.unwrap().unwrap();
        assert!(active.is_active);
        assert!(store.delete_by_id(s.id).await.unwrap().is_some());
        assert!(store.delete_by_id(s.id).await.unwrap().is_none());
        assert!(store.set_active(s.id, true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_creates_with_same_phone_admit_one() {
        let store = Arc::new(MemoryStudentStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create(new_student("01000000001", None)).await
            }));
        }
        let mut ok = 0;
        for h in handles {
            if h.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(store.len(), 1);
    }
}

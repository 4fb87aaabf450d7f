use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::model::{NewStudent, Student, StudentPatch};
use super::repo::{StoreError, StudentStore};

const COLUMNS: &str = r#"id, first_name, middle_name, last_name, phone, father_phone, gender,
    government, grade, email, password_hash, national_id_path, user_logo, is_active,
    created_at, updated_at"#;

#[derive(Clone)]
pub struct PgStudentStore {
    db: PgPool,
}

impl PgStudentStore {
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .context("connect to database")?;
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;
        info!("postgres record store ready");
        Ok(Self { db })
    }

    pub fn from_pool(db: PgPool) -> Self {
        Self { db }
    }
}

/// Unique violations become `DuplicateKey`, everything else is a database failure.
fn map_db_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            let field = match db.constraint() {
                Some(c) if c.contains("email") => "email",
                _ => "phone",
            };
            return StoreError::DuplicateKey { field };
        }
    }
    StoreError::Database(anyhow::Error::new(e))
}

#[async_trait]
impl StudentStore for PgStudentStore {
    async fn find_by_phone_or_email(&self, identifier: &str) -> Result<Option<Student>, StoreError> {
        sqlx::query_as::<_, Student>(&format!(
            "SELECT {COLUMNS} FROM students WHERE phone = $1 OR email = lower($1) \
             ORDER BY created_at ASC LIMIT 1"
        ))
        .bind(identifier)
        .fetch_optional(&self.db)
        .await
        .map_err(map_db_err)
    }

    async fn exists_by_phone_or_email(
        &self,
        phone: &str,
        email: Option<&str>,
    ) -> Result<bool, StoreError> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM students
                WHERE phone = $1 OR ($2::text IS NOT NULL AND email = lower($2))
            )
            "#,
        )
        .bind(phone)
        .bind(email)
        .fetch_one(&self.db)
        .await
        .map_err(map_db_err)?;
        Ok(exists)
    }

    async fn create(&self, student: NewStudent) -> Result<Student, StoreError> {
        let student = student.normalize();
        let gender = student.validate()?;
        sqlx::query_as::<_, Student>(&format!(
            r#"
            INSERT INTO students (id, first_name, middle_name, last_name, phone, father_phone,
                gender, government, grade, email, password_hash, national_id_path, user_logo,
                is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&student.first_name)
        .bind(&student.middle_name)
        .bind(&student.last_name)
        .bind(&student.phone)
        .bind(&student.father_phone)
        .bind(gender.as_str())
        .bind(&student.government)
        .bind(&student.grade)
        .bind(&student.email)
        .bind(&student.password_hash)
        .bind(&student.national_id_path)
        .bind(&student.user_logo)
        .bind(student.is_active)
        .fetch_one(&self.db)
        .await
        .map_err(map_db_err)
    }

    async fn update_by_id(&self, id: Uuid, patch: StudentPatch) -> Result<Option<Student>, StoreError> {
        let mut tx = self.db.begin().await.map_err(map_db_err)?;
        let current = sqlx::query_as::<_, Student>(&format!(
            "SELECT {COLUMNS} FROM students WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_err)?;
        let Some(mut student) = current else {
            return Ok(None);
        };

        patch.apply_to(&mut student)?;
        student.validate()?;

        let updated = sqlx::query_as::<_, Student>(&format!(
            r#"
            UPDATE students
               SET first_name = $2, middle_name = $3, last_name = $4, phone = $5,
                   father_phone = $6, gender = $7, government = $8, grade = $9, email = $10,
                   updated_at = $11
             WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&student.first_name)
        .bind(&student.middle_name)
        .bind(&student.last_name)
        .bind(&student.phone)
        .bind(&student.father_phone)
        .bind(student.gender.as_str())
        .bind(&student.government)
        .bind(&student.grade)
        .bind(&student.email)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;
        Ok(Some(updated))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<Option<Student>, StoreError> {
        sqlx::query_as::<_, Student>(&format!(
            "DELETE FROM students WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(map_db_err)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<Student>, StoreError> {
        sqlx::query_as::<_, Student>(&format!(
            "UPDATE students SET is_active = $2, updated_at = now() WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(&self.db)
        .await
        .map_err(map_db_err)
    }

    async fn list_all(&self) -> Result<Vec<Student>, StoreError> {
        sqlx::query_as::<_, Student>(&format!(
            "SELECT {COLUMNS} FROM students ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db)
        .await
        .map_err(map_db_err)
    }
}

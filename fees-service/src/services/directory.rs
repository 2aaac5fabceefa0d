//! Tenant/student directory collaborator.
//!
//! Read-only lookups against the provisioning data: student records for
//! validation and display decoration, and per-tenant SMS credentials.

use async_trait::async_trait;
use secrecy::Secret;
use service_core::error::AppError;
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// A student as the directory knows them.
#[derive(Debug, Clone, FromRow)]
pub struct StudentRecord {
    pub student_id: Uuid,
    pub name: String,
    pub student_number: Option<String>,
    pub phone: Option<String>,
    pub class_name: Option<String>,
}

/// Per-tenant SMS gateway credentials.
#[derive(Debug, Clone)]
pub struct SmsSettings {
    pub sender_id: String,
    pub auth_key: Secret<String>,
}

#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn student(
        &self,
        tenant_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<StudentRecord>, AppError>;

    /// Batch lookup for display decoration.
    async fn students(
        &self,
        tenant_id: Uuid,
        student_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, StudentRecord>, AppError>;

    async fn sms_settings(&self, tenant_id: Uuid) -> Result<Option<SmsSettings>, AppError>;
}

/// Directory backed by the provisioning tables.
#[derive(Clone)]
pub struct PostgresDirectory {
    pool: PgPool,
}

impl PostgresDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantDirectory for PostgresDirectory {
    async fn student(
        &self,
        tenant_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<StudentRecord>, AppError> {
        let student = sqlx::query_as::<_, StudentRecord>(
            r#"
            SELECT student_id, name, student_number, phone, class_name
            FROM students
            WHERE tenant_id = $1 AND student_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to look up student: {}", e)))?;

        Ok(student)
    }

    async fn students(
        &self,
        tenant_id: Uuid,
        student_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, StudentRecord>, AppError> {
        let records = sqlx::query_as::<_, StudentRecord>(
            r#"
            SELECT student_id, name, student_number, phone, class_name
            FROM students
            WHERE tenant_id = $1 AND student_id = ANY($2)
            "#,
        )
        .bind(tenant_id)
        .bind(student_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to look up students: {}", e)))?;

        Ok(records.into_iter().map(|r| (r.student_id, r)).collect())
    }

    async fn sms_settings(&self, tenant_id: Uuid) -> Result<Option<SmsSettings>, AppError> {
        let row: Option<(Option<String>, Option<String>)> = sqlx::query_as(
            r#"
            SELECT sms_sender_id, sms_auth_key
            FROM school_settings
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to load SMS settings: {}", e)))?;

        Ok(row.and_then(|(sender_id, auth_key)| {
            Some(SmsSettings {
                sender_id: sender_id?,
                auth_key: Secret::new(auth_key?),
            })
        }))
    }
}

/// Fixed directory for tests and local development.
#[derive(Default)]
pub struct StaticDirectory {
    students: Mutex<HashMap<(Uuid, Uuid), StudentRecord>>,
    settings: Mutex<HashMap<Uuid, SmsSettings>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_student(&self, tenant_id: Uuid, record: StudentRecord) {
        self.students
            .lock()
            .unwrap()
            .insert((tenant_id, record.student_id), record);
    }

    pub fn set_sms_settings(&self, tenant_id: Uuid, settings: SmsSettings) {
        self.settings.lock().unwrap().insert(tenant_id, settings);
    }
}

#[async_trait]
impl TenantDirectory for StaticDirectory {
    async fn student(
        &self,
        tenant_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<StudentRecord>, AppError> {
        Ok(self
            .students
            .lock()
            .unwrap()
            .get(&(tenant_id, student_id))
            .cloned())
    }

    async fn students(
        &self,
        tenant_id: Uuid,
        student_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, StudentRecord>, AppError> {
        let students = self.students.lock().unwrap();
        Ok(student_ids
            .iter()
            .filter_map(|id| students.get(&(tenant_id, *id)).cloned())
            .map(|r| (r.student_id, r))
            .collect())
    }

    async fn sms_settings(&self, tenant_id: Uuid) -> Result<Option<SmsSettings>, AppError> {
        Ok(self.settings.lock().unwrap().get(&tenant_id).cloned())
    }
}

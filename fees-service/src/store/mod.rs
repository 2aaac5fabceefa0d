//! Ledger store: the transactional persistence collaborator.
//!
//! Plan, enrollment, and installment collections live behind this trait.
//! [`postgres::PostgresStore`] is the durable implementation;
//! [`memory::InMemoryStore`] backs the test suite and local development.
//! Both uphold the same contract: enrollment creation and payment
//! application are atomic, and concurrent payments against one installment
//! serialize.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{
    CreateEnrollment, CreatePlan, Enrollment, EnrollmentRecord, Installment, InstallmentFilter,
    InstallmentRow, NewInstallment, PaymentPlan, PaymentReceipt, PlanWithEnrollments,
    TenantSummary,
};

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    // Plans
    async fn create_plan(&self, input: &CreatePlan) -> Result<PaymentPlan, AppError>;
    async fn get_plan(
        &self,
        tenant_id: Uuid,
        plan_id: Uuid,
    ) -> Result<Option<PaymentPlan>, AppError>;
    async fn list_plans(&self, tenant_id: Uuid) -> Result<Vec<PlanWithEnrollments>, AppError>;
    async fn plan_enrollment_count(&self, tenant_id: Uuid, plan_id: Uuid)
        -> Result<i64, AppError>;
    async fn delete_plan(&self, tenant_id: Uuid, plan_id: Uuid) -> Result<bool, AppError>;

    // Enrollments
    async fn find_enrollment(
        &self,
        tenant_id: Uuid,
        student_id: Uuid,
        plan_id: Uuid,
    ) -> Result<Option<Enrollment>, AppError>;
    /// Create an enrollment together with all of its installments in one
    /// atomic write.
    async fn create_enrollment(
        &self,
        input: &CreateEnrollment,
        installments: &[NewInstallment],
    ) -> Result<(Enrollment, Vec<Installment>), AppError>;
    async fn enrollments_for_student(
        &self,
        tenant_id: Uuid,
        student_id: Uuid,
    ) -> Result<Vec<EnrollmentRecord>, AppError>;

    // Installments
    async fn get_installment(
        &self,
        tenant_id: Uuid,
        installment_id: Uuid,
    ) -> Result<Option<InstallmentRow>, AppError>;
    /// Apply a payment under a row-level lock, run the completion check, and
    /// promote the owning enrollment when every installment is paid, all in
    /// one transaction.
    async fn apply_payment(
        &self,
        tenant_id: Uuid,
        installment_id: Uuid,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<PaymentReceipt, AppError>;
    async fn list_installments(
        &self,
        tenant_id: Uuid,
        filter: &InstallmentFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<InstallmentRow>, AppError>;
    async fn mark_reminder_sent(
        &self,
        tenant_id: Uuid,
        installment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), AppError>;
    /// Reclassify pending/partial installments past their due date as
    /// overdue. Idempotent; returns the number of rows changed.
    async fn sweep_overdue(&self, tenant_id: Uuid, now: DateTime<Utc>) -> Result<u64, AppError>;

    // Reporting
    async fn summarize(&self, tenant_id: Uuid, now: DateTime<Utc>)
        -> Result<TenantSummary, AppError>;
}

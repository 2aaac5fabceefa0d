//! Enrollment engine: binds a student to a plan and materializes the
//! installment schedule.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::models::{
    split_amount, CreateEnrollment, EnrollmentDetail, EnrollmentRecord, NewInstallment,
};
use crate::services::directory::{StudentRecord, TenantDirectory};
use crate::services::metrics::record_enrollment_operation;
use crate::store::LedgerStore;

/// Request payload for enrolling a student.
#[derive(Debug, Clone, Deserialize)]
pub struct EnrollRequest {
    pub student_id: Uuid,
    pub plan_id: Uuid,
    #[serde(default)]
    pub due_dates: Vec<DateTime<Utc>>,
    pub total_amount: Option<Decimal>,
}

#[derive(Clone)]
pub struct EnrollmentEngine {
    store: Arc<dyn LedgerStore>,
    directory: Arc<dyn TenantDirectory>,
}

fn detail(record: EnrollmentRecord, student: &StudentRecord) -> EnrollmentDetail {
    EnrollmentDetail {
        enrollment_id: record.enrollment.enrollment_id,
        tenant_id: record.enrollment.tenant_id,
        student_id: record.enrollment.student_id,
        plan_id: record.enrollment.plan_id,
        student_name: student.name.clone(),
        student_number: student.student_number.clone(),
        plan_name: record.plan_name,
        total_amount: record.enrollment.total_amount,
        status: record.enrollment.status,
        installments: record.installments,
    }
}

impl EnrollmentEngine {
    pub fn new(store: Arc<dyn LedgerStore>, directory: Arc<dyn TenantDirectory>) -> Self {
        Self { store, directory }
    }

    #[instrument(skip(self, request), fields(tenant_id = %tenant_id, student_id = %request.student_id))]
    pub async fn enroll(
        &self,
        tenant_id: Uuid,
        request: EnrollRequest,
    ) -> Result<EnrollmentDetail, AppError> {
        if request.due_dates.is_empty() {
            return Err(AppError::Validation(anyhow::anyhow!(
                "At least one due date is required"
            )));
        }
        if let Some(amount) = request.total_amount {
            if amount <= Decimal::ZERO {
                return Err(AppError::Validation(anyhow::anyhow!(
                    "Total amount must be greater than zero"
                )));
            }
        }

        let plan = self
            .store
            .get_plan(tenant_id, request.plan_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Payment plan not found")))?;

        let student = self
            .directory
            .student(tenant_id, request.student_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Student not found")))?;

        if self
            .store
            .find_enrollment(tenant_id, request.student_id, request.plan_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Student is already enrolled in this plan"
            )));
        }

        let final_amount = request.total_amount.unwrap_or(plan.total_amount);
        let amounts = split_amount(final_amount, request.due_dates.len());
        let installments: Vec<NewInstallment> = request
            .due_dates
            .iter()
            .zip(amounts)
            .enumerate()
            .map(|(idx, (due_date, amount))| NewInstallment {
                installment_number: idx as i32 + 1,
                amount,
                due_date: *due_date,
            })
            .collect();

        let (enrollment, installments) = self
            .store
            .create_enrollment(
                &CreateEnrollment {
                    tenant_id,
                    student_id: request.student_id,
                    plan_id: request.plan_id,
                    total_amount: final_amount,
                },
                &installments,
            )
            .await?;

        record_enrollment_operation(&tenant_id.to_string(), "enroll");

        Ok(detail(
            EnrollmentRecord {
                enrollment,
                plan_name: plan.name,
                installments,
            },
            &student,
        ))
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, student_id = %student_id))]
    pub async fn for_student(
        &self,
        tenant_id: Uuid,
        student_id: Uuid,
    ) -> Result<Vec<EnrollmentDetail>, AppError> {
        let student = self
            .directory
            .student(tenant_id, student_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Student not found")))?;

        let records = self
            .store
            .enrollments_for_student(tenant_id, student_id)
            .await?;

        Ok(records
            .into_iter()
            .map(|record| detail(record, &student))
            .collect())
    }
}

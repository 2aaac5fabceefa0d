//! Student enrollment model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::installment::{Installment, InstallmentStatus};

/// Enrollment status. The only transition is active → completed, driven by
/// the completion check after a payment; nothing moves it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active,
    Completed,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Completed => "completed",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "completed" => EnrollmentStatus::Completed,
            _ => EnrollmentStatus::Active,
        }
    }
}

/// A student's enrollment in a payment plan. At most one exists per
/// (tenant, student, plan).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub enrollment_id: Uuid,
    pub tenant_id: Uuid,
    pub student_id: Uuid,
    pub plan_id: Uuid,
    pub total_amount: Decimal,
    pub status: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for creating an enrollment.
#[derive(Debug, Clone)]
pub struct CreateEnrollment {
    pub tenant_id: Uuid,
    pub student_id: Uuid,
    pub plan_id: Uuid,
    pub total_amount: Decimal,
}

/// Enrollment with its installments and plan name, as read from the store.
#[derive(Debug, Clone)]
pub struct EnrollmentRecord {
    pub enrollment: Enrollment,
    pub plan_name: String,
    pub installments: Vec<Installment>,
}

/// Enrollment decorated for display.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentDetail {
    pub enrollment_id: Uuid,
    pub tenant_id: Uuid,
    pub student_id: Uuid,
    pub plan_id: Uuid,
    pub student_name: String,
    pub student_number: Option<String>,
    pub plan_name: String,
    pub total_amount: Decimal,
    pub status: String,
    pub installments: Vec<Installment>,
}

/// An enrollment is complete once every one of its installments is paid.
pub fn all_installments_paid(statuses: &[InstallmentStatus]) -> bool {
    !statuses.is_empty() && statuses.iter().all(|s| *s == InstallmentStatus::Paid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_requires_every_installment_paid() {
        use InstallmentStatus::*;

        assert!(all_installments_paid(&[Paid, Paid, Paid]));
        assert!(!all_installments_paid(&[Paid, Partial, Paid]));
        assert!(!all_installments_paid(&[Pending, Paid, Paid]));
        assert!(!all_installments_paid(&[Paid, Paid, Overdue]));
        assert!(!all_installments_paid(&[]));
    }
}

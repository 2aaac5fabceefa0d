//! Installment model and the pure transition logic that drives it.
//!
//! Status transitions are functions of data alone; the store implementations
//! apply their results inside a transaction but never decide them.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// Installments due within this many days count as upcoming.
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

/// Installment status.
///
/// Payments upgrade pending → partial → paid as a function of the cumulative
/// paid amount; the sweep moves pending/partial past their due date to
/// overdue. No transition ever reverts toward pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Pending,
    Partial,
    Paid,
    Overdue,
}

impl InstallmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallmentStatus::Pending => "pending",
            InstallmentStatus::Partial => "partial",
            InstallmentStatus::Paid => "paid",
            InstallmentStatus::Overdue => "overdue",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "partial" => InstallmentStatus::Partial,
            "paid" => InstallmentStatus::Paid,
            "overdue" => InstallmentStatus::Overdue,
            _ => InstallmentStatus::Pending,
        }
    }
}

/// One installment of a student's payment plan.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Installment {
    pub installment_id: Uuid,
    pub enrollment_id: Uuid,
    pub installment_number: i32,
    pub amount: Decimal,
    pub paid_amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub status: String,
    pub paid_date: Option<DateTime<Utc>>,
    pub reminder_sent: bool,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Installment joined with its owning enrollment's context, as read from
/// the store. Student display fields are decorated from the directory.
#[derive(Debug, Clone, FromRow)]
pub struct InstallmentRow {
    pub installment_id: Uuid,
    pub enrollment_id: Uuid,
    pub installment_number: i32,
    pub amount: Decimal,
    pub paid_amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub status: String,
    pub paid_date: Option<DateTime<Utc>>,
    pub reminder_sent: bool,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub student_id: Uuid,
    pub plan_name: String,
}

/// Installment decorated for display.
#[derive(Debug, Clone, Serialize)]
pub struct InstallmentView {
    pub installment_id: Uuid,
    pub enrollment_id: Uuid,
    pub installment_number: i32,
    pub amount: Decimal,
    pub paid_amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub status: String,
    pub paid_date: Option<DateTime<Utc>>,
    pub reminder_sent: bool,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub student_id: Uuid,
    pub student_name: String,
    pub student_number: Option<String>,
    pub student_phone: Option<String>,
    pub student_class: Option<String>,
    pub plan_name: String,
}

/// Input for creating an installment alongside its enrollment.
#[derive(Debug, Clone)]
pub struct NewInstallment {
    pub installment_number: i32,
    pub amount: Decimal,
    pub due_date: DateTime<Utc>,
}

/// Filter parameters for listing installments.
#[derive(Debug, Clone, Default)]
pub struct InstallmentFilter {
    pub status: Option<InstallmentStatus>,
    pub upcoming: bool,
    pub overdue: bool,
}

/// Result of a committed payment.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub installment: Installment,
    /// True when this payment completed the owning enrollment.
    pub enrollment_completed: bool,
}

/// Outcome of applying one payment, before persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentApplication {
    pub new_paid_amount: Decimal,
    pub new_status: InstallmentStatus,
    /// True when this payment crossed the full-amount threshold.
    pub just_paid: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Payment amount must be greater than zero")]
    NonPositive,
    #[error("Payment exceeds the remaining balance of {remaining}")]
    ExceedsRemaining { remaining: Decimal },
}

/// Apply a payment to an installment.
///
/// The resulting status is a function of the cumulative paid amount alone:
/// reaching the contractual amount yields `Paid`, anything short of it
/// yields `Partial` (including on installments currently overdue).
/// Overpayment is rejected so `paid_amount <= amount` holds as an invariant.
pub fn apply_payment(
    amount_due: Decimal,
    already_paid: Decimal,
    payment: Decimal,
) -> Result<PaymentApplication, PaymentError> {
    if payment <= Decimal::ZERO {
        return Err(PaymentError::NonPositive);
    }

    let remaining = amount_due - already_paid;
    if payment > remaining {
        return Err(PaymentError::ExceedsRemaining { remaining });
    }

    let new_paid_amount = already_paid + payment;
    let fully_paid = new_paid_amount >= amount_due;

    Ok(PaymentApplication {
        new_paid_amount,
        new_status: if fully_paid {
            InstallmentStatus::Paid
        } else {
            InstallmentStatus::Partial
        },
        just_paid: fully_paid,
    })
}

/// Split a total into `parts` installment amounts that sum to it exactly.
///
/// Each of the first N-1 installments gets the per-installment quotient
/// truncated to two decimal places; the final installment absorbs the
/// remainder.
pub fn split_amount(total: Decimal, parts: usize) -> Vec<Decimal> {
    if parts == 0 {
        return Vec::new();
    }

    let count = Decimal::from(parts as u64);
    let base = (total / count).round_dp_with_strategy(2, RoundingStrategy::ToZero);
    let mut amounts = vec![base; parts];
    amounts[parts - 1] = total - base * Decimal::from((parts - 1) as u64);
    amounts
}

/// Whether an installment in this state should be reclassified by the sweep.
pub fn is_sweepable(status: InstallmentStatus, due_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    matches!(
        status,
        InstallmentStatus::Pending | InstallmentStatus::Partial
    ) && due_date < now
}

/// Whether an installment counts as overdue for reporting, independent of
/// whether the sweep has reclassified it yet.
pub fn is_reportable_overdue(
    status: InstallmentStatus,
    due_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    matches!(
        status,
        InstallmentStatus::Pending | InstallmentStatus::Partial | InstallmentStatus::Overdue
    ) && due_date < now
}

/// Whether an installment falls in the upcoming window [now, now + 7 days].
pub fn is_upcoming(status: InstallmentStatus, due_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    matches!(
        status,
        InstallmentStatus::Pending | InstallmentStatus::Partial
    ) && due_date >= now
        && due_date <= now + Duration::days(UPCOMING_WINDOW_DAYS)
}

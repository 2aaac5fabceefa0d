//! Payment plan template model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Reusable payment plan template, unique by name within a tenant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentPlan {
    pub plan_id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub total_amount: Decimal,
    pub installment_count: i32,
    pub term_id: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Plan decorated with the number of enrollments that reference it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlanWithEnrollments {
    pub plan_id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub total_amount: Decimal,
    pub installment_count: i32,
    pub term_id: Option<Uuid>,
    pub enrollment_count: i64,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for creating a plan.
#[derive(Debug, Clone)]
pub struct CreatePlan {
    pub tenant_id: Uuid,
    pub name: String,
    pub total_amount: Decimal,
    pub installment_count: i32,
    pub term_id: Option<Uuid>,
}

//! Plan catalog: reusable payment plan templates.

use rust_decimal::Decimal;
use serde::Deserialize;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::models::{CreatePlan, PaymentPlan, PlanWithEnrollments};
use crate::services::metrics::record_plan_operation;
use crate::store::LedgerStore;

/// Request payload for creating a plan. Fields are optional so missing
/// input surfaces as a `ValidationError` rather than a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePlanRequest {
    pub name: Option<String>,
    pub total_amount: Option<Decimal>,
    pub installment_count: Option<i32>,
    pub term_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct PlanCatalog {
    store: Arc<dyn LedgerStore>,
}

impl PlanCatalog {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<PlanWithEnrollments>, AppError> {
        self.store.list_plans(tenant_id).await
    }

    #[instrument(skip(self, request), fields(tenant_id = %tenant_id))]
    pub async fn create(
        &self,
        tenant_id: Uuid,
        request: CreatePlanRequest,
    ) -> Result<PaymentPlan, AppError> {
        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        if name.is_empty() {
            return Err(AppError::Validation(anyhow::anyhow!(
                "Plan name is required"
            )));
        }

        let total_amount = request.total_amount.ok_or_else(|| {
            AppError::Validation(anyhow::anyhow!("Plan total amount is required"))
        })?;
        if total_amount <= Decimal::ZERO {
            return Err(AppError::Validation(anyhow::anyhow!(
                "Plan total amount must be greater than zero"
            )));
        }

        let installment_count = request.installment_count.ok_or_else(|| {
            AppError::Validation(anyhow::anyhow!("Installment count is required"))
        })?;
        if installment_count <= 0 {
            return Err(AppError::Validation(anyhow::anyhow!(
                "Installment count must be greater than zero"
            )));
        }

        let plan = self
            .store
            .create_plan(&CreatePlan {
                tenant_id,
                name,
                total_amount,
                installment_count,
                term_id: request.term_id,
            })
            .await?;

        record_plan_operation(&tenant_id.to_string(), "create");

        Ok(plan)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, plan_id = %plan_id))]
    pub async fn delete(&self, tenant_id: Uuid, plan_id: Uuid) -> Result<(), AppError> {
        self.store
            .get_plan(tenant_id, plan_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Payment plan not found")))?;

        let enrolled = self.store.plan_enrollment_count(tenant_id, plan_id).await?;
        if enrolled > 0 {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "{} students enrolled",
                enrolled
            )));
        }

        if !self.store.delete_plan(tenant_id, plan_id).await? {
            return Err(AppError::NotFound(anyhow::anyhow!("Payment plan not found")));
        }

        record_plan_operation(&tenant_id.to_string(), "delete");

        Ok(())
    }
}

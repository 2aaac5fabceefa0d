//! Plan catalog endpoints.

use axum::extract::{Path, State};
use axum::Json;
use service_core::error::AppError;
use uuid::Uuid;

use crate::handlers::ApiResponse;
use crate::middleware::tenant::TenantContext;
use crate::models::{PaymentPlan, PlanWithEnrollments};
use crate::services::CreatePlanRequest;
use crate::startup::AppState;

pub async fn list_plans(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<ApiResponse<Vec<PlanWithEnrollments>>>, AppError> {
    let plans = state.catalog.list(tenant.tenant_id).await?;
    Ok(Json(ApiResponse::ok(plans)))
}

pub async fn create_plan(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(request): Json<CreatePlanRequest>,
) -> Result<Json<ApiResponse<PaymentPlan>>, AppError> {
    let plan = state.catalog.create(tenant.tenant_id, request).await?;
    Ok(Json(ApiResponse::with_message(plan, "Payment plan created")))
}

pub async fn delete_plan(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.catalog.delete(tenant.tenant_id, plan_id).await?;
    Ok(Json(ApiResponse::with_message((), "Payment plan deleted")))
}

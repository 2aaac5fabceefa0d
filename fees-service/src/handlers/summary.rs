//! Reporting endpoint.

use axum::extract::State;
use axum::Json;
use service_core::error::AppError;

use crate::handlers::ApiResponse;
use crate::middleware::tenant::TenantContext;
use crate::models::TenantSummary;
use crate::startup::AppState;

pub async fn tenant_summary(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<ApiResponse<TenantSummary>>, AppError> {
    let summary = state.summary.summarize(tenant.tenant_id).await?;
    Ok(Json(ApiResponse::ok(summary)))
}

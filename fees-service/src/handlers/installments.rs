//! Installment endpoints: listing, payments, reminders, and the overdue
//! sweep.

use axum::extract::{Path, Query, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

use crate::handlers::ApiResponse;
use crate::middleware::tenant::TenantContext;
use crate::models::{InstallmentFilter, InstallmentStatus, InstallmentView, PaymentReceipt};
use crate::services::ReminderOutcome;
use crate::startup::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct InstallmentQuery {
    pub status: Option<String>,
    pub upcoming: Option<bool>,
    pub overdue: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub amount: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct SweepResult {
    pub changed: u64,
}

pub async fn list_installments(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<InstallmentQuery>,
) -> Result<Json<ApiResponse<Vec<InstallmentView>>>, AppError> {
    let filter = InstallmentFilter {
        status: query
            .status
            .as_deref()
            .map(InstallmentStatus::from_string),
        upcoming: query.upcoming.unwrap_or(false),
        overdue: query.overdue.unwrap_or(false),
    };
    let installments = state.installments.list(tenant.tenant_id, filter).await?;
    Ok(Json(ApiResponse::ok(installments)))
}

pub async fn record_payment(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(installment_id): Path<Uuid>,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<ApiResponse<PaymentReceipt>>, AppError> {
    let receipt = state
        .installments
        .record_payment(tenant.tenant_id, installment_id, request.amount)
        .await?;
    Ok(Json(ApiResponse::with_message(receipt, "Payment recorded")))
}

pub async fn send_reminder(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(installment_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReminderOutcome>>, AppError> {
    let outcome = state
        .reminders
        .send(tenant.tenant_id, installment_id)
        .await?;
    let message = if outcome.delivered {
        "Reminder sent"
    } else {
        "Reminder recorded; delivery failed"
    };
    Ok(Json(ApiResponse::with_message(outcome, message)))
}

pub async fn sweep_overdue(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<ApiResponse<SweepResult>>, AppError> {
    let changed = state.installments.sweep_overdue(tenant.tenant_id).await?;
    Ok(Json(ApiResponse::ok(SweepResult { changed })))
}

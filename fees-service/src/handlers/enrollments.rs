//! Enrollment endpoints.

use axum::extract::{Path, State};
use axum::Json;
use service_core::error::AppError;
use uuid::Uuid;

use crate::handlers::ApiResponse;
use crate::middleware::tenant::TenantContext;
use crate::models::EnrollmentDetail;
use crate::services::EnrollRequest;
use crate::startup::AppState;

pub async fn enroll_student(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(request): Json<EnrollRequest>,
) -> Result<Json<ApiResponse<EnrollmentDetail>>, AppError> {
    let enrollment = state.enrollments.enroll(tenant.tenant_id, request).await?;
    Ok(Json(ApiResponse::with_message(
        enrollment,
        "Student enrolled in payment plan",
    )))
}

pub async fn student_enrollments(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(student_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<EnrollmentDetail>>>, AppError> {
    let enrollments = state
        .enrollments
        .for_student(tenant.tenant_id, student_id)
        .await?;
    Ok(Json(ApiResponse::ok(enrollments)))
}

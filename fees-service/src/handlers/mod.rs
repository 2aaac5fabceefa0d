//! HTTP surface: thin axum handlers over the operation services.
//!
//! Every endpoint answers with the `{success, data?, message?}` envelope;
//! errors go through [`service_core::error::AppError`]'s response mapping.

pub mod enrollments;
pub mod installments;
pub mod plans;
pub mod summary;

use axum::routing::{delete, get, post};
use axum::Router;
use serde::Serialize;

use crate::startup::AppState;

/// Uniform response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

/// Build the API router. Health and metrics routes are mounted separately
/// by the startup module.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/v1/plans",
            get(plans::list_plans).post(plans::create_plan),
        )
        .route("/api/v1/plans/:plan_id", delete(plans::delete_plan))
        .route("/api/v1/enrollments", post(enrollments::enroll_student))
        .route(
            "/api/v1/students/:student_id/enrollments",
            get(enrollments::student_enrollments),
        )
        .route("/api/v1/installments", get(installments::list_installments))
        .route(
            "/api/v1/installments/sweep-overdue",
            post(installments::sweep_overdue),
        )
        .route(
            "/api/v1/installments/:installment_id/payments",
            post(installments::record_payment),
        )
        .route(
            "/api/v1/installments/:installment_id/reminder",
            post(installments::send_reminder),
        )
        .route("/api/v1/summary", get(summary::tenant_summary))
        .with_state(state)
}

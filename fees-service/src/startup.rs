//! Application startup and lifecycle management.

use axum::{
    extract::State, http::StatusCode, middleware, response::IntoResponse, routing::get, Json,
    Router,
};
use secrecy::ExposeSecret;
use serde_json::json;
use service_core::error::AppError;
use service_core::middleware::tracing::request_id_middleware;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::clock::{Clock, SystemClock};
use crate::config::FeesConfig;
use crate::handlers;
use crate::services::directory::{PostgresDirectory, TenantDirectory};
use crate::services::providers::{SmsGatewayProvider, SmsProvider};
use crate::services::{
    get_metrics, init_metrics, EnrollmentEngine, InstallmentLedger, PlanCatalog, ReminderService,
    SummaryAggregator,
};
use crate::store::{LedgerStore, PostgresStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub catalog: PlanCatalog,
    pub enrollments: EnrollmentEngine,
    pub installments: InstallmentLedger,
    pub reminders: ReminderService,
    pub summary: SummaryAggregator,
}

impl AppState {
    /// Wire the operation services over a store and its collaborators.
    pub fn new(
        store: Arc<dyn LedgerStore>,
        directory: Arc<dyn TenantDirectory>,
        sms: Arc<dyn SmsProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog: PlanCatalog::new(store.clone()),
            enrollments: EnrollmentEngine::new(store.clone(), directory.clone()),
            installments: InstallmentLedger::new(store.clone(), directory.clone(), clock.clone()),
            reminders: ReminderService::new(store.clone(), directory, sms, clock.clone()),
            summary: SummaryAggregator::new(store, clock),
        }
    }
}

/// State for health check endpoints.
#[derive(Clone)]
struct HealthState {
    store: Arc<dyn LedgerStore>,
}

/// Health check endpoint for Docker/K8s liveness probes.
async fn health_check(State(state): State<HealthState>) -> impl IntoResponse {
    match state.store.health_check().await {
        Ok(_) => {
            tracing::debug!("Health check passed");
            (
                StatusCode::OK,
                Json(json!({
                    "status": "ok",
                    "service": "fees-service",
                    "version": env!("CARGO_PKG_VERSION")
                })),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed - store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": "fees-service",
                    "error": e.to_string()
                })),
            )
        }
    }
}

/// Readiness check endpoint for K8s readiness probes.
async fn readiness_check(State(state): State<HealthState>) -> impl IntoResponse {
    match state.store.health_check().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Metrics endpoint for Prometheus scraping.
async fn metrics_handler() -> impl IntoResponse {
    let metrics = get_metrics();
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        metrics,
    )
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    store: Arc<dyn LedgerStore>,
    state: AppState,
}

impl Application {
    /// Build the application against PostgreSQL, running migrations.
    pub async fn build(config: FeesConfig) -> Result<Self, AppError> {
        let store = PostgresStore::new(
            config.database.url.expose_secret(),
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        store.run_migrations().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            e
        })?;

        let directory = Arc::new(PostgresDirectory::new(store.pool().clone()));
        let sms = Arc::new(
            SmsGatewayProvider::new(config.sms.clone())
                .map_err(|e| AppError::Configuration(anyhow::anyhow!(e)))?,
        );

        Self::build_with_components(config, Arc::new(store), directory, sms, Arc::new(SystemClock))
            .await
    }

    /// Build the application over explicit components. Tests use this with
    /// the in-memory store, a static directory, and a mock SMS provider.
    pub async fn build_with_components(
        config: FeesConfig,
        store: Arc<dyn LedgerStore>,
        directory: Arc<dyn TenantDirectory>,
        sms: Arc<dyn SmsProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        init_metrics();

        let state = AppState::new(store.clone(), directory, sms, clock);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Fees service listener bound");

        Ok(Self {
            port,
            listener,
            store,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let health_state = HealthState {
            store: self.store.clone(),
        };

        let health_router = Router::new()
            .route("/health", get(health_check))
            .route("/ready", get(readiness_check))
            .route("/metrics", get(metrics_handler))
            .with_state(health_state);

        let app = handlers::api_router(self.state.clone())
            .merge(health_router)
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(request_id_middleware));

        tracing::info!(
            service = "fees-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, app).await
    }
}

//! Tenant-wide reporting rollups.

use service_core::error::AppError;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::clock::Clock;
use crate::models::TenantSummary;
use crate::store::LedgerStore;

#[derive(Clone)]
pub struct SummaryAggregator {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

impl SummaryAggregator {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn summarize(&self, tenant_id: Uuid) -> Result<TenantSummary, AppError> {
        self.store.summarize(tenant_id, self.clock.now()).await
    }
}

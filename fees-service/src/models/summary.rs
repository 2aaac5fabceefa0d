//! Tenant-wide reporting rollup.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fleet-wide counts and sums for a tenant, as of the query's clock.
///
/// The overdue count re-derives overdue from due dates, so it can exceed
/// the number of rows the sweep has already reclassified.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantSummary {
    pub active_enrollments: i64,
    pub overdue_installments: i64,
    pub upcoming_installments: i64,
    pub total_expected: Decimal,
    pub total_collected: Decimal,
}

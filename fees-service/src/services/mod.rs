//! Operation services over the ledger store and its collaborators.

pub mod catalog;
pub mod directory;
pub mod enrollment;
pub mod installments;
pub mod metrics;
pub mod providers;
pub mod reminders;
pub mod summary;

pub use catalog::{CreatePlanRequest, PlanCatalog};
pub use enrollment::{EnrollRequest, EnrollmentEngine};
pub use installments::InstallmentLedger;
pub use metrics::{get_metrics, init_metrics};
pub use reminders::{ReminderOutcome, ReminderService};
pub use summary::SummaryAggregator;

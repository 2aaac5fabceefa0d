//! Data models for the payment plan subsystem.

pub mod enrollment;
pub mod installment;
pub mod plan;
pub mod summary;

pub use enrollment::{
    all_installments_paid, CreateEnrollment, Enrollment, EnrollmentDetail, EnrollmentRecord,
    EnrollmentStatus,
};
pub use installment::{
    apply_payment, split_amount, Installment, InstallmentFilter, InstallmentRow,
    InstallmentStatus, InstallmentView, NewInstallment, PaymentApplication, PaymentError,
    PaymentReceipt, UPCOMING_WINDOW_DAYS,
};
pub use plan::{CreatePlan, PaymentPlan, PlanWithEnrollments};
pub use summary::TenantSummary;

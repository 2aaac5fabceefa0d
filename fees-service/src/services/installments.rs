//! Installment ledger: payment application, filtered listing, and the
//! overdue sweep.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::clock::Clock;
use crate::models::{InstallmentFilter, InstallmentView, PaymentReceipt};
use crate::services::directory::TenantDirectory;
use crate::services::metrics::{record_overdue_swept, record_payment};
use crate::store::LedgerStore;

#[derive(Clone)]
pub struct InstallmentLedger {
    store: Arc<dyn LedgerStore>,
    directory: Arc<dyn TenantDirectory>,
    clock: Arc<dyn Clock>,
}

impl InstallmentLedger {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        directory: Arc<dyn TenantDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            directory,
            clock,
        }
    }

    /// Record a payment against an installment.
    ///
    /// The store applies the amount, upgrades the status, and runs the
    /// completion check in one transaction; this layer only validates the
    /// request shape.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, installment_id = %installment_id))]
    pub async fn record_payment(
        &self,
        tenant_id: Uuid,
        installment_id: Uuid,
        amount: Option<Decimal>,
    ) -> Result<PaymentReceipt, AppError> {
        let amount = amount.ok_or_else(|| {
            AppError::Validation(anyhow::anyhow!("Payment amount is required"))
        })?;
        if amount <= Decimal::ZERO {
            return Err(AppError::Validation(anyhow::anyhow!(
                "Payment amount must be greater than zero"
            )));
        }

        let receipt = self
            .store
            .apply_payment(tenant_id, installment_id, amount, self.clock.now())
            .await?;

        record_payment(&tenant_id.to_string(), amount.to_f64().unwrap_or(0.0));

        if receipt.enrollment_completed {
            info!(
                enrollment_id = %receipt.installment.enrollment_id,
                "All installments paid; enrollment completed"
            );
        }

        Ok(receipt)
    }

    #[instrument(skip(self, filter), fields(tenant_id = %tenant_id))]
    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: InstallmentFilter,
    ) -> Result<Vec<InstallmentView>, AppError> {
        let rows = self
            .store
            .list_installments(tenant_id, &filter, self.clock.now())
            .await?;

        let mut student_ids: Vec<Uuid> = rows.iter().map(|r| r.student_id).collect();
        student_ids.sort_unstable();
        student_ids.dedup();
        let students = self.directory.students(tenant_id, &student_ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let student = students.get(&row.student_id);
                InstallmentView {
                    installment_id: row.installment_id,
                    enrollment_id: row.enrollment_id,
                    installment_number: row.installment_number,
                    amount: row.amount,
                    paid_amount: row.paid_amount,
                    due_date: row.due_date,
                    status: row.status,
                    paid_date: row.paid_date,
                    reminder_sent: row.reminder_sent,
                    reminder_sent_at: row.reminder_sent_at,
                    student_id: row.student_id,
                    student_name: student.map(|s| s.name.clone()).unwrap_or_default(),
                    student_number: student.and_then(|s| s.student_number.clone()),
                    student_phone: student.and_then(|s| s.phone.clone()),
                    student_class: student.and_then(|s| s.class_name.clone()),
                    plan_name: row.plan_name,
                }
            })
            .collect())
    }

    /// Reclassify pending/partial installments past their due date.
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn sweep_overdue(&self, tenant_id: Uuid) -> Result<u64, AppError> {
        let changed = self
            .store
            .sweep_overdue(tenant_id, self.clock.now())
            .await?;

        record_overdue_swept(&tenant_id.to_string(), changed);
        info!(changed = changed, "Overdue sweep completed");

        Ok(changed)
    }
}

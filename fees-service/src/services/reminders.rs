//! Payment reminder dispatch.

use serde::Serialize;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::services::directory::TenantDirectory;
use crate::services::metrics::record_reminder;
use crate::services::providers::{SmsMessage, SmsProvider};
use crate::store::LedgerStore;

/// Result of a reminder attempt. The reminder flag on the installment is
/// set either way; delivery is informational.
#[derive(Debug, Clone, Serialize)]
pub struct ReminderOutcome {
    pub delivered: bool,
    pub detail: Option<String>,
}

#[derive(Clone)]
pub struct ReminderService {
    store: Arc<dyn LedgerStore>,
    directory: Arc<dyn TenantDirectory>,
    provider: Arc<dyn SmsProvider>,
    clock: Arc<dyn Clock>,
}

impl ReminderService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        directory: Arc<dyn TenantDirectory>,
        provider: Arc<dyn SmsProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            directory,
            provider,
            clock,
        }
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, installment_id = %installment_id))]
    pub async fn send(
        &self,
        tenant_id: Uuid,
        installment_id: Uuid,
    ) -> Result<ReminderOutcome, AppError> {
        let installment = self
            .store
            .get_installment(tenant_id, installment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Installment not found")))?;

        let student = self
            .directory
            .student(tenant_id, installment.student_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Student not found")))?;

        let phone = student
            .phone
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                AppError::Validation(anyhow::anyhow!("Student has no contact phone number"))
            })?;

        let settings = self.directory.sms_settings(tenant_id).await?.ok_or_else(|| {
            AppError::Configuration(anyhow::anyhow!(
                "SMS credentials are not configured for this school"
            ))
        })?;

        let outstanding = installment.amount - installment.paid_amount;
        let body = format!(
            "Dear parent of {}, installment {} of the {} plan is due on {}. Outstanding balance: {}. Please make the payment promptly.",
            student.name,
            installment.installment_number,
            installment.plan_name,
            installment.due_date.format("%d %b %Y"),
            outstanding,
        );

        let outcome = match self
            .provider
            .send(&settings, &SmsMessage { to: phone, body })
            .await
        {
            Ok(response) => {
                info!(provider_id = ?response.provider_id, "Reminder delivered");
                record_reminder(&tenant_id.to_string(), "sent");
                ReminderOutcome {
                    delivered: true,
                    detail: response.provider_id,
                }
            }
            Err(e) => {
                warn!(error = %e, "Reminder delivery failed");
                record_reminder(&tenant_id.to_string(), "failed");
                ReminderOutcome {
                    delivered: false,
                    detail: Some(e.to_string()),
                }
            }
        };

        // The attempt is recorded regardless of the provider outcome.
        self.store
            .mark_reminder_sent(tenant_id, installment_id, self.clock.now())
            .await?;

        Ok(outcome)
    }
}

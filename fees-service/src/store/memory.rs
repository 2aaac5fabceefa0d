//! In-memory ledger store.
//!
//! Mirrors the Postgres store operation for operation. A single state mutex
//! stands in for the database's transactions and row locks, so payment
//! application and enrollment creation stay atomic here too. Used by the
//! test suite and for running the service without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::clock::Clock;
use crate::models::installment::{
    apply_payment, is_reportable_overdue, is_sweepable, is_upcoming,
};
use crate::models::{
    all_installments_paid, CreateEnrollment, CreatePlan, Enrollment, EnrollmentRecord,
    EnrollmentStatus, Installment, InstallmentFilter, InstallmentRow, InstallmentStatus,
    NewInstallment, PaymentPlan, PaymentReceipt, PlanWithEnrollments, TenantSummary,
};
use crate::store::LedgerStore;

#[derive(Default)]
struct State {
    plans: Vec<PaymentPlan>,
    enrollments: Vec<Enrollment>,
    installments: Vec<Installment>,
}

pub struct InMemoryStore {
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Mutex::new(State::default()),
        }
    }
}

fn installment_row(
    installment: &Installment,
    enrollment: &Enrollment,
    plan_name: &str,
) -> InstallmentRow {
    InstallmentRow {
        installment_id: installment.installment_id,
        enrollment_id: installment.enrollment_id,
        installment_number: installment.installment_number,
        amount: installment.amount,
        paid_amount: installment.paid_amount,
        due_date: installment.due_date,
        status: installment.status.clone(),
        paid_date: installment.paid_date,
        reminder_sent: installment.reminder_sent,
        reminder_sent_at: installment.reminder_sent_at,
        student_id: enrollment.student_id,
        plan_name: plan_name.to_string(),
    }
}

impl State {
    fn enrollment(&self, enrollment_id: Uuid) -> Option<&Enrollment> {
        self.enrollments
            .iter()
            .find(|e| e.enrollment_id == enrollment_id)
    }

    fn plan_name(&self, plan_id: Uuid) -> String {
        self.plans
            .iter()
            .find(|p| p.plan_id == plan_id)
            .map(|p| p.name.clone())
            .unwrap_or_default()
    }

    /// Installment plus owning-enrollment context, scoped to a tenant.
    fn installment_in_tenant(
        &self,
        tenant_id: Uuid,
        installment_id: Uuid,
    ) -> Option<(&Installment, &Enrollment)> {
        let installment = self
            .installments
            .iter()
            .find(|i| i.installment_id == installment_id)?;
        let enrollment = self.enrollment(installment.enrollment_id)?;
        (enrollment.tenant_id == tenant_id).then_some((installment, enrollment))
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn create_plan(&self, input: &CreatePlan) -> Result<PaymentPlan, AppError> {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap();

        if state
            .plans
            .iter()
            .any(|p| p.tenant_id == input.tenant_id && p.name == input.name)
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "A plan with this name already exists"
            )));
        }

        let plan = PaymentPlan {
            plan_id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            name: input.name.clone(),
            total_amount: input.total_amount,
            installment_count: input.installment_count,
            term_id: input.term_id,
            created_utc: now,
            updated_utc: now,
        };
        state.plans.push(plan.clone());

        Ok(plan)
    }

    async fn get_plan(
        &self,
        tenant_id: Uuid,
        plan_id: Uuid,
    ) -> Result<Option<PaymentPlan>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .plans
            .iter()
            .find(|p| p.tenant_id == tenant_id && p.plan_id == plan_id)
            .cloned())
    }

    async fn list_plans(&self, tenant_id: Uuid) -> Result<Vec<PlanWithEnrollments>, AppError> {
        let state = self.state.lock().unwrap();
        // Newest first: reverse of insertion order.
        Ok(state
            .plans
            .iter()
            .rev()
            .filter(|p| p.tenant_id == tenant_id)
            .map(|p| PlanWithEnrollments {
                plan_id: p.plan_id,
                tenant_id: p.tenant_id,
                name: p.name.clone(),
                total_amount: p.total_amount,
                installment_count: p.installment_count,
                term_id: p.term_id,
                enrollment_count: state
                    .enrollments
                    .iter()
                    .filter(|e| e.plan_id == p.plan_id)
                    .count() as i64,
                created_utc: p.created_utc,
                updated_utc: p.updated_utc,
            })
            .collect())
    }

    async fn plan_enrollment_count(
        &self,
        tenant_id: Uuid,
        plan_id: Uuid,
    ) -> Result<i64, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .enrollments
            .iter()
            .filter(|e| e.tenant_id == tenant_id && e.plan_id == plan_id)
            .count() as i64)
    }

    async fn delete_plan(&self, tenant_id: Uuid, plan_id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.lock().unwrap();
        let before = state.plans.len();
        state
            .plans
            .retain(|p| !(p.tenant_id == tenant_id && p.plan_id == plan_id));
        Ok(state.plans.len() < before)
    }

    async fn find_enrollment(
        &self,
        tenant_id: Uuid,
        student_id: Uuid,
        plan_id: Uuid,
    ) -> Result<Option<Enrollment>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .enrollments
            .iter()
            .find(|e| {
                e.tenant_id == tenant_id && e.student_id == student_id && e.plan_id == plan_id
            })
            .cloned())
    }

    async fn create_enrollment(
        &self,
        input: &CreateEnrollment,
        installments: &[NewInstallment],
    ) -> Result<(Enrollment, Vec<Installment>), AppError> {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap();

        if state.enrollments.iter().any(|e| {
            e.tenant_id == input.tenant_id
                && e.student_id == input.student_id
                && e.plan_id == input.plan_id
        }) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Student is already enrolled in this plan"
            )));
        }

        let enrollment = Enrollment {
            enrollment_id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            student_id: input.student_id,
            plan_id: input.plan_id,
            total_amount: input.total_amount,
            status: EnrollmentStatus::Active.as_str().to_string(),
            created_utc: now,
            updated_utc: now,
        };

        let created: Vec<Installment> = installments
            .iter()
            .map(|i| Installment {
                installment_id: Uuid::new_v4(),
                enrollment_id: enrollment.enrollment_id,
                installment_number: i.installment_number,
                amount: i.amount,
                paid_amount: Decimal::ZERO,
                due_date: i.due_date,
                status: InstallmentStatus::Pending.as_str().to_string(),
                paid_date: None,
                reminder_sent: false,
                reminder_sent_at: None,
                created_utc: now,
                updated_utc: now,
            })
            .collect();

        state.enrollments.push(enrollment.clone());
        state.installments.extend(created.iter().cloned());

        Ok((enrollment, created))
    }

    async fn enrollments_for_student(
        &self,
        tenant_id: Uuid,
        student_id: Uuid,
    ) -> Result<Vec<EnrollmentRecord>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .enrollments
            .iter()
            .rev()
            .filter(|e| e.tenant_id == tenant_id && e.student_id == student_id)
            .map(|e| {
                let mut installments: Vec<Installment> = state
                    .installments
                    .iter()
                    .filter(|i| i.enrollment_id == e.enrollment_id)
                    .cloned()
                    .collect();
                installments.sort_by_key(|i| i.installment_number);

                EnrollmentRecord {
                    enrollment: e.clone(),
                    plan_name: state.plan_name(e.plan_id),
                    installments,
                }
            })
            .collect())
    }

    async fn get_installment(
        &self,
        tenant_id: Uuid,
        installment_id: Uuid,
    ) -> Result<Option<InstallmentRow>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .installment_in_tenant(tenant_id, installment_id)
            .map(|(i, e)| installment_row(i, e, &state.plan_name(e.plan_id))))
    }

    async fn apply_payment(
        &self,
        tenant_id: Uuid,
        installment_id: Uuid,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<PaymentReceipt, AppError> {
        let mut state = self.state.lock().unwrap();

        let (installment, enrollment) = state
            .installment_in_tenant(tenant_id, installment_id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Installment not found")))?;
        let enrollment_id = enrollment.enrollment_id;

        let applied = apply_payment(installment.amount, installment.paid_amount, amount)
            .map_err(|e| AppError::Validation(anyhow::Error::new(e)))?;

        let installment = state
            .installments
            .iter_mut()
            .find(|i| i.installment_id == installment_id)
            .ok_or_else(|| {
                AppError::Store(anyhow::anyhow!("Installment vanished during update"))
            })?;
        installment.paid_amount = applied.new_paid_amount;
        installment.status = applied.new_status.as_str().to_string();
        if applied.just_paid && installment.paid_date.is_none() {
            installment.paid_date = Some(now);
        }
        installment.updated_utc = now;
        let updated = installment.clone();

        let statuses: Vec<InstallmentStatus> = state
            .installments
            .iter()
            .filter(|i| i.enrollment_id == enrollment_id)
            .map(|i| InstallmentStatus::from_string(&i.status))
            .collect();
        let enrollment_completed = all_installments_paid(&statuses);
        if enrollment_completed {
            if let Some(e) = state
                .enrollments
                .iter_mut()
                .find(|e| e.enrollment_id == enrollment_id)
            {
                if e.status == EnrollmentStatus::Active.as_str() {
                    e.status = EnrollmentStatus::Completed.as_str().to_string();
                    e.updated_utc = now;
                }
            }
        }

        Ok(PaymentReceipt {
            installment: updated,
            enrollment_completed,
        })
    }

    async fn list_installments(
        &self,
        tenant_id: Uuid,
        filter: &InstallmentFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<InstallmentRow>, AppError> {
        let state = self.state.lock().unwrap();

        let mut rows: Vec<InstallmentRow> = state
            .installments
            .iter()
            .filter_map(|i| {
                let enrollment = state.enrollment(i.enrollment_id)?;
                (enrollment.tenant_id == tenant_id).then_some((i, enrollment))
            })
            .filter(|(i, _)| {
                let status = InstallmentStatus::from_string(&i.status);
                if let Some(wanted) = filter.status {
                    if status != wanted {
                        return false;
                    }
                }
                if filter.upcoming && !is_upcoming(status, i.due_date, now) {
                    return false;
                }
                if filter.overdue && !is_reportable_overdue(status, i.due_date, now) {
                    return false;
                }
                true
            })
            .map(|(i, e)| installment_row(i, e, &state.plan_name(e.plan_id)))
            .collect();

        rows.sort_by_key(|r| r.due_date);
        Ok(rows)
    }

    async fn mark_reminder_sent(
        &self,
        tenant_id: Uuid,
        installment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();

        if state
            .installment_in_tenant(tenant_id, installment_id)
            .is_none()
        {
            return Ok(());
        }

        if let Some(installment) = state
            .installments
            .iter_mut()
            .find(|i| i.installment_id == installment_id)
        {
            installment.reminder_sent = true;
            installment.reminder_sent_at = Some(now);
            installment.updated_utc = now;
        }

        Ok(())
    }

    async fn sweep_overdue(&self, tenant_id: Uuid, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut state = self.state.lock().unwrap();

        let enrollment_ids: Vec<Uuid> = state
            .enrollments
            .iter()
            .filter(|e| e.tenant_id == tenant_id)
            .map(|e| e.enrollment_id)
            .collect();

        let mut changed = 0u64;
        for installment in state
            .installments
            .iter_mut()
            .filter(|i| enrollment_ids.contains(&i.enrollment_id))
        {
            let status = InstallmentStatus::from_string(&installment.status);
            if is_sweepable(status, installment.due_date, now) {
                installment.status = InstallmentStatus::Overdue.as_str().to_string();
                installment.updated_utc = now;
                changed += 1;
            }
        }

        Ok(changed)
    }

    async fn summarize(
        &self,
        tenant_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<TenantSummary, AppError> {
        let state = self.state.lock().unwrap();

        let active_enrollments = state
            .enrollments
            .iter()
            .filter(|e| e.tenant_id == tenant_id && e.status == EnrollmentStatus::Active.as_str())
            .count() as i64;

        let mut summary = TenantSummary {
            active_enrollments,
            ..TenantSummary::default()
        };

        for installment in state.installments.iter().filter(|i| {
            state
                .enrollment(i.enrollment_id)
                .map(|e| e.tenant_id == tenant_id)
                .unwrap_or(false)
        }) {
            let status = InstallmentStatus::from_string(&installment.status);
            if is_reportable_overdue(status, installment.due_date, now) {
                summary.overdue_installments += 1;
            }
            if is_upcoming(status, installment.due_date, now) {
                summary.upcoming_installments += 1;
            }
            summary.total_expected += installment.amount;
            summary.total_collected += installment.paid_amount;
        }

        Ok(summary)
    }
}

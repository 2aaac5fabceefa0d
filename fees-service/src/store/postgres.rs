//! PostgreSQL ledger store.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::installment::{apply_payment, UPCOMING_WINDOW_DAYS};
use crate::models::{
    CreateEnrollment, CreatePlan, Enrollment, EnrollmentRecord, Installment, InstallmentFilter,
    InstallmentRow, InstallmentStatus, NewInstallment, PaymentPlan, PaymentReceipt,
    PlanWithEnrollments, TenantSummary,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::store::LedgerStore;

use std::time::Duration as StdDuration;
use tracing::{info, instrument};

const INSTALLMENT_COLUMNS: &str = "installment_id, enrollment_id, installment_number, amount, paid_amount, due_date, status, paid_date, reminder_sent, reminder_sent_at, created_utc, updated_utc";

const INSTALLMENT_ROW_COLUMNS: &str = "i.installment_id, i.enrollment_id, i.installment_number, i.amount, i.paid_amount, i.due_date, i.status, i.paid_date, i.reminder_sent, i.reminder_sent_at, e.student_id, p.name AS plan_name";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct EnrollmentPlanRow {
    enrollment_id: Uuid,
    tenant_id: Uuid,
    student_id: Uuid,
    plan_id: Uuid,
    total_amount: Decimal,
    status: String,
    created_utc: DateTime<Utc>,
    updated_utc: DateTime<Utc>,
    plan_name: String,
}

impl PostgresStore {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "fees-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(StdDuration::from_secs(30))
            .idle_timeout(StdDuration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Store(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for PostgresStore {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Store(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    // =========================================================================
    // Plan Operations
    // =========================================================================

    #[instrument(skip(self, input), fields(tenant_id = %input.tenant_id))]
    async fn create_plan(&self, input: &CreatePlan) -> Result<PaymentPlan, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_plan"])
            .start_timer();

        let plan_id = Uuid::new_v4();
        let plan = sqlx::query_as::<_, PaymentPlan>(
            r#"
            INSERT INTO payment_plans (plan_id, tenant_id, name, total_amount, installment_count, term_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING plan_id, tenant_id, name, total_amount, installment_count, term_id, created_utc, updated_utc
            "#,
        )
        .bind(plan_id)
        .bind(input.tenant_id)
        .bind(&input.name)
        .bind(input.total_amount)
        .bind(input.installment_count)
        .bind(input.term_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("A plan with this name already exists"))
            }
            _ => AppError::Store(anyhow::anyhow!("Failed to create plan: {}", e)),
        })?;

        timer.observe_duration();
        info!(plan_id = %plan.plan_id, name = %plan.name, "Plan created");

        Ok(plan)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, plan_id = %plan_id))]
    async fn get_plan(
        &self,
        tenant_id: Uuid,
        plan_id: Uuid,
    ) -> Result<Option<PaymentPlan>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_plan"])
            .start_timer();

        let plan = sqlx::query_as::<_, PaymentPlan>(
            r#"
            SELECT plan_id, tenant_id, name, total_amount, installment_count, term_id, created_utc, updated_utc
            FROM payment_plans
            WHERE tenant_id = $1 AND plan_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to get plan: {}", e)))?;

        timer.observe_duration();

        Ok(plan)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    async fn list_plans(&self, tenant_id: Uuid) -> Result<Vec<PlanWithEnrollments>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_plans"])
            .start_timer();

        let plans = sqlx::query_as::<_, PlanWithEnrollments>(
            r#"
            SELECT p.plan_id, p.tenant_id, p.name, p.total_amount, p.installment_count, p.term_id,
                   COUNT(e.enrollment_id) AS enrollment_count, p.created_utc, p.updated_utc
            FROM payment_plans p
            LEFT JOIN student_payment_plans e ON e.plan_id = p.plan_id
            WHERE p.tenant_id = $1
            GROUP BY p.plan_id
            ORDER BY p.created_utc DESC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to list plans: {}", e)))?;

        timer.observe_duration();

        Ok(plans)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, plan_id = %plan_id))]
    async fn plan_enrollment_count(
        &self,
        tenant_id: Uuid,
        plan_id: Uuid,
    ) -> Result<i64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["plan_enrollment_count"])
            .start_timer();

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM student_payment_plans
            WHERE tenant_id = $1 AND plan_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(plan_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to count enrollments: {}", e)))?;

        timer.observe_duration();

        Ok(count)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, plan_id = %plan_id))]
    async fn delete_plan(&self, tenant_id: Uuid, plan_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_plan"])
            .start_timer();

        let result = sqlx::query(
            r#"
            DELETE FROM payment_plans
            WHERE tenant_id = $1 AND plan_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(plan_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to delete plan: {}", e)))?;

        timer.observe_duration();

        if result.rows_affected() > 0 {
            info!(plan_id = %plan_id, "Plan deleted");
        }

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Enrollment Operations
    // =========================================================================

    #[instrument(skip(self), fields(tenant_id = %tenant_id, student_id = %student_id, plan_id = %plan_id))]
    async fn find_enrollment(
        &self,
        tenant_id: Uuid,
        student_id: Uuid,
        plan_id: Uuid,
    ) -> Result<Option<Enrollment>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_enrollment"])
            .start_timer();

        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT enrollment_id, tenant_id, student_id, plan_id, total_amount, status, created_utc, updated_utc
            FROM student_payment_plans
            WHERE tenant_id = $1 AND student_id = $2 AND plan_id = $3
            "#,
        )
        .bind(tenant_id)
        .bind(student_id)
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to find enrollment: {}", e)))?;

        timer.observe_duration();

        Ok(enrollment)
    }

    #[instrument(skip(self, input, installments), fields(tenant_id = %input.tenant_id, student_id = %input.student_id))]
    async fn create_enrollment(
        &self,
        input: &CreateEnrollment,
        installments: &[NewInstallment],
    ) -> Result<(Enrollment, Vec<Installment>), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_enrollment"])
            .start_timer();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to begin transaction: {}", e)))?;

        let enrollment_id = Uuid::new_v4();
        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"
            INSERT INTO student_payment_plans (enrollment_id, tenant_id, student_id, plan_id, total_amount, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING enrollment_id, tenant_id, student_id, plan_id, total_amount, status, created_utc, updated_utc
            "#,
        )
        .bind(enrollment_id)
        .bind(input.tenant_id)
        .bind(input.student_id)
        .bind(input.plan_id)
        .bind(input.total_amount)
        .bind(crate::models::EnrollmentStatus::Active.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Student is already enrolled in this plan"))
            }
            _ => AppError::Store(anyhow::anyhow!("Failed to create enrollment: {}", e)),
        })?;

        let mut created = Vec::with_capacity(installments.len());
        for installment in installments {
            let row = sqlx::query_as::<_, Installment>(&format!(
                r#"
                INSERT INTO installments (installment_id, enrollment_id, installment_number, amount, paid_amount, due_date, status)
                VALUES ($1, $2, $3, $4, 0, $5, $6)
                RETURNING {INSTALLMENT_COLUMNS}
                "#,
            ))
            .bind(Uuid::new_v4())
            .bind(enrollment_id)
            .bind(installment.installment_number)
            .bind(installment.amount)
            .bind(installment.due_date)
            .bind(InstallmentStatus::Pending.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to create installment: {}", e)))?;
            created.push(row);
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to commit enrollment: {}", e)))?;

        timer.observe_duration();
        info!(
            enrollment_id = %enrollment.enrollment_id,
            installments = created.len(),
            "Enrollment created"
        );

        Ok((enrollment, created))
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, student_id = %student_id))]
    async fn enrollments_for_student(
        &self,
        tenant_id: Uuid,
        student_id: Uuid,
    ) -> Result<Vec<EnrollmentRecord>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["enrollments_for_student"])
            .start_timer();

        let rows = sqlx::query_as::<_, EnrollmentPlanRow>(
            r#"
            SELECT e.enrollment_id, e.tenant_id, e.student_id, e.plan_id, e.total_amount, e.status,
                   e.created_utc, e.updated_utc, p.name AS plan_name
            FROM student_payment_plans e
            JOIN payment_plans p ON e.plan_id = p.plan_id
            WHERE e.tenant_id = $1 AND e.student_id = $2
            ORDER BY e.created_utc DESC
            "#,
        )
        .bind(tenant_id)
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to list enrollments: {}", e)))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let installments = sqlx::query_as::<_, Installment>(&format!(
                r#"
                SELECT {INSTALLMENT_COLUMNS}
                FROM installments
                WHERE enrollment_id = $1
                ORDER BY installment_number
                "#,
            ))
            .bind(row.enrollment_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to load installments: {}", e)))?;

            records.push(EnrollmentRecord {
                enrollment: Enrollment {
                    enrollment_id: row.enrollment_id,
                    tenant_id: row.tenant_id,
                    student_id: row.student_id,
                    plan_id: row.plan_id,
                    total_amount: row.total_amount,
                    status: row.status,
                    created_utc: row.created_utc,
                    updated_utc: row.updated_utc,
                },
                plan_name: row.plan_name,
                installments,
            });
        }

        timer.observe_duration();

        Ok(records)
    }

    // =========================================================================
    // Installment Operations
    // =========================================================================

    #[instrument(skip(self), fields(tenant_id = %tenant_id, installment_id = %installment_id))]
    async fn get_installment(
        &self,
        tenant_id: Uuid,
        installment_id: Uuid,
    ) -> Result<Option<InstallmentRow>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_installment"])
            .start_timer();

        let row = sqlx::query_as::<_, InstallmentRow>(&format!(
            r#"
            SELECT {INSTALLMENT_ROW_COLUMNS}
            FROM installments i
            JOIN student_payment_plans e ON i.enrollment_id = e.enrollment_id
            JOIN payment_plans p ON e.plan_id = p.plan_id
            WHERE e.tenant_id = $1 AND i.installment_id = $2
            "#,
        ))
        .bind(tenant_id)
        .bind(installment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to get installment: {}", e)))?;

        timer.observe_duration();

        Ok(row)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, installment_id = %installment_id))]
    async fn apply_payment(
        &self,
        tenant_id: Uuid,
        installment_id: Uuid,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<PaymentReceipt, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["apply_payment"])
            .start_timer();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to begin transaction: {}", e)))?;

        // Row lock so concurrent payments against the same installment
        // serialize instead of losing an update.
        let row = sqlx::query_as::<_, InstallmentRow>(&format!(
            r#"
            SELECT {INSTALLMENT_ROW_COLUMNS}
            FROM installments i
            JOIN student_payment_plans e ON i.enrollment_id = e.enrollment_id
            JOIN payment_plans p ON e.plan_id = p.plan_id
            WHERE e.tenant_id = $1 AND i.installment_id = $2
            FOR UPDATE OF i
            "#,
        ))
        .bind(tenant_id)
        .bind(installment_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to lock installment: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Installment not found")))?;

        let applied = apply_payment(row.amount, row.paid_amount, amount)
            .map_err(|e| AppError::Validation(anyhow::Error::new(e)))?;

        let paid_date: Option<DateTime<Utc>> = applied.just_paid.then_some(now);
        let installment = sqlx::query_as::<_, Installment>(&format!(
            r#"
            UPDATE installments
            SET paid_amount = $2, status = $3, paid_date = COALESCE(paid_date, $4), updated_utc = $5
            WHERE installment_id = $1
            RETURNING {INSTALLMENT_COLUMNS}
            "#,
        ))
        .bind(installment_id)
        .bind(applied.new_paid_amount)
        .bind(applied.new_status.as_str())
        .bind(paid_date)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to apply payment: {}", e)))?;

        let unpaid: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM installments
            WHERE enrollment_id = $1 AND status <> 'paid'
            "#,
        )
        .bind(row.enrollment_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to check completion: {}", e)))?;

        let enrollment_completed = unpaid == 0;
        if enrollment_completed {
            sqlx::query(
                r#"
                UPDATE student_payment_plans
                SET status = 'completed', updated_utc = $2
                WHERE enrollment_id = $1 AND status = 'active'
                "#,
            )
            .bind(row.enrollment_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::Store(anyhow::anyhow!("Failed to complete enrollment: {}", e))
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to commit payment: {}", e)))?;

        timer.observe_duration();
        info!(
            installment_id = %installment_id,
            status = %installment.status,
            enrollment_completed = enrollment_completed,
            "Payment applied"
        );

        Ok(PaymentReceipt {
            installment,
            enrollment_completed,
        })
    }

    #[instrument(skip(self, filter), fields(tenant_id = %tenant_id))]
    async fn list_installments(
        &self,
        tenant_id: Uuid,
        filter: &InstallmentFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<InstallmentRow>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_installments"])
            .start_timer();

        let status_str = filter.status.map(|s| s.as_str().to_string());
        let window_end = now + Duration::days(UPCOMING_WINDOW_DAYS);

        let rows = sqlx::query_as::<_, InstallmentRow>(&format!(
            r#"
            SELECT {INSTALLMENT_ROW_COLUMNS}
            FROM installments i
            JOIN student_payment_plans e ON i.enrollment_id = e.enrollment_id
            JOIN payment_plans p ON e.plan_id = p.plan_id
            WHERE e.tenant_id = $1
              AND ($2::varchar IS NULL OR i.status = $2)
              AND ($3::bool = FALSE OR (i.status IN ('pending', 'partial') AND i.due_date >= $5 AND i.due_date <= $6))
              AND ($4::bool = FALSE OR (i.status IN ('pending', 'partial', 'overdue') AND i.due_date < $5))
            ORDER BY i.due_date
            "#,
        ))
        .bind(tenant_id)
        .bind(&status_str)
        .bind(filter.upcoming)
        .bind(filter.overdue)
        .bind(now)
        .bind(window_end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to list installments: {}", e)))?;

        timer.observe_duration();

        Ok(rows)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, installment_id = %installment_id))]
    async fn mark_reminder_sent(
        &self,
        tenant_id: Uuid,
        installment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["mark_reminder_sent"])
            .start_timer();

        sqlx::query(
            r#"
            UPDATE installments i
            SET reminder_sent = TRUE, reminder_sent_at = $3, updated_utc = $3
            FROM student_payment_plans e
            WHERE i.enrollment_id = e.enrollment_id
              AND e.tenant_id = $1 AND i.installment_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(installment_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to mark reminder: {}", e)))?;

        timer.observe_duration();

        Ok(())
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    async fn sweep_overdue(&self, tenant_id: Uuid, now: DateTime<Utc>) -> Result<u64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["sweep_overdue"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE installments i
            SET status = 'overdue', updated_utc = $2
            FROM student_payment_plans e
            WHERE i.enrollment_id = e.enrollment_id
              AND e.tenant_id = $1
              AND i.status IN ('pending', 'partial')
              AND i.due_date < $2
            "#,
        )
        .bind(tenant_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to sweep overdue: {}", e)))?;

        timer.observe_duration();

        Ok(result.rows_affected())
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    async fn summarize(
        &self,
        tenant_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<TenantSummary, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["summarize"])
            .start_timer();

        let window_end = now + Duration::days(UPCOMING_WINDOW_DAYS);

        let active_enrollments: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM student_payment_plans
            WHERE tenant_id = $1 AND status = 'active'
            "#,
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to count enrollments: {}", e)))?;

        let overdue_installments: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM installments i
            JOIN student_payment_plans e ON i.enrollment_id = e.enrollment_id
            WHERE e.tenant_id = $1
              AND i.status IN ('pending', 'partial', 'overdue')
              AND i.due_date < $2
            "#,
        )
        .bind(tenant_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to count overdue: {}", e)))?;

        let upcoming_installments: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM installments i
            JOIN student_payment_plans e ON i.enrollment_id = e.enrollment_id
            WHERE e.tenant_id = $1
              AND i.status IN ('pending', 'partial')
              AND i.due_date >= $2 AND i.due_date <= $3
            "#,
        )
        .bind(tenant_id)
        .bind(now)
        .bind(window_end)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to count upcoming: {}", e)))?;

        let total_expected: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(i.amount), 0)
            FROM installments i
            JOIN student_payment_plans e ON i.enrollment_id = e.enrollment_id
            WHERE e.tenant_id = $1
            "#,
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to sum expected: {}", e)))?;

        let total_collected: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(i.paid_amount), 0)
            FROM installments i
            JOIN student_payment_plans e ON i.enrollment_id = e.enrollment_id
            WHERE e.tenant_id = $1
            "#,
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to sum collected: {}", e)))?;

        timer.observe_duration();

        Ok(TenantSummary {
            active_enrollments,
            overdue_installments,
            upcoming_installments,
            total_expected: total_expected.unwrap_or(Decimal::ZERO),
            total_collected: total_collected.unwrap_or(Decimal::ZERO),
        })
    }
}

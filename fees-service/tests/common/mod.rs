//! Test helper module for fees-service integration tests.
//!
//! Wires the operation services over the in-memory store, a static
//! directory, a mock SMS provider, and a fixed clock so the suite needs no
//! external services.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use secrecy::Secret;
use std::sync::Arc;
use uuid::Uuid;

use fees_service::clock::FixedClock;
use fees_service::models::{EnrollmentDetail, PaymentPlan};
use fees_service::services::directory::{SmsSettings, StaticDirectory, StudentRecord};
use fees_service::services::providers::MockSmsProvider;
use fees_service::services::{
    CreatePlanRequest, EnrollRequest, EnrollmentEngine, InstallmentLedger, PlanCatalog,
    ReminderService, SummaryAggregator,
};
use fees_service::store::{InMemoryStore, LedgerStore};

// Test constants for tenant context
pub const TEST_TENANT_ID: &str = "11111111-1111-1111-1111-111111111111";
pub const TEST_STUDENT_ID: &str = "22222222-2222-2222-2222-222222222222";
pub const OTHER_STUDENT_ID: &str = "33333333-3333-3333-3333-333333333333";

pub fn tenant_id() -> Uuid {
    Uuid::parse_str(TEST_TENANT_ID).unwrap()
}

pub fn student_id() -> Uuid {
    Uuid::parse_str(TEST_STUDENT_ID).unwrap()
}

/// A seeded student without a contact phone.
pub fn other_student_id() -> Uuid {
    Uuid::parse_str(OTHER_STUDENT_ID).unwrap()
}

/// The fixed instant every test starts from.
pub fn start_of_term() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
}

pub fn days_from_start(days: i64) -> DateTime<Utc> {
    start_of_term() + Duration::days(days)
}

pub struct TestContext {
    pub clock: Arc<FixedClock>,
    pub sms: Arc<MockSmsProvider>,
    pub directory: Arc<StaticDirectory>,
    pub store: Arc<dyn LedgerStore>,
    pub catalog: PlanCatalog,
    pub enrollments: EnrollmentEngine,
    pub installments: InstallmentLedger,
    pub reminders: ReminderService,
    pub summary: SummaryAggregator,
}

impl TestContext {
    pub fn new() -> Self {
        let clock = Arc::new(FixedClock::new(start_of_term()));
        let store: Arc<dyn LedgerStore> = Arc::new(InMemoryStore::new(clock.clone()));

        let directory = Arc::new(StaticDirectory::new());
        directory.add_student(
            tenant_id(),
            StudentRecord {
                student_id: student_id(),
                name: "Amina Yusuf".to_string(),
                student_number: Some("S-1001".to_string()),
                phone: Some("+2348012345678".to_string()),
                class_name: Some("JSS 2".to_string()),
            },
        );
        directory.add_student(
            tenant_id(),
            StudentRecord {
                student_id: other_student_id(),
                name: "Tunde Bello".to_string(),
                student_number: Some("S-1002".to_string()),
                phone: None,
                class_name: Some("JSS 2".to_string()),
            },
        );

        let sms = Arc::new(MockSmsProvider::new());

        let catalog = PlanCatalog::new(store.clone());
        let enrollments = EnrollmentEngine::new(store.clone(), directory.clone());
        let installments =
            InstallmentLedger::new(store.clone(), directory.clone(), clock.clone());
        let reminders = ReminderService::new(
            store.clone(),
            directory.clone(),
            sms.clone(),
            clock.clone(),
        );
        let summary = SummaryAggregator::new(store.clone(), clock.clone());

        Self {
            clock,
            sms,
            directory,
            store,
            catalog,
            enrollments,
            installments,
            reminders,
            summary,
        }
    }

    /// Configure SMS credentials for the test tenant.
    pub fn with_sms_settings(&self) {
        self.directory.set_sms_settings(
            tenant_id(),
            SmsSettings {
                sender_id: "SCHOOL".to_string(),
                auth_key: Secret::new("test-auth-key".to_string()),
            },
        );
    }
}

pub async fn create_plan(
    ctx: &TestContext,
    name: &str,
    total_amount: Decimal,
    installment_count: i32,
) -> PaymentPlan {
    ctx.catalog
        .create(
            tenant_id(),
            CreatePlanRequest {
                name: Some(name.to_string()),
                total_amount: Some(total_amount),
                installment_count: Some(installment_count),
                term_id: None,
            },
        )
        .await
        .expect("plan creation should succeed")
}

pub async fn enroll(
    ctx: &TestContext,
    student: Uuid,
    plan_id: Uuid,
    due_dates: Vec<DateTime<Utc>>,
    total_amount: Option<Decimal>,
) -> EnrollmentDetail {
    ctx.enrollments
        .enroll(
            tenant_id(),
            EnrollRequest {
                student_id: student,
                plan_id,
                due_dates,
                total_amount,
            },
        )
        .await
        .expect("enrollment should succeed")
}

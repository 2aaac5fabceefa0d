//! Plan catalog integration tests.

mod common;

use chrono::Duration;
use common::{create_plan, enroll, tenant_id, student_id, TestContext};
use fees_service::services::CreatePlanRequest;
use rust_decimal_macros::dec;
use service_core::error::AppError;
use uuid::Uuid;

#[tokio::test]
async fn create_plan_works() {
    let ctx = TestContext::new();

    let plan = create_plan(&ctx, "Term 1 Fees", dec!(90000), 3).await;

    assert_eq!(plan.name, "Term 1 Fees");
    assert_eq!(plan.total_amount, dec!(90000));
    assert_eq!(plan.installment_count, 3);
    assert_eq!(plan.tenant_id, tenant_id());

    let plans = ctx.catalog.list(tenant_id()).await.unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].plan_id, plan.plan_id);
    assert_eq!(plans[0].enrollment_count, 0);
}

#[tokio::test]
async fn create_plan_requires_name_amount_and_count() {
    let ctx = TestContext::new();

    let missing_name = ctx
        .catalog
        .create(
            tenant_id(),
            CreatePlanRequest {
                name: None,
                total_amount: Some(dec!(90000)),
                installment_count: Some(3),
                term_id: None,
            },
        )
        .await;
    assert!(matches!(missing_name, Err(AppError::Validation(_))));

    let missing_amount = ctx
        .catalog
        .create(
            tenant_id(),
            CreatePlanRequest {
                name: Some("Term 1 Fees".to_string()),
                total_amount: None,
                installment_count: Some(3),
                term_id: None,
            },
        )
        .await;
    assert!(matches!(missing_amount, Err(AppError::Validation(_))));

    let zero_count = ctx
        .catalog
        .create(
            tenant_id(),
            CreatePlanRequest {
                name: Some("Term 1 Fees".to_string()),
                total_amount: Some(dec!(90000)),
                installment_count: Some(0),
                term_id: None,
            },
        )
        .await;
    assert!(matches!(zero_count, Err(AppError::Validation(_))));

    let negative_amount = ctx
        .catalog
        .create(
            tenant_id(),
            CreatePlanRequest {
                name: Some("Term 1 Fees".to_string()),
                total_amount: Some(dec!(-1)),
                installment_count: Some(3),
                term_id: None,
            },
        )
        .await;
    assert!(matches!(negative_amount, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn duplicate_plan_name_conflicts() {
    let ctx = TestContext::new();

    create_plan(&ctx, "Term 1 Fees", dec!(90000), 3).await;

    let duplicate = ctx
        .catalog
        .create(
            tenant_id(),
            CreatePlanRequest {
                name: Some("Term 1 Fees".to_string()),
                total_amount: Some(dec!(45000)),
                installment_count: Some(2),
                term_id: None,
            },
        )
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn list_plans_newest_first_with_enrollment_counts() {
    let ctx = TestContext::new();

    let first = create_plan(&ctx, "Term 1 Fees", dec!(90000), 3).await;
    ctx.clock.advance(Duration::hours(1));
    let second = create_plan(&ctx, "Term 2 Fees", dec!(60000), 2).await;

    enroll(
        &ctx,
        student_id(),
        first.plan_id,
        vec![common::days_from_start(30)],
        None,
    )
    .await;

    let plans = ctx.catalog.list(tenant_id()).await.unwrap();
    assert_eq!(plans.len(), 2);
    assert_eq!(plans[0].plan_id, second.plan_id);
    assert_eq!(plans[0].enrollment_count, 0);
    assert_eq!(plans[1].plan_id, first.plan_id);
    assert_eq!(plans[1].enrollment_count, 1);
}

#[tokio::test]
async fn delete_plan_with_enrollments_conflicts() {
    let ctx = TestContext::new();

    let plan = create_plan(&ctx, "Term 1 Fees", dec!(90000), 3).await;
    enroll(
        &ctx,
        student_id(),
        plan.plan_id,
        vec![common::days_from_start(30)],
        None,
    )
    .await;

    let err = ctx
        .catalog
        .delete(tenant_id(), plan.plan_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert!(err.to_string().contains("1 students enrolled"));

    // Still listed after the failed delete.
    let plans = ctx.catalog.list(tenant_id()).await.unwrap();
    assert_eq!(plans.len(), 1);
}

#[tokio::test]
async fn delete_plan_without_enrollments_succeeds() {
    let ctx = TestContext::new();

    let plan = create_plan(&ctx, "Term 1 Fees", dec!(90000), 3).await;
    ctx.catalog.delete(tenant_id(), plan.plan_id).await.unwrap();

    let plans = ctx.catalog.list(tenant_id()).await.unwrap();
    assert!(plans.is_empty());
}

#[tokio::test]
async fn delete_missing_plan_not_found() {
    let ctx = TestContext::new();

    let err = ctx
        .catalog
        .delete(tenant_id(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

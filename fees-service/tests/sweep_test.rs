//! Overdue sweeper tests.

mod common;

use chrono::Duration;
use common::{create_plan, days_from_start, enroll, student_id, tenant_id, TestContext};
use fees_service::models::{InstallmentFilter, InstallmentStatus};
use rust_decimal_macros::dec;

#[tokio::test]
async fn sweep_reclassifies_only_past_due_open_installments() {
    let ctx = TestContext::new();
    let plan = create_plan(&ctx, "Term 1 Fees", dec!(90000), 3).await;
    let enrollment = enroll(
        &ctx,
        student_id(),
        plan.plan_id,
        vec![
            days_from_start(1),
            days_from_start(5),
            days_from_start(40),
        ],
        None,
    )
    .await;

    // Partially pay the second installment; it must still be swept.
    ctx.installments
        .record_payment(
            tenant_id(),
            enrollment.installments[1].installment_id,
            Some(dec!(10000)),
        )
        .await
        .unwrap();

    ctx.clock.advance(Duration::days(10));
    let changed = ctx.installments.sweep_overdue(tenant_id()).await.unwrap();
    assert_eq!(changed, 2);

    let views = ctx
        .installments
        .list(tenant_id(), InstallmentFilter::default())
        .await
        .unwrap();
    assert_eq!(views[0].status, "overdue");
    assert_eq!(views[1].status, "overdue");
    assert_eq!(views[2].status, "pending");
}

#[tokio::test]
async fn sweep_is_idempotent() {
    let ctx = TestContext::new();
    let plan = create_plan(&ctx, "Term 1 Fees", dec!(60000), 2).await;
    enroll(
        &ctx,
        student_id(),
        plan.plan_id,
        vec![days_from_start(1), days_from_start(2)],
        None,
    )
    .await;

    ctx.clock.advance(Duration::days(5));
    assert_eq!(ctx.installments.sweep_overdue(tenant_id()).await.unwrap(), 2);
    assert_eq!(ctx.installments.sweep_overdue(tenant_id()).await.unwrap(), 0);
}

#[tokio::test]
async fn sweep_never_touches_paid_installments() {
    let ctx = TestContext::new();
    let plan = create_plan(&ctx, "Term 1 Fees", dec!(60000), 2).await;
    let enrollment = enroll(
        &ctx,
        student_id(),
        plan.plan_id,
        vec![days_from_start(1), days_from_start(2)],
        None,
    )
    .await;

    ctx.installments
        .record_payment(
            tenant_id(),
            enrollment.installments[0].installment_id,
            Some(dec!(30000)),
        )
        .await
        .unwrap();

    ctx.clock.advance(Duration::days(30));
    let changed = ctx.installments.sweep_overdue(tenant_id()).await.unwrap();
    assert_eq!(changed, 1);

    let paid = ctx
        .installments
        .list(
            tenant_id(),
            InstallmentFilter {
                status: Some(InstallmentStatus::Paid),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(paid.len(), 1);
    assert_eq!(
        paid[0].installment_id,
        enrollment.installments[0].installment_id
    );
}

#[tokio::test]
async fn upcoming_and_overdue_filters_follow_the_clock() {
    let ctx = TestContext::new();
    let plan = create_plan(&ctx, "Term 1 Fees", dec!(90000), 3).await;
    enroll(
        &ctx,
        student_id(),
        plan.plan_id,
        vec![
            days_from_start(-3),
            days_from_start(5),
            days_from_start(40),
        ],
        None,
    )
    .await;

    // Overdue filter re-derives from due dates even before any sweep runs.
    let overdue = ctx
        .installments
        .list(
            tenant_id(),
            InstallmentFilter {
                overdue: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].status, "pending");

    let upcoming = ctx
        .installments
        .list(
            tenant_id(),
            InstallmentFilter {
                upcoming: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].installment_number, 2);

    // Results carry display decoration and due-date ordering.
    let all = ctx
        .installments
        .list(tenant_id(), InstallmentFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].due_date <= w[1].due_date));
    assert!(all
        .iter()
        .all(|v| v.student_name == "Amina Yusuf" && v.plan_name == "Term 1 Fees"));
}

//! Reminder dispatch tests.

mod common;

use common::{
    create_plan, days_from_start, enroll, other_student_id, student_id, tenant_id, TestContext,
};
use fees_service::clock::Clock;
use fees_service::models::InstallmentFilter;
use rust_decimal_macros::dec;
use service_core::error::AppError;
use uuid::Uuid;

#[tokio::test]
async fn reminder_for_unknown_installment_not_found() {
    let ctx = TestContext::new();
    ctx.with_sms_settings();

    let err = ctx
        .reminders
        .send(tenant_id(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn reminder_requires_student_phone() {
    let ctx = TestContext::new();
    ctx.with_sms_settings();

    let plan = create_plan(&ctx, "Term 1 Fees", dec!(50000), 1).await;
    let enrollment = enroll(
        &ctx,
        other_student_id(),
        plan.plan_id,
        vec![days_from_start(30)],
        None,
    )
    .await;

    let err = ctx
        .reminders
        .send(tenant_id(), enrollment.installments[0].installment_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(ctx.sms.send_count(), 0);
}

#[tokio::test]
async fn reminder_requires_tenant_sms_credentials() {
    let ctx = TestContext::new();

    let plan = create_plan(&ctx, "Term 1 Fees", dec!(50000), 1).await;
    let enrollment = enroll(
        &ctx,
        student_id(),
        plan.plan_id,
        vec![days_from_start(30)],
        None,
    )
    .await;

    let err = ctx
        .reminders
        .send(tenant_id(), enrollment.installments[0].installment_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Configuration(_)));
}

#[tokio::test]
async fn successful_reminder_marks_the_installment() {
    let ctx = TestContext::new();
    ctx.with_sms_settings();

    let plan = create_plan(&ctx, "Term 1 Fees", dec!(50000), 1).await;
    let enrollment = enroll(
        &ctx,
        student_id(),
        plan.plan_id,
        vec![days_from_start(30)],
        None,
    )
    .await;

    let outcome = ctx
        .reminders
        .send(tenant_id(), enrollment.installments[0].installment_id)
        .await
        .unwrap();
    assert!(outcome.delivered);
    assert_eq!(ctx.sms.send_count(), 1);

    let views = ctx
        .installments
        .list(tenant_id(), InstallmentFilter::default())
        .await
        .unwrap();
    assert!(views[0].reminder_sent);
    assert_eq!(views[0].reminder_sent_at, Some(ctx.clock.now()));
}

#[tokio::test]
async fn delivery_failure_still_marks_the_attempt() {
    let ctx = TestContext::new();
    ctx.with_sms_settings();
    ctx.sms.fail_sends(true);

    let plan = create_plan(&ctx, "Term 1 Fees", dec!(50000), 1).await;
    let enrollment = enroll(
        &ctx,
        student_id(),
        plan.plan_id,
        vec![days_from_start(30)],
        None,
    )
    .await;

    let outcome = ctx
        .reminders
        .send(tenant_id(), enrollment.installments[0].installment_id)
        .await
        .unwrap();
    assert!(!outcome.delivered);
    assert!(outcome.detail.is_some());

    let views = ctx
        .installments
        .list(tenant_id(), InstallmentFilter::default())
        .await
        .unwrap();
    assert!(views[0].reminder_sent);
}

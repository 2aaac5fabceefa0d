//! Enrollment engine integration tests.

mod common;

use common::{
    create_plan, days_from_start, enroll, other_student_id, student_id, tenant_id, TestContext,
};
use fees_service::services::EnrollRequest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use service_core::error::AppError;
use uuid::Uuid;

#[tokio::test]
async fn enroll_creates_numbered_schedule_in_input_order() {
    let ctx = TestContext::new();
    let plan = create_plan(&ctx, "Term 1 Fees", dec!(90000), 3).await;

    let due_dates = vec![
        days_from_start(30),
        days_from_start(60),
        days_from_start(90),
    ];
    let enrollment = enroll(&ctx, student_id(), plan.plan_id, due_dates.clone(), None).await;

    assert_eq!(enrollment.status, "active");
    assert_eq!(enrollment.total_amount, dec!(90000));
    assert_eq!(enrollment.student_name, "Amina Yusuf");
    assert_eq!(enrollment.plan_name, "Term 1 Fees");
    assert_eq!(enrollment.installments.len(), 3);

    for (idx, installment) in enrollment.installments.iter().enumerate() {
        assert_eq!(installment.installment_number, idx as i32 + 1);
        assert_eq!(installment.due_date, due_dates[idx]);
        assert_eq!(installment.status, "pending");
        assert_eq!(installment.paid_amount, Decimal::ZERO);
        assert_eq!(installment.amount, dec!(30000));
    }
}

#[tokio::test]
async fn installment_amounts_sum_to_total_exactly() {
    let ctx = TestContext::new();

    for (name, parts) in [("One part", 1usize), ("Three parts", 3), ("Seven parts", 7)] {
        let plan = create_plan(&ctx, name, dec!(100000), parts as i32).await;
        let due_dates: Vec<_> = (1..=parts as i64).map(|i| days_from_start(30 * i)).collect();
        let enrollment = enroll(&ctx, student_id(), plan.plan_id, due_dates, None).await;

        let sum: Decimal = enrollment.installments.iter().map(|i| i.amount).sum();
        assert_eq!(sum, dec!(100000), "{} must sum exactly", name);
    }
}

#[tokio::test]
async fn uneven_division_gives_remainder_to_final_installment() {
    let ctx = TestContext::new();
    let plan = create_plan(&ctx, "Term 1 Fees", dec!(100000), 3).await;

    let enrollment = enroll(
        &ctx,
        student_id(),
        plan.plan_id,
        vec![
            days_from_start(30),
            days_from_start(60),
            days_from_start(90),
        ],
        None,
    )
    .await;

    let amounts: Vec<Decimal> = enrollment.installments.iter().map(|i| i.amount).collect();
    assert_eq!(amounts, vec![dec!(33333.33), dec!(33333.33), dec!(33333.34)]);
}

#[tokio::test]
async fn enroll_requires_due_dates() {
    let ctx = TestContext::new();
    let plan = create_plan(&ctx, "Term 1 Fees", dec!(90000), 3).await;

    let err = ctx
        .enrollments
        .enroll(
            tenant_id(),
            EnrollRequest {
                student_id: student_id(),
                plan_id: plan.plan_id,
                due_dates: vec![],
                total_amount: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn enroll_unknown_plan_not_found() {
    let ctx = TestContext::new();

    let err = ctx
        .enrollments
        .enroll(
            tenant_id(),
            EnrollRequest {
                student_id: student_id(),
                plan_id: Uuid::new_v4(),
                due_dates: vec![days_from_start(30)],
                total_amount: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn enroll_unknown_student_not_found() {
    let ctx = TestContext::new();
    let plan = create_plan(&ctx, "Term 1 Fees", dec!(90000), 3).await;

    let err = ctx
        .enrollments
        .enroll(
            tenant_id(),
            EnrollRequest {
                student_id: Uuid::new_v4(),
                plan_id: plan.plan_id,
                due_dates: vec![days_from_start(30)],
                total_amount: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn duplicate_enrollment_conflicts() {
    let ctx = TestContext::new();
    let plan = create_plan(&ctx, "Term 1 Fees", dec!(90000), 3).await;

    enroll(
        &ctx,
        student_id(),
        plan.plan_id,
        vec![days_from_start(30)],
        None,
    )
    .await;

    let err = ctx
        .enrollments
        .enroll(
            tenant_id(),
            EnrollRequest {
                student_id: student_id(),
                plan_id: plan.plan_id,
                due_dates: vec![days_from_start(30)],
                total_amount: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn override_amount_replaces_plan_total() {
    let ctx = TestContext::new();
    let plan = create_plan(&ctx, "Term 1 Fees", dec!(90000), 2).await;

    let enrollment = enroll(
        &ctx,
        student_id(),
        plan.plan_id,
        vec![days_from_start(30), days_from_start(60)],
        Some(dec!(60000)),
    )
    .await;

    assert_eq!(enrollment.total_amount, dec!(60000));
    let sum: Decimal = enrollment.installments.iter().map(|i| i.amount).sum();
    assert_eq!(sum, dec!(60000));
}

#[tokio::test]
async fn non_positive_override_rejected() {
    let ctx = TestContext::new();
    let plan = create_plan(&ctx, "Term 1 Fees", dec!(90000), 1).await;

    let err = ctx
        .enrollments
        .enroll(
            tenant_id(),
            EnrollRequest {
                student_id: student_id(),
                plan_id: plan.plan_id,
                due_dates: vec![days_from_start(30)],
                total_amount: Some(Decimal::ZERO),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn for_student_lists_enrollments_with_installments() {
    let ctx = TestContext::new();
    let term1 = create_plan(&ctx, "Term 1 Fees", dec!(90000), 3).await;
    let term2 = create_plan(&ctx, "Term 2 Fees", dec!(60000), 2).await;

    enroll(
        &ctx,
        student_id(),
        term1.plan_id,
        vec![days_from_start(30), days_from_start(60), days_from_start(90)],
        None,
    )
    .await;
    enroll(
        &ctx,
        student_id(),
        term2.plan_id,
        vec![days_from_start(120), days_from_start(150)],
        None,
    )
    .await;

    let enrollments = ctx
        .enrollments
        .for_student(tenant_id(), student_id())
        .await
        .unwrap();
    assert_eq!(enrollments.len(), 2);
    assert!(enrollments.iter().any(|e| e.plan_name == "Term 1 Fees"));
    assert!(enrollments.iter().any(|e| e.plan_name == "Term 2 Fees"));
    assert!(enrollments
        .iter()
        .all(|e| e.student_name == "Amina Yusuf" && !e.installments.is_empty()));

    // Other students see nothing.
    let none = ctx
        .enrollments
        .for_student(tenant_id(), other_student_id())
        .await
        .unwrap();
    assert!(none.is_empty());
}

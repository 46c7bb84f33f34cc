// ==========================================
// 欠费台账集成测试
// ==========================================
// 测试目标: LedgerApi 经 SQLite 仓储读取缴费单并计算余额
// ==========================================


use chrono::NaiveDate;
use school_admin::api::{ApiError, LedgerApi};
use school_admin::domain::{Capability, CapabilitySet, ChallanStatus, Student, StudentStatus};
use school_admin::engine::compute_balance;
use school_admin::repository::SchoolRepository;
use test_helpers::{all_capabilities, challan, create_test_repo, seed_classes, student};

fn student_with_opening(id: &str, opening: f64) -> Student {
    let mut s = student(id, "c1", StudentStatus::Active);
    s.opening_balance = opening;
    s
}

#[tokio::test]
async fn test_balance_excludes_cancelled_challans() {
    let (_temp, repo) = create_test_repo();
    seed_classes(repo.as_ref(), &[("c1", "Class 1")]).await;
    repo.insert_students(vec![student_with_opening("s1", 500.0)])
        .await
        .unwrap();

    let mut paid = challan("ch1", "s1", ChallanStatus::Partial);
    paid.issue_date = NaiveDate::from_ymd_opt(2025, 2, 1);
    paid.total_amount = Some(5000.0);
    paid.previous_balance = Some(500.0);
    paid.paid_amount = Some(4000.0);
    paid.discount = Some(200.0);

    let mut cancelled = challan("ch2", "s1", ChallanStatus::Cancelled);
    cancelled.total_amount = Some(99_999.0);
    cancelled.paid_amount = Some(1.0);

    repo.insert_challans(vec![paid, cancelled]).await.unwrap();

    let api = LedgerApi::new(repo.clone());
    let caps = all_capabilities();
    assert_eq!(api.student_balance(&caps, "s1").await.unwrap(), 800.0);

    let ledger = api.student_ledger(&caps, "s1").await.unwrap();
    assert_eq!(ledger.summary.counted_challans, 1);
    assert_eq!(ledger.summary.cancelled_challans, 1);
    assert_eq!(ledger.entries.len(), 1);
    assert_eq!(ledger.entries[0].balance_after, 800.0);

    // 与纯函数计算一致
    let s1 = repo.get_student("s1").await.unwrap().unwrap();
    let challans = repo.list_challans_for_student("s1").await.unwrap();
    assert_eq!(compute_balance(&s1, &challans), 800.0);
}

#[tokio::test]
async fn test_missing_amounts_and_credit_balance() {
    let (_temp, repo) = create_test_repo();
    seed_classes(repo.as_ref(), &[("c1", "Class 1")]).await;
    repo.insert_students(vec![student_with_opening("s1", 0.0)])
        .await
        .unwrap();

    let mut overpaid = challan("ch1", "s1", ChallanStatus::Paid);
    overpaid.total_amount = Some(1000.0);
    overpaid.paid_amount = Some(1500.0);
    // previous_balance / discount 缺失按 0 计
    repo.insert_challans(vec![overpaid, challan("ch2", "s1", ChallanStatus::Unpaid)])
        .await
        .unwrap();

    let api = LedgerApi::new(repo.clone());
    let balance = api.student_balance(&all_capabilities(), "s1").await.unwrap();
    assert_eq!(balance, -500.0);
}

#[tokio::test]
async fn test_unknown_student_and_permission() {
    let (_temp, repo) = create_test_repo();
    let api = LedgerApi::new(repo.clone());

    let err = api
        .student_balance(&all_capabilities(), "ghost")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = api
        .student_balance(&CapabilitySet::of([Capability::ImportStudents]), "ghost")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::PermissionDenied(Capability::ViewFeeLedger)
    ));
}

#[tokio::test]
async fn test_balance_and_ledger_agree_with_fractional_amounts() {
    let (_temp, repo) = create_test_repo();
    seed_classes(repo.as_ref(), &[("c1", "Class 1")]).await;
    repo.insert_students(vec![student_with_opening("s1", 0.1)])
        .await
        .unwrap();

    let mut challans = Vec::new();
    for (i, day) in [15u32, 1, 8].iter().enumerate() {
        let mut c = challan(&format!("ch{}", i), "s1", ChallanStatus::Partial);
        c.issue_date = NaiveDate::from_ymd_opt(2025, 4, *day);
        c.total_amount = Some(2500.7);
        c.previous_balance = Some(0.3);
        c.paid_amount = Some(1999.99);
        c.discount = Some(0.2);
        challans.push(c);
    }
    repo.insert_challans(challans).await.unwrap();

    let api = LedgerApi::new(repo.clone());
    let caps = all_capabilities();
    let balance = api.student_balance(&caps, "s1").await.unwrap();
    let ledger = api.student_ledger(&caps, "s1").await.unwrap();

    assert_eq!(ledger.summary.balance.to_bits(), balance.to_bits());
    assert_eq!(
        ledger.entries.last().unwrap().balance_after.to_bits(),
        balance.to_bits()
    );
}

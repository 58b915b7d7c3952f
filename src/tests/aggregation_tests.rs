use super::*;
use crate::storage::Storage;
use crate::error::TagbookError;
use crate::models::{DocChange, Group};

fn assert_summary_consistent(group: &Group) {
    let user_sum: f64 = group.total.per_user.values().map(|l| l.expense).sum();
    assert!((group.total.across_users.expense - user_sum).abs() < 1e-9);

    let month_sum: f64 = group
        .month_wise_total
        .values()
        .map(|s| s.across_users.expense)
        .sum();
    assert!((group.total.across_users.expense - month_sum).abs() < 1e-9);
}

#[tokio::test]
async fn expense_create_updates_all_four_scopes() {
    let service = create_test_service();
    seed_group(&service, "g1", "owner", true).await;

    let e = expense("e1", "owner", 200.0, Some(50.0), ts(2024, 3, 10));
    service
        .on_expense_written("g1", "e1", DocChange::created(e))
        .await
        .unwrap();

    let group = service.storage().get_group("g1").await.unwrap().unwrap();
    assert_eq!(group.total.across_users.expense, 200.0);
    assert_eq!(group.total.across_users.recovery, 50.0);
    assert_eq!(group.total.user("owner").expense, 200.0);
    assert_eq!(group.total.user("owner").recovery, 50.0);
    let march = group.month("2024-03");
    assert_eq!(march.across_users.expense, 200.0);
    assert_eq!(march.across_users.recovery, 50.0);
    assert_eq!(march.user("owner").expense, 200.0);
    assert_summary_consistent(&group);
}

#[tokio::test]
async fn create_then_delete_restores_every_field() {
    let service = create_test_service();
    seed_group(&service, "g1", "owner", true).await;

    let e = expense("e1", "owner", 200.0, Some(50.0), ts(2024, 3, 10));
    service
        .on_expense_written("g1", "e1", DocChange::created(e.clone()))
        .await
        .unwrap();
    service
        .on_expense_written("g1", "e1", DocChange::deleted(e))
        .await
        .unwrap();

    let group = service.storage().get_group("g1").await.unwrap().unwrap();
    assert_eq!(group.total.across_users.expense, 0.0);
    assert_eq!(group.total.across_users.recovery, 0.0);
    assert_eq!(group.total.user("owner").expense, 0.0);
    let march = group.month("2024-03");
    assert_eq!(march.across_users.expense, 0.0);
    assert_eq!(march.user("owner").recovery, 0.0);
}

#[tokio::test]
async fn cross_month_edit_moves_contribution_between_buckets() {
    let service = create_test_service();
    seed_group(&service, "g1", "owner", false).await;

    let before = expense("e1", "owner", 100.0, None, ts(2024, 1, 15));
    service
        .on_expense_written("g1", "e1", DocChange::created(before.clone()))
        .await
        .unwrap();

    let mut after = before.clone();
    after.amount = 150.0;
    after.time_of_transaction = ts(2024, 2, 3);
    service
        .on_expense_written("g1", "e1", DocChange::updated(before, after))
        .await
        .unwrap();

    let group = service.storage().get_group("g1").await.unwrap().unwrap();
    assert_eq!(group.month("2024-01").across_users.expense, 0.0);
    assert_eq!(group.month("2024-02").across_users.expense, 150.0);
    assert_eq!(group.month("2024-02").user("owner").expense, 150.0);
    assert_eq!(group.total.across_users.expense, 150.0);
    assert_summary_consistent(&group);
}

#[tokio::test]
async fn recovery_ledger_never_written_when_disallowed() {
    let service = create_test_service();
    seed_group(&service, "g1", "owner", false).await;

    let e = expense("e1", "owner", 200.0, Some(50.0), ts(2024, 3, 10));
    service
        .on_expense_written("g1", "e1", DocChange::created(e.clone()))
        .await
        .unwrap();
    let mut edited = e.clone();
    edited.recovery_amount = Some(80.0);
    service
        .on_expense_written("g1", "e1", DocChange::updated(e, edited))
        .await
        .unwrap();

    let group = service.storage().get_group("g1").await.unwrap().unwrap();
    assert_eq!(group.total.across_users.recovery, 0.0);
    assert_eq!(group.total.user("owner").recovery, 0.0);
    assert_eq!(group.month("2024-03").across_users.recovery, 0.0);
}

#[tokio::test]
async fn settlement_moves_payer_expense_and_recipient_recovery() {
    let service = create_test_service();
    seed_group(&service, "g1", "payer", true).await;

    let s = settlement("s1", "g1", "payer", "recipient", 80.0, 2024, 4);
    service
        .on_settlement_written("g1", "s1", DocChange::created(s))
        .await
        .unwrap();

    let group = service.storage().get_group("g1").await.unwrap().unwrap();
    assert_eq!(group.total.user("payer").expense, 80.0);
    assert_eq!(group.total.user("recipient").recovery, -80.0);
    assert_eq!(group.total.across_users.expense, 80.0);
    assert_eq!(group.total.across_users.recovery, -80.0);
    let april = group.month("2024-04");
    assert_eq!(april.user("payer").expense, 80.0);
    assert_eq!(april.user("recipient").recovery, -80.0);
}

#[tokio::test]
async fn settlement_delete_reverses_creation() {
    let service = create_test_service();
    seed_group(&service, "g1", "payer", true).await;

    let s = settlement("s1", "g1", "payer", "recipient", 80.0, 2024, 4);
    service
        .on_settlement_written("g1", "s1", DocChange::created(s.clone()))
        .await
        .unwrap();
    service
        .on_settlement_written("g1", "s1", DocChange::deleted(s))
        .await
        .unwrap();

    let group = service.storage().get_group("g1").await.unwrap().unwrap();
    assert_eq!(group.total.across_users.expense, 0.0);
    assert_eq!(group.total.across_users.recovery, 0.0);
    assert_eq!(group.total.user("payer").expense, 0.0);
    assert_eq!(group.total.user("recipient").recovery, 0.0);
}

#[tokio::test]
async fn settlement_period_edit_rebuckets_full_amounts() {
    let service = create_test_service();
    seed_group(&service, "g1", "payer", true).await;

    let before = settlement("s1", "g1", "payer", "recipient", 80.0, 2024, 4);
    service
        .on_settlement_written("g1", "s1", DocChange::created(before.clone()))
        .await
        .unwrap();
    let mut after = before.clone();
    after.amount = 100.0;
    after.month = 5;
    service
        .on_settlement_written("g1", "s1", DocChange::updated(before, after))
        .await
        .unwrap();

    let group = service.storage().get_group("g1").await.unwrap().unwrap();
    assert_eq!(group.month("2024-04").across_users.expense, 0.0);
    assert_eq!(group.month("2024-05").across_users.expense, 100.0);
    assert_eq!(group.month("2024-05").user("recipient").recovery, -100.0);
    assert_eq!(group.total.across_users.expense, 100.0);
}

#[tokio::test]
async fn missing_group_is_fatal() {
    let service = create_test_service();
    let e = expense("e1", "owner", 10.0, None, ts(2024, 1, 1));
    let result = service
        .on_expense_written("nope", "e1", DocChange::created(e))
        .await;
    assert!(matches!(result, Err(TagbookError::GroupNotFound(_))));
}

#[tokio::test]
async fn concurrent_creates_on_same_group_lose_no_increment() {
    let service = std::sync::Arc::new(create_test_service());
    seed_group(&service, "g1", "owner", false).await;

    let mut handles = Vec::new();
    for i in 0..20 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let e = expense(&format!("e{i}"), "owner", 10.0, None, ts(2024, 6, 1));
            service
                .on_expense_written("g1", &format!("e{i}"), DocChange::created(e))
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let group = service.storage().get_group("g1").await.unwrap().unwrap();
    assert_eq!(group.total.across_users.expense, 200.0);
    assert_eq!(group.month("2024-06").across_users.expense, 200.0);
    assert_summary_consistent(&group);
}

use super::*;
use crate::storage::Storage;
use crate::models::Friend;

fn friend(id: &str, phone: Option<&str>) -> Friend {
    Friend {
        id: id.to_string(),
        phone_number: phone.map(String::from),
        resolved_user_id: None,
        updated_at: None,
    }
}

#[tokio::test]
async fn resolves_to_existing_user_by_phone() {
    let service = create_test_service();
    let existing = seed_user(&service, "u1", "+911234567890", None).await;
    service
        .storage()
        .save_friend("owner", friend("f1", Some("+911234567890")))
        .await
        .unwrap();

    let resolved = service.resolve_friend("owner", "f1", None).await.unwrap();
    assert_eq!(resolved.as_deref(), Some(existing.id.as_str()));

    let cached = service.storage().get_friend("owner", "f1").await.unwrap().unwrap();
    assert_eq!(cached.resolved_user_id.as_deref(), Some("u1"));
    assert!(cached.updated_at.is_some());
}

#[tokio::test]
async fn provisions_user_for_unknown_phone() {
    let service = create_test_service();
    service
        .storage()
        .save_friend("owner", friend("f1", Some("+919999999999")))
        .await
        .unwrap();

    let resolved = service.resolve_friend("owner", "f1", None).await.unwrap().unwrap();

    let user = service.storage().get_user(&resolved).await.unwrap().unwrap();
    assert_eq!(user.phone, "+919999999999");
    assert!(user.accessible_tag_ids.is_empty());
    assert!(user.unseen_expense_ids.is_empty());
}

#[tokio::test]
async fn re_resolution_is_idempotent_with_zero_writes() {
    let service = create_test_service();
    service
        .storage()
        .save_friend("owner", friend("f1", Some("+917777777777")))
        .await
        .unwrap();

    let first = service.resolve_friend("owner", "f1", None).await.unwrap();
    let writes_after_first = service.storage().write_ops();

    let second = service.resolve_friend("owner", "f1", None).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(service.storage().write_ops(), writes_after_first);
}

#[tokio::test]
async fn friend_without_phone_is_skipped() {
    let service = create_test_service();
    service
        .storage()
        .save_friend("owner", friend("f1", None))
        .await
        .unwrap();

    let resolved = service.resolve_friend("owner", "f1", None).await.unwrap();
    assert_eq!(resolved, None);
}

#[tokio::test]
async fn missing_friend_record_is_skipped() {
    let service = create_test_service();
    let resolved = service.resolve_friend("owner", "ghost", None).await.unwrap();
    assert_eq!(resolved, None);
}

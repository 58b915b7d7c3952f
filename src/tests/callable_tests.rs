use super::*;
use crate::storage::Storage;
use crate::error::{ErrorCode, TagbookError};
use crate::service::AuthContext;

fn auth(uid: &str, phone: &str) -> AuthContext {
    AuthContext {
        uid: uid.to_string(),
        phone_number: Some(phone.to_string()),
    }
}

#[tokio::test]
async fn empty_phone_is_rejected() {
    let service = create_test_service();
    let result = service.get_user_by_phone(&auth("uid-1", ""), "").await;
    match result {
        Err(TagbookError::InvalidArgument(_)) => {}
        other => panic!("expected invalid-argument, got {other:?}"),
    }
}

#[tokio::test]
async fn caller_cannot_resolve_someone_elses_phone() {
    let service = create_test_service();
    seed_user(&service, "bob", "+912222222222", None).await;

    let result = service
        .get_user_by_phone(&auth("uid-1", "+911111111111"), "+912222222222")
        .await;
    match result {
        Err(e @ TagbookError::PermissionDenied(_)) => {
            assert_eq!(e.code(), ErrorCode::PermissionDenied);
        }
        other => panic!("expected permission-denied, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_auth_phone_is_denied() {
    let service = create_test_service();
    let no_phone = AuthContext { uid: "uid-1".to_string(), phone_number: None };
    let result = service.get_user_by_phone(&no_phone, "+911111111111").await;
    assert!(matches!(result, Err(TagbookError::PermissionDenied(_))));
}

#[tokio::test]
async fn first_contact_provisions_a_linked_user() {
    let service = create_test_service();
    let user = service
        .get_user_by_phone(&auth("uid-1", "+911111111111"), "+911111111111")
        .await
        .unwrap();

    assert_eq!(user.phone, "+911111111111");
    assert_eq!(user.uid.as_deref(), Some("uid-1"));
    assert!(user.accessible_tag_ids.is_empty());
    assert!(user.unseen_expense_ids.is_empty());

    let stored = service.storage().get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(stored.uid.as_deref(), Some("uid-1"));
}

#[tokio::test]
async fn existing_user_is_adopted_not_duplicated() {
    let service = create_test_service();
    // provisioned earlier via friend resolution, before the user ever
    // signed in themselves
    let seeded = seed_user(&service, "alice", "+911111111111", None).await;
    assert!(seeded.uid.is_none());

    let user = service
        .get_user_by_phone(&auth("uid-1", "+911111111111"), "+911111111111")
        .await
        .unwrap();
    assert_eq!(user.id, "alice");
    assert_eq!(user.uid.as_deref(), Some("uid-1"));

    // repeat sign-in from a new device relinks the same record
    let again = service
        .get_user_by_phone(&auth("uid-2", "+911111111111"), "+911111111111")
        .await
        .unwrap();
    assert_eq!(again.id, "alice");
    assert_eq!(again.uid.as_deref(), Some("uid-2"));
}

#[test]
fn error_codes_map_to_the_wire_vocabulary() {
    assert_eq!(
        TagbookError::Unauthenticated("no token".to_string()).code(),
        ErrorCode::Unauthenticated
    );
    assert_eq!(
        TagbookError::GroupNotFound("g".to_string()).code(),
        ErrorCode::NotFound
    );
    assert_eq!(
        TagbookError::Internal("boom".to_string()).code(),
        ErrorCode::Internal
    );
}

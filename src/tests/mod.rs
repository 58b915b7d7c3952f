mod aggregation_tests;
mod callable_tests;
mod identity_tests;

use chrono::{DateTime, TimeZone, Utc};

use crate::models::{Expense, Group, Settlement, User};
use crate::notify::in_memory::InMemoryNotifier;
use crate::ocr::in_memory::InMemoryExtractor;
use crate::service::TagbookService;
use crate::storage::Storage;
use crate::storage::in_memory::InMemoryStorage;

pub type TestService = TagbookService<InMemoryStorage, InMemoryNotifier, InMemoryExtractor>;

pub fn create_test_service() -> TestService {
    TagbookService::new(
        InMemoryStorage::new(),
        InMemoryNotifier::new(),
        InMemoryExtractor::new(),
    )
}

pub fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

pub async fn seed_group(service: &TestService, id: &str, owner_id: &str, allow_recovery: bool) -> Group {
    let mut group = Group::new(id.to_string(), format!("{id} name"), owner_id.to_string());
    group.allow_recovery = allow_recovery;
    service.storage().save_group(group.clone()).await.unwrap();
    group
}

pub async fn seed_user(service: &TestService, id: &str, phone: &str, token: Option<&str>) -> User {
    let mut user = User::new(id.to_string(), phone.to_string());
    user.fcm_token = token.map(String::from);
    service.storage().create_user(user.clone()).await.unwrap();
    user
}

pub fn expense(id: &str, owner_id: &str, amount: f64, recovery: Option<f64>, time: DateTime<Utc>) -> Expense {
    Expense {
        id: id.to_string(),
        owner_id: owner_id.to_string(),
        to: "Chai Point".to_string(),
        amount,
        recovery_amount: recovery,
        time_of_transaction: time,
        created_at: time,
        updated_at: time,
        notes: None,
        receipt_url: None,
        tx_id: format!("{owner_id}:{id}"),
        tag_ids: Vec::new(),
        settlements: Vec::new(),
    }
}

pub fn settlement(id: &str, tag_id: &str, payer: &str, recipient: &str, amount: f64, year: i32, month: u32) -> Settlement {
    let time = ts(year, month, 5);
    Settlement {
        id: id.to_string(),
        tag_id: tag_id.to_string(),
        owner_id: payer.to_string(),
        to: recipient.to_string(),
        amount,
        month,
        year,
        created_at: time,
        updated_at: time,
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical user record, keyed by phone number at creation time.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub phone: String,
    /// Authentication uid, linked once the user signs in themselves.
    #[serde(default)]
    pub uid: Option<String>,
    /// Denormalized list of groups this user can read. The membership
    /// synchronizer is the sole writer of this field.
    #[serde(default)]
    pub accessible_tag_ids: Vec<String>,
    #[serde(default)]
    pub unseen_expense_ids: Vec<String>,
    /// Push notification address; absent means the user never registered a
    /// device or the token was cleared after a delivery failure.
    #[serde(default)]
    pub fcm_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: String, phone: String) -> Self {
        User {
            id,
            phone,
            uid: None,
            accessible_tag_ids: Vec::new(),
            unseen_expense_ids: Vec::new(),
            fcm_token: None,
            created_at: Utc::now(),
        }
    }
}

/// Owner-local reference to a person who may or may not have a canonical
/// account yet. `resolved_user_id` is a write-once cache filled by the
/// identity resolver.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    pub id: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub resolved_user_id: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// One `{expense, recovery}` pair, tracked per scope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    pub expense: f64,
    #[serde(default)]
    pub recovery: f64,
}

/// Aggregate view for one scope (lifetime or one month). `across_users` is
/// kept equal to the sum of the per-user ledgers by always issuing both
/// increments inside the same atomic write.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MonetarySummary {
    #[serde(rename = "acrossUsers", default)]
    pub across_users: Ledger,
    #[serde(flatten)]
    pub per_user: HashMap<String, Ledger>,
}

impl MonetarySummary {
    pub fn user(&self, user_id: &str) -> Ledger {
        self.per_user.get(user_id).copied().unwrap_or_default()
    }
}

/// A shared-expense group ("tag"). `shared_with_friends` is the owner-local
/// source of truth for membership edits; `shared_with` holds the resolved
/// canonical user ids.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    #[serde(default)]
    pub shared_with: Vec<String>,
    #[serde(default)]
    pub shared_with_friends: Vec<String>,
    #[serde(default)]
    pub allow_recovery: bool,
    #[serde(default)]
    pub is_recovery: bool,
    #[serde(default)]
    pub total: MonetarySummary,
    #[serde(default)]
    pub month_wise_total: BTreeMap<String, MonetarySummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    pub fn new(id: String, name: String, owner_id: String) -> Self {
        let now = Utc::now();
        Group {
            id,
            name,
            owner_id,
            shared_with: Vec::new(),
            shared_with_friends: Vec::new(),
            allow_recovery: false,
            is_recovery: false,
            total: MonetarySummary::default(),
            month_wise_total: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn month(&self, key: &str) -> MonetarySummary {
        self.month_wise_total.get(key).cloned().unwrap_or_default()
    }
}

/// Month bucket key, always zero-padded `"YYYY-MM"`.
pub fn month_key(ts: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", ts.year(), ts.month())
}

pub fn period_month_key(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

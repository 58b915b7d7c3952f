use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::settlement::SettlementRef;

/// An expense recorded under a group, mirrored under its owner. The mirror
/// copy carries `tag_ids` and `settlements` so a user's history can be read
/// without joins; the membership synchronizer keeps those references clean.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub owner_id: String,
    /// Payee, as extracted or typed by the user.
    pub to: String,
    pub amount: f64,
    /// Only meaningful when the owning group has `allow_recovery` set.
    #[serde(default)]
    pub recovery_amount: Option<f64>,
    /// Determines the month bucket the amount lands in.
    pub time_of_transaction: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub receipt_url: Option<String>,
    /// Derived dedup key.
    pub tx_id: String,
    #[serde(default)]
    pub tag_ids: Vec<String>,
    #[serde(default)]
    pub settlements: Vec<SettlementRef>,
}

impl Expense {
    pub fn recovery(&self) -> f64 {
        self.recovery_amount.unwrap_or(0.0)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::group::period_month_key;

/// A payment from `owner_id` to `to` against a group's outstanding recovery
/// balance, recorded for a given accounting period. Increases the payer's
/// expense ledger and decreases the recipient's recovery ledger by the same
/// magnitude.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub id: String,
    pub tag_id: String,
    pub owner_id: String,
    /// Recipient of the payment.
    pub to: String,
    pub amount: f64,
    pub month: u32,
    pub year: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Settlement {
    pub fn month_key(&self) -> String {
        period_month_key(self.year, self.month)
    }
}

/// Reference to a settlement kept on a user's mirrored expense record.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRef {
    pub tag_id: String,
    pub to: String,
    pub amount: f64,
    pub month: u32,
    pub year: i32,
}

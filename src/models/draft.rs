use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Staging states of a draft expense. `ReadyForReview` drafts either get
/// promoted (and deleted) or completed by the user; there is no terminal
/// state stored on the document itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftStatus {
    UploadingReceipt,
    ExtractingData,
    ReadyForReview,
}

/// Settlement to create alongside the expense when the draft is promoted.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementInstruction {
    pub tag_id: String,
    pub to: String,
    pub amount: f64,
}

/// An in-progress expense awaiting receipt extraction and review, scoped
/// under its owner.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftExpense {
    pub id: String,
    pub owner_id: String,
    pub status: DraftStatus,
    #[serde(default)]
    pub receipt_url: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub time_of_transaction: Option<DateTime<Utc>>,
    /// Groups the finalized expense should land in.
    #[serde(default)]
    pub tag_ids: Vec<String>,
    #[serde(default)]
    pub settlements: Vec<SettlementInstruction>,
    /// Only user-facing surfacing of an extraction failure.
    #[serde(default)]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DraftExpense {
    pub fn new(id: String, owner_id: String) -> Self {
        let now = Utc::now();
        DraftExpense {
            id,
            owner_id,
            status: DraftStatus::UploadingReceipt,
            receipt_url: None,
            to: None,
            amount: None,
            time_of_transaction: None,
            tag_ids: Vec::new(),
            settlements: Vec::new(),
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// All fields required to promote without manual review.
    pub fn is_complete(&self) -> bool {
        self.to.is_some() && self.amount.is_some() && self.time_of_transaction.is_some()
    }

    pub fn in_flight(&self) -> bool {
        matches!(
            self.status,
            DraftStatus::UploadingReceipt | DraftStatus::ExtractingData
        )
    }
}

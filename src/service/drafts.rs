use std::collections::HashMap;

use chrono::{Datelike, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::constants::{DRAFT_STATUS_UPDATE, DRAFTS_READY};
use crate::error::TagbookError;
use crate::models::settlement::SettlementRef;
use crate::models::{DocChange, DraftExpense, DraftStatus, Expense, Settlement};
use crate::notify::{Message, Notifier, NotificationBody};
use crate::ocr::ReceiptExtractor;
use crate::storage::Storage;

use super::TagbookService;

impl<S: Storage, N: Notifier, X: ReceiptExtractor> TagbookService<S, N, X> {
    /// Reaction to a draft-expense update: runs the staging state machine.
    ///
    /// A newly attached receipt URL moves the draft into `extractingData`
    /// and invokes the OCR collaborator. Extraction failure records the
    /// error and returns the draft to `uploadingReceipt`; a complete
    /// extraction promotes the draft directly; a partial one parks it in
    /// `readyForReview` for the user.
    pub async fn on_draft_updated(
        &self,
        change: DocChange<DraftExpense>,
    ) -> Result<(), TagbookError> {
        let (Some(before), Some(after)) = (&change.before, &change.after) else {
            return Ok(());
        };

        // Every status change syncs the owner's device silently
        if before.status != after.status {
            self.notify_draft_status(after, status_label(after.status)).await;
        }

        let receipt_added = before.receipt_url.is_none() && after.receipt_url.is_some();
        if !receipt_added {
            return Ok(());
        }
        let receipt_url = after.receipt_url.clone().unwrap_or_default();

        let mut draft = after.clone();
        draft.status = DraftStatus::ExtractingData;
        draft.updated_at = Utc::now();
        self.storage.save_draft(draft.clone()).await?;
        self.notify_draft_status(&draft, status_label(DraftStatus::ExtractingData))
            .await;

        info!(draft_id = %draft.id, "starting receipt extraction");
        let fields = match self.extractor.extract(&receipt_url).await {
            Ok(fields) if !fields.is_empty() => fields,
            Ok(_) => {
                return self
                    .fail_draft(draft, "Failed to extract data from receipt")
                    .await;
            }
            Err(e) => {
                warn!(draft_id = %draft.id, error = %e, "receipt extraction failed");
                return self
                    .fail_draft(draft, &format!("Receipt processing failed: {e}"))
                    .await;
            }
        };

        if let Some(to) = fields.to {
            draft.to = Some(to);
        }
        if let Some(amount) = fields.amount {
            draft.amount = Some(amount);
        }
        if let Some(ts) = fields.time_of_transaction {
            draft.time_of_transaction = Some(ts);
        }
        draft.error_message = None;
        draft.updated_at = Utc::now();

        if draft.is_complete() && !draft.tag_ids.is_empty() {
            // All required fields resolved: no manual review needed
            self.promote_draft(draft).await?;
        } else {
            draft.status = DraftStatus::ReadyForReview;
            self.storage.save_draft(draft.clone()).await?;
            self.notify_draft_status(&draft, status_label(DraftStatus::ReadyForReview))
                .await;
        }

        self.notify_if_all_drafts_ready(&after.owner_id).await;
        Ok(())
    }

    async fn fail_draft(&self, mut draft: DraftExpense, message: &str) -> Result<(), TagbookError> {
        draft.status = DraftStatus::UploadingReceipt;
        draft.error_message = Some(message.to_string());
        draft.updated_at = Utc::now();
        self.storage.save_draft(draft.clone()).await?;
        self.notify_draft_status(&draft, "error").await;
        Ok(())
    }

    /// Constructs the canonical expense and declared settlements, commits
    /// them with the draft deletion in one batch, then runs aggregation and
    /// fan-out exactly as if the documents had been created directly.
    async fn promote_draft(&self, draft: DraftExpense) -> Result<(), TagbookError> {
        let now = Utc::now();
        let time_of_transaction = draft
            .time_of_transaction
            .ok_or_else(|| TagbookError::Internal("promoting incomplete draft".to_string()))?;
        let expense_id = Uuid::new_v4().to_string();

        let settlements: Vec<(String, Settlement)> = draft
            .settlements
            .iter()
            .map(|instruction| {
                (
                    instruction.tag_id.clone(),
                    Settlement {
                        id: Uuid::new_v4().to_string(),
                        tag_id: instruction.tag_id.clone(),
                        owner_id: draft.owner_id.clone(),
                        to: instruction.to.clone(),
                        amount: instruction.amount,
                        month: time_of_transaction.month(),
                        year: time_of_transaction.year(),
                        created_at: now,
                        updated_at: now,
                    },
                )
            })
            .collect();

        let expense = Expense {
            id: expense_id.clone(),
            owner_id: draft.owner_id.clone(),
            to: draft.to.clone().unwrap_or_default(),
            amount: draft.amount.unwrap_or_default(),
            recovery_amount: None,
            time_of_transaction,
            created_at: now,
            updated_at: now,
            notes: None,
            receipt_url: draft.receipt_url.clone(),
            tx_id: format!("{}:{}", draft.owner_id, expense_id),
            tag_ids: draft.tag_ids.clone(),
            settlements: settlements
                .iter()
                .map(|(_, s)| SettlementRef {
                    tag_id: s.tag_id.clone(),
                    to: s.to.clone(),
                    amount: s.amount,
                    month: s.month,
                    year: s.year,
                })
                .collect(),
        };

        let expenses: Vec<(String, Expense)> = draft
            .tag_ids
            .iter()
            .map(|tag_id| (tag_id.clone(), expense.clone()))
            .collect();

        self.storage
            .commit_promotion(&draft.owner_id, &draft.id, expenses.clone(), settlements.clone())
            .await?;
        info!(
            draft_id = %draft.id,
            expense_id = %expense_id,
            groups = expenses.len(),
            settlements = settlements.len(),
            "draft promoted"
        );

        for (group_id, expense) in expenses {
            let id = expense.id.clone();
            self.on_expense_written(&group_id, &id, DocChange::created(expense))
                .await?;
        }
        for (group_id, settlement) in settlements {
            let id = settlement.id.clone();
            self.on_settlement_written(&group_id, &id, DocChange::created(settlement))
                .await?;
        }
        Ok(())
    }

    async fn notify_draft_status(&self, draft: &DraftExpense, status: &str) {
        let token = match self.storage.get_user(&draft.owner_id).await {
            Ok(Some(user)) => user.fcm_token,
            Ok(None) => None,
            Err(e) => {
                warn!(owner_id = %draft.owner_id, error = %e, "owner lookup failed for draft sync");
                None
            }
        };
        let Some(token) = token else { return };

        let message = Message::data_only(HashMap::from([
            ("type".to_string(), DRAFT_STATUS_UPDATE.to_string()),
            ("draftId".to_string(), draft.id.clone()),
            ("status".to_string(), status.to_string()),
        ]));
        if let Err(e) = self.notifier.send(&token, message).await {
            warn!(draft_id = %draft.id, error = %e, "draft status sync failed");
        }
    }

    /// Notifies the owner once when no drafts remain in flight and at least
    /// one awaits review.
    async fn notify_if_all_drafts_ready(&self, owner_id: &str) {
        let drafts = match self.storage.list_drafts(owner_id).await {
            Ok(drafts) => drafts,
            Err(e) => {
                warn!(owner_id, error = %e, "draft listing failed for all-ready check");
                return;
            }
        };
        let ready = drafts
            .iter()
            .filter(|d| d.status == DraftStatus::ReadyForReview)
            .count();
        let in_flight = drafts.iter().filter(|d| d.in_flight()).count();
        if ready == 0 || in_flight > 0 {
            return;
        }

        let token = match self.storage.get_user(owner_id).await {
            Ok(Some(user)) => user.fcm_token,
            _ => None,
        };
        let Some(token) = token else { return };

        let body = if ready == 1 {
            "1 expense is ready for your review".to_string()
        } else {
            format!("{ready} expenses are ready for your review")
        };
        let message = Message {
            data: HashMap::from([
                ("type".to_string(), DRAFTS_READY.to_string()),
                ("count".to_string(), ready.to_string()),
            ]),
            notification: Some(NotificationBody {
                title: "Receipts Ready for Review".to_string(),
                body,
            }),
            collapse_key: None,
        };
        if let Err(e) = self.notifier.send(&token, message).await {
            warn!(owner_id, error = %e, "all-ready notification failed");
        }
    }
}

fn status_label(status: DraftStatus) -> &'static str {
    match status {
        DraftStatus::UploadingReceipt => "uploadingReceipt",
        DraftStatus::ExtractingData => "extractingData",
        DraftStatus::ReadyForReview => "readyForReview",
    }
}

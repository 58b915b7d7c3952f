use std::collections::HashMap;

use serde_json::json;
use tracing::{info, warn};

use crate::constants::TAG_SHARED;
use crate::models::{ChangeKind, Expense, Group, Settlement};
use crate::notify::{Message, Notifier, NotificationBody};
use crate::ocr::ReceiptExtractor;
use crate::storage::Storage;

use super::TagbookService;

/// Recipient tokens for one group event, split between the acting user and
/// everyone else.
struct GroupTokens {
    actor_token: Option<String>,
    other_tokens: Vec<String>,
}

impl<S: Storage, N: Notifier, X: ReceiptExtractor> TagbookService<S, N, X> {
    pub(super) async fn notify_expense_event(
        &self,
        group: &Group,
        expense_id: &str,
        event_type: &str,
        expense: &Expense,
        kind: ChangeKind,
    ) {
        let mut data = HashMap::from([
            ("type".to_string(), event_type.to_string()),
            ("tagId".to_string(), group.id.clone()),
            ("expenseId".to_string(), expense_id.to_string()),
        ]);
        // Nothing to show for a deletion
        if kind != ChangeKind::Deleted {
            data.insert("expense".to_string(), expense_snapshot(expense_id, expense));
        }

        let body = format!("{event_type} - ₹{} to {}", expense.amount, expense.to);
        self.notify_group(group, &expense.owner_id, event_type, data, body)
            .await;
    }

    pub(super) async fn notify_settlement_event(
        &self,
        group: &Group,
        settlement_id: &str,
        event_type: &str,
        settlement: &Settlement,
        kind: ChangeKind,
    ) {
        let mut data = HashMap::from([
            ("type".to_string(), event_type.to_string()),
            ("tagId".to_string(), group.id.clone()),
            ("settlementId".to_string(), settlement_id.to_string()),
        ]);
        if kind != ChangeKind::Deleted {
            data.insert(
                "settlement".to_string(),
                json!({
                    "id": settlement_id,
                    "to": settlement.to,
                    "amount": settlement.amount.to_string(),
                    "month": settlement.month,
                    "year": settlement.year,
                    "updatedAt": settlement.updated_at.to_rfc3339(),
                })
                .to_string(),
            );
        }

        let body = format!("{event_type} - ₹{} to {}", settlement.amount, settlement.to);
        self.notify_group(group, &settlement.owner_id, event_type, data, body)
            .await;
    }

    /// Best-effort fan-out of one group event. The actor's device gets a
    /// silent data-only sync; every other member with a token gets a
    /// user-visible notification collapsed per group. Failures are logged,
    /// never propagated; tokens that hard-fail registration are cleared
    /// lazily.
    async fn notify_group(
        &self,
        group: &Group,
        actor_id: &str,
        event_type: &str,
        data: HashMap<String, String>,
        body: String,
    ) {
        let tokens = match self.group_tokens(group, actor_id).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(group_id = %group.id, error = %e, "token lookup failed, skipping fan-out");
                return;
            }
        };

        if let Some(actor_token) = &tokens.actor_token {
            if let Err(e) = self
                .notifier
                .send(actor_token, Message::data_only(data.clone()))
                .await
            {
                warn!(error = %e, "silent sync to actor failed");
            }
        }

        if tokens.other_tokens.is_empty() {
            return;
        }

        let message = Message {
            data,
            notification: Some(NotificationBody {
                title: group.name.clone(),
                body,
            }),
            collapse_key: Some(format!("tag_{}", group.id)),
        };
        let outcome = self.notifier.send_multicast(&tokens.other_tokens, message).await;
        info!(
            event_type,
            group_id = %group.id,
            sent = outcome.success_count,
            failed = outcome.failures.len(),
            "fan-out complete"
        );

        for token in outcome.stale_tokens() {
            if let Err(e) = self.storage.clear_push_token(token).await {
                warn!(error = %e, "failed to clear stale token");
            }
        }
    }

    async fn group_tokens(
        &self,
        group: &Group,
        actor_id: &str,
    ) -> Result<GroupTokens, crate::error::TagbookError> {
        let mut recipients: Vec<&str> = vec![group.owner_id.as_str()];
        for id in &group.shared_with {
            if !id.trim().is_empty() && !recipients.contains(&id.as_str()) {
                recipients.push(id);
            }
        }

        let mut actor_token = None;
        let mut other_tokens = Vec::new();
        for user_id in recipients {
            let Some(user) = self.storage.get_user(user_id).await? else {
                continue;
            };
            let Some(token) = user.fcm_token else { continue };
            if user_id == actor_id {
                actor_token = Some(token);
            } else {
                other_tokens.push(token);
            }
        }
        Ok(GroupTokens { actor_token, other_tokens })
    }

    /// Single-recipient membership-change notification.
    pub(super) async fn notify_membership_change(
        &self,
        user_id: &str,
        group_id: &str,
        group_name: &str,
        change_type: &str,
    ) {
        let user = match self.storage.get_user(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(e) => {
                warn!(user_id, error = %e, "user lookup failed for membership notification");
                return;
            }
        };
        let Some(token) = user.fcm_token else { return };

        let (title, body) = if change_type == TAG_SHARED {
            (
                "New tag shared with you".to_string(),
                format!("{group_name} has been shared with you"),
            )
        } else {
            (
                "Tag access removed".to_string(),
                format!("You no longer have access to {group_name}"),
            )
        };

        let message = Message {
            data: HashMap::from([
                ("type".to_string(), change_type.to_string()),
                ("tagId".to_string(), group_id.to_string()),
                ("tagName".to_string(), group_name.to_string()),
            ]),
            notification: Some(NotificationBody { title, body }),
            collapse_key: None,
        };
        if let Err(e) = self.notifier.send(&token, message).await {
            warn!(user_id, error = %e, "membership notification failed");
        }
    }
}

fn expense_snapshot(expense_id: &str, expense: &Expense) -> String {
    json!({
        "id": expense_id,
        "to": expense.to,
        "amount": expense.amount.to_string(),
        "timeOfTransaction": expense.time_of_transaction.to_rfc3339(),
        "updatedAt": expense.updated_at.to_rfc3339(),
        "notes": expense.notes,
        "receiptUrl": expense.receipt_url,
    })
    .to_string()
}

use tracing::{debug, info};

use crate::aggregate::{expense_increments, settlement_increments};
use crate::constants::{
    EXPENSE_CREATED, EXPENSE_DELETED, EXPENSE_UPDATED, SETTLEMENT_CREATED, SETTLEMENT_DELETED,
    SETTLEMENT_UPDATED,
};
use crate::error::TagbookError;
use crate::models::{ChangeKind, DocChange, Expense, Group, Settlement};
use crate::notify::Notifier;
use crate::ocr::ReceiptExtractor;
use crate::storage::Storage;

use super::TagbookService;

impl<S: Storage, N: Notifier, X: ReceiptExtractor> TagbookService<S, N, X> {
    /// Reaction to a create/update/delete of an expense under a group.
    ///
    /// Reads the owning group (missing group is fatal; the event will keep
    /// failing until the group is restored), derives the increment set and
    /// applies it in one atomic write, then fans out notifications
    /// best-effort.
    pub async fn on_expense_written(
        &self,
        group_id: &str,
        expense_id: &str,
        change: DocChange<Expense>,
    ) -> Result<(), TagbookError> {
        let Some(kind) = change.kind() else {
            debug!(group_id, expense_id, "empty expense change, ignoring");
            return Ok(());
        };
        let group = self.aggregate_expense(group_id, &change).await?;

        let event_type = match kind {
            ChangeKind::Created => EXPENSE_CREATED,
            ChangeKind::Updated => EXPENSE_UPDATED,
            ChangeKind::Deleted => EXPENSE_DELETED,
        };
        let snapshot = change.latest();
        if let Some(expense) = snapshot {
            self.notify_expense_event(&group, expense_id, event_type, expense, kind)
                .await;
        }
        Ok(())
    }

    async fn aggregate_expense(
        &self,
        group_id: &str,
        change: &DocChange<Expense>,
    ) -> Result<Group, TagbookError> {
        let group = self
            .storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| TagbookError::GroupNotFound(group_id.to_string()))?;

        let increments = expense_increments(change, group.allow_recovery);
        if increments.is_empty() {
            debug!(group_id, "no aggregate change for expense event");
            return Ok(group);
        }
        self.storage
            .apply_group_increments(group_id, &increments)
            .await?;
        info!(
            group_id,
            fields = increments.len(),
            "applied expense aggregate increments"
        );
        Ok(group)
    }

    /// Reaction to a create/update/delete of a settlement under a group.
    pub async fn on_settlement_written(
        &self,
        group_id: &str,
        settlement_id: &str,
        change: DocChange<Settlement>,
    ) -> Result<(), TagbookError> {
        let Some(kind) = change.kind() else {
            debug!(group_id, settlement_id, "empty settlement change, ignoring");
            return Ok(());
        };
        let group = self
            .storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| TagbookError::GroupNotFound(group_id.to_string()))?;

        let increments = settlement_increments(&change, group.allow_recovery);
        if !increments.is_empty() {
            self.storage
                .apply_group_increments(group_id, &increments)
                .await?;
            info!(
                group_id,
                fields = increments.len(),
                "applied settlement aggregate increments"
            );
        }

        let event_type = match kind {
            ChangeKind::Created => SETTLEMENT_CREATED,
            ChangeKind::Updated => SETTLEMENT_UPDATED,
            ChangeKind::Deleted => SETTLEMENT_DELETED,
        };
        if let Some(settlement) = change.latest() {
            self.notify_settlement_event(&group, settlement_id, event_type, settlement, kind)
                .await;
        }
        Ok(())
    }
}

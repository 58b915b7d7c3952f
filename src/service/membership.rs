use std::collections::HashSet;

use tracing::{info, warn};

use crate::constants::{TAG_REMOVED, TAG_SHARED};
use crate::error::TagbookError;
use crate::models::Group;
use crate::notify::Notifier;
use crate::ocr::ReceiptExtractor;
use crate::storage::Storage;

use super::TagbookService;

fn friend_set(friends: &[String]) -> HashSet<&str> {
    friends
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect()
}

impl<S: Storage, N: Notifier, X: ReceiptExtractor> TagbookService<S, N, X> {
    /// Initial share-out of a freshly created group with pre-filled
    /// friend references.
    pub async fn on_group_created(&self, group: Group) -> Result<(), TagbookError> {
        if friend_set(&group.shared_with_friends).is_empty() {
            return Ok(());
        }
        let added: Vec<String> = group
            .shared_with_friends
            .iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();
        self.sync_membership(&group, added, Vec::new()).await
    }

    /// Reaction to a group update: diffs the owner-local friend list and
    /// propagates the change to the canonical member set, each affected
    /// user's denormalized records, and their devices.
    pub async fn on_group_updated(&self, before: Group, after: Group) -> Result<(), TagbookError> {
        let before_set = friend_set(&before.shared_with_friends);
        let after_set = friend_set(&after.shared_with_friends);
        // Cheap set-equality short-circuit, element-wise
        if before_set == after_set {
            return Ok(());
        }

        let added: Vec<String> = after_set
            .difference(&before_set)
            .map(|f| f.to_string())
            .collect();
        let removed: Vec<String> = before_set
            .difference(&after_set)
            .map(|f| f.to_string())
            .collect();
        self.sync_membership(&after, added, removed).await
    }

    /// Group deletion cascades reference cleanup to every resolved member.
    pub async fn on_group_deleted(&self, before: Group) -> Result<(), TagbookError> {
        for user_id in &before.shared_with {
            if user_id.trim().is_empty() {
                continue;
            }
            self.storage.purge_group_refs(user_id, &before.id).await?;
            self.notify_membership_change(user_id, &before.id, &before.name, TAG_REMOVED)
                .await;
        }
        info!(group_id = %before.id, members = before.shared_with.len(), "group deletion cleanup done");
        Ok(())
    }

    async fn sync_membership(
        &self,
        group: &Group,
        added_friends: Vec<String>,
        removed_friends: Vec<String>,
    ) -> Result<(), TagbookError> {
        let added_ids = self.resolve_all(&group.owner_id, &added_friends).await;
        let removed_ids = self.resolve_all(&group.owner_id, &removed_friends).await;

        // Recompute the canonical member set from the stored group so a
        // concurrent edit's additions are not clobbered blindly. Still a
        // whole-value write; see the known limitation on set_shared_with.
        let current = self
            .storage
            .get_group(&group.id)
            .await?
            .ok_or_else(|| TagbookError::GroupNotFound(group.id.clone()))?;

        let mut shared_with: Vec<String> = current
            .shared_with
            .into_iter()
            .filter(|id| !removed_ids.contains(id))
            .collect();
        for id in &added_ids {
            if !shared_with.contains(id) {
                shared_with.push(id.clone());
            }
        }
        self.storage.set_shared_with(&group.id, shared_with).await?;

        for user_id in &added_ids {
            self.storage.add_accessible_group(user_id, &group.id).await?;
            self.notify_membership_change(user_id, &group.id, &group.name, TAG_SHARED)
                .await;
        }
        for user_id in &removed_ids {
            // Purge first so the user's history is clean before their
            // device reacts to the notification
            self.storage.purge_group_refs(user_id, &group.id).await?;
            self.notify_membership_change(user_id, &group.id, &group.name, TAG_REMOVED)
                .await;
        }

        info!(
            group_id = %group.id,
            added = added_ids.len(),
            removed = removed_ids.len(),
            "membership synchronized"
        );
        Ok(())
    }

    /// Resolves friend references sequentially; entries that cannot be
    /// resolved are skipped, one bad reference never aborts the batch.
    async fn resolve_all(&self, owner_id: &str, friend_ids: &[String]) -> Vec<String> {
        let mut user_ids = Vec::new();
        for friend_id in friend_ids {
            match self.resolve_friend(owner_id, friend_id, None).await {
                Ok(Some(user_id)) => user_ids.push(user_id),
                Ok(None) => {}
                Err(e) => {
                    warn!(friend_id, error = %e, "friend resolution failed, skipping");
                }
            }
        }
        user_ids
    }
}

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::TagbookError;
use crate::models::{Friend, User};
use crate::notify::Notifier;
use crate::ocr::ReceiptExtractor;
use crate::storage::Storage;

use super::TagbookService;

impl<S: Storage, N: Notifier, X: ReceiptExtractor> TagbookService<S, N, X> {
    /// Resolves an owner-local friend reference to a canonical user id,
    /// lazily creating the user when the phone number is unknown.
    ///
    /// Resolution is monotonic: once cached on the friend record it is never
    /// overwritten, and re-resolving performs no writes. A friend without a
    /// phone number cannot be resolved and yields `None`, which callers skip
    /// without failing their batch.
    pub async fn resolve_friend(
        &self,
        owner_id: &str,
        friend_id: &str,
        friend_data: Option<Friend>,
    ) -> Result<Option<String>, TagbookError> {
        let friend = match friend_data {
            Some(friend) => friend,
            None => match self.storage.get_friend(owner_id, friend_id).await? {
                Some(friend) => friend,
                None => return Ok(None),
            },
        };

        if let Some(user_id) = &friend.resolved_user_id {
            debug!(friend_id, user_id, "friend already resolved");
            return Ok(Some(user_id.clone()));
        }

        let Some(phone) = friend.phone_number.clone().filter(|p| !p.is_empty()) else {
            debug!(friend_id, "no phone number on friend record, skipping");
            return Ok(None);
        };

        let user_id = match self.storage.find_user_by_phone(&phone).await? {
            Some(user) => {
                debug!(user_id = %user.id, "adopting existing user for phone");
                user.id
            }
            None => {
                let user = User::new(Uuid::new_v4().to_string(), phone);
                info!(user_id = %user.id, "provisioning user for unresolved friend");
                self.storage.create_user(user).await?.id
            }
        };

        // Write-once cache on the friend record
        let mut resolved = friend;
        resolved.resolved_user_id = Some(user_id.clone());
        resolved.updated_at = Some(Utc::now());
        self.storage.save_friend(owner_id, resolved).await?;

        Ok(Some(user_id))
    }
}

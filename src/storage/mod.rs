use async_trait::async_trait;

use crate::aggregate::FieldIncrement;
use crate::error::TagbookError;
use crate::models::{DraftExpense, Expense, Friend, Group, Settlement, User};

/// Document-store boundary.
///
/// The store provides point reads/writes by key, atomic multi-field numeric
/// increments on a single document, and bounded atomic batches. Numeric
/// aggregate state is only ever mutated through `apply_group_increments`;
/// `set_shared_with` is the one whole-value write of shared mutable state
/// and is known to lose concurrent membership edits.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn create_user(&self, user: User) -> Result<User, TagbookError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, TagbookError>;
    async fn update_user(&self, user: User) -> Result<(), TagbookError>;
    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<User>, TagbookError>;
    /// Idempotent set-union on the user's denormalized accessible-group list.
    async fn add_accessible_group(&self, user_id: &str, group_id: &str) -> Result<(), TagbookError>;
    /// Lazy cleanup after a hard registration failure: drop the token from
    /// whichever users carry it.
    async fn clear_push_token(&self, token: &str) -> Result<(), TagbookError>;

    async fn get_friend(&self, owner_id: &str, friend_id: &str) -> Result<Option<Friend>, TagbookError>;
    async fn save_friend(&self, owner_id: &str, friend: Friend) -> Result<(), TagbookError>;

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, TagbookError>;
    async fn save_group(&self, group: Group) -> Result<(), TagbookError>;
    /// Whole-value write of the resolved member list.
    async fn set_shared_with(&self, group_id: &str, shared_with: Vec<String>) -> Result<(), TagbookError>;
    /// Applies every increment to the group document in one atomic write.
    async fn apply_group_increments(
        &self,
        group_id: &str,
        increments: &[FieldIncrement],
    ) -> Result<(), TagbookError>;

    async fn save_user_expense(&self, user_id: &str, expense: Expense) -> Result<(), TagbookError>;
    async fn list_user_expenses(&self, user_id: &str) -> Result<Vec<Expense>, TagbookError>;
    /// One atomic batch removing every reference to `group_id` from the
    /// user's record: the accessible-group entry, each mirrored expense's
    /// tag list, and any settlement refs pointing at the group.
    async fn purge_group_refs(&self, user_id: &str, group_id: &str) -> Result<(), TagbookError>;

    async fn get_draft(&self, owner_id: &str, draft_id: &str) -> Result<Option<DraftExpense>, TagbookError>;
    async fn save_draft(&self, draft: DraftExpense) -> Result<(), TagbookError>;
    async fn list_drafts(&self, owner_id: &str) -> Result<Vec<DraftExpense>, TagbookError>;
    /// Promotion batch: writes the expense under every target group, the
    /// declared settlements, the owner's mirror copy and tx-id list, and
    /// deletes the draft, all or nothing.
    async fn commit_promotion(
        &self,
        owner_id: &str,
        draft_id: &str,
        expenses: Vec<(String, Expense)>,
        settlements: Vec<(String, Settlement)>,
    ) -> Result<(), TagbookError>;
}

pub mod in_memory;

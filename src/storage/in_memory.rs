use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::aggregate::{Bucket, FieldIncrement, LedgerKind, Scope};
use crate::error::TagbookError;
use crate::models::group::MonetarySummary;
use crate::models::{DraftExpense, Expense, Friend, Group, Settlement, User};
use crate::storage::Storage;

/// Test/demo document store. Each mutating method takes the relevant locks
/// for its whole duration, which gives the same atomicity the production
/// store provides for multi-field updates and batches.
pub struct InMemoryStorage {
    users: Mutex<HashMap<String, User>>,
    friends: Mutex<HashMap<(String, String), Friend>>, // (owner_id, friend_id)
    groups: Mutex<HashMap<String, Group>>,
    user_expenses: Mutex<HashMap<String, Vec<Expense>>>,
    group_expenses: Mutex<HashMap<String, Vec<Expense>>>,
    group_settlements: Mutex<HashMap<String, Vec<Settlement>>>,
    drafts: Mutex<HashMap<(String, String), DraftExpense>>, // (owner_id, draft_id)
    tx_ids: Mutex<HashMap<String, Vec<String>>>,            // owner_id -> tx ids
    write_ops: AtomicUsize,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage {
            users: Mutex::new(HashMap::new()),
            friends: Mutex::new(HashMap::new()),
            groups: Mutex::new(HashMap::new()),
            user_expenses: Mutex::new(HashMap::new()),
            group_expenses: Mutex::new(HashMap::new()),
            group_settlements: Mutex::new(HashMap::new()),
            drafts: Mutex::new(HashMap::new()),
            tx_ids: Mutex::new(HashMap::new()),
            write_ops: AtomicUsize::new(0),
        }
    }

    /// Number of mutating operations performed, for write-count assertions.
    pub fn write_ops(&self) -> usize {
        self.write_ops.load(Ordering::SeqCst)
    }

    fn record_write(&self) {
        self.write_ops.fetch_add(1, Ordering::SeqCst);
    }

    pub async fn group_expenses(&self, group_id: &str) -> Vec<Expense> {
        self.group_expenses.lock().await.get(group_id).cloned().unwrap_or_default()
    }

    pub async fn group_settlements(&self, group_id: &str) -> Vec<Settlement> {
        self.group_settlements.lock().await.get(group_id).cloned().unwrap_or_default()
    }

    pub async fn owner_tx_ids(&self, owner_id: &str) -> Vec<String> {
        self.tx_ids.lock().await.get(owner_id).cloned().unwrap_or_default()
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_to_summary(summary: &mut MonetarySummary, scope: &Scope, ledger: LedgerKind, delta: f64) {
    let target = match scope {
        Scope::AcrossUsers => &mut summary.across_users,
        Scope::User(user_id) => summary.per_user.entry(user_id.clone()).or_default(),
    };
    match ledger {
        LedgerKind::Expense => target.expense += delta,
        LedgerKind::Recovery => target.recovery += delta,
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user(&self, user: User) -> Result<User, TagbookError> {
        self.record_write();
        self.users.lock().await.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, TagbookError> {
        Ok(self.users.lock().await.get(user_id).cloned())
    }

    async fn update_user(&self, user: User) -> Result<(), TagbookError> {
        self.record_write();
        self.users.lock().await.insert(user.id.clone(), user);
        Ok(())
    }

    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<User>, TagbookError> {
        // Production store resolves this through an index on `phone`
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|u| u.phone == phone)
            .cloned())
    }

    async fn add_accessible_group(&self, user_id: &str, group_id: &str) -> Result<(), TagbookError> {
        self.record_write();
        let mut users = self.users.lock().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| TagbookError::UserNotFound(user_id.to_string()))?;
        if !user.accessible_tag_ids.iter().any(|id| id == group_id) {
            user.accessible_tag_ids.push(group_id.to_string());
        }
        Ok(())
    }

    async fn clear_push_token(&self, token: &str) -> Result<(), TagbookError> {
        self.record_write();
        let mut users = self.users.lock().await;
        for user in users.values_mut() {
            if user.fcm_token.as_deref() == Some(token) {
                user.fcm_token = None;
            }
        }
        Ok(())
    }

    async fn get_friend(&self, owner_id: &str, friend_id: &str) -> Result<Option<Friend>, TagbookError> {
        Ok(self
            .friends
            .lock()
            .await
            .get(&(owner_id.to_string(), friend_id.to_string()))
            .cloned())
    }

    async fn save_friend(&self, owner_id: &str, friend: Friend) -> Result<(), TagbookError> {
        self.record_write();
        self.friends
            .lock()
            .await
            .insert((owner_id.to_string(), friend.id.clone()), friend);
        Ok(())
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, TagbookError> {
        Ok(self.groups.lock().await.get(group_id).cloned())
    }

    async fn save_group(&self, group: Group) -> Result<(), TagbookError> {
        self.record_write();
        self.groups.lock().await.insert(group.id.clone(), group);
        Ok(())
    }

    async fn set_shared_with(&self, group_id: &str, shared_with: Vec<String>) -> Result<(), TagbookError> {
        self.record_write();
        let mut groups = self.groups.lock().await;
        let group = groups
            .get_mut(group_id)
            .ok_or_else(|| TagbookError::GroupNotFound(group_id.to_string()))?;
        group.shared_with = shared_with;
        Ok(())
    }

    async fn apply_group_increments(
        &self,
        group_id: &str,
        increments: &[FieldIncrement],
    ) -> Result<(), TagbookError> {
        self.record_write();
        let mut groups = self.groups.lock().await;
        let group = groups
            .get_mut(group_id)
            .ok_or_else(|| TagbookError::GroupNotFound(group_id.to_string()))?;
        for inc in increments {
            let summary = match &inc.bucket {
                Bucket::Lifetime => &mut group.total,
                Bucket::Month(key) => group.month_wise_total.entry(key.clone()).or_default(),
            };
            apply_to_summary(summary, &inc.scope, inc.ledger, inc.delta);
        }
        Ok(())
    }

    async fn save_user_expense(&self, user_id: &str, expense: Expense) -> Result<(), TagbookError> {
        self.record_write();
        let mut expenses = self.user_expenses.lock().await;
        let list = expenses.entry(user_id.to_string()).or_default();
        if let Some(existing) = list.iter_mut().find(|e| e.id == expense.id) {
            *existing = expense;
        } else {
            list.push(expense);
        }
        Ok(())
    }

    async fn list_user_expenses(&self, user_id: &str) -> Result<Vec<Expense>, TagbookError> {
        Ok(self.user_expenses.lock().await.get(user_id).cloned().unwrap_or_default())
    }

    async fn purge_group_refs(&self, user_id: &str, group_id: &str) -> Result<(), TagbookError> {
        self.record_write();
        // Both locks held for the whole purge: one atomic batch
        let mut users = self.users.lock().await;
        let mut expenses = self.user_expenses.lock().await;

        if let Some(user) = users.get_mut(user_id) {
            user.accessible_tag_ids.retain(|id| id != group_id);
        }
        if let Some(list) = expenses.get_mut(user_id) {
            for expense in list.iter_mut() {
                expense.tag_ids.retain(|id| id != group_id);
                expense.settlements.retain(|s| s.tag_id != group_id);
            }
        }
        Ok(())
    }

    async fn get_draft(&self, owner_id: &str, draft_id: &str) -> Result<Option<DraftExpense>, TagbookError> {
        Ok(self
            .drafts
            .lock()
            .await
            .get(&(owner_id.to_string(), draft_id.to_string()))
            .cloned())
    }

    async fn save_draft(&self, draft: DraftExpense) -> Result<(), TagbookError> {
        self.record_write();
        self.drafts
            .lock()
            .await
            .insert((draft.owner_id.clone(), draft.id.clone()), draft);
        Ok(())
    }

    async fn list_drafts(&self, owner_id: &str) -> Result<Vec<DraftExpense>, TagbookError> {
        Ok(self
            .drafts
            .lock()
            .await
            .iter()
            .filter(|((owner, _), _)| owner == owner_id)
            .map(|(_, draft)| draft.clone())
            .collect())
    }

    async fn commit_promotion(
        &self,
        owner_id: &str,
        draft_id: &str,
        expenses: Vec<(String, Expense)>,
        settlements: Vec<(String, Settlement)>,
    ) -> Result<(), TagbookError> {
        self.record_write();
        let mut drafts = self.drafts.lock().await;
        if drafts
            .remove(&(owner_id.to_string(), draft_id.to_string()))
            .is_none()
        {
            return Err(TagbookError::DraftNotFound(draft_id.to_string()));
        }

        let mut group_expenses = self.group_expenses.lock().await;
        let mut group_settlements = self.group_settlements.lock().await;
        let mut user_expenses = self.user_expenses.lock().await;
        let mut tx_ids = self.tx_ids.lock().await;

        for (group_id, expense) in expenses {
            // One mirror copy and one tx id per expense, however many groups
            // it fans out to
            let ids = tx_ids.entry(owner_id.to_string()).or_default();
            if !ids.contains(&expense.tx_id) {
                ids.push(expense.tx_id.clone());
            }
            let mirror = user_expenses.entry(owner_id.to_string()).or_default();
            if !mirror.iter().any(|e| e.id == expense.id) {
                mirror.push(expense.clone());
            }
            group_expenses.entry(group_id).or_default().push(expense);
        }
        for (group_id, settlement) in settlements {
            group_settlements.entry(group_id).or_default().push(settlement);
        }
        Ok(())
    }
}

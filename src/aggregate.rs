//! Delta derivation for the monetary aggregates.
//!
//! Every expense/settlement mutation is folded into the owning group as a
//! set of atomic field-path increments, never a read-modify-write of the
//! aggregate. Each delta fans out to four scopes in one write: lifetime
//! across-users, lifetime per-user, month across-users, month per-user;
//! which keeps `acrossUsers` equal to the sum of the per-user ledgers
//! without serializing concurrent events on the same group.

use crate::models::group::month_key;
use crate::models::{DocChange, Expense, Settlement};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerKind {
    Expense,
    Recovery,
}

/// Which summary document field the increment lands in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Bucket {
    Lifetime,
    Month(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    AcrossUsers,
    User(String),
}

/// One atomic increment of a single numeric field path on the group doc.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldIncrement {
    pub bucket: Bucket,
    pub scope: Scope,
    pub ledger: LedgerKind,
    pub delta: f64,
}

#[derive(Default)]
struct IncrementSet {
    out: Vec<FieldIncrement>,
}

impl IncrementSet {
    fn push(&mut self, bucket: Bucket, scope: Scope, ledger: LedgerKind, delta: f64) {
        if delta != 0.0 {
            self.out.push(FieldIncrement { bucket, scope, ledger, delta });
        }
    }

    /// The standard four-way fan-out for a single month bucket.
    fn quad(&mut self, month: &str, user_id: &str, ledger: LedgerKind, delta: f64) {
        self.push(Bucket::Lifetime, Scope::AcrossUsers, ledger, delta);
        self.push(Bucket::Lifetime, Scope::User(user_id.to_string()), ledger, delta);
        self.month_pair(month, user_id, ledger, delta);
    }

    /// Month-bucket half of the fan-out, used on its own by cross-month edits.
    fn month_pair(&mut self, month: &str, user_id: &str, ledger: LedgerKind, delta: f64) {
        self.push(Bucket::Month(month.to_string()), Scope::AcrossUsers, ledger, delta);
        self.push(
            Bucket::Month(month.to_string()),
            Scope::User(user_id.to_string()),
            ledger,
            delta,
        );
    }

    fn lifetime_pair(&mut self, user_id: &str, ledger: LedgerKind, delta: f64) {
        self.push(Bucket::Lifetime, Scope::AcrossUsers, ledger, delta);
        self.push(Bucket::Lifetime, Scope::User(user_id.to_string()), ledger, delta);
    }
}

/// Increments for an expense create/update/delete.
///
/// Recovery-ledger increments are emitted only when the owning group allows
/// recovery. When an update moves the transaction across a month boundary,
/// the old bucket loses the entire pre-edit amount and the new bucket gains
/// the entire post-edit amount, while the lifetime scopes take the plain
/// diff.
pub fn expense_increments(change: &DocChange<Expense>, allow_recovery: bool) -> Vec<FieldIncrement> {
    let mut inc = IncrementSet::default();

    match (&change.before, &change.after) {
        (None, Some(after)) => {
            let month = month_key(after.time_of_transaction);
            inc.quad(&month, &after.owner_id, LedgerKind::Expense, after.amount);
            if allow_recovery {
                inc.quad(&month, &after.owner_id, LedgerKind::Recovery, after.recovery());
            }
        }
        (Some(before), None) => {
            let month = month_key(before.time_of_transaction);
            inc.quad(&month, &before.owner_id, LedgerKind::Expense, -before.amount);
            if allow_recovery {
                inc.quad(&month, &before.owner_id, LedgerKind::Recovery, -before.recovery());
            }
        }
        (Some(before), Some(after)) => {
            let owner = &before.owner_id;
            let diff = after.amount - before.amount;
            let recovery_diff = after.recovery() - before.recovery();
            let old_month = month_key(before.time_of_transaction);
            let new_month = month_key(after.time_of_transaction);

            inc.lifetime_pair(owner, LedgerKind::Expense, diff);
            if allow_recovery {
                inc.lifetime_pair(owner, LedgerKind::Recovery, recovery_diff);
            }

            if old_month == new_month {
                inc.month_pair(&old_month, owner, LedgerKind::Expense, diff);
                if allow_recovery {
                    inc.month_pair(&old_month, owner, LedgerKind::Recovery, recovery_diff);
                }
            } else {
                inc.month_pair(&new_month, owner, LedgerKind::Expense, after.amount);
                inc.month_pair(&old_month, owner, LedgerKind::Expense, -before.amount);
                if allow_recovery {
                    inc.month_pair(&new_month, owner, LedgerKind::Recovery, after.recovery());
                    inc.month_pair(&old_month, owner, LedgerKind::Recovery, -before.recovery());
                }
            }
        }
        (None, None) => {}
    }

    inc.out
}

/// Increments for a settlement create/update/delete.
///
/// A settlement increases the payer's expense ledger and decreases the
/// recipient's recovery ledger by the same magnitude. An edit that moves the
/// accounting period (or the recipient) removes the full pre-edit amount
/// from the old bucket/recipient and adds the full post-edit amount to the
/// new one.
pub fn settlement_increments(
    change: &DocChange<Settlement>,
    allow_recovery: bool,
) -> Vec<FieldIncrement> {
    let mut inc = IncrementSet::default();

    match (&change.before, &change.after) {
        (None, Some(after)) => {
            settlement_signed(&mut inc, after, allow_recovery, 1.0);
        }
        (Some(before), None) => {
            settlement_signed(&mut inc, before, allow_recovery, -1.0);
        }
        (Some(before), Some(after)) => {
            let payer = &before.owner_id;
            let diff = after.amount - before.amount;
            let old_month = before.month_key();
            let new_month = after.month_key();
            let same_bucket = old_month == new_month && before.to == after.to;

            inc.lifetime_pair(payer, LedgerKind::Expense, diff);
            if allow_recovery {
                if before.to == after.to {
                    inc.lifetime_pair(&before.to, LedgerKind::Recovery, -diff);
                } else {
                    inc.lifetime_pair(&before.to, LedgerKind::Recovery, before.amount);
                    inc.lifetime_pair(&after.to, LedgerKind::Recovery, -after.amount);
                }
            }

            if same_bucket {
                inc.month_pair(&old_month, payer, LedgerKind::Expense, diff);
                if allow_recovery {
                    inc.month_pair(&old_month, &before.to, LedgerKind::Recovery, -diff);
                }
            } else {
                inc.month_pair(&new_month, payer, LedgerKind::Expense, after.amount);
                inc.month_pair(&old_month, payer, LedgerKind::Expense, -before.amount);
                if allow_recovery {
                    inc.month_pair(&new_month, &after.to, LedgerKind::Recovery, -after.amount);
                    inc.month_pair(&old_month, &before.to, LedgerKind::Recovery, before.amount);
                }
            }
        }
        (None, None) => {}
    }

    inc.out
}

fn settlement_signed(inc: &mut IncrementSet, s: &Settlement, allow_recovery: bool, sign: f64) {
    let month = s.month_key();
    inc.quad(&month, &s.owner_id, LedgerKind::Expense, sign * s.amount);
    if allow_recovery {
        inc.quad(&month, &s.to, LedgerKind::Recovery, -sign * s.amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn expense(amount: f64, recovery: Option<f64>, y: i32, m: u32) -> Expense {
        let ts = Utc.with_ymd_and_hms(y, m, 10, 12, 0, 0).unwrap();
        Expense {
            id: "e1".into(),
            owner_id: "owner".into(),
            to: "Chai Point".into(),
            amount,
            recovery_amount: recovery,
            time_of_transaction: ts,
            created_at: ts,
            updated_at: ts,
            notes: None,
            receipt_url: None,
            tx_id: "tx-e1".into(),
            tag_ids: vec![],
            settlements: vec![],
        }
    }

    fn sum_for(incs: &[FieldIncrement], bucket: &Bucket, scope: &Scope, ledger: LedgerKind) -> f64 {
        incs.iter()
            .filter(|i| &i.bucket == bucket && &i.scope == scope && i.ledger == ledger)
            .map(|i| i.delta)
            .sum()
    }

    #[test]
    fn create_fans_out_to_four_scopes_per_ledger() {
        let change = DocChange::created(expense(200.0, Some(50.0), 2024, 3));
        let incs = expense_increments(&change, true);
        assert_eq!(incs.len(), 8);

        let month = Bucket::Month("2024-03".into());
        let user = Scope::User("owner".into());
        assert_eq!(sum_for(&incs, &Bucket::Lifetime, &Scope::AcrossUsers, LedgerKind::Expense), 200.0);
        assert_eq!(sum_for(&incs, &Bucket::Lifetime, &user, LedgerKind::Expense), 200.0);
        assert_eq!(sum_for(&incs, &month, &Scope::AcrossUsers, LedgerKind::Expense), 200.0);
        assert_eq!(sum_for(&incs, &month, &user, LedgerKind::Expense), 200.0);
        assert_eq!(sum_for(&incs, &month, &user, LedgerKind::Recovery), 50.0);
    }

    #[test]
    fn delete_reverses_create_exactly() {
        let e = expense(120.0, Some(30.0), 2024, 1);
        let created = expense_increments(&DocChange::created(e.clone()), true);
        let deleted = expense_increments(&DocChange::deleted(e), true);
        assert_eq!(created.len(), deleted.len());
        for c in &created {
            let mirrored = deleted
                .iter()
                .any(|d| d.bucket == c.bucket && d.scope == c.scope && d.ledger == c.ledger && d.delta == -c.delta);
            assert!(mirrored, "no mirror for {c:?}");
        }
    }

    #[test]
    fn recovery_gating_suppresses_all_recovery_writes() {
        let change = DocChange::created(expense(200.0, Some(50.0), 2024, 3));
        let incs = expense_increments(&change, false);
        assert!(incs.iter().all(|i| i.ledger == LedgerKind::Expense));
    }

    #[test]
    fn same_month_update_applies_plain_diff() {
        let before = expense(100.0, None, 2024, 1);
        let mut after = before.clone();
        after.amount = 150.0;
        let incs = expense_increments(&DocChange::updated(before, after), true);

        let month = Bucket::Month("2024-01".into());
        assert_eq!(sum_for(&incs, &Bucket::Lifetime, &Scope::AcrossUsers, LedgerKind::Expense), 50.0);
        assert_eq!(sum_for(&incs, &month, &Scope::AcrossUsers, LedgerKind::Expense), 50.0);
    }

    #[test]
    fn cross_month_edit_moves_full_amounts_between_buckets() {
        let before = expense(100.0, None, 2024, 1);
        let mut after = expense(150.0, None, 2024, 2);
        after.id = before.id.clone();
        let incs = expense_increments(&DocChange::updated(before, after), true);

        let jan = Bucket::Month("2024-01".into());
        let feb = Bucket::Month("2024-02".into());
        assert_eq!(sum_for(&incs, &jan, &Scope::AcrossUsers, LedgerKind::Expense), -100.0);
        assert_eq!(sum_for(&incs, &feb, &Scope::AcrossUsers, LedgerKind::Expense), 150.0);
        assert_eq!(sum_for(&incs, &jan, &Scope::User("owner".into()), LedgerKind::Expense), -100.0);
        assert_eq!(sum_for(&incs, &feb, &Scope::User("owner".into()), LedgerKind::Expense), 150.0);
        // lifetime scopes take the plain diff
        assert_eq!(sum_for(&incs, &Bucket::Lifetime, &Scope::AcrossUsers, LedgerKind::Expense), 50.0);
    }

    #[test]
    fn cross_month_edit_with_unchanged_amount_still_moves_buckets() {
        let before = expense(100.0, None, 2024, 1);
        let mut after = expense(100.0, None, 2024, 2);
        after.id = before.id.clone();
        let incs = expense_increments(&DocChange::updated(before, after), true);

        let jan = Bucket::Month("2024-01".into());
        let feb = Bucket::Month("2024-02".into());
        assert_eq!(sum_for(&incs, &jan, &Scope::AcrossUsers, LedgerKind::Expense), -100.0);
        assert_eq!(sum_for(&incs, &feb, &Scope::AcrossUsers, LedgerKind::Expense), 100.0);
        assert_eq!(sum_for(&incs, &Bucket::Lifetime, &Scope::AcrossUsers, LedgerKind::Expense), 0.0);
    }

    fn settlement(amount: f64, y: i32, m: u32) -> Settlement {
        let ts = Utc.with_ymd_and_hms(y, m, 5, 9, 0, 0).unwrap();
        Settlement {
            id: "s1".into(),
            tag_id: "g1".into(),
            owner_id: "payer".into(),
            to: "recipient".into(),
            amount,
            month: m,
            year: y,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn settlement_create_moves_expense_and_recovery_in_opposite_directions() {
        let incs = settlement_increments(&DocChange::created(settlement(80.0, 2024, 4)), true);

        let month = Bucket::Month("2024-04".into());
        assert_eq!(sum_for(&incs, &Bucket::Lifetime, &Scope::User("payer".into()), LedgerKind::Expense), 80.0);
        assert_eq!(sum_for(&incs, &Bucket::Lifetime, &Scope::User("recipient".into()), LedgerKind::Recovery), -80.0);
        assert_eq!(sum_for(&incs, &Bucket::Lifetime, &Scope::AcrossUsers, LedgerKind::Expense), 80.0);
        assert_eq!(sum_for(&incs, &Bucket::Lifetime, &Scope::AcrossUsers, LedgerKind::Recovery), -80.0);
        assert_eq!(sum_for(&incs, &month, &Scope::AcrossUsers, LedgerKind::Recovery), -80.0);
    }

    #[test]
    fn settlement_period_edit_moves_full_amounts() {
        let before = settlement(80.0, 2024, 4);
        let mut after = settlement(100.0, 2024, 5);
        after.id = before.id.clone();
        let incs = settlement_increments(&DocChange::updated(before, after), true);

        let apr = Bucket::Month("2024-04".into());
        let may = Bucket::Month("2024-05".into());
        assert_eq!(sum_for(&incs, &apr, &Scope::User("payer".into()), LedgerKind::Expense), -80.0);
        assert_eq!(sum_for(&incs, &may, &Scope::User("payer".into()), LedgerKind::Expense), 100.0);
        assert_eq!(sum_for(&incs, &apr, &Scope::User("recipient".into()), LedgerKind::Recovery), 80.0);
        assert_eq!(sum_for(&incs, &may, &Scope::User("recipient".into()), LedgerKind::Recovery), -100.0);
        assert_eq!(sum_for(&incs, &Bucket::Lifetime, &Scope::AcrossUsers, LedgerKind::Expense), 20.0);
    }

    #[test]
    fn settlement_recipient_edit_rebalances_both_recipients() {
        let before = settlement(80.0, 2024, 4);
        let mut after = before.clone();
        after.to = "other".into();
        let incs = settlement_increments(&DocChange::updated(before, after), true);

        assert_eq!(sum_for(&incs, &Bucket::Lifetime, &Scope::User("recipient".into()), LedgerKind::Recovery), 80.0);
        assert_eq!(sum_for(&incs, &Bucket::Lifetime, &Scope::User("other".into()), LedgerKind::Recovery), -80.0);
    }
}

//! Accounts and their materialized balances.
//!
//! `AccountState` is the single place balance math happens. It owns the
//! invariant that `balance` always equals `opening_balance` plus the sum of
//! the entry log's deltas; every mutation path updates the log and the
//! balance together.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use khata_shared::types::{AccountId, EntryId, Money};

use super::entry::{LedgerEntry, NewEntry};
use super::error::LedgerError;
use super::kind::AccountKind;
use super::validation;

/// A counterparty account with its materialized balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Counterparty classification.
    pub kind: AccountKind,
    /// Human-facing name.
    pub display_name: String,
    /// Phone number or bank account number.
    pub contact: Option<String>,
    /// Balance at account creation, in the native unit.
    pub opening_balance: Decimal,
    /// Materialized balance: `opening_balance` plus the sum of entry deltas.
    pub balance: Decimal,
    /// Record creation instant.
    pub created_at: DateTime<Utc>,
    /// Last mutation instant.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Creates a new account with its balance at the opening value.
    #[must_use]
    pub fn new(
        kind: AccountKind,
        display_name: String,
        contact: Option<String>,
        opening_balance: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            kind,
            display_name,
            contact,
            opening_balance,
            balance: opening_balance,
            created_at: now,
            updated_at: now,
        }
    }

    /// The balance as a typed amount in the account's native unit.
    #[must_use]
    pub fn balance_money(&self) -> Money {
        Money::new(self.balance, self.kind.native_unit())
    }
}

/// An account together with its full entry log.
#[derive(Debug, Clone)]
pub struct AccountState {
    account: Account,
    entries: Vec<LedgerEntry>,
}

impl AccountState {
    /// Wraps a freshly created account with an empty log.
    ///
    /// The balance is normalized to the opening value; with no entries the
    /// two must agree.
    #[must_use]
    pub fn new(mut account: Account) -> Self {
        account.balance = account.opening_balance;
        Self {
            account,
            entries: Vec::new(),
        }
    }

    /// Reassembles state loaded from a store.
    #[must_use]
    pub fn from_parts(account: Account, entries: Vec<LedgerEntry>) -> Self {
        Self { account, entries }
    }

    /// The account record.
    #[must_use]
    pub fn account(&self) -> &Account {
        &self.account
    }

    /// The materialized balance.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.account.balance
    }

    /// Applies an entry: appends it to the log and moves the balance by its
    /// delta.
    ///
    /// # Errors
    ///
    /// Rejects entries whose kind the account does not permit, entries that
    /// belong to a different account, and withdrawals that would drive a
    /// guarded balance negative. On error nothing is mutated.
    pub fn apply(&mut self, entry: LedgerEntry) -> Result<Decimal, LedgerError> {
        if entry.account_id != self.account.id {
            return Err(LedgerError::Validation(format!(
                "entry {} belongs to account {}, not {}",
                entry.id, entry.account_id, self.account.id
            )));
        }
        if !self.account.kind.allows(entry.kind) {
            return Err(LedgerError::EntryKindMismatch {
                account_kind: self.account.kind,
                entry_kind: entry.kind,
            });
        }
        validation::check_withdrawal(
            self.account.kind,
            self.account.id,
            self.account.balance,
            &entry,
        )?;

        self.account.balance += entry.delta();
        self.account.updated_at = Utc::now();
        self.entries.push(entry);
        Ok(self.account.balance)
    }

    /// Reverses an entry: removes it from the log and undoes its delta.
    ///
    /// Reversal is unconditional; the overdraft guard applies only to new
    /// withdrawals, never to undoing history.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if the entry is not in the log.
    pub fn reverse(&mut self, entry_id: EntryId) -> Result<(LedgerEntry, Decimal), LedgerError> {
        let position = self
            .entries
            .iter()
            .position(|e| e.id == entry_id)
            .ok_or(LedgerError::EntryNotFound(entry_id))?;

        let entry = self.entries.remove(position);
        self.account.balance += entry.reverse_delta();
        self.account.updated_at = Utc::now();
        Ok((entry, self.account.balance))
    }

    /// Edits an entry in place: reverse the original delta, then apply the
    /// revised one, atomically.
    ///
    /// The revised entry keeps the original's identity, link fields, and
    /// creation instants. The overdraft guard is checked against the
    /// balance as it stands after the reversal; on any error nothing is
    /// mutated.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound`, `EntryKindMismatch`, or
    /// `InsufficientBalance`.
    pub fn edit(
        &mut self,
        entry_id: EntryId,
        new: &NewEntry,
    ) -> Result<(LedgerEntry, Decimal), LedgerError> {
        let position = self
            .entries
            .iter()
            .position(|e| e.id == entry_id)
            .ok_or(LedgerError::EntryNotFound(entry_id))?;

        let revised = self.entries[position].revised(new);
        if !self.account.kind.allows(revised.kind) {
            return Err(LedgerError::EntryKindMismatch {
                account_kind: self.account.kind,
                entry_kind: revised.kind,
            });
        }

        let after_reversal = self.account.balance + self.entries[position].reverse_delta();
        validation::check_withdrawal(self.account.kind, self.account.id, after_reversal, &revised)?;

        self.account.balance = after_reversal + revised.delta();
        self.account.updated_at = Utc::now();
        self.entries[position] = revised.clone();
        Ok((revised, self.account.balance))
    }

    /// Updates the account's profile fields.
    pub fn update_profile(&mut self, display_name: String, contact: Option<String>) {
        self.account.display_name = display_name;
        self.account.contact = contact;
        self.account.updated_at = Utc::now();
    }

    /// Looks up an entry by id.
    #[must_use]
    pub fn entry(&self, id: EntryId) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Entries ordered newest timestamp first, ties broken stably by id.
    #[must_use]
    pub fn entries(&self) -> Vec<&LedgerEntry> {
        let mut ordered: Vec<&LedgerEntry> = self.entries.iter().collect();
        ordered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        ordered
    }

    /// The entry log in insertion order, for persistence.
    #[must_use]
    pub fn raw_entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Number of entries in the log.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Recomputes the balance from scratch: opening plus all deltas.
    #[must_use]
    pub fn derived_balance(&self) -> Decimal {
        self.account.opening_balance + self.entries.iter().map(LedgerEntry::delta).sum::<Decimal>()
    }

    /// True if the materialized balance matches the derived one.
    #[must_use]
    pub fn is_derivable(&self) -> bool {
        self.account.balance == self.derived_balance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::kind::EntryKind;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn sample_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn entry_for(state: &AccountState, kind: EntryKind, amount: Decimal) -> LedgerEntry {
        NewEntry {
            kind,
            amount,
            secondary_amount: None,
            rate: None,
            description: "test".to_string(),
            date: sample_date(),
        }
        .into_entry(state.account().id)
    }

    fn customer_state() -> AccountState {
        AccountState::new(Account::new(
            AccountKind::Customer,
            "Rahim Traders".to_string(),
            Some("01712345678".to_string()),
            Decimal::ZERO,
        ))
    }

    fn bank_state(opening: Decimal) -> AccountState {
        AccountState::new(Account::new(
            AccountKind::Bank,
            "City Bank".to_string(),
            None,
            opening,
        ))
    }

    #[test]
    fn test_apply_moves_balance_and_appends() {
        let mut state = customer_state();
        let entry = entry_for(&state, EntryKind::Order, dec!(16500));

        let balance = state.apply(entry).unwrap();
        assert_eq!(balance, dec!(16500));
        assert_eq!(state.entry_count(), 1);
        assert!(state.is_derivable());
    }

    #[test]
    fn test_apply_rejects_foreign_entry() {
        let mut state = customer_state();
        let foreign = NewEntry {
            kind: EntryKind::Order,
            amount: dec!(10),
            secondary_amount: None,
            rate: None,
            description: String::new(),
            date: sample_date(),
        }
        .into_entry(AccountId::new());

        assert!(matches!(
            state.apply(foreign),
            Err(LedgerError::Validation(_))
        ));
        assert_eq!(state.entry_count(), 0);
    }

    #[test]
    fn test_apply_rejects_kind_mismatch() {
        let mut state = customer_state();
        let entry = entry_for(&state, EntryKind::Deposit, dec!(10));
        assert!(matches!(
            state.apply(entry),
            Err(LedgerError::EntryKindMismatch { .. })
        ));
    }

    #[test]
    fn test_withdrawal_guard_rejects_overdraft() {
        let mut state = bank_state(dec!(100));
        let entry = entry_for(&state, EntryKind::Withdraw, dec!(150));

        let err = state.apply(entry).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientBalance {
                balance,
                requested,
                ..
            } if balance == dec!(100) && requested == dec!(150)
        ));
        // Balance unchanged, nothing appended.
        assert_eq!(state.balance(), dec!(100));
        assert_eq!(state.entry_count(), 0);
    }

    #[test]
    fn test_withdrawal_to_exactly_zero_is_allowed() {
        let mut state = bank_state(dec!(100));
        let entry = entry_for(&state, EntryKind::Withdraw, dec!(100));
        assert_eq!(state.apply(entry).unwrap(), dec!(0));
    }

    #[test]
    fn test_customer_balance_goes_negative_freely() {
        let mut state = customer_state();
        let entry = entry_for(&state, EntryKind::Payment, dec!(500));
        assert_eq!(state.apply(entry).unwrap(), dec!(-500));
    }

    #[test]
    fn test_reverse_restores_pre_entry_balance() {
        let mut state = customer_state();
        let entry = entry_for(&state, EntryKind::Order, dec!(777.77));
        let id = entry.id;

        state.apply(entry).unwrap();
        let (removed, balance) = state.reverse(id).unwrap();

        assert_eq!(removed.id, id);
        assert_eq!(balance, Decimal::ZERO);
        assert_eq!(state.entry_count(), 0);
        assert!(state.is_derivable());
    }

    #[test]
    fn test_reverse_unknown_entry() {
        let mut state = customer_state();
        assert!(matches!(
            state.reverse(EntryId::new()),
            Err(LedgerError::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_reverse_may_drive_guarded_balance_negative() {
        // Deposit then withdraw; reversing the deposit legitimately leaves
        // the bank negative. Only new withdrawals are guarded.
        let mut state = bank_state(dec!(0));
        let deposit = entry_for(&state, EntryKind::Deposit, dec!(100));
        let deposit_id = deposit.id;
        state.apply(deposit).unwrap();
        let withdraw = entry_for(&state, EntryKind::Withdraw, dec!(60));
        state.apply(withdraw).unwrap();

        let (_, balance) = state.reverse(deposit_id).unwrap();
        assert_eq!(balance, dec!(-60));
        assert!(state.is_derivable());
    }

    #[test]
    fn test_edit_replaces_delta_atomically() {
        let mut state = customer_state();
        let entry = entry_for(&state, EntryKind::Order, dec!(100));
        let id = entry.id;
        state.apply(entry).unwrap();

        let new = NewEntry {
            kind: EntryKind::Order,
            amount: dec!(250),
            secondary_amount: None,
            rate: None,
            description: "corrected".to_string(),
            date: sample_date(),
        };
        let (revised, balance) = state.edit(id, &new).unwrap();

        assert_eq!(revised.id, id);
        assert_eq!(balance, dec!(250));
        assert_eq!(state.entry_count(), 1);
        assert!(state.is_derivable());
    }

    #[test]
    fn test_edit_enforces_withdrawal_guard_on_revision() {
        let mut state = bank_state(dec!(100));
        let withdraw = entry_for(&state, EntryKind::Withdraw, dec!(50));
        let id = withdraw.id;
        state.apply(withdraw).unwrap();
        assert_eq!(state.balance(), dec!(50));

        // Revising the withdrawal to 150 exceeds the 100 available after
        // reversing the original 50.
        let new = NewEntry {
            kind: EntryKind::Withdraw,
            amount: dec!(150),
            secondary_amount: None,
            rate: None,
            description: String::new(),
            date: sample_date(),
        };
        let err = state.edit(id, &new).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        // Original entry and balance intact.
        assert_eq!(state.balance(), dec!(50));
        assert_eq!(state.entry(id).unwrap().amount, dec!(50));
        assert!(state.is_derivable());
    }

    #[test]
    fn test_entries_ordered_newest_first() {
        let mut state = customer_state();
        let first = entry_for(&state, EntryKind::Order, dec!(1));
        let second = entry_for(&state, EntryKind::Order, dec!(2));
        let third = entry_for(&state, EntryKind::Payment, dec!(3));
        let ids = [first.id, second.id, third.id];
        state.apply(first).unwrap();
        state.apply(second).unwrap();
        state.apply(third).unwrap();

        let ordered: Vec<_> = state.entries().iter().map(|e| e.id).collect();
        assert_eq!(ordered, vec![ids[2], ids[1], ids[0]]);
    }

    #[test]
    fn test_opening_balance_counts_toward_derivation() {
        let mut state = bank_state(dec!(1000));
        let withdraw = entry_for(&state, EntryKind::Withdraw, dec!(300));
        state.apply(withdraw).unwrap();

        assert_eq!(state.balance(), dec!(700));
        assert_eq!(state.derived_balance(), dec!(700));
        assert!(state.is_derivable());
    }

    #[test]
    fn test_update_profile() {
        let mut state = customer_state();
        state.update_profile("Karim Stores".to_string(), None);
        assert_eq!(state.account().display_name, "Karim Stores");
        assert_eq!(state.account().contact, None);
    }
}

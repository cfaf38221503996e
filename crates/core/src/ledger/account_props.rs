//! Property-based tests for account state and balance derivation.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::account::{Account, AccountState};
use super::entry::{LedgerEntry, NewEntry};
use super::kind::{AccountKind, EntryKind};

/// Strategy for positive amounts with realistic cent precision.
fn amount_cents() -> impl Strategy<Value = Decimal> {
    (1i64..=10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for non-negative opening balances.
fn opening_cents() -> impl Strategy<Value = Decimal> {
    (0i64..=100_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy covering every account kind.
fn account_kind() -> impl Strategy<Value = AccountKind> {
    prop_oneof![
        Just(AccountKind::Customer),
        Just(AccountKind::Supplier),
        Just(AccountKind::Agent),
        Just(AccountKind::Bank),
        Just(AccountKind::Wallet),
    ]
}

/// Strategy covering the kinds whose balances may not go negative.
fn guarded_kind() -> impl Strategy<Value = AccountKind> {
    prop_oneof![Just(AccountKind::Bank), Just(AccountKind::Wallet)]
}

/// Picks an entry kind the account permits, accumulating or reducing.
fn entry_kind_for(kind: AccountKind, accumulate: bool) -> EntryKind {
    match (kind, accumulate) {
        (AccountKind::Customer, true) => EntryKind::Order,
        (AccountKind::Supplier, true) => EntryKind::Bill,
        (AccountKind::Agent, true) => EntryKind::Dhs,
        (AccountKind::Bank | AccountKind::Wallet, true) => EntryKind::Deposit,
        (AccountKind::Bank | AccountKind::Wallet, false) => EntryKind::Withdraw,
        (_, false) => EntryKind::Payment,
    }
}

fn make_entry(state: &AccountState, kind: EntryKind, amount: Decimal) -> LedgerEntry {
    NewEntry {
        kind,
        amount,
        secondary_amount: None,
        rate: None,
        description: "prop".to_string(),
        date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
    }
    .into_entry(state.account().id)
}

fn fresh_state(kind: AccountKind, opening: Decimal) -> AccountState {
    AccountState::new(Account::new(kind, "prop".to_string(), None, opening))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The materialized balance always equals the opening balance plus the
    /// sum of entry deltas, for any sequence of applies.
    #[test]
    fn prop_balance_always_derivable(
        kind in account_kind(),
        opening in opening_cents(),
        moves in prop::collection::vec((any::<bool>(), amount_cents()), 0..24),
    ) {
        let mut state = fresh_state(kind, opening);
        for (accumulate, amount) in moves {
            let entry = make_entry(&state, entry_kind_for(kind, accumulate), amount);
            // Guarded rejections must leave state untouched, so the
            // invariant holds whether or not the apply succeeds.
            let _ = state.apply(entry);
        }
        prop_assert!(
            state.is_derivable(),
            "materialized {} diverged from derived {}",
            state.balance(),
            state.derived_balance()
        );
    }

    /// Reversing an entry restores the exact pre-apply balance.
    #[test]
    fn prop_reverse_undoes_apply(
        kind in account_kind(),
        opening in opening_cents(),
        accumulate in any::<bool>(),
        amount in amount_cents(),
    ) {
        let mut state = fresh_state(kind, opening);
        let before = state.balance();
        let entry = make_entry(&state, entry_kind_for(kind, accumulate), amount);
        let id = entry.id;
        if state.apply(entry).is_ok() {
            let (_, balance) = state.reverse(id).unwrap();
            prop_assert_eq!(balance, before, "reverse did not restore balance");
            prop_assert_eq!(state.entry_count(), 0);
            prop_assert!(state.is_derivable());
        }
    }

    /// Editing an entry lands on the balance the revised entry implies and
    /// keeps the log at the same length.
    #[test]
    fn prop_edit_keeps_balance_derivable(
        kind in account_kind(),
        opening in opening_cents(),
        original in amount_cents(),
        revised in amount_cents(),
    ) {
        let mut state = fresh_state(kind, opening);
        let entry_kind = entry_kind_for(kind, true);
        let entry = make_entry(&state, entry_kind, original);
        let id = entry.id;
        state.apply(entry).unwrap();

        let new = NewEntry {
            kind: entry_kind,
            amount: revised,
            secondary_amount: None,
            rate: None,
            description: "revised".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
        };
        let (replacement, balance) = state.edit(id, &new).unwrap();

        prop_assert_eq!(replacement.id, id, "edit must keep the entry id");
        prop_assert_eq!(balance, opening + revised);
        prop_assert_eq!(state.entry_count(), 1);
        prop_assert!(state.is_derivable());
    }

    /// Bank and wallet balances never go negative no matter what sequence
    /// of deposits and withdrawals is attempted.
    #[test]
    fn prop_guarded_accounts_never_negative(
        kind in guarded_kind(),
        opening in opening_cents(),
        moves in prop::collection::vec((any::<bool>(), amount_cents()), 0..24),
    ) {
        let mut state = fresh_state(kind, opening);
        for (accumulate, amount) in moves {
            let entry = make_entry(&state, entry_kind_for(kind, accumulate), amount);
            let _ = state.apply(entry);
        }
        prop_assert!(
            state.balance() >= Decimal::ZERO,
            "guarded account went negative: {}",
            state.balance()
        );
    }
}

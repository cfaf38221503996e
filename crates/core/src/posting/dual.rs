//! Linked posting plans: one business action, two accounts, two entries.
//!
//! An order books a `bill` on the supplier and an `order` on the customer;
//! a payment books a `credit` on the bank and a `payment` on the customer.
//! The dependent leg (supplier bill, bank credit) is persisted before the
//! primary leg so its id is known when the primary entry is written.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use khata_shared::types::AccountId;

use crate::fx;
use crate::ledger::entry::{LedgerEntry, NewEntry};
use crate::ledger::error::LedgerError;
use crate::ledger::kind::{AccountKind, EntryKind};
use crate::ledger::Account;

/// One leg of a dual posting: the target account and the entry to book.
#[derive(Debug, Clone)]
pub struct PostingLeg {
    /// The account this leg posts to.
    pub account_id: AccountId,
    /// The validated entry input for this leg.
    pub input: NewEntry,
}

/// A validated two-leg posting, ready to materialize.
#[derive(Debug, Clone)]
pub struct DualPostingPlan {
    /// Persisted first; a partial failure leaves this leg orphaned.
    pub dependent: PostingLeg,
    /// Persisted second, with a back-reference to the dependent entry.
    pub primary: PostingLeg,
}

/// Both legs materialized as entries with cross-references in place.
#[derive(Debug, Clone)]
pub struct MaterializedPosting {
    /// The dependent-side entry (supplier bill or bank credit).
    pub dependent: LedgerEntry,
    /// The primary-side entry (customer order or payment).
    pub primary: LedgerEntry,
}

impl DualPostingPlan {
    /// Turns the plan into two cross-linked entries.
    ///
    /// Ids are assigned here; each entry's `linked_entry_id` points at the
    /// other leg so a delete on either side can find its counterpart.
    #[must_use]
    pub fn materialize(self) -> MaterializedPosting {
        let mut dependent = self.dependent.input.into_linked_entry(
            self.dependent.account_id,
            self.primary.account_id,
            None,
        );
        let primary = self.primary.input.into_linked_entry(
            self.primary.account_id,
            self.dependent.account_id,
            Some(dependent.id),
        );
        dependent.linked_entry_id = Some(primary.id);
        MaterializedPosting { dependent, primary }
    }
}

/// Stateless builders for the two linked posting shapes.
pub struct DualPosting;

impl DualPosting {
    /// Plans an order: a `bill` on the supplier and an `order` on the
    /// customer, both derived from the same RMB amount with each side's
    /// rate frozen into its entry.
    ///
    /// The supplier is billed `rmb_amount / supplier_rate` USD; the
    /// customer owes `rmb_amount * customer_rate` BDT.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRate` for a non-positive rate, `ZeroAmount` or
    /// `NegativeAmount` for a bad amount, and `Validation` when the
    /// accounts are not a customer/supplier pair.
    pub fn create_order(
        customer: &Account,
        supplier: &Account,
        rmb_amount: Decimal,
        customer_rate: Decimal,
        supplier_rate: Decimal,
        description: String,
        date: NaiveDate,
    ) -> Result<DualPostingPlan, LedgerError> {
        require_kind(customer, AccountKind::Customer)?;
        require_kind(supplier, AccountKind::Supplier)?;
        check_amount(rmb_amount)?;
        check_rate(customer_rate)?;
        check_rate(supplier_rate)?;

        let supplier_usd = fx::usd_from_rmb(rmb_amount, supplier_rate);
        let customer_bdt = fx::bdt_from_rmb(rmb_amount, customer_rate);

        Ok(DualPostingPlan {
            dependent: PostingLeg {
                account_id: supplier.id,
                input: NewEntry {
                    kind: EntryKind::Bill,
                    amount: supplier_usd,
                    secondary_amount: Some(rmb_amount),
                    rate: Some(supplier_rate),
                    description: description.clone(),
                    date,
                },
            },
            primary: PostingLeg {
                account_id: customer.id,
                input: NewEntry {
                    kind: EntryKind::Order,
                    amount: customer_bdt,
                    secondary_amount: Some(rmb_amount),
                    rate: Some(customer_rate),
                    description,
                    date,
                },
            },
        })
    }

    /// Plans a payment receipt: a `credit` on the bank and a `payment` on
    /// the customer, both for the same BDT amount.
    ///
    /// # Errors
    ///
    /// Returns `ZeroAmount` or `NegativeAmount` for a bad amount, and
    /// `Validation` when the accounts are not a customer/bank pair.
    pub fn receive_payment(
        customer: &Account,
        bank: &Account,
        amount: Decimal,
        description: String,
        date: NaiveDate,
    ) -> Result<DualPostingPlan, LedgerError> {
        require_kind(customer, AccountKind::Customer)?;
        require_kind(bank, AccountKind::Bank)?;
        check_amount(amount)?;

        Ok(DualPostingPlan {
            dependent: PostingLeg {
                account_id: bank.id,
                input: NewEntry {
                    kind: EntryKind::Credit,
                    amount,
                    secondary_amount: None,
                    rate: None,
                    description: description.clone(),
                    date,
                },
            },
            primary: PostingLeg {
                account_id: customer.id,
                input: NewEntry {
                    kind: EntryKind::Payment,
                    amount,
                    secondary_amount: None,
                    rate: None,
                    description,
                    date,
                },
            },
        })
    }
}

fn require_kind(account: &Account, expected: AccountKind) -> Result<(), LedgerError> {
    if account.kind == expected {
        Ok(())
    } else {
        Err(LedgerError::Validation(format!(
            "expected a {expected} account, got {} ({})",
            account.kind, account.id
        )))
    }
}

fn check_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount.is_zero() {
        return Err(LedgerError::ZeroAmount);
    }
    if amount < Decimal::ZERO {
        return Err(LedgerError::NegativeAmount);
    }
    Ok(())
}

fn check_rate(rate: Decimal) -> Result<(), LedgerError> {
    if rate <= Decimal::ZERO {
        return Err(LedgerError::InvalidRate { rate });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::RoundingStrategy;
    use rust_decimal_macros::dec;

    fn sample_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 20).unwrap()
    }

    fn customer() -> Account {
        Account::new(
            AccountKind::Customer,
            "Rahim Traders".to_string(),
            None,
            Decimal::ZERO,
        )
    }

    fn supplier() -> Account {
        Account::new(
            AccountKind::Supplier,
            "Guangzhou Textiles".to_string(),
            None,
            Decimal::ZERO,
        )
    }

    fn bank() -> Account {
        Account::new(AccountKind::Bank, "City Bank".to_string(), None, dec!(1000))
    }

    #[test]
    fn test_create_order_amounts() {
        let plan = DualPosting::create_order(
            &customer(),
            &supplier(),
            dec!(1000),
            dec!(16.5),
            dec!(7.2),
            "spring stock".to_string(),
            sample_date(),
        )
        .unwrap();

        assert_eq!(plan.primary.input.kind, EntryKind::Order);
        assert_eq!(plan.primary.input.amount, dec!(16500));
        assert_eq!(plan.primary.input.rate, Some(dec!(16.5)));
        assert_eq!(plan.primary.input.secondary_amount, Some(dec!(1000)));

        assert_eq!(plan.dependent.input.kind, EntryKind::Bill);
        // 1000/7.2 keeps full precision; only display rounds to 138.89.
        assert_ne!(plan.dependent.input.amount, dec!(138.89));
        assert_eq!(
            plan.dependent
                .input
                .amount
                .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven),
            dec!(138.89)
        );
        assert_eq!(plan.dependent.input.rate, Some(dec!(7.2)));
    }

    #[test]
    fn test_create_order_rejects_bad_rates() {
        let err = DualPosting::create_order(
            &customer(),
            &supplier(),
            dec!(1000),
            dec!(16.5),
            Decimal::ZERO,
            String::new(),
            sample_date(),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRate { rate } if rate == Decimal::ZERO));

        let err = DualPosting::create_order(
            &customer(),
            &supplier(),
            dec!(1000),
            dec!(-1),
            dec!(7.2),
            String::new(),
            sample_date(),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRate { .. }));
    }

    #[test]
    fn test_create_order_rejects_bad_amount() {
        let err = DualPosting::create_order(
            &customer(),
            &supplier(),
            Decimal::ZERO,
            dec!(16.5),
            dec!(7.2),
            String::new(),
            sample_date(),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::ZeroAmount));
    }

    #[test]
    fn test_create_order_rejects_wrong_account_kinds() {
        let err = DualPosting::create_order(
            &supplier(),
            &supplier(),
            dec!(1000),
            dec!(16.5),
            dec!(7.2),
            String::new(),
            sample_date(),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_receive_payment_shapes() {
        let plan = DualPosting::receive_payment(
            &customer(),
            &bank(),
            dec!(5000),
            "march dues".to_string(),
            sample_date(),
        )
        .unwrap();

        assert_eq!(plan.dependent.input.kind, EntryKind::Credit);
        assert_eq!(plan.dependent.input.amount, dec!(5000));
        assert_eq!(plan.primary.input.kind, EntryKind::Payment);
        assert_eq!(plan.primary.input.amount, dec!(5000));
    }

    #[test]
    fn test_materialize_cross_links_both_entries() {
        let customer = customer();
        let bank = bank();
        let posting = DualPosting::receive_payment(
            &customer,
            &bank,
            dec!(5000),
            String::new(),
            sample_date(),
        )
        .unwrap()
        .materialize();

        assert_eq!(posting.dependent.account_id, bank.id);
        assert_eq!(posting.primary.account_id, customer.id);
        assert_eq!(posting.dependent.linked_account_id, Some(customer.id));
        assert_eq!(posting.primary.linked_account_id, Some(bank.id));
        assert_eq!(posting.dependent.linked_entry_id, Some(posting.primary.id));
        assert_eq!(posting.primary.linked_entry_id, Some(posting.dependent.id));
    }

    #[test]
    fn test_materialized_deltas_have_opposite_directions() {
        let posting = DualPosting::receive_payment(
            &customer(),
            &bank(),
            dec!(5000),
            String::new(),
            sample_date(),
        )
        .unwrap()
        .materialize();

        // Bank gains the money, the customer's receivable shrinks.
        assert_eq!(posting.dependent.delta(), dec!(5000));
        assert_eq!(posting.primary.delta(), dec!(-5000));
    }
}

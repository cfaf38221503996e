//! Account and entry kind classifications.
//!
//! Every account belongs to one counterparty kind, and each kind permits a
//! fixed set of entry kinds denominated in the kind's native unit. The
//! pairing drives the balance delta rule in `entry::LedgerEntry::delta`.

use serde::{Deserialize, Serialize};
use std::fmt;

use khata_shared::types::Unit;

/// Counterparty classification for an account.
///
/// Balance sign conventions differ by kind:
/// - `Bank`/`Wallet`: positive balance = asset held by the business.
/// - `Customer`/`Agent`: positive balance = the business owes the counterparty.
/// - `Supplier`: positive balance = liability in USD; net-worth aggregation
///   inverts the sign before summing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// A customer ordering goods, tracked in BDT.
    Customer,
    /// A supplier billing for stock, tracked in USD.
    Supplier,
    /// An exchange agent moving DHS, tracked in BDT.
    Agent,
    /// A bank account, tracked in BDT.
    Bank,
    /// A cash wallet, tracked in USD.
    Wallet,
}

impl AccountKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Supplier => "supplier",
            Self::Agent => "agent",
            Self::Bank => "bank",
            Self::Wallet => "wallet",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "customer" => Some(Self::Customer),
            "supplier" => Some(Self::Supplier),
            "agent" => Some(Self::Agent),
            "bank" => Some(Self::Bank),
            "wallet" => Some(Self::Wallet),
            _ => None,
        }
    }

    /// The unit every balance and entry amount for this kind is stored in.
    #[must_use]
    pub fn native_unit(&self) -> Unit {
        match self {
            Self::Customer | Self::Agent | Self::Bank => Unit::Bdt,
            Self::Supplier | Self::Wallet => Unit::Usd,
        }
    }

    /// True if a withdrawal may never drive this kind's balance negative.
    ///
    /// Customer, supplier, and agent balances go negative freely: negative
    /// there means "they owe you".
    #[must_use]
    pub fn blocks_overdraft(&self) -> bool {
        matches!(self, Self::Bank | Self::Wallet)
    }

    /// True if `kind` is a permitted entry kind for this account kind.
    #[must_use]
    pub fn allows(&self, kind: EntryKind) -> bool {
        match self {
            Self::Customer => matches!(kind, EntryKind::Order | EntryKind::Payment),
            Self::Supplier => matches!(kind, EntryKind::Bill | EntryKind::Payment),
            Self::Agent => matches!(kind, EntryKind::Dhs | EntryKind::Payment),
            Self::Bank => matches!(
                kind,
                EntryKind::Deposit | EntryKind::Withdraw | EntryKind::Credit | EntryKind::Debit
            ),
            Self::Wallet => matches!(kind, EntryKind::Deposit | EntryKind::Withdraw),
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The kind of a ledger entry, determining its balance delta sign.
///
/// Accumulating kinds (`Order`, `Bill`, `Dhs`, `Deposit`, `Credit`) add the
/// entry amount to the balance; reducing kinds (`Payment`, `Withdraw`,
/// `Debit`) subtract it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Customer order for goods (+BDT owed).
    Order,
    /// Supplier bill for stock (+USD owed).
    Bill,
    /// Settles part of a customer/supplier/agent balance (-native).
    Payment,
    /// Agent exchange posting: BDT handed over against DHS (+BDT owed).
    Dhs,
    /// Money into a bank or wallet (+).
    Deposit,
    /// Money out of a bank or wallet (-), guarded against overdraft.
    Withdraw,
    /// Bank-side mirror of a customer payment received (+).
    Credit,
    /// Bank-side mirror of an outgoing payment (-).
    Debit,
}

impl EntryKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Bill => "bill",
            Self::Payment => "payment",
            Self::Dhs => "dhs",
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "order" => Some(Self::Order),
            "bill" => Some(Self::Bill),
            "payment" => Some(Self::Payment),
            "dhs" => Some(Self::Dhs),
            "deposit" => Some(Self::Deposit),
            "withdraw" => Some(Self::Withdraw),
            "credit" => Some(Self::Credit),
            "debit" => Some(Self::Debit),
            _ => None,
        }
    }

    /// True if this kind subtracts from the balance.
    #[must_use]
    pub fn is_reduction(&self) -> bool {
        matches!(self, Self::Payment | Self::Withdraw | Self::Debit)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_native_units() {
        assert_eq!(AccountKind::Customer.native_unit(), Unit::Bdt);
        assert_eq!(AccountKind::Agent.native_unit(), Unit::Bdt);
        assert_eq!(AccountKind::Bank.native_unit(), Unit::Bdt);
        assert_eq!(AccountKind::Supplier.native_unit(), Unit::Usd);
        assert_eq!(AccountKind::Wallet.native_unit(), Unit::Usd);
    }

    #[test]
    fn test_overdraft_guard_applies_to_asset_kinds_only() {
        assert!(AccountKind::Bank.blocks_overdraft());
        assert!(AccountKind::Wallet.blocks_overdraft());
        assert!(!AccountKind::Customer.blocks_overdraft());
        assert!(!AccountKind::Supplier.blocks_overdraft());
        assert!(!AccountKind::Agent.blocks_overdraft());
    }

    #[rstest]
    #[case(AccountKind::Customer, EntryKind::Order, true)]
    #[case(AccountKind::Customer, EntryKind::Payment, true)]
    #[case(AccountKind::Customer, EntryKind::Bill, false)]
    #[case(AccountKind::Customer, EntryKind::Deposit, false)]
    #[case(AccountKind::Supplier, EntryKind::Bill, true)]
    #[case(AccountKind::Supplier, EntryKind::Payment, true)]
    #[case(AccountKind::Supplier, EntryKind::Order, false)]
    #[case(AccountKind::Agent, EntryKind::Dhs, true)]
    #[case(AccountKind::Agent, EntryKind::Payment, true)]
    #[case(AccountKind::Agent, EntryKind::Withdraw, false)]
    #[case(AccountKind::Bank, EntryKind::Deposit, true)]
    #[case(AccountKind::Bank, EntryKind::Withdraw, true)]
    #[case(AccountKind::Bank, EntryKind::Credit, true)]
    #[case(AccountKind::Bank, EntryKind::Debit, true)]
    #[case(AccountKind::Bank, EntryKind::Order, false)]
    #[case(AccountKind::Wallet, EntryKind::Deposit, true)]
    #[case(AccountKind::Wallet, EntryKind::Withdraw, true)]
    #[case(AccountKind::Wallet, EntryKind::Credit, false)]
    fn test_allowed_entry_kinds(
        #[case] account: AccountKind,
        #[case] entry: EntryKind,
        #[case] allowed: bool,
    ) {
        assert_eq!(account.allows(entry), allowed);
    }

    #[test]
    fn test_reduction_kinds() {
        assert!(EntryKind::Payment.is_reduction());
        assert!(EntryKind::Withdraw.is_reduction());
        assert!(EntryKind::Debit.is_reduction());
        assert!(!EntryKind::Order.is_reduction());
        assert!(!EntryKind::Bill.is_reduction());
        assert!(!EntryKind::Dhs.is_reduction());
        assert!(!EntryKind::Deposit.is_reduction());
        assert!(!EntryKind::Credit.is_reduction());
    }

    #[test]
    fn test_kind_parse_round_trip() {
        for kind in [
            AccountKind::Customer,
            AccountKind::Supplier,
            AccountKind::Agent,
            AccountKind::Bank,
            AccountKind::Wallet,
        ] {
            assert_eq!(AccountKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(AccountKind::parse("CUSTOMER"), Some(AccountKind::Customer));
        assert_eq!(AccountKind::parse("nope"), None);

        for kind in [
            EntryKind::Order,
            EntryKind::Bill,
            EntryKind::Payment,
            EntryKind::Dhs,
            EntryKind::Deposit,
            EntryKind::Withdraw,
            EntryKind::Credit,
            EntryKind::Debit,
        ] {
            assert_eq!(EntryKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EntryKind::parse("nope"), None);
    }
}

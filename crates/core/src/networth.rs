//! Net position aggregation across account kinds.
//!
//! Receivables and assets are tracked in two currencies: customer, agent,
//! and bank balances sum into a BDT total, wallet balances into a USD
//! total. A supplier balance is a liability, so its sign is inverted
//! before it joins the USD total. Totals keep full precision; rounding is
//! for display only.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use khata_shared::types::Unit;

use crate::ledger::{Account, AccountKind};

/// Net position summary across all accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetWorth {
    /// Customers + agents + banks, in BDT.
    pub bdt_total: Decimal,
    /// Wallets minus suppliers, in USD.
    pub usd_total: Decimal,
    /// Per-kind breakdown in a fixed display order.
    pub kinds: Vec<KindBreakdown>,
}

/// Aggregate position for one account kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindBreakdown {
    /// The account kind.
    pub kind: AccountKind,
    /// The kind's native unit.
    pub unit: Unit,
    /// Sum of balances, uninverted.
    pub total: Decimal,
    /// Number of accounts of this kind.
    pub accounts: usize,
}

const KIND_ORDER: [AccountKind; 5] = [
    AccountKind::Customer,
    AccountKind::Supplier,
    AccountKind::Agent,
    AccountKind::Bank,
    AccountKind::Wallet,
];

/// Sums account balances into a net position summary.
#[must_use]
pub fn net_worth<'a, I>(accounts: I) -> NetWorth
where
    I: IntoIterator<Item = &'a Account>,
{
    let mut kinds: Vec<KindBreakdown> = KIND_ORDER
        .iter()
        .map(|&kind| KindBreakdown {
            kind,
            unit: kind.native_unit(),
            total: Decimal::ZERO,
            accounts: 0,
        })
        .collect();

    for account in accounts {
        let slot = KIND_ORDER
            .iter()
            .position(|&k| k == account.kind)
            .unwrap_or(0);
        kinds[slot].total += account.balance;
        kinds[slot].accounts += 1;
    }

    let total_of = |kind: AccountKind| -> Decimal {
        kinds
            .iter()
            .find(|b| b.kind == kind)
            .map_or(Decimal::ZERO, |b| b.total)
    };

    NetWorth {
        bdt_total: total_of(AccountKind::Customer)
            + total_of(AccountKind::Agent)
            + total_of(AccountKind::Bank),
        usd_total: total_of(AccountKind::Wallet) - total_of(AccountKind::Supplier),
        kinds,
    }
}

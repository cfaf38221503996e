//! Balance guards shared by every mutation path.

use rust_decimal::Decimal;

use khata_shared::types::AccountId;

use super::entry::LedgerEntry;
use super::error::LedgerError;
use super::kind::AccountKind;

/// Rejects a reducing entry that would overdraw a guarded account.
///
/// Banks and wallets hold real money and may never go negative. Customer,
/// supplier, and agent balances are receivables and payables; negative is a
/// meaningful position there and passes freely.
///
/// # Errors
///
/// Returns `InsufficientBalance` when the entry reduces a guarded account
/// below zero.
pub fn check_withdrawal(
    kind: AccountKind,
    account_id: AccountId,
    balance: Decimal,
    entry: &LedgerEntry,
) -> Result<(), LedgerError> {
    if kind.blocks_overdraft() && entry.kind.is_reduction() && balance < entry.amount {
        return Err(LedgerError::InsufficientBalance {
            account_id,
            balance,
            requested: entry.amount,
        });
    }
    Ok(())
}

//! Ledger entry domain types.
//!
//! Entries are immutable records: once applied, an entry only changes
//! through the edit protocol (reverse, then reapply a revised copy under
//! the same id). Conversion rates are frozen into the entry at creation so
//! later rate assumptions never touch history.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use khata_shared::types::{AccountId, EntryId};

use super::error::LedgerError;
use super::kind::{AccountKind, EntryKind};
use crate::fx;

/// A single immutable ledger entry on one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier for this entry.
    pub id: EntryId,
    /// The account this entry belongs to.
    pub account_id: AccountId,
    /// Entry kind, fixing the delta sign.
    pub kind: EntryKind,
    /// Amount in the account's native unit. Always positive; the kind
    /// carries the sign.
    pub amount: Decimal,
    /// Raw cross-unit amount the native amount was derived from, if any.
    pub secondary_amount: Option<Decimal>,
    /// Conversion rate frozen at creation, if any.
    pub rate: Option<Decimal>,
    /// Free-form description.
    pub description: String,
    /// Business date of the transaction.
    pub date: NaiveDate,
    /// Creation instant; the ordering key for entry listings.
    pub timestamp: DateTime<Utc>,
    /// Record creation instant.
    pub created_at: DateTime<Utc>,
    /// Counterpart account for dual-posted entries.
    pub linked_account_id: Option<AccountId>,
    /// Counterpart entry for dual-posted entries.
    pub linked_entry_id: Option<EntryId>,
}

impl LedgerEntry {
    /// Returns the signed balance delta this entry applies.
    #[must_use]
    pub fn delta(&self) -> Decimal {
        if self.kind.is_reduction() {
            -self.amount
        } else {
            self.amount
        }
    }

    /// Returns the delta that undoes this entry.
    #[must_use]
    pub fn reverse_delta(&self) -> Decimal {
        -self.delta()
    }

    /// True if this entry is one side of a dual posting.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.linked_entry_id.is_some()
    }

    /// Builds the revised copy of this entry for the edit protocol.
    ///
    /// Identity, link fields, and creation instants are preserved; the
    /// mutable fields are replaced from `new`.
    #[must_use]
    pub fn revised(&self, new: &NewEntry) -> Self {
        Self {
            id: self.id,
            account_id: self.account_id,
            kind: new.kind,
            amount: new.amount,
            secondary_amount: new.secondary_amount,
            rate: new.rate,
            description: new.description.clone(),
            date: new.date,
            timestamp: self.timestamp,
            created_at: self.created_at,
            linked_account_id: self.linked_account_id,
            linked_entry_id: self.linked_entry_id,
        }
    }
}

/// Input for posting a new entry to an account.
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// Entry kind.
    pub kind: EntryKind,
    /// Amount in the account's native unit.
    pub amount: Decimal,
    /// Raw cross-unit amount, if the native amount was derived.
    pub secondary_amount: Option<Decimal>,
    /// Conversion rate to freeze into the entry, if any.
    pub rate: Option<Decimal>,
    /// Free-form description.
    pub description: String,
    /// Business date of the transaction.
    pub date: NaiveDate,
}

impl NewEntry {
    /// Builds an entry input from raw user-facing fields, applying the
    /// kind-specific amount interpretation.
    ///
    /// Agent entries denominate differently from everything else: an
    /// exchange (`dhs`) entry's amount arrives in BDT with the DHS
    /// equivalent derived, while an agent payment's amount arrives in DHS
    /// and converts to BDT at `rate`. All other kinds take `amount` in the
    /// account's native unit as-is.
    ///
    /// # Errors
    ///
    /// Returns a validation error for non-positive amounts, kinds the
    /// account does not permit, and missing or non-positive rates where a
    /// conversion is required.
    pub fn from_parts(
        account_kind: AccountKind,
        kind: EntryKind,
        amount: Decimal,
        rate: Option<Decimal>,
        description: String,
        date: NaiveDate,
    ) -> Result<Self, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        if amount.is_sign_negative() {
            return Err(LedgerError::NegativeAmount);
        }
        if !account_kind.allows(kind) {
            return Err(LedgerError::EntryKindMismatch {
                account_kind,
                entry_kind: kind,
            });
        }
        if let Some(rate) = rate
            && rate <= Decimal::ZERO
        {
            return Err(LedgerError::InvalidRate { rate });
        }

        let entry = match (account_kind, kind) {
            (AccountKind::Agent, EntryKind::Dhs) => {
                let rate = rate.ok_or(LedgerError::RateRequired)?;
                Self {
                    kind,
                    amount,
                    secondary_amount: Some(fx::dhs_from_bdt(amount, rate)),
                    rate: Some(rate),
                    description,
                    date,
                }
            }
            (AccountKind::Agent, EntryKind::Payment) => {
                let rate = rate.ok_or(LedgerError::RateRequired)?;
                Self {
                    kind,
                    amount: fx::bdt_from_dhs(amount, rate),
                    secondary_amount: Some(amount),
                    rate: Some(rate),
                    description,
                    date,
                }
            }
            _ => Self {
                kind,
                amount,
                secondary_amount: None,
                rate,
                description,
                date,
            },
        };
        Ok(entry)
    }

    /// Materializes this input as an entry on `account_id`.
    #[must_use]
    pub fn into_entry(self, account_id: AccountId) -> LedgerEntry {
        let now = Utc::now();
        LedgerEntry {
            id: EntryId::new(),
            account_id,
            kind: self.kind,
            amount: self.amount,
            secondary_amount: self.secondary_amount,
            rate: self.rate,
            description: self.description,
            date: self.date,
            timestamp: now,
            created_at: now,
            linked_account_id: None,
            linked_entry_id: None,
        }
    }

    /// Materializes this input as one side of a dual posting.
    #[must_use]
    pub fn into_linked_entry(
        self,
        account_id: AccountId,
        linked_account_id: AccountId,
        linked_entry_id: Option<EntryId>,
    ) -> LedgerEntry {
        let mut entry = self.into_entry(account_id);
        entry.linked_account_id = Some(linked_account_id);
        entry.linked_entry_id = linked_entry_id;
        entry
    }
}

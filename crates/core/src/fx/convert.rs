//! Cross-unit conversion functions.
//!
//! CRITICAL: conversions never round. Balances accumulate at full precision
//! and only presentation rounds (see `khata_shared::types::Money`).
//!
//! Division guards: a non-positive rate degrades the result to zero instead
//! of panicking, so committed entries with bad historical rates stay
//! renderable. Callers that require a usable rate reject non-positive rates
//! before commit.

use rust_decimal::Decimal;

/// Converts a BDT amount to its DHS equivalent at `rate` (BDT per DHS).
///
/// Returns zero when `rate` is not positive.
#[must_use]
pub fn dhs_from_bdt(bdt_amount: Decimal, rate: Decimal) -> Decimal {
    if rate > Decimal::ZERO {
        bdt_amount / rate
    } else {
        Decimal::ZERO
    }
}

/// Converts a DHS amount to BDT at `rate` (BDT per DHS).
#[must_use]
pub fn bdt_from_dhs(dhs_amount: Decimal, rate: Decimal) -> Decimal {
    dhs_amount * rate
}

/// Converts an RMB amount to USD at `rate` (RMB per USD).
///
/// Returns zero when `rate` is not positive.
#[must_use]
pub fn usd_from_rmb(rmb_amount: Decimal, rate: Decimal) -> Decimal {
    if rate > Decimal::ZERO {
        rmb_amount / rate
    } else {
        Decimal::ZERO
    }
}

/// Converts an RMB amount to BDT at `rate` (BDT per RMB).
#[must_use]
pub fn bdt_from_rmb(rmb_amount: Decimal, rate: Decimal) -> Decimal {
    rmb_amount * rate
}

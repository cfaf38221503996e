//! Money type with decimal precision and ledger units.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Represents a monetary amount with its ledger unit.
///
/// Uses `Decimal` internally to avoid floating-point precision errors.
/// Amounts keep full precision; rounding happens only at display time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount, full precision.
    pub amount: Decimal,
    /// Unit the amount is denominated in.
    pub unit: Unit,
}

/// Units amounts are denominated in.
///
/// `Dhs` is not an ISO currency: it is a locally defined exchange unit used
/// for agent transactions and converted to BDT via a per-entry rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Unit {
    /// Bangladeshi Taka
    Bdt,
    /// US Dollar
    Usd,
    /// Chinese Yuan
    Rmb,
    /// Local exchange unit for agent postings
    Dhs,
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, unit: Unit) -> Self {
        Self { amount, unit }
    }

    /// Creates a zero amount in the specified unit.
    #[must_use]
    pub fn zero(unit: Unit) -> Self {
        Self {
            amount: Decimal::ZERO,
            unit,
        }
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative()
    }

    /// Amount rounded to 2 decimal places for display (Banker's rounding).
    ///
    /// The stored amount is never rounded; balances accumulate at full
    /// precision and only presentation truncates.
    #[must_use]
    pub fn display_amount(&self) -> Decimal {
        self.amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.display_amount(), self.unit)
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bdt => write!(f, "BDT"),
            Self::Usd => write!(f, "USD"),
            Self::Rmb => write!(f, "RMB"),
            Self::Dhs => write!(f, "DHS"),
        }
    }
}

impl std::str::FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BDT" => Ok(Self::Bdt),
            "USD" => Ok(Self::Usd),
            "RMB" => Ok(Self::Rmb),
            "DHS" => Ok(Self::Dhs),
            _ => Err(format!("Unknown unit: {s}")),
        }
    }
}

//! Cross-unit conversion arithmetic.

pub mod convert;

#[cfg(test)]
mod props;

pub use convert::{bdt_from_dhs, bdt_from_rmb, dhs_from_bdt, usd_from_rmb};

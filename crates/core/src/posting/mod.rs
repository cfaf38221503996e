//! Dual posting, deletion cascades, and the mutation phase machine.
//!
//! This module implements the coordination logic layered on top of the
//! ledger:
//! - Two-leg posting plans for orders and payment receipts
//! - Delete planning with linked-entry cascades
//! - The phase machine every mutation request moves through
//! - Error types for posting operations

pub mod dual;
pub mod error;
pub mod pipeline;
pub mod reversal;

pub use dual::{DualPosting, DualPostingPlan, MaterializedPosting, PostingLeg};
pub use error::PostingError;
pub use pipeline::{MutationPhase, MutationPipeline};
pub use reversal::{DeletePlan, Removal, ReversalProtocol};

//! Mutation pipeline, account registry, and sync layer for Khata.
//!
//! The [`Engine`] ties the pieces together:
//! - an in-memory registry of materialized account states
//! - per-account mutation locks, taken in id order for dual postings
//! - a sync layer pushing every mutation to the remote store and
//!   mirroring materialized state into the local cache
//!
//! Mutations run through the phase machine in `khata_core::posting`. A
//! failed remote write never rolls local state back; the mutation finishes
//! `Degraded` and an explicit [`Engine::refresh`] flushes it later.

pub mod engine;
pub mod error;
pub mod outcome;
pub mod registry;
pub mod sync;

mod dual;
mod mutation;

pub use engine::Engine;
pub use error::EngineError;
pub use outcome::{DualPostingOutcome, MutationOutcome, PostedLeg, RefreshOutcome, Warning};
pub use registry::{AccountHandle, AccountRegistry};
pub use sync::SyncLayer;

//! External ledger access
//!
//! Read-only resolution of anchored identity documents. Publishing needs a
//! wallet-held key and is not part of this crate.

pub mod anchor;
pub mod memory;
pub mod resolver;

pub use anchor::AnchorRegistry;
pub use memory::InMemoryLedger;
pub use resolver::{AnchorRef, LedgerResolver};

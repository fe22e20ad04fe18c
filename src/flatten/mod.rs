//! Hierarchical flattening engine
//!
//! Turns the cursor's element stream into relational rows:
//! - `chain`: per-position identity contexts and sequence counters
//! - `row`: open (pending) and closed (emitted) row forms
//! - `shredder`: the depth-driven traversal, staging buffer and flush logic

pub mod chain;
pub mod row;
pub mod shredder;

pub use chain::IdentityChain;
pub use row::{Row, Value};
pub use shredder::{CancelToken, ShredSummary, Shredder};

//! The scdim update engine
//!
//! This crate implements the slowly-changing-dimension maintenance
//! engine on top of the `scdim-storage` table seam:
//! - DimensionConfig: attribute partitions, control-field names, dates
//! - KeyAllocator: monotone surrogate keys seeded from the table
//! - CurrentIndex: natural key → current-version cache
//! - classify / Verdict: batch change classification
//! - Dimension: the public surface (`update`, `insert`, `lookup`,
//!   counters)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod alloc;
pub mod classify;
pub mod config;
pub mod dimension;
pub mod index;

pub use alloc::KeyAllocator;
pub use classify::{classify, Classified, Incoming, Verdict};
pub use config::{DimensionConfig, ResolvedConfig};
pub use dimension::{Dimension, UpdateCounters};
pub use index::{CurrentEntry, CurrentIndex};

//! Storage seam for the scdim dimension engine
//!
//! This crate defines the tabular store the engine writes through:
//! - Table: flat, append-only, schema-typed table trait with
//!   coordinate-addressed access
//! - Predicate: conjunctive equality predicates with name-indexed
//!   bindings (no query strings)
//! - MemoryTable: the in-process reference implementation
//!
//! The engine assumes exclusive access to the table; implementations
//! borrow whatever file-level locking their medium provides.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod predicate;
pub mod table;

pub use memory::MemoryTable;
pub use predicate::{CompiledPredicate, Predicate};
pub use table::{Coord, Row, RowPatch, Table};

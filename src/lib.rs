//! # scdim
//!
//! A slowly-changing-dimension maintenance engine: Kimball Type 1 and
//! Type 2 semantics applied simultaneously on disjoint attribute
//! partitions of a versioned, append-only dimension table.
//!
//! Incoming batches of current-state rows are joined against the
//! dimension's natural keys and classified as new, unchanged, Type-1
//! modified, Type-2 modified, or both. Type-1 changes are overwritten
//! in place across all historical versions; Type-2 changes retire the
//! current version and open a new one at the engine's logical load
//! timestamp (`asof`).
//!
//! # Quick Start
//!
//! ```
//! use scdim::{
//!     Column, ColumnType, Dimension, DimensionConfig, MemoryTable, Record,
//!     Scalar, TableSchema,
//! };
//!
//! fn main() -> scdim::Result<()> {
//!     let schema = TableSchema::new(vec![
//!         Column::new("order", ColumnType::Text),
//!         Column::new("status", ColumnType::Text),
//!         Column::new("scd_id", ColumnType::Int),
//!         Column::new("scd_valid_from", ColumnType::Int),
//!         Column::new("scd_valid_to", ColumnType::Int),
//!         Column::new("scd_version", ColumnType::Int),
//!         Column::new("scd_current", ColumnType::Bool),
//!         Column::new("scd_hash", ColumnType::Text),
//!     ])?;
//!
//!     let config = DimensionConfig::new(
//!         vec!["order".into()],     // natural key
//!         vec![],                   // Type-1 attributes
//!         vec!["status".into()],    // Type-2 attributes
//!     )
//!     .asof("2015-10-23");
//!
//!     let mut dim = Dimension::open(MemoryTable::new(schema), config)?;
//!
//!     // First load: one new member at version 1
//!     dim.update(&[Record::from_pairs([
//!         ("order", Scalar::from("1")),
//!         ("status", Scalar::from("Open")),
//!     ])])?;
//!     assert_eq!(dim.new_rows(), 1);
//!
//!     // A Type-2 change retires version 1 and opens version 2
//!     dim.update(&[Record::from_pairs([
//!         ("order", Scalar::from("1")),
//!         ("status", Scalar::from("Closed")),
//!     ])])?;
//!     assert_eq!(dim.updated_type2_rows(), 1);
//!
//!     let current = dim
//!         .lookup(&Record::from_pairs([("order", Scalar::from("1"))]))?
//!         .expect("member exists");
//!     assert_eq!(current.get("scd_version"), Some(&Scalar::Int(2)));
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! | Crate | Responsibility |
//! |-------|----------------|
//! | `scdim-core` | scalars, records, schemas, fingerprints, errors |
//! | `scdim-storage` | the abstract [`Table`] seam and [`MemoryTable`] |
//! | `scdim-engine` | classification and mutation: [`Dimension`] |
//!
//! The engine is single-threaded and assumes exclusive access to the
//! backing table. All date-bearing control fields are i64 nanoseconds
//! since the Unix epoch; dates are supplied as `YYYY-MM-DD` strings.

pub use scdim_core::{
    fingerprint, parse_date_nanos, today_nanos, Column, ColumnType, Error, NaturalKey,
    Record, Result, Scalar, TableSchema, DEFAULT_MAXTO, FINGERPRINT_LEN,
};
pub use scdim_engine::{
    classify, Classified, CurrentEntry, CurrentIndex, Dimension, DimensionConfig,
    Incoming, KeyAllocator, ResolvedConfig, UpdateCounters, Verdict,
};
pub use scdim_storage::{Coord, MemoryTable, Predicate, Row, RowPatch, Table};

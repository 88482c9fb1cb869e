//! Core types for the scdim dimension engine
//!
//! This crate defines the foundational types shared by the storage seam
//! and the update engine:
//! - Scalar: unified value enum with canonical rendering
//! - NaturalKey: hashable lookup-attribute tuple
//! - Record: order-preserving batch row
//! - TableSchema / Column / ColumnType: flat table schemas
//! - fingerprint: SHA-1 row digests
//! - time: `YYYY-MM-DD` parsing to epoch nanoseconds
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod fingerprint;
pub mod record;
pub mod schema;
pub mod time;
pub mod value;

// Re-export commonly used types at the crate root
pub use error::{Error, Result};
pub use fingerprint::{fingerprint, FINGERPRINT_LEN};
pub use record::Record;
pub use schema::{Column, ColumnType, TableSchema};
pub use time::{parse_date_nanos, today_nanos, DEFAULT_MAXTO};
pub use value::{NaturalKey, Scalar};

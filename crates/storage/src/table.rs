//! Tabular store abstraction
//!
//! The engine consumes an abstract table handle: a flat, append-only,
//! schema-typed table with coordinate-addressed row access and
//! predicate-filtered scans. Implementations may back this with a
//! columnar file, an embedded database, or plain memory.

use crate::predicate::Predicate;
use scdim_core::{Result, Scalar, TableSchema};
use std::fmt;

/// Stable storage coordinate of one row.
///
/// Tables are append-only and never remove or move rows, so a coordinate
/// handed out once stays valid for the lifetime of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord(pub u64);

impl Coord {
    /// The coordinate as a usize index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// One stored row, aligned with the table schema's column order.
pub type Row = Vec<Scalar>;

/// Coordinate-addressed partial update of one row.
#[derive(Debug, Clone)]
pub struct RowPatch {
    /// Row to modify.
    pub coord: Coord,
    /// `(column position, new value)` assignments.
    pub fields: Vec<(usize, Scalar)>,
}

impl RowPatch {
    /// Create a patch for the row at `coord`.
    pub fn new(coord: Coord) -> Self {
        Self {
            coord,
            fields: Vec::new(),
        }
    }

    /// Add a field assignment by column position.
    pub fn set(mut self, position: usize, value: impl Into<Scalar>) -> Self {
        self.fields.push((position, value.into()));
        self
    }
}

/// A flat, append-only, schema-typed table.
///
/// All methods take `&mut self` even for reads: access is serialized by
/// design, mirroring the single-writer discipline of the engine.
/// Predicate scans without an index are permitted to be O(N).
pub trait Table: Send + Sync {
    /// The table's schema.
    fn schema(&self) -> &TableSchema;

    /// Number of rows currently stored.
    fn row_count(&self) -> u64;

    /// Append rows in order; returns the coordinate of the first one.
    ///
    /// # Errors
    ///
    /// Returns `Error::Schema` if a row has the wrong arity or a value
    /// that does not fit its column type, `Error::Storage` on write
    /// failure. Appending an empty batch is a no-op and returns the
    /// would-be next coordinate.
    fn append(&mut self, rows: Vec<Row>) -> Result<Coord>;

    /// Rows matching `predicate`, optionally projected onto `columns`
    /// (values returned in the requested column order).
    ///
    /// # Errors
    ///
    /// Returns `Error::Schema` for unknown columns, `Error::Storage` on
    /// read failure.
    fn select(
        &mut self,
        predicate: &Predicate,
        columns: Option<&[String]>,
    ) -> Result<Vec<(Coord, Row)>>;

    /// Coordinates of rows matching `predicate`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Schema` for unknown columns, `Error::Storage` on
    /// read failure.
    fn coords(&mut self, predicate: &Predicate) -> Result<Vec<Coord>>;

    /// Read the full row at a coordinate.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if the coordinate is out of range.
    fn read(&mut self, coord: Coord) -> Result<Row>;

    /// Apply a bulk coordinate-addressed update.
    ///
    /// Either every patch applies or none does; patches are validated
    /// before the first write.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` for out-of-range coordinates or
    /// positions, `Error::Schema` for values that do not fit their
    /// column type.
    fn write(&mut self, patches: &[RowPatch]) -> Result<()>;

    /// Maximum value of an integer column, or `None` if the table is
    /// empty or the column holds only nulls.
    ///
    /// # Errors
    ///
    /// Returns `Error::Schema` if the column is missing or not an
    /// integer column, `Error::Storage` on read failure.
    fn max_int(&mut self, column: &str) -> Result<Option<i64>>;

    /// Flush any buffered data to the underlying medium.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` or `Error::Io` on failure.
    fn flush(&mut self) -> Result<()>;
}

//! In-memory table
//!
//! `MemoryTable` is the reference implementation of [`Table`]: a plain
//! row vector with full-scan predicate evaluation. It enforces schema
//! arity and typing on every write path so the engine can rely on typed
//! rows coming back out.

use crate::predicate::Predicate;
use crate::table::{Coord, Row, RowPatch, Table};
use scdim_core::{ColumnType, Error, Result, Scalar, TableSchema};
use std::fmt;
use tracing::trace;

/// Vector-backed table with O(N) scans.
pub struct MemoryTable {
    schema: TableSchema,
    rows: Vec<Row>,
}

impl MemoryTable {
    /// Create an empty table with the given schema.
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// All rows, in coordinate order. Intended for tests and bulk export.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    fn check_row(&self, row: &Row) -> Result<()> {
        if row.len() != self.schema.len() {
            return Err(Error::Schema(format!(
                "row has {} values, table has {} columns",
                row.len(),
                self.schema.len()
            )));
        }
        for (value, column) in row.iter().zip(self.schema.columns()) {
            if !value.fits(column.ty) {
                return Err(Error::Schema(format!(
                    "value {:?} does not fit column '{}' ({})",
                    value, column.name, column.ty
                )));
            }
        }
        Ok(())
    }

    fn check_coord(&self, coord: Coord) -> Result<()> {
        if coord.index() >= self.rows.len() {
            return Err(Error::Storage(format!(
                "coordinate {} out of range (row count {})",
                coord,
                self.rows.len()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for MemoryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "memory[{} rows]", self.rows.len())
    }
}

impl Table for MemoryTable {
    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn row_count(&self) -> u64 {
        self.rows.len() as u64
    }

    fn append(&mut self, rows: Vec<Row>) -> Result<Coord> {
        for row in &rows {
            self.check_row(row)?;
        }
        let first = Coord(self.rows.len() as u64);
        trace!(appended = rows.len(), at = %first, "append");
        self.rows.extend(rows);
        Ok(first)
    }

    fn select(
        &mut self,
        predicate: &Predicate,
        columns: Option<&[String]>,
    ) -> Result<Vec<(Coord, Row)>> {
        let compiled = predicate.compile(&self.schema)?;
        let projection = match columns {
            Some(names) => {
                let mut positions = Vec::with_capacity(names.len());
                for name in names {
                    positions.push(self.schema.require(name)?);
                }
                Some(positions)
            }
            None => None,
        };

        let mut out = Vec::new();
        for (i, row) in self.rows.iter().enumerate() {
            if !compiled.matches(row) {
                continue;
            }
            let values = match &projection {
                Some(positions) => positions.iter().map(|p| row[*p].clone()).collect(),
                None => row.clone(),
            };
            out.push((Coord(i as u64), values));
        }
        Ok(out)
    }

    fn coords(&mut self, predicate: &Predicate) -> Result<Vec<Coord>> {
        let compiled = predicate.compile(&self.schema)?;
        Ok(self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| compiled.matches(row))
            .map(|(i, _)| Coord(i as u64))
            .collect())
    }

    fn read(&mut self, coord: Coord) -> Result<Row> {
        self.check_coord(coord)?;
        Ok(self.rows[coord.index()].clone())
    }

    fn write(&mut self, patches: &[RowPatch]) -> Result<()> {
        // Validate everything before mutating anything.
        for patch in patches {
            self.check_coord(patch.coord)?;
            for (position, value) in &patch.fields {
                if *position >= self.schema.len() {
                    return Err(Error::Storage(format!(
                        "column position {} out of range",
                        position
                    )));
                }
                let column = self.schema.column(*position);
                if !value.fits(column.ty) {
                    return Err(Error::Schema(format!(
                        "value {:?} does not fit column '{}' ({})",
                        value, column.name, column.ty
                    )));
                }
            }
        }
        for patch in patches {
            let row = &mut self.rows[patch.coord.index()];
            for (position, value) in &patch.fields {
                row[*position] = value.clone();
            }
        }
        trace!(patched = patches.len(), "write");
        Ok(())
    }

    fn max_int(&mut self, column: &str) -> Result<Option<i64>> {
        let position = self.schema.require(column)?;
        if self.schema.column(position).ty != ColumnType::Int {
            return Err(Error::Schema(format!(
                "column '{}' is not an integer column",
                column
            )));
        }
        Ok(self
            .rows
            .iter()
            .filter_map(|row| match row[position] {
                Scalar::Int(i) => Some(i),
                _ => None,
            })
            .max())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

//! Equality predicates with name-indexed bindings
//!
//! A [`Predicate`] is a conjunction of `column = value` terms. The
//! engine builds two shapes of it (match-all-versions-of-key and
//! match-current-version-of-key) instead of assembling query strings.

use scdim_core::{Result, Scalar, TableSchema};

/// Conjunctive equality predicate over named columns.
///
/// An empty predicate matches every row.
#[derive(Debug, Clone, Default)]
pub struct Predicate {
    terms: Vec<(String, Scalar)>,
}

impl Predicate {
    /// Create an empty predicate (matches all rows).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality term for `column`.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.terms.push((column.into(), value.into()));
        self
    }

    /// The predicate's `(column, value)` bindings.
    pub fn terms(&self) -> &[(String, Scalar)] {
        &self.terms
    }

    /// Resolve column names against a schema once, for repeated matching.
    ///
    /// # Errors
    ///
    /// Returns `Error::Schema` if a bound column does not exist.
    pub fn compile(&self, schema: &TableSchema) -> Result<CompiledPredicate> {
        let mut terms = Vec::with_capacity(self.terms.len());
        for (name, value) in &self.terms {
            terms.push((schema.require(name)?, value.clone()));
        }
        Ok(CompiledPredicate { terms })
    }

    /// Evaluate the predicate against a single row.
    ///
    /// # Errors
    ///
    /// Returns `Error::Schema` if a bound column does not exist.
    pub fn matches(&self, schema: &TableSchema, row: &[Scalar]) -> Result<bool> {
        Ok(self.compile(schema)?.matches(row))
    }
}

/// A predicate with column names resolved to positions.
#[derive(Debug, Clone)]
pub struct CompiledPredicate {
    terms: Vec<(usize, Scalar)>,
}

impl CompiledPredicate {
    /// Evaluate against a row aligned with the schema this was compiled for.
    ///
    /// Equality follows [`Scalar::key_eq`]: two nulls match, floats
    /// compare by bit pattern.
    pub fn matches(&self, row: &[Scalar]) -> bool {
        self.terms
            .iter()
            .all(|(pos, value)| row[*pos].key_eq(value))
    }
}

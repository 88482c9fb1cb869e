//! Surrogate-key allocation
//!
//! Surrogate keys are strictly increasing i64s, seeded from the
//! persisted maximum at engine construction. The allocator is
//! deliberately not thread-safe: the engine serializes all access.

use scdim_core::Result;
use scdim_storage::Table;

/// Monotonically increasing surrogate-key generator.
#[derive(Debug)]
pub struct KeyAllocator {
    last: i64,
}

impl KeyAllocator {
    /// Create an allocator that will hand out `last + 1` next.
    pub fn seeded(last: i64) -> Self {
        Self { last }
    }

    /// Seed from the persisted maximum of the surrogate-key column.
    ///
    /// An empty table seeds at 0, so the first allocated id is 1. A
    /// read failure surfaces as-is: silently falling back to 0 would
    /// hand out duplicate keys.
    pub fn load(table: &mut dyn Table, column: &str) -> Result<Self> {
        let max = table.max_int(column)?;
        Ok(Self::seeded(max.unwrap_or(0)))
    }

    /// Allocate the next surrogate key (pre-increment).
    pub fn next(&mut self) -> i64 {
        self.last += 1;
        self.last
    }

    /// The most recently allocated (or seeded) key.
    pub fn last(&self) -> i64 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scdim_core::{Column, ColumnType, Scalar, TableSchema};
    use scdim_storage::MemoryTable;

    fn id_table(ids: &[i64]) -> MemoryTable {
        let schema =
            TableSchema::new(vec![Column::new("scd_id", ColumnType::Int)]).unwrap();
        let mut table = MemoryTable::new(schema);
        table
            .append(ids.iter().map(|i| vec![Scalar::Int(*i)]).collect())
            .unwrap();
        table
    }

    #[test]
    fn test_empty_table_starts_at_one() {
        let mut table = id_table(&[]);
        let mut alloc = KeyAllocator::load(&mut table, "scd_id").unwrap();
        assert_eq!(alloc.next(), 1);
        assert_eq!(alloc.next(), 2);
    }

    #[test]
    fn test_seeds_from_persisted_max() {
        let mut table = id_table(&[3, 7, 5]);
        let mut alloc = KeyAllocator::load(&mut table, "scd_id").unwrap();
        assert_eq!(alloc.next(), 8);
    }

    #[test]
    fn test_load_failure_surfaces() {
        let mut table = id_table(&[]);
        assert!(KeyAllocator::load(&mut table, "wrong_column").is_err());
    }

    #[test]
    fn test_strictly_increasing() {
        let mut alloc = KeyAllocator::seeded(0);
        let mut prev = 0;
        for _ in 0..100 {
            let id = alloc.next();
            assert!(id > prev);
            prev = id;
        }
        assert_eq!(alloc.last(), 100);
    }
}

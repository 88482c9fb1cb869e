//! Universal engine invariants
//!
//! Property-driven checks over randomized update sequences:
//! - idempotence: replaying a batch is a no-op
//! - monotone surrogate keys: the increment equals the inserts performed
//! - single current row per natural key
//! - version-chain contiguity and hash integrity (via `Dimension::verify`)
//! - counter correctness against the rows on disk

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scdim::{
    Column, ColumnType, Dimension, DimensionConfig, MemoryTable, Record, Scalar,
    TableSchema,
};

/// Fixed seed for the deterministic random walk.
const WALK_SEED: u64 = 0xD1B2_5EED_0451_C0DE;

const STATUSES: [&str; 4] = ["Open", "Packed", "Shipped", "Delivered"];
const CURRENCIES: [&str; 3] = ["USD", "EUR", "JPY"];

/// Position of `scd_id` in `orders_schema`.
const COL_ID: usize = 4;
/// Position of `scd_current` in `orders_schema`.
const COL_CURRENT: usize = 8;

fn orders_schema() -> TableSchema {
    TableSchema::new(vec![
        Column::new("order", ColumnType::Text),
        Column::new("line", ColumnType::Int),
        Column::new("status", ColumnType::Text),
        Column::new("currency", ColumnType::Text),
        Column::new("scd_id", ColumnType::Int),
        Column::new("scd_valid_from", ColumnType::Int),
        Column::new("scd_valid_to", ColumnType::Int),
        Column::new("scd_version", ColumnType::Int),
        Column::new("scd_current", ColumnType::Bool),
        Column::new("scd_hash", ColumnType::Text),
    ])
    .unwrap()
}

fn orders_config() -> DimensionConfig {
    DimensionConfig::new(
        vec!["order".to_string(), "line".to_string()],
        vec!["status".to_string()],
        vec!["currency".to_string()],
    )
    .asof("2015-10-23")
}

fn order_row(order: u8, line: u8, status: usize, currency: usize) -> Record {
    Record::from_pairs([
        ("order", Scalar::Text(order.to_string())),
        ("line", Scalar::Int(line as i64)),
        ("status", Scalar::from(STATUSES[status % STATUSES.len()])),
        ("currency", Scalar::from(CURRENCIES[currency % CURRENCIES.len()])),
    ])
}

fn open_dimension() -> Dimension<MemoryTable> {
    Dimension::open(MemoryTable::new(orders_schema()), orders_config()).unwrap()
}

fn max_id(dim: &Dimension<MemoryTable>) -> i64 {
    dim.table()
        .rows()
        .iter()
        .filter_map(|row| match row[COL_ID] {
            Scalar::Int(i) => Some(i),
            _ => None,
        })
        .max()
        .unwrap_or(0)
}

fn current_count(dim: &Dimension<MemoryTable>) -> usize {
    dim.table()
        .rows()
        .iter()
        .filter(|row| row[COL_CURRENT] == Scalar::Bool(true))
        .count()
}

// ============================================================================
// Property-based checks
// ============================================================================

/// A strategy for one batch over a small key universe, so that updates
/// collide with existing members often.
fn batch_strategy() -> impl Strategy<Value = Vec<Record>> {
    proptest::collection::vec(
        (0u8..5, 0u8..3, 0usize..STATUSES.len(), 0usize..CURRENCIES.len())
            .prop_map(|(o, l, s, c)| order_row(o, l, s, c)),
        0..12,
    )
}

proptest! {
    #[test]
    fn updates_preserve_every_invariant(
        batches in proptest::collection::vec(batch_strategy(), 1..5)
    ) {
        let mut dim = open_dimension();
        for batch in &batches {
            let rows_before = dim.table().rows().len();
            let ids_before = max_id(&dim);
            let counters_before = dim.counters();

            dim.update(batch).unwrap();
            dim.verify().unwrap();

            // Monotone surrogate: the increment equals the inserts
            // performed (new members plus Type-2 reinserts).
            let inserted = dim.table().rows().len() - rows_before;
            let counters = dim.counters();
            let delta_new = counters.new_rows - counters_before.new_rows;
            let delta_t2 = counters.updated_type2_rows - counters_before.updated_type2_rows;
            prop_assert!(max_id(&dim) >= ids_before);
            prop_assert_eq!(max_id(&dim) - ids_before, inserted as i64);
            prop_assert_eq!(delta_new + delta_t2, inserted as u64);

            // Exactly one current row per live member.
            prop_assert_eq!(current_count(&dim), dim.member_count());
        }
    }

    #[test]
    fn replaying_any_batch_is_idempotent(batch in batch_strategy()) {
        let mut dim = open_dimension();
        dim.update(&batch).unwrap();

        let rows_after_first = dim.table().rows().to_vec();
        let counters_after_first = dim.counters();

        dim.update(&batch).unwrap();
        prop_assert_eq!(dim.table().rows(), &rows_after_first[..]);
        prop_assert_eq!(dim.counters(), counters_after_first);
        dim.verify().unwrap();
    }

    #[test]
    fn counters_match_rows_on_disk(
        batches in proptest::collection::vec(batch_strategy(), 1..5)
    ) {
        let mut dim = open_dimension();
        for batch in &batches {
            dim.update(batch).unwrap();
        }
        // Every stored row was written either as a new member or as a
        // Type-2 reinsert.
        let counters = dim.counters();
        prop_assert_eq!(
            counters.new_rows + counters.updated_type2_rows,
            dim.table().rows().len() as u64
        );
    }
}

// ============================================================================
// Deterministic random walk
// ============================================================================

#[test]
fn long_random_walk_stays_consistent() {
    let mut rng = StdRng::seed_from_u64(WALK_SEED);
    let mut dim = open_dimension();

    for _ in 0..200 {
        let batch: Vec<Record> = (0..rng.gen_range(0..8))
            .map(|_| {
                order_row(
                    rng.gen_range(0..6),
                    rng.gen_range(0..3),
                    rng.gen_range(0..STATUSES.len()),
                    rng.gen_range(0..CURRENCIES.len()),
                )
            })
            .collect();
        dim.update(&batch).unwrap();
    }

    dim.verify().unwrap();
    assert_eq!(current_count(&dim), dim.member_count());
    assert_eq!(
        dim.counters().new_rows + dim.counters().updated_type2_rows,
        dim.table().rows().len() as u64
    );
    // The allocator never reused an id.
    let mut ids: Vec<i64> = dim
        .table()
        .rows()
        .iter()
        .map(|row| match row[COL_ID] {
            Scalar::Int(i) => i,
            _ => unreachable!("scd_id is an integer column"),
        })
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), dim.table().rows().len());
}

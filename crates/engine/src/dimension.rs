//! The dimension engine
//!
//! `Dimension` keeps a versioned, append-only dimension table in sync
//! with incoming current-state batches, applying Type-1 (in-place
//! overwrite) and Type-2 (close-and-insert) semantics on disjoint
//! attribute partitions of the same row.
//!
//! One `update` call applies a fixed step order:
//! 1. Type-1 bulk mutation across all versions of each affected key
//! 2. Type-2 retire of every affected current row, then bulk append of
//!    the replacement versions
//! 3. Bulk append of new members at version 1
//! 4. Current-state index deltas (applied in memory during 1–3)
//!
//! The engine is single-threaded and not reentrant; it assumes
//! exclusive access to the backing table.

use crate::alloc::KeyAllocator;
use crate::classify::{classify, Classified, Incoming, Verdict};
use crate::config::{DimensionConfig, ResolvedConfig};
use crate::index::{CurrentEntry, CurrentIndex};
use rustc_hash::FxHashMap;
use scdim_core::{fingerprint, Error, NaturalKey, Record, Result, Scalar, TableSchema};
use scdim_storage::{Predicate, Row, RowPatch, Table};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Cumulative mutation counters since engine construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateCounters {
    /// Members inserted at version 1.
    pub new_rows: u64,
    /// Rows that took the Type-1 overwrite path.
    pub updated_type1_rows: u64,
    /// Rows that took the Type-2 close-and-insert path.
    pub updated_type2_rows: u64,
}

/// Column positions resolved against the table schema at construction.
#[derive(Debug, Clone)]
struct Layout {
    width: usize,
    /// Positions of `lookupatts ++ type1atts ++ type2atts`, fingerprint order.
    attributes: Vec<usize>,
    /// Positions of the Type-1 attributes only.
    type1: Vec<usize>,
    key: usize,
    from: usize,
    to: usize,
    version: usize,
    current: usize,
    hash: usize,
}

impl Layout {
    fn resolve(schema: &TableSchema, config: &ResolvedConfig) -> Result<Self> {
        use scdim_core::ColumnType::{Bool, Int, Text};

        let mut attributes = Vec::with_capacity(config.attributes.len());
        for att in &config.attributes {
            attributes.push(schema.require(att)?);
        }
        let mut type1 = Vec::with_capacity(config.type1atts.len());
        for att in &config.type1atts {
            type1.push(schema.require(att)?);
        }

        let control = |name: &str, ty: scdim_core::ColumnType| -> Result<usize> {
            let position = schema.require(name)?;
            let column = schema.column(position);
            if column.ty != ty {
                return Err(Error::Schema(format!(
                    "control field '{}' has type {}, expected {}",
                    name, column.ty, ty
                )));
            }
            Ok(position)
        };
        let layout = Layout {
            width: schema.len(),
            key: control(&config.key, Int)?,
            from: control(&config.fromatt, Int)?,
            to: control(&config.toatt, Int)?,
            version: control(&config.versionatt, Int)?,
            current: control(&config.currentatt, Bool)?,
            hash: control(&config.hashatt, Text)?,
            attributes,
            type1,
        };

        // The persisted layout is exactly attributes ++ control fields;
        // a column the engine cannot populate is a schema mismatch.
        if schema.len() != config.attributes.len() + 6 {
            let expected: HashSet<&str> = config
                .attributes
                .iter()
                .map(String::as_str)
                .chain([
                    config.key.as_str(),
                    config.fromatt.as_str(),
                    config.toatt.as_str(),
                    config.versionatt.as_str(),
                    config.currentatt.as_str(),
                    config.hashatt.as_str(),
                ])
                .collect();
            for column in schema.columns() {
                if !expected.contains(column.name.as_str()) {
                    return Err(Error::Schema(format!(
                        "unexpected column '{}' in dimension table",
                        column.name
                    )));
                }
            }
        }
        Ok(layout)
    }
}

fn all_versions_of(config: &ResolvedConfig, key: &NaturalKey) -> Predicate {
    let mut predicate = Predicate::new();
    for (att, value) in config.lookupatts.iter().zip(key.values()) {
        predicate = predicate.eq(att.as_str(), value.clone());
    }
    predicate
}

fn current_version_of(config: &ResolvedConfig, key: &NaturalKey) -> Predicate {
    all_versions_of(config, key).eq(config.currentatt.as_str(), true)
}

fn as_int(value: &Scalar, column: &str) -> Result<i64> {
    match value {
        Scalar::Int(i) => Ok(*i),
        other => Err(Error::Schema(format!(
            "control field '{}' holds {:?}, expected an integer",
            column, other
        ))),
    }
}

/// Slowly changing dimension over an abstract table handle.
pub struct Dimension<T: Table> {
    table: T,
    config: ResolvedConfig,
    layout: Layout,
    alloc: KeyAllocator,
    index: CurrentIndex,
    counters: UpdateCounters,
}

impl<T: Table> Dimension<T> {
    /// Open a dimension over `table`.
    ///
    /// Validates the configuration before any I/O, checks that the table
    /// schema is exactly the tracked attributes plus the six control
    /// fields, seeds the surrogate-key allocator from the persisted
    /// maximum, and loads the current-state index.
    ///
    /// # Errors
    ///
    /// `Error::Config` for invalid configuration, `Error::Schema` for a
    /// mismatched table, `Error::InvariantViolation` if the table holds
    /// more than one current row for a key, plus any storage error.
    pub fn open(mut table: T, config: DimensionConfig) -> Result<Self> {
        let config = config.resolve()?;
        let layout = Layout::resolve(table.schema(), &config)?;
        let alloc = KeyAllocator::load(&mut table, &config.key)?;
        let index = CurrentIndex::load(&mut table, &config)?;
        debug!(
            members = index.len(),
            last_id = alloc.last(),
            asof = config.asof_nanos,
            "dimension opened"
        );
        Ok(Self {
            table,
            config,
            layout,
            alloc,
            index,
            counters: UpdateCounters::default(),
        })
    }

    /// Apply a batch of current-state rows.
    ///
    /// Each row must carry at least every tracked attribute. Rows with
    /// unseen natural keys are inserted at version 1; rows whose Type-1
    /// attributes changed are overwritten in place across all versions;
    /// rows whose Type-2 attributes changed retire the current version
    /// and open a new one at `asof`. Replaying the same batch is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Storage errors surface without batch-level rollback; counters
    /// for sub-batches that fully applied remain incremented.
    pub fn update(&mut self, batch: &[Record]) -> Result<()> {
        let classified = classify(&mut self.table, &self.index, &self.config, batch)?;
        debug!(
            new = classified.new_count(),
            type1 = classified.type1_count(),
            type2 = classified.type2_count(),
            unchanged = classified.unchanged_count(),
            dropped = classified.duplicates_dropped(),
            "batch classified"
        );
        if classified.is_noop() {
            return Ok(());
        }

        self.apply_type1(&classified)?;
        self.counters.updated_type1_rows += classified.type1_count() as u64;

        self.apply_type2(&classified)?;
        self.counters.updated_type2_rows += classified.type2_count() as u64;

        let new_members: Vec<&Incoming> = classified.new_members().collect();
        self.insert_prepared(&new_members, 1)?;

        self.table.flush()?;
        Ok(())
    }

    /// Step A: overwrite Type-1 attributes across every version of each
    /// affected key and recompute each row's hash from its own
    /// post-overwrite attribute tuple.
    fn apply_type1(&mut self, classified: &Classified) -> Result<()> {
        let mut patches: Vec<RowPatch> = Vec::new();
        let mut refreshed: Vec<(NaturalKey, String)> = Vec::new();

        for item in classified.type1() {
            let current_coord = self
                .index
                .get(&item.key)
                .ok_or_else(|| {
                    Error::InvariantViolation(format!(
                        "key {} classified for Type-1 but absent from the index",
                        item.key
                    ))
                })?
                .coord;
            let coords = self.table.coords(&all_versions_of(&self.config, &item.key))?;
            for coord in coords {
                let mut row = self.table.read(coord)?;
                let mut patch = RowPatch::new(coord);
                for (i, att) in self.config.type1atts.iter().enumerate() {
                    let value = item.record.require(att)?.clone();
                    row[self.layout.type1[i]] = value.clone();
                    patch = patch.set(self.layout.type1[i], value);
                }
                // Historical versions share the new T1 values but keep
                // their own T2 values, so each hash is recomputed from
                // the row itself.
                let hash = fingerprint(self.layout.attributes.iter().map(|p| &row[*p]));
                if coord == current_coord {
                    refreshed.push((item.key.clone(), hash.clone()));
                }
                patch = patch.set(self.layout.hash, hash);
                patches.push(patch);
            }
        }
        if patches.is_empty() {
            return Ok(());
        }

        self.table.write(&patches)?;
        trace!(rows = patches.len(), "type-1 overwrite applied");
        for (key, hash) in refreshed {
            self.index.set_hash(&key, hash);
        }
        Ok(())
    }

    /// Step B: retire every affected current row, then append the
    /// replacement versions. All retires are written before any append,
    /// which preserves the per-key retire-before-insert order.
    fn apply_type2(&mut self, classified: &Classified) -> Result<()> {
        let mut retire: Vec<RowPatch> = Vec::new();
        for item in classified.type2() {
            let entry = self.index.get(&item.key).ok_or_else(|| {
                Error::InvariantViolation(format!(
                    "key {} classified for Type-2 but absent from the index",
                    item.key
                ))
            })?;
            retire.push(
                RowPatch::new(entry.coord)
                    .set(self.layout.to, self.config.asof_nanos)
                    .set(self.layout.current, false),
            );
        }
        if retire.is_empty() {
            return Ok(());
        }
        self.table.write(&retire)?;
        trace!(rows = retire.len(), "current versions retired");

        let mut rows: Vec<Row> = Vec::new();
        let mut pending: Vec<(NaturalKey, i64, i64, String)> = Vec::new();
        for item in classified.type2() {
            let version = self
                .index
                .get(&item.key)
                .map(|e| e.version + 1)
                .unwrap_or(1);
            let id = self.alloc.next();
            rows.push(self.build_row(&item.record, id, version, &item.hash)?);
            pending.push((item.key.clone(), id, version, item.hash.clone()));
        }
        let start = self.table.append(rows)?;
        for (offset, (key, id, version, hash)) in pending.into_iter().enumerate() {
            self.index.replace(
                &key,
                CurrentEntry {
                    coord: scdim_storage::Coord(start.0 + offset as u64),
                    id,
                    version,
                    hash,
                },
            );
        }
        Ok(())
    }

    /// Step C (and the low-level insert path): append fully-prepared
    /// rows and register them in the index.
    fn insert_prepared(&mut self, items: &[&Incoming], version: i64) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        let mut rows: Vec<Row> = Vec::with_capacity(items.len());
        let mut pending: Vec<(NaturalKey, i64, String)> = Vec::with_capacity(items.len());
        for item in items {
            let id = self.alloc.next();
            rows.push(self.build_row(&item.record, id, version, &item.hash)?);
            pending.push((item.key.clone(), id, item.hash.clone()));
        }
        let start = self.table.append(rows)?;
        for (offset, (key, id, hash)) in pending.into_iter().enumerate() {
            self.index.insert(
                key,
                CurrentEntry {
                    coord: scdim_storage::Coord(start.0 + offset as u64),
                    id,
                    version,
                    hash,
                },
            );
        }
        self.counters.new_rows += items.len() as u64;
        trace!(rows = items.len(), version, "members inserted");
        Ok(())
    }

    /// Low-level append of fully-prepared rows at version 1, bypassing
    /// classification. Used for initial bulk loads.
    ///
    /// # Errors
    ///
    /// `Error::InvariantViolation` if a row's natural key already has a
    /// current version (that would break single-current-per-key), plus
    /// schema and storage errors.
    pub fn insert(&mut self, batch: &[Record]) -> Result<()> {
        self.insert_versioned(batch, 1)
    }

    /// Like [`insert`](Self::insert) with an explicit version number.
    pub fn insert_versioned(&mut self, batch: &[Record], version: i64) -> Result<()> {
        let mut items: Vec<Incoming> = Vec::with_capacity(batch.len());
        let mut seen: HashSet<NaturalKey> = HashSet::with_capacity(batch.len());
        for record in batch {
            let key = record.project(&self.config.lookupatts)?;
            if self.index.contains(&key) || !seen.insert(key.clone()) {
                return Err(Error::InvariantViolation(format!(
                    "key {} already has a current version",
                    key
                )));
            }
            let mut values: Vec<&Scalar> = Vec::with_capacity(self.config.attributes.len());
            for att in &self.config.attributes {
                values.push(record.require(att)?);
            }
            items.push(Incoming {
                record: record.clone(),
                key,
                hash: fingerprint(values),
                verdict: Verdict::New,
            });
        }
        let refs: Vec<&Incoming> = items.iter().collect();
        self.insert_prepared(&refs, version)?;
        self.table.flush()
    }

    /// Find the current version of the member matching the natural-key
    /// projection of `row`. Read-only.
    ///
    /// # Errors
    ///
    /// `Error::Schema` if `row` is missing a lookup attribute, plus
    /// storage errors.
    pub fn lookup(&mut self, row: &Record) -> Result<Option<Record>> {
        let key = row.project(&self.config.lookupatts)?;
        let coord = match self.index.get(&key) {
            None => return Ok(None),
            Some(entry) => entry.coord,
        };
        let stored = self.table.read(coord)?;
        let schema = self.table.schema();
        Ok(Some(Record::from_pairs(
            schema
                .columns()
                .iter()
                .zip(stored)
                .map(|(column, value)| (column.name.clone(), value)),
        )))
    }

    /// Check every engine invariant against the stored table.
    ///
    /// Walks all rows, groups them per natural key, and verifies: one
    /// current row per key sitting where the index says it is; version
    /// chains `1..=n` with contiguous validity intervals; globally
    /// unique surrogate keys; and stored hashes that match each row's
    /// attribute tuple. Intended for tests and post-load audits.
    ///
    /// # Errors
    ///
    /// `Error::InvariantViolation` describing the first violation found.
    pub fn verify(&mut self) -> Result<()> {
        let rows = self.table.select(&Predicate::new(), None)?;
        let mut ids: HashSet<i64> = HashSet::with_capacity(rows.len());
        let mut chains: FxHashMap<NaturalKey, Vec<Row>> = FxHashMap::default();
        for (_, row) in rows {
            let id = as_int(&row[self.layout.key], &self.config.key)?;
            if !ids.insert(id) {
                return Err(Error::InvariantViolation(format!(
                    "surrogate key {} assigned twice",
                    id
                )));
            }
            let key = NaturalKey::new(
                self.config
                    .lookupatts
                    .iter()
                    .zip(&self.layout.attributes)
                    .map(|(_, p)| row[*p].clone()),
            );
            chains.entry(key).or_default().push(row);
        }

        for (key, mut chain) in chains {
            chain.sort_by_key(|row| match row[self.layout.version] {
                Scalar::Int(v) => v,
                _ => i64::MAX,
            });
            let n = chain.len();
            for (i, row) in chain.iter().enumerate() {
                let version = as_int(&row[self.layout.version], &self.config.versionatt)?;
                if version != i as i64 + 1 {
                    return Err(Error::InvariantViolation(format!(
                        "key {} version chain is not contiguous at position {}",
                        key, i
                    )));
                }
                let is_current = row[self.layout.current] == Scalar::Bool(true);
                if is_current != (i == n - 1) {
                    return Err(Error::InvariantViolation(format!(
                        "key {} has a current flag on version {} of {}",
                        key,
                        version,
                        n
                    )));
                }
                if i + 1 < n
                    && row[self.layout.to] != chain[i + 1][self.layout.from]
                {
                    return Err(Error::InvariantViolation(format!(
                        "key {} has a validity gap after version {}",
                        key, version
                    )));
                }
                let expected = fingerprint(self.layout.attributes.iter().map(|p| &row[*p]));
                let stored = &row[self.layout.hash];
                if *stored != Scalar::Text(expected) {
                    return Err(Error::InvariantViolation(format!(
                        "key {} version {} has a stale fingerprint",
                        key, version
                    )));
                }
            }
            if chain[n - 1][self.layout.to] != Scalar::Int(self.config.maxto_nanos) {
                return Err(Error::InvariantViolation(format!(
                    "key {} current version does not end at the sentinel",
                    key
                )));
            }
        }

        // The index must agree with the table through the named
        // current-version predicate.
        for (key, entry) in self.index.iter() {
            let hits = self
                .table
                .select(&current_version_of(&self.config, key), None)?;
            match hits.as_slice() {
                [(coord, _)] if *coord == entry.coord => {}
                _ => {
                    return Err(Error::InvariantViolation(format!(
                        "index entry for key {} does not match the table",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    fn build_row(&self, record: &Record, id: i64, version: i64, hash: &str) -> Result<Row> {
        let mut row = vec![Scalar::Null; self.layout.width];
        for (att, position) in self.config.attributes.iter().zip(&self.layout.attributes) {
            row[*position] = record.require(att)?.clone();
        }
        row[self.layout.key] = Scalar::Int(id);
        row[self.layout.from] = Scalar::Int(self.config.asof_nanos);
        row[self.layout.to] = Scalar::Int(self.config.maxto_nanos);
        row[self.layout.version] = Scalar::Int(version);
        row[self.layout.current] = Scalar::Bool(true);
        row[self.layout.hash] = Scalar::Text(hash.to_string());
        Ok(row)
    }

    /// Members inserted at version 1 since construction.
    pub fn new_rows(&self) -> u64 {
        self.counters.new_rows
    }

    /// Rows that took the Type-1 path since construction.
    pub fn updated_type1_rows(&self) -> u64 {
        self.counters.updated_type1_rows
    }

    /// Rows that took the Type-2 path since construction.
    pub fn updated_type2_rows(&self) -> u64 {
        self.counters.updated_type2_rows
    }

    /// Snapshot of all counters.
    pub fn counters(&self) -> UpdateCounters {
        self.counters
    }

    /// Number of members with a current version.
    pub fn member_count(&self) -> usize {
        self.index.len()
    }

    /// Logical load timestamp, epoch nanoseconds.
    pub fn asof_nanos(&self) -> i64 {
        self.config.asof_nanos
    }

    /// End-of-validity sentinel, epoch nanoseconds.
    pub fn maxto_nanos(&self) -> i64 {
        self.config.maxto_nanos
    }

    /// The backing table.
    pub fn table(&self) -> &T {
        &self.table
    }

    /// Consume the engine and hand back the table.
    pub fn into_table(self) -> T {
        self.table
    }
}

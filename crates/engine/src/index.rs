//! Current-state index
//!
//! An in-memory cache of all currently active rows, keyed by natural
//! key. It is loaded once at engine construction by projecting the
//! table with `scd_current = true` and is authoritative for membership
//! queries during a single `update` call; mutations keep it in step
//! with the table.

use crate::config::ResolvedConfig;
use rustc_hash::FxHashMap;
use scdim_core::{Error, NaturalKey, Result, Scalar};
use scdim_storage::{Coord, Predicate, Table};

/// Cached facts about the current version of one dimension member.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentEntry {
    /// Storage coordinate of the current row.
    pub coord: Coord,
    /// Surrogate key of the current row.
    pub id: i64,
    /// Version number of the current row.
    pub version: i64,
    /// Fingerprint of the current row's attribute tuple.
    pub hash: String,
}

/// Natural key → current-version cache.
#[derive(Debug, Default)]
pub struct CurrentIndex {
    entries: FxHashMap<NaturalKey, CurrentEntry>,
}

fn control_int(value: &Scalar, column: &str) -> Result<i64> {
    match value {
        Scalar::Int(i) => Ok(*i),
        other => Err(Error::Schema(format!(
            "control field '{}' holds {:?}, expected an integer",
            column, other
        ))),
    }
}

fn control_text<'a>(value: &'a Scalar, column: &str) -> Result<&'a str> {
    match value {
        Scalar::Text(s) => Ok(s),
        other => Err(Error::Schema(format!(
            "control field '{}' holds {:?}, expected text",
            column, other
        ))),
    }
}

impl CurrentIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the index by projecting all rows with the current flag set.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvariantViolation` if two current rows share a
    /// natural key, `Error::Schema` if control fields are mistyped.
    pub fn load(table: &mut dyn Table, config: &ResolvedConfig) -> Result<Self> {
        let mut columns = config.lookupatts.clone();
        columns.push(config.key.clone());
        columns.push(config.versionatt.clone());
        columns.push(config.hashatt.clone());

        let current = Predicate::new().eq(config.currentatt.as_str(), true);
        let mut entries = FxHashMap::default();
        for (coord, values) in table.select(&current, Some(&columns))? {
            let n = config.lookupatts.len();
            let key = NaturalKey::new(values[..n].iter().cloned());
            let entry = CurrentEntry {
                coord,
                id: control_int(&values[n], &config.key)?,
                version: control_int(&values[n + 1], &config.versionatt)?,
                hash: control_text(&values[n + 2], &config.hashatt)?.to_string(),
            };
            if entries.insert(key.clone(), entry).is_some() {
                return Err(Error::InvariantViolation(format!(
                    "natural key {} has more than one current row",
                    key
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Whether a natural key has a current version.
    pub fn contains(&self, key: &NaturalKey) -> bool {
        self.entries.contains_key(key)
    }

    /// The cached entry for a natural key.
    pub fn get(&self, key: &NaturalKey) -> Option<&CurrentEntry> {
        self.entries.get(key)
    }

    /// The cached fingerprint for a natural key.
    pub fn hash_of(&self, key: &NaturalKey) -> Option<&str> {
        self.entries.get(key).map(|e| e.hash.as_str())
    }

    /// Register a newly born member.
    pub fn insert(&mut self, key: NaturalKey, entry: CurrentEntry) {
        self.entries.insert(key, entry);
    }

    /// Replace the entry for a key whose current version was retired.
    pub fn replace(&mut self, key: &NaturalKey, entry: CurrentEntry) {
        self.entries.insert(key.clone(), entry);
    }

    /// Update only the cached fingerprint (after a Type-1 overwrite).
    pub fn set_hash(&mut self, key: &NaturalKey, hash: String) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.hash = hash;
        }
    }

    /// Number of members with a current version.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the dimension has no current members.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all cached entries.
    pub fn iter(&self) -> impl Iterator<Item = (&NaturalKey, &CurrentEntry)> {
        self.entries.iter()
    }
}

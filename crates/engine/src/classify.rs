//! Batch change classification
//!
//! Joins an incoming batch against the current-state index on the
//! natural key and sorts every row into one of five verdicts. The
//! classifier is set-oriented: it emits sub-batches for the mutation
//! steps instead of driving per-row writes.

use crate::config::ResolvedConfig;
use crate::index::CurrentIndex;
use indexmap::IndexMap;
use scdim_core::{fingerprint, Error, NaturalKey, Record, Result, Scalar};
use scdim_storage::Table;

/// Classification of one incoming row against the dimension state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Previously unseen natural key; insert version 1.
    New,
    /// Fingerprint matches the current version; nothing to do.
    Unchanged,
    /// Only overwrite-tracked attributes differ.
    Type1Only,
    /// Only history-tracked attributes differ.
    Type2Only,
    /// Both attribute partitions differ; Type-1 path then Type-2 path.
    Both,
}

impl Verdict {
    /// Whether this verdict routes through the Type-1 overwrite path.
    pub fn takes_type1_path(self) -> bool {
        matches!(self, Verdict::Type1Only | Verdict::Both)
    }

    /// Whether this verdict routes through the Type-2 close-and-insert path.
    pub fn takes_type2_path(self) -> bool {
        matches!(self, Verdict::Type2Only | Verdict::Both)
    }
}

/// One surviving batch row with its precomputed join key and fingerprint.
#[derive(Debug, Clone)]
pub struct Incoming {
    /// The incoming row (at least all tracked attributes).
    pub record: Record,
    /// Natural-key projection of the row.
    pub key: NaturalKey,
    /// Fingerprint of the row's attribute tuple.
    pub hash: String,
    /// Where the row goes.
    pub verdict: Verdict,
}

/// Result of classifying one batch: actionable rows plus bookkeeping.
#[derive(Debug, Default)]
pub struct Classified {
    items: Vec<Incoming>,
    unchanged: usize,
    duplicates_dropped: usize,
}

impl Classified {
    /// Rows with previously unseen natural keys.
    pub fn new_members(&self) -> impl Iterator<Item = &Incoming> {
        self.items.iter().filter(|i| i.verdict == Verdict::New)
    }

    /// Rows taking the Type-1 overwrite path (`T1_ONLY ∪ BOTH`).
    pub fn type1(&self) -> impl Iterator<Item = &Incoming> {
        self.items.iter().filter(|i| i.verdict.takes_type1_path())
    }

    /// Rows taking the Type-2 close-and-insert path (`T2_ONLY ∪ BOTH`).
    pub fn type2(&self) -> impl Iterator<Item = &Incoming> {
        self.items.iter().filter(|i| i.verdict.takes_type2_path())
    }

    /// Number of new members in the batch.
    pub fn new_count(&self) -> usize {
        self.new_members().count()
    }

    /// Number of rows on the Type-1 path.
    pub fn type1_count(&self) -> usize {
        self.type1().count()
    }

    /// Number of rows on the Type-2 path.
    pub fn type2_count(&self) -> usize {
        self.type2().count()
    }

    /// Number of rows whose fingerprint matched the current version.
    pub fn unchanged_count(&self) -> usize {
        self.unchanged
    }

    /// Earlier occurrences dropped by the last-wins tie-break.
    pub fn duplicates_dropped(&self) -> usize {
        self.duplicates_dropped
    }

    /// True if the batch requires no mutation at all.
    pub fn is_noop(&self) -> bool {
        self.items.is_empty()
    }
}

/// Classify a batch against the current dimension state.
///
/// Rows sharing a natural key collapse to the last occurrence in batch
/// order before classification. Fingerprint equality short-circuits the
/// attribute diff; for rows that differ, the current version is read
/// back and each tracked attribute is compared on raw values to decide
/// between the Type-1 and Type-2 paths.
///
/// # Errors
///
/// Returns `Error::Schema` if a row is missing a tracked attribute and
/// `Error::InvariantViolation` if a fingerprint differs while every
/// tracked attribute compares equal (hash drift or tampering).
pub fn classify(
    table: &mut dyn Table,
    index: &CurrentIndex,
    config: &ResolvedConfig,
    batch: &[Record],
) -> Result<Classified> {
    // Last occurrence wins; insert-replace keeps first position so the
    // surviving order stays deterministic.
    let mut survivors: IndexMap<NaturalKey, &Record> = IndexMap::new();
    for record in batch {
        let key = record.project(&config.lookupatts)?;
        survivors.insert(key, record);
    }
    let duplicates_dropped = batch.len() - survivors.len();

    let schema = table.schema();
    let mut type1_positions = Vec::with_capacity(config.type1atts.len());
    for att in &config.type1atts {
        type1_positions.push((att.as_str(), schema.require(att)?));
    }
    let mut type2_positions = Vec::with_capacity(config.type2atts.len());
    for att in &config.type2atts {
        type2_positions.push((att.as_str(), schema.require(att)?));
    }

    let mut classified = Classified::default();
    for (key, record) in survivors {
        let mut values: Vec<&Scalar> = Vec::with_capacity(config.attributes.len());
        for att in &config.attributes {
            values.push(record.require(att)?);
        }
        let hash = fingerprint(values);

        let entry = match index.get(&key) {
            None => {
                classified.items.push(Incoming {
                    record: record.clone(),
                    key,
                    hash,
                    verdict: Verdict::New,
                });
                continue;
            }
            Some(entry) => entry,
        };

        if entry.hash == hash {
            classified.unchanged += 1;
            continue;
        }

        let current = table.read(entry.coord)?;
        let differs = |positions: &[(&str, usize)]| -> Result<bool> {
            for (att, position) in positions {
                if record.require(att)? != &current[*position] {
                    return Ok(true);
                }
            }
            Ok(false)
        };
        let type1_differs = differs(&type1_positions)?;
        let type2_differs = differs(&type2_positions)?;

        let verdict = match (type1_differs, type2_differs) {
            (true, true) => Verdict::Both,
            (true, false) => Verdict::Type1Only,
            (false, true) => Verdict::Type2Only,
            (false, false) => {
                return Err(Error::InvariantViolation(format!(
                    "fingerprint of key {} changed but no tracked attribute differs",
                    key
                )));
            }
        };
        classified.items.push(Incoming {
            record: record.clone(),
            key,
            hash,
            verdict,
        });
    }
    Ok(classified)
}

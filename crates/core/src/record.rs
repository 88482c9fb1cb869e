//! Incoming batch rows and lookup results
//!
//! A [`Record`] is an order-preserving map from column name to scalar.
//! Batch rows must carry at least the lookup, type-1 and type-2
//! attributes; extra fields are allowed and ignored by the engine.

use crate::error::{Error, Result};
use crate::value::{NaturalKey, Scalar};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One row of a batch or a lookup result, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    fields: IndexMap<String, Scalar>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self {
            fields: IndexMap::new(),
        }
    }

    /// Build a record from `(name, value)` pairs, preserving order.
    pub fn from_pairs<N, V>(pairs: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<Scalar>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }

    /// Set a field, replacing any existing value under the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Scalar>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Get a field by name.
    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.fields.get(name)
    }

    /// Get a field by name, or a schema error naming the missing column.
    pub fn require(&self, name: &str) -> Result<&Scalar> {
        self.fields
            .get(name)
            .ok_or_else(|| Error::Schema(format!("record is missing attribute '{}'", name)))
    }

    /// Project the record onto an attribute list, producing a natural key.
    ///
    /// # Errors
    ///
    /// Returns `Error::Schema` if any attribute is absent from the record.
    pub fn project(&self, attributes: &[String]) -> Result<NaturalKey> {
        let mut values = Vec::with_capacity(attributes.len());
        for att in attributes {
            values.push(self.require(att)?.clone());
        }
        Ok(NaturalKey::new(values))
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_line() -> Record {
        Record::from_pairs([
            ("order", Scalar::from("1")),
            ("line", Scalar::Int(10)),
            ("status", Scalar::from("Not Delivered")),
        ])
    }

    #[test]
    fn test_from_pairs_preserves_order() {
        let rec = order_line();
        let names: Vec<_> = rec.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["order", "line", "status"]);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut rec = order_line();
        rec.set("status", "Completed");
        assert_eq!(rec.get("status"), Some(&Scalar::from("Completed")));
        assert_eq!(rec.len(), 3);
    }

    #[test]
    fn test_project_builds_key_in_attribute_order() {
        let rec = order_line();
        let key = rec
            .project(&["order".to_string(), "line".to_string()])
            .unwrap();
        assert_eq!(key.values(), &[Scalar::from("1"), Scalar::Int(10)]);
    }

    #[test]
    fn test_project_missing_attribute_is_schema_error() {
        let rec = order_line();
        let err = rec.project(&["currency".to_string()]).unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn test_serde_round_trip() {
        let rec = order_line();
        let json = serde_json::to_string(&rec).unwrap();
        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(rec, back);
    }
}

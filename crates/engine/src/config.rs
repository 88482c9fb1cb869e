//! Dimension configuration
//!
//! A [`DimensionConfig`] names the attribute partitions and the SCD
//! control fields. Validation happens before any I/O: an engine that
//! fails construction has not touched the table.

use scdim_core::{parse_date_nanos, today_nanos, Error, Result, DEFAULT_MAXTO};
use std::collections::HashSet;

/// Configuration for one dimension table.
///
/// `lookupatts` form the natural key; `type1atts` are overwritten in
/// place across all versions when they change; `type2atts` open a new
/// version when they change. Control-field names default to the
/// conventional `scd_*` columns.
#[derive(Debug, Clone)]
pub struct DimensionConfig {
    /// Natural-key attribute names, in order. Must be non-empty.
    pub lookupatts: Vec<String>,
    /// Overwrite-tracked attribute names, in order. May be empty.
    pub type1atts: Vec<String>,
    /// History-tracked attribute names, in order. May be empty.
    pub type2atts: Vec<String>,
    /// Surrogate-key column name.
    pub key: String,
    /// Validity-start column name.
    pub fromatt: String,
    /// Validity-end column name.
    pub toatt: String,
    /// Version-number column name.
    pub versionatt: String,
    /// Current-flag column name.
    pub currentatt: String,
    /// Fingerprint column name.
    pub hashatt: String,
    /// End-of-validity sentinel date, `YYYY-MM-DD`.
    pub maxto: String,
    /// Logical timestamp of this load, `YYYY-MM-DD`; `None` means today.
    pub asof: Option<String>,
}

impl DimensionConfig {
    /// Create a configuration with default control-field names.
    pub fn new(
        lookupatts: Vec<String>,
        type1atts: Vec<String>,
        type2atts: Vec<String>,
    ) -> Self {
        Self {
            lookupatts,
            type1atts,
            type2atts,
            key: "scd_id".to_string(),
            fromatt: "scd_valid_from".to_string(),
            toatt: "scd_valid_to".to_string(),
            versionatt: "scd_version".to_string(),
            currentatt: "scd_current".to_string(),
            hashatt: "scd_hash".to_string(),
            maxto: DEFAULT_MAXTO.to_string(),
            asof: None,
        }
    }

    /// Set the logical load date (`YYYY-MM-DD`).
    pub fn asof(mut self, date: impl Into<String>) -> Self {
        self.asof = Some(date.into());
        self
    }

    /// Set the end-of-validity sentinel date (`YYYY-MM-DD`).
    pub fn maxto(mut self, date: impl Into<String>) -> Self {
        self.maxto = date.into();
        self
    }

    /// Validate the configuration and resolve dates to nanoseconds.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an empty natural key, empty tracked
    /// attribute sets, overlapping attribute lists, attribute names that
    /// collide with control fields, or unparseable dates.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        if self.lookupatts.is_empty() {
            return Err(Error::Config("no natural key given".into()));
        }
        if self.type1atts.is_empty() && self.type2atts.is_empty() {
            return Err(Error::Config(
                "type1atts and type2atts are both empty; nothing is tracked".into(),
            ));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for (list, name) in [
            (&self.lookupatts, "lookupatts"),
            (&self.type1atts, "type1atts"),
            (&self.type2atts, "type2atts"),
        ] {
            for att in list {
                if att.is_empty() {
                    return Err(Error::Config(format!("{} contains an empty name", name)));
                }
                if !seen.insert(att.as_str()) {
                    return Err(Error::Config(format!(
                        "attribute '{}' appears in more than one place",
                        att
                    )));
                }
            }
        }

        let control = [
            self.key.as_str(),
            self.fromatt.as_str(),
            self.toatt.as_str(),
            self.versionatt.as_str(),
            self.currentatt.as_str(),
            self.hashatt.as_str(),
        ];
        let mut control_seen: HashSet<&str> = HashSet::new();
        for name in control {
            if !control_seen.insert(name) {
                return Err(Error::Config(format!(
                    "control field name '{}' is used twice",
                    name
                )));
            }
            if seen.contains(name) {
                return Err(Error::Config(format!(
                    "attribute '{}' collides with a control field",
                    name
                )));
            }
        }

        let maxto_nanos = parse_date_nanos(&self.maxto)?;
        let asof_nanos = match &self.asof {
            Some(date) => parse_date_nanos(date)?,
            None => today_nanos(),
        };
        if asof_nanos >= maxto_nanos {
            return Err(Error::Config(format!(
                "asof ({}) must precede maxto ({})",
                self.asof.as_deref().unwrap_or("today"),
                self.maxto
            )));
        }

        let mut attributes =
            Vec::with_capacity(self.lookupatts.len() + self.type1atts.len() + self.type2atts.len());
        attributes.extend(self.lookupatts.iter().cloned());
        attributes.extend(self.type1atts.iter().cloned());
        attributes.extend(self.type2atts.iter().cloned());

        Ok(ResolvedConfig {
            lookupatts: self.lookupatts.clone(),
            type1atts: self.type1atts.clone(),
            type2atts: self.type2atts.clone(),
            attributes,
            key: self.key.clone(),
            fromatt: self.fromatt.clone(),
            toatt: self.toatt.clone(),
            versionatt: self.versionatt.clone(),
            currentatt: self.currentatt.clone(),
            hashatt: self.hashatt.clone(),
            maxto_nanos,
            asof_nanos,
        })
    }
}

/// A validated configuration with dates resolved to epoch nanoseconds.
///
/// The attribute order fixed here (`lookupatts ++ type1atts ++
/// type2atts`) is the fingerprint input order for the lifetime of the
/// engine.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Natural-key attribute names.
    pub lookupatts: Vec<String>,
    /// Overwrite-tracked attribute names.
    pub type1atts: Vec<String>,
    /// History-tracked attribute names.
    pub type2atts: Vec<String>,
    /// All tracked attributes in fingerprint order.
    pub attributes: Vec<String>,
    /// Surrogate-key column name.
    pub key: String,
    /// Validity-start column name.
    pub fromatt: String,
    /// Validity-end column name.
    pub toatt: String,
    /// Version-number column name.
    pub versionatt: String,
    /// Current-flag column name.
    pub currentatt: String,
    /// Fingerprint column name.
    pub hashatt: String,
    /// End-of-validity sentinel, epoch nanoseconds.
    pub maxto_nanos: i64,
    /// Logical load timestamp, epoch nanoseconds.
    pub asof_nanos: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn orders() -> DimensionConfig {
        DimensionConfig::new(
            strings(&["order", "line"]),
            strings(&["status"]),
            strings(&["currency"]),
        )
        .asof("2015-10-23")
    }

    #[test]
    fn test_resolve_defaults() {
        let resolved = orders().resolve().unwrap();
        assert_eq!(resolved.key, "scd_id");
        assert_eq!(resolved.asof_nanos, 1_445_558_400_000_000_000);
        assert_eq!(resolved.maxto_nanos, 7_258_032_000_000_000_000);
        assert_eq!(
            resolved.attributes,
            strings(&["order", "line", "status", "currency"])
        );
    }

    #[test]
    fn test_empty_lookup_rejected() {
        let cfg = DimensionConfig::new(vec![], strings(&["a"]), strings(&["b"]));
        assert!(cfg.resolve().unwrap_err().is_config());
    }

    #[test]
    fn test_nothing_tracked_rejected() {
        let cfg = DimensionConfig::new(strings(&["order"]), vec![], vec![]);
        assert!(cfg.resolve().unwrap_err().is_config());
    }

    #[test]
    fn test_overlapping_lists_rejected() {
        // status in both type1atts and type2atts
        let cfg = DimensionConfig::new(
            strings(&["order"]),
            strings(&["status"]),
            strings(&["status", "currency"]),
        );
        let err = cfg.resolve().unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("status"));
    }

    #[test]
    fn test_lookup_overlap_rejected() {
        let cfg = DimensionConfig::new(
            strings(&["order"]),
            strings(&["order"]),
            strings(&["currency"]),
        );
        assert!(cfg.resolve().unwrap_err().is_config());
    }

    #[test]
    fn test_attribute_colliding_with_control_rejected() {
        let cfg = DimensionConfig::new(
            strings(&["scd_id"]),
            vec![],
            strings(&["currency"]),
        );
        assert!(cfg.resolve().unwrap_err().is_config());
    }

    #[test]
    fn test_bad_dates_rejected() {
        let cfg = orders().asof("23-10-2015");
        assert!(cfg.resolve().unwrap_err().is_config());
        let cfg = orders().maxto("eventually");
        assert!(cfg.resolve().unwrap_err().is_config());
    }

    #[test]
    fn test_asof_after_maxto_rejected() {
        let cfg = orders().asof("2300-01-01").maxto("2199-12-31");
        assert!(cfg.resolve().unwrap_err().is_config());
    }
}

//! Scalar values and natural keys
//!
//! This module defines:
//! - Scalar: unified enum for all attribute values stored in a dimension
//! - NaturalKey: hashable tuple of lookup-attribute values
//!
//! Canonical rendering rules live here because the row fingerprint and
//! nothing else depends on them; a drift in render rules would spuriously
//! mark every member modified on the next load.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Unified scalar type for dimension attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    /// Absent / null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer (also carries epoch-nanosecond timestamps)
    Int(i64),
    /// 64-bit floating point
    Float(f64),
    /// UTF-8 string
    Text(String),
}

impl Scalar {
    /// Append the canonical string form of this scalar to `out`.
    ///
    /// The canonical form is the fingerprint input: `Null` renders as
    /// `None`, booleans as `True`/`False`, integers as plain decimal,
    /// floats as their shortest decimal with a trailing `.0` when
    /// integral, strings as themselves. No locale, no separators.
    pub fn write_canonical(&self, out: &mut String) {
        use std::fmt::Write;
        match self {
            Scalar::Null => out.push_str("None"),
            Scalar::Bool(true) => out.push_str("True"),
            Scalar::Bool(false) => out.push_str("False"),
            Scalar::Int(i) => {
                let _ = write!(out, "{}", i);
            }
            Scalar::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 {
                    let _ = write!(out, "{:.1}", f);
                } else {
                    let _ = write!(out, "{}", f);
                }
            }
            Scalar::Text(s) => out.push_str(s),
        }
    }

    /// Canonical string form as an owned `String`.
    pub fn canonical(&self) -> String {
        let mut s = String::new();
        self.write_canonical(&mut s);
        s
    }

    /// Deterministic equality for joins and predicate matching.
    ///
    /// Two nulls compare equal; floats compare by bit pattern so that
    /// the relation stays consistent with [`NaturalKey`] hashing.
    pub fn key_eq(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => true,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => a.to_bits() == b.to_bits(),
            (Scalar::Text(a), Scalar::Text(b)) => a == b,
            _ => false,
        }
    }

    /// Discriminant byte used by key hashing.
    fn tag(&self) -> u8 {
        match self {
            Scalar::Null => 0,
            Scalar::Bool(_) => 1,
            Scalar::Int(_) => 2,
            Scalar::Float(_) => 3,
            Scalar::Text(_) => 4,
        }
    }

    fn key_hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.tag());
        match self {
            Scalar::Null => {}
            Scalar::Bool(b) => state.write_u8(*b as u8),
            Scalar::Int(i) => state.write_i64(*i),
            Scalar::Float(f) => state.write_u64(f.to_bits()),
            Scalar::Text(s) => {
                state.write_usize(s.len());
                state.write(s.as_bytes());
            }
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

/// Natural-key tuple: the lookup-attribute values of one dimension member,
/// in configured attribute order.
///
/// Most dimensions key on one or two attributes, hence the inline
/// capacity of four.
#[derive(Debug, Clone)]
pub struct NaturalKey(SmallVec<[Scalar; 4]>);

impl NaturalKey {
    /// Build a key from lookup-attribute values in attribute order.
    pub fn new(values: impl IntoIterator<Item = Scalar>) -> Self {
        NaturalKey(values.into_iter().collect())
    }

    /// The key's scalar values, in attribute order.
    pub fn values(&self) -> &[Scalar] {
        &self.0
    }

    /// Number of lookup attributes in the key.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the key holds no values.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for NaturalKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(other.0.iter()).all(|(a, b)| a.key_eq(b))
    }
}

impl Eq for NaturalKey {}

impl Hash for NaturalKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.0.len());
        for v in &self.0 {
            v.key_hash(state);
        }
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(key: &NaturalKey) -> u64 {
        let mut h = DefaultHasher::new();
        key.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_canonical_null() {
        assert_eq!(Scalar::Null.canonical(), "None");
    }

    #[test]
    fn test_canonical_bool() {
        assert_eq!(Scalar::Bool(true).canonical(), "True");
        assert_eq!(Scalar::Bool(false).canonical(), "False");
    }

    #[test]
    fn test_canonical_int() {
        assert_eq!(Scalar::Int(10).canonical(), "10");
        assert_eq!(Scalar::Int(-42).canonical(), "-42");
        assert_eq!(
            Scalar::Int(1_445_558_400_000_000_000).canonical(),
            "1445558400000000000"
        );
    }

    #[test]
    fn test_canonical_float_integral_keeps_fraction() {
        // Integral floats must stay distinct from integers
        assert_eq!(Scalar::Float(10.0).canonical(), "10.0");
        assert_eq!(Scalar::Float(-3.0).canonical(), "-3.0");
    }

    #[test]
    fn test_canonical_float_fractional() {
        assert_eq!(Scalar::Float(10.5).canonical(), "10.5");
        assert_eq!(Scalar::Float(0.25).canonical(), "0.25");
    }

    #[test]
    fn test_canonical_text_verbatim() {
        assert_eq!(Scalar::Text("Not Delivered".into()).canonical(), "Not Delivered");
        assert_eq!(Scalar::Text(String::new()).canonical(), "");
    }

    #[test]
    fn test_key_eq_nulls_equal() {
        assert!(Scalar::Null.key_eq(&Scalar::Null));
    }

    #[test]
    fn test_key_eq_across_types() {
        // An Int never joins with a Text rendering of the same digits
        assert!(!Scalar::Int(1).key_eq(&Scalar::Text("1".into())));
        assert!(!Scalar::Null.key_eq(&Scalar::Bool(false)));
    }

    #[test]
    fn test_key_eq_float_bitwise() {
        assert!(Scalar::Float(1.5).key_eq(&Scalar::Float(1.5)));
        assert!(Scalar::Float(f64::NAN).key_eq(&Scalar::Float(f64::NAN)));
        assert!(!Scalar::Float(0.0).key_eq(&Scalar::Float(-0.0)));
    }

    #[test]
    fn test_natural_key_eq_and_hash_agree() {
        let a = NaturalKey::new(vec![Scalar::from("1"), Scalar::Int(10)]);
        let b = NaturalKey::new(vec![Scalar::from("1"), Scalar::Int(10)]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_natural_key_distinguishes_types() {
        let int_key = NaturalKey::new(vec![Scalar::Int(10)]);
        let text_key = NaturalKey::new(vec![Scalar::from("10")]);
        assert_ne!(int_key, text_key);
    }

    #[test]
    fn test_natural_key_distinguishes_arity() {
        let one = NaturalKey::new(vec![Scalar::from("1")]);
        let two = NaturalKey::new(vec![Scalar::from("1"), Scalar::from("")]);
        assert_ne!(one, two);
    }

    #[test]
    fn test_natural_key_display() {
        let key = NaturalKey::new(vec![Scalar::from("1"), Scalar::Int(10)]);
        assert_eq!(key.to_string(), "(1, 10)");
    }

    #[test]
    fn test_scalar_serde_round_trip() {
        let values = vec![
            Scalar::Null,
            Scalar::Bool(true),
            Scalar::Int(42),
            Scalar::Float(2.5),
            Scalar::Text("order".into()),
        ];
        for v in values {
            let json = serde_json::to_string(&v).unwrap();
            let back: Scalar = serde_json::from_str(&json).unwrap();
            assert_eq!(v, back);
        }
    }
}

//! Row fingerprints
//!
//! A fingerprint is the SHA-1 digest of the concatenated canonical forms
//! of a row's attribute tuple, in the fixed order
//! `lookupatts ++ type1atts ++ type2atts`, rendered as 40 lowercase hex
//! characters. It is stored alongside the row and used to short-circuit
//! change detection.

use crate::value::Scalar;
use sha1::{Digest, Sha1};

/// Length of a rendered fingerprint in hex characters.
pub const FINGERPRINT_LEN: usize = 40;

/// Compute the fingerprint of an attribute tuple.
///
/// Values must be supplied in the fixed attribute order decided at
/// engine construction; no separator bytes are inserted between the
/// canonical forms.
pub fn fingerprint<'a>(values: impl IntoIterator<Item = &'a Scalar>) -> String {
    let mut input = String::new();
    for value in values {
        value.write_canonical(&mut input);
    }
    let digest = Sha1::digest(input.as_bytes());
    hex::encode(digest)
}

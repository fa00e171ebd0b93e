//! Row fingerprinting.
//!
//! The digest covers declared field names and raw DATA strings in document
//! order, so it is stable across runs and independent of the encoded JSON
//! representation. Column boundaries are part of the digest: each datum is
//! followed by a newline, and the field name opens its column.

use sha2::{Digest, Sha512};

/// SHA-512 over a row's columns, hex encoded.
///
/// `columns` yields `(field_name, data)` pairs in declared field order.
pub fn row_hash<'a, I>(columns: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a [String])>,
{
    let mut hasher = Sha512::new();

    for (name, data) in columns {
        hasher.update(name.as_bytes());
        for datum in data {
            hasher.update(datum.as_bytes());
            hasher.update(b"\n");
        }
    }

    hex::encode(hasher.finalize())
}

//! Raw result-set rows as the parser sees them.

use serde::{Deserialize, Serialize};

/// One `ROW` element, before any field correlation.
///
/// `record_id` and `mod_id` stay opaque strings; FileMaker happens to emit
/// numbers, but nothing downstream depends on that. `columns` holds one
/// entry per `COL` element in document order, each entry holding that
/// column's `DATA` values in document order. A column with no data values
/// is an empty vector, which is how a scalar field later encodes to null.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NormalizedRow {
    #[serde(rename = "modID")]
    pub mod_id: String,
    #[serde(rename = "recordID")]
    pub record_id: String,
    #[serde(rename = "cols")]
    pub columns: Vec<Vec<String>>,
}

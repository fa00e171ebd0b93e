//! Data model for FMPXMLRESULT export documents.
//!
//! These are the lightly-normalized shapes the token parser emits: the
//! singleton document metadata (`ErrorCode`, `Product`, `Database`), the
//! per-column type contracts (`Field`), and the raw rows (`NormalizedRow`).
//! Column-to-field correlation and value encoding happen downstream.
//!
//! Serialized attribute names follow the export format's own spelling
//! (`emptyOK`, `recordID`, `modID`), so document-mode output round-trips
//! the metadata exactly as FileMaker wrote it.

mod document;
mod row;

pub use document::{Database, ErrorCode, Field, Product};
pub use row::NormalizedRow;

//! Field encoding engine for FMPXMLRESULT conversion.
//!
//! This crate turns the raw string data of an export column into a typed
//! JSON value, using the field's declared type and repeat count plus the
//! database's date/time formats.
//!
//! # Modules
//!
//! - [`layout`] - FileMaker date/time pattern → chrono strftime translation
//! - [`number`] - NUMBER datum encoding (parse and raw modes)
//! - [`encode`] - per-field encoders with scalar/array cardinality guards
//! - [`hash`] - SHA-512 row content hash
//!
//! # Example
//!
//! ```ignore
//! use fmpxml_model::Field;
//! use fmpxml_types::{FieldEncoder, NumberMode, TemporalLayouts};
//!
//! let layouts = TemporalLayouts::from_formats("M/d/yyyy", "h:mm:ss a");
//! let field = Field {
//!     name: "Birthday".to_string(),
//!     field_type: "DATE".to_string(),
//!     max_repeat: 1,
//!     empty_ok: true,
//! };
//!
//! let encoder = FieldEncoder::new(&field, &layouts, NumberMode::Parse);
//! let value = encoder.encode(&["1/11/1986".to_string()])?;
//! assert_eq!(value, serde_json::json!("1986-01-11"));
//! ```

pub mod encode;
pub mod error;
pub mod hash;
pub mod layout;
pub mod number;

pub use encode::{build_encoders, Cardinality, DatumEncoder, FieldEncoder, FieldKind};
pub use error::EncodeError;
pub use hash::row_hash;
pub use layout::{translate_date_format, translate_time_format, TemporalLayouts};
pub use number::{encode_number, NumberMode};

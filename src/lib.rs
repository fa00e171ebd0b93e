//! fmpxml-to-json Library
//!
//! A library for converting FileMaker FMPXMLRESULT XML exports to JSON.
//!
//! # Features
//!
//! - Streaming parse: the document is tokenized, never held as a DOM
//! - Type-aware encoding: NUMBER, DATE, TIME, and TIMESTAMP data become
//!   typed JSON values using the export's own layout strings
//! - Repeating fields: `MAXREPEAT > 1` columns become JSON arrays
//! - Two output shapes: one aggregate document, or framed records
//! - Optional injected keys: record ID, modification ID, SHA-512 row hash
//!
//! # Pipeline
//!
//! [`parser`] emits typed domain events over bounded channels, [`mapper`]
//! gates rows on readiness (database seen and metadata closed) and encodes
//! them, [`writer`] emits either output shape, and [`convert`] supervises
//! the three stages under a shared cancellation token.
//!
//! # Library Usage
//!
//! ```no_run
//! use fmpxml_to_json::{convert, ConvertConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> fmpxml_to_json::Result<()> {
//! let input = tokio::io::BufReader::new(tokio::fs::File::open("export.xml").await?);
//! let output = tokio::io::stdout();
//! convert(input, output, ConvertConfig::default(), CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

pub mod convert;
pub mod error;
pub mod mapper;
pub mod parser;
pub mod writer;

// Re-export the member crates for convenience
pub use fmpxml_model as model;
pub use fmpxml_types as types;

pub use convert::{convert, ConvertConfig, OutputMode};
pub use error::{ConvertError, Result};
pub use mapper::{CollectedData, MappedRecord, RecordOptions};
pub use types::NumberMode;
pub use writer::{FrameConfig, LengthPrefix};

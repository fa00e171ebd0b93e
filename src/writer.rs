//! Output emitters.
//!
//! Two shapes of output: a single pretty-printed aggregate document holding
//! the metadata and every record, or a framed stream of one compact JSON
//! record per row with configurable prefix, length prefix, and suffix.

mod document;
mod framed;

pub use document::{collect_records, write_document, Document};
pub use framed::{write_framed, FrameConfig, LengthPrefix};

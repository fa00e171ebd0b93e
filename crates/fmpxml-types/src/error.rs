//! Encoding failures for a single column datum.

use thiserror::Error;

/// Why a column's data could not be encoded.
///
/// These carry the offending input so the pipeline can wrap them with row
/// and column context before surfacing them.
#[derive(Debug, Clone, Error)]
pub enum EncodeError {
    /// A scalar field's column held more than one data value.
    #[error("got {count} data values for a scalar field")]
    MultipleScalarValues { count: usize },

    /// A NUMBER datum matched neither an integer nor a finite float.
    #[error("could not decode '{original}' as a number")]
    NumberDecode { original: String },

    /// A DATE/TIME/TIMESTAMP datum did not match the translated layout.
    #[error("could not parse '{input}' with layout '{layout}': {source}")]
    DateTimeParse {
        input: String,
        layout: String,
        source: chrono::ParseError,
    },

    /// A temporal field was encoded while its translated layout was empty.
    #[error("date/time layout was empty when encoding a temporal field")]
    MissingLayout,
}

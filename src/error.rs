//! Error types for the conversion pipeline.

use fmpxml_types::EncodeError;
use thiserror::Error;

/// Errors that can occur while converting an FMPXMLRESULT document.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("XML escape error: {0}")]
    XmlEscape(#[from] quick_xml::escape::EscapeError),

    #[error("XML encoding error: {0}")]
    XmlEncoding(#[from] quick_xml::encoding::EncodingError),

    #[error("unknown entity reference: &{0};")]
    UnknownEntity(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid {attr} attribute: {value:?}")]
    IntAttribute { attr: &'static str, value: String },

    #[error("EMPTYOK must be YES or NO, got {value:?}")]
    YesNoAttribute { value: String },

    #[error("ERRORCODE is not an integer: {text:?}")]
    ErrorCodeText { text: String },

    #[error("multiple ERRORCODE elements")]
    DuplicateErrorCode,

    #[error("multiple PRODUCT elements")]
    DuplicateProduct,

    #[error("multiple DATABASE elements")]
    DuplicateDatabase,

    #[error("FIELD declared after METADATA closed")]
    FieldAfterMetadataEnd,

    #[error("multiple METADATA sections")]
    DuplicateMetadataEnd,

    #[error("multiple RESULTSET sections")]
    DuplicateResultSetEnd,

    #[error("no ERRORCODE element in document")]
    MissingErrorCode,

    #[error("no DATABASE element in document")]
    MissingDatabase,

    #[error("no PRODUCT element in document")]
    MissingProduct,

    #[error("METADATA section never closed")]
    MetadataNotClosed,

    #[error("RESULTSET section never closed")]
    ResultSetNotClosed,

    #[error("mapping never became ready, check for DATABASE and METADATA elements")]
    NeverReady,

    #[error("row {row} has {columns} columns, metadata declares {fields} fields")]
    FieldCountMismatch {
        row: usize,
        fields: usize,
        columns: usize,
    },

    #[error("row {row} field {field:?} (column {column}): {source}")]
    Column {
        row: usize,
        column: usize,
        field: String,
        source: EncodeError,
    },

    #[error("framed record length {size} does not fit in {width} digits")]
    FrameTooLong { size: usize, width: usize },

    #[error("conversion cancelled")]
    Cancelled,

    #[error("task failure: {0}")]
    Task(String),
}

/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

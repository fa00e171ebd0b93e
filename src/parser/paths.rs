//! Element identity and path matching for FMPXMLRESULT documents.
//!
//! The grammar is fixed, so the parser recognizes elements by their full
//! path from the document root rather than by tag name alone. A `COL`
//! outside a `ROW`, or a nested `FMPXMLRESULT`, never matches and is
//! skipped along with its content.

/// The FMPXMLRESULT namespace. Elements outside it are ignored.
pub const NAMESPACE: &[u8] = b"http://www.filemaker.com/fmpxmlresult";

/// One element on the path from the document root.
///
/// Only elements the converter cares about get their own identity;
/// everything else collapses to `Other`, which poisons any path it
/// appears on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    FmpXmlResult,
    ErrorCode,
    Product,
    Database,
    Metadata,
    Field,
    ResultSet,
    Row,
    Col,
    Data,
    Other,
}

impl Step {
    /// Classify a start or end tag by namespace and local name.
    pub fn resolve(namespace: Option<&[u8]>, local: &[u8]) -> Step {
        if namespace != Some(NAMESPACE) {
            return Step::Other;
        }

        match local {
            b"FMPXMLRESULT" => Step::FmpXmlResult,
            b"ERRORCODE" => Step::ErrorCode,
            b"PRODUCT" => Step::Product,
            b"DATABASE" => Step::Database,
            b"METADATA" => Step::Metadata,
            b"FIELD" => Step::Field,
            b"RESULTSET" => Step::ResultSet,
            b"ROW" => Step::Row,
            b"COL" => Step::Col,
            b"DATA" => Step::Data,
            _ => Step::Other,
        }
    }
}

use Step::*;

pub const ERROR_CODE_PATH: &[Step] = &[FmpXmlResult, ErrorCode];
pub const PRODUCT_PATH: &[Step] = &[FmpXmlResult, Product];
pub const DATABASE_PATH: &[Step] = &[FmpXmlResult, Database];
pub const METADATA_PATH: &[Step] = &[FmpXmlResult, Metadata];
pub const FIELD_PATH: &[Step] = &[FmpXmlResult, Metadata, Field];
pub const RESULT_SET_PATH: &[Step] = &[FmpXmlResult, ResultSet];
pub const ROW_PATH: &[Step] = &[FmpXmlResult, ResultSet, Row];
pub const COL_PATH: &[Step] = &[FmpXmlResult, ResultSet, Row, Col];
pub const DATA_PATH: &[Step] = &[FmpXmlResult, ResultSet, Row, Col, Data];

/// The chain of open elements, root first.
#[derive(Debug, Default)]
pub struct PathChain(Vec<Step>);

impl PathChain {
    pub fn push(&mut self, step: Step) {
        self.0.push(step);
    }

    pub fn pop(&mut self) -> Option<Step> {
        self.0.pop()
    }

    /// Exact match against one of the recognized paths.
    pub fn is(&self, path: &[Step]) -> bool {
        self.0 == path
    }
}

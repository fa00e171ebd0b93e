//! Full-document JSON assembly.

use fmpxml_model::{Database, ErrorCode, Field, Product};
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::mapper::{CollectedData, MappedRecord};

/// The aggregate document-mode output. Field declaration order is the wire
/// key order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub error_code: ErrorCode,
    pub database: Database,
    pub fields: Vec<Field>,
    pub product: Product,
    pub records: Vec<MappedRecord>,
}

impl Document {
    pub fn new(data: CollectedData, records: Vec<MappedRecord>) -> Self {
        Document {
            error_code: data.error_code,
            database: data.database,
            fields: data.fields,
            product: data.product,
            records,
        }
    }
}

/// Gather every mapped record into memory, in arrival order.
///
/// Document mode cannot emit anything until the whole result set is known,
/// so this is the one place the pipeline buffers without bound.
pub async fn collect_records(
    mut records: mpsc::Receiver<MappedRecord>,
    token: &CancellationToken,
) -> Result<Vec<MappedRecord>> {
    let mut collected = Vec::new();
    loop {
        let record = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(ConvertError::Cancelled),
            record = records.recv() => match record {
                Some(record) => record,
                None => break,
            },
        };
        collected.push(record);
    }
    debug!("Collected {} records", collected.len());
    Ok(collected)
}

/// Serialize the aggregate pretty-printed, with a trailing newline.
pub async fn write_document<W>(document: &Document, output: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut encoded = serde_json::to_vec_pretty(document)?;
    encoded.push(b'\n');
    output.write_all(&encoded).await?;
    output.flush().await?;
    Ok(())
}

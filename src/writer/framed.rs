//! Framed streaming output.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::mapper::MappedRecord;

/// Length prefix written between the frame prefix and the record bytes.
///
/// The length counts the encoded record bytes only, never the prefix or
/// suffix around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthPrefix {
    /// No length prefix.
    #[default]
    Off,
    /// The byte count in decimal, as many digits as it takes.
    Variable,
    /// The byte count zero-padded to exactly this many digits.
    Fixed(usize),
}

impl LengthPrefix {
    fn render(&self, size: usize) -> Result<Option<String>> {
        match *self {
            LengthPrefix::Off => Ok(None),
            LengthPrefix::Variable => Ok(Some(size.to_string())),
            LengthPrefix::Fixed(width) => {
                if size.to_string().len() > width {
                    return Err(ConvertError::FrameTooLong { size, width });
                }
                Ok(Some(format!("{size:0width$}")))
            }
        }
    }
}

/// Controls the bytes around each streamed record.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Written before each record.
    pub prefix: String,
    /// Written after each record.
    pub suffix: String,
    pub length: LengthPrefix,
}

impl Default for FrameConfig {
    fn default() -> Self {
        FrameConfig {
            prefix: String::new(),
            suffix: "\n".to_string(),
            length: LengthPrefix::Off,
        }
    }
}

/// Write each record as `prefix + [length] + record + suffix`, flushing
/// after every record so downstream consumers see rows as they complete.
pub async fn write_framed<W>(
    mut records: mpsc::Receiver<MappedRecord>,
    output: &mut W,
    config: &FrameConfig,
    token: &CancellationToken,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0usize;
    loop {
        let record = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(ConvertError::Cancelled),
            record = records.recv() => match record {
                Some(record) => record,
                None => break,
            },
        };

        let encoded = serde_json::to_vec(&record)?;
        output.write_all(config.prefix.as_bytes()).await?;
        if let Some(length) = config.length.render(encoded.len())? {
            output.write_all(length.as_bytes()).await?;
        }
        output.write_all(&encoded).await?;
        output.write_all(config.suffix.as_bytes()).await?;
        output.flush().await?;
        written += 1;
    }

    debug!("Wrote {} framed records", written);
    Ok(())
}

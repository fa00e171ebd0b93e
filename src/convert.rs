//! Pipeline supervision.
//!
//! Wires the parser, mapper, and output emitter together as tokio tasks
//! over single-slot channels, so each stage advances only as fast as the
//! next one consumes. A failing stage cancels the shared token to tear the
//! others down, and the first non-cancellation error in pipeline order is
//! the one reported.

use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{ConvertError, Result};
use crate::mapper::{self, RecordOptions};
use crate::parser;
use crate::writer::{self, Document, FrameConfig};

/// Top-level conversion configuration.
#[derive(Debug, Clone, Default)]
pub struct ConvertConfig {
    pub records: RecordOptions,
    pub mode: OutputMode,
}

/// Which emitter the pipeline drives.
#[derive(Debug, Clone, Default)]
pub enum OutputMode {
    /// One aggregate JSON document holding metadata and all records.
    #[default]
    Document,
    /// One framed JSON record per row, no enclosing document.
    Stream(FrameConfig),
}

/// Convert one FMPXMLRESULT document from `input` to JSON on `output`.
pub async fn convert<R, W>(
    input: R,
    output: W,
    config: ConvertConfig,
    token: CancellationToken,
) -> Result<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (senders, receivers) = parser::event_channels();
    let (record_tx, record_rx) = mpsc::channel(1);

    let parser_task = supervise(&token, {
        let token = token.clone();
        async move { parser::parse(input, senders, token).await }
    });
    let mapper_task = supervise(&token, {
        let token = token.clone();
        let options = config.records;
        async move { mapper::map_events(receivers, record_tx, options, token).await }
    });

    match config.mode {
        OutputMode::Document => {
            let collector_task = supervise(&token, {
                let token = token.clone();
                async move { writer::collect_records(record_rx, &token).await }
            });

            let parsed = join_result(parser_task.await);
            let mapped = join_result(mapper_task.await);
            let collected = join_result(collector_task.await);
            let (data, records) = resolve(parsed, mapped, collected)?;

            let document = Document::new(data, records);
            let mut output = output;
            writer::write_document(&document, &mut output).await?;
            info!("Wrote document with {} records", document.records.len());
        }
        OutputMode::Stream(frame) => {
            let writer_task = supervise(&token, {
                let token = token.clone();
                async move {
                    let mut output = output;
                    writer::write_framed(record_rx, &mut output, &frame, &token).await
                }
            });

            let parsed = join_result(parser_task.await);
            let mapped = join_result(mapper_task.await);
            let written = join_result(writer_task.await);
            resolve(parsed, mapped, written)?;
        }
    }

    Ok(())
}

/// Spawn a stage, cancelling the shared token if it fails so the other
/// stages stop at their next suspension point.
fn supervise<T>(
    token: &CancellationToken,
    stage: impl Future<Output = Result<T>> + Send + 'static,
) -> JoinHandle<Result<T>>
where
    T: Send + 'static,
{
    let token = token.clone();
    tokio::spawn(async move {
        let result = stage.await;
        if result.is_err() {
            token.cancel();
        }
        result
    })
}

fn join_result<T>(joined: std::result::Result<Result<T>, tokio::task::JoinError>) -> Result<T> {
    match joined {
        Ok(result) => result,
        Err(join) => Err(ConvertError::Task(join.to_string())),
    }
}

/// Pick the pipeline's outcome: the first non-cancellation error in stage
/// order, a bare cancellation only when no stage failed for a real reason.
fn resolve<M, W>(parsed: Result<()>, mapped: Result<M>, written: Result<W>) -> Result<(M, W)> {
    match (parsed, mapped, written) {
        (Ok(()), Ok(mapped), Ok(written)) => Ok((mapped, written)),
        (parsed, mapped, written) => {
            let first = [parsed.err(), mapped.err(), written.err()]
                .into_iter()
                .flatten()
                .find(|error| !matches!(error, ConvertError::Cancelled));
            Err(first.unwrap_or(ConvertError::Cancelled))
        }
    }
}

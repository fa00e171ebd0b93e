//! Readiness-gated row mapper.
//!
//! Consumes parser events and turns each row into a JSON record. Rows can
//! legally arrive before the field metadata (RESULTSET before METADATA), so
//! rows are buffered until both the database attributes and the closed
//! metadata section are known, then drained in arrival order. Document-level
//! data (error code, product, database, fields) is collected for the
//! document writer and validated once every event channel has closed.

use fmpxml_model::{Database, ErrorCode, Field, NormalizedRow, Product};
use fmpxml_types::{build_encoders, row_hash, FieldEncoder, NumberMode, TemporalLayouts};
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ConvertError, Result};
use crate::parser::EventReceivers;

/// One output record: injected bookkeeping keys plus field values, in
/// insertion order.
pub type MappedRecord = Map<String, Value>;

/// Controls the shape of mapped records.
#[derive(Debug, Clone, Default)]
pub struct RecordOptions {
    /// Key to write the ROW `RECORDID` under, if any.
    pub record_id_key: Option<String>,
    /// Key to write the ROW `MODID` under, if any.
    pub mod_id_key: Option<String>,
    /// Key to write the row content hash under, if any.
    pub hash_key: Option<String>,
    /// How NUMBER data becomes JSON numbers.
    pub numbers: NumberMode,
}

/// Document-level data collected while mapping rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedData {
    pub error_code: ErrorCode,
    pub product: Product,
    pub database: Database,
    pub fields: Vec<Field>,
}

/// Consume all parser events, emitting mapped records on `output`.
///
/// Returns the collected document data once every event channel has closed
/// and the structural checks pass. The `output` sender is dropped on
/// return, closing the record channel.
pub async fn map_events(
    mut events: EventReceivers,
    output: mpsc::Sender<MappedRecord>,
    options: RecordOptions,
    token: CancellationToken,
) -> Result<CollectedData> {
    let mut mapper = Mapper::new(options);
    let mut done = ChannelsDone::default();

    while !done.all() {
        // Biased polling keeps pending fields ahead of the metadata-end
        // signal, so the encoder table is complete when the gate opens.
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                warn!("Mapping cancelled");
                return Err(ConvertError::Cancelled);
            }
            event = events.error_code.recv(), if !done.error_code => match event {
                Some(code) => mapper.on_error_code(code)?,
                None => done.error_code = true,
            },
            event = events.product.recv(), if !done.product => match event {
                Some(product) => mapper.on_product(product)?,
                None => done.product = true,
            },
            event = events.field.recv(), if !done.field => match event {
                Some(field) => mapper.on_field(field)?,
                None => done.field = true,
            },
            event = events.database.recv(), if !done.database => match event {
                Some(database) => mapper.on_database(database, &output, &token).await?,
                None => done.database = true,
            },
            event = events.metadata_end.recv(), if !done.metadata_end => match event {
                Some(()) => mapper.on_metadata_end(&output, &token).await?,
                None => done.metadata_end = true,
            },
            event = events.result_set_end.recv(), if !done.result_set_end => match event {
                Some(()) => mapper.on_result_set_end()?,
                None => done.result_set_end = true,
            },
            event = events.row.recv(), if !done.row => match event {
                Some(row) => mapper.on_row(row, &output, &token).await?,
                None => done.row = true,
            },
        }
    }

    mapper.finish()
}

#[derive(Debug, Default)]
struct ChannelsDone {
    error_code: bool,
    product: bool,
    database: bool,
    field: bool,
    metadata_end: bool,
    result_set_end: bool,
    row: bool,
}

impl ChannelsDone {
    fn all(&self) -> bool {
        self.error_code
            && self.product
            && self.database
            && self.field
            && self.metadata_end
            && self.result_set_end
            && self.row
    }
}

struct Mapper {
    options: RecordOptions,
    error_code: Option<ErrorCode>,
    product: Option<Product>,
    database: Option<Database>,
    fields: Vec<Field>,
    /// Built once the database and the closed metadata section are both
    /// known. `Some` is the readiness gate for rows.
    encoders: Option<Vec<FieldEncoder>>,
    pending: Vec<NormalizedRow>,
    metadata_ended: bool,
    result_set_ended: bool,
    rows_mapped: usize,
}

impl Mapper {
    fn new(options: RecordOptions) -> Self {
        Mapper {
            options,
            error_code: None,
            product: None,
            database: None,
            fields: Vec::new(),
            encoders: None,
            pending: Vec::new(),
            metadata_ended: false,
            result_set_ended: false,
            rows_mapped: 0,
        }
    }

    fn on_error_code(&mut self, code: ErrorCode) -> Result<()> {
        debug!("Collecting ERRORCODE {}", code.0);
        if self.error_code.is_some() {
            return Err(ConvertError::DuplicateErrorCode);
        }
        self.error_code = Some(code);
        Ok(())
    }

    fn on_product(&mut self, product: Product) -> Result<()> {
        debug!("Collecting PRODUCT {}", product.name);
        if self.product.is_some() {
            return Err(ConvertError::DuplicateProduct);
        }
        self.product = Some(product);
        Ok(())
    }

    fn on_field(&mut self, field: Field) -> Result<()> {
        debug!("Collecting FIELD {}", field.name);
        if self.metadata_ended {
            return Err(ConvertError::FieldAfterMetadataEnd);
        }
        self.fields.push(field);
        Ok(())
    }

    async fn on_database(
        &mut self,
        database: Database,
        output: &mpsc::Sender<MappedRecord>,
        token: &CancellationToken,
    ) -> Result<()> {
        debug!("Collecting DATABASE {}", database.name);
        if self.database.is_some() {
            return Err(ConvertError::DuplicateDatabase);
        }
        self.database = Some(database);
        self.try_ready(output, token).await
    }

    async fn on_metadata_end(
        &mut self,
        output: &mpsc::Sender<MappedRecord>,
        token: &CancellationToken,
    ) -> Result<()> {
        debug!("Metadata complete with {} fields", self.fields.len());
        if self.metadata_ended {
            return Err(ConvertError::DuplicateMetadataEnd);
        }
        self.metadata_ended = true;
        self.try_ready(output, token).await
    }

    fn on_result_set_end(&mut self) -> Result<()> {
        debug!("Result set complete after {} rows", self.rows_mapped);
        if self.result_set_ended {
            return Err(ConvertError::DuplicateResultSetEnd);
        }
        self.result_set_ended = true;
        Ok(())
    }

    async fn on_row(
        &mut self,
        row: NormalizedRow,
        output: &mpsc::Sender<MappedRecord>,
        token: &CancellationToken,
    ) -> Result<()> {
        if let Some(encoders) = &self.encoders {
            self.rows_mapped += 1;
            let record = map_record(&self.options, encoders, row, self.rows_mapped)?;
            send_record(output, token, record).await
        } else {
            warn!("Rows are not ready for mapping, buffering incoming row");
            self.pending.push(row);
            Ok(())
        }
    }

    /// Open the gate if both readiness inputs are in, then drain any rows
    /// that arrived early, preserving their order.
    async fn try_ready(
        &mut self,
        output: &mpsc::Sender<MappedRecord>,
        token: &CancellationToken,
    ) -> Result<()> {
        if self.encoders.is_some() || !self.metadata_ended {
            return Ok(());
        }
        let Some(database) = &self.database else {
            return Ok(());
        };

        let layouts = TemporalLayouts::from_formats(&database.date_format, &database.time_format);
        let encoders = build_encoders(&self.fields, &layouts, self.options.numbers);
        debug!("Ready to map rows with {} field encoders", encoders.len());
        self.encoders = Some(encoders);

        let pending = std::mem::take(&mut self.pending);
        if !pending.is_empty() {
            info!("Flushing {} held rows", pending.len());
        }
        for row in pending {
            self.on_row(row, output, token).await?;
        }
        Ok(())
    }

    fn finish(self) -> Result<CollectedData> {
        if self.encoders.is_none() {
            return Err(ConvertError::NeverReady);
        }
        let Some(error_code) = self.error_code else {
            return Err(ConvertError::MissingErrorCode);
        };
        let Some(database) = self.database else {
            return Err(ConvertError::MissingDatabase);
        };
        if !self.metadata_ended {
            return Err(ConvertError::MetadataNotClosed);
        }
        if !self.result_set_ended {
            return Err(ConvertError::ResultSetNotClosed);
        }
        let Some(product) = self.product else {
            return Err(ConvertError::MissingProduct);
        };

        info!("Mapped {} rows", self.rows_mapped);

        Ok(CollectedData {
            error_code,
            product,
            database,
            fields: self.fields,
        })
    }
}

/// Encode one row against the field table. `index` is the 1-based row
/// number, used only for error context.
fn map_record(
    options: &RecordOptions,
    encoders: &[FieldEncoder],
    row: NormalizedRow,
    index: usize,
) -> Result<MappedRecord> {
    if row.columns.len() != encoders.len() {
        return Err(ConvertError::FieldCountMismatch {
            row: index,
            fields: encoders.len(),
            columns: row.columns.len(),
        });
    }

    let mut record = MappedRecord::new();

    if let Some(key) = &options.record_id_key {
        record.insert(key.clone(), Value::String(row.record_id));
    }
    if let Some(key) = &options.mod_id_key {
        record.insert(key.clone(), Value::String(row.mod_id));
    }
    if let Some(key) = &options.hash_key {
        let columns = encoders
            .iter()
            .map(|encoder| encoder.name())
            .zip(row.columns.iter().map(|column| column.as_slice()));
        record.insert(key.clone(), Value::String(row_hash(columns)));
    }

    for (position, (encoder, column)) in encoders.iter().zip(&row.columns).enumerate() {
        let value = encoder
            .encode(column)
            .map_err(|source| ConvertError::Column {
                row: index,
                column: position + 1,
                field: encoder.name().to_string(),
                source,
            })?;
        record.insert(encoder.name().to_string(), value);
    }

    Ok(record)
}

async fn send_record(
    output: &mpsc::Sender<MappedRecord>,
    token: &CancellationToken,
    record: MappedRecord,
) -> Result<()> {
    tokio::select! {
        biased;
        _ = token.cancelled() => {
            warn!("Mapping cancelled");
            Err(ConvertError::Cancelled)
        }
        sent = output.send(record) => sent.map_err(|_| ConvertError::Cancelled),
    }
}

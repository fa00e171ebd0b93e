//! Streaming FMPXMLRESULT parser.
//!
//! Walks the XML token stream with a path chain instead of building a DOM,
//! and emits typed domain events (error code, product, database, fields,
//! rows, section completions) over per-event channels as each element
//! completes. Elements outside the FMPXMLRESULT namespace or in unexpected
//! positions are skipped without error. Most structural violations are
//! rejected downstream by the mapper; a FIELD appearing after its METADATA
//! section closed is rejected here, where document order is still known.

mod paths;

use fmpxml_model::{Database, ErrorCode, Field, NormalizedRow, Product};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::{Decoder, NsReader};
use tokio::io::AsyncBufRead;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{ConvertError, Result};
use paths::{PathChain, Step};

/// Sending half of the event channels, held by the parser.
///
/// Dropping the senders closes every channel, which is how the consumer
/// learns the document is finished.
#[derive(Debug)]
pub struct EventSenders {
    pub error_code: mpsc::Sender<ErrorCode>,
    pub product: mpsc::Sender<Product>,
    pub database: mpsc::Sender<Database>,
    pub field: mpsc::Sender<Field>,
    pub metadata_end: mpsc::Sender<()>,
    pub result_set_end: mpsc::Sender<()>,
    pub row: mpsc::Sender<NormalizedRow>,
}

/// Receiving half of the event channels, held by the mapper.
#[derive(Debug)]
pub struct EventReceivers {
    pub error_code: mpsc::Receiver<ErrorCode>,
    pub product: mpsc::Receiver<Product>,
    pub database: mpsc::Receiver<Database>,
    pub field: mpsc::Receiver<Field>,
    pub metadata_end: mpsc::Receiver<()>,
    pub result_set_end: mpsc::Receiver<()>,
    pub row: mpsc::Receiver<NormalizedRow>,
}

/// Build the event channels connecting the parser to the mapper.
///
/// Each channel holds a single event, so the parser advances only as fast
/// as the mapper consumes.
pub fn event_channels() -> (EventSenders, EventReceivers) {
    let (error_code_tx, error_code_rx) = mpsc::channel(1);
    let (product_tx, product_rx) = mpsc::channel(1);
    let (database_tx, database_rx) = mpsc::channel(1);
    let (field_tx, field_rx) = mpsc::channel(1);
    let (metadata_end_tx, metadata_end_rx) = mpsc::channel(1);
    let (result_set_end_tx, result_set_end_rx) = mpsc::channel(1);
    let (row_tx, row_rx) = mpsc::channel(1);

    let senders = EventSenders {
        error_code: error_code_tx,
        product: product_tx,
        database: database_tx,
        field: field_tx,
        metadata_end: metadata_end_tx,
        result_set_end: result_set_end_tx,
        row: row_tx,
    };
    let receivers = EventReceivers {
        error_code: error_code_rx,
        product: product_rx,
        database: database_rx,
        field: field_rx,
        metadata_end: metadata_end_rx,
        result_set_end: result_set_end_rx,
        row: row_rx,
    };

    (senders, receivers)
}

/// Parse an FMPXMLRESULT document, emitting domain events as elements close.
///
/// Returns when the document ends, the token is cancelled, or the input is
/// not a well-formed FMPXMLRESULT document. The senders are dropped on
/// return, closing the event channels.
pub async fn parse<R>(input: R, senders: EventSenders, token: CancellationToken) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut reader = NsReader::from_reader(input);
    reader.config_mut().expand_empty_elements = true;

    let mut state = DocumentState::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let decoder = reader.decoder();

        let (resolve, event) = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(ConvertError::Cancelled),
            result = reader.read_resolved_event_into_async(&mut buf) => result?,
        };

        match event {
            Event::Start(start) => {
                let step = Step::resolve(bound_namespace(&resolve), start.local_name().as_ref());
                handle_start(&mut state, &senders, &token, step, &start, decoder).await?;
            }
            Event::End(_) => handle_end(&mut state, &senders, &token).await?,
            Event::Text(text) => {
                if let Some(acc) = state.active_text() {
                    let chunk = text.decode()?;
                    acc.get_or_insert_with(String::new).push_str(&chunk);
                }
            }
            Event::CData(cdata) => {
                if let Some(acc) = state.active_text() {
                    let chunk = decoder.decode(&cdata)?;
                    acc.get_or_insert_with(String::new).push_str(&chunk);
                }
            }
            Event::GeneralRef(entity) => {
                if let Some(acc) = state.active_text() {
                    let name = decoder.decode(&entity)?;
                    let resolved = resolve_entity(&name)?;
                    acc.get_or_insert_with(String::new).push_str(&resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    debug!("Document complete");
    Ok(())
}

/// Mutable parse state: the open-element chain plus whatever element
/// content is currently being accumulated.
#[derive(Debug, Default)]
struct DocumentState {
    chain: PathChain,
    error_code: Option<String>,
    datum: Option<String>,
    row: Option<NormalizedRow>,
    metadata_ended: bool,
}

impl DocumentState {
    /// The text accumulator for the current path, if text matters here.
    ///
    /// `None` means no element was started for this datum yet; the first
    /// chunk of content creates the entry. An element that never produces
    /// content therefore stays `None`, which for DATA means "no datum".
    fn active_text(&mut self) -> Option<&mut Option<String>> {
        if self.chain.is(paths::DATA_PATH) {
            Some(&mut self.datum)
        } else if self.chain.is(paths::ERROR_CODE_PATH) {
            Some(&mut self.error_code)
        } else {
            None
        }
    }
}

async fn handle_start(
    state: &mut DocumentState,
    senders: &EventSenders,
    token: &CancellationToken,
    step: Step,
    start: &BytesStart<'_>,
    decoder: Decoder,
) -> Result<()> {
    state.chain.push(step);

    if state.chain.is(paths::ERROR_CODE_PATH) {
        state.error_code = None;
    } else if state.chain.is(paths::PRODUCT_PATH) {
        let product = product_from_attrs(start, decoder)?;
        debug!("Parsed PRODUCT: {} {}", product.name, product.version);
        send(token, &senders.product, product).await?;
    } else if state.chain.is(paths::DATABASE_PATH) {
        let database = database_from_attrs(start, decoder)?;
        debug!(
            "Parsed DATABASE: {} ({} records)",
            database.name, database.records
        );
        send(token, &senders.database, database).await?;
    } else if state.chain.is(paths::FIELD_PATH) {
        if state.metadata_ended {
            return Err(ConvertError::FieldAfterMetadataEnd);
        }
        let field = field_from_attrs(start, decoder)?;
        debug!("Parsed FIELD: {} ({})", field.name, field.field_type);
        send(token, &senders.field, field).await?;
    } else if state.chain.is(paths::RESULT_SET_PATH) {
        if let Some(found) = found_from_attrs(start, decoder)? {
            debug!("RESULTSET opened, FOUND={}", found);
        }
    } else if state.chain.is(paths::ROW_PATH) {
        state.row = Some(row_from_attrs(start, decoder)?);
    } else if state.chain.is(paths::COL_PATH) {
        if let Some(row) = state.row.as_mut() {
            row.columns.push(Vec::new());
        }
    } else if state.chain.is(paths::DATA_PATH) {
        state.datum = None;
    }

    Ok(())
}

async fn handle_end(
    state: &mut DocumentState,
    senders: &EventSenders,
    token: &CancellationToken,
) -> Result<()> {
    if state.chain.is(paths::ERROR_CODE_PATH) {
        if let Some(text) = state.error_code.take() {
            let code = match text.parse::<i64>() {
                Ok(code) => code,
                Err(_) => return Err(ConvertError::ErrorCodeText { text }),
            };
            debug!("Parsed ERRORCODE: {}", code);
            send(token, &senders.error_code, ErrorCode(code)).await?;
        }
    } else if state.chain.is(paths::METADATA_PATH) {
        debug!("METADATA section closed");
        state.metadata_ended = true;
        send(token, &senders.metadata_end, ()).await?;
    } else if state.chain.is(paths::RESULT_SET_PATH) {
        debug!("RESULTSET section closed");
        send(token, &senders.result_set_end, ()).await?;
    } else if state.chain.is(paths::ROW_PATH) {
        if let Some(row) = state.row.take() {
            debug!(
                "Parsed ROW recordID={} with {} columns",
                row.record_id,
                row.columns.len()
            );
            send(token, &senders.row, row).await?;
        }
    } else if state.chain.is(paths::DATA_PATH) {
        if let Some(datum) = state.datum.take() {
            if let Some(column) = state.row.as_mut().and_then(|row| row.columns.last_mut()) {
                column.push(datum);
            }
        }
    }

    state.chain.pop();
    Ok(())
}

/// Send one event, giving up as soon as the pipeline is torn down.
async fn send<T>(token: &CancellationToken, tx: &mpsc::Sender<T>, event: T) -> Result<()> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ConvertError::Cancelled),
        sent = tx.send(event) => sent.map_err(|_| ConvertError::Cancelled),
    }
}

fn bound_namespace<'a>(resolve: &'a ResolveResult<'_>) -> Option<&'a [u8]> {
    match resolve {
        ResolveResult::Bound(ns) => Some(ns.0),
        _ => None,
    }
}

fn product_from_attrs(start: &BytesStart<'_>, decoder: Decoder) -> Result<Product> {
    let mut product = Product::default();
    for attr in start.attributes() {
        let attr = attr?;
        let value = decode_attr(&attr, decoder)?;
        match attr.key.local_name().as_ref() {
            b"BUILD" => product.build = value,
            b"NAME" => product.name = value,
            b"VERSION" => product.version = value,
            _ => {}
        }
    }
    Ok(product)
}

fn database_from_attrs(start: &BytesStart<'_>, decoder: Decoder) -> Result<Database> {
    let mut database = Database::default();
    for attr in start.attributes() {
        let attr = attr?;
        let value = decode_attr(&attr, decoder)?;
        match attr.key.local_name().as_ref() {
            b"DATEFORMAT" => database.date_format = value,
            b"LAYOUT" => database.layout = value,
            b"NAME" => database.name = value,
            b"RECORDS" => database.records = parse_int_attr("RECORDS", &value)?,
            b"TIMEFORMAT" => database.time_format = value,
            _ => {}
        }
    }
    Ok(database)
}

fn field_from_attrs(start: &BytesStart<'_>, decoder: Decoder) -> Result<Field> {
    let mut field = Field::default();
    for attr in start.attributes() {
        let attr = attr?;
        let value = decode_attr(&attr, decoder)?;
        match attr.key.local_name().as_ref() {
            b"EMPTYOK" => field.empty_ok = parse_yes_no(&value)?,
            b"MAXREPEAT" => field.max_repeat = parse_int_attr("MAXREPEAT", &value)?,
            b"NAME" => field.name = value,
            b"TYPE" => field.field_type = value,
            _ => {}
        }
    }
    Ok(field)
}

fn found_from_attrs(start: &BytesStart<'_>, decoder: Decoder) -> Result<Option<i64>> {
    let mut found = None;
    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == b"FOUND" {
            let value = decode_attr(&attr, decoder)?;
            found = Some(parse_int_attr("FOUND", &value)?);
        }
    }
    Ok(found)
}

fn row_from_attrs(start: &BytesStart<'_>, decoder: Decoder) -> Result<NormalizedRow> {
    let mut row = NormalizedRow::default();
    for attr in start.attributes() {
        let attr = attr?;
        let value = decode_attr(&attr, decoder)?;
        match attr.key.local_name().as_ref() {
            b"MODID" => row.mod_id = value,
            b"RECORDID" => row.record_id = value,
            _ => {}
        }
    }
    Ok(row)
}

fn decode_attr(attr: &Attribute<'_>, decoder: Decoder) -> Result<String> {
    let decoded = decoder.decode(attr.value.as_ref())?;
    let value = quick_xml::escape::unescape(&decoded)?;
    Ok(value.into_owned())
}

fn parse_int_attr(attr: &'static str, value: &str) -> Result<i64> {
    value.parse().map_err(|_| ConvertError::IntAttribute {
        attr,
        value: value.to_string(),
    })
}

fn parse_yes_no(value: &str) -> Result<bool> {
    match value {
        "YES" => Ok(true),
        "NO" => Ok(false),
        _ => Err(ConvertError::YesNoAttribute {
            value: value.to_string(),
        }),
    }
}

/// Resolve a general entity reference by name.
///
/// The five predefined XML entities and numeric character references are
/// supported; anything else is fatal because silently dropping content
/// would corrupt data.
fn resolve_entity(name: &str) -> Result<String> {
    let resolved = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "apos" => '\'',
        "quot" => '"',
        _ => match char_reference(name) {
            Some(c) => c,
            None => return Err(ConvertError::UnknownEntity(name.to_string())),
        },
    };
    Ok(resolved.to_string())
}

fn char_reference(name: &str) -> Option<char> {
    let digits = name.strip_prefix('#')?;
    let code = if let Some(hex) = digits.strip_prefix('x') {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse().ok()?
    };
    char::from_u32(code)
}

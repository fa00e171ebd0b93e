//! Command-line interface for fmpxml-to-json
//!
//! # Usage Examples
//!
//! ## Document Mode
//! ```bash
//! # One pretty-printed JSON document on stdout
//! fmpxml-to-json document --input export.xml
//!
//! # With injected record bookkeeping keys
//! fmpxml-to-json document --input export.xml \
//!   --record-id-key recordId --mod-id-key modId
//! ```
//!
//! ## Stream Mode
//! ```bash
//! # One compact JSON record per line
//! fmpxml-to-json stream --input export.xml --output records.jsonl
//!
//! # Length-prefixed frames with a content hash per record
//! fmpxml-to-json stream --input export.xml \
//!   --length-prefix variable --hash-key hash
//! ```

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use fmpxml_to_json::{
    convert, ConvertConfig, FrameConfig, LengthPrefix, NumberMode, OutputMode, RecordOptions,
};
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser)]
#[command(name = "fmpxml-to-json")]
#[command(about = "A tool for converting FileMaker FMPXMLRESULT exports to JSON")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert to a single pretty-printed JSON document
    Document {
        #[command(flatten)]
        common: CommonOpts,
    },

    /// Convert to a framed stream of JSON records, one per row
    Stream {
        #[command(flatten)]
        common: CommonOpts,

        /// Bytes written before each record
        #[arg(long, default_value = "")]
        prefix: String,

        /// Bytes written after each record
        #[arg(long, default_value = "\n")]
        suffix: String,

        /// Length prefix between the prefix and the record: off, variable,
        /// or a fixed digit width
        #[arg(long, default_value = "off", value_parser = parse_length_prefix)]
        length_prefix: LengthPrefix,
    },
}

#[derive(Args, Clone)]
struct CommonOpts {
    /// Input file, - for stdin
    #[arg(long, default_value = "-")]
    input: String,

    /// Output file, - for stdout
    #[arg(long, default_value = "-")]
    output: String,

    /// Destination key for the FileMaker record ID (empty omits it)
    #[arg(long, default_value = "")]
    record_id_key: String,

    /// Destination key for the FileMaker modification ID (empty omits it)
    #[arg(long, default_value = "")]
    mod_id_key: String,

    /// Destination key for a SHA-512 hash of the row content (empty omits it)
    #[arg(long, default_value = "")]
    hash_key: String,

    /// Keep NUMBER data as validated raw numerals instead of parsing
    #[arg(long)]
    raw_numbers: bool,
}

impl CommonOpts {
    fn record_options(&self) -> RecordOptions {
        RecordOptions {
            record_id_key: non_empty(&self.record_id_key),
            mod_id_key: non_empty(&self.mod_id_key),
            hash_key: non_empty(&self.hash_key),
            numbers: if self.raw_numbers {
                NumberMode::Raw
            } else {
                NumberMode::Parse
            },
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_length_prefix(value: &str) -> Result<LengthPrefix, String> {
    match value {
        "off" => Ok(LengthPrefix::Off),
        "variable" => Ok(LengthPrefix::Variable),
        width => match width.parse::<usize>() {
            Ok(width) if width > 0 => Ok(LengthPrefix::Fixed(width)),
            _ => Err("expected off, variable, or a positive digit width".to_string()),
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let (common, mode) = match cli.command {
        Commands::Document { common } => (common, OutputMode::Document),
        Commands::Stream {
            common,
            prefix,
            suffix,
            length_prefix,
        } => (
            common,
            OutputMode::Stream(FrameConfig {
                prefix,
                suffix,
                length: length_prefix,
            }),
        ),
    };

    let input = open_input(&common.input).await?;
    let output = open_output(&common.output).await?;
    let config = ConvertConfig {
        records: common.record_options(),
        mode,
    };

    let token = CancellationToken::new();
    setup_shutdown_handler(&token);

    convert(input, output, config, token).await?;
    Ok(())
}

async fn open_input(path: &str) -> anyhow::Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    if path == "-" {
        Ok(Box::new(BufReader::new(tokio::io::stdin())))
    } else {
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open input file {path:?}"))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

async fn open_output(path: &str) -> anyhow::Result<Box<dyn AsyncWrite + Unpin + Send>> {
    if path == "-" {
        Ok(Box::new(tokio::io::stdout()))
    } else {
        let file = tokio::fs::File::create(path)
            .await
            .with_context(|| format!("Failed to create output file {path:?}"))?;
        Ok(Box::new(file))
    }
}

/// Cancels the conversion on the first Ctrl+C
fn setup_shutdown_handler(token: &CancellationToken) {
    let token = token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");

        info!("Received interrupt signal (Ctrl+C)");
        token.cancel();
    });
}

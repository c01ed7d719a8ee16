//! Purpose: `dynaplain` CLI entry point.
//! Role: Binary crate root; reads a tagged document, decodes it, emits JSON on stdout.
//! Invariants: Decoded output is the only thing written to stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `core::error::to_exit_code`.
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum, ValueHint};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

use dynaplain::core::classify::classify;
use dynaplain::core::decode::{DecodeConfig, ErrorPolicy, FieldSkip, decode_record};
use dynaplain::core::error::{Error, ErrorKind, to_exit_code};

#[derive(Parser)]
#[command(
    name = "dynaplain",
    version,
    about = "Decode DynamoDB attribute-value tagged JSON into plain typed JSON",
    long_about = r#"Reads a JSON document whose fields are single-key tagged wrappers
(S, N, BOOL, NULL, L, M) and writes the decoded plain JSON mapping to stdout.

Malformed fields are logged to stderr and skipped; only an unparseable
document aborts the run. Set RUST_LOG to adjust diagnostic verbosity."#
)]
struct Cli {
    #[arg(help = "Input file (stdin when omitted)", value_hint = ValueHint::FilePath)]
    file: Option<PathBuf>,
    #[arg(
        short = 'e',
        long = "errors",
        default_value = "skip",
        value_enum,
        help = "Field-error policy: skip logs and continues, stop aborts on the first error"
    )]
    errors: ErrorMode,
    #[arg(long, help = "Emit compact JSON instead of pretty-printed")]
    compact: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ErrorMode {
    Skip,
    Stop,
}

impl ErrorMode {
    fn policy(self) -> ErrorPolicy {
        match self {
            ErrorMode::Skip => ErrorPolicy::Skip,
            ErrorMode::Stop => ErrorPolicy::Stop,
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    init_tracing();
    let cli = Cli::parse();

    let raw = read_input(cli.file.as_deref())?;
    let record = parse_document(&raw)?;

    let config = DecodeConfig {
        errors: cli.errors.policy(),
    };
    let (decoded, outcome) = decode_record(&record, config, emit_skip)?;
    tracing::info!(
        fields_total = outcome.fields_total,
        decoded = outcome.decoded,
        skipped = outcome.skipped,
        "decode complete"
    );

    println!("{}", render(&Value::Object(decoded), cli.compact)?);
    Ok(RunOutcome::ok())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(path: Option<&Path>) -> Result<String, Error> {
    match path {
        Some(path) => fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!("failed to read {}", path.display()))
                .with_source(err)
        }),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to read stdin")
                    .with_source(err)
            })?;
            Ok(buffer)
        }
    }
}

/// Parse JSON from a string slice.
fn json_from_str<T: DeserializeOwned>(s: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(s)
}

fn parse_document(raw: &str) -> Result<Map<String, Value>, Error> {
    let value: Value = json_from_str(raw).map_err(|err| {
        Error::new(ErrorKind::MalformedDocument)
            .with_message("input is not valid JSON")
            .with_source(err)
    })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::new(ErrorKind::MalformedDocument).with_message(format!(
            "top level must be an object, found {}",
            classify(&other).label()
        ))),
    }
}

fn emit_skip(skip: FieldSkip) {
    let path = if skip.path.is_empty() {
        "<record>"
    } else {
        skip.path.as_str()
    };
    tracing::warn!(
        path,
        tag = skip.tag.unwrap_or("-"),
        kind = ?skip.kind,
        token = skip.token.as_deref().unwrap_or(""),
        "skipped field: {}",
        skip.message
    );
}

fn render(value: &Value, compact: bool) -> Result<String, Error> {
    let rendered = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    rendered.map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode output")
            .with_source(err)
    })
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("error: {err}");
        return;
    }
    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert(
        "message".to_string(),
        json!(err.message().unwrap_or("decode failed")),
    );
    if let Some(field) = err.field() {
        inner.insert("field".to_string(), json!(field));
    }
    if let Some(tag) = err.tag() {
        inner.insert("tag".to_string(), json!(tag));
    }
    if let Some(token) = err.token() {
        inner.insert("token".to_string(), json!(token));
    }
    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

//! CLI command implementations
//!
//! Each command reads one JSON value from stdin and writes one JSON envelope
//! to stdout. Rejected requests produce an error envelope and a zero exit
//! status; configuration and I/O failures are returned to `main`.

use std::path::Path;

use bson::Bson;
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::compiler::{CompileMode, CompilerConfig, QueryCompiler};
use crate::pagination::PaginationRequest;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Server-side settings applied on top of the decoded request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileFlags {
    pub mode: CompileMode,
    pub apply_limit: bool,
    pub external_search: bool,
}

impl Default for CompileFlags {
    fn default() -> Self {
        Self {
            mode: CompileMode::FlatFilter,
            apply_limit: true,
            external_search: false,
        }
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    init_logging();
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Compile {
            config,
            mode,
            no_limit,
            external_search,
        } => {
            let flags = CompileFlags {
                mode: mode.into(),
                apply_limit: !no_limit,
                external_search,
            };
            compile(config.as_deref(), flags)
        }
        Command::Decode => decode(),
    }
}

/// JSON logs on stderr, filtered by RUST_LOG
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Compile one request read from stdin
pub fn compile(config_path: Option<&Path>, flags: CompileFlags) -> CliResult<()> {
    let config = match config_path {
        Some(path) => CompilerConfig::load(path)?,
        None => CompilerConfig::reference(),
    };

    info!(mode = flags.mode.as_str(), "compile started");
    let input = read_request()?;
    respond(compile_input(input, &config, flags))
}

/// Decode one blob read from stdin
pub fn decode() -> CliResult<()> {
    let input = read_request()?;
    respond(decode_input(input))
}

/// Compile a request given either as an encoded blob string or a JSON object
pub fn compile_input(input: Value, config: &CompilerConfig, flags: CompileFlags) -> CliResult<Value> {
    let mut request = parse_request(input)?.with_external_search_index(flags.external_search);
    if !flags.apply_limit {
        request = request.without_limit();
    }

    let plan = QueryCompiler::new(config).compile(&request, flags.mode)?;
    info!(
        mode = flags.mode.as_str(),
        clauses = request.filters().len(),
        "compile finished"
    );

    Ok(json!({
        "mode": flags.mode.as_str(),
        "plan": Bson::Document(plan.to_document()).into_relaxed_extjson(),
    }))
}

/// Decode a request and describe it with defaults applied
pub fn decode_input(input: Value) -> CliResult<Value> {
    let request = parse_request(input)?;

    Ok(json!({
        "offset": request.offset(),
        "limit": request.limit(),
        "search": request.search(),
        "sort": request.sort(),
        "order": request.order().as_str(),
        "next": request.next(),
        "prev": request.prev(),
        "filters": serde_json::to_value(request.filters())?,
    }))
}

fn parse_request(input: Value) -> CliResult<PaginationRequest> {
    let request = match input {
        Value::String(blob) => PaginationRequest::decode_blob(&blob)?,
        object @ Value::Object(_) => PaginationRequest::from_json(object)?,
        _ => {
            return Err(CliError::io_error(
                "Expected an encoded pagination string or a pagination object",
            ))
        }
    };
    Ok(request)
}

fn respond(result: CliResult<Value>) -> CliResult<()> {
    match result {
        Ok(data) => write_response(data),
        Err(e) if e.is_rejection() => write_error(e.code_str(), e.message()),
        Err(e) => Err(e),
    }
}

//! CLI module for querycraft
//!
//! Provides command-line interface for:
//! - compile: Compile one pagination request into a query plan
//! - decode: Decode one pagination blob and print the request

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, ModeArg};
pub use commands::{compile, compile_input, decode, decode_input, run, run_command, CompileFlags};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};

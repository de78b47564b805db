//! CLI argument definitions using clap
//!
//! Commands:
//! - querycraft compile [--config <path>] [--mode flat|pipeline] [--no-limit] [--external-search]
//! - querycraft decode

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::compiler::CompileMode;

/// querycraft - compiles pagination requests into document-store query plans
#[derive(Parser, Debug)]
#[command(name = "querycraft")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Output shape selectable from the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// Filter plus skip/limit/sort options
    Flat,
    /// Filter plus aggregation stages
    Pipeline,
}

impl From<ModeArg> for CompileMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Flat => CompileMode::FlatFilter,
            ModeArg::Pipeline => CompileMode::Pipeline,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read one request from stdin and print its query plan
    Compile {
        /// Path to compiler configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output shape
        #[arg(long, value_enum, default_value = "flat")]
        mode: ModeArg,

        /// Leave skip/limit out of the plan (count queries)
        #[arg(long)]
        no_limit: bool,

        /// Results are already restricted by an external search index
        #[arg(long)]
        external_search: bool,
    },

    /// Read one encoded blob from stdin and print the decoded request
    Decode,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

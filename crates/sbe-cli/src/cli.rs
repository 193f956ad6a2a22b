//! CLI argument definitions for orchestra2sbe.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use sbe_model::SchemaVersion;

#[derive(Parser)]
#[command(
    name = "orchestra2sbe",
    version,
    about = "Convert FIX Orchestra repositories to SBE message schemas and validate them",
    long_about = "Convert a FIX Orchestra repository into a Simple Binary Encoding message schema.\n\n\
                  Conversion runs two XSLT stages (datatype injection, then SBE mapping)\n\
                  through an external XSLT processor and validates the result against\n\
                  the SBE XSD of the selected version."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Additional directory searched for scripts and schemas before the
    /// resources root.
    #[arg(long = "resources", value_name = "DIR", global = true)]
    pub resources: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate an SBE message schema document against an XSD.
    Validate(ValidateArgs),

    /// Convert an Orchestra repository to an SBE message schema and validate it.
    Convert(ConvertArgs),

    /// Apply one XSLT script to one input document.
    Transform(TransformArgs),

    /// List schemas and scripts reachable by resource name.
    Resources,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// SBE message schema document to validate.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Schema resource name, path or URL (overrides --sbe-version).
    #[arg(long = "schema", value_name = "SCHEMA")]
    pub schema: Option<String>,

    /// Validate against the XSD of this SBE version.
    #[arg(long = "sbe-version", value_enum, default_value = "v1")]
    pub sbe_version: VersionArg,

    /// Write the newline-delimited JSON event log to this file.
    #[arg(long = "event-log", value_name = "PATH")]
    pub event_log: Option<PathBuf>,

    /// Do not resolve XInclude directives in the input.
    #[arg(long = "no-xinclude")]
    pub no_xinclude: bool,
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Orchestra repository document.
    #[arg(value_name = "ORCHESTRA")]
    pub orchestra: PathBuf,

    /// SBE version to produce.
    #[arg(long = "sbe-version", value_enum, default_value = "v1")]
    pub sbe_version: VersionArg,

    /// Directory receiving the intermediate and final documents.
    #[arg(long = "work-dir", value_name = "DIR", default_value = "target/sbe")]
    pub work_dir: PathBuf,

    #[command(flatten)]
    pub engine: EngineArgs,

    /// Write the newline-delimited JSON event log to this file.
    #[arg(long = "event-log", value_name = "PATH")]
    pub event_log: Option<PathBuf>,

    /// Stop after the transform stages.
    #[arg(long = "no-validate")]
    pub no_validate: bool,
}

#[derive(Args)]
pub struct TransformArgs {
    /// XSLT script: resource name or path.
    #[arg(value_name = "SCRIPT")]
    pub script: String,

    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Args)]
pub struct EngineArgs {
    /// TOML file with an `[engine]` table (default: xsltproc).
    #[arg(long = "engine-config", value_name = "PATH")]
    pub engine_config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum VersionArg {
    V1,
    V2,
}

impl From<VersionArg> for SchemaVersion {
    fn from(value: VersionArg) -> Self {
        match value {
            VersionArg::V1 => SchemaVersion::V1,
            VersionArg::V2 => SchemaVersion::V2,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

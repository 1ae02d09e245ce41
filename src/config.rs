//! Command-line and environment configuration for the binary.

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use tracing::level_filters::LevelFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Render an event proposal .docx from a template")]
pub struct Args {
    /// Template .docx containing the proposal placeholders.
    #[arg(long, env = "DOCX_PROPOSAL_TEMPLATE")]
    pub template: PathBuf,

    /// JSON file with the proposal render request.
    #[arg(long, env = "DOCX_PROPOSAL_REQUEST")]
    pub request: PathBuf,

    /// Output file, or a directory to write the generated filename into.
    #[arg(long, env = "DOCX_PROPOSAL_OUT", default_value = ".")]
    pub out: PathBuf,

    /// Default log level; RUST_LOG takes precedence.
    #[arg(long, env = "DOCX_PROPOSAL_LOG_LEVEL", default_value = "info")]
    pub log_level: LevelFilter,

    #[arg(long, env = "DOCX_PROPOSAL_LOG_FORMAT", value_enum, default_value = "compact")]
    pub log_format: LogFormat,
}

impl Args {
    pub fn logging(&self) -> LoggingSettings {
        LoggingSettings {
            level: self.log_level,
            format: self.log_format,
        }
    }

    /// Where to write the document: `--out` itself, or `--out/<filename>` when
    /// it names an existing directory.
    pub fn output_path(&self, filename: &str) -> PathBuf {
        resolve_output(&self.out, filename)
    }
}

fn resolve_output(out: &Path, filename: &str) -> PathBuf {
    if out.is_dir() {
        out.join(filename)
    } else {
        out.to_path_buf()
    }
}

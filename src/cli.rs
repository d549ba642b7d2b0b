use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::loading::Overrides;

// ///////////// //
// CLI interface //
// ///////////// //

/// getterer-table - Polls a Getterer for its 3D printers and prints their status as a table.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file: /path/to/file.yaml (default: "./config.yaml")
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Getterer URL
    #[arg(long)]
    pub gettererurl: Option<String>,

    /// Getterer API token
    #[arg(long)]
    pub statustoken: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub ttl: Option<u64>,

    /// Column padding
    #[arg(long)]
    pub padding: Option<usize>,

    /// Log level (trace/debug/info/warn/error)
    #[arg(long)]
    pub loglevel: Option<String>,

    /// Display configuration
    #[arg(long)]
    pub displayconfig: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dumps the decoded printer statuses as JSON instead of a table.
    Dump,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            getterer_url: self.gettererurl.clone(),
            status_token: self.statustoken.clone(),
            ttl: self.ttl,
            padding: self.padding,
            log_level: self.loglevel.clone(),
        }
    }
}

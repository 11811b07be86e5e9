//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// sootcache - offline cache worker for a static site
///
/// Precaches the site shell, serves requests cache-first while refreshing
/// in the background, and falls back to an offline page.
#[derive(Parser, Debug)]
#[command(name = "sootcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SOOTCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding cache buckets and the registration
    #[arg(long, global = true, env = "SOOTCACHE_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Log output format (overrides general.log_format)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install the configured worker version
    Install(InstallArgs),

    /// Activate the waiting worker version
    Activate,

    /// Run a request through the active worker
    Fetch(FetchArgs),

    /// Post a control message to the worker
    Message(MessageArgs),

    /// Fire a background sync
    Sync {
        /// Sync tag
        tag: String,
    },

    /// Deliver a push message
    Push {
        /// Push payload text
        data: Option<String>,
    },

    /// Click the shown notification
    Click {
        /// Notification action (e.g. explore, close)
        action: Option<String>,
    },

    /// Show the registration and cache buckets
    Status(StatusArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the install command
#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Leave the new version waiting instead of activating it
    #[arg(long)]
    pub no_activate: bool,
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// URL or origin-relative path to request
    pub url: String,

    /// Send as a page navigation
    #[arg(long)]
    pub navigate: bool,

    /// Accept header value
    #[arg(long)]
    pub accept: Option<String>,

    /// Request method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Write the response body to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the message command
#[derive(Parser, Debug)]
pub struct MessageArgs {
    /// Message to post
    pub kind: MessageKind,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Control messages understood by the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageKind {
    /// Activate a waiting version now
    SkipWaiting,
    /// Drop the current cache generation
    ClearCache,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for status
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one bucket per line)
    Plain,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Parse the config file spelling, defaulting to text
    pub fn from_config(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

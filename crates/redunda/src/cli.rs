//! Clap derive structures for the `redunda` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// redunda -- keep bot instances coordinated through Redunda
#[derive(Debug, Parser)]
#[command(
    name = "redunda",
    version,
    about = "Coordinate bot instances through the Redunda service",
    long_about = "Reports instance liveness to Redunda, follows its standby/active\n\
        directive, and keeps tracked data files in sync across instances.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "REDUNDA_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Redunda service URL (overrides profile)
    #[arg(long, short = 'e', env = "REDUNDA_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Instance API key (overrides profile)
    #[arg(long, env = "REDUNDA_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Bot version reported with each heartbeat
    #[arg(long, env = "REDUNDA_BOT_VERSION", global = true)]
    pub bot_version: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "REDUNDA_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "REDUNDA_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output Enums ─────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Heartbeat and sync files until interrupted
    Run(RunArgs),

    /// Ask Redunda whether this instance should stand by
    Status,

    /// Run one file reconciliation pass
    Sync(SyncArgs),

    /// Inspect and transfer individual files
    #[command(alias = "f")]
    Files(FilesArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Run ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Track an extra file (repeatable)
    #[arg(long = "track", value_name = "FILE")]
    pub track: Vec<String>,

    /// Do not synchronize files, heartbeat only
    #[arg(long)]
    pub no_sync: bool,

    /// Pin the instance to active and skip heartbeats
    #[arg(long)]
    pub debug: bool,
}

// ── Sync ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Track an extra file (repeatable)
    #[arg(long = "track", value_name = "FILE")]
    pub track: Vec<String>,
}

// ── Files ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FilesArgs {
    #[command(subcommand)]
    pub command: FilesCommand,
}

#[derive(Debug, Subcommand)]
pub enum FilesCommand {
    /// List files stored remotely
    #[command(alias = "ls")]
    List,

    /// Upload local files, overwriting the remote copies
    Push {
        /// Files to upload
        #[arg(required = true, value_name = "FILE")]
        files: Vec<String>,
    },

    /// Download one file, overwriting the local copy
    Pull {
        /// File to download
        #[arg(value_name = "FILE")]
        file: String,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Show the effective configuration (secrets redacted)
    Show,

    /// Write a profile to the config file
    Init(InitArgs),
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Read the API key from this environment variable at runtime
    #[arg(long, value_name = "VAR")]
    pub api_key_env: Option<String>,

    /// Store --api-key in the system keyring instead of the config file
    #[arg(long)]
    pub keyring: bool,

    /// Track a file (repeatable)
    #[arg(long = "track", value_name = "FILE")]
    pub track: Vec<String>,

    /// Replace an existing profile of the same name
    #[arg(long)]
    pub force: bool,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

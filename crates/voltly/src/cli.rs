//! Clap derive structures for the `voltly` CLI.
//!
//! Defines the command tree, global flags, and shared enums.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// voltly -- EV charging station watcher
#[derive(Debug, Parser)]
#[command(
    name = "voltly",
    version,
    about = "Watch EV charging station availability from the command line",
    long_about = "Polls the public charge service for station, pricing-tier, and\n\
        per-connector status, and flattens the feed into named values you can\n\
        print once or watch continuously.",
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
    /// Station profile to use
    #[arg(long, short = 'S', env = "VOLTLY_STATION", global = true)]
    pub station: Option<String>,

    /// Station POI uid (overrides profile)
    #[arg(long, env = "VOLTLY_UID", global = true)]
    pub uid: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "VOLTLY_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, env = "VOLTLY_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one `attr<TAB>value` pair per line (scripting)
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

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// One-shot refresh of the station's decoded values
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Poll continuously and print updates as they arrive
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Discover a station's POI uid
    Find(FindArgs),

    /// Manage the configuration file
    #[command(alias = "cfg")]
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command Arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Dump the merged state tree instead of the decoded values
    #[arg(long)]
    pub raw: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Attr to subscribe to (dependent fields come along)
    #[arg(long, default_value = "total_left")]
    pub attr: String,

    /// Poll interval in seconds (overrides profile)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Exit after this many updates
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

#[derive(Debug, Args)]
pub struct FindArgs {
    /// Search keyword (station name)
    #[arg(long, short = 'Q', conflicts_with = "link")]
    pub query: Option<String>,

    /// City or region to search within (defaults to nationwide)
    #[arg(long, requires = "query")]
    pub region: Option<String>,

    /// Share link to resolve (j.map.baidu.com or a full map URL)
    #[arg(long, short = 'l')]
    pub link: Option<String>,

    /// Map API key for keyword search (overrides config)
    #[arg(long, env = "VOLTLY_API_KEY", hide_env = true)]
    pub api_key: Option<String>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the config file path
    Path,
    /// Show the loaded configuration
    Show,
    /// Write a starter config file
    Init {
        /// Station POI uid for the default profile
        #[arg(long)]
        uid: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

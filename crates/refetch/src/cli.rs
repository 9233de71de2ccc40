//! Clap derive structures for the `refetch` CLI.
//!
//! Defines the command tree, global flags, and shared request arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// refetch -- stale-while-revalidate requests from the command line
#[derive(Debug, Parser)]
#[command(
    name = "refetch",
    version,
    about = "Fetch, cache and revalidate HTTP resources from the command line",
    long_about = "Opens HTTP resources through the refetch revalidation engine.\n\n\
        `get` performs one request and prints its final state; `watch` keeps\n\
        the resource fresh with interval, retry and focus triggers.",
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
    /// Base URL relative locators are resolved against
    #[arg(long, short = 'b', env = "REFETCH_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Output format [default: from config, else json]
    #[arg(long, short = 'o', env = "REFETCH_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, env = "REFETCH_COLOR", global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, env = "REFETCH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Read configuration from this file instead of the default location
    #[arg(long, env = "REFETCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

impl GlobalOpts {
    pub fn output_format(&self) -> OutputFormat {
        self.output.clone().unwrap_or_default()
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color.clone().unwrap_or_default()
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// One summary line per state (scripting, logs)
    Plain,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    #[default]
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch a resource once and print its final state
    Get(GetArgs),

    /// Keep a resource fresh and print every state change
    Watch(WatchArgs),

    /// Print the cache key a request resolves to
    Key(KeyArgs),

    /// Normalize a time span ("2 sec", "1 min", 500) to milliseconds
    Span(SpanArgs),

    /// Inspect CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  REQUESTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Arguments describing one request, shared by `get`, `watch` and `key`.
#[derive(Debug, Clone, Args)]
pub struct RequestArgs {
    /// Resource locator; may contain `[name]` or `:name` path parameters
    pub url: String,

    /// HTTP method
    #[arg(long, short = 'X', default_value = "GET")]
    pub method: String,

    /// Query parameter (repeatable)
    #[arg(long, value_name = "NAME=VALUE")]
    pub query: Vec<String>,

    /// Path parameter substituted into the locator (repeatable)
    #[arg(long, value_name = "NAME=VALUE")]
    pub param: Vec<String>,

    /// Request header (repeatable)
    #[arg(long, short = 'H', value_name = "NAME:VALUE")]
    pub header: Vec<String>,

    /// Request body as JSON
    #[arg(long, short = 'd')]
    pub body: Option<String>,

    /// Explicit cache key (JSON, or a bare string)
    #[arg(long)]
    pub key: Option<String>,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Print only the payload instead of the full state
    #[arg(long)]
    pub data: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Revalidate on this period (e.g. "30 sec", "5 min", 1000)
    #[arg(long, short = 'i')]
    pub interval: Option<String>,

    /// Consecutive failures tolerated before retrying stops
    #[arg(long)]
    pub attempts: Option<u32>,

    /// Delay between error retries
    #[arg(long)]
    pub attempt_interval: Option<String>,

    /// Revalidate whenever a line is read from stdin
    #[arg(long)]
    pub on_focus: bool,

    /// Revalidate when a `reconnect` line is read from stdin
    #[arg(long)]
    pub on_reconnect: bool,

    /// Exit after printing this many states
    #[arg(long, short = 'n', value_parser = clap::value_parser!(u64).range(1..))]
    pub count: Option<u64>,
}

#[derive(Debug, Args)]
pub struct KeyArgs {
    #[command(flatten)]
    pub request: RequestArgs,
}

#[derive(Debug, Args)]
pub struct SpanArgs {
    /// Raw milliseconds or "<amount> <unit>" (ms, sec, min, h, d, we, mo, y)
    #[arg(num_args = 1.., required = true)]
    pub expr: Vec<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the configuration file location
    Path,

    /// Display current resolved configuration
    Show,

    /// Write the resolved configuration to the configuration file
    Save,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

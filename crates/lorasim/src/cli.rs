//! Clap derive structures for the `lorasim` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

use lorasim_core::{ActivationState, UplinkState};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// lorasim -- operator CLI for a simulated LoRaWAN fleet
#[derive(Debug, Parser)]
#[command(
    name = "lorasim",
    version,
    about = "Drive a simulated LoRaWAN fleet from the command line",
    long_about = "Start, stop and delete simulated LoRaWAN devices and gateways,\n\
        toggle uplink traffic, and follow per-device simulator logs.\n\n\
        Batch commands are gated: every selected device must be in the\n\
        state the command expects, otherwise nothing is sent.",
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
    /// Simulator profile to use
    #[arg(long, short = 'p', env = "LORASIM_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Simulator API base URL (overrides profile)
    #[arg(long, short = 'u', env = "LORASIM_URL", global = true)]
    pub url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "LORASIM_OUTPUT",
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

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "LORASIM_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "LORASIM_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
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
    /// YAML
    Yaml,
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

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Control simulated end-devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Manage simulated and real gateways
    #[command(alias = "gw", alias = "g")]
    Gateways(GatewaysArgs),

    /// Show or follow a device's simulator log
    #[command(alias = "log")]
    Logs(LogsArgs),

    /// Fleet dashboard counters
    Summary(SummaryArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Selection Arguments ───────────────────────────────────────

/// Records a batch command applies to.
#[derive(Debug, Args)]
pub struct SelectArgs {
    /// Record ids (device EUIs or gateway ids)
    #[arg(required_unless_present = "all", num_args = 1..)]
    pub ids: Vec<String>,

    /// Select every record of this kind
    #[arg(long, conflicts_with = "ids")]
    pub all: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List simulated devices
    #[command(alias = "ls")]
    List(DeviceListArgs),

    /// Show a single device
    Get {
        /// Device EUI
        device: String,
    },

    /// Show which batch commands a selection allows
    Gates(SelectArgs),

    /// Start (play) paused devices
    Start(SelectArgs),

    /// Stop (pause) playing devices
    Stop(SelectArgs),

    /// Start uplink traffic on playing devices
    #[command(name = "uplink-start")]
    UplinkStart(SelectArgs),

    /// Stop uplink traffic on devices that are sending
    #[command(name = "uplink-stop")]
    UplinkStop(SelectArgs),

    /// Delete devices from the simulator
    #[command(alias = "rm")]
    Delete(SelectArgs),
}

#[derive(Debug, Args)]
pub struct DeviceListArgs {
    /// Only devices in this activation state (playing, paused)
    #[arg(long)]
    pub state: Option<ActivationState>,

    /// Only devices with this uplink state (running, stopped)
    #[arg(long)]
    pub uplink: Option<UplinkState>,

    /// Only devices attached to this gateway
    #[arg(long)]
    pub gateway: Option<String>,

    /// Only devices in this region (case-insensitive)
    #[arg(long)]
    pub region: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  GATEWAYS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct GatewaysArgs {
    #[command(subcommand)]
    pub command: GatewaysCommand,
}

#[derive(Debug, Subcommand)]
pub enum GatewaysCommand {
    /// List gateways
    #[command(alias = "ls")]
    List {
        /// Only simulator-emulated gateways
        #[arg(long = "virtual", conflicts_with = "real")]
        virtual_only: bool,

        /// Only real gateways
        #[arg(long)]
        real: bool,
    },

    /// Delete gateways from the simulator
    #[command(alias = "rm")]
    Delete(SelectArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LOGS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LogsArgs {
    /// Device EUI
    pub device: String,

    /// Keep polling and print new lines until interrupted
    #[arg(long, short = 'f')]
    pub follow: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SUMMARY
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// Ask the simulator's dashboard endpoint instead of counting locally
    #[arg(long)]
    pub remote: bool,
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
    /// Print the config file location
    Path,

    /// Display current resolved configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (url, timeout, insecure, refresh_interval, log_poll_interval)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

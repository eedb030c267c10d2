//! Clap derive structures for the `fluxforge` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fluxforge -- kubectl-style CLI for the FluxForge gateway
#[derive(Debug, Parser)]
#[command(
    name = "fluxforge",
    version,
    about = "Administer a FluxForge OPC UA gateway from the command line",
    long_about = "A CLI console for the FluxForge gateway that bridges OPC UA devices,\n\
        a Telegraf agent, and an InfluxDB time-series store.\n\n\
        Register devices, scan their node trees, collect tags into scan\n\
        classes, configure InfluxDB targets, and inspect the generated\n\
        Telegraf configuration.",
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
    /// Portal profile to use
    #[arg(long, short = 'p', env = "FLUXFORGE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Portal URL (overrides profile)
    #[arg(long, short = 'P', env = "FLUXFORGE_PORTAL", global = true)]
    pub portal: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FLUXFORGE_OUTPUT",
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
    #[arg(long, short = 'k', env = "FLUXFORGE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "FLUXFORGE_TIMEOUT", default_value = "30", global = true)]
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
    /// Manage OPC UA devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Browse, collect, and manage tags
    #[command(alias = "t")]
    Tags(TagsArgs),

    /// Manage polling-rate scan classes
    #[command(alias = "sc")]
    ScanClasses(ScanClassesArgs),

    /// Manage InfluxDB connection targets
    #[command(alias = "influx")]
    Influxdb(InfluxdbArgs),

    /// View the generated Telegraf configuration
    Telegraf(TelegrafArgs),

    /// View and update the portal system configuration
    #[command(alias = "sys")]
    System(SystemArgs),

    /// Dashboard metrics summary
    Metrics,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
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
    /// List registered devices
    #[command(alias = "ls")]
    List,

    /// Get device details
    Get {
        /// Device ID or name
        device: String,
    },

    /// Register a new device
    Create {
        /// Device name
        #[arg(long, required = true)]
        name: String,

        /// OPC UA endpoint URL (e.g., opc.tcp://10.0.0.5:4840)
        #[arg(long, required = true)]
        endpoint: String,

        /// Username for OPC UA authentication
        #[arg(long)]
        username: Option<String>,

        /// Password for OPC UA authentication
        #[arg(long)]
        password: Option<String>,

        /// Prompt for the password instead of passing it as a flag
        #[arg(long, conflicts_with = "password")]
        prompt_password: bool,

        /// OPC UA security policy
        #[arg(long, default_value = "None")]
        security_policy: String,

        /// InfluxDB config ID to write this device's data to
        #[arg(long)]
        influxdb: Option<i64>,

        /// Register the device disabled
        #[arg(long)]
        disabled: bool,
    },

    /// Update an existing device
    Update {
        /// Device ID or name
        device: String,

        /// Device name
        #[arg(long)]
        name: Option<String>,

        /// OPC UA endpoint URL
        #[arg(long)]
        endpoint: Option<String>,

        /// Username for OPC UA authentication
        #[arg(long)]
        username: Option<String>,

        /// Password for OPC UA authentication
        #[arg(long)]
        password: Option<String>,

        /// OPC UA security policy
        #[arg(long)]
        security_policy: Option<String>,

        /// InfluxDB config ID (0 clears the assignment)
        #[arg(long)]
        influxdb: Option<i64>,

        /// Enable or disable the device
        #[arg(long, action = clap::ArgAction::Set)]
        enabled: Option<bool>,
    },

    /// Delete a device (cascades to its tags)
    Delete {
        /// Device ID or name
        device: String,
    },

    /// Test the OPC UA connection of a registered device
    Test {
        /// Device ID or name
        device: String,
    },

    /// Browse one level of a device's address space
    Browse {
        /// Device ID or name
        device: String,

        /// Node to expand (omit for the Objects root)
        #[arg(long)]
        node: Option<String>,
    },

    /// Start a full variable-node scan
    Scan {
        /// Device ID or name
        device: String,

        /// Poll until the scan finishes and print the node count
        #[arg(long, short = 'w')]
        wait: bool,

        /// Poll interval in milliseconds while waiting
        #[arg(long, default_value = "2000", value_parser = clap::value_parser!(u64).range(100..))]
        poll_ms: u64,
    },

    /// Show the cached scan status of a device
    ScanStatus {
        /// Device ID or name
        device: String,
    },

    /// Clear a device's cached scan result
    ClearScan {
        /// Device ID or name
        device: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TAGS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TagsArgs {
    #[command(subcommand)]
    pub command: TagsCommand,
}

/// Row filters shared by every tag command that operates on the merged
/// table. Matching rows are the command's working set.
#[derive(Debug, Args)]
pub struct TagFilterArgs {
    /// Restrict to one device (ID or name)
    #[arg(long, short = 'd')]
    pub device: Option<String>,

    /// Free-text search over name, path, node id, and measurement
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Wildcard pattern over the path (* and ?), e.g. "Channel1.*.Temperature"
    #[arg(long, short = 'w')]
    pub pattern: Option<String>,

    /// Restrict to one scan class by ID
    #[arg(long, conflicts_with = "unassigned")]
    pub scan_class: Option<i64>,

    /// Restrict to tags with no scan class
    #[arg(long)]
    pub unassigned: bool,

    /// Restrict to one OPC UA data type
    #[arg(long)]
    pub data_type: Option<String>,

    /// Restrict by enabled state
    #[arg(long, action = clap::ArgAction::Set)]
    pub enabled: Option<bool>,

    /// Restrict to one namespace index
    #[arg(long)]
    pub namespace: Option<u16>,
}

#[derive(Debug, Subcommand)]
pub enum TagsCommand {
    /// List the merged tag table (scan results + collected tags)
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        filter: TagFilterArgs,

        /// Which rows to show
        #[arg(long, default_value = "all", value_enum)]
        view: TagView,

        /// Sort column
        #[arg(long, default_value = "display-name", value_enum)]
        sort: TagSortColumn,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Group rows by a dimension
        #[arg(long, value_enum)]
        group_by: Option<TagGroupBy>,
    },

    /// Add matching available tags to the collection
    Collect {
        #[command(flatten)]
        filter: TagFilterArgs,

        /// Scan class for the new tags (defaults to the default scan class)
        #[arg(long)]
        assign_scan_class: Option<i64>,
    },

    /// Reassign the scan class of matching collected tags
    SetScanClass {
        #[command(flatten)]
        filter: TagFilterArgs,

        /// Target scan class ID (omit to clear the assignment)
        #[arg(long)]
        to: Option<i64>,
    },

    /// Enable matching collected tags
    Enable {
        #[command(flatten)]
        filter: TagFilterArgs,
    },

    /// Disable matching collected tags
    Disable {
        #[command(flatten)]
        filter: TagFilterArgs,
    },

    /// Remove matching collected tags from the collection
    Remove {
        #[command(flatten)]
        filter: TagFilterArgs,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TagView {
    /// Every discovered or collected tag
    All,
    /// Only tags persisted for collection
    Collected,
    /// Only tags discovered but not collected
    Available,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TagSortColumn {
    DeviceName,
    DisplayName,
    Path,
    Namespace,
    DataType,
    Measurement,
    ScanClass,
    Enabled,
    Status,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TagGroupBy {
    Device,
    ScanClass,
    Namespace,
    DataType,
    Status,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SCAN CLASSES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ScanClassesArgs {
    #[command(subcommand)]
    pub command: ScanClassesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ScanClassesCommand {
    /// List scan classes
    #[command(alias = "ls")]
    List,

    /// Create a scan class
    Create {
        /// Scan class name
        #[arg(long, required = true)]
        name: String,

        /// Polling interval in milliseconds (>= 1)
        #[arg(long, required = true, value_parser = clap::value_parser!(u64).range(1..))]
        interval_ms: u64,

        /// Description
        #[arg(long, default_value = "")]
        description: String,

        /// Mark this scan class as the default
        #[arg(long)]
        default: bool,
    },

    /// Update a scan class
    Update {
        /// Scan class ID
        id: i64,

        /// Scan class name
        #[arg(long)]
        name: Option<String>,

        /// Polling interval in milliseconds (>= 1)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval_ms: Option<u64>,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a scan class
    Delete {
        /// Scan class ID
        id: i64,
    },

    /// Mark a scan class as the default
    SetDefault {
        /// Scan class ID
        id: i64,
    },

    /// Clear the default flag of a scan class
    ClearDefault {
        /// Scan class ID
        id: i64,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  INFLUXDB
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct InfluxdbArgs {
    #[command(subcommand)]
    pub command: InfluxdbCommand,
}

#[derive(Debug, Subcommand)]
pub enum InfluxdbCommand {
    /// List InfluxDB connection targets
    #[command(alias = "ls")]
    List,

    /// Create an InfluxDB connection target
    Create {
        /// Connection name
        #[arg(long, required = true)]
        name: String,

        /// InfluxDB URL (e.g., http://influx:8086)
        #[arg(long, required = true)]
        url: String,

        /// API token
        #[arg(long, required = true)]
        token: String,

        /// Organization
        #[arg(long, required = true)]
        org: String,

        /// Target bucket
        #[arg(long, required = true)]
        bucket: String,

        /// Mark as the default target
        #[arg(long)]
        default: bool,
    },

    /// Update an InfluxDB connection target
    Update {
        /// Config ID
        id: i64,

        /// Connection name
        #[arg(long)]
        name: Option<String>,

        /// InfluxDB URL
        #[arg(long)]
        url: Option<String>,

        /// API token
        #[arg(long)]
        token: Option<String>,

        /// Organization
        #[arg(long)]
        org: Option<String>,

        /// Target bucket
        #[arg(long)]
        bucket: Option<String>,

        /// Mark as the default target
        #[arg(long, action = clap::ArgAction::Set)]
        default: Option<bool>,
    },

    /// Delete an InfluxDB connection target
    Delete {
        /// Config ID
        id: i64,
    },

    /// Test a stored connection target
    Test {
        /// Config ID
        id: i64,
    },

    /// Test an unsaved connection
    TestConnection {
        /// InfluxDB URL
        #[arg(long, required = true)]
        url: String,

        /// API token
        #[arg(long, required = true)]
        token: String,

        /// Organization
        #[arg(long, required = true)]
        org: String,
    },

    /// List the buckets visible to a stored connection
    Buckets {
        /// Config ID
        id: i64,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TELEGRAF
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TelegrafArgs {
    #[command(subcommand)]
    pub command: TelegrafCommand,
}

#[derive(Debug, Subcommand)]
pub enum TelegrafCommand {
    /// Print the generated Telegraf configuration
    Show,

    /// Download the generated Telegraf configuration to a file
    Download {
        /// Output path (default: ./telegraf.conf)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SYSTEM
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SystemArgs {
    #[command(subcommand)]
    pub command: SystemCommand,
}

#[derive(Debug, Subcommand)]
pub enum SystemCommand {
    /// Show the portal system configuration
    Show,

    /// Update fields of the portal system configuration
    Set {
        /// Portal title
        #[arg(long)]
        app_title: Option<String>,

        /// Default InfluxDB URL
        #[arg(long)]
        influxdb_url: Option<String>,

        /// Default InfluxDB token
        #[arg(long)]
        influxdb_token: Option<String>,

        /// Default InfluxDB organization
        #[arg(long)]
        influxdb_org: Option<String>,

        /// Default InfluxDB bucket
        #[arg(long)]
        influxdb_bucket: Option<String>,

        /// Telegraf config file path on the gateway host
        #[arg(long)]
        telegraf_config_path: Option<String>,

        /// Command the gateway runs to reload Telegraf
        #[arg(long)]
        telegraf_reload_command: Option<String>,
    },

    /// Test the default InfluxDB connection
    TestInfluxdb,
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
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a configuration value on the active profile
    Set {
        /// Config key (portal, insecure, timeout)
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

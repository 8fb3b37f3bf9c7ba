//! CLI structure and command definitions

use clap::{Parser, Subcommand};

pub mod cluster;

pub use cluster::*;

/// Command-line interface for managed in-memory datastore clusters
#[derive(Parser, Debug)]
#[command(name = "memstorectl")]
#[command(version, about = "Manage in-memory datastore clusters from the command line")]
#[command(long_about = "
Manage in-memory datastore clusters from the command line

EXAMPLES:
    # Set up a profile
    memstorectl profile set prod --secret-key KEY --zone fr-par-1

    # Create a cluster on a private network with IPAM and wait for it
    memstorectl cluster create --name cache --node-type RED1-MICRO --version 7.0.5 \\
        --user-name admin --password 'P4ssw0rd!' \\
        --private-network 11111111-2222-3333-4444-555555555555,enable-ipam --wait

    # List clusters as JSON, keeping only ready ones
    memstorectl cluster list -o json -q '[?status==`ready`].name'

    # Delete a cluster and wait until it is gone
    memstorectl cluster delete <id> --wait

For more help on a specific command, run:
    memstorectl <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "MEMSTORE_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "MEMSTORE_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// JMESPath query to filter output
    #[arg(long, short = 'q', global = true)]
    pub query: Option<String>,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Automatically choose format based on command and context
    Auto,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Human-readable table format
    Table,
}

impl OutputFormat {
    /// Structured format for machine consumers, `None` for human output
    pub fn structured(self) -> Option<crate::output::OutputFormat> {
        match self {
            OutputFormat::Json => Some(crate::output::OutputFormat::Json),
            OutputFormat::Yaml => Some(crate::output::OutputFormat::Yaml),
            OutputFormat::Auto | OutputFormat::Table => None,
        }
    }
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cluster operations
    #[command(subcommand, visible_alias = "cl")]
    #[command(after_help = "EXAMPLES:
    # Create a cluster with explicit service IPs
    memstorectl cluster create --zone fr-par-1 --name cache --node-type RED1-MICRO \\
        --version 7.0.5 --user-name admin --password 'P4ssw0rd!' \\
        --private-network PN_ID,ip=10.0.0.5/24

    # Create from a JSON file, overriding the name
    memstorectl cluster create --from-json cluster.json --name cache-2

    # Wait for a cluster that is already provisioning
    memstorectl cluster wait CLUSTER_ID --timeout 600 --interval 10
")]
    Cluster(ClusterCommands),

    /// Profile management
    #[command(subcommand, visible_alias = "prof", visible_alias = "pr")]
    #[command(after_help = "EXAMPLES:
    # Create a profile
    memstorectl profile set prod --secret-key KEY --zone fr-par-1 --project-id PROJECT

    # Read the secret from the environment when the config is loaded
    memstorectl profile set ci --secret-key '${MEMSTORE_SECRET_KEY}'

    # List all profiles
    memstorectl profile list

    # Make a profile the default
    memstorectl profile default prod
")]
    Profile(ProfileCommands),

    /// Version information
    #[command(visible_alias = "ver", visible_alias = "v")]
    Version,

    /// Generate shell completions
    #[command(visible_alias = "comp")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion generation
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bourne Again Shell
    Bash,
    /// Z Shell
    Zsh,
    /// Friendly Interactive Shell
    Fish,
    /// PowerShell
    #[value(name = "powershell", alias = "power-shell")]
    PowerShell,
    /// Elvish
    Elvish,
}

/// Profile management commands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all configured profiles
    #[command(visible_alias = "ls", visible_alias = "l")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a specific profile
    #[command(visible_alias = "sh", visible_alias = "get")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Set or create a profile
    #[command(visible_alias = "add", visible_alias = "create")]
    Set {
        /// Profile name
        name: String,

        /// API secret key
        #[arg(long)]
        secret_key: String,

        /// API URL
        #[arg(long, default_value = memstorectl_core::client::DEFAULT_API_URL)]
        api_url: String,

        /// Zone used when a command does not pass --zone
        #[arg(long)]
        zone: Option<String>,

        /// Project new clusters are created in
        #[arg(long)]
        project_id: Option<String>,

        /// Also make this the default profile
        #[arg(long)]
        default: bool,
    },

    /// Remove a profile
    #[command(visible_alias = "rm", visible_alias = "del", visible_alias = "delete")]
    Remove {
        /// Profile name to remove
        name: String,
    },

    /// Set the default profile
    #[command(visible_alias = "def")]
    Default {
        /// Profile name to use by default
        name: String,
    },
}

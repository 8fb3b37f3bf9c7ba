//! Cluster command definitions

use clap::{Args, Subcommand};
use memstorectl_core::cluster::EndpointInput;
use memstorectl_core::progress::{DEFAULT_RETRY_INTERVAL, DEFAULT_TIMEOUT};

/// Cluster commands
#[derive(Subcommand, Debug)]
pub enum ClusterCommands {
    /// Create a cluster
    #[command(visible_alias = "add")]
    Create(Box<CreateClusterArgs>),

    /// Get a cluster
    #[command(visible_alias = "show")]
    Get {
        /// Cluster ID
        id: String,

        /// Zone of the cluster (defaults to the profile zone)
        #[arg(long)]
        zone: Option<String>,
    },

    /// List clusters in a zone
    #[command(visible_alias = "ls")]
    List {
        /// Zone to list (defaults to the profile zone)
        #[arg(long)]
        zone: Option<String>,
    },

    /// Delete a cluster
    #[command(visible_alias = "rm")]
    Delete {
        /// Cluster ID
        id: String,

        /// Zone of the cluster (defaults to the profile zone)
        #[arg(long)]
        zone: Option<String>,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Wait until a cluster reaches a stable state
    Wait {
        /// Cluster ID
        id: String,

        /// Zone of the cluster (defaults to the profile zone)
        #[arg(long)]
        zone: Option<String>,

        /// Maximum time to wait in seconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
        timeout: u64,

        /// Polling interval in seconds
        #[arg(long, default_value_t = DEFAULT_RETRY_INTERVAL.as_secs())]
        interval: u64,
    },
}

/// Arguments of `cluster create`
#[derive(Args, Debug)]
pub struct CreateClusterArgs {
    /// Zone to create the cluster in (defaults to the profile zone)
    #[arg(long)]
    pub zone: Option<String>,

    /// Cluster name
    #[arg(long, required_unless_present = "from_json")]
    pub name: Option<String>,

    /// Node type, e.g. RED1-MICRO
    #[arg(long, required_unless_present = "from_json")]
    pub node_type: Option<String>,

    /// Engine version, e.g. 7.0.5
    #[arg(long, required_unless_present = "from_json")]
    pub version: Option<String>,

    /// Name of the default user
    #[arg(long)]
    pub user_name: Option<String>,

    /// Password of the default user
    #[arg(long)]
    pub password: Option<String>,

    /// Number of nodes
    #[arg(long)]
    pub cluster_size: Option<u32>,

    /// Enable TLS
    #[arg(long)]
    pub tls: bool,

    /// Tag to attach (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Private network endpoint: ID[,ip=CIDR...][,enable-ipam] (repeatable)
    #[arg(long = "private-network", value_parser = parse_private_network)]
    pub private_networks: Vec<EndpointInput>,

    /// Add a public network endpoint
    #[arg(long)]
    pub public_network: bool,

    /// Read the create input from a JSON file ("-" for stdin); flags override its fields
    #[arg(long, value_name = "FILE")]
    pub from_json: Option<String>,

    #[command(flatten)]
    pub wait: WaitArgs,
}

/// Common arguments for operations that can wait for the cluster to settle
#[derive(Args, Debug, Clone)]
pub struct WaitArgs {
    /// Wait for the operation to complete
    #[arg(long)]
    pub wait: bool,

    /// Maximum time to wait in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs(), requires = "wait")]
    pub wait_timeout: u64,

    /// Polling interval in seconds
    #[arg(long, default_value_t = DEFAULT_RETRY_INTERVAL.as_secs(), requires = "wait")]
    pub wait_interval: u64,
}

/// Parse `ID[,ip=CIDR...][,enable-ipam]` into a private network endpoint
pub fn parse_private_network(s: &str) -> Result<EndpointInput, String> {
    let mut parts = s.split(',').map(str::trim);
    let id = parts.next().unwrap_or_default();
    if id.is_empty() {
        return Err("private network ID must not be empty".to_string());
    }

    let mut endpoint = EndpointInput::private_network(id);
    for part in parts {
        match part.split_once('=') {
            Some(("ip", ip)) if !ip.is_empty() => endpoint = endpoint.with_service_ip(ip),
            None if part == "enable-ipam" => endpoint = endpoint.with_ipam(true),
            _ => {
                return Err(format!(
                    "invalid private network option '{}' (expected ip=CIDR or enable-ipam)",
                    part
                ));
            }
        }
    }

    Ok(endpoint)
}

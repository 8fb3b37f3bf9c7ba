//! Wire types for the managed cluster API
//!
//! `Cluster` is what the API returns; `ClusterCreateRequest` and its
//! endpoint types are the canonical create payload. The user-facing input
//! that gets shaped into a `ClusterCreateRequest` lives in
//! [`params`](super::params).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::progress::StatusReport;

/// Lifecycle status reported by the API for a cluster
///
/// Unrecognized strings are kept in `Other` and treated as transitional.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClusterStatus {
    #[default]
    Unknown,
    Ready,
    Provisioning,
    Configuring,
    Deleting,
    Error,
    Autohealing,
    Locked,
    Suspended,
    Initializing,
    Other(String),
}

impl ClusterStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ClusterStatus::Unknown => "unknown",
            ClusterStatus::Ready => "ready",
            ClusterStatus::Provisioning => "provisioning",
            ClusterStatus::Configuring => "configuring",
            ClusterStatus::Deleting => "deleting",
            ClusterStatus::Error => "error",
            ClusterStatus::Autohealing => "autohealing",
            ClusterStatus::Locked => "locked",
            ClusterStatus::Suspended => "suspended",
            ClusterStatus::Initializing => "initializing",
            ClusterStatus::Other(s) => s,
        }
    }

    /// Whether the status will not change without further external action
    ///
    /// Error-like stable states count as terminal: the wait stops because
    /// the cluster stopped changing, and judging the outcome is left to the
    /// caller.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ClusterStatus::Ready
                | ClusterStatus::Error
                | ClusterStatus::Locked
                | ClusterStatus::Suspended
        )
    }
}

impl From<String> for ClusterStatus {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "unknown" => ClusterStatus::Unknown,
            "ready" => ClusterStatus::Ready,
            "provisioning" => ClusterStatus::Provisioning,
            "configuring" => ClusterStatus::Configuring,
            "deleting" => ClusterStatus::Deleting,
            "error" => ClusterStatus::Error,
            "autohealing" => ClusterStatus::Autohealing,
            "locked" => ClusterStatus::Locked,
            "suspended" => ClusterStatus::Suspended,
            "initializing" => ClusterStatus::Initializing,
            _ => ClusterStatus::Other(s),
        }
    }
}

impl From<ClusterStatus> for String {
    fn from(status: ClusterStatus) -> Self {
        match status {
            ClusterStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A managed cluster as returned by the API
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub status: ClusterStatus,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_size: Option<u32>,
    #[serde(default)]
    pub tls_enabled: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields this crate does not model, kept for output
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StatusReport for Cluster {
    fn status_label(&self) -> String {
        self.status.to_string()
    }
}

/// An endpoint attached to a running cluster
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default)]
    pub ips: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_network: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_network: Option<Value>,
}

/// Page returned by the list endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListClustersResponse {
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    #[serde(default)]
    pub total_count: u32,
}

/// Canonical create payload
///
/// `zone` addresses the request and is not part of the JSON body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterCreateRequest {
    #[serde(skip)]
    pub zone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub node_type: String,
    pub user_name: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_size: Option<u32>,
    #[serde(default)]
    pub tls_enabled: bool,
    #[serde(default)]
    pub cluster_settings: Vec<ClusterSetting>,
    #[serde(default)]
    pub acl_rules: Vec<AclRuleSpec>,
    #[serde(default)]
    pub endpoints: Vec<EndpointSpec>,
}

/// Endpoint to create alongside the cluster
///
/// At most one of the modeled kinds is set. Kinds this crate does not model
/// travel in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EndpointSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_network: Option<PrivateNetworkSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_network: Option<PublicNetworkSpec>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Attachment to an existing private network
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PrivateNetworkSpec {
    pub id: String,
    #[serde(default)]
    pub service_ips: Vec<String>,
    /// Present (and empty) to have addresses assigned by IPAM
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipam_config: Option<IpamConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IpamConfig {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PublicNetworkSpec {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSetting {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclRuleSpec {
    pub ip_cidr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

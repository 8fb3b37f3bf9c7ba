//! User-facing create input and its shaping into the canonical request
//!
//! The input differs from [`ClusterCreateRequest`] in one place: a private
//! network endpoint carries an `enable-ipam` toggle instead of an
//! `ipam_config` object. [`shape`] turns the toggle into the object.
//!
//! # Example
//!
//! ```rust
//! use memstorectl_core::cluster::{ClusterCreateInput, EndpointInput, shape};
//!
//! let input = ClusterCreateInput::new("fr-par-1", "cache", "RED1-MICRO", "7.0.5")
//!     .with_credentials("admin", "P4ssw0rd!")
//!     .with_endpoint(EndpointInput::private_network("pn-1").with_ipam(true));
//!
//! let request = shape(&input).unwrap();
//! let private = request.endpoints[0].private_network.as_ref().unwrap();
//! assert!(private.ipam_config.is_some());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::net::IpAddr;

use super::model::{
    AclRuleSpec, ClusterCreateRequest, ClusterSetting, EndpointSpec, IpamConfig,
    PrivateNetworkSpec, PublicNetworkSpec,
};
use crate::error::{CoreError, Result};

/// How a private network endpoint gets its addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpamStrategy {
    /// Use the service IPs given by the caller
    Explicit,
    /// Let IPAM assign addresses
    Auto,
}

impl IpamStrategy {
    pub fn from_toggle(enable_ipam: bool) -> Self {
        if enable_ipam {
            IpamStrategy::Auto
        } else {
            IpamStrategy::Explicit
        }
    }

    fn ipam_config(self) -> Option<IpamConfig> {
        match self {
            IpamStrategy::Auto => Some(IpamConfig {}),
            IpamStrategy::Explicit => None,
        }
    }
}

/// Parameters for creating a cluster
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterCreateInput {
    /// May be left out of a JSON file and supplied by the caller
    #[serde(default)]
    pub zone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub name: String,
    pub node_type: String,
    pub version: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_size: Option<u32>,
    #[serde(default)]
    pub tls_enabled: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cluster_settings: Vec<ClusterSetting>,
    #[serde(default)]
    pub acl_rules: Vec<AclRuleSpec>,
    #[serde(default)]
    pub endpoints: Vec<EndpointInput>,
}

/// One endpoint entry of the create input
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EndpointInput {
    #[serde(
        default,
        rename = "private-network",
        alias = "private_network",
        skip_serializing_if = "Option::is_none"
    )]
    pub private_network: Option<PrivateNetworkInput>,
    #[serde(
        default,
        rename = "public-network",
        alias = "public_network",
        skip_serializing_if = "Option::is_none"
    )]
    pub public_network: Option<PublicNetworkSpec>,
    /// Endpoint kinds not modeled here, passed through as given
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Private network endpoint as the user describes it
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PrivateNetworkInput {
    pub id: String,
    #[serde(default, rename = "service-ips", alias = "service_ips")]
    pub service_ips: Vec<String>,
    #[serde(default, rename = "enable-ipam", alias = "enable_ipam")]
    pub enable_ipam: bool,
}

impl PrivateNetworkInput {
    pub fn strategy(&self) -> IpamStrategy {
        IpamStrategy::from_toggle(self.enable_ipam)
    }
}

impl EndpointInput {
    /// Private network endpoint with no service IPs and IPAM disabled
    #[must_use]
    pub fn private_network(id: impl Into<String>) -> Self {
        Self {
            private_network: Some(PrivateNetworkInput {
                id: id.into(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn public_network() -> Self {
        Self {
            public_network: Some(PublicNetworkSpec {}),
            ..Default::default()
        }
    }

    /// Add a service IP (no-op on a public endpoint)
    #[must_use]
    pub fn with_service_ip(mut self, ip: impl Into<String>) -> Self {
        if let Some(pn) = self.private_network.as_mut() {
            pn.service_ips.push(ip.into());
        }
        self
    }

    /// Set the IPAM toggle (no-op on a public endpoint)
    #[must_use]
    pub fn with_ipam(mut self, enable_ipam: bool) -> Self {
        if let Some(pn) = self.private_network.as_mut() {
            pn.enable_ipam = enable_ipam;
        }
        self
    }
}

impl ClusterCreateInput {
    /// Create new params with required fields
    #[must_use]
    pub fn new(
        zone: impl Into<String>,
        name: impl Into<String>,
        node_type: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            zone: zone.into(),
            name: name.into(),
            node_type: node_type.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        user_name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.user_name = user_name.into();
        self.password = password.into();
        self
    }

    #[must_use]
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    #[must_use]
    pub fn with_cluster_size(mut self, size: u32) -> Self {
        self.cluster_size = Some(size);
        self
    }

    #[must_use]
    pub fn with_tls(mut self, enabled: bool) -> Self {
        self.tls_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn with_setting(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cluster_settings.push(ClusterSetting {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: EndpointInput) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Shape into the canonical request, see [`shape`]
    pub fn into_request(self) -> Result<ClusterCreateRequest> {
        shape(&self)
    }
}

/// Build the canonical create request from user input
///
/// Private network endpoints get their id and service IPs copied as-is and
/// an `ipam_config` that is present and empty when `enable-ipam` is set,
/// absent otherwise. Other endpoint kinds pass through unchanged.
pub fn shape(input: &ClusterCreateInput) -> Result<ClusterCreateRequest> {
    if input.zone.trim().is_empty() {
        return Err(CoreError::Validation("zone must not be empty".to_string()));
    }
    if input.name.trim().is_empty() {
        return Err(CoreError::Validation(
            "cluster name must not be empty".to_string(),
        ));
    }

    let endpoints = input
        .endpoints
        .iter()
        .enumerate()
        .map(|(index, endpoint)| shape_endpoint(index, endpoint))
        .collect::<Result<Vec<_>>>()?;

    Ok(ClusterCreateRequest {
        zone: input.zone.clone(),
        project_id: input.project_id.clone(),
        name: input.name.clone(),
        version: input.version.clone(),
        tags: input.tags.clone(),
        node_type: input.node_type.clone(),
        user_name: input.user_name.clone(),
        password: input.password.clone(),
        cluster_size: input.cluster_size,
        tls_enabled: input.tls_enabled,
        cluster_settings: input.cluster_settings.clone(),
        acl_rules: input.acl_rules.clone(),
        endpoints,
    })
}

fn shape_endpoint(index: usize, endpoint: &EndpointInput) -> Result<EndpointSpec> {
    let extra = endpoint.extra.clone();
    match (&endpoint.private_network, &endpoint.public_network) {
        (Some(pn), None) => {
            if pn.id.trim().is_empty() {
                return Err(CoreError::Validation(format!(
                    "endpoints.{index}.private-network.id must not be empty"
                )));
            }
            for ip in &pn.service_ips {
                validate_service_ip(ip).map_err(|reason| {
                    CoreError::Validation(format!(
                        "endpoints.{index}.private-network.service-ips: '{ip}' {reason}"
                    ))
                })?;
            }
            Ok(EndpointSpec {
                private_network: Some(PrivateNetworkSpec {
                    id: pn.id.clone(),
                    service_ips: pn.service_ips.clone(),
                    ipam_config: pn.strategy().ipam_config(),
                }),
                public_network: None,
                extra,
            })
        }
        (None, Some(public)) => Ok(EndpointSpec {
            private_network: None,
            public_network: Some(*public),
            extra,
        }),
        (Some(_), Some(_)) => Err(CoreError::Validation(format!(
            "endpoints.{index} sets both private-network and public-network"
        ))),
        (None, None) if extra.is_empty() => Err(CoreError::Validation(format!(
            "endpoints.{index} sets no endpoint kind"
        ))),
        // Kinds not modeled here go out as given
        (None, None) => Ok(EndpointSpec {
            private_network: None,
            public_network: None,
            extra,
        }),
    }
}

/// Accepts `addr` or `addr/prefix`
fn validate_service_ip(value: &str) -> std::result::Result<(), &'static str> {
    let (addr, prefix) = match value.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (value, None),
    };
    let addr: IpAddr = addr.parse().map_err(|_| "is not an IP address")?;
    if let Some(prefix) = prefix {
        let prefix: u8 = prefix.parse().map_err(|_| "has an invalid prefix length")?;
        let max = if addr.is_ipv4() { 32 } else { 128 };
        if prefix > max {
            return Err("has an invalid prefix length");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn base() -> ClusterCreateInput {
        ClusterCreateInput::new("fr-par-1", "cache", "RED1-MICRO", "7.0.5")
            .with_credentials("admin", "P4ssw0rd!")
    }

    #[test]
    fn test_enable_ipam_sets_empty_config_and_keeps_service_ips() {
        let input = base().with_endpoint(
            EndpointInput::private_network("pn-1")
                .with_service_ip("10.0.0.5/24")
                .with_ipam(true),
        );

        let request = shape(&input).unwrap();
        let pn = request.endpoints[0].private_network.as_ref().unwrap();
        assert_eq!(pn.ipam_config, Some(IpamConfig {}));
        assert_eq!(pn.service_ips, vec!["10.0.0.5/24".to_string()]);
        assert_eq!(pn.id, "pn-1");
    }

    #[test]
    fn test_ipam_disabled_or_unset_leaves_config_absent() {
        let explicit = base().with_endpoint(
            EndpointInput::private_network("pn-1")
                .with_service_ip("10.0.0.5/24")
                .with_ipam(false),
        );
        let request = shape(&explicit).unwrap();
        assert_eq!(
            request.endpoints[0].private_network.as_ref().unwrap().ipam_config,
            None
        );

        let unset: ClusterCreateInput = serde_json::from_value(json!({
            "zone": "fr-par-1",
            "name": "cache",
            "node_type": "RED1-MICRO",
            "version": "7.0.5",
            "endpoints": [{"private-network": {"id": "pn-1", "service-ips": ["10.0.0.5/24"]}}]
        }))
        .unwrap();
        let request = shape(&unset).unwrap();
        assert_eq!(
            request.endpoints[0].private_network.as_ref().unwrap().ipam_config,
            None
        );
    }

    #[test]
    fn test_json_input_accepts_both_spellings() {
        let input: ClusterCreateInput = serde_json::from_value(json!({
            "zone": "fr-par-1",
            "name": "cache",
            "node_type": "RED1-MICRO",
            "version": "7.0.5",
            "endpoints": [
                {"private-network": {"id": "pn-1", "enable-ipam": true}},
                {"private_network": {"id": "pn-2", "enable_ipam": true}}
            ]
        }))
        .unwrap();

        let request = shape(&input).unwrap();
        assert!(request.endpoints.iter().all(|e| {
            e.private_network
                .as_ref()
                .is_some_and(|pn| pn.ipam_config.is_some())
        }));
    }

    #[test]
    fn test_public_endpoint_passes_through() {
        let input = base()
            .with_endpoint(EndpointInput::public_network())
            .with_endpoint(EndpointInput::private_network("pn-1").with_ipam(true));

        let request = shape(&input).unwrap();
        assert_eq!(request.endpoints.len(), 2);
        assert_eq!(request.endpoints[0].public_network, Some(PublicNetworkSpec {}));
        assert!(request.endpoints[0].private_network.is_none());
        assert!(request.endpoints[1].private_network.is_some());
    }

    #[test]
    fn test_unmodeled_endpoint_kind_passes_through() {
        let input: ClusterCreateInput = serde_json::from_value(json!({
            "zone": "fr-par-1",
            "name": "cache",
            "node_type": "RED1-MICRO",
            "version": "7.0.5",
            "endpoints": [
                {"future-kind": {"x": 1}},
                {"private-network": {"id": "pn-1", "enable-ipam": true}}
            ]
        }))
        .unwrap();

        let request = shape(&input).unwrap();
        assert_eq!(request.endpoints.len(), 2);
        assert!(request.endpoints[0].private_network.is_none());
        assert!(request.endpoints[0].public_network.is_none());

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["endpoints"][0], json!({"future-kind": {"x": 1}}));
        assert_eq!(
            body["endpoints"][1],
            json!({"private_network": {"id": "pn-1", "service_ips": [], "ipam_config": {}}})
        );
    }

    #[test]
    fn test_shape_is_pure() {
        let input = base()
            .with_tag("team:cache")
            .with_setting("maxclients", "1000")
            .with_endpoint(EndpointInput::private_network("pn-1").with_ipam(true));

        assert_eq!(shape(&input).unwrap(), shape(&input).unwrap());
        assert_eq!(input.clone().into_request().unwrap(), shape(&input).unwrap());
    }

    #[test]
    fn test_shape_copies_scalar_fields() {
        let input = base()
            .with_project("proj-1")
            .with_cluster_size(3)
            .with_tls(true);

        let request = shape(&input).unwrap();
        assert_eq!(request.zone, "fr-par-1");
        assert_eq!(request.project_id.as_deref(), Some("proj-1"));
        assert_eq!(request.cluster_size, Some(3));
        assert!(request.tls_enabled);
        assert!(request.endpoints.is_empty());
    }

    #[test]
    fn test_validation_errors() {
        let empty_name = ClusterCreateInput::new("fr-par-1", " ", "RED1-MICRO", "7.0.5");
        assert!(shape(&empty_name).unwrap_err().is_bad_request());

        let empty_zone = ClusterCreateInput::new("", "cache", "RED1-MICRO", "7.0.5");
        assert!(shape(&empty_zone).is_err());

        let empty_pn = base().with_endpoint(EndpointInput::private_network(""));
        let err = shape(&empty_pn).unwrap_err();
        assert!(err.to_string().contains("endpoints.0.private-network.id"));

        let bad_ip =
            base().with_endpoint(EndpointInput::private_network("pn-1").with_service_ip("10.0.0/33"));
        assert!(shape(&bad_ip).is_err());

        let no_kind = base().with_endpoint(EndpointInput::default());
        assert!(shape(&no_kind).unwrap_err().to_string().contains("no endpoint kind"));
    }

    #[test]
    fn test_validate_service_ip() {
        assert!(validate_service_ip("10.0.0.5").is_ok());
        assert!(validate_service_ip("10.0.0.5/24").is_ok());
        assert!(validate_service_ip("fd00::5/64").is_ok());
        assert!(validate_service_ip("10.0.0.5/40").is_err());
        assert!(validate_service_ip("fd00::5/129").is_err());
        assert!(validate_service_ip("not-an-ip").is_err());
    }
}

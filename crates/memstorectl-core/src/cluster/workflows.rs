//! Cluster workflows - mutation followed by an optional readiness wait
//!
//! These compose a [`ClusterApi`] call with [`wait_until_ready`]:
//! 1. Shape and submit the mutation
//! 2. Poll the cluster until it settles (or, for deletes, disappears)
//! 3. Return the final observed state

use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

use super::model::Cluster;
use super::params::{ClusterCreateInput, shape};
use crate::client::{ApiError, ClusterApi};
use crate::error::{CoreError, Result};
use crate::progress::{
    DEFAULT_RETRY_INTERVAL, DEFAULT_TIMEOUT, ProgressCallback, Readiness, WaitPolicy,
    wait_until_ready,
};

/// Parameters of a standalone wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitRequest {
    pub cluster_id: String,
    pub zone: String,
    pub timeout: Duration,
    pub retry_interval: Duration,
}

impl WaitRequest {
    /// Wait with the default timeout (15 minutes) and retry interval
    #[must_use]
    pub fn new(zone: impl Into<String>, cluster_id: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            zone: zone.into(),
            timeout: DEFAULT_TIMEOUT,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn policy(&self) -> WaitPolicy {
        WaitPolicy::new(self.timeout, self.retry_interval)
    }
}

/// Whether and how long a mutation should wait for the cluster to settle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub wait: bool,
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            wait: false,
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

impl WaitOptions {
    /// Wait with the default timing
    #[must_use]
    pub fn waiting() -> Self {
        Self {
            wait: true,
            ..Self::default()
        }
    }
}

/// Result of a create or delete
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterOutcome {
    /// The API accepted the mutation and no wait was requested
    Submitted(Cluster),
    /// The cluster reached a terminal state
    Ready(Cluster),
    /// The cluster no longer exists
    Deleted { last_seen: Option<Cluster> },
}

impl ClusterOutcome {
    /// Cluster to display, if there is one
    pub fn cluster(&self) -> Option<&Cluster> {
        match self {
            ClusterOutcome::Submitted(cluster) | ClusterOutcome::Ready(cluster) => Some(cluster),
            ClusterOutcome::Deleted { last_seen } => last_seen.as_ref(),
        }
    }
}

/// Poll a cluster until it reaches a terminal status
///
/// A cluster that disappears while waiting is reported as a not-found error.
///
/// # Example
///
/// ```rust,ignore
/// use memstorectl_core::cluster::{wait_for_cluster, WaitRequest};
///
/// let request = WaitRequest::new("fr-par-1", "11111111-1111-1111-1111-111111111111");
/// let cluster = wait_for_cluster(&client, &request, std::future::pending(), None).await?;
/// println!("{} is {}", cluster.name, cluster.status);
/// ```
pub async fn wait_for_cluster<A, C>(
    api: &A,
    request: &WaitRequest,
    cancel: C,
    on_progress: Option<ProgressCallback>,
) -> Result<Cluster>
where
    A: ClusterApi + ?Sized,
    C: Future<Output = ()>,
{
    let readiness = poll_cluster(
        api,
        &request.zone,
        &request.cluster_id,
        &request.policy(),
        cancel,
        on_progress,
    )
    .await?;

    readiness.into_settled().ok_or_else(|| {
        CoreError::Api(ApiError::NotFound {
            message: format!("cluster {} no longer exists", request.cluster_id),
        })
    })
}

/// Create a cluster and optionally wait until it settles
///
/// # Example
///
/// ```rust,ignore
/// use memstorectl_core::cluster::{
///     create_cluster_and_wait, ClusterCreateInput, EndpointInput, WaitOptions,
/// };
///
/// let input = ClusterCreateInput::new("fr-par-1", "cache", "RED1-MICRO", "7.0.5")
///     .with_credentials("admin", "P4ssw0rd!")
///     .with_endpoint(EndpointInput::private_network(pn_id).with_ipam(true));
///
/// let outcome = create_cluster_and_wait(
///     &client,
///     &input,
///     &WaitOptions::waiting(),
///     std::future::pending(),
///     None,
/// )
/// .await?;
/// ```
pub async fn create_cluster_and_wait<A, C>(
    api: &A,
    input: &ClusterCreateInput,
    options: &WaitOptions,
    cancel: C,
    on_progress: Option<ProgressCallback>,
) -> Result<ClusterOutcome>
where
    A: ClusterApi + ?Sized,
    C: Future<Output = ()>,
{
    // Step 1: Shape the request
    let request = shape(input)?;
    let policy = WaitPolicy::new(options.timeout, options.interval);
    if options.wait {
        policy.validate()?;
    }

    // Step 2: Submit
    let cluster = api.create_cluster(&request).await?;
    info!("Created cluster {} ({})", cluster.id, cluster.status);

    if !options.wait {
        return Ok(ClusterOutcome::Submitted(cluster));
    }

    // Step 3: Poll until it settles
    let zone = zone_of(&cluster, &request.zone);
    let readiness = poll_cluster(api, &zone, &cluster.id, &policy, cancel, on_progress).await?;

    match readiness {
        Readiness::Settled(cluster) => Ok(ClusterOutcome::Ready(cluster)),
        Readiness::Gone { .. } => Err(CoreError::Api(ApiError::NotFound {
            message: format!("cluster {} disappeared while provisioning", cluster.id),
        })),
    }
}

/// Delete a cluster and optionally wait until it is gone
pub async fn delete_cluster_and_wait<A, C>(
    api: &A,
    zone: &str,
    cluster_id: &str,
    options: &WaitOptions,
    cancel: C,
    on_progress: Option<ProgressCallback>,
) -> Result<ClusterOutcome>
where
    A: ClusterApi + ?Sized,
    C: Future<Output = ()>,
{
    let policy = WaitPolicy::new(options.timeout, options.interval).not_found_as_success();
    if options.wait {
        policy.validate()?;
    }

    // Step 1: Submit
    let cluster = api.delete_cluster(zone, cluster_id).await?;
    info!("Deleting cluster {} ({})", cluster.id, cluster.status);

    if !options.wait {
        return Ok(ClusterOutcome::Submitted(cluster));
    }

    // Step 2: Poll until the API no longer knows the cluster
    let zone = zone_of(&cluster, zone);
    let id = if cluster.id.is_empty() {
        cluster_id.to_string()
    } else {
        cluster.id.clone()
    };
    let readiness = poll_cluster(api, &zone, &id, &policy, cancel, on_progress).await?;

    Ok(match readiness {
        Readiness::Gone { last_seen } => ClusterOutcome::Deleted {
            last_seen: last_seen.or(Some(cluster)),
        },
        // Deletion stopped in a stable state such as `error` or `locked`
        Readiness::Settled(cluster) => ClusterOutcome::Ready(cluster),
    })
}

async fn poll_cluster<A, C>(
    api: &A,
    zone: &str,
    cluster_id: &str,
    policy: &WaitPolicy,
    cancel: C,
    on_progress: Option<ProgressCallback>,
) -> Result<Readiness<Cluster>>
where
    A: ClusterApi + ?Sized,
    C: Future<Output = ()>,
{
    debug!(
        "Waiting for cluster {} in {} (timeout {:?}, interval {:?})",
        cluster_id, zone, policy.timeout, policy.interval
    );
    wait_until_ready(
        cluster_id,
        || api.get_cluster(zone, cluster_id),
        |cluster: &Cluster| cluster.status.is_terminal(),
        policy,
        cancel,
        on_progress,
    )
    .await
}

fn zone_of(cluster: &Cluster, fallback: &str) -> String {
    if cluster.zone.is_empty() {
        fallback.to_string()
    } else {
        cluster.zone.clone()
    }
}

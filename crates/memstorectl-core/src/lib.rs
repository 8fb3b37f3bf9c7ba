//! # memstorectl-core
//!
//! Shared engine behind the `memstorectl` CLI for managed in-memory
//! datastore clusters.
//!
//! ## Layers
//!
//! - **Client** ([`client`]) - the [`ClusterApi`] trait and its HTTP
//!   implementation. One call, one request.
//! - **Progress** ([`progress`]) - [`wait_until_ready`], the generic poll loop
//!   that turns "request accepted" into "resource settled" (or "resource
//!   gone" for deletions).
//! - **Cluster** ([`cluster`]) - wire types, the shaping of user input into
//!   the canonical create request, and create/delete/wait workflows.
//! - **Config** ([`config`]) - TOML profiles with environment expansion.
//!
//! ## Example
//!
//! ```rust,ignore
//! use memstorectl_core::cluster::{delete_cluster_and_wait, ClusterOutcome, WaitOptions};
//! use memstorectl_core::ClusterClient;
//!
//! let client = ClusterClient::builder().secret_key(secret).build()?;
//! let outcome = delete_cluster_and_wait(
//!     &client,
//!     "fr-par-1",
//!     &cluster_id,
//!     &WaitOptions::waiting(),
//!     std::future::pending(),
//!     None,
//! )
//! .await?;
//! assert!(matches!(outcome, ClusterOutcome::Deleted { .. }));
//! ```

pub mod client;
pub mod cluster;
pub mod config;
pub mod error;
pub mod progress;

pub use client::{ApiError, ClusterApi, ClusterClient, ClusterClientBuilder};
pub use cluster::{
    Cluster, ClusterCreateInput, ClusterCreateRequest, ClusterOutcome, ClusterStatus,
    EndpointInput, IpamStrategy, WaitOptions, WaitRequest, create_cluster_and_wait,
    delete_cluster_and_wait, shape, wait_for_cluster,
};
pub use config::{Config, ConfigError, Profile};
pub use error::{CoreError, Result};
pub use progress::{
    NotFoundPolicy, ProgressCallback, ProgressEvent, Readiness, WaitPolicy, wait_until_ready,
};

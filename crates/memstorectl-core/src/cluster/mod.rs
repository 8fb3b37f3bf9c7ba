//! Managed cluster types, request shaping and workflows
//!
//! For single API calls, use [`ClusterApi`](crate::client::ClusterApi)
//! directly; the workflows here add shaping and readiness polling on top.

pub mod model;
pub mod params;
pub mod workflows;

pub use model::*;
pub use params::*;
pub use workflows::*;

//! Configuration and profile management
//!
// Allow nested config module - this is intentional for the config subsystem

#![allow(clippy::module_inception)]
//!
//! Profiles hold the API secret key, endpoint and per-account defaults
//! (zone, project). Config files support `${VAR}` and `${VAR:-default}`
//! expansion so secrets can stay in the environment.

pub mod config;
pub mod error;

pub use config::{API_URL_ENV, Config, DEFAULT_ZONE_ENV, PROJECT_ID_ENV, Profile, SECRET_KEY_ENV};
pub use error::{ConfigError, Result};

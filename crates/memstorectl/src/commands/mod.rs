//! Command implementations

pub mod cluster;
pub mod profile;

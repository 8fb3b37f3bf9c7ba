//! Connection management for the cluster API client

use crate::error::{MemstoreCtlError, Result as CliResult};
use anyhow::Context;
use memstorectl_core::config::{API_URL_ENV, DEFAULT_ZONE_ENV, PROJECT_ID_ENV, SECRET_KEY_ENV};
use memstorectl_core::{ClusterClient, Config, Profile};
use tracing::{debug, info, trace};

/// Everything needed to talk to the API, after env overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProfile {
    pub name: Option<String>,
    pub secret_key: String,
    pub api_url: String,
    pub default_zone: Option<String>,
    pub project_id: Option<String>,
}

/// Connection manager for creating authenticated clients
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<std::path::PathBuf>,
}

impl ConnectionManager {
    /// Create a new connection manager with a custom config path
    pub fn with_config_path(config: Config, config_path: Option<std::path::PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Save the configuration to the appropriate location
    pub fn save_config(&self, config: &Config) -> CliResult<()> {
        if let Some(ref path) = self.config_path {
            config
                .save_to_path(path)
                .context("Failed to save configuration")?;
        } else {
            config.save().context("Failed to save configuration")?;
        }
        Ok(())
    }

    /// Resolve credentials from the profile with environment variable overrides
    ///
    /// When --config-file is explicitly specified, environment variables are ignored so
    /// an isolated config behaves the same on every machine.
    pub fn resolve_profile(&self, profile_name: Option<&str>) -> CliResult<ResolvedProfile> {
        let use_env_vars = self.config_path.is_none();
        debug!(
            "Config path: {:?}, use_env_vars: {}",
            self.config_path, use_env_vars
        );
        self.resolve_with_env(profile_name, |var| {
            if use_env_vars {
                std::env::var(var).ok().filter(|v| !v.is_empty())
            } else {
                None
            }
        })
    }

    fn resolve_with_env(
        &self,
        profile_name: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> CliResult<ResolvedProfile> {
        let env_secret = env(SECRET_KEY_ENV);
        let env_api_url = env(API_URL_ENV);
        let env_zone = env(DEFAULT_ZONE_ENV);
        let env_project = env(PROJECT_ID_ENV);

        let (name, profile) = match (&env_secret, profile_name) {
            // A complete environment needs no profile unless one was asked for
            (Some(secret), None) if self.config.profiles.is_empty() => {
                info!("Using credentials from environment variables");
                (None, Profile::new(secret.clone()))
            }
            _ => {
                let resolved = self.config.resolve_profile(profile_name)?;
                info!("Using profile: {}", resolved);
                let profile = self.config.profile(&resolved)?.clone();
                (Some(resolved), profile)
            }
        };

        let resolved = ResolvedProfile {
            secret_key: env_secret.unwrap_or(profile.secret_key),
            api_url: env_api_url.unwrap_or(profile.api_url),
            default_zone: env_zone.or(profile.default_zone),
            project_id: env_project.or(profile.project_id),
            name,
        };

        if resolved.secret_key.trim().is_empty() {
            return Err(MemstoreCtlError::MissingCredentials {
                name: resolved.name.unwrap_or_else(|| "environment".to_string()),
            });
        }

        Ok(resolved)
    }

    /// Create an API client for the resolved profile
    pub fn create_client(&self, profile: &ResolvedProfile) -> CliResult<ClusterClient> {
        info!("Connecting to cluster API: {}", profile.api_url);
        trace!(
            "Secret key: {}...",
            profile.secret_key.chars().take(4).collect::<String>()
        );

        let client = ClusterClient::builder()
            .api_url(&profile.api_url)
            .secret_key(&profile.secret_key)
            .build()?;

        debug!("Cluster API client created successfully");
        Ok(client)
    }
}

impl ResolvedProfile {
    /// Pick the zone from the flag, then the profile
    pub fn zone(&self, explicit: Option<&str>) -> CliResult<String> {
        explicit
            .map(str::to_string)
            .or_else(|| self.default_zone.clone())
            .filter(|zone| !zone.is_empty())
            .ok_or_else(|| MemstoreCtlError::InvalidInput {
                message: "no zone given; pass --zone or set a default zone on the profile"
                    .to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn manager(profiles: &[(&str, Profile)], default: Option<&str>) -> ConnectionManager {
        let config = Config {
            default_profile: default.map(str::to_string),
            profiles: profiles
                .iter()
                .map(|(name, p)| (name.to_string(), p.clone()))
                .collect(),
        };
        ConnectionManager::with_config_path(config, None)
    }

    fn env_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn prod() -> Profile {
        let mut profile = Profile::new("profile-secret");
        profile.default_zone = Some("fr-par-1".to_string());
        profile.project_id = Some("project-1".to_string());
        profile
    }

    #[test]
    fn test_profile_values_without_env() {
        let mgr = manager(&[("prod", prod())], Some("prod"));
        let resolved = mgr.resolve_with_env(None, env_from(&[])).unwrap();

        assert_eq!(resolved.name.as_deref(), Some("prod"));
        assert_eq!(resolved.secret_key, "profile-secret");
        assert_eq!(resolved.default_zone.as_deref(), Some("fr-par-1"));
    }

    #[test]
    fn test_env_overrides_profile_fields() {
        let mgr = manager(&[("prod", prod())], Some("prod"));
        let resolved = mgr
            .resolve_with_env(
                None,
                env_from(&[
                    (SECRET_KEY_ENV, "env-secret"),
                    (DEFAULT_ZONE_ENV, "nl-ams-1"),
                ]),
            )
            .unwrap();

        assert_eq!(resolved.secret_key, "env-secret");
        assert_eq!(resolved.default_zone.as_deref(), Some("nl-ams-1"));
        assert_eq!(resolved.project_id.as_deref(), Some("project-1"));
    }

    #[test]
    fn test_env_alone_is_enough() {
        let mgr = manager(&[], None);
        let resolved = mgr
            .resolve_with_env(None, env_from(&[(SECRET_KEY_ENV, "env-secret")]))
            .unwrap();

        assert!(resolved.name.is_none());
        assert_eq!(resolved.api_url, memstorectl_core::client::DEFAULT_API_URL);
    }

    #[test]
    fn test_no_profile_and_no_env() {
        let mgr = manager(&[], None);
        let err = mgr.resolve_with_env(None, env_from(&[])).unwrap_err();
        assert!(matches!(err, MemstoreCtlError::NoProfileConfigured));
    }

    #[test]
    fn test_unknown_profile() {
        let mgr = manager(&[("prod", prod())], None);
        let err = mgr
            .resolve_with_env(Some("staging"), env_from(&[]))
            .unwrap_err();
        assert!(matches!(err, MemstoreCtlError::ProfileNotFound { .. }));
    }

    #[test]
    fn test_empty_secret_is_missing_credentials() {
        let mgr = manager(&[("blank", Profile::new(""))], None);
        let err = mgr.resolve_with_env(None, env_from(&[])).unwrap_err();
        assert!(matches!(err, MemstoreCtlError::MissingCredentials { .. }));
    }

    #[test]
    fn test_zone_resolution() {
        let mgr = manager(&[("prod", prod())], None);
        let resolved = mgr.resolve_with_env(None, env_from(&[])).unwrap();

        assert_eq!(resolved.zone(Some("pl-waw-1")).unwrap(), "pl-waw-1");
        assert_eq!(resolved.zone(None).unwrap(), "fr-par-1");

        let no_zone = ResolvedProfile {
            default_zone: None,
            ..resolved
        };
        assert!(no_zone.zone(None).is_err());
    }

    #[test]
    fn test_create_client_rejects_bad_url() {
        let mgr = manager(&[], None);
        let profile = ResolvedProfile {
            name: None,
            secret_key: "s".to_string(),
            api_url: "not a url".to_string(),
            default_zone: None,
            project_id: None,
        };
        assert!(mgr.create_client(&profile).is_err());
    }
}

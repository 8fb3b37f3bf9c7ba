//! Configuration management for memstorectl
//!
//! Handles configuration loading from files and environment variables.
//! Configuration is stored in TOML format with support for multiple named profiles.

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{ConfigError, Result};
use crate::client::DEFAULT_API_URL;

/// Environment variable holding the API secret key
pub const SECRET_KEY_ENV: &str = "MEMSTORE_SECRET_KEY";
/// Environment variable overriding the API URL
pub const API_URL_ENV: &str = "MEMSTORE_API_URL";
/// Environment variable overriding the default zone
pub const DEFAULT_ZONE_ENV: &str = "MEMSTORE_DEFAULT_ZONE";
/// Environment variable overriding the default project
pub const PROJECT_ID_ENV: &str = "MEMSTORE_PROJECT_ID";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Profile used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// Individual profile configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Profile {
    /// API secret key, sent as the auth token
    pub secret_key: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Zone used when a command does not pass `--zone`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_zone: Option<String>,
    /// Project new clusters are created in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl Profile {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            api_url: default_api_url(),
            default_zone: None,
            project_id: None,
        }
    }
}

impl Config {
    /// Resolve the profile to use
    ///
    /// Order: explicit name, `default_profile`, then the first profile by name.
    pub fn resolve_profile(&self, explicit_profile: Option<&str>) -> Result<String> {
        if let Some(profile_name) = explicit_profile {
            if !self.profiles.contains_key(profile_name) {
                return Err(ConfigError::ProfileNotFound {
                    name: profile_name.to_string(),
                });
            }
            return Ok(profile_name.to_string());
        }

        if let Some(ref default) = self.default_profile {
            return Ok(default.clone());
        }

        self.list_profiles()
            .first()
            .map(|(name, _)| name.to_string())
            .ok_or_else(|| ConfigError::NoProfiles {
                suggestion: "Use 'memstorectl profile set' to create a profile.".to_string(),
            })
    }

    /// Look up a profile by name
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.to_string(),
            })
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        // Expand environment variables in the config content
        let expanded_content = Self::expand_env_vars(&content);

        let config: Config = toml::from_str(&expanded_content)?;

        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile by name, clearing the default if it pointed there
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Get the path to the configuration file
    ///
    /// On macOS, `~/.config/memstorectl/config.toml` wins over
    /// `~/Library/Application Support/...` when it exists.
    ///
    /// On Linux: ~/.config/memstorectl/config.toml
    /// On Windows: %APPDATA%\memstorectl\memstorectl\config.toml
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_path = base_dirs
                    .home_dir()
                    .join(".config")
                    .join("memstorectl")
                    .join("config.toml");

                if linux_style_path
                    .parent()
                    .map(|p| p.exists())
                    .unwrap_or(false)
                {
                    return Ok(linux_style_path);
                }
            }
        }

        let proj_dirs = ProjectDirs::from("com", "memstorectl", "memstorectl")
            .ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand environment variables in configuration content
    ///
    /// Supports ${VAR} and ${VAR:-default} syntax. Unset variables without a
    /// default are left as-is so profiles that are not used still parse.
    ///
    /// Example:
    /// ```toml
    /// secret_key = "${MEMSTORE_SECRET_KEY}"
    /// api_url = "${MEMSTORE_API_URL:-https://api.scaleway.com}"
    /// ```
    fn expand_env_vars(content: &str) -> String {
        let expanded =
            shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok());
        expanded.to_string()
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(key: &str) -> Profile {
        Profile::new(key)
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        let mut prod = profile("secret-1");
        prod.default_zone = Some("fr-par-1".to_string());
        config.set_profile("prod".to_string(), prod);
        config.default_profile = Some("prod".to_string());

        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(config.default_profile, deserialized.default_profile);
        assert_eq!(config.profiles, deserialized.profiles);
    }

    #[test]
    fn test_profile_defaults() {
        let config: Config = toml::from_str(
            r#"
            [profiles.dev]
            secret_key = "abc"
            "#,
        )
        .unwrap();

        let dev = config.profile("dev").unwrap();
        assert_eq!(dev.api_url, DEFAULT_API_URL);
        assert!(dev.default_zone.is_none());
        assert!(dev.project_id.is_none());
    }

    #[test]
    fn test_profile_resolution() {
        let mut config = Config::default();
        config.set_profile("zeta".to_string(), profile("z"));
        config.set_profile("alpha".to_string(), profile("a"));

        // First by name when no default
        assert_eq!(config.resolve_profile(None).unwrap(), "alpha");

        config.default_profile = Some("zeta".to_string());
        assert_eq!(config.resolve_profile(None).unwrap(), "zeta");

        // Explicit wins
        assert_eq!(config.resolve_profile(Some("alpha")).unwrap(), "alpha");

        assert!(matches!(
            config.resolve_profile(Some("missing")),
            Err(ConfigError::ProfileNotFound { .. })
        ));
    }

    #[test]
    fn test_no_profile_errors() {
        let config = Config::default();
        let err = config.resolve_profile(None).unwrap_err();
        assert!(err.to_string().contains("memstorectl profile set"));
    }

    #[test]
    fn test_remove_profile_clears_default() {
        let mut config = Config::default();
        config.set_profile("prod".to_string(), profile("p"));
        config.default_profile = Some("prod".to_string());

        assert!(config.remove_profile("prod").is_some());
        assert!(config.default_profile.is_none());
        assert!(config.remove_profile("prod").is_none());
    }

    #[test]
    #[serial_test::serial]
    fn test_env_var_expansion() {
        unsafe {
            std::env::set_var("MEMSTORE_TEST_SECRET", "from-env");
        }

        let content = r#"
            [profiles.env]
            secret_key = "${MEMSTORE_TEST_SECRET}"
            api_url = "${MEMSTORE_TEST_UNSET_URL:-http://localhost:9999}"
        "#;
        let config: Config = toml::from_str(&Config::expand_env_vars(content)).unwrap();
        let env = config.profile("env").unwrap();
        assert_eq!(env.secret_key, "from-env");
        assert_eq!(env.api_url, "http://localhost:9999");

        unsafe {
            std::env::remove_var("MEMSTORE_TEST_SECRET");
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_unset_env_var_left_verbatim() {
        unsafe {
            std::env::remove_var("MEMSTORE_TEST_NEVER_SET");
        }
        let expanded = Config::expand_env_vars(r#"secret_key = "${MEMSTORE_TEST_NEVER_SET}""#);
        assert!(expanded.contains("${MEMSTORE_TEST_NEVER_SET}"));
    }
}

//! Error types for memstorectl
//!
//! Maps core errors onto user-facing categories, each with its own set of tips.

use colored::Colorize;
use memstorectl_core::{ApiError, ConfigError, CoreError};
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: Profile 'prod' not found
///
///   tip: List available profiles: memstorectl profile list
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the memstorectl application
#[derive(Error, Debug)]
pub enum MemstoreCtlError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profile configured. Use 'memstorectl profile set' to configure a profile.")]
    NoProfileConfigured,

    #[error("Missing credentials for profile '{name}'")]
    MissingCredentials { name: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Timeout: {message}")]
    Timeout {
        message: String,
        last_status: Option<String>,
    },

    #[error("Cancelled: {message}")]
    Cancelled { message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for memstorectl operations
pub type Result<T> = std::result::Result<T, MemstoreCtlError>;

impl MemstoreCtlError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            MemstoreCtlError::ProfileNotFound { name } => vec![
                "List available profiles: memstorectl profile list".to_string(),
                format!(
                    "Create profile '{}': memstorectl profile set {} --secret-key <key>",
                    name, name
                ),
                "Check profile name spelling".to_string(),
            ],
            MemstoreCtlError::NoProfileConfigured => vec![
                "Create a profile: memstorectl profile set default --secret-key <key> --zone fr-par-1".to_string(),
                "Or export MEMSTORE_SECRET_KEY for a one-off command".to_string(),
            ],
            MemstoreCtlError::MissingCredentials { name } => vec![
                format!(
                    "Update profile credentials: memstorectl profile set {} --secret-key <key>",
                    name
                ),
                format!("Check profile details: memstorectl profile show {}", name),
                "Verify environment variables are set correctly".to_string(),
            ],
            MemstoreCtlError::AuthenticationFailed { .. } => vec![
                "Check your credentials: memstorectl profile show <profile>".to_string(),
                "Verify the secret key has access to the project".to_string(),
                "Ensure the API endpoint URL is correct".to_string(),
            ],
            MemstoreCtlError::NotFound { .. } => vec![
                "Verify the cluster ID and zone are correct".to_string(),
                "List clusters in the zone: memstorectl cluster list --zone <zone>".to_string(),
            ],
            MemstoreCtlError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the API URL is correct: memstorectl profile show <profile>".to_string(),
            ],
            MemstoreCtlError::Timeout { .. } => vec![
                "The operation may still be running. Resume waiting with: memstorectl cluster wait <id> --zone <zone>".to_string(),
                "Increase the limit with --wait-timeout (create/delete) or --timeout (wait)".to_string(),
            ],
            MemstoreCtlError::Cancelled { .. } => vec![
                "The operation was submitted and keeps running server-side".to_string(),
                "Resume waiting with: memstorectl cluster wait <id> --zone <zone>".to_string(),
            ],
            MemstoreCtlError::InvalidInput { .. } => vec![
                "Check the command syntax: memstorectl <command> --help".to_string(),
                "Verify the --from-json file is valid JSON".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&format!("{}", self));

        if let MemstoreCtlError::Timeout {
            last_status: Some(status),
            ..
        } = self
        {
            diag = diag.detail(&format!("last observed status: {}", status));
        }

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion, &[]);
        }

        diag.print();
    }
}

impl From<ApiError> for MemstoreCtlError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::AuthenticationFailed { message } | ApiError::Forbidden { message } => {
                MemstoreCtlError::AuthenticationFailed { message }
            }
            ApiError::NotFound { message } => MemstoreCtlError::NotFound { message },
            ApiError::BadRequest { message } => MemstoreCtlError::InvalidInput { message },
            ApiError::ConnectionError(message) => MemstoreCtlError::ConnectionError { message },
            ApiError::RequestTimeout(message) => MemstoreCtlError::Timeout {
                message,
                last_status: None,
            },
            _ => MemstoreCtlError::ApiError {
                message: err.to_string(),
            },
        }
    }
}

impl From<CoreError> for MemstoreCtlError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Api(api_err) => MemstoreCtlError::from(api_err),
            CoreError::WaitTimeout {
                timeout,
                last_status,
            } => MemstoreCtlError::Timeout {
                message: format!(
                    "cluster did not reach a stable state within {} seconds",
                    timeout.as_secs()
                ),
                last_status,
            },
            CoreError::Cancelled { last_status } => MemstoreCtlError::Cancelled {
                message: match last_status {
                    Some(status) => format!("wait interrupted (last status: {})", status),
                    None => "wait interrupted".to_string(),
                },
            },
            CoreError::Validation(message) => MemstoreCtlError::InvalidInput { message },
            CoreError::Config(config_err) => MemstoreCtlError::from(config_err),
        }
    }
}

impl From<ConfigError> for MemstoreCtlError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => MemstoreCtlError::ProfileNotFound { name },
            ConfigError::NoProfiles { .. } => MemstoreCtlError::NoProfileConfigured,
            other => MemstoreCtlError::Configuration(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for MemstoreCtlError {
    fn from(err: serde_json::Error) -> Self {
        MemstoreCtlError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for MemstoreCtlError {
    fn from(err: std::io::Error) -> Self {
        MemstoreCtlError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<anyhow::Error> for MemstoreCtlError {
    fn from(err: anyhow::Error) -> Self {
        MemstoreCtlError::Configuration(err.to_string())
    }
}

//! Profile management command implementations

use crate::cli::{OutputFormat, ProfileCommands};
use crate::connection::ConnectionManager;
use crate::error::MemstoreCtlError;
use crate::output;
use colored::Colorize;
use memstorectl_core::{Config, Profile};
use serde_json::json;
use tracing::{debug, info, trace};

/// Handle profile management commands
pub async fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
    query: Option<&str>,
) -> Result<(), MemstoreCtlError> {
    match profile_cmd {
        ProfileCommands::List => handle_list(conn_mgr, output_format, query),
        ProfileCommands::Path => handle_path(conn_mgr, output_format),
        ProfileCommands::Show { name } => handle_show(conn_mgr, name, output_format, query),
        ProfileCommands::Set {
            name,
            secret_key,
            api_url,
            zone,
            project_id,
            default,
        } => {
            let mut profile = Profile::new(secret_key.clone());
            profile.api_url = api_url.clone();
            profile.default_zone = zone.clone();
            profile.project_id = project_id.clone();
            handle_set(conn_mgr, name, profile, *default)
        }
        ProfileCommands::Remove { name } => handle_remove(conn_mgr, name),
        ProfileCommands::Default { name } => handle_default(conn_mgr, name),
    }
}

fn config_path_display(conn_mgr: &ConnectionManager) -> Option<String> {
    conn_mgr
        .config_path
        .clone()
        .or_else(|| Config::config_path().ok())
        .map(|p| p.display().to_string())
}

/// Profile as shown to the user, secret masked
fn profile_summary(
    conn_mgr: &ConnectionManager,
    name: &str,
    profile: &Profile,
) -> serde_json::Value {
    let mut obj = json!({
        "name": name,
        "api_url": profile.api_url,
        "secret_key": mask_secret(&profile.secret_key),
        "is_default": conn_mgr.config.default_profile.as_deref() == Some(name),
    });
    if let Some(zone) = &profile.default_zone {
        obj["default_zone"] = json!(zone);
    }
    if let Some(project) = &profile.project_id {
        obj["project_id"] = json!(project);
    }
    obj
}

fn mask_secret(secret: &str) -> String {
    // Unexpanded ${VAR} references are safe to show
    if secret.starts_with("${") {
        return secret.to_string();
    }
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

fn handle_list(
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
    query: Option<&str>,
) -> Result<(), MemstoreCtlError> {
    debug!("Listing all configured profiles");
    let profiles = conn_mgr.config.list_profiles();
    trace!("Found {} profiles", profiles.len());

    let structured = output_format
        .structured()
        .or(query.map(|_| output::OutputFormat::Json));
    if let Some(fmt) = structured {
        let profile_list: Vec<_> = profiles
            .iter()
            .map(|(name, profile)| profile_summary(conn_mgr, name, profile))
            .collect();
        let output_data = json!({
            "config_path": config_path_display(conn_mgr),
            "profiles": profile_list,
            "count": profiles.len(),
        });
        output::print_output(&output_data, fmt, query)?;
        return Ok(());
    }

    if let Some(path) = config_path_display(conn_mgr) {
        println!("Configuration file: {}", path);
        println!();
    }

    if profiles.is_empty() {
        info!("No profiles configured");
        println!("No profiles configured.");
        println!("Use 'memstorectl profile set' to create a profile.");
        return Ok(());
    }

    for (name, profile) in profiles {
        if conn_mgr.config.default_profile.as_deref() == Some(name.as_str()) {
            println!("  {} {}", name.bold().cyan(), "(default)".green());
        } else {
            println!("  {}", name.bold().cyan());
        }
        println!("    {}  {}", "URL:".dimmed(), profile.api_url);
        if let Some(zone) = &profile.default_zone {
            println!("    {} {}", "Zone:".dimmed(), zone);
        }
    }

    Ok(())
}

fn handle_path(
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> Result<(), MemstoreCtlError> {
    let config_path = match &conn_mgr.config_path {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    match output_format.structured() {
        Some(fmt) => {
            let output_data = json!({ "config_path": config_path.display().to_string() });
            output::print_output(&output_data, fmt, None)?;
        }
        None => println!("{}", config_path.display()),
    }
    Ok(())
}

fn handle_show(
    conn_mgr: &ConnectionManager,
    name: &str,
    output_format: OutputFormat,
    query: Option<&str>,
) -> Result<(), MemstoreCtlError> {
    let profile = conn_mgr.config.profile(name)?;
    let summary = profile_summary(conn_mgr, name, profile);

    match output_format.structured() {
        Some(fmt) => output::print_output(&summary, fmt, query)?,
        None if query.is_some() => {
            output::print_output(&summary, output::OutputFormat::Json, query)?
        }
        None => {
            let is_default = summary["is_default"].as_bool().unwrap_or(false);
            println!(
                "Profile: {}{}",
                name.bold(),
                if is_default { " (default)" } else { "" }
            );
            println!("API URL: {}", profile.api_url);
            println!("Secret key: {}", mask_secret(&profile.secret_key));
            println!(
                "Default zone: {}",
                profile.default_zone.as_deref().unwrap_or("-")
            );
            println!(
                "Project ID: {}",
                profile.project_id.as_deref().unwrap_or("-")
            );
        }
    }
    Ok(())
}

fn handle_set(
    conn_mgr: &ConnectionManager,
    name: &str,
    profile: Profile,
    make_default: bool,
) -> Result<(), MemstoreCtlError> {
    debug!("Setting profile: {}", name);

    let mut config = conn_mgr.config.clone();
    let existed = config.profiles.contains_key(name);
    config.set_profile(name.to_string(), profile);

    // The first profile becomes the default
    if make_default || config.default_profile.is_none() {
        config.default_profile = Some(name.to_string());
    }

    conn_mgr.save_config(&config)?;

    if existed {
        println!("Profile '{}' updated successfully.", name);
    } else {
        println!("Profile '{}' created successfully.", name);
    }
    if config.default_profile.as_deref() == Some(name) {
        println!("Profile '{}' is the default profile.", name);
    }
    Ok(())
}

fn handle_remove(conn_mgr: &ConnectionManager, name: &str) -> Result<(), MemstoreCtlError> {
    debug!("Removing profile: {}", name);

    let mut config = conn_mgr.config.clone();
    let was_default = config.default_profile.as_deref() == Some(name);
    if config.remove_profile(name).is_none() {
        return Err(MemstoreCtlError::ProfileNotFound { name: name.into() });
    }

    conn_mgr.save_config(&config)?;

    println!("Profile '{}' removed successfully.", name);
    if was_default {
        println!("Default profile cleared.");
    }
    Ok(())
}

fn handle_default(conn_mgr: &ConnectionManager, name: &str) -> Result<(), MemstoreCtlError> {
    debug!("Setting default profile: {}", name);

    if !conn_mgr.config.profiles.contains_key(name) {
        return Err(MemstoreCtlError::ProfileNotFound { name: name.into() });
    }

    let mut config = conn_mgr.config.clone();
    config.default_profile = Some(name.to_string());
    conn_mgr.save_config(&config)?;

    println!("Default profile set to '{}'.", name);
    Ok(())
}

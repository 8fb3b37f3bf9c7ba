use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, shells};
use memstorectl_core::Config;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands};
use connection::ConnectionManager;
use error::MemstoreCtlError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    // Load configuration from specified path or default location
    let loaded = if let Some(config_file) = &cli.config_file {
        let path = std::path::PathBuf::from(config_file);
        debug!("Loading config from explicit path: {:?}", path);
        Config::load_from_path(&path).map(|config| (config, Some(path)))
    } else {
        debug!("Loading config from default location");
        Config::load().map(|config| (config, None))
    };
    let (config, config_path) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            MemstoreCtlError::from(e).print_diagnostic();
            std::process::exit(1);
        }
    };
    let conn_mgr = ConnectionManager::with_config_path(config, config_path);

    // Execute command
    if let Err(e) = execute_command(&cli, &conn_mgr).await {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "memstorectl=warn,memstorectl_core=warn",
            1 => "memstorectl=info,memstorectl_core=info",
            2 => "memstorectl=debug,memstorectl_core=debug",
            _ => "memstorectl=trace,memstorectl_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(cli: &Cli, conn_mgr: &ConnectionManager) -> Result<(), MemstoreCtlError> {
    // Log command execution with sanitized parameters
    info!("Command: {}", format_command(&cli.command));

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Version => {
            debug!("Showing version information");
            match cli.output.structured() {
                Some(fmt) => {
                    let output_data = serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "name": env!("CARGO_PKG_NAME"),
                    });
                    output::print_output(&output_data, fmt, None)?;
                }
                None => {
                    println!("memstorectl {}", env!("CARGO_PKG_VERSION"));
                }
            }
            Ok(())
        }
        Commands::Completions { shell } => {
            debug!("Generating completions for {:?}", shell);
            generate_completions(*shell);
            Ok(())
        }

        Commands::Profile(profile_cmd) => {
            debug!("Executing profile command");
            commands::profile::handle_profile_command(
                profile_cmd,
                conn_mgr,
                cli.output,
                cli.query.as_deref(),
            )
            .await
        }

        Commands::Cluster(cluster_cmd) => {
            debug!("Executing cluster command");
            commands::cluster::handle_cluster_command(
                cluster_cmd,
                conn_mgr,
                cli.profile.as_deref(),
                cli.output,
                cli.query.as_deref(),
            )
            .await
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}

/// Generate shell completions
fn generate_completions(shell: cli::Shell) {
    let mut cmd = cli::Cli::command();
    let name = cmd.get_name().to_string();

    match shell {
        cli::Shell::Bash => generate(shells::Bash, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Zsh => generate(shells::Zsh, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Fish => generate(shells::Fish, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::PowerShell => {
            generate(shells::PowerShell, &mut cmd, name, &mut std::io::stdout())
        }
        cli::Shell::Elvish => generate(shells::Elvish, &mut cmd, name, &mut std::io::stdout()),
    }
}

/// Format command for human-readable logging (without sensitive data)
fn format_command(command: &Commands) -> String {
    match command {
        Commands::Version => "version".to_string(),
        Commands::Completions { shell } => format!("completions {:?}", shell),
        Commands::Profile(cmd) => {
            use cli::ProfileCommands;
            match cmd {
                ProfileCommands::List => "profile list".to_string(),
                ProfileCommands::Path => "profile path".to_string(),
                ProfileCommands::Show { name } => format!("profile show {}", name),
                ProfileCommands::Set { name, .. } => {
                    format!("profile set {} [credentials redacted]", name)
                }
                ProfileCommands::Remove { name } => format!("profile remove {}", name),
                ProfileCommands::Default { name } => format!("profile default {}", name),
            }
        }
        Commands::Cluster(cmd) => {
            use cli::ClusterCommands;
            match cmd {
                ClusterCommands::Create(args) => format!(
                    "cluster create {} [password redacted]",
                    args.name.as_deref().unwrap_or("<from json>")
                ),
                ClusterCommands::Get { id, .. } => format!("cluster get {}", id),
                ClusterCommands::List { zone } => format!("cluster list {:?}", zone),
                ClusterCommands::Delete { id, wait, .. } => {
                    format!("cluster delete {} (wait: {})", id, wait.wait)
                }
                ClusterCommands::Wait { id, timeout, .. } => {
                    format!("cluster wait {} (timeout: {}s)", id, timeout)
                }
            }
        }
    }
}

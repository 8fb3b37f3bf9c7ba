//! Cluster command implementations
//!
//! Each handler resolves the profile and zone, calls into the core workflows
//! and prints the result. `--wait` runs an `indicatif` spinner driven by the
//! core progress events, and Ctrl+C cancels the wait.

use std::time::Duration;

use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use memstorectl_core::cluster::{
    Cluster, ClusterCreateInput, ClusterOutcome, EndpointInput, WaitOptions, WaitRequest,
    create_cluster_and_wait, delete_cluster_and_wait, wait_for_cluster,
};
use memstorectl_core::{ClusterApi, ProgressCallback, ProgressEvent};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::cli::{ClusterCommands, CreateClusterArgs, OutputFormat, WaitArgs};
use crate::connection::{ConnectionManager, ResolvedProfile};
use crate::error::{MemstoreCtlError, Result as CliResult};
use crate::output;

/// Handle cluster commands
pub async fn handle_cluster_command(
    cmd: &ClusterCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let profile = conn_mgr.resolve_profile(profile_name)?;
    let client = conn_mgr.create_client(&profile)?;

    match cmd {
        ClusterCommands::Create(args) => {
            create_cluster(&client, &profile, args, output_format, query).await
        }
        ClusterCommands::Get { id, zone } => {
            let zone = profile.zone(zone.as_deref())?;
            let cluster = client.get_cluster(&zone, id).await?;
            print_cluster(&cluster, output_format, query)
        }
        ClusterCommands::List { zone } => {
            let zone = profile.zone(zone.as_deref())?;
            let clusters = client.list_clusters(&zone).await?;
            info!("Found {} clusters in {}", clusters.len(), zone);
            print_clusters(&clusters, output_format, query)
        }
        ClusterCommands::Delete { id, zone, wait } => {
            let zone = profile.zone(zone.as_deref())?;
            let options = wait_options(wait);
            let spinner = options
                .wait
                .then(|| Spinner::start(format!("Deleting cluster {}", id)));

            let outcome = delete_cluster_and_wait(
                &client,
                &zone,
                id,
                &options,
                interrupted(),
                spinner.as_ref().map(Spinner::callback),
            )
            .await;
            finish_spinner(spinner, &outcome);
            print_outcome(id, &outcome?, output_format, query)
        }
        ClusterCommands::Wait {
            id,
            zone,
            timeout,
            interval,
        } => {
            let zone = profile.zone(zone.as_deref())?;
            let request = WaitRequest::new(zone, id.clone())
                .with_timeout(Duration::from_secs(*timeout))
                .with_retry_interval(Duration::from_secs(*interval));
            let spinner = Spinner::start(format!("Waiting for cluster {}", id));

            let result = wait_for_cluster(
                &client,
                &request,
                interrupted(),
                Some(spinner.callback()),
            )
            .await;
            match &result {
                Ok(cluster) => spinner.done(format!("Cluster {}: {}", id, cluster.status)),
                Err(e) => spinner.done(format!("Cluster {}: {}", id, e)),
            }
            print_cluster(&result?, output_format, query)
        }
    }
}

async fn create_cluster<A: ClusterApi + ?Sized>(
    api: &A,
    profile: &ResolvedProfile,
    args: &CreateClusterArgs,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let mut input = match &args.from_json {
        Some(path) => read_input(path)?,
        None => ClusterCreateInput::default(),
    };
    apply_create_flags(&mut input, args);

    let zone = if args.zone.is_some() || input.zone.is_empty() {
        profile.zone(args.zone.as_deref())?
    } else {
        input.zone.clone()
    };
    input.zone = zone;
    if input.project_id.is_none() {
        input.project_id = profile.project_id.clone();
    }
    debug!(
        "Creating cluster '{}' in {} with {} endpoints",
        input.name,
        input.zone,
        input.endpoints.len()
    );

    let options = wait_options(&args.wait);
    let spinner = options
        .wait
        .then(|| Spinner::start(format!("Creating cluster {}", input.name)));

    let outcome = create_cluster_and_wait(
        api,
        &input,
        &options,
        interrupted(),
        spinner.as_ref().map(Spinner::callback),
    )
    .await;
    finish_spinner(spinner, &outcome);
    print_outcome(&input.name, &outcome?, output_format, query)
}

/// Overlay command line flags on the (possibly file-provided) input
fn apply_create_flags(input: &mut ClusterCreateInput, args: &CreateClusterArgs) {
    if let Some(name) = &args.name {
        input.name = name.clone();
    }
    if let Some(node_type) = &args.node_type {
        input.node_type = node_type.clone();
    }
    if let Some(version) = &args.version {
        input.version = version.clone();
    }
    if let Some(user_name) = &args.user_name {
        input.user_name = user_name.clone();
    }
    if let Some(password) = &args.password {
        input.password = password.clone();
    }
    if let Some(size) = args.cluster_size {
        input.cluster_size = Some(size);
    }
    if args.tls {
        input.tls_enabled = true;
    }
    input.tags.extend(args.tags.iter().cloned());
    input.endpoints.extend(args.private_networks.iter().cloned());
    if args.public_network {
        input.endpoints.push(EndpointInput::public_network());
    }
}

fn read_input(path: &str) -> CliResult<ClusterCreateInput> {
    let content = if path == "-" {
        std::io::read_to_string(std::io::stdin())
    } else {
        std::fs::read_to_string(path)
    }
    .map_err(|e| MemstoreCtlError::InvalidInput {
        message: format!("cannot read '{}': {}", path, e),
    })?;

    serde_json::from_str(&content).map_err(|e| MemstoreCtlError::InvalidInput {
        message: format!("invalid cluster JSON in '{}': {}", path, e),
    })
}

fn wait_options(args: &WaitArgs) -> WaitOptions {
    WaitOptions {
        wait: args.wait,
        timeout: Duration::from_secs(args.wait_timeout),
        interval: Duration::from_secs(args.wait_interval),
    }
}

/// Resolves on Ctrl+C
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; never cancel
        std::future::pending::<()>().await;
    }
}

/// Spinner on stderr fed by core progress events
struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    fn start(message: String) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        bar.set_message(message);
        Self { bar }
    }

    fn callback(&self) -> ProgressCallback {
        let bar = self.bar.clone();
        Box::new(move |event: ProgressEvent| match &event {
            ProgressEvent::Started { resource_id } => {
                bar.set_message(format!("Cluster {}: polling", resource_id));
            }
            ProgressEvent::Polling {
                resource_id,
                status,
                attempt,
                ..
            } => {
                bar.set_message(format!(
                    "Cluster {}: {} (check {})",
                    resource_id,
                    format_status(status),
                    attempt
                ));
            }
            ProgressEvent::Settled {
                resource_id,
                status,
            } => {
                bar.finish_with_message(format!(
                    "Cluster {}: {}",
                    resource_id,
                    format_status(status)
                ));
            }
            ProgressEvent::Gone { resource_id } => {
                bar.finish_with_message(format!(
                    "Cluster {}: {}",
                    resource_id,
                    format_status("deleted")
                ));
            }
            ProgressEvent::Failed { resource_id, error } => {
                bar.finish_with_message(format!("Cluster {} failed: {}", resource_id, error));
            }
        })
    }

    fn done(&self, message: String) {
        if !self.bar.is_finished() {
            self.bar.finish_with_message(message);
        }
    }
}

fn finish_spinner<T>(spinner: Option<Spinner>, result: &memstorectl_core::Result<T>) {
    if let Some(spinner) = spinner {
        match result {
            Ok(_) => spinner.done("done".to_string()),
            Err(e) => spinner.done(format!("failed: {}", e)),
        }
    }
}

/// Format a cluster status with a status icon
fn format_status(status: &str) -> String {
    match status {
        "ready" | "deleted" => format!("\u{2713} {}", status),
        "error" | "locked" | "suspended" => format!("\u{2717} {}", status),
        "provisioning" | "configuring" | "deleting" | "autohealing" | "initializing" => {
            format!("\u{21bb} {}", status)
        }
        _ => status.to_string(),
    }
}

fn print_outcome(
    label: &str,
    outcome: &ClusterOutcome,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    match outcome {
        ClusterOutcome::Submitted(cluster) | ClusterOutcome::Ready(cluster) => {
            print_cluster(cluster, output_format, query)
        }
        ClusterOutcome::Deleted { last_seen } => {
            let data = json!({
                "id": last_seen.as_ref().map(|c| c.id.as_str()).unwrap_or(label),
                "deleted": true,
                "last_seen": last_seen,
            });
            match (output_format.structured(), query) {
                (Some(fmt), _) => output::print_output(&data, fmt, query)?,
                (None, Some(_)) => output::print_output(&data, output::OutputFormat::Json, query)?,
                (None, None) => {
                    println!("Cluster {} deleted", data["id"].as_str().unwrap_or(label))
                }
            }
            Ok(())
        }
    }
}

fn print_cluster(
    cluster: &Cluster,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    match (output_format.structured(), query) {
        (Some(fmt), _) => output::print_output(cluster, fmt, query)?,
        (None, Some(_)) => output::print_output(cluster, table_or_json(output_format), query)?,
        (None, None) => println!("{}", cluster_details_table(cluster)),
    }
    Ok(())
}

fn print_clusters(
    clusters: &[Cluster],
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    match (output_format.structured(), query) {
        (Some(fmt), _) => output::print_output(clusters, fmt, query)?,
        (None, Some(_)) => output::print_output(clusters, table_or_json(output_format), query)?,
        (None, None) if clusters.is_empty() => println!("No clusters found."),
        (None, None) => println!("{}", clusters_table(clusters)),
    }
    Ok(())
}

/// Queried output in human mode: a table when asked for, JSON otherwise
fn table_or_json(output_format: OutputFormat) -> output::OutputFormat {
    if output_format == OutputFormat::Table {
        output::OutputFormat::Table
    } else {
        output::OutputFormat::Json
    }
}

fn clusters_table(clusters: &[Cluster]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "ID",
        "NAME",
        "ZONE",
        "STATUS",
        "VERSION",
        "NODE TYPE",
        "SIZE",
    ]);
    for cluster in clusters {
        table.add_row(vec![
            cluster.id.clone(),
            cluster.name.clone(),
            cluster.zone.clone(),
            format_status(cluster.status.as_str()),
            cluster.version.clone(),
            cluster.node_type.clone(),
            cluster
                .cluster_size
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table
}

fn cluster_details_table(cluster: &Cluster) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);

    let mut rows: Vec<(&str, String)> = vec![
        ("ID", cluster.id.clone()),
        ("Name", cluster.name.clone()),
        ("Zone", cluster.zone.clone()),
        ("Status", format_status(cluster.status.as_str())),
        ("Version", cluster.version.clone()),
        ("Node type", cluster.node_type.clone()),
        (
            "Size",
            cluster
                .cluster_size
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
        ("TLS", cluster.tls_enabled.to_string()),
    ];
    if !cluster.tags.is_empty() {
        rows.push(("Tags", cluster.tags.join(", ")));
    }
    for (i, endpoint) in cluster.endpoints.iter().enumerate() {
        let value = serde_json::to_value(endpoint).unwrap_or(Value::Null);
        rows.push(("Endpoint", describe_endpoint(i, &value)));
    }
    if let Some(created) = cluster.created_at {
        rows.push(("Created", created.to_rfc3339()));
    }

    for (field, value) in rows {
        table.add_row(vec![field.to_string(), value]);
    }
    table
}

fn describe_endpoint(index: usize, endpoint: &Value) -> String {
    let kind = if endpoint.get("private_network").is_some() {
        "private"
    } else if endpoint.get("public_network").is_some() {
        "public"
    } else {
        "unknown"
    };
    let ips = endpoint
        .get("ips")
        .and_then(Value::as_array)
        .map(|ips| {
            ips.iter()
                .map(output::format_value)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();
    let port = endpoint
        .get("port")
        .map(output::format_value)
        .unwrap_or_else(|| "-".to_string());

    format!("#{} {} {}:{}", index, kind, ips, port)
}

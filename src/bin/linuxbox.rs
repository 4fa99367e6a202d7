use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use linuxbox::config::load_network_config;
use linuxbox::resource::{ManagedResource, NetworkController, NETWORK_SCHEMA};
use linuxbox::ssh::{SshExecutor, SshExecutorConfig};
use linuxbox::types::{NetworkConfig, NetworkId, ResourceRecord};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "linuxbox")]
#[command(about = "Manage docker networks on remote hosts over SSH")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct LinuxboxCli {
    /// Resource configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Read the private key from this file instead of the configuration
    #[arg(long, global = true)]
    ssh_key_file: Option<PathBuf>,

    /// SSH port on the remote host
    #[arg(long, default_value_t = 22, global = true)]
    port: u16,

    /// Seconds to wait for the SSH connection
    #[arg(long, default_value_t = 10, global = true)]
    connect_timeout: u64,

    /// Seconds to wait for a remote command (no limit by default)
    #[arg(long, global = true)]
    command_timeout: Option<u64>,

    /// Require the host key to be present in known_hosts
    #[arg(long, global = true)]
    strict_host_key_checking: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    operation: Operation,
}

#[derive(Subcommand)]
enum Operation {
    /// Create the network and print its identity
    Create,
    /// Read the network back; prints a null id when it no longer exists
    Read {
        #[arg(long)]
        id: String,
    },
    /// Always rejected: networks can only be replaced
    Update {
        #[arg(long)]
        id: String,
    },
    /// Remove the network
    Delete {
        #[arg(long)]
        id: String,
    },
    /// Print the declared configuration schema
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = LinuxboxCli::parse();

    // Initialize tracing; stdout is reserved for results
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let controller = NetworkController::new(SshExecutor::new(executor_config(&cli)));

    match &cli.operation {
        Operation::Schema => print_json(&NETWORK_SCHEMA)?,
        Operation::Create => {
            let desired = desired_config(&cli)?;
            let id = controller.create(&desired).await?;
            print_json(&ResourceRecord {
                id: Some(id),
                name: Some(desired.name.clone()),
            })?;
        }
        Operation::Read { id } => {
            let desired = desired_config(&cli)?;
            let outcome = controller.read(&desired, &parse_id(id)?).await?;
            if outcome.is_not_found() {
                warn!("Network {} is gone, clear the stored identity", id);
            }
            print_json(&outcome.into_record())?;
        }
        Operation::Update { id } => {
            let desired = desired_config(&cli)?;
            controller.update(&desired, &parse_id(id)?).await?;
        }
        Operation::Delete { id } => {
            let desired = desired_config(&cli)?;
            controller.delete(&desired, &parse_id(id)?).await?;
            info!("Network {} deleted", id);
        }
    }

    Ok(())
}

fn executor_config(cli: &LinuxboxCli) -> SshExecutorConfig {
    SshExecutorConfig {
        port: cli.port,
        connect_timeout: Duration::from_secs(cli.connect_timeout),
        command_timeout: cli.command_timeout.map(Duration::from_secs),
        strict_host_key_checking: cli.strict_host_key_checking,
        ..Default::default()
    }
}

fn desired_config(cli: &LinuxboxCli) -> Result<NetworkConfig> {
    let path = cli
        .config
        .as_deref()
        .context("--config is required for this operation")?;

    load_network_config(path, cli.ssh_key_file.as_deref())
        .with_context(|| format!("Failed to load {}", path.display()))
}

fn parse_id(id: &str) -> Result<NetworkId> {
    NetworkId::new(id).context("--id must not be empty")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

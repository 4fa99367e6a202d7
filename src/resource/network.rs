use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::resource::command::{parse_identity, parse_inspect, NetworkCommand};
use crate::resource::error::{ResourceError, Result};
use crate::resource::interface::ManagedResource;
use crate::ssh::{CommandOutput, ExecError, RemoteExecutor};
use crate::types::{ConnectionConfig, NetworkConfig, NetworkId, ObservedNetwork, ReadOutcome};

/// Manages a docker network on a remote host
pub struct NetworkController<E> {
    executor: E,
}

impl<E: RemoteExecutor> NetworkController<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Runs one command line in a fresh session.
    ///
    /// The session is closed on every path. Session failures come back as the
    /// outer error; the command's own outcome is left for the caller to classify.
    async fn run_once(
        &self,
        connection: &ConnectionConfig,
        line: &str,
    ) -> Result<std::result::Result<CommandOutput, ExecError>> {
        let mut session = self
            .executor
            .open(connection)
            .await
            .map_err(|e| ResourceError::from_exec(line, e))?;

        debug!("Running `{}` on {}", line, connection.host_address);
        let result = session.run(line).await;

        match (session.close().await, result) {
            (Ok(()), result) => Ok(result),
            (Err(close_err), Ok(output)) => {
                warn!(
                    "`{}` succeeded on {} but the session did not close cleanly (output: {:?})",
                    line,
                    connection.host_address,
                    output.stdout_lossy().trim()
                );
                Err(ResourceError::from_exec(line, close_err))
            }
            (Err(close_err), Err(run_err)) => {
                warn!(
                    "Failed to close session to {} after failed command: {}",
                    connection.host_address, close_err
                );
                Ok(Err(run_err))
            }
        }
    }
}

#[async_trait]
impl<E: RemoteExecutor> ManagedResource for NetworkController<E> {
    type Config = NetworkConfig;
    type Id = NetworkId;
    type Observed = ObservedNetwork;

    fn resource_type(&self) -> &'static str {
        "docker_network"
    }

    async fn create(&self, desired: &NetworkConfig) -> Result<NetworkId> {
        info!(
            "Creating network {} on {}",
            desired.name, desired.connection.host_address
        );

        let line = NetworkCommand::Create {
            name: &desired.name,
        }
        .to_line();

        let output = self
            .run_once(&desired.connection, &line)
            .await?
            .map_err(|e| ResourceError::from_exec(&line, e))?;

        let id = parse_identity(&line, &output.stdout)?;

        info!("Created network {} with id {}", desired.name, id);
        Ok(id)
    }

    async fn read(&self, desired: &NetworkConfig, id: &NetworkId) -> Result<ReadOutcome> {
        info!("Reading network {} on {}", id, desired.connection.host_address);

        let line = NetworkCommand::Inspect { id }.to_line();

        match self.run_once(&desired.connection, &line).await? {
            Ok(output) => {
                let observed = parse_inspect(&line, id, &output.stdout)?;
                if let Some(drift) = observed.drift_from(desired) {
                    warn!("Network {}: {}", id, drift);
                }
                Ok(ReadOutcome::Found(observed))
            }
            Err(err) if err.is_command_execution() => {
                debug!("`{}` failed: {}", line, err.stderr().trim());
                info!(
                    "Network {} no longer exists on {}",
                    id, desired.connection.host_address
                );
                Ok(ReadOutcome::NotFound)
            }
            Err(err) => Err(ResourceError::from_exec(&line, err)),
        }
    }

    async fn update(&self, _desired: &NetworkConfig, id: &NetworkId) -> Result<()> {
        debug!("Rejecting in-place update of network {}", id);
        Err(ResourceError::UnsupportedOperation { operation: "update" })
    }

    async fn delete(&self, desired: &NetworkConfig, id: &NetworkId) -> Result<()> {
        info!(
            "Removing network {} from {}",
            id, desired.connection.host_address
        );

        let line = NetworkCommand::Remove { id }.to_line();

        self.run_once(&desired.connection, &line)
            .await?
            .map_err(|e| ResourceError::from_exec(&line, e))?;

        info!("Removed network {}", id);
        Ok(())
    }
}

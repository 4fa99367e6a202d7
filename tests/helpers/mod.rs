//! In-memory docker host reachable through a fake remote executor

#![allow(dead_code)]

use async_trait::async_trait;
use linuxbox::ssh::{CommandOutput, ExecError, RemoteExecutor, RemoteSession};
use linuxbox::types::{ConnectionConfig, NetworkConfig, NetworkId};
use secrecy::SecretString;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Failure the fake host injects until cleared
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Opening a session fails
    OpenSession,
    /// Opening a session fails with an error shaped like a remote command failure
    OpenAsCommandFailure,
    /// Every command fails at the transport level
    Transport,
    /// Closing a session fails
    CloseSession,
    /// `docker network inspect` succeeds and prints this instead
    InspectOutput(String),
}

#[derive(Default)]
struct HostState {
    networks: BTreeMap<String, String>,
    next_id: u64,
    commands: Vec<String>,
    opened: usize,
    closed: usize,
    fault: Option<Fault>,
}

#[derive(Clone, Default)]
pub struct FakeDockerHost {
    state: Arc<Mutex<HostState>>,
}

impl FakeDockerHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap()
    }

    pub fn set_fault(&self, fault: Option<Fault>) {
        self.state().fault = fault;
    }

    pub fn commands(&self) -> Vec<String> {
        self.state().commands.clone()
    }

    pub fn sessions_opened(&self) -> usize {
        self.state().opened
    }

    pub fn sessions_closed(&self) -> usize {
        self.state().closed
    }

    pub fn network_names(&self) -> Vec<String> {
        self.state().networks.values().cloned().collect()
    }

    /// Removes a network behind the controller's back
    pub fn remove_network(&self, id: &NetworkId) {
        self.state().networks.remove(id.as_str());
    }

    /// Renames a network behind the controller's back
    pub fn rename_network(&self, id: &NetworkId, name: &str) {
        if let Some(existing) = self.state().networks.get_mut(id.as_str()) {
            *existing = name.to_string();
        }
    }

    fn execute(&self, line: &str) -> Result<CommandOutput, ExecError> {
        let mut state = self.state();
        state.commands.push(line.to_string());

        if state.fault == Some(Fault::Transport) {
            return Err(ExecError::Transport {
                reason: "connection reset by peer".to_string(),
                stderr: "Error: No such network".to_string(),
            });
        }

        let words = shell_words::split(line).map_err(|e| ExecError::Transport {
            reason: format!("unparseable command line: {e}"),
            stderr: String::new(),
        })?;
        let words: Vec<&str> = words.iter().map(String::as_str).collect();

        match words.as_slice() {
            ["docker", "network", "create", name] => {
                if name.is_empty() {
                    return failed("Error: network name must not be empty");
                }
                state.next_id += 1;
                let id = format!("{:012x}", 0xabc000 + state.next_id);
                state.networks.insert(id.clone(), name.to_string());
                ok(format!("{id}\n"))
            }
            ["docker", "network", "inspect", id] => {
                if let Some(Fault::InspectOutput(stdout)) = &state.fault {
                    return ok(stdout.clone());
                }
                match state.networks.get(*id) {
                    Some(name) => ok(json!([{"Id": id, "Name": name, "Driver": "bridge"}]).to_string()),
                    None => Err(ExecError::CommandFailed {
                        exit_code: 1,
                        stdout: b"[]\n".to_vec(),
                        stderr: format!("Error: No such network: {id}\n"),
                    }),
                }
            }
            ["docker", "network", "rm", id] => match state.networks.remove(*id) {
                Some(_) => ok(format!("{id}\n")),
                None => failed(&format!("Error: No such network: {id}")),
            },
            _ => failed(&format!("docker: unknown command {line:?}")),
        }
    }
}

fn ok(stdout: String) -> Result<CommandOutput, ExecError> {
    Ok(CommandOutput {
        stdout: stdout.into_bytes(),
        stderr: Vec::new(),
    })
}

fn failed(stderr: &str) -> Result<CommandOutput, ExecError> {
    Err(ExecError::CommandFailed {
        exit_code: 1,
        stdout: Vec::new(),
        stderr: format!("{stderr}\n"),
    })
}

#[async_trait]
impl RemoteExecutor for FakeDockerHost {
    async fn open(&self, connection: &ConnectionConfig) -> Result<Box<dyn RemoteSession>, ExecError> {
        let mut state = self.state();
        match state.fault {
            Some(Fault::OpenSession) => Err(ExecError::Session {
                host: connection.host_address.clone(),
                reason: "Permission denied (publickey)".to_string(),
            }),
            Some(Fault::OpenAsCommandFailure) => Err(ExecError::CommandFailed {
                exit_code: 1,
                stdout: Vec::new(),
                stderr: "Error: No such network".to_string(),
            }),
            _ => {
                state.opened += 1;
                Ok(Box::new(FakeSession { host: self.clone() }))
            }
        }
    }
}

struct FakeSession {
    host: FakeDockerHost,
}

#[async_trait]
impl RemoteSession for FakeSession {
    async fn run(&mut self, line: &str) -> Result<CommandOutput, ExecError> {
        self.host.execute(line)
    }

    async fn close(self: Box<Self>) -> Result<(), ExecError> {
        let mut state = self.host.state();
        state.closed += 1;
        if state.fault == Some(Fault::CloseSession) {
            return Err(ExecError::Session {
                host: "fake".to_string(),
                reason: "control master did not exit".to_string(),
            });
        }
        Ok(())
    }
}

pub fn network_config(name: &str) -> NetworkConfig {
    let connection =
        ConnectionConfig::new("10.0.0.5", SecretString::from("PRIVATE KEY".to_string()));
    NetworkConfig::new(name, connection)
}

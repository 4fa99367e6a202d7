//! Remote executor traits

use async_trait::async_trait;

use crate::ssh::error::Result;
use crate::types::ConnectionConfig;

/// Captured output of a command that exited successfully
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Opens authenticated sessions on remote hosts
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    async fn open(&self, connection: &ConnectionConfig) -> Result<Box<dyn RemoteSession>>;
}

/// A session that runs one command line at a time.
///
/// Sessions must be released with [`RemoteSession::close`].
#[async_trait]
pub trait RemoteSession: Send {
    async fn run(&mut self, line: &str) -> Result<CommandOutput>;

    async fn close(self: Box<Self>) -> Result<()>;
}

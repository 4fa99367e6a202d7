pub mod client;
pub mod error;
pub mod session;

pub use client::{SshExecutor, SshExecutorConfig, SshSession};
pub use error::*;
pub use session::{CommandOutput, RemoteExecutor, RemoteSession};

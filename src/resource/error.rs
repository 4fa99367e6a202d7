use thiserror::Error;

use crate::ssh::ExecError;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Session with {host} failed: {reason}")]
    Session { host: String, reason: String },

    #[error("Transport failure while running `{command}`: {reason}: {stderr}")]
    Transport {
        command: String,
        reason: String,
        stderr: String,
    },

    #[error("Command `{command}` exited with status {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Inconsistent result from `{command}`: {reason}")]
    Consistency { command: String, reason: String },

    #[error("{operation} is not supported, the resource must be replaced")]
    UnsupportedOperation { operation: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceErrorKind {
    Session,
    Transport,
    CommandFailed,
    Consistency,
    UnsupportedOperation,
}

impl ResourceError {
    pub fn kind(&self) -> ResourceErrorKind {
        match self {
            ResourceError::Session { .. } => ResourceErrorKind::Session,
            ResourceError::Transport { .. } => ResourceErrorKind::Transport,
            ResourceError::CommandFailed { .. } => ResourceErrorKind::CommandFailed,
            ResourceError::Consistency { .. } => ResourceErrorKind::Consistency,
            ResourceError::UnsupportedOperation { .. } => ResourceErrorKind::UnsupportedOperation,
        }
    }

    /// Attaches the attempted command line to an executor failure
    pub fn from_exec(command: &str, err: ExecError) -> Self {
        match err {
            ExecError::Session { host, reason } => ResourceError::Session { host, reason },
            ExecError::Transport { reason, stderr } => ResourceError::Transport {
                command: command.to_string(),
                reason,
                stderr,
            },
            ExecError::CommandFailed {
                exit_code, stderr, ..
            } => ResourceError::CommandFailed {
                command: command.to_string(),
                exit_code,
                stderr,
            },
        }
    }

    pub fn consistency(command: &str, reason: impl Into<String>) -> Self {
        ResourceError::Consistency {
            command: command.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ResourceError>;

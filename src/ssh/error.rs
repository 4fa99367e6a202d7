use thiserror::Error;

/// Failure reported by a remote executor.
///
/// Callers branch on [`ExecError::kind`], never on the rendered message.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Session with {host} failed: {reason}")]
    Session { host: String, reason: String },

    #[error("Transport failure: {reason}")]
    Transport { reason: String, stderr: String },

    #[error("Command exited with status {exit_code}")]
    CommandFailed {
        exit_code: i32,
        stdout: Vec<u8>,
        stderr: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecErrorKind {
    /// The session could not be opened or closed
    Session,
    /// The command could not be attempted or its outcome is unknown
    Transport,
    /// The remote tool ran and exited non-zero
    CommandFailed,
}

impl ExecError {
    pub fn kind(&self) -> ExecErrorKind {
        match self {
            ExecError::Session { .. } => ExecErrorKind::Session,
            ExecError::Transport { .. } => ExecErrorKind::Transport,
            ExecError::CommandFailed { .. } => ExecErrorKind::CommandFailed,
        }
    }

    /// True only when the remote tool itself ran and reported failure.
    pub fn is_command_execution(&self) -> bool {
        self.kind() == ExecErrorKind::CommandFailed
    }

    /// Captured standard error, empty when nothing was captured
    pub fn stderr(&self) -> &str {
        match self {
            ExecError::Session { .. } => "",
            ExecError::Transport { stderr, .. } | ExecError::CommandFailed { stderr, .. } => stderr,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_nonzero_exit_is_command_execution() {
        let failed = ExecError::CommandFailed {
            exit_code: 1,
            stdout: b"[]".to_vec(),
            stderr: "Error: No such network: abc".to_string(),
        };
        assert!(failed.is_command_execution());
        assert_eq!(failed.stderr(), "Error: No such network: abc");

        let transport = ExecError::Transport {
            reason: "connection reset".to_string(),
            stderr: "No such network".to_string(),
        };
        assert!(!transport.is_command_execution());
        assert_eq!(transport.kind(), ExecErrorKind::Transport);

        let session = ExecError::Session {
            host: "10.0.0.5".to_string(),
            reason: "permission denied".to_string(),
        };
        assert!(!session.is_command_execution());
        assert_eq!(session.stderr(), "");
    }
}

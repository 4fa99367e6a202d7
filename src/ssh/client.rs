//! Remote executor backed by the OpenSSH client.
//!
//! Each session runs a ControlMaster in the background so that every command
//! reuses one authenticated connection. The private key and the control socket
//! live in a private temporary directory that is removed with the session.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::ssh::error::{ExecError, Result};
use crate::ssh::session::{CommandOutput, RemoteExecutor, RemoteSession};
use crate::types::ConnectionConfig;

/// Exit status the ssh client uses for its own failures
const SSH_CLIENT_FAILURE: i32 = 255;

#[derive(Debug, Clone)]
pub struct SshExecutorConfig {
    /// ssh client to run
    pub program: PathBuf,
    /// Arguments placed before the ssh options, for wrappers such as `sshpass -e ssh`
    pub program_args: Vec<String>,
    pub port: u16,
    pub connect_timeout: Duration,
    /// Upper bound on a single remote command. `None` waits indefinitely.
    pub command_timeout: Option<Duration>,
    pub strict_host_key_checking: bool,
}

impl Default for SshExecutorConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ssh"),
            program_args: Vec::new(),
            port: 22,
            connect_timeout: Duration::from_secs(10),
            command_timeout: None,
            strict_host_key_checking: false,
        }
    }
}

pub struct SshExecutor {
    config: SshExecutorConfig,
}

impl Default for SshExecutor {
    fn default() -> Self {
        Self::new(SshExecutorConfig::default())
    }
}

impl SshExecutor {
    pub fn new(config: SshExecutorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SshExecutorConfig {
        &self.config
    }
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    async fn open(&self, connection: &ConnectionConfig) -> Result<Box<dyn RemoteSession>> {
        let host = connection.host_address.clone();
        let session_error = |reason: String| ExecError::Session {
            host: host.clone(),
            reason,
        };

        let workdir = tempfile::Builder::new()
            .prefix("linuxbox-")
            .tempdir()
            .map_err(|e| session_error(format!("Failed to create session directory: {e}")))?;

        let key_path = workdir.path().join("id");
        write_private_key(&key_path, connection.ssh_key.expose_secret())
            .map_err(|e| session_error(format!("Failed to write private key: {e}")))?;

        // The master forks into the background once authenticated and keeps
        // inherited pipes open, so its diagnostics go to a file instead.
        let log_path = workdir.path().join("master.log");
        let log = File::create(&log_path)
            .map_err(|e| session_error(format!("Failed to create ssh log: {e}")))?;

        // Marked closed until a master is actually running.
        let mut session = SshSession {
            config: self.config.clone(),
            host: host.clone(),
            user: connection.ssh_user.clone(),
            key_path,
            control_path: workdir.path().join("ctl"),
            workdir: Some(workdir),
            closed: true,
        };

        debug!("Opening SSH session to {}", connection.destination());

        let status = Command::new(&session.config.program)
            .args(session.args(&["-M", "-f", "-N", "-o", "ControlPersist=yes"]))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(log))
            .status()
            .await
            .map_err(|e| session_error(format!("Failed to execute ssh: {e}")))?;

        if !status.success() {
            let stderr = std::fs::read_to_string(&log_path).unwrap_or_default();
            return Err(session_error(format!(
                "ssh exited with {status}: {}",
                stderr.trim()
            )));
        }

        session.closed = false;
        debug!("SSH session to {} established", connection.destination());
        Ok(Box::new(session))
    }
}

pub struct SshSession {
    config: SshExecutorConfig,
    host: String,
    user: String,
    key_path: PathBuf,
    control_path: PathBuf,
    /// Holds the key and control socket, removed on drop
    workdir: Option<TempDir>,
    closed: bool,
}

impl SshSession {
    /// Full argument list for one ssh invocation, ending with the host.
    ///
    /// The host follows `--` and the user is the value of `-l`, so neither
    /// is ever parsed as an option.
    fn args(&self, extra: &[&str]) -> Vec<String> {
        let mut args = self.config.program_args.clone();
        args.extend([
            "-S".to_string(),
            self.control_path.display().to_string(),
            "-i".to_string(),
            self.key_path.display().to_string(),
            "-p".to_string(),
            self.config.port.to_string(),
            "-l".to_string(),
            self.user.clone(),
        ]);

        for option in self.options() {
            args.push("-o".to_string());
            args.push(option);
        }

        args.extend(extra.iter().map(|s| s.to_string()));
        args.push("--".to_string());
        args.push(self.host.clone());
        args
    }

    fn options(&self) -> Vec<String> {
        let mut options = vec![
            "IdentitiesOnly=yes".to_string(),
            "BatchMode=yes".to_string(),
            format!("ConnectTimeout={}", self.config.connect_timeout.as_secs()),
        ];

        if self.config.strict_host_key_checking {
            options.push("StrictHostKeyChecking=yes".to_string());
        } else {
            options.push("StrictHostKeyChecking=no".to_string());
            options.push("UserKnownHostsFile=/dev/null".to_string());
        }

        options
    }

    fn transport(reason: String) -> ExecError {
        ExecError::Transport {
            reason,
            stderr: String::new(),
        }
    }
}

#[async_trait]
impl RemoteSession for SshSession {
    async fn run(&mut self, line: &str) -> Result<CommandOutput> {
        debug!("Executing command on {}: {}", self.host, line);

        let mut cmd = Command::new(&self.config.program);
        cmd.args(self.args(&["-o", "ControlMaster=no"]))
            .arg(line)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match self.config.command_timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| {
                    Self::transport(format!("Command timed out after {}s", limit.as_secs()))
                })?,
            None => cmd.output().await,
        }
        .map_err(|e| Self::transport(format!("Failed to execute ssh: {e}")))?;

        classify_output(output)
    }

    async fn close(mut self: Box<Self>) -> Result<()> {
        debug!("Closing SSH session to {}", self.host);
        self.closed = true;

        let output = Command::new(&self.config.program)
            .args(self.args(&["-O", "exit"]))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ExecError::Session {
                host: self.host.clone(),
                reason: format!("Failed to execute ssh: {e}"),
            })?;

        if !output.status.success() {
            return Err(ExecError::Session {
                host: self.host.clone(),
                reason: format!(
                    "Failed to stop control master: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(())
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }

        warn!(
            "SSH session to {} dropped without close, stopping control master",
            self.host
        );

        let program = self.config.program.clone();
        let args = self.args(&["-O", "exit"]);
        // The control socket lives in the workdir, so it is removed only
        // after the master has been asked to exit.
        let workdir = self.workdir.take();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let _ = Command::new(&program)
                        .args(&args)
                        .stdin(Stdio::null())
                        .stdout(Stdio::null())
                        .stderr(Stdio::null())
                        .status()
                        .await;
                    drop(workdir);
                });
            }
            Err(_) => {
                let _ = std::process::Command::new(&program)
                    .args(&args)
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status();
            }
        }
    }
}

/// Maps an ssh client exit status onto the executor's error kinds.
///
/// Status 255 is reserved by the client for its own failures. A remote
/// command that itself exits 255 is therefore reported as a transport
/// failure, never as a command failure.
fn classify_output(output: Output) -> Result<CommandOutput> {
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    match output.status.code() {
        Some(0) => Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
        }),
        Some(SSH_CLIENT_FAILURE) => Err(ExecError::Transport {
            reason: format!("ssh exited with status {SSH_CLIENT_FAILURE}"),
            stderr,
        }),
        Some(exit_code) => Err(ExecError::CommandFailed {
            exit_code,
            stdout: output.stdout,
            stderr,
        }),
        None => Err(ExecError::Transport {
            reason: "ssh was terminated by a signal".to_string(),
            stderr,
        }),
    }
}

fn write_private_key(path: &Path, key: &str) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(key.as_bytes())?;
    // OpenSSH refuses keys without a final newline
    if !key.ends_with('\n') {
        file.write_all(b"\n")?;
    }

    Ok(())
}

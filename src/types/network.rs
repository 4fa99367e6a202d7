use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// User the SSH session logs in as when none is configured
pub const DEFAULT_SSH_USER: &str = "root";

/// Parameters for reaching the host that owns the network.
///
/// These parameterize the remote session only; they never form part of the
/// network's identity.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub host_address: String,
    pub ssh_user: String,
    pub ssh_key: SecretString,
}

impl ConnectionConfig {
    /// Builds a connection for `host_address` logging in as [`DEFAULT_SSH_USER`].
    pub fn new(host_address: impl Into<String>, ssh_key: SecretString) -> Self {
        Self {
            host_address: host_address.into(),
            ssh_user: DEFAULT_SSH_USER.to_string(),
            ssh_key,
        }
    }

    pub fn with_user(mut self, ssh_user: impl Into<String>) -> Self {
        self.ssh_user = ssh_user.into();
        self
    }

    /// `user@host` destination as handed to the ssh client
    pub fn destination(&self) -> String {
        format!("{}@{}", self.ssh_user, self.host_address)
    }
}

/// Desired configuration of a managed network
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub name: String,
    pub connection: ConnectionConfig,
}

impl NetworkConfig {
    pub fn new(name: impl Into<String>, connection: ConnectionConfig) -> Self {
        Self {
            name: name.into(),
            connection,
        }
    }
}

/// Identity assigned to a network by the remote host when it was created
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(String);

impl NetworkId {
    /// Wraps a non-empty identity. Returns `None` for an empty string.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attributes of a network as last read from the remote host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedNetwork {
    pub id: NetworkId,
    pub name: String,
}

impl ObservedNetwork {
    /// Compares the observed attributes with the desired configuration.
    ///
    /// Drift is only reported. Nothing here attempts to repair it.
    pub fn drift_from(&self, desired: &NetworkConfig) -> Option<Drift> {
        if self.name == desired.name {
            return None;
        }

        Some(Drift {
            field: "name",
            desired: desired.name.clone(),
            observed: self.name.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Drift {
    pub field: &'static str,
    pub desired: String,
    pub observed: String,
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} drifted: desired {:?}, observed {:?}",
            self.field, self.desired, self.observed
        )
    }
}

/// Result of reading a resource back from the remote host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome<T = ObservedNetwork> {
    Found(T),
    /// The remote tool no longer knows the identity. The caller should clear it.
    NotFound,
}

impl<T> ReadOutcome<T> {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReadOutcome::NotFound)
    }
}

impl ReadOutcome<ObservedNetwork> {
    pub fn into_record(self) -> ResourceRecord {
        match self {
            ReadOutcome::Found(observed) => ResourceRecord {
                id: Some(observed.id),
                name: Some(observed.name),
            },
            ReadOutcome::NotFound => ResourceRecord::default(),
        }
    }
}

/// What the caller persists between lifecycle calls.
///
/// An empty `id` means the network is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub id: Option<NetworkId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

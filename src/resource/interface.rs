//! Resource lifecycle interface

use async_trait::async_trait;

use crate::resource::error::Result;
use crate::types::ReadOutcome;

/// Lifecycle of one remotely hosted object.
///
/// Implementations hold no state between calls. The caller stores the identity
/// returned by `create` and hands it back to every later operation.
#[async_trait]
pub trait ManagedResource: Send + Sync {
    /// Desired configuration, including how to reach the host
    type Config: Send + Sync;
    /// Identity assigned by the remote host
    type Id: Send + Sync;
    /// Attributes read back from the remote host
    type Observed: Send;

    /// Resource type name (e.g., "docker_network")
    fn resource_type(&self) -> &'static str;

    /// Creates the object. Not idempotent: every call creates a new object.
    async fn create(&self, desired: &Self::Config) -> Result<Self::Id>;

    /// Reads the object back, reporting `NotFound` when the remote tool no
    /// longer knows the identity
    async fn read(
        &self,
        desired: &Self::Config,
        id: &Self::Id,
    ) -> Result<ReadOutcome<Self::Observed>>;

    /// Changes the object in place
    async fn update(&self, desired: &Self::Config, id: &Self::Id) -> Result<()>;

    /// Removes the object. Absence is reported as an error, never smoothed over.
    async fn delete(&self, desired: &Self::Config, id: &Self::Id) -> Result<()>;
}

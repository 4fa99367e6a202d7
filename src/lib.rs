//! Linuxbox - Lifecycle controller for remotely hosted docker networks
//!
//! This crate creates, reads and removes docker networks on remote hosts by
//! running docker commands over SSH. Callers persist the identity returned by
//! `create` and hand it back to every later operation.

pub mod config;
pub mod resource;
pub mod ssh;
pub mod types;

pub use resource::{ManagedResource, NetworkController, ResourceError};
pub use ssh::{SshExecutor, SshExecutorConfig};
pub use types::*;

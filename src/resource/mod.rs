pub mod command;
pub mod error;
pub mod interface;
pub mod network;
pub mod schema;

pub use error::*;
pub use interface::ManagedResource;
pub use network::NetworkController;
pub use schema::{Attributes, FieldSpec, ResourceSchema, SchemaError, NETWORK_SCHEMA};

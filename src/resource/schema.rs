//! Declared configuration surface of the network resource.
//!
//! Orchestrators speak in loosely typed attribute maps. Conversion to and from
//! the typed configuration happens here and nowhere else.

use secrecy::SecretString;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

use crate::types::{ConnectionConfig, NetworkConfig, ObservedNetwork, DEFAULT_SSH_USER};

/// Attribute map as exchanged with an orchestrator
pub type Attributes = HashMap<String, Value>;

const REDACTED: &str = "(sensitive)";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Field {field} must be a {expected}")]
    InvalidType {
        field: String,
        expected: &'static str,
    },

    #[error("Field {field} must not be empty")]
    EmptyField { field: String },

    #[error("Unknown field: {field}")]
    UnknownField { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
}

impl FieldType {
    fn name(self) -> &'static str {
        match self {
            FieldType::String => "string",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    pub default: Option<&'static str>,
    /// Never logged or echoed back
    pub sensitive: bool,
    /// A change to this field can only be applied by replacing the resource
    pub force_new: bool,
    pub description: &'static str,
}

impl FieldSpec {
    /// True when moving from `old` to `new` needs a replacement
    pub fn requires_replacement(&self, old: Option<&Value>, new: Option<&Value>) -> bool {
        self.force_new && old != new
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceSchema {
    pub resource_type: &'static str,
    pub fields: &'static [FieldSpec],
}

pub const NETWORK_SCHEMA: ResourceSchema = ResourceSchema {
    resource_type: "docker_network",
    fields: &[
        FieldSpec {
            name: "name",
            field_type: FieldType::String,
            required: true,
            default: None,
            sensitive: false,
            force_new: true,
            description: "Name of the docker network",
        },
        FieldSpec {
            name: "host_address",
            field_type: FieldType::String,
            required: true,
            default: None,
            sensitive: false,
            force_new: true,
            description: "Address of the host running docker",
        },
        FieldSpec {
            name: "ssh_user",
            field_type: FieldType::String,
            required: false,
            default: Some(DEFAULT_SSH_USER),
            sensitive: false,
            force_new: false,
            description: "User to log in as",
        },
        FieldSpec {
            name: "ssh_key",
            field_type: FieldType::String,
            required: true,
            default: None,
            sensitive: true,
            force_new: false,
            description: "Private key used to authenticate",
        },
    ],
};

impl ResourceSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Checks field names, types and presence. `null` counts as absent.
    pub fn validate(&self, attrs: &Attributes) -> Result<(), SchemaError> {
        if let Some(unknown) = attrs.keys().find(|key| self.field(key).is_none()) {
            return Err(SchemaError::UnknownField {
                field: unknown.clone(),
            });
        }

        for spec in self.fields {
            match attrs.get(spec.name).filter(|v| !v.is_null()) {
                None if spec.required => {
                    return Err(SchemaError::MissingField {
                        field: spec.name.to_string(),
                    });
                }
                None => {}
                Some(value) if !spec.field_type.accepts(value) => {
                    return Err(SchemaError::InvalidType {
                        field: spec.name.to_string(),
                        expected: spec.field_type.name(),
                    });
                }
                Some(value) if value.as_str() == Some("") => {
                    return Err(SchemaError::EmptyField {
                        field: spec.name.to_string(),
                    });
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Force-new fields whose values differ between two attribute maps
    pub fn replacement_fields(&self, old: &Attributes, new: &Attributes) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|spec| spec.requires_replacement(old.get(spec.name), new.get(spec.name)))
            .map(|spec| spec.name)
            .collect()
    }

    /// Copy of `attrs` that is safe to log or print
    pub fn redact(&self, attrs: &Attributes) -> Attributes {
        attrs
            .iter()
            .map(|(key, value)| {
                let sensitive = self.field(key).is_some_and(|spec| spec.sensitive);
                let value = if sensitive {
                    Value::String(REDACTED.to_string())
                } else {
                    value.clone()
                };
                (key.clone(), value)
            })
            .collect()
    }
}

fn string_attr(attrs: &Attributes, field: &str) -> Option<String> {
    attrs
        .get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

impl NetworkConfig {
    /// Builds the typed configuration from a validated attribute map.
    /// Defaults are applied here, at construction.
    pub fn from_attributes(attrs: &Attributes) -> Result<Self, SchemaError> {
        NETWORK_SCHEMA.validate(attrs)?;

        let required = |field: &str| {
            string_attr(attrs, field).ok_or_else(|| SchemaError::MissingField {
                field: field.to_string(),
            })
        };

        let mut connection = ConnectionConfig::new(
            required("host_address")?,
            SecretString::from(required("ssh_key")?),
        );
        if let Some(user) = string_attr(attrs, "ssh_user") {
            connection = connection.with_user(user);
        }

        Ok(NetworkConfig::new(required("name")?, connection))
    }
}

impl ObservedNetwork {
    pub fn to_attributes(&self) -> Attributes {
        HashMap::from([
            ("id".to_string(), Value::String(self.id.to_string())),
            ("name".to_string(), Value::String(self.name.clone())),
        ])
    }
}

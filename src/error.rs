//! # Error Types
//!
//! Structured errors for the connector registry. Runtime registry and tracker
//! operations are total; these types describe configuration problems and the
//! per-candidate failures that collaborators report to the tracker, which logs
//! and absorbs them.

use thiserror::Error;

/// Errors surfaced to whoever assembles the registry
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// A module's declared implementations could not be read
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscoveryError {
    #[error("Resource {path} unreadable in module {module}: {reason}")]
    ResourceUnreadable {
        module: String,
        path: String,
        reason: String,
    },

    #[error("Resource {path} in module {module} is not valid UTF-8")]
    InvalidEncoding { module: String, path: String },
}

/// A single declared implementation could not be turned into an instance
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InstantiationError {
    #[error("Malformed implementation name: {class_name}")]
    MalformedName { class_name: String },

    #[error("Implementation {class_name} not found in module {module}")]
    ClassNotFound { module: String, class_name: String },

    #[error("Implementation {class_name} does not provide {interface}")]
    IncompatibleType {
        class_name: String,
        interface: String,
    },

    #[error("Construction of {class_name} failed: {reason}")]
    ConstructionFailed { class_name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, RegistryError>;

impl From<::config::ConfigError> for RegistryError {
    fn from(err: ::config::ConfigError) -> Self {
        RegistryError::Configuration(err.to_string())
    }
}

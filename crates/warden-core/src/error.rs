//! Error types for descriptor construction and marshalling.

use thiserror::Error;

/// Boxed error returned by [`crate::MarshalHook`] implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while building descriptors or marshalling a value.
#[derive(Error, Debug)]
pub enum WardenError {
    /// Static field metadata is malformed (e.g. an unparseable `since` bound).
    /// This is a programming mistake and is reported when the type's
    /// descriptor is first built.
    #[error("invalid field metadata on {type_name}.{field}: {message}")]
    Configuration {
        type_name: String,
        field: String,
        message: String,
    },

    /// A shared pointer was re-entered while it was still being rendered.
    #[error("cyclic reference detected at {path}")]
    CyclicGraph { path: String },

    /// The walker met a value it cannot express as an output node.
    #[error("unsupported value at {path}: {reason}")]
    UnsupportedValue { path: String, reason: String },

    /// A post-processing hook reported failure.
    #[error("marshal hook for {type_name} failed at {path}: {source}")]
    Hook {
        type_name: String,
        path: String,
        #[source]
        source: BoxError,
    },

    /// A version string could not be parsed.
    #[error("invalid version: {0:?}")]
    InvalidVersion(String),

    /// JSON parse or serialization failure (schema files, string output).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading a schema file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WardenError {
    pub(crate) fn configuration(
        type_name: &str,
        field: &str,
        message: impl Into<String>,
    ) -> Self {
        WardenError::Configuration {
            type_name: type_name.to_string(),
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout warden-core.
pub type Result<T> = std::result::Result<T, WardenError>;

//! Error types for the configuration tree.
//!
//! Most misuse is rejected at compile time by the generated node types, so
//! the runtime taxonomy is small: JSON conversion at a path and an invalid
//! [`TreeConfig`](crate::config::TreeConfig).

use thiserror::Error;

use crate::config::validation::ValidationError;
use crate::tree::Path;

/// Runtime errors surfaced by the `try_*` accessors and store constructors.
#[derive(Debug, Error)]
pub enum TreeError {
    /// A typed value could not be converted into the tree representation.
    #[error("failed to encode value for `{path}`: {source}")]
    Encode {
        path: Path,
        #[source]
        source: serde_json::Error,
    },

    /// The value encodes, but not to something that reads back as itself.
    /// Non-finite floats and explicit nulls end up here.
    #[error("value for `{path}` does not survive encoding (non-finite float or null)")]
    Unrepresentable { path: Path },

    /// The value stored at a path does not decode as the node's type.
    #[error("value at `{path}` does not match its schema type: {source}")]
    Decode {
        path: Path,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid tree configuration: {}", join_errors(.0))]
    InvalidConfig(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T, E = TreeError> = std::result::Result<T, E>;

//! Error types for API loading, model traversal and class generation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading API descriptions or generating classes.
///
/// Configuration errors (`ApiNotFound`, `DuplicateService`, `NotADirectory`)
/// are raised before any traversal starts. Unsupported-model errors
/// (`ShapeNotFound`, `UnexpectedPhpType`, nameless models) abort the run at
/// the point of encounter. `ShapeOutsideOperation` guards a traversal
/// invariant and is unreachable for well-formed input.
#[derive(Debug, Error)]
pub enum GenError {
    #[error("API does not exist '{name}' at version '{version}'")]
    ApiNotFound { name: String, version: String },

    #[error("Service '{name}' already added")]
    DuplicateService { name: String },

    #[error("Shape not found: '{name}'")]
    ShapeNotFound { name: String },

    #[error("Unexpected php type: {tag}")]
    UnexpectedPhpType { tag: String },

    #[error("Cannot register shape from outside operation context")]
    ShapeOutsideOperation,

    #[error("Service has no 'namespace' or 'targetPrefix' metadata")]
    UnresolvedServiceName,

    #[error("Shape has no name")]
    NamelessShape,

    #[error("Operation '{operation}' {slot} resolves to a {kind}, not a structure")]
    NotAStructure {
        operation: String,
        slot: &'static str,
        kind: String,
    },

    #[error("No class mapping for shape '{name}'")]
    UnmappableShape { name: String },

    #[error("Invalid api document '{}': {source}", path.display())]
    InvalidApi {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a directory: '{}'", path.display())]
    NotADirectory { path: PathBuf },
}

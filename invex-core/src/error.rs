//! Error types for invex-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::metadata::CompressedIndex;

/// Result type alias using [`MetadataError`].
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Errors raised by the metadata store and artifact resolution.
///
/// All variants propagate unrecovered to the command boundary; nothing in
/// the core retries or falls back to a default artifact.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// No persisted metadata document at the expected location.
    #[error("could not locate metadata file: {}", path.display())]
    NotFound { path: PathBuf },

    /// Lookup against an alias that was never registered.
    #[error("alias does not exist: {alias}")]
    AliasNotFound { alias: String },

    /// Attempt to register an alias that already exists. Registration is
    /// not idempotent; a collision is always an error, never an overwrite.
    #[error("alias already exists: {alias}")]
    AliasAlreadyExists { alias: String },

    /// Lookup against a document ordering that does not exist.
    #[error("ordering does not exist: {ordering}")]
    OrderingNotFound { ordering: String },

    /// An alias's logical spec matches no recorded compressed index file.
    #[error("could not resolve compressed index file for alias '{alias}' with {spec}")]
    IndexResolution { alias: String, spec: CompressedIndex },

    /// An alias's logical spec matches no recorded wand data file.
    #[error("could not resolve wand data file for alias '{alias}' with {spec}")]
    WandDataResolution { alias: String, spec: CompressedIndex },

    /// I/O failure reading or writing the metadata document.
    #[error("metadata I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed metadata document.
    #[error("malformed metadata document: {0}")]
    Json(#[from] serde_json::Error),
}

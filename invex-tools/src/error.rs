//! Error types for invex-tools.

use std::path::PathBuf;

use thiserror::Error;

use invex_core::MetadataError;

use crate::runner::ToolError;

/// Result type alias using [`ToolsError`].
pub type Result<T> = std::result::Result<T, ToolsError>;

/// Errors raised while ingesting sources, building artifacts, or running
/// queries. Propagated unrecovered to the command boundary.
#[derive(Error, Debug)]
pub enum ToolsError {
    /// Metadata store failure (unknown alias, duplicate alias, ...).
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// An external tool failed; always fatal for the current command.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The output directory already exists and `--force` was not given.
    #[error("index dir already exists ({}), use --force to overwrite", path.display())]
    OutputDirExists { path: PathBuf },

    /// Malformed or incomplete build specification.
    #[error("invalid build specification: {0}")]
    InvalidSpec(String),

    /// Filesystem failure outside the metadata document itself.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

//! Core data model for invex index workspaces.
//!
//! An index workspace is described by a single persisted metadata document
//! (see [`CollectionMetadata`]) that records, per document ordering:
//!
//! - **logical indexes** — what the user asked for, keyed by alias,
//! - **physical compressed index files** — what has actually been built,
//! - **physical wand data files** — the auxiliary max-score structures
//!   used by dynamic-pruning query algorithms.
//!
//! Aliases never point at files directly. Whenever a physical artifact is
//! needed, it is resolved from the logical spec's structural parameters
//! (see [`DocumentOrdering::resolve_compressed`] and
//! [`DocumentOrdering::resolve_wdata`]), so artifacts built by earlier
//! invocations are transparently reusable.

pub mod block;
pub mod error;
pub mod metadata;
pub mod naming;
mod resolve;
pub mod scorer;

pub use block::Block;
pub use error::{MetadataError, Result};
pub use metadata::{
    Analyzer, CollectionMetadata, CompressedIndex, CompressedIndexFile, DocumentOrdering,
    UncompressedIndex, WandData,
};
pub use scorer::Scorer;

/// File name of the persisted metadata document, relative to the workdir.
pub const METADATA_FILE: &str = "metadata.json";

/// Name of the document ordering created by every ingestion source.
pub const DEFAULT_ORDERING: &str = "default";

//! Block-partitioning variants for wand data.

use serde::{Deserialize, Serialize};

/// How postings are partitioned into blocks when precomputing per-block
/// score upper bounds.
///
/// Serialized untagged; the two variants are distinguished by their field
/// name (`size` vs `lambda`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Block {
    /// Fixed-size skip-list blocks.
    Fixed { size: u64 },
    /// Variable-size blocks computed with the given lambda parameter.
    Variable { lambda: f64 },
}

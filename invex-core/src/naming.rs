//! Deterministic default paths for physical artifacts.
//!
//! When the caller does not supply an explicit path, physical artifact
//! records are named from exactly the fields that participate in their
//! structural identity. Fields excluded from identity (the scorer of an
//! unquantized compressed file) never appear in the path, so two
//! build-equivalent requests always map to the same file name.
//!
//! These functions are pure; they never touch storage.

use std::path::PathBuf;

use crate::block::Block;
use crate::scorer::Scorer;

/// Default path of a compressed index file.
///
/// `inv:<encoding>[:<scorer>][:quantization=<bits>]`. The scorer segment
/// is present only when a scorer is recorded on the file, which by
/// construction happens only for quantized files.
pub fn compressed_file_path(
    encoding: &str,
    quantization: Option<u32>,
    scorer: Option<&Scorer>,
) -> PathBuf {
    let mut name = format!("inv:{encoding}");
    if let Some(scorer) = scorer {
        name.push(':');
        name.push_str(&scorer_fragment(scorer));
    }
    if let Some(bits) = quantization {
        name.push_str(&format!(":quantization={bits}"));
    }
    PathBuf::from(name)
}

/// Default path of a wand data file.
///
/// `wdata:<block>:<scorer>[:quantization=<bits>]`. Wand data is always
/// scorer-dependent, so the scorer segment is always present.
pub fn wand_data_path(block: &Block, quantization: Option<u32>, scorer: &Scorer) -> PathBuf {
    let mut name = format!("wdata:{}:{}", block_fragment(block), scorer_fragment(scorer));
    if let Some(bits) = quantization {
        name.push_str(&format!(":quantization={bits}"));
    }
    PathBuf::from(name)
}

/// Path fragment identifying a block-partitioning choice.
pub fn block_fragment(block: &Block) -> String {
    match block {
        Block::Fixed { size } => format!("size={size}"),
        Block::Variable { lambda } => format!("lambda={lambda}"),
    }
}

/// Path fragment identifying a scorer and all of its parameters.
pub fn scorer_fragment(scorer: &Scorer) -> String {
    match scorer {
        Scorer::Bm25 { k1, b } => format!("bm25:b={b}:k1={k1}"),
        Scorer::Pl2 { c } => format!("pl2:c={c}"),
        Scorer::Qld { mu } => format!("qld:mu={mu}"),
        Scorer::Dph => "dph".to_string(),
        Scorer::Passthrough => "passthrough".to_string(),
    }
}

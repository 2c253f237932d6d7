//! Structural resolution of physical artifacts.
//!
//! These predicates are the whole space-saving policy: an unquantized
//! compressed file is reusable across every scorer once built, while wand
//! data is always scorer-specific because the recorded upper bounds are
//! values of the scoring function.
//!
//! Matching is an explicit equivalence per artifact type, not derived
//! equality over whole records: the scorer field of a compressed file
//! participates in identity only when the file is quantized.

use crate::metadata::{CompressedIndex, CompressedIndexFile, DocumentOrdering, WandData};

impl DocumentOrdering {
    /// Find a built compressed index file satisfying `index`.
    ///
    /// A candidate matches when the encoding and quantization are equal
    /// and, for quantized candidates only, the scorer is equal as well.
    /// The first match in recorded order wins; `None` means a build is
    /// required (absence is not an error at this layer).
    pub fn resolve_compressed(&self, index: &CompressedIndex) -> Option<&CompressedIndexFile> {
        self.compressed_index_files.iter().find(|candidate| {
            if candidate.encoding != index.encoding {
                return false;
            }
            if candidate.quantization != index.quantization {
                return false;
            }
            match candidate.quantization {
                None => candidate.scorer.is_none(),
                Some(_) => candidate.scorer == index.scorer,
            }
        })
    }

    /// Find a built wand data file satisfying `index`.
    ///
    /// Block, quantization, and scorer must all be equal. The first match
    /// in recorded order wins.
    pub fn resolve_wdata(&self, index: &CompressedIndex) -> Option<&WandData> {
        self.wand_data_files.iter().find(|candidate| {
            index.block.as_ref() == Some(&candidate.block)
                && candidate.quantization == index.quantization
                && index.scorer.as_ref() == Some(&candidate.scorer)
        })
    }
}

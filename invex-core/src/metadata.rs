//! The persisted metadata document for an index workspace.
//!
//! One JSON document (`metadata.json`) lives at the workspace root. It is
//! loaded at the start of a command, mutated in place by build operations,
//! and persisted exactly once when the command succeeds. All paths inside
//! the document are relative to [`CollectionMetadata::workdir`].

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::error::{MetadataError, Result};
use crate::naming;
use crate::scorer::Scorer;
use crate::METADATA_FILE;

/// Text analysis configuration used when the collection was parsed.
///
/// Carried for reproducibility only; it never participates in artifact
/// resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analyzer {
    #[serde(default = "Analyzer::default_tokenizer")]
    pub tokenizer: String,
    #[serde(default = "Analyzer::default_strip_html")]
    pub strip_html: bool,
    #[serde(default = "Analyzer::default_token_filters")]
    pub token_filters: Vec<String>,
}

impl Analyzer {
    fn default_tokenizer() -> String {
        "english".to_string()
    }

    fn default_strip_html() -> bool {
        true
    }

    fn default_token_filters() -> Vec<String> {
        vec!["lowercase".to_string(), "porter2".to_string()]
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Analyzer {
            tokenizer: Self::default_tokenizer(),
            strip_html: Self::default_strip_html(),
            token_filters: Self::default_token_filters(),
        }
    }
}

/// Paths to the files comprising an uncompressed inverted index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncompressedIndex {
    pub documents: PathBuf,
    pub values: PathBuf,
    pub sizes: PathBuf,
}

/// A declared logical index: what the user asked for under one alias.
///
/// Logical indexes are never resolved to files at registration time;
/// physical artifacts are found from these structural parameters whenever
/// a file is actually needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressedIndex {
    pub encoding: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantization: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scorer: Option<Scorer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<Block>,
}

impl fmt::Display for CompressedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "encoding={}", self.encoding)?;
        if let Some(bits) = self.quantization {
            write!(f, " quantization={bits}")?;
        }
        if let Some(scorer) = &self.scorer {
            write!(f, " scorer={}", naming::scorer_fragment(scorer))?;
        }
        if let Some(block) = &self.block {
            write!(f, " block={}", naming::block_fragment(block))?;
        }
        Ok(())
    }
}

/// A built compressed index file.
///
/// The scorer field is populated only when the file is quantized: an
/// unquantized compressed structure does not depend on the scoring
/// function, so its identity is (encoding, quantization=None) alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressedIndexFile {
    pub path: PathBuf,
    pub encoding: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantization: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scorer: Option<Scorer>,
}

impl CompressedIndexFile {
    /// Construct a record, deriving the path from the identity fields when
    /// the caller does not supply one. The path is immutable afterwards.
    pub fn new(
        encoding: impl Into<String>,
        quantization: Option<u32>,
        scorer: Option<Scorer>,
        path: Option<PathBuf>,
    ) -> Self {
        let encoding = encoding.into();
        let path = path
            .unwrap_or_else(|| naming::compressed_file_path(&encoding, quantization, scorer.as_ref()));
        CompressedIndexFile {
            path,
            encoding,
            quantization,
            scorer,
        }
    }
}

/// A built wand data file: per-block score upper bounds for one scorer.
///
/// Always scorer-dependent, since the upper bounds are values of the
/// scoring function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WandData {
    pub path: PathBuf,
    pub block: Block,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantization: Option<u32>,
    pub scorer: Scorer,
}

impl WandData {
    /// Construct a record, deriving the path from the identity fields when
    /// the caller does not supply one. The path is immutable afterwards.
    pub fn new(
        block: Block,
        quantization: Option<u32>,
        scorer: Scorer,
        path: Option<PathBuf>,
    ) -> Self {
        let path =
            path.unwrap_or_else(|| naming::wand_data_path(&block, quantization, &scorer));
        WandData {
            path,
            block,
            quantization,
            scorer,
        }
    }
}

/// One permutation of the document ID space and everything built over it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentOrdering {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_lexicon: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncompressed_index: Option<UncompressedIndex>,
    /// Logical indexes keyed by alias.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub compressed_indexes: BTreeMap<String, CompressedIndex>,
    /// Built compressed index files, in build order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compressed_index_files: Vec<CompressedIndexFile>,
    /// Built wand data files, in build order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wand_data_files: Vec<WandData>,
}

impl DocumentOrdering {
    /// Register a logical index under `alias`.
    ///
    /// Fails with [`MetadataError::AliasAlreadyExists`] when the alias is
    /// taken; an existing registration is never overwritten.
    pub fn add_alias(&mut self, alias: impl Into<String>, index: CompressedIndex) -> Result<()> {
        let alias = alias.into();
        if self.compressed_indexes.contains_key(&alias) {
            return Err(MetadataError::AliasAlreadyExists { alias });
        }
        self.compressed_indexes.insert(alias, index);
        Ok(())
    }

    /// Look up the logical index registered under `alias`.
    pub fn get_by_alias(&self, alias: &str) -> Result<&CompressedIndex> {
        self.compressed_indexes
            .get(alias)
            .ok_or_else(|| MetadataError::AliasNotFound {
                alias: alias.to_string(),
            })
    }

    /// Record a newly built compressed index file.
    pub fn add_compressed_index_file(&mut self, file: CompressedIndexFile) {
        self.compressed_index_files.push(file);
    }

    /// Record a newly built wand data file.
    pub fn add_wand_data_file(&mut self, wdata: WandData) {
        self.wand_data_files.push(wdata);
    }
}

/// Root of the persisted document: one fully indexed collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionMetadata {
    /// Workspace directory; all other paths are relative to it.
    pub workdir: PathBuf,
    #[serde(default)]
    pub analyzer: Analyzer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_index: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_lexicon: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub orderings: BTreeMap<String, DocumentOrdering>,
}

impl CollectionMetadata {
    /// Load the metadata document from `workdir`.
    pub fn load(workdir: &Path) -> Result<Self> {
        let path = workdir.join(METADATA_FILE);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MetadataError::NotFound { path });
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&contents)?)
    }

    /// Persist the document to `<workdir>/metadata.json`, replacing any
    /// previous version wholesale.
    pub fn dump(&self) -> Result<()> {
        let path = self.workdir.join(METADATA_FILE);
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Look up a document ordering by name.
    pub fn ordering(&self, name: &str) -> Result<&DocumentOrdering> {
        self.orderings
            .get(name)
            .ok_or_else(|| MetadataError::OrderingNotFound {
                ordering: name.to_string(),
            })
    }

    /// Look up a document ordering by name, mutably.
    pub fn ordering_mut(&mut self, name: &str) -> Result<&mut DocumentOrdering> {
        self.orderings
            .get_mut(name)
            .ok_or_else(|| MetadataError::OrderingNotFound {
                ordering: name.to_string(),
            })
    }
}

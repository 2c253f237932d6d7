//! Index construction sources.

use std::path::PathBuf;

use invex_core::Analyzer;

/// Document format accepted by the collection parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFormat {
    Jsonl,
    Plaintext,
    Trectext,
    Trecweb,
    Warc,
}

impl ParseFormat {
    /// Wire value passed to the parsing tool's `--format` flag.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseFormat::Jsonl => "jsonl",
            ParseFormat::Plaintext => "plaintext",
            ParseFormat::Trectext => "trectext",
            ParseFormat::Trecweb => "trecweb",
            ParseFormat::Warc => "warc",
        }
    }
}

/// Where the collection to index comes from.
///
/// Each variant produces a fresh workspace with an uncompressed inverted
/// index before any compression runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// A CIFF (common index file format) export.
    Ciff { input: PathBuf },
    /// Documents piped to standard input.
    Stdin {
        format: ParseFormat,
        analyzer: Analyzer,
    },
    /// A collection exported by the `ir-datasets` tool.
    IrDatasets {
        name: String,
        content_fields: Vec<String>,
        analyzer: Analyzer,
    },
}

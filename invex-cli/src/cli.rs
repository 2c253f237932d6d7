use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use invex_core::{Analyzer, Block, Scorer};
use invex_tools::{ParseFormat, Source};

#[derive(Parser)]
#[command(name = "invex", about = "Manage compressed inverted-index workspaces", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log each executed tool command
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Directory containing the external index tools
    #[arg(long = "bin", global = true, env = "INVEX_BIN")]
    pub bin_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a new index workspace from a source collection
    Index {
        #[command(subcommand)]
        source: SourceCommand,
    },

    /// Add another compressed index to an existing workspace
    AddIndex {
        /// Workspace directory
        #[arg(short = 'w', long, default_value = ".")]
        workdir: PathBuf,

        /// Document ordering to build against
        #[arg(long, default_value = "default")]
        ordering: String,

        /// Compressed index alias
        #[arg(long)]
        alias: String,

        #[command(flatten)]
        compression: CompressionArgs,
    },

    /// Run queries against a compressed index
    Query {
        /// Workspace directory
        #[arg(short = 'w', long, default_value = ".")]
        workdir: PathBuf,

        /// Document ordering to query
        #[arg(long, default_value = "default")]
        ordering: String,

        /// Compressed index alias
        #[arg(long, default_value = "default")]
        alias: String,

        /// Number of results to retrieve
        #[arg(short, default_value_t = 10)]
        k: usize,

        /// Retrieval algorithm
        #[arg(long, value_enum, default_value = "block_max_wand")]
        algorithm: Algorithm,

        /// Measure retrieval time instead of printing results
        #[arg(long)]
        benchmark: bool,

        /// Add weight to repeated query terms
        #[arg(long)]
        weighted: bool,

        /// File with one query per line
        #[arg(long)]
        queries: PathBuf,
    },

    /// Inspect persisted workspace metadata
    Meta {
        /// Workspace directory
        #[arg(short = 'w', long, default_value = ".")]
        workdir: PathBuf,

        #[command(subcommand)]
        action: MetaAction,
    },
}

#[derive(Subcommand)]
pub enum SourceCommand {
    /// Build an index from a CIFF export
    Ciff {
        /// Input CIFF file
        #[arg(short = 'i', long)]
        input: PathBuf,

        #[command(flatten)]
        build: BuildArgs,
    },

    /// Build an index from documents on standard input
    Stdin {
        /// Input document format
        #[arg(long, value_enum)]
        format: FormatArg,

        #[command(flatten)]
        build: BuildArgs,

        #[command(flatten)]
        analyzer: AnalyzerArgs,
    },

    /// Build an index from an ir-datasets collection
    IrDatasets {
        /// Dataset name, e.g. wikir/en1k
        name: String,

        /// Document fields to index as content
        #[arg(long, num_args = 1.., default_value = "content")]
        content_fields: Vec<String>,

        #[command(flatten)]
        build: BuildArgs,

        #[command(flatten)]
        analyzer: AnalyzerArgs,
    },
}

impl SourceCommand {
    /// Split the parsed command into the ingestion source and the build
    /// parameters shared by every source.
    pub fn into_parts(self) -> (Source, BuildArgs) {
        match self {
            SourceCommand::Ciff { input, build } => (Source::Ciff { input }, build),
            SourceCommand::Stdin {
                format,
                build,
                analyzer,
            } => (
                Source::Stdin {
                    format: format.into(),
                    analyzer: analyzer.to_analyzer(),
                },
                build,
            ),
            SourceCommand::IrDatasets {
                name,
                content_fields,
                build,
                analyzer,
            } => (
                Source::IrDatasets {
                    name,
                    content_fields,
                    analyzer: analyzer.to_analyzer(),
                },
                build,
            ),
        }
    }
}

/// Arguments shared by every `index` source.
#[derive(Args)]
pub struct BuildArgs {
    /// Output workspace directory
    #[arg(short = 'o', long)]
    pub output: PathBuf,

    /// Proceed even if the output dir exists
    #[arg(short = 'f', long)]
    pub force: bool,

    /// Compressed index alias
    #[arg(long, default_value = "default")]
    pub alias: String,

    #[command(flatten)]
    pub compression: CompressionArgs,
}

/// Structural parameters of the requested compressed index.
#[derive(Args)]
pub struct CompressionArgs {
    /// Compressed index encoding
    #[arg(long, default_value = "block_simdbp")]
    pub encoding: String,

    /// Scoring function
    #[arg(long, value_enum, default_value = "bm25")]
    pub scorer: ScorerArg,

    /// Skip-list block size
    #[arg(long, default_value_t = 64, conflicts_with = "lambda")]
    pub block_size: u64,

    /// Parameter for variable block computation
    #[arg(long)]
    pub lambda: Option<f64>,

    /// Quantize scores using this many bits
    #[arg(long)]
    pub quantize: Option<u32>,
}

impl CompressionArgs {
    pub fn scorer(&self) -> Scorer {
        self.scorer.into()
    }

    pub fn block(&self) -> Block {
        match self.lambda {
            Some(lambda) => Block::Variable { lambda },
            None => Block::Fixed {
                size: self.block_size,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScorerArg {
    Bm25,
    Pl2,
    Qld,
    Dph,
    Passthrough,
}

impl From<ScorerArg> for Scorer {
    fn from(arg: ScorerArg) -> Scorer {
        match arg {
            ScorerArg::Bm25 => Scorer::Bm25 { k1: 0.9, b: 0.4 },
            ScorerArg::Pl2 => Scorer::Pl2 { c: 1.0 },
            ScorerArg::Qld => Scorer::Qld { mu: 1000.0 },
            ScorerArg::Dph => Scorer::Dph,
            ScorerArg::Passthrough => Scorer::Passthrough,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Jsonl,
    Plaintext,
    Trectext,
    Trecweb,
    Warc,
}

impl From<FormatArg> for ParseFormat {
    fn from(arg: FormatArg) -> ParseFormat {
        match arg {
            FormatArg::Jsonl => ParseFormat::Jsonl,
            FormatArg::Plaintext => ParseFormat::Plaintext,
            FormatArg::Trectext => ParseFormat::Trectext,
            FormatArg::Trecweb => ParseFormat::Trecweb,
            FormatArg::Warc => ParseFormat::Warc,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum Algorithm {
    Or,
    And,
    RankedOr,
    RankedAnd,
    Wand,
    BlockMaxWand,
    Maxscore,
}

impl Algorithm {
    /// Wire value passed to the query tool's `--algorithm` flag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Or => "or",
            Algorithm::And => "and",
            Algorithm::RankedOr => "ranked_or",
            Algorithm::RankedAnd => "ranked_and",
            Algorithm::Wand => "wand",
            Algorithm::BlockMaxWand => "block_max_wand",
            Algorithm::Maxscore => "maxscore",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TokenizerArg {
    English,
    Whitespace,
}

impl TokenizerArg {
    fn as_str(&self) -> &'static str {
        match self {
            TokenizerArg::English => "english",
            TokenizerArg::Whitespace => "whitespace",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TokenFilterArg {
    Lowercase,
    Porter2,
    Krovetz,
}

impl TokenFilterArg {
    fn as_str(&self) -> &'static str {
        match self {
            TokenFilterArg::Lowercase => "lowercase",
            TokenFilterArg::Porter2 => "porter2",
            TokenFilterArg::Krovetz => "krovetz",
        }
    }
}

/// Text-analysis flags for parsing sources.
#[derive(Args)]
pub struct AnalyzerArgs {
    /// Tokenizer
    #[arg(long, value_enum, default_value = "english")]
    pub tokenizer: TokenizerArg,

    /// Token filters applied in order
    #[arg(
        short = 'F',
        long = "token-filters",
        value_enum,
        num_args = 1..,
        default_values = ["lowercase", "porter2"]
    )]
    pub token_filters: Vec<TokenFilterArg>,

    /// Strip HTML
    #[arg(short = 'H', long)]
    pub strip_html: bool,
}

impl AnalyzerArgs {
    pub fn to_analyzer(&self) -> Analyzer {
        Analyzer {
            tokenizer: self.tokenizer.as_str().to_string(),
            strip_html: self.strip_html,
            token_filters: self
                .token_filters
                .iter()
                .map(|filter| filter.as_str().to_string())
                .collect(),
        }
    }
}

#[derive(Subcommand)]
pub enum MetaAction {
    /// Print the entire metadata document
    Print,

    /// List compressed index aliases
    Aliases,

    /// Show one alias's logical spec and resolved artifacts
    Alias {
        alias: String,

        /// Document ordering to resolve against
        #[arg(long, default_value = "default")]
        ordering: String,
    },
}

//! External tool wrappers and build orchestration.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use invex_core::{
    Analyzer, Block, CollectionMetadata, CompressedIndex, CompressedIndexFile, DocumentOrdering,
    MetadataError, Scorer, UncompressedIndex, WandData, DEFAULT_ORDERING,
};

use crate::error::{Result, ToolsError};
use crate::runner::{render_command, Invoker, Subprocess, ToolError};
use crate::source::Source;

/// Options for running a query batch.
#[derive(Debug, Clone)]
pub struct QueryOpts {
    /// Number of results to retrieve per query.
    pub k: usize,
    /// Retrieval algorithm name passed to the query tool.
    pub algorithm: String,
    /// Use the benchmarking tool instead of result evaluation.
    pub benchmark: bool,
    /// Weight repeated query terms.
    pub weighted: bool,
}

/// Handle to the external index tools.
///
/// Tool executables are resolved inside `bin_dir` when one is configured,
/// otherwise looked up on `PATH`.
pub struct Toolbox {
    bin_dir: Option<PathBuf>,
    invoker: Box<dyn Invoker>,
}

impl Toolbox {
    pub fn new(bin_dir: Option<PathBuf>) -> Self {
        Self::with_invoker(bin_dir, Box::new(Subprocess))
    }

    /// Construct with a custom [`Invoker`]; used by tests to observe
    /// invocations without spawning processes.
    pub fn with_invoker(bin_dir: Option<PathBuf>, invoker: Box<dyn Invoker>) -> Self {
        Toolbox { bin_dir, invoker }
    }

    fn tool(&self, name: &str) -> Command {
        match &self.bin_dir {
            Some(dir) => Command::new(dir.join(name)),
            None => Command::new(name),
        }
    }

    fn run(&self, mut cmd: Command) -> std::result::Result<(), ToolError> {
        self.invoker.invoke(&mut cmd)
    }

    /// Produce a fresh workspace with an uncompressed index from `source`.
    ///
    /// The output directory must already exist (see
    /// [`prepare_output_dir`]).
    pub fn ingest(&self, source: &Source, output_dir: &Path) -> Result<CollectionMetadata> {
        match source {
            Source::Ciff { input } => self.ciff_to_index(input, output_dir),
            Source::Stdin { format, analyzer } => {
                let mut meta = self.parse_collection(output_dir, analyzer, format.as_str(), None)?;
                self.invert_forward_index(&mut meta)?;
                Ok(meta)
            }
            Source::IrDatasets {
                name,
                content_fields,
                analyzer,
            } => {
                let mut meta =
                    self.parse_ir_datasets(name, content_fields, analyzer, output_dir)?;
                self.invert_forward_index(&mut meta)?;
                Ok(meta)
            }
        }
    }

    /// Convert a CIFF export into an uncompressed index plus lexicons.
    pub fn ciff_to_index(&self, ciff_file: &Path, output_dir: &Path) -> Result<CollectionMetadata> {
        let mut convert = self.tool("ciff2inv");
        convert
            .arg("--ciff-file")
            .arg(ciff_file)
            .arg("--output")
            .arg(output_dir.join("ciff"));
        self.run(convert)?;

        for (input, output) in [("ciff.terms", "ciff.termlex"), ("ciff.documents", "ciff.doclex")]
        {
            let mut lexicon = self.tool("lexicon");
            lexicon
                .arg("build")
                .arg(output_dir.join(input))
                .arg(output_dir.join(output));
            self.run(lexicon)?;
        }

        Ok(CollectionMetadata {
            workdir: output_dir.to_path_buf(),
            analyzer: Analyzer::default(),
            forward_index: None,
            terms: Some(PathBuf::from("ciff.terms")),
            term_lexicon: Some(PathBuf::from("ciff.termlex")),
            orderings: BTreeMap::from([(
                DEFAULT_ORDERING.to_string(),
                DocumentOrdering {
                    documents: Some(PathBuf::from("ciff.documents")),
                    document_lexicon: Some(PathBuf::from("ciff.doclex")),
                    uncompressed_index: Some(UncompressedIndex {
                        documents: PathBuf::from("ciff.docs"),
                        values: PathBuf::from("ciff.freqs"),
                        sizes: PathBuf::from("ciff.sizes"),
                    }),
                    ..Default::default()
                },
            )]),
        })
    }

    /// Parse a collection into a forward index with supporting files.
    ///
    /// Reads the collection from `stdin` when one is supplied, otherwise
    /// from this process's inherited standard input.
    fn parse_collection(
        &self,
        output_dir: &Path,
        analyzer: &Analyzer,
        format: &str,
        stdin: Option<Stdio>,
    ) -> Result<CollectionMetadata> {
        let mut parse = self.tool("parse_collection");
        parse
            .arg("--format")
            .arg(format)
            .arg("--output")
            .arg(output_dir.join("fwd"))
            .arg("--tokenizer")
            .arg(&analyzer.tokenizer);
        if analyzer.strip_html {
            parse.arg("--html");
        }
        for filter in &analyzer.token_filters {
            parse.arg("-F").arg(filter);
        }
        if let Some(stdin) = stdin {
            parse.stdin(stdin);
        }
        self.run(parse)?;

        // The parser writes side outputs next to the forward index; move
        // them to their canonical names.
        for name in ["documents", "terms", "urls", "doclex", "termlex"] {
            fs::rename(
                output_dir.join(format!("fwd.{name}")),
                output_dir.join(name),
            )?;
        }

        Ok(CollectionMetadata {
            workdir: output_dir.to_path_buf(),
            analyzer: analyzer.clone(),
            forward_index: Some(PathBuf::from("fwd")),
            terms: Some(PathBuf::from("terms")),
            term_lexicon: Some(PathBuf::from("termlex")),
            orderings: BTreeMap::from([(
                DEFAULT_ORDERING.to_string(),
                DocumentOrdering {
                    documents: Some(PathBuf::from("documents")),
                    document_lexicon: Some(PathBuf::from("doclex")),
                    urls: Some(PathBuf::from("urls")),
                    ..Default::default()
                },
            )]),
        })
    }

    /// Export a collection with the `ir-datasets` tool and parse it.
    pub fn parse_ir_datasets(
        &self,
        name: &str,
        content_fields: &[String],
        analyzer: &Analyzer,
        output_dir: &Path,
    ) -> Result<CollectionMetadata> {
        let mut export = self.tool("ir-datasets");
        export.arg(name).arg("--content-fields").args(content_fields);
        export.stdout(Stdio::piped());

        let command = render_command(&export);
        info!(command = %command, "running tool");
        let mut child = export.spawn().map_err(|source| ToolError::Spawn {
            command: command.clone(),
            source,
        })?;
        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                return Err(ToolError::Failed { command }.into());
            }
        };

        let meta =
            self.parse_collection(output_dir, analyzer, "jsonl", Some(Stdio::from(stdout)))?;

        let status = child.wait().map_err(|source| ToolError::Spawn {
            command: command.clone(),
            source,
        })?;
        if !status.success() {
            return Err(ToolError::Failed { command }.into());
        }
        Ok(meta)
    }

    /// Invert the forward index into an uncompressed inverted index.
    pub fn invert_forward_index(&self, meta: &mut CollectionMetadata) -> Result<()> {
        let forward_index = meta
            .forward_index
            .clone()
            .ok_or_else(|| ToolsError::InvalidSpec("no forward index recorded".to_string()))?;
        let term_count = self.count_terms(meta)?;

        let mut invert = self.tool("invert");
        invert
            .arg("--input")
            .arg(meta.workdir.join(forward_index))
            .arg("--output")
            .arg(meta.workdir.join("inv"))
            .arg("--term-count")
            .arg(term_count.to_string());
        self.run(invert)?;

        meta.ordering_mut(DEFAULT_ORDERING)?.uncompressed_index = Some(UncompressedIndex {
            documents: PathBuf::from("inv.docs"),
            values: PathBuf::from("inv.freqs"),
            sizes: PathBuf::from("inv.sizes"),
        });
        Ok(())
    }

    fn count_terms(&self, meta: &CollectionMetadata) -> Result<usize> {
        let terms = meta.terms.as_ref().ok_or_else(|| {
            ToolsError::InvalidSpec("cannot count terms because terms file does not exist".to_string())
        })?;
        let contents = fs::read_to_string(meta.workdir.join(terms))?;
        Ok(contents.lines().filter(|line| !line.trim().is_empty()).count())
    }

    /// Ensure a compressed index exists for `alias`.
    ///
    /// Registers the logical spec under the alias, then builds only what
    /// no structurally equivalent record already satisfies. An
    /// unquantized index is scorer-independent, so one compressed file
    /// serves every scorer; its wand data is scorer-specific and is
    /// shared across encodings instead. Wand data is built before the
    /// compressed file because quantized compression bakes score
    /// quantiles derived from the wand data's upper bounds into the
    /// index.
    ///
    /// A tool failure aborts the operation before the corresponding
    /// record is appended, so the store never sees a half-built artifact.
    #[allow(clippy::too_many_arguments)]
    pub fn compress(
        &self,
        meta: &mut CollectionMetadata,
        ordering: &str,
        alias: &str,
        encoding: &str,
        scorer: Scorer,
        block: Block,
        quantization: Option<u32>,
    ) -> Result<()> {
        let workdir = meta.workdir.clone();
        let ordering_meta = meta.ordering_mut(ordering)?;
        let uncompressed = ordering_meta.uncompressed_index.clone().ok_or_else(|| {
            ToolsError::InvalidSpec(format!(
                "no uncompressed index recorded for ordering '{ordering}'"
            ))
        })?;
        let collection_base = uncompressed_base(&workdir, &uncompressed);

        let spec = CompressedIndex {
            encoding: encoding.to_string(),
            quantization,
            scorer: Some(scorer.clone()),
            block: Some(block.clone()),
        };
        ordering_meta.add_alias(alias, spec.clone())?;

        let wdata = match ordering_meta.resolve_wdata(&spec).cloned() {
            Some(found) => {
                debug!(path = %found.path.display(), "reusing wand data");
                found
            }
            None => {
                let wdata = WandData::new(block, quantization, scorer.clone(), None);
                self.create_wand_data(&workdir, &collection_base, &wdata)?;
                ordering_meta.add_wand_data_file(wdata.clone());
                wdata
            }
        };

        match ordering_meta.resolve_compressed(&spec).cloned() {
            Some(found) => {
                debug!(path = %found.path.display(), "reusing compressed index file");
            }
            None => {
                // An unquantized file does not depend on the scorer.
                let file = CompressedIndexFile::new(
                    encoding,
                    quantization,
                    quantization.map(|_| scorer),
                    None,
                );
                self.compress_index_file(&workdir, &collection_base, &file, &wdata)?;
                ordering_meta.add_compressed_index_file(file);
            }
        }

        Ok(())
    }

    fn create_wand_data(
        &self,
        workdir: &Path,
        collection_base: &str,
        wdata: &WandData,
    ) -> Result<()> {
        let mut cmd = self.tool("create_wand_data");
        cmd.arg("--collection")
            .arg(collection_base)
            .arg("--output")
            .arg(workdir.join(&wdata.path));
        cmd.args(scorer_args(&wdata.scorer));
        match &wdata.block {
            Block::Fixed { size } => {
                cmd.arg("--block-size").arg(size.to_string());
            }
            Block::Variable { lambda } => {
                cmd.arg("--lambda").arg(lambda.to_string());
            }
        }
        if let Some(bits) = wdata.quantization {
            cmd.arg("--quantize").arg(bits.to_string());
        }
        self.run(cmd)?;
        Ok(())
    }

    fn compress_index_file(
        &self,
        workdir: &Path,
        collection_base: &str,
        file: &CompressedIndexFile,
        wdata: &WandData,
    ) -> Result<()> {
        let mut cmd = self.tool("compress_inverted_index");
        cmd.arg("--collection")
            .arg(collection_base)
            .arg("--output")
            .arg(workdir.join(&file.path))
            .arg("--check")
            .arg("--encoding")
            .arg(&file.encoding);
        if let Some(bits) = file.quantization {
            let scorer = file.scorer.as_ref().ok_or_else(|| {
                ToolsError::InvalidSpec("quantized index file has no scorer recorded".to_string())
            })?;
            cmd.arg("--wand")
                .arg(workdir.join(&wdata.path))
                .arg("--quantize")
                .arg(bits.to_string())
                .arg("--scorer")
                .arg(scorer.name());
            match scorer {
                Scorer::Bm25 { k1, b } => {
                    cmd.arg("--bm25-b")
                        .arg(b.to_string())
                        .arg("--bm25-k1")
                        .arg(k1.to_string());
                }
                Scorer::Qld { mu } => {
                    cmd.arg("--qld-mu").arg(mu.to_string());
                }
                Scorer::Pl2 { c } => {
                    cmd.arg("--pl2-c").arg(c.to_string());
                }
                Scorer::Dph | Scorer::Passthrough => {}
            }
        }
        self.run(cmd)?;
        Ok(())
    }

    /// Resolve `alias` to its physical artifacts and run a query batch.
    ///
    /// Missing artifacts are reported as typed resolution errors naming
    /// the alias and spec; nothing is rebuilt implicitly.
    pub fn queries(
        &self,
        meta: &CollectionMetadata,
        ordering: &str,
        alias: &str,
        queries_file: &Path,
        opts: &QueryOpts,
    ) -> Result<()> {
        let ordering_meta = meta.ordering(ordering)?;
        let index = ordering_meta.get_by_alias(alias)?;

        let compressed = ordering_meta.resolve_compressed(index).ok_or_else(|| {
            MetadataError::IndexResolution {
                alias: alias.to_string(),
                spec: index.clone(),
            }
        })?;
        let wdata = ordering_meta.resolve_wdata(index).ok_or_else(|| {
            MetadataError::WandDataResolution {
                alias: alias.to_string(),
                spec: index.clone(),
            }
        })?;
        let scorer = index.scorer.as_ref().ok_or_else(|| {
            ToolsError::InvalidSpec(format!("no scorer recorded for alias '{alias}'"))
        })?;
        let term_lexicon = meta.term_lexicon.as_ref().ok_or_else(|| {
            ToolsError::InvalidSpec("no term lexicon recorded for this collection".to_string())
        })?;

        let mut cmd = if opts.benchmark {
            self.tool("queries")
        } else {
            self.tool("evaluate_queries")
        };
        cmd.arg("--encoding")
            .arg(&index.encoding)
            .arg("--index")
            .arg(meta.workdir.join(&compressed.path))
            .arg("--wand")
            .arg(meta.workdir.join(&wdata.path));
        cmd.args(scorer_args(scorer));
        cmd.arg("--terms").arg(meta.workdir.join(term_lexicon));
        if !opts.benchmark {
            let document_lexicon = ordering_meta.document_lexicon.as_ref().ok_or_else(|| {
                ToolsError::InvalidSpec(format!(
                    "no document lexicon recorded for ordering '{ordering}'"
                ))
            })?;
            cmd.arg("--documents").arg(meta.workdir.join(document_lexicon));
        }
        cmd.arg("-k")
            .arg(opts.k.to_string())
            .arg("--algorithm")
            .arg(&opts.algorithm)
            .arg("--queries")
            .arg(queries_file);
        if opts.weighted {
            cmd.arg("--weighted");
        }
        self.run(cmd)?;
        Ok(())
    }
}

/// Create the output directory for a fresh index build.
///
/// An existing directory is an error unless `force` is set.
pub fn prepare_output_dir(path: &Path, force: bool) -> Result<()> {
    match fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            if force {
                Ok(())
            } else {
                Err(ToolsError::OutputDirExists {
                    path: path.to_path_buf(),
                })
            }
        }
        Err(e) => Err(e.into()),
    }
}

/// Base path of the uncompressed index files, as expected by the tools'
/// `--collection` flag (the shared prefix without the `.docs` suffix).
fn uncompressed_base(workdir: &Path, uncompressed: &UncompressedIndex) -> String {
    let documents = workdir.join(&uncompressed.documents);
    let rendered = documents.to_string_lossy().into_owned();
    rendered
        .strip_suffix(".docs")
        .map(str::to_owned)
        .unwrap_or(rendered)
}

/// Scorer selection flags shared by the wand-building and query tools.
///
/// Passthrough postings carry precomputed scores, which the tools select
/// with the `quantized` scorer name.
fn scorer_args(scorer: &Scorer) -> Vec<String> {
    let mut args = vec!["--scorer".to_string(), scorer.name().to_string()];
    match scorer {
        Scorer::Bm25 { k1, b } => {
            args.extend([
                "--bm25-b".to_string(),
                b.to_string(),
                "--bm25-k1".to_string(),
                k1.to_string(),
            ]);
        }
        Scorer::Pl2 { c } => {
            args.extend(["--pl2-c".to_string(), c.to_string()]);
        }
        Scorer::Qld { mu } => {
            args.extend(["--qld-mu".to_string(), mu.to_string()]);
        }
        Scorer::Dph => {}
        Scorer::Passthrough => {
            args = vec!["--scorer".to_string(), "quantized".to_string()];
        }
    }
    args
}

//! Build-orchestration scenarios: minimal builds, maximal reuse, and the
//! exact argument lists handed to the external tools.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;
use std::rc::Rc;

use invex_core::{
    Block, CollectionMetadata, DocumentOrdering, MetadataError, Scorer, UncompressedIndex,
    DEFAULT_ORDERING,
};
use invex_tools::{Invoker, QueryOpts, ToolError, Toolbox, ToolsError};

/// Records every invocation instead of spawning processes.
#[derive(Clone, Default)]
struct Recording {
    calls: Rc<RefCell<Vec<Vec<String>>>>,
}

impl Recording {
    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    fn programs(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|argv| argv[0].clone()).collect()
    }
}

impl Invoker for Recording {
    fn invoke(&self, cmd: &mut Command) -> Result<(), ToolError> {
        let mut argv = vec![cmd.get_program().to_string_lossy().into_owned()];
        argv.extend(cmd.get_args().map(|arg| arg.to_string_lossy().into_owned()));
        self.calls.borrow_mut().push(argv);
        Ok(())
    }
}

/// Fails every invocation with a non-zero exit.
struct Failing;

impl Invoker for Failing {
    fn invoke(&self, cmd: &mut Command) -> Result<(), ToolError> {
        Err(ToolError::Failed {
            command: cmd.get_program().to_string_lossy().into_owned(),
        })
    }
}

fn toolbox() -> (Toolbox, Recording) {
    let recording = Recording::default();
    let toolbox = Toolbox::with_invoker(None, Box::new(recording.clone()));
    (toolbox, recording)
}

fn workspace() -> CollectionMetadata {
    CollectionMetadata {
        workdir: PathBuf::from("/work"),
        analyzer: Default::default(),
        forward_index: None,
        terms: Some(PathBuf::from("terms")),
        term_lexicon: Some(PathBuf::from("termlex")),
        orderings: BTreeMap::from([(
            DEFAULT_ORDERING.to_string(),
            DocumentOrdering {
                document_lexicon: Some(PathBuf::from("doclex")),
                uncompressed_index: Some(UncompressedIndex {
                    documents: PathBuf::from("inv.docs"),
                    values: PathBuf::from("inv.freqs"),
                    sizes: PathBuf::from("inv.sizes"),
                }),
                ..Default::default()
            },
        )]),
    }
}

fn bm25() -> Scorer {
    Scorer::Bm25 { k1: 0.9, b: 0.4 }
}

fn fixed64() -> Block {
    Block::Fixed { size: 64 }
}

#[test]
fn unquantized_index_is_shared_across_scorers() {
    let (toolbox, recording) = toolbox();
    let mut meta = workspace();

    toolbox
        .compress(&mut meta, "default", "bm25", "block_simdbp", bm25(), fixed64(), None)
        .unwrap();
    toolbox
        .compress(
            &mut meta,
            "default",
            "qld",
            "block_simdbp",
            Scorer::Qld { mu: 1000.0 },
            fixed64(),
            None,
        )
        .unwrap();

    let ordering = meta.ordering("default").unwrap();
    // One physical file serves both scorers; wand data is per scorer.
    assert_eq!(ordering.compressed_index_files.len(), 1);
    assert_eq!(ordering.wand_data_files.len(), 2);
    assert_eq!(
        recording.programs(),
        [
            "create_wand_data",
            "compress_inverted_index",
            "create_wand_data"
        ]
    );
}

#[test]
fn wand_data_is_shared_across_encodings() {
    let (toolbox, recording) = toolbox();
    let mut meta = workspace();

    toolbox
        .compress(&mut meta, "default", "default", "block_simdbp", bm25(), fixed64(), None)
        .unwrap();
    toolbox
        .compress(&mut meta, "default", "qmx", "block_qmx", bm25(), fixed64(), None)
        .unwrap();

    let ordering = meta.ordering("default").unwrap();
    assert_eq!(ordering.wand_data_files.len(), 1);
    assert_eq!(ordering.compressed_index_files.len(), 2);
    // The second build only compresses; the wand data is resolved.
    assert_eq!(
        recording.programs(),
        [
            "create_wand_data",
            "compress_inverted_index",
            "compress_inverted_index"
        ]
    );
}

#[test]
fn different_block_builds_new_wand_data_only() {
    let (toolbox, _) = toolbox();
    let mut meta = workspace();

    toolbox
        .compress(&mut meta, "default", "b64", "block_simdbp", bm25(), fixed64(), None)
        .unwrap();
    toolbox
        .compress(
            &mut meta,
            "default",
            "b128",
            "block_simdbp",
            bm25(),
            Block::Fixed { size: 128 },
            None,
        )
        .unwrap();

    let ordering = meta.ordering("default").unwrap();
    assert_eq!(ordering.wand_data_files.len(), 2);
    assert_eq!(ordering.compressed_index_files.len(), 1);
}

#[test]
fn quantized_indexes_are_scorer_specific() {
    let (toolbox, _) = toolbox();
    let mut meta = workspace();

    toolbox
        .compress(&mut meta, "default", "q8-bm25", "block_simdbp", bm25(), fixed64(), Some(8))
        .unwrap();
    toolbox
        .compress(
            &mut meta,
            "default",
            "q8-dph",
            "block_simdbp",
            Scorer::Dph,
            fixed64(),
            Some(8),
        )
        .unwrap();

    let ordering = meta.ordering("default").unwrap();
    assert_eq!(ordering.compressed_index_files.len(), 2);
    assert_eq!(ordering.wand_data_files.len(), 2);
}

#[test]
fn duplicate_alias_fails_without_building() {
    let (toolbox, recording) = toolbox();
    let mut meta = workspace();

    toolbox
        .compress(&mut meta, "default", "default", "block_simdbp", bm25(), fixed64(), None)
        .unwrap();
    let calls_before = recording.calls().len();

    let err = toolbox
        .compress(&mut meta, "default", "default", "block_qmx", bm25(), fixed64(), None)
        .unwrap_err();
    assert!(matches!(
        err,
        ToolsError::Metadata(MetadataError::AliasAlreadyExists { alias }) if alias == "default"
    ));
    assert_eq!(recording.calls().len(), calls_before);

    let ordering = meta.ordering("default").unwrap();
    assert_eq!(ordering.compressed_index_files.len(), 1);
    assert_eq!(ordering.wand_data_files.len(), 1);
    // The prior registration is untouched.
    assert_eq!(
        ordering.get_by_alias("default").unwrap().encoding,
        "block_simdbp"
    );
}

#[test]
fn unquantized_build_arguments() {
    let (toolbox, recording) = toolbox();
    let mut meta = workspace();

    toolbox
        .compress(&mut meta, "default", "default", "block_simdbp", bm25(), fixed64(), None)
        .unwrap();

    let calls = recording.calls();
    assert_eq!(
        calls[0],
        [
            "create_wand_data",
            "--collection",
            "/work/inv",
            "--output",
            "/work/wdata:size=64:bm25:b=0.4:k1=0.9",
            "--scorer",
            "bm25",
            "--bm25-b",
            "0.4",
            "--bm25-k1",
            "0.9",
            "--block-size",
            "64",
        ]
    );
    assert_eq!(
        calls[1],
        [
            "compress_inverted_index",
            "--collection",
            "/work/inv",
            "--output",
            "/work/inv:block_simdbp",
            "--check",
            "--encoding",
            "block_simdbp",
        ]
    );
}

#[test]
fn quantized_build_references_the_wand_data() {
    let (toolbox, recording) = toolbox();
    let mut meta = workspace();

    toolbox
        .compress(&mut meta, "default", "q8", "block_simdbp", bm25(), fixed64(), Some(8))
        .unwrap();

    let calls = recording.calls();
    // Wand data first: quantized compression reads its upper bounds.
    assert_eq!(calls[0][0], "create_wand_data");
    assert!(calls[0].ends_with(&["--quantize".to_string(), "8".to_string()]));
    assert_eq!(
        calls[1],
        [
            "compress_inverted_index",
            "--collection",
            "/work/inv",
            "--output",
            "/work/inv:block_simdbp:bm25:b=0.4:k1=0.9:quantization=8",
            "--check",
            "--encoding",
            "block_simdbp",
            "--wand",
            "/work/wdata:size=64:bm25:b=0.4:k1=0.9:quantization=8",
            "--quantize",
            "8",
            "--scorer",
            "bm25",
            "--bm25-b",
            "0.4",
            "--bm25-k1",
            "0.9",
        ]
    );
}

#[test]
fn variable_blocks_use_the_lambda_flag() {
    let (toolbox, recording) = toolbox();
    let mut meta = workspace();

    toolbox
        .compress(
            &mut meta,
            "default",
            "default",
            "block_simdbp",
            Scorer::Dph,
            Block::Variable { lambda: 2.1 },
            None,
        )
        .unwrap();

    let calls = recording.calls();
    assert_eq!(
        calls[0],
        [
            "create_wand_data",
            "--collection",
            "/work/inv",
            "--output",
            "/work/wdata:lambda=2.1:dph",
            "--scorer",
            "dph",
            "--lambda",
            "2.1",
        ]
    );
}

#[test]
fn tool_failure_leaves_no_record() {
    let toolbox = Toolbox::with_invoker(None, Box::new(Failing));
    let mut meta = workspace();

    let err = toolbox
        .compress(&mut meta, "default", "default", "block_simdbp", bm25(), fixed64(), None)
        .unwrap_err();
    assert!(matches!(err, ToolsError::Tool(ToolError::Failed { .. })));

    let ordering = meta.ordering("default").unwrap();
    assert!(ordering.wand_data_files.is_empty());
    assert!(ordering.compressed_index_files.is_empty());
}

#[test]
fn end_to_end_reuse_scenario() {
    let (toolbox, _) = toolbox();
    let mut meta = workspace();

    toolbox
        .compress(&mut meta, "default", "default", "block_simdbp", bm25(), fixed64(), None)
        .unwrap();
    toolbox
        .compress(&mut meta, "default", "qmx", "block_qmx", bm25(), fixed64(), None)
        .unwrap();
    toolbox
        .compress(&mut meta, "default", "q8", "block_simdbp", Scorer::Dph, fixed64(), Some(8))
        .unwrap();

    let ordering = meta.ordering("default").unwrap();
    let wand_paths: Vec<_> = ordering
        .wand_data_files
        .iter()
        .map(|w| w.path.to_string_lossy().into_owned())
        .collect();
    let index_paths: Vec<_> = ordering
        .compressed_index_files
        .iter()
        .map(|f| f.path.to_string_lossy().into_owned())
        .collect();

    // The BM25 wand data is shared between the two unquantized aliases;
    // the quantized DPH alias needs both a new wand file and a new
    // compressed file even though the encoding is already built.
    assert_eq!(
        wand_paths,
        [
            "wdata:size=64:bm25:b=0.4:k1=0.9",
            "wdata:size=64:dph:quantization=8",
        ]
    );
    assert_eq!(
        index_paths,
        [
            "inv:block_simdbp",
            "inv:block_qmx",
            "inv:block_simdbp:dph:quantization=8",
        ]
    );
}

#[test]
fn queries_resolve_both_physical_dependents() {
    let (toolbox, recording) = toolbox();
    let mut meta = workspace();

    toolbox
        .compress(&mut meta, "default", "default", "block_simdbp", bm25(), fixed64(), None)
        .unwrap();

    toolbox
        .queries(
            &meta,
            "default",
            "default",
            &PathBuf::from("/queries.txt"),
            &QueryOpts {
                k: 10,
                algorithm: "block_max_wand".to_string(),
                benchmark: false,
                weighted: false,
            },
        )
        .unwrap();

    let calls = recording.calls();
    let query_call = calls.last().unwrap();
    assert_eq!(
        query_call.as_slice(),
        [
            "evaluate_queries",
            "--encoding",
            "block_simdbp",
            "--index",
            "/work/inv:block_simdbp",
            "--wand",
            "/work/wdata:size=64:bm25:b=0.4:k1=0.9",
            "--scorer",
            "bm25",
            "--bm25-b",
            "0.4",
            "--bm25-k1",
            "0.9",
            "--terms",
            "/work/termlex",
            "--documents",
            "/work/doclex",
            "-k",
            "10",
            "--algorithm",
            "block_max_wand",
            "--queries",
            "/queries.txt",
        ]
    );
}

#[test]
fn benchmark_queries_use_the_benchmark_tool_without_documents() {
    let (toolbox, recording) = toolbox();
    let mut meta = workspace();

    toolbox
        .compress(&mut meta, "default", "default", "block_simdbp", bm25(), fixed64(), None)
        .unwrap();

    toolbox
        .queries(
            &meta,
            "default",
            "default",
            &PathBuf::from("/queries.txt"),
            &QueryOpts {
                k: 100,
                algorithm: "maxscore".to_string(),
                benchmark: true,
                weighted: true,
            },
        )
        .unwrap();

    let calls = recording.calls();
    let query_call = calls.last().unwrap();
    assert_eq!(query_call[0], "queries");
    assert!(!query_call.contains(&"--documents".to_string()));
    assert!(query_call.contains(&"--weighted".to_string()));
}

#[test]
fn missing_artifacts_fail_with_typed_resolution_errors() {
    let (toolbox, _) = toolbox();
    let mut meta = workspace();
    let opts = QueryOpts {
        k: 10,
        algorithm: "block_max_wand".to_string(),
        benchmark: false,
        weighted: false,
    };

    // Unknown alias.
    let err = toolbox
        .queries(&meta, "default", "missing", &PathBuf::from("/q"), &opts)
        .unwrap_err();
    assert!(matches!(
        err,
        ToolsError::Metadata(MetadataError::AliasNotFound { alias }) if alias == "missing"
    ));

    // Alias registered, but nothing built: the compressed file is
    // reported first.
    meta.ordering_mut("default")
        .unwrap()
        .add_alias(
            "declared",
            invex_core::CompressedIndex {
                encoding: "block_simdbp".to_string(),
                quantization: None,
                scorer: Some(bm25()),
                block: Some(fixed64()),
            },
        )
        .unwrap();
    let err = toolbox
        .queries(&meta, "default", "declared", &PathBuf::from("/q"), &opts)
        .unwrap_err();
    assert!(matches!(
        err,
        ToolsError::Metadata(MetadataError::IndexResolution { alias, .. }) if alias == "declared"
    ));

    // With the compressed file recorded but no wand data, the wand side
    // is reported.
    meta.ordering_mut("default")
        .unwrap()
        .add_compressed_index_file(invex_core::CompressedIndexFile::new(
            "block_simdbp",
            None,
            None,
            None,
        ));
    let err = toolbox
        .queries(&meta, "default", "declared", &PathBuf::from("/q"), &opts)
        .unwrap_err();
    assert!(matches!(
        err,
        ToolsError::Metadata(MetadataError::WandDataResolution { alias, .. }) if alias == "declared"
    ));
}

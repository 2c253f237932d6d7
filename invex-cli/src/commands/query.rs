use std::path::Path;

use invex_core::CollectionMetadata;
use invex_tools::{QueryOpts, Toolbox};

use crate::cli::Algorithm;
use crate::error::CliResult;

#[allow(clippy::too_many_arguments)]
pub fn run(
    toolbox: &Toolbox,
    workdir: &Path,
    ordering: &str,
    alias: &str,
    queries: &Path,
    k: usize,
    algorithm: Algorithm,
    benchmark: bool,
    weighted: bool,
) -> CliResult<()> {
    let meta = CollectionMetadata::load(workdir)?;
    toolbox.queries(
        &meta,
        ordering,
        alias,
        queries,
        &QueryOpts {
            k,
            algorithm: algorithm.as_str().to_string(),
            benchmark,
            weighted,
        },
    )?;
    Ok(())
}

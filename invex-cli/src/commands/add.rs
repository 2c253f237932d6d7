use std::path::Path;

use invex_core::CollectionMetadata;
use invex_tools::Toolbox;

use crate::cli::CompressionArgs;
use crate::error::CliResult;

pub fn run(
    toolbox: &Toolbox,
    workdir: &Path,
    ordering: &str,
    alias: &str,
    compression: &CompressionArgs,
) -> CliResult<()> {
    let mut meta = CollectionMetadata::load(workdir)?;
    toolbox.compress(
        &mut meta,
        ordering,
        alias,
        &compression.encoding,
        compression.scorer(),
        compression.block(),
        compression.quantize,
    )?;
    meta.dump()?;

    println!("Added index '{alias}'");
    Ok(())
}

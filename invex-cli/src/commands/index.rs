use invex_core::DEFAULT_ORDERING;
use invex_tools::{prepare_output_dir, Toolbox};

use crate::cli::SourceCommand;
use crate::error::CliResult;

pub fn run(toolbox: &Toolbox, source: SourceCommand) -> CliResult<()> {
    let (source, build) = source.into_parts();

    prepare_output_dir(&build.output, build.force)?;

    let mut meta = toolbox.ingest(&source, &build.output)?;
    toolbox.compress(
        &mut meta,
        DEFAULT_ORDERING,
        &build.alias,
        &build.compression.encoding,
        build.compression.scorer(),
        build.compression.block(),
        build.compression.quantize,
    )?;
    meta.dump()?;

    println!(
        "Indexed into {} (alias '{}')",
        build.output.display(),
        build.alias
    );
    Ok(())
}

use std::path::Path;

use comfy_table::{ContentArrangement, Table};

use invex_core::{naming, CollectionMetadata};

use crate::cli::MetaAction;
use crate::error::CliResult;

pub fn run(workdir: &Path, action: MetaAction) -> CliResult<()> {
    let meta = CollectionMetadata::load(workdir)?;

    match action {
        MetaAction::Print => {
            println!("{}", serde_json::to_string_pretty(&meta)?);
            Ok(())
        }
        MetaAction::Aliases => run_aliases(&meta),
        MetaAction::Alias { alias, ordering } => run_alias(&meta, &ordering, &alias),
    }
}

fn run_aliases(meta: &CollectionMetadata) -> CliResult<()> {
    let has_aliases = meta
        .orderings
        .values()
        .any(|ordering| !ordering.compressed_indexes.is_empty());
    if !has_aliases {
        println!("No aliases registered. Run 'invex add-index' to declare one.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "ORDERING", "ALIAS", "ENCODING", "QUANT", "SCORER", "BLOCK",
    ]);

    for (ordering_name, ordering) in &meta.orderings {
        for (alias, index) in &ordering.compressed_indexes {
            table.add_row(vec![
                ordering_name.clone(),
                alias.clone(),
                index.encoding.clone(),
                index
                    .quantization
                    .map_or_else(|| "-".to_string(), |bits| bits.to_string()),
                index
                    .scorer
                    .as_ref()
                    .map_or_else(|| "-".to_string(), naming::scorer_fragment),
                index
                    .block
                    .as_ref()
                    .map_or_else(|| "-".to_string(), naming::block_fragment),
            ]);
        }
    }

    println!("{table}");
    Ok(())
}

fn run_alias(meta: &CollectionMetadata, ordering_name: &str, alias: &str) -> CliResult<()> {
    let ordering = meta.ordering(ordering_name)?;
    let index = ordering.get_by_alias(alias)?;

    println!("{}", serde_json::to_string_pretty(index)?);

    // Resolution is re-run from the structural parameters, exactly as a
    // query would do it.
    match ordering.resolve_compressed(index) {
        Some(file) => println!("compressed file: {}", file.path.display()),
        None => println!("compressed file: (not built)"),
    }
    match ordering.resolve_wdata(index) {
        Some(wdata) => println!("wand data: {}", wdata.path.display()),
        None => println!("wand data: (not built)"),
    }
    Ok(())
}

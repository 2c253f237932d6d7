mod cli;
mod commands;
mod error;

use clap::Parser;
use invex_tools::Toolbox;

use cli::{Cli, Commands};
use error::exit_with_error;

fn init_tracing(cli: &Cli) {
    // Default is silent so tool output stays clean; --verbose shows each
    // executed command at info level, honouring RUST_LOG when set.
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    } else {
        tracing_subscriber::EnvFilter::new("off")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    init_tracing(&cli);

    if let Err(e) = run(cli) {
        exit_with_error(e);
    }
}

fn run(cli: Cli) -> error::CliResult<()> {
    let toolbox = Toolbox::new(cli.bin_dir);

    match cli.command {
        Commands::Index { source } => commands::index::run(&toolbox, source),

        Commands::AddIndex {
            workdir,
            ordering,
            alias,
            compression,
        } => commands::add::run(&toolbox, &workdir, &ordering, &alias, &compression),

        Commands::Query {
            workdir,
            ordering,
            alias,
            k,
            algorithm,
            benchmark,
            weighted,
            queries,
        } => commands::query::run(
            &toolbox, &workdir, &ordering, &alias, &queries, k, algorithm, benchmark, weighted,
        ),

        Commands::Meta { workdir, action } => commands::meta::run(&workdir, action),
    }
}

//! Peticiao CLI: the `peticiao` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    support::init_tracing();

    match cli.command {
        Commands::Localities { json } => commands::localities::run(&cli.source, json),

        Commands::Options {
            locality,
            competency,
            class,
            subject,
            json,
        } => commands::options::run(
            &cli.source,
            commands::options::Args {
                locality,
                competency,
                class,
                subject,
                json,
            },
        ),

        Commands::Errors {
            filter,
            competency,
            class,
            json,
        } => commands::errors::run(&cli.source, filter, competency, class, json),

        Commands::Divergences { json } => commands::divergences::run(&cli.source, json),

        Commands::Processes {
            from,
            to,
            page,
            limit,
            json,
        } => commands::processes::run(&cli.source, from, to, page, limit, json),

        Commands::Stats { system, json } => commands::stats::run(&cli.source, system, json),
    }
}

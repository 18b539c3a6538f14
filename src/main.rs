//! sempsync - Solace broker configuration mirroring
//!
//! Backs up a message VPN's SEMPv2 config tree onto a local file store,
//! replays stored trees against a (possibly different) broker or VPN, and
//! bulk-provisions queues from declarative input files.

use clap::Parser;

mod cli;
mod commands;
mod config;
mod crawler;
mod error;
mod provision;
mod replicator;
mod report;
mod semp;
mod store;
#[cfg(test)]
mod test_fixtures;

use cli::{Cli, Commands};

/// Map verbosity flags onto a tracing filter; `RUST_LOG` wins when set
fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "sempsync=info",
        1 => "sempsync=debug",
        _ => "sempsync=trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    // Logs go to stderr; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Broker-facing commands need a configuration file; version and
    // completions run without one
    let needs_config = matches!(
        cli.command,
        Commands::Backup(_) | Commands::Restore(_) | Commands::Provision(_)
    );
    if needs_config && cli.config.is_none() {
        eprintln!("Error: no configuration file; pass --config or set SEMPSYNC_CONFIG");
        std::process::exit(1);
    }
    let config_path = cli.config.clone().unwrap_or_default();

    let result = match cli.command {
        Commands::Backup(args) => commands::backup::run(&config_path, args),
        Commands::Restore(args) => commands::restore::run(&config_path, args),
        Commands::Provision(args) => commands::provision::run(&config_path, args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

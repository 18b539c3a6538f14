//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - backup: Backup command arguments
//! - restore: Restore command arguments
//! - provision: Provision command arguments
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

pub mod backup;
pub mod completions;
pub mod provision;
pub mod restore;

pub use backup::BackupArgs;
pub use completions::CompletionsArgs;
pub use provision::ProvisionArgs;
pub use restore::RestoreArgs;

/// sempsync - Solace broker configuration mirroring
///
/// Back up a message VPN's SEMPv2 config tree to local files, replay it
/// against another broker or VPN, and bulk-provision queues.
#[derive(Parser, Debug)]
#[command(
    name = "sempsync",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Backup, replicate and provision Solace PubSub+ broker configuration over SEMPv2",
    long_about = "sempsync mirrors the configuration state of a Solace PubSub+ message VPN onto \
                  a local file tree over SEMPv2 and can later replay that tree against a \
                  (possibly different) broker or VPN, applying rename, filtering and \
                  create/patch/delete policies along the way.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  sempsync backup -c config.yaml                    \x1b[90m# Export the configured VPN\x1b[0m\n   \
                  sempsync restore -c config.yaml --vpn staging     \x1b[90m# Replay into another VPN\x1b[0m\n   \
                  sempsync restore -c config.yaml --patch --item queues\n   \
                  sempsync provision -c config.yaml --input queues.yaml --patch\n\n\
                  "
)]
pub struct Cli {
    /// Configuration file with broker access and policy tables
    #[arg(long, short = 'c', global = true, env = "SEMPSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export a VPN's config tree into the local store
    Backup(BackupArgs),

    /// Replay a stored config tree against a target broker
    Restore(RestoreArgs),

    /// Bulk create or update queues from an input file
    Provision(ProvisionArgs),

    /// Show version information
    #[command(hide = true)]
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

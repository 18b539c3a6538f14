use clap::Parser;
use std::path::PathBuf;

/// Arguments for the provision command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Create queues from an input list:\n    sempsync provision -c config.yaml --input queues.yaml\n\n\
                   Create new and update existing queues:\n    sempsync provision -c config.yaml --input queues.yaml --patch")]
pub struct ProvisionArgs {
    /// YAML input file: a list of rows with queueName and property overrides
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,

    /// Update existing queues (disable, patch, re-enable; reconcile subscriptions)
    #[arg(long)]
    pub patch: bool,

    /// VPN to provision into (defaults to the first configured vpn.msgVpnNames entry)
    #[arg(long)]
    pub vpn: Option<String>,
}

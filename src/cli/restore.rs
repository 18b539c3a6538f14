use clap::Parser;
use std::path::PathBuf;

/// Arguments for the restore command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Recreate everything on the configured broker:\n    sempsync restore -c config.yaml\n\n\
                   Replay a backup of one VPN into another:\n    sempsync restore -c config.yaml --source-vpn prod --vpn staging\n\n\
                   Update existing queues in place:\n    sempsync restore -c config.yaml --patch --item queues\n\n\
                   Delete replicated queues (asks for confirmation):\n    sempsync restore -c config.yaml --delete --item queues")]
pub struct RestoreArgs {
    /// Target VPN (defaults to the first configured vpn.msgVpnNames entry)
    #[arg(long)]
    pub vpn: Option<String>,

    /// VPN name the tree was backed up from (defaults to the target VPN)
    #[arg(long, value_name = "NAME")]
    pub source_vpn: Option<String>,

    /// Store directory to replay (defaults to <outputDir>/<broker-host>/<source-vpn>)
    #[arg(long, value_name = "DIR")]
    pub from: Option<PathBuf>,

    /// Patch allow-listed object types instead of creating them
    #[arg(long, conflicts_with = "delete")]
    pub patch: bool,

    /// Delete allow-listed object types instead of creating them
    #[arg(long)]
    pub delete: bool,

    /// Restrict replication to these object types (repeatable)
    #[arg(long = "item", value_name = "TYPE")]
    pub items: Vec<String>,

    /// Skip the delete-mode confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

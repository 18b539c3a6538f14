use clap::Parser;
use std::path::PathBuf;

/// Arguments for the backup command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Back up the first configured VPN:\n    sempsync backup -c config.yaml\n\n\
                   Back up a specific VPN:\n    sempsync backup -c config.yaml --vpn prod-vpn\n\n\
                   Write the tree somewhere else:\n    sempsync backup -c config.yaml --out /tmp/broker-snapshot")]
pub struct BackupArgs {
    /// VPN to export (defaults to the first configured vpn.msgVpnNames entry)
    #[arg(long)]
    pub vpn: Option<String>,

    /// Store directory (defaults to <outputDir>/<broker-host>/<vpn>)
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

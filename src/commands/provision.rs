//! Provision command implementation
//!
//! Reads the queue definition list, splits off the dead-letter rows and
//! runs the provisioner: DMQs first, then the regular queues that may
//! reference them.

use std::path::Path;

use console::Style;

use crate::cli::ProvisionArgs;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::provision::{self, QueueProvisioner};
use crate::semp::SempClient;

/// Run the provision command
pub fn run(config_path: &Path, args: ProvisionArgs) -> Result<()> {
    let config = SyncConfig::load(config_path)?;
    let vpn = config.vpn_name(args.vpn.as_deref())?;
    let password = config.semp_password()?;

    let rows = provision::load_rows(&args.input)?;
    let (regular, dead_letter) =
        provision::split_rows(rows, &config.system.dead_letter_suffix);

    println!(
        "Provisioning {} queue(s) and {} DMQ(s) in VPN {} on {} (patch: {})",
        regular.len(),
        dead_letter.len(),
        Style::new().bold().yellow().apply_to(&vpn),
        config.router.semp_url,
        args.patch
    );

    let client = SempClient::new(&config.router.semp_user, &password)?;
    let mut provisioner =
        QueueProvisioner::new(&client, &config.templates, &config.config_base_url(), &vpn);

    provisioner.create_or_update_dmqueues(&dead_letter, args.patch)?;
    provisioner.create_or_update_queues(&regular, args.patch)?;

    provisioner.into_stats().print_summary("Provision stats:");
    Ok(())
}

//! Restore command implementation
//!
//! Replays a previously backed up tree against the configured broker. The
//! mode flags map straight onto the replicator's apply policy; delete mode
//! is destructive and asks for confirmation first.

use std::path::Path;

use console::Style;

use crate::cli::RestoreArgs;
use crate::commands::helpers;
use crate::config::{ApplyMode, ApplyPolicy, SkipPolicy, SyncConfig};
use crate::error::Result;
use crate::replicator::Replicator;
use crate::semp::SempClient;
use crate::store::ResourceStore;

/// Run the restore command
pub fn run(config_path: &Path, args: RestoreArgs) -> Result<()> {
    let config = SyncConfig::load(config_path)?;
    let target_vpn = config.vpn_name(args.vpn.as_deref())?;
    let source_vpn = args.source_vpn.clone().unwrap_or_else(|| target_vpn.clone());
    let password = config.semp_password()?;

    let from_dir = args
        .from
        .clone()
        .unwrap_or_else(|| helpers::default_store_dir(&config, &source_vpn));

    let mode = if args.delete {
        ApplyMode::Delete
    } else if args.patch {
        ApplyMode::Patch
    } else {
        ApplyMode::Create
    };

    if mode == ApplyMode::Delete && !args.yes && !confirm_delete(&target_vpn, &args.items)? {
        println!("Restore cancelled. No changes were made.");
        return Ok(());
    }

    println!(
        "Restoring {} into VPN {} on {}",
        from_dir.display(),
        Style::new().bold().yellow().apply_to(&target_vpn),
        config.router.semp_url
    );

    let client = SempClient::new(&config.router.semp_user, &password)?;
    let store = ResourceStore::new(&from_dir);
    let skip = SkipPolicy::from_config(&config);
    let policy = ApplyPolicy::from_config(&config, mode, &args.items, &target_vpn);

    let spinner = helpers::progress_spinner("Replaying configuration...");
    let restore_result = Replicator::new(&client, &store, &skip, &policy)
        .restore_vpn(&config.config_base_url(), &source_vpn);
    spinner.finish_and_clear();

    let stats = restore_result?;
    stats.print_summary("Restore stats:");

    Ok(())
}

/// Delete mode removes objects from the target; make sure the user means it
fn confirm_delete(target_vpn: &str, items: &[String]) -> Result<bool> {
    let scope = if items.is_empty() {
        "no object types (empty --item list)".to_string()
    } else {
        items.join(", ")
    };
    let prompt = format!(
        "Delete all replicated {} from VPN '{}'?",
        scope, target_vpn
    );
    Ok(inquire::Confirm::new(&prompt).with_default(false).prompt()?)
}

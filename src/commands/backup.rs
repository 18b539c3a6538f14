//! Backup command implementation
//!
//! Crawls one VPN's config tree from the configured broker into the local
//! store. The crawl is append-only per file: re-running it fills in gaps but
//! never clobbers earlier output.

use std::path::Path;

use console::Style;

use crate::cli::BackupArgs;
use crate::commands::helpers;
use crate::config::{SkipPolicy, SyncConfig};
use crate::crawler::{CrawlSettings, Crawler};
use crate::error::Result;
use crate::semp::SempClient;
use crate::store::ResourceStore;

/// Run the backup command
pub fn run(config_path: &Path, args: BackupArgs) -> Result<()> {
    let config = SyncConfig::load(config_path)?;
    let vpn = config.vpn_name(args.vpn.as_deref())?;
    let password = config.semp_password()?;

    let out_dir = args
        .out
        .unwrap_or_else(|| helpers::default_store_dir(&config, &vpn));

    println!(
        "Backing up VPN {} from {}",
        Style::new().bold().yellow().apply_to(&vpn),
        config.router.semp_url
    );
    println!("Store: {}", out_dir.display());

    let client = SempClient::new(&config.router.semp_user, &password)?;
    let mut store = ResourceStore::new(&out_dir);
    let skip = SkipPolicy::from_config(&config);
    let settings = CrawlSettings {
        vpn: vpn.clone(),
        base_url: config.config_base_url(),
        page_size: config.semp.page_size,
        no_paging: config.semp.no_paging.iter().cloned().collect(),
    };

    let spinner = helpers::progress_spinner("Crawling configuration...");
    let crawl_result = Crawler::new(&client, &mut store, &skip, settings).crawl_vpn();
    spinner.finish_and_clear();
    let stats = crawl_result?;

    let summary = store.summary();
    println!(
        "Backed up {} file(s) ({} bytes) to {}",
        summary.files,
        summary.bytes,
        out_dir.display()
    );
    stats.print_summary("Backup stats:");

    Ok(())
}

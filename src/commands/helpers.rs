//! Shared command helpers

use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};

use crate::config::SyncConfig;

/// Default store directory for one VPN: `<outputDir>/<broker-host>/<vpn>`
pub fn default_store_dir(config: &SyncConfig, vpn: &str) -> PathBuf {
    PathBuf::from(&config.system.output_dir)
        .join(config.broker_host())
        .join(vpn)
}

/// Steady-tick spinner shown while a run is in flight
pub fn progress_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

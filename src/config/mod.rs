//! Run configuration loaded from YAML
//!
//! One YAML file describes the broker (URL, credentials), the VPNs to work
//! on, SEMP paging behavior, the skip/filter policy tables and the queue
//! templates used by provisioning. The file maps 1:1 onto [`SyncConfig`];
//! policy types derived from it live in [`policy`].

pub mod policy;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Result, SempSyncError};

pub use policy::{ApplyMode, ApplyPolicy, SkipPolicy};

/// Top-level configuration file contents
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncConfig {
    pub router: RouterConfig,
    #[serde(default)]
    pub vpn: VpnConfig,
    #[serde(default)]
    pub semp: SempSettings,
    #[serde(default, rename = "skipObjects")]
    pub skip_objects: Vec<String>,
    #[serde(default, rename = "skipTags")]
    pub skip_tags: BTreeMap<String, Vec<String>>,
    #[serde(default, rename = "applyFilter")]
    pub apply_filter: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub system: SystemSettings,
    #[serde(default)]
    pub templates: Templates,
}

/// Broker access information
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouterConfig {
    #[serde(rename = "sempUrl")]
    pub semp_url: String,
    #[serde(rename = "sempUser")]
    pub semp_user: String,
    /// Optional in the file; falls back to the SEMP_PASSWORD environment
    /// variable so credentials can stay out of version control.
    #[serde(default, rename = "sempPassword")]
    pub semp_password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VpnConfig {
    #[serde(default, rename = "msgVpnNames")]
    pub msg_vpn_names: Vec<String>,
}

/// SEMP protocol behavior
#[derive(Debug, Clone, Deserialize)]
pub struct SempSettings {
    #[serde(default = "default_config_url", rename = "configUrl")]
    pub config_url: String,
    /// Requested collection page size; 0 disables paging entirely
    #[serde(default = "default_page_size", rename = "pageSize")]
    pub page_size: u32,
    /// Object types that reject a page-size query parameter
    #[serde(default, rename = "noPaging")]
    pub no_paging: Vec<String>,
    /// Object types that terminate recursion
    #[serde(default, rename = "leafNodes")]
    pub leaf_nodes: Vec<String>,
}

impl Default for SempSettings {
    fn default() -> Self {
        Self {
            config_url: default_config_url(),
            page_size: default_page_size(),
            no_paging: Vec::new(),
            leaf_nodes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemSettings {
    #[serde(default = "default_output_dir", rename = "outputDir")]
    pub output_dir: String,
    /// Queue names carrying this marker are provisioned through the DMQ path
    #[serde(default = "default_dead_letter_suffix", rename = "deadLetterSuffix")]
    pub dead_letter_suffix: String,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            dead_letter_suffix: default_dead_letter_suffix(),
        }
    }
}

/// Default property sets for provisioning
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Templates {
    #[serde(default)]
    pub queue: Map<String, Value>,
    #[serde(default)]
    pub dmqueue: Map<String, Value>,
}

fn default_config_url() -> String {
    "SEMP/v2/config".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_dead_letter_suffix() -> String {
    "_DLQ".to_string()
}

impl SyncConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SempSyncError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| SempSyncError::ConfigReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| SempSyncError::ConfigParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Resolve the SEMP password from the file or the SEMP_PASSWORD env var
    pub fn semp_password(&self) -> Result<String> {
        if let Some(ref password) = self.router.semp_password {
            return Ok(password.clone());
        }
        std::env::var("SEMP_PASSWORD").map_err(|_| SempSyncError::MissingCredentials)
    }

    /// The first configured VPN, unless overridden on the command line
    pub fn vpn_name(&self, override_name: Option<&str>) -> Result<String> {
        if let Some(name) = override_name {
            return Ok(name.to_string());
        }
        self.vpn
            .msg_vpn_names
            .first()
            .cloned()
            .ok_or(SempSyncError::MissingVpn)
    }

    /// Root URL of the SEMPv2 config API, e.g. `http://host:8080/SEMP/v2/config`
    pub fn config_base_url(&self) -> String {
        format!(
            "{}/{}",
            self.router.semp_url.trim_end_matches('/'),
            self.semp.config_url.trim_matches('/')
        )
    }

    /// Host portion of the broker URL, used as a directory level in the store
    pub fn broker_host(&self) -> String {
        let url = &self.router.semp_url;
        let without_scheme = url.split_once("://").map_or(url.as_str(), |(_, rest)| rest);
        without_scheme
            .split(['/', ':'])
            .next()
            .unwrap_or("broker")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const SAMPLE: &str = r##"
router:
  sempUrl: http://localhost:8080
  sempUser: admin
  sempPassword: admin
vpn:
  msgVpnNames: [test-vpn, other-vpn]
semp:
  pageSize: 10
  noPaging: [dmrClusters]
  leafNodes: [subscriptions]
skipObjects: [certAuthorities]
skipTags:
  queueName: ["#internal-q"]
templates:
  queue:
    subscriptionTopic: ""
    maxMsgSpoolUsage: 5000
"##;

    fn write_sample(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_sample_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = SyncConfig::load(&write_sample(&dir)).unwrap();

        assert_eq!(cfg.router.semp_user, "admin");
        assert_eq!(cfg.semp.page_size, 10);
        assert_eq!(cfg.semp.no_paging, vec!["dmrClusters"]);
        assert_eq!(cfg.skip_objects, vec!["certAuthorities"]);
        assert_eq!(cfg.templates.queue.len(), 2);
        assert!(cfg.apply_filter.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let result = SyncConfig::load(Path::new("/nonexistent/config.yaml"));
        assert!(matches!(result, Err(SempSyncError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_defaults_applied() {
        let cfg: SyncConfig = serde_yaml::from_str(
            "router:\n  sempUrl: http://h:8080\n  sempUser: admin\n",
        )
        .unwrap();
        assert_eq!(cfg.semp.config_url, "SEMP/v2/config");
        assert_eq!(cfg.semp.page_size, 100);
        assert_eq!(cfg.system.output_dir, "output");
        assert_eq!(cfg.system.dead_letter_suffix, "_DLQ");
    }

    #[test]
    fn test_vpn_name_selection() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = SyncConfig::load(&write_sample(&dir)).unwrap();

        assert_eq!(cfg.vpn_name(None).unwrap(), "test-vpn");
        assert_eq!(cfg.vpn_name(Some("target")).unwrap(), "target");

        let empty = SyncConfig::default();
        assert!(matches!(empty.vpn_name(None), Err(SempSyncError::MissingVpn)));
    }

    #[test]
    fn test_config_base_url() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = SyncConfig::load(&write_sample(&dir)).unwrap();
        assert_eq!(cfg.config_base_url(), "http://localhost:8080/SEMP/v2/config");
    }

    #[test]
    fn test_broker_host() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = SyncConfig::load(&write_sample(&dir)).unwrap();
        assert_eq!(cfg.broker_host(), "localhost");
    }

    #[test]
    #[serial]
    fn test_password_from_env() {
        let mut cfg = SyncConfig::default();
        cfg.router.semp_password = None;

        unsafe {
            std::env::set_var("SEMP_PASSWORD", "sekret");
        }
        assert_eq!(cfg.semp_password().unwrap(), "sekret");
        unsafe {
            std::env::remove_var("SEMP_PASSWORD");
        }
        assert!(matches!(
            cfg.semp_password(),
            Err(SempSyncError::MissingCredentials)
        ));
    }
}

//! Error types and handling for sempsync
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! Only run-ending conditions surface through [`SempSyncError`]. Per-branch
//! failures during a crawl or restore (an unreadable file, a rejected SEMP
//! call) are logged at the branch boundary and the run continues; see the
//! crawler and replicator modules.

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for sempsync operations
#[derive(Error, Diagnostic, Debug)]
pub enum SempSyncError {
    // Configuration errors
    #[error("Configuration file not found: {path}")]
    #[diagnostic(code(sempsync::config::not_found))]
    ConfigNotFound { path: String },

    #[error("Failed to read configuration file: {path}")]
    #[diagnostic(code(sempsync::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse configuration file: {path}")]
    #[diagnostic(code(sempsync::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("No SEMP password configured")]
    #[diagnostic(
        code(sempsync::config::missing_credentials),
        help("Set router.sempPassword in the config file or export SEMP_PASSWORD")
    )]
    MissingCredentials,

    #[error("No message VPN configured")]
    #[diagnostic(
        code(sempsync::config::missing_vpn),
        help("Set vpn.msgVpnNames in the config file or pass --vpn")
    )]
    MissingVpn,

    // Provisioning input errors
    #[error("Failed to read input file: {path}")]
    #[diagnostic(code(sempsync::input::read_failed))]
    InputReadFailed { path: String, reason: String },

    #[error("Failed to parse input file: {path}")]
    #[diagnostic(
        code(sempsync::input::parse_failed),
        help("The input file is a YAML list of rows, each with a queueName field")
    )]
    InputParseFailed { path: String, reason: String },

    // SEMP transport errors
    #[error("SEMP request failed: {url}")]
    #[diagnostic(
        code(sempsync::semp::request_failed),
        help("Check that the broker is reachable and router.sempUrl is correct")
    )]
    RequestFailed { url: String, reason: String },

    #[error("SEMP returned a non-JSON body: {url}")]
    #[diagnostic(code(sempsync::semp::malformed_response))]
    MalformedResponse { url: String, reason: String },

    #[error("Object for {url} has no name field")]
    #[diagnostic(
        code(sempsync::semp::missing_name),
        help("PATCH and DELETE address objects by name; the stored object has no *Name field")
    )]
    MissingNameField { url: String },

    // Resource store errors
    #[error("Failed to write store file: {path}")]
    #[diagnostic(code(sempsync::store::write_failed))]
    StoreWriteFailed { path: String, reason: String },

    #[error("Failed to read store file: {path}")]
    #[diagnostic(code(sempsync::store::read_failed))]
    StoreReadFailed { path: String, reason: String },

    #[error("Failed to parse store file: {path}")]
    #[diagnostic(
        code(sempsync::store::parse_failed),
        help("The file is not a stored SEMP envelope; re-run backup to regenerate it")
    )]
    StoreParseFailed { path: String, reason: String },

    #[error("Failed to list store files under {path}: {reason}")]
    #[diagnostic(code(sempsync::store::lookup_failed))]
    StoreLookupFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(sempsync::fs::io_error))]
    IoError { message: String },
}

impl From<std::io::Error> for SempSyncError {
    fn from(err: std::io::Error) -> Self {
        SempSyncError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for SempSyncError {
    fn from(err: serde_yaml::Error) -> Self {
        SempSyncError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SempSyncError {
    fn from(err: serde_json::Error) -> Self {
        SempSyncError::StoreParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for SempSyncError {
    fn from(err: reqwest::Error) -> Self {
        SempSyncError::RequestFailed {
            url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            reason: err.to_string(),
        }
    }
}

impl From<inquire::InquireError> for SempSyncError {
    fn from(err: inquire::InquireError) -> Self {
        SempSyncError::IoError {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, SempSyncError>;

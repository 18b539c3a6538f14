//! SEMPv2 protocol layer
//!
//! [`SempApi`] is the seam between the traversal logic and the wire: the
//! production implementation is [`client::SempClient`] (blocking HTTP with
//! basic auth), tests substitute an in-memory broker. Transport failures are
//! `Err`; everything the broker actually said, rejections included, comes
//! back as a [`SempReply`] for the caller to interpret.

pub mod client;
pub mod envelope;

pub use client::SempClient;
pub use envelope::{LinkSet, ResourceEnvelope, ResponseMeta};

use serde_json::Value;

use crate::error::Result;

/// Broker verdict on a mutating call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SempOutcome {
    /// `meta.responseCode == 200`
    Ok,
    /// The designed trigger for the disable/patch/enable sequence
    AlreadyExists,
    /// Any other non-200 status/description pair; logged, never raised
    Rejected { status: String, description: String },
}

/// One SEMP response: transport status plus parsed JSON body
#[derive(Debug, Clone)]
pub struct SempReply {
    pub http_status: u16,
    pub body: Value,
}

impl SempReply {
    pub fn new(http_status: u16, body: Value) -> Self {
        Self { http_status, body }
    }

    pub fn meta(&self) -> ResponseMeta {
        ResponseMeta::from_body(&self.body)
    }

    /// GET success is judged by the HTTP status
    pub fn is_http_ok(&self) -> bool {
        self.http_status == 200
    }

    /// Mutating-call success is judged by `meta.responseCode`
    pub fn outcome(&self) -> SempOutcome {
        let meta = self.meta();
        if meta.response_code == Some(200) {
            return SempOutcome::Ok;
        }
        let status = meta.error_status.unwrap_or_else(|| "UNKNOWN".to_string());
        if status == "ALREADY_EXISTS" {
            return SempOutcome::AlreadyExists;
        }
        SempOutcome::Rejected {
            status,
            description: meta.error_description.unwrap_or_default(),
        }
    }
}

/// The five SEMPv2 verbs, blocking
///
/// PUT (full replace) is part of the protocol surface but unused by the
/// higher-level flows, which create with POST and update with PATCH.
pub trait SempApi {
    /// GET, optionally requesting a collection page size via `?count=`
    fn get(&self, url: &str, page_size: Option<u32>) -> Result<SempReply>;
    fn post(&self, url: &str, body: &Value) -> Result<SempReply>;
    fn patch(&self, url: &str, body: &Value) -> Result<SempReply>;
    fn put(&self, url: &str, body: &Value) -> Result<SempReply>;
    fn delete(&self, url: &str) -> Result<SempReply>;
}

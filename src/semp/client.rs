//! Blocking SEMPv2 HTTP client
//!
//! Thin wrapper over `reqwest::blocking` with basic auth and JSON bodies.
//! The client never interprets SEMP status codes; callers do that through
//! [`SempReply`](super::SempReply).

use reqwest::Method;
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, trace};

use super::{SempApi, SempReply};
use crate::error::{Result, SempSyncError};

pub struct SempClient {
    http: Client,
    user: String,
    password: String,
}

impl SempClient {
    pub fn new(user: &str, password: &str) -> Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            user: user.to_string(),
            password: password.to_string(),
        })
    }

    fn execute(
        &self,
        method: Method,
        url: &str,
        query: Option<(&str, String)>,
        body: Option<&Value>,
    ) -> Result<SempReply> {
        debug!(%method, url, "SEMP request");
        if let Some(body) = body {
            trace!(payload = %body, "request body");
        }

        let mut request = self
            .http
            .request(method, url)
            .basic_auth(&self.user, Some(&self.password))
            .header("content-type", "application/json");
        if let Some((key, value)) = query {
            request = request.query(&[(key, value)]);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().map_err(|e| SempSyncError::RequestFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let http_status = response.status().as_u16();
        let body: Value = response
            .json()
            .map_err(|e| SempSyncError::MalformedResponse {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        trace!(http_status, response = %body, "SEMP response");
        Ok(SempReply::new(http_status, body))
    }
}

impl SempApi for SempClient {
    fn get(&self, url: &str, page_size: Option<u32>) -> Result<SempReply> {
        let query = page_size.map(|count| ("count", count.to_string()));
        self.execute(Method::GET, url, query, None)
    }

    fn post(&self, url: &str, body: &Value) -> Result<SempReply> {
        self.execute(Method::POST, url, None, Some(body))
    }

    fn patch(&self, url: &str, body: &Value) -> Result<SempReply> {
        self.execute(Method::PATCH, url, None, Some(body))
    }

    fn put(&self, url: &str, body: &Value) -> Result<SempReply> {
        self.execute(Method::PUT, url, None, Some(body))
    }

    fn delete(&self, url: &str) -> Result<SempReply> {
        self.execute(Method::DELETE, url, None, None)
    }
}

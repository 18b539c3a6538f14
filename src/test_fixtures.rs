//! Test fixtures shared across module tests
//!
//! [`FakeBroker`] is an in-memory [`SempApi`] implementation: GET bodies are
//! served from a URL map, mutating calls answer `responseCode: 200` unless a
//! scripted reply was queued, and every call is recorded for order and
//! payload assertions.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use serde_json::{Value, json};

use crate::error::Result;
use crate::semp::{SempApi, SempReply};

/// A successful mutating-call body
pub fn ok_meta() -> Value {
    json!({"meta": {"responseCode": 200}})
}

/// A rejected mutating-call body
pub fn error_meta(code: i64, status: &str, description: &str) -> Value {
    json!({"meta": {
        "responseCode": code,
        "error": {"status": status, "description": description}
    }})
}

/// The conflict body POST returns for an existing object
pub fn already_exists() -> Value {
    error_meta(400, "ALREADY_EXISTS", "object already exists")
}

/// Build a collection page body
pub fn page(data: Value, links: Value, next_page_uri: Option<&str>) -> Value {
    let mut meta = json!({"responseCode": 200});
    if let Some(uri) = next_page_uri {
        meta["paging"] = json!({"nextPageUri": uri});
    }
    json!({"data": data, "links": links, "meta": meta})
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub url: String,
    pub body: Option<Value>,
}

#[derive(Default)]
pub struct FakeBroker {
    get_bodies: HashMap<String, Value>,
    scripted: RefCell<HashMap<(&'static str, String), VecDeque<Value>>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve this body for GETs of `url`
    pub fn serve(&mut self, url: &str, body: Value) {
        self.get_bodies.insert(url.to_string(), body);
    }

    /// Queue a scripted reply for the next `method` call on `url`
    pub fn reply(&self, method: &'static str, url: &str, body: Value) {
        self.scripted
            .borrow_mut()
            .entry((method, url.to_string()))
            .or_default()
            .push_back(body);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub fn calls_for(&self, method: &'static str) -> Vec<RecordedCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.method == method)
            .cloned()
            .collect()
    }

    fn record(&self, method: &'static str, url: &str, body: Option<&Value>) {
        self.calls.borrow_mut().push(RecordedCall {
            method,
            url: url.to_string(),
            body: body.cloned(),
        });
    }

    fn mutate(&self, method: &'static str, url: &str, body: Option<&Value>) -> Result<SempReply> {
        self.record(method, url, body);
        let scripted = self
            .scripted
            .borrow_mut()
            .get_mut(&(method, url.to_string()))
            .and_then(VecDeque::pop_front);
        Ok(SempReply::new(200, scripted.unwrap_or_else(ok_meta)))
    }
}

impl SempApi for FakeBroker {
    fn get(&self, url: &str, _page_size: Option<u32>) -> Result<SempReply> {
        self.record("GET", url, None);
        match self.get_bodies.get(url) {
            Some(body) => Ok(SempReply::new(200, body.clone())),
            None => Ok(SempReply::new(
                404,
                error_meta(404, "NOT_FOUND", &format!("no such resource: {}", url)),
            )),
        }
    }

    fn post(&self, url: &str, body: &Value) -> Result<SempReply> {
        self.mutate("POST", url, Some(body))
    }

    fn patch(&self, url: &str, body: &Value) -> Result<SempReply> {
        self.mutate("PATCH", url, Some(body))
    }

    fn put(&self, url: &str, body: &Value) -> Result<SempReply> {
        self.mutate("PUT", url, Some(body))
    }

    fn delete(&self, url: &str) -> Result<SempReply> {
        self.mutate("DELETE", url, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semp::SempOutcome;

    #[test]
    fn test_get_unknown_url_is_404() {
        let broker = FakeBroker::new();
        let reply = broker.get("http://h/nothing", None).unwrap();
        assert_eq!(reply.http_status, 404);
        assert!(!reply.is_http_ok());
    }

    #[test]
    fn test_scripted_replies_consumed_in_order() {
        let broker = FakeBroker::new();
        broker.reply("POST", "http://h/queues", already_exists());

        let first = broker.post("http://h/queues", &json!({})).unwrap();
        let second = broker.post("http://h/queues", &json!({})).unwrap();

        assert_eq!(first.outcome(), SempOutcome::AlreadyExists);
        assert_eq!(second.outcome(), SempOutcome::Ok);
        assert_eq!(broker.calls_for("POST").len(), 2);
    }

    #[test]
    fn test_put_records_call() {
        let broker = FakeBroker::new();
        let reply = broker
            .put("http://h/queues/q1", &json!({"queueName": "q1"}))
            .unwrap();
        assert_eq!(reply.outcome(), SempOutcome::Ok);
        assert_eq!(broker.calls_for("PUT").len(), 1);
    }
}

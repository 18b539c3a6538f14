//! Bulk queue provisioning
//!
//! Creates or updates queues from a declarative input list. Each row is the
//! configured queue template overlaid with that row's overrides. Create and
//! "already exists" are both fine; in patch mode an existing queue is
//! disabled, patched with the new properties (which re-enable it), and its
//! subscription set is reconciled: every current subscription is removed
//! before the defined ones are added, so a replay converges on exactly the
//! defined set.
//!
//! Dead-letter queues take a separate path: one shared template for every
//! row, no per-row overrides, no subscriptions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::config::Templates;
use crate::error::{Result, SempSyncError};
use crate::report::RunStats;
use crate::semp::{SempApi, SempOutcome};

/// Separator between subscription topics in the `subscriptionTopic` property
const TOPIC_SEPARATOR: char = ':';

/// One input row: a queue name plus property overrides
#[derive(Debug, Clone, Deserialize)]
pub struct QueueRow {
    #[serde(rename = "queueName")]
    pub queue_name: String,
    #[serde(flatten)]
    pub overrides: Map<String, Value>,
}

/// Load the YAML input list of queue definitions
pub fn load_rows(path: &Path) -> Result<Vec<QueueRow>> {
    let content = fs::read_to_string(path).map_err(|e| SempSyncError::InputReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    serde_yaml::from_str(&content).map_err(|e| SempSyncError::InputParseFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Split input rows into (regular, dead-letter) by the configured marker
pub fn split_rows(rows: Vec<QueueRow>, dead_letter_marker: &str) -> (Vec<QueueRow>, Vec<QueueRow>) {
    rows.into_iter()
        .partition(|row| !row.queue_name.contains(dead_letter_marker))
}

pub struct QueueProvisioner<'a, A: SempApi> {
    api: &'a A,
    templates: &'a Templates,
    vpn: String,
    queues_url: String,
    stats: RunStats,
}

impl<'a, A: SempApi> QueueProvisioner<'a, A> {
    pub fn new(api: &'a A, templates: &'a Templates, base_url: &str, vpn: &str) -> Self {
        Self {
            api,
            templates,
            vpn: vpn.to_string(),
            queues_url: format!("{}/msgVpns/{}/queues", base_url, vpn),
            stats: RunStats::new(),
        }
    }

    pub fn into_stats(self) -> RunStats {
        self.stats
    }

    /// Create or update every regular queue, with subscription handling
    pub fn create_or_update_queues(&mut self, rows: &[QueueRow], patch: bool) -> Result<()> {
        info!(vpn = %self.vpn, count = rows.len(), patch, "provisioning queues");

        for (index, row) in rows.iter().enumerate() {
            let queue = row.queue_name.trim();
            println!("{:>3}/{}) queue <{}>", index + 1, rows.len(), queue);

            let (payload, topics) = self.queue_payload(row);
            self.apply_queue(queue, payload, patch)?;

            if patch {
                self.remove_existing_subscriptions(queue)?;
            }
            self.add_subscriptions(queue, &topics)?;
        }
        Ok(())
    }

    /// Create or update dead-letter queues: one template, only the name varies
    pub fn create_or_update_dmqueues(&mut self, rows: &[QueueRow], patch: bool) -> Result<()> {
        info!(vpn = %self.vpn, count = rows.len(), patch, "provisioning DMQs");

        for (index, row) in rows.iter().enumerate() {
            let queue = row.queue_name.trim();
            println!("{:>3}/{}) DMQ <{}>", index + 1, rows.len(), queue);

            let mut payload = self.templates.dmqueue.clone();
            payload.remove("subscriptionTopic");
            payload.insert("msgVpnName".to_string(), json!(self.vpn));
            payload.insert("queueName".to_string(), json!(queue));
            payload.insert("ingressEnabled".to_string(), json!(true));
            payload.insert("egressEnabled".to_string(), json!(true));

            self.apply_queue(queue, payload, patch)?;
        }
        Ok(())
    }

    /// Template plus row overrides, with the subscription list split off
    ///
    /// Only properties the template knows are taken from the row; empty
    /// strings mean "keep the template value".
    fn queue_payload(&self, row: &QueueRow) -> (Map<String, Value>, Vec<String>) {
        let mut payload = self.templates.queue.clone();

        for (property, value) in &row.overrides {
            if !payload.contains_key(property) {
                continue;
            }
            match value {
                Value::String(s) if s.trim().is_empty() => {}
                Value::String(s) => {
                    payload.insert(property.clone(), json!(s.trim()));
                }
                other => {
                    payload.insert(property.clone(), other.clone());
                }
            }
        }

        payload.insert("queueName".to_string(), json!(row.queue_name.trim()));
        payload.insert("ingressEnabled".to_string(), json!(true));
        payload.insert("egressEnabled".to_string(), json!(true));

        let topics = payload
            .remove("subscriptionTopic")
            .and_then(|value| value.as_str().map(String::from))
            .map(|joined| {
                joined
                    .split(TOPIC_SEPARATOR)
                    .map(str::trim)
                    .filter(|topic| !topic.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        (payload, topics)
    }

    /// POST the queue; on conflict in patch mode, disable, then patch with
    /// the new properties (the payload re-enables it)
    fn apply_queue(&mut self, queue: &str, payload: Map<String, Value>, patch: bool) -> Result<()> {
        self.stats.posts += 1;
        let reply = self.api.post(&self.queues_url, &Value::Object(payload.clone()))?;

        match reply.outcome() {
            SempOutcome::Ok => {
                self.stats.applied += 1;
                debug!(queue, "queue created");
            }
            SempOutcome::AlreadyExists if patch => {
                self.stats.conflicts += 1;
                info!(queue, "queue exists, disabling and patching");
                let item_url = self.queue_url(queue);

                let disable = json!({
                    "queueName": queue,
                    "msgVpnName": self.vpn,
                    "egressEnabled": false,
                });
                self.stats.patches += 1;
                self.log_rejection(queue, self.api.patch(&item_url, &disable)?.outcome());

                self.stats.patches += 1;
                let outcome = self.api.patch(&item_url, &Value::Object(payload))?.outcome();
                if matches!(outcome, SempOutcome::Ok) {
                    self.stats.applied += 1;
                }
                self.log_rejection(queue, outcome);
            }
            SempOutcome::AlreadyExists => {
                self.stats.conflicts += 1;
                info!(queue, "queue exists, leaving as-is");
            }
            SempOutcome::Rejected {
                status,
                description,
            } => {
                self.stats.rejected += 1;
                warn!(queue, status = %status, description = %description, "queue create rejected");
            }
        }
        Ok(())
    }

    /// Fetch the queue's current subscription set and delete every entry
    fn remove_existing_subscriptions(&mut self, queue: &str) -> Result<()> {
        let subscriptions_url = format!("{}/subscriptions", self.queue_url(queue));

        self.stats.gets += 1;
        let reply = self.api.get(&subscriptions_url, None)?;
        if !reply.is_http_ok() {
            warn!(queue, http_status = reply.http_status, "cannot list subscriptions");
            return Ok(());
        }

        for topic in topic_list(&reply.body) {
            info!(queue, topic = %topic, "removing subscription");
            self.stats.deletes += 1;
            let delete_url = format!("{}/{}", subscriptions_url, urlencoding::encode(&topic));
            self.log_rejection(queue, self.api.delete(&delete_url)?.outcome());
        }
        Ok(())
    }

    /// Add each defined subscription token
    fn add_subscriptions(&mut self, queue: &str, topics: &[String]) -> Result<()> {
        let subscriptions_url = format!("{}/subscriptions", self.queue_url(queue));

        for topic in topics {
            info!(queue, topic = %topic, "adding subscription");
            let body = json!({
                "msgVpnName": self.vpn,
                "queueName": queue,
                "subscriptionTopic": topic,
            });
            self.stats.posts += 1;
            self.log_rejection(queue, self.api.post(&subscriptions_url, &body)?.outcome());
        }
        Ok(())
    }

    fn queue_url(&self, queue: &str) -> String {
        format!("{}/{}", self.queues_url, urlencoding::encode(queue))
    }

    fn log_rejection(&mut self, queue: &str, outcome: SempOutcome) {
        if let SempOutcome::Rejected {
            status,
            description,
        } = outcome
        {
            self.stats.rejected += 1;
            warn!(queue, status = %status, description = %description, "call rejected");
        }
    }
}

/// Pull the subscription topics out of a subscriptions collection body
fn topic_list(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["subscriptionTopic"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

//! Store replay against a target broker
//!
//! Walks the file tree the crawler produced (the same shape, driven by the
//! stored link sets instead of live API calls) and issues the appropriate
//! request for every object. What "appropriate" means is the apply decision
//! in [`Replicator::apply_object`]: skip tables first, then VPN rename, then
//! the delete/patch/create mode gates.
//!
//! Every branch is fallible in isolation: an unreadable file, a bad path or
//! a broker rejection drops that branch with a log line while its siblings
//! continue. The replicator never writes to the store.

use std::fmt;

use serde_json::Value;
use tracing::{debug, error, info, trace, warn};

use crate::config::{ApplyMode, ApplyPolicy, SkipPolicy};
use crate::error::{Result, SempSyncError};
use crate::report::RunStats;
use crate::semp::envelope::{LinkMap, ResourceEnvelope, ResourceObject, URI_RELATION};
use crate::semp::{SempApi, SempOutcome};
use crate::store::{ResourceStore, resolver};

/// Hard recursion bound, mirroring the crawler's
const MAX_LINK_DEPTH: usize = 20;

/// Why an object was not sent to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UserSkipped,
    PolicySkip,
    NotInFilter,
    DeletionNotEnabled,
    PatchNotEnabled,
    NotInItems,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::UserSkipped => "user-skipped",
            SkipReason::PolicySkip => "policy-skip",
            SkipReason::NotInFilter => "not-in-filter",
            SkipReason::DeletionNotEnabled => "deletion-not-enabled",
            SkipReason::PatchNotEnabled => "patch-not-enabled",
            SkipReason::NotInItems => "not-in-items",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of applying one stored object to the target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Create hit an existing object; a designed outcome, not a failure
    Conflict,
    Skipped(SkipReason),
    /// The broker rejected the call; logged, never raised
    Failed { status: String, description: String },
}

pub struct Replicator<'a, A: SempApi> {
    api: &'a A,
    store: &'a ResourceStore,
    skip: &'a SkipPolicy,
    policy: &'a ApplyPolicy,
    stats: RunStats,
}

impl<'a, A: SempApi> Replicator<'a, A> {
    pub fn new(
        api: &'a A,
        store: &'a ResourceStore,
        skip: &'a SkipPolicy,
        policy: &'a ApplyPolicy,
    ) -> Self {
        Self {
            api,
            store,
            skip,
            policy,
            stats: RunStats::new(),
        }
    }

    /// Replay the stored VPN tree rooted at `<store>/<source_vpn>.json`
    /// against `<base_url>/msgVpns`; returns the run counters
    pub fn restore_vpn(mut self, base_url: &str, source_vpn: &str) -> Result<RunStats> {
        let root_files = self.store.list_matching("", source_vpn)?;
        if root_files.is_empty() {
            return Err(SempSyncError::StoreLookupFailed {
                path: self.store.root().display().to_string(),
                reason: format!("no {}.json root envelope; run backup first", source_vpn),
            });
        }

        let url = format!("{}/msgVpns", base_url);
        let target_vpn = self.policy.target_vpn.clone();
        info!(url = %url, target_vpn = %target_vpn, "replaying VPN tree");

        for file in root_files {
            match self.store.load(&file) {
                Ok(Some(envelope)) => {
                    if let Err(e) = self.apply_envelope(&url, &target_vpn, "", &envelope, 0) {
                        error!(error = %e, file = %file.display(), "dropping root branch");
                        self.stats.abandoned += 1;
                    }
                }
                Ok(None) => debug!(file = %file.display(), "quiet root envelope"),
                Err(e) => {
                    error!(error = %e, file = %file.display(), "unreadable root envelope");
                    self.stats.abandoned += 1;
                }
            }
        }
        Ok(self.stats)
    }

    /// Apply one envelope's objects, then recurse through its links
    fn apply_envelope(
        &mut self,
        url: &str,
        target_obj: &str,
        src_path: &str,
        envelope: &ResourceEnvelope,
        depth: usize,
    ) -> Result<()> {
        for object in &envelope.data {
            let outcome = self.apply_object(url, object)?;
            self.record_outcome(url, &outcome);
        }

        for map in envelope.links.maps() {
            self.apply_links(url, target_obj, src_path, map, depth);
        }
        Ok(())
    }

    /// Replay each non-uri relation of one link map from the local tree
    fn apply_links(
        &mut self,
        target_url: &str,
        target_obj: &str,
        src_path: &str,
        links: &LinkMap,
        depth: usize,
    ) {
        for (relation, src_link) in links {
            if relation == URI_RELATION {
                continue;
            }
            self.stats.links += 1;

            let Some(target) = resolver::split_link(src_link) else {
                warn!(link = %src_link, "cannot split link, dropping branch");
                self.stats.abandoned += 1;
                continue;
            };

            if self.skip.is_skipped(&target.object_type) {
                info!(object_type = %target.object_type, "skipping object: user skipped");
                self.stats.skipped += 1;
                continue;
            }
            if self.skip.is_leaf(&target.owner) {
                debug!(owner = %target.owner, "leaf branch, not replaying");
                continue;
            }

            let branch = match resolver::resolve_branch(self.store, src_path, &target) {
                Ok(branch) => branch,
                Err(e) => {
                    warn!(error = %e, link = %src_link, "path lookup failed, dropping branch");
                    self.stats.abandoned += 1;
                    continue;
                }
            };

            let child_url = if branch.via_owner {
                format!("{}/{}/{}", target_url, target.owner, target.object_type)
            } else {
                format!("{}/{}/{}", target_url, target_obj, target.object_type)
            };
            trace!(relation = %relation, url = %child_url, path = %branch.sub_path, "replaying branch");

            for file in &branch.files {
                let envelope = match self.store.load(file) {
                    Ok(Some(envelope)) if !envelope.is_empty() => envelope,
                    Ok(_) => {
                        debug!(file = %file.display(), "no data or links, skipping file");
                        continue;
                    }
                    Err(e) => {
                        error!(error = %e, file = %file.display(), "unreadable file, dropping branch");
                        self.stats.abandoned += 1;
                        continue;
                    }
                };

                if depth + 1 >= MAX_LINK_DEPTH {
                    warn!(file = %file.display(), depth, "link depth cap reached, dropping branch");
                    self.stats.abandoned += 1;
                    continue;
                }

                if let Err(e) =
                    self.apply_envelope(&child_url, target_obj, &branch.sub_path, &envelope, depth + 1)
                {
                    error!(error = %e, file = %file.display(), "failed to replay file, dropping branch");
                    self.stats.abandoned += 1;
                }
            }
        }
    }

    /// The apply decision for one object, evaluated before any network call
    ///
    /// Priority order: user skip, tag skip (with the apply-filter override),
    /// VPN rename, then the delete/patch/create mode gates.
    fn apply_object(&mut self, url: &str, object: &ResourceObject) -> Result<ApplyOutcome> {
        let object_type = last_segment(url);

        if self.skip.is_skipped(object_type) {
            return Ok(ApplyOutcome::Skipped(SkipReason::UserSkipped));
        }

        let tag_match = self.match_skip_tag(object);
        if let Some((tag, ref value)) = tag_match {
            let allowed = self
                .policy
                .apply_filter
                .as_ref()
                .and_then(|filter| filter.get(tag));
            match allowed {
                Some(values) if values.contains(value) => {
                    debug!(tag, value = %value, "apply filter admits value");
                }
                Some(_) => return Ok(ApplyOutcome::Skipped(SkipReason::NotInFilter)),
                None => {
                    if self.policy.skip_tags[tag].contains(value) {
                        return Ok(ApplyOutcome::Skipped(SkipReason::PolicySkip));
                    }
                }
            }
        }

        let (url, object) = self.rename_vpn(url, object.clone());

        match self.policy.mode {
            ApplyMode::Delete => {
                if !self.policy.items.contains(object_type) {
                    info!(object_type, "deletion not enabled");
                    return Ok(ApplyOutcome::Skipped(SkipReason::DeletionNotEnabled));
                }
                let item_url = self.item_url(&url, &object, tag_match)?;
                debug!(url = %item_url, "deleting");
                self.stats.deletes += 1;
                Ok(outcome_of(self.api.delete(&item_url)?.outcome()))
            }
            ApplyMode::Patch => {
                if !self.policy.items.contains(object_type) {
                    info!(object_type, "patching not enabled");
                    return Ok(ApplyOutcome::Skipped(SkipReason::PatchNotEnabled));
                }
                let item_url = self.item_url(&url, &object, tag_match)?;
                debug!(url = %item_url, "patching");
                self.stats.patches += 1;
                Ok(outcome_of(
                    self.api.patch(&item_url, &Value::Object(object))?.outcome(),
                ))
            }
            ApplyMode::Create => {
                if !self.policy.allows(object_type) {
                    return Ok(ApplyOutcome::Skipped(SkipReason::NotInItems));
                }
                debug!(url = %url, "posting");
                self.stats.posts += 1;
                Ok(outcome_of(
                    self.api.post(&url, &Value::Object(object))?.outcome(),
                ))
            }
        }
    }

    /// First object field present in the skip-tag table, with its value
    fn match_skip_tag(&self, object: &ResourceObject) -> Option<(&'a str, String)> {
        self.policy.skip_tags.keys().find_map(|tag| {
            object
                .get(tag.as_str())
                .map(|value| (tag.as_str(), value_string(value)))
        })
    }

    /// Rewrite the object's VPN field and the URL's VPN segment when
    /// replication crosses VPNs
    fn rename_vpn(&self, url: &str, mut object: ResourceObject) -> (String, ResourceObject) {
        let target = &self.policy.target_vpn;
        let Some(source) = object.get("msgVpnName").and_then(Value::as_str) else {
            return (url.to_string(), object);
        };
        if source == target {
            return (url.to_string(), object);
        }

        debug!(source, target = %target, "rewriting VPN name");
        let marker = format!("/{}/", source);
        let url = match url.find(&marker) {
            Some(index) => format!(
                "{}/{}/{}",
                &url[..index],
                target,
                &url[index + marker.len()..]
            ),
            None => url.to_string(),
        };
        object.insert("msgVpnName".to_string(), Value::String(target.clone()));
        (url, object)
    }

    /// URL of one named object below its collection, for PATCH and DELETE
    fn item_url(
        &self,
        url: &str,
        object: &ResourceObject,
        tag_match: Option<(&str, String)>,
    ) -> Result<String> {
        let name = tag_match
            .map(|(_, value)| value)
            .or_else(|| primary_name(object))
            .ok_or_else(|| SempSyncError::MissingNameField {
                url: url.to_string(),
            })?;
        Ok(format!("{}/{}", url, urlencoding::encode(&name)))
    }

    fn record_outcome(&mut self, url: &str, outcome: &ApplyOutcome) {
        match outcome {
            ApplyOutcome::Applied => self.stats.applied += 1,
            ApplyOutcome::Conflict => {
                info!(url, "object already exists");
                self.stats.conflicts += 1;
            }
            ApplyOutcome::Skipped(reason) => {
                info!(url, reason = %reason, "skipped");
                self.stats.skipped += 1;
            }
            ApplyOutcome::Failed {
                status,
                description,
            } => {
                warn!(url, status = %status, description = %description, "broker rejected call");
                self.stats.rejected += 1;
            }
        }
    }
}

fn outcome_of(outcome: SempOutcome) -> ApplyOutcome {
    match outcome {
        SempOutcome::Ok => ApplyOutcome::Applied,
        SempOutcome::AlreadyExists => ApplyOutcome::Conflict,
        SempOutcome::Rejected {
            status,
            description,
        } => ApplyOutcome::Failed {
            status,
            description,
        },
    }
}

fn last_segment(url: &str) -> &str {
    url.trim_end_matches('/').rsplit('/').next().unwrap_or(url)
}

fn value_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The object's primary name field: the first `*Name` field that is not the
/// VPN name
fn primary_name(object: &ResourceObject) -> Option<String> {
    object
        .iter()
        .filter(|(key, _)| key.ends_with("Name") && key.as_str() != "msgVpnName")
        .find_map(|(_, value)| value.as_str().map(String::from))
}

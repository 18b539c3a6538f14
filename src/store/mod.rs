//! File-tree resource store
//!
//! The crawl output directory mirrors the API's URL hierarchy below the VPN
//! root: one directory per path segment, one JSON file per persisted
//! envelope. File stems are deduplicated per (path, name) through the
//! [`DedupRegistry`] so re-visits never clobber earlier files.

pub mod resolver;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use wax::{CandidatePath, Glob, Pattern};

use crate::error::{Result, SempSyncError};
use crate::semp::envelope::ResourceEnvelope;

/// Per-run (path, name) -> collision counter
///
/// The first save for a key gets `name.json`, later ones `name-1.json`,
/// `name-2.json`, ...
#[derive(Debug, Default)]
pub struct DedupRegistry {
    counters: HashMap<String, u32>,
}

impl DedupRegistry {
    /// Next unique file stem for this (path, name) pair
    pub fn unique_stem(&mut self, path: &str, object_name: &str) -> String {
        let key = format!("{}/{}", path, object_name);
        let counter = self.counters.entry(key).or_insert(0);
        let stem = if *counter == 0 {
            object_name.to_string()
        } else {
            format!("{}-{}", object_name, counter)
        };
        *counter += 1;
        stem
    }
}

/// Totals for an end-of-run report
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StoreSummary {
    pub files: u64,
    pub bytes: u64,
}

pub struct ResourceStore {
    root: PathBuf,
    dedup: DedupRegistry,
}

impl ResourceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dedup: DedupRegistry::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute directory for a VPN-relative resource path
    pub fn dir_for(&self, path: &str) -> PathBuf {
        let decoded = decode(path);
        let trimmed = decoded.trim_matches('/');
        if trimmed.is_empty() {
            self.root.clone()
        } else {
            self.root.join(trimmed)
        }
    }

    /// Deduplicated file stem for an object name under a path
    pub fn unique_name(&mut self, path: &str, object_name: &str) -> String {
        self.dedup.unique_stem(path, &decode(object_name))
    }

    /// Persist one envelope under `<root>/<path>/<stem>.json`
    ///
    /// Existing files are never overwritten: a re-run crawl skips them and
    /// returns `None` (stale data is accepted over clobbered data).
    pub fn save(
        &mut self,
        path: &str,
        object_type: &str,
        envelope: &ResourceEnvelope,
    ) -> Result<Option<PathBuf>> {
        let stem = self.unique_name(path, object_type);
        let dir = self.dir_for(path);
        let file = dir.join(format!("{}.json", stem));

        if file.exists() {
            info!(file = %file.display(), "skipping existing file");
            return Ok(None);
        }

        fs::create_dir_all(&dir).map_err(|e| SempSyncError::StoreWriteFailed {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let body = serde_json::to_string_pretty(&envelope.to_stored_body()).map_err(|e| {
            SempSyncError::StoreWriteFailed {
                path: file.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        fs::write(&file, body).map_err(|e| SempSyncError::StoreWriteFailed {
            path: file.display().to_string(),
            reason: e.to_string(),
        })?;

        debug!(file = %file.display(), "wrote envelope");
        Ok(Some(file))
    }

    /// All `<object_type>*.json` files under a path, lexicographically sorted
    /// for deterministic replay order
    pub fn list_matching(&self, path: &str, object_type: &str) -> Result<Vec<PathBuf>> {
        let dir = self.dir_for(path);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let pattern = format!("{}*.json", decode(object_type));
        let glob = Glob::new(&pattern).map_err(|e| SempSyncError::StoreLookupFailed {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let entries = fs::read_dir(&dir).map_err(|e| SempSyncError::StoreLookupFailed {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SempSyncError::StoreLookupFailed {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if glob.matched(&CandidatePath::from(name)).is_some() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Parse one stored envelope
    ///
    /// `Ok(None)` is the expected quiet shape (no `data` field): the caller
    /// skips the file. Only unreadable or corrupt files are errors.
    pub fn load(&self, file: &Path) -> Result<Option<ResourceEnvelope>> {
        let content = fs::read_to_string(file).map_err(|e| SempSyncError::StoreReadFailed {
            path: file.display().to_string(),
            reason: e.to_string(),
        })?;
        let body: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| SempSyncError::StoreParseFailed {
                path: file.display().to_string(),
                reason: e.to_string(),
            })?;

        let envelope = ResourceEnvelope::from_stored_body(&body);
        if envelope.is_none() {
            debug!(file = %file.display(), "no data element in stored file");
        }
        Ok(envelope)
    }

    /// Walk the tree and total up the stored files
    pub fn summary(&self) -> StoreSummary {
        let mut summary = StoreSummary::default();
        for entry in walkdir::WalkDir::new(&self.root)
            .into_iter()
            .filter_map(std::result::Result::ok)
        {
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "json")
            {
                summary.files += 1;
                summary.bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
            }
        }
        summary
    }
}

/// Percent-decode a URL-derived path fragment; invalid encodings pass through
fn decode(fragment: &str) -> String {
    urlencoding::decode(fragment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| fragment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn envelope_with_queue(name: &str) -> ResourceEnvelope {
        ResourceEnvelope::from_api_body(&json!({
            "data": [{"queueName": name}],
            "meta": {"responseCode": 200}
        }))
    }

    #[test]
    fn test_unique_stem_sequence() {
        let mut registry = DedupRegistry::default();
        assert_eq!(registry.unique_stem("/queues", "q1"), "q1");
        assert_eq!(registry.unique_stem("/queues", "q1"), "q1-1");
        assert_eq!(registry.unique_stem("/queues", "q1"), "q1-2");
        // A different path starts its own sequence
        assert_eq!(registry.unique_stem("/other", "q1"), "q1");
    }

    #[test]
    fn test_save_dedups_file_names() {
        let temp = TempDir::new().unwrap();
        let mut store = ResourceStore::new(temp.path());
        let envelope = envelope_with_queue("q1");

        let first = store.save("/queues", "q1", &envelope).unwrap().unwrap();
        let second = store.save("/queues", "q1", &envelope).unwrap().unwrap();
        let third = store.save("/queues", "q1", &envelope).unwrap().unwrap();

        assert_eq!(first.file_name().unwrap(), "q1.json");
        assert_eq!(second.file_name().unwrap(), "q1-1.json");
        assert_eq!(third.file_name().unwrap(), "q1-2.json");
    }

    #[test]
    fn test_save_never_overwrites() {
        let temp = TempDir::new().unwrap();

        let mut store = ResourceStore::new(temp.path());
        let path = store
            .save("/queues", "queues", &envelope_with_queue("q1"))
            .unwrap()
            .unwrap();
        let before = fs::read_to_string(&path).unwrap();

        // A fresh run has a fresh registry, so the same stem comes up again
        let mut rerun = ResourceStore::new(temp.path());
        let skipped = rerun
            .save("/queues", "queues", &envelope_with_queue("q2"))
            .unwrap();

        assert!(skipped.is_none());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_list_matching_sorted_by_name() {
        let temp = TempDir::new().unwrap();
        let mut store = ResourceStore::new(temp.path());
        store.save("/queues", "queues", &envelope_with_queue("a")).unwrap();
        store.save("/queues", "queues", &envelope_with_queue("b")).unwrap();
        store.save("/queues", "other", &envelope_with_queue("c")).unwrap();

        let files = store.list_matching("/queues", "queues").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["queues-1.json", "queues.json"]);
    }

    #[test]
    fn test_list_matching_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = ResourceStore::new(temp.path());
        assert!(store.list_matching("/nothing/here", "queues").unwrap().is_empty());
    }

    #[test]
    fn test_load_quiet_when_data_absent() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("empty.json");
        fs::write(&file, r#"{"links": null}"#).unwrap();

        let store = ResourceStore::new(temp.path());
        assert!(store.load(&file).unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_file_is_error() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("bad.json");
        fs::write(&file, "{not json").unwrap();

        let store = ResourceStore::new(temp.path());
        assert!(matches!(
            store.load(&file),
            Err(SempSyncError::StoreParseFailed { .. })
        ));
    }

    #[test]
    fn test_percent_decoded_paths() {
        let temp = TempDir::new().unwrap();
        let mut store = ResourceStore::new(temp.path());
        store
            .save("/aclProfiles/%23acl1/clientConnectExceptions", "clientConnectExceptions", &envelope_with_queue("x"))
            .unwrap()
            .unwrap();

        let files = store
            .list_matching("/aclProfiles/#acl1/clientConnectExceptions", "clientConnectExceptions")
            .unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_summary_counts_files() {
        let temp = TempDir::new().unwrap();
        let mut store = ResourceStore::new(temp.path());
        store.save("/queues", "queues", &envelope_with_queue("q1")).unwrap();
        store.save("/queues/q1/subscriptions", "subscriptions", &envelope_with_queue("s")).unwrap();

        let summary = store.summary();
        assert_eq!(summary.files, 2);
        assert!(summary.bytes > 0);
    }
}

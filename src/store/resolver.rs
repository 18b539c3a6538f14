//! Link URI resolution
//!
//! Maps a SEMP link URI onto the store: the last path segment is the object
//! type, the second-to-last the owning object's name. Most child collections
//! are stored directly under the current path; some object types sit one
//! level deeper because their owner's name is part of the canonical path
//! (e.g. `aclProfiles/acl1/clientConnectExceptions`). For those the lookup
//! falls back from `<base>/<type>` to `<base>/<owner>/<type>`.
//!
//! The fallback is a heuristic inferred from observed URL shapes. It covers
//! exactly two levels; deeper nesting has not been observed against the real
//! API and is deliberately not generalized.

use std::path::PathBuf;

use super::ResourceStore;
use crate::error::Result;

/// The two trailing segments of a link URI, percent-decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    pub object_type: String,
    pub owner: String,
}

/// Split a link URI into its object type and owning object name
pub fn split_link(link: &str) -> Option<LinkTarget> {
    let path = link.split('?').next().unwrap_or(link);
    let segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();
    if segments.len() < 2 {
        return None;
    }
    let object_type = decode(segments[segments.len() - 1]);
    let owner = decode(segments[segments.len() - 2]);
    if object_type.is_empty() {
        return None;
    }
    Some(LinkTarget { object_type, owner })
}

/// The sub-path of a URL below the VPN marker, plus its last segment
///
/// `http://h/SEMP/v2/config/msgVpns/v1/queues?count=10` with vpn `v1` yields
/// `("/queues", "queues")`; the VPN root itself yields `("", "")`.
pub fn url_sub_path(url: &str, vpn: &str) -> (String, String) {
    let tail = match url.find(vpn) {
        Some(index) => &url[index + vpn.len()..],
        None => "",
    };
    let path = tail.split('?').next().unwrap_or("").to_string();
    let stem = path.rsplit('/').next().unwrap_or("").to_string();
    (path, decode(&stem))
}

/// Where a link's stored files were found
#[derive(Debug)]
pub struct ResolvedBranch {
    pub files: Vec<PathBuf>,
    /// Store-relative path the files live under
    pub sub_path: String,
    /// True when the owner-level fallback was taken; the target URL must
    /// then carry the owner segment too
    pub via_owner: bool,
}

/// Locate the stored files for a link below `base_path`
///
/// Tries `<base>/<type>` first, then `<base>/<owner>/<type>`. Lookup errors
/// propagate so the caller can abandon just this branch.
pub fn resolve_branch(
    store: &ResourceStore,
    base_path: &str,
    target: &LinkTarget,
) -> Result<ResolvedBranch> {
    let direct = format!("{}/{}", base_path, target.object_type);
    let files = store.list_matching(&direct, &target.object_type)?;
    if !files.is_empty() {
        return Ok(ResolvedBranch {
            files,
            sub_path: direct,
            via_owner: false,
        });
    }

    let nested = format!("{}/{}/{}", base_path, target.owner, target.object_type);
    let files = store.list_matching(&nested, &target.object_type)?;
    Ok(ResolvedBranch {
        files,
        sub_path: nested,
        via_owner: true,
    })
}

fn decode(fragment: &str) -> String {
    urlencoding::decode(fragment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| fragment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semp::envelope::ResourceEnvelope;
    use serde_json::json;
    use tempfile::TempDir;

    fn stub_envelope() -> ResourceEnvelope {
        ResourceEnvelope::from_api_body(&json!({"data": [{"queueName": "q"}]}))
    }

    #[test]
    fn test_split_link_basic() {
        let target =
            split_link("http://h:8080/SEMP/v2/config/msgVpns/v1/queues/q1/subscriptions").unwrap();
        assert_eq!(target.object_type, "subscriptions");
        assert_eq!(target.owner, "q1");
    }

    #[test]
    fn test_split_link_strips_query_and_decodes() {
        let target =
            split_link("http://h/SEMP/v2/config/msgVpns/v1/aclProfiles/%23acl1/clientConnectExceptions?count=10")
                .unwrap();
        assert_eq!(target.object_type, "clientConnectExceptions");
        assert_eq!(target.owner, "#acl1");
    }

    #[test]
    fn test_url_sub_path() {
        let (path, stem) =
            url_sub_path("http://h/SEMP/v2/config/msgVpns/v1/queues?count=10", "v1");
        assert_eq!(path, "/queues");
        assert_eq!(stem, "queues");

        let (path, stem) = url_sub_path("http://h/SEMP/v2/config/msgVpns/v1", "v1");
        assert_eq!(path, "");
        assert_eq!(stem, "");
    }

    #[test]
    fn test_resolve_branch_direct() {
        let temp = TempDir::new().unwrap();
        let mut store = ResourceStore::new(temp.path());
        store.save("/queues", "queues", &stub_envelope()).unwrap();

        let target = split_link("http://h/SEMP/v2/config/msgVpns/v1/queues").unwrap();
        let branch = resolve_branch(&store, "", &target).unwrap();

        assert_eq!(branch.files.len(), 1);
        assert_eq!(branch.sub_path, "/queues");
        assert!(!branch.via_owner);
    }

    #[test]
    fn test_resolve_branch_falls_back_one_level() {
        let temp = TempDir::new().unwrap();
        let mut store = ResourceStore::new(temp.path());
        store
            .save("/aclProfiles/acl1/clientConnectExceptions", "clientConnectExceptions", &stub_envelope())
            .unwrap();

        let target = split_link(
            "http://h/SEMP/v2/config/msgVpns/v1/aclProfiles/acl1/clientConnectExceptions",
        )
        .unwrap();
        let branch = resolve_branch(&store, "/aclProfiles", &target).unwrap();

        assert_eq!(branch.files.len(), 1);
        assert_eq!(branch.sub_path, "/aclProfiles/acl1/clientConnectExceptions");
        assert!(branch.via_owner);
    }

    #[test]
    fn test_resolve_branch_empty_when_nothing_stored() {
        let temp = TempDir::new().unwrap();
        let store = ResourceStore::new(temp.path());

        let target = split_link("http://h/SEMP/v2/config/msgVpns/v1/queues").unwrap();
        let branch = resolve_branch(&store, "", &target).unwrap();
        assert!(branch.files.is_empty());
    }
}

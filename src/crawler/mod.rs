//! Recursive configuration crawler
//!
//! Walks the SEMPv2 config tree from the VPN root and persists every
//! resource into the [`ResourceStore`]. Per visit: fetch the resource, drain
//! its pagination cursors, save the merged envelope once, then follow its
//! link relations into child resources. Recursion ends when a link set holds
//! nothing but the `uri` self-relation or when a declared leaf type is
//! reached; a hard depth cap bounds cyclic or malformed link data.
//!
//! A failing branch is logged and abandoned; its siblings still run. The
//! only fatal error is a failure at the VPN root itself.

use std::collections::BTreeSet;

use tracing::{debug, info, trace, warn};

use crate::config::SkipPolicy;
use crate::error::Result;
use crate::report::RunStats;
use crate::semp::envelope::{LinkSet, ResourceEnvelope, URI_RELATION};
use crate::semp::SempApi;
use crate::store::{resolver, ResourceStore};

/// Hard bound on link recursion; a safety net against cyclic or malformed
/// link data the leaf list fails to catch
const MAX_LINK_DEPTH: usize = 20;

/// Everything the crawler needs to know about the source broker
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// VPN being exported; also the marker splitting URLs into store paths
    pub vpn: String,
    /// Root of the config API, e.g. `http://host:8080/SEMP/v2/config`
    pub base_url: String,
    /// Requested collection page size; 0 disables paging
    pub page_size: u32,
    /// Object types that reject a page-size parameter
    pub no_paging: BTreeSet<String>,
}

impl CrawlSettings {
    fn page_size_for(&self, url: &str) -> Option<u32> {
        if self.page_size == 0 {
            return None;
        }
        let last_segment = url
            .split('?')
            .next()
            .unwrap_or(url)
            .rsplit('/')
            .next()
            .unwrap_or("");
        if self.no_paging.contains(last_segment) {
            debug!(object_type = last_segment, "paging disabled for element");
            return None;
        }
        Some(self.page_size)
    }
}

pub struct Crawler<'a, A: SempApi> {
    api: &'a A,
    store: &'a mut ResourceStore,
    skip: &'a SkipPolicy,
    settings: CrawlSettings,
    stats: RunStats,
}

impl<'a, A: SempApi> Crawler<'a, A> {
    pub fn new(
        api: &'a A,
        store: &'a mut ResourceStore,
        skip: &'a SkipPolicy,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            api,
            store,
            skip,
            settings,
            stats: RunStats::new(),
        }
    }

    /// Export the whole VPN config tree; returns the run counters
    pub fn crawl_vpn(mut self) -> Result<RunStats> {
        let root_url = format!("{}/msgVpns/{}", self.settings.base_url, self.settings.vpn);
        info!(url = %root_url, "crawling VPN");
        self.visit(&root_url, false, 0)?;
        Ok(self.stats)
    }

    /// One resource visit: fetch all pages, persist once, recurse into links
    fn visit(&mut self, url: &str, collection: bool, depth: usize) -> Result<()> {
        let envelope = self.fetch_merged(url, collection)?;

        let (path, stem) = resolver::url_sub_path(url, &self.settings.vpn);
        let stem = if stem.is_empty() {
            self.settings.vpn.clone()
        } else {
            stem
        };

        if self.store.save(&path, &stem, &envelope)?.is_some() {
            self.stats.saved += 1;
        }

        // Leaf types are persisted but never expanded
        if self.skip.is_leaf(&stem) {
            debug!(object_type = %stem, "leaf type, not following links");
            return Ok(());
        }

        self.follow_links(&envelope.links, depth);
        Ok(())
    }

    /// Fetch a resource and drain its pagination cursors into one envelope
    ///
    /// Cursor URIs are followed verbatim; the page-size parameter is already
    /// embedded in them. A non-200 page is returned as parsed (usually
    /// empty) so the caller persists what the broker said and moves on.
    fn fetch_merged(&mut self, url: &str, collection: bool) -> Result<ResourceEnvelope> {
        let page_size = if collection {
            self.settings.page_size_for(url)
        } else {
            None
        };

        self.stats.gets += 1;
        let reply = self.api.get(url, page_size)?;
        if !reply.is_http_ok() {
            warn!(url, http_status = reply.http_status, "unable to read resource, persisting as-is");
            return Ok(ResourceEnvelope::from_api_body(&reply.body));
        }

        let mut merged = ResourceEnvelope::from_api_body(&reply.body);
        let mut next = merged.next_page_uri.take();

        while let Some(cursor) = next {
            debug!(cursor = %cursor, "following next page");
            self.stats.gets += 1;
            self.stats.pages += 1;
            let reply = self.api.get(&cursor, None)?;
            if !reply.is_http_ok() {
                warn!(cursor = %cursor, http_status = reply.http_status, "next page unreadable, keeping partial merge");
                break;
            }
            let page = ResourceEnvelope::from_api_body(&reply.body);
            next = page.next_page_uri.clone();
            merged.merge_page(page);
        }

        // Fully drained; stored envelopes never carry a live cursor
        merged.next_page_uri = None;
        Ok(merged)
    }

    /// One pass over a merged link set, recursing into each child resource
    fn follow_links(&mut self, links: &LinkSet, depth: usize) {
        for map in links.maps() {
            let relations: Vec<(&String, &String)> = map
                .iter()
                .filter(|(relation, _)| relation.as_str() != URI_RELATION)
                .collect();
            if relations.is_empty() {
                trace!("no non-uri links");
                continue;
            }

            for (relation, link) in relations {
                self.stats.links += 1;

                let Some(target) = resolver::split_link(link) else {
                    warn!(link, "cannot split link, dropping branch");
                    self.stats.abandoned += 1;
                    continue;
                };

                // Children of leaf-type collections are never fetched
                if self.skip.is_leaf(&target.owner) {
                    debug!(owner = %target.owner, link, "leaf branch, not fetching");
                    continue;
                }

                if depth + 1 >= MAX_LINK_DEPTH {
                    warn!(link, depth, "link depth cap reached, dropping branch");
                    self.stats.abandoned += 1;
                    continue;
                }

                trace!(relation = %relation, link, "processing link");
                if let Err(e) = self.visit(link, true, depth + 1) {
                    warn!(error = %e, link, "abandoning link branch");
                    self.stats.abandoned += 1;
                }
            }
        }
    }
}

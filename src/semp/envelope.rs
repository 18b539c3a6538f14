//! The `{data, links, nextPage}` envelope
//!
//! Every SEMP response and every stored file is one envelope. The
//! single-object-or-list ambiguity of the wire format (`data` may be an
//! object or an array, `links` may be a map or an array of maps) is resolved
//! once here; downstream code only ever sees [`ResourceEnvelope`] and
//! [`LinkSet`].

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

/// One opaque configuration object as returned by the broker
pub type ResourceObject = Map<String, Value>;

/// Relation name -> link URI
pub type LinkMap = BTreeMap<String, String>;

/// The self-relation present in every link map; never expanded recursively
pub const URI_RELATION: &str = "uri";

/// Link relations of one envelope, shape resolved at parse time
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LinkSet {
    #[default]
    Empty,
    /// A single object's relations
    Single(LinkMap),
    /// One map per object of a collection; order is the broker's order
    Many(Vec<LinkMap>),
}

impl LinkSet {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Array(items)) => {
                LinkSet::Many(items.iter().map(link_map_from_value).collect())
            }
            Some(Value::Object(map)) => LinkSet::Single(link_map_from_object(map)),
            _ => LinkSet::Empty,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            LinkSet::Empty => Value::Null,
            LinkSet::Single(map) => link_map_to_value(map),
            LinkSet::Many(maps) => Value::Array(maps.iter().map(link_map_to_value).collect()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            LinkSet::Empty => true,
            LinkSet::Single(map) => map.is_empty(),
            LinkSet::Many(maps) => maps.iter().all(BTreeMap::is_empty),
        }
    }

    /// The link maps in presentation order
    pub fn maps(&self) -> Vec<&LinkMap> {
        match self {
            LinkSet::Empty => Vec::new(),
            LinkSet::Single(map) => vec![map],
            LinkSet::Many(maps) => maps.iter().collect(),
        }
    }

    /// Append another envelope's links, preserving order
    pub fn merge(&mut self, other: LinkSet) {
        if matches!(other, LinkSet::Empty) {
            return;
        }
        let mut merged = match std::mem::take(self) {
            LinkSet::Empty => Vec::new(),
            LinkSet::Single(map) => vec![map],
            LinkSet::Many(maps) => maps,
        };
        match other {
            LinkSet::Empty => {}
            LinkSet::Single(map) => merged.push(map),
            LinkSet::Many(maps) => merged.extend(maps),
        }
        *self = LinkSet::Many(merged);
    }
}

fn link_map_from_value(value: &Value) -> LinkMap {
    match value {
        Value::Object(map) => link_map_from_object(map),
        _ => LinkMap::new(),
    }
}

fn link_map_from_object(map: &Map<String, Value>) -> LinkMap {
    map.iter()
        .filter_map(|(relation, uri)| {
            uri.as_str()
                .map(|u| (relation.clone(), u.to_string()))
        })
        .collect()
}

fn link_map_to_value(map: &LinkMap) -> Value {
    Value::Object(
        map.iter()
            .map(|(relation, uri)| (relation.clone(), Value::String(uri.clone())))
            .collect(),
    )
}

/// Status information from the `meta` section of a SEMP response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMeta {
    pub response_code: Option<i64>,
    pub error_status: Option<String>,
    pub error_description: Option<String>,
    pub next_page_uri: Option<String>,
}

impl ResponseMeta {
    pub fn from_body(body: &Value) -> Self {
        let meta = &body["meta"];
        Self {
            response_code: meta["responseCode"].as_i64(),
            error_status: meta["error"]["status"].as_str().map(String::from),
            error_description: meta["error"]["description"].as_str().map(String::from),
            next_page_uri: meta["paging"]["nextPageUri"].as_str().map(String::from),
        }
    }
}

/// The unit of exchange for every fetched or stored resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceEnvelope {
    pub data: Vec<ResourceObject>,
    pub links: LinkSet,
    pub next_page_uri: Option<String>,
}

impl ResourceEnvelope {
    /// Parse one API response body into an envelope
    ///
    /// A `data` object (single-resource GET) becomes a one-element sequence;
    /// an absent `data` field (error bodies) an empty one.
    pub fn from_api_body(body: &Value) -> Self {
        let data = match body.get("data") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_object().cloned())
                .collect(),
            Some(Value::Object(object)) => vec![object.clone()],
            _ => Vec::new(),
        };
        Self {
            data,
            links: LinkSet::from_value(body.get("links")),
            next_page_uri: ResponseMeta::from_body(body).next_page_uri,
        }
    }

    /// Parse a stored file body; `None` when the `data` field is absent
    /// (the expected "quiet" shape, not an error)
    pub fn from_stored_body(body: &Value) -> Option<Self> {
        body.get("data")?;
        let mut envelope = Self::from_api_body(body);
        envelope.next_page_uri = body["next_page_uri"].as_str().map(String::from);
        Some(envelope)
    }

    /// The `{data, links, next_page_uri}` shape written to the store
    pub fn to_stored_body(&self) -> Value {
        json!({
            "data": self.data.iter().cloned().map(Value::Object).collect::<Vec<_>>(),
            "links": self.links.to_value(),
            "next_page_uri": self.next_page_uri,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.links.is_empty()
    }

    /// Fold one more page of the same logical collection into this envelope
    pub fn merge_page(&mut self, page: ResourceEnvelope) {
        self.data.extend(page.data);
        self.links.merge(page.links);
        self.next_page_uri = page.next_page_uri;
    }
}

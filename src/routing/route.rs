//! Route model and its mapping to Caddy's JSON schema.
//!
//! ```text
//! {
//!   "@id": "api.example.com",
//!   "match": [{ "host": ["api.example.com"] }],
//!   "handle": [{ "handler": "reverse_proxy", "upstreams": [{ "dial": "localhost:8080" }] }],
//!   "terminal": true
//! }
//! ```
//!
//! Decoding checks structure only. ID uniqueness and the like are the
//! reconciler's business. Fields this model does not name (other matchers,
//! proxy transport settings, route groups) are carried in `extra` maps so a
//! decoded route encodes back to the same JSON.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CaddyError, CaddyResult};

/// Caddy's field name for object IDs.
pub const ID_FIELD: &str = "@id";

/// One entry of a server's route list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(rename = "@id")]
    pub id: String,

    /// Match sets, OR-ed together by Caddy.
    #[serde(rename = "match")]
    pub matchers: Vec<MatchSet>,

    /// Handler chain, evaluated in order.
    pub handle: Vec<Handler>,

    /// Stop evaluating further routes once this one matches.
    #[serde(default, skip_serializing_if = "is_false")]
    pub terminal: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A single match condition. Host patterns are typed; `path`, `header` and
/// the other matchers stay in `extra`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSet {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MatchSet {
    pub fn hosts<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            host: hosts.into_iter().map(Into::into).collect(),
            extra: Map::new(),
        }
    }
}

/// Backend address a reverse proxy forwards to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upstream {
    pub dial: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Upstream {
    pub fn new(dial: impl Into<String>) -> Self {
        Self {
            dial: dial.into(),
            extra: Map::new(),
        }
    }
}

/// A handler in a route's chain, tagged by Caddy's `handler` field.
#[derive(Debug, Clone, PartialEq)]
pub enum Handler {
    /// `fields` holds `transport`, `load_balancing` and the rest verbatim.
    ReverseProxy {
        upstreams: Vec<Upstream>,
        fields: Map<String, Value>,
    },
    /// Nested route list. Entries stay raw JSON since nested routes need not
    /// carry IDs.
    Subroute { routes: Vec<Value> },
    /// Any other handler, kept verbatim.
    Other { handler: String, fields: Map<String, Value> },
}

impl Handler {
    pub fn reverse_proxy<I, S>(dials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Handler::ReverseProxy {
            upstreams: dials.into_iter().map(Upstream::new).collect(),
            fields: Map::new(),
        }
    }

    pub fn static_response(status_code: u16) -> Self {
        let mut fields = Map::new();
        fields.insert("status_code".to_string(), Value::from(status_code));
        Handler::Other {
            handler: "static_response".to_string(),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Handler::ReverseProxy { .. } => "reverse_proxy",
            Handler::Subroute { .. } => "subroute",
            Handler::Other { handler, .. } => handler,
        }
    }
}

impl Serialize for Handler {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("handler", self.name())?;
        match self {
            Handler::ReverseProxy { upstreams, fields } => {
                map.serialize_entry("upstreams", upstreams)?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
            }
            Handler::Subroute { routes } => map.serialize_entry("routes", routes)?,
            Handler::Other { fields, .. } => {
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Handler {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        let handler = match fields.remove("handler") {
            Some(Value::String(name)) => name,
            Some(other) => return Err(de::Error::custom(format!("handler tag must be a string, got {}", other))),
            None => return Err(de::Error::missing_field("handler")),
        };

        match handler.as_str() {
            "reverse_proxy" => {
                let upstreams = match fields.remove("upstreams") {
                    Some(raw) => serde_json::from_value(raw)
                        .map_err(|e| de::Error::custom(format!("reverse_proxy upstreams: {}", e)))?,
                    None => Vec::new(),
                };
                Ok(Handler::ReverseProxy { upstreams, fields })
            }
            "subroute" => {
                let routes = match fields.remove("routes") {
                    Some(Value::Array(routes)) => routes,
                    Some(Value::Null) | None => Vec::new(),
                    Some(_) => return Err(de::Error::custom("subroute routes must be an array")),
                };
                Ok(Handler::Subroute { routes })
            }
            _ => Ok(Handler::Other { handler, fields }),
        }
    }
}

impl Route {
    /// A terminal route matching `hosts` with the given handler chain.
    pub fn new<I, S>(id: impl Into<String>, hosts: I, handle: Vec<Handler>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            matchers: vec![MatchSet::hosts(hosts)],
            handle,
            terminal: true,
            extra: Map::new(),
        }
    }

    /// Single-host, single-upstream proxy route identified by `from_host`.
    pub fn reverse_proxy(from_host: &str, to_addr: &str) -> Self {
        Self::new(from_host, [from_host], vec![Handler::reverse_proxy([to_addr])])
    }

    /// Serialize into Caddy's JSON shape.
    pub fn encode(&self) -> CaddyResult<Value> {
        if self.id.trim().is_empty() {
            return Err(CaddyError::Schema("route ID must not be empty".to_string()));
        }
        serde_json::to_value(self).map_err(CaddyError::schema)
    }

    /// Parse a route from Caddy's JSON shape.
    pub fn decode(value: &Value) -> CaddyResult<Self> {
        let route: Route = Route::deserialize(value).map_err(CaddyError::schema)?;
        if route.id.trim().is_empty() {
            return Err(CaddyError::Schema("route ID must not be empty".to_string()));
        }
        Ok(route)
    }

    /// Read only the identity of a raw route entry.
    pub fn decode_id(value: &Value) -> CaddyResult<&str> {
        match value.get(ID_FIELD) {
            Some(Value::String(id)) if !id.trim().is_empty() => Ok(id.as_str()),
            Some(_) => Err(CaddyError::Schema(format!("{} must be a non-empty string", ID_FIELD))),
            None => Err(CaddyError::Schema(format!("missing field `{}`", ID_FIELD))),
        }
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.matchers.iter().flat_map(|m| m.host.iter().map(String::as_str))
    }

    /// Dial addresses of every reverse-proxy handler, in chain order.
    pub fn upstreams(&self) -> Vec<&str> {
        self.handle
            .iter()
            .filter_map(|h| match h {
                Handler::ReverseProxy { upstreams, .. } => Some(upstreams),
                _ => None,
            })
            .flatten()
            .map(|u| u.dial.as_str())
            .collect()
    }
}

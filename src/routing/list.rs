//! A server's route list as fetched from the admin API.
//!
//! Entries stay raw JSON so routes this client does not model survive a
//! read-modify-write untouched. IDs are searched through `subroute` handlers
//! recursively, since sub-proxies live inside wildcard routes.

use serde_json::Value;

use crate::error::{CaddyError, CaddyResult};
use crate::routing::route::Route;

/// Where a new route lands. Caddy evaluates routes in list order, so later
/// entries have lower priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutePosition {
    #[default]
    Last,
    First,
    /// Clamped to the list length.
    Index(usize),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteList {
    entries: Vec<Value>,
}

impl RouteList {
    pub fn new(entries: Vec<Value>) -> Self {
        Self { entries }
    }

    /// Wrap a fetched `routes` value. `null` counts as an empty list.
    pub fn from_value(value: Value) -> CaddyResult<Self> {
        match value {
            Value::Array(entries) => Ok(Self { entries }),
            Value::Null => Ok(Self::default()),
            other => Err(CaddyError::Schema(format!("route list must be an array, got {}", other))),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Array(self.entries)
    }

    pub fn entries(&self) -> &[Value] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-level entries that decode as routes; the rest are skipped.
    pub fn decoded(&self) -> Vec<Route> {
        self.entries
            .iter()
            .filter_map(|entry| match Route::decode(entry) {
                Ok(route) => Some(route),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping route entry that does not decode");
                    None
                }
            })
            .collect()
    }

    /// IDs of every route in the tree, depth-first.
    pub fn ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        collect_ids(&self.entries, &mut ids);
        ids
    }

    pub fn contains_id(&self, id: &str) -> bool {
        tree_contains(&self.entries, id)
    }

    /// Index of a top-level route with this ID.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|entry| has_id(entry, id))
    }

    pub fn insert(&mut self, position: RoutePosition, route: Value) {
        insert_at(&mut self.entries, position, route);
    }

    /// Remove every route with this ID, nested ones included. Returns how many went.
    pub fn remove_id(&mut self, id: &str) -> usize {
        remove_from(&mut self.entries, id)
    }

    /// Swap the route with this ID for `route`, keeping its slot. Returns
    /// false when the ID is absent.
    pub fn replace_id(&mut self, id: &str, route: Value) -> bool {
        let mut replacement = Some(route);
        replace_in(&mut self.entries, id, &mut replacement);
        replacement.is_none()
    }

    /// Nested route list of the first `subroute` handler of top-level route `id`.
    pub fn subroute_mut(&mut self, id: &str) -> Option<&mut Vec<Value>> {
        let entry = self.entries.iter_mut().find(|entry| has_id(entry, id))?;
        entry
            .get_mut("handle")?
            .as_array_mut()?
            .iter_mut()
            .find(|handler| is_subroute(handler))
            .and_then(|handler| {
                let obj = handler.as_object_mut()?;
                let routes = obj.entry("routes").or_insert_with(|| Value::Array(Vec::new()));
                if routes.is_null() {
                    *routes = Value::Array(Vec::new());
                }
                routes.as_array_mut()
            })
    }
}

/// Place `route` into any route array, nested ones included.
pub fn insert_at(entries: &mut Vec<Value>, position: RoutePosition, route: Value) {
    match position {
        RoutePosition::Last => entries.push(route),
        RoutePosition::First => entries.insert(0, route),
        RoutePosition::Index(index) => {
            let index = index.min(entries.len());
            entries.insert(index, route);
        }
    }
}

fn has_id(entry: &Value, id: &str) -> bool {
    Route::decode_id(entry).map(|found| found == id).unwrap_or(false)
}

fn is_subroute(handler: &Value) -> bool {
    handler.get("handler").and_then(Value::as_str) == Some("subroute")
}

fn nested(entry: &Value) -> impl Iterator<Item = &Vec<Value>> {
    entry
        .get("handle")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|handler| is_subroute(handler))
        .filter_map(|handler| handler.get("routes").and_then(Value::as_array))
}

fn nested_mut(entry: &mut Value) -> impl Iterator<Item = &mut Vec<Value>> {
    entry
        .get_mut("handle")
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten()
        .filter(|handler| is_subroute(handler))
        .filter_map(|handler| handler.get_mut("routes").and_then(Value::as_array_mut))
}

fn tree_contains(entries: &[Value], id: &str) -> bool {
    entries
        .iter()
        .any(|entry| has_id(entry, id) || nested(entry).any(|routes| tree_contains(routes, id)))
}

fn collect_ids(entries: &[Value], ids: &mut Vec<String>) {
    for entry in entries {
        if let Ok(id) = Route::decode_id(entry) {
            ids.push(id.to_string());
        }
        for routes in nested(entry) {
            collect_ids(routes, ids);
        }
    }
}

fn remove_from(entries: &mut Vec<Value>, id: &str) -> usize {
    let before = entries.len();
    entries.retain(|entry| !has_id(entry, id));
    let mut removed = before - entries.len();
    for entry in entries.iter_mut() {
        for routes in nested_mut(entry) {
            removed += remove_from(routes, id);
        }
    }
    removed
}

fn replace_in(entries: &mut [Value], id: &str, replacement: &mut Option<Value>) {
    for entry in entries.iter_mut() {
        if replacement.is_none() {
            return;
        }
        if has_id(entry, id) {
            if let Some(route) = replacement.take() {
                *entry = route;
            }
            return;
        }
        for routes in nested_mut(entry) {
            replace_in(routes, id, replacement);
        }
    }
}

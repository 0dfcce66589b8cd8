//! Shared utilities for integration testing.
//!
//! `MockCaddy` is an in-memory admin API that follows Caddy's verb
//! semantics on `/config/...`:
//! - GET answers `null` for unset keys
//! - POST appends to arrays, otherwise sets or replaces
//! - PUT creates only, 409 when the key exists
//! - PATCH replaces only, 404 when the key is missing
//! - DELETE removes, 404 when the key is missing

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use caddy_admin::net::HttpTransport;
use caddy_admin::AdminClient;

#[derive(Default)]
struct Inner {
    config: Mutex<Value>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

/// Handle on a running mock admin API.
#[derive(Clone)]
pub struct MockCaddy {
    inner: Arc<Inner>,
    url: String,
}

impl MockCaddy {
    /// Start with an empty configuration.
    pub async fn start() -> Self {
        Self::start_with(Value::Null).await
    }

    pub async fn start_with(config: Value) -> Self {
        let inner = Arc::new(Inner {
            config: Mutex::new(config),
            ..Default::default()
        });

        let app = Router::new().fallback(handle).with_state(inner.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            inner,
            url: format!("http://{}", addr),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn client(&self) -> AdminClient {
        let transport =
            HttpTransport::with_timeouts(&self.url, Duration::from_secs(5), Duration::from_secs(2)).unwrap();
        AdminClient::new(Arc::new(transport))
    }

    /// Full configuration as currently stored.
    pub fn config(&self) -> Value {
        self.inner.config.lock().unwrap().clone()
    }

    /// Routes of `srv0`, or `Null`.
    pub fn routes(&self) -> Value {
        self.config()
            .pointer("/apps/http/servers/srv0/routes")
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Number of successful non-GET requests so far.
    pub fn writes(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent write answer 500.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }
}

/// Config tree with an empty `srv0`, the state after setup.
pub fn bootstrapped() -> Value {
    json!({
        "apps": {
            "http": {
                "servers": {
                    "srv0": { "listen": [":80", ":443"], "routes": [] }
                }
            }
        }
    })
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, axum::Json(json!({ "error": message.into() }))).into_response()
}

fn pointer(segments: &[String]) -> String {
    segments
        .iter()
        .map(|s| format!("/{}", s.replace('~', "~0").replace('/', "~1")))
        .collect()
}

async fn handle(State(inner): State<Arc<Inner>>, method: Method, uri: Uri, body: Bytes) -> Response {
    let Some(rest) = uri.path().strip_prefix("/config") else {
        return error(StatusCode::NOT_FOUND, "unknown endpoint");
    };
    let segments: Vec<String> = rest.split('/').filter(|s| !s.is_empty()).map(str::to_string).collect();

    if method == Method::GET {
        let config = inner.config.lock().unwrap();
        // Every node above the last segment must exist; only the leaf may be unset.
        for depth in 0..segments.len() {
            let node = config.pointer(&pointer(&segments[..depth]));
            if !matches!(node, Some(Value::Object(_)) | Some(Value::Array(_))) {
                let at = segments[..=depth].join("/");
                return error(
                    StatusCode::BAD_REQUEST,
                    format!("invalid traversal path at: config/{}", at),
                );
            }
        }
        let value = config.pointer(&pointer(&segments)).cloned().unwrap_or(Value::Null);
        return (StatusCode::OK, axum::Json(value)).into_response();
    }

    if inner.fail_writes.load(Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "injected failure");
    }

    let payload = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(value) => value,
            Err(e) => return error(StatusCode::BAD_REQUEST, e.to_string()),
        }
    };

    let mut config = inner.config.lock().unwrap();
    let result = match method {
        Method::POST => post(&mut config, &segments, payload),
        Method::PUT => put(&mut config, &segments, payload),
        Method::PATCH => patch(&mut config, &segments, payload),
        Method::DELETE => delete(&mut config, &segments),
        _ => Err((StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())),
    };

    match result {
        Ok(()) => {
            inner.writes.fetch_add(1, Ordering::SeqCst);
            StatusCode::OK.into_response()
        }
        Err((status, message)) => error(status, message),
    }
}

type Outcome = Result<(), (StatusCode, String)>;

fn split(segments: &[String]) -> (String, &str) {
    match segments.split_last() {
        Some((last, parent)) => (pointer(parent), last.as_str()),
        None => (String::new(), ""),
    }
}

fn post(config: &mut Value, segments: &[String], payload: Value) -> Outcome {
    if let Some(target) = config.pointer_mut(&pointer(segments)) {
        match target {
            Value::Array(items) => items.push(payload),
            other => *other = payload,
        }
        return Ok(());
    }
    let (parent, key) = split(segments);
    match config.pointer_mut(&parent) {
        Some(Value::Object(map)) => {
            map.insert(key.to_string(), payload);
            Ok(())
        }
        _ => Err((StatusCode::BAD_REQUEST, format!("parent of {} does not exist", key))),
    }
}

fn put(config: &mut Value, segments: &[String], payload: Value) -> Outcome {
    if segments.is_empty() {
        if !config.is_null() {
            return Err((StatusCode::CONFLICT, "config already exists".to_string()));
        }
        *config = payload;
        return Ok(());
    }
    if config.pointer(&pointer(segments)).is_some() {
        return Err((StatusCode::CONFLICT, "key already exists".to_string()));
    }
    let (parent, key) = split(segments);
    match config.pointer_mut(&parent) {
        Some(Value::Object(map)) => {
            map.insert(key.to_string(), payload);
            Ok(())
        }
        Some(Value::Array(items)) => match key.parse::<usize>() {
            Ok(index) if index <= items.len() => {
                items.insert(index, payload);
                Ok(())
            }
            _ => Err((StatusCode::BAD_REQUEST, format!("invalid index {}", key))),
        },
        _ => Err((StatusCode::BAD_REQUEST, format!("parent of {} does not exist", key))),
    }
}

fn patch(config: &mut Value, segments: &[String], payload: Value) -> Outcome {
    match config.pointer_mut(&pointer(segments)) {
        Some(target) if !segments.is_empty() || !target.is_null() => {
            *target = payload;
            Ok(())
        }
        _ => Err((StatusCode::NOT_FOUND, "key does not exist".to_string())),
    }
}

fn delete(config: &mut Value, segments: &[String]) -> Outcome {
    if segments.is_empty() {
        *config = Value::Null;
        return Ok(());
    }
    let (parent, key) = split(segments);
    let removed = match config.pointer_mut(&parent) {
        Some(Value::Object(map)) => map.remove(key).is_some(),
        Some(Value::Array(items)) => match key.parse::<usize>() {
            Ok(index) if index < items.len() => {
                items.remove(index);
                true
            }
            _ => false,
        },
        _ => false,
    };
    if removed {
        Ok(())
    } else {
        Err((StatusCode::NOT_FOUND, "key does not exist".to_string()))
    }
}

//! Scripted transport for unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use url::Url;

use crate::error::{CaddyError, CaddyResult};
use crate::net::transport::{AdminRequest, AdminResponse, Transport};

/// Replays canned `(status, body)` pairs in order and records every request.
#[derive(Debug)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<(u16, String)>>,
    requests: Mutex<Vec<AdminRequest>>,
    endpoint: Url,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<(u16, &str)>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(|(s, b)| (s, b.to_string())).collect()),
            requests: Mutex::new(Vec::new()),
            endpoint: Url::parse("http://scripted.invalid").unwrap(),
        }
    }

    pub fn requests(&self) -> Vec<AdminRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: AdminRequest) -> CaddyResult<AdminResponse> {
        self.requests.lock().unwrap().push(request);
        let (status, body) = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| CaddyError::network("script exhausted"))?;
        Ok(AdminResponse { status, body })
    }

    fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

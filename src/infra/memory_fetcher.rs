use crate::app::ports::{Fetcher, HttpMethod, HttpRequest, HttpResponse};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Canned-response fetcher for offline runs and tests.
///
/// Unknown URLs answer 404. Every request is recorded so callers can assert
/// on what was fetched.
#[derive(Default, Clone)]
pub struct InMemoryFetcher {
    responses: HashMap<(HttpMethod, String), (u16, Vec<u8>)>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl InMemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_get(self, url: &str, body: &str) -> Self {
        self.with_response(HttpMethod::Get, url, 200, body)
    }

    pub fn with_post(self, url: &str, body: &str) -> Self {
        self.with_response(HttpMethod::Post, url, 200, body)
    }

    pub fn with_status(self, url: &str, status: u16, body: &str) -> Self {
        self.with_response(HttpMethod::Get, url, status, body)
    }

    pub fn with_response(mut self, method: HttpMethod, url: &str, status: u16, body: &str) -> Self {
        self.responses
            .insert((method, url.to_string()), (status, body.as_bytes().to_vec()));
        self
    }

    /// Requests sent so far, in order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Fetcher for InMemoryFetcher {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(request.clone());
        }
        let key = (request.method, request.url.clone());
        let (status, bytes) = self
            .responses
            .get(&key)
            .cloned()
            .unwrap_or_else(|| (404, b"not found".to_vec()));
        debug!(url = %request.url, status, "In-memory response");
        Ok(HttpResponse {
            status,
            bytes,
            content_type: "application/octet-stream".to_string(),
        })
    }
}

//! In-memory `DataApi` for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use super::api::{ApiRequest, ApiResponse, DataApi, TransportError};

#[derive(Debug, Clone)]
pub enum FakeReply {
    Respond(ApiResponse),
    Fail(String),
}

impl FakeReply {
    pub fn json(status: u16, body: &str) -> Self {
        FakeReply::Respond(ApiResponse {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.as_bytes().to_vec(),
        })
    }

    pub fn with_header(self, name: &str, value: &str) -> Self {
        match self {
            FakeReply::Respond(mut response) => {
                response.headers.push((name.to_string(), value.to_string()));
                FakeReply::Respond(response)
            }
            other => other,
        }
    }
}

/// Replies are queued per path. The last queued reply keeps being served.
#[derive(Default)]
pub struct FakeApi {
    routes: Mutex<HashMap<String, VecDeque<FakeReply>>>,
    requests: Mutex<Vec<ApiRequest>>,
    reject_count_preference: Mutex<bool>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, path: &str, reply: FakeReply) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Emulates a cross-origin block triggered by the `Prefer` header.
    pub fn rejecting_count_preference(self) -> Self {
        *self.reject_count_preference.lock().unwrap() = true;
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }
}

#[async_trait(?Send)]
impl DataApi for FakeApi {
    async fn get(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        if request.prefer_exact_count && *self.reject_count_preference.lock().unwrap() {
            return Err(TransportError("blocked by CORS policy".to_string()));
        }

        let mut routes = self.routes.lock().unwrap();
        let reply = match routes.get_mut(&request.path) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        match reply {
            Some(FakeReply::Respond(response)) => Ok(response),
            Some(FakeReply::Fail(reason)) => Err(TransportError(reason)),
            None => Ok(ApiResponse {
                status: 404,
                headers: Vec::new(),
                body: b"not found".to_vec(),
            }),
        }
    }
}

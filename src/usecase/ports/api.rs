use async_trait::async_trait;
use thiserror::Error;

/// Header asking the backend to report an exact total alongside the page.
pub const PREFER_HEADER: &str = "Prefer";
pub const PREFER_EXACT_COUNT: &str = "count=exact";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub path: String,
    pub query: String,
    pub prefer_exact_count: bool,
}

impl ApiRequest {
    pub fn new(path: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: query.into(),
            prefer_exact_count: false,
        }
    }

    pub fn with_exact_count(mut self) -> Self {
        self.prefer_exact_count = true;
        self
    }

    pub fn without_exact_count(mut self) -> Self {
        self.prefer_exact_count = false;
        self
    }

    pub fn url(&self, api_base: &str) -> String {
        let base = api_base.trim_end_matches('/');
        if self.query.is_empty() {
            format!("{base}/{}", self.path)
        } else {
            format!("{base}/{}?{}", self.path, self.query)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The request never produced an HTTP response (unreachable host, blocked origin).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("{}", http_message(.status, .body))]
    Http { status: u16, body: String },

    #[error("malformed response: {0}")]
    Parse(String),
}

fn http_message(status: &u16, body: &str) -> String {
    if body.is_empty() {
        status.to_string()
    } else {
        format!("{status} {body}")
    }
}

impl ApiError {
    pub fn from_status(response: &ApiResponse) -> Self {
        ApiError::Http {
            status: response.status,
            body: response.text().trim().to_string(),
        }
    }
}

/// Read-only access to the remote data API.
#[async_trait(?Send)]
pub trait DataApi {
    async fn get(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

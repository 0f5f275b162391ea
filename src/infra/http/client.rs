use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::usecase::ports::api::{
    ApiRequest, ApiResponse, DataApi, TransportError, PREFER_EXACT_COUNT, PREFER_HEADER,
};

/// `DataApi` over HTTP.
#[derive(Clone)]
pub struct ReqwestApi {
    api_base: String,
    client: reqwest::Client,
}

impl ReqwestApi {
    pub fn new(api_base: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait(?Send)]
impl DataApi for ReqwestApi {
    async fn get(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = self.client.get(request.url(&self.api_base));
        if request.prefer_exact_count {
            builder = builder.header(PREFER_HEADER, PREFER_EXACT_COUNT);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| TransportError(err.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|err| TransportError(err.to_string()))?
            .to_vec();

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

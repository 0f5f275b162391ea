use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::entities::dropdown::DropdownData;
use crate::domain::entities::filters::{ExportFormat, FilterState, Resource};
use crate::domain::entities::record::{decode_rows, FetchResult};
use crate::domain::normalize::{normalize_countries, normalize_providers, normalize_regions};
use crate::domain::query::{self, COUNTRY_COLUMN, NAME_COLUMN, REGION_COLUMN};
use crate::usecase::ports::api::{ApiError, ApiRequest, ApiResponse, DataApi};

/// Headers that may carry the total row count, in priority order.
const TOTAL_HEADERS: [&str; 3] = ["x-total", "x-total-count", "content-range"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
    /// Number of records in the body, when it could be counted.
    pub record_count: Option<usize>,
}

pub struct QueryService {
    api: Arc<dyn DataApi>,
}

impl QueryService {
    pub fn new(api: Arc<dyn DataApi>) -> Self {
        Self { api }
    }

    pub fn table_request(filters: &FilterState) -> ApiRequest {
        ApiRequest::new(
            filters.resource.path_segment(),
            query::build_query_string(filters),
        )
    }

    pub fn export_request(filters: &FilterState, format: ExportFormat) -> ApiRequest {
        let resource = filters.resource.path_segment();
        let path = match format {
            ExportFormat::Json => resource.to_string(),
            ExportFormat::Csv => format!("{resource}.csv"),
        };
        ApiRequest::new(path, query::export_params(filters).encode())
    }

    /// One page of rows plus the total across all pages.
    ///
    /// The page request first asks for an exact count. If that attempt never gets a
    /// response it is repeated once without the preference; HTTP error statuses are
    /// returned as they are.
    pub async fn fetch_page(&self, filters: &FilterState) -> Result<FetchResult, ApiError> {
        let request = Self::table_request(filters).with_exact_count();
        debug!(path = %request.path, query = %request.query, "fetching table page");

        let response = match self.api.get(request.clone()).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "table request failed, retrying without count preference");
                self.api.get(request.without_exact_count()).await?
            }
        };

        if !response.is_success() {
            return Err(ApiError::from_status(&response));
        }

        let body = serde_json::from_slice::<Value>(&response.body)
            .map_err(|err| ApiError::Parse(err.to_string()))?;
        let rows =
            decode_rows(filters.resource, body).map_err(|err| ApiError::Parse(err.to_string()))?;

        let total = match total_from_headers(&response) {
            Some(total) => total,
            None => {
                let counted = self.fetch_total_count(filters).await.unwrap_or(0);
                if counted == 0 {
                    debug!(rows = rows.len(), "no usable count, using page length");
                    rows.len() as u64
                } else {
                    counted
                }
            }
        };

        Ok(FetchResult { rows, total })
    }

    async fn fetch_total_count(&self, filters: &FilterState) -> Option<u64> {
        let request = ApiRequest::new(
            filters.resource.path_segment(),
            query::count_params(filters).encode(),
        );
        let response = match self.api.get(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "count request failed");
                return None;
            }
        };
        if !response.is_success() {
            warn!(status = response.status, "count request rejected");
            return None;
        }
        serde_json::from_slice::<Value>(&response.body)
            .ok()
            .and_then(|body| parse_count_body(&body))
    }

    /// Reference lists for the selectors. Each list degrades to empty on its own.
    pub async fn load_dropdown_data(&self, resource: Resource) -> DropdownData {
        let segment = resource.path_segment();
        let (providers, countries, regions) = futures::join!(
            self.fetch_reference(format!("{segment}_providers"), NAME_COLUMN),
            self.fetch_reference(format!("{segment}_countries"), COUNTRY_COLUMN),
            self.fetch_reference(format!("{segment}_regions"), REGION_COLUMN),
        );

        DropdownData {
            providers: normalize_providers(providers),
            countries: normalize_countries(countries),
            regions: normalize_regions(regions),
        }
    }

    async fn fetch_reference(&self, path: String, field: &str) -> Vec<String> {
        let response = match self.api.get(ApiRequest::new(path.clone(), "")).await {
            Ok(response) => response,
            Err(err) => {
                warn!(%path, error = %err, "reference list request failed");
                return Vec::new();
            }
        };
        if !response.is_success() {
            warn!(%path, status = response.status, "reference list request rejected");
            return Vec::new();
        }
        match serde_json::from_slice::<Value>(&response.body) {
            Ok(body) => reference_values(&body, field),
            Err(err) => {
                warn!(%path, error = %err, "reference list is not valid JSON");
                Vec::new()
            }
        }
    }

    /// Downloads every row matching `filters` in the requested format.
    pub async fn export_all(
        &self,
        filters: &FilterState,
        format: ExportFormat,
        today: NaiveDate,
    ) -> Result<ExportFile, ApiError> {
        let request = Self::export_request(filters, format);
        debug!(path = %request.path, query = %request.query, "exporting rows");

        let response = self.api.get(request).await?;
        if !response.is_success() {
            return Err(ApiError::from_status(&response));
        }

        let record_count = count_records(format, &response.body);
        let file_name = export_file_name(filters.resource, format, today);
        if record_count.is_none() {
            warn!(%file_name, "could not count exported records");
        }
        info!(%file_name, ?record_count, "export downloaded");

        Ok(ExportFile {
            file_name,
            format,
            bytes: response.body,
            record_count,
        })
    }
}

pub fn total_from_headers(response: &ApiResponse) -> Option<u64> {
    TOTAL_HEADERS
        .iter()
        .filter_map(|name| response.header(name))
        .find_map(parse_total_header)
}

/// Accepts a bare integer ("92") or a range with a known total ("0-9/92").
pub fn parse_total_header(value: &str) -> Option<u64> {
    let value = value.trim();
    match value.rsplit_once('/') {
        Some((_, total)) => total.trim().parse().ok(),
        None => value.parse().ok(),
    }
}

/// `[{"count": 92}]`; the count may also arrive as a string or under another key.
pub fn parse_count_body(body: &Value) -> Option<u64> {
    let first = body.as_array()?.first()?.as_object()?;
    let value = first
        .get("count")
        .or_else(|| first.get("COUNT"))
        .or_else(|| first.values().next())?;
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn reference_values(body: &Value, field: &str) -> Vec<String> {
    body.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get(field).and_then(Value::as_str))
                .filter(|value| !value.trim().is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub fn export_file_name(resource: Resource, format: ExportFormat, today: NaiveDate) -> String {
    format!(
        "{}-{}.{}",
        resource.path_segment(),
        today.format("%Y-%m-%d"),
        format.extension()
    )
}

fn count_records(format: ExportFormat, bytes: &[u8]) -> Option<usize> {
    match format {
        ExportFormat::Json => match serde_json::from_slice::<Value>(bytes).ok()? {
            Value::Array(items) => Some(items.len()),
            _ => None,
        },
        ExportFormat::Csv => {
            let mut reader = csv::ReaderBuilder::new()
                .flexible(true)
                .from_reader(bytes);
            let mut count = 0;
            for record in reader.records() {
                record.ok()?;
                count += 1;
            }
            Some(count)
        }
    }
}

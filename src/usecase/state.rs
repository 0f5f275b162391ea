//! Explorer state as a value plus reducer-style transitions.

use std::collections::BTreeSet;

use crate::domain::entities::dropdown::DropdownData;
use crate::domain::entities::filters::{
    clamp_page, clamp_per_page, parse_bound, ExportFormat, FilterOverrides, FilterState,
    PeriodCategory, Resource, MIN_PAGE, VALUE_FROM_LABEL, VALUE_TO_LABEL,
};
use crate::domain::entities::record::{page_window, FetchResult, PageWindow, Record};
use crate::domain::error::FilterError;
use crate::usecase::ports::api::ApiError;
use crate::usecase::sequencer::{is_current, RequestToken};
use crate::usecase::services::preview_service::{PreviewService, PreviewTicket};

pub const READY_STATUS: &str = "Ready";

#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerState {
    pub filters: FilterState,
    /// Range inputs as typed; the parsed bounds live in `filters`.
    pub value_from_text: String,
    pub value_to_text: String,
    pub dropdowns: DropdownData,
    pub rows: Vec<Record>,
    pub total: u64,
    pub loading: bool,
    pub exporting: bool,
    /// Table error, kept until the next preview starts.
    pub error: Option<String>,
    /// Download error, cleared by a timer.
    pub download_error: Option<String>,
    pub status: String,
}

impl Default for ExplorerState {
    fn default() -> Self {
        Self {
            filters: FilterState::default(),
            value_from_text: String::new(),
            value_to_text: String::new(),
            dropdowns: DropdownData::default(),
            rows: Vec::new(),
            total: 0,
            loading: false,
            exporting: false,
            error: None,
            download_error: None,
            status: READY_STATUS.to_string(),
        }
    }
}

/// Everything a finished table fetch reports back.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewCompletion {
    pub token: RequestToken,
    pub snapshot: FilterState,
    pub overrides: FilterOverrides,
    pub outcome: Result<FetchResult, ApiError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetResource(Resource),
    SetProvider(String),
    ToggleCountry(String),
    ClearCountries,
    SetRegion(Option<String>),
    SetPeriodCategory(Option<PeriodCategory>),
    SetValueFrom(String),
    SetValueTo(String),
    SetPage(i64),
    SetPerPage(i64),
    SetFormat(ExportFormat),
    DropdownsLoaded {
        resource: Resource,
        data: DropdownData,
    },
    PreviewRejected(String),
    PreviewStarted,
    PreviewFinished {
        latest: RequestToken,
        completion: PreviewCompletion,
    },
    ExportStarted,
    ExportSaved(String),
    ExportCancelled,
    DownloadFailed(String),
    DownloadErrorExpired(String),
}

impl ExplorerState {
    pub fn reduce(mut self, action: Action) -> Self {
        match action {
            Action::SetResource(resource) => {
                if resource != self.filters.resource {
                    self.filters.reset_for_resource(resource);
                    self.dropdowns = DropdownData::default();
                    self.rows = Vec::new();
                    self.total = 0;
                    self.status = READY_STATUS.to_string();
                }
            }
            Action::SetProvider(provider) => {
                self.filters.provider = provider;
                self.filters.page = MIN_PAGE;
            }
            Action::ToggleCountry(country) => {
                if !self.filters.countries.remove(&country) {
                    self.filters.countries.insert(country);
                }
                self.filters.page = MIN_PAGE;
            }
            Action::ClearCountries => {
                self.filters.countries = BTreeSet::new();
                self.filters.page = MIN_PAGE;
            }
            Action::SetRegion(region) => {
                self.filters.region = region;
                self.filters.page = MIN_PAGE;
            }
            Action::SetPeriodCategory(category) => {
                self.filters.period_category = category;
                self.filters.page = MIN_PAGE;
            }
            Action::SetValueFrom(text) => {
                self.filters.value_from = parse_bound(VALUE_FROM_LABEL, &text).ok().flatten();
                self.value_from_text = text;
                self.filters.page = MIN_PAGE;
            }
            Action::SetValueTo(text) => {
                self.filters.value_to = parse_bound(VALUE_TO_LABEL, &text).ok().flatten();
                self.value_to_text = text;
                self.filters.page = MIN_PAGE;
            }
            Action::SetPage(page) => self.filters.page = clamp_page(page),
            Action::SetPerPage(per_page) => {
                self.filters.per_page = clamp_per_page(per_page);
                self.filters.page = MIN_PAGE;
            }
            Action::SetFormat(format) => self.filters.format = format,
            Action::DropdownsLoaded { resource, data } => {
                // A slow load for a resource the user already left is ignored.
                if resource == self.filters.resource {
                    self.dropdowns = data;
                }
            }
            Action::PreviewRejected(message) => self.error = Some(message),
            Action::PreviewStarted => {
                self.loading = true;
                self.error = None;
            }
            Action::PreviewFinished { latest, completion } => {
                if !is_current(completion.token, latest) {
                    return self;
                }
                self.loading = false;
                // Rows fetched for a resource the user has since left are not shown.
                if completion.snapshot.resource != self.filters.resource {
                    return self;
                }
                match completion.outcome {
                    Ok(result) => {
                        self.rows = result.rows;
                        self.total = result.total;
                        self.error = None;
                        // Only the overridden fields come from the snapshot, so edits
                        // made while the request was in flight are kept.
                        if completion.overrides.page.is_some() {
                            self.filters.page = completion.snapshot.page;
                        }
                        if completion.overrides.per_page.is_some() {
                            self.filters.per_page = completion.snapshot.per_page;
                        }
                        self.status = format!(
                            "Loaded {} of {} rows",
                            self.rows.len(),
                            self.total
                        );
                    }
                    Err(err) => {
                        self.rows = Vec::new();
                        self.total = 0;
                        self.error = Some(table_error_message(&err));
                    }
                }
            }
            Action::ExportStarted => {
                self.exporting = true;
                self.download_error = None;
            }
            Action::ExportSaved(status) => {
                self.exporting = false;
                self.status = status;
            }
            Action::ExportCancelled => self.exporting = false,
            Action::DownloadFailed(message) => {
                self.exporting = false;
                self.download_error = Some(message);
            }
            Action::DownloadErrorExpired(message) => {
                if self.download_error.as_deref() == Some(message.as_str()) {
                    self.download_error = None;
                }
            }
        }
        self
    }

    /// The first range input that is not a number.
    pub fn input_error(&self) -> Option<FilterError> {
        parse_bound(VALUE_FROM_LABEL, &self.value_from_text)
            .and_then(|_| parse_bound(VALUE_TO_LABEL, &self.value_to_text))
            .err()
    }

    /// Checks the typed inputs, then validates and tokens the request snapshot.
    pub fn begin_preview(
        &self,
        preview: &PreviewService,
        overrides: FilterOverrides,
    ) -> Result<PreviewTicket, FilterError> {
        if let Some(err) = self.input_error() {
            return Err(err);
        }
        preview.begin(&self.filters, overrides)
    }

    pub fn page_window(&self) -> PageWindow {
        page_window(
            self.filters.page,
            self.filters.per_page,
            self.total,
            self.loading,
        )
    }
}

pub fn table_error_message(err: &ApiError) -> String {
    format!("Failed to fetch table data: {err}")
}

pub fn download_error_message(err: &ApiError) -> String {
    match err {
        ApiError::Http { status, .. } => format!("Download failed ({status})"),
        _ => "Download failed".to_string(),
    }
}

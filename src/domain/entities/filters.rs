use std::collections::BTreeSet;

use crate::domain::error::FilterError;

pub const ANY_OPTION: &str = "(Any)";

pub const MIN_PAGE: u32 = 1;
pub const MIN_PER_PAGE: u32 = 1;
pub const MAX_PER_PAGE: u32 = 50;
pub const DEFAULT_PER_PAGE: u32 = 10;

pub const VALUE_FROM_LABEL: &str = "Value From";
pub const VALUE_TO_LABEL: &str = "Value To";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Resource {
    #[default]
    Pue,
    Wue,
}

impl Resource {
    pub const ALL: [Resource; 2] = [Resource::Pue, Resource::Wue];

    pub fn label(self) -> &'static str {
        match self {
            Resource::Pue => "PUE",
            Resource::Wue => "WUE",
        }
    }

    /// Lower-cased name used as the REST path segment.
    pub fn path_segment(self) -> &'static str {
        match self {
            Resource::Pue => "pue",
            Resource::Wue => "wue",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|resource| resource.label().eq_ignore_ascii_case(value.trim()))
    }
}

/// Values of the `time_period_category` column. `Any` is a real data value,
/// unrelated to the "(Any)" no-filter sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodCategory {
    Annual,
    Quarterly,
    Monthly,
    NotEvident,
    Any,
}

impl PeriodCategory {
    pub const ALL: [PeriodCategory; 5] = [
        PeriodCategory::Annual,
        PeriodCategory::Quarterly,
        PeriodCategory::Monthly,
        PeriodCategory::NotEvident,
        PeriodCategory::Any,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PeriodCategory::Annual => "Annual",
            PeriodCategory::Quarterly => "Quarterly",
            PeriodCategory::Monthly => "Monthly",
            PeriodCategory::NotEvident => "Not evident",
            PeriodCategory::Any => "Any",
        }
    }

    /// Maps a selector value back to a category; the sentinel maps to `None`.
    pub fn from_option(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.label() == value)
    }
}

pub fn period_category_options() -> Vec<&'static str> {
    std::iter::once(ANY_OPTION)
        .chain(PeriodCategory::ALL.into_iter().map(PeriodCategory::label))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Json, ExportFormat::Csv];

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
            ExportFormat::Csv => "CSV",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.label().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub resource: Resource,
    pub provider: String,
    pub countries: BTreeSet<String>,
    /// `None` is the "(Any)" sentinel.
    pub region: Option<String>,
    pub period_category: Option<PeriodCategory>,
    pub value_from: Option<f64>,
    pub value_to: Option<f64>,
    pub page: u32,
    pub per_page: u32,
    pub format: ExportFormat,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            resource: Resource::default(),
            provider: String::new(),
            countries: BTreeSet::new(),
            region: None,
            period_category: None,
            value_from: None,
            value_to: None,
            page: MIN_PAGE,
            per_page: DEFAULT_PER_PAGE,
            format: ExportFormat::default(),
        }
    }
}

/// Transient values merged into a request snapshot, e.g. a pagination click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterOverrides {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl FilterOverrides {
    pub fn page(page: i64) -> Self {
        Self {
            page: Some(page),
            per_page: None,
        }
    }
}

impl FilterState {
    /// Builds the snapshot a request is issued with. Paging values are always clamped.
    pub fn effective(&self, overrides: &FilterOverrides) -> FilterState {
        let mut snapshot = self.clone();
        snapshot.page = clamp_page(overrides.page.unwrap_or(i64::from(self.page)));
        snapshot.per_page = clamp_per_page(overrides.per_page.unwrap_or(i64::from(self.per_page)));
        snapshot
    }

    /// Switches dataset. The reference-data dependent fields go back to defaults.
    pub fn reset_for_resource(&mut self, resource: Resource) {
        self.resource = resource;
        self.provider.clear();
        self.countries.clear();
        self.region = None;
        self.page = MIN_PAGE;
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        match (self.value_from, self.value_to) {
            (Some(from), Some(to)) if from > to => Err(FilterError::InvertedRange { from, to }),
            _ => Ok(()),
        }
    }
}

pub fn clamp_page(page: i64) -> u32 {
    page.clamp(i64::from(MIN_PAGE), i64::from(u32::MAX)) as u32
}

pub fn clamp_per_page(per_page: i64) -> u32 {
    per_page.clamp(i64::from(MIN_PER_PAGE), i64::from(MAX_PER_PAGE)) as u32
}

/// Parses a range bound typed into `field`. Blank input means no bound.
pub fn parse_bound(field: &'static str, text: &str) -> Result<Option<f64>, FilterError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(FilterError::NotANumber { field }),
    }
}

/// Maps a selector value to the region filter; the sentinel and blanks mean no filter.
pub fn region_from_option(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == ANY_OPTION {
        None
    } else {
        Some(trimmed.to_string())
    }
}

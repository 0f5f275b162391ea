use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::domain::entities::filters::{Resource, MIN_PER_PAGE};
use crate::domain::error::RecordError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Number,
    Flag,
    Link,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn column(name: &'static str, kind: ColumnKind) -> ColumnSpec {
    ColumnSpec { name, kind }
}

const PUE_COLUMNS: [ColumnSpec; 17] = [
    column("company_name", ColumnKind::Text),
    column("pue_value", ColumnKind::Number),
    column("time_period_category", ColumnKind::Text),
    column("time_period_value", ColumnKind::Text),
    column("measurement_category", ColumnKind::Text),
    column("pue_type", ColumnKind::Text),
    column("facility_scope", ColumnKind::Text),
    column("verbatim_geographical_scope", ColumnKind::Text),
    column("city", ColumnKind::Text),
    column("county", ColumnKind::Text),
    column("state_province", ColumnKind::Text),
    column("country", ColumnKind::Text),
    column("region", ColumnKind::Text),
    column("is_pue_self_reported", ColumnKind::Flag),
    column("source_type", ColumnKind::Text),
    column("url", ColumnKind::Link),
    column("retrieved_date", ColumnKind::Text),
];

const WUE_COLUMNS: [ColumnSpec; 19] = [
    column("company_name", ColumnKind::Text),
    column("wue_value", ColumnKind::Number),
    column("time_period_category", ColumnKind::Text),
    column("time_period_value", ColumnKind::Text),
    column("measurement_category", ColumnKind::Text),
    column("water_input", ColumnKind::Text),
    column("category_1_water_inputs", ColumnKind::Text),
    column("wue_type", ColumnKind::Text),
    column("facility_scope", ColumnKind::Text),
    column("verbatim_geographical_scope", ColumnKind::Text),
    column("city", ColumnKind::Text),
    column("county", ColumnKind::Text),
    column("state_province", ColumnKind::Text),
    column("country", ColumnKind::Text),
    column("region", ColumnKind::Text),
    column("is_wue_self_reported", ColumnKind::Flag),
    column("source_type", ColumnKind::Text),
    column("url", ColumnKind::Link),
    column("retrieved_date", ColumnKind::Text),
];

pub fn columns(resource: Resource) -> &'static [ColumnSpec] {
    match resource {
        Resource::Pue => &PUE_COLUMNS,
        Resource::Wue => &WUE_COLUMNS,
    }
}

pub fn column_header(name: &str) -> String {
    name.replace('_', " ").to_uppercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellDisplay {
    Empty,
    Text(String),
    Link(String),
}

impl CellDisplay {
    pub fn label(&self) -> String {
        match self {
            CellDisplay::Empty => "-".to_string(),
            CellDisplay::Text(text) => text.clone(),
            CellDisplay::Link(_) => "Source".to_string(),
        }
    }
}

/// One row decoded against the column schema of its resource. Fields the schema does
/// not know are kept in `extra` and never rendered as columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub resource: Resource,
    pub cells: Vec<Value>,
    #[allow(dead_code)]
    pub extra: BTreeMap<String, Value>,
}

impl Record {
    pub fn from_object(resource: Resource, mut object: Map<String, Value>) -> Self {
        let cells = columns(resource)
            .iter()
            .map(|spec| object.remove(spec.name).unwrap_or(Value::Null))
            .collect();
        Self {
            resource,
            cells,
            extra: object.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        columns(self.resource)
            .iter()
            .position(|spec| spec.name == name)
            .and_then(|idx| self.cells.get(idx))
    }

    /// Renders the cell under `spec` by column name. A column this row's resource does
    /// not have renders as empty.
    pub fn display(&self, spec: &ColumnSpec) -> CellDisplay {
        match self.get(spec.name).unwrap_or(&Value::Null) {
            Value::Null => CellDisplay::Empty,
            Value::String(text) if text.is_empty() => CellDisplay::Empty,
            Value::String(text) if spec.kind == ColumnKind::Link => CellDisplay::Link(text.clone()),
            Value::String(text) => CellDisplay::Text(text.clone()),
            other => CellDisplay::Text(other.to_string()),
        }
    }
}

pub fn decode_rows(resource: Resource, body: Value) -> Result<Vec<Record>, RecordError> {
    let Value::Array(items) = body else {
        return Err(RecordError::NotAnArray);
    };
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(object) => Ok(Record::from_object(resource, object)),
            _ => Err(RecordError::NotAnObject(idx)),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FetchResult {
    pub rows: Vec<Record>,
    /// Matching rows across all pages.
    pub total: u64,
}

pub fn total_pages(total: u64, per_page: u32) -> u64 {
    let per_page = u64::from(per_page.max(MIN_PER_PAGE));
    total.div_ceil(per_page).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub total_pages: u64,
    pub can_prev: bool,
    pub can_next: bool,
}

pub fn page_window(page: u32, per_page: u32, total: u64, loading: bool) -> PageWindow {
    let total_pages = total_pages(total, per_page);
    PageWindow {
        page,
        total_pages,
        can_prev: !loading && page > 1,
        can_next: !loading && u64::from(page) < total_pages,
    }
}

//! Translation of a [`FilterState`] into PostgREST-style query parameters.
//!
//! Every dimension is optional and predicates are combined with AND. A field left
//! empty or on the "(Any)" sentinel emits nothing at all, so equal filter states
//! always produce byte-identical query strings.

use url::form_urlencoded;

use crate::domain::entities::filters::{clamp_page, clamp_per_page, FilterState};

pub const NAME_COLUMN: &str = "company_name";
pub const COUNTRY_COLUMN: &str = "country";
pub const REGION_COLUMN: &str = "region";
pub const PERIOD_CATEGORY_COLUMN: &str = "time_period_category";
pub const PERIOD_VALUE_COLUMN: &str = "time_period_value";

pub const COUNT_SELECT: &str = "count:count()";

/// Characters that act as wildcards inside an `ilike` pattern.
const PATTERN_WILDCARDS: [char; 2] = ['*', '%'];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn push(&mut self, key: &str, value: impl Into<String>) {
        self.pairs.push((key.to_string(), value.into()));
    }

    #[cfg(test)]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    #[cfg(test)]
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    #[cfg(test)]
    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(name, _)| name == key)
    }

    /// `application/x-www-form-urlencoded` rendering, in insertion order.
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish()
    }
}

/// Filter predicates only, without paging.
pub fn filter_params(filters: &FilterState) -> QueryParams {
    let mut params = QueryParams::default();
    push_filter_predicates(&mut params, filters);
    params
}

/// Predicates followed by the clamped `page` and `per_page`.
pub fn build(filters: &FilterState) -> QueryParams {
    let mut params = filter_params(filters);
    params.push("page", clamp_page(i64::from(filters.page)).to_string());
    params.push("per_page", clamp_per_page(i64::from(filters.per_page)).to_string());
    params
}

pub fn build_query_string(filters: &FilterState) -> String {
    build(filters).encode()
}

/// Export requests ask for every matching row, so `page` is left out.
pub fn export_params(filters: &FilterState) -> QueryParams {
    let mut params = filter_params(filters);
    params.push("per_page", clamp_per_page(i64::from(filters.per_page)).to_string());
    params
}

pub fn count_params(filters: &FilterState) -> QueryParams {
    let mut params = QueryParams::default();
    params.push("select", COUNT_SELECT);
    push_filter_predicates(&mut params, filters);
    params
}

fn push_filter_predicates(params: &mut QueryParams, filters: &FilterState) {
    let provider = strip_wildcards(filters.provider.trim());
    let provider = provider.trim();
    if !provider.is_empty() {
        params.push(NAME_COLUMN, format!("ilike.*{provider}*"));
    }

    let countries = filters
        .countries
        .iter()
        .map(|country| country.trim())
        .filter(|country| !country.is_empty())
        .collect::<Vec<_>>();
    if !countries.is_empty() {
        params.push(COUNTRY_COLUMN, in_list(&countries));
    }

    if let Some(region) = filters.region.as_deref() {
        let region = strip_wildcards(region.trim());
        if !region.is_empty() {
            params.push(REGION_COLUMN, format!("ilike.*{region}*"));
        }
    }

    if let Some(category) = filters.period_category {
        params.push(PERIOD_CATEGORY_COLUMN, format!("eq.{}", category.label()));
    }

    if let Some(from) = filters.value_from {
        params.push(PERIOD_VALUE_COLUMN, format!("gte.{from}"));
    }
    if let Some(to) = filters.value_to {
        params.push(PERIOD_VALUE_COLUMN, format!("lte.{to}"));
    }
}

pub fn strip_wildcards(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !PATTERN_WILDCARDS.contains(ch))
        .collect()
}

/// `in.("a","b")`. Values are always quoted so commas and parentheses inside a
/// name cannot break the list.
fn in_list(values: &[&str]) -> String {
    let quoted = values
        .iter()
        .map(|value| {
            let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{escaped}\"")
        })
        .collect::<Vec<_>>()
        .join(",");
    format!("in.({quoted})")
}

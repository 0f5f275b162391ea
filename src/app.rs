use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use chrono::Utc;
use dioxus::prelude::*;
use tracing::warn;

use crate::config::{ExplorerConfig, DOWNLOAD_ERROR_CLEAR_DELAY};
use crate::domain::entities::filters::{
    period_category_options, region_from_option, ExportFormat, FilterOverrides,
    PeriodCategory, Resource, ANY_OPTION, MAX_PER_PAGE,
};
use crate::domain::entities::record::{column_header, columns, CellDisplay, PageWindow, Record};
use crate::infra::http::client::ReqwestApi;
use crate::platform::desktop::save_dialog::save_export;
use crate::ui::state::app_state::{AppState, DropdownId, UrlMode};
use crate::usecase::sequencer::RequestSequencer;
use crate::usecase::services::preview_service::PreviewService;
use crate::usecase::services::query_service::QueryService;
use crate::usecase::state::{download_error_message, Action, ExplorerState};

const FIELD_STYLE: &str = "display: flex; flex-direction: column; gap: 4px; font-size: 14px;";
const INPUT_STYLE: &str =
    "border: 1px solid #bbb; background: #fff; padding: 6px 10px; border-radius: 6px;";
const PANEL_STYLE: &str = "position: absolute; left: 0; top: 100%; min-width: 220px; max-height: 320px; overflow-y: auto; background: #fff; border: 1px solid #bbb; border-radius: 8px; box-shadow: 0 10px 24px rgba(0,0,0,0.15); z-index: 1200; padding: 6px;";
const CELL_STYLE: &str = "padding: 6px 10px; border-bottom: 1px solid #eee; white-space: nowrap;";

struct Services {
    config: ExplorerConfig,
    query: Arc<QueryService>,
    preview: Arc<PreviewService>,
}

impl Services {
    fn build(config: ExplorerConfig) -> anyhow::Result<Self> {
        let api = Arc::new(ReqwestApi::new(&config.api_base)?);
        let query = Arc::new(QueryService::new(api));
        let preview = Arc::new(PreviewService::new(
            query.clone(),
            Arc::new(RequestSequencer::new()),
        ));
        Ok(Self {
            config,
            query,
            preview,
        })
    }
}

fn dispatch(mut explorer: Signal<ExplorerState>, action: Action) {
    let mut state = explorer.write();
    let current = std::mem::take(&mut *state);
    *state = current.reduce(action);
}

fn start_preview(
    preview: Arc<PreviewService>,
    explorer: Signal<ExplorerState>,
    overrides: FilterOverrides,
) {
    let begun = explorer.peek().begin_preview(&preview, overrides);
    let ticket = match begun {
        Ok(ticket) => ticket,
        Err(err) => {
            dispatch(explorer, Action::PreviewRejected(err.to_string()));
            return;
        }
    };
    dispatch(explorer, Action::PreviewStarted);

    spawn(async move {
        let completion = preview.run(ticket).await;
        dispatch(
            explorer,
            Action::PreviewFinished {
                latest: preview.latest(),
                completion,
            },
        );
    });
}

fn start_export(
    query: Arc<QueryService>,
    download_dir: Option<PathBuf>,
    explorer: Signal<ExplorerState>,
) {
    let filters = explorer.peek().filters.clone();
    dispatch(explorer, Action::ExportStarted);

    spawn(async move {
        let today = Utc::now().date_naive();
        match query.export_all(&filters, filters.format, today).await {
            Ok(export) => match save_export(&export, download_dir.as_deref()) {
                Ok(Some(path)) => dispatch(
                    explorer,
                    Action::ExportSaved(export_saved_message(export.record_count, &path)),
                ),
                Ok(None) => dispatch(explorer, Action::ExportCancelled),
                Err(err) => {
                    warn!(error = %err, "saving export failed");
                    fail_download(explorer, format!("Download failed: {err}"));
                }
            },
            Err(err) => {
                warn!(error = %err, "export request failed");
                fail_download(explorer, download_error_message(&err));
            }
        }
    });
}

fn fail_download(explorer: Signal<ExplorerState>, message: String) {
    dispatch(explorer, Action::DownloadFailed(message.clone()));
    spawn(async move {
        tokio::time::sleep(DOWNLOAD_ERROR_CLEAR_DELAY).await;
        dispatch(explorer, Action::DownloadErrorExpired(message));
    });
}

pub fn export_saved_message(record_count: Option<usize>, path: &Path) -> String {
    match record_count {
        Some(count) => format!("Exported {count} records to {}", path.display()),
        None => format!("Exported to {}", path.display()),
    }
}

/// Case-insensitive substring match used by the searchable selectors.
pub fn filter_options(options: &[String], query: &str) -> Vec<String> {
    let needle = query.trim().to_lowercase();
    options
        .iter()
        .filter(|option| needle.is_empty() || option.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

pub fn url_bar_text(mode: UrlMode, json_url: &str, csv_url: &str) -> String {
    match mode {
        UrlMode::Json => json_url.to_string(),
        UrlMode::Csv => csv_url.to_string(),
        UrlMode::Curl => format!("curl -sL '{json_url}'"),
    }
}

fn render_cell(cell: CellDisplay) -> Element {
    match cell {
        CellDisplay::Link(href) => rsx! {
            td { style: CELL_STYLE,
                a { href: "{href}", target: "_blank", rel: "noreferrer", "Source" }
            }
        },
        other => {
            let label = other.label();
            rsx! {
                td { style: CELL_STYLE, "{label}" }
            }
        }
    }
}

#[component]
fn ProviderField(
    value: String,
    options: Vec<String>,
    mut open_dropdown: Signal<Option<DropdownId>>,
    on_change: EventHandler<String>,
) -> Element {
    let is_open = open_dropdown() == Some(DropdownId::Provider);
    let suggestions = filter_options(&options, &value);

    rsx! {
        div { style: "position: relative;",
            input {
                style: INPUT_STYLE,
                placeholder: "Type or select provider",
                value: "{value}",
                onclick: move |event| {
                    event.stop_propagation();
                    open_dropdown.set(Some(DropdownId::Provider));
                },
                oninput: move |event| {
                    on_change.call(event.value());
                    open_dropdown.set(Some(DropdownId::Provider));
                },
            }
            if is_open && !suggestions.is_empty() {
                div {
                    style: PANEL_STYLE,
                    onclick: move |event| event.stop_propagation(),
                    {suggestions.into_iter().map(|name| {
                        let picked = name.clone();
                        rsx!(
                            div {
                                key: "{name}",
                                style: "padding: 6px 8px; cursor: pointer;",
                                onclick: move |_| {
                                    on_change.call(picked.clone());
                                    open_dropdown.set(None);
                                },
                                "{name}"
                            }
                        )
                    })}
                }
            }
        }
    }
}

#[component]
fn CountriesField(
    selected: Vec<String>,
    options: Vec<String>,
    mut search: Signal<String>,
    mut open_dropdown: Signal<Option<DropdownId>>,
    on_toggle: EventHandler<String>,
    on_clear: EventHandler<()>,
) -> Element {
    let is_open = open_dropdown() == Some(DropdownId::Countries);
    let visible = filter_options(&options, &search());
    let summary = if selected.is_empty() {
        "Select countries".to_string()
    } else {
        selected.join(", ")
    };

    rsx! {
        div { style: "position: relative;",
            button {
                style: "{INPUT_STYLE} cursor: pointer; text-align: left; width: 100%;",
                onclick: move |event| {
                    event.stop_propagation();
                    if open_dropdown() == Some(DropdownId::Countries) {
                        open_dropdown.set(None);
                    } else {
                        open_dropdown.set(Some(DropdownId::Countries));
                    }
                },
                "{summary}"
            }
            if is_open {
                div {
                    style: PANEL_STYLE,
                    onclick: move |event| event.stop_propagation(),
                    div { style: "display: flex; gap: 6px; margin-bottom: 6px;",
                        input {
                            style: INPUT_STYLE,
                            placeholder: "Search",
                            value: "{search}",
                            oninput: move |event| search.set(event.value()),
                        }
                        button {
                            style: INPUT_STYLE,
                            disabled: selected.is_empty(),
                            onclick: move |_| on_clear.call(()),
                            "Clear"
                        }
                    }
                    if visible.is_empty() {
                        div { style: "padding: 6px 4px; color: #888;", "No countries" }
                    }
                    {visible.into_iter().map(|country| {
                        let checked = selected.contains(&country);
                        let toggled = country.clone();
                        rsx!(
                            label {
                                key: "{country}",
                                style: "display: flex; align-items: center; gap: 8px; padding: 6px 4px; cursor: pointer;",
                                input {
                                    r#type: "checkbox",
                                    checked: checked,
                                    onclick: move |_| on_toggle.call(toggled.clone()),
                                }
                                span { "{country}" }
                            }
                        )
                    })}
                }
            }
        }
    }
}

#[component]
fn ApiUrlBar(json_url: String, csv_url: String, mut mode: Signal<UrlMode>) -> Element {
    let display = url_bar_text(mode(), &json_url, &csv_url);

    rsx! {
        div { style: "border: 1px solid #ddd; border-radius: 8px; padding: 10px; margin-top: 12px;",
            div { style: "display: flex; gap: 6px; align-items: center; margin-bottom: 6px;",
                span { style: "font-weight: 600; font-size: 14px;", "API URL" }
                for (label, value) in [("JSON", UrlMode::Json), ("CSV", UrlMode::Csv), ("cURL", UrlMode::Curl)] {
                    button {
                        key: "{label}",
                        style: if mode() == value { "background: #222; color: #fff; border-radius: 6px; padding: 2px 8px;" } else { "background: transparent; border: 1px solid #bbb; border-radius: 6px; padding: 2px 8px;" },
                        onclick: move |_| mode.set(value),
                        "{label}"
                    }
                }
            }
            input {
                style: "{INPUT_STYLE} width: 100%; font-family: monospace; font-size: 12px;",
                readonly: true,
                value: "{display}",
            }
        }
    }
}

#[component]
fn PreviewTable(
    resource: Resource,
    rows: Vec<Record>,
    loading: bool,
    error: Option<String>,
    window: PageWindow,
    total: u64,
    on_page_change: EventHandler<i64>,
) -> Element {
    let schema = columns(resource);
    let headers = schema
        .iter()
        .map(|spec| column_header(spec.name))
        .collect::<Vec<_>>();
    let column_count = headers.len();
    let page = i64::from(window.page);

    rsx! {
        div { style: "border: 1px solid #ddd; border-radius: 8px; margin-top: 16px;",
            if let Some(message) = error {
                div { style: "padding: 10px; color: #b00020; background: #fdecee; border-bottom: 1px solid #f5c2c7;",
                    "{message}"
                }
            }
            div { style: "overflow-x: auto;",
                table { style: "border-collapse: collapse; min-width: 100%;",
                    thead {
                        tr {
                            for header in headers.iter() {
                                th {
                                    key: "{header}",
                                    style: "{CELL_STYLE} text-align: left; font-size: 12px; color: #555; background: #f7f7f7;",
                                    "{header}"
                                }
                            }
                        }
                    }
                    tbody {
                        if loading {
                            tr {
                                td { style: CELL_STYLE, colspan: "{column_count}", "Loading…" }
                            }
                        } else if rows.is_empty() {
                            tr {
                                td { style: CELL_STYLE, colspan: "{column_count}", "No data found." }
                            }
                        } else {
                            for (row_idx, row) in rows.iter().enumerate() {
                                tr { key: "{row_idx}",
                                    for spec in schema.iter() {
                                        {render_cell(row.display(spec))}
                                    }
                                }
                            }
                        }
                    }
                }
            }
            div { style: "display: flex; justify-content: space-between; align-items: center; padding: 10px;",
                span { style: "font-size: 14px; color: #555;",
                    "Page {window.page} of {window.total_pages}, Total {total} rows"
                }
                div { style: "display: flex; gap: 8px;",
                    button {
                        disabled: !window.can_prev,
                        onclick: move |_| on_page_change.call(page - 1),
                        "Previous"
                    }
                    button {
                        disabled: !window.can_next,
                        onclick: move |_| on_page_change.call(page + 1),
                        "Next"
                    }
                }
            }
        }
    }
}

#[component]
pub fn App() -> Element {
    let AppState {
        explorer,
        mut open_dropdown,
        country_search,
        url_mode,
    } = AppState::new();

    let services = use_hook(|| {
        Services::build(ExplorerConfig::from_env())
            .map(Rc::new)
            .map_err(|err| err.to_string())
    });
    let services = match services {
        Ok(services) => services,
        Err(err) => {
            return rsx! {
                div {
                    p { "Failed to start HTTP client: {err}" }
                }
            };
        }
    };

    let resource = use_memo(move || explorer.read().filters.resource);
    let query_for_dropdowns = services.query.clone();
    use_effect(move || {
        let resource = resource();
        let query = query_for_dropdowns.clone();
        spawn(async move {
            let data = query.load_dropdown_data(resource).await;
            dispatch(explorer, Action::DropdownsLoaded { resource, data });
        });
    });

    let state = explorer();
    let filters = state.filters.clone();
    let window = state.page_window();
    let input_error = state.input_error();
    let json_url = QueryService::table_request(&filters).url(&services.config.api_base);
    let csv_url =
        QueryService::export_request(&filters, ExportFormat::Csv).url(&services.config.api_base);
    let selected_countries = filters.countries.iter().cloned().collect::<Vec<_>>();
    let selected_region = filters.region.clone().unwrap_or_else(|| ANY_OPTION.to_string());
    let selected_period = filters
        .period_category
        .map(PeriodCategory::label)
        .unwrap_or(ANY_OPTION);
    let download_label = format!("Download {}", filters.format.label());

    let preview_for_button = services.preview.clone();
    let preview_for_pages = services.preview.clone();
    let query_for_export = services.query.clone();
    let download_dir = services.config.download_dir.clone();

    rsx! {
        div {
            style: "font-family: sans-serif; padding: 16px 24px; min-height: 100vh;",
            onclick: move |_| open_dropdown.set(None),

            header { style: "display: flex; justify-content: space-between; align-items: center; border-bottom: 1px solid #ddd; padding-bottom: 12px;",
                h1 { style: "margin: 0; font-size: 20px;", "DCEWM" }
                span { style: "font-size: 13px; color: #555;", "{state.status}" }
            }

            section { style: "margin-top: 16px;",
                h2 { style: "font-size: 16px;", "Filters" }
                div { style: "display: grid; grid-template-columns: repeat(4, minmax(0, 1fr)); gap: 12px;",
                    label { style: FIELD_STYLE,
                        "Resource"
                        select {
                            style: INPUT_STYLE,
                            onchange: move |event| {
                                if let Some(next) = Resource::from_label(&event.value()) {
                                    dispatch(explorer, Action::SetResource(next));
                                }
                            },
                            for candidate in Resource::ALL {
                                option {
                                    key: "{candidate.label()}",
                                    value: "{candidate.label()}",
                                    selected: candidate == filters.resource,
                                    "{candidate.label()}"
                                }
                            }
                        }
                    }
                    div { style: FIELD_STYLE,
                        "Provider"
                        ProviderField {
                            value: filters.provider.clone(),
                            options: state.dropdowns.providers.clone(),
                            open_dropdown: open_dropdown,
                            on_change: move |value: String| dispatch(explorer, Action::SetProvider(value)),
                        }
                    }
                    div { style: FIELD_STYLE,
                        "Countries"
                        CountriesField {
                            selected: selected_countries,
                            options: state.dropdowns.countries.clone(),
                            search: country_search,
                            open_dropdown: open_dropdown,
                            on_toggle: move |country: String| dispatch(explorer, Action::ToggleCountry(country)),
                            on_clear: move |_| dispatch(explorer, Action::ClearCountries),
                        }
                    }
                    label { style: FIELD_STYLE,
                        "IEA Region"
                        select {
                            style: INPUT_STYLE,
                            onchange: move |event| {
                                dispatch(explorer, Action::SetRegion(region_from_option(&event.value())));
                            },
                            for region in state.dropdowns.regions.iter() {
                                option {
                                    key: "{region}",
                                    value: "{region}",
                                    selected: *region == selected_region,
                                    "{region}"
                                }
                            }
                        }
                    }
                    label { style: FIELD_STYLE,
                        "Period Category"
                        select {
                            style: INPUT_STYLE,
                            onchange: move |event| {
                                dispatch(explorer, Action::SetPeriodCategory(PeriodCategory::from_option(&event.value())));
                            },
                            for category in period_category_options() {
                                option {
                                    key: "{category}",
                                    value: "{category}",
                                    selected: category == selected_period,
                                    "{category}"
                                }
                            }
                        }
                    }
                    label { style: FIELD_STYLE,
                        "Value From"
                        input {
                            style: INPUT_STYLE,
                            inputmode: "numeric",
                            placeholder: "e.g., 2019",
                            value: "{state.value_from_text}",
                            oninput: move |event| dispatch(explorer, Action::SetValueFrom(event.value())),
                        }
                    }
                    label { style: FIELD_STYLE,
                        "Value To"
                        input {
                            style: INPUT_STYLE,
                            inputmode: "numeric",
                            placeholder: "e.g., 2024",
                            value: "{state.value_to_text}",
                            oninput: move |event| dispatch(explorer, Action::SetValueTo(event.value())),
                        }
                    }
                    label { style: FIELD_STYLE,
                        "Format"
                        select {
                            style: INPUT_STYLE,
                            onchange: move |event| {
                                if let Some(format) = ExportFormat::from_label(&event.value()) {
                                    dispatch(explorer, Action::SetFormat(format));
                                }
                            },
                            for format in ExportFormat::ALL {
                                option {
                                    key: "{format.label()}",
                                    value: "{format.label()}",
                                    selected: format == filters.format,
                                    "{format.label()}"
                                }
                            }
                        }
                    }
                    label { style: FIELD_STYLE,
                        "Page"
                        input {
                            style: INPUT_STYLE,
                            r#type: "number",
                            min: "1",
                            value: "{filters.page}",
                            oninput: move |event| {
                                let page = event.value().trim().parse::<i64>().unwrap_or(1);
                                dispatch(explorer, Action::SetPage(page));
                            },
                        }
                    }
                    label { style: FIELD_STYLE,
                        "Per Page"
                        input {
                            style: INPUT_STYLE,
                            r#type: "number",
                            min: "1",
                            max: "{MAX_PER_PAGE}",
                            value: "{filters.per_page}",
                            oninput: move |event| {
                                let per_page = event.value().trim().parse::<i64>().unwrap_or(1);
                                dispatch(explorer, Action::SetPerPage(per_page));
                            },
                        }
                    }
                }

                div { style: "display: flex; gap: 12px; align-items: center; margin-top: 16px;",
                    button {
                        disabled: state.loading,
                        onclick: move |_| {
                            start_preview(preview_for_button.clone(), explorer, FilterOverrides::default());
                        },
                        if state.loading { "Loading..." } else { "Preview" }
                    }
                    button {
                        disabled: state.exporting,
                        onclick: move |_| {
                            start_export(query_for_export.clone(), download_dir.clone(), explorer);
                        },
                        "{download_label}"
                    }
                    if let Some(message) = state.download_error.clone() {
                        span { style: "color: #b00020; font-size: 14px;", "{message}" }
                    }
                }
                if let Some(err) = input_error {
                    p { style: "color: #b00020; font-size: 13px; margin: 6px 0 0;", "{err}" }
                }

                ApiUrlBar { json_url: json_url, csv_url: csv_url, mode: url_mode }
            }

            PreviewTable {
                resource: filters.resource,
                rows: state.rows.clone(),
                loading: state.loading,
                error: state.error.clone(),
                window: window,
                total: state.total,
                on_page_change: move |page: i64| {
                    start_preview(preview_for_pages.clone(), explorer, FilterOverrides::page(page));
                },
            }
        }
    }
}

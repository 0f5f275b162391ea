use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::app::{export_saved_message, filter_options, url_bar_text};
use crate::domain::entities::dropdown::DropdownData;
use crate::domain::entities::filters::{FilterOverrides, Resource};
use crate::domain::entities::record::columns;
use crate::ui::state::app_state::UrlMode;
use crate::usecase::ports::api::{ApiRequest, ApiResponse, DataApi, TransportError};
use crate::usecase::ports::fake_api::{FakeApi, FakeReply};
use crate::usecase::sequencer::RequestSequencer;
use crate::usecase::services::preview_service::PreviewService;
use crate::usecase::services::query_service::QueryService;
use crate::usecase::state::{Action, ExplorerState};

const API_BASE: &str = "https://api.test/v1";

fn preview_over(api: Arc<dyn DataApi>) -> PreviewService {
    PreviewService::new(
        Arc::new(QueryService::new(api)),
        Arc::new(RequestSequencer::new()),
    )
}

fn rows_reply(names: &[&str], total: u64) -> FakeReply {
    let body = serde_json::to_string(
        &names
            .iter()
            .map(|name| serde_json::json!({ "company_name": name }))
            .collect::<Vec<_>>(),
    )
    .expect("rows should serialize");
    FakeReply::json(200, &body).with_header("x-total-count", &total.to_string())
}

async fn preview_once(
    preview: &PreviewService,
    state: ExplorerState,
    overrides: FilterOverrides,
) -> ExplorerState {
    let ticket = preview
        .begin(&state.filters, overrides)
        .expect("filters should be valid");
    let state = state.reduce(Action::PreviewStarted);
    let completion = preview.run(ticket).await;
    state.reduce(Action::PreviewFinished {
        latest: preview.latest(),
        completion,
    })
}

fn first_names(state: &ExplorerState) -> Vec<String> {
    state
        .rows
        .iter()
        .filter_map(|row| row.get("company_name"))
        .filter_map(|value| value.as_str().map(str::to_string))
        .collect()
}

/// Serves each request once its gate is released; gates are matched by query parameter.
#[derive(Default)]
struct GatedApi {
    gates: Mutex<HashMap<String, oneshot::Receiver<ApiResponse>>>,
}

impl GatedApi {
    fn gate(&self, param: &str) -> oneshot::Sender<ApiResponse> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(param.to_string(), rx);
        tx
    }
}

#[async_trait(?Send)]
impl DataApi for GatedApi {
    async fn get(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let gate = {
            let mut gates = self.gates.lock().unwrap();
            let key = gates
                .keys()
                .find(|param| request.query.split('&').any(|pair| pair == param.as_str()))
                .cloned();
            key.and_then(|key| gates.remove(&key))
        };
        let Some(gate) = gate else {
            return Err(TransportError(format!("no gate for {}", request.query)));
        };
        gate.await
            .map_err(|_| TransportError("gate dropped".to_string()))
    }
}

fn page_response(name: &str, total: u64) -> ApiResponse {
    ApiResponse {
        status: 200,
        headers: vec![("x-total-count".to_string(), total.to_string())],
        body: format!(r#"[{{"company_name":"{name}"}}]"#).into_bytes(),
    }
}

#[test]
fn selected_countries_become_one_in_list_without_region() {
    let state = ExplorerState::default()
        .reduce(Action::ToggleCountry("Germany".to_string()))
        .reduce(Action::ToggleCountry("France".to_string()));

    let request = QueryService::table_request(&state.filters);

    assert_eq!(request.path, "pue");
    assert!(request
        .query
        .contains("country=in.%28%22France%22%2C%22Germany%22%29"));
    assert!(!request.query.contains("region="));
    assert!(request.query.ends_with("page=1&per_page=10"));
}

#[tokio::test]
async fn preview_sends_filters_and_commits_rows() {
    let api = Arc::new(FakeApi::new().on("pue", rows_reply(&["Google", "Meta"], 42)));
    let preview = preview_over(api.clone());
    let state = ExplorerState::default()
        .reduce(Action::SetProvider("Google".to_string()))
        .reduce(Action::ToggleCountry("France".to_string()));

    let state = preview_once(&preview, state, FilterOverrides::default()).await;

    let sent = api.requests_to("pue");
    assert_eq!(sent.len(), 1);
    assert!(sent[0].prefer_exact_count);
    assert!(sent[0].query.starts_with("company_name=ilike.*Google*&country=in."));
    assert_eq!(first_names(&state), vec!["Google", "Meta"]);
    assert_eq!(state.total, 42);
    assert!(!state.loading);
    assert_eq!(state.status, "Loaded 2 of 42 rows");
}

#[tokio::test]
async fn server_error_clears_table_until_next_success() {
    let api = Arc::new(
        FakeApi::new()
            .on("pue", FakeReply::json(500, "upstream exploded"))
            .on("pue", rows_reply(&["Equinix"], 1)),
    );
    let preview = preview_over(api);
    let loaded = ExplorerState {
        total: 7,
        ..ExplorerState::default()
    };

    let failed = preview_once(&preview, loaded, FilterOverrides::default()).await;

    assert!(failed.rows.is_empty());
    assert_eq!(failed.total, 0);
    assert!(!failed.loading);
    let message = failed.error.clone().expect("error should be shown");
    assert!(message.starts_with("Failed to fetch table data"));
    assert!(message.contains("500"));

    let recovered = preview_once(&preview, failed, FilterOverrides::default()).await;

    assert_eq!(recovered.error, None);
    assert_eq!(first_names(&recovered), vec!["Equinix"]);
    assert_eq!(recovered.total, 1);
}

#[tokio::test]
async fn blocked_count_preference_still_loads_rows() {
    let api = Arc::new(
        FakeApi::new()
            .rejecting_count_preference()
            .on("pue", FakeReply::json(200, r#"[{"company_name":"Digital Realty"}]"#)),
    );
    let preview = preview_over(api.clone());

    let state = preview_once(&preview, ExplorerState::default(), FilterOverrides::default()).await;

    assert_eq!(state.error, None);
    assert_eq!(first_names(&state), vec!["Digital Realty"]);
    assert_eq!(state.total, 1);
    let sent = api.requests_to("pue");
    assert!(sent[0].prefer_exact_count);
    assert!(!sent[1].prefer_exact_count);
}

#[tokio::test]
async fn late_response_for_older_preview_is_ignored() {
    let api = Arc::new(GatedApi::default());
    let first_gate = api.gate("page=1");
    let second_gate = api.gate("page=2");
    let preview = preview_over(api);

    let state = ExplorerState::default();
    let first = preview
        .begin(&state.filters, FilterOverrides::page(1))
        .expect("valid filters");
    let second = preview
        .begin(&state.filters, FilterOverrides::page(2))
        .expect("valid filters");
    let state = state
        .reduce(Action::PreviewStarted)
        .reduce(Action::PreviewStarted);

    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let run = |ticket| {
        let done = done_tx.clone();
        let preview = &preview;
        async move {
            let completion = preview.run(ticket).await;
            done.send(completion).expect("receiver should be alive");
        }
    };
    let release = async {
        second_gate
            .send(page_response("Newer", 20))
            .expect("second request should wait on its gate");
        let newer = done_rx.recv().await.expect("newer completion");
        first_gate
            .send(page_response("Older", 10))
            .expect("first request should wait on its gate");
        let older = done_rx.recv().await.expect("older completion");
        (newer, older)
    };

    let ((), (), (newer, older)) = tokio::join!(run(first), run(second), release);

    let state = state.reduce(Action::PreviewFinished {
        latest: preview.latest(),
        completion: newer,
    });
    let state = state.reduce(Action::PreviewFinished {
        latest: preview.latest(),
        completion: older,
    });

    assert_eq!(first_names(&state), vec!["Newer"]);
    assert_eq!(state.total, 20);
    assert_eq!(state.filters.page, 2);
    assert!(!state.loading);
}

#[tokio::test]
async fn dropdowns_for_abandoned_resource_are_dropped() {
    let api = Arc::new(
        FakeApi::new()
            .on(
                "pue_providers",
                FakeReply::json(200, r#"[{"company_name":"Google"},{"company_name":"Meta"}]"#),
            )
            .on(
                "pue_countries",
                FakeReply::json(200, r#"[{"country":"Trinidad and Tobago, Chile"}]"#),
            ),
    );
    let query = QueryService::new(api);

    let pue_lists = query.load_dropdown_data(Resource::Pue).await;
    let switched = ExplorerState::default().reduce(Action::SetResource(Resource::Wue));
    let state = switched.reduce(Action::DropdownsLoaded {
        resource: Resource::Pue,
        data: pue_lists.clone(),
    });

    assert_eq!(state.dropdowns, DropdownData::default());
    assert_eq!(
        pue_lists.countries,
        vec!["Chile".to_string(), "Trinidad and Tobago".to_string()]
    );

    let state = ExplorerState::default().reduce(Action::DropdownsLoaded {
        resource: Resource::Pue,
        data: pue_lists,
    });
    assert_eq!(state.dropdowns.providers, vec!["Google", "Meta"]);
    assert_eq!(state.dropdowns.regions, vec!["(Any)"]);
}

#[test]
fn inverted_range_is_rejected_before_any_request() {
    let api = Arc::new(FakeApi::new());
    let preview = preview_over(api.clone());
    let state = ExplorerState::default()
        .reduce(Action::SetValueFrom("2024".to_string()))
        .reduce(Action::SetValueTo("2019".to_string()));

    let err = state
        .begin_preview(&preview, FilterOverrides::default())
        .expect_err("inverted range should be rejected");
    let state = state.reduce(Action::PreviewRejected(err.to_string()));

    assert_eq!(
        state.error.as_deref(),
        Some("Value From cannot be greater than Value To")
    );
    assert!(!state.loading);
    assert_eq!(preview.latest().value(), 0);
    assert!(api.requests().is_empty());
}

#[test]
fn non_numeric_range_text_blocks_preview() {
    let api = Arc::new(FakeApi::new());
    let preview = preview_over(api.clone());
    let state = ExplorerState::default().reduce(Action::SetValueFrom("20x9".to_string()));

    let err = state
        .begin_preview(&preview, FilterOverrides::default())
        .expect_err("non-numeric bound should be rejected");
    let state = state.reduce(Action::PreviewRejected(err.to_string()));

    assert_eq!(state.error.as_deref(), Some("Value From must be a number"));
    assert_eq!(preview.latest().value(), 0);
    assert!(api.requests().is_empty());

    let fixed = state.reduce(Action::SetValueFrom("2019".to_string()));
    let ticket = fixed
        .begin_preview(&preview, FilterOverrides::default())
        .expect("numeric bound should be accepted");
    assert_eq!(ticket.snapshot.value_from, Some(2019.0));
}

#[tokio::test]
async fn switching_resource_never_shows_rows_under_other_headers() {
    let api = Arc::new(FakeApi::new().on(
        "pue",
        FakeReply::json(200, r#"[{"pue_type":"Design","is_pue_self_reported":"Yes"}]"#)
            .with_header("x-total-count", "1"),
    ));
    let preview = preview_over(api);

    let loaded = preview_once(&preview, ExplorerState::default(), FilterOverrides::default()).await;
    assert_eq!(loaded.rows.len(), 1);

    let switched = loaded.clone().reduce(Action::SetResource(Resource::Wue));
    assert!(switched.rows.is_empty());
    assert_eq!(switched.total, 0);

    let rendered = columns(Resource::Wue)
        .iter()
        .map(|spec| (spec.name, loaded.rows[0].display(spec).label()))
        .collect::<Vec<_>>();
    assert!(rendered.contains(&("water_input", "-".to_string())));
    assert!(rendered.contains(&("country", "-".to_string())));
}

#[test]
fn url_bar_shows_selected_flavour() {
    let state = ExplorerState::default().reduce(Action::SetProvider("Azure".to_string()));
    let json_url = QueryService::table_request(&state.filters).url(API_BASE);
    let csv_url = QueryService::export_request(
        &state.filters,
        crate::domain::entities::filters::ExportFormat::Csv,
    )
    .url(API_BASE);

    assert_eq!(
        url_bar_text(UrlMode::Json, &json_url, &csv_url),
        "https://api.test/v1/pue?company_name=ilike.*Azure*&page=1&per_page=10"
    );
    assert_eq!(
        url_bar_text(UrlMode::Csv, &json_url, &csv_url),
        "https://api.test/v1/pue.csv?company_name=ilike.*Azure*&per_page=10"
    );
    assert_eq!(
        url_bar_text(UrlMode::Curl, &json_url, &csv_url),
        format!("curl -sL '{json_url}'")
    );
}

#[test]
fn filter_options_matches_case_insensitively() {
    let options = vec![
        "Amazon Web Services".to_string(),
        "Google".to_string(),
        "Microsoft Azure".to_string(),
    ];

    assert_eq!(filter_options(&options, "  "), options);
    assert_eq!(
        filter_options(&options, "AZ"),
        vec!["Amazon Web Services".to_string(), "Microsoft Azure".to_string()]
    );
    assert!(filter_options(&options, "oracle").is_empty());
}

#[test]
fn export_status_mentions_count_only_when_known() {
    let path = std::path::Path::new("/tmp/pue-2026-10-16.csv");

    assert_eq!(
        export_saved_message(Some(3), path),
        "Exported 3 records to /tmp/pue-2026-10-16.csv"
    );
    assert_eq!(
        export_saved_message(None, path),
        "Exported to /tmp/pue-2026-10-16.csv"
    );
}

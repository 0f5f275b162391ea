use dioxus::prelude::{use_signal, Signal};

use crate::usecase::state::ExplorerState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropdownId {
    Provider,
    Countries,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UrlMode {
    Json,
    Csv,
    Curl,
}

pub struct AppState {
    pub explorer: Signal<ExplorerState>,
    pub open_dropdown: Signal<Option<DropdownId>>,
    pub country_search: Signal<String>,
    pub url_mode: Signal<UrlMode>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            explorer: use_signal(ExplorerState::default),
            open_dropdown: use_signal(|| None::<DropdownId>),
            country_search: use_signal(String::new),
            url_mode: use_signal(|| UrlMode::Json),
        }
    }
}

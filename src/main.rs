mod app;
mod config;

mod domain {
    pub mod entities {
        pub mod dropdown;
        pub mod filters;
        pub mod record;
    }
    pub mod error;
    pub mod normalize;
    pub mod query;
}

mod usecase {
    pub mod ports {
        pub mod api;
        #[cfg(test)]
        pub mod fake_api;
    }
    pub mod sequencer;
    pub mod services {
        pub mod preview_service;
        pub mod query_service;
    }
    pub mod state;
}

mod infra {
    pub mod http {
        pub mod client;
    }
}

mod platform {
    pub mod desktop {
        pub mod save_dialog;
    }
}

mod ui {
    pub mod state {
        pub mod app_state;
    }
}

#[cfg(test)]
mod tests;

use tracing::{info, warn};

use crate::app::App;
use crate::config::default_webview_data_dir;

fn main() {
    if let Err(err) = dioxus::logger::init(tracing::Level::INFO) {
        eprintln!("failed to initialise logger: {err}");
    }

    let mut desktop_config = dioxus::desktop::Config::new()
        .with_window(dioxus::desktop::WindowBuilder::new().with_title("DCEWM Explorer"));
    match default_webview_data_dir() {
        Ok(dir) => {
            info!(dir = %dir.display(), "using webview data directory");
            desktop_config = desktop_config.with_data_directory(dir);
        }
        Err(err) => warn!(error = %err, "falling back to default webview data directory"),
    }

    dioxus::LaunchBuilder::desktop()
        .with_cfg(desktop_config)
        .launch(App);
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use directories::{ProjectDirs, UserDirs};

pub const DEFAULT_API_BASE: &str = "https://dcewm-api.hcfmike040210.workers.dev/v1";
pub const API_BASE_ENV: &str = "DCEWM_API_BASE";

pub const DOWNLOAD_ERROR_CLEAR_DELAY: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerConfig {
    pub api_base: String,
    pub download_dir: Option<PathBuf>,
}

impl ExplorerConfig {
    pub fn from_env() -> Self {
        Self::resolve(std::env::var(API_BASE_ENV).ok())
    }

    pub fn resolve(api_base_override: Option<String>) -> Self {
        let api_base = api_base_override
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Self {
            api_base,
            download_dir: default_download_dir(),
        }
    }
}

fn default_download_dir() -> Option<PathBuf> {
    UserDirs::new().and_then(|dirs| dirs.download_dir().map(|dir| dir.to_path_buf()))
}

fn ensure_webview_data_dir(base_data_dir: &Path) -> Result<PathBuf> {
    let webview_data_dir = base_data_dir.join("webview");
    std::fs::create_dir_all(&webview_data_dir).with_context(|| {
        format!(
            "failed to create webview dir: {}",
            webview_data_dir.display()
        )
    })?;
    Ok(webview_data_dir)
}

pub fn default_webview_data_dir() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("org", "dcewm", "explorer")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
    ensure_webview_data_dir(project_dirs.data_local_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_test_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("dcewm-{prefix}-{nanos}"))
    }

    #[test]
    fn webview_dir_is_created_under_base() {
        let base = unique_test_dir("webview");

        let dir = ensure_webview_data_dir(&base).expect("webview dir should be created");

        assert_eq!(dir, base.join("webview"));
        assert!(dir.is_dir());
        std::fs::remove_dir_all(&base).expect("should cleanup temp dir");
    }

    #[test]
    fn api_base_override_is_trimmed() {
        let config = ExplorerConfig::resolve(Some(" http://localhost:3000/v1/ ".to_string()));
        assert_eq!(config.api_base, "http://localhost:3000/v1");
    }

    #[test]
    fn blank_override_falls_back_to_default() {
        assert_eq!(
            ExplorerConfig::resolve(Some("   ".to_string())).api_base,
            DEFAULT_API_BASE
        );
        assert_eq!(ExplorerConfig::resolve(None).api_base, DEFAULT_API_BASE);
    }
}

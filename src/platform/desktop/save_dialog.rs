use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rfd::FileDialog;

use crate::usecase::services::query_service::ExportFile;

/// Asks where to save `export` and writes it. `Ok(None)` means the user cancelled.
pub fn save_export(export: &ExportFile, default_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let mut dialog = FileDialog::new()
        .set_file_name(export.file_name.as_str())
        .add_filter(export.format.label(), &[export.format.extension()]);
    if let Some(dir) = default_dir {
        dialog = dialog.set_directory(dir);
    }

    let Some(path) = dialog.save_file() else {
        return Ok(None);
    };
    write_export(&path, export)?;
    Ok(Some(path))
}

pub fn write_export(path: &Path, export: &ExportFile) -> Result<()> {
    fs::write(path, &export.bytes)
        .with_context(|| format!("failed to write export: {}", path.display()))
}

use std::fs;
use std::path::{Path, PathBuf};

use crate::bundle::Bundle;
use crate::error::ExportError;

/// `<output_dir>/<patient_id>-bundle.json`
pub fn bundle_path(output_dir: &Path, patient_id: &str) -> PathBuf {
    output_dir.join(format!("{patient_id}-bundle.json"))
}

/// Writes `bundle` as pretty-printed JSON, replacing any existing file.
pub fn save(bundle: &Bundle, path: &Path) -> Result<(), ExportError> {
    let io_err = |source: std::io::Error| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let content = serde_json::to_string_pretty(bundle)?;
    fs::write(path, content).map_err(io_err)?;
    tracing::info!(path = %path.display(), entries = bundle.entry.len(), "bundle written");
    Ok(())
}

pub fn load(path: &Path) -> Result<Bundle, ExportError> {
    let content = fs::read_to_string(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

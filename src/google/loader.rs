use crate::error::RelayError;
use crate::google::credentials::ServiceAccountCredential;
use serde_json::Value;
use std::{fs, path::Path};
use tracing::{info, warn};

/// Load service-account JSON files from a directory. The file stem is the
/// project id; each file is a Google key file with an added `site_url` field.
pub fn load_from_dir(dir: &Path) -> Result<Vec<(String, ServiceAccountCredential)>, RelayError> {
    if !dir.exists() {
        info!(path = %dir.display(), "credentials directory not found; skipping load");
        return Ok(Vec::new());
    }

    let loaded: Vec<(String, ServiceAccountCredential)> = fs::read_dir(dir)?
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                let err: RelayError = e.into();
                warn!(error = %err, "failed to read credentials dir entry");
                None
            }
        })
        .filter(|path| is_json_file(path))
        .filter_map(|path| {
            load_credential(&path)
                .inspect_err(|e| {
                    warn!(path = %path.display(), error = %e, "failed to load credential");
                })
                .ok()
        })
        .collect();

    Ok(loaded)
}

fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        == Some(true)
}

fn load_credential(path: &Path) -> Result<(String, ServiceAccountCredential), RelayError> {
    let project = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| RelayError::BadRequest("credential file has no usable name".into()))?
        .to_string();
    let contents = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&contents)?;
    let cred = ServiceAccountCredential::from_payload(&value)?;
    Ok((project, cred))
}

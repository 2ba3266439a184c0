//! Report artifacts: `{results_dir}/{session}/{prefix}_kg_{mode}.json`.

use std::path::{Path, PathBuf};

use kgscout_common::normalise::safe_file_prefix;
use kgscout_common::Result;
use tracing::info;

pub const SESSION_ENV: &str = "KGSCOUT_SESSION_ID";

/// Session directory name: `KGSCOUT_SESSION_ID`, else a local timestamp.
pub fn session_id() -> String {
    std::env::var(SESSION_ENV)
        .ok()
        .map(|s| safe_file_prefix(s.trim()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| chrono::Local::now().format("%Y%m%d_%H%M%S").to_string())
}

/// Artifact path, or `None` when nothing file-safe is left of the prefix.
pub fn artifact_path(results_dir: &Path, session: &str, prefix: &str, mode: &str) -> Option<PathBuf> {
    let prefix = safe_file_prefix(prefix);
    if prefix.is_empty() {
        return None;
    }
    Some(results_dir.join(session).join(format!("{prefix}_kg_{mode}.json")))
}

pub fn write_artifact(path: &Path, json: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, json)?;
    info!("Report saved to {}", path.display());
    Ok(())
}

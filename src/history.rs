//! Published-title history and the duplicate guard.
//!
//! The history is a JSON array of titles stored at `<outputDir>/.blog-history.json`.
//! It is read defensively (a missing or malformed file is an empty history) and
//! rewritten wholesale after every successful run.

use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, instrument, warn};

use crate::error::Result;

/// File name of the history document inside the output directory.
pub const HISTORY_FILE: &str = ".blog-history.json";

pub fn history_path(output_dir: &Path) -> PathBuf {
    output_dir.join(HISTORY_FILE)
}

/// Normalize a title for duplicate comparison.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Whether `title` was already published, ignoring case and surrounding whitespace.
pub fn is_duplicate_title(title: &str, history: &[String]) -> bool {
    let normalized = normalize_title(title);
    history.iter().any(|prev| normalize_title(prev) == normalized)
}

/// Load the title history. Never fails: an unreadable file or one that is not a
/// JSON array yields an empty list. Non-string entries are skipped.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn load_history(path: &Path) -> Vec<String> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            debug!(error = %e, "No readable history file, starting fresh");
            return Vec::new();
        }
    };

    let entries = match serde_json::from_str::<Vec<Value>>(&content) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "History file is not a JSON array, ignoring it");
            return Vec::new();
        }
    };

    let total = entries.len();
    let titles: Vec<String> = entries
        .into_iter()
        .filter_map(|entry| entry.as_str().map(str::to_string))
        .collect();
    if titles.len() < total {
        warn!(skipped = total - titles.len(), "Skipped non-string history entries");
    }
    titles
}

/// Rewrite the history file with `titles`.
pub async fn save_history(path: &Path, titles: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, serde_json::to_string_pretty(titles)?).await?;
    Ok(())
}

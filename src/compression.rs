//! Image compression accounting.
//!
//! Every optimized image gets an entry in `<assetDir>/.compression-log.json`,
//! keyed by file basename. Entries are overwritten on each optimization of the
//! same file and only removed when the image itself is discarded.
//!
//! ```text
//! {
//!   "2025-05-06-hello-world.png": {
//!     "originalSize": 1048576,
//!     "compressedSize": 524288,
//!     "savings": 524288,
//!     "savingsPercent": 50.0,
//!     "lastModified": "2025-05-06T10:00:00.000Z"
//!   }
//! }
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::error::Result;

/// File name of the log inside the asset directory.
pub const COMPRESSION_LOG_FILE: &str = ".compression-log.json";

pub type CompressionLog = BTreeMap<String, CompressionLogEntry>;

pub fn compression_log_path(asset_dir: &Path) -> PathBuf {
    asset_dir.join(COMPRESSION_LOG_FILE)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionLogEntry {
    pub original_size: u64,
    pub compressed_size: u64,
    /// Negative when re-encoding made the file bigger.
    pub savings: i64,
    pub savings_percent: f64,
    pub last_modified: String,
}

impl CompressionLogEntry {
    pub fn new(original_size: u64, compressed_size: u64, now: DateTime<Utc>) -> Self {
        let savings = original_size as i64 - compressed_size as i64;
        let savings_percent = if original_size > 0 {
            round_one_decimal(savings as f64 / original_size as f64 * 100.0)
        } else {
            0.0
        };

        CompressionLogEntry {
            original_size,
            compressed_size,
            savings,
            savings_percent,
            last_modified: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Aggregate view over every logged image.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionStats {
    pub total_files: usize,
    pub total_original_size: u64,
    pub total_compressed_size: u64,
    pub total_savings: i64,
    pub average_savings_percent: f64,
}

impl CompressionStats {
    /// Zeroed when the log is empty.
    pub fn from_log(log: &CompressionLog) -> Self {
        if log.is_empty() {
            return CompressionStats::default();
        }

        let total_original_size: u64 = log.values().map(|e| e.original_size).sum();
        let total_compressed_size: u64 = log.values().map(|e| e.compressed_size).sum();
        let percent_sum: f64 = log.values().map(|e| e.savings_percent).sum();

        CompressionStats {
            total_files: log.len(),
            total_original_size,
            total_compressed_size,
            total_savings: total_original_size as i64 - total_compressed_size as i64,
            average_savings_percent: round_one_decimal(percent_sum / log.len() as f64),
        }
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Load the log. Missing or malformed files yield an empty log.
pub async fn load_compression_log(log_path: &Path) -> CompressionLog {
    let Ok(content) = fs::read_to_string(log_path).await else {
        return CompressionLog::new();
    };
    serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!(path = %log_path.display(), error = %e, "Ignoring malformed compression log");
        CompressionLog::new()
    })
}

pub async fn save_compression_log(log_path: &Path, log: &CompressionLog) -> Result<()> {
    fs::write(log_path, serde_json::to_string_pretty(log)?).await?;
    Ok(())
}

/// Upsert the entry for `image_path`'s basename.
#[instrument(level = "debug", skip(log_path))]
pub async fn record_compression(
    log_path: &Path,
    image_path: &Path,
    original_size: u64,
    compressed_size: u64,
) -> Result<CompressionLogEntry> {
    let filename = image_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| image_path.display().to_string());

    let mut log = load_compression_log(log_path).await;
    let entry = CompressionLogEntry::new(original_size, compressed_size, Utc::now());
    log.insert(filename.clone(), entry.clone());
    save_compression_log(log_path, &log).await?;

    if entry.savings > 0 {
        info!(
            file = %filename,
            original_kb = %format!("{:.1}", original_size as f64 / 1024.0),
            compressed_kb = %format!("{:.1}", compressed_size as f64 / 1024.0),
            savings_percent = entry.savings_percent,
            "Compressed image"
        );
    } else {
        debug!(file = %filename, savings = entry.savings, "Re-encoding did not shrink image");
    }

    Ok(entry)
}

/// Drop the entry for `image_path`'s basename, if any.
pub async fn forget_compression(log_path: &Path, image_path: &Path) -> Result<()> {
    let Some(filename) = image_path.file_name() else {
        return Ok(());
    };
    let mut log = load_compression_log(log_path).await;
    if log.remove(&*filename.to_string_lossy()).is_some() {
        save_compression_log(log_path, &log).await?;
    }
    Ok(())
}

pub async fn compression_stats(log_path: &Path) -> CompressionStats {
    CompressionStats::from_log(&load_compression_log(log_path).await)
}

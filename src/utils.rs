//! Text helpers and file system checks used throughout the pipeline.
//!
//! This module provides:
//! - Slug generation for post folders and image names
//! - IST-shifted publication dates
//! - Reading-time estimation and SEO keyword extraction over markdown
//! - String truncation for logging
//! - Output directory validation

use chrono::{DateTime, TimeDelta, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Maximum slug length in characters.
pub const MAX_SLUG_LEN: usize = 100;

/// Words per minute used by [`reading_time_minutes`].
pub const WORDS_PER_MINUTE: usize = 200;

/// Maximum number of keywords stored in post metadata.
pub const MAX_KEYWORDS: usize = 10;

/// IST is UTC+05:30.
const IST_OFFSET_SECS: i64 = 5 * 3600 + 30 * 60;

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s-]").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static HYPHEN_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());
static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`]+`").unwrap());
static MARKDOWN_SYNTAX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[#*_\[\]()]").unwrap());
static DATE_STRING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "is", "are", "was", "were", "be", "been", "have", "has", "had", "do", "does", "did", "will",
    "would", "could", "should", "this", "that", "these", "those",
];

/// Convert a title to a URL-friendly slug.
///
/// Lowercases, drops everything outside `[a-z0-9]`, whitespace and `-`, turns
/// whitespace runs into single hyphens, collapses repeated hyphens and trims
/// them from both ends. The result is capped at [`MAX_SLUG_LEN`] characters.
/// A title with nothing slug-worthy in it becomes `"post"`.
///
/// # Examples
///
/// ```
/// use auto_tech_blog::utils::slugify;
///
/// assert_eq!(slugify("Hello World!"), "hello-world");
/// assert_eq!(slugify("2024: The Year of AI"), "2024-the-year-of-ai");
/// ```
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let cleaned = NON_SLUG_CHARS.replace_all(&lowered, "");
    let hyphenated = WHITESPACE_RUN.replace_all(&cleaned, "-");
    let collapsed = HYPHEN_RUN.replace_all(&hyphenated, "-");

    // Only ASCII survives the filters above, so byte truncation is safe.
    let mut slug = collapsed.trim_matches('-').to_string();
    slug.truncate(MAX_SLUG_LEN);
    let slug = slug.trim_end_matches('-');

    if slug.is_empty() {
        "post".to_string()
    } else {
        slug.to_string()
    }
}

/// Format the publication date for `now` shifted into IST (`YYYY-MM-DD`).
pub fn ist_date(now: DateTime<Utc>) -> String {
    (now + TimeDelta::seconds(IST_OFFSET_SECS)).format("%Y-%m-%d").to_string()
}

/// Whether `s` looks like a `YYYY-MM-DD` date override.
pub fn is_date_string(s: &str) -> bool {
    DATE_STRING.is_match(s)
}

/// Count the words of a markdown document, ignoring code and markup tokens.
pub fn count_words(markdown: &str) -> usize {
    let without_fences = CODE_FENCE.replace_all(markdown, "");
    let without_inline = INLINE_CODE.replace_all(&without_fences, "");
    let plain = MARKDOWN_SYNTAX.replace_all(&without_inline, "");
    plain.split_whitespace().count()
}

/// Estimate reading time in whole minutes (never less than one).
pub fn reading_time_minutes(markdown: &str) -> usize {
    count_words(markdown).div_ceil(WORDS_PER_MINUTE).max(1)
}

/// Pick the most frequent meaningful words of `content` for SEO keywords.
///
/// Punctuation is stripped, words of four characters or more that are not
/// stopwords are counted, and the [`MAX_KEYWORDS`] most frequent are returned.
/// Ties keep first-appearance order.
pub fn extract_keywords(content: &str) -> Vec<String> {
    let stopwords: HashSet<&str> = STOPWORDS.iter().copied().collect();
    let cleaned: String = content
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in cleaned.split_whitespace() {
        if word.len() <= 3 || stopwords.contains(word) {
            continue;
        }
        let count = counts.entry(word).or_insert(0);
        if *count == 0 {
            order.push(word);
        }
        *count += 1;
    }

    // Stable sort keeps first-appearance order between equal counts.
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

/// Take at most `max` characters from `s`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a count of the
/// dropped characters appended.
///
/// # Examples
///
/// ```
/// use auto_tech_blog::utils::truncate_for_log;
///
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(15), 10), "aaaaaaaaaa…(+5 chars)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let total = s.chars().count();
    if total <= max {
        s.to_string()
    } else {
        format!("{}…(+{} chars)", truncate_chars(s, max), total - max)
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable
/// (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path).await?;
    // A sync probe keeps the error surface simple.
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

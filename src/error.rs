//! Error types and enrichment outcomes.
//!
//! Two kinds of failure flow through the pipeline:
//!
//! - [`Error`]: fatal. Returned through `Result` and ends the run. The two gate
//!   aborts ([`Error::DuplicateTitle`], [`Error::FactCheckFailed`]) live here too.
//! - [`Outcome::Degraded`]: a best-effort step (a topic provider, article
//!   extraction, hero image generation) did not produce anything. The caller
//!   falls back and keeps going.

use std::fmt;

use crate::pipeline::Stage;

/// Fatal errors surfaced to the caller of the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("feed parse error: {0}")]
    Feed(#[from] rss::Error),

    #[error("model API error: {0}")]
    Model(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{stage}: duplicate title detected: \"{title}\"")]
    DuplicateTitle { stage: Stage, title: String },

    #[error(
        "{stage}: draft contains {} unsupported claim(s), aborting post generation",
        .issues.len()
    )]
    FactCheckFailed { stage: Stage, issues: Vec<String> },
}

impl Error {
    /// The pipeline stage that aborted the run, for gate failures.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::DuplicateTitle { stage, .. } | Error::FactCheckFailed { stage, .. } => {
                Some(*stage)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Result of a best-effort call.
///
/// `Degraded` carries the reason for logging only; it never aborts the run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Degraded(String),
}

impl<T> Outcome<T> {
    /// Demote any error into a degraded outcome.
    pub fn from_result<E: fmt::Display>(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(e) => Outcome::Degraded(e.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Degraded(_) => None,
        }
    }

    /// Keep the value only if it passes `check`, otherwise degrade with `reason`.
    pub fn require(self, check: impl FnOnce(&T) -> bool, reason: impl Into<String>) -> Self {
        match self {
            Outcome::Success(value) if check(&value) => Outcome::Success(value),
            Outcome::Success(_) => Outcome::Degraded(reason.into()),
            degraded => degraded,
        }
    }
}

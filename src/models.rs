//! Data models shared across the generation pipeline.
//!
//! This module defines the core data structures used throughout the application:
//! - [`StoryCandidate`]: A raw story reported by one of the topic providers
//! - [`Topic`]: The subject chosen for this run, with optional extracted context
//! - [`FactCheckResult`]: Verdict of the fact-check gate
//! - [`PostMetadata`]: The `metadata.json` document written for every post
//! - [`GeneratedPost`]: What a successful run hands back to its caller
//!
//! `PostMetadata` uses camelCase keys on disk because the site renderer and the
//! RSS/sitemap regenerator read them back with that schema.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A story as reported by a topic provider, before any content extraction.
///
/// # Fields
///
/// * `title` - Headline as published by the provider
/// * `description` - Plain-text teaser (may be empty)
/// * `url` - Link to the full article
/// * `source` - Provider tag (e.g. `"Hacker News"`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryCandidate {
    pub title: String,
    pub description: String,
    pub url: String,
    pub source: String,
}

/// The subject of the post produced by this run.
///
/// A topic comes from exactly one acquisition path (the source aggregator or the
/// generative fallback) and is not modified once chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Topic {
    /// Headline, soft limit of 70 characters.
    pub title: String,
    /// Short description, soft limit of 200 characters.
    pub description: String,
    /// Extracted article text used to ground the draft. Empty when no article
    /// yielded enough material.
    pub full_content: String,
    /// Provider tag, `None` for generated topics.
    pub source: Option<String>,
}

impl Topic {
    /// Whether the draft can be grounded in (and fact-checked against) source text.
    pub fn has_context(&self) -> bool {
        !self.full_content.trim().is_empty()
    }
}

impl From<StoryCandidate> for Topic {
    fn from(story: StoryCandidate) -> Self {
        Topic {
            title: story.title,
            description: story.description,
            full_content: String::new(),
            source: Some(story.source),
        }
    }
}

/// Verdict of the fact-check gate.
///
/// `issues` is ordered as the model reported them and holds at most ten entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactCheckResult {
    pub ok: bool,
    pub issues: Vec<String>,
}

impl FactCheckResult {
    pub fn passed() -> Self {
        FactCheckResult {
            ok: true,
            issues: Vec::new(),
        }
    }
}

/// Metadata written to `posts/<folder>/metadata.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMetadata {
    pub title: String,
    pub description: String,
    /// Publication date, `YYYY-MM-DD`.
    pub date: String,
    /// e.g. `"4 min read"`.
    pub reading_time: String,
    /// Site-relative hero image path, e.g. `/assets/images/<folder>.png`.
    pub image: String,
    pub keywords: Vec<String>,
    /// Date-prefixed folder name, e.g. `2025-05-06-hello-world`.
    pub slug: String,
}

/// Terminal success payload of a pipeline run.
#[derive(Debug, Clone)]
pub struct GeneratedPost {
    pub folder_name: String,
    pub metadata: PostMetadata,
    pub image_path: PathBuf,
    pub post_dir: PathBuf,
}

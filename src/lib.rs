//! # auto-tech-blog
//!
//! Generates one technology blog post per run: picks a topic from live news
//! sources (or asks the model for one), drafts it with Gemini, fact-checks the
//! draft against the source article, produces a hero image and writes the post
//! together with refreshed RSS and sitemap indexes.
//!
//! ## Architecture
//!
//! 1. **Topic**: [`scrapers::TopicAggregator`] queries curated feeds, Hacker News
//!    and the Guardian concurrently, then extracts article text;
//!    [`editorial::synthesize_topic`] is the fallback
//! 2. **Gates**: duplicate titles ([`history`]) and unsupported claims
//!    ([`editorial::fact_check`]) abort the run before anything is written
//! 3. **Assets**: [`images`] writes the generated hero image or a placeholder and
//!    records compression savings ([`compression`])
//! 4. **Output**: [`outputs`] writes the post folder, `rss.xml` and `sitemap.xml`
//!
//! [`pipeline::Pipeline`] sequences the stages.

pub mod api;
pub mod cli;
pub mod compression;
pub mod config;
pub mod editorial;
pub mod error;
pub mod history;
pub mod images;
pub mod models;
pub mod outputs;
pub mod pipeline;
pub mod scrapers;
pub mod utils;

pub use api::{GeminiClient, GenerativeModel};
pub use config::PipelineConfig;
pub use error::{Error, Outcome, Result};
pub use models::GeneratedPost;
pub use pipeline::{Pipeline, Stage};

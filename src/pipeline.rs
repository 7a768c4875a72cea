//! The generation pipeline.
//!
//! One [`Pipeline::run`] produces one post. Stages execute strictly in order:
//!
//! ```text
//! AcquireTopic → CheckDuplicate → Draft → FactCheck → AcquireImage
//!     → Persist → UpdateHistory → RegenerateIndexes → Done
//! ```
//!
//! `CheckDuplicate` and `FactCheck` are gates: they abort the run before any
//! file is written. `AcquireImage` never aborts (it falls back to a
//! placeholder) and `RegenerateIndexes` failures are only logged.

use reqwest::Client;
use std::fmt;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::api::GenerativeModel;
use crate::config::PipelineConfig;
use crate::editorial::{draft_post, fact_check, synthesize_topic};
use crate::error::{Error, Result};
use crate::history::{history_path, is_duplicate_title, load_history, save_history};
use crate::images::{HeroAsset, acquire_hero_image, discard_hero_image};
use crate::models::{GeneratedPost, Topic};
use crate::outputs::post::{build_metadata, folder_name, write_post_files};
use crate::outputs::{rss, sitemap};
use crate::scrapers::{TopicAggregator, http_client};
use crate::utils::slugify;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AcquireTopic,
    CheckDuplicate,
    Draft,
    FactCheck,
    AcquireImage,
    Persist,
    UpdateHistory,
    RegenerateIndexes,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::AcquireTopic => "acquire-topic",
            Stage::CheckDuplicate => "check-duplicate",
            Stage::Draft => "draft",
            Stage::FactCheck => "fact-check",
            Stage::AcquireImage => "acquire-image",
            Stage::Persist => "persist",
            Stage::UpdateHistory => "update-history",
            Stage::RegenerateIndexes => "regenerate-indexes",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Generates one post per run against a [`GenerativeModel`].
pub struct Pipeline<M> {
    model: M,
    config: PipelineConfig,
    sources_client: Client,
}

impl<M: GenerativeModel> Pipeline<M> {
    pub fn new(model: M, config: PipelineConfig) -> Result<Self> {
        let sources_client = http_client(config.sources.timeout)?;
        Ok(Self {
            model,
            config,
            sources_client,
        })
    }

    /// Run every stage and return the published post.
    ///
    /// # Errors
    ///
    /// Gate aborts ([`Error::DuplicateTitle`], [`Error::FactCheckFailed`]),
    /// failure to synthesize a topic or draft, and file system errors while
    /// persisting.
    pub async fn run(&self) -> Result<GeneratedPost> {
        let start = Instant::now();
        let topic = self.acquire_topic().await?;
        let post = self.publish(topic).await?;
        info!(
            stage = %Stage::Done,
            folder = %post.folder_name,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Blog post generation completed"
        );
        Ok(post)
    }

    /// Live sources first, then the generative fallback.
    async fn acquire_topic(&self) -> Result<Topic> {
        info!(stage = %Stage::AcquireTopic, "Fetching topic suggestions");
        let mut aggregator = TopicAggregator::new(
            self.sources_client.clone(),
            self.config.sources.clone(),
            self.config.seed,
        );

        let topic = match aggregator.acquire().await {
            Some(topic) => topic,
            None => {
                info!(stage = %Stage::AcquireTopic, "Generating topic with the model");
                synthesize_topic(&self.model).await?
            }
        };
        info!(
            title = %topic.title,
            source = topic.source.as_deref().unwrap_or("generated"),
            has_context = topic.has_context(),
            "Topic selected"
        );
        Ok(topic)
    }

    /// Take a chosen topic through the gates and write the post.
    pub async fn publish(&self, topic: Topic) -> Result<GeneratedPost> {
        let config = &self.config;
        let check_duplicates = !config.skip_duplicate_check;

        // CheckDuplicate
        let history_file = history_path(&config.output_dir);
        let mut history = if check_duplicates {
            load_history(&history_file).await
        } else {
            Vec::new()
        };
        info!(stage = %Stage::CheckDuplicate, entries = history.len(), "Loaded history");
        if check_duplicates && is_duplicate_title(&topic.title, &history) {
            return Err(Error::DuplicateTitle {
                stage: Stage::CheckDuplicate,
                title: topic.title,
            });
        }

        // Draft
        info!(stage = %Stage::Draft, "Drafting post");
        let draft = draft_post(&self.model, &topic).await?;

        // FactCheck
        if topic.has_context() {
            info!(stage = %Stage::FactCheck, "Fact-checking draft");
            let verdict = fact_check(&self.model, &draft, &topic.full_content).await;
            if !verdict.ok {
                for issue in &verdict.issues {
                    error!(%issue, "Unsupported claim");
                }
                return Err(Error::FactCheckFailed {
                    stage: Stage::FactCheck,
                    issues: verdict.issues,
                });
            }
        }

        // AcquireImage
        let folder = folder_name(&config.date, &slugify(&topic.title));
        let post_dir = config.posts_dir().join(&folder);
        let image_path = config.asset_dir().join(format!("{folder}.png"));
        info!(stage = %Stage::AcquireImage, path = %image_path.display(), "Generating hero image");
        match acquire_hero_image(&self.model, &topic.title, &image_path, &config.images).await? {
            HeroAsset::Generated(entry) => {
                info!(savings_percent = entry.savings_percent, "Saved generated hero image")
            }
            HeroAsset::Placeholder => warn!("Post uses the placeholder hero image"),
        }

        // Persist
        let metadata = build_metadata(&topic, &draft, &config.date, &folder);
        if let Err(e) = write_post_files(&post_dir, &metadata, &draft).await {
            if let Err(cleanup) = discard_hero_image(&image_path).await {
                warn!(
                    error = %cleanup,
                    path = %image_path.display(),
                    "Failed to remove orphaned hero image"
                );
            }
            return Err(e);
        }
        info!(stage = %Stage::Persist, reading_time = %metadata.reading_time, "Post written");

        // UpdateHistory
        if check_duplicates {
            history.push(topic.title.clone());
            save_history(&history_file, &history).await?;
            info!(stage = %Stage::UpdateHistory, entries = history.len(), "Updated history");
        }

        // RegenerateIndexes
        self.regenerate_indexes().await;

        Ok(GeneratedPost {
            folder_name: folder,
            metadata,
            image_path,
            post_dir,
        })
    }

    /// Rebuild rss.xml and sitemap.xml. Failures are logged, never returned.
    async fn regenerate_indexes(&self) {
        let output_dir = &self.config.output_dir;
        let site = &self.config.site;

        if let Err(e) = rss::save_rss(output_dir, site).await {
            warn!(stage = %Stage::RegenerateIndexes, error = %e, "RSS generation failed");
        }
        if let Err(e) = sitemap::save_sitemap(output_dir, site).await {
            warn!(stage = %Stage::RegenerateIndexes, error = %e, "Sitemap generation failed");
        }
    }
}

//! Runtime configuration.
//!
//! The binary parses [`Cli`](crate::cli::Cli) (flags with environment
//! fallbacks) and folds it into a [`PipelineConfig`]. Library code only ever
//! sees these structs, never the process environment.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::utils::{is_date_string, ist_date};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const TEXT_MODEL: &str = "gemini-2.5-flash";
pub const IMAGE_MODEL: &str = "gemini-2.0-flash-preview-image-generation";

pub const HACKER_NEWS_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";
pub const GUARDIAN_BASE_URL: &str = "https://content.guardianapis.com";

/// User agent sent by the feed reader and the article extractor.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; auto-tech-blog/1.0)";

/// Curated technology feeds. One is picked per run.
pub const DEFAULT_FEEDS: &[&str] = &[
    "https://techcrunch.com/feed/",
    "https://www.theverge.com/rss/index.xml",
    "https://feeds.arstechnica.com/arstechnica/index",
    "https://www.wired.com/feed/rss",
    "https://venturebeat.com/feed/",
    "https://mashable.com/feeds/rss/all",
    "https://www.engadget.com/rss.xml",
];

/// Connection details for the generative model.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        GeminiSettings {
            api_key: String::new(),
            base_url: GEMINI_BASE_URL.to_string(),
            text_model: TEXT_MODEL.to_string(),
            image_model: IMAGE_MODEL.to_string(),
        }
    }
}

/// Where the topic providers fetch from.
///
/// Tests point these at a local mock server.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub feeds: Vec<String>,
    pub hacker_news_base: String,
    pub guardian_base: String,
    /// `None` disables the Guardian provider.
    pub guardian_key: Option<String>,
    pub timeout: Duration,
}

impl Default for SourceSettings {
    fn default() -> Self {
        SourceSettings {
            feeds: DEFAULT_FEEDS.iter().map(|s| s.to_string()).collect(),
            hacker_news_base: HACKER_NEWS_BASE_URL.to_string(),
            guardian_base: GUARDIAN_BASE_URL.to_string(),
            guardian_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Hero image geometry and the sanity threshold for generated payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSettings {
    pub width: u32,
    pub height: u32,
    /// A generated payload must be strictly larger than this to be used.
    pub min_payload_bytes: usize,
}

impl Default for ImageSettings {
    fn default() -> Self {
        ImageSettings {
            width: 1920,
            height: 1080,
            min_payload_bytes: 100,
        }
    }
}

/// Site identity used by the RSS feed and the sitemap.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub site_url: String,
    pub title: String,
    pub description: String,
    /// Static routes listed in the sitemap ahead of `/blog` and the posts.
    pub static_pages: Vec<String>,
}

impl SiteConfig {
    /// Site URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.site_url.trim_end_matches('/')
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            site_url: "https://example.com".to_string(),
            title: "Tech Blog".to_string(),
            description: "Latest tech news and insights".to_string(),
            static_pages: ["/", "/about", "/contact", "/services", "/portfolio"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Everything a pipeline run needs besides the model client.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub output_dir: PathBuf,
    /// Publication date, `YYYY-MM-DD`.
    pub date: String,
    pub skip_duplicate_check: bool,
    /// Seed for the topic shuffle. `None` seeds from the OS.
    pub seed: Option<u64>,
    pub site: SiteConfig,
    pub sources: SourceSettings,
    pub images: ImageSettings,
}

impl PipelineConfig {
    /// Defaults rooted at `output_dir`, dated today in IST.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        PipelineConfig {
            output_dir: output_dir.into(),
            date: ist_date(Utc::now()),
            skip_duplicate_check: false,
            seed: None,
            site: SiteConfig::default(),
            sources: SourceSettings::default(),
            images: ImageSettings::default(),
        }
    }

    pub fn posts_dir(&self) -> PathBuf {
        self.output_dir.join("posts")
    }

    pub fn asset_dir(&self) -> PathBuf {
        self.output_dir.join("assets").join("images")
    }
}

/// Pick the publication date: a well-formed override wins, otherwise today in IST.
pub fn resolve_date(date_override: Option<&str>, now: DateTime<Utc>) -> String {
    match date_override.map(str::trim) {
        Some(date) if is_date_string(date) => date.to_string(),
        Some(date) => {
            tracing::warn!(date, "Ignoring malformed DATE override, expected YYYY-MM-DD");
            ist_date(now)
        }
        None => ist_date(now),
    }
}

impl TryFrom<&Cli> for GeminiSettings {
    type Error = Error;

    fn try_from(cli: &Cli) -> Result<Self> {
        let api_key = cli
            .gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                Error::Config("GEMINI_API_KEY environment variable is required".into())
            })?;

        Ok(GeminiSettings {
            api_key: api_key.to_string(),
            base_url: cli.gemini_base_url.clone(),
            ..GeminiSettings::default()
        })
    }
}

impl From<&Cli> for PipelineConfig {
    fn from(cli: &Cli) -> Self {
        let site = SiteConfig {
            site_url: cli.site_url.clone(),
            title: cli.site_title.clone(),
            description: cli.site_description.clone(),
            ..SiteConfig::default()
        };
        let sources = SourceSettings {
            guardian_key: cli
                .guardian_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            ..SourceSettings::default()
        };

        PipelineConfig {
            output_dir: PathBuf::from(&cli.output_dir),
            date: resolve_date(cli.date.as_deref(), Utc::now()),
            skip_duplicate_check: cli.skip_duplicate_check,
            seed: cli.seed,
            site,
            sources,
            images: ImageSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::Parser;

    #[test]
    fn test_resolve_date_prefers_valid_override() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(resolve_date(Some("2025-01-15"), now), "2025-01-15");
    }

    #[test]
    fn test_resolve_date_ignores_malformed_override() {
        // 20:00 UTC is already the next day in IST.
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 20, 0, 0).unwrap();
        assert_eq!(resolve_date(Some("15/01/2025"), now), "2025-01-02");
        assert_eq!(resolve_date(Some("2025-1-5"), now), "2025-01-02");
        assert_eq!(resolve_date(None, now), "2025-01-02");
    }

    #[test]
    fn test_pipeline_config_layout() {
        let config = PipelineConfig::new("/tmp/blog");
        assert_eq!(config.posts_dir(), PathBuf::from("/tmp/blog/posts"));
        assert_eq!(config.asset_dir(), PathBuf::from("/tmp/blog/assets/images"));
        assert!(is_date_string(&config.date));
    }

    #[test]
    fn test_from_cli() {
        let cli = Cli::parse_from([
            "auto-tech-blog",
            "--gemini-api-key",
            "k",
            "--output-dir",
            "./site",
            "--date",
            "2025-05-06",
            "--seed",
            "42",
            "--skip-duplicate-check",
            "--guardian-key",
            "  ",
        ]);

        let config = PipelineConfig::from(&cli);
        assert_eq!(config.output_dir, PathBuf::from("./site"));
        assert_eq!(config.date, "2025-05-06");
        assert_eq!(config.seed, Some(42));
        assert!(config.skip_duplicate_check);
        assert!(config.sources.guardian_key.is_none());
        assert_eq!(config.sources.feeds.len(), 7);

        let gemini = GeminiSettings::try_from(&cli).unwrap();
        assert_eq!(gemini.api_key, "k");
        assert_eq!(gemini.text_model, TEXT_MODEL);
    }

    #[test]
    fn test_missing_api_key_is_a_config_error() {
        let cli = Cli::parse_from(["auto-tech-blog", "--gemini-api-key", ""]);
        let err = GeminiSettings::try_from(&cli).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_site_base_url_trims_slash() {
        let site = SiteConfig {
            site_url: "https://blog.example.org/".into(),
            ..SiteConfig::default()
        };
        assert_eq!(site.base_url(), "https://blog.example.org");
    }
}

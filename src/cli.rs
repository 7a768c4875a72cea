//! Command-line interface definitions for auto-tech-blog.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Secrets and the date override can be provided via flags or environment
//! variables (a `.env` file in the working directory is loaded first).

use clap::Parser;

/// Command-line arguments for the auto-tech-blog generator.
///
/// One invocation generates one post under `--output-dir`.
///
/// # Examples
///
/// ```sh
/// # Basic usage, key from the environment
/// GEMINI_API_KEY=your-key auto-tech-blog
///
/// # Pin the publication date and write somewhere else
/// GEMINI_API_KEY=key DATE=2025-01-15 auto-tech-blog --output-dir ./site
///
/// # Report accumulated image compression savings and exit
/// auto-tech-blog --compression-stats
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Root directory for posts, assets, history, rss.xml and sitemap.xml
    #[arg(short, long, default_value = ".")]
    pub output_dir: String,

    /// Google Gemini API key (required for generation)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini API base URL
    #[arg(long, env = "GEMINI_BASE_URL", default_value = crate::config::GEMINI_BASE_URL)]
    pub gemini_base_url: String,

    /// Guardian Open Platform key; the Guardian source is skipped without it
    #[arg(long, env = "GUARDIAN_KEY", hide_env_values = true)]
    pub guardian_key: Option<String>,

    /// Publication date override (YYYY-MM-DD); malformed values are ignored
    #[arg(short, long, env = "DATE")]
    pub date: Option<String>,

    /// Publish even if the title already appears in the history
    #[arg(long)]
    pub skip_duplicate_check: bool,

    /// Public site URL used in rss.xml and sitemap.xml
    #[arg(long, env = "SITE_URL", default_value = "https://example.com")]
    pub site_url: String,

    /// Site title used in rss.xml
    #[arg(long, env = "SITE_TITLE", default_value = "Tech Blog")]
    pub site_title: String,

    /// Site description used in rss.xml
    #[arg(long, env = "SITE_DESCRIPTION", default_value = "Latest tech news and insights")]
    pub site_description: String,

    /// Seed for topic selection, for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print image compression statistics and exit
    #[arg(long)]
    pub compression_stats: bool,
}

//! Output generation: post files and the site-wide indexes.
//!
//! # Submodules
//!
//! - [`post`]: Writes `content.md`, `metadata.json` and `index.tsx` for a new post
//! - [`rss`]: Regenerates `rss.xml` from every published post
//! - [`sitemap`]: Regenerates `sitemap.xml` from static pages and published posts
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── .blog-history.json
//! ├── rss.xml
//! ├── sitemap.xml
//! ├── assets/images/
//! │   ├── .compression-log.json
//! │   └── 2025-05-06-hello-world.png
//! └── posts/
//!     └── 2025-05-06-hello-world/
//!         ├── content.md
//!         ├── index.tsx
//!         └── metadata.json
//! ```

pub mod post;
pub mod rss;
pub mod sitemap;

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tokio::fs;
use tracing::warn;

use crate::error::Result;
use crate::models::PostMetadata;

pub const CONTENT_FILE: &str = "content.md";
pub const METADATA_FILE: &str = "metadata.json";
pub const INDEX_FILE: &str = "index.tsx";

static POST_FOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}-").unwrap());

/// A post found on disk by the index regenerators.
#[derive(Debug, Clone)]
pub struct PublishedPost {
    pub folder: String,
    pub metadata: PostMetadata,
}

/// Whether a directory name under `posts/` is a dated post folder.
pub fn is_post_folder(name: &str) -> bool {
    POST_FOLDER.is_match(name)
}

/// Read the metadata of every dated post folder under `posts_dir`.
///
/// Folders whose metadata is missing or malformed are skipped with a warning.
/// Fails only if `posts_dir` itself cannot be listed. Order is by folder name.
pub async fn load_published_posts(posts_dir: &Path) -> Result<Vec<PublishedPost>> {
    let mut entries = fs::read_dir(posts_dir).await?;
    let mut posts = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let folder = entry.file_name().to_string_lossy().into_owned();
        if !is_post_folder(&folder) {
            continue;
        }

        let metadata_path = entry.path().join(METADATA_FILE);
        let loaded = match fs::read_to_string(&metadata_path).await {
            Ok(raw) => serde_json::from_str::<PostMetadata>(&raw).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match loaded {
            Ok(metadata) => posts.push(PublishedPost { folder, metadata }),
            Err(error) => warn!(%folder, %error, "Failed to load post metadata, skipping"),
        }
    }

    posts.sort_by(|a, b| a.folder.cmp(&b.folder));
    Ok(posts)
}

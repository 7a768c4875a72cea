//! Post folder assembly.
//!
//! Every post lives in `posts/<YYYY-MM-DD>-<slug>/` and consists of:
//!
//! - `content.md`: `# <title>` followed by the draft
//! - `metadata.json`: pretty-printed [`PostMetadata`]
//! - `index.tsx`: a page stub for the site that renders the two files above

use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

use super::{CONTENT_FILE, INDEX_FILE, METADATA_FILE};
use crate::error::Result;
use crate::models::{PostMetadata, Topic};
use crate::utils::{extract_keywords, reading_time_minutes};

/// Folder name for a post: the date followed by the title slug.
pub fn folder_name(date: &str, slug: &str) -> String {
    format!("{date}-{slug}")
}

/// Site-relative path of a post's hero image.
pub fn image_url(folder: &str) -> String {
    format!("/assets/images/{folder}.png")
}

/// Assemble the metadata for a freshly drafted post.
///
/// An empty topic description is replaced with a generic one. Keywords come
/// from the title together with the draft.
pub fn build_metadata(topic: &Topic, draft: &str, date: &str, folder: &str) -> PostMetadata {
    let description = if topic.description.trim().is_empty() {
        format!(
            "Exploring {} and its implications for the tech industry.",
            topic.title
        )
    } else {
        topic.description.clone()
    };

    PostMetadata {
        title: topic.title.clone(),
        description,
        date: date.to_string(),
        reading_time: format!("{} min read", reading_time_minutes(draft)),
        image: image_url(folder),
        keywords: extract_keywords(&format!("{} {}", topic.title, draft)),
        slug: folder.to_string(),
    }
}

pub fn render_content(title: &str, draft: &str) -> String {
    format!("# {title}\n\n{draft}")
}

/// Page component that reads the post's markdown and metadata at build time.
pub fn render_index_tsx(folder: &str) -> String {
    const TEMPLATE: &str = r#"import fs from 'fs';
import path from 'path';
import { marked } from 'marked';
import { GetStaticProps } from 'next';

export default function BlogPost({ content, metadata }) {
  return (
    <div className="max-w-4xl mx-auto px-4 py-8">
      <img
        src={metadata.image}
        alt={metadata.title}
        className="w-full h-64 object-cover rounded-lg mb-8"
      />
      <h1 className="text-4xl font-bold mb-4">{metadata.title}</h1>
      <p className="text-gray-600 mb-6">{metadata.description}</p>
      <div className="flex gap-4 text-sm text-gray-500 mb-8">
        <span>{metadata.date}</span>
        <span>{metadata.readingTime}</span>
      </div>
      <div
        className="prose max-w-none"
        dangerouslySetInnerHTML={{ __html: content }}
      />
    </div>
  );
}

export const getStaticProps: GetStaticProps = async () => {
  const contentPath = path.join(process.cwd(), 'posts', '__FOLDER__', 'content.md');
  const metadataPath = path.join(process.cwd(), 'posts', '__FOLDER__', 'metadata.json');

  const contentFile = fs.readFileSync(contentPath, 'utf-8');
  const metadataFile = fs.readFileSync(metadataPath, 'utf-8');

  const content = marked(contentFile);
  const metadata = JSON.parse(metadataFile);

  return {
    props: {
      content,
      metadata,
    },
  };
};
"#;
    TEMPLATE.replace("__FOLDER__", folder)
}

/// Write the three post files into `post_dir`, creating it if needed.
#[instrument(level = "info", skip_all, fields(post_dir = %post_dir.display()))]
pub async fn write_post_files(post_dir: &Path, metadata: &PostMetadata, draft: &str) -> Result<()> {
    fs::create_dir_all(post_dir).await?;

    fs::write(
        post_dir.join(METADATA_FILE),
        serde_json::to_string_pretty(metadata)?,
    )
    .await?;
    fs::write(
        post_dir.join(CONTENT_FILE),
        render_content(&metadata.title, draft),
    )
    .await?;
    fs::write(post_dir.join(INDEX_FILE), render_index_tsx(&metadata.slug)).await?;

    info!(slug = %metadata.slug, "Wrote post files");
    Ok(())
}

//! RSS 2.0 feed regeneration.
//!
//! The feed is rebuilt from scratch after every post: one item per published
//! post, newest first, with the markdown body (minus its title heading) in
//! `content:encoded`.

use ::rss::extension::atom::{AtomExtension, Link};
use ::rss::{Channel, ChannelBuilder, EnclosureBuilder, GuidBuilder, Item, ItemBuilder};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

use super::{CONTENT_FILE, PublishedPost, load_published_posts};
use crate::config::SiteConfig;
use crate::error::Result;

pub const RSS_FILE: &str = "rss.xml";

const CONTENT_NAMESPACE: &str = "http://purl.org/rss/1.0/modules/content/";

static TITLE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^# .*\n\n").unwrap());

/// Drop the leading `# title` heading that `content.md` starts with.
pub fn strip_title_heading(markdown: &str) -> String {
    TITLE_HEADING.replace(markdown, "").into_owned()
}

/// `YYYY-MM-DD` as an RFC 2822 timestamp at midnight UTC.
fn pub_date(date: &str) -> Option<String> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some(day.and_hms_opt(0, 0, 0)?.and_utc().to_rfc2822())
}

fn post_item(post: &PublishedPost, content: &str, site: &SiteConfig) -> Item {
    let base = site.base_url();
    let link = format!("{base}/blog/{}", post.folder);
    let metadata = &post.metadata;

    let enclosure = (!metadata.image.is_empty()).then(|| {
        EnclosureBuilder::default()
            .url(format!("{base}{}", metadata.image))
            .length("0".to_string())
            .mime_type("image/png".to_string())
            .build()
    });

    ItemBuilder::default()
        .title(Some(metadata.title.clone()))
        .link(Some(link.clone()))
        .guid(Some(GuidBuilder::default().value(link).permalink(true).build()))
        .description(Some(metadata.description.clone()))
        .content(Some(strip_title_heading(content)))
        .pub_date(pub_date(&metadata.date))
        .enclosure(enclosure)
        .build()
}

/// Build the feed for every post under `output_dir/posts`.
///
/// Posts whose `content.md` cannot be read are left out.
#[instrument(level = "info", skip(site, now), fields(output_dir = %output_dir.display()))]
pub async fn generate_rss(
    output_dir: &Path,
    site: &SiteConfig,
    now: DateTime<Utc>,
) -> Result<Channel> {
    let posts_dir = output_dir.join("posts");
    let mut posts = load_published_posts(&posts_dir).await?;
    posts.sort_by(|a, b| {
        b.metadata
            .date
            .cmp(&a.metadata.date)
            .then_with(|| b.folder.cmp(&a.folder))
    });

    let mut items = Vec::with_capacity(posts.len());
    for post in &posts {
        match fs::read_to_string(posts_dir.join(&post.folder).join(CONTENT_FILE)).await {
            Ok(content) => items.push(post_item(post, &content, site)),
            Err(e) => {
                warn!(folder = %post.folder, error = %e, "Failed to load post content, skipping")
            }
        }
    }

    let base = site.base_url();
    let mut self_link = Link::default();
    self_link.set_href(format!("{base}/{RSS_FILE}"));
    self_link.set_rel("self");
    self_link.set_mime_type(Some("application/rss+xml".to_string()));

    let namespaces: BTreeMap<String, String> =
        [("content".to_string(), CONTENT_NAMESPACE.to_string())].into();

    Ok(ChannelBuilder::default()
        .title(site.title.clone())
        .link(base.to_string())
        .description(site.description.clone())
        .language(Some("en".to_string()))
        .copyright(Some(format!("© {} {}", now.year(), site.title)))
        .last_build_date(Some(now.to_rfc2822()))
        .generator(Some(concat!("auto-tech-blog ", env!("CARGO_PKG_VERSION")).to_string()))
        .namespaces(namespaces)
        .atom_ext(Some(AtomExtension {
            links: vec![self_link],
        }))
        .items(items)
        .build())
}

/// Regenerate `output_dir/rss.xml`.
pub async fn save_rss(output_dir: &Path, site: &SiteConfig) -> Result<PathBuf> {
    let channel = generate_rss(output_dir, site, Utc::now()).await?;
    let path = output_dir.join(RSS_FILE);
    fs::write(&path, channel.to_string()).await?;
    info!(path = %path.display(), items = channel.items().len(), "RSS feed generated");
    Ok(path)
}

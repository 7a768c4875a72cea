//! XML sitemap regeneration.
//!
//! Entries, by priority:
//!
//! | Location | changefreq | priority | lastmod |
//! |----------|------------|----------|---------|
//! | `/` | daily | 1.0 | today |
//! | `/blog` | daily | 0.9 | today |
//! | other static pages | monthly | 0.8 | today |
//! | `/blog/<folder>` | weekly | 0.7 | post date |
//!
//! Entries are ordered by priority, then by lastmod, both descending.

use chrono::Utc;
use itertools::Itertools;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

use super::load_published_posts;
use crate::config::SiteConfig;
use crate::error::Result;

pub const SITEMAP_FILE: &str = "sitemap.xml";

const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: String,
    pub changefreq: &'static str,
    /// Tenths, so `10` is `1.0`.
    pub priority: u8,
}

impl SitemapEntry {
    fn priority_label(&self) -> String {
        format!("{}.{}", self.priority / 10, self.priority % 10)
    }
}

/// Collect every sitemap entry for the site, sorted.
///
/// An unreadable posts directory leaves only the static entries.
#[instrument(level = "info", skip(site))]
pub async fn sitemap_entries(
    output_dir: &Path,
    site: &SiteConfig,
    today: &str,
) -> Vec<SitemapEntry> {
    let base = site.base_url();
    let mut entries: Vec<SitemapEntry> = site
        .static_pages
        .iter()
        .map(|page| {
            let is_home = page == "/";
            SitemapEntry {
                loc: format!("{base}{page}"),
                lastmod: today.to_string(),
                changefreq: if is_home { "daily" } else { "monthly" },
                priority: if is_home { 10 } else { 8 },
            }
        })
        .collect();

    entries.push(SitemapEntry {
        loc: format!("{base}/blog"),
        lastmod: today.to_string(),
        changefreq: "daily",
        priority: 9,
    });

    match load_published_posts(&output_dir.join("posts")).await {
        Ok(posts) => entries.extend(posts.into_iter().map(|post| SitemapEntry {
            loc: format!("{base}/blog/{}", post.folder),
            lastmod: post.metadata.date,
            changefreq: "weekly",
            priority: 7,
        })),
        Err(e) => {
            warn!(error = %e, "Failed to read posts directory, sitemap lists static pages only")
        }
    }

    entries
        .into_iter()
        .sorted_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.lastmod.cmp(&a.lastmod))
        })
        .collect()
}

fn write_text_element<W: Write>(w: &mut Writer<W>, name: &str, text: &str) -> std::io::Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Serialize entries as a `urlset` document.
pub fn render_sitemap(entries: &[SitemapEntry]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut urlset = BytesStart::new("urlset");
    urlset.push_attribute(("xmlns", SITEMAP_NAMESPACE));
    writer.write_event(Event::Start(urlset))?;

    for entry in entries {
        writer.write_event(Event::Start(BytesStart::new("url")))?;
        write_text_element(&mut writer, "loc", &entry.loc)?;
        write_text_element(&mut writer, "lastmod", &entry.lastmod)?;
        write_text_element(&mut writer, "changefreq", entry.changefreq)?;
        write_text_element(&mut writer, "priority", &entry.priority_label())?;
        writer.write_event(Event::End(BytesEnd::new("url")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("urlset")))?;
    String::from_utf8(writer.into_inner())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
}

/// Build the sitemap document for `output_dir`.
pub async fn generate_sitemap(output_dir: &Path, site: &SiteConfig, today: &str) -> Result<String> {
    render_sitemap(&sitemap_entries(output_dir, site, today).await)
}

/// Regenerate `output_dir/sitemap.xml`.
pub async fn save_sitemap(output_dir: &Path, site: &SiteConfig) -> Result<PathBuf> {
    let today = Utc::now().format("%Y-%m-%d").to_string();
    let xml = generate_sitemap(output_dir, site, &today).await?;
    let path = output_dir.join(SITEMAP_FILE);
    fs::write(&path, xml).await?;
    info!(path = %path.display(), "Sitemap generated");
    Ok(path)
}

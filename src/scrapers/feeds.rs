//! Curated RSS feed reader.
//!
//! One feed from the configured pool is read per run. Items are kept when their
//! title or teaser mentions a technology keyword, up to [`MAX_FEED_STORIES`].

use reqwest::Client;
use rss::Channel;
use tracing::{debug, instrument};

use super::{is_tech_related, strip_html};
use crate::error::{Outcome, Result};
use crate::models::StoryCandidate;

pub const MAX_FEED_STORIES: usize = 5;

pub const SOURCE_TAG: &str = "RSS";

/// Read `feed_url` and return its technology stories.
///
/// Network or parse failures degrade to an empty result.
#[instrument(level = "info", skip(client))]
pub async fn fetch_stories(client: &Client, feed_url: &str) -> Outcome<Vec<StoryCandidate>> {
    Outcome::from_result(read_feed(client, feed_url).await)
}

async fn read_feed(client: &Client, feed_url: &str) -> Result<Vec<StoryCandidate>> {
    let body = client
        .get(feed_url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    let channel = Channel::read_from(&body[..])?;

    let stories = tech_stories(&channel);
    debug!(total = channel.items().len(), kept = stories.len(), "Parsed feed");
    Ok(stories)
}

/// Filter a parsed channel down to tech-related stories that carry a link.
pub fn tech_stories(channel: &Channel) -> Vec<StoryCandidate> {
    channel
        .items()
        .iter()
        .filter_map(|item| {
            let title = item.title()?.trim();
            let link = item.link()?.trim();
            let snippet = item.description().map(strip_html).unwrap_or_default();
            Some((title, link, snippet))
        })
        .filter(|(title, _, snippet)| is_tech_related(&format!("{title} {snippet}")))
        .take(MAX_FEED_STORIES)
        .map(|(title, link, snippet)| StoryCandidate {
            title: title.to_string(),
            description: snippet,
            url: link.to_string(),
            source: SOURCE_TAG.to_string(),
        })
        .collect()
}

//! Guardian Open Platform technology search.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::strip_html;
use crate::error::{Outcome, Result};
use crate::models::StoryCandidate;

pub const PAGE_SIZE: usize = 10;

pub const SOURCE_TAG: &str = "Guardian";

#[derive(Deserialize, Debug)]
struct SearchEnvelope {
    response: Option<SearchResponse>,
}

#[derive(Deserialize, Debug)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    web_title: String,
    web_url: String,
    fields: Option<SearchFields>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SearchFields {
    trail_text: Option<String>,
}

/// Latest stories from the Guardian technology section.
///
/// Without an API key the provider is disabled and returns nothing.
#[instrument(level = "info", skip_all)]
pub async fn fetch_stories(
    client: &Client,
    base_url: &str,
    api_key: Option<&str>,
) -> Outcome<Vec<StoryCandidate>> {
    let Some(api_key) = api_key else {
        debug!("GUARDIAN_KEY not set, skipping Guardian");
        return Outcome::Success(Vec::new());
    };
    Outcome::from_result(search_technology(client, base_url.trim_end_matches('/'), api_key).await)
}

async fn search_technology(
    client: &Client,
    base_url: &str,
    api_key: &str,
) -> Result<Vec<StoryCandidate>> {
    let page_size = PAGE_SIZE.to_string();
    let envelope: SearchEnvelope = client
        .get(format!("{base_url}/search"))
        .query(&[
            ("section", "technology"),
            ("page-size", page_size.as_str()),
            ("show-fields", "trailText"),
            ("api-key", api_key),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let stories: Vec<StoryCandidate> = envelope
        .response
        .map(|r| r.results)
        .unwrap_or_default()
        .into_iter()
        .take(PAGE_SIZE)
        .map(|result| StoryCandidate {
            title: result.web_title,
            description: result
                .fields
                .and_then(|f| f.trail_text)
                .map(|t| strip_html(&t))
                .unwrap_or_default(),
            url: result.web_url,
            source: SOURCE_TAG.to_string(),
        })
        .collect();

    debug!(count = stories.len(), "Collected Guardian stories");
    Ok(stories)
}

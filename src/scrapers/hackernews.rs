//! Hacker News top-story walker.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::is_tech_related;
use crate::error::{Outcome, Result};
use crate::models::StoryCandidate;

/// Ranked IDs inspected per run.
pub const MAX_RANKED_IDS: usize = 20;

pub const MAX_HN_STORIES: usize = 5;

pub const SOURCE_TAG: &str = "Hacker News";

#[derive(Deserialize, Debug)]
struct HnItem {
    title: Option<String>,
    url: Option<String>,
}

/// Walk the top stories in rank order, keeping items that link out and have a
/// tech-related title.
///
/// A failure on the ranking degrades the whole provider; a failure on a single
/// item only skips that item.
#[instrument(level = "info", skip(client))]
pub async fn fetch_stories(client: &Client, base_url: &str) -> Outcome<Vec<StoryCandidate>> {
    Outcome::from_result(walk_top_stories(client, base_url.trim_end_matches('/')).await)
}

async fn walk_top_stories(client: &Client, base_url: &str) -> Result<Vec<StoryCandidate>> {
    let top_ids: Vec<u64> = client
        .get(format!("{base_url}/topstories.json"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let mut stories = Vec::new();
    for id in top_ids.iter().take(MAX_RANKED_IDS) {
        let item = match fetch_item(client, base_url, *id).await {
            Ok(item) => item,
            Err(e) => {
                debug!(id, error = %e, "Skipping HN item");
                continue;
            }
        };

        if let (Some(title), Some(url)) = (item.title, item.url) {
            if is_tech_related(&title) {
                stories.push(StoryCandidate {
                    title,
                    description: String::new(),
                    url,
                    source: SOURCE_TAG.to_string(),
                });
            }
        }

        if stories.len() >= MAX_HN_STORIES {
            break;
        }
    }

    debug!(count = stories.len(), "Collected HN stories");
    Ok(stories)
}

async fn fetch_item(client: &Client, base_url: &str, id: u64) -> Result<HnItem> {
    Ok(client
        .get(format!("{base_url}/item/{id}.json"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_item(server: &MockServer, id: u64, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/item/{id}.json")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_walks_ranked_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/topstories.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json([1, 2, 3, 4]))
            .mount(&server)
            .await;

        // Ask HN post: no external link.
        mount_item(&server, 1, serde_json::json!({"title": "Ask HN: best AI tools?"})).await;
        mount_item(
            &server,
            2,
            serde_json::json!({
                "title": "Show HN: a Rust API gateway",
                "url": "https://gw.example"
            }),
        )
        .await;
        // Item 3 is not mounted and 404s.
        mount_item(
            &server,
            4,
            serde_json::json!({"title": "Sourdough hydration", "url": "https://bread.example"}),
        )
        .await;

        let stories = fetch_stories(&Client::new(), &server.uri())
            .await
            .success()
            .unwrap();
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].url, "https://gw.example");
        assert_eq!(stories[0].source, SOURCE_TAG);
        assert!(stories[0].description.is_empty());
    }

    #[tokio::test]
    async fn test_stops_at_cap() {
        let server = MockServer::start().await;
        let ids: Vec<u64> = (1..=30).collect();
        Mock::given(method("GET"))
            .and(path("/topstories.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&ids))
            .mount(&server)
            .await;
        for id in &ids {
            mount_item(
                &server,
                *id,
                serde_json::json!({
                    "title": format!("Startup {id} raises"),
                    "url": format!("https://s.example/{id}")
                }),
            )
            .await;
        }

        let stories = fetch_stories(&Client::new(), &server.uri())
            .await
            .success()
            .unwrap();
        assert_eq!(stories.len(), MAX_HN_STORIES);
        assert_eq!(stories[4].url, "https://s.example/5");
    }

    #[tokio::test]
    async fn test_reads_at_most_twenty_ranked_ids() {
        let server = MockServer::start().await;
        let ids: Vec<u64> = (1..=30).collect();
        Mock::given(method("GET"))
            .and(path("/topstories.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&ids))
            .mount(&server)
            .await;
        for id in &ids {
            let title = if *id <= 20 {
                format!("Sourdough hydration {id}")
            } else {
                format!("Rust API gateway {id}")
            };
            mount_item(
                &server,
                *id,
                serde_json::json!({"title": title, "url": format!("https://s.example/{id}")}),
            )
            .await;
        }

        let stories = fetch_stories(&Client::new(), &server.uri())
            .await
            .success()
            .unwrap();
        assert!(stories.is_empty());

        let item_requests = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path().starts_with("/item/"))
            .count();
        assert_eq!(item_requests, MAX_RANKED_IDS);
    }

    #[tokio::test]
    async fn test_ranking_failure_degrades() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(!fetch_stories(&Client::new(), &server.uri()).await.is_success());
    }
}

//! News sources and topic acquisition.
//!
//! Three independent providers report [`StoryCandidate`]s; the
//! [`TopicAggregator`] merges them and turns the best one into a [`Topic`].
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Curated feeds | [`feeds`] | RSS | One feed per run, picked at random from the pool |
//! | Hacker News | [`hackernews`] | Firebase API | First 20 ranked stories |
//! | The Guardian | [`guardian`] | Content API | Requires `GUARDIAN_KEY` |
//!
//! # Common Patterns
//!
//! Each provider module exports `fetch_stories(..) -> Outcome<Vec<StoryCandidate>>`.
//! Failures never propagate: a provider that cannot be reached contributes
//! nothing and the run goes on. Article text for the chosen story comes from
//! [`extract`].

pub mod extract;
pub mod feeds;
pub mod guardian;
pub mod hackernews;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::config::{SourceSettings, USER_AGENT};
use crate::error::{Outcome, Result};
use crate::models::{StoryCandidate, Topic};
use crate::utils::truncate_chars;

/// Lowercase substrings that mark a story as technology news.
pub const TECH_KEYWORDS: &[&str] = &[
    "ai", "artificial intelligence", "machine learning", "deep learning",
    "blockchain", "cryptocurrency", "bitcoin", "ethereum", "web3",
    "startup", "funding", "venture capital", "ipo",
    "software", "programming", "developer", "api",
    "cloud", "aws", "azure", "google cloud",
    "mobile", "app", "ios", "android",
    "data", "analytics", "big data",
    "cybersecurity", "privacy", "security",
    "iot", "internet of things", "smart",
    "robotics", "automation", "tech",
];

/// Candidates tried for extraction before settling for one without context.
pub const EXTRACTION_ATTEMPTS: usize = 3;

/// Extracted text must be longer than this to ground a draft.
pub const MIN_CONTENT_CHARS: usize = 500;

/// Extracted text is cut to this length.
pub const MAX_CONTENT_CHARS: usize = 4000;

/// Whether `text` mentions any of [`TECH_KEYWORDS`]. Plain substring match.
pub fn is_tech_related(text: &str) -> bool {
    let lower = text.to_lowercase();
    TECH_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// Reduce an HTML fragment to its text with whitespace collapsed.
pub fn strip_html(fragment: &str) -> String {
    let document = Html::parse_fragment(fragment);
    let text: String = document.root_element().text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Article text long enough to ground a draft, cut to [`MAX_CONTENT_CHARS`].
fn usable_context(text: &str) -> Option<String> {
    (text.chars().count() > MIN_CONTENT_CHARS).then(|| truncate_chars(text, MAX_CONTENT_CHARS))
}

/// HTTP client for the providers and the extractor: fixed timeout, descriptive user agent.
pub fn http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}

/// Fans out to every provider and picks the run's topic.
pub struct TopicAggregator {
    client: Client,
    sources: SourceSettings,
    rng: StdRng,
}

impl TopicAggregator {
    /// `seed` makes feed choice and candidate order reproducible; `None` seeds from the OS.
    pub fn new(client: Client, sources: SourceSettings, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            client,
            sources,
            rng,
        }
    }

    /// Acquire a topic from live sources.
    ///
    /// Returns `None` only when every provider came back empty. Otherwise the
    /// first of the shuffled candidates whose article yields more than
    /// [`MIN_CONTENT_CHARS`] wins; failing that, the first candidate is used
    /// without context.
    #[instrument(level = "info", skip_all)]
    pub async fn acquire(&mut self) -> Option<Topic> {
        let mut candidates = self.gather().await;
        if candidates.is_empty() {
            info!("No tech stories found from any source");
            return None;
        }
        candidates.shuffle(&mut self.rng);

        for story in candidates.iter().take(EXTRACTION_ATTEMPTS) {
            info!(title = %story.title, source = %story.source, "Extracting article content");
            let Some(text) = extract::extract_article(&self.client, &story.url)
                .await
                .success()
            else {
                continue;
            };
            if let Some(full_content) = usable_context(&text) {
                info!(source = %story.source, "Found story with usable content");
                return Some(Topic {
                    full_content,
                    ..Topic::from(story.clone())
                });
            }
        }

        let fallback = candidates.swap_remove(0);
        warn!(
            title = %fallback.title,
            "No article yielded enough text, using story without context"
        );
        Some(Topic::from(fallback))
    }

    /// Query all providers concurrently and concatenate their stories.
    async fn gather(&mut self) -> Vec<StoryCandidate> {
        let feed = self.sources.feeds.choose(&mut self.rng).cloned();
        let client = &self.client;
        let sources = &self.sources;

        let (guardian, hacker_news, feed_stories) = tokio::join!(
            guardian::fetch_stories(
                client,
                &sources.guardian_base,
                sources.guardian_key.as_deref(),
            ),
            hackernews::fetch_stories(client, &sources.hacker_news_base),
            async {
                match &feed {
                    Some(url) => feeds::fetch_stories(client, url).await,
                    None => Outcome::Success(Vec::new()),
                }
            },
        );

        [
            (guardian::SOURCE_TAG, guardian),
            (hackernews::SOURCE_TAG, hacker_news),
            (feeds::SOURCE_TAG, feed_stories),
        ]
        .into_iter()
        .flat_map(|(source, outcome)| match outcome {
            Outcome::Success(stories) => {
                info!(source, count = stories.len(), "Provider returned stories");
                stories
            }
            Outcome::Degraded(reason) => {
                warn!(source, %reason, "Provider failed, continuing without it");
                Vec::new()
            }
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn long_article() -> String {
        let paragraph = "<p>Researchers unveiled a new accelerator, which doubles throughput, \
                         halves power draw, and keeps the software stack unchanged for users.</p>";
        format!(
            "<html><head><title>Accelerator</title></head><body><article>{}</article></body></html>",
            paragraph.repeat(60)
        )
    }

    /// Sources wired to `server` with only Hacker News populated by default.
    fn sources_for(server: &MockServer) -> SourceSettings {
        SourceSettings {
            feeds: vec![format!("{}/feed.xml", server.uri())],
            hacker_news_base: server.uri(),
            guardian_base: server.uri(),
            guardian_key: None,
            timeout: Duration::from_secs(5),
        }
    }

    async fn mount_hn(server: &MockServer, stories: &[(u64, &str, String)]) {
        let ids: Vec<u64> = stories.iter().map(|(id, _, _)| *id).collect();
        Mock::given(method("GET"))
            .and(path("/topstories.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ids))
            .mount(server)
            .await;
        for (id, title, url) in stories {
            Mock::given(method("GET"))
                .and(path(format!("/item/{id}.json")))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(serde_json::json!({"title": title, "url": url})),
                )
                .mount(server)
                .await;
        }
    }

    #[test]
    fn test_is_tech_related() {
        assert!(is_tech_related("OpenAI ships a new model"));
        assert!(is_tech_related("BIG DATA is back"));
        assert!(is_tech_related("Why every startup needs a CFO"));
        assert!(!is_tech_related("Gardening tips for June"));
        assert!(!is_tech_related(""));
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<p>Hello <b>world</b></p>\n<p>again</p>"), "Hello world again");
        assert_eq!(strip_html("plain   text"), "plain text");
        assert_eq!(strip_html(""), "");
    }

    #[test]
    fn test_context_must_exceed_minimum() {
        assert_eq!(usable_context(&"x".repeat(MIN_CONTENT_CHARS)), None);
        assert_eq!(
            usable_context(&"x".repeat(MIN_CONTENT_CHARS + 1)).map(|t| t.chars().count()),
            Some(MIN_CONTENT_CHARS + 1)
        );
        assert_eq!(
            usable_context(&"é".repeat(MAX_CONTENT_CHARS + 10)).map(|t| t.chars().count()),
            Some(MAX_CONTENT_CHARS)
        );
    }

    #[tokio::test]
    async fn test_all_providers_empty_yields_none() {
        let server = MockServer::start().await;
        mount_hn(&server, &[]).await;
        // Feed path is unmounted and 404s.

        let mut aggregator = TopicAggregator::new(Client::new(), sources_for(&server), Some(1));
        assert!(aggregator.acquire().await.is_none());
    }

    #[tokio::test]
    async fn test_short_articles_fall_back_to_bare_story() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/short"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body><p>Tiny.</p></body></html>"),
            )
            .mount(&server)
            .await;
        mount_hn(
            &server,
            &[(1, "Cloud outage explained", format!("{}/short", server.uri()))],
        )
        .await;

        let mut aggregator = TopicAggregator::new(Client::new(), sources_for(&server), Some(7));
        let topic = aggregator.acquire().await.unwrap();
        assert_eq!(topic.title, "Cloud outage explained");
        assert_eq!(topic.source.as_deref(), Some(hackernews::SOURCE_TAG));
        assert!(!topic.has_context());
    }

    #[tokio::test]
    async fn test_long_article_becomes_truncated_context() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/long"))
            .respond_with(ResponseTemplate::new(200).set_body_string(long_article()))
            .mount(&server)
            .await;
        mount_hn(
            &server,
            &[(1, "New AI accelerator", format!("{}/long", server.uri()))],
        )
        .await;

        let mut aggregator = TopicAggregator::new(Client::new(), sources_for(&server), Some(7));
        let topic = aggregator.acquire().await.unwrap();
        assert!(topic.has_context());
        assert_eq!(topic.full_content.chars().count(), MAX_CONTENT_CHARS);
        assert!(topic.full_content.contains("accelerator"));
    }

    #[tokio::test]
    async fn test_same_seed_picks_same_story() {
        let server = MockServer::start().await;
        let titles = [
            "Tech story A",
            "Tech story B",
            "Tech story C",
            "Tech story D",
            "Tech story E",
        ];
        // Article URLs are unmounted, so every extraction degrades.
        let stories: Vec<(u64, &str, String)> = titles
            .iter()
            .zip(1u64..)
            .map(|(title, id)| (id, *title, format!("{}/missing/{id}", server.uri())))
            .collect();
        mount_hn(&server, &stories).await;

        let mut picks = Vec::new();
        for _ in 0..2 {
            let mut aggregator =
                TopicAggregator::new(Client::new(), sources_for(&server), Some(99));
            picks.push(aggregator.acquire().await.unwrap().title);
        }
        assert_eq!(picks[0], picks[1]);
        assert!(titles.contains(&picks[0].as_str()));
    }

    #[tokio::test]
    async fn test_only_three_candidates_are_extracted() {
        let mut untried_long_article = false;

        for seed in 0..24 {
            let server = MockServer::start().await;
            for name in ["a", "b", "c"] {
                Mock::given(method("GET"))
                    .and(path(format!("/article/{name}")))
                    .respond_with(
                        ResponseTemplate::new(200)
                            .set_body_string("<html><body><p>Tiny.</p></body></html>"),
                    )
                    .mount(&server)
                    .await;
            }
            Mock::given(method("GET"))
                .and(path("/article/long"))
                .respond_with(ResponseTemplate::new(200).set_body_string(long_article()))
                .mount(&server)
                .await;
            let stories: Vec<(u64, &str, String)> = ["a", "b", "c", "long"]
                .into_iter()
                .zip(1u64..)
                .map(|(name, id)| (id, "Tech story", format!("{}/article/{name}", server.uri())))
                .collect();
            mount_hn(&server, &stories).await;

            let mut aggregator =
                TopicAggregator::new(Client::new(), sources_for(&server), Some(seed));
            let topic = aggregator.acquire().await.unwrap();

            let requests = server.received_requests().await.unwrap();
            let article_paths: Vec<String> = requests
                .iter()
                .map(|r| r.url.path().to_string())
                .filter(|p| p.starts_with("/article/"))
                .collect();
            let long_fetched = article_paths.iter().any(|p| p == "/article/long");

            assert!(article_paths.len() <= EXTRACTION_ATTEMPTS);
            assert_eq!(topic.has_context(), long_fetched);
            if !long_fetched {
                assert_eq!(article_paths.len(), EXTRACTION_ATTEMPTS);
                untried_long_article = true;
            }
        }

        assert!(untried_long_article, "no seed shuffled the long article last");
    }
}

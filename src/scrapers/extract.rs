//! Readable-text extraction for article pages.

use reqwest::Client;
use std::io::Cursor;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{Error, Outcome, Result};

/// Fetch `url` and isolate the main article text.
///
/// Non-2xx responses, unparseable pages and timeouts all degrade.
#[instrument(level = "info", skip(client))]
pub async fn extract_article(client: &Client, url: &str) -> Outcome<String> {
    let outcome = Outcome::from_result(fetch_and_extract(client, url).await);
    if let Outcome::Degraded(reason) = &outcome {
        debug!(%reason, "Article extraction failed");
    }
    outcome
}

async fn fetch_and_extract(client: &Client, url: &str) -> Result<String> {
    let parsed_url =
        Url::parse(url).map_err(|e| Error::Config(format!("invalid article URL {url}: {e}")))?;

    let html = client
        .get(parsed_url.clone())
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    readable_text(&html, &parsed_url)
}

/// Run readability over an HTML document.
pub fn readable_text(html: &str, url: &Url) -> Result<String> {
    let mut reader = Cursor::new(html.as_bytes());
    let product = readability::extractor::extract(&mut reader, url)
        .map_err(|e| Error::Model(format!("readability failed: {e:?}")))?;
    Ok(product.text.trim().to_string())
}

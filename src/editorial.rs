//! Model-backed editorial steps: topic synthesis, drafting and fact-checking.
//!
//! - [`synthesize_topic`] invents a topic when no news source produced one.
//!   Its transport failure is fatal; malformed output never is.
//! - [`draft_post`] writes the markdown body. Failure is fatal.
//! - [`fact_check`] validates a draft against the extracted article. It is
//!   skipped without context and fails open when the model is unreachable.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::api::GenerativeModel;
use crate::error::Result;
use crate::models::{FactCheckResult, Topic};
use crate::utils::{truncate_chars, truncate_for_log};

/// Prefix the drafting prompt asks the model to put on subjective statements.
/// The fact-checker ignores lines that start with it.
pub const OPINION_MARKER: &str = "My take:";

/// Maximum number of issues kept from a failed fact-check.
pub const MAX_FACT_CHECK_ISSUES: usize = 10;

/// Context and drafts are clipped to this many characters inside prompts.
const PROMPT_CONTEXT_CHARS: usize = 20_000;

/// Length of the title salvaged from unparseable topic output.
const FALLBACK_TITLE_CHARS: usize = 70;

const TOPIC_PROMPT: &str = "You are a technology trend spotter. Suggest a fresh, timely tech-topic \
for a short blog post.\nReturn JSON with exactly these keys: title, description. Title must be \
≤ 70 characters, description ≤ 200.";

static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```(?:json)?\s*(.*?)```").unwrap());
static TITLE_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)"title"\s*:\s*"([^"]+)""#).unwrap());
static DESCRIPTION_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)"description"\s*:\s*"([^"]+)""#).unwrap()
});

/// Ask the model for a fresh technology topic.
///
/// # Returns
///
/// A [`Topic`] with empty `full_content` and no source tag. Only a failed
/// request is an error.
#[instrument(level = "info", skip_all)]
pub async fn synthesize_topic<M: GenerativeModel>(model: &M) -> Result<Topic> {
    let response = model.generate_text(TOPIC_PROMPT, true).await?;
    let topic = parse_topic_response(&response);
    info!(title = %topic.title, "Synthesized topic");
    Ok(topic)
}

/// Turn a free-form model response into a topic.
///
/// Tries, in order: a fenced JSON block, the whole response as JSON, regex
/// extraction of `"title"`/`"description"`, and finally the first 70
/// characters of the response as the title.
pub fn parse_topic_response(text: &str) -> Topic {
    let candidate = JSON_FENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or_else(|| text.trim());

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(candidate) {
        let title = value.get("title").and_then(|v| v.as_str()).unwrap_or("");
        if !title.trim().is_empty() {
            let description = value
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("");
            return generated_topic(title, description);
        }
    }

    if let Some(title) = TITLE_FIELD.captures(text).and_then(|caps| caps.get(1)) {
        let description = DESCRIPTION_FIELD
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map_or("", |m| m.as_str());
        debug!("Topic response was not valid JSON, recovered fields by pattern");
        return generated_topic(title.as_str(), description);
    }

    warn!(
        response_preview = %truncate_for_log(text, 200),
        "Topic response had no recognizable fields, using raw text as title"
    );
    generated_topic(&truncate_chars(text.trim(), FALLBACK_TITLE_CHARS), "")
}

fn generated_topic(title: &str, description: &str) -> Topic {
    Topic {
        title: title.trim().to_string(),
        description: description.trim().to_string(),
        full_content: String::new(),
        source: None,
    }
}

/// Build the drafting prompt for `topic`.
///
/// With extracted context the model must stay within it and tag opinions;
/// without, it writes from the title and description alone.
pub fn draft_prompt(topic: &Topic) -> String {
    let base = if topic.has_context() {
        format!(
            "Write a 700 word blog post that summarizes and analyses the following article. \
             Use only facts from the context; do not invent details. Tag any opinions with \
             '{OPINION_MARKER}'.\n\n--- BEGIN CONTEXT ---\n{}\n--- END CONTEXT ---",
            truncate_chars(&topic.full_content, PROMPT_CONTEXT_CHARS)
        )
    } else {
        format!(
            "Write a 700 word blog post in markdown about \"{}\".\n\nContext: {}.",
            topic.title, topic.description
        )
    };

    format!(
        "{base}\n\nUse headings, sub-headings, lists and a friendly explanatory tone.\n\n\
         IMPORTANT: Do NOT include a top-level title heading (# {}). Begin directly with the \
         introduction paragraph or a sub-heading.",
        topic.title
    )
}

/// Draft the markdown body for `topic`. The body never carries the title heading.
#[instrument(
    level = "info",
    skip_all,
    fields(title = %topic.title, grounded = topic.has_context())
)]
pub async fn draft_post<M: GenerativeModel>(model: &M, topic: &Topic) -> Result<String> {
    let draft = model.generate_text(&draft_prompt(topic), true).await?;
    info!(chars = draft.chars().count(), "Draft generated");
    Ok(draft)
}

fn fact_check_prompt(draft: &str, context: &str) -> String {
    format!(
        "You are a strict fact checker. Given the ORIGINAL ARTICLE and a BLOG DRAFT, list any \
         statements that are presented as fact but are NOT supported by the article. IGNORE any \
         lines that begin with \"{OPINION_MARKER}\" (these are clearly-marked opinions). If every \
         factual statement is supported, reply ONLY with \"OK\".\n\n--- ORIGINAL ARTICLE ---\n{}\n\
         --- BLOG DRAFT ---\n{}",
        truncate_chars(context, PROMPT_CONTEXT_CHARS),
        truncate_chars(draft, PROMPT_CONTEXT_CHARS)
    )
}

/// Interpret the fact-checker's reply: `OK` passes, anything else is a list of
/// issues, one per non-empty line.
pub fn parse_fact_check_response(text: &str) -> FactCheckResult {
    let text = text.trim();
    if text.eq_ignore_ascii_case("ok") {
        return FactCheckResult::passed();
    }

    FactCheckResult {
        ok: false,
        issues: text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .take(MAX_FACT_CHECK_ISSUES)
            .map(str::to_string)
            .collect(),
    }
}

/// Check `draft` against the article it was written from.
///
/// Whitespace-only `context` passes without calling the model. A failed
/// request also passes, with a warning.
#[instrument(level = "info", skip_all)]
pub async fn fact_check<M: GenerativeModel>(
    model: &M,
    draft: &str,
    context: &str,
) -> FactCheckResult {
    if context.trim().is_empty() {
        debug!("No source context, skipping fact-check");
        return FactCheckResult::passed();
    }

    match model.generate_text(&fact_check_prompt(draft, context), true).await {
        Ok(response) => {
            let result = parse_fact_check_response(&response);
            if result.ok {
                info!("Fact-check passed");
            } else {
                warn!(issues = result.issues.len(), "Fact-check found unsupported claims");
            }
            result
        }
        Err(e) => {
            warn!(error = %e, "Fact-check request failed, assuming OK");
            FactCheckResult::passed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::Mutex;

    /// Replies with a fixed text (or error) and records every prompt.
    struct CannedModel {
        reply: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedModel {
        fn replying(text: &str) -> Self {
            CannedModel {
                reply: Some(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            CannedModel {
                reply: None,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl GenerativeModel for CannedModel {
        async fn generate_text(&self, prompt: &str, _grounded: bool) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .ok_or_else(|| Error::Model("unavailable".into()))
        }

        async fn generate_image(&self, _prompt: &str) -> Result<Vec<u8>> {
            Err(Error::Model("no images".into()))
        }
    }

    #[test]
    fn test_parse_fenced_json() {
        let text =
            "Sure!\n```json\n{\"title\": \"Edge AI\", \"description\": \"Models on devices\"}\n```";
        let topic = parse_topic_response(text);
        assert_eq!(topic.title, "Edge AI");
        assert_eq!(topic.description, "Models on devices");
        assert!(topic.source.is_none());
    }

    #[test]
    fn test_parse_raw_json_without_description() {
        let topic = parse_topic_response(r#"  {"title": "Quantum Networking"}  "#);
        assert_eq!(topic.title, "Quantum Networking");
        assert_eq!(topic.description, "");
    }

    #[test]
    fn test_parse_by_pattern() {
        let text = r#"Here you go: "title": "RISC-V Goes Mainstream", "description": "Open ISA wins" (hope that helps"#;
        let topic = parse_topic_response(text);
        assert_eq!(topic.title, "RISC-V Goes Mainstream");
        assert_eq!(topic.description, "Open ISA wins");
    }

    #[test]
    fn test_parse_falls_back_to_raw_text() {
        let text = "x".repeat(120);
        let topic = parse_topic_response(&text);
        assert_eq!(topic.title.chars().count(), 70);
        assert_eq!(topic.description, "");
    }

    #[test]
    fn test_json_with_empty_title_is_not_accepted() {
        let topic = parse_topic_response(r#"{"title": "", "description": "d"}"#);
        assert_eq!(topic.title, r#"{"title": "", "description": "d"}"#);
    }

    #[test]
    fn test_draft_prompt_modes() {
        let mut topic = Topic {
            title: "Rust in the Kernel".into(),
            description: "Drivers written in Rust".into(),
            ..Default::default()
        };

        let prompt = draft_prompt(&topic);
        assert!(prompt.contains("about \"Rust in the Kernel\""));
        assert!(prompt.contains("Context: Drivers written in Rust."));
        assert!(!prompt.contains(OPINION_MARKER));
        assert!(prompt.contains("Do NOT include a top-level title heading (# Rust in the Kernel)"));

        topic.full_content = "Linus merged the first Rust driver.".into();
        let prompt = draft_prompt(&topic);
        assert!(prompt.contains("--- BEGIN CONTEXT ---\nLinus merged the first Rust driver."));
        assert!(prompt.contains("'My take:'"));
        assert!(prompt.contains("Do NOT include a top-level title heading"));
    }

    #[test]
    fn test_parse_fact_check_ok_variants() {
        for reply in ["OK", "ok", "  Ok \n"] {
            assert!(parse_fact_check_response(reply).ok);
        }
    }

    #[test]
    fn test_parse_fact_check_issues_are_capped() {
        let reply = (1..=15)
            .map(|i| format!("- claim {i}"))
            .collect::<Vec<_>>()
            .join("\n\n");
        let result = parse_fact_check_response(&reply);
        assert!(!result.ok);
        assert_eq!(result.issues.len(), MAX_FACT_CHECK_ISSUES);
        assert_eq!(result.issues[0], "- claim 1");
        assert_eq!(result.issues[9], "- claim 10");
    }

    #[tokio::test]
    async fn test_fact_check_without_context_makes_no_call() {
        let model = CannedModel::replying("- everything is wrong");
        let result = fact_check(&model, "draft", "  \n ").await;
        assert!(result.ok);
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_fact_check_fails_open() {
        let model = CannedModel::failing();
        let result = fact_check(&model, "draft", "context").await;
        assert!(result.ok);
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_fact_check_reports_issues() {
        let model = CannedModel::replying("The article never mentions 2026.\nNo source for 40%.");
        let result = fact_check(&model, "draft", "context").await;
        assert!(!result.ok);
        assert_eq!(result.issues.len(), 2);

        let prompt = &model.prompts.lock().unwrap()[0];
        assert!(prompt.contains("--- ORIGINAL ARTICLE ---\ncontext"));
        assert!(prompt.contains("IGNORE any lines that begin with \"My take:\""));
    }

    #[tokio::test]
    async fn test_synthesize_topic_propagates_transport_failure() {
        let model = CannedModel::failing();
        assert!(synthesize_topic(&model).await.is_err());

        let model = CannedModel::replying(r#"{"title": "Chiplets", "description": "Why"}"#);
        let topic = synthesize_topic(&model).await.unwrap();
        assert_eq!(topic.title, "Chiplets");
    }

    #[tokio::test]
    async fn test_draft_post_returns_model_text() {
        let model = CannedModel::replying("## Intro\n\nBody");
        let topic = Topic {
            title: "T".into(),
            ..Default::default()
        };
        assert_eq!(draft_post(&model, &topic).await.unwrap(), "## Intro\n\nBody");
    }
}

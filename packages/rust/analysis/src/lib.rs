//! Content-analysis service client.
//!
//! One natural-language prompt in, model-generated text out. Call sites that
//! expect structured data use [`parse_json_reply`] and decide for themselves
//! what to do when the model does not comply.

mod openai;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use linkcatalog_shared::{LinkCatalogError, Result};

pub use openai::OpenAiAnalyzer;

/// A synchronous request/response language-model call.
#[async_trait]
pub trait ContentAnalyzer: Send + Sync {
    /// Send `prompt` as a single user message and return the reply text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Parse a model reply as a JSON value of type `T`.
///
/// Replies wrapped in a Markdown code fence (with or without a language tag)
/// are unwrapped first.
pub fn parse_json_reply<T: DeserializeOwned>(reply: &str) -> Result<T> {
    let body = strip_code_fence(reply);
    serde_json::from_str(body).map_err(|e| {
        LinkCatalogError::analysis_parse(format!(
            "{e} (got: {})",
            body.chars().take(200).collect::<String>()
        ))
    })
}

/// Remove a surrounding ```` ``` ```` fence, if any.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line.
    match rest.find('\n') {
        Some(newline) => rest[newline + 1..].trim(),
        None => strip_info_string(rest.trim()),
    }
}

/// One-line fences put the info string right before the value: `json{...}`.
fn strip_info_string(body: &str) -> &str {
    let value_start = body
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(body.len());
    match body[value_start..].trim_start() {
        value if value_start > 0 && (value.starts_with('{') || value.starts_with('[')) => value,
        _ => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct Reply {
        category: String,
    }

    #[test]
    fn parses_plain_json() {
        let reply: Reply = parse_json_reply(r#"{"category":"AI Tool"}"#).unwrap();
        assert_eq!(reply.category, "AI Tool");
    }

    #[test]
    fn parses_fenced_json() {
        let text = "```json\n{\"category\": \"AI News\"}\n```";
        let reply: Reply = parse_json_reply(text).unwrap();
        assert_eq!(reply.category, "AI News");

        let text = "```\n{\"category\": \"AI News\"}\n```";
        let reply: Reply = parse_json_reply(text).unwrap();
        assert_eq!(reply.category, "AI News");
    }

    #[test]
    fn parses_one_line_fence() {
        let reply: Reply = parse_json_reply(r#"```json{"category":"AI Tool"}```"#).unwrap();
        assert_eq!(reply.category, "AI Tool");

        let reply: Reply = parse_json_reply(r#"```JSON {"category":"AI Tool"} ```"#).unwrap();
        assert_eq!(reply.category, "AI Tool");

        let reply: Reply = parse_json_reply(r#"```{"category":"AI Tool"}```"#).unwrap();
        assert_eq!(reply.category, "AI Tool");
    }

    #[test]
    fn prose_is_a_parse_error() {
        let err = parse_json_reply::<Reply>("Sure! Here is the analysis you asked for.")
            .unwrap_err();
        assert!(matches!(err, LinkCatalogError::AnalysisParse { .. }));
    }

    #[test]
    fn unterminated_fence_is_left_alone() {
        assert_eq!(strip_code_fence("```json\n{}"), "```json\n{}");
    }
}

//! Social-post branch: the model infers the post from its URL alone.
//!
//! Platforms in this branch block scraping, so nothing is fetched. Whatever
//! the model returns, the caller always gets a usable record back.

use serde::Deserialize;
use tracing::{info, warn};

use linkcatalog_analysis::{ContentAnalyzer, parse_json_reply};
use linkcatalog_shared::{ExtractedContent, LinkCatalogError, Result, SocialPlatform};

/// Topic assigned when the model does not provide one.
const DEFAULT_CATEGORY: &str = "AI Research";

#[derive(Debug, Deserialize)]
struct SocialReply {
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

fn prompt(platform: &SocialPlatform, url: &str) -> String {
    format!(
        "Extract information from this {name} URL: {url}\n\
         \n\
         Please provide:\n\
         - Author username (without @)\n\
         - Post content\n\
         - Category (AI Research, AI Tools, AI News, etc.)\n\
         \n\
         Return as JSON with keys: author, content, category",
        name = platform.name,
    )
}

/// Describe a social post. Never fails: analysis or parse problems yield the placeholder.
pub(crate) async fn extract(
    analyzer: Option<&dyn ContentAnalyzer>,
    platform: &SocialPlatform,
    url: &str,
) -> ExtractedContent {
    let Some(analyzer) = analyzer else {
        info!(platform = %platform.name, "analysis disabled, using placeholder");
        return placeholder(platform);
    };

    let parsed = match analyzer.complete(&prompt(platform, url)).await {
        Ok(reply) => interpret(platform, &reply),
        Err(e) => Err(e),
    };

    parsed.unwrap_or_else(|e| {
        warn!(platform = %platform.name, error = %e, "social post analysis failed, using placeholder");
        placeholder(platform)
    })
}

/// Turn the model reply into content, or explain why it is unusable.
fn interpret(platform: &SocialPlatform, reply: &str) -> Result<ExtractedContent> {
    let reply: SocialReply = parse_json_reply(reply)?;

    let author = reply
        .author
        .as_deref()
        .map(|a| a.trim().trim_start_matches('@').trim())
        .filter(|a| !a.is_empty())
        .ok_or_else(|| LinkCatalogError::analysis_parse("reply has no author"))?;

    let content = reply
        .content
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| LinkCatalogError::analysis_parse("reply has no content"))?;

    let category = reply
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CATEGORY);

    Ok(ExtractedContent {
        title: format!("{} by @{author}", platform.post_noun),
        description: content.to_string(),
        author: Some(format!("@{author}")),
        category: category.to_string(),
        features: Vec::new(),
    })
}

fn placeholder(platform: &SocialPlatform) -> ExtractedContent {
    ExtractedContent {
        title: format!("{} Post", platform.name),
        description: "Content extraction failed".into(),
        author: Some("Unknown".into()),
        category: DEFAULT_CATEGORY.into(),
        features: Vec::new(),
    }
}

//! Model enrichment of a fetched page: topic, concise description, features.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use linkcatalog_analysis::{ContentAnalyzer, parse_json_reply};
use linkcatalog_shared::Result;

use crate::page::PageSummary;

/// Topic assigned when enrichment is unavailable.
const DEFAULT_CATEGORY: &str = "AI Tool";

/// Enrichment result for a webpage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageAnalysis {
    pub category: String,
    pub description: String,
    pub features: Vec<String>,
}

impl PageAnalysis {
    fn fallback(page: &PageSummary) -> Self {
        Self {
            category: DEFAULT_CATEGORY.into(),
            description: page.description.clone(),
            features: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnrichmentReply {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    enhanced_description: Option<String>,
    #[serde(default)]
    features: Option<Value>,
}

fn prompt(url: &str, page: &PageSummary) -> String {
    format!(
        "Analyze this website content and categorize it for an AI catalog:\n\
         \n\
         URL: {url}\n\
         Title: {title}\n\
         Description: {description}\n\
         \n\
         Please determine:\n\
         1. What category this fits: AI Tool, AI Research, AI News, AI Resource, etc.\n\
         2. A concise description (2-3 sentences max)\n\
         3. Key features if it's a tool\n\
         \n\
         Return as JSON with keys: category, enhancedDescription, features (array)",
        title = page.title,
        description = page.description,
    )
}

/// Enrich `page`. Never fails: any problem falls back to the raw description.
pub(crate) async fn analyze(
    analyzer: Option<&dyn ContentAnalyzer>,
    url: &str,
    page: &PageSummary,
) -> PageAnalysis {
    let Some(analyzer) = analyzer else {
        debug!("analysis disabled, keeping raw description");
        return PageAnalysis::fallback(page);
    };

    let parsed = match analyzer.complete(&prompt(url, page)).await {
        Ok(reply) => interpret(page, &reply),
        Err(e) => Err(e),
    };

    parsed.unwrap_or_else(|e| {
        warn!(%url, error = %e, "page enrichment failed, keeping raw description");
        PageAnalysis::fallback(page)
    })
}

/// Merge the model reply over the fallback field by field.
fn interpret(page: &PageSummary, reply: &str) -> Result<PageAnalysis> {
    let reply: EnrichmentReply = parse_json_reply(reply)?;
    let fallback = PageAnalysis::fallback(page);

    let category = non_empty(reply.category).unwrap_or(fallback.category);
    let description = non_empty(reply.enhanced_description).unwrap_or(fallback.description);
    let features = match reply.features {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
            .collect(),
        _ => fallback.features,
    };

    Ok(PageAnalysis {
        category,
        description,
        features,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> PageSummary {
        PageSummary {
            title: "MyTool".into(),
            description: "A tool for X".into(),
        }
    }

    #[test]
    fn full_reply() {
        let analysis = interpret(
            &page(),
            r#"{"category":"AI Tool","enhancedDescription":"An AI tool for X","features":["a","b"]}"#,
        )
        .unwrap();
        assert_eq!(
            analysis,
            PageAnalysis {
                category: "AI Tool".into(),
                description: "An AI tool for X".into(),
                features: vec!["a".into(), "b".into()],
            }
        );
    }

    #[test]
    fn partial_reply_fills_gaps() {
        let analysis = interpret(&page(), r#"{"category":"AI Research"}"#).unwrap();
        assert_eq!(analysis.category, "AI Research");
        assert_eq!(analysis.description, "A tool for X");
        assert!(analysis.features.is_empty());

        let analysis = interpret(&page(), r#"{"features":"not a list","enhancedDescription":" "}"#)
            .unwrap();
        assert_eq!(analysis.category, "AI Tool");
        assert_eq!(analysis.description, "A tool for X");
        assert!(analysis.features.is_empty());
    }

    #[test]
    fn non_string_features_are_dropped() {
        let analysis = interpret(&page(), r#"{"features":["fast", 3, null, "  ", "cheap"]}"#).unwrap();
        assert_eq!(analysis.features, vec!["fast".to_string(), "cheap".to_string()]);
    }

    #[test]
    fn prose_reply_is_rejected() {
        assert!(interpret(&page(), "This looks like a great tool!").is_err());
    }

    #[tokio::test]
    async fn disabled_analysis_falls_back() {
        let analysis = analyze(None, "https://example.com", &page()).await;
        assert_eq!(analysis, PageAnalysis::fallback(&page()));
    }

    #[test]
    fn prompt_carries_page_fields() {
        let text = prompt("https://example.com/tool", &page());
        assert!(text.contains("URL: https://example.com/tool"));
        assert!(text.contains("Title: MyTool"));
        assert!(text.contains("Description: A tool for X"));
    }
}

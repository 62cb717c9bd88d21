//! Link classification and content extraction.
//!
//! This crate provides:
//! - [`LinkExtractor`]: the seam the conversation controller calls
//! - [`ContentExtractor`]: social posts via the model, webpages via fetch + parse + enrichment
//! - [`classify`]: decides which branch a URL takes

mod enrich;
mod fetch;
mod page;
mod social;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, instrument};
use url::Url;

use linkcatalog_analysis::ContentAnalyzer;
use linkcatalog_shared::{ExtractedContent, FetchConfig, LinkCatalogError, Result, SocialPlatform};

pub use page::PageSummary;

/// Turns a URL into an [`ExtractedContent`].
#[async_trait]
pub trait LinkExtractor: Send + Sync {
    /// Extract content for `url`. Only fetch-level failures are errors.
    async fn extract(&self, url: &str) -> Result<ExtractedContent>;
}

/// Which extraction branch a URL takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind<'a> {
    /// A post on a platform that blocks scraping.
    Social(&'a SocialPlatform),
    /// Anything else: fetched and parsed.
    Webpage,
}

/// Classify `url` against the configured social platforms.
pub fn classify<'a>(url: &Url, platforms: &'a [SocialPlatform]) -> LinkKind<'a> {
    url.host_str()
        .and_then(|host| platforms.iter().find(|p| p.matches_host(host)))
        .map_or(LinkKind::Webpage, LinkKind::Social)
}

/// Default [`LinkExtractor`]: model synthesis for social posts, fetch + parse + enrich otherwise.
pub struct ContentExtractor {
    config: FetchConfig,
    client: Client,
    analyzer: Option<Arc<dyn ContentAnalyzer>>,
}

impl ContentExtractor {
    /// Create an extractor. Without an analyzer every model step uses its fallback.
    pub fn new(config: FetchConfig, analyzer: Option<Arc<dyn ContentAnalyzer>>) -> Result<Self> {
        let client = fetch::build_client(&config)?;
        Ok(Self {
            config,
            client,
            analyzer,
        })
    }
}

#[async_trait]
impl LinkExtractor for ContentExtractor {
    #[instrument(skip_all, fields(url = %url))]
    async fn extract(&self, url: &str) -> Result<ExtractedContent> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| LinkCatalogError::Fetch(format!("invalid URL {url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(LinkCatalogError::Fetch(format!(
                "unsupported scheme {:?}",
                parsed.scheme()
            )));
        }

        let analyzer = self.analyzer.as_deref();

        match classify(&parsed, &self.config.social) {
            LinkKind::Social(platform) => {
                info!(platform = %platform.name, "extracting social post");
                Ok(social::extract(analyzer, platform, url).await)
            }
            LinkKind::Webpage => {
                let html = fetch::fetch_html(&self.client, &parsed, &self.config).await?;
                let page = PageSummary::from_html(&html);
                let analysis = enrich::analyze(analyzer, url, &page).await;

                info!(title = %page.title, category = %analysis.category, "extracted webpage");

                Ok(ExtractedContent {
                    title: page.title,
                    description: analysis.description,
                    author: None,
                    category: analysis.category,
                    features: analysis.features,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Analyzer returning a fixed reply and remembering the prompts it saw.
    struct Recording {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl Recording {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.into(),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ContentAnalyzer for Recording {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    fn local_config() -> FetchConfig {
        FetchConfig {
            allow_private_hosts: true,
            ..FetchConfig::default()
        }
    }

    #[test]
    fn classify_social_and_webpage() {
        let platforms = FetchConfig::default().social;

        let url = Url::parse("https://x.com/someone/status/1").unwrap();
        assert!(matches!(classify(&url, &platforms), LinkKind::Social(p) if p.name == "Twitter"));

        let url = Url::parse("https://mobile.twitter.com/someone/status/1").unwrap();
        assert!(matches!(classify(&url, &platforms), LinkKind::Social(_)));

        let url = Url::parse("https://example.com/x.com").unwrap();
        assert_eq!(classify(&url, &platforms), LinkKind::Webpage);
    }

    #[tokio::test]
    async fn webpage_is_fetched_parsed_and_enriched() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/tool"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "<html><head><title>MyTool</title></head><body><p>A tool for X</p></body></html>",
                "text/html; charset=utf-8",
            ))
            .mount(&server)
            .await;

        let analyzer = Recording::new(
            r#"{"category":"AI Tool","enhancedDescription":"An AI tool for X","features":["a","b"]}"#,
        );
        let extractor = ContentExtractor::new(local_config(), Some(analyzer.clone())).unwrap();

        let url = format!("{}/tool", server.uri());
        let content = extractor.extract(&url).await.unwrap();

        assert_eq!(
            content,
            ExtractedContent {
                title: "MyTool".into(),
                description: "An AI tool for X".into(),
                author: None,
                category: "AI Tool".into(),
                features: vec!["a".into(), "b".into()],
            }
        );

        let prompts = analyzer.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Title: MyTool"));
        assert!(prompts[0].contains("Description: A tool for X"));
    }

    #[tokio::test]
    async fn webpage_without_description_sources() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "<html><body><h1>Only a heading</h1></body></html>",
                "text/html",
            ))
            .mount(&server)
            .await;

        let extractor = ContentExtractor::new(local_config(), None).unwrap();
        let content = extractor.extract(&server.uri()).await.unwrap();

        assert_eq!(content.title, "Only a heading");
        assert_eq!(content.description, "No description available");
        assert_eq!(content.category, "AI Tool");
        assert!(content.features.is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let analyzer = Recording::new("{}");
        let extractor = ContentExtractor::new(local_config(), Some(analyzer.clone())).unwrap();
        let err = extractor.extract(&server.uri()).await.unwrap_err();

        assert!(matches!(err, LinkCatalogError::Fetch(_)));
        assert!(analyzer.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn social_post_is_not_fetched() {
        let analyzer = Recording::new("not json at all");
        let extractor = ContentExtractor::new(FetchConfig::default(), Some(analyzer.clone())).unwrap();

        let content = extractor
            .extract("https://x.com/someone/status/123")
            .await
            .unwrap();

        assert_eq!(content.title, "Twitter Post");
        assert_eq!(content.author.as_deref(), Some("Unknown"));
        let prompts = analyzer.prompts.lock().unwrap();
        assert!(prompts[0].contains("https://x.com/someone/status/123"));
    }

    #[tokio::test]
    async fn invalid_url_is_an_error() {
        let extractor = ContentExtractor::new(FetchConfig::default(), None).unwrap();
        assert!(extractor.extract("https://").await.is_err());
        assert!(extractor.extract("ftp://example.com/file").await.is_err());
    }
}

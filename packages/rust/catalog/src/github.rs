//! GitHub repository contents API as a [`DatasetStore`].
//!
//! The file's blob SHA is the revision token: GitHub rejects a `PUT` whose
//! `sha` no longer matches the file with 409 (or 422 on some paths).

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use linkcatalog_shared::{GitHubConfig, LinkCatalogError, Result};

use crate::store::{DatasetStore, RemoteDocument};

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("linkcatalog-bot/", env!("CARGO_PKG_VERSION"));

/// [`DatasetStore`] backed by `/repos/{owner}/{repo}/contents/{path}`.
#[derive(Clone)]
pub struct GitHubStore {
    client: Client,
    token: String,
    contents_base: String,
    branch: Option<String>,
}

impl GitHubStore {
    /// Create a store for the repository named in `config`.
    pub fn new(token: impl Into<String>, config: &GitHubConfig) -> Result<Self> {
        if !config.has_repository() {
            return Err(LinkCatalogError::config(
                "github.owner and github.repo must be set",
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                LinkCatalogError::Persistence(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            token: token.into(),
            contents_base: format!(
                "{}/repos/{}/{}/contents",
                config.api_base.trim_end_matches('/'),
                config.owner,
                config.repo
            ),
            branch: config.branch.clone(),
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!("{}/{}", self.contents_base, path.trim_start_matches('/'))
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> Result<reqwest::Response> {
        request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LinkCatalogError::Persistence(format!("{path}: request timed out"))
                } else {
                    LinkCatalogError::Persistence(format!("{path}: request failed: {e}"))
                }
            })
    }
}

#[async_trait]
impl DatasetStore for GitHubStore {
    #[instrument(skip_all, fields(path = %path))]
    async fn read(&self, path: &str) -> Result<RemoteDocument> {
        let mut request = self.client.get(self.contents_url(path));
        if let Some(branch) = &self.branch {
            request = request.query(&[("ref", branch)]);
        }

        let response = self.send(request, path).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(path, status, &body));
        }

        let file: ContentsResponse = response.json().await.map_err(|e| {
            LinkCatalogError::Persistence(format!("{path}: malformed contents response: {e}"))
        })?;

        if let Some(encoding) = file.encoding.as_deref() {
            if encoding != "base64" {
                return Err(LinkCatalogError::Persistence(format!(
                    "{path}: unsupported content encoding {encoding:?}"
                )));
            }
        }

        // GitHub wraps the base64 payload at 60 columns.
        let packed: String = file
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let content = STANDARD.decode(packed).map_err(|e| {
            LinkCatalogError::Persistence(format!("{path}: invalid base64 content: {e}"))
        })?;

        debug!(bytes = content.len(), sha = %file.sha, "dataset read");
        Ok(RemoteDocument {
            content,
            revision: file.sha,
        })
    }

    #[instrument(skip_all, fields(path = %path))]
    async fn write(
        &self,
        path: &str,
        content: &[u8],
        revision: &str,
        message: &str,
    ) -> Result<String> {
        let body = UpdateRequest {
            message,
            content: STANDARD.encode(content),
            sha: revision,
            branch: self.branch.as_deref(),
        };

        let request = self.client.put(self.contents_url(path)).json(&body);
        let response = self.send(request, path).await?;

        let status = response.status();
        if status == StatusCode::CONFLICT || status == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(LinkCatalogError::RevisionConflict { path: path.into() });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(path, status, &body));
        }

        let updated: UpdateResponse = response.json().await.map_err(|e| {
            LinkCatalogError::Persistence(format!("{path}: malformed update response: {e}"))
        })?;

        debug!(sha = %updated.content.sha, "dataset written");
        Ok(updated.content.sha)
    }
}

fn map_http_error(path: &str, status: StatusCode, body: &str) -> LinkCatalogError {
    let detail = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());

    match status {
        StatusCode::NOT_FOUND => LinkCatalogError::Persistence(format!("{path}: not found")),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LinkCatalogError::Persistence(format!("{path}: access denied ({status}): {detail}"))
        }
        _ => LinkCatalogError::Persistence(format!("{path}: HTTP {status}: {detail}")),
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Serialize)]
struct UpdateRequest<'a> {
    message: &'a str,
    content: String,
    sha: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Deserialize)]
struct UpdateResponse {
    content: UpdatedFile,
}

#[derive(Deserialize)]
struct UpdatedFile {
    sha: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
}

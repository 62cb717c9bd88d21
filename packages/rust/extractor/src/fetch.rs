//! Webpage fetching with a bounded timeout, limited redirects and SSRF guard.

use std::net::IpAddr;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use tracing::{debug, instrument};
use url::Url;

use linkcatalog_shared::{FetchConfig, LinkCatalogError, Result};

/// Build the HTTP client used for webpage fetches.
pub(crate) fn build_client(config: &FetchConfig) -> Result<Client> {
    let max_redirects = config.max_redirects;
    let allow_private = config.allow_private_hosts;

    // Every redirect hop is re-checked against the private-host guard.
    let redirect = Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            attempt.error("too many redirects")
        } else if !allow_private && is_ssrf_target(attempt.url()) {
            attempt.error("redirect to a private address blocked")
        } else {
            attempt.follow()
        }
    });

    Client::builder()
        .user_agent(config.user_agent.clone())
        .redirect(redirect)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| LinkCatalogError::Fetch(format!("failed to build HTTP client: {e}")))
}

/// Fetch `url` and return its body, failing on anything that is not a 2xx HTML page
/// or whose body exceeds `config.max_body_bytes`.
#[instrument(skip_all, fields(url = %url))]
pub(crate) async fn fetch_html(client: &Client, url: &Url, config: &FetchConfig) -> Result<String> {
    if !config.allow_private_hosts && is_ssrf_target(url) {
        return Err(LinkCatalogError::Fetch(format!(
            "{url}: refusing to fetch a private or non-HTTP address"
        )));
    }

    debug!("fetching page");

    let transport = |e: reqwest::Error| {
        if e.is_timeout() {
            LinkCatalogError::Fetch(format!("{url}: timed out"))
        } else {
            LinkCatalogError::Fetch(format!("{url}: {e}"))
        }
    };

    let mut response = client.get(url.as_str()).send().await.map_err(transport)?;

    let status = response.status();
    if !status.is_success() {
        return Err(LinkCatalogError::Fetch(format!("{url}: HTTP {status}")));
    }

    if let Some(content_type) = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    {
        if !is_html_content_type(content_type) {
            return Err(LinkCatalogError::Fetch(format!(
                "{url}: not an HTML page ({content_type})"
            )));
        }
    }

    let max = config.max_body_bytes;
    if let Some(len) = response.content_length() {
        if len > max {
            return Err(LinkCatalogError::Fetch(format!(
                "{url}: response too large ({len} bytes, max {max})"
            )));
        }
    }

    // Content-Length may be absent or wrong, so the cap is enforced while reading.
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(transport)? {
        if body.len() as u64 + chunk.len() as u64 > max {
            return Err(LinkCatalogError::Fetch(format!(
                "{url}: response too large (over {max} bytes)"
            )));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}

fn is_html_content_type(value: &str) -> bool {
    let mime = value.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

// ---------------------------------------------------------------------------
// SSRF protection
// ---------------------------------------------------------------------------

/// Check if a URL targets a potentially dangerous resource.
pub(crate) fn is_ssrf_target(url: &Url) -> bool {
    match url.scheme() {
        "http" | "https" => {}
        _ => return true,
    }

    match url.host() {
        Some(url::Host::Ipv4(v4)) => is_private_ip(&IpAddr::V4(v4)),
        Some(url::Host::Ipv6(v6)) => is_private_ip(&IpAddr::V6(v6)),
        Some(url::Host::Domain(host)) => {
            let host = host.to_ascii_lowercase();
            host == "localhost" || host.ends_with(".local") || host.ends_with(".internal")
        }
        None => true,
    }
}

/// Check if an IP is in a private/reserved range.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // 100.64.0.0/10 (Carrier-grade NAT)
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64)
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 unique local, fe80::/10 link local
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

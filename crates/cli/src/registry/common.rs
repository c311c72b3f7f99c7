//! Shared infrastructure for the register adapters.
//!
//! Each adapter owns one [`FetchClient`] built with its own header set and
//! timeout. There is no shared session and no retry loop: a failed request
//! becomes a [`FetchError`], which the adapter reports as a row-level
//! `QueryError` so the batch carries on.

use std::time::Duration;

use regcheck_recon::config::RegistrySettings;
use regcheck_recon::LookupResult;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::HeaderMap;
use scraper::{ElementRef, Selector};
use thiserror::Error;

// ── Constants ───────────────────────────────────────────────────────

pub(crate) const USER_AGENT: &str = concat!("regcheck/", env!("CARGO_PKG_VERSION"));
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 15;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("cannot build HTTP client: {0}")]
    Client(String),
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("unreadable response from {url}: {message}")]
    Body { url: String, message: String },
}

impl From<FetchError> for LookupResult {
    fn from(err: FetchError) -> Self {
        LookupResult::query_error(err.to_string())
    }
}

// ── Endpoint ────────────────────────────────────────────────────────

/// Base URL and timeout for one register, after config overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub base_url: String,
    pub timeout: Duration,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Apply `[registries.<name>]` overrides on top of the built-in default.
    pub fn resolve(default_base: &str, settings: Option<&RegistrySettings>) -> Self {
        let mut endpoint = Self::new(default_base);
        if let Some(settings) = settings {
            if let Some(base) = &settings.base_url {
                endpoint.base_url = base.clone();
            }
            if let Some(secs) = settings.timeout_secs {
                endpoint.timeout = Duration::from_secs(secs);
            }
        }
        endpoint
    }

    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

// ── FetchClient ─────────────────────────────────────────────────────

pub struct FetchClient {
    http: Client,
    source: &'static str,
}

impl FetchClient {
    pub fn new(
        source: &'static str,
        timeout: Duration,
        headers: HeaderMap,
        cookies: bool,
    ) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .cookie_store(cookies)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { http, source })
    }

    pub fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, FetchError> {
        let resp = self.send(self.http.get(url).query(query), url)?;
        resp.text().map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    pub fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, FetchError> {
        let resp = self.send(self.http.get(url).query(query), url)?;
        resp.json().map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    pub fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<String, FetchError> {
        let resp = self.send(self.http.post(url).form(form), url)?;
        resp.text().map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn send(&self, req: RequestBuilder, url: &str) -> Result<Response, FetchError> {
        let resp = req.send().map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let status = resp.status().as_u16();
        tracing::debug!(source = self.source, url, status, "response");
        if !resp.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(resp)
    }
}

// ── HTML helpers ────────────────────────────────────────────────────

pub(crate) fn selector(css: &str) -> Result<Selector, LookupResult> {
    Selector::parse(css).map_err(|e| LookupResult::query_error(format!("bad selector {css}: {e}")))
}

/// Element text with whitespace runs collapsed.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_defaults_and_overrides() {
        let ep = Endpoint::resolve("https://example.test/api/", None);
        assert_eq!(ep.timeout, Duration::from_secs(15));
        assert_eq!(ep.url("/search"), "https://example.test/api/search");

        let settings = RegistrySettings {
            base_url: Some("http://127.0.0.1:9".into()),
            timeout_secs: Some(2),
        };
        let ep = Endpoint::resolve("https://example.test/api", Some(&settings));
        assert_eq!(ep.url("search"), "http://127.0.0.1:9/search");
        assert_eq!(ep.timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_fetch_error_becomes_query_error() {
        let result: LookupResult = FetchError::Status {
            url: "http://x/y".into(),
            status: 503,
        }
        .into();
        assert_eq!(
            result,
            LookupResult::query_error("http://x/y returned HTTP 503")
        );
    }

    #[test]
    fn test_text_collapses_whitespace() {
        let html = scraper::Html::parse_fragment("<h4>  Jo \n\t Smith </h4>");
        let sel = Selector::parse("h4").unwrap();
        let el = html.select(&sel).next().unwrap();
        assert_eq!(element_text(el), "Jo Smith");
    }
}

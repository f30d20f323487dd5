//! Upstream page fetching
//!
//! One bounded GET per page. Any failure aborts the call: non-200 status,
//! transport errors and undecodable bodies are returned as errors and never
//! retried here.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use url::Url;

use super::models::{ExternalRocketLaunch, Page, RocketLaunchFeedResponse};
use crate::error::AppError;

/// Join a base prefix and a relative path without doubling slashes
fn join_url(prefix: &str, path: &str) -> Result<Url, AppError> {
    let raw = format!(
        "{}/{}",
        prefix.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&raw).map_err(|e| AppError::Config(format!("invalid upstream URL {raw}: {e}")))
}

/// GET `url` and decode its JSON body
async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: Url,
    bearer: Option<&str>,
    timeout: Duration,
    endpoint: &str,
) -> Result<T, AppError> {
    let started = Instant::now();
    let observe = |status: &str| {
        crate::metrics::observe_upstream_request(endpoint, status, started.elapsed())
    };

    let mut request = client
        .get(url.clone())
        .timeout(timeout)
        .header(reqwest::header::ACCEPT, "application/json");
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(error) => {
            observe("transport_error");
            return Err(error.into());
        }
    };

    let status = response.status();
    if status != StatusCode::OK {
        observe(status.as_str());
        return Err(AppError::Upstream(format!(
            "GET {url} returned HTTP {}",
            status.as_u16()
        )));
    }

    let body = match response.bytes().await {
        Ok(body) => body,
        Err(error) => {
            observe("transport_error");
            return Err(error.into());
        }
    };

    match serde_json::from_slice::<T>(&body) {
        Ok(value) => {
            observe("200");
            Ok(value)
        }
        Err(error) => {
            observe("decode_error");
            Err(AppError::Decode(format!("GET {url}: {error}")))
        }
    }
}

/// Paginated fetcher for Launch Library 2
#[derive(Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
    url_prefix: String,
    timeout: Duration,
}

impl PageFetcher {
    /// # Arguments
    /// * `url_prefix` - e.g. "https://ll.thespacedevs.com/2.3.0"
    /// * `timeout` - Per-request timeout
    pub fn new(client: reqwest::Client, url_prefix: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url_prefix: url_prefix.into(),
            timeout,
        }
    }

    /// Build `{prefix}/{resource}?limit=..&offset=..&mode=detailed`
    pub fn page_url(&self, resource_path: &str, limit: u32, offset: u64) -> Result<Url, AppError> {
        let mut url = join_url(&self.url_prefix, resource_path)?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string())
            .append_pair("mode", "detailed");
        Ok(url)
    }

    /// Fetch one page of `resource_path`
    ///
    /// # Errors
    /// `HttpClient` on transport failure or timeout, `Upstream` on any
    /// non-200 status, `Decode` when the body is not a valid page.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        resource_path: &str,
        limit: u32,
        offset: u64,
    ) -> Result<Page<T>, AppError> {
        let url = self.page_url(resource_path, limit, offset)?;
        tracing::debug!(%url, "Fetching upstream page");

        get_json(
            &self.client,
            url,
            None,
            self.timeout,
            &format!("ll2:{resource_path}"),
        )
        .await
    }
}

/// RocketLaunch.Live "next launches" feed
#[derive(Clone)]
pub struct RocketLaunchFeed {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl RocketLaunchFeed {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            // Blank keys are treated as absent
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            timeout,
        }
    }

    /// Fetch the next `limit` launches as one complete page
    pub async fn fetch_next(&self, limit: u32) -> Result<Page<ExternalRocketLaunch>, AppError> {
        let url = join_url(&self.base_url, &format!("launches/next/{limit}"))?;
        tracing::debug!(%url, "Fetching rocket launch feed");

        let response: RocketLaunchFeedResponse = get_json(
            &self.client,
            url,
            self.api_key.as_deref(),
            self.timeout,
            "rocketlaunch:next",
        )
        .await?;

        Ok(Page::single(response.result))
    }
}

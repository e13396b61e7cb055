use super::models::{
    Incident, IncidentFilter, IncidentPage, Service, ServiceFilter, ServicePage,
};
use super::IncidentSource;
use crate::cache::BoundedCache;
use crate::config::Config;
use crate::error::{OpsboardError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Hard cap on drained pages, in case upstream never clears `more`.
const MAX_PAGES: u32 = 50;

/// HTTP client for the upstream ticketing API.
pub struct UpstreamClient {
    client: Client,
    base_url: String,
    api_token: String,
    from_email: Option<String>,
    page_limit: u32,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(OpsboardError::Transport)?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            from_email: config.from_email.clone(),
            page_limit: config.page_limit,
        })
    }

    async fn fetch_page(
        &self,
        path: &str,
        params: &[(String, String)],
        offset: u32,
    ) -> Result<String> {
        let mut request = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Token token={}", self.api_token))
            .header("Accept", "application/json")
            .query(params)
            .query(&[
                ("limit", self.page_limit.to_string()),
                ("offset", offset.to_string()),
            ]);
        if let Some(from) = &self.from_email {
            request = request.header("From", from.clone());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(triage_status(status, body));
        }

        Ok(response.text().await?)
    }

}

/// Drain every page of a collection by repeatedly invoking `fetch` with the
/// next offset. Callers never see partial pages: a snapshot is either complete
/// or an error. If `MAX_PAGES` is reached with `more` still set, the drain
/// fails rather than caching a silently truncated snapshot.
async fn drain_pages<P, T, Fetch, Fut, F>(
    path: &str,
    mut fetch: Fetch,
    extract: F,
) -> Result<Vec<T>>
where
    P: serde::de::DeserializeOwned,
    Fetch: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<String>>,
    F: Fn(P) -> (Vec<T>, bool),
{
    let mut records = Vec::new();
    let mut offset = 0u32;

    for _ in 0..MAX_PAGES {
        let body = fetch(offset).await?;
        let page: P = serde_json::from_str(&body).map_err(|e| {
            OpsboardError::MalformedResponse(format!(
                "{path} page at offset {offset}: {e}"
            ))
        })?;
        let (page_records, more) = extract(page);
        let page_len = page_records.len() as u32;
        records.extend(page_records);

        if !more || page_len == 0 {
            debug!(path, total = records.len(), "drained upstream collection");
            return Ok(records);
        }
        offset += page_len;
    }

    warn!(path, pages = MAX_PAGES, "pagination cap reached with `more` still set");
    Err(OpsboardError::MalformedResponse(format!(
        "{path}: upstream still reported more records after {MAX_PAGES} pages of {offset} total; refusing to return a truncated snapshot"
    )))
}

/// Map a non-success HTTP status to the error taxonomy.
///
/// Authentication failures are configuration errors, never retried; timeouts,
/// rate limits and 5xx are transient and retried on the next poll cycle.
fn triage_status(status: StatusCode, body: String) -> OpsboardError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => OpsboardError::Configuration(
            format!("upstream rejected credentials ({status}): {body}"),
        ),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            OpsboardError::UpstreamTransient {
                status: status.as_u16(),
                message: body,
            }
        }
        s if s.is_server_error() => OpsboardError::UpstreamTransient {
            status: s.as_u16(),
            message: body,
        },
        s => OpsboardError::InvalidArgument(format!(
            "upstream rejected request ({s}): {body}"
        )),
    }
}

#[async_trait]
impl IncidentSource for UpstreamClient {
    async fn list_incidents(&self, filter: &IncidentFilter) -> Result<Vec<Incident>> {
        let params = filter.query_params();
        drain_pages(
            "/incidents",
            |offset| self.fetch_page("/incidents", &params, offset),
            |page: IncidentPage| (page.incidents, page.more),
        )
        .await
    }

    async fn list_services(&self, filter: &ServiceFilter) -> Result<Vec<Service>> {
        let params = filter.query_params();
        drain_pages(
            "/services",
            |offset| self.fetch_page("/services", &params, offset),
            |page: ServicePage| (page.services, page.more),
        )
        .await
    }
}

/// Caching layer over any `IncidentSource`.
///
/// Incident lists are volatile (30 s TTL by default); service catalogs are
/// slowly-changing reference data (300 s). A failed inner fetch writes no
/// cache entry, so the next caller retries from scratch.
pub struct CachedAdapter<S> {
    inner: Arc<S>,
    cache: BoundedCache,
    incidents_ttl: Duration,
    services_ttl: Duration,
}

impl<S: IncidentSource> CachedAdapter<S> {
    pub fn new(
        inner: Arc<S>,
        cache: BoundedCache,
        incidents_ttl: Duration,
        services_ttl: Duration,
    ) -> Self {
        Self {
            inner,
            cache,
            incidents_ttl,
            services_ttl,
        }
    }

    pub fn from_config(inner: Arc<S>, cache: BoundedCache, config: &Config) -> Self {
        Self::new(inner, cache, config.incidents_ttl(), config.services_ttl())
    }

    pub fn cache(&self) -> &BoundedCache {
        &self.cache
    }
}

#[async_trait]
impl<S: IncidentSource> IncidentSource for CachedAdapter<S> {
    async fn list_incidents(&self, filter: &IncidentFilter) -> Result<Vec<Incident>> {
        let key = filter.cache_key();
        self.cache
            .get_or_fetch(&key, self.incidents_ttl, || async {
                self.inner.list_incidents(filter).await
            })
            .await
    }

    async fn list_services(&self, filter: &ServiceFilter) -> Result<Vec<Service>> {
        let key = filter.cache_key();
        self.cache
            .get_or_fetch(&key, self.services_ttl, || async {
                self.inner.list_services(filter).await
            })
            .await
    }
}

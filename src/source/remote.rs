use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::{listing_label, parse_json, record_label, EventSource, ResponseCache};
use crate::error::SourceError;
use crate::event::{EventListing, EventRecord};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP event data provider.
///
/// `GET <base>/<season>/events` lists a season, `GET <base>/<season>/events/<code>`
/// returns one record. Parsed bodies are kept in the response cache.
pub struct RemoteSource {
    client: reqwest::Client,
    base_url: String,
    cache: ResponseCache,
}

impl RemoteSource {
    pub fn new(base_url: &str, cache: ResponseCache) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("regional-pool/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        what: &str,
    ) -> Result<T, SourceError> {
        let url = format!("{}/{}", self.base_url, path);

        if let Some(body) = self.cache.read(&url).await {
            match parse_json(&body, what) {
                Ok(value) => {
                    tracing::debug!(%url, "cache hit");
                    return Ok(value);
                }
                Err(e) => tracing::debug!(%url, error = %e, "ignoring unreadable cache entry"),
            }
        }

        let unavailable = |reason: String| SourceError::Unavailable {
            what: what.to_string(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {} from {}", status, url)));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let value = parse_json(&body, what)?;
        if let Err(e) = self.cache.write(&url, &body).await {
            tracing::warn!(%url, error = %e, "failed to cache response");
        }
        Ok(value)
    }
}

#[async_trait]
impl EventSource for RemoteSource {
    async fn season_events(&self, season: u16) -> Result<Vec<EventListing>, SourceError> {
        self.get_json(&format!("{}/events", season), &listing_label(season))
            .await
    }

    async fn event_record(&self, season: u16, code: &str) -> Result<EventRecord, SourceError> {
        self.get_json(
            &format!("{}/events/{}", season, code),
            &record_label(season, code),
        )
        .await
    }
}

//! PokeAPI client
//!
//! Fetches location areas and Pokemon from PokeAPI. Every response body is
//! kept in the shared [`ResponseCache`] under its exact request URL, so repeated
//! lookups within the TTL never touch the network.

use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use super::{LocationArea, LocationAreaPage, Pokemon};
use crate::cache::ResponseCache;

/// Base URL for the public PokeAPI
pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Errors that can occur when fetching from PokeAPI
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent
    #[error("failed to fetch {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with something other than 200 OK
    #[error("unexpected status code {status} for {url}")]
    UnexpectedStatus { status: StatusCode, url: String },

    /// The response body could not be read
    #[error("failed to read response body: {0}")]
    Read(#[source] reqwest::Error),

    /// The body was not the JSON we expected
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Client for PokeAPI, backed by a shared response cache
#[derive(Debug, Clone)]
pub struct PokeApiClient {
    client: Client,
    base_url: String,
    cache: Arc<ResponseCache>,
}

impl PokeApiClient {
    /// Creates a client for the public PokeAPI
    pub fn new(cache: Arc<ResponseCache>) -> Self {
        Self::with_base_url(cache, DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom base URL (mirrors, mock servers)
    pub fn with_base_url(cache: Arc<ResponseCache>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            cache,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the first page of the location-area listing
    pub fn first_page_url(&self) -> String {
        format!("{}/location-area/", self.base_url)
    }

    /// Fetches one page of location areas
    ///
    /// # Arguments
    /// * `cursor` - A `next`/`previous` URL from an earlier page, or `None` for
    ///   the first page
    pub async fn location_areas(
        &self,
        cursor: Option<&str>,
    ) -> Result<LocationAreaPage, ApiError> {
        let url = match cursor {
            Some(url) => url.to_string(),
            None => self.first_page_url(),
        };
        self.get_json(&url).await
    }

    /// Fetches a location area and its encounter list
    pub async fn location_area(&self, name: &str) -> Result<LocationArea, ApiError> {
        let url = format!("{}/location-area/{}", self.base_url, name);
        self.get_json(&url).await
    }

    /// Fetches a Pokemon's stat record
    pub async fn pokemon(&self, name: &str) -> Result<Pokemon, ApiError> {
        let url = format!("{}/pokemon/{}", self.base_url, name);
        self.get_json(&url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let body = self.fetch_with_cache(url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Returns the body for `url`, from the cache when possible
    ///
    /// Only successful responses are cached. The body is cached before it is
    /// decoded, so a malformed body is served from the cache until it expires.
    async fn fetch_with_cache(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        if let Some(body) = self.cache.get(url) {
            debug!(url, "cache hit");
            return Ok(body);
        }
        debug!(url, "cache miss, fetching");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ApiError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ApiError::UnexpectedStatus {
                status,
                url: url.to_string(),
            });
        }

        let body = response.bytes().await.map_err(ApiError::Read)?.to_vec();
        self.cache.add(url, body.clone());
        Ok(body)
    }
}

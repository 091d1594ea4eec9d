use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{StatusCode, Url};

use crate::{config::NetworkConfig, directory::Building};

/// API client for a remote building directory.
///
/// The endpoint serves all buildings as a JSON array at its base URL and a
/// single building at `<base>/<id>`, with the id percent-encoded as one path
/// segment.
#[derive(Clone, Debug)]
pub struct DirectoryApiClient {
    client: reqwest::Client,
    url: Url,
}

impl DirectoryApiClient {
    /// Create a new API client with configurable timeouts.
    pub fn new(url: String, network_config: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(network_config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(network_config.connect_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;
        let url = Url::parse(url.trim_end_matches('/'))
            .with_context(|| format!("Invalid directory API URL {url:?}"))?;
        if url.cannot_be_a_base() {
            anyhow::bail!("Directory API URL cannot take a building path: {url}");
        }

        Ok(Self { client, url })
    }

    pub async fn fetch_buildings(&self) -> Result<Vec<Building>> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .context("Failed to send request to directory API")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("API returned error status: {}", status);
        }

        let buildings = response
            .json::<Vec<Building>>()
            .await
            .context("Failed to parse directory API response")?;

        tracing::debug!(count = buildings.len(), "Fetched buildings");
        Ok(buildings)
    }

    /// Fetch one building. A 404 means it does not exist.
    pub async fn fetch_building(&self, id: &str) -> Result<Option<Building>> {
        let response = self
            .client
            .get(self.building_url(id)?)
            .send()
            .await
            .context("Failed to send request to directory API")?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            anyhow::bail!("API returned error status: {}", status);
        }

        let mut building = response
            .json::<Building>()
            .await
            .context("Failed to parse directory API response")?;
        if building.id.is_empty() {
            building.id = id.to_string();
        }

        Ok(Some(building))
    }

    fn building_url(&self, id: &str) -> Result<Url> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Directory API URL cannot take a building path: {}", self.url))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }
}

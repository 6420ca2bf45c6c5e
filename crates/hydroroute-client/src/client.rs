//! Station directory HTTP client.

use anyhow::{anyhow, Context, Result};
use hydroroute_core::normalize::RawStationRecord;
use hydroroute_core::resolver::StationDirectory;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_GEOCODE_URL: &str = "https://api.vworld.kr/req/address";

/// HTTP client for the station directory backend.
pub struct StationClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) geocode_url: String,
    pub(crate) geocode_key: Option<String>,
}

/// One page of station search results, raw records included.
#[derive(Debug, Clone, Serialize)]
pub struct StationPage {
    pub total: u64,
    pub page: u64,
    pub size: u64,
    pub stations: Vec<Value>,
}

impl StationClient {
    /// Create a new directory client. `geocode_key` enables reverse
    /// geocoding; without it `reverse_geocode` reports no address.
    pub fn new(base_url: impl Into<String>, geocode_key: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: trim_trailing_slash(base_url.into()),
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
            geocode_key: geocode_key
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
        }
    }

    /// Point reverse geocoding at a different provider endpoint (tests).
    pub fn with_geocode_url(mut self, url: impl Into<String>) -> Self {
        self.geocode_url = trim_trailing_slash(url.into());
        self
    }

    /// Paged keyword search. The upstream wraps its rows as either
    /// `stations` or `rows`; both are accepted.
    pub async fn search_stations(&self, keyword: &str, page: u64, size: u64) -> Result<StationPage> {
        let url = format!("{}/stations/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("keyword", keyword),
                ("page", &page.to_string()),
                ("size", &size.to_string()),
            ])
            .send()
            .await
            .context("Failed to search stations")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Station search failed: {} {}", status, body));
        }

        let payload: Value = response
            .json()
            .await
            .context("Failed to parse station search response")?;

        let stations = extract_rows(&payload);
        Ok(StationPage {
            total: payload
                .get("total")
                .and_then(Value::as_u64)
                .unwrap_or(stations.len() as u64),
            page: payload.get("page").and_then(Value::as_u64).unwrap_or(page),
            size: payload.get("size").and_then(Value::as_u64).unwrap_or(size),
            stations,
        })
    }

    /// Exact-ish lookup by station name, returning raw rows.
    pub async fn stations_by_name(&self, station_name: &str) -> Result<Vec<Value>> {
        let url = format!("{}/stations/by-name", self.base_url);
        let mut request = self.client.get(&url);
        if !station_name.trim().is_empty() {
            request = request.query(&[("stationName", station_name.trim())]);
        }

        let response = request
            .send()
            .await
            .context("Failed to fetch stations by name")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Stations by-name failed: {} {}", status, body));
        }

        let payload: Value = response
            .json()
            .await
            .context("Failed to parse stations by-name response")?;
        Ok(extract_rows(&payload))
    }

    /// Autocomplete suggestions for a partial keyword.
    pub async fn suggestions(&self, keyword: &str, limit: u64) -> Result<Vec<String>> {
        let url = format!("{}/stations/suggestions", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("keyword", keyword), ("limit", &limit.to_string())])
            .send()
            .await
            .context("Failed to fetch suggestions")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Suggestions fetch failed: {} {}", status, body));
        }

        let payload: Value = response
            .json()
            .await
            .context("Failed to parse suggestions response")?;
        let suggestions = payload
            .get("suggestions")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(suggestions)
    }

    /// Fetch one station's detail record by code; 404 means it does not exist.
    pub async fn station_detail(&self, code: &str) -> Result<Option<Value>> {
        let url = self.station_detail_url(code)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch station detail")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Station detail failed: {} {}", status, body));
        }

        let payload: Value = response
            .json()
            .await
            .context("Failed to parse station detail response")?;
        Ok(Some(payload))
    }

    fn station_detail_url(&self, code: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).context("Invalid directory base URL")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Directory base URL cannot carry a path"))?
            .pop_if_empty()
            .push("stations")
            .push(code);
        Ok(url)
    }

    /// Resolve an address label for a coordinate, if the provider knows one.
    ///
    /// The provider takes the point as `lng,lat` (x,y); everything else in
    /// this workspace speaks lat/lng, so the flip happens only here. Without
    /// a configured key this is always `Ok(None)`.
    pub async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Option<String>> {
        let Some(key) = self.geocode_key.as_deref() else {
            return Ok(None);
        };

        let response = self
            .client
            .get(&self.geocode_url)
            .query(&[
                ("service", "address"),
                ("request", "getAddress"),
                ("version", "2.0"),
                ("format", "json"),
                ("type", "ROAD"),
                ("crs", "epsg:4326"),
                ("point", &format!("{},{}", lng, lat)),
                ("key", key),
            ])
            .send()
            .await
            .context("Failed to reverse geocode")?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "reverse geocode lookup failed");
            return Ok(None);
        }

        let payload: Value = response
            .json()
            .await
            .context("Failed to parse reverse geocode response")?;
        let text = payload
            .pointer("/response/result/0/text")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        Ok(text)
    }
}

/// Pull the row array out of a list payload, whichever key it hides under.
fn extract_rows(payload: &Value) -> Vec<Value> {
    for key in ["stations", "rows"] {
        if let Some(entries) = payload.get(key).and_then(Value::as_array) {
            return entries.to_vec();
        }
    }
    Vec::new()
}

impl StationDirectory for StationClient {
    type Error = anyhow::Error;

    async fn search(
        &self,
        keyword: &str,
        limit: usize,
    ) -> Result<Vec<RawStationRecord>, Self::Error> {
        let page = self.search_stations(keyword, 1, limit as u64).await?;
        Ok(page
            .stations
            .iter()
            .filter_map(RawStationRecord::from_value)
            .collect())
    }

    async fn detail_by_code(&self, code: &str) -> Result<Option<RawStationRecord>, Self::Error> {
        let detail = self.station_detail(code).await?;
        Ok(detail.as_ref().and_then(RawStationRecord::from_value))
    }
}

fn trim_trailing_slash(mut value: String) -> String {
    while value.ends_with('/') {
        value.pop();
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_rows_accepts_both_envelopes() {
        let stations = json!({ "stations": [{ "name": "a" }] });
        assert_eq!(extract_rows(&stations).len(), 1);
        let rows = json!({ "rows": [{ "name": "a" }, { "name": "b" }] });
        assert_eq!(extract_rows(&rows).len(), 2);
        assert!(extract_rows(&json!({ "total": 0 })).is_empty());
    }

    #[test]
    fn detail_url_encodes_the_code() {
        let client = StationClient::new("http://localhost:4000/api", None);
        let url = client.station_detail_url("code 1/a").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:4000/api/stations/code%201%2Fa"
        );
    }

    #[test]
    fn blank_geocode_key_disables_lookup() {
        let client = StationClient::new("http://localhost:4000", Some("   ".to_string()));
        assert!(client.geocode_key.is_none());
    }
}

//! Google Directions API client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::LookupError;

use super::lookup::{TransitLookup, TravelMode};

/// Public Directions API endpoint.
pub const DIRECTIONS_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/directions/json";

/// Configuration for [`DirectionsClient`].
#[derive(Clone)]
pub struct DirectionsOptions {
    /// Endpoint URL; override to point at a stub server.
    pub endpoint: String,
    /// API key sent as the `key` query parameter.
    pub api_key: String,
    /// Per-request timeout, covering connect and body read.
    pub timeout: Duration,
}

impl DirectionsOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DIRECTIONS_ENDPOINT.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl std::fmt::Debug for DirectionsOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectionsOptions")
            .field("endpoint", &self.endpoint)
            .field("api_key_set", &!self.api_key.is_empty())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// [`TransitLookup`] backed by the Directions API, departing now.
#[derive(Debug, Clone)]
pub struct DirectionsClient {
    http: reqwest::Client,
    opts: DirectionsOptions,
}

impl DirectionsClient {
    pub fn new(opts: DirectionsOptions) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(opts.timeout).build()?;
        Ok(Self { http, opts })
    }
}

#[async_trait]
impl TransitLookup for DirectionsClient {
    async fn duration(&self, origin: &str, destination: &str, mode: TravelMode) -> Result<Duration, LookupError> {
        let body = self
            .http
            .get(&self.opts.endpoint)
            .query(&[
                ("origin", origin),
                ("destination", destination),
                ("mode", mode.as_str()),
                ("departure_time", "now"),
                ("key", self.opts.api_key.as_str()),
            ])
            .send()
            .await?
            .text()
            .await?;

        let duration = parse_directions(&body)?;
        tracing::debug!(%origin, %destination, secs = duration.as_secs(), "transit time (api)");
        Ok(duration)
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    #[serde(default)]
    legs: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
struct Leg {
    #[serde(default)]
    duration: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    value: f64,
}

/// Extract the first route's first leg duration from a Directions API response body.
///
/// Non-`OK` statuses, missing routes/legs/durations, a zero duration and a duration too large
/// to represent are all failures.
pub fn parse_directions(body: &str) -> Result<Duration, LookupError> {
    let resp: DirectionsResponse =
        serde_json::from_str(body).map_err(|e| LookupError::Malformed(e.to_string()))?;

    if resp.status != "OK" {
        return Err(LookupError::Status {
            status: resp.status,
            message: resp.error_message,
        });
    }

    let secs = resp
        .routes
        .first()
        .and_then(|r| r.legs.first())
        .and_then(|l| l.duration.as_ref())
        .map(|d| d.value)
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or(LookupError::NoRoute)?;

    Duration::try_from_secs_f64(secs).map_err(|e| LookupError::Malformed(format!("duration {secs}: {e}")))
}

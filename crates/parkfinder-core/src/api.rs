// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ParkFinder contributors

//! Typed client for the ParkFinder backend.
//!
//! Every endpoint response is decoded into an explicit schema at this
//! boundary. A body that does not match fails with [`ParseError`] naming the
//! endpoint; nothing loosely typed leaks into rendering.

use crate::geo::LatLon;
use crate::{ParkError, ParseError};
use chrono::{DateTime, Local};
use log::{debug, warn};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use url::Url;

pub const SEARCH_PATH: &str = "/api/search";
pub const REALTIME_PATH: &str = "/api/parking/realtime";
pub const PREDICT_PATH: &str = "/api/parking/predict";
pub const STATES_PATH: &str = "/api/insights/states";
pub const VEHICLES_PATH: &str = "/api/insights/vehicles";
pub const POPULATION_PATH: &str = "/api/insights/population";

const NO_DESCRIPTION: &str = "No description";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSuggestion {
    pub name: String,
    #[serde(deserialize_with = "flexible_f64")]
    pub lat: f64,
    #[serde(deserialize_with = "flexible_f64")]
    pub lon: f64,
}

impl PlaceSuggestion {
    pub fn position(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Restriction {
    #[serde(default, deserialize_with = "nullable_string")]
    pub restriction_days: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub time_restrictions_start: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub time_restrictions_finish: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub restriction_display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingBay {
    #[serde(default, deserialize_with = "flexible_opt_i64")]
    pub kerbsideid: Option<i64>,
    #[serde(default, deserialize_with = "flexible_opt_i64")]
    pub zone_number: Option<i64>,
    #[serde(deserialize_with = "flexible_f64")]
    pub lat: f64,
    #[serde(deserialize_with = "flexible_f64")]
    pub lon: f64,
    #[serde(default = "default_description", deserialize_with = "description_or_default")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub lastupdated: String,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub restrictions: Vec<Restriction>,
}

impl ParkingBay {
    pub fn position(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }

    /// `lastupdated` in local time, when it is a valid RFC 3339 timestamp.
    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        DateTime::parse_from_rfc3339(self.lastupdated.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Local))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictedStatus {
    Available,
    Occupied,
}

impl PredictedStatus {
    pub fn is_available(self) -> bool {
        self == PredictedStatus::Available
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PredictedStatus::Available => "Available",
            PredictedStatus::Occupied => "Occupied",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(deserialize_with = "flexible_f64")]
    pub latitude: f64,
    #[serde(deserialize_with = "flexible_f64")]
    pub longitude: f64,
    #[serde(default, deserialize_with = "flexible_opt_i64")]
    pub zone_number: Option<i64>,
    #[serde(default = "default_description", deserialize_with = "description_or_default")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub restrictions: Vec<Restriction>,
    #[serde(default)]
    pub proba_occupied: Option<f64>,
    pub predicted_status: PredictedStatus,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl PredictionResult {
    pub fn lat(&self) -> f64 {
        self.latitude
    }

    pub fn lon(&self) -> f64 {
        self.longitude
    }

    pub fn position(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub lat: f64,
    pub lon: f64,
    pub datetime_iso: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(default)]
    pub datetime_iso: Option<String>,
    #[serde(default)]
    pub model_info: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub results: Vec<PredictionResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateInfo {
    #[serde(deserialize_with = "flexible_i64")]
    pub state_id: i64,
    pub state_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleTotal {
    #[serde(deserialize_with = "flexible_i64")]
    pub year: i64,
    #[serde(deserialize_with = "flexible_f64")]
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationEstimate {
    #[serde(deserialize_with = "flexible_i64")]
    pub year: i64,
    #[serde(deserialize_with = "flexible_f64")]
    pub population: f64,
}

/// The backend as the client sees it. Implemented over HTTP by
/// [`HttpBackend`]; tests substitute in-memory fakes.
pub trait ParkingBackend: Send + Sync + 'static {
    fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<PlaceSuggestion>, ParkError>> + Send;

    fn realtime(
        &self,
        lat: f64,
        lon: f64,
    ) -> impl Future<Output = Result<Vec<ParkingBay>, ParkError>> + Send;

    fn predict(
        &self,
        request: &PredictionRequest,
    ) -> impl Future<Output = Result<PredictionResponse, ParkError>> + Send;

    fn states(&self) -> impl Future<Output = Result<Vec<StateInfo>, ParkError>> + Send;

    fn vehicles(
        &self,
        state_id: i64,
    ) -> impl Future<Output = Result<Vec<VehicleTotal>, ParkError>> + Send;

    fn population(
        &self,
        state_id: i64,
    ) -> impl Future<Output = Result<Vec<PopulationEstimate>, ParkError>> + Send;
}

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ParkError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ParkError::Config(format!("invalid backend url {base_url:?}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(ParkError::Config(format!(
                "backend url {base_url:?} cannot carry a path"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("parkfinder/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ParkError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ParkError::Config(format!("invalid endpoint {path}: {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &[(&str, String)],
    ) -> Result<T, ParkError> {
        let url = self.endpoint(endpoint, query)?;
        debug!("GET {url}");
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        decode(endpoint, &bytes)
    }
}

impl ParkingBackend for HttpBackend {
    async fn search(&self, query: &str) -> Result<Vec<PlaceSuggestion>, ParkError> {
        self.get_json(SEARCH_PATH, &[("q", query.to_string())]).await
    }

    async fn realtime(&self, lat: f64, lon: f64) -> Result<Vec<ParkingBay>, ParkError> {
        self.get_json(
            REALTIME_PATH,
            &[("lat", lat.to_string()), ("lon", lon.to_string())],
        )
        .await
    }

    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse, ParkError> {
        let url = self.endpoint(PREDICT_PATH, &[])?;
        debug!(
            "POST {url} — lat={} lon={} datetime_iso={}",
            request.lat, request.lon, request.datetime_iso
        );
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;
        decode(PREDICT_PATH, &bytes)
    }

    async fn states(&self) -> Result<Vec<StateInfo>, ParkError> {
        self.get_json(STATES_PATH, &[]).await
    }

    async fn vehicles(&self, state_id: i64) -> Result<Vec<VehicleTotal>, ParkError> {
        self.get_json(VEHICLES_PATH, &[("state_id", state_id.to_string())])
            .await
    }

    async fn population(&self, state_id: i64) -> Result<Vec<PopulationEstimate>, ParkError> {
        self.get_json(POPULATION_PATH, &[("state_id", state_id.to_string())])
            .await
    }
}

/// Decodes a response body for `endpoint`, mapping shape mismatches to [`ParseError`].
pub fn decode<T: DeserializeOwned>(endpoint: &'static str, body: &[u8]) -> Result<T, ParkError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!("Response did not match schema — endpoint={endpoint} error={e}");
        ParkError::Parse(ParseError {
            endpoint,
            message: e.to_string(),
        })
    })
}

fn default_description() -> String {
    NO_DESCRIPTION.to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn number_from<E: de::Error>(value: NumberOrText) -> Result<f64, E> {
    match value {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| E::custom(format!("expected a number, got {s:?}"))),
    }
}

// Nominatim-backed endpoints send coordinates as strings.
fn flexible_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let n = number_from(NumberOrText::deserialize(deserializer)?)?;
    if n.is_finite() {
        Ok(n)
    } else {
        Err(de::Error::custom("expected a finite number"))
    }
}

fn flexible_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let n = number_from(NumberOrText::deserialize(deserializer)?)?;
    if n.fract() == 0.0 && n.is_finite() {
        Ok(n as i64)
    } else {
        Err(de::Error::custom(format!("expected an integer, got {n}")))
    }
}

fn flexible_opt_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => {
            let n = number_from::<D::Error>(value)?;
            if n.fract() == 0.0 && n.is_finite() {
                Ok(Some(n as i64))
            } else {
                Err(de::Error::custom(format!("expected an integer, got {n}")))
            }
        }
    }
}

fn nullable_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn description_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(default_description))
}

fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

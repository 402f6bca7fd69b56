// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ParkFinder contributors

#![allow(dead_code)]

use chrono::{DateTime, Local, TimeZone};
use parkfinder_core::api::{
    ParkingBackend, ParkingBay, PlaceSuggestion, PopulationEstimate, PredictedStatus,
    PredictionRequest, PredictionResponse, PredictionResult, StateInfo, VehicleTotal,
};
use parkfinder_core::time::Clock;
use parkfinder_core::ParkError;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub fn flinders() -> PlaceSuggestion {
    PlaceSuggestion {
        name: "Flinders St".to_string(),
        lat: -37.818,
        lon: 144.967,
    }
}

pub fn bay(lat: f64, lon: f64, description: &str) -> ParkingBay {
    ParkingBay {
        kerbsideid: None,
        zone_number: Some(7345),
        lat,
        lon,
        description: description.to_string(),
        lastupdated: "2026-10-14T09:00:00+11:00".to_string(),
        restrictions: vec![],
    }
}

pub fn predicted(lat: f64, lon: f64, status: PredictedStatus, confidence: f64) -> PredictionResult {
    PredictionResult {
        latitude: lat,
        longitude: lon,
        zone_number: Some(12),
        description: "Little Collins St".to_string(),
        restrictions: vec![],
        proba_occupied: Some(1.0 - confidence),
        predicted_status: status,
        confidence: Some(confidence),
    }
}

/// 2026-10-14 09:07 local.
pub fn morning() -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 10, 14, 9, 7, 0).unwrap()
}

pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

#[derive(Default)]
pub(crate) struct Calls {
    searches: Vec<String>,
    realtime: Vec<(f64, f64)>,
    predictions: Vec<PredictionRequest>,
}

/// In-memory backend that records every call.
#[derive(Default)]
pub struct MockBackend {
    pub places: HashMap<String, Vec<PlaceSuggestion>>,
    pub search_delays: HashMap<String, Duration>,
    pub bays: Vec<ParkingBay>,
    pub prediction: Option<PredictionResponse>,
    pub states: Vec<StateInfo>,
    pub vehicles: Vec<VehicleTotal>,
    pub population: Vec<PopulationEstimate>,
    pub(crate) calls: Mutex<Calls>,
}

impl MockBackend {
    pub fn with_place(mut self, query: &str, places: Vec<PlaceSuggestion>) -> Self {
        self.places.insert(query.to_string(), places);
        self
    }

    pub fn searches(&self) -> Vec<String> {
        self.calls.lock().unwrap().searches.clone()
    }

    pub fn realtime_calls(&self) -> Vec<(f64, f64)> {
        self.calls.lock().unwrap().realtime.clone()
    }

    pub fn predictions(&self) -> Vec<PredictionRequest> {
        self.calls.lock().unwrap().predictions.clone()
    }
}

impl ParkingBackend for MockBackend {
    async fn search(&self, query: &str) -> Result<Vec<PlaceSuggestion>, ParkError> {
        self.calls.lock().unwrap().searches.push(query.to_string());
        if let Some(delay) = self.search_delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        Ok(self.places.get(query).cloned().unwrap_or_default())
    }

    async fn realtime(&self, lat: f64, lon: f64) -> Result<Vec<ParkingBay>, ParkError> {
        self.calls.lock().unwrap().realtime.push((lat, lon));
        Ok(self.bays.clone())
    }

    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse, ParkError> {
        self.calls.lock().unwrap().predictions.push(request.clone());
        self.prediction
            .clone()
            .ok_or_else(|| ParkError::Network("model offline".to_string()))
    }

    async fn states(&self) -> Result<Vec<StateInfo>, ParkError> {
        Ok(self.states.clone())
    }

    async fn vehicles(&self, _state_id: i64) -> Result<Vec<VehicleTotal>, ParkError> {
        Ok(self.vehicles.clone())
    }

    async fn population(&self, _state_id: i64) -> Result<Vec<PopulationEstimate>, ParkError> {
        Ok(self.population.clone())
    }
}

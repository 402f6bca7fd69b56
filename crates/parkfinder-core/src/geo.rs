// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ParkFinder contributors

use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Melbourne CBD, where every map starts.
pub const MELBOURNE_CBD: LatLon = LatLon::new(-37.8136, 144.9631);

pub const MY_LOCATION_LABEL: &str = "You are here";

/// The one location a session is working around.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedLocation {
    pub lat: f64,
    pub lon: f64,
    pub label: String,
}

impl SelectedLocation {
    pub fn new(lat: f64, lon: f64, label: impl Into<String>) -> Self {
        Self {
            lat,
            lon,
            label: label.into(),
        }
    }

    pub fn position(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location unavailable: {0}")]
    Unavailable(String),
}

/// One-shot device location lookup.
pub trait Geolocator: Send + Sync + 'static {
    fn locate(&self) -> impl Future<Output = Result<LatLon, GeoError>> + Send;
}

/// Reports a position fixed by configuration.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator(pub LatLon);

impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<LatLon, GeoError> {
        Ok(self.0)
    }
}

/// Used when no position source exists; behaves like a refused permission prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeniedGeolocator;

impl Geolocator for DeniedGeolocator {
    async fn locate(&self) -> Result<LatLon, GeoError> {
        Err(GeoError::PermissionDenied)
    }
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ParkFinder contributors

use crate::geo::{LatLon, SelectedLocation, MELBOURNE_CBD};
use crate::popup::Popup;
use log::debug;

// --- Slippy Map / Mercator Math ---
pub const TILE_SIZE: f64 = 256.0;
pub const MAX_ZOOM: f64 = 19.0;
pub const INITIAL_ZOOM: f64 = 13.0;
pub const SELECTION_ZOOM: f64 = 15.0;
pub const FIT_MAX_ZOOM: f64 = 17.0;
pub const FIT_PADDING: f64 = 40.0;
const MAX_LATITUDE: f64 = 85.0511;

pub fn lon_to_x(lon: f64, zoom: f64) -> f64 {
    ((lon + 180.0) / 360.0) * 2.0f64.powf(zoom) * TILE_SIZE
}

pub fn lat_to_y(lat: f64, zoom: f64) -> f64 {
    let lat_rad = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0
        * 2.0f64.powf(zoom)
        * TILE_SIZE
}

pub fn x_to_lon(x: f64, zoom: f64) -> f64 {
    (x / (TILE_SIZE * 2.0f64.powf(zoom))) * 360.0 - 180.0
}

pub fn y_to_lat(y: f64, zoom: f64) -> f64 {
    let n = std::f64::consts::PI - 2.0 * std::f64::consts::PI * y / (TILE_SIZE * 2.0f64.powf(zoom));
    (0.5 * (n.exp() - (-n).exp())).atan().to_degrees()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: LatLon,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            center: MELBOURNE_CBD,
            zoom: INITIAL_ZOOM,
            width,
            height,
        }
    }

    /// Screen position of `point` relative to the viewport's top-left corner.
    pub fn project(&self, point: LatLon) -> (f64, f64) {
        let scale = 2.0f64.powf(self.zoom);
        let cx = lon_to_x(self.center.lon, 0.0);
        let cy = lat_to_y(self.center.lat, 0.0);
        (
            self.width / 2.0 + (lon_to_x(point.lon, 0.0) - cx) * scale,
            self.height / 2.0 + (lat_to_y(point.lat, 0.0) - cy) * scale,
        )
    }

    pub fn contains(&self, point: LatLon) -> bool {
        let (x, y) = self.project(point);
        (0.0..=self.width).contains(&x) && (0.0..=self.height).contains(&y)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1024.0, 768.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerIcon {
    Available,
    Occupied,
    /// Realtime bays carry no flag; they are all free.
    Neutral,
}

impl MarkerIcon {
    pub fn from_availability(available: Option<bool>) -> Self {
        match available {
            Some(true) => MarkerIcon::Available,
            Some(false) => MarkerIcon::Occupied,
            None => MarkerIcon::Neutral,
        }
    }

    pub fn icon_url(self) -> &'static str {
        match self {
            MarkerIcon::Available | MarkerIcon::Neutral => {
                "https://maps.google.com/mapfiles/ms/icons/green-dot.png"
            }
            MarkerIcon::Occupied => "https://maps.google.com/mapfiles/ms/icons/red-dot.png",
        }
    }
}

/// One result to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerItem {
    pub position: LatLon,
    pub popup: Popup,
    pub available: Option<bool>,
}

impl MarkerItem {
    pub fn new(position: LatLon, popup: Popup) -> Self {
        let available = popup.availability();
        Self {
            position,
            popup,
            available,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: LatLon,
    pub icon: MarkerIcon,
    pub popup: Popup,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayLayer {
    markers: Vec<Marker>,
}

impl OverlayLayer {
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    fn clear(&mut self) {
        self.markers.clear();
    }

    fn add(&mut self, marker: Marker) {
        self.markers.push(marker);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserMarker {
    pub position: LatLon,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadingPopup {
    pub position: LatLon,
    pub text: String,
}

/// Map model: viewport, user location marker and the single overlay layer.
#[derive(Debug, Clone, Default)]
pub struct MapAnnotator {
    viewport: Viewport,
    overlay: OverlayLayer,
    user_marker: Option<UserMarker>,
    loading: Option<LoadingPopup>,
}

impl MapAnnotator {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            overlay: OverlayLayer::default(),
            user_marker: None,
            loading: None,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn overlay(&self) -> &OverlayLayer {
        &self.overlay
    }

    pub fn user_marker(&self) -> Option<&UserMarker> {
        self.user_marker.as_ref()
    }

    pub fn loading(&self) -> Option<&LoadingPopup> {
        self.loading.as_ref()
    }

    pub fn set_view(&mut self, lat: f64, lon: f64, zoom: f64) {
        self.viewport.center = LatLon::new(lat, lon);
        self.viewport.zoom = zoom.clamp(0.0, MAX_ZOOM);
    }

    /// Replaces the overlay with `items`. Nothing from a previous call survives.
    pub fn annotate(&mut self, items: Vec<MarkerItem>) -> usize {
        self.overlay.clear();
        for item in items {
            self.overlay.add(Marker {
                position: item.position,
                icon: MarkerIcon::from_availability(item.available),
                popup: item.popup,
            });
        }
        debug!("Overlay annotated — markers={}", self.overlay.len());
        self.overlay.len()
    }

    pub fn clear_overlay(&mut self) {
        self.overlay.clear();
    }

    /// Moves the user marker to `location` and centres on it.
    pub fn show_user_location(&mut self, location: &SelectedLocation) {
        self.user_marker = Some(UserMarker {
            position: location.position(),
            label: location.label.clone(),
        });
        self.set_view(location.lat, location.lon, SELECTION_ZOOM);
    }

    pub fn remove_user_marker(&mut self) {
        self.user_marker = None;
    }

    pub fn show_loading(&mut self, position: LatLon, text: &str) {
        self.loading = Some(LoadingPopup {
            position,
            text: text.to_string(),
        });
    }

    pub fn close_loading(&mut self) {
        self.loading = None;
    }

    /// Fits the view around the user marker and `points`.
    ///
    /// With no points the view stays on the user marker at selection zoom;
    /// the caller reports the empty result.
    pub fn fit_to_bounds(&mut self, points: &[LatLon]) {
        let anchor = self.user_marker.as_ref().map(|m| m.position);

        if points.is_empty() {
            if let Some(anchor) = anchor {
                self.set_view(anchor.lat, anchor.lon, SELECTION_ZOOM);
            }
            return;
        }

        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for point in anchor.iter().chain(points.iter()) {
            let x = lon_to_x(point.lon, 0.0);
            let y = lat_to_y(point.lat, 0.0);
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }

        let usable_w = (self.viewport.width - 2.0 * FIT_PADDING).max(1.0);
        let usable_h = (self.viewport.height - 2.0 * FIT_PADDING).max(1.0);
        let span_x = max_x - min_x;
        let span_y = max_y - min_y;

        let zoom_x = if span_x > 0.0 {
            (usable_w / span_x).log2()
        } else {
            f64::INFINITY
        };
        let zoom_y = if span_y > 0.0 {
            (usable_h / span_y).log2()
        } else {
            f64::INFINITY
        };
        let zoom = zoom_x.min(zoom_y).floor().clamp(0.0, FIT_MAX_ZOOM);

        let center = LatLon::new(
            y_to_lat((min_y + max_y) / 2.0, 0.0),
            x_to_lon((min_x + max_x) / 2.0, 0.0),
        );
        debug!(
            "Fit to bounds — points={} center=({:.5}, {:.5}) zoom={}",
            points.len() + anchor.iter().count(),
            center.lat,
            center.lon,
            zoom
        );
        self.set_view(center.lat, center.lon, zoom);
    }
}

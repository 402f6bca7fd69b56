// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ParkFinder contributors

//! Predicted availability: pick a place, pick a future time, view the model's
//! verdict for nearby bays.
//!
//! ```text
//! Idle ─selection─▶ LocationSelected ─picker opens─▶ TimePending
//!   │                                                  │   ▲
//!   └─"My Location"─▶ LocationPending ─located─▶ ...   │   │ failure
//!                                                      ▼   │
//!                              Annotated ◀─response── Predicting
//! ```
//!
//! `Clear` returns to `Idle` from any state.

use super::{
    location_for_place, route_search, Command, Controller, Located, LocationLookup, Message,
    Notice, Routed, UiEffect,
};
use crate::api::{PredictionRequest, PredictionResponse};
use crate::geo::SelectedLocation;
use crate::map::{MapAnnotator, MarkerItem, Viewport};
use crate::popup::Popup;
use crate::search::{DebouncedLocationSearch, RequestSeq, SearchOptions, Selection, SeqCounter};
use crate::time::{round_to_next_slot, to_datetime_iso, validate_future, Clock, SystemClock};
use crate::ParkError;
use chrono::{DateTime, Local};
use log::{debug, info, warn};
use std::sync::Arc;

pub const PREDICTING: &str = "Predicting availability...";
pub const NO_CANDIDATES_NEARBY: &str = "No nearby candidates found within 1 km.";
pub const PREDICTION_FAILED: &str = "Failed to get prediction. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionState {
    Idle,
    LocationPending,
    LocationSelected,
    TimePending,
    Predicting,
    Annotated,
}

impl PredictionState {
    pub fn as_str(self) -> &'static str {
        match self {
            PredictionState::Idle => "idle",
            PredictionState::LocationPending => "locating",
            PredictionState::LocationSelected => "location selected",
            PredictionState::TimePending => "awaiting time",
            PredictionState::Predicting => "predicting",
            PredictionState::Annotated => "annotated",
        }
    }
}

pub struct PredictionSession {
    search: DebouncedLocationSearch,
    map: MapAnnotator,
    state: PredictionState,
    location: Option<SelectedLocation>,
    time_control_enabled: bool,
    committed: Option<DateTime<Local>>,
    requests: SeqCounter,
    pending: Option<RequestSeq>,
    lookup: LocationLookup,
    clock: Arc<dyn Clock>,
}

impl PredictionSession {
    pub fn new(options: SearchOptions, viewport: Viewport) -> Self {
        Self::with_clock(options, viewport, Arc::new(SystemClock))
    }

    pub fn with_clock(options: SearchOptions, viewport: Viewport, clock: Arc<dyn Clock>) -> Self {
        Self {
            search: DebouncedLocationSearch::new(options),
            map: MapAnnotator::new(viewport),
            state: PredictionState::Idle,
            location: None,
            time_control_enabled: false,
            committed: None,
            requests: SeqCounter::default(),
            pending: None,
            lookup: LocationLookup::default(),
            clock,
        }
    }

    pub fn state(&self) -> PredictionState {
        self.state
    }

    pub fn location(&self) -> Option<&SelectedLocation> {
        self.location.as_ref()
    }

    pub fn time_control_enabled(&self) -> bool {
        self.time_control_enabled
    }

    /// Last accepted prediction time.
    pub fn committed_time(&self) -> Option<DateTime<Local>> {
        self.committed
    }

    fn select_location(&mut self, location: SelectedLocation) -> Vec<Command> {
        info!(
            "Prediction location selected — label={} lat={} lon={}",
            location.label, location.lat, location.lon
        );
        // Any outstanding prediction or lookup belongs to the old location
        self.pending = None;
        self.lookup.cancel();
        self.map.close_loading();
        self.map.clear_overlay();
        self.map.show_user_location(&location);

        self.location = Some(location);
        self.committed = None;
        self.time_control_enabled = true;
        self.state = PredictionState::LocationSelected;

        vec![Command::Ui(UiEffect::OpenTimePicker {
            suggested: round_to_next_slot(self.clock.now()),
        })]
    }

    fn commit_time(&mut self, at: DateTime<Local>) -> Vec<Command> {
        let Some(location) = self.location.clone() else {
            debug!("Time committed without a location; ignoring");
            return Vec::new();
        };
        if !self.time_control_enabled {
            return Vec::new();
        }

        if let Err(e) = validate_future(at, self.clock.now()) {
            info!("Rejected prediction time — at={}", to_datetime_iso(&at));
            self.state = PredictionState::TimePending;
            return vec![Notice::warning(e.to_string()).into()];
        }

        self.map.clear_overlay();
        self.map.show_loading(location.position(), PREDICTING);

        let seq = self.requests.advance();
        self.pending = Some(seq);
        self.committed = Some(at);
        self.state = PredictionState::Predicting;

        vec![Command::Predict {
            seq,
            request: PredictionRequest {
                lat: location.lat,
                lon: location.lon,
                datetime_iso: to_datetime_iso(&at),
            },
        }]
    }

    fn on_prediction(
        &mut self,
        seq: RequestSeq,
        result: Result<PredictionResponse, ParkError>,
    ) -> Vec<Command> {
        if self.pending != Some(seq) {
            debug!("Dropping stale prediction response — seq={:?}", seq);
            return Vec::new();
        }
        self.pending = None;
        self.map.close_loading();

        match result {
            Ok(response) if response.results.is_empty() => {
                self.state = PredictionState::Annotated;
                self.map.annotate(Vec::new());
                self.map.fit_to_bounds(&[]);
                vec![Notice::info(NO_CANDIDATES_NEARBY).into()]
            }
            Ok(response) => {
                let points: Vec<_> = response.results.iter().map(|r| r.position()).collect();
                let items = response
                    .results
                    .iter()
                    .map(|r| MarkerItem::new(r.position(), Popup::for_prediction(r)))
                    .collect();
                let drawn = self.map.annotate(items);
                self.map.fit_to_bounds(&points);
                self.state = PredictionState::Annotated;
                info!("Prediction annotated — markers={drawn}");
                Vec::new()
            }
            Err(e) => {
                warn!("Predict error: {e}");
                self.state = PredictionState::TimePending;
                vec![Notice::error(PREDICTION_FAILED).into()]
            }
        }
    }

    fn clear(&mut self) -> Vec<Command> {
        self.search.clear();
        self.location = None;
        self.committed = None;
        self.pending = None;
        self.lookup.cancel();
        self.time_control_enabled = false;
        self.map.close_loading();
        self.map.clear_overlay();
        self.map.remove_user_marker();
        self.state = PredictionState::Idle;
        vec![Command::CancelDebounce]
    }
}

impl Default for PredictionSession {
    fn default() -> Self {
        Self::new(
            SearchOptions {
                enter_on_empty_selects_my_location: true,
                ..SearchOptions::default()
            },
            Viewport::default(),
        )
    }
}

impl Controller for PredictionSession {
    fn update(&mut self, message: Message) -> Vec<Command> {
        let message = match route_search(&mut self.search, message) {
            Routed::Handled(commands) => return commands,
            Routed::Selected(Selection::MyLocation) => {
                self.pending = None;
                self.map.close_loading();
                self.state = PredictionState::LocationPending;
                return self.lookup.begin();
            }
            Routed::Selected(Selection::Place(place)) => {
                return self.select_location(location_for_place(&place));
            }
            Routed::Other(message) => message,
        };

        match message {
            Message::UseLocation(location) => self.select_location(location),
            Message::Located(result) => match self.lookup.resolve(result) {
                Located::Ignored => Vec::new(),
                Located::Found(location) => self.select_location(location),
                Located::Failed(commands) => {
                    self.state = if self.location.is_some() {
                        PredictionState::TimePending
                    } else {
                        PredictionState::Idle
                    };
                    commands
                }
            },
            Message::TimePickerOpened => {
                if self.state == PredictionState::LocationSelected {
                    self.state = PredictionState::TimePending;
                }
                Vec::new()
            }
            Message::TimeCommitted(at) => self.commit_time(at),
            Message::PredictionLoaded(seq, result) => self.on_prediction(seq, result),
            Message::Clear => self.clear(),
            other => {
                debug!("Prediction session ignores {:?}", other);
                Vec::new()
            }
        }
    }

    fn search(&self) -> &DebouncedLocationSearch {
        &self.search
    }

    fn map(&self) -> &MapAnnotator {
        &self.map
    }

    fn location(&self) -> Option<&SelectedLocation> {
        self.location.as_ref()
    }

    fn status(&self) -> &'static str {
        self.state.as_str()
    }
}

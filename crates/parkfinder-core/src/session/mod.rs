// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ParkFinder contributors

//! Page controllers.
//!
//! A session owns its search field, map model and flow state. It is driven
//! purely by [`Message`]s and answers with [`Command`]s for the runtime to
//! carry out; completions come back as further messages.

pub mod prediction;
pub mod realtime;

use crate::api::{ParkingBay, PlaceSuggestion, PredictionRequest, PredictionResponse};
use crate::geo::{GeoError, LatLon, SelectedLocation, MY_LOCATION_LABEL};
use crate::search::{
    DebouncedLocationSearch, InputOutcome, RequestSeq, SearchRequest, Selection, TimerTicket,
};
use crate::{ParkError, ValidationError};
use chrono::{DateTime, Local};
use log::{debug, warn};
use std::time::Duration;

pub use prediction::{PredictionSession, PredictionState};
pub use realtime::{RealtimeSession, RealtimeState};

#[derive(Debug)]
pub enum Message {
    /// The search field now holds this text.
    Input(String),
    /// Enter pressed in the search field.
    Submit,
    DebounceElapsed(TimerTicket),
    SearchCompleted(RequestSeq, Result<Vec<PlaceSuggestion>, ParkError>),
    /// A dropdown row was clicked.
    Pick(usize),
    /// Coordinates chosen directly, without the dropdown.
    UseLocation(SelectedLocation),
    Located(Result<LatLon, GeoError>),
    RealtimeLoaded(RequestSeq, Result<Vec<ParkingBay>, ParkError>),
    /// The date/time control became interactive.
    TimePickerOpened,
    TimeCommitted(DateTime<Local>),
    PredictionLoaded(RequestSeq, Result<PredictionResponse, ParkError>),
    Clear,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ArmDebounce { ticket: TimerTicket, delay: Duration },
    CancelDebounce,
    Search(SearchRequest),
    Locate,
    FetchRealtime { seq: RequestSeq, lat: f64, lon: f64 },
    Predict { seq: RequestSeq, request: PredictionRequest },
    Ui(UiEffect),
}

/// Effects only a front-end can carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEffect {
    Notice(Notice),
    OpenTimePicker { suggested: DateTime<Local> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Non-blocking message for the user. Never ends the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

impl From<Notice> for Command {
    fn from(notice: Notice) -> Self {
        Command::Ui(UiEffect::Notice(notice))
    }
}

pub trait Controller {
    fn update(&mut self, message: Message) -> Vec<Command>;
    fn search(&self) -> &DebouncedLocationSearch;
    fn map(&self) -> &crate::map::MapAnnotator;
    fn location(&self) -> Option<&SelectedLocation>;
    /// Flow state name for status lines.
    fn status(&self) -> &'static str;
}

/// Outcome of offering a message to the shared search field.
pub(crate) enum Routed {
    Handled(Vec<Command>),
    Selected(Selection),
    Other(Message),
}

/// Handles the search-field messages both pages share.
pub(crate) fn route_search(search: &mut DebouncedLocationSearch, message: Message) -> Routed {
    match message {
        Message::Input(text) => match search.on_input(&text) {
            InputOutcome::Reset => Routed::Handled(vec![Command::CancelDebounce]),
            InputOutcome::Armed(ticket) => Routed::Handled(vec![Command::ArmDebounce {
                ticket,
                delay: search.options().debounce,
            }]),
        },
        Message::DebounceElapsed(ticket) => Routed::Handled(
            search
                .on_timer(ticket)
                .map(Command::Search)
                .into_iter()
                .collect(),
        ),
        Message::SearchCompleted(seq, result) => {
            search.on_results(seq, result);
            Routed::Handled(Vec::new())
        }
        Message::Pick(index) => match search.select(index) {
            Some(selection) => Routed::Selected(selection),
            None => Routed::Handled(Vec::new()),
        },
        Message::Submit => match search.submit() {
            Some(selection) => Routed::Selected(selection),
            None => Routed::Handled(Vec::new()),
        },
        other => Routed::Other(other),
    }
}

pub(crate) fn location_for_place(place: &PlaceSuggestion) -> SelectedLocation {
    SelectedLocation::new(place.lat, place.lon, place.name.clone())
}

/// Outcome of a geolocation result offered to a [`LocationLookup`].
pub(crate) enum Located {
    /// No lookup was outstanding.
    Ignored,
    Found(SelectedLocation),
    Failed(Vec<Command>),
}

/// The "My Location" lookup a page is waiting on.
///
/// Independent of the flow state: responses for an earlier location leave it
/// untouched.
#[derive(Debug, Default)]
pub(crate) struct LocationLookup {
    pending: bool,
}

impl LocationLookup {
    pub(crate) fn begin(&mut self) -> Vec<Command> {
        self.pending = true;
        vec![Command::Locate]
    }

    pub(crate) fn cancel(&mut self) {
        self.pending = false;
    }

    pub(crate) fn resolve(&mut self, result: Result<LatLon, GeoError>) -> Located {
        if !std::mem::take(&mut self.pending) {
            debug!("Ignoring geolocation result outside a pending lookup");
            return Located::Ignored;
        }
        match result {
            Ok(position) => Located::Found(SelectedLocation::new(
                position.lat,
                position.lon,
                MY_LOCATION_LABEL,
            )),
            Err(e) => {
                warn!("Geolocation error: {e}");
                let text = ValidationError::GeolocationDenied.to_string();
                Located::Failed(vec![Notice::warning(text).into()])
            }
        }
    }
}

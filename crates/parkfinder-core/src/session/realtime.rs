// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ParkFinder contributors

use super::{
    location_for_place, route_search, Command, Controller, Located, LocationLookup, Message,
    Notice, Routed,
};
use crate::api::ParkingBay;
use crate::geo::SelectedLocation;
use crate::map::{MapAnnotator, MarkerItem, Viewport};
use crate::popup::Popup;
use crate::search::{DebouncedLocationSearch, RequestSeq, SearchOptions, Selection, SeqCounter};
use crate::ParkError;
use log::{debug, info, warn};

pub const NO_BAYS_NEARBY: &str = "No available bays within 1 kilometre.";
pub const REALTIME_FAILED: &str = "Failed to load parking data. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealtimeState {
    Idle,
    LocationPending,
    Fetching,
    Showing,
}

impl RealtimeState {
    pub fn as_str(self) -> &'static str {
        match self {
            RealtimeState::Idle => "idle",
            RealtimeState::LocationPending => "locating",
            RealtimeState::Fetching => "fetching",
            RealtimeState::Showing => "showing",
        }
    }
}

/// Live bay availability around a searched location.
pub struct RealtimeSession {
    search: DebouncedLocationSearch,
    map: MapAnnotator,
    state: RealtimeState,
    location: Option<SelectedLocation>,
    requests: SeqCounter,
    pending: Option<RequestSeq>,
    lookup: LocationLookup,
}

impl RealtimeSession {
    pub fn new(options: SearchOptions, viewport: Viewport) -> Self {
        Self {
            search: DebouncedLocationSearch::new(options),
            map: MapAnnotator::new(viewport),
            state: RealtimeState::Idle,
            location: None,
            requests: SeqCounter::default(),
            pending: None,
            lookup: LocationLookup::default(),
        }
    }

    pub fn state(&self) -> RealtimeState {
        self.state
    }

    pub fn location(&self) -> Option<&SelectedLocation> {
        self.location.as_ref()
    }

    fn select_location(&mut self, location: SelectedLocation) -> Vec<Command> {
        info!(
            "Location selected — label={} lat={} lon={}",
            location.label, location.lat, location.lon
        );
        self.lookup.cancel();
        self.map.show_user_location(&location);
        self.map.clear_overlay();

        let seq = self.requests.advance();
        self.pending = Some(seq);
        self.state = RealtimeState::Fetching;
        let command = Command::FetchRealtime {
            seq,
            lat: location.lat,
            lon: location.lon,
        };
        self.location = Some(location);
        vec![command]
    }

    /// Where a page with no request outstanding rests.
    fn settled_state(&self) -> RealtimeState {
        if self.location.is_some() {
            RealtimeState::Showing
        } else {
            RealtimeState::Idle
        }
    }

    fn on_realtime(
        &mut self,
        seq: RequestSeq,
        result: Result<Vec<ParkingBay>, ParkError>,
    ) -> Vec<Command> {
        if self.pending != Some(seq) {
            debug!("Dropping stale realtime response — seq={:?}", seq);
            return Vec::new();
        }
        self.pending = None;
        self.state = RealtimeState::Showing;

        match result {
            Ok(bays) if bays.is_empty() => {
                self.map.fit_to_bounds(&[]);
                vec![Notice::info(NO_BAYS_NEARBY).into()]
            }
            Ok(bays) => {
                let points: Vec<_> = bays.iter().map(ParkingBay::position).collect();
                let items = bays
                    .iter()
                    .map(|bay| MarkerItem::new(bay.position(), Popup::for_bay(bay)))
                    .collect();
                self.map.annotate(items);
                self.map.fit_to_bounds(&points);
                Vec::new()
            }
            Err(e) => {
                warn!("Realtime fetch error: {e}");
                vec![Notice::error(REALTIME_FAILED).into()]
            }
        }
    }
}

impl Default for RealtimeSession {
    fn default() -> Self {
        Self::new(SearchOptions::default(), Viewport::default())
    }
}

impl Controller for RealtimeSession {
    fn update(&mut self, message: Message) -> Vec<Command> {
        let message = match route_search(&mut self.search, message) {
            Routed::Handled(commands) => return commands,
            Routed::Selected(Selection::MyLocation) => {
                // The fetch for the previous location no longer applies
                self.pending = None;
                self.state = RealtimeState::LocationPending;
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
                    self.state = self.settled_state();
                    commands
                }
            },
            Message::RealtimeLoaded(seq, result) => self.on_realtime(seq, result),
            // The realtime page only resets the search field; the last overlay stays
            Message::Clear => {
                self.search.clear();
                vec![Command::CancelDebounce]
            }
            other => {
                debug!("Realtime session ignores {:?}", other);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PlaceSuggestion;
    use crate::geo::{GeoError, LatLon};
    use crate::map::MarkerIcon;
    use crate::session::{NoticeLevel, UiEffect};

    fn bay(lat: f64, lon: f64) -> ParkingBay {
        ParkingBay {
            kerbsideid: None,
            zone_number: Some(1),
            lat,
            lon,
            description: "Bay".into(),
            lastupdated: String::new(),
            restrictions: vec![],
        }
    }

    fn fetch_seq(commands: &[Command]) -> RequestSeq {
        match commands {
            [Command::FetchRealtime { seq, .. }] => *seq,
            other => panic!("expected a realtime fetch, got {other:?}"),
        }
    }

    #[test]
    fn test_pick_place_fetches_and_annotates() {
        let mut session = RealtimeSession::default();
        session.update(Message::Input("Flinders".into()));
        let ticket = session.search().armed_timer().unwrap();
        let commands = session.update(Message::DebounceElapsed(ticket));
        let seq = match &commands[..] {
            [Command::Search(request)] => request.seq,
            other => panic!("expected a search, got {other:?}"),
        };
        session.update(Message::SearchCompleted(
            seq,
            Ok(vec![PlaceSuggestion {
                name: "Flinders St".into(),
                lat: -37.818,
                lon: 144.967,
            }]),
        ));

        let fetch = fetch_seq(&session.update(Message::Pick(1)));
        assert_eq!(session.state(), RealtimeState::Fetching);
        assert_eq!(session.location().unwrap().label, "Flinders St");

        session.update(Message::RealtimeLoaded(
            fetch,
            Ok(vec![bay(-37.817, 144.966), bay(-37.819, 144.968)]),
        ));
        assert_eq!(session.state(), RealtimeState::Showing);
        assert_eq!(session.map().overlay().len(), 2);
        assert!(session
            .map()
            .overlay()
            .markers()
            .iter()
            .all(|m| m.icon == MarkerIcon::Neutral));
    }

    #[test]
    fn test_empty_result_notice_keeps_centre() {
        let mut session = RealtimeSession::default();
        let seq = fetch_seq(&session.update(Message::UseLocation(SelectedLocation::new(
            -37.8, 144.9, "Pin",
        ))));
        let commands = session.update(Message::RealtimeLoaded(seq, Ok(vec![])));
        assert_eq!(commands, vec![Command::from(Notice::info(NO_BAYS_NEARBY))]);
        assert_eq!(session.map().viewport().center, LatLon::new(-37.8, 144.9));
        assert!(session.map().overlay().is_empty());
    }

    #[test]
    fn test_newer_selection_wins() {
        let mut session = RealtimeSession::default();
        let first = fetch_seq(
            &session.update(Message::UseLocation(SelectedLocation::new(-37.8, 144.9, "A"))),
        );
        let second = fetch_seq(
            &session.update(Message::UseLocation(SelectedLocation::new(-37.7, 145.0, "B"))),
        );

        session.update(Message::RealtimeLoaded(first, Ok(vec![bay(-37.8, 144.9)])));
        assert!(session.map().overlay().is_empty());
        assert_eq!(session.state(), RealtimeState::Fetching);

        session.update(Message::RealtimeLoaded(second, Ok(vec![bay(-37.7, 145.0)])));
        assert_eq!(session.map().overlay().len(), 1);
    }

    #[test]
    fn test_failure_is_a_notice() {
        let mut session = RealtimeSession::default();
        let seq = fetch_seq(
            &session.update(Message::UseLocation(SelectedLocation::new(-37.8, 144.9, "A"))),
        );
        let commands = session.update(Message::RealtimeLoaded(
            seq,
            Err(ParkError::Network("connection refused".into())),
        ));
        match &commands[..] {
            [Command::Ui(UiEffect::Notice(notice))] => {
                assert_eq!(notice.level, NoticeLevel::Error);
                assert_eq!(notice.text, REALTIME_FAILED);
            }
            other => panic!("unexpected commands {other:?}"),
        }
    }

    #[test]
    fn test_geolocation_denied() {
        let mut session = RealtimeSession::default();
        assert_eq!(session.update(Message::Pick(0)), vec![Command::Locate]);
        assert_eq!(session.state(), RealtimeState::LocationPending);

        let commands = session.update(Message::Located(Err(GeoError::PermissionDenied)));
        assert_eq!(
            commands,
            vec![Command::from(Notice::warning(
                "Unable to access your location."
            ))]
        );
        assert_eq!(session.state(), RealtimeState::Idle);
    }

    #[test]
    fn test_my_location_survives_fetch_for_old_place() {
        let mut session = RealtimeSession::default();
        let old = fetch_seq(&session.update(Message::UseLocation(SelectedLocation::new(
            -37.818, 144.967, "Flinders St",
        ))));
        assert_eq!(session.update(Message::Pick(0)), vec![Command::Locate]);

        assert!(session
            .update(Message::RealtimeLoaded(old, Ok(vec![bay(-37.818, 144.967)])))
            .is_empty());
        assert_eq!(session.state(), RealtimeState::LocationPending);
        assert!(session.map().overlay().is_empty());

        let here = fetch_seq(&session.update(Message::Located(Ok(LatLon::new(-37.80, 144.95)))));
        assert_eq!(session.state(), RealtimeState::Fetching);
        assert_eq!(session.location().unwrap().label, "You are here");

        session.update(Message::RealtimeLoaded(here, Ok(vec![bay(-37.801, 144.951)])));
        assert_eq!(session.state(), RealtimeState::Showing);
        assert_eq!(session.map().overlay().len(), 1);
    }

    #[test]
    fn test_place_picked_during_lookup_wins() {
        let mut session = RealtimeSession::default();
        assert_eq!(session.update(Message::Pick(0)), vec![Command::Locate]);
        fetch_seq(&session.update(Message::UseLocation(SelectedLocation::new(
            -37.818, 144.967, "Flinders St",
        ))));

        assert!(session
            .update(Message::Located(Ok(LatLon::new(-37.80, 144.95))))
            .is_empty());
        assert_eq!(session.location().unwrap().label, "Flinders St");
    }
}

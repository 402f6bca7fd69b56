// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ParkFinder contributors

//! Search field and suggestion dropdown.
//!
//! [`DebouncedLocationSearch`] never touches a timer or the network itself.
//! It hands out a [`TimerTicket`] when a debounce should be armed and a
//! [`SearchRequest`] when a query should be sent; the caller reports back
//! with `on_timer` / `on_results`. Only the most recently armed ticket and
//! the most recently issued request sequence are honoured, so a late timer or
//! an out-of-order response can never overwrite newer dropdown state.

use crate::api::PlaceSuggestion;
use crate::ParkError;
use log::{debug, warn};
use std::time::Duration;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);
pub const MY_LOCATION_ROW: &str = "\u{1F4CD} My Location";
pub const LOADING_ROW: &str = "Loading...";
pub const SEARCH_FAILED_ROW: &str = "Failed to fetch suggestions";

#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionRow {
    MyLocation,
    Loading,
    Place(PlaceSuggestion),
    Error(String),
}

impl SuggestionRow {
    pub fn label(&self) -> &str {
        match self {
            SuggestionRow::MyLocation => MY_LOCATION_ROW,
            SuggestionRow::Loading => LOADING_ROW,
            SuggestionRow::Place(place) => &place.name,
            SuggestionRow::Error(message) => message,
        }
    }

    pub fn is_selectable(&self) -> bool {
        matches!(self, SuggestionRow::MyLocation | SuggestionRow::Place(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerTicket(u64);

/// Sequence number of a dispatched request. Shared by every request kind
/// that needs "latest wins" handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestSeq(pub u64);

#[derive(Debug, Clone, Default)]
pub struct SeqCounter {
    next: u64,
}

impl SeqCounter {
    pub fn advance(&mut self) -> RequestSeq {
        self.next += 1;
        RequestSeq(self.next)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub seq: RequestSeq,
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Field is empty; any armed timer is void.
    Reset,
    /// A new debounce timer should be armed for this ticket.
    Armed(TimerTicket),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    MyLocation,
    Place(PlaceSuggestion),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub debounce: Duration,
    /// Submitting an empty field picks "My Location".
    pub enter_on_empty_selects_my_location: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            enter_on_empty_selects_my_location: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DebouncedLocationSearch {
    options: SearchOptions,
    text: String,
    rows: Vec<SuggestionRow>,
    dropdown_open: bool,
    armed: Option<TimerTicket>,
    next_ticket: u64,
    requests: SeqCounter,
    latest: Option<RequestSeq>,
}

impl Default for DebouncedLocationSearch {
    fn default() -> Self {
        Self::new(SearchOptions::default())
    }
}

impl DebouncedLocationSearch {
    pub fn new(options: SearchOptions) -> Self {
        Self {
            options,
            text: String::new(),
            rows: vec![SuggestionRow::MyLocation],
            dropdown_open: true,
            armed: None,
            next_ticket: 0,
            requests: SeqCounter::default(),
            latest: None,
        }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn rows(&self) -> &[SuggestionRow] {
        &self.rows
    }

    pub fn is_open(&self) -> bool {
        self.dropdown_open
    }

    pub fn is_loading(&self) -> bool {
        self.rows.contains(&SuggestionRow::Loading)
    }

    pub fn armed_timer(&self) -> Option<TimerTicket> {
        self.armed
    }

    /// Handles an edit of the field. A keystroke supersedes both the armed
    /// timer and any request already in flight.
    pub fn on_input(&mut self, text: &str) -> InputOutcome {
        self.text = text.to_string();
        self.armed = None;
        self.latest = None;
        self.dropdown_open = true;

        if text.trim().is_empty() {
            self.rows = vec![SuggestionRow::MyLocation];
            return InputOutcome::Reset;
        }

        self.rows = vec![SuggestionRow::MyLocation, SuggestionRow::Loading];
        self.next_ticket += 1;
        let ticket = TimerTicket(self.next_ticket);
        self.armed = Some(ticket);
        InputOutcome::Armed(ticket)
    }

    /// The debounce for `ticket` elapsed. Returns the query to send, or
    /// `None` when the ticket was superseded.
    pub fn on_timer(&mut self, ticket: TimerTicket) -> Option<SearchRequest> {
        if self.armed != Some(ticket) {
            debug!("Ignoring superseded debounce timer — ticket={:?}", ticket);
            return None;
        }
        self.armed = None;

        let seq = self.requests.advance();
        self.latest = Some(seq);
        Some(SearchRequest {
            seq,
            query: self.text.trim().to_string(),
        })
    }

    /// Applies a search response. Returns `false` when the response is stale
    /// and was dropped.
    pub fn on_results(
        &mut self,
        seq: RequestSeq,
        result: Result<Vec<PlaceSuggestion>, ParkError>,
    ) -> bool {
        if self.latest != Some(seq) {
            debug!("Dropping stale search response — seq={:?}", seq);
            return false;
        }
        self.latest = None;

        match result {
            Ok(places) => {
                debug!("Search results applied — seq={:?} count={}", seq, places.len());
                self.rows = std::iter::once(SuggestionRow::MyLocation)
                    .chain(places.into_iter().map(SuggestionRow::Place))
                    .collect();
            }
            Err(e) => {
                warn!("Search error: {e}");
                self.rows = vec![SuggestionRow::Error(SEARCH_FAILED_ROW.to_string())];
            }
        }
        self.dropdown_open = true;
        true
    }

    /// Picks a dropdown row. The row's text replaces the field content.
    pub fn select(&mut self, index: usize) -> Option<Selection> {
        let row = self.rows.get(index)?.clone();
        let selection = match &row {
            SuggestionRow::MyLocation => Selection::MyLocation,
            SuggestionRow::Place(place) => Selection::Place(place.clone()),
            SuggestionRow::Loading | SuggestionRow::Error(_) => return None,
        };

        self.text = row.label().to_string();
        self.dropdown_open = false;
        Some(selection)
    }

    /// Enter pressed in the field.
    pub fn submit(&mut self) -> Option<Selection> {
        if !self.options.enter_on_empty_selects_my_location || !self.text.trim().is_empty() {
            return None;
        }
        let index = self
            .rows
            .iter()
            .position(|row| *row == SuggestionRow::MyLocation)?;
        self.select(index)
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.armed = None;
        self.latest = None;
        self.rows = vec![SuggestionRow::MyLocation];
        self.dropdown_open = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flinders() -> PlaceSuggestion {
        PlaceSuggestion {
            name: "Flinders St".to_string(),
            lat: -37.818,
            lon: 144.967,
        }
    }

    fn armed(outcome: InputOutcome) -> TimerTicket {
        match outcome {
            InputOutcome::Armed(ticket) => ticket,
            InputOutcome::Reset => panic!("expected an armed timer"),
        }
    }

    #[test]
    fn test_starts_with_my_location() {
        let search = DebouncedLocationSearch::default();
        assert_eq!(search.rows(), &[SuggestionRow::MyLocation]);
        assert!(search.is_open());
    }

    #[test]
    fn test_input_shows_loading_and_arms() {
        let mut search = DebouncedLocationSearch::default();
        let ticket = armed(search.on_input("Fli"));
        assert_eq!(
            search.rows(),
            &[SuggestionRow::MyLocation, SuggestionRow::Loading]
        );
        assert_eq!(search.armed_timer(), Some(ticket));
    }

    #[test]
    fn test_blank_input_resets() {
        let mut search = DebouncedLocationSearch::default();
        search.on_input("Fli");
        assert_eq!(search.on_input("   "), InputOutcome::Reset);
        assert_eq!(search.rows(), &[SuggestionRow::MyLocation]);
        assert_eq!(search.armed_timer(), None);
    }

    #[test]
    fn test_only_latest_ticket_fires() {
        let mut search = DebouncedLocationSearch::default();
        let first = armed(search.on_input("F"));
        let second = armed(search.on_input("Fl"));
        let last = armed(search.on_input("Flinders"));

        assert_eq!(search.on_timer(first), None);
        assert_eq!(search.on_timer(second), None);
        let request = search.on_timer(last).unwrap();
        assert_eq!(request.query, "Flinders");
        // A ticket fires once
        assert_eq!(search.on_timer(last), None);
    }

    #[test]
    fn test_results_keep_backend_order() {
        let mut search = DebouncedLocationSearch::default();
        let ticket = armed(search.on_input("Flinders"));
        let request = search.on_timer(ticket).unwrap();
        let other = PlaceSuggestion {
            name: "Flinders Lane".to_string(),
            lat: -37.816,
            lon: 144.966,
        };
        assert!(search.on_results(request.seq, Ok(vec![flinders(), other.clone()])));
        assert_eq!(
            search.rows(),
            &[
                SuggestionRow::MyLocation,
                SuggestionRow::Place(flinders()),
                SuggestionRow::Place(other)
            ]
        );
    }

    #[test]
    fn test_stale_response_dropped() {
        let mut search = DebouncedLocationSearch::default();
        let ticket = armed(search.on_input("Flin"));
        let old = search.on_timer(ticket).unwrap();

        // User keeps typing; the old response arrives while the new debounce is pending
        let ticket = armed(search.on_input("Flinders"));
        assert!(!search.on_results(old.seq, Ok(vec![flinders()])));
        assert!(search.is_loading());

        let new = search.on_timer(ticket).unwrap();
        assert!(new.seq > old.seq);
        assert!(search.on_results(new.seq, Ok(vec![])));
        assert_eq!(search.rows(), &[SuggestionRow::MyLocation]);
    }

    #[test]
    fn test_failure_shows_single_error_row() {
        let mut search = DebouncedLocationSearch::default();
        let ticket = armed(search.on_input("Flinders"));
        let request = search.on_timer(ticket).unwrap();
        search.on_results(request.seq, Err(ParkError::Network("offline".into())));
        assert_eq!(
            search.rows(),
            &[SuggestionRow::Error(SEARCH_FAILED_ROW.to_string())]
        );
        assert_eq!(search.select(0), None);
    }

    #[test]
    fn test_select_place_and_my_location() {
        let mut search = DebouncedLocationSearch::default();
        let ticket = armed(search.on_input("Flinders"));
        let request = search.on_timer(ticket).unwrap();
        search.on_results(request.seq, Ok(vec![flinders()]));

        assert_eq!(search.select(1), Some(Selection::Place(flinders())));
        assert_eq!(search.text(), "Flinders St");
        assert!(!search.is_open());
        assert_eq!(search.select(0), Some(Selection::MyLocation));
        assert_eq!(search.select(7), None);
    }

    #[test]
    fn test_loading_row_not_selectable() {
        let mut search = DebouncedLocationSearch::default();
        search.on_input("Flinders");
        assert_eq!(search.select(1), None);
    }

    #[test]
    fn test_enter_on_empty_is_opt_in() {
        let mut plain = DebouncedLocationSearch::default();
        assert_eq!(plain.submit(), None);

        let mut gated = DebouncedLocationSearch::new(SearchOptions {
            enter_on_empty_selects_my_location: true,
            ..SearchOptions::default()
        });
        assert_eq!(gated.submit(), Some(Selection::MyLocation));
        gated.on_input("Flin");
        assert_eq!(gated.submit(), None);
    }

    #[test]
    fn test_clear_voids_outstanding_work() {
        let mut search = DebouncedLocationSearch::default();
        let ticket = armed(search.on_input("Flinders"));
        let request = search.on_timer(ticket).unwrap();
        search.clear();
        assert!(!search.on_results(request.seq, Ok(vec![flinders()])));
        assert_eq!(search.rows(), &[SuggestionRow::MyLocation]);
        assert_eq!(search.text(), "");
    }
}

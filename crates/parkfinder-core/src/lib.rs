// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ParkFinder contributors

pub mod api;
pub mod config;
pub mod geo;
pub mod insights;
pub mod likelihood;
pub mod map;
pub mod popup;
pub mod restrictions;
pub mod runtime;
pub mod search;
pub mod session;
pub mod time;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParkError {
    #[error("Network failure: {0}")]
    Network(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("No results")]
    EmptyResult,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ParkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ParkError::Network(format!("request timed out: {err}"))
        } else {
            ParkError::Network(err.to_string())
        }
    }
}

/// A backend response that did not have the documented shape.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unexpected response from {endpoint}: {message}")]
pub struct ParseError {
    pub endpoint: &'static str,
    pub message: String,
}

/// User-supplied input that was rejected before anything was sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please choose a future date and time.")]
    DateTimeNotInFuture,
    #[error("Unable to access your location.")]
    GeolocationDenied,
    #[error("Select a location first.")]
    NoLocation,
    #[error("Unrecognised date and time {0:?}. Use YYYY-MM-DDTHH:MM.")]
    UnrecognisedDateTime(String),
    #[error("{0:?} does not exist in the local timezone.")]
    NonexistentLocalTime(String),
}

/// Platform config directory, e.g. `~/.config/parkfinder` on Linux.
pub fn get_config_root() -> PathBuf {
    directories::ProjectDirs::from("org", "parkfinder", "ParkFinder")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ParkFinder contributors

use crate::api::{ParkingBay, PredictedStatus, PredictionResult, Restriction};
use crate::geo::LatLon;
use crate::likelihood::Likelihood;
use crate::restrictions::{
    explain_restrictions, format_restriction_lines, render_explanation, RestrictionMatch,
};
use html_escape::encode_text;

const GOOGLE_MAPS_SEARCH: &str = "https://www.google.com/maps/search/";
pub const PREDICTION_NOTE: &str = "Prediction powered by our AI parking model";
const STATUS_DATE_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub enum PopupStatus {
    /// Currently unoccupied, as reported by the bay sensor.
    Realtime { status_date: String },
    Predicted {
        status: PredictedStatus,
        likelihood: Likelihood,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub maps_link: String,
    pub description: String,
    pub status: PopupStatus,
    pub restrictions: Vec<Restriction>,
    pub note: Option<&'static str>,
}

impl Popup {
    pub fn for_bay(bay: &ParkingBay) -> Self {
        let status_date = bay
            .last_updated()
            .map(|dt| dt.format(STATUS_DATE_FORMAT).to_string())
            .unwrap_or_else(|| bay.lastupdated.clone());

        Self {
            maps_link: google_maps_link(bay.position(), None),
            description: bay.description.clone(),
            status: PopupStatus::Realtime { status_date },
            restrictions: bay.restrictions.clone(),
            note: None,
        }
    }

    pub fn for_prediction(result: &PredictionResult) -> Self {
        Self {
            maps_link: google_maps_link(result.position(), None),
            description: result.description.clone(),
            status: PopupStatus::Predicted {
                status: result.predicted_status,
                likelihood: Likelihood::from_confidence(result.confidence),
            },
            restrictions: result.restrictions.clone(),
            note: Some(PREDICTION_NOTE),
        }
    }

    /// Marker colour hint: `None` when the popup carries no availability flag.
    pub fn availability(&self) -> Option<bool> {
        match &self.status {
            PopupStatus::Realtime { .. } => None,
            PopupStatus::Predicted { status, .. } => Some(status.is_available()),
        }
    }

    pub fn restriction_lines(&self) -> Vec<String> {
        format_restriction_lines(&self.restrictions)
    }

    /// What the info button next to "Restriction" explains.
    pub fn explain_codes(&self) -> Vec<RestrictionMatch> {
        explain_restrictions(&self.restrictions)
    }

    /// JSON array of the raw restriction displays, read back by the info
    /// button to explain the codes.
    pub fn code_payload(&self) -> String {
        let displays: Vec<&str> = self
            .restrictions
            .iter()
            .map(|r| r.restriction_display.as_str())
            .collect();
        serde_json::Value::from(displays).to_string()
    }

    pub fn to_text(&self) -> String {
        let mut lines = vec![
            format!("Open in Google Maps: {}", self.maps_link),
            format!("Description : {}", self.description),
        ];

        match &self.status {
            PopupStatus::Realtime { status_date } => {
                lines.push("Status : Available".to_string());
                lines.push(format!("Status date : {status_date}"));
            }
            PopupStatus::Predicted { status, likelihood } => {
                lines.push(format!("Predicted : {}", status.as_str()));
                lines.push(format!(
                    "How likely : {} ({})",
                    likelihood.star_glyphs(),
                    likelihood.tooltip()
                ));
            }
        }

        lines.push("Restriction".to_string());
        lines.extend(self.restriction_lines());
        if !self.restrictions.is_empty() {
            for explained in render_explanation(&self.explain_codes()) {
                lines.push(format!("  {explained}"));
            }
        }
        if let Some(note) = self.note {
            lines.push(note.to_string());
        }
        lines.join("\n")
    }

    pub fn to_html(&self) -> String {
        let mut html = String::from("<div class=\"popup\">");
        html.push_str(&format!(
            "<a class=\"gmaps-link\" href=\"{}\" target=\"_blank\" rel=\"noopener\">Open in Google Maps</a>",
            html_escape::encode_double_quoted_attribute(&self.maps_link)
        ));
        html.push_str(&format!(
            "<div><b>Description :</b> {}</div>",
            encode_text(&self.description)
        ));

        match &self.status {
            PopupStatus::Realtime { status_date } => {
                html.push_str("<div><b>Status :</b> <span class=\"text-success\">Available</span></div>");
                html.push_str(&format!(
                    "<div><b>Status date :</b> {}</div>",
                    encode_text(status_date)
                ));
            }
            PopupStatus::Predicted { status, likelihood } => {
                let class = if status.is_available() {
                    "text-success"
                } else {
                    "text-danger"
                };
                html.push_str(&format!(
                    "<div><b>Predicted :</b> <span class=\"{class}\">{}</span></div>",
                    status.as_str()
                ));
                html.push_str(&format!(
                    "<div><b>How likely :</b> <span class=\"stars stars-{}\" title=\"{}\">{}</span></div>",
                    likelihood.stars,
                    likelihood.tooltip(),
                    likelihood.star_glyphs()
                ));
            }
        }

        html.push_str("<div><b>Restriction</b>");
        if !self.restrictions.is_empty() {
            html.push_str(&format!(
                "<button class=\"info-restrict\" title=\"Explain codes\" data-codes=\"{}\">&#9432;</button>",
                html_escape::encode_double_quoted_attribute(&self.code_payload())
            ));
        }
        html.push_str("<br>");
        let lines: Vec<String> = self
            .restriction_lines()
            .iter()
            .map(|line| encode_text(line).into_owned())
            .collect();
        html.push_str(&lines.join("<br>"));
        html.push_str("</div>");

        if let Some(note) = self.note {
            html.push_str(&format!("<div class=\"prediction-note\">{note}</div>"));
        }
        html.push_str("</div>");
        html
    }
}

/// Cross-platform Google Maps search link; opens the app when installed.
pub fn google_maps_link(position: LatLon, label: Option<&str>) -> String {
    let coords = format!("{},{}", position.lat, position.lon);
    let query = match label {
        Some(label) if !label.is_empty() => format!("{coords} ({label})"),
        _ => coords,
    };

    let mut url = String::from(GOOGLE_MAPS_SEARCH);
    url.push('?');
    url.push_str(
        &url::form_urlencoded::Serializer::new(String::new())
            .append_pair("api", "1")
            .append_pair("query", &query)
            .append_pair("query_place_id", "")
            .finish(),
    );
    url
}

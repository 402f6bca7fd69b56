// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ParkFinder contributors

//! Vehicle ownership and population trends per state.

use crate::api::{ParkingBackend, PopulationEstimate, StateInfo, VehicleTotal};
use crate::ParkError;
use log::{debug, info};
use std::sync::Arc;

pub const DEFAULT_STATE_NAME: &str = "Victoria";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendPoint {
    pub year: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub points: Vec<TrendPoint>,
    pub suggested_min: f64,
    pub suggested_max: f64,
}

impl ChartSeries {
    fn new(
        title: &'static str,
        x_label: &'static str,
        y_label: &'static str,
        mut points: Vec<TrendPoint>,
    ) -> Self {
        if points.is_empty() {
            // Placeholder so the chart keeps its axes
            points.push(TrendPoint {
                year: 0,
                value: 0.0,
            });
        }

        let min = points.iter().map(|p| p.value).fold(f64::INFINITY, f64::min);
        let max = points
            .iter()
            .map(|p| p.value)
            .fold(f64::NEG_INFINITY, f64::max);

        Self {
            title,
            x_label,
            y_label,
            points,
            suggested_min: (min * 0.95).floor().max(0.0),
            suggested_max: (max * 1.05).ceil(),
        }
    }

    pub fn vehicles(rows: &[VehicleTotal]) -> Self {
        Self::new(
            "Car Ownership Trend",
            "Year",
            "Number of Vehicles",
            rows.iter()
                .map(|r| TrendPoint {
                    year: r.year,
                    value: r.total,
                })
                .collect(),
        )
    }

    pub fn population(rows: &[PopulationEstimate]) -> Self {
        Self::new(
            "Population Trend",
            "Year",
            "Population",
            rows.iter()
                .map(|r| TrendPoint {
                    year: r.year,
                    value: r.population,
                })
                .collect(),
        )
    }

    /// Category labels for the x axis.
    pub fn x_categories(&self) -> Vec<String> {
        self.points.iter().map(|p| p.year.to_string()).collect()
    }

    /// Bar rendering for terminals.
    pub fn render_text(&self, width: usize) -> String {
        let mut out = format!("{}\n{} / {}\n", self.title, self.x_label, self.y_label);
        let span = self.suggested_max.max(1.0);
        for point in &self.points {
            let filled = ((point.value / span) * width as f64).round().max(0.0) as usize;
            out.push_str(&format!(
                "{:>6} | {:<width$} {}\n",
                point.year,
                "#".repeat(filled.min(width)),
                format_thousands(point.value),
                width = width
            ));
        }
        out
    }
}

/// `5123456.0` → `5,123,456`.
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{}", rounded.abs() as u64);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Victoria when present, otherwise the first state listed.
pub fn default_state(states: &[StateInfo]) -> Option<&StateInfo> {
    states
        .iter()
        .find(|s| s.state_name.eq_ignore_ascii_case(DEFAULT_STATE_NAME))
        .or_else(|| states.first())
}

pub fn find_state<'a>(states: &'a [StateInfo], name: &str) -> Option<&'a StateInfo> {
    states
        .iter()
        .find(|s| s.state_name.eq_ignore_ascii_case(name.trim()))
}

pub struct InsightsDashboard<B> {
    backend: Arc<B>,
    states: Vec<StateInfo>,
}

impl<B: ParkingBackend> InsightsDashboard<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            states: Vec::new(),
        }
    }

    pub fn states(&self) -> &[StateInfo] {
        &self.states
    }

    /// Fails with [`ParkError::EmptyResult`] when the backend lists no states.
    pub async fn load_states(&mut self) -> Result<&[StateInfo], ParkError> {
        let states = self.backend.states().await?;
        if states.is_empty() {
            return Err(ParkError::EmptyResult);
        }
        self.states = states;
        info!("Loaded insight states — count={}", self.states.len());
        Ok(self.states.as_slice())
    }

    pub async fn vehicles(&self, state_id: i64) -> Result<ChartSeries, ParkError> {
        let rows = self.backend.vehicles(state_id).await?;
        debug!("Vehicle series — state_id={state_id} rows={}", rows.len());
        Ok(ChartSeries::vehicles(&rows))
    }

    pub async fn population(&self, state_id: i64) -> Result<ChartSeries, ParkError> {
        let rows = self.backend.population(state_id).await?;
        debug!("Population series — state_id={state_id} rows={}", rows.len());
        Ok(ChartSeries::population(&rows))
    }

    /// Both charts for one state, fetched concurrently.
    pub async fn both(&self, state_id: i64) -> Result<(ChartSeries, ChartSeries), ParkError> {
        futures::try_join!(self.vehicles(state_id), self.population(state_id))
    }
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ParkFinder contributors

use parkfinder_core::insights::ChartSeries;
use parkfinder_core::map::MarkerIcon;
use parkfinder_core::search::SuggestionRow;
use parkfinder_core::session::{Controller, Notice, NoticeLevel};
use parkfinder_core::time::{to_local_input, PICKER_MINUTE_INCREMENT};

const CHART_WIDTH: usize = 40;

pub fn print_notice(notice: &Notice) {
    let tag = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Error => "error",
    };
    eprintln!("[{tag}] {}", notice.text);
}

pub fn print_rows(rows: &[SuggestionRow]) {
    for (index, row) in rows.iter().enumerate() {
        if row.is_selectable() {
            println!("  {index}: {}", row.label());
        } else {
            println!("     {}", row.label());
        }
    }
}

pub fn print_overlay<C: Controller>(session: &C, html: bool) {
    let map = session.map();
    if let Some(user) = map.user_marker() {
        println!(
            "{} ({:.5}, {:.5})",
            user.label, user.position.lat, user.position.lon
        );
    }
    let view = map.viewport();
    println!(
        "View: {:.5}, {:.5} @ zoom {}",
        view.center.lat, view.center.lon, view.zoom
    );

    for (index, marker) in map.overlay().markers().iter().enumerate() {
        let tag = match marker.icon {
            MarkerIcon::Available => "available",
            MarkerIcon::Occupied => "occupied",
            MarkerIcon::Neutral => "free",
        };
        println!();
        println!("#{} [{tag}]", index + 1);
        if html {
            println!("{}", marker.popup.to_html());
            continue;
        }
        for line in marker.popup.to_text().lines() {
            println!("  {line}");
        }
    }
}

pub fn print_status<C: Controller>(session: &C) {
    let location = session
        .location()
        .map(|l| l.label.as_str())
        .unwrap_or("no location");
    println!(
        "-- {} | {} | {} marker(s)",
        session.status(),
        location,
        session.map().overlay().len()
    );
    if session.search().is_open() {
        print_rows(session.search().rows());
    }
}

pub fn print_suggested_time(suggested: &chrono::DateTime<chrono::Local>) {
    println!(
        "Pick a time in {PICKER_MINUTE_INCREMENT}-minute steps (suggested {})",
        to_local_input(suggested)
    );
}

pub fn print_series(series: &ChartSeries) {
    print!("{}", series.render_text(CHART_WIDTH));
}

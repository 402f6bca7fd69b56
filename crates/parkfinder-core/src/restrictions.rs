// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ParkFinder contributors

use crate::api::Restriction;
use regex::RegexSet;
use serde::Serialize;
use std::sync::OnceLock;

pub const NO_KNOWN_CODES: &str = "No known codes found in this restriction.";
pub const NO_RESTRICTIONS: &str = "No restrictions";

/// Parking signage codes and their plain-language meaning, in display order.
pub const RESTRICTION_CODES: [(&str, &str); 19] = [
    ("1P", "1-hour time limit"),
    ("2P", "2-hour time limit"),
    ("3P", "3-hour time limit"),
    ("4P", "4-hour time limit"),
    ("HP", "30-minute time limit"),
    ("QP", "15-minute time limit"),
    ("MP1P", "Metered parking - 1-hour time limit"),
    ("MP2P", "Metered parking - 2-hour time limit"),
    ("MP3P", "Metered parking - 3-hour time limit"),
    ("MPHP", "Metered parking - 4-hour time limit"),
    ("MPQP", "Metered parking - 30-minute time limit"),
    ("MP4P", "Metered parking - 15-minute time limit"),
    ("FP1P", "Free parking - 1-hour time limit"),
    ("FP2P", "Free parking - 2-hour time limit"),
    ("FP3P", "Free parking - 3-hour time limit"),
    ("FP4P", "Free parking - 4-hour time limit"),
    ("FPHP", "Free parking - 30-minute time limit"),
    ("FPQP", "Free parking - 15-minute time limit"),
    ("LZ30", "Loading zone - 30-minute limit"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RestrictionMatch {
    pub code: &'static str,
    pub description: &'static str,
}

static CODE_PATTERNS: OnceLock<RegexSet> = OnceLock::new();

fn code_patterns() -> &'static RegexSet {
    CODE_PATTERNS.get_or_init(|| {
        RegexSet::new(
            RESTRICTION_CODES
                .iter()
                .map(|(code, _)| format!(r"(?i)\b{}\b", regex::escape(code))),
        )
        .unwrap()
    })
}

/// Finds every known code that appears as a whole word in `text`.
///
/// Each code is reported at most once, in [`RESTRICTION_CODES`] order, so
/// `"MP1P"` never also reports `1P`.
pub fn find_restriction_matches(text: &str) -> Vec<RestrictionMatch> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    code_patterns()
        .matches(text)
        .into_iter()
        .map(|idx| {
            let (code, description) = RESTRICTION_CODES[idx];
            RestrictionMatch { code, description }
        })
        .collect()
}

/// Looks up the codes across all of a bay's restriction displays together.
pub fn explain_restrictions(restrictions: &[Restriction]) -> Vec<RestrictionMatch> {
    let joined = restrictions
        .iter()
        .map(|r| r.restriction_display.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    find_restriction_matches(&joined)
}

pub fn format_restriction_lines(restrictions: &[Restriction]) -> Vec<String> {
    if restrictions.is_empty() {
        return vec![NO_RESTRICTIONS.to_string()];
    }

    restrictions
        .iter()
        .enumerate()
        .map(|(idx, r)| {
            format!(
                "{}. {}, {} to {}, {}",
                idx + 1,
                r.restriction_days,
                r.time_restrictions_start,
                r.time_restrictions_finish,
                r.restriction_display
            )
        })
        .collect()
}

pub fn render_explanation(matches: &[RestrictionMatch]) -> Vec<String> {
    if matches.is_empty() {
        return vec![NO_KNOWN_CODES.to_string()];
    }
    matches
        .iter()
        .map(|m| format!("{} - {}", m.code, m.description))
        .collect()
}

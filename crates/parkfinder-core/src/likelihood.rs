// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ParkFinder contributors

pub const MAX_STARS: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Likelihood {
    pub probability: f64,
    pub stars: u8,
    pub label: &'static str,
}

impl Likelihood {
    /// Missing or non-finite confidence counts as 0.
    pub fn from_confidence(confidence: Option<f64>) -> Self {
        let probability = confidence
            .filter(|p| p.is_finite())
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);

        Self {
            probability,
            stars: stars_from_confidence(probability),
            label: likelihood_label(probability),
        }
    }

    pub fn percent(&self) -> u32 {
        (self.probability * 100.0).round() as u32
    }

    pub fn star_glyphs(&self) -> String {
        let full = "\u{2605}".repeat(self.stars as usize);
        let empty = "\u{2606}".repeat((MAX_STARS - self.stars) as usize);
        format!("{full}{empty}")
    }

    pub fn tooltip(&self) -> String {
        format!("{}% - {}", self.percent(), self.label)
    }
}

pub fn likelihood_label(p: f64) -> &'static str {
    if p >= 0.80 {
        "Most likely"
    } else if p >= 0.60 {
        "Likely"
    } else if p >= 0.40 {
        "Could go either way"
    } else if p >= 0.20 {
        "Less likely"
    } else {
        "Very unlikely"
    }
}

pub fn stars_from_confidence(p: f64) -> u8 {
    (p * 5.0).ceil().clamp(1.0, MAX_STARS as f64) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extremes() {
        let low = Likelihood::from_confidence(Some(0.0));
        assert_eq!(low.stars, 1);
        assert_eq!(low.label, "Very unlikely");

        let high = Likelihood::from_confidence(Some(1.0));
        assert_eq!(high.stars, 5);
        assert_eq!(high.label, "Most likely");
        assert_eq!(high.star_glyphs(), "★★★★★");
    }

    #[test]
    fn test_missing_confidence_is_zero() {
        assert_eq!(
            Likelihood::from_confidence(None),
            Likelihood::from_confidence(Some(0.0))
        );
        assert_eq!(Likelihood::from_confidence(Some(f64::NAN)).stars, 1);
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(likelihood_label(0.80), "Most likely");
        assert_eq!(likelihood_label(0.7999), "Likely");
        assert_eq!(likelihood_label(0.60), "Likely");
        assert_eq!(likelihood_label(0.40), "Could go either way");
        assert_eq!(likelihood_label(0.20), "Less likely");
        assert_eq!(likelihood_label(0.1999), "Very unlikely");
    }

    #[test]
    fn test_star_count_is_monotonic() {
        let mut previous = 0;
        for step in 0..=1000 {
            let stars = Likelihood::from_confidence(Some(step as f64 / 1000.0)).stars;
            assert!(stars >= previous, "stars dropped at step {step}");
            assert!((1..=5).contains(&stars));
            previous = stars;
        }
    }

    #[test]
    fn test_tooltip() {
        let l = Likelihood::from_confidence(Some(0.634));
        assert_eq!(l.stars, 4);
        assert_eq!(l.star_glyphs(), "★★★★☆");
        assert_eq!(l.tooltip(), "63% - Likely");
    }
}

//! Interpretation of slicing-engine console output.
//!
//! The engine reports filament length in meters and print time in minutes.
//! Mass comes from a fixed 1.75 mm filament cross-section and a small
//! per-material density table, independent of the material catalog.

use std::f64::consts::PI;

use once_cell::sync::Lazy;
use regex::Regex;
use shared::Estimate;

use crate::cost::{quote, PriceModel};

/// Filament diameter assumed for length-to-volume conversion, mm.
pub const FILAMENT_DIAMETER_MM: f64 = 1.75;

/// Density used for materials not in the slicer table, g/cm³.
pub const DEFAULT_SLICER_DENSITY: f64 = 1.24;

static FILAMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Filament used: ([0-9.]+)m").expect("valid regex"));
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Print time: ([0-9.]+)min").expect("valid regex"));

/// Raw figures extracted from engine output. Missing figures are zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SlicerReport {
    pub filament_meters: f64,
    pub print_minutes: f64,
}

impl SlicerReport {
    /// Extract both figures from `stdout`.
    pub fn parse(stdout: &str) -> Self {
        let filament_meters = capture_number(&FILAMENT_RE, stdout);
        let print_minutes = capture_number(&TIME_RE, stdout);
        if filament_meters == 0.0 || print_minutes == 0.0 {
            tracing::warn!(
                "Slicer output incomplete: filament={}m time={}min",
                filament_meters,
                print_minutes
            );
        }
        Self {
            filament_meters,
            print_minutes,
        }
    }
}

/// True when `stdout` carries at least one of the two figures. Output with
/// neither is not a slicing report at all.
pub fn has_report(stdout: &str) -> bool {
    FILAMENT_RE.is_match(stdout) || TIME_RE.is_match(stdout)
}

fn capture_number(re: &Regex, text: &str) -> f64 {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map_or(0.0, |m| leading_number(m.as_str()))
}

/// Longest numeric prefix of `s` (digits with at most one dot), else 0.
fn leading_number(s: &str) -> f64 {
    let mut end = 0;
    let mut seen_dot = false;
    for (i, ch) in s.char_indices() {
        match ch {
            '0'..='9' => end = i + 1,
            '.' if !seen_dot => {
                seen_dot = true;
                end = i + 1;
            }
            _ => break,
        }
    }
    s[..end].parse().unwrap_or(0.0)
}

/// Filament density for the slicer path, by case-insensitive name.
pub fn slicer_density(material: &str) -> f64 {
    match material.to_lowercase().as_str() {
        "petg" => 1.27,
        "abs" => 1.04,
        "asa" => 1.07,
        _ => DEFAULT_SLICER_DENSITY,
    }
}

/// Filament mass in grams for a length of 1.75 mm filament.
///
/// Keeps the historical `density / 1000` factor so results stay comparable
/// with earlier quotes.
pub fn filament_grams(meters: f64, density: f64) -> f64 {
    let area = PI * (FILAMENT_DIAMETER_MM / 2.0).powf(2.0);
    let volume_mm3 = meters * 1000.0 * area;
    (volume_mm3 / 1000.0) * (density / 1000.0)
}

/// Flat per-gram and per-hour rates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlicerPricing {
    pub cost_per_gram: f64,
    pub cost_per_hour: f64,
}

impl Default for SlicerPricing {
    fn default() -> Self {
        Self {
            cost_per_gram: 0.05,
            cost_per_hour: 0.20,
        }
    }
}

impl PriceModel for SlicerPricing {
    fn filament_cost(&self, grams: f64) -> f64 {
        grams * self.cost_per_gram
    }

    fn time_cost(&self, hours: f64) -> f64 {
        hours * self.cost_per_hour
    }
}

/// Turn engine output into an estimate for `material`.
pub fn interpret(stdout: &str, material: &str) -> Estimate {
    let report = SlicerReport::parse(stdout);
    let grams = filament_grams(report.filament_meters, slicer_density(material));
    let hours = report.print_minutes / 60.0;
    quote(&SlicerPricing::default(), grams, hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLE: &str = "\
[info] Loading model\n\
Print time: 120min\n\
Filament used: 2.500m\n\
[info] done\n";

    #[test]
    fn test_parse_report() {
        let r = SlicerReport::parse(SAMPLE);
        assert_eq!(r.filament_meters, 2.5);
        assert_eq!(r.print_minutes, 120.0);
    }

    #[test]
    fn test_missing_patterns_are_zero() {
        let r = SlicerReport::parse("nothing useful here");
        assert_eq!(r, SlicerReport::default());

        let r = SlicerReport::parse("Print time: 30min");
        assert_eq!(r.filament_meters, 0.0);
        assert_eq!(r.print_minutes, 30.0);
    }

    #[test]
    fn test_has_report() {
        assert!(has_report(SAMPLE));
        assert!(has_report("Print time: 30min"));
        assert!(!has_report("Segmentation fault"));
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("2.500"), 2.5);
        assert_eq!(leading_number("1.2.3"), 1.2);
        assert_eq!(leading_number("..."), 0.0);
        assert_eq!(leading_number(".5"), 0.5);
    }

    #[test]
    fn test_density_table() {
        assert_eq!(slicer_density("PETG"), 1.27);
        assert_eq!(slicer_density("abs"), 1.04);
        assert_eq!(slicer_density("Asa"), 1.07);
        assert_eq!(slicer_density("PLA+ Silk"), 1.24);
        assert_eq!(slicer_density("TPU"), 1.24);
    }

    #[test]
    fn test_petg_example() {
        let e = interpret(SAMPLE, "PETG");
        let expected = 2.500 * 1000.0 * PI * 0.875_f64.powi(2) / 1000.0 * 1.27 / 1000.0;
        assert_relative_eq!(e.filament_grams, expected, max_relative = 1e-12);
        assert_eq!(e.time_hours, 2.0);
        assert_relative_eq!(
            e.price,
            e.filament_grams * 0.05 + 2.0 * 0.20,
            max_relative = 1e-12
        );
        assert_eq!(e.to_response().time, "2.00");
        assert_eq!(e.to_response().price, "0.40");
    }

    #[test]
    fn test_interpret_is_deterministic() {
        let a = interpret(SAMPLE, "PETG");
        let b = interpret(SAMPLE, "PETG");
        assert_eq!(a.filament_grams.to_bits(), b.filament_grams.to_bits());
        assert_eq!(a.price.to_bits(), b.price.to_bits());
    }

    #[test]
    fn test_empty_output_prices_zero() {
        let e = interpret("", "PLA");
        assert_eq!(e.filament_grams, 0.0);
        assert_eq!(e.time_hours, 0.0);
        assert_eq!(e.price, 0.0);
    }
}

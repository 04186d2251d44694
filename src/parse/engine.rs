//! Shared strategy-execution engine.
//!
//! Each vendor format contributes an ordered table of [`PatternStrategy`]
//! records: a compiled pattern plus a capture shape saying how its
//! groups map onto a reading. One interpreter runs the table against the
//! document text, applying the acceptance rules uniformly and threading
//! the [`Captured`] accumulator so earlier strategies win ties. The
//! records are plain data: adding a vendor quirk means adding a row, not
//! another hand-written scan loop.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

use crate::models::{Flag, MarkerReading};

use super::capture::{name_ok, raw_capture_ok, Captured};
use super::name_clean::clean_test_name;
use super::status::{classify, RefRange};

/// How a strategy's capture groups map onto a reading.
#[derive(Debug, Clone, Copy)]
pub enum Shape {
    /// Groups: name, low, high, unit. The reading value is not in the
    /// match: it sits in the run of numbers that follows, where chart
    /// renderings repeat the range boundaries. The engine scans the
    /// trailing segment and takes the first number that is not a boundary
    /// and not below the low bound.
    BoundedScan {
        /// How far past the match to scan before giving up.
        window: usize,
    },
    /// Groups: name, value. A bare `Value N` capture with no unit/range.
    BareValue,
    /// Groups: name, threshold, unit, value. `above >x` range shape.
    AboveValue,
    /// Groups: name, threshold, unit, value. `below <x` range shape.
    BelowValue,
    /// Groups: name, low, high, unit, value, flag. Fully inline row where
    /// the printed High/Low token is authoritative. Values equal to a
    /// range boundary are chart repeats, not readings.
    InlineFlag,
    /// Groups: name, low, high (optional), unit, value. Bounded when the
    /// high bound is present, a below-threshold range otherwise.
    OptionalHigh,
    /// Groups: name, value, flag (optional), range, unit. A table row in
    /// the Healow style, range printed as free text.
    RowFlagRange,
    /// Groups: name, value, unit. A row whose reference is the literal
    /// "See below"; CRP risk thresholds decide status.
    SeeBelow,
    /// Groups: name, value, unit, range. A colon row where a literal
    /// `(High)` / `(Low)` inside the matched text is authoritative.
    ColonFlagRange,
    /// Groups: name, value, unit, range.
    ColonRange,
    /// Groups: name, value, unit. No reference range on the row.
    ColonUnit,
}

/// One extraction strategy: pattern + field mapping, as data.
#[derive(Clone, Copy)]
pub struct PatternStrategy {
    pub label: &'static str,
    pub regex: &'static LazyLock<Regex>,
    pub shape: Shape,
    /// Uppercased fragments that disqualify a name when contained in it.
    /// Formats with busy boilerplate (UI Health) use this to keep header
    /// phrases out of the marker map.
    pub reject_contains: &'static [&'static str],
}

static RE_NUMBER_FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d.]+)(?:\s*\b(High|Low|H|L)\b)?").unwrap());

/// Run an ordered strategy table over the text.
pub fn run(text: &str, strategies: &[PatternStrategy], captured: &mut Captured) {
    for strategy in strategies {
        run_one(text, strategy, captured);
    }
}

fn run_one(text: &str, strategy: &PatternStrategy, captured: &mut Captured) {
    for caps in strategy.regex.captures_iter(text) {
        let Some(raw_name) = caps.get(1) else { continue };
        if !raw_capture_ok(raw_name.as_str()) {
            debug!(strategy = strategy.label, raw = raw_name.as_str(),
                   "rejected capture spanning columns");
            continue;
        }

        let name = clean_test_name(raw_name.as_str());
        if !name_ok(&name) {
            continue;
        }
        let upper = name.to_uppercase();
        if strategy.reject_contains.iter().any(|frag| upper.contains(frag)) {
            debug!(strategy = strategy.label, name = %name, "rejected header-like name");
            continue;
        }
        if captured.contains(&name) || captured.is_suffix_of_accepted(&name) {
            continue;
        }

        let Some(reading) = build_reading(text, strategy, &caps) else {
            continue;
        };
        if captured.insert(name.clone(), reading) {
            debug!(strategy = strategy.label, name = %name, "accepted reading");
        }
    }
}

/// Interpret the capture groups per the strategy's shape. `None` means
/// the match carried no usable value, never an error.
fn build_reading(
    text: &str,
    strategy: &PatternStrategy,
    caps: &Captures<'_>,
) -> Option<MarkerReading> {
    match strategy.shape {
        Shape::BoundedScan { window } => {
            let low_raw = caps.get(2)?.as_str();
            let high_raw = caps.get(3)?.as_str();
            let low: f64 = low_raw.parse().ok()?;
            let high: f64 = high_raw.parse().ok()?;
            let unit = caps.get(4).map(|m| m.as_str()).unwrap_or_default();

            let (value, flag) = scan_trailing_value(text, caps.get(0)?.end(), low, high, window)?;
            let range = RefRange::Bounded { low, high };
            let status = classify(value, Some(&range), flag);
            Some(MarkerReading::single(
                value,
                unit,
                format!("{low_raw} - {high_raw}"),
                status,
            ))
        }
        Shape::BareValue => {
            let value: f64 = caps.get(2)?.as_str().parse().ok()?;
            Some(MarkerReading::single(value, "", "", classify(value, None, None)))
        }
        Shape::AboveValue => {
            let threshold_raw = caps.get(2)?.as_str();
            let threshold: f64 = threshold_raw.parse().ok()?;
            let unit = caps.get(3)?.as_str();
            let value: f64 = caps.get(4)?.as_str().parse().ok()?;
            let range = RefRange::Above(threshold);
            Some(MarkerReading::single(
                value,
                unit,
                format!("> {threshold_raw}"),
                classify(value, Some(&range), None),
            ))
        }
        Shape::BelowValue => {
            let threshold_raw = caps.get(2)?.as_str();
            let threshold: f64 = threshold_raw.parse().ok()?;
            let unit = caps.get(3)?.as_str();
            let value: f64 = caps.get(4)?.as_str().parse().ok()?;
            let range = RefRange::Below(threshold);
            Some(MarkerReading::single(
                value,
                unit,
                format!("< {threshold_raw}"),
                classify(value, Some(&range), None),
            ))
        }
        Shape::InlineFlag => {
            let low_raw = caps.get(2)?.as_str();
            let high_raw = caps.get(3)?.as_str();
            let low: f64 = low_raw.parse().ok()?;
            let high: f64 = high_raw.parse().ok()?;
            let unit = caps.get(4)?.as_str();
            let value: f64 = caps.get(5)?.as_str().parse().ok()?;
            if value == low || value == high {
                return None;
            }
            let flag = caps.get(6).and_then(|m| Flag::parse(m.as_str()));
            let range = RefRange::Bounded { low, high };
            Some(MarkerReading::single(
                value,
                unit,
                format!("{low_raw} - {high_raw}"),
                classify(value, Some(&range), flag),
            ))
        }
        Shape::OptionalHigh => {
            let low_raw = caps.get(2)?.as_str();
            let low: f64 = low_raw.parse().ok()?;
            let high = caps.get(3);
            let unit = caps.get(4)?.as_str();
            let value: f64 = caps.get(5)?.as_str().parse().ok()?;
            let (range, display) = match high {
                Some(high_raw) => {
                    let high: f64 = high_raw.as_str().parse().ok()?;
                    (
                        RefRange::Bounded { low, high },
                        format!("{low_raw} - {}", high_raw.as_str()),
                    )
                }
                None => (RefRange::Below(low), format!("< {low_raw}")),
            };
            Some(MarkerReading::single(
                value,
                unit,
                display,
                classify(value, Some(&range), None),
            ))
        }
        Shape::RowFlagRange => {
            let value: f64 = caps.get(2)?.as_str().parse().ok()?;
            let flag = caps.get(3).and_then(|m| Flag::parse(m.as_str()));
            let range_text = caps.get(4)?.as_str();
            let unit = caps.get(5)?.as_str();
            let range = RefRange::parse(range_text);
            Some(MarkerReading::single(
                value,
                unit,
                range_text,
                classify(value, range.as_ref(), flag),
            ))
        }
        Shape::SeeBelow => {
            let value: f64 = caps.get(2)?.as_str().parse().ok()?;
            let unit = caps.get(3)?.as_str();
            // CRP risk bands: < 1.0 low risk, 1.0–3.0 average, >= 3.0 high.
            let name = caps.get(1)?.as_str().to_uppercase();
            let status = if (name.contains("CRP") || name.contains("C-REACTIVE")) && value >= 3.0 {
                crate::models::Status::High
            } else {
                crate::models::Status::Normal
            };
            Some(MarkerReading::single(value, unit, "See below", status))
        }
        Shape::ColonFlagRange => {
            let value: f64 = caps.get(2)?.as_str().parse().ok()?;
            let unit = caps.get(3)?.as_str();
            let range_text = caps.get(4)?.as_str().trim();
            let matched = caps.get(0)?.as_str();
            let flag = if matched.contains("(High)") {
                Some(Flag::High)
            } else if matched.contains("(Low)") {
                Some(Flag::Low)
            } else {
                None
            };
            let range = RefRange::parse(range_text);
            Some(MarkerReading::single(
                value,
                unit,
                range_text,
                classify(value, range.as_ref(), flag),
            ))
        }
        Shape::ColonRange => {
            let value: f64 = caps.get(2)?.as_str().parse().ok()?;
            let unit = caps.get(3)?.as_str();
            let range_text = caps.get(4)?.as_str().trim();
            let range = RefRange::parse(range_text);
            Some(MarkerReading::single(
                value,
                unit,
                range_text,
                classify(value, range.as_ref(), None),
            ))
        }
        Shape::ColonUnit => {
            let value: f64 = caps.get(2)?.as_str().parse().ok()?;
            let unit = caps.get(3)?.as_str();
            Some(MarkerReading::single(value, unit, "", classify(value, None, None)))
        }
    }
}

/// Scan the segment after a range match for the actual reading value.
///
/// Chart-style renderings repeat the boundaries around the plotted value
/// (`134 134   145 145  138`), and explanatory text below the low bound
/// (`< 20 ng/mL: Deficiency`) adds more decoys. The reading is the first
/// number that is neither boundary and not below the low bound. The
/// segment ends at the next `Normal` keyword (the next row's range label)
/// or after `window` characters.
fn scan_trailing_value(
    text: &str,
    start: usize,
    low: f64,
    high: f64,
    window: usize,
) -> Option<(f64, Option<Flag>)> {
    let rest = &text[start..];
    let end = match rest.find("Normal") {
        Some(pos) if pos < window => pos,
        _ => rest.len().min(window),
    };
    // Stay on a char boundary when the cap lands mid-character.
    let mut end = end;
    while !rest.is_char_boundary(end) {
        end -= 1;
    }
    let segment = &rest[..end];

    for caps in RE_NUMBER_FLAG.captures_iter(segment) {
        let Ok(value) = caps[1].parse::<f64>() else { continue };
        if value == low || value == high || value < low {
            continue;
        }
        let flag = caps.get(2).and_then(|m| Flag::parse(m.as_str()));
        return Some((value, flag));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    static RE_TEST_BOUNDED: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"(?i)((?:\d+-)?[A-Za-z][A-Za-z0-9\s\-/(),]{2,50})[\s\n]+Normal\s+(?:range|value):\s*([\d.]+)\s*-\s*([\d.]+)\s+([A-Za-z/*%\d]+)",
        )
        .unwrap()
    });

    static BOUNDED: PatternStrategy = PatternStrategy {
        label: "test-bounded",
        regex: &RE_TEST_BOUNDED,
        shape: Shape::BoundedScan { window: 600 },
        reject_contains: &[],
    };

    #[test]
    fn bounded_scan_skips_boundary_repeats() {
        let text = "Sodium  Normal range: 134 - 145 mmol/L  134 134   145 145  138";
        let mut captured = Captured::new();
        run(text, &[BOUNDED], &mut captured);
        let values = captured.into_map();
        let reading = &values["Sodium"];
        assert_eq!(reading.value(), 138.0);
        assert_eq!(reading.unit, "mmol/L");
        assert_eq!(reading.range, "134 - 145");
        assert_eq!(reading.status(), Status::Normal);
    }

    #[test]
    fn bounded_scan_skips_descriptive_numbers_below_low() {
        // "< 20: Deficiency  20 to 29: Insufficiency" style decoys sit
        // below the low bound and must not be taken as the reading.
        let text = "Vitamin D  Normal range: 30 - 100 ng/mL  20 25 30 100  33";
        let mut captured = Captured::new();
        run(text, &[BOUNDED], &mut captured);
        let values = captured.into_map();
        assert_eq!(values["Vitamin D"].value(), 33.0);
    }

    #[test]
    fn bounded_scan_stops_at_next_row() {
        let text = "Sodium  Normal range: 134 - 145 mmol/L  138\nPotassium  Normal range: 3.5 - 5.0 mmol/L  4.2";
        let mut captured = Captured::new();
        run(text, &[BOUNDED], &mut captured);
        let values = captured.into_map();
        assert_eq!(values["Sodium"].value(), 138.0);
        assert_eq!(values["Potassium"].value(), 4.2);
    }

    #[test]
    fn trailing_flag_is_authoritative() {
        let text = "Ferritin  Normal range: 30 - 400 ng/mL  990 High";
        let mut captured = Captured::new();
        run(text, &[BOUNDED], &mut captured);
        let values = captured.into_map();
        assert_eq!(values["Ferritin"].status(), Status::High);
    }

    #[test]
    fn suffix_capture_rejected_after_full_name() {
        // First strategy captures the digit-dash name; a later broader
        // match of the suffix must be dropped.
        let text = "25-OH Vitamin D, Total  Normal range: 30 - 100 ng/mL  33\n\
                    OH Vitamin D, Total  Normal range: 30 - 100 ng/mL  33";
        let mut captured = Captured::new();
        run(text, &[BOUNDED], &mut captured);
        let values = captured.into_map();
        assert_eq!(values.len(), 1);
        assert!(values.contains_key("25-OH Vitamin D, Total"));
    }

    #[test]
    fn no_value_after_filtering_yields_nothing() {
        let text = "Sodium  Normal range: 134 - 145 mmol/L  134 145";
        let mut captured = Captured::new();
        run(text, &[BOUNDED], &mut captured);
        assert!(captured.is_empty());
    }

    #[test]
    fn column_spanning_names_rejected() {
        let text = "Sodium      Potassium  Normal range: 134 - 145 mmol/L  138";
        let mut captured = Captured::new();
        run(text, &[BOUNDED], &mut captured);
        // The merged capture "Sodium      Potassium" must not appear.
        assert!(!captured.into_map().keys().any(|k| k.contains("Potassium") && k.contains("Sodium")));
    }
}

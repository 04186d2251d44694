//! UI Health Pathology Laboratories reports.
//!
//! Results print as colon rows: `Test Name: Value UNIT (Ref: range)`,
//! with `(High)` / `(Low)` injected before the reference when flagged.
//! The boilerplate around the table is dense (demographics, order block,
//! accession numbers), so names containing header phrases are dropped.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::MarkerReading;
use crate::parse::capture::{name_ok, Captured};
use crate::parse::engine::{self, PatternStrategy, Shape};
use crate::parse::lab_type::clean_lab_type;
use crate::parse::name_clean::clean_test_name;
use crate::parse::status::{classify, RefRange};
use crate::parse::{dates, formats::Extraction};

/// Phrases that mark a captured name as report boilerplate.
const HEADER_FRAGMENTS: &[&str] = &[
    "PATIENT", "ORDER", "LABORATORY", "DEMOGRAPHICS", "INFORMATION", "PANEL",
    "COMPREHENSIVE", "METABOLIC", "DIFFERENTIAL", "ENDOCRINOLOGY", "MARKERS", "CBC",
    "CLIENT", "PROVIDER", "ACCESSION", "AGE", "SEX", "DOB", "NAME", "MR #", "ACCOUNT",
    "PENDING", "COLLECTED", "RECEIVED", "REPORTED", "ORDERING", "STANDARD", "RANGE",
    "RESULT",
];

static RE_COLON_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([A-Za-z0-9%][A-Za-z0-9\s,.\-/()%]{1,50}?):\s*([\d.]+)\s+([A-Za-z%][A-Za-z/*%0-9]*)\s*\(Ref:\s*([^)]+)\)",
    )
    .unwrap()
});
static RE_COLON_FLAG_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([A-Za-z0-9%][A-Za-z0-9\s,.\-/()%]{1,50}?):\s*([\d.]+)\s+([A-Za-z][A-Za-z/*%0-9]+)\s+\((?:High|Low)\)\s+\(Ref:\s*([^)]+)\)",
    )
    .unwrap()
});
static RE_COLON_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([A-Za-z0-9%][A-Za-z0-9\s,.\-/()%]{1,50}?):\s*([\d.]+)\s+([A-Za-z][A-Za-z/*%0-9]+)(?:\s|$)",
    )
    .unwrap()
});

static STRATEGIES: [PatternStrategy; 3] = [
    // Flagged rows first: the plain reference pattern would otherwise
    // swallow them without their flag.
    PatternStrategy {
        label: "colon-flag-ref",
        regex: &RE_COLON_FLAG_REF,
        shape: Shape::ColonFlagRange,
        reject_contains: HEADER_FRAGMENTS,
    },
    PatternStrategy {
        label: "colon-ref",
        regex: &RE_COLON_REF,
        shape: Shape::ColonRange,
        reject_contains: HEADER_FRAGMENTS,
    },
    PatternStrategy {
        label: "colon-unit",
        regex: &RE_COLON_UNIT,
        shape: Shape::ColonUnit,
        reject_contains: HEADER_FRAGMENTS,
    },
];

/// Tests that legitimately print without a unit.
const NO_UNIT_TESTS: &[&str] = &["Hemoglobin A1c", "A1C", "HbA1c", "eGFR"];

static RE_COLON_BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^([A-Za-z][A-Za-z0-9 ]{1,30}?):\s*([\d.]+)\s*$").unwrap()
});

static RE_SECTION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n([A-Z][A-Z\s&-]{10,60})\n(?:[A-Z][a-z])").unwrap());

pub fn extract(text: &str) -> Extraction {
    let mut captured = Captured::new();
    engine::run(text, &STRATEGIES, &mut captured);
    extract_no_unit_tests(text, &mut captured);

    let collection_date = dates::resolve_single(text);
    Extraction {
        lab_type: detect_lab_type(text),
        collection_date,
        dates: collection_date.into_iter().collect(),
        values: captured.into_map(),
        is_period: false,
    }
}

/// `Name: value` rows with nothing after the number are accepted only for
/// tests known to print unitless. A1C gets its conventional percent unit
/// and diagnostic threshold.
fn extract_no_unit_tests(text: &str, captured: &mut Captured) {
    for caps in RE_COLON_BARE.captures_iter(text) {
        let name = clean_test_name(&caps[1]);
        if !name_ok(&name) || captured.contains(&name) {
            continue;
        }
        let lower = name.to_lowercase();
        let known = NO_UNIT_TESTS
            .iter()
            .any(|t| lower.contains(&t.to_lowercase()) || t.to_lowercase().contains(&lower));
        if !known {
            continue;
        }
        let Ok(value) = caps[2].parse::<f64>() else { continue };

        let is_a1c = lower.contains("a1c") || lower.contains("hemoglobin a");
        let reading = if is_a1c {
            let range = RefRange::Below(5.7);
            MarkerReading::single(value, "%", "<5.7", classify(value, Some(&range), None))
        } else {
            MarkerReading::single(value, "", "", classify(value, None, None))
        };
        captured.insert(name, reading);
    }
}

fn detect_lab_type(text: &str) -> Option<String> {
    let caps = RE_SECTION_HEADER.captures(text)?;
    let section = caps[1].trim().to_string();
    let label = if section.contains("COMPREHENSIVE METABOLIC") {
        "CMP".to_string()
    } else if section.contains("CBC W") {
        "CBC".to_string()
    } else if section.contains("LIPID") {
        "Lipídios".to_string()
    } else if section.contains("ENDOCRINOLOGY") {
        "Endocrinologia".to_string()
    } else {
        clean_lab_type(&section)
    };
    Some(label)
}

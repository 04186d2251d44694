//! MyChart period exports: one table, many collection dates.
//!
//! The header row lists the column dates after `Standard Range`; each
//! test row prints its range, unit, and then one value per column. The
//! i-th value belongs to the i-th resolved date; the zip is positional,
//! exactly as the table is laid out.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use crate::models::{DataPoint, Flag, MarkerReading, Status};
use crate::parse::capture::{name_ok, Captured};
use crate::parse::lab_type::{ampersand, clean_lab_type};
use crate::parse::name_clean::clean_test_name;
use crate::parse::{dates, formats::Extraction};

/// Tests that appear in the period flowsheets, probed by name first so
/// their readings survive even when the generic row pattern trips on
/// surrounding text.
const KNOWN_TESTS: &[&str] = &[
    // CBC
    "Hemoglobin", "Hematocrit", "RBC", "WBC", "Platelets", "Platelet Count",
    "MCV", "MCH", "MCHC", "RDW", "RDW-CV", "RDW-SD", "MPV",
    "Neutrophils Absolute", "Neutrophils Relative", "Neutrophils",
    "Lymphocytes Absolute", "Lymphocytes Relative", "Lymphocytes",
    "Monocytes Absolute", "Monocytes Relative", "Monocytes",
    "Eosinophils Absolute", "Eosinophils Relative", "Eosinophils",
    "Basophils Absolute", "Basophils Relative", "Basophils",
    "Absolute Immature Granulocytes", "Immature Granulocytes",
    // CMP
    "Sodium", "Potassium", "Chloride", "CO2", "Glucose", "Carbon Dioxide",
    "BUN", "Blood Urea Nitrogen", "Creatinine", "Calcium", "eGFR",
    "Total Protein", "Albumin", "Globulin", "Albumin/Globulin Ratio", "A/G Ratio",
    "AST", "ALT", "Alkaline Phosphatase", "Alk Phos", "Total Bilirubin", "Bilirubin",
    "Anion Gap", "BUN/Creatinine Ratio",
    // Lipids
    "Cholesterol", "Total Cholesterol", "Triglycerides", "HDL", "LDL",
    "HDL Cholesterol", "LDL Cholesterol", "VLDL", "VLDL Cholesterol",
    "Chol/HDL Ratio", "LDL/HDL Ratio", "Non-HDL Cholesterol",
    // Thyroid
    "TSH", "T3", "T4", "Free T3", "Free T4", "T3 Free", "T4 Free",
    // Other
    "CK", "Total CK", "CK, Total", "CK Total", "Creatine Kinase", "Creatine Kinase, Total",
    "Vitamin D", "25-OH Vitamin D", "Vitamin D, 25-Hydroxy", "Vitamin B12", "Folate",
    "Hemoglobin A1C", "A1C", "HbA1c",
];

/// Bounded-range row: `Name  0.0 - 0.2 10*3/uL  0.0   0.1 H   0.1`.
static KNOWN_BOUNDED: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    KNOWN_TESTS
        .iter()
        .map(|name| {
            let pattern = format!(
                r"(?i){}\s+([\d.]+\s*-\s*[\d.]+)\s*([A-Za-z*/\d%]+)?\s*([\d.]+(?:\s*[HL]\b)?(?:\s+[\d.]+(?:\s*[HL]\b)?)*)",
                regex::escape(name)
            );
            (*name, Regex::new(&pattern).unwrap())
        })
        .collect()
});

/// Threshold-range row: `Chol/HDL Ratio  <5.0  10.9 H   9.5 H   7.0`.
static KNOWN_THRESHOLD: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    KNOWN_TESTS
        .iter()
        .map(|name| {
            let pattern = format!(
                r"(?i){}\s+([<>][\d.]+)\s+([\d.]+(?:\s*[HL]\b)?(?:\s+[\d.]+(?:\s*[HL]\b)?)*)",
                regex::escape(name)
            );
            (*name, Regex::new(&pattern).unwrap())
        })
        .collect()
});

/// Catch-all for rows whose name is not in the known list. Requires a
/// run of two or more values so single-date rows cannot misfire.
static RE_GENERIC_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([A-Za-z][A-Za-z\s/\-]+?)[\s\n]+([<>]?[\d.]+(?:\s*-\s*[\d.]+)?)\s+([A-Za-z*/\d%]*)\s*([\d.]+(?:\s*[HL]\b)?(?:\s+[\d.]+(?:\s*[HL]\b)?)+)",
    )
    .unwrap()
});

static RE_VALUE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d.]+)\s*(?:\b([HL])\b)?").unwrap());
static RE_MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

static RE_KNOWN_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(CBC W.*?DIFFERENTIAL|COMPREHENSIVE METABOLIC PANEL|LIPID PANEL|THYROID[- ]STIMULATING HORMONE[^-\n]*|TOTAL CK)\s*-?\s*Past Results",
    )
    .unwrap()
});
static RE_GENERIC_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([A-Z][A-Z\s\d\-/(),&]{4,80}?)\s*-?\s*Past Results").unwrap()
});
static RE_HEADER_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Z][A-Z\s\d\-/(),&]{4,80}?)[\s\n]+Name\s+Standard Range").unwrap()
});
static RE_TITLE_QUALIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",?\s+(TOTAL|FREE|INTACT)$").unwrap());

/// Header phrases the generic row pattern must never accept as names.
const HEADER_PHRASES: &[&str] = &["STANDARD RANGE", "RESULT VALUE", "REF RANGE"];

pub fn extract(text: &str) -> Extraction {
    let resolved = dates::resolve_period(text);
    debug!(dates = resolved.len(), "period header dates resolved");

    let values = extract_period_values(text, &resolved);
    Extraction {
        lab_type: detect_lab_type(text),
        collection_date: resolved.last().copied(),
        dates: resolved,
        values,
        is_period: true,
    }
}

fn extract_period_values(
    text: &str,
    resolved: &[NaiveDate],
) -> std::collections::BTreeMap<String, MarkerReading> {
    let mut captured = Captured::new();

    for (name, pattern) in KNOWN_BOUNDED.iter() {
        if captured.contains(*name) {
            continue;
        }
        if let Some(caps) = pattern.captures(text) {
            let range = caps[1].to_string();
            let unit = caps.get(2).map(|m| m.as_str()).unwrap_or_default().to_string();
            // Known rows accept even a single point.
            if let Some(reading) = assemble(&caps[3], resolved, &unit, &range, 1) {
                captured.insert((*name).to_string(), reading);
            }
        }
    }

    for (name, pattern) in KNOWN_THRESHOLD.iter() {
        if captured.contains(*name) {
            continue;
        }
        if let Some(caps) = pattern.captures(text) {
            let range = caps[1].to_string();
            if let Some(reading) = assemble(&caps[2], resolved, "", &range, 1) {
                captured.insert((*name).to_string(), reading);
            }
        }
    }

    // Generic catch-all is stricter: the raw name must not span columns
    // and at least two data points must line up.
    for caps in RE_GENERIC_ROW.captures_iter(text) {
        if RE_MULTI_SPACE.is_match(&caps[1]) {
            continue;
        }
        let name = clean_test_name(&caps[1]);
        if !name_ok(&name) || captured.contains(&name) || captured.is_suffix_of_accepted(&name) {
            continue;
        }
        let upper = name.to_uppercase();
        if HEADER_PHRASES.iter().any(|phrase| upper.contains(phrase)) {
            continue;
        }
        let range = caps[2].to_string();
        let unit = caps.get(3).map(|m| m.as_str()).unwrap_or_default().to_string();
        if let Some(reading) = assemble(&caps[4], resolved, &unit, &range, 2) {
            captured.insert(name, reading);
        }
    }

    captured.into_map()
}

/// Zip a run of value tokens against the resolved dates, positionally:
/// the i-th value belongs to the i-th date. Tokens beyond the date count
/// are dropped. Returns `None` below `min_points`.
fn assemble(
    values_str: &str,
    resolved: &[NaiveDate],
    unit: &str,
    range: &str,
    min_points: usize,
) -> Option<MarkerReading> {
    let mut points = Vec::new();
    for (caps, date) in RE_VALUE_TOKEN.captures_iter(values_str).zip(resolved.iter()) {
        let Ok(value) = caps[1].parse::<f64>() else { continue };
        let status = caps
            .get(2)
            .and_then(|m| Flag::parse(m.as_str()))
            .map(Flag::status)
            .unwrap_or(Status::Normal);
        points.push(DataPoint { date: *date, value, status });
    }
    if points.len() < min_points {
        return None;
    }
    MarkerReading::period(unit, range, points)
}

fn detect_lab_type(text: &str) -> Option<String> {
    if let Some(caps) = RE_KNOWN_TITLE.captures(text) {
        let title = caps[1].to_uppercase();
        let label = if title.contains("CBC") {
            "CBC".to_string()
        } else if title.contains("COMPREHENSIVE") {
            "CMP".to_string()
        } else if title.contains("LIPID") {
            "Lipídios".to_string()
        } else if title.contains("THYROID") {
            "TSH".to_string()
        } else if title.contains("TOTAL CK") {
            "CK Total".to_string()
        } else {
            clean_lab_type(&caps[1])
        };
        return Some(label);
    }

    let caps = RE_GENERIC_TITLE
        .captures(text)
        .or_else(|| RE_HEADER_TITLE.captures(text))?;
    let title = RE_TITLE_QUALIFIER.replace(caps[1].trim(), ", $1");
    Some(clean_lab_type(&ampersand(title.trim())))
}

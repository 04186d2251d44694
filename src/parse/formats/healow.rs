//! Healow portal exports.
//!
//! Rows come as `F   VITAMIN B12   1004 H   181-914 (PG/ML)`: an `F`
//! (final) marker, the name, the value with an optional flag, then the
//! reference with the unit in parentheses. A second pass probes a known
//! test-name list for rows the table pattern missed, and some clinics
//! append a plain NAME/VALUE/REFERENCE table.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::models::MarkerReading;
use crate::parse::capture::{name_ok, raw_capture_ok, Captured};
use crate::parse::engine::{self, PatternStrategy, Shape};
use crate::parse::lab_type::{ampersand, clean_lab_type, first_all_caps_heading};
use crate::parse::name_clean::clean_test_name;
use crate::parse::status::{classify, RefRange};
use crate::parse::{dates, formats::Extraction};

static RE_TABLE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)F\s+([A-Z][A-Z0-9\s,\-()]+?)\s+([\d.]+)\s*([HL])?\s+([\d.\-<>]+)\s*\(([^)]+)\)")
        .unwrap()
});
static RE_SEE_BELOW: LazyLock<Regex> = LazyLock::new(|| {
    // The optional F marker is consumed outside the name group so wide
    // column gaps after it cannot poison the capture.
    Regex::new(r"(?i)(?:F\s+)?([A-Z][A-Z\s]+?(?:CRP|PROTEIN))\s+([\d.]+)\s+See below\s*\(([^)]+)\)")
        .unwrap()
});

static STRATEGIES: [PatternStrategy; 2] = [
    PatternStrategy {
        label: "final-row",
        regex: &RE_TABLE_ROW,
        shape: Shape::RowFlagRange,
        reject_contains: &[],
    },
    PatternStrategy {
        label: "see-below",
        regex: &RE_SEE_BELOW,
        shape: Shape::SeeBelow,
        reject_contains: &[],
    },
];

/// Tests that commonly appear in Healow panels; probed by name when the
/// table pattern does not line up (wrapped rows, missing `F` column).
const KNOWN_TESTS: &[&str] = &[
    "VITAMIN B12",
    "VITAMIN B6",
    "FOLATE",
    "FERRITIN",
    "GLUCOSE",
    "SODIUM",
    "POTASSIUM",
    "CHLORIDE",
    "CO2",
    "BUN",
    "CREATININE",
    "CALCIUM",
    "TOTAL PROTEIN",
    "ALBUMIN",
    "BILIRUBIN",
    "AST",
    "ALT",
    "ALKALINE PHOSPHATASE",
    "WBC",
    "RBC",
    "HEMOGLOBIN",
    "HEMATOCRIT",
    "MCV",
    "MCH",
    "MCHC",
    "PLATELET",
    "NEUTROPHIL",
    "LYMPHOCYTE",
    "MONOCYTE",
    "C-REACTIVE PROTEIN",
    "CRP",
    "HIGH SENSITIVE CRP",
    "HIGH SENSITIVITY CRP",
    "HSCRP",
];

static KNOWN_TEST_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    KNOWN_TESTS
        .iter()
        .map(|name| {
            let pattern = format!(
                r"(?i){}\s+(\d+\.?\d*)\s*([HL])?\s+([\d.\-<>]+)\s*\(([^)]+)\)",
                regex::escape(name)
            );
            (*name, Regex::new(&pattern).unwrap())
        })
        .collect()
});

static RE_KNOWN_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(BASIC METABOLIC PANEL|COMPREHENSIVE METABOLIC PANEL|COMPLETE BLOOD COUNT|BLOOD DIFFERENTIAL|LIPID PANEL|VITAMIN B-?12|B-?12|VITAMIN B-?6|B-?6|FERRITIN|FOLATE|C-REACTIVE PROTEIN|HIGH SENSITIVITY C-REACTIVE|HSCRP)",
    )
    .unwrap()
});
static RE_ASTERISK_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z][A-Z\s\d\-/(),&]{4,60}?)\s*\*").unwrap());
static RE_F_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z][A-Z\s\d\-/(),&]{4,60}?)[\s\n]+F[\s\n]+").unwrap());
static RE_TITLE_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i),?\s*(?:EXTENDED|W/.*|WITH.*)$").unwrap());
static RE_TITLE_QUALIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",?\s+(INTACT|TOTAL|FREE)$").unwrap());
static RE_B12_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bB-?12\b").unwrap());
static RE_B6_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bB-?6\b").unwrap());

pub fn extract(text: &str) -> Extraction {
    let mut captured = Captured::new();
    engine::run(text, &STRATEGIES, &mut captured);
    probe_known_tests(text, &mut captured);
    extract_reference_table(text, &mut captured);

    let collection_date = dates::resolve_single(text);
    Extraction {
        lab_type: detect_lab_type(text),
        collection_date,
        dates: collection_date.into_iter().collect(),
        values: captured.into_map(),
        is_period: false,
    }
}

/// Probe the known test-name list for rows the table pattern missed.
fn probe_known_tests(text: &str, captured: &mut Captured) {
    for (name, pattern) in KNOWN_TEST_PATTERNS.iter() {
        if captured.contains(*name) {
            continue;
        }
        let Some(caps) = pattern.captures(text) else { continue };
        let Ok(value) = caps[1].parse::<f64>() else { continue };
        let flag = caps.get(2).and_then(|m| crate::models::Flag::parse(m.as_str()));
        let range_text = caps[3].to_string();
        let unit = caps[4].to_string();
        let range = RefRange::parse(&range_text);
        let status = classify(value, range.as_ref(), flag);
        if captured.insert(
            (*name).to_string(),
            MarkerReading::single(value, unit, range_text, status),
        ) {
            debug!(name, "accepted known-test probe");
        }
    }
}

/// Walk a NAME / VALUE / REFERENCE RANGE table (Central Counties style).
/// The table starts at its header line and ends at the performing-lab
/// footer.
fn extract_reference_table(text: &str, captured: &mut Captured) {
    static RE_TABLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)^F?\s*([A-Z][A-Z\s,\-()/]+?)\s{2,}([\d.]+)\s{2,}(.+?)$").unwrap()
    });
    static RE_UNIT_PAREN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\(([^)]+)\)").unwrap());

    let mut in_table = false;
    for line in text.lines() {
        let line = line.trim();

        if line.contains("NAME") && line.contains("VALUE") && line.contains("REFERENCE") {
            in_table = true;
            continue;
        }
        if !in_table || line.len() <= 5 {
            continue;
        }
        if line.contains("PERFORMING LAB") || line.contains("Result:") {
            in_table = false;
            continue;
        }

        let Some(caps) = RE_TABLE_LINE.captures(line) else { continue };
        if !raw_capture_ok(&caps[1]) {
            continue;
        }
        let name = clean_test_name(&caps[1]);
        if !name_ok(&name) || captured.contains(&name) {
            continue;
        }
        let Ok(value) = caps[2].parse::<f64>() else { continue };

        let range_text = caps[3].trim();
        let unit = RE_UNIT_PAREN
            .captures(range_text)
            .map(|u| u[1].to_string())
            .unwrap_or_default();
        let display = RE_UNIT_PAREN.replace(range_text, "").trim().to_string();
        let range = RefRange::parse(&display);
        let status = classify(value, range.as_ref(), None);
        captured.insert(name, MarkerReading::single(value, unit, display, status));
    }
}

fn detect_lab_type(text: &str) -> Option<String> {
    if let Some(caps) = RE_KNOWN_TITLE.captures(text) {
        return Some(map_known_title(&caps[1]));
    }

    // Healow prints the panel title before the first asterisk:
    // "LIPID PANEL, EXTENDED *".
    if let Some(caps) = RE_ASTERISK_TITLE.captures(text) {
        let title = RE_TITLE_TAIL.replace(caps[1].trim(), "");
        return Some(clean_lab_type(&ampersand(title.trim())));
    }

    // Next: a title followed by the first `F` result marker.
    if let Some(caps) = RE_F_TITLE.captures(text) {
        let title = RE_TITLE_QUALIFIER.replace(caps[1].trim(), ", $1");
        return Some(clean_lab_type(&ampersand(title.trim())));
    }

    first_all_caps_heading(text, 15, &["FINAL RESULT", "BLOOD", "ACCESSION"])
        .map(|heading| clean_lab_type(&ampersand(&heading)))
}

fn map_known_title(title: &str) -> String {
    let upper = title.to_uppercase();
    if upper.contains("COMPREHENSIVE") || upper.contains("CMP") {
        "CMP".into()
    } else if upper.contains("BASIC METABOLIC") {
        "BMP".into()
    } else if upper.contains("BLOOD COUNT") || upper.contains("CBC") {
        "CBC".into()
    } else if upper.contains("BLOOD DIFFERENTIAL") {
        "Diferencial".into()
    } else if upper.contains("LIPID") {
        "Lipídios".into()
    } else if RE_B12_WORD.is_match(&upper) {
        "B12".into()
    } else if RE_B6_WORD.is_match(&upper) {
        "B6".into()
    } else if upper.contains("FERRITIN") {
        "Ferritina".into()
    } else if upper.contains("FOLATE") {
        "Folato".into()
    } else if upper.contains("C-REACTIVE") || upper.contains("HSCRP") {
        "PCR".into()
    } else {
        clean_lab_type(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    #[test]
    fn final_row_with_flag() {
        let text = "VITAMIN B12 *  F   VITAMIN B12   1004 H   181-914 (PG/ML)";
        let extraction = extract(text);
        let reading = &extraction.values["VITAMIN B12"];
        assert_eq!(reading.value(), 1004.0);
        assert_eq!(reading.unit, "PG/ML");
        assert_eq!(reading.range, "181-914");
        assert_eq!(reading.status(), Status::High);
    }

    #[test]
    fn explicit_flag_overrides_range() {
        // 243 is above the range anyway, but the printed H is what the
        // status must come from even when the range disagrees.
        let text = "F   GLUCOSE   243 H   300-400 (MG/DL)";
        let extraction = extract(text);
        assert_eq!(extraction.values["GLUCOSE"].status(), Status::High);
    }

    #[test]
    fn unflagged_row_classified_from_range() {
        let text = "F      VITAMIN B6 (PYRIDOXAL 5-PHOSPHATE)         42.9        20.0-125.0 (nmol/L)";
        let extraction = extract(text);
        let reading = &extraction.values["VITAMIN B6 (PYRIDOXAL 5-PHOSPHATE)"];
        assert_eq!(reading.value(), 42.9);
        assert_eq!(reading.status(), Status::Normal);
    }

    #[test]
    fn see_below_reference_crp() {
        let text = "F         HIGH SENSITIVE CRP                                     0.5                                See below (MG/L)";
        let extraction = extract(text);
        let reading = &extraction.values["HIGH SENSITIVE CRP"];
        assert_eq!(reading.range, "See below");
        assert_eq!(reading.status(), Status::Normal);
    }

    #[test]
    fn see_below_crp_high_risk() {
        let text = "HIGH SENSITIVE CRP   4.1   See below (MG/L)";
        let extraction = extract(text);
        assert_eq!(extraction.values["HIGH SENSITIVE CRP"].status(), Status::High);
    }

    #[test]
    fn known_test_probe_without_f_marker() {
        let text = "Results:\nFERRITIN 88 30-400 (NG/ML)";
        let extraction = extract(text);
        let reading = &extraction.values["FERRITIN"];
        assert_eq!(reading.value(), 88.0);
        assert_eq!(reading.status(), Status::Normal);
    }

    #[test]
    fn reference_table_rows() {
        let text = "NAME   VALUE   REFERENCE RANGE\nHEMOGLOBIN AIC  5.4  4.0 - 5.6 (%)\nPERFORMING LAB: Central";
        let extraction = extract(text);
        let reading = &extraction.values["HEMOGLOBIN AIC"];
        assert_eq!(reading.value(), 5.4);
        assert_eq!(reading.unit, "%");
        assert_eq!(reading.range, "4.0 - 5.6");
    }

    #[test]
    fn collection_date_with_timestamp() {
        let text = "Collection Date: 03/16/2023 08:15:00\nF   GLUCOSE   95   70-99 (MG/DL)";
        let extraction = extract(text);
        assert_eq!(
            extraction.collection_date,
            chrono::NaiveDate::from_ymd_opt(2023, 3, 16)
        );
    }

    #[test]
    fn known_titles() {
        assert_eq!(detect_lab_type("BASIC METABOLIC PANEL *"), Some("BMP".into()));
        assert_eq!(detect_lab_type("COMPLETE BLOOD COUNT *"), Some("CBC".into()));
        assert_eq!(detect_lab_type("VITAMIN B-6 ASSAY"), Some("B6".into()));
    }

    #[test]
    fn asterisk_title_fallback() {
        let text = "PTH SCREEN, SERUM *\nF  PTH  42  15-65 (PG/ML)";
        assert_eq!(detect_lab_type(text), Some("PTH SCREEN, SERUM".into()));
    }

    #[test]
    fn caps_heading_fallback() {
        let text = "Patient: X\nTHYROGLOBULIN ANTIBODY\nF  result pending";
        assert_eq!(detect_lab_type(text), Some("THYROGLOBULIN ANTIBODY".into()));
    }
}

//! OCR'd flowsheet images.
//!
//! OCR text is lower fidelity than a PDF text layer, so this path stays
//! line-oriented: each line is probed against a known test list whose
//! patterns tolerate common recognition damage (`hemat.*crit`), and the
//! last number on the line (the most recent column) becomes the value.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::models::{MarkerReading, Status};
use crate::parse::capture::Captured;
use crate::parse::{dates, formats::Extraction};

/// Known tests with OCR-tolerant spellings. Order matters: a line is
/// claimed by the first entry that matches, so sub-patterns come after
/// their more specific siblings.
static TEST_PATTERNS: LazyLock<Vec<(&'static str, Vec<Regex>)>> = LazyLock::new(|| {
    let table: &[(&str, &[&str])] = &[
        ("Hemoglobin", &[r"(?i)hemoglobin", r"(?i)hemo.*bin"]),
        ("Hematocrit", &[r"(?i)hematocrit", r"(?i)hemat.*crit"]),
        ("RBC", &[r"(?i)\bRBC\b", r"(?i)red.*cell"]),
        ("MCV", &[r"(?i)\bMCV\b"]),
        ("MCH", &[r"(?i)\bMCH\b"]),
        ("MCHC", &[r"(?i)\bMCHC\b"]),
        ("RDW", &[r"(?i)\bRDW\b"]),
        ("WBC", &[r"(?i)\bWBC\b", r"(?i)white.*cell"]),
        ("Platelets", &[r"(?i)platelets?", r"(?i)plat.*lets?"]),
        ("MPV", &[r"(?i)\bMPV\b"]),
        ("Neutrophils", &[r"(?i)neutrophils?", r"(?i)neutr.*phils?"]),
        ("Lymphocytes", &[r"(?i)lymphocytes?", r"(?i)lymph.*cytes?"]),
        ("Monocytes", &[r"(?i)monocytes?", r"(?i)mono.*cytes?"]),
        ("Eosinophils", &[r"(?i)eosinophils?", r"(?i)eosin.*phils?"]),
        ("Basophils", &[r"(?i)basophils?", r"(?i)baso.*phils?"]),
        ("Sodium", &[r"(?i)\bsodium\b", r"\bNa\b"]),
        ("Potassium", &[r"(?i)\bpotassium\b", r"\bK\b"]),
        ("Chloride", &[r"(?i)\bchloride\b", r"\bCl\b"]),
        ("CO2", &[r"(?i)\bCO2\b", r"(?i)carbon.*dioxide"]),
        ("BUN", &[r"(?i)\bBUN\b"]),
        ("Creatinine", &[r"(?i)creatinine", r"(?i)creat.*nine"]),
        ("eGFR", &[r"(?i)\beGFR\b"]),
        ("Glucose", &[r"(?i)\bglucose\b"]),
        ("Calcium", &[r"(?i)\bcalcium\b", r"\bCa\b"]),
        ("AST", &[r"(?i)\bAST\b"]),
        ("ALT", &[r"(?i)\bALT\b"]),
        ("Alk phos", &[r"(?i)alk.*phos", r"(?i)alkaline.*phos"]),
        ("Total protein", &[r"(?i)total.*protein"]),
        ("Albumin", &[r"(?i)\balbumin\b"]),
        ("Bilirubin", &[r"(?i)bilirubin"]),
        ("Anion gap", &[r"(?i)anion.*gap"]),
        ("Cholesterol", &[r"(?i)\bcholesterol\b"]),
        ("HDL", &[r"(?i)\bHDL\b"]),
        ("LDL", &[r"(?i)\bLDL\b", r"(?i)calculated.*ldl"]),
        ("Triglycerides", &[r"(?i)triglycerides?"]),
        ("Hemoglobin A1C", &[r"(?i)hemoglobin.*a1c", r"(?i)hba1c", r"(?i)a1c"]),
        ("Vitamin B12", &[r"(?i)vitamin.*b12", r"(?i)b12.*level"]),
        ("Folate", &[r"(?i)\bfolate\b"]),
        ("Free T3", &[r"(?i)free.*t3"]),
        ("Free T4", &[r"(?i)free.*t4"]),
        ("TSH", &[r"(?i)\bTSH\b", r"(?i)ultra.*tsh"]),
        ("Vitamin D", &[r"(?i)vitamin.*d", r"(?i)25.*hydroxy"]),
    ];
    table
        .iter()
        .map(|(name, patterns)| {
            let compiled = patterns.iter().map(|p| Regex::new(p).unwrap()).collect();
            (*name, compiled)
        })
        .collect()
});

static RE_NUMBER_FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d.]+)\s*([LH*])?").unwrap());

pub fn extract(text: &str) -> Extraction {
    let collection_date = dates::resolve_ocr(text);
    Extraction {
        lab_type: Some("Gráfico".to_string()),
        collection_date,
        dates: collection_date.into_iter().collect(),
        values: walk_lines(text).into_map(),
        is_period: false,
    }
}

fn walk_lines(text: &str) -> Captured {
    let mut captured = Captured::new();

    for line in text.lines() {
        let line = line.trim();
        if line.len() < 3 {
            continue;
        }

        let Some((name, _)) = TEST_PATTERNS
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| p.is_match(line)))
        else {
            continue;
        };
        if captured.contains(*name) {
            continue;
        }

        // The rightmost number is the most recent column of the flowsheet.
        let Some(caps) = RE_NUMBER_FLAG.captures_iter(line).last() else {
            continue;
        };
        let Ok(value) = caps[1].parse::<f64>() else { continue };
        if value <= 0.0 {
            continue;
        }
        let status = match caps.get(2).map(|m| m.as_str()) {
            Some("H") => Status::High,
            Some("L") => Status::Low,
            _ => Status::Normal,
        };
        if captured.insert((*name).to_string(), MarkerReading::single(value, "", "", status)) {
            debug!(name, value, "accepted OCR line reading");
        }
    }
    captured
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_last_number_on_line() {
        let text = "Hemoglobin   12.1   13.4   14.0";
        let extraction = extract(text);
        assert_eq!(extraction.values["Hemoglobin"].value(), 14.0);
    }

    #[test]
    fn flag_after_last_number() {
        let text = "Hemoglobin   12.1   11.0 L";
        let extraction = extract(text);
        assert_eq!(extraction.values["Hemoglobin"].value(), 11.0);
        assert_eq!(extraction.values["Hemoglobin"].status(), Status::Low);
    }

    #[test]
    fn ocr_damaged_name_still_matches() {
        let text = "Hemat0crit   41.2"; // OCR zero for o
        let extraction = extract(text);
        assert_eq!(extraction.values["Hematocrit"].value(), 41.2);
    }

    #[test]
    fn zero_values_filtered() {
        let text = "Basophils   0";
        let extraction = extract(text);
        assert!(extraction.values.is_empty());
    }

    #[test]
    fn line_claimed_once() {
        let text = "WBC  6.6\nWBC  7.0";
        let extraction = extract(text);
        // First line wins; re-reads of the same marker are skipped.
        assert_eq!(extraction.values["WBC"].value(), 6.6);
    }

    #[test]
    fn date_from_header() {
        let text = "Flowsheet 3/16/2023\nGlucose  95";
        let extraction = extract(text);
        assert_eq!(
            extraction.collection_date,
            chrono::NaiveDate::from_ymd_opt(2023, 3, 16)
        );
        assert_eq!(extraction.lab_type.as_deref(), Some("Gráfico"));
    }

    #[test]
    fn no_recognizable_lines_yield_empty_values() {
        let text = "illegible scan output ###";
        let extraction = extract(text);
        assert!(extraction.values.is_empty());
    }
}

//! Memorial Health reports (clean OCR of printed lab summaries).
//!
//! The simplest layout: one `Test name: value [H|L] [%]` line per result,
//! grouped under ALL-CAPS section headings. A known-test regex map picks
//! up multi-word names the line pattern misses once surrounding text
//! bleeds into the line.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Flag, MarkerReading};
use crate::parse::capture::Captured;
use crate::parse::status::classify;
use crate::parse::{dates, formats::Extraction};

static RE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][A-Za-z0-9\s,/()\-]+?):\s*([\d.]+)\s*([HL])?\s*(%)?$").unwrap()
});
static RE_SECTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z\s()&/]+$").unwrap());
static RE_SKIP_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:PATIENT|DATE|NAME|MRN)").unwrap());
static RE_PARENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").unwrap());
static RE_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Multi-word tests worth probing for directly. The bool marks relative
/// differential counts, which print as percentages.
const KNOWN_TESTS: &[(&str, &str, bool)] = &[
    ("Hemoglobin", r"(?i)Hemoglobin[:\s]+?([\d.]+)\s*([HL])?", false),
    ("Hematocrit", r"(?i)Hematocrit[:\s]+?([\d.]+)\s*([HL])?", false),
    ("RBC", r"(?i)\bRBC[:\s]+?([\d.]+)\s*([HL])?", false),
    ("MCV", r"(?i)\bMCV[:\s]+?([\d.]+)", false),
    ("MCH", r"(?i)\bMCH[:\s]+?([\d.]+)", false),
    ("MCHC", r"(?i)\bMCHC[:\s]+?([\d.]+)", false),
    ("RDW", r"(?i)\bRDW[:\s]+?([\d.]+)", false),
    ("WBC", r"(?i)\bWBC[:\s]+?([\d.]+)", false),
    ("Platelets", r"(?i)Platelets[:\s]+?([\d.]+)", false),
    ("MPV", r"(?i)\bMPV[:\s]+?([\d.]+)", false),
    ("Absolute neutrophils", r"(?i)Absolute neutrophils[:\s]+?([\d.]+)", false),
    ("Absolute lymphocytes", r"(?i)Absolute lymphocytes[:\s]+?([\d.]+)", false),
    ("Absolute monocytes", r"(?i)Absolute monocytes[:\s]+?([\d.]+)", false),
    ("Absolute eosinophils", r"(?i)Absolute eosinophils[:\s]+?([\d.]+)", false),
    ("Absolute basophils", r"(?i)Absolute basophils[:\s]+?([\d.]+)", false),
    ("Neutrophils", r"(?i)Neutrophils[:\s]+?([\d.]+)\s*%", true),
    ("Lymphocytes", r"(?i)Lymphocytes[:\s]+?([\d.]+)\s*%", true),
    ("Monocytes", r"(?i)Monocytes[:\s]+?([\d.]+)\s*%", true),
    ("Eosinophils", r"(?i)Eosinophils[:\s]+?([\d.]+)\s*%", true),
    ("Basophils", r"(?i)Basophils[:\s]+?([\d.]+)\s*%", true),
    ("Sodium", r"(?i)Sodium[:\s]+?([\d.]+)", false),
    ("Potassium", r"(?i)Potassium[:\s]+?([\d.]+)", false),
    ("Chloride", r"(?i)Chloride[:\s]+?([\d.]+)", false),
    ("CO2", r"(?i)\bCO2[:\s]+?([\d.]+)\s*([HL])?", false),
    ("Anion gap", r"(?i)Anion gap[:\s]+?([\d.]+)\s*([HL])?", false),
    ("BUN", r"(?i)\bBUN[:\s]+?([\d.]+)", false),
    ("Creatinine", r"(?i)Creatinine[:\s]+?([\d.]+)", false),
    ("eGFR", r"(?i)eGFR[:\s]+?([\d.]+)", false),
    ("Glucose", r"(?i)Glucose[:\s]+?([\d.]+)", false),
    ("Calcium", r"(?i)Calcium[:\s]+?([\d.]+)", false),
    ("Alk phos", r"(?i)Alk phos[:\s]+?([\d.]+)", false),
    ("AST", r"(?i)\bAST[:\s]+?([\d.]+)", false),
    ("ALT", r"(?i)\bALT[:\s]+?([\d.]+)", false),
    ("Bilirubin (direct)", r"(?i)Bilirubin \(direct\)[:\s]+?([\d.]+)", false),
    ("Bilirubin (total)", r"(?i)Bilirubin \(total\)[:\s]+?([\d.]+)", false),
    ("Total protein", r"(?i)Total protein[:\s]+?([\d.]+)", false),
    ("Albumin", r"(?i)Albumin[:\s]+?([\d.]+)", false),
    ("Hemoglobin A1C", r"(?i)Hemoglobin A1C[:\s]+?([\d.]+)\s*([HL])?", false),
    ("Estimated average glucose", r"(?i)Estimated average glucose[:\s]+?([\d.]+)", false),
    ("Cholesterol", r"(?i)Cholesterol[:\s]+?([\d.]+)", false),
    ("HDL", r"(?i)\bHDL[:\s]+?([\d.]+)", false),
    ("Calculated LDL", r"(?i)Calculated LDL[:\s]+?([\d.]+)", false),
    ("Triglycerides", r"(?i)Triglycerides[:\s]+?([\d.]+)\s*([HL])?", false),
    ("Chol/HDL ratio", r"(?i)Chol/HDL ratio[:\s]+?([\d.]+)\s*([HL])?", false),
    ("Calculated LDL/HDL ratio", r"(?i)Calculated LDL/HDL ratio[:\s]+?([\d.]+)", false),
    ("Calculated VLDL", r"(?i)Calculated VLDL2?[:\s]+?([\d.]+)\s*([HL])?", false),
    ("Vitamin B12 level", r"(?i)Vitamin B12 level[:\s]+?([\d.]+)", false),
    ("Folate", r"(?i)Folate[:\s]+?([\d.]+)", false),
    ("Free T3", r"(?i)Free T3[:\s]+?([\d.]+)", false),
    ("Free T4", r"(?i)Free T4[:\s]+?([\d.]+)", false),
    ("Ultra TSH", r"(?i)Ultra TSH[:\s]+?([\d.]+)", false),
    ("Vitamin D, 25 hydroxy", r"(?i)Vitamin D, 25 hydroxy[:\s]+?([\d.]+)\s*([HL])?", false),
];

static KNOWN_TEST_PATTERNS: LazyLock<Vec<(&'static str, Regex, bool)>> = LazyLock::new(|| {
    KNOWN_TESTS
        .iter()
        .map(|(name, pattern, percent)| (*name, Regex::new(pattern).unwrap(), *percent))
        .collect()
});

pub fn extract(text: &str) -> Extraction {
    let mut captured = Captured::new();
    extract_lines(text, &mut captured);
    probe_known_tests(text, &mut captured);

    let collection_date = dates::resolve_single(text);
    Extraction {
        lab_type: Some(detect_lab_type(text)),
        collection_date,
        dates: collection_date.into_iter().collect(),
        values: captured.into_map(),
        is_period: false,
    }
}

fn extract_lines(text: &str, captured: &mut Captured) {
    for line in text.lines() {
        let line = line.trim();
        if line.len() < 3 {
            continue;
        }
        // Section headings are ALL-CAPS lines without a colon.
        if RE_SECTION_LINE.is_match(line) && !line.contains(':') {
            continue;
        }

        let Some(caps) = RE_LINE.captures(line) else { continue };
        let raw_name = caps[1].trim();
        if raw_name.len() < 2 || RE_SKIP_NAME.is_match(raw_name) {
            continue;
        }
        let name = RE_WS
            .replace_all(&RE_PARENS.replace_all(raw_name, ""), " ")
            .trim()
            .to_string();
        if name.is_empty() || captured.contains(&name) {
            continue;
        }

        let Ok(value) = caps[2].parse::<f64>() else { continue };
        let flag = caps.get(3).and_then(|m| Flag::parse(m.as_str()));
        let unit = if caps.get(4).is_some() { "%" } else { "" };
        let status = classify(value, None, flag);
        captured.insert(name, MarkerReading::single(value, unit, "", status));
    }
}

fn probe_known_tests(text: &str, captured: &mut Captured) {
    for (name, pattern, percent) in KNOWN_TEST_PATTERNS.iter() {
        if captured.contains(*name) {
            continue;
        }
        let Some(caps) = pattern.captures(text) else { continue };
        let Ok(value) = caps[1].parse::<f64>() else { continue };
        let flag = caps.get(2).and_then(|m| Flag::parse(m.as_str()));
        let unit = if *percent { "%" } else { "" };
        captured.insert(
            (*name).to_string(),
            MarkerReading::single(value, unit, "", classify(value, None, flag)),
        );
    }
}

fn detect_lab_type(text: &str) -> String {
    let mut sections = Vec::new();
    if text.contains("CBC (COMPLETE BLOOD COUNT)") || text.contains("DIFFERENTIAL") {
        sections.push("CBC");
    }
    if text.contains("ROUTINE CHEMISTRIES") || text.contains("ENZYMES") {
        sections.push("CMP");
    }
    if text.contains("LIPID") || text.contains("ATHEROSCLEROTIC") {
        sections.push("Lipídios");
    }
    if text.contains("IRON STUDIES") {
        sections.push("Ferro");
    }
    if text.contains("ENDOCRINE") {
        sections.push("Tireoide");
    }
    if text.contains("MISCELLANEOUS") {
        sections.push("Outros");
    }

    match sections.len() {
        0 => "Exame".to_string(),
        1 => sections[0].to_string(),
        _ => "Painel Completo".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    #[test]
    fn simple_colon_lines() {
        let text = "CBC (COMPLETE BLOOD COUNT)\nHemoglobin: 13.2 L\nSodium: 143\nNeutrophils: 63 %";
        let extraction = extract(text);
        assert_eq!(extraction.values["Hemoglobin"].value(), 13.2);
        assert_eq!(extraction.values["Hemoglobin"].status(), Status::Low);
        assert_eq!(extraction.values["Sodium"].value(), 143.0);
        assert_eq!(extraction.values["Sodium"].status(), Status::Normal);
        assert_eq!(extraction.values["Neutrophils"].unit, "%");
    }

    #[test]
    fn section_headers_skipped() {
        let text = "ROUTINE CHEMISTRIES\nGlucose: 95";
        let extraction = extract(text);
        assert_eq!(extraction.values.len(), 1);
        assert!(extraction.values.contains_key("Glucose"));
    }

    #[test]
    fn patient_lines_skipped() {
        let text = "PATIENT ID: 12345\nDATE DRAWN: 20240207\nGlucose: 95";
        let extraction = extract(text);
        assert!(!extraction.values.keys().any(|k| k.contains("PATIENT")));
        assert!(extraction.values.contains_key("Glucose"));
    }

    #[test]
    fn parenthetical_content_dropped_from_name() {
        let text = "Bilirubin (total): 0.6";
        let extraction = extract(text);
        assert!(extraction.values.contains_key("Bilirubin"));
    }

    #[test]
    fn known_test_probe_multiword() {
        // The line pattern misses a row merged with trailing text; the
        // probe map still finds it.
        let text = "Labs follow Hemoglobin A1C: 5.9 H reviewed by staff";
        let extraction = extract(text);
        let reading = &extraction.values["Hemoglobin A1C"];
        assert_eq!(reading.value(), 5.9);
        assert_eq!(reading.status(), Status::High);
    }

    #[test]
    fn report_date_resolved() {
        let text = "PATIENT DEMOGRAPHICS\nDate of Report: 2/7/2024\nGlucose: 95";
        let extraction = extract(text);
        assert_eq!(
            extraction.collection_date,
            chrono::NaiveDate::from_ymd_opt(2024, 2, 7)
        );
    }

    #[test]
    fn lab_type_from_sections() {
        assert_eq!(detect_lab_type("CBC (COMPLETE BLOOD COUNT)\n..."), "CBC");
        assert_eq!(detect_lab_type("IRON STUDIES\n..."), "Ferro");
        assert_eq!(
            detect_lab_type("CBC (COMPLETE BLOOD COUNT)\nLIPID FRACTIONATION"),
            "Painel Completo"
        );
        assert_eq!(detect_lab_type("nothing known"), "Exame");
    }
}

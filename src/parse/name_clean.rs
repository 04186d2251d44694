//! Test-name normalization.
//!
//! Captured name substrings carry layout debris: unit fragments from the
//! previous field, repeated range numbers, page footers, signer
//! credentials, panel-header words, and OCR-split compounds. The cleaner
//! applies an ordered strip list until the name reaches a fixpoint, so
//! re-applying it to its own output is always a no-op.

use std::sync::LazyLock;

use regex::Regex;

use super::capture::STRUCTURAL_WORDS;

static RE_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static RE_OLOGY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^ology\s+").unwrap());
static RE_STATUS_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:New|Old|Final|Preliminary)\s+").unwrap());
static RE_PAGE_FOOTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*(?:PM|AM)\s+Page\s+\d+\s+of\s+\d+\s*").unwrap());
static RE_RANGE_REMNANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d.]+\s*-\s*[\d.]+\s*\)\s*").unwrap());
static RE_REF_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\(Ref:\s*[^)]+\)\s*").unwrap());
static RE_NUM_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[\d.]+\s*(?:mg/dL|ug/dL|mmol/L|g/dL|mL/min/m2|mL/min|U/L|%|fL|pg|PG/ML|NG/ML|K/UL|GM/DL|10\*[36]/uL)\s*",
    )
    .unwrap()
});
static RE_BARE_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:mg/dL|ug/dL|mmol/L|g/dL|mL/min|U/L|uL|fL|pg|PG/ML|NG/ML|K/UL|GM/DL|%)\s+")
        .unwrap()
});
static RE_TEN_POW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^10\*[36]/uL\s+").unwrap());
static RE_M2: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^m2\s+").unwrap());
static RE_VALUE_NUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Value\s+[\d.]+\s*").unwrap());
static RE_NUM_VALUE_NUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[\d.]+\s+Value\s+[\d.]+\s*").unwrap());
static RE_YES_NO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:Yes\s+|No\s+)+").unwrap());
static RE_NUM_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[\d.]+\s+){2,}(\D)").unwrap());
static RE_LEAD_NUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d.]+\s+([A-Za-z])").unwrap());
static RE_OR_BOUND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:or greater|or less)\s+").unwrap());
static RE_SIGNER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i).*?(?:MD|DO|PA|NP)\s*\([^)]*\)\s*").unwrap());
static RE_LEAD_LEVEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:High|Low|Normal)\s+").unwrap());
static RE_TRAIL_LEVEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(?:normal|high|low)$").unwrap());
static RE_PCT_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^%\s+").unwrap());
static RE_PAREN_REMNANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d.\-\s]+\)\s*").unwrap());
static RE_A1C: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bA1\s+C\b").unwrap());
static RE_B6: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bB\s+6\b").unwrap());
static RE_B12: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bB\s+12\b").unwrap());

/// Panel-header words that contaminate captured names when a heading sits
/// above the first table row. Stripped from the start, in any order.
static HEADER_WORDS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        "LABORATORIES",
        "ENDOCRINOLOGY",
        "PANEL",
        "COMPREHENSIVE",
        "METABOLIC",
        "DIFFERENTIAL",
        "CBC",
        "LIPID",
        "PROTEIN",
        "MARKERS",
    ]
    .iter()
    .map(|word| Regex::new(&format!(r"(?i)^{word}\s+")).unwrap())
    .collect()
});

/// Maximum fixpoint iterations. The strip rules only remove or
/// canonicalize text, so this bound is never reached in practice.
const MAX_PASSES: usize = 10;

/// Clean a raw captured test-name substring. Idempotent: the output is a
/// fixpoint of the strip rules. Returns an empty string for names that
/// reduce to nothing or to a structural word.
pub fn clean_test_name(raw: &str) -> String {
    let mut current = RE_WS.replace_all(raw, " ").trim().to_string();

    for _ in 0..MAX_PASSES {
        let next = clean_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }

    if STRUCTURAL_WORDS.contains(&current.to_lowercase().as_str()) {
        return String::new();
    }
    current
}

/// One pass over the strip list. `clean_test_name` iterates this until
/// the name stops changing.
fn clean_pass(name: &str) -> String {
    let mut s = name.to_string();

    s = RE_OLOGY.replace(&s, "").into_owned();
    s = RE_STATUS_WORD.replace(&s, "").into_owned();
    s = RE_PAGE_FOOTER.replace_all(&s, " ").into_owned();
    s = RE_RANGE_REMNANT.replace(&s, "").into_owned();
    s = RE_REF_PREFIX.replace(&s, "").into_owned();
    s = RE_NUM_UNIT.replace(&s, "").into_owned();
    s = RE_BARE_UNIT.replace(&s, "").into_owned();
    s = RE_TEN_POW.replace(&s, "").into_owned();
    s = RE_M2.replace(&s, "").into_owned();
    s = RE_NUM_VALUE_NUM.replace(&s, "").into_owned();
    s = RE_VALUE_NUM.replace(&s, "").into_owned();
    s = RE_YES_NO.replace(&s, "").into_owned();
    s = RE_NUM_RUN.replace(&s, "$1").into_owned();
    s = RE_LEAD_NUM.replace(&s, "$1").into_owned();
    s = RE_OR_BOUND.replace(&s, "").into_owned();
    s = RE_SIGNER.replace_all(&s, "").into_owned();
    s = RE_LEAD_LEVEL.replace(&s, "").into_owned();
    s = RE_TRAIL_LEVEL.replace(&s, "").into_owned();

    let mut stripped = s.trim().to_string();
    loop {
        let before = stripped.clone();
        for re in HEADER_WORDS.iter() {
            stripped = re.replace(&stripped, "").trim().to_string();
        }
        if stripped == before {
            break;
        }
    }

    stripped = RE_A1C.replace_all(&stripped, "A1C").into_owned();
    stripped = RE_B6.replace_all(&stripped, "B6").into_owned();
    stripped = RE_B12.replace_all(&stripped, "B12").into_owned();
    stripped = RE_PCT_PREFIX.replace(&stripped, "").into_owned();
    stripped = RE_LEAD_NUM.replace(&stripped, "$1").into_owned();
    stripped = RE_PAREN_REMNANT.replace(&stripped, "").into_owned();
    stripped = RE_WS.replace_all(&stripped, " ").trim().to_string();

    stripped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(clean_test_name("Sodium"), "Sodium");
        assert_eq!(clean_test_name("Anion Gap"), "Anion Gap");
        assert_eq!(clean_test_name("25-OH Vitamin D, Total"), "25-OH Vitamin D, Total");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(clean_test_name("Total   Protein"), "Total Protein");
        assert_eq!(clean_test_name("Anion\nGap"), "Anion Gap");
    }

    #[test]
    fn strips_status_word_prefixes() {
        assert_eq!(clean_test_name("Final Hemoglobin"), "Hemoglobin");
        assert_eq!(clean_test_name("Preliminary Glucose"), "Glucose");
        assert_eq!(clean_test_name("New Ferritin"), "Ferritin");
    }

    #[test]
    fn strips_laboratories_fragment() {
        // "Laboratories" often splits so only "ology" lands in the capture.
        assert_eq!(clean_test_name("ology Creatinine"), "Creatinine");
    }

    #[test]
    fn strips_range_remnant() {
        assert_eq!(clean_test_name("0.9 - 11.2) WBC"), "WBC");
    }

    #[test]
    fn strips_ref_prefix() {
        assert_eq!(clean_test_name("(Ref: 3.5 - 5.0) Potassium"), "Potassium");
    }

    #[test]
    fn strips_unit_leftovers() {
        assert_eq!(clean_test_name("mmol/L Chloride"), "Chloride");
        assert_eq!(clean_test_name("3.5 mg/dL Calcium"), "Calcium");
        assert_eq!(clean_test_name("10*3/uL Platelets"), "Platelets");
    }

    #[test]
    fn strips_page_footer() {
        assert_eq!(clean_test_name("PM Page 2 of 3 Albumin"), "Albumin");
    }

    #[test]
    fn strips_value_keyword_remnants() {
        assert_eq!(clean_test_name("Value 4.81 RBC"), "RBC");
        assert_eq!(clean_test_name("12.1 Value 4.81 RBC"), "RBC");
    }

    #[test]
    fn strips_yes_no_runs() {
        assert_eq!(clean_test_name("Yes Yes No Glucose"), "Glucose");
    }

    #[test]
    fn strips_leading_numbers() {
        assert_eq!(clean_test_name("4.81 Hematocrit"), "Hematocrit");
        assert_eq!(clean_test_name("1.2 3.4 5.6 Hematocrit"), "Hematocrit");
    }

    #[test]
    fn strips_signer_credentials() {
        assert_eq!(clean_test_name("Jane Roe MD (electronically signed) TSH"), "TSH");
    }

    #[test]
    fn strips_level_words() {
        assert_eq!(clean_test_name("High Triglycerides"), "Triglycerides");
        assert_eq!(clean_test_name("Triglycerides high"), "Triglycerides");
    }

    #[test]
    fn strips_header_words_in_any_order() {
        assert_eq!(clean_test_name("COMPREHENSIVE METABOLIC PANEL Sodium"), "Sodium");
        assert_eq!(clean_test_name("PANEL LIPID Cholesterol"), "Cholesterol");
        assert_eq!(clean_test_name("CBC DIFFERENTIAL Monocytes"), "Monocytes");
    }

    #[test]
    fn repairs_ocr_split_compounds() {
        assert_eq!(clean_test_name("Hemoglobin A1 C"), "Hemoglobin A1C");
        assert_eq!(clean_test_name("Vitamin B 12"), "Vitamin B12");
        assert_eq!(clean_test_name("Vitamin B 6"), "Vitamin B6");
    }

    #[test]
    fn strips_percent_prefix() {
        assert_eq!(clean_test_name("% Saturation"), "Saturation");
    }

    #[test]
    fn blacklisted_words_reduce_to_empty() {
        for word in ["Total", "range", "NAME", "value", "date", "unit", "test",
                     "patient", "age", "sex", "DOB", "reference", "order",
                     "collected", "reported"] {
            assert_eq!(clean_test_name(word), "", "{word} should clean to empty");
        }
    }

    #[test]
    fn idempotent_on_fixtures() {
        let fixtures = [
            "Sodium",
            "Final Hemoglobin",
            "0.9 - 11.2) WBC",
            "mmol/L Chloride",
            "COMPREHENSIVE METABOLIC PANEL Sodium",
            "Hemoglobin A1 C",
            "% Saturation",
            "Yes Yes No Glucose",
            "25-OH Vitamin D, Total",
            "1.2 3.4 5.6 Hematocrit",
            "ology Creatinine",
            "Value 4.81 RBC",
        ];
        for raw in fixtures {
            let once = clean_test_name(raw);
            let twice = clean_test_name(&once);
            assert_eq!(once, twice, "clean_test_name not idempotent for {raw:?}");
        }
    }
}

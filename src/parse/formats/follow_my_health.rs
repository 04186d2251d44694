//! Follow My Health (myHealth@SC) exports.
//!
//! The text layer arrives as long lines whose columns are separated by
//! runs of 3+ spaces. Rather than one row regex, the extractor splits
//! the text into cells and walks a known test-name list: the cell after
//! a test name (skipping the resulted-on date) is the value, then unit,
//! then range.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::models::MarkerReading;
use crate::parse::capture::Captured;
use crate::parse::lab_type::clean_lab_type;
use crate::parse::status::{classify, RefRange};
use crate::parse::{dates, formats::Extraction};

const KNOWN_TESTS: &[&str] = &[
    "WBC", "RBC", "HEMOGLOBIN (HGB)", "HEMATOCRIT (HCT)",
    "MCV", "MCH", "MCHC", "RDW-SD", "PLT", "MPV",
    "NEU%", "LYM%", "MONO%", "EOS%", "BASO%",
    "ABS NEU", "ABS LYM", "ABS MONO", "ABS EOS", "ABS BASO",
    "IMM. GRAN %", "ABS IMM. GRAN", "NRBC %", "ABS NRBC",
    "CHOLESTEROL", "TRIGLYCERIDES", "HDL", "LDL, CALCULATED", "VLDL",
    "CHOL/HDL", "HEMOGLOBIN A1C", "ESTIMATED AVERAGE GLUCOSE",
    "IRON", "% SATURATION", "FERRITIN", "TIBC",
];

static RE_CELL_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{3,}").unwrap());
static RE_DATE_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").unwrap());
static RE_UNIT_CELL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z/%]+$").unwrap());
static RE_RANGE_CELL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\d.\-<>]+$").unwrap());
static RE_ORDER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)Order:\s+([A-Z][A-Z \d\-/(),]+?)(?:\s+Ordered On:|$)").unwrap()
});

pub fn extract(text: &str) -> Extraction {
    let collection_date = dates::resolve_single(text);
    Extraction {
        lab_type: detect_lab_type(text),
        collection_date,
        dates: collection_date.into_iter().collect(),
        values: walk_cells(text).into_map(),
        is_period: false,
    }
}

fn walk_cells(text: &str) -> Captured {
    let mut captured = Captured::new();
    let cells: Vec<&str> = RE_CELL_SPLIT
        .split(text)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    debug!(cells = cells.len(), "follow-my-health cell walk");

    for (i, cell) in cells.iter().enumerate() {
        let upper = cell.to_uppercase();
        // Longest match wins so an MCHC cell is not claimed by MCH.
        let Some(test) = KNOWN_TESTS
            .iter()
            .filter(|t| upper.contains(*t))
            .max_by_key(|t| t.len())
        else {
            continue;
        };

        let mut value_idx = i + 1;
        if value_idx < cells.len() && RE_DATE_CELL.is_match(cells[value_idx]) {
            value_idx += 1;
        }
        let Some(value_cell) = cells.get(value_idx) else { continue };
        let Ok(value) = value_cell.parse::<f64>() else { continue };

        let mut unit = "";
        let mut range = "";
        if let Some(next) = cells.get(value_idx + 1) {
            if RE_UNIT_CELL.is_match(next) && next.len() < 10 && !next.contains("myHealth") {
                unit = next;
                if let Some(range_cell) = cells.get(value_idx + 2) {
                    if RE_RANGE_CELL.is_match(range_cell) {
                        range = range_cell;
                    }
                }
            }
        }

        let status = classify(value, RefRange::parse(range).as_ref(), None);
        let name = display_name(test);
        if captured.insert(name.clone(), MarkerReading::single(value, unit, range, status)) {
            debug!(name = %name, value, "accepted cell-walk reading");
        }
    }
    captured
}

/// Presentable name for a matched list entry: drop the parenthetical
/// abbreviations and move the `ABS` prefix behind the name.
fn display_name(test: &str) -> String {
    let name = test.replace(" (HGB)", "").replace(" (HCT)", "");
    match name.strip_prefix("ABS ") {
        Some(rest) => format!("{rest} Abs"),
        None => name,
    }
}

fn detect_lab_type(text: &str) -> Option<String> {
    let orders: Vec<String> = RE_ORDER_LINE
        .captures_iter(text)
        .map(|caps| caps[1].trim().to_string())
        .collect();

    match orders.len() {
        0 => None,
        1 => {
            let order = &orders[0];
            let label = if order.contains("CBC") {
                "CBC".to_string()
            } else if order.contains("LIPID") {
                "Lipídios".to_string()
            } else if order.contains("A1C") {
                "A1C".to_string()
            } else if order.contains("IRON") {
                "Ferro".to_string()
            } else {
                clean_lab_type(order)
            };
            Some(label)
        }
        _ => Some("Painel Completo".to_string()),
    }
}

//! MyChart single-date exports.
//!
//! The text layer flattens each result card into a run like
//! `Sodium  Normal range: 134 - 145 mmol/L  134 134   145 145  138`,
//! repeating the range boundaries around the plotted value. Several
//! sibling renderings exist (a bare `Value` keyword, `above >x` /
//! `below <x` thresholds, a split value on the next line), each covered
//! by one strategy row.

use std::sync::LazyLock;

use regex::Regex;

use crate::parse::capture::Captured;
use crate::parse::engine::{self, PatternStrategy, Shape};
use crate::parse::lab_type::{ampersand, clean_lab_type};
use crate::parse::{dates, formats::Extraction};

// Visual-chart rows run first: their name group admits a digit-dash
// prefix ("25-OH Vitamin D"), so they must claim those rows before the
// broader letter-anchored pattern captures the truncated suffix.
static RE_VISUAL_CHART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)((?:\d+-)?[A-Za-z][A-Za-z0-9\s\-/(),]{2,50})[\s\n]+Normal\s+(?:range|value):\s*([\d.]+)\s*-\s*([\d.]+)\s+([A-Za-z/*%\d]+)",
    )
    .unwrap()
});
static RE_RANGE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([A-Za-z][A-Za-z0-9\s\-/(),]{0,80}?)[\s\n]+Normal\s+(?:range|value):\s*([\d.]+)\s*-\s*([\d.]+)\s+([A-Za-z*%/\d]+)",
    )
    .unwrap()
});
static RE_VALUE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([A-Za-z][A-Za-z0-9\s\-/(),]+?)\s+Normal (?:range|value):[^V]+Value\s+([\d.]+)")
        .unwrap()
});
static RE_ABOVE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([A-Za-z][A-Za-z0-9\s\-/(),]+?)\s+Normal\s+(?:range|value):\s*above\s*>?([\d.]+)\s*([A-Za-z/]+)[\s\S]{0,100}?Value\s+>?([\d.]+)",
    )
    .unwrap()
});
static RE_BELOW_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([A-Za-z][A-Za-z0-9\s\-/(),]+?)\s+Normal range:\s*below\s*<?([\d.]+)\s*([A-Za-z/*%]+)[^V]*Value\s+([\d.]+)",
    )
    .unwrap()
});
static RE_INLINE_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([A-Za-z][A-Za-z\s\-/0-9]+?)\s+Normal\s+(?:range|value):\s*([\d.]+)\s*-\s*([\d.]+)\s+([A-Za-z/*%]+)[\s\S]{0,200}?([\d.]+)\s+(High|Low)",
    )
    .unwrap()
});
static RE_SPLIT_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([A-Za-z0-9][A-Za-z0-9\s\-/(),]{2,60}?)\s+Normal\s+(?:range|value):\s*(?:below\s*<?|above\s*>?)?\s*([\d.]+)(?:\s*-\s*([\d.]+))?\s+([A-Za-z/]+)[\s\S]{0,50}?Value\s+([\d.]+)",
    )
    .unwrap()
});
static RE_VITAMIN_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(Vitamin\s+[A-Za-z0-9,\s()\-]+?)\s+Normal\s+range:\s*([\d.]+)\s*-\s*([\d.]+)\s+([A-Za-z/]+)",
    )
    .unwrap()
});

static STRATEGIES: [PatternStrategy; 8] = [
    PatternStrategy {
        label: "visual-chart",
        regex: &RE_VISUAL_CHART,
        shape: Shape::BoundedScan { window: 600 },
        reject_contains: &[],
    },
    PatternStrategy {
        label: "range-row",
        regex: &RE_RANGE_ROW,
        shape: Shape::BoundedScan { window: 600 },
        reject_contains: &[],
    },
    PatternStrategy {
        label: "above-threshold",
        regex: &RE_ABOVE_ROW,
        shape: Shape::AboveValue,
        reject_contains: &[],
    },
    PatternStrategy {
        label: "below-threshold",
        regex: &RE_BELOW_ROW,
        shape: Shape::BelowValue,
        reject_contains: &[],
    },
    PatternStrategy {
        label: "inline-flag",
        regex: &RE_INLINE_FLAG,
        shape: Shape::InlineFlag,
        reject_contains: &[],
    },
    PatternStrategy {
        label: "split-value",
        regex: &RE_SPLIT_VALUE,
        shape: Shape::OptionalHigh,
        reject_contains: &[],
    },
    // Bare `Value N` fallback: runs after the threshold shapes so rows
    // that do print a range keep their range semantics.
    PatternStrategy {
        label: "value-keyword",
        regex: &RE_VALUE_KEYWORD,
        shape: Shape::BareValue,
        reject_contains: &[],
    },
    PatternStrategy {
        label: "vitamin-row",
        regex: &RE_VITAMIN_ROW,
        shape: Shape::BoundedScan { window: 200 },
        reject_contains: &[],
    },
];

static RE_KNOWN_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(COMPREHENSIVE METABOLIC PANEL|CBC W.*?DIFFERENTIAL|HEMOGLOBIN A1C|A1C|IRON AND TOTAL IRON BINDING|LIPID PANEL|25-OH VITAMIN D|VITAMIN D|VITAMIN C|VITAMIN A|VITAMIN B-?12|B-?12|FERRITIN|FOLATE|C-REACTIVE PROTEIN|HIGH SENSITIVITY C-REACTIVE|HSCRP|THIAMINE|B-?1)",
    )
    .unwrap()
});
static RE_GENERIC_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z][A-Z\s\d\-/(),&]{4,80})[\s\n]+Collected on").unwrap()
});
static RE_TITLE_QUALIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",?\s+(TOTAL|FREE|INTACT)$").unwrap());
static RE_TITLE_WITH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+W/.*$").unwrap());
static RE_B12_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bB-?12\b").unwrap());
static RE_B1_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bB-?1\b").unwrap());

pub fn extract(text: &str) -> Extraction {
    let mut captured = Captured::new();
    engine::run(text, &STRATEGIES, &mut captured);

    let collection_date = dates::resolve_single(text);
    Extraction {
        lab_type: detect_lab_type(text),
        collection_date,
        dates: collection_date.into_iter().collect(),
        values: captured.into_map(),
        is_period: false,
    }
}

fn detect_lab_type(text: &str) -> Option<String> {
    if let Some(caps) = RE_KNOWN_TITLE.captures(text) {
        return Some(map_known_title(&caps[1]));
    }
    let caps = RE_GENERIC_TITLE.captures(text)?;
    let title = caps[1].trim().to_string();
    let title = RE_TITLE_QUALIFIER.replace(&title, ", $1");
    let title = RE_TITLE_WITH.replace(&title, "");
    Some(clean_lab_type(&ampersand(title.trim())))
}

fn map_known_title(title: &str) -> String {
    let upper = title.to_uppercase();
    if upper.contains("COMPREHENSIVE METABOLIC") {
        "CMP".into()
    } else if upper.contains("CBC") {
        "CBC".into()
    } else if upper.contains("A1C") {
        "A1C".into()
    } else if upper.contains("IRON") {
        "Ferro".into()
    } else if upper.contains("LIPID") {
        "Lipídios".into()
    } else if upper.contains("VITAMIN D") {
        "Vitamina D".into()
    } else if upper.contains("VITAMIN C") {
        "Vitamina C".into()
    } else if upper.contains("VITAMIN A") {
        "Vitamina A".into()
    } else if RE_B12_WORD.is_match(&upper) {
        "B12".into()
    } else if RE_B1_WORD.is_match(&upper) {
        "B1".into()
    } else if upper.contains("FERRITIN") {
        "Ferritina".into()
    } else if upper.contains("FOLATE") {
        "Folato".into()
    } else if upper.contains("C-REACTIVE") || upper.contains("HSCRP") {
        "PCR".into()
    } else if upper.contains("THIAMINE") {
        "B1".into()
    } else {
        clean_lab_type(title)
    }
}

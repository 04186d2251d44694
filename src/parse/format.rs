//! Vendor-layout recognition.
//!
//! An ordered decision list: earlier rules are more specific and must win
//! over the broader rules below them, because several vendors share
//! header phrases. Images never reach this classifier; the caller tags
//! them `chart-ocr` before OCR text even exists.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::models::LabFormat;

static RE_PAST_RESULTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Past Results").unwrap());
static RE_PERIOD_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Standard Range\s+\d{1,2}/\d{1,2}/\d{2,4}\s+\d{1,2}/\d{1,2}/\d{2,4}").unwrap()
});
static RE_FILENAME_COPY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d+)\)").unwrap());
static RE_HEALOW_TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}/\d{2}/\d{4}\s+\d{2}:\d{2}:\d{2}").unwrap());

/// Pick the extraction grammar for a document from its text and filename.
/// Deterministic and total: every input gets a tag.
pub fn classify_format(text: &str, filename: &str) -> LabFormat {
    let format = classify_inner(text, filename);
    debug!(filename, format = format.as_str(), "classified document");
    format
}

fn classify_inner(text: &str, filename: &str) -> LabFormat {
    // Memorial Health: demographics header plus report date, but not the
    // order block that marks UI Health nor the myHealth@SC portal brand.
    if text.contains("PATIENT DEMOGRAPHICS")
        && text.contains("Date of Report:")
        && !text.contains("ORDER INFORMATION")
        && !text.contains("myHealth@SC")
    {
        return LabFormat::MemorialHealth;
    }

    if text.contains("myHealth@SC")
        || text.contains("Follow My Health")
        || (text.contains("Resulted") && text.contains("On") && text.contains("Source"))
    {
        return LabFormat::FollowMyHealth;
    }

    if text.contains("UI Health Pathology Laboratories")
        || (text.contains("PATIENT DEMOGRAPHICS") && text.contains("ORDER INFORMATION"))
    {
        return LabFormat::UiHealth;
    }

    // Period documents: `_all` exports, a "Past Results" title, or a
    // Standard Range header trailed by at least two column dates.
    if filename.contains("_all")
        || RE_PAST_RESULTS.is_match(text)
        || (text.contains("Standard Range") && RE_PERIOD_HEADER.is_match(text))
    {
        return LabFormat::MyChartPeriod;
    }

    // Browser download copies carry a parenthesized counter; in this
    // corpus copies (3) and up came from the Healow portal.
    if let Some(caps) = RE_FILENAME_COPY.captures(filename) {
        if let Ok(n) = caps[1].parse::<u32>() {
            return if n >= 3 {
                LabFormat::Healow
            } else {
                LabFormat::MyChartSingle
            };
        }
    }

    if text.contains("Collection Date:") && RE_HEALOW_TIMESTAMP.is_match(text) {
        return LabFormat::Healow;
    }

    if text.contains("Collected on") || text.contains("MyChart") {
        return LabFormat::MyChartSingle;
    }

    LabFormat::MyChartSingle
}

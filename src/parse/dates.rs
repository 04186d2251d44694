//! Collection-date resolution.
//!
//! Two paths: a single-date cascade over the labels vendors print next to
//! the collection timestamp, and a period path that pulls the ordered
//! column dates out of a `Standard Range` header row while excluding the
//! patient's date of birth.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use tracing::debug;

/// Dates outside this window are layout noise (an MRN fragment, a torn
/// year), not plausible collection dates.
const MIN_YEAR: i32 = 1970;
const MAX_YEAR: i32 = 2030;

/// Two-digit years pivot here: `< 50` means 2000s, `>= 50` means 1900s.
const YEAR_PIVOT: i32 = 50;

static RE_COLLECTED_ON_LONG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Collected on\s+([A-Za-z]+)\s+(\d{1,2}),\s+(\d{4})").unwrap()
});
static RE_COLLECTION_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Collection Date:\s*(\d{1,2})/(\d{1,2})/(\d{4})").unwrap()
});
static RE_COLLECTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Collected:\s*(\d{1,2})/(\d{1,2})/(\d{4})").unwrap()
});
static RE_COLLECTED_ON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Collected On:\s*(\d{1,2})/(\d{1,2})/(\d{4})").unwrap()
});
static RE_REPORT_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Date of Report:\s*(\d{1,2})/(\d{1,2})/(\d{4})").unwrap()
});
static RE_BARE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})").unwrap());
static RE_PRINTED_ON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Printed on:\s*(\d{1,2})/(\d{1,2})/(\d{4})").unwrap()
});

static RE_DOB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:DOB|Date of Birth|Birth Date)[:\s]*(\d{1,2}/\d{1,2}/\d{2,4})").unwrap()
});
static RE_PERIOD_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Standard Range\s+((?:\d{1,2}/\d{1,2}/\d{2,4}\s*){2,})").unwrap()
});
static RE_DATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{2,4})").unwrap());

/// Resolve the single collection date of a document. Tries each label the
/// vendors use, in order; first match wins. `None` is not an error: the
/// document simply carries no date.
pub fn resolve_single(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = RE_COLLECTED_ON_LONG.captures(text) {
        let month = month_from_name(&caps[1])?;
        let day: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    for re in [
        &*RE_COLLECTION_DATE,
        &*RE_COLLECTED,
        &*RE_COLLECTED_ON,
        &*RE_REPORT_DATE,
        &*RE_BARE_DATE,
    ] {
        if let Some(caps) = re.captures(text) {
            if let Some(date) = mdy_from_caps(&caps) {
                return Some(date);
            }
        }
    }
    None
}

/// Date for an OCR'd flowsheet image: any bare `M/D/YYYY` in the header,
/// else the `Printed on:` footer.
pub fn resolve_ocr(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = RE_BARE_DATE.captures(text) {
        if let Some(date) = mdy_from_caps(&caps) {
            return Some(date);
        }
    }
    RE_PRINTED_ON.captures(text).and_then(|caps| mdy_from_caps(&caps))
}

/// Resolve the ordered column dates of a period document.
///
/// The header row is anchored by the literal `Standard Range` followed by
/// two or more date tokens, left to right oldest first. A token is
/// dropped when its literal string equals the patient's DOB string, when
/// it does not parse, or when it falls outside the plausible window.
pub fn resolve_period(text: &str) -> Vec<NaiveDate> {
    let dob_literal = RE_DOB
        .captures(text)
        .map(|caps| caps[1].to_string());
    if let Some(ref dob) = dob_literal {
        debug!(dob = %dob, "period header: excluding DOB token");
    }

    let Some(header) = RE_PERIOD_HEADER.captures(text) else {
        debug!("period header not found");
        return Vec::new();
    };

    let mut dates = Vec::new();
    for caps in RE_DATE_TOKEN.captures_iter(&header[1]) {
        let literal = caps[0].to_string();
        if dob_literal.as_deref() == Some(literal.as_str()) {
            debug!(token = %literal, "dropping DOB token from header");
            continue;
        }
        let Some(date) = parse_mdy(&caps[1], &caps[2], &caps[3]) else {
            debug!(token = %literal, "dropping unparseable header token");
            continue;
        };
        if date.year() < MIN_YEAR || date.year() > MAX_YEAR {
            debug!(token = %literal, "dropping header token outside window");
            continue;
        }
        dates.push(date);
    }
    dates
}

fn mdy_from_caps(caps: &regex::Captures<'_>) -> Option<NaiveDate> {
    parse_mdy(&caps[1], &caps[2], &caps[3])
}

/// Parse month/day/year strings, widening 2-digit years with the pivot.
fn parse_mdy(month: &str, day: &str, year: &str) -> Option<NaiveDate> {
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    let mut year: i32 = year.parse().ok()?;
    if year < 100 {
        year += if year < YEAR_PIVOT { 2000 } else { 1900 };
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_from_name(name: &str) -> Option<u32> {
    let month = match name.to_lowercase().as_str() {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // --- single-date cascade ---

    #[test]
    fn collected_on_month_name() {
        let text = "HEMOGLOBIN A1C\nCollected on January 5, 2023\nNormal range";
        assert_eq!(resolve_single(text), Some(date(2023, 1, 5)));
    }

    #[test]
    fn collection_date_with_timestamp() {
        let text = "Collection Date: 03/16/2023 08:15:00";
        assert_eq!(resolve_single(text), Some(date(2023, 3, 16)));
    }

    #[test]
    fn collected_with_time() {
        let text = "Collected: 7/2/2022 14:05  Received: 7/2/2022";
        assert_eq!(resolve_single(text), Some(date(2022, 7, 2)));
    }

    #[test]
    fn collected_on_slash_form() {
        let text = "Order: CBC WITH DIFFERENTIAL Collected On: 01/12/2023";
        assert_eq!(resolve_single(text), Some(date(2023, 1, 12)));
    }

    #[test]
    fn date_of_report() {
        let text = "PATIENT DEMOGRAPHICS\nDate of Report: 2/7/2024";
        assert_eq!(resolve_single(text), Some(date(2024, 2, 7)));
    }

    #[test]
    fn bare_date_fallback() {
        assert_eq!(resolve_single("report from 11/30/2021 follows"), Some(date(2021, 11, 30)));
    }

    #[test]
    fn no_date_is_none() {
        assert_eq!(resolve_single("no dates here"), None);
    }

    #[test]
    fn month_name_wins_over_bare_date() {
        let text = "Collected on March 3, 2022\nPrinted 01/01/2024";
        assert_eq!(resolve_single(text), Some(date(2022, 3, 3)));
    }

    // --- OCR path ---

    #[test]
    fn ocr_bare_date() {
        assert_eq!(resolve_ocr("Flowsheet 3/16/2023\nHemoglobin 13.2"), Some(date(2023, 3, 16)));
    }

    #[test]
    fn ocr_printed_on_footer() {
        assert_eq!(resolve_ocr("no header date\nPrinted on: 4/1/2023"), Some(date(2023, 4, 1)));
    }

    #[test]
    fn ocr_no_date_is_none() {
        assert_eq!(resolve_ocr("Hemoglobin 13.2 L"), None);
    }

    // --- period path ---

    #[test]
    fn period_header_dates_in_order() {
        let text = "CBC - Past Results\nName Standard Range 1/29/18 10/18/19 5/26/20";
        assert_eq!(
            resolve_period(text),
            vec![date(2018, 1, 29), date(2019, 10, 18), date(2020, 5, 26)]
        );
    }

    #[test]
    fn period_excludes_dob_literal() {
        let text = "DOB: 1/5/19\nStandard Range 1/5/19 1/5/20 1/5/21";
        assert_eq!(resolve_period(text), vec![date(2020, 1, 5), date(2021, 1, 5)]);
    }

    #[test]
    fn period_keeps_date_when_literal_differs_from_dob() {
        // Same calendar day as DOB but written differently, so kept.
        let text = "DOB: 01/05/2019\nStandard Range 1/5/19 1/5/20";
        assert_eq!(resolve_period(text), vec![date(2019, 1, 5), date(2020, 1, 5)]);
    }

    #[test]
    fn period_two_digit_year_pivot() {
        let text = "Standard Range 6/1/49 6/1/51";
        assert_eq!(resolve_period(text), vec![date(2049, 6, 1), date(1951, 6, 1)]);
    }

    #[test]
    fn period_window_filter() {
        let text = "Standard Range 1/1/1965 1/1/2031 5/26/20";
        assert_eq!(resolve_period(text), vec![date(2020, 5, 26)]);
    }

    #[test]
    fn period_invalid_date_dropped() {
        let text = "Standard Range 2/30/20 5/26/20";
        assert_eq!(resolve_period(text), vec![date(2020, 5, 26)]);
    }

    #[test]
    fn period_requires_two_header_dates() {
        assert!(resolve_period("Standard Range 1/5/20").is_empty());
        assert!(resolve_period("no header at all").is_empty());
    }
}

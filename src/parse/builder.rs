//! Document orchestration: classify, dispatch, assemble.
//!
//! Best-effort by design. A strategy that matches nothing contributes
//! nothing; a document with zero extracted markers is still a valid
//! (empty) document. The only failure a caller ever sees is having no
//! raw text at all; everything else degrades to partial output with a
//! log line.

use tracing::{info, warn};

use crate::models::{lab_id_from_filename, LabDocument, LabFormat};

use super::format::classify_format;
use super::formats::{
    chart_ocr, follow_my_health, healow, memorial, mychart_single, period, ui_health, Extraction,
};
use super::lab_type;
use super::sanitize::sanitize_raw_text;
use super::ParseError;

/// Parse the text layer of a PDF report into a `LabDocument`.
pub fn parse_document(filename: &str, raw_text: &str) -> Result<LabDocument, ParseError> {
    if raw_text.trim().is_empty() {
        return Err(ParseError::Unreadable(filename.to_string()));
    }
    let text = sanitize_raw_text(raw_text);
    let format = classify_format(&text, filename);

    let extraction = match format {
        LabFormat::MyChartSingle => mychart_single::extract(&text),
        LabFormat::Healow => healow::extract(&text),
        LabFormat::MyChartPeriod => period::extract(&text),
        LabFormat::UiHealth => ui_health::extract(&text),
        LabFormat::FollowMyHealth => follow_my_health::extract(&text),
        LabFormat::MemorialHealth => memorial::extract(&text),
        LabFormat::ChartOcr => chart_ocr::extract(&text),
    };

    Ok(assemble(filename, format, text, extraction))
}

/// Parse OCR output for a scanned image. Images never go through the
/// classifier; they are chart-OCR documents by construction.
pub fn parse_ocr_document(filename: &str, ocr_text: &str) -> Result<LabDocument, ParseError> {
    if ocr_text.trim().is_empty() {
        return Err(ParseError::Unreadable(filename.to_string()));
    }
    let text = sanitize_raw_text(ocr_text);
    let extraction = chart_ocr::extract(&text);
    Ok(assemble(filename, LabFormat::ChartOcr, text, extraction))
}

fn assemble(
    filename: &str,
    format: LabFormat,
    raw_text: String,
    extraction: Extraction,
) -> LabDocument {
    let Extraction {
        lab_type,
        collection_date,
        dates,
        values,
        is_period,
    } = extraction;

    // Title detection failing is common; the filename usually still
    // names the test.
    let lab_type = lab_type.unwrap_or_else(|| lab_type::from_filename(filename));

    if values.is_empty() {
        warn!(filename, format = format.as_str(), "no markers extracted");
    } else {
        info!(
            filename,
            format = format.as_str(),
            markers = values.len(),
            "document parsed"
        );
    }

    LabDocument {
        id: lab_id_from_filename(filename),
        filename: filename.to_string(),
        format,
        lab_type,
        is_period,
        collection_date,
        dates,
        values,
        raw_text,
    }
}

//! Lab-report text normalization.
//!
//! Takes the raw text of a laboratory report (the text layer of a PDF or
//! the output of OCR on a scanned image), recognizes which vendor layout
//! produced it, and extracts a normalized record of test markers with
//! values, units, reference ranges, and abnormality status. When one
//! document reports several collection dates, readings become dated time
//! series.
//!
//! Parsing is synchronous and pure: all pattern tables and the marker
//! alias table are read-only statics, so documents may be parsed
//! concurrently without shared state.

pub mod catalog;
pub mod models;
pub mod parse;

pub use models::{DataPoint, LabDocument, LabFormat, MarkerReading, Reading, Status};
pub use parse::builder::{parse_document, parse_ocr_document};
pub use parse::ParseError;

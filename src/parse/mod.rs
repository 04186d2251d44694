pub mod aliases;
pub mod builder;
pub mod capture;
pub mod dates;
pub mod engine;
pub mod format;
pub mod formats;
pub mod lab_type;
pub mod name_clean;
pub mod sanitize;
pub mod status;

pub use aliases::{aliases_of, canonicalize};
pub use builder::{parse_document, parse_ocr_document};
pub use format::classify_format;
pub use name_clean::clean_test_name;

use thiserror::Error;

/// Errors visible to callers of the parse pipeline.
///
/// Extraction is best-effort and never fatal: a strategy that does not
/// match simply contributes no reading, and a document with zero markers
/// is still a valid (empty) document. The only failure a caller sees is
/// having no raw text to work with at all.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("document unreadable: no raw text for {0}")]
    Unreadable(String),
}

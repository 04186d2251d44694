use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::LabFormat;
use super::reading::MarkerReading;

/// A fully parsed laboratory document, ready for the persistence layer.
///
/// Built once per source file by the parse pipeline and never mutated
/// afterward; a re-parse replaces it wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabDocument {
    /// Stable id derived from the filename (see [`lab_id_from_filename`]).
    pub id: String,
    pub filename: String,
    pub format: LabFormat,
    /// Free-text human label for the panel, e.g. `"CBC"`, `"Vitamina D"`.
    pub lab_type: String,
    pub is_period: bool,
    /// Single collection date; for period documents, the most recent of
    /// `dates`. `None` when no date could be resolved.
    pub collection_date: Option<NaiveDate>,
    /// Column dates for period documents, oldest first. Empty or a single
    /// entry for single-date documents.
    pub dates: Vec<NaiveDate>,
    /// Marker name → reading.
    pub values: BTreeMap<String, MarkerReading>,
    pub raw_text: String,
}

impl LabDocument {
    /// Count of readings whose latest value is flagged or out of range.
    pub fn abnormal_count(&self) -> usize {
        self.values
            .values()
            .filter(|r| r.status() != super::Status::Normal)
            .count()
    }
}

/// Stable document id derived from the source filename: every
/// non-alphanumeric character becomes `-`, the rest is lowercased.
pub fn lab_id_from_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

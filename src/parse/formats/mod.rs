pub mod chart_ocr;
pub mod follow_my_health;
pub mod healow;
pub mod memorial;
pub mod mychart_single;
pub mod period;
pub mod ui_health;

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::MarkerReading;

/// What one format strategy pulls out of a document. The builder folds
/// this into the final `LabDocument`.
#[derive(Debug, Default)]
pub struct Extraction {
    pub lab_type: Option<String>,
    pub collection_date: Option<NaiveDate>,
    pub dates: Vec<NaiveDate>,
    pub values: BTreeMap<String, MarkerReading>,
    pub is_period: bool,
}

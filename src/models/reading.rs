use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::Status;

/// One measured value inside a multi-date (period) reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub status: Status,
}

/// The measured side of a reading: either one value from a single-date
/// report, or an ordered series of dated values when the document reports
/// the same marker across several collection dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reading {
    Single { value: f64, status: Status },
    /// `points` is non-empty and sorted ascending by date.
    Period { points: Vec<DataPoint> },
}

/// A normalized test-marker reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerReading {
    /// Unit as printed, e.g. `"mmol/L"`. Empty when the report omits it.
    pub unit: String,
    /// Reference range as printed, e.g. `"4.0 - 11.0"`, `"< 5.0"`,
    /// `"> 20.0"`. Empty when the report omits it.
    pub range: String,
    pub reading: Reading,
}

impl MarkerReading {
    pub fn single(
        value: f64,
        unit: impl Into<String>,
        range: impl Into<String>,
        status: Status,
    ) -> Self {
        Self {
            unit: unit.into(),
            range: range.into(),
            reading: Reading::Single { value, status },
        }
    }

    /// Build a period reading. Returns `None` for an empty point list so
    /// that `value()` and `status()` always have a latest point to mirror.
    pub fn period(
        unit: impl Into<String>,
        range: impl Into<String>,
        points: Vec<DataPoint>,
    ) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        Some(Self {
            unit: unit.into(),
            range: range.into(),
            reading: Reading::Period { points },
        })
    }

    /// Latest (or only) value, for single-value consumers.
    pub fn value(&self) -> f64 {
        match &self.reading {
            Reading::Single { value, .. } => *value,
            Reading::Period { points } => points.last().map(|p| p.value).unwrap_or_default(),
        }
    }

    /// Status of the latest (or only) value.
    pub fn status(&self) -> Status {
        match &self.reading {
            Reading::Single { status, .. } => *status,
            Reading::Period { points } => {
                points.last().map(|p| p.status).unwrap_or(Status::Normal)
            }
        }
    }

    /// The dated series, when this reading came from a period document.
    pub fn data_points(&self) -> Option<&[DataPoint]> {
        match &self.reading {
            Reading::Single { .. } => None,
            Reading::Period { points } => Some(points),
        }
    }

    pub fn is_period(&self) -> bool {
        matches!(self.reading, Reading::Period { .. })
    }
}

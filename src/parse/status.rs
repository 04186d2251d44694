//! Reference-range parsing and abnormality classification.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Flag, Status};

/// A reference range in one of the three textual shapes vendor reports
/// print. Each shape is parsed independently since formats mix them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefRange {
    /// `"low - high"` (also printed without spaces, `"70-99"`).
    Bounded { low: f64, high: f64 },
    /// `"> x"` / `"above >x"`: values at or above x are expected.
    Above(f64),
    /// `"< x"` / `"below <x"`: values below x are expected.
    Below(f64),
}

static RE_BOUNDED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d.]+)\s*-\s*([\d.]+)").unwrap());
static RE_BELOW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:below\s*)?<\s*([\d.]+)").unwrap());
static RE_ABOVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:above\s*)?>\s*([\d.]+)").unwrap());

impl RefRange {
    /// Parse a printed reference range. Returns `None` for free text that
    /// carries no usable bounds (e.g. `"See below"`).
    pub fn parse(text: &str) -> Option<Self> {
        if let Some(caps) = RE_BOUNDED.captures(text) {
            let low = caps.get(1)?.as_str().parse::<f64>().ok()?;
            let high = caps.get(2)?.as_str().parse::<f64>().ok()?;
            return Some(Self::Bounded { low, high });
        }
        if let Some(caps) = RE_BELOW.captures(text) {
            let threshold = caps.get(1)?.as_str().parse::<f64>().ok()?;
            return Some(Self::Below(threshold));
        }
        if let Some(caps) = RE_ABOVE.captures(text) {
            let threshold = caps.get(1)?.as_str().parse::<f64>().ok()?;
            return Some(Self::Above(threshold));
        }
        None
    }

    /// Classify a value against this range.
    pub fn classify(&self, value: f64) -> Status {
        match *self {
            Self::Bounded { low, high } => {
                if value < low {
                    Status::Low
                } else if value > high {
                    Status::High
                } else {
                    Status::Normal
                }
            }
            Self::Below(threshold) => {
                if value >= threshold {
                    Status::High
                } else {
                    Status::Normal
                }
            }
            Self::Above(threshold) => {
                if value >= threshold {
                    Status::Normal
                } else {
                    Status::Low
                }
            }
        }
    }
}

/// Derive the status for a value. An explicit printed flag is
/// authoritative and overrides any range computation; without a flag or a
/// parseable range the value is taken as normal.
pub fn classify(value: f64, range: Option<&RefRange>, flag: Option<Flag>) -> Status {
    if let Some(flag) = flag {
        return flag.status();
    }
    range.map(|r| r.classify(value)).unwrap_or(Status::Normal)
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- RefRange::parse tests ---

    #[test]
    fn parses_bounded_with_spaces() {
        assert_eq!(
            RefRange::parse("134 - 145"),
            Some(RefRange::Bounded { low: 134.0, high: 145.0 })
        );
    }

    #[test]
    fn parses_bounded_compact() {
        assert_eq!(
            RefRange::parse("70-99"),
            Some(RefRange::Bounded { low: 70.0, high: 99.0 })
        );
    }

    #[test]
    fn parses_below_threshold() {
        assert_eq!(RefRange::parse("<5.0"), Some(RefRange::Below(5.0)));
        assert_eq!(RefRange::parse("below <5.7"), Some(RefRange::Below(5.7)));
    }

    #[test]
    fn parses_above_threshold() {
        assert_eq!(RefRange::parse(">20.0"), Some(RefRange::Above(20.0)));
        assert_eq!(RefRange::parse("above >20"), Some(RefRange::Above(20.0)));
    }

    #[test]
    fn free_text_yields_none() {
        assert_eq!(RefRange::parse("See below"), None);
        assert_eq!(RefRange::parse(""), None);
    }

    // --- classification tests ---

    #[test]
    fn within_bounds_is_normal() {
        assert_eq!(classify(5.0, Some(&RefRange::Bounded { low: 4.0, high: 10.0 }), None), Status::Normal);
    }

    #[test]
    fn above_high_bound_is_high() {
        assert_eq!(classify(11.0, Some(&RefRange::Bounded { low: 4.0, high: 10.0 }), None), Status::High);
    }

    #[test]
    fn below_low_bound_is_low() {
        assert_eq!(classify(3.0, Some(&RefRange::Bounded { low: 4.0, high: 10.0 }), None), Status::Low);
    }

    #[test]
    fn explicit_flag_overrides_range() {
        // 5 sits inside [4, 10], but the printed flag wins.
        assert_eq!(
            classify(5.0, Some(&RefRange::Bounded { low: 4.0, high: 10.0 }), Some(Flag::Low)),
            Status::Low
        );
        assert_eq!(classify(3.0, Some(&RefRange::Bounded { low: 4.0, high: 10.0 }), Some(Flag::Low)), Status::Low);
    }

    #[test]
    fn below_semantics() {
        assert_eq!(classify(6.0, Some(&RefRange::Below(5.7)), None), Status::High);
        assert_eq!(classify(5.7, Some(&RefRange::Below(5.7)), None), Status::High);
        assert_eq!(classify(5.0, Some(&RefRange::Below(5.7)), None), Status::Normal);
    }

    #[test]
    fn above_semantics() {
        assert_eq!(classify(25.0, Some(&RefRange::Above(20.0)), None), Status::Normal);
        assert_eq!(classify(20.0, Some(&RefRange::Above(20.0)), None), Status::Normal);
        assert_eq!(classify(12.0, Some(&RefRange::Above(20.0)), None), Status::Low);
    }

    #[test]
    fn no_range_no_flag_is_normal() {
        assert_eq!(classify(999.0, None, None), Status::Normal);
    }
}

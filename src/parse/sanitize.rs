/// Sanitize raw report text before pattern matching.
///
/// Strips control characters that OCR engines occasionally emit while
/// preserving the spacing the layout extractor encodes: line breaks mark
/// vertical jumps and multi-space runs mark column gaps, and several
/// format strategies key off both.
pub fn sanitize_raw_text(raw: &str) -> String {
    let filtered: String = raw
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();

    filtered
        .lines()
        .map(|l| l.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_null_bytes() {
        let raw = "Sodium\x00 138 mmol/L";
        let clean = sanitize_raw_text(raw);
        assert!(!clean.contains('\x00'));
        assert!(clean.contains("Sodium"));
    }

    #[test]
    fn strips_carriage_returns() {
        let raw = "Glucose: 95\r\nSodium: 138";
        assert_eq!(sanitize_raw_text(raw), "Glucose: 95\nSodium: 138");
    }

    #[test]
    fn preserves_column_gaps() {
        // Follow-My-Health cell splitting depends on 3+ space runs.
        let raw = "WBC   01/15/2023   6.6   K/UL   4.0-11.0";
        assert_eq!(sanitize_raw_text(raw), raw);
    }

    #[test]
    fn preserves_range_punctuation() {
        let raw = "Chol/HDL Ratio  <5.0  10.9 H";
        assert_eq!(sanitize_raw_text(raw), raw);
    }

    #[test]
    fn trims_trailing_whitespace_per_line() {
        assert_eq!(sanitize_raw_text("Sodium 138   \nGlucose 95"), "Sodium 138\nGlucose 95");
    }

    #[test]
    fn empty_input_returns_empty() {
        assert_eq!(sanitize_raw_text(""), "");
    }
}

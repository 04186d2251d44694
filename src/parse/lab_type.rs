//! Lab-type labels.
//!
//! The human-facing panel label ("CBC", "Vitamina D", …). Each format
//! pulls it from a different place (a known-title keyword, an ALL-CAPS
//! heading, an `Order:` line) and when everything fails, the filename
//! itself often names the test.

use std::sync::LazyLock;

use regex::Regex;

/// Default label when nothing better is known.
pub const DEFAULT_LAB_TYPE: &str = "Exame";

static RE_NOISE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:CA|No,?\s*PCP)\s+").unwrap());
static RE_TABLE_HEADER_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(?:NAME|VALUE|REFERENCE|RANGE|RESULT)[\s\S]*").unwrap()
});
static RE_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());
static RE_AND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+AND\s+").unwrap());

/// Clean an extracted title into a presentable lab-type label.
pub fn clean_lab_type(raw: &str) -> String {
    let cleaned = RE_NOISE_PREFIX.replace(raw, "");
    let cleaned = RE_TABLE_HEADER_TAIL.replace(&cleaned, "");
    let cleaned = RE_WS.replace_all(&cleaned, " ").trim().to_string();
    if cleaned.is_empty() {
        DEFAULT_LAB_TYPE.to_string()
    } else {
        cleaned
    }
}

/// Replace ` AND ` with ` & ` in a title, the way the portals abbreviate.
pub fn ampersand(title: &str) -> String {
    RE_AND.replace_all(title, " & ").into_owned()
}

/// Ordered filename keyword rules. More specific entries come first:
/// "bone" must beat the vitamin-D check ("D Bone"), B1 must beat B12,
/// lipid must beat the generic "diff".
fn filename_rules(name_lower: &str) -> Option<&'static str> {
    let has = |needle: &str| name_lower.contains(needle);

    if has("bone") || has("densidade") || has("axial skeleton") {
        return Some("Densidade Óssea");
    }
    if has("vitamin_k") || has("vitamin k") || has("k vitamin") {
        return Some("Vitamina K");
    }
    if has("vitamin_e") || has("vitamin e") {
        return Some("Vitamina E");
    }
    if has("vitamin_a") || has("vitamin a") {
        return Some("Vitamina A");
    }
    if has("vitamin_c") || has("vitamin c") || has("vit c") {
        return Some("Vitamina C");
    }
    if has("vitamin_d") || has("vitamin d") || has("vit d") {
        return Some("Vitamina D");
    }
    if has("tsh") || has("thyroid") {
        return Some("TSH");
    }
    if has("t4") {
        return Some("T4");
    }
    if has("t3") {
        return Some("T3");
    }
    if has("cmp") || has("comprehensive metabolic") {
        return Some("CMP");
    }
    if has("cbc") || has("hemograma") || has("csc") {
        return Some("CBC");
    }
    if has("lipid") {
        return Some("Lipídios");
    }
    if name_lower == "b1.pdf" || has("thiamin") {
        return Some("B1");
    }
    if has("b12") || has("b_12") {
        return Some("B12");
    }
    if has("b6") {
        return Some("B6");
    }
    if has("ferritin") || has("ferretin") {
        return Some("Ferritina");
    }
    if has("folate") || has("folato") {
        return Some("Folato");
    }
    if has("crp") || has("c protein") || has("proteina") {
        return Some("PCR");
    }
    if has("iron") {
        return Some("Ferro");
    }
    if has("pth") || has("parathyroid") {
        return Some("PTH");
    }
    if has("prealbumin") {
        return Some("Prealbumina");
    }
    if has("a1c") || has("hemo") {
        return Some("A1C");
    }
    if has("total ck") || has("ck") {
        return Some("CK Total");
    }
    if has("endocrinology") {
        return Some("Endocrinologia");
    }
    if has("protein_marker") || has("protein marker") {
        return Some("Marcadores Proteicos");
    }
    if has("blood diff") || has("diff") {
        return Some("Diferencial");
    }
    if has("lab_a") || has("lab_") {
        return Some("Gráfico");
    }
    None
}

/// Infer a lab-type label from the filename alone.
pub fn from_filename(filename: &str) -> String {
    let name_lower = filename.to_lowercase();
    filename_rules(&name_lower)
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_LAB_TYPE.to_string())
}

/// Scan the first `max_lines` lines for an ALL-CAPS heading that is not a
/// structural phrase. Positional fallback when no known title matched.
pub fn first_all_caps_heading(text: &str, max_lines: usize, reject: &[&str]) -> Option<String> {
    static RE_CAPS_LINE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^[A-Z\s\d\-/()&,]+$").unwrap());

    for line in text.lines().take(max_lines) {
        let trimmed = line.trim();
        if trimmed.len() < 5 || trimmed.len() > 50 {
            continue;
        }
        if trimmed != trimmed.to_uppercase() || !RE_CAPS_LINE.is_match(trimmed) {
            continue;
        }
        if reject.iter().any(|r| trimmed.contains(r)) {
            continue;
        }
        return Some(trimmed.to_string());
    }
    None
}

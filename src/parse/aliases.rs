//! Cross-vendor marker identity.
//!
//! The same physiological marker shows up under different spellings
//! depending on the vendor, the language, and the panel: `Glucose`,
//! `GLUCOSE`, `Blood Glucose`, `Glicose`. The alias table maps every
//! spelling we have seen to one canonical (Portuguese-preferred) name so
//! the trend-charting side can aggregate readings across documents.
//!
//! Lookups are case-insensitive in both directions and total: an unknown
//! name resolves to its own case variants, never to a failure.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

/// Canonical name → known alias spellings across vendors and languages.
const ALIAS_TABLE: &[(&str, &[&str])] = &[
    // Chemistry
    ("Glicose", &["Glucose", "Blood Glucose", "Glucose Level", "Glucose, Serum", "GLU"]),
    ("Sódio", &["Sodium", "Na", "Sodium Level", "Sodio"]),
    ("Potássio", &["Potassium", "K", "Potassium Level", "Potassio"]),
    ("Cloreto", &["Chloride", "Cl", "Cloro"]),
    ("CO2", &["Carbon Dioxide", "Bicarbonate", "HCO3", "CO2 Content"]),
    ("Gap Aniônico", &["Anion Gap", "Anion gap", "AGAP"]),
    ("BUN", &["Blood Urea Nitrogen", "Urea Nitrogen", "Ureia"]),
    ("Creatinina", &["Creatinine", "Creatinine, Serum", "Creat"]),
    ("Relação BUN/Creatinina", &["BUN/Creatinine Ratio", "BUN/Creat Ratio"]),
    ("eGFR", &["Estimated GFR", "GFR", "eGFR Non-African American", "Glomerular Filtration Rate"]),
    ("Cálcio", &["Calcium", "Ca", "Calcium Level", "Calcio"]),
    ("Magnésio", &["Magnesium", "Mg", "Magnesio"]),
    ("Fósforo", &["Phosphorus", "Phosphate", "Fosfato", "Fosforo"]),
    ("Ácido Úrico", &["Uric Acid", "Urate", "Acido Urico"]),
    ("Proteína Total", &["Total Protein", "Total protein", "Proteinas Totais"]),
    ("Albumina", &["Albumin", "Albumin, Serum"]),
    ("Globulina", &["Globulin", "Globulin, Total"]),
    ("Relação Albumina/Globulina", &["A/G Ratio", "Albumin/Globulin Ratio"]),
    ("Bilirrubina Total", &["Total Bilirubin", "Bilirubin", "Bilirubin (total)", "Bilirubin, Total"]),
    ("Bilirrubina Direta", &["Direct Bilirubin", "Bilirubin (direct)", "Bilirubin, Direct"]),
    ("AST", &["SGOT", "AST (SGOT)", "Aspartate Aminotransferase"]),
    ("ALT", &["SGPT", "ALT (SGPT)", "Alanine Aminotransferase"]),
    ("Fosfatase Alcalina", &["Alkaline Phosphatase", "Alk phos", "Alk Phos", "ALP"]),
    ("GGT", &["Gamma GT", "Gamma-Glutamyl Transferase", "GGTP"]),
    ("LDH", &["Lactate Dehydrogenase", "LD"]),
    ("Pré-Albumina", &["Prealbumin", "Pre-Albumin"]),
    // Hematology
    ("Hemoglobina", &["Hemoglobin", "HGB", "Hgb", "Hemoglobin (HGB)"]),
    ("Hematócrito", &["Hematocrit", "HCT", "Hct", "Hematocrit (HCT)", "Hematocrito"]),
    ("Eritrócitos", &["RBC", "Red Blood Cells", "Red Blood Cell Count", "Eritrocitos"]),
    ("Leucócitos", &["WBC", "White Blood Cells", "White Blood Cell Count", "Leucocitos"]),
    ("Plaquetas", &["Platelets", "PLT", "Platelet Count"]),
    ("VCM", &["MCV", "Mean Corpuscular Volume"]),
    ("HCM", &["MCH", "Mean Corpuscular Hemoglobin"]),
    ("CHCM", &["MCHC", "Mean Corpuscular Hemoglobin Concentration"]),
    ("RDW", &["RDW-CV", "RDW-SD", "Red Cell Distribution Width"]),
    ("VPM", &["MPV", "Mean Platelet Volume"]),
    ("Neutrófilos", &["Neutrophils", "NEU%", "Neutrophils Relative", "Neutrofilos"]),
    ("Neutrófilos Absolutos", &["NEU Abs", "ABS NEU", "Absolute neutrophils", "Neutrophils Absolute"]),
    ("Linfócitos", &["Lymphocytes", "LYM%", "Lymphocytes Relative", "Linfocitos"]),
    ("Linfócitos Absolutos", &["LYM Abs", "ABS LYM", "Absolute lymphocytes", "Lymphocytes Absolute"]),
    ("Monócitos", &["Monocytes", "MONO%", "Monocytes Relative", "Monocitos"]),
    ("Monócitos Absolutos", &["MONO Abs", "ABS MONO", "Absolute monocytes", "Monocytes Absolute"]),
    ("Eosinófilos", &["Eosinophils", "EOS%", "Eosinophils Relative", "Eosinofilos"]),
    ("Eosinófilos Absolutos", &["EOS Abs", "ABS EOS", "Absolute eosinophils", "Eosinophils Absolute"]),
    ("Basófilos", &["Basophils", "BASO%", "Basophils Relative", "Basofilos"]),
    ("Basófilos Absolutos", &["BASO Abs", "ABS BASO", "Absolute basophils", "Basophils Absolute"]),
    ("Granulócitos Imaturos", &["Immature Granulocytes", "IMM. GRAN %", "Imm Gran"]),
    ("Granulócitos Imaturos Absolutos", &["ABS IMM. GRAN", "Absolute Immature Granulocytes"]),
    ("VHS", &["ESR", "Sedimentation Rate", "Erythrocyte Sedimentation Rate"]),
    // Lipids
    ("Colesterol Total", &["Cholesterol", "Total Cholesterol", "CHOL"]),
    ("Triglicerídeos", &["Triglycerides", "TRIG", "Triglicerides"]),
    ("HDL", &["HDL Cholesterol", "HDL-C", "Colesterol HDL"]),
    ("LDL", &["LDL Cholesterol", "LDL-C", "LDL, CALCULATED", "Calculated LDL", "Colesterol LDL"]),
    ("VLDL", &["VLDL Cholesterol", "Calculated VLDL", "Colesterol VLDL"]),
    ("Colesterol Não-HDL", &["Non-HDL Cholesterol", "Non HDL Cholesterol"]),
    ("Relação Colesterol/HDL", &["Chol/HDL", "Chol/HDL Ratio", "Chol/HDL ratio", "CHOL/HDL"]),
    ("Relação LDL/HDL", &["LDL/HDL Ratio", "Calculated LDL/HDL ratio"]),
    // Glycemic
    ("A1C", &["Hemoglobin A1C", "Hemoglobin A1c", "HbA1c", "Glycated Hemoglobin", "Hgb A1C"]),
    ("Glicose Média Estimada", &["Estimated Average Glucose", "Estimated average glucose", "eAG"]),
    ("Insulina", &["Insulin", "Fasting Insulin"]),
    // Thyroid / endocrine
    ("TSH", &["Thyroid Stimulating Hormone", "Ultra TSH", "TSH Ultra Sensitive", "Tireotropina"]),
    ("T3", &["Triiodothyronine", "T3 Total", "T3, Total"]),
    ("T3 Livre", &["Free T3", "T3 Free", "FT3"]),
    ("T4", &["Thyroxine", "T4 Total", "T4, Total"]),
    ("T4 Livre", &["Free T4", "T4 Free", "FT4"]),
    ("PTH", &["Parathyroid Hormone", "Intact PTH", "PTH, Intact", "Paratormonio"]),
    ("Cortisol", &["Cortisol AM", "Cortisol, Serum"]),
    // Vitamins and nutrition
    ("Vitamina D", &[
        "Vitamin D",
        "25-OH Vitamin D",
        "25-OH Vitamin D, Total",
        "Vitamin D, 25 hydroxy",
        "Vitamin D, 25-Hydroxy",
        "25-Hydroxyvitamin D",
    ]),
    ("Vitamina B12", &["Vitamin B12", "B12", "Vitamin B12 level", "Cobalamina", "Cyanocobalamin"]),
    ("Vitamina B6", &["Vitamin B6", "B6", "Pyridoxal 5-Phosphate", "Vitamin B6 (Pyridoxal 5-Phosphate)"]),
    ("Vitamina B1", &["Vitamin B1", "B1", "Thiamine", "Tiamina"]),
    ("Vitamina C", &["Vitamin C", "Ascorbic Acid", "Acido Ascorbico"]),
    ("Vitamina A", &["Vitamin A", "Retinol"]),
    ("Vitamina E", &["Vitamin E", "Tocopherol", "Alpha-Tocopherol"]),
    ("Vitamina K", &["Vitamin K", "Phylloquinone", "Vitamin K1"]),
    ("Folato", &["Folate", "Folic Acid", "Acido Folico"]),
    // Iron studies
    ("Ferritina", &["Ferritin", "Ferretin"]),
    ("Ferro", &["Iron", "Serum Iron", "Iron, Serum", "Ferro Serico"]),
    ("TIBC", &["Total Iron Binding Capacity", "Iron Binding Capacity"]),
    ("Saturação de Transferrina", &["% Saturation", "Transferrin Saturation", "Iron Saturation"]),
    ("Transferrina", &["Transferrin"]),
    // Inflammation / other
    ("PCR", &[
        "C-Reactive Protein",
        "CRP",
        "High Sensitive CRP",
        "High Sensitivity CRP",
        "HSCRP",
        "hs-CRP",
        "Proteina C-Reativa",
    ]),
    ("CK Total", &["Total CK", "CK", "CK, Total", "Creatine Kinase", "Creatine Kinase, Total"]),
];

/// Lowercased spelling → row index into [`ALIAS_TABLE`].
static KEY_TO_ROW: LazyLock<HashMap<String, usize>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for (row, (canonical, aliases)) in ALIAS_TABLE.iter().enumerate() {
        map.entry(canonical.to_lowercase()).or_insert(row);
        for alias in aliases.iter() {
            map.entry(alias.to_lowercase()).or_insert(row);
        }
    }
    map
});

/// Resolve the canonical name for any spelling. Returns the input
/// unchanged when no table entry matches, so resolution never fails.
pub fn canonicalize(name: &str) -> String {
    match KEY_TO_ROW.get(&name.to_lowercase()) {
        Some(&row) => ALIAS_TABLE[row].0.to_string(),
        None => name.to_string(),
    }
}

/// All spellings that identify the same marker as `name`, the canonical
/// one included. For an unknown name the set is the name plus its case
/// variants, so downstream lookups always have candidates to try.
pub fn aliases_of(name: &str) -> BTreeSet<String> {
    match KEY_TO_ROW.get(&name.to_lowercase()) {
        Some(&row) => {
            let (canonical, aliases) = ALIAS_TABLE[row];
            let mut set: BTreeSet<String> = aliases.iter().map(|a| a.to_string()).collect();
            set.insert(canonical.to_string());
            set
        }
        None => {
            let mut set = BTreeSet::new();
            set.insert(name.to_string());
            set.insert(name.to_uppercase());
            set.insert(name.to_lowercase());
            set
        }
    }
}

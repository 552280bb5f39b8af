//! Background-noise scenario extraction.
//!
//! Collects MOS scores measured at the 54 dB(A) noise level, split by
//! noise-suppression setting and by scenario (second talker vs plain
//! background noise). Descriptor text is free-form, so every variant
//! list here mirrors spellings actually seen in reports.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::document::ReportDocument;
use crate::patterns;
use crate::status::roles;

/// Spellings of the 54 dB(A) noise level. Checked against both the
/// lower-cased descriptor and its space-stripped form.
const NOISE_LEVEL_VARIANTS: &[&str] = &[
    "54db", "54 db", "54dba", "54 dba", "bgn_54", "bgn54", "bgn-54",
];

/// Noise-suppression spellings mapped to their canonical setting.
const NS_SETTING_PATTERNS: &[(&str, &str)] = &[
    ("ns on", "NS ON"),
    ("ns_on", "NS ON"),
    ("ns-on", "NS ON"),
    ("ns=on", "NS ON"),
    ("nson", "NS ON"),
    ("ns off", "NS OFF"),
    ("ns_off", "NS OFF"),
    ("ns-off", "NS OFF"),
    ("ns=off", "NS OFF"),
    ("nsoff", "NS OFF"),
];

/// Rows without any NS spelling default to the device-side setting.
const DEFAULT_NS_SETTING: &str = "Android";

/// Spellings that mark a second-talker scenario.
const SECOND_TALKER_KEYWORDS: &[&str] = &[
    "art mouth", "artmouth", "2 mouth", "2nd mouth", "2mouth", "mouth", "2nd", "talker", "2",
];

static MOS_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([\d.]+)").unwrap());

/// MOS scores for one device and one noise-suppression setting.
#[derive(Debug, Clone, Serialize)]
pub struct NoiseScenarioResult {
    pub file: String,
    pub device: String,
    pub lab: Option<String>,
    pub report_time: Option<String>,
    pub ns_setting: String,
    pub smos_second_talker: Option<String>,
    pub nmos_second_talker: Option<String>,
    pub gmos_second_talker: Option<String>,
    pub smos_bgn: Option<String>,
    pub nmos_bgn: Option<String>,
    pub gmos_bgn: Option<String>,
}

impl NoiseScenarioResult {
    fn new(file: &str, device: &str, lab: Option<String>, report_time: Option<String>, ns_setting: &str) -> Self {
        Self {
            file: file.to_string(),
            device: device.to_string(),
            lab,
            report_time,
            ns_setting: ns_setting.to_string(),
            smos_second_talker: None,
            nmos_second_talker: None,
            gmos_second_talker: None,
            smos_bgn: None,
            nmos_bgn: None,
            gmos_bgn: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scenario {
    SecondTalker,
    BackgroundNoise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MosKind {
    Smos,
    Nmos,
    Gmos,
}

/// Extract 54 dB(A) noise-scenario MOS rows, one result per NS setting
/// seen in the document.
pub fn extract_noise_scenarios(doc: &ReportDocument, file_name: &str) -> Vec<NoiseScenarioResult> {
    let device = file_name.strip_suffix(".docx").unwrap_or(file_name);
    let lab = detect_lab(doc);
    let report_time = doc.paragraphs().find_map(|p| patterns::extract_date_only(&p.text));

    let mut results: Vec<NoiseScenarioResult> = Vec::new();

    for table in doc.tables() {
        let header = table.row_texts(0);
        if !roles::is_status_table(&header.join(" ").to_lowercase()) {
            continue;
        }
        let unique = roles::unique_headers(&header);
        let Some(columns) = roles::resolve_roles(&unique) else {
            continue;
        };

        for index in 1..table.rows.len() {
            let raw = table.row_texts(index);
            let cell = |i: usize| raw.get(i).cloned().unwrap_or_default();
            let smd = cell(columns.device);
            let smd_lower = smd.to_lowercase();
            if !mentions_noise_level(&smd_lower) {
                continue;
            }

            // Every 54 dB row claims its NS-setting entry, even when
            // the row itself cannot be scored; a file with only
            // unclassifiable rows still shows up, empty-scored.
            let ns_setting = detect_ns_setting(&smd_lower);
            let slot_index = match results.iter().position(|r| r.ns_setting == ns_setting) {
                Some(i) => i,
                None => {
                    results.push(NoiseScenarioResult::new(
                        file_name,
                        device,
                        lab.clone(),
                        report_time.clone(),
                        &ns_setting,
                    ));
                    results.len() - 1
                }
            };

            let description = columns
                .description
                .map(|i| cell(i))
                .unwrap_or_default()
                .to_lowercase();
            let Some(kind) = mos_kind(&smd_lower, &description) else {
                continue;
            };
            let value = mos_value(&columns.value.map(cell).unwrap_or_default());
            if value.is_none() {
                continue;
            }

            let result = &mut results[slot_index];
            let slot = match (kind, detect_scenario(&smd_lower)) {
                (MosKind::Smos, Scenario::SecondTalker) => &mut result.smos_second_talker,
                (MosKind::Nmos, Scenario::SecondTalker) => &mut result.nmos_second_talker,
                (MosKind::Gmos, Scenario::SecondTalker) => &mut result.gmos_second_talker,
                (MosKind::Smos, Scenario::BackgroundNoise) => &mut result.smos_bgn,
                (MosKind::Nmos, Scenario::BackgroundNoise) => &mut result.nmos_bgn,
                (MosKind::Gmos, Scenario::BackgroundNoise) => &mut result.gmos_bgn,
            };
            // Re-run rows restate the measurement; the last one wins.
            *slot = value;
        }
    }

    debug!(file = file_name, settings = results.len(), "extracted noise scenarios");
    results
}

fn mentions_noise_level(smd_lower: &str) -> bool {
    let stripped: String = smd_lower.split_whitespace().collect();
    NOISE_LEVEL_VARIANTS
        .iter()
        .any(|v| smd_lower.contains(v) || stripped.contains(v))
}

fn detect_ns_setting(smd_lower: &str) -> String {
    NS_SETTING_PATTERNS
        .iter()
        .find(|(pattern, _)| smd_lower.contains(pattern))
        .map(|(_, setting)| setting.to_string())
        .unwrap_or_else(|| DEFAULT_NS_SETTING.to_string())
}

/// Anything that is not explicitly a second-talker scenario counts as
/// background noise, whether or not a BGN spelling appears.
fn detect_scenario(smd_lower: &str) -> Scenario {
    if SECOND_TALKER_KEYWORDS.iter().any(|k| smd_lower.contains(k)) {
        Scenario::SecondTalker
    } else {
        Scenario::BackgroundNoise
    }
}

/// MOS kind from the descriptor, falling back to the description for
/// G-MOS which some templates only name there.
fn mos_kind(smd_lower: &str, description_lower: &str) -> Option<MosKind> {
    if smd_lower.contains("s-mos") || smd_lower.contains("smos") {
        Some(MosKind::Smos)
    } else if smd_lower.contains("n-mos") || smd_lower.contains("nmos") {
        Some(MosKind::Nmos)
    } else if smd_lower.contains("g-mos")
        || smd_lower.contains("gmos")
        || description_lower.contains("g-mos")
        || description_lower.contains("gmos")
    {
        Some(MosKind::Gmos)
    } else {
        None
    }
}

/// MOS value from the value cell; decimal commas are normalized first.
fn mos_value(text: &str) -> Option<String> {
    let normalized = text.replace(',', ".");
    MOS_VALUE
        .captures(&normalized)
        .map(|caps| caps[1].to_string())
}

/// Lab site marker, searched in headers first, then footers, then
/// body paragraphs.
pub fn detect_lab(doc: &ReportDocument) -> Option<String> {
    let header_iter = doc.header_text.iter().cloned();
    let footer_iter = doc.footer_text.iter().cloned();
    let para_iter = doc.paragraphs().map(|p| p.text.clone());
    for text in header_iter.chain(footer_iter).chain(para_iter) {
        let lower = text.to_lowercase();
        if lower.contains("ast") {
            return Some("AST".to_string());
        }
        if lower.contains("pal") {
            return Some("PAL".to_string());
        }
    }
    None
}

//! Equipment-settings extraction.
//!
//! Settings paragraphs list the measurement front end (labCORE unit),
//! the artificial head (HATS), and the BEQ equalization blocks. The
//! lines are key/value pairs separated by tabs or runs of spaces, so
//! each field has its own anchored pattern. Section headers switch a
//! small scan state; a divider line resets it.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::document::{ReportDocument, StyleTag};
use crate::patterns;

static CORE_SERIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)labcore\s+serial[\t\s]+(\d+)").unwrap());
static NICKNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)nickname[\t\s]+([^\t\n]+)").unwrap());
static FIRMWARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)firmware[\t\s]+([0-9.]+)").unwrap());
static EQUALIZATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)equalization[\t\s]+([^\t\n]+)").unwrap());
static HEAD_SERIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)hats\s+serial[\t\s]+(\d+)").unwrap());
static SERIAL_NR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)ser\.?\s*nr\.?[\t\s]+(\d+)").unwrap());
static PINNA_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)pinna\s*type[\t\s]+([^\t\n]+)").unwrap());
static PINNA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bpinna[\t\s]+([^\t\n]+)").unwrap());

/// Content keywords that mark a paragraph as a settings line even when
/// it lost the settings style.
const SETTINGS_KEYWORDS: &[&str] = &[
    "labcore",
    "hats",
    "beq",
    "equalization",
    "artificial head",
    "pinna",
    "nickname",
    "ser. nr",
];

/// labCORE front-end unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoreUnitRecord {
    pub file: String,
    pub serial: Option<String>,
    pub firmware: Option<String>,
    pub nickname: Option<String>,
}

impl CoreUnitRecord {
    fn is_empty(&self) -> bool {
        self.serial.is_none() && self.firmware.is_none() && self.nickname.is_none()
    }
}

/// HATS artificial head.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeadSimulatorRecord {
    pub file: String,
    pub serial: Option<String>,
    pub pinna: Option<String>,
    pub equalization: Option<String>,
}

impl HeadSimulatorRecord {
    fn is_empty(&self) -> bool {
        self.serial.is_none() && self.pinna.is_none() && self.equalization.is_none()
    }
}

/// One equalization assignment, stamped with the test it applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EqualizationRecord {
    pub file: String,
    pub equalization: String,
    pub test_code: Option<String>,
    pub head_serial: Option<String>,
    pub pinna: Option<String>,
    pub diffuse_field: bool,
}

/// All equipment settings found in a batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EquipmentSettings {
    pub core_units: Vec<CoreUnitRecord>,
    pub head_simulators: Vec<HeadSimulatorRecord>,
    pub equalization: Vec<EqualizationRecord>,
}

impl EquipmentSettings {
    pub fn merge(&mut self, other: EquipmentSettings) {
        self.core_units.extend(other.core_units);
        self.head_simulators.extend(other.head_simulators);
        self.equalization.extend(other.equalization);
    }

    pub fn is_empty(&self) -> bool {
        self.core_units.is_empty() && self.head_simulators.is_empty() && self.equalization.is_empty()
    }
}

/// Scan state while walking the paragraph stream.
#[derive(Debug, Default)]
struct SettingsScan {
    in_core: bool,
    in_head: bool,
    test_code: Option<String>,
    core: CoreUnitRecord,
    head: HeadSimulatorRecord,
    eq: EqualizationRecord,
}

impl SettingsScan {
    fn reset_sections(&mut self) {
        self.in_core = false;
        self.in_head = false;
    }
}

/// Extract equipment settings from one document.
pub fn extract_settings(doc: &ReportDocument, file_name: &str) -> EquipmentSettings {
    let mut out = EquipmentSettings::default();
    let mut scan = SettingsScan::default();

    for para in doc.paragraphs() {
        let text = para.text.trim();
        if text.is_empty() {
            continue;
        }

        if para.tag() == StyleTag::Title {
            scan.test_code = patterns::extract_title_test_code(text);
            continue;
        }
        if !is_settings_line(para.tag(), text) {
            continue;
        }

        let lower = text.to_lowercase();
        if lower.starts_with("----------") {
            scan.reset_sections();
            continue;
        }
        if lower.contains("labcore settings") {
            scan.reset_sections();
            scan.in_core = true;
            continue;
        }
        if lower.contains("beq settings") {
            // Equalization lines identify themselves; the header only
            // ends the previous section.
            scan.reset_sections();
            continue;
        }
        if lower.contains("artificial head") || (lower.contains("hats") && lower.contains("settings")) {
            scan.reset_sections();
            scan.in_head = true;
            continue;
        }

        apply_settings_line(&mut scan, text, lower.as_str());
    }

    if !scan.core.is_empty() {
        scan.core.file = file_name.to_string();
        out.core_units.push(scan.core);
    }
    if !scan.head.is_empty() {
        scan.head.file = file_name.to_string();
        out.head_simulators.push(scan.head);
    }
    if !scan.eq.equalization.is_empty() {
        scan.eq.file = file_name.to_string();
        out.equalization.push(scan.eq);
    }

    debug!(
        file = file_name,
        core = out.core_units.len(),
        heads = out.head_simulators.len(),
        eq = out.equalization.len(),
        "extracted equipment settings"
    );
    out
}

fn is_settings_line(tag: StyleTag, text: &str) -> bool {
    if tag == StyleTag::Setting {
        return true;
    }
    let lower = text.to_lowercase();
    SETTINGS_KEYWORDS.iter().any(|k| lower.contains(k))
        || (lower.contains("firmware") && lower.contains("sync"))
}

fn apply_settings_line(scan: &mut SettingsScan, text: &str, lower: &str) {
    if let Some(caps) = CORE_SERIAL.captures(text) {
        scan.core.serial = Some(caps[1].to_string());
    }
    if scan.in_core || lower.contains("labcore") {
        if let Some(caps) = FIRMWARE.captures(text) {
            scan.core.firmware = Some(caps[1].to_string());
        }
        if let Some(caps) = NICKNAME.captures(text) {
            scan.core.nickname = Some(caps[1].trim().to_string());
        }
    }

    if let Some(caps) = HEAD_SERIAL.captures(text) {
        scan.head.serial = Some(caps[1].to_string());
    } else if scan.in_head {
        if let Some(caps) = SERIAL_NR.captures(text) {
            scan.head.serial = Some(caps[1].to_string());
        }
    }
    if let Some(caps) = PINNA_TYPE.captures(text) {
        scan.head.pinna = Some(caps[1].trim().to_string());
    } else if let Some(caps) = PINNA.captures(text) {
        scan.head.pinna = Some(caps[1].trim().to_string());
    }

    // One equalization record grows per file: fields are last-win,
    // the diffuse-field flag sticks once any DF line was seen.
    if let Some(caps) = EQUALIZATION.captures(text) {
        let equalization = caps[1].trim().to_string();
        let eq_lower = equalization.to_lowercase();
        scan.head.equalization = Some(equalization.clone());
        scan.eq.diffuse_field |= eq_lower.contains("df") || eq_lower.contains("diffuse");
        scan.eq.equalization = equalization;
        scan.eq.test_code = scan.test_code.clone();
        scan.eq.head_serial = scan.head.serial.clone();
        scan.eq.pinna = scan.head.pinna.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BodyElement, Paragraph, ReportDocument};

    fn doc(paras: Vec<Paragraph>) -> ReportDocument {
        ReportDocument {
            body: paras.into_iter().map(BodyElement::Paragraph).collect(),
            ..Default::default()
        }
    }

    fn setting(text: &str) -> Paragraph {
        Paragraph::new("SmdSetting", text)
    }

    #[test]
    fn core_unit_fields_are_collected() {
        let settings = extract_settings(
            &doc(vec![
                setting("labCORE Settings"),
                setting("labCORE Serial\t12345"),
                setting("Firmware\t2.10.5"),
                setting("Nickname\tBench 3 core"),
            ]),
            "phone.docx",
        );
        assert_eq!(settings.core_units.len(), 1);
        let core = &settings.core_units[0];
        assert_eq!(core.file, "phone.docx");
        assert_eq!(core.serial.as_deref(), Some("12345"));
        assert_eq!(core.firmware.as_deref(), Some("2.10.5"));
        assert_eq!(core.nickname.as_deref(), Some("Bench 3 core"));
    }

    #[test]
    fn head_simulator_fields_are_collected() {
        let settings = extract_settings(
            &doc(vec![
                setting("Artificial Head"),
                setting("Ser. Nr.\t778899"),
                setting("Pinna Type\tType 3.3"),
            ]),
            "f.docx",
        );
        let head = &settings.head_simulators[0];
        assert_eq!(head.serial.as_deref(), Some("778899"));
        assert_eq!(head.pinna.as_deref(), Some("Type 3.3"));
    }

    #[test]
    fn hats_serial_is_recognized_outside_a_section() {
        let settings = extract_settings(
            &doc(vec![setting("HATS Serial\t445566")]),
            "f.docx",
        );
        assert_eq!(settings.head_simulators[0].serial.as_deref(), Some("445566"));
    }

    #[test]
    fn equalization_lines_merge_into_one_record_per_file() {
        let settings = extract_settings(
            &doc(vec![
                Paragraph::new("SmdTitle", "P05R Receiving with DF"),
                setting("BEQ Settings"),
                setting("Equalization\tDF BEQ v2"),
                Paragraph::new("SmdTitle", "Di03A Sensitivity"),
                setting("Equalization\tFree field"),
            ]),
            "f.docx",
        );
        // Fields are last-win, but the diffuse-field flag sticks once
        // any DF equalization was seen.
        assert_eq!(settings.equalization.len(), 1);
        let eq = &settings.equalization[0];
        assert_eq!(eq.file, "f.docx");
        assert_eq!(eq.equalization, "Free field");
        assert_eq!(eq.test_code.as_deref(), Some("Di03A"));
        assert!(eq.diffuse_field);
    }

    #[test]
    fn divider_resets_section_state() {
        let settings = extract_settings(
            &doc(vec![
                setting("Artificial Head"),
                setting("----------"),
                // Outside a head section a bare Ser. Nr. line must not
                // be taken for a head serial.
                setting("Ser. Nr.\t111"),
            ]),
            "f.docx",
        );
        assert!(settings.head_simulators.is_empty());
    }

    #[test]
    fn unstyled_head_section_is_recognized_by_its_header_text() {
        // Documents that lost the settings style still open the head
        // section through the "Artificial Head" header content.
        let settings = extract_settings(
            &doc(vec![
                Paragraph::new("Normal", "Artificial Head"),
                Paragraph::new("Normal", "Ser. Nr.\t778899"),
            ]),
            "f.docx",
        );
        assert_eq!(settings.head_simulators.len(), 1);
        assert_eq!(settings.head_simulators[0].serial.as_deref(), Some("778899"));
    }

    #[test]
    fn unstyled_settings_lines_are_recognized_by_content() {
        let settings = extract_settings(
            &doc(vec![Paragraph::new("Normal", "labCORE Serial\t999")]),
            "f.docx",
        );
        assert_eq!(settings.core_units[0].serial.as_deref(), Some("999"));
    }

    #[test]
    fn documents_without_settings_produce_nothing() {
        let settings = extract_settings(
            &doc(vec![Paragraph::new("Normal", "plain body text")]),
            "f.docx",
        );
        assert!(settings.is_empty());
    }

    #[test]
    fn merge_concatenates_batches() {
        let mut a = EquipmentSettings::default();
        a.core_units.push(CoreUnitRecord {
            file: "a".into(),
            serial: Some("1".into()),
            ..Default::default()
        });
        let mut b = EquipmentSettings::default();
        b.core_units.push(CoreUnitRecord {
            file: "b".into(),
            serial: Some("2".into()),
            ..Default::default()
        });
        a.merge(b);
        assert_eq!(a.core_units.len(), 2);
    }
}

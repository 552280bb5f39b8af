//! Canonical test-code tables for ACQUA report classification.
//!
//! The enumerated lists mirror the code sheets used by the measurement
//! databases; classification checks them in a fixed order before any
//! fallback pattern runs, so a known code embedded in surrounding text
//! always wins over a generic pattern match.

use serde::Serialize;

/// Test category a code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    #[serde(rename = "AR")]
    SeriesA,
    #[serde(rename = "RR")]
    SeriesR,
    #[serde(rename = "Di")]
    DeviceDirect,
    #[serde(rename = "Op")]
    OptionCodes,
    #[serde(rename = "Custom")]
    Custom,
}

impl Category {
    /// Fixed display order used by summaries and exports.
    pub const DISPLAY_ORDER: [Category; 5] = [
        Category::SeriesA,
        Category::SeriesR,
        Category::DeviceDirect,
        Category::OptionCodes,
        Category::Custom,
    ];

    /// Short category code used in the record table.
    pub fn short_code(self) -> &'static str {
        match self {
            Category::SeriesA => "AR",
            Category::SeriesR => "RR",
            Category::DeviceDirect => "Di",
            Category::OptionCodes => "Op",
            Category::Custom => "Custom",
        }
    }

    /// Human-readable name used in summary tables.
    pub fn display_name(self) -> &'static str {
        match self {
            Category::SeriesA => "P-series (A)",
            Category::SeriesR => "P-series (R)",
            Category::DeviceDirect => "Device-direct",
            Category::OptionCodes => "Option codes",
            Category::Custom => "Custom/Special",
        }
    }
}

pub const SERIES_A_CODES: &[&str] = &[
    "P01D", "P01A", "P02A", "P03A", "P04A", "P05A", "P06A", "P07A", "P08A", "P09A", "P10A",
    "P11A", "P12A", "P13A", "P14A", "P15A", "P16A", "P17A", "P18A", "P19A", "P20A",
    "P21A", "P22A", "P23A", "P24A", "P25A", "P26A", "P27A", "P28A", "P29A", "P30A",
];

pub const SERIES_R_CODES: &[&str] = &[
    "P01R", "P02R", "P03R", "P04R", "P05R", "P06R", "P07R", "P08R", "P09R", "P10R", "P11R",
    "P12R",
];

// Di08A is intentionally absent from the code sheet.
pub const DEVICE_DIRECT_CODES: &[&str] = &[
    "Di01A", "Di02A", "Di03A", "Di04A", "Di05A", "Di06A", "Di07A", "Di09A", "Di10A", "Di11A",
    "Di12A",
];

pub const OPTION_CODES: &[&str] = &[
    "OpO01R", "OpO02R", "OpO03R", "OpO04R", "OpO05R",
    "OpM01", "OpM02", "OpM03", "OpM04", "OpM05", "OpM06",
    "OpS01A", "OpS02A", "OpS03A", "OpS04A", "OpS05A", "OpS06A", "OpS07A", "OpS08A", "OpS09A",
    "OpS10A", "OpS11A", "OpS12A", "OpS13A", "OpS14A", "OpS15A", "OpS16A", "OpS17A", "OpS18A",
    "OpS19A", "OpS20A",
    "OpS01R", "OpS02R", "OpS03R", "OpS04R", "OpS05R",
    "OpP01A", "OpP02A", "OpP03A",
];

/// Code tables in classification priority order.
pub fn code_tables() -> [(Category, &'static [&'static str]); 4] {
    [
        (Category::SeriesA, SERIES_A_CODES),
        (Category::SeriesR, SERIES_R_CODES),
        (Category::DeviceDirect, DEVICE_DIRECT_CODES),
        (Category::OptionCodes, OPTION_CODES),
    ]
}

/// Codes that must all be present for the shared-speakerphone profile,
/// grouped into the three validation buckets.
pub fn required_shared_speakerphone() -> [(&'static str, &'static [&'static str]); 3] {
    [
        (
            "AR",
            &[
                "P01A", "P02A", "P07A", "P08A", "P09A", "P10A", "P11A", "P13A", "P14A", "P15A",
                "P16A", "P17A", "P18A", "P19A", "P20A", "P21A", "P24A", "P25A", "P26A",
            ][..],
        ),
        (
            "RR",
            &[
                "P01R", "P02R", "P03R", "P04R", "P05R", "P06R", "P07R", "P08R", "P09R", "P10R",
                "P11R", "P12R",
            ][..],
        ),
        (
            "Di",
            &[
                "Di01A", "Di03A", "Di05A", "Di06A", "Di07A", "Di09A", "Di10A", "Di11A", "Di12A",
            ][..],
        ),
    ]
}

/// Minimal subset of test cases listed alongside the validation output.
pub const MINIMAL_SUBSET: &[&str] = &[
    "P01A", "P02A", "P03A", "P04A", "P09A", "P12A", "P13A", "P14A", "P21A", "P25A", "P26A",
    "P27A", "P01D", "P01R", "P02R", "P10R", "P11R", "P12R",
];

//! Predefined ArUco dictionary selection.
//!
//! Dictionaries are fixed collections shipped with OpenCV; this module only
//! names them, knows their capacity, and loads the OpenCV object on demand.

use std::fmt;
use std::str::FromStr;

use opencv::objdetect::{self, Dictionary, PredefinedDictionaryType};
use serde::{Deserialize, Serialize};

/// One of OpenCV's predefined ArUco/AprilTag dictionaries.
///
/// Serialized under OpenCV's `DICT_*` spellings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DictionaryKind {
    #[serde(rename = "DICT_4X4_50")]
    Dict4x4_50,
    #[serde(rename = "DICT_4X4_100")]
    Dict4x4_100,
    #[serde(rename = "DICT_4X4_250")]
    Dict4x4_250,
    #[serde(rename = "DICT_4X4_1000")]
    Dict4x4_1000,
    #[serde(rename = "DICT_5X5_50")]
    Dict5x5_50,
    #[serde(rename = "DICT_5X5_100")]
    Dict5x5_100,
    #[serde(rename = "DICT_5X5_250")]
    Dict5x5_250,
    #[serde(rename = "DICT_5X5_1000")]
    Dict5x5_1000,
    /// The original wrapper's default board dictionary.
    #[default]
    #[serde(rename = "DICT_6X6_50")]
    Dict6x6_50,
    #[serde(rename = "DICT_6X6_100")]
    Dict6x6_100,
    #[serde(rename = "DICT_6X6_250")]
    Dict6x6_250,
    #[serde(rename = "DICT_6X6_1000")]
    Dict6x6_1000,
    #[serde(rename = "DICT_7X7_50")]
    Dict7x7_50,
    #[serde(rename = "DICT_7X7_100")]
    Dict7x7_100,
    #[serde(rename = "DICT_7X7_250")]
    Dict7x7_250,
    #[serde(rename = "DICT_7X7_1000")]
    Dict7x7_1000,
    #[serde(rename = "DICT_ARUCO_ORIGINAL")]
    ArucoOriginal,
    #[serde(rename = "DICT_APRILTAG_16h5")]
    AprilTag16h5,
    #[serde(rename = "DICT_APRILTAG_25h9")]
    AprilTag25h9,
    #[serde(rename = "DICT_APRILTAG_36h10")]
    AprilTag36h10,
    #[serde(rename = "DICT_APRILTAG_36h11")]
    AprilTag36h11,
}

/// All supported dictionary kinds, in OpenCV declaration order.
pub const ALL_DICTIONARY_KINDS: [DictionaryKind; 21] = [
    DictionaryKind::Dict4x4_50,
    DictionaryKind::Dict4x4_100,
    DictionaryKind::Dict4x4_250,
    DictionaryKind::Dict4x4_1000,
    DictionaryKind::Dict5x5_50,
    DictionaryKind::Dict5x5_100,
    DictionaryKind::Dict5x5_250,
    DictionaryKind::Dict5x5_1000,
    DictionaryKind::Dict6x6_50,
    DictionaryKind::Dict6x6_100,
    DictionaryKind::Dict6x6_250,
    DictionaryKind::Dict6x6_1000,
    DictionaryKind::Dict7x7_50,
    DictionaryKind::Dict7x7_100,
    DictionaryKind::Dict7x7_250,
    DictionaryKind::Dict7x7_1000,
    DictionaryKind::ArucoOriginal,
    DictionaryKind::AprilTag16h5,
    DictionaryKind::AprilTag25h9,
    DictionaryKind::AprilTag36h10,
    DictionaryKind::AprilTag36h11,
];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown dictionary {0:?}")]
pub struct DictionaryParseError(pub String);

impl DictionaryKind {
    /// OpenCV's `DICT_*` spelling.
    pub fn name(self) -> &'static str {
        match self {
            Self::Dict4x4_50 => "DICT_4X4_50",
            Self::Dict4x4_100 => "DICT_4X4_100",
            Self::Dict4x4_250 => "DICT_4X4_250",
            Self::Dict4x4_1000 => "DICT_4X4_1000",
            Self::Dict5x5_50 => "DICT_5X5_50",
            Self::Dict5x5_100 => "DICT_5X5_100",
            Self::Dict5x5_250 => "DICT_5X5_250",
            Self::Dict5x5_1000 => "DICT_5X5_1000",
            Self::Dict6x6_50 => "DICT_6X6_50",
            Self::Dict6x6_100 => "DICT_6X6_100",
            Self::Dict6x6_250 => "DICT_6X6_250",
            Self::Dict6x6_1000 => "DICT_6X6_1000",
            Self::Dict7x7_50 => "DICT_7X7_50",
            Self::Dict7x7_100 => "DICT_7X7_100",
            Self::Dict7x7_250 => "DICT_7X7_250",
            Self::Dict7x7_1000 => "DICT_7X7_1000",
            Self::ArucoOriginal => "DICT_ARUCO_ORIGINAL",
            Self::AprilTag16h5 => "DICT_APRILTAG_16h5",
            Self::AprilTag25h9 => "DICT_APRILTAG_25h9",
            Self::AprilTag36h10 => "DICT_APRILTAG_36h10",
            Self::AprilTag36h11 => "DICT_APRILTAG_36h11",
        }
    }

    /// Number of distinct marker ids the dictionary can encode.
    pub fn marker_count(self) -> usize {
        match self {
            Self::Dict4x4_50 | Self::Dict5x5_50 | Self::Dict6x6_50 | Self::Dict7x7_50 => 50,
            Self::Dict4x4_100 | Self::Dict5x5_100 | Self::Dict6x6_100 | Self::Dict7x7_100 => 100,
            Self::Dict4x4_250 | Self::Dict5x5_250 | Self::Dict6x6_250 | Self::Dict7x7_250 => 250,
            Self::Dict4x4_1000 | Self::Dict5x5_1000 | Self::Dict6x6_1000 | Self::Dict7x7_1000 => {
                1000
            }
            Self::ArucoOriginal => 1024,
            Self::AprilTag16h5 => 30,
            Self::AprilTag25h9 => 35,
            Self::AprilTag36h10 => 2320,
            Self::AprilTag36h11 => 587,
        }
    }

    fn to_opencv(self) -> PredefinedDictionaryType {
        match self {
            Self::Dict4x4_50 => PredefinedDictionaryType::DICT_4X4_50,
            Self::Dict4x4_100 => PredefinedDictionaryType::DICT_4X4_100,
            Self::Dict4x4_250 => PredefinedDictionaryType::DICT_4X4_250,
            Self::Dict4x4_1000 => PredefinedDictionaryType::DICT_4X4_1000,
            Self::Dict5x5_50 => PredefinedDictionaryType::DICT_5X5_50,
            Self::Dict5x5_100 => PredefinedDictionaryType::DICT_5X5_100,
            Self::Dict5x5_250 => PredefinedDictionaryType::DICT_5X5_250,
            Self::Dict5x5_1000 => PredefinedDictionaryType::DICT_5X5_1000,
            Self::Dict6x6_50 => PredefinedDictionaryType::DICT_6X6_50,
            Self::Dict6x6_100 => PredefinedDictionaryType::DICT_6X6_100,
            Self::Dict6x6_250 => PredefinedDictionaryType::DICT_6X6_250,
            Self::Dict6x6_1000 => PredefinedDictionaryType::DICT_6X6_1000,
            Self::Dict7x7_50 => PredefinedDictionaryType::DICT_7X7_50,
            Self::Dict7x7_100 => PredefinedDictionaryType::DICT_7X7_100,
            Self::Dict7x7_250 => PredefinedDictionaryType::DICT_7X7_250,
            Self::Dict7x7_1000 => PredefinedDictionaryType::DICT_7X7_1000,
            Self::ArucoOriginal => PredefinedDictionaryType::DICT_ARUCO_ORIGINAL,
            Self::AprilTag16h5 => PredefinedDictionaryType::DICT_APRILTAG_16h5,
            Self::AprilTag25h9 => PredefinedDictionaryType::DICT_APRILTAG_25h9,
            Self::AprilTag36h10 => PredefinedDictionaryType::DICT_APRILTAG_36h10,
            Self::AprilTag36h11 => PredefinedDictionaryType::DICT_APRILTAG_36h11,
        }
    }

    /// Load the OpenCV dictionary object.
    pub(crate) fn load(self) -> opencv::Result<Dictionary> {
        objdetect::get_predefined_dictionary(self.to_opencv())
    }
}

impl fmt::Display for DictionaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DictionaryKind {
    type Err = DictionaryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_DICTIONARY_KINDS
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| DictionaryParseError(s.to_string()))
    }
}

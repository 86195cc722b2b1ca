//! The eight canonical ABO/Rh blood groups and their reference distribution.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Matches loosely written tags such as `o−`, `AB neg`, `b positive`.
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(AB|A|B|O)\s*(\+|-|−|pos(?:itive)?|neg(?:ative)?)\s*$")
        .expect("blood group pattern is valid")
});

/// A canonical ABO/Rh blood group.
///
/// Variants are declared in reference-distribution order, so the derived
/// `Ord` is the canonical iteration order used throughout the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BloodGroup {
    /// O positive.
    #[serde(rename = "O+")]
    OPos,
    /// A positive.
    #[serde(rename = "A+")]
    APos,
    /// B positive.
    #[serde(rename = "B+")]
    BPos,
    /// AB positive.
    #[serde(rename = "AB+")]
    AbPos,
    /// O negative.
    #[serde(rename = "O-")]
    ONeg,
    /// A negative.
    #[serde(rename = "A-")]
    ANeg,
    /// B negative.
    #[serde(rename = "B-")]
    BNeg,
    /// AB negative.
    #[serde(rename = "AB-")]
    AbNeg,
}

impl BloodGroup {
    /// All groups in canonical order.
    pub const ALL: [BloodGroup; 8] = [
        Self::OPos,
        Self::APos,
        Self::BPos,
        Self::AbPos,
        Self::ONeg,
        Self::ANeg,
        Self::BNeg,
        Self::AbNeg,
    ];

    /// Canonical tag, e.g. `"AB-"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OPos => "O+",
            Self::APos => "A+",
            Self::BPos => "B+",
            Self::AbPos => "AB+",
            Self::ONeg => "O-",
            Self::ANeg => "A-",
            Self::BNeg => "B-",
            Self::AbNeg => "AB-",
        }
    }

    /// Expected share of the population, in percent.
    ///
    /// The eight values sum to exactly 100.
    #[must_use]
    pub fn expected_percent(self) -> f64 {
        match self {
            Self::OPos => 38.0,
            Self::APos => 34.0,
            Self::BPos => 9.0,
            Self::AbPos => 3.0,
            Self::ONeg => 7.0,
            Self::ANeg => 6.0,
            Self::BNeg => 2.0,
            Self::AbNeg => 1.0,
        }
    }

    /// Whether the Rh factor is negative.
    #[must_use]
    pub fn is_rh_negative(self) -> bool {
        matches!(self, Self::ONeg | Self::ANeg | Self::BNeg | Self::AbNeg)
    }

    /// Match a stored tag exactly against the canonical spellings. The
    /// Unicode minus sign is accepted in place of `-`; nothing else is
    /// normalized.
    #[must_use]
    pub fn from_canonical(tag: &str) -> Option<Self> {
        let ascii;
        let tag = if tag.contains('\u{2212}') {
            ascii = tag.replace('\u{2212}', "-");
            ascii.as_str()
        } else {
            tag
        };
        Self::ALL.into_iter().find(|g| g.as_str() == tag)
    }

    /// Tag spellings stored for this group: canonical, then with a Unicode
    /// minus for negative groups.
    #[must_use]
    pub fn stored_spellings(self) -> [String; 2] {
        let canonical = self.as_str();
        [canonical.to_string(), canonical.replace('-', "\u{2212}")]
    }

    /// Parse loosely written user input such as `ab neg`, returning `None`
    /// for anything that is not one of the eight groups.
    #[must_use]
    pub fn parse_tag(tag: &str) -> Option<Self> {
        let caps = TAG_PATTERN.captures(tag)?;
        let abo = caps.get(1)?.as_str().to_ascii_uppercase();
        let negative = match caps.get(2)?.as_str() {
            "+" => false,
            "-" | "−" => true,
            rh => rh.to_ascii_lowercase().starts_with("neg"),
        };

        let group = match (abo.as_str(), negative) {
            ("O", false) => Self::OPos,
            ("A", false) => Self::APos,
            ("B", false) => Self::BPos,
            ("AB", false) => Self::AbPos,
            ("O", true) => Self::ONeg,
            ("A", true) => Self::ANeg,
            ("B", true) => Self::BNeg,
            ("AB", true) => Self::AbNeg,
            _ => return None,
        };
        Some(group)
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_tag(s).ok_or_else(|| Error::invalid_blood_group(s))
    }
}

/// Join groups as `"A-, B-, AB-"`.
#[must_use]
pub fn join_groups(groups: &[BloodGroup]) -> String {
    groups
        .iter()
        .map(|g| g.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

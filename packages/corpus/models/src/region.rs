//! Region taxonomy and canonical region codes.
//!
//! Regional aggregates are keyed by a canonical code derived from the
//! region's display name: uppercase with spaces replaced by underscores,
//! and the literal `World` entity mapped to a fixed world code.

use strum_macros::{AsRefStr, Display, EnumString};

/// Canonical code for the world aggregate in the regional series.
pub const WORLD_CODE: &str = "WORLD";

/// OWID-style pseudo-codes for aggregate rows that appear alongside real
/// countries in per-year and case-count data. Summations over countries
/// exclude these so aggregates are not double-counted.
pub const AGGREGATE_CODES: &[&str] = &[
    "OWID_WRL", "OWID_AFR", "OWID_ASI", "OWID_EUR", "OWID_NAM", "OWID_OCE", "OWID_SAM",
];

/// The fixed set of world regions the corpus aggregates over.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "title_case")]
pub enum Region {
    /// The world aggregate.
    World,
    /// Africa.
    Africa,
    /// Asia.
    Asia,
    /// Europe.
    Europe,
    /// North America.
    NorthAmerica,
    /// South America.
    SouthAmerica,
    /// Oceania.
    Oceania,
}

impl Region {
    /// All regions, world first.
    pub const ALL: &[Self] = &[
        Self::World,
        Self::Africa,
        Self::Asia,
        Self::Europe,
        Self::NorthAmerica,
        Self::SouthAmerica,
        Self::Oceania,
    ];

    /// The canonical code used by the regional series.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::World => WORLD_CODE,
            Self::Africa => "AFRICA",
            Self::Asia => "ASIA",
            Self::Europe => "EUROPE",
            Self::NorthAmerica => "NORTH_AMERICA",
            Self::SouthAmerica => "SOUTH_AMERICA",
            Self::Oceania => "OCEANIA",
        }
    }
}

/// Derives the canonical regional code from an arbitrary region name.
///
/// `"World"` (any case) maps to [`WORLD_CODE`]; everything else uppercases
/// and replaces spaces with underscores, so `"North America"` becomes
/// `"NORTH_AMERICA"`.
#[must_use]
pub fn region_code(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.eq_ignore_ascii_case("world") {
        WORLD_CODE.to_string()
    } else {
        trimmed.to_uppercase().replace(' ', "_")
    }
}

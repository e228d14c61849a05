//! Regions represent the geographical areas from which credits can be sourced.
use crate::units::Dimensionless;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// A geographical area in which offset projects are located
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Region {
    /// North America
    NorthAmerica,
    /// South and Central America
    SouthAmerica,
    /// Europe
    Europe,
    /// Africa
    Africa,
    /// Asia
    Asia,
    /// Oceania
    Oceania,
}

/// The fraction of each purchase to source from each region.
///
/// Fractions are expected to sum to one, but this is not enforced by the engine.
pub type RegionAllocation = IndexMap<Region, Dimensionless>;

/// Iterate over the regions which receive a non-zero share of purchases
pub fn iter_active(
    allocation: &RegionAllocation,
) -> impl Iterator<Item = (Region, Dimensionless)> + '_ {
    allocation
        .iter()
        .filter(|(_, share)| **share > Dimensionless(0.0))
        .map(|(region, share)| (*region, *share))
}

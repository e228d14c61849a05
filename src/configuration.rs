//! Predefined typology mixes, grouped by what the buyer wants to prioritise.
use crate::typology::TypologyMix;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// What a buyer wants their portfolio to prioritise
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
pub enum ConfigCategory {
    /// Maximise the carbon impact of each credit
    CarbonImpact,
    /// Maximise the certainty that stored carbon stays stored
    Durability,
    /// Maximise co-benefits for biodiversity
    Biodiversity,
    /// A balanced mix of project makers
    ProjectMaker,
}

/// Candidate typology mixes for each category, ordered from most to least aligned
pub type ConfigurationMap = IndexMap<ConfigCategory, Vec<TypologyMix>>;

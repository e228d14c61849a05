//! Code for reading the predefined configurations CSV file.
use super::{check_fractions_sum_to_one, input_err_msg, read_csv};
use crate::configuration::{ConfigCategory, ConfigurationMap};
use crate::typology::{Typology, TypologyMix};
use crate::units::Dimensionless;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use strum::IntoEnumIterator;

const CONFIGURATIONS_FILE_NAME: &str = "configurations.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct ConfigurationRaw {
    category: ConfigCategory,
    priority: usize,
    typology: Typology,
    share: Dimensionless,
}

/// Read the candidate typology mixes for each category.
///
/// Within a category, priorities must run from zero without gaps. Zero is the most aligned mix.
pub fn read_configurations(data_dir: &Path) -> Result<ConfigurationMap> {
    let file_path = data_dir.join(CONFIGURATIONS_FILE_NAME);
    let configurations_csv = read_csv(&file_path)?;
    read_configurations_from_iter(configurations_csv).with_context(|| input_err_msg(&file_path))
}

fn read_configurations_from_iter<I>(iter: I) -> Result<ConfigurationMap>
where
    I: Iterator<Item = ConfigurationRaw>,
{
    let mut raw: BTreeMap<(ConfigCategory, usize), TypologyMix> = BTreeMap::new();
    for record in iter {
        ensure!(
            (0.0..=1.0).contains(&record.share.value()),
            "Invalid share for {} in {} configuration {}: {}. Must be between 0 and 1.",
            record.typology,
            record.category,
            record.priority,
            record.share
        );

        let mix = raw.entry((record.category, record.priority)).or_default();
        ensure!(
            mix.insert(record.typology, record.share).is_none(),
            "Duplicate share for {} in {} configuration {}",
            record.typology,
            record.category,
            record.priority
        );
    }

    let mut configurations = ConfigurationMap::new();
    for category in ConfigCategory::iter() {
        let mixes: Vec<_> = raw
            .iter()
            .filter(|((c, _), _)| *c == category)
            .map(|((_, priority), mix)| (*priority, mix))
            .collect();
        if mixes.is_empty() {
            continue;
        }

        for (expected, (priority, mix)) in mixes.iter().enumerate() {
            ensure!(
                *priority == expected,
                "Priorities for {category} configurations must run from 0 without gaps \
                (expected {expected}, found {priority})"
            );
            check_fractions_sum_to_one(mix.values().copied()).with_context(|| {
                format!("Invalid shares for {category} configuration {priority}")
            })?;
        }

        let mixes = mixes.into_iter().map(|(_, mix)| mix.clone()).collect();
        configurations.insert(category, mixes);
    }

    Ok(configurations)
}

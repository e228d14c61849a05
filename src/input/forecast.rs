//! Code for reading the price forecasts CSV file.
use super::{input_err_msg, read_csv};
use crate::market::{ForecastMap, Scenario};
use crate::planning::schedule::Horizon;
use crate::typology::Typology;
use crate::units::MoneyPerQuantity;
use anyhow::{Context, Result, ensure};
use itertools::iproduct;
use serde::Deserialize;
use std::path::Path;
use strum::IntoEnumIterator;

const FORECASTS_FILE_NAME: &str = "forecasts.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct ForecastRaw {
    typology: Typology,
    scenario: Scenario,
    year: u32,
    price: MoneyPerQuantity,
}

/// Read price forecasts from the specified data directory.
///
/// Every typology must be priced under every scenario for every year of the horizon. Forecasts
/// for years outside the horizon are accepted but never used.
pub fn read_forecasts(data_dir: &Path, horizon: &Horizon) -> Result<ForecastMap> {
    let file_path = data_dir.join(FORECASTS_FILE_NAME);
    let forecasts_csv = read_csv(&file_path)?;
    read_forecasts_from_iter(forecasts_csv, horizon).with_context(|| input_err_msg(&file_path))
}

fn read_forecasts_from_iter<I>(iter: I, horizon: &Horizon) -> Result<ForecastMap>
where
    I: Iterator<Item = ForecastRaw>,
{
    let mut forecasts = ForecastMap::new();
    for record in iter {
        ensure!(
            record.price.is_finite() && record.price > MoneyPerQuantity(0.0),
            "Invalid price for {} ({} scenario) in {}: {}. Must be > 0.",
            record.typology,
            record.scenario,
            record.year,
            record.price
        );

        let existing = forecasts
            .insert((record.typology, record.scenario, record.year), record.price)
            .is_some();
        ensure!(
            !existing,
            "Duplicate price forecast for {} ({} scenario) in {}",
            record.typology,
            record.scenario,
            record.year
        );
    }

    for (typology, scenario, year) in iproduct!(
        Typology::iter(),
        Scenario::iter(),
        horizon.current_year..=horizon.target_year
    ) {
        ensure!(
            forecasts.contains_key(&(typology, scenario, year)),
            "Missing price forecast for {typology} ({scenario} scenario) in {year}"
        );
    }

    Ok(forecasts)
}

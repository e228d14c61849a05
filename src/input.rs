//! Common routines for handling input data.
use crate::market::MarketData;
use crate::model::{Model, PlannerParameters};
use crate::planning::schedule::Horizon;
use crate::typology::Typology;
use crate::units::Dimensionless;
use anyhow::{Context, Result, bail, ensure};
use float_cmp::approx_eq;
use itertools::{Itertools, iproduct};
use log::warn;
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::fs;
use std::path::Path;
use strum::IntoEnumIterator;

pub mod configuration;
use configuration::read_configurations;
pub mod forecast;
use forecast::read_forecasts;
pub mod plan;
pub mod region_factor;
use region_factor::read_region_factors;

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    let vec = read_csv_internal(file_path)?;
    if vec.is_empty() {
        bail!("CSV file {} cannot be empty", file_path.display());
    }

    Ok(vec.into_iter())
}

fn read_csv_internal<'a, T: DeserializeOwned + 'a>(file_path: &'a Path) -> Result<Vec<T>> {
    let vec = csv::Reader::from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .process_results(|iter| iter.collect_vec())
        .with_context(|| input_err_msg(file_path))?;

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;

    Ok(toml_data)
}

/// Read a [`Dimensionless`] value, checking that it is between 0 and 1
pub fn deserialise_proportion<'de, D>(deserialiser: D) -> Result<Dimensionless, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) {
        Err(serde::de::Error::custom("Value must be between 0 and 1"))?;
    }

    Ok(Dimensionless(value))
}

/// Read a [`Dimensionless`] value, checking that it is between 0 and 1 and not zero
pub fn deserialise_proportion_nonzero<'de, D>(deserialiser: D) -> Result<Dimensionless, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) || value <= 0.0 {
        Err(serde::de::Error::custom("Value must be > 0 and <= 1"))?;
    }

    Ok(Dimensionless(value))
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Check that fractions sum to (approximately) one
pub fn check_fractions_sum_to_one<I>(fractions: I) -> Result<()>
where
    I: Iterator<Item = Dimensionless>,
{
    let sum: Dimensionless = fractions.sum();
    ensure!(
        approx_eq!(f64, sum.value(), 1.0, epsilon = 1e-6),
        "Sum of fractions does not equal one (actual: {sum})"
    );

    Ok(())
}

/// Load a planner model from the specified directory.
///
/// # Arguments
///
/// * `data_dir` - Folder containing planner data files
///
/// # Returns
///
/// The static data for the planner or an error if any file is missing or invalid
pub fn load_model<P: AsRef<Path>>(data_dir: P) -> Result<Model> {
    let data_dir = data_dir.as_ref();
    let parameters = PlannerParameters::from_path(data_dir)?;
    let horizon = parameters.horizon();

    let forecasts = read_forecasts(data_dir, &horizon)?;
    let region_factors = read_region_factors(data_dir)?;
    let configurations = read_configurations(data_dir)?;

    let market = MarketData {
        forecasts,
        region_factors,
    };
    warn_unordered_scenarios(&market, &horizon);

    Ok(Model {
        data_path: data_dir.to_path_buf(),
        parameters,
        market,
        configurations,
    })
}

/// Warn about typologies whose prices are not ordered low <= medium <= high.
///
/// Returns the number of typology-years for which a warning was issued.
fn warn_unordered_scenarios(market: &MarketData, horizon: &Horizon) -> usize {
    let mut count = 0;
    for (typology, year) in iproduct!(Typology::iter(), horizon.current_year..=horizon.target_year)
    {
        if !market.is_scenario_ordered(typology, year) {
            let [low, medium, high] = market.prices(typology, year);
            warn!(
                "Price scenarios for {typology} in {year} are not ordered low <= medium <= high \
                ({low}, {medium}, {high})"
            );
            count += 1;
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, flat_market, horizon};
    use crate::market::Scenario;
    use crate::units::MoneyPerQuantity;
    use rstest::rstest;
    use serde::Deserialize;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Record {
        id: String,
        value: u32,
    }

    /// Create an example CSV file in `dir_path`
    fn create_csv_file(dir_path: &Path, contents: &str) -> PathBuf {
        let file_path = dir_path.join("test.csv");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "{contents}").unwrap();
        file_path
    }

    #[test]
    fn test_read_csv() {
        let dir = tempdir().unwrap();
        let file_path = create_csv_file(dir.path(), "id,value\nhello,1\nworld,2\n");
        let records: Vec<Record> = read_csv(&file_path).unwrap().collect();
        assert_eq!(
            records,
            &[
                Record {
                    id: "hello".to_string(),
                    value: 1,
                },
                Record {
                    id: "world".to_string(),
                    value: 2,
                }
            ]
        );

        // File with no data (only column headers)
        let file_path = create_csv_file(dir.path(), "id,value\n");
        assert!(read_csv::<Record>(&file_path).is_err());
    }

    #[test]
    fn test_read_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.toml");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "id = \"hello\"\nvalue = 1").unwrap();
        }

        assert_eq!(
            read_toml::<Record>(&file_path).unwrap(),
            Record {
                id: "hello".to_string(),
                value: 1,
            }
        );

        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "bad toml syntax").unwrap();
        }

        assert!(read_toml::<Record>(&file_path).is_err());
    }

    #[derive(Debug, Deserialize)]
    struct Proportion {
        #[serde(deserialize_with = "deserialise_proportion")]
        value: Dimensionless,
    }

    #[derive(Debug, Deserialize)]
    struct NonzeroProportion {
        #[serde(deserialize_with = "deserialise_proportion_nonzero")]
        value: Dimensionless,
    }

    #[rstest]
    #[case(0.0, true, false)]
    #[case(0.5, true, true)]
    #[case(1.0, true, true)]
    #[case(-0.1, false, false)]
    #[case(1.1, false, false)]
    #[case(f64::NAN, false, false)]
    fn test_deserialise_proportion(
        #[case] value: f64,
        #[case] valid: bool,
        #[case] valid_nonzero: bool,
    ) {
        let toml_str = format!("value = {value}");
        let parsed = toml::from_str::<Proportion>(&toml_str);
        assert_eq!(parsed.is_ok(), valid);
        if let Ok(parsed) = parsed {
            assert_eq!(parsed.value, Dimensionless(value));
        }

        assert_eq!(
            toml::from_str::<NonzeroProportion>(&toml_str).is_ok(),
            valid_nonzero
        );
    }

    #[rstest]
    #[case(&[1.0], true)]
    #[case(&[0.4, 0.6], true)]
    #[case(&[0.2, 0.3, 0.5], true)]
    #[case(&[0.5, 0.4], false)]
    #[case(&[], false)]
    fn test_check_fractions_sum_to_one(#[case] fractions: &[f64], #[case] valid: bool) {
        let result = check_fractions_sum_to_one(fractions.iter().copied().map(Dimensionless));
        assert_eq!(result.is_ok(), valid);
    }

    #[test]
    fn test_check_fractions_sum_to_one_message() {
        assert_error!(
            check_fractions_sum_to_one([Dimensionless(0.5)].into_iter()),
            "Sum of fractions does not equal one (actual: 0.5)"
        );
    }

    #[rstest]
    fn test_warn_unordered_scenarios(mut flat_market: MarketData, horizon: Horizon) {
        assert_eq!(warn_unordered_scenarios(&flat_market, &horizon), 0);

        flat_market.forecasts.insert(
            (Typology::Dac, Scenario::Low, 2040),
            MoneyPerQuantity(50.0),
        );
        assert_eq!(warn_unordered_scenarios(&flat_market, &horizon), 1);
    }
}

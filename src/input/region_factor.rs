//! Code for reading the region factors CSV file.
use super::{input_err_msg, read_csv};
use crate::market::RegionFactorMap;
use crate::region::Region;
use crate::typology::Typology;
use crate::units::Dimensionless;
use anyhow::{Context, Result, ensure};
use itertools::iproduct;
use serde::Deserialize;
use std::path::Path;
use strum::IntoEnumIterator;

const REGION_FACTORS_FILE_NAME: &str = "region_factors.csv";

#[derive(PartialEq, Debug, Deserialize)]
struct RegionFactorRaw {
    typology: Typology,
    region: Region,
    factor: Dimensionless,
}

/// Read the cost multiplier for each typology and region
pub fn read_region_factors(data_dir: &Path) -> Result<RegionFactorMap> {
    let file_path = data_dir.join(REGION_FACTORS_FILE_NAME);
    let region_factors_csv = read_csv(&file_path)?;
    read_region_factors_from_iter(region_factors_csv).with_context(|| input_err_msg(&file_path))
}

fn read_region_factors_from_iter<I>(iter: I) -> Result<RegionFactorMap>
where
    I: Iterator<Item = RegionFactorRaw>,
{
    let mut factors = RegionFactorMap::new();
    for record in iter {
        ensure!(
            record.factor.is_finite() && record.factor > Dimensionless(0.0),
            "Invalid region factor for {} in {}: {}. Must be > 0.",
            record.typology,
            record.region,
            record.factor
        );
        ensure!(
            factors
                .insert((record.typology, record.region), record.factor)
                .is_none(),
            "Duplicate region factor for {} in {}",
            record.typology,
            record.region
        );
    }

    for (typology, region) in iproduct!(Typology::iter(), Region::iter()) {
        ensure!(
            factors.contains_key(&(typology, region)),
            "Missing region factor for {typology} in {region}"
        );
    }

    Ok(factors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;

    fn complete_records() -> Vec<RegionFactorRaw> {
        iproduct!(Typology::iter(), Region::iter())
            .map(|(typology, region)| RegionFactorRaw {
                typology,
                region,
                factor: Dimensionless(1.0),
            })
            .collect()
    }

    #[test]
    fn test_read_region_factors_from_iter() {
        let mut records = complete_records();
        records[0].factor = Dimensionless(1.24);
        let factors = read_region_factors_from_iter(records.into_iter()).unwrap();
        assert_eq!(factors.len(), 30);
        assert_eq!(
            factors[&(Typology::NbsRemoval, Region::NorthAmerica)],
            Dimensionless(1.24)
        );
    }

    #[test]
    fn test_read_region_factors_missing() {
        let records = complete_records()
            .into_iter()
            .filter(|r| !(r.typology == Typology::Dac && r.region == Region::Oceania));
        assert_error!(
            read_region_factors_from_iter(records),
            "Missing region factor for dac in oceania"
        );
    }

    #[test]
    fn test_read_region_factors_duplicate() {
        let mut records = complete_records();
        records.push(RegionFactorRaw {
            typology: Typology::Biochar,
            region: Region::Asia,
            factor: Dimensionless(2.0),
        });
        assert_error!(
            read_region_factors_from_iter(records.into_iter()),
            "Duplicate region factor for biochar in asia"
        );
    }

    #[test]
    fn test_read_region_factors_zero() {
        let mut records = complete_records();
        records[3].factor = Dimensionless(0.0);
        assert!(read_region_factors_from_iter(records.into_iter()).is_err());
    }
}

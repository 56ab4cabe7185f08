//! Model input tables: category info, hazard protection, macro aggregates

use super::open_table;
use crate::error::Result;
use crate::keys::{CountryHazard, CountryQuintile, Hazard, IncomeCat, Iso3};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Per-quintile household characteristics (`scenario__cat_info.csv`)
///
/// `NA`, `NaN` and empty cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryInfo {
    /// Capital per capita
    pub k: Option<f64>,
    /// Consumption per capita
    pub c: Option<f64>,
    pub income_share: Option<f64>,
    /// Share of income not earned from labor
    pub diversified_share: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CategoryInfoRow {
    iso3: Iso3,
    income_cat: IncomeCat,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    k: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    c: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    income_share: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    diversified_share: Option<f64>,
}

fn known(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

/// Country-level aggregates (`scenario__macro.csv`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacroInfo {
    pub pop: Option<f64>,
    /// Average productivity of capital
    pub avg_prod_k: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MacroRow {
    iso3: Iso3,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pop: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    avg_prod_k: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ProtectionRow {
    iso3: Iso3,
    hazard: Hazard,
    #[serde(deserialize_with = "csv::invalid_option")]
    protection: Option<f64>,
}

pub type CategoryTable = BTreeMap<CountryQuintile, CategoryInfo>;
pub type ProtectionTable = BTreeMap<CountryHazard, f64>;
pub type MacroTable = BTreeMap<Iso3, MacroInfo>;

/// Load category info from a CSV file
pub fn load_category_info<P: AsRef<Path>>(path: P) -> Result<CategoryTable> {
    read_category_info(open_table(path.as_ref())?)
}

/// Load category info from any reader
pub fn load_category_info_from_reader<R: std::io::Read>(reader: R) -> Result<CategoryTable> {
    read_category_info(csv::Reader::from_reader(reader))
}

fn read_category_info<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<CategoryTable> {
    let mut table = BTreeMap::new();
    for result in reader.deserialize() {
        let row: CategoryInfoRow = result?;
        table.insert(
            CountryQuintile {
                iso3: row.iso3,
                income_cat: row.income_cat,
            },
            CategoryInfo {
                k: known(row.k),
                c: known(row.c),
                income_share: known(row.income_share),
                diversified_share: known(row.diversified_share),
            },
        );
    }
    log::info!("Loaded category info for {} country quintiles", table.len());
    Ok(table)
}

/// Load hazard protection levels from a CSV file
pub fn load_hazard_protection<P: AsRef<Path>>(path: P) -> Result<ProtectionTable> {
    read_hazard_protection(open_table(path.as_ref())?)
}

/// Load hazard protection levels from any reader
pub fn load_hazard_protection_from_reader<R: std::io::Read>(reader: R) -> Result<ProtectionTable> {
    read_hazard_protection(csv::Reader::from_reader(reader))
}

fn read_hazard_protection<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<ProtectionTable> {
    let mut table = BTreeMap::new();
    for result in reader.deserialize() {
        let row: ProtectionRow = result?;
        // Missing protection means unprotected; leave the key out
        if let Some(protection) = known(row.protection) {
            table.insert(
                CountryHazard {
                    iso3: row.iso3,
                    hazard: row.hazard,
                },
                protection,
            );
        }
    }
    log::info!("Loaded hazard protection for {} country hazards", table.len());
    Ok(table)
}

/// Load macro aggregates from a CSV file
pub fn load_macro<P: AsRef<Path>>(path: P) -> Result<MacroTable> {
    read_macro(open_table(path.as_ref())?)
}

/// Load macro aggregates from any reader
pub fn load_macro_from_reader<R: std::io::Read>(reader: R) -> Result<MacroTable> {
    read_macro(csv::Reader::from_reader(reader))
}

fn read_macro<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<MacroTable> {
    let mut table = BTreeMap::new();
    for result in reader.deserialize() {
        let row: MacroRow = result?;
        table.insert(
            row.iso3,
            MacroInfo {
                pop: known(row.pop),
                avg_prod_k: known(row.avg_prod_k),
            },
        );
    }
    log::info!("Loaded macro data for {} countries", table.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_category_info() {
        let csv = "\
iso3,income_cat,n,c,k,income_share,diversified_share
AAA,q1,0.2,1000.0,3000.0,0.05,0.25
AAA,q2,0.2,2000.0,6000.0,0.10,0.20
";
        let table = load_category_info_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);

        let q2 = &table[&CountryQuintile {
            iso3: Iso3::new("AAA"),
            income_cat: IncomeCat::quintile("q2"),
        }];
        assert_eq!(q2.c, Some(2000.0));
        assert_eq!(q2.k, Some(6000.0));
        assert_eq!(q2.diversified_share, Some(0.20));
    }

    #[test]
    fn test_category_info_with_missing_values() {
        let csv = "\
iso3,income_cat,k,c,income_share,diversified_share
AAA,q1,3000,1000,0.05,NaN
BBB,q1,NA,NA,NA,NA
CCC,q1,,500,,0.1
";
        let table = load_category_info_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);

        let row = |iso: &str| {
            &table[&CountryQuintile {
                iso3: Iso3::new(iso),
                income_cat: IncomeCat::quintile("q1"),
            }]
        };
        assert_eq!(row("AAA").diversified_share, None);
        assert_eq!(
            row("BBB"),
            &CategoryInfo {
                k: None,
                c: None,
                income_share: None,
                diversified_share: None,
            }
        );
        assert_eq!(row("CCC").k, None);
        assert_eq!(row("CCC").c, Some(500.0));
    }

    #[test]
    fn test_protection_skips_missing_levels() {
        let csv = "\
iso3,hazard,protection
AAA,Flood,5
AAA,Wind,
BBB,Flood,NA
";
        let table = load_hazard_protection_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
        let key = CountryHazard {
            iso3: Iso3::new("AAA"),
            hazard: Hazard::named("Flood"),
        };
        assert_eq!(table[&key], 5.0);
    }

    #[test]
    fn test_load_macro_with_missing_values() {
        let csv = "\
iso3,gdp_pc_pp,pop,avg_prod_k
AAA,1.0,1000000,0.3
BBB,2.0,NA,0.25
";
        let table = load_macro_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table[&Iso3::new("AAA")].pop, Some(1_000_000.0));
        assert_eq!(table[&Iso3::new("BBB")].pop, None);
        assert_eq!(table[&Iso3::new("BBB")].avg_prod_k, Some(0.25));
    }
}

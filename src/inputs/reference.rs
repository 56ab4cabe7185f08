//! Country reference series: annual work hours and employment-to-population ratio
//!
//! These come from spreadsheet exports with loose conventions: `NA` marks a
//! missing value, some rows have no country code, and the ratio column is
//! named differently across releases. Each file is read as a single
//! `iso3 -> value` series.

use super::open_table;
use crate::error::{PipelineError, Result};
use crate::keys::Iso3;
use csv::StringRecord;
use std::collections::BTreeMap;
use std::path::Path;

/// Country series with explicit missing values
pub type CountrySeries = BTreeMap<Iso3, Option<f64>>;

const WORK_HOURS_COLUMN: &str = "annual_work_hrs";

/// Load annual work hours per worker
pub fn load_work_hours<P: AsRef<Path>>(path: P) -> Result<CountrySeries> {
    read_series(open_table(path.as_ref())?, Some(WORK_HOURS_COLUMN))
}

pub fn load_work_hours_from_reader<R: std::io::Read>(reader: R) -> Result<CountrySeries> {
    read_series(csv::Reader::from_reader(reader), Some(WORK_HOURS_COLUMN))
}

/// Load employment-to-population ratios; the value is the first non-`iso3` column
pub fn load_employment_ratio<P: AsRef<Path>>(path: P) -> Result<CountrySeries> {
    read_series(open_table(path.as_ref())?, None)
}

pub fn load_employment_ratio_from_reader<R: std::io::Read>(reader: R) -> Result<CountrySeries> {
    read_series(csv::Reader::from_reader(reader), None)
}

fn read_series<R: std::io::Read>(mut reader: csv::Reader<R>, column: Option<&'static str>) -> Result<CountrySeries> {
    let headers = reader.headers()?.clone();
    let iso_idx = column_index(&headers, "iso3")?;
    let value_idx = match column {
        Some(name) => column_index(&headers, name)?,
        None => headers
            .iter()
            .position(|h| h.trim() != "iso3")
            .ok_or(PipelineError::MissingColumn {
                column: "value",
                context: "country reference series".to_string(),
            })?,
    };

    let mut series = BTreeMap::new();
    for result in reader.records() {
        let record = result?;
        let iso3 = match record.get(iso_idx).and_then(non_missing) {
            Some(code) => Iso3::new(code),
            None => {
                log::debug!("Skipping reference row without iso3: {:?}", record);
                continue;
            }
        };
        let value = match record.get(value_idx).and_then(non_missing) {
            Some(raw) => Some(raw.parse::<f64>().map_err(|_| PipelineError::InvalidLabel {
                kind: "number",
                value: raw.to_string(),
            })?),
            None => None,
        };
        if series.insert(iso3.clone(), value).is_some() {
            log::debug!("Duplicate reference row for {}, keeping the last one", iso3);
        }
    }
    Ok(series)
}

fn column_index(headers: &StringRecord, name: &'static str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or(PipelineError::MissingColumn {
            column: name,
            context: "country reference series".to_string(),
        })
}

/// Trimmed cell content, `None` for the spreadsheet missing-value markers
fn non_missing(cell: &str) -> Option<&str> {
    let cell = cell.trim();
    match cell {
        "" | "NA" | "N/A" | "NaN" | "nan" => None,
        _ => Some(cell),
    }
}

//! Household impact records from the simulation outputs (`iah.csv`)

use super::open_table;
use crate::error::{PipelineError, Result};
use crate::keys::{EventKey, Hazard, IncomeCat, Iso3, ReturnPeriod};
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// One simulated household group for one event
///
/// The six leading fields form the record key. Only `n` is required by every
/// pipeline; the loss columns are optional so that either pipeline can run on
/// a trimmed export. A loss column that is present but has an empty or `NA`
/// cell reads as `Some(NaN)`; `None` means the column itself is absent.
#[derive(Debug, Clone, Deserialize)]
pub struct HouseholdImpact {
    pub iso3: Iso3,
    pub hazard: Hazard,
    pub rp: ReturnPeriod,
    pub income_cat: IncomeCat,
    pub affected_cat: String,
    pub helped_cat: String,

    /// Population weight of the group
    pub n: f64,

    /// Labor income loss
    #[serde(default, deserialize_with = "loss_cell")]
    pub di_lab: Option<f64>,

    /// Short-term consumption loss
    #[serde(default, deserialize_with = "loss_cell")]
    pub dc_short_term: Option<f64>,

    /// Reconstruction cost borne by the household
    #[serde(default, deserialize_with = "loss_cell")]
    pub dk_reco: Option<f64>,

    /// Post-disaster support received during reconstruction
    #[serde(default, rename = "dS_reco_PDS", deserialize_with = "loss_cell")]
    pub ds_reco_pds: Option<f64>,

    /// Asset loss
    #[serde(default, deserialize_with = "loss_cell")]
    pub dk: Option<f64>,

    /// Reconstruction rate
    #[serde(default, deserialize_with = "loss_cell")]
    pub lambda_h: Option<f64>,
}

fn loss_cell<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<f64>, D::Error> {
    let cell: Option<f64> = csv::invalid_option(deserializer)?;
    Ok(Some(cell.unwrap_or(f64::NAN)))
}

impl HouseholdImpact {
    /// Key with the affected/helped sub-group dropped
    pub fn event_key(&self) -> EventKey {
        EventKey::new(
            self.iso3.clone(),
            self.hazard.clone(),
            self.rp,
            self.income_cat.clone(),
        )
    }

    /// Read an optional column, failing if this record does not carry it
    pub fn require(&self, column: &'static str, value: Option<f64>) -> Result<f64> {
        value.ok_or_else(|| PipelineError::MissingColumn {
            column,
            context: format!(
                "{}/{}/{}/{}/{}/{}",
                self.iso3, self.hazard, self.rp, self.income_cat, self.affected_cat, self.helped_cat
            ),
        })
    }
}

/// Load household impacts from a CSV file
pub fn load_household_impacts<P: AsRef<Path>>(path: P) -> Result<Vec<HouseholdImpact>> {
    let reader = open_table(path.as_ref())?;
    read_household_impacts(reader)
}

/// Load household impacts from any reader (e.g., string buffer)
pub fn load_household_impacts_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<HouseholdImpact>> {
    read_household_impacts(csv::Reader::from_reader(reader))
}

fn read_household_impacts<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<HouseholdImpact>> {
    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: HouseholdImpact = result?;
        records.push(record);
    }
    log::info!("Loaded {} household impact records", records.len());
    Ok(records)
}

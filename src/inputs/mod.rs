//! Input loading: simulation outputs and reference tables

mod household;
mod reference;
mod tables;

pub use household::{load_household_impacts, load_household_impacts_from_reader, HouseholdImpact};
pub use reference::{
    load_employment_ratio, load_employment_ratio_from_reader, load_work_hours,
    load_work_hours_from_reader, CountrySeries,
};
pub use tables::{
    load_category_info, load_category_info_from_reader, load_hazard_protection,
    load_hazard_protection_from_reader, load_macro, load_macro_from_reader, CategoryInfo,
    CategoryTable, MacroInfo, MacroTable, ProtectionTable,
};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use std::fs::File;
use std::path::Path;

/// Open a CSV table, reporting the path when the file is missing
pub(crate) fn open_table(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    Ok(csv::Reader::from_reader(file))
}

/// Everything the upstream model produced for one scenario
#[derive(Debug, Clone)]
pub struct ModelInputs {
    pub household_impacts: Vec<HouseholdImpact>,
    pub category_info: CategoryTable,
    pub hazard_protection: ProtectionTable,
    pub macro_info: MacroTable,
}

impl ModelInputs {
    /// Load all model tables from the configured model data directory
    pub fn load(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            household_impacts: load_household_impacts(config.household_impacts_path())?,
            category_info: load_category_info(config.category_info_path())?,
            hazard_protection: load_hazard_protection(config.hazard_protection_path())?,
            macro_info: load_macro(config.macro_path())?,
        })
    }
}

/// External country reference series used by the JEL indicators
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub work_hours: CountrySeries,
    pub employment_ratio: CountrySeries,
}

impl ReferenceData {
    pub fn load(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            work_hours: load_work_hours(config.work_hours_path())?,
            employment_ratio: load_employment_ratio(config.employment_ratio_path())?,
        })
    }
}

//! Pipeline configuration: input/output locations and model constants

use std::path::{Path, PathBuf};

/// Default directory holding the upstream model's outputs
pub const DEFAULT_MODEL_DATA_PATH: &str = "data/model_data";
/// Default directory holding the work-hours and employment-ratio tables
pub const DEFAULT_REFERENCE_DATA_PATH: &str = "data";
/// Default output directory
pub const DEFAULT_OUTPUT_PATH: &str = "output";
/// Property carrying the ISO-3 code in Natural Earth admin-0 boundaries
pub const DEFAULT_ISO_PROPERTY: &str = "ISO_A3_EH";

/// Numerical constants of the indicator formulas
#[derive(Debug, Clone, PartialEq)]
pub struct Constants {
    /// Population share of each income quintile
    pub quintile_share: f64,
    /// Working weeks per year used to turn annual hours into weekly hours
    pub weeks_per_year: f64,
    /// Weekly hours of a full-time job
    pub full_time_hours: f64,
    /// Return period at which losses are anchored to zero
    pub zero_rp: Option<u32>,
    /// Horizon (years) over which reconstruction output losses accrue
    pub recovery_horizon_years: f64,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            quintile_share: 0.2,
            weeks_per_year: 47.0,
            full_time_hours: 40.0,
            zero_rp: Some(2),
            recovery_horizon_years: 50.0,
        }
    }
}

/// Where the pipeline reads from and writes to
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub model_data_dir: PathBuf,
    pub reference_data_dir: PathBuf,
    pub output_dir: PathBuf,
    /// GeoJSON country boundaries; maps are skipped when unset
    pub boundaries: Option<PathBuf>,
    pub iso_property: String,
    /// Command that produces `model_data_dir` when it is missing
    pub model_command: Option<String>,
    /// Extra arguments passed to `model_command` verbatim
    pub model_args: Vec<String>,
    /// Zip the output directory after writing
    pub archive: bool,
    pub constants: Constants,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_data_dir: PathBuf::from(DEFAULT_MODEL_DATA_PATH),
            reference_data_dir: PathBuf::from(DEFAULT_REFERENCE_DATA_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_PATH),
            boundaries: None,
            iso_property: DEFAULT_ISO_PROPERTY.to_string(),
            model_command: None,
            model_args: Vec::new(),
            archive: true,
            constants: Constants::default(),
        }
    }
}

impl PipelineConfig {
    /// Config with every input resolved under a single root directory
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            model_data_dir: root.join(DEFAULT_MODEL_DATA_PATH),
            reference_data_dir: root.join(DEFAULT_REFERENCE_DATA_PATH),
            output_dir: root.join(DEFAULT_OUTPUT_PATH),
            ..Self::default()
        }
    }

    pub fn household_impacts_path(&self) -> PathBuf {
        self.model_data_dir.join("simulation_outputs").join("iah.csv")
    }

    pub fn macro_results_path(&self) -> PathBuf {
        self.model_data_dir.join("simulation_outputs").join("results.csv")
    }

    pub fn category_info_path(&self) -> PathBuf {
        self.model_data_dir.join("model_inputs").join("scenario__cat_info.csv")
    }

    pub fn hazard_protection_path(&self) -> PathBuf {
        self.model_data_dir.join("model_inputs").join("scenario__hazard_protection.csv")
    }

    pub fn macro_path(&self) -> PathBuf {
        self.model_data_dir.join("model_inputs").join("scenario__macro.csv")
    }

    pub fn work_hours_path(&self) -> PathBuf {
        self.reference_data_dir.join("work_hours.csv")
    }

    pub fn employment_ratio_path(&self) -> PathBuf {
        self.reference_data_dir.join("employment_pop_ratio.csv")
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

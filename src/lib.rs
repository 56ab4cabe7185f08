//! Resilience Indicators - derived economic-loss indicators from disaster-resilience model outputs
//!
//! This library provides:
//! - Loading of per-household simulated impacts and model/reference tables
//! - Population-weighted collapse of simulation sub-groups
//! - Annualization of losses over hazard return periods with protection levels
//! - Job Equivalent Loss (JEL) and income/output loss indicators with roll-ups
//! - CSV export, dated zip archives and optional choropleth maps

pub mod error;
pub mod keys;
pub mod config;
pub mod inputs;
pub mod aggregation;
pub mod indicators;
pub mod export;
pub mod visualize;
pub mod upstream;
pub mod pipeline;

// Re-export commonly used types
pub use error::{PipelineError, Result};
pub use config::{Constants, PipelineConfig};
pub use keys::{AnnualKey, EventKey, Hazard, IncomeCat, Iso3, JelKey, ReturnPeriod};
pub use inputs::{ModelInputs, ReferenceData};
pub use pipeline::{run_jel, run_losses, RunSummary};

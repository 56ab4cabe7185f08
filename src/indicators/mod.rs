//! Derived indicators: Job Equivalent Loss and income/output losses

pub mod jel;
pub mod losses;

pub use jel::{
    adjust_for_time, baseline_labor_income, build_jel_params, compute_jel, quintile_population,
    JelIndicators, JelParams, JelRow,
};
pub use losses::{compute_losses, household_losses, quintile_info, recovery_output_factor, LossRow, QuintileInfo};

//! Aggregation steps shared by the JEL and loss pipelines

mod return_period;
mod rollup;
mod subgroup;

pub use return_period::{annualize, average_over_rp, CurvePoint};
pub use rollup::{
    add_all_hazards_sum, add_income_national_mean, add_income_total_sum, RollupKey, RollupValue,
};
pub use subgroup::weighted_by_population;

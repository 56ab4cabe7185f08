//! Population-weighted collapse of affected/helped sub-groups

use crate::error::Result;
use crate::inputs::HouseholdImpact;
use crate::keys::EventKey;
use std::collections::BTreeMap;

#[derive(Default)]
struct WeightedSum {
    weighted: Vec<f64>,
    weight: f64,
}

/// Average per-record values over sub-groups, weighted by `n`
///
/// For every (iso3, hazard, rp, income_cat) the result is `Σ(v·n) / Σn` for
/// each column returned by `values`. A NaN value adds nothing to the weighted
/// sum while its `n` still counts toward the total weight. Keys whose weights
/// sum to zero have no defined average and are dropped.
pub fn weighted_by_population<F>(records: &[HouseholdImpact], values: F) -> Result<BTreeMap<EventKey, Vec<f64>>>
where
    F: Fn(&HouseholdImpact) -> Result<Vec<f64>>,
{
    let mut sums: BTreeMap<EventKey, WeightedSum> = BTreeMap::new();

    for record in records {
        let row = values(record)?;
        let entry = sums.entry(record.event_key()).or_default();
        if entry.weighted.is_empty() {
            entry.weighted = vec![0.0; row.len()];
        }
        for (acc, v) in entry.weighted.iter_mut().zip(&row) {
            if !v.is_nan() {
                *acc += v * record.n;
            }
        }
        entry.weight += record.n;
    }

    let mut averaged = BTreeMap::new();
    let mut dropped = 0usize;
    for (key, sum) in sums {
        if sum.weight == 0.0 {
            dropped += 1;
            continue;
        }
        averaged.insert(key, sum.weighted.iter().map(|v| v / sum.weight).collect());
    }
    if dropped > 0 {
        log::warn!("Dropped {} event keys with zero total population weight", dropped);
    }
    Ok(averaged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::load_household_impacts_from_reader;
    use crate::keys::{Hazard, IncomeCat, Iso3, ReturnPeriod};
    use approx::assert_relative_eq;

    const IAH: &str = "\
iso3,hazard,rp,income_cat,affected_cat,helped_cat,n,di_lab
AAA,Flood,10,q1,a,helped,0.1,100.0
AAA,Flood,10,q1,a,not_helped,0.1,200.0
AAA,Flood,10,q1,na,helped,0.3,0.0
AAA,Flood,10,q1,na,not_helped,0.5,0.0
AAA,Flood,10,q2,a,helped,0.0,50.0
AAA,Flood,10,q2,na,helped,0.0,0.0
";

    #[test]
    fn test_weighted_average_over_subgroups() {
        let records = load_household_impacts_from_reader(IAH.as_bytes()).unwrap();
        let table = weighted_by_population(&records, |r| Ok(vec![r.require("di_lab", r.di_lab)?])).unwrap();

        let key = EventKey::new(
            Iso3::new("AAA"),
            Hazard::named("Flood"),
            ReturnPeriod::Years(10),
            IncomeCat::quintile("q1"),
        );
        // (0.1*100 + 0.1*200) / 1.0
        assert_relative_eq!(table[&key][0], 30.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_weight_keys_are_dropped() {
        let records = load_household_impacts_from_reader(IAH.as_bytes()).unwrap();
        let table = weighted_by_population(&records, |r| Ok(vec![r.require("di_lab", r.di_lab)?])).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_nan_cells_add_nothing_but_keep_their_weight() {
        let csv = "\
iso3,hazard,rp,income_cat,affected_cat,helped_cat,n,di_lab
AAA,Flood,10,q1,a,helped,1.0,5.0
AAA,Flood,10,q1,na,helped,1.0,
AAA,Flood,10,q2,a,helped,1.0,NA
";
        let records = load_household_impacts_from_reader(csv.as_bytes()).unwrap();
        let table = weighted_by_population(&records, |r| Ok(vec![r.require("di_lab", r.di_lab)?])).unwrap();

        let key = |q: &str| {
            EventKey::new(
                Iso3::new("AAA"),
                Hazard::named("Flood"),
                ReturnPeriod::Years(10),
                IncomeCat::quintile(q),
            )
        };
        assert_relative_eq!(table[&key("q1")][0], 2.5, epsilon = 1e-12);
        assert_eq!(table[&key("q2")][0], 0.0);
    }

    #[test]
    fn test_missing_column_propagates() {
        let records = load_household_impacts_from_reader(IAH.as_bytes()).unwrap();
        let result = weighted_by_population(&records, |r| Ok(vec![r.require("dk", r.dk)?]));
        assert!(result.is_err());
    }
}

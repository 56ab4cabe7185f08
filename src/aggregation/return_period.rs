//! Annualization of event losses over hazard return periods
//!
//! Each (iso3, hazard, income_cat) group carries one loss per simulated
//! return period. The expected annual loss integrates the loss curve over
//! annual exceedance frequency `f = 1/rp`:
//!
//! ```text
//! AAL = Σ_{k<n} (f_k − f_{k+1}) · (L_k + L_{k+1}) / 2  +  f_n · L_n
//! ```
//!
//! with points sorted by increasing return period. Events up to the
//! country's protection level cause no loss, and the curve is anchored at
//! `(zero_rp, 0)` so that frequent events below the anchor contribute nothing.

use crate::keys::{AnnualKey, CountryHazard, EventKey, ReturnPeriod};
use crate::inputs::ProtectionTable;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Loss values observed at one return period
pub type CurvePoint = (u32, Vec<f64>);

/// Collapse event losses into annual expected losses per (iso3, hazard, income_cat)
///
/// Rows already labelled `AAL` are ignored. Groups are independent and are
/// integrated in parallel.
pub fn average_over_rp(
    table: &BTreeMap<EventKey, Vec<f64>>,
    protection: &ProtectionTable,
    zero_rp: Option<u32>,
) -> BTreeMap<AnnualKey, Vec<f64>> {
    let mut groups: BTreeMap<AnnualKey, Vec<CurvePoint>> = BTreeMap::new();
    for (key, values) in table {
        if let ReturnPeriod::Years(years) = key.rp {
            groups.entry(key.annual()).or_default().push((years, values.clone()));
        }
    }

    groups
        .into_par_iter()
        .map(|(key, points)| {
            let level = protection.get(&CountryHazard {
                iso3: key.iso3.clone(),
                hazard: key.hazard.clone(),
            });
            let aal = annualize(points, level.copied(), zero_rp);
            (key, aal)
        })
        .collect()
}

/// Expected annual value of one loss curve
pub fn annualize(mut points: Vec<CurvePoint>, protection: Option<f64>, zero_rp: Option<u32>) -> Vec<f64> {
    let width = points.first().map(|(_, v)| v.len()).unwrap_or(0);

    if let Some(anchor) = zero_rp {
        let before = points.len();
        points.retain(|(rp, _)| *rp >= anchor);
        if points.len() < before {
            log::warn!(
                "Discarded {} return periods more frequent than the zero-loss anchor {}",
                before - points.len(),
                anchor
            );
        }
        let mut anchored = false;
        for (_, values) in points.iter_mut().filter(|(rp, _)| *rp == anchor) {
            values.iter_mut().for_each(|v| *v = 0.0);
            anchored = true;
        }
        if !anchored {
            points.push((anchor, vec![0.0; width]));
        }
    }

    if let Some(level) = protection {
        for (rp, values) in points.iter_mut() {
            if f64::from(*rp) <= level {
                values.iter_mut().for_each(|v| *v = 0.0);
            }
        }
    }

    points.sort_by_key(|(rp, _)| *rp);
    integrate(&points, width)
}

fn integrate(points: &[CurvePoint], width: usize) -> Vec<f64> {
    let mut total = vec![0.0; width];

    for pair in points.windows(2) {
        let (rp_a, loss_a) = &pair[0];
        let (rp_b, loss_b) = &pair[1];
        let band = 1.0 / f64::from(*rp_a) - 1.0 / f64::from(*rp_b);
        for (acc, (a, b)) in total.iter_mut().zip(loss_a.iter().zip(loss_b)) {
            *acc += band * (a + b) / 2.0;
        }
    }

    // Events rarer than the largest simulated return period keep its loss
    if let Some((rp, loss)) = points.last() {
        let tail = 1.0 / f64::from(*rp);
        for (acc, v) in total.iter_mut().zip(loss) {
            *acc += tail * v;
        }
    }

    total
}

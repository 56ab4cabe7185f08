//! Per-capita income and output losses by event and return period

use crate::aggregation::{add_all_hazards_sum, add_income_national_mean, average_over_rp, weighted_by_population};
use crate::config::Constants;
use crate::error::Result;
use crate::inputs::{CategoryTable, HouseholdImpact, MacroTable, ProtectionTable};
use crate::keys::{EventKey, Hazard, IncomeCat, Iso3, ReturnPeriod};
use serde::Serialize;
use std::collections::BTreeMap;

/// `output_losses.csv` row
#[derive(Debug, Serialize)]
pub struct LossRow {
    pub iso3: Iso3,
    pub hazard: Hazard,
    pub rp: ReturnPeriod,
    pub income_cat: IncomeCat,
    /// Income loss
    pub di: f64,
    /// Output loss
    pub dy: f64,
}

/// `quintile_info.csv` row
#[derive(Debug, Clone, Serialize)]
pub struct QuintileInfo {
    pub iso3: Iso3,
    pub income_cat: IncomeCat,
    /// Income from capital: `k · avg_prod_k`
    pub y: Option<f64>,
    pub c: Option<f64>,
    pub income_share: Option<f64>,
    pub diversified_share: Option<f64>,
}

/// Present value factor of output lost while capital is rebuilt at rate `lambda`
///
/// `(1 − e^(−T·λ)) / λ`, which tends to `T` as `λ → 0`.
pub fn recovery_output_factor(lambda: f64, horizon: f64) -> f64 {
    if lambda == 0.0 {
        horizon
    } else {
        (1.0 - (-horizon * lambda).exp()) / lambda
    }
}

/// Income and output loss of one household record: `[di, dy]`
///
/// `di = dc_short_term − dk_reco + dS_reco_PDS` and
/// `dy = dk · recovery_output_factor(lambda_h) · avg_prod_k`.
pub fn household_losses(record: &HouseholdImpact, avg_prod_k: f64, horizon: f64) -> Result<Vec<f64>> {
    let di = record.require("dc_short_term", record.dc_short_term)?
        - record.require("dk_reco", record.dk_reco)?
        + record.require("dS_reco_PDS", record.ds_reco_pds)?;
    let dk = record.require("dk", record.dk)?;
    let lambda = record.require("lambda_h", record.lambda_h)?;
    let dy = dk * recovery_output_factor(lambda, horizon) * avg_prod_k;
    Ok(vec![di, dy])
}

/// Full loss table: event rows, `AAL` rows, `all_hazards` sums and `tot` means
pub fn compute_losses(
    records: &[HouseholdImpact],
    macro_info: &MacroTable,
    protection: &ProtectionTable,
    constants: &Constants,
) -> Result<BTreeMap<EventKey, Vec<f64>>> {
    let mut missing_productivity: Vec<&Iso3> = Vec::new();
    let productivity = |iso3: &Iso3| macro_info.get(iso3).and_then(|m| m.avg_prod_k);
    for record in records {
        if productivity(&record.iso3).is_none() && !missing_productivity.contains(&&record.iso3) {
            missing_productivity.push(&record.iso3);
        }
    }
    if !missing_productivity.is_empty() {
        log::warn!(
            "No avg_prod_k for {:?}; their output losses will be NaN",
            missing_productivity
        );
    }

    let mut losses = weighted_by_population(records, |record| {
        let avg_prod_k = productivity(&record.iso3).unwrap_or(f64::NAN);
        household_losses(record, avg_prod_k, constants.recovery_horizon_years)
    })?;
    // The collapse skips NaN cells; a country without productivity has no output loss at all
    for (key, values) in losses.iter_mut() {
        if productivity(&key.iso3).is_none() {
            values[1] = f64::NAN;
        }
    }

    let aal = average_over_rp(&losses, protection, constants.zero_rp);
    losses.extend(aal.into_iter().map(|(key, values)| (key.with_rp(ReturnPeriod::Annual), values)));

    add_all_hazards_sum(&mut losses);
    add_income_national_mean(&mut losses);

    log::info!("Computed {} loss rows", losses.len());
    Ok(losses)
}

/// Quintile reference info: `y = k · avg_prod_k` with consumption and shares
///
/// Every quintile gets a row; `y` is empty when capital or productivity is unknown.
pub fn quintile_info(cat_info: &CategoryTable, macro_info: &MacroTable) -> Vec<QuintileInfo> {
    let rows: Vec<QuintileInfo> = cat_info
        .iter()
        .map(|(key, info)| {
            let avg_prod_k = macro_info.get(&key.iso3).and_then(|m| m.avg_prod_k);
            QuintileInfo {
                iso3: key.iso3.clone(),
                income_cat: key.income_cat.clone(),
                y: info.k.zip(avg_prod_k).map(|(k, prod)| k * prod),
                c: info.c,
                income_share: info.income_share,
                diversified_share: info.diversified_share,
            }
        })
        .collect();

    let without_y = rows.iter().filter(|r| r.y.is_none()).count();
    if without_y > 0 {
        log::warn!("{} quintiles have no capital or productivity data; y left empty", without_y);
    }
    rows
}

pub fn loss_rows(losses: &BTreeMap<EventKey, Vec<f64>>) -> impl Iterator<Item = LossRow> + '_ {
    losses.iter().map(|(key, values)| LossRow {
        iso3: key.iso3.clone(),
        hazard: key.hazard.clone(),
        rp: key.rp,
        income_cat: key.income_cat.clone(),
        di: values[0],
        dy: values[1],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::{load_household_impacts_from_reader, CategoryInfo, MacroInfo};
    use crate::keys::CountryQuintile;
    use approx::assert_relative_eq;

    const IAH: &str = "\
iso3,hazard,rp,income_cat,affected_cat,helped_cat,n,dc_short_term,dk_reco,dS_reco_PDS,dk,lambda_h
AAA,Flood,10,q1,a,helped,0.5,30.0,10.0,5.0,100.0,0.0
AAA,Flood,10,q1,na,helped,0.5,0.0,0.0,0.0,0.0,0.5
AAA,Flood,10,q2,a,helped,1.0,10.0,0.0,0.0,0.0,0.5
AAA,Wind,10,q1,a,helped,1.0,20.0,0.0,0.0,0.0,0.5
";

    fn macro_table() -> MacroTable {
        let mut table = MacroTable::new();
        table.insert(Iso3::new("AAA"), MacroInfo { pop: Some(1000.0), avg_prod_k: Some(0.2) });
        table
    }

    fn key(hazard: Hazard, rp: ReturnPeriod, q: IncomeCat) -> EventKey {
        EventKey::new(Iso3::new("AAA"), hazard, rp, q)
    }

    #[test]
    fn test_recovery_output_factor_limit() {
        assert_eq!(recovery_output_factor(0.0, 50.0), 50.0);
        assert_relative_eq!(recovery_output_factor(1e-9, 50.0), 50.0, epsilon = 1e-5);
        assert_relative_eq!(recovery_output_factor(0.5, 50.0), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_compute_losses_builds_all_row_kinds() {
        let records = load_household_impacts_from_reader(IAH.as_bytes()).unwrap();
        let constants = Constants::default();
        let losses = compute_losses(&records, &macro_table(), &ProtectionTable::new(), &constants).unwrap();

        let flood = Hazard::named("Flood");
        let q1 = IncomeCat::quintile("q1");

        // di: 0.5 * (30 - 10 + 5) = 12.5; dy: 0.5 * 100 * 50 * 0.2 = 500
        let event = &losses[&key(flood.clone(), ReturnPeriod::Years(10), q1.clone())];
        assert_relative_eq!(event[0], 12.5, epsilon = 1e-12);
        assert_relative_eq!(event[1], 500.0, epsilon = 1e-9);

        // Anchored at rp 2: (0.5 - 0.1) * 12.5 / 2 + 0.1 * 12.5 = 3.75
        let aal = &losses[&key(flood.clone(), ReturnPeriod::Annual, q1.clone())];
        assert_relative_eq!(aal[0], 3.75, epsilon = 1e-12);

        let all = &losses[&key(Hazard::AllHazards, ReturnPeriod::Years(10), q1)];
        assert_relative_eq!(all[0], 32.5, epsilon = 1e-12);

        // Mean of q1 (12.5) and q2 (10.0)
        let national = &losses[&key(flood, ReturnPeriod::Years(10), IncomeCat::National)];
        assert_relative_eq!(national[0], 11.25, epsilon = 1e-12);

        let national_all = &losses[&key(Hazard::AllHazards, ReturnPeriod::Years(10), IncomeCat::National)];
        assert_relative_eq!(national_all[0], (32.5 + 10.0) / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_productivity_keeps_output_loss_nan() {
        let records = load_household_impacts_from_reader(IAH.as_bytes()).unwrap();
        let losses = compute_losses(&records, &MacroTable::new(), &ProtectionTable::new(), &Constants::default()).unwrap();

        let event = &losses[&key(Hazard::named("Flood"), ReturnPeriod::Years(10), IncomeCat::quintile("q1"))];
        assert_relative_eq!(event[0], 12.5, epsilon = 1e-12);
        assert!(event[1].is_nan());
    }

    #[test]
    fn test_empty_loss_cell_is_skipped() {
        let csv = "\
iso3,hazard,rp,income_cat,affected_cat,helped_cat,n,dc_short_term,dk_reco,dS_reco_PDS,dk,lambda_h
AAA,Flood,10,q1,a,helped,0.5,30.0,10.0,5.0,100.0,0.0
AAA,Flood,10,q1,na,helped,0.5,,0.0,0.0,0.0,0.5
";
        let records = load_household_impacts_from_reader(csv.as_bytes()).unwrap();
        let losses = compute_losses(&records, &macro_table(), &ProtectionTable::new(), &Constants::default()).unwrap();

        let event = &losses[&key(Hazard::named("Flood"), ReturnPeriod::Years(10), IncomeCat::quintile("q1"))];
        assert_relative_eq!(event[0], 12.5, epsilon = 1e-12);
        assert_relative_eq!(event[1], 500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_loss_column_fails() {
        let csv = "iso3,hazard,rp,income_cat,affected_cat,helped_cat,n,di_lab\nAAA,Flood,10,q1,a,helped,1.0,5.0\n";
        let records = load_household_impacts_from_reader(csv.as_bytes()).unwrap();
        let result = compute_losses(&records, &macro_table(), &ProtectionTable::new(), &Constants::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_quintile_info() {
        let mut cat_info = CategoryTable::new();
        cat_info.insert(
            CountryQuintile {
                iso3: Iso3::new("AAA"),
                income_cat: IncomeCat::quintile("q1"),
            },
            CategoryInfo {
                k: Some(3000.0),
                c: Some(900.0),
                income_share: Some(0.05),
                diversified_share: Some(0.3),
            },
        );
        cat_info.insert(
            CountryQuintile {
                iso3: Iso3::new("BBB"),
                income_cat: IncomeCat::quintile("q1"),
            },
            CategoryInfo {
                k: Some(1.0),
                c: Some(1.0),
                income_share: None,
                diversified_share: Some(0.0),
            },
        );

        let rows = quintile_info(&cat_info, &macro_table());
        assert_eq!(rows.len(), 2);
        assert_relative_eq!(rows[0].y.unwrap(), 600.0, epsilon = 1e-9);
        assert_eq!(rows[0].c, Some(900.0));

        // BBB is absent from macro: the row stays, without y
        assert_eq!(rows[1].iso3, Iso3::new("BBB"));
        assert_eq!(rows[1].y, None);
        assert_eq!(rows[1].c, Some(1.0));
    }
}

//! Job Equivalent Loss
//!
//! The JEL of a quintile is the number of jobs whose labor income equals the
//! quintile's expected annual labor-income loss:
//!
//! ```text
//! JEL_{q,i} = EPR_i · (Δl_{q,i} / l_{q,i}) · N_{q,i}
//! ```
//!
//! where `l = c · (1 − diversified_share)` is baseline labor income per
//! capita and `N_q` the quintile population. The time-adjusted variant scales
//! by average weekly hours relative to a full-time week.

use crate::aggregation::{add_all_hazards_sum, add_income_total_sum};
use crate::config::Constants;
use crate::inputs::{CategoryTable, CountrySeries, MacroTable};
use crate::keys::{AnnualKey, CountryQuintile, Hazard, IncomeCat, Iso3, JelKey};
use serde::Serialize;
use std::collections::BTreeMap;

/// Inputs of the JEL formula for one (iso3, income_cat, hazard)
#[derive(Debug, Clone, PartialEq)]
pub struct JelParams {
    /// Employment-to-population ratio
    pub epr: f64,
    /// Quintile population
    pub n_q: f64,
    /// Baseline labor income per capita
    pub l: f64,
    /// Expected annual labor income loss per capita
    pub di_lab: f64,
}

impl JelParams {
    pub fn jel(&self) -> f64 {
        self.epr * self.di_lab / self.l * self.n_q
    }
}

/// JEL with its population- and time-adjusted variants
#[derive(Debug, Clone, PartialEq)]
pub struct JelIndicators {
    pub jel: f64,
    pub jel_adj: Option<f64>,
    pub jel_pop_rel: Option<f64>,
    pub jel_adj_pop_rel: Option<f64>,
}

/// `JEL_params.csv` row
#[derive(Debug, Serialize)]
pub struct JelParamsRow {
    pub iso3: Iso3,
    pub income_cat: IncomeCat,
    pub hazard: Hazard,
    #[serde(rename = "EPR")]
    pub epr: f64,
    #[serde(rename = "N_q")]
    pub n_q: f64,
    pub l: f64,
    pub di_lab: f64,
}

/// `JEL.csv` row
#[derive(Debug, Serialize)]
pub struct JelRow {
    pub iso3: Iso3,
    pub income_cat: IncomeCat,
    pub hazard: Hazard,
    #[serde(rename = "JEL")]
    pub jel: f64,
    #[serde(rename = "JEL_adj")]
    pub jel_adj: Option<f64>,
    #[serde(rename = "JEL_pop_rel")]
    pub jel_pop_rel: Option<f64>,
    #[serde(rename = "JEL_adj_pop_rel")]
    pub jel_adj_pop_rel: Option<f64>,
}

/// Baseline labor income per capita: `l = c · (1 − diversified_share)`
///
/// Quintiles missing either input are left out.
pub fn baseline_labor_income(cat_info: &CategoryTable) -> BTreeMap<CountryQuintile, f64> {
    cat_info
        .iter()
        .filter_map(|(key, info)| {
            let (c, diversified) = info.c.zip(info.diversified_share)?;
            Some((key.clone(), c * (1.0 - diversified)))
        })
        .collect()
}

/// Population per quintile: `N_q = pop · quintile_share`
pub fn quintile_population(macro_info: &MacroTable, quintile_share: f64) -> BTreeMap<Iso3, f64> {
    macro_info
        .iter()
        .filter_map(|(iso3, info)| info.pop.map(|pop| (iso3.clone(), pop * quintile_share)))
        .collect()
}

/// Join the formula inputs, keeping only rows where all four are known
pub fn build_jel_params(
    epr: &CountrySeries,
    n_q: &BTreeMap<Iso3, f64>,
    l: &BTreeMap<CountryQuintile, f64>,
    aal_di_lab: &BTreeMap<AnnualKey, f64>,
) -> BTreeMap<JelKey, JelParams> {
    let mut params = BTreeMap::new();
    let mut dropped = 0usize;

    for (key, &di_lab) in aal_di_lab {
        match join_params(key, di_lab, epr, n_q, l) {
            Some(p) if ![p.epr, p.n_q, p.l, p.di_lab].iter().any(|v| v.is_nan()) => {
                params.insert(JelKey::from(key), p);
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        log::info!("Dropped {} JEL rows with incomplete reference data", dropped);
    }
    params
}

fn join_params(
    key: &AnnualKey,
    di_lab: f64,
    epr: &CountrySeries,
    n_q: &BTreeMap<Iso3, f64>,
    l: &BTreeMap<CountryQuintile, f64>,
) -> Option<JelParams> {
    let epr = (*epr.get(&key.iso3)?)?;
    let n_q = *n_q.get(&key.iso3)?;
    let l = *l.get(&key.country_quintile())?;
    Some(JelParams { epr, n_q, l, di_lab })
}

/// JEL per (iso3, income_cat, hazard) with all-hazards and quintile-total roll-ups
pub fn compute_jel(params: &BTreeMap<JelKey, JelParams>) -> BTreeMap<JelKey, f64> {
    let mut jel: BTreeMap<JelKey, f64> = params.iter().map(|(k, p)| (k.clone(), p.jel())).collect();

    let non_finite = jel.values().filter(|v| !v.is_finite()).count();
    if non_finite > 0 {
        log::warn!("{} JEL values are not finite (zero baseline labor income?)", non_finite);
    }

    add_all_hazards_sum(&mut jel);
    add_income_total_sum(&mut jel);
    jel
}

/// Time- and population-adjusted indicators
///
/// `h_week = annual_work_hrs / weeks_per_year`, `JEL_adj = JEL · h_week / full_time_hours`.
/// Countries without work hours or population get empty adjusted cells.
pub fn adjust_for_time(
    jel: &BTreeMap<JelKey, f64>,
    work_hours: &CountrySeries,
    macro_info: &MacroTable,
    constants: &Constants,
) -> BTreeMap<JelKey, JelIndicators> {
    jel.iter()
        .map(|(key, &value)| {
            let h_week = work_hours
                .get(&key.iso3)
                .copied()
                .flatten()
                .map(|hours| hours / constants.weeks_per_year);
            let pop = macro_info.get(&key.iso3).and_then(|m| m.pop);

            let jel_adj = h_week.map(|h| value * h / constants.full_time_hours);
            let indicators = JelIndicators {
                jel: value,
                jel_adj,
                jel_pop_rel: pop.map(|p| value / p),
                jel_adj_pop_rel: jel_adj.zip(pop).map(|(adj, p)| adj / p),
            };
            (key.clone(), indicators)
        })
        .collect()
}

pub fn params_rows(params: &BTreeMap<JelKey, JelParams>) -> impl Iterator<Item = JelParamsRow> + '_ {
    params.iter().map(|(key, p)| JelParamsRow {
        iso3: key.iso3.clone(),
        income_cat: key.income_cat.clone(),
        hazard: key.hazard.clone(),
        epr: p.epr,
        n_q: p.n_q,
        l: p.l,
        di_lab: p.di_lab,
    })
}

pub fn result_rows(results: &BTreeMap<JelKey, JelIndicators>) -> impl Iterator<Item = JelRow> + '_ {
    results.iter().map(|(key, r)| JelRow {
        iso3: key.iso3.clone(),
        income_cat: key.income_cat.clone(),
        hazard: key.hazard.clone(),
        jel: r.jel,
        jel_adj: r.jel_adj,
        jel_pop_rel: r.jel_pop_rel,
        jel_adj_pop_rel: r.jel_adj_pop_rel,
    })
}

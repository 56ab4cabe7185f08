//! Optional choropleth maps of country-level adjusted JEL

mod choropleth;
mod geo;

pub use choropleth::{ramp_color, render_choropleth, LogNorm, MapStyle};
pub use geo::{load_boundaries, parse_boundaries, CountryShape};

use crate::error::Result;
use crate::indicators::JelIndicators;
use crate::keys::{Hazard, IncomeCat, JelKey};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Country-level values to map: adjusted JEL and adjusted JEL as % of population
#[derive(Debug, Clone, Default)]
pub struct CountryTotals {
    pub jel_adj: BTreeMap<String, f64>,
    pub jel_adj_pop_pct: BTreeMap<String, f64>,
}

/// One row per country from the (`total`, `all_hazards`) JEL rows
pub fn country_totals(results: &BTreeMap<JelKey, JelIndicators>) -> CountryTotals {
    let mut totals = CountryTotals::default();
    for (key, r) in results {
        if key.income_cat != IncomeCat::Total || key.hazard != Hazard::AllHazards {
            continue;
        }
        let iso3 = key.iso3.as_str().to_string();
        if let Some(v) = r.jel_adj.filter(|v| v.is_finite()) {
            totals.jel_adj.insert(iso3.clone(), v);
        }
        if let Some(v) = r.jel_adj_pop_rel.filter(|v| v.is_finite()) {
            totals.jel_adj_pop_pct.insert(iso3, v * 100.0);
        }
    }
    totals
}

/// Render both JEL maps into `output_dir`, returning the written paths
pub fn render_jel_maps(
    boundaries: &Path,
    iso_property: &str,
    results: &BTreeMap<JelKey, JelIndicators>,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let shapes = load_boundaries(boundaries, iso_property)?;
    let totals = country_totals(results);

    let maps = [
        (
            &totals.jel_adj,
            MapStyle {
                title: "Adjusted Job Equivalent Loss (JEL) by Country - All Hazards".to_string(),
                legend: "full-time JEL (log scale)".to_string(),
                percent: false,
            },
            "jel_adj_map.svg",
        ),
        (
            &totals.jel_adj_pop_pct,
            MapStyle {
                title: "Population-Relative full-time JEL by Country - All Hazards".to_string(),
                legend: "full-time JEL, % of population (log scale)".to_string(),
                percent: true,
            },
            "jel_adj_pop_rel_map.svg",
        ),
    ];

    let mut written = Vec::new();
    for (values, style, file_name) in &maps {
        let path = output_dir.join(file_name);
        render_choropleth(&path, &shapes, values, style)?;
        println!("Map saved to {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Iso3;

    fn indicators(jel_adj: Option<f64>, rel: Option<f64>) -> JelIndicators {
        JelIndicators {
            jel: 1.0,
            jel_adj,
            jel_pop_rel: None,
            jel_adj_pop_rel: rel,
        }
    }

    #[test]
    fn test_country_totals_only_uses_national_all_hazards_rows() {
        let mut results = BTreeMap::new();
        results.insert(
            JelKey::new(Iso3::new("AAA"), IncomeCat::Total, Hazard::AllHazards),
            indicators(Some(500.0), Some(0.002)),
        );
        results.insert(
            JelKey::new(Iso3::new("AAA"), IncomeCat::quintile("q1"), Hazard::AllHazards),
            indicators(Some(100.0), Some(0.001)),
        );
        results.insert(
            JelKey::new(Iso3::new("BBB"), IncomeCat::Total, Hazard::AllHazards),
            indicators(None, None),
        );

        let totals = country_totals(&results);
        assert_eq!(totals.jel_adj.len(), 1);
        assert_eq!(totals.jel_adj["AAA"], 500.0);
        assert!((totals.jel_adj_pop_pct["AAA"] - 0.2).abs() < 1e-12);
    }
}

//! End-to-end pipelines
//!
//! Each pipeline loads its inputs once, runs the aggregation steps in order
//! and writes its tables into the output directory.

use crate::aggregation::{average_over_rp, weighted_by_population};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::export::{archive_directory, copy_into, dated_archive_path, write_json, write_rows};
use crate::indicators::{jel, losses};
use crate::inputs::{ModelInputs, ReferenceData};
use crate::upstream::ensure_model_data;
use crate::visualize::render_jel_maps;
use chrono::Local;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

/// What a pipeline run produced, written as `run_summary_<pipeline>.json`
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub pipeline: &'static str,
    pub started_at: String,
    pub elapsed_ms: u64,
    pub household_records: usize,
    /// Output file name -> data rows written
    pub tables: BTreeMap<String, usize>,
    pub maps: Vec<PathBuf>,
    pub archive: Option<PathBuf>,
}

impl RunSummary {
    fn new(pipeline: &'static str) -> Self {
        Self {
            pipeline,
            started_at: Local::now().to_rfc3339(),
            elapsed_ms: 0,
            household_records: 0,
            tables: BTreeMap::new(),
            maps: Vec::new(),
            archive: None,
        }
    }

    fn finish(mut self, config: &PipelineConfig, start: Instant) -> Result<Self> {
        self.elapsed_ms = start.elapsed().as_millis() as u64;
        let path = config.output_path(&format!("run_summary_{}.json", self.pipeline));
        write_json(&path, &self)?;
        Ok(self)
    }
}

/// Job Equivalent Loss: `JEL.csv`, `JEL_params.csv` and optional maps
pub fn run_jel(config: &PipelineConfig) -> Result<RunSummary> {
    let start = Instant::now();
    let mut summary = RunSummary::new("jel");
    let constants = &config.constants;

    ensure_model_data(config)?;
    let inputs = ModelInputs::load(config)?;
    let reference = ReferenceData::load(config)?;
    summary.household_records = inputs.household_impacts.len();

    log::info!("Averaging labor income loss over sub-groups and return periods");
    let di_lab = weighted_by_population(&inputs.household_impacts, |r| {
        Ok(vec![r.require("di_lab", r.di_lab)?])
    })?;
    let aal: BTreeMap<_, f64> = average_over_rp(&di_lab, &inputs.hazard_protection, constants.zero_rp)
        .into_iter()
        .map(|(key, values)| (key, values[0]))
        .collect();

    let l = jel::baseline_labor_income(&inputs.category_info);
    let n_q = jel::quintile_population(&inputs.macro_info, constants.quintile_share);
    let params = jel::build_jel_params(&reference.employment_ratio, &n_q, &l, &aal);

    let values = jel::compute_jel(&params);
    let results = jel::adjust_for_time(&values, &reference.work_hours, &inputs.macro_info, constants);

    let results_rows = write_rows(&config.output_path("JEL.csv"), jel::result_rows(&results))?;
    let params_rows = write_rows(&config.output_path("JEL_params.csv"), jel::params_rows(&params))?;
    println!("JEL parameters saved to {} ({} rows)", config.output_path("JEL_params.csv").display(), params_rows);
    println!("JEL results saved to {} ({} rows)", config.output_path("JEL.csv").display(), results_rows);
    summary.tables.insert("JEL.csv".to_string(), results_rows);
    summary.tables.insert("JEL_params.csv".to_string(), params_rows);

    if let Some(boundaries) = &config.boundaries {
        match render_jel_maps(boundaries, &config.iso_property, &results, &config.output_dir) {
            Ok(paths) => summary.maps = paths,
            Err(e) => log::warn!("Skipping JEL maps: {}", e),
        }
    }

    summary.finish(config, start)
}

/// Income/output losses: `output_losses.csv`, `quintile_info.csv`,
/// `macro_results.csv` and the dated archive of the output directory
pub fn run_losses(config: &PipelineConfig) -> Result<RunSummary> {
    let start = Instant::now();
    let mut summary = RunSummary::new("losses");

    ensure_model_data(config)?;
    let inputs = ModelInputs::load(config)?;
    summary.household_records = inputs.household_impacts.len();

    let table = losses::compute_losses(
        &inputs.household_impacts,
        &inputs.macro_info,
        &inputs.hazard_protection,
        &config.constants,
    )?;
    let quintiles = losses::quintile_info(&inputs.category_info, &inputs.macro_info);

    let loss_rows = write_rows(&config.output_path("output_losses.csv"), losses::loss_rows(&table))?;
    let quintile_rows = write_rows(&config.output_path("quintile_info.csv"), &quintiles)?;
    copy_into(&config.macro_results_path(), &config.output_path("macro_results.csv"))?;
    println!("Losses saved to {} ({} rows)", config.output_path("output_losses.csv").display(), loss_rows);
    summary.tables.insert("output_losses.csv".to_string(), loss_rows);
    summary.tables.insert("quintile_info.csv".to_string(), quintile_rows);

    let summary = summary.finish(config, start)?;
    if config.archive {
        let archive = dated_archive_path(&config.output_dir, Local::now().date_naive());
        archive_directory(&config.output_dir, &archive)?;
        println!("Output archived to {}", archive.display());
        return Ok(RunSummary {
            archive: Some(archive),
            ..summary
        });
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const IAH: &str = "\
iso3,hazard,rp,income_cat,affected_cat,helped_cat,n,di_lab,dc_short_term,dk_reco,dS_reco_PDS,dk,lambda_h
AAA,Flood,10,q1,a,helped,1.0,5.0,5.0,0.0,0.0,10.0,0.5
AAA,Flood,10,q2,a,helped,1.0,10.0,10.0,0.0,0.0,10.0,0.5
AAA,Flood,100,q1,a,helped,1.0,50.0,50.0,0.0,0.0,100.0,0.5
AAA,Flood,100,q2,a,helped,1.0,100.0,100.0,0.0,0.0,100.0,0.5
BBB,Flood,10,q1,a,helped,1.0,5.0,5.0,0.0,0.0,10.0,0.5
";

    fn write(path: &Path, body: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn fixture() -> (TempDir, PipelineConfig) {
        let tmp = TempDir::new().unwrap();
        let config = PipelineConfig::rooted_at(tmp.path());

        write(&config.household_impacts_path(), IAH);
        write(&config.macro_results_path(), "iso3,risk\nAAA,0.1\n");
        write(
            &config.category_info_path(),
            "iso3,income_cat,k,c,income_share,diversified_share\n\
             AAA,q1,3000,1000,0.3,0.5\n\
             AAA,q2,6000,2000,0.7,0.5\n\
             BBB,q1,3000,1000,1.0,0.5\n",
        );
        write(&config.hazard_protection_path(), "iso3,hazard,protection\nAAA,Flood,5\n");
        write(&config.macro_path(), "iso3,pop,avg_prod_k\nAAA,1000000,0.2\nBBB,500,0.2\n");
        write(&config.work_hours_path(), "iso3,annual_work_hrs\nAAA,1880\nNA,1000\n");
        write(&config.employment_ratio_path(), "iso3,EPR\nAAA,0.5\n");
        (tmp, config)
    }

    #[test]
    fn test_jel_pipeline_end_to_end() {
        let (_tmp, config) = fixture();
        let summary = run_jel(&config).unwrap();

        // BBB has no employment ratio and drops out of the parameters
        assert_eq!(summary.tables["JEL_params.csv"], 2);
        // 2 quintile rows + 2 all_hazards + 2 totals
        assert_eq!(summary.tables["JEL.csv"], 6);

        let text = fs::read_to_string(config.output_path("JEL.csv")).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("iso3,income_cat,hazard,JEL,JEL_adj,JEL_pop_rel,JEL_adj_pop_rel"));
        assert!(text.contains("AAA,total,all_hazards,"));

        // di_lab AAL for q1: (0.5 - 0.1) * 5 / 2 + (0.1 - 0.01) * (5 + 50) / 2 + 0.01 * 50
        let mut reader = csv::Reader::from_path(config.output_path("JEL_params.csv")).unwrap();
        let first = reader.records().next().unwrap().unwrap();
        assert_eq!(&first[0], "AAA");
        assert_eq!(&first[1], "q1");
        assert_relative_eq!(first[6].parse::<f64>().unwrap(), 3.975, epsilon = 1e-9);

        assert!(config.output_path("run_summary_jel.json").exists());
        assert!(summary.maps.is_empty());
    }

    #[test]
    fn test_losses_pipeline_writes_and_archives() {
        let (_tmp, config) = fixture();
        let summary = run_losses(&config).unwrap();

        assert!(config.output_path("macro_results.csv").exists());
        assert_eq!(summary.tables["quintile_info.csv"], 3);
        let archive = summary.archive.unwrap();
        assert!(archive.exists());

        let text = fs::read_to_string(config.output_path("output_losses.csv")).unwrap();
        assert!(text.starts_with("iso3,hazard,rp,income_cat,di,dy\n"));
        assert!(text.contains("AAA,Flood,AAL,q1,"));
        assert!(text.contains("AAA,all_hazards,AAL,tot,"));
    }

    #[test]
    fn test_empty_loss_cell_counts_as_zero_contribution() {
        let (_tmp, config) = fixture();
        let iah = format!("{}AAA,Flood,10,q1,na,helped,1.0,,5.0,0.0,0.0,10.0,0.5\n", IAH);
        write(&config.household_impacts_path(), &iah);

        run_jel(&config).unwrap();

        // rp 10 for q1 is now (1.0 * 5 + nothing) / 2.0 = 2.5
        // (0.5 - 0.1) * 2.5 / 2 + (0.1 - 0.01) * (2.5 + 50) / 2 + 0.01 * 50
        let mut reader = csv::Reader::from_path(config.output_path("JEL_params.csv")).unwrap();
        let first = reader.records().next().unwrap().unwrap();
        assert_eq!(&first[1], "q1");
        assert_relative_eq!(first[6].parse::<f64>().unwrap(), 3.3625, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_category_values_do_not_fail() {
        let (_tmp, config) = fixture();
        write(
            &config.category_info_path(),
            "iso3,income_cat,k,c,income_share,diversified_share\n\
             AAA,q1,3000,1000,0.3,0.5\n\
             AAA,q2,6000,NA,0.7,0.5\n\
             BBB,q1,NA,NA,NA,NA\n",
        );

        let jel = run_jel(&config).unwrap();
        // AAA q2 has no consumption and drops out of the parameters
        assert_eq!(jel.tables["JEL_params.csv"], 1);

        let losses = run_losses(&config).unwrap();
        assert_eq!(losses.tables["quintile_info.csv"], 3);
    }

    #[test]
    fn test_unreadable_boundaries_skip_maps() {
        let (tmp, mut config) = fixture();
        config.boundaries = Some(tmp.path().join("missing.geojson"));

        let summary = run_jel(&config).unwrap();
        assert!(summary.maps.is_empty());
        assert!(config.output_path("JEL.csv").exists());
    }

    #[test]
    fn test_jel_maps_are_rendered() {
        let (tmp, mut config) = fixture();
        let boundaries = tmp.path().join("countries.geojson");
        write(
            &boundaries,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"ISO_A3_EH": "AAA"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[10,0],[10,10],[0,0]]]}},
                {"type": "Feature", "properties": {"ISO_A3_EH": "BBB"},
                 "geometry": {"type": "Polygon", "coordinates": [[[20,0],[30,0],[30,10],[20,0]]]}}
            ]}"#,
        );
        config.boundaries = Some(boundaries);

        let summary = run_jel(&config).unwrap();
        assert_eq!(summary.maps.len(), 2);
        assert!(config.output_path("jel_adj_map.svg").exists());
        assert!(config.output_path("jel_adj_pop_rel_map.svg").exists());
    }

    #[test]
    fn test_missing_input_file_fails() {
        let (_tmp, config) = fixture();
        fs::remove_file(config.work_hours_path()).unwrap();
        let err = run_jel(&config).unwrap_err();
        assert!(err.to_string().contains("work_hours.csv"));
    }
}

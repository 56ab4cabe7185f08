//! Resilience Indicators CLI
//!
//! Runs the JEL and/or loss pipelines over the outputs of the resilience model.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use resilience_indicators::{run_jel, run_losses, Constants, PipelineConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "resilience-indicators")]
#[command(about = "Job Equivalent Loss and income/output loss indicators", long_about = None)]
struct Cli {
    #[command(flatten)]
    paths: PathArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct PathArgs {
    /// Directory with the model's simulation_outputs/ and model_inputs/
    #[arg(long, value_name = "DIR", env = "RESILIENCE_MODEL_DATA", default_value = "data/model_data")]
    model_data: PathBuf,

    /// Directory with work_hours.csv and employment_pop_ratio.csv
    #[arg(long, value_name = "DIR", env = "RESILIENCE_REFERENCE_DATA", default_value = "data")]
    reference_data: PathBuf,

    /// Output directory
    #[arg(short, long, value_name = "DIR", env = "RESILIENCE_OUTPUT", default_value = "output")]
    output: PathBuf,

    /// Command that runs the upstream model when model data is missing (split on whitespace)
    #[arg(long, env = "RESILIENCE_MODEL_CMD")]
    model_command: Option<String>,

    /// Argument appended to the model command as-is; repeat for several
    #[arg(long = "model-arg", value_name = "ARG")]
    model_args: Vec<String>,

    /// Zero-loss anchor return period (0 disables the anchor)
    #[arg(long, default_value_t = 2)]
    zero_rp: u32,
}

#[derive(Subcommand)]
enum Command {
    /// Job Equivalent Loss tables and maps
    Jel(JelArgs),
    /// Income/output loss tables and the dated archive
    Losses(LossArgs),
    /// Both pipelines
    All {
        #[command(flatten)]
        jel: JelArgs,
        #[command(flatten)]
        losses: LossArgs,
    },
}

#[derive(Args, Clone)]
struct JelArgs {
    /// GeoJSON country boundaries; maps are skipped without it
    #[arg(long, value_name = "FILE", env = "RESILIENCE_BOUNDARIES")]
    boundaries: Option<PathBuf>,

    /// Feature property holding the ISO-3 code
    #[arg(long, default_value = "ISO_A3_EH")]
    iso_property: String,
}

#[derive(Args, Clone)]
struct LossArgs {
    /// Do not zip the output directory
    #[arg(long, default_value_t = false)]
    no_archive: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let base = PipelineConfig {
        model_data_dir: cli.paths.model_data.clone(),
        reference_data_dir: cli.paths.reference_data.clone(),
        output_dir: cli.paths.output.clone(),
        model_command: cli.paths.model_command.clone(),
        model_args: cli.paths.model_args.clone(),
        constants: Constants {
            zero_rp: (cli.paths.zero_rp > 0).then_some(cli.paths.zero_rp),
            ..Constants::default()
        },
        ..PipelineConfig::default()
    };

    match cli.command {
        Command::Jel(args) => jel(&base, args)?,
        Command::Losses(args) => losses(&base, args)?,
        Command::All { jel: jel_args, losses: loss_args } => {
            jel(&base, jel_args)?;
            losses(&base, loss_args)?;
        }
    }
    Ok(())
}

fn jel(base: &PipelineConfig, args: JelArgs) -> Result<()> {
    let config = PipelineConfig {
        boundaries: args.boundaries,
        iso_property: args.iso_property,
        ..base.clone()
    };
    let summary = run_jel(&config).context("JEL pipeline failed")?;
    log::info!("JEL pipeline finished in {} ms", summary.elapsed_ms);
    Ok(())
}

fn losses(base: &PipelineConfig, args: LossArgs) -> Result<()> {
    let config = PipelineConfig {
        archive: !args.no_archive,
        ..base.clone()
    };
    let summary = run_losses(&config).context("loss pipeline failed")?;
    log::info!("Loss pipeline finished in {} ms", summary.elapsed_ms);
    Ok(())
}

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use cysto_lib::{
    io::{csv::LoadOptions, export::ExportedFiles},
    metrics::contraction::PeakRow,
    AnalysisConfig, AnalysisResult, Session,
};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "cysto",
    version,
    about = "Cystometry analysis: contractions, pressure thresholds and bladder volume"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a delimited pressure recording and print a JSON summary
    Analyze {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = 0)]
        time_col: usize,
        #[arg(long, default_value_t = 1)]
        pressure_col: usize,
        #[arg(long, default_value_t = 0)]
        skip_rows: usize,
        #[arg(long, default_value_t = ',')]
        delimiter: char,
        /// TOML file with analysis parameters; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        overrides: ConfigOverrides,
        /// Directory to write CSV results into
        #[arg(long)]
        export: Option<PathBuf>,
        #[arg(long, default_value = "")]
        prefix: String,
    },
    /// Print the default analysis parameters as TOML
    Config,
}

#[derive(Args)]
struct ConfigOverrides {
    #[arg(long)]
    moving_avg_window: Option<usize>,
    #[arg(long)]
    sensitivity: Option<f64>,
    #[arg(long)]
    percentile: Option<f64>,
    #[arg(long)]
    volume_empty_percent: Option<f64>,
    /// Infusion rate in mL/min
    #[arg(long)]
    flow_volume: Option<f64>,
}

impl ConfigOverrides {
    fn apply(&self, mut cfg: AnalysisConfig) -> AnalysisConfig {
        if let Some(window) = self.moving_avg_window {
            cfg.moving_avg_window = window;
        }
        if let Some(sensitivity) = self.sensitivity {
            cfg.peak_finding_sensitivity = sensitivity;
        }
        if let Some(percentile) = self.percentile {
            cfg.pressure_threshold_percentile = percentile;
        }
        if let Some(percent) = self.volume_empty_percent {
            cfg.volume_empty_percent = percent;
        }
        if let Some(flow) = self.flow_volume {
            cfg.flow_volume = flow;
        }
        cfg
    }
}

#[derive(Serialize)]
struct AnalyzeSummary<'a> {
    samples: usize,
    dt: Option<f64>,
    config: AnalysisConfig,
    peaks: &'a [usize],
    peak_times: Vec<f64>,
    baselines: &'a [usize],
    pressure_thresholds: Vec<usize>,
    volume_empty: &'a [usize],
    max_volume: f64,
    final_volume: f64,
    contractions: Vec<PeakRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exported: Option<ExportedFiles>,
}

impl<'a> AnalyzeSummary<'a> {
    fn new(result: &'a AnalysisResult, exported: Option<ExportedFiles>) -> Self {
        Self {
            samples: result.values.len(),
            dt: result.dt(),
            config: result.config,
            peaks: result.peaks(),
            peak_times: result.peak_times(),
            baselines: result.baselines(),
            pressure_thresholds: result.pressure_threshold_indices(),
            volume_empty: &result.volume_empty,
            max_volume: result.volume.iter().copied().fold(0.0, f64::max),
            final_volume: result.volume.last().copied().unwrap_or(0.0),
            contractions: result.peak_rows(),
            exported,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze {
            input,
            time_col,
            pressure_col,
            skip_rows,
            delimiter,
            config,
            overrides,
            export,
            prefix,
        } => {
            let opts = LoadOptions {
                time_col,
                pressure_col,
                skip_rows,
                delimiter: delimiter_byte(delimiter)?,
            };
            let cfg = overrides.apply(load_config(config.as_deref())?);
            cfg.validate().context("invalid analysis parameters")?;
            cmd_analyze(&input, &opts, &cfg, export.as_deref(), &prefix)?
        }
        Commands::Config => cmd_config()?,
    }
    Ok(())
}

fn delimiter_byte(delimiter: char) -> Result<u8> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| anyhow!("delimiter {delimiter:?} must be a single ASCII character"))
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("reading config {}", path.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

fn cmd_analyze(
    input: &Path,
    opts: &LoadOptions,
    cfg: &AnalysisConfig,
    export: Option<&Path>,
    prefix: &str,
) -> Result<()> {
    let mut session = Session::with_file(input);
    session
        .load(opts)
        .with_context(|| format!("loading {}", input.display()))?
        .analyze(cfg)
        .context("analysis failed")?;

    let exported = match export {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
            let files = session.export(dir, prefix)?;
            info!("wrote results to {}", dir.display());
            Some(files)
        }
        None => None,
    };

    let summary = AnalyzeSummary::new(session.result()?, exported);
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn cmd_config() -> Result<()> {
    print!("{}", toml::to_string(&AnalysisConfig::default())?);
    Ok(())
}

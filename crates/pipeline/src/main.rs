//! Emitter Identification Pipeline - Command Line Entry Point

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pipeline::{init_logging, LabelSource, LogFormat, PipelineConfig, SeiPipeline};
use serde::Serialize;
use signal_loader::synthetic::{tone_capture, ToneSpec};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "sei",
    version,
    about = "Specific emitter identification from intra-pulse captures"
)]
struct Cli {
    /// TOML configuration file (layered under SEI__* environment variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Extraction methods, comma separated (power_spectrum, vmd)
    #[arg(long, global = true, value_delimiter = ',')]
    methods: Option<Vec<String>>,
    /// Model artifact location
    #[arg(long, global = true)]
    model_path: Option<PathBuf>,
    /// Where labels come from
    #[arg(long, global = true, value_enum)]
    label_source: Option<LabelSource>,
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CaptureEncoding {
    Json,
    Binary,
}

impl CaptureEncoding {
    fn extension(self) -> &'static str {
        match self {
            CaptureEncoding::Json => "json",
            CaptureEncoding::Binary => "cap",
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write synthetic single-tone captures
    Generate {
        #[arg(long)]
        output_dir: PathBuf,
        /// File name prefix; doubles as the file-name label
        #[arg(long)]
        prefix: String,
        #[arg(long, default_value_t = 10)]
        count: usize,
        /// Tone frequency as a fraction of the sample rate
        #[arg(long, default_value_t = 0.1)]
        tone_fraction: f64,
        #[arg(long, default_value_t = 4096)]
        length: usize,
        #[arg(long, default_value_t = 0.05)]
        noise_std: f64,
        /// Integer label code stored in the capture
        #[arg(long, default_value_t = 0)]
        label_code: i64,
        #[arg(long, default_value_t = 500)]
        rate_code_mhz: i64,
        #[arg(long)]
        complex: bool,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, value_enum, default_value_t = CaptureEncoding::Binary)]
        encoding: CaptureEncoding,
    },
    /// Load captures and print their features
    Inspect { paths: Vec<PathBuf> },
    /// Train a model on labeled captures
    Train { paths: Vec<PathBuf> },
    /// Predict captures with the saved model
    Predict { paths: Vec<PathBuf> },
    /// Score the saved model on labeled captures
    Evaluate { paths: Vec<PathBuf> },
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config =
        PipelineConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(methods) = &cli.methods {
        config.methods = methods.clone();
    }
    if let Some(model_path) = &cli.model_path {
        config.model_path = model_path.clone();
    }
    if let Some(label_source) = cli.label_source {
        config.label_source = label_source;
    }
    if let Some(log_format) = cli.log_format {
        config.log_format = log_format;
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format)
        .map_err(|e| anyhow::anyhow!("initializing logging: {e}"))?;

    info!("=== SEI pipeline v{} ===", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Generate {
            output_dir,
            prefix,
            count,
            tone_fraction,
            length,
            noise_std,
            label_code,
            rate_code_mhz,
            complex,
            seed,
            encoding,
        } => {
            let spec = ToneSpec {
                length,
                tone_fraction,
                noise_std,
                label_code,
                rate_code_mhz,
                complex,
                ..Default::default()
            };
            let written = run_generate(&output_dir, &prefix, count, spec, seed, encoding)?;
            print_json(&written)
        }
        Commands::Inspect { paths } => {
            let pipeline = SeiPipeline::new(config)?;
            let summaries = paths
                .iter()
                .map(|path| {
                    pipeline
                        .inspect(path)
                        .with_context(|| format!("inspecting {}", path.display()))
                })
                .collect::<Result<Vec<_>>>()?;
            print_json(&summaries)
        }
        Commands::Train { paths } => {
            let report = SeiPipeline::new(config)?.train_from_paths(&paths)?;
            print_json(&report)
        }
        Commands::Predict { paths } => {
            let report = SeiPipeline::new(config)?.predict_paths(&paths)?;
            print_json(&report)
        }
        Commands::Evaluate { paths } => {
            let report = SeiPipeline::new(config)?.evaluate_paths(&paths)?;
            print_json(&report)
        }
    }
}

fn run_generate(
    output_dir: &Path,
    prefix: &str,
    count: usize,
    spec: ToneSpec,
    seed: u64,
    encoding: CaptureEncoding,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(count);
    for i in 0..count {
        // Vary noise and starting phase between captures
        let spec = ToneSpec {
            seed: seed.wrapping_add(i as u64),
            phase: i as f64 * 0.7,
            ..spec.clone()
        };
        let path = output_dir.join(format!("{}_{:04}.{}", prefix, i, encoding.extension()));
        tone_capture(&spec)
            .write(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        written.push(path);
    }
    info!("Wrote {} captures to {}", written.len(), output_dir.display());
    Ok(written)
}

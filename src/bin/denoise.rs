//! Gamma-spectra denoiser.
//!
//! Applies a trained checkpoint to a dataset, reporting PSNR before and
//! after denoising, and optionally writes a dataset-shaped artifact with
//! the noisy spectra replaced by denoised ones.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;

use gamma_denoise::backend::{backend_name, default_device, DefaultBackend};
use gamma_denoise::dataset::{load_spectra, save_spectra};
use gamma_denoise::inference::{run_denoise, DenoiseOptions};
use gamma_denoise::utils::logging::{init_logging, LogConfig};

/// Gamma-Spectra Denoiser
#[derive(Parser, Debug)]
#[command(name = "denoise")]
#[command(about = "Denoise gamma-ray energy spectra with a trained model")]
struct Args {
    /// Detector type to denoise {HPGe, NaI, CZT}
    #[arg(long, default_value = "HPGe")]
    det_type: String,

    /// Dataset file with spectra to denoise
    #[arg(long, default_value = "data/training.json")]
    test_set: PathBuf,

    /// Denoise all examples instead of the stored validation subset
    #[arg(long, default_value_t = false)]
    all: bool,

    /// Batch size for denoising
    #[arg(long, default_value_t = 64)]
    batch_size: usize,

    /// Random seed; defaults to the seed stored in the checkpoint
    #[arg(long)]
    seed: Option<u64>,

    /// Checkpoint base path (weights + metadata pair)
    #[arg(long, default_value = "models/best_model")]
    model: PathBuf,

    /// Output dataset file for denoised spectra (requires --all)
    #[arg(long)]
    outfile: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let start = Instant::now();
    let args = Args::parse();

    let log_config = if args.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    init_logging(&log_config).ok();

    if args.outfile.is_some() && !args.all {
        anyhow::bail!("--outfile requires --all: only full-dataset output is supported");
    }

    println!("{}", "Gamma-Spectra Denoiser".green().bold());
    println!("  Backend:  {}", backend_name());
    println!("  Detector: {}", args.det_type.to_uppercase());
    println!("  Model:    {}", args.model.display());

    let spectra = load_spectra(&args.test_set, &args.det_type)
        .with_context(|| format!("loading {}", args.test_set.display()))?;

    let options = DenoiseOptions {
        full_dataset: args.all,
        batch_size: args.batch_size,
        seed: args.seed,
    };

    let device = default_device();
    let report = run_denoise::<DefaultBackend>(&args.model, &spectra, &options, &device)?;

    println!();
    println!(
        "Average PSNR: {:.2}, average increase of {:.2}",
        report.avg_psnr_denoised,
        report.improvement()
    );

    if let (Some(outfile), Some(denoised)) = (args.outfile.as_ref(), report.denoised) {
        let output = spectra.with_noisy_replaced(denoised)?;
        save_spectra(&args.det_type, &output, outfile)?;
        println!("Saved denoised spectra to {}", outfile.display());
    }

    println!("Script completed in {:.2} secs", start.elapsed().as_secs_f64());

    Ok(())
}

//! Gamma-spectra denoising trainer.
//!
//! Thin CLI wrapper over the training harness: parses arguments, loads the
//! dataset, and hands everything to `training::run_training`.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use colored::Colorize;

use gamma_denoise::backend::{backend_name, TrainingBackend};
use gamma_denoise::dataset::load_spectra;
use gamma_denoise::model::{ModelConfig, ModelKind, ModelType};
use gamma_denoise::training::{run_training, TrainingConfig};
use gamma_denoise::utils::logging::{init_logging, LogConfig};

/// Gamma-Spectra Denoising Trainer
#[derive(Parser, Debug)]
#[command(name = "train")]
#[command(about = "Train a denoising model for gamma-ray energy spectra")]
struct Args {
    /// Detector type to train {HPGe, NaI, CZT}
    #[arg(long, default_value = "HPGe")]
    det_type: String,

    /// Dataset file with training spectra
    #[arg(long, default_value = "data/training.json")]
    train_set: PathBuf,

    /// Batch size for training
    #[arg(long, default_value_t = 16)]
    batch_size: usize,

    /// Maximum number of epochs
    #[arg(long, default_value_t = 1000)]
    epochs: usize,

    /// Epochs of no improvement before early stopping
    #[arg(long, default_value_t = 20)]
    patience: usize,

    /// Initial learning rate
    #[arg(long, default_value_t = 0.01)]
    lr: f64,

    /// Number of convolutional layers in the network
    #[arg(long, default_value_t = 20)]
    num_layers: usize,

    /// Filters per convolutional layer
    #[arg(long, default_value_t = 64)]
    num_filters: usize,

    /// Filter size for convolutional layers
    #[arg(long, default_value_t = 3)]
    filter_size: usize,

    /// Filter stride for convolutional layers
    #[arg(long, default_value_t = 1)]
    stride: usize,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Network variant {DnCNN, DnCNN-res}
    #[arg(long, default_value = "DnCNN")]
    model_name: String,

    /// Output convention {Gen-spectrum, Residual-spectrum}
    #[arg(long, default_value = "Gen-spectrum")]
    model_type: String,

    /// Directory for model checkpoints
    #[arg(long, default_value = "models")]
    model_dir: PathBuf,

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

    println!("{}", "Gamma-Spectra Denoising Trainer".green().bold());
    println!("  Started:  {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("  Backend:  {}", backend_name());
    println!("  Detector: {}", args.det_type.to_uppercase());

    let kind: ModelKind = args
        .model_name
        .parse()
        .with_context(|| format!("invalid --model-name {}", args.model_name))?;
    let model_type: ModelType = args
        .model_type
        .parse()
        .with_context(|| format!("invalid --model-type {}", args.model_type))?;

    let model_config = ModelConfig {
        kind,
        num_channels: 1,
        num_layers: args.num_layers,
        kernel_size: args.filter_size,
        stride: args.stride,
        num_filters: args.num_filters,
    };

    let training_config = TrainingConfig {
        epochs: args.epochs,
        batch_size: args.batch_size,
        learning_rate: args.lr,
        patience: args.patience,
        seed: args.seed,
        val_fraction: 0.1,
        model_dir: args.model_dir.clone(),
    };

    let spectra = load_spectra(&args.train_set, &args.det_type)
        .with_context(|| format!("loading {}", args.train_set.display()))?;
    println!("  Examples: {}", spectra.len());
    println!();

    let outcome = run_training::<TrainingBackend>(
        &spectra,
        &model_config,
        model_type,
        &training_config,
    )?;

    println!();
    println!("{}", "Training Complete!".green().bold());
    if outcome.stopped_early {
        println!("  Stopped early after {} epochs", outcome.epochs_run);
    } else {
        println!("  Ran all {} epochs", outcome.epochs_run);
    }
    println!("  Best validation loss: {:.6}", outcome.best_val_loss);
    if let Some(last) = outcome.history.last() {
        println!("  Final validation PSNR: {:.2} dB", last.val_psnr);
    }
    println!("  Best checkpoint:  {}", outcome.best_checkpoint.display());
    println!("  Final checkpoint: {}", outcome.final_checkpoint.display());
    println!();
    println!("Script completed in {:.2} secs", start.elapsed().as_secs_f64());

    Ok(())
}

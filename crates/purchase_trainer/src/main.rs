//! Purchase predictor CLI
//!
//! `train` fits a model on an event log and reports its test metrics;
//! `predict` scores one record with a saved model.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use purchase_core::PipelineConfig;
use purchase_trainer::{
    load_bundle, report, sample_event, save_bundle, train_from_csv, ModelBundle,
    DEFAULT_SAMPLE_CATEGORY_ID, DEFAULT_SAMPLE_PRICE, DEFAULT_SAMPLE_PRODUCT_ID,
    DEFAULT_SAMPLE_USER_ID,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "purchase-train")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Gradient-boosted purchase prediction from e-commerce event logs", long_about = None)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train on an event log, report test metrics and score a sample
    Train(TrainArgs),
    /// Score one record with a saved model
    Predict(PredictArgs),
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Input CSV event log (with header row)
    #[arg(short, long)]
    input: PathBuf,

    /// TOML configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read at most this many rows
    #[arg(long)]
    limit: Option<usize>,

    /// Output directory for model and hash
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Fraction of examples held out for evaluation
    #[arg(long)]
    test_fraction: Option<f64>,

    /// Seed for the train/test permutation
    #[arg(long)]
    seed: Option<i64>,

    /// Number of boosting iterations
    #[arg(long)]
    iterations: Option<usize>,

    /// Shrinkage applied to every tree
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Maximum tree depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Minimum examples per leaf
    #[arg(long)]
    min_leaf_size: Option<usize>,

    #[command(flatten)]
    sample: SampleArgs,
}

#[derive(Args, Debug)]
struct PredictArgs {
    /// Directory holding model.json and model.hash
    #[arg(short, long)]
    model: PathBuf,

    #[command(flatten)]
    sample: SampleArgs,
}

#[derive(Args, Debug)]
struct SampleArgs {
    #[arg(long, default_value_t = DEFAULT_SAMPLE_PRODUCT_ID)]
    product_id: u64,

    #[arg(long, default_value_t = DEFAULT_SAMPLE_CATEGORY_ID)]
    category_id: u64,

    #[arg(long, default_value_t = DEFAULT_SAMPLE_PRICE)]
    price: f64,

    #[arg(long, default_value_t = DEFAULT_SAMPLE_USER_ID)]
    user_id: u64,
}

impl SampleArgs {
    fn predict(&self, engine: purchase_core::InferenceEngine<'_>) -> Result<bool> {
        let event = sample_event(self.product_id, self.category_id, self.price, self.user_id);
        engine
            .predict(&event)
            .context("Failed to score sample record")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Purchase Predictor v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Train(args) => train(args, cli.verbose),
        Command::Predict(args) => predict(args),
    }
}

fn build_config(args: &TrainArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(v) = args.test_fraction {
        config.split.test_fraction = v;
    }
    if let Some(v) = args.seed {
        config.split.seed = v;
    }
    if let Some(v) = args.iterations {
        config.boosting.iterations = v;
    }
    if let Some(v) = args.learning_rate {
        config.boosting.learning_rate = v;
    }
    if let Some(v) = args.max_depth {
        config.boosting.max_depth = v;
    }
    if let Some(v) = args.min_leaf_size {
        config.boosting.min_leaf_size = v;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn train(args: TrainArgs, verbose: bool) -> Result<()> {
    let config = build_config(&args)?;

    info!("Training configuration:");
    info!("  Test fraction: {} (seed {})", config.split.test_fraction, config.split.seed);
    info!("  Iterations: {}", config.boosting.iterations);
    info!("  Learning rate: {}", config.boosting.learning_rate);
    info!("  Max depth: {}", config.boosting.max_depth);
    info!("  Min leaf size: {}", config.boosting.min_leaf_size);

    let trained = train_from_csv(&args.input, args.limit, &config)
        .with_context(|| format!("Training on {} failed", args.input.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let verdict = trained.verdict(config.evaluation.accuracy_threshold);
    report::write_metrics(&mut out, &trained.metrics, verdict)?;
    if verbose {
        report::write_details(&mut out, &trained.metrics)?;
    }

    let is_purchase = args.sample.predict(trained.engine())?;
    report::write_prediction(&mut out, is_purchase)?;
    out.flush()?;

    if let Some(dir) = &args.output {
        let bundle = ModelBundle::from_pipeline(&trained, &config);
        let saved = save_bundle(dir, &bundle).context("Failed to save model")?;
        info!("Model: {}", saved.model_path.display());
        info!("Hash: {} ({})", saved.hash_path.display(), saved.hash);
    }

    Ok(())
}

fn predict(args: PredictArgs) -> Result<()> {
    let bundle = load_bundle(&args.model)
        .with_context(|| format!("Failed to load model from {}", args.model.display()))?;

    let is_purchase = args.sample.predict(bundle.engine())?;
    report::write_prediction(&mut io::stdout().lock(), is_purchase)?;

    Ok(())
}

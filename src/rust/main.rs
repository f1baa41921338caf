use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use leafsense::server::{self, AppState};
use leafsense::{advice, ClassifierBuilder, ClassifierEngine, RankedPrediction, RuntimeConfig};
use log::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model artifact (.onnx, .ort or .tflite)
    #[arg(long, env = "LEAFSENSE_MODEL", default_value = "prediction_model.onnx")]
    model: PathBuf,

    /// Label table CSV (class_index,class)
    #[arg(long, env = "LEAFSENSE_LABELS", default_value = "class_dict.csv")]
    labels: PathBuf,

    /// Expected SHA-256 of the model artifact
    #[arg(long, env = "LEAFSENSE_MODEL_SHA256")]
    model_sha256: Option<String>,

    /// ONNX Runtime operator threads, 0 lets the runtime choose
    #[arg(long, env = "LEAFSENSE_THREADS", default_value_t = 0)]
    threads: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify one leaf image
    Classify {
        image: PathBuf,
        #[arg(short = 'k', long, default_value_t = 5)]
        top_k: usize,
    },
    /// List the class labels of the model
    Classes,
    /// Describe the loaded model and how it was trained
    Info,
    /// Serve the HTTP API
    Serve {
        #[arg(long, env = "LEAFSENSE_HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "LEAFSENSE_PORT", default_value_t = 8000)]
        port: u16,
        /// Abort a single prediction after this many seconds
        #[arg(long, env = "LEAFSENSE_INFERENCE_TIMEOUT_SECS")]
        inference_timeout_secs: Option<u64>,
        /// Largest accepted upload in MiB
        #[arg(long, env = "LEAFSENSE_MAX_UPLOAD_MB", default_value_t = 64)]
        max_upload_mb: usize,
    },
}

fn builder(args: &Args) -> ClassifierBuilder {
    let builder = ClassifierBuilder::new()
        .with_runtime_config(RuntimeConfig::with_intra_threads(args.threads));
    match &args.model_sha256 {
        Some(hash) => builder.with_model_checksum(hash.clone()),
        None => builder,
    }
}

fn load_engine(args: &Args) -> anyhow::Result<ClassifierEngine> {
    let start = Instant::now();
    info!("Loading model {:?} with labels {:?}", args.model, args.labels);
    let engine = builder(args)
        .build_and_load(&args.model, &args.labels)
        .with_context(|| format!("failed to load classifier from {:?}", args.model))?;
    info!("=== Classifier Ready (took {:.2?}) ===", start.elapsed());
    Ok(engine)
}

fn print_predictions(image: &Path, predictions: &[RankedPrediction]) {
    println!("\nResults for {}:", image.display());
    for (rank, p) in predictions.iter().enumerate() {
        let marker = if p.is_healthy { "healthy" } else { "disease" };
        println!(
            "  {}. {} / {} [{}]: {:.2}%",
            rank + 1,
            p.species,
            p.condition,
            marker,
            p.confidence_percent
        );
    }
}

async fn serve(
    args: &Args,
    host: &str,
    port: u16,
    timeout_secs: Option<u64>,
    max_upload_mb: usize,
) -> anyhow::Result<()> {
    // A failed load still serves; clients see model_loaded=false and 503s.
    let mut engine = builder(args).build();
    if let Err(e) = engine.load(&args.model, &args.labels) {
        warn!("Starting without a model: {}", e);
    }

    let mut state =
        AppState::new(Arc::new(engine)).with_max_upload_bytes(max_upload_mb * 1024 * 1024);
    if let Some(secs) = timeout_secs {
        state = state.with_inference_timeout(Duration::from_secs(secs));
    }

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", host, port))?;
    server::serve(state, addr).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    leafsense::init_logger();
    let args = Args::parse();

    match &args.command {
        Command::Classify { image: image_path, top_k } => {
            let engine = load_engine(&args)?;
            let picture = image::open(image_path)
                .with_context(|| format!("failed to open image {}", image_path.display()))?;

            let start = Instant::now();
            let predictions = engine.classify(&picture, *top_k)?;
            info!("Classification took {:.2?}", start.elapsed());

            print_predictions(image_path, &predictions);
            if let Some(best) = predictions.first() {
                println!("\n{}", advice::for_prediction(best));
            }
        }
        Command::Classes => {
            let engine = load_engine(&args)?;
            if let Some(catalog) = engine.catalog() {
                println!("{} classes:", catalog.size());
                for entry in catalog.iter() {
                    println!("  {:>3}  {}", entry.index, entry.raw_name);
                }
            }
        }
        Command::Info => {
            let engine = load_engine(&args)?;
            if let Some(info) = engine.info() {
                println!("Backend:      {}", info.backend);
                println!("Classes:      {}", info.num_classes);
                println!(
                    "Input:        {0}x{0}x3 {1}, {2}",
                    info.input_size, info.color_mode, info.preprocessing
                );
                let t = &info.training;
                println!("Architecture: {} ({} weights)", t.architecture, t.pretrained_weights);
                println!(
                    "Optimizer:    {} (lr {}), {}",
                    t.optimizer, t.learning_rate, t.loss_function
                );
                println!("Head:");
                for layer in &t.custom_layers {
                    println!("  {}", layer);
                }
                println!("Augmentation: {}", t.training_augmentation.join(", "));
            }
        }
        Command::Serve {
            host,
            port,
            inference_timeout_secs,
            max_upload_mb,
        } => {
            serve(&args, host, *port, *inference_timeout_secs, *max_upload_mb).await?;
        }
    }

    Ok(())
}

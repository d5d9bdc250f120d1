use anyhow::{anyhow, Context};
use clap::Parser;
use dashcore::auth::CredentialStore;
use dashcore::detection::HttpDetectionService;
use dashcore::processing::{BatchProcessor, LabelDistribution};
use dashcore::{Dashboard, DetectionService};
use generator::synthetic::SyntheticDetector;
use gui_bridge::bridge::GuiBridge;
use log::{info, warn};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::{DashboardConfig, DetectorKind};
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Object-detection analytics dashboard")]
struct Args {
    /// Load dashboard settings from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory scanned for .jpg/.png/.jpeg images
    #[arg(long)]
    images: Option<PathBuf>,
    /// Credential store file
    #[arg(long)]
    users: Option<PathBuf>,
    /// Detection endpoint URL, or `synthetic` for the built-in generator
    #[arg(long)]
    detector: Option<String>,
    /// Run a single batch without the HTTP bridge and print the distribution
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Re-run reducer branches on every snapshot whose counters are non-zero
    #[arg(long, default_value_t = false)]
    legacy_triggers: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = if let Some(path) = args.config {
        DashboardConfig::load(path)?
    } else {
        DashboardConfig::default()
    };
    config.apply_overrides(args.images, args.users, args.detector, args.legacy_triggers);

    let processor = BatchProcessor::new(&config.image_dir, build_detector(&config)?);

    if args.offline {
        return run_offline(&processor);
    }

    let credentials = CredentialStore::load_or_default(&config.users_file);
    info!(
        "{} registered users in {}",
        credentials.len(),
        config.users_file.display()
    );
    let dashboard = Dashboard::new(credentials, processor).with_trigger_mode(config.trigger_mode);
    let (runner, state_thread) = Runner::spawn(dashboard)?;
    let bridge = GuiBridge::new(runner);

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime for the HTTP bridge")?;
    runtime.block_on(bridge.serve(config.bind, async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("cannot listen for Ctrl+C: {err}");
        }
    }))?;
    drop(runtime);

    state_thread
        .join()
        .map_err(|_| anyhow!("dashboard state thread panicked"))?;
    Ok(())
}

fn build_detector(config: &DashboardConfig) -> anyhow::Result<Box<dyn DetectionService>> {
    match config.detector_kind() {
        DetectorKind::Synthetic => {
            info!("using synthetic detector (seed {})", config.synthetic_seed);
            let detector = SyntheticDetector::new(config.synthetic_seed)
                .with_labels(config.synthetic_labels.clone())
                .with_max_per_image(config.synthetic_max_per_image);
            Ok(Box::new(detector))
        }
        DetectorKind::Http(endpoint) => {
            info!("using detection service at {endpoint}");
            let service = HttpDetectionService::new(endpoint)
                .context("creating detection service client")?;
            Ok(Box::new(service))
        }
    }
}

fn run_offline(processor: &BatchProcessor) -> anyhow::Result<()> {
    let report = processor
        .run_batch()
        .with_context(|| format!("processing {}", processor.image_dir().display()))?;
    let distribution = LabelDistribution::count(&report.labels);

    println!(
        "Offline batch -> images {} (skipped {}), objects {}",
        report.scanned,
        report.skipped,
        distribution.total()
    );
    for (label, count) in distribution.iter() {
        println!("  {label:<20} {count}");
    }

    let summary = distribution
        .iter()
        .map(|(label, count)| format!("{label}={count}"))
        .collect::<Vec<_>>()
        .join(",");
    let line = format!(
        "dir={} images={} skipped={} objects={} [{}]\n",
        processor.image_dir().display(),
        report.scanned,
        report.skipped,
        distribution.total(),
        summary
    );
    let log_path = PathBuf::from("logs/offline_batch.log");
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("opening {}", log_path.display()))?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

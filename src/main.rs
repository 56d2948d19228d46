//! ferrite-val: runs one validation epoch of a binary classifier.
//!
//! Examples:
//!   ferrite-val --spec clf.json --epoch 10 --event-dir runs/clf
//!   ferrite-val --model trained.json --data val.csv --workers 4 --metrics-log val.log

use std::process::ExitCode;
use std::thread;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use ferrite_val::data::csv::{builtin_blobs, load_csv};
use ferrite_val::{
    val_epoch, Collective, DataLoader, FileEventWriter, Network, NetworkSpec, Result, Sinks,
    ThreadGroup, TsvLogger, ValError, ValidationConfig, ValidationReport,
};
use ferrite_val::tracking::{EventWriter, MetricsLogger, EPOCH_LOG_HEADER};

/// Validate a binary classifier for one epoch.
#[derive(Parser, Debug)]
#[command(name = "ferrite-val", version, about, long_about = None)]
struct Cli {
    /// Trained network (JSON written by `Network::save_json`)
    #[arg(long, conflicts_with = "spec")]
    model: Option<String>,

    /// Architecture spec; the network is freshly initialized from it
    #[arg(long)]
    spec: Option<String>,

    /// Validation CSV: feature columns followed by a 0/1 label
    #[arg(long)]
    data: Option<String>,

    /// Size of the built-in two-blobs set used when --data is omitted
    #[arg(long, default_value_t = 256)]
    blobs: usize,

    /// Epoch number reported to the logs
    #[arg(short, long, default_value_t = 0)]
    epoch: usize,

    /// Validation config (JSON)
    #[arg(short, long)]
    config: Option<String>,

    /// Overrides the config's batch size
    #[arg(long)]
    batch_size: Option<usize>,

    /// In-process workers; each validates a strided shard
    #[arg(short, long, default_value_t = 1)]
    workers: usize,

    /// Tab-separated per-epoch metrics log
    #[arg(long)]
    metrics_log: Option<String>,

    /// Directory for scalar events and latent-space snapshots
    #[arg(long)]
    event_dir: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli).and_then(|report| Ok(serde_json::to_string_pretty(&report)?)) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<ValidationReport> {
    let mut config = match &cli.config {
        Some(path) => ValidationConfig::load_json(path)?,
        None => ValidationConfig::default(),
    };
    if let Some(batch_size) = cli.batch_size {
        config.batch_size = batch_size;
    }

    let network = match (&cli.model, &cli.spec) {
        (Some(path), _) => Network::load_json(path)?,
        (None, Some(path)) => {
            let spec = NetworkSpec::load_json(path)?;
            spec.validate()?;
            if cli.config.is_none() {
                config.loss = spec.loss;
            }
            Network::from_spec(&spec)
        }
        (None, None) => {
            return Err(ValError::InvalidConfig("pass --model or --spec".into()));
        }
    };
    config.validate()?;

    let (inputs, targets) = match &cli.data {
        Some(path) => load_csv(path)?,
        None => builtin_blobs(cli.blobs),
    };
    let loader = DataLoader::new(inputs, targets, config.batch_size)?;
    let subset = loader.subset(config.subset_size, config.seed);

    let mut logger = cli.metrics_log.as_ref()
        .map(|path| TsvLogger::create(path, &EPOCH_LOG_HEADER))
        .transpose()?;
    let mut events = cli.event_dir.as_ref()
        .map(FileEventWriter::create)
        .transpose()?;
    let sinks = Sinks {
        logger: logger.as_mut().map(|l| l as &mut dyn MetricsLogger),
        events: events.as_mut().map(|e| e as &mut dyn EventWriter),
        progress_tx: None,
    };

    if cli.workers <= 1 {
        return val_epoch(cli.epoch, &loader, Some(&subset), &network, &config, None, sinks);
    }
    run_workers(cli, &network, &loader, &subset, &config, sinks)
}

/// Validates one shard per worker; rank 0 runs on this thread and owns the sinks.
fn run_workers(
    cli: &Cli,
    network: &Network,
    loader: &DataLoader,
    subset: &DataLoader,
    config: &ValidationConfig,
    sinks: Sinks<'_>,
) -> Result<ValidationReport> {
    if cli.workers > loader.num_samples() {
        return Err(ValError::InvalidConfig(format!(
            "{} workers for {} samples leaves a shard empty",
            cli.workers,
            loader.num_samples()
        )));
    }
    let group = ThreadGroup::new(cli.workers)?;
    let shards = (0..cli.workers)
        .map(|rank| loader.shard(rank, cli.workers))
        .collect::<Result<Vec<_>>>()?;

    thread::scope(|s| {
        let peers: Vec<_> = group.iter().zip(&shards).skip(1)
            .map(|(worker, shard)| {
                s.spawn(move || {
                    val_epoch(cli.epoch, shard, None, network, config, Some(worker as &dyn Collective), Sinks::default())
                })
            })
            .collect();

        let lead = val_epoch(cli.epoch, &shards[0], Some(subset), network, config, Some(&group[0] as &dyn Collective), sinks);

        for peer in peers {
            peer.join()
                .map_err(|_| ValError::Collective("worker thread panicked".into()))??;
        }
        lead
    })
}

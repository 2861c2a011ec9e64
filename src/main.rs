//! Entropy Accumulator CLI
//!
//! Builds an entropy context from the host's default sources and prints
//! conditioned blocks as hex.

use clap::Parser;
use entropy_accumulator::{
    config::{ConfigError, EntropyConfig},
    metrics::{MetricsRegistry, MetricsSnapshot},
    EntropyContext, EntropyError, HashAlgorithm, ReseedableRng,
};
use rand_core::RngCore;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "entropy-accumulator")]
#[command(about = "Multi-source entropy accumulator with block-cipher whitening")]
#[command(version = entropy_accumulator::VERSION)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of blocks to print
    #[arg(short = 'n', long)]
    blocks: Option<u32>,

    /// Bytes per block (at most 16)
    #[arg(short, long)]
    bytes: Option<usize>,

    /// Print blocks until Ctrl+C
    #[arg(long)]
    continuous: bool,

    /// Skip the timer jitter source
    #[arg(long)]
    no_timer_jitter: bool,

    /// Seed a ChaCha20 generator from the context and print its output
    #[arg(long)]
    seed_demo: bool,

    /// Use SHA-256 instead of BLAKE3 for seed mixing
    #[arg(long, requires = "seed_demo")]
    sha256: bool,

    /// Metrics server port, 0 disables (needs the `metrics` feature)
    #[arg(long)]
    metrics_port: Option<u16>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Entropy(#[from] EntropyError),
    #[error(transparent)]
    Seeding(#[from] entropy_accumulator::seeding::SeedingError),
    #[error(transparent)]
    Metrics(#[from] entropy_accumulator::metrics::MetricsError),
    #[error("failed to install Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            // 2 = bad configuration, otherwise the negated status code
            Self::Config(_) => ExitCode::from(2),
            Self::Entropy(e) => ExitCode::from(e.code().unsigned_abs() as u8),
            _ => ExitCode::FAILURE,
        }
    }
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    }
}

fn load_config(cli: &Cli) -> Result<EntropyConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => EntropyConfig::from_file(path)?,
        None => EntropyConfig::default(),
    };

    if let Some(blocks) = cli.blocks {
        config.output.blocks = blocks;
    }
    if let Some(bytes) = cli.bytes {
        config.output.bytes_per_block = bytes;
    }
    if let Some(port) = cli.metrics_port {
        config.output.metrics_port = port;
    }
    config.output.continuous |= cli.continuous;
    if cli.no_timer_jitter {
        config.sources.timer_jitter = false;
    }

    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli)?;
    info!("Entropy Accumulator v{}", entropy_accumulator::VERSION);

    let mut ctx: EntropyContext = EntropyContext::new();
    ctx.init_with_config(&config)?;

    let registry = MetricsRegistry::new()?;
    let publish = start_metrics(&config, registry);

    let running = Arc::new(AtomicBool::new(true));
    if config.output.continuous {
        let r = running.clone();
        ctrlc::set_handler(move || {
            r.store(false, Ordering::SeqCst);
        })?;
        info!("Printing blocks until Ctrl+C");
    }

    let mut block = vec![0u8; config.output.bytes_per_block];
    let mut emitted = 0u32;
    while running.load(Ordering::SeqCst)
        && (config.output.continuous || emitted < config.output.blocks)
    {
        let written = ctx.get(&mut block)?;
        println!("{}", hex(&block[..written]));
        emitted += 1;
        publish(&MetricsSnapshot::from_components(&ctx, None));
    }

    if cli.seed_demo {
        let algorithm = if cli.sha256 {
            HashAlgorithm::Sha256
        } else {
            HashAlgorithm::Blake3
        };
        let mut rng = ReseedableRng::from_context_with(&ctx, algorithm)?;

        let mut output = [0u8; 32];
        rng.fill_bytes(&mut output);
        println!("ChaCha20 ({algorithm:?}): {}", hex(&output));

        rng.reseed(&ctx)?;
        rng.fill_bytes(&mut output);
        println!("after reseed:      {}", hex(&output));

        publish(&MetricsSnapshot::from_components(&ctx, Some(&rng)));
    }

    let stats = ctx.stats().snapshot();
    info!(
        requests = stats.requests,
        bytes = stats.bytes_served,
        failures = stats.failures(),
        "Done"
    );
    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

type Publisher = Box<dyn Fn(&MetricsSnapshot)>;

#[cfg(feature = "metrics")]
fn start_metrics(config: &EntropyConfig, registry: MetricsRegistry) -> Publisher {
    use entropy_accumulator::metrics::{MetricsServer, MetricsServerConfig};

    let port = config.output.metrics_port;
    if port == 0 {
        return Box::new(move |snapshot| registry.update(snapshot));
    }

    let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry);
    let state = server.state();

    let spawned = std::thread::Builder::new()
        .name("metrics-server".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::warn!(error = %e, "Could not start metrics runtime");
                    return;
                }
            };
            if let Err(e) = runtime.block_on(server.run()) {
                tracing::warn!(error = %e, "Metrics server stopped");
            }
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "Could not spawn metrics server");
    }
    Box::new(move |snapshot| state.blocking_write().update(snapshot))
}

#[cfg(not(feature = "metrics"))]
fn start_metrics(config: &EntropyConfig, registry: MetricsRegistry) -> Publisher {
    if config.output.metrics_port != 0 {
        tracing::debug!("Built without the `metrics` feature; metrics server disabled");
    }
    Box::new(move |snapshot| registry.update(snapshot))
}

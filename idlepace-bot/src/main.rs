mod agent;
mod channel;
mod clock;
mod config;
mod limiter;
mod logging;
mod registry;
mod reports;
mod shutdown;
mod store;
#[cfg(test)]
mod test_support;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use idlepace_core::{ScheduleTiming, pacing_table, simulate_unlock_order};
use log::{info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use agent::AgentServices;
use channel::{AsfChannel, CommandChannel, RateLimitedChannel};
use clock::SystemClock;
use config::EndpointsConfig;
use limiter::RateLimiter;
use registry::{AgentRegistry, ExitStatus};
use reports::ReportFormat;
use store::JsonFileStore;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Parser)]
#[command(name = "idlepace", version)]
#[command(about = "Idle games on ASF bots with human-like schedules and paced achievement unlocks")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start every configured agent and run until interrupted
    Run(RunArgs),
    /// Print the time-to-next-achievement table for a pacing configuration
    Estimate(EstimateArgs),
    /// Simulate the order in which achievements would unlock
    Order(OrderArgs),
}

#[derive(Debug, clap::Args)]
struct RunArgs {
    /// Endpoints file listing hosts and their bots
    #[arg(long, default_value = config::DEFAULT_ENDPOINTS_PATH)]
    config: PathBuf,

    /// Pacing constants (built-in tuning when omitted)
    #[arg(long)]
    pacing: Option<PathBuf>,

    /// Achievement metadata for the idled app
    #[arg(long, default_value = config::DEFAULT_ACHIEVEMENTS_PATH)]
    achievements: PathBuf,

    /// Directory holding one state file per agent
    #[arg(long, default_value = config::DEFAULT_STATE_DIR)]
    state_dir: PathBuf,

    /// App to idle and unlock achievements for
    #[arg(long, default_value_t = config::DEFAULT_APP_ID)]
    app_id: u32,

    /// Minimum spacing between commands to the same host
    #[arg(long, default_value_t = 10_000)]
    min_interval_ms: u64,

    /// Derive every agent's randomness from this seed
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, clap::Args)]
struct EstimateArgs {
    /// Pacing constants (built-in tuning when omitted)
    #[arg(long)]
    pacing: Option<PathBuf>,

    /// Number of achievements in the app
    #[arg(long)]
    total: Option<usize>,

    /// Take the achievement count from this metadata file
    #[arg(long)]
    achievements: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Output file (defaults to stdout)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
struct OrderArgs {
    /// Achievement metadata to order
    #[arg(long, default_value = config::DEFAULT_ACHIEVEMENTS_PATH)]
    achievements: PathBuf,

    /// Seed for a reproducible order
    #[arg(long)]
    seed: Option<u64>,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Output file (defaults to stdout)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    match args.command {
        Commands::Run(run) => {
            let status = run_agents(run).await?;
            if status == ExitStatus::Fault {
                std::process::exit(status.code());
            }
        }
        Commands::Estimate(estimate) => write_estimate(&estimate)?,
        Commands::Order(order) => write_order(&order)?,
    }

    Ok(())
}

async fn run_agents(args: RunArgs) -> Result<ExitStatus> {
    let endpoints = EndpointsConfig::load(&args.config)?;
    let identities = endpoints.identities(&args.config)?;
    let pacing = config::load_pacing(args.pacing.as_deref())?;
    let catalog = config::load_catalog(&args.achievements)?;
    if catalog.is_empty() {
        warn!(
            "{} lists no achievements, agents will only idle",
            args.achievements.display()
        );
    }
    let store = JsonFileStore::open(&args.state_dir)
        .with_context(|| format!("failed to prepare {}", args.state_dir.display()))?;
    info!("State directory: {}", store.dir().display());

    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(args.min_interval_ms)));
    info!(
        "Rate limit: one command per {:?} per host",
        limiter.min_interval()
    );
    let client = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    let agents: Vec<_> = identities
        .into_iter()
        .map(|identity| {
            let channel: Arc<dyn CommandChannel> = Arc::new(RateLimitedChannel::new(
                AsfChannel::new(client.clone(), &identity.endpoint),
                Arc::clone(&limiter),
                identity.endpoint.limiter_key(),
            ));
            (identity, channel)
        })
        .collect();

    let services = Arc::new(AgentServices {
        store: Arc::new(store),
        catalog: Arc::new(catalog),
        pacing,
        clock: Arc::new(SystemClock),
        timing: ScheduleTiming::default(),
        app_id: args.app_id,
    });

    let registry = AgentRegistry::spawn(agents, &services, args.seed);
    info!("Started {} agent(s)", registry.len());
    Ok(registry.supervise().await)
}

fn write_estimate(args: &EstimateArgs) -> Result<()> {
    let pacing = config::load_pacing(args.pacing.as_deref())?;
    let total = match (args.total, &args.achievements) {
        (Some(total), _) => total,
        (None, Some(path)) => config::load_catalog(path)?.len(),
        (None, None) => bail!("either --total or --achievements is required"),
    };

    let rows = pacing_table(&pacing, total);
    let mut output_target = OutputTarget::new(args.output.clone())?;
    reports::write_pacing_table(&mut output_target, &rows, args.report)?;
    output_target.flush_inner()?;
    Ok(())
}

fn write_order(args: &OrderArgs) -> Result<()> {
    let catalog = config::load_catalog(&args.achievements)?;
    let mut rng = args
        .seed
        .map_or_else(ChaCha20Rng::from_entropy, ChaCha20Rng::seed_from_u64);
    let order = simulate_unlock_order(&catalog, &mut rng);

    let mut output_target = OutputTarget::new(args.output.clone())?;
    reports::write_unlock_order(&mut output_target, &order, args.report)?;
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        self.writer().flush()
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

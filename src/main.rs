//! Hazard Watch binary
//!
//! Runs one of the cooperating processes: `ingest` (serial link to snapshot
//! file), `watch` (snapshot file to hotspot control), or `serve` (snapshot
//! read API).

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use hazard_watch::{
    open_link, poll_store, run_ingest, start_web_server, watch, ActuationHook, Aggregator,
    AlertStateMachine, Channel, HotspotHook, IngestOptions, LogOnlyHook, MonitorConfig, Snapshot,
    SnapshotStore, WatchOptions, DEFAULT_DEVICE, DEFAULT_SNAPSHOT_PATH, LINK_BAUD_RATE,
};
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{filter::LevelFilter, EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "hazard_watch")]
#[command(about = "Sensor telemetry smoothing and emergency hotspot watcher")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Smooths gas/temperature readings from a serial sensor hub into a \
snapshot file and raises an emergency Wi-Fi hotspot while readings are dangerous")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Snapshot artifact shared between the processes
    #[arg(long, global = true, default_value = DEFAULT_SNAPSHOT_PATH)]
    snapshot_path: String,

    /// JSON config file (channel limits, thresholds, hotspot commands)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the sensor link and publish smoothed snapshots
    Ingest(IngestArgs),

    /// Poll snapshots and control the emergency hotspot
    Watch(WatchArgs),

    /// Serve the current snapshot over HTTP
    Serve(ServeArgs),

    /// Print the current snapshot and exit
    Snapshot(SnapshotArgs),
}

#[derive(Args)]
struct IngestArgs {
    /// Serial device to read, or `-` for stdin
    #[arg(long, default_value = DEFAULT_DEVICE)]
    device: String,

    /// Snapshot publication interval in milliseconds
    #[arg(long)]
    publish_interval_ms: Option<u64>,

    /// Print every published snapshot to stdout
    #[arg(long)]
    echo: bool,
}

#[derive(Args)]
struct WatchArgs {
    /// Polling interval in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Treat snapshots older than this many milliseconds as missing
    #[arg(long)]
    stale_after_ms: Option<u64>,

    /// Log transitions without running hotspot commands
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct ServeArgs {
    /// Bind address, overriding the config file (default 0.0.0.0)
    #[arg(long)]
    host: Option<String>,

    /// Port, overriding the config file (default 8080)
    #[arg(short, long)]
    port: Option<u16>,

    /// Disable CORS headers
    #[arg(long)]
    no_cors: bool,
}

#[derive(Args)]
struct SnapshotArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    let config = match &cli.config {
        Some(path) => MonitorConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path))?,
        None => MonitorConfig::default(),
    };
    let store = SnapshotStore::new(&cli.snapshot_path);

    match &cli.command {
        Commands::Ingest(args) => ingest_command(config, store, args).await?,
        Commands::Watch(args) => watch_command(config, store, args).await?,
        Commands::Serve(args) => serve_command(config, store, args).await?,
        Commands::Snapshot(args) => snapshot_command(&store, args)?,
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(log_level(cli), &directives))
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn log_level(cli: &Cli) -> Level {
    if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    }
}

/// `RUST_LOG` directives win; the flag level applies when there are none.
fn log_filter(level: Level, directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .parse_lossy(directives)
}

async fn ingest_command(
    config: MonitorConfig,
    store: SnapshotStore,
    args: &IngestArgs,
) -> anyhow::Result<()> {
    let config = match args.publish_interval_ms {
        Some(ms) => config.with_publish_interval_ms(ms),
        None => config,
    };
    config.validate()?;

    let link = open_link(&args.device).await?;
    let mut aggregator = Aggregator::new(&config.channels, config.window_size);
    let options = IngestOptions::default().with_publish_interval(config.publish_interval());

    info!(
        "Reading sensor link {} (expects {} baud, raw mode)",
        args.device, LINK_BAUD_RATE
    );
    info!(
        "Publishing to {} every {}ms",
        store.path().display(),
        config.publish_interval_ms
    );

    let echo = args.echo;
    let ingest = run_ingest(link, &mut aggregator, &store, options, move |snapshot| {
        if echo {
            print_snapshot_json(snapshot);
        }
    });

    tokio::select! {
        result = ingest => {
            let stats = result?;
            info!(published = stats.snapshots_published, "Ingest finished");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping ingest");
        }
    }

    Ok(())
}

async fn watch_command(
    config: MonitorConfig,
    store: SnapshotStore,
    args: &WatchArgs,
) -> anyhow::Result<()> {
    let config = match args.poll_interval_ms {
        Some(ms) => config.with_poll_interval_ms(ms),
        None => config,
    };
    config.validate()?;

    let options = WatchOptions {
        poll_interval: config.poll_interval(),
        stale_after: args.stale_after_ms.map(Duration::from_millis),
    };

    let mut hook: Box<dyn ActuationHook> = if args.dry_run {
        info!("Dry run: hotspot commands disabled");
        Box::new(LogOnlyHook::default())
    } else {
        Box::new(HotspotHook::new(config.hotspot.clone()))
    };
    let mut machine = AlertStateMachine::new(config.alert);

    info!(
        "Watching {} every {}ms (gas >= {}, temperature >= {})",
        store.path().display(),
        config.poll_interval_ms,
        config.alert.gas_threshold,
        config.alert.fire_threshold
    );

    let readings = poll_store(store, options);
    tokio::select! {
        _ = watch(readings, &mut machine, hook.as_mut()) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping watcher");
        }
    }

    if machine.is_danger() {
        warn!("Exiting in DANGER state; the emergency hotspot is left running");
    }

    Ok(())
}

async fn serve_command(
    config: MonitorConfig,
    store: SnapshotStore,
    args: &ServeArgs,
) -> anyhow::Result<()> {
    let mut web_config = config
        .web
        .with_overrides(args.host.as_deref(), args.port);
    if args.no_cors {
        web_config = web_config.with_cors(false);
    }

    info!("Web server configuration:");
    info!("  - Bind address: {}", web_config.socket_addr()?);
    info!("  - CORS enabled: {}", web_config.enable_cors);

    start_web_server(web_config, store).await?;
    Ok(())
}

fn snapshot_command(store: &SnapshotStore, args: &SnapshotArgs) -> anyhow::Result<()> {
    let snapshot = match store.read() {
        Ok(snapshot) => snapshot,
        Err(no_data) => {
            error!("No snapshot available at {}: {}", store.path().display(), no_data);
            std::process::exit(1);
        }
    };

    match args.format.as_str() {
        "json" => print_snapshot_json(&snapshot),
        "pretty" => print_pretty_snapshot(&snapshot),
        _ => {
            error!("Unsupported format: {}. Use 'json' or 'pretty'", args.format);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn print_snapshot_json(snapshot: &Snapshot) {
    let values: serde_json::Map<String, serde_json::Value> = Channel::ALL
        .into_iter()
        .map(|channel| (channel.wire_name().to_string(), snapshot.value(channel).into()))
        .collect();

    match serde_json::to_string_pretty(&values) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to encode snapshot: {}", e),
    }
}

fn print_pretty_snapshot(snapshot: &Snapshot) {
    println!(
        "Sensor Snapshot ({})",
        snapshot.produced_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("==========================================");
    println!("  Gas (MQ3):          {:.2}", snapshot.value(Channel::Gas));
    println!(
        "  Temperature:        {:.2} °C",
        snapshot.value(Channel::Temperature)
    );
    println!(
        "  Gas beacon:         {:.2} m",
        snapshot.value(Channel::GasBeaconDistance)
    );
    println!(
        "  Temperature beacon: {:.2} m",
        snapshot.value(Channel::TempBeaconDistance)
    );
}

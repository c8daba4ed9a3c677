use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use strokesense::config::SensorDriverKind;
use strokesense::keyboard_input::KeyboardInputHandler;
use strokesense::{
    ChannelAvailability, MockSensorDriver, PipelineOrchestrator, SensorDriver, StrokeSenseConfig,
    SyntheticSensorDriver,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "strokesense")]
#[command(about = "Wearable stroke detection pipeline")]
#[command(version)]
#[command(long_about = "Samples motion sensors into rolling buffers, classifies a window of \
recent motion every few hundred milliseconds and prints each detected stroke as a JSON line.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "strokesense.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting the pipeline")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Run without required sensors and allow simulated strokes
    #[arg(long, help = "Enable test mode (overrides system.test_mode)")]
    test_mode: bool,

    /// Stop after this many seconds
    #[arg(long, value_name = "SECS", help = "Run for a fixed number of seconds, then stop")]
    duration: Option<u64>,

    /// Simulate strokes from the keyboard
    #[arg(long, help = "Enable keyboard stroke simulation (test mode only)")]
    keyboard: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        println!("# Strokesense configuration file (defaults)");
        println!("{}", StrokeSenseConfig::default().to_toml()?);
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting strokesense v{}", env!("CARGO_PKG_VERSION"));

    let mut config = StrokeSenseConfig::load_from_file(&args.config).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;
    if args.test_mode {
        config.system.test_mode = true;
    }

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        std::process::exit(1);
    }
    if args.validate_config {
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let driver: Arc<dyn SensorDriver> = match config.sensor.driver {
        SensorDriverKind::Synthetic => Arc::new(SyntheticSensorDriver::new(
            config.sampling.sample_rate_hz,
            config.classifier.seed,
        )),
        SensorDriverKind::None => Arc::new(MockSensorDriver::new(ChannelAvailability::none())),
    };

    let test_mode = config.system.test_mode;
    let pipeline = Arc::new(PipelineOrchestrator::new(config, driver)?);

    let mut events = pipeline.subscribe_last_event();
    tokio::spawn(async move {
        while let Some(latest) = events.next().await {
            if let Some(event) = latest {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => warn!("Failed to serialise event: {}", e),
                }
            }
        }
    });

    let mut states = pipeline.subscribe_state();
    tokio::spawn(async move {
        while let Some(state) = states.next().await {
            info!("Pipeline state: {}", state);
        }
    });

    if let Err(e) = pipeline.start(test_mode).await {
        error!("Failed to start pipeline: {}", e);
        eprintln!("✗ {}", e);
        pipeline.stop().await;
        std::process::exit(1);
    }

    let shutdown = CancellationToken::new();
    let keyboard = if args.keyboard {
        let handler = KeyboardInputHandler::new(Arc::clone(&pipeline), shutdown.clone());
        handler.start().await?;
        Some(handler)
    } else {
        None
    };

    let reason = wait_for_shutdown(args.duration, &shutdown).await;
    info!("Shutdown initiated: {}", reason);

    if let Some(handler) = &keyboard {
        handler.stop().await?;
    }
    pipeline.stop().await;

    info!("strokesense stopped");
    Ok(())
}

async fn wait_for_shutdown(duration: Option<u64>, shutdown: &CancellationToken) -> &'static str {
    let timer = async {
        match duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to register SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = sigterm => "SIGTERM",
        _ = timer => "duration elapsed",
        _ = shutdown.cancelled() => "user request",
    }
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("strokesense={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_writer(std::io::stderr)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .with_writer(std::io::stderr)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .with_writer(std::io::stderr)
                .boxed()
        }
    };

    // Logs go to stderr; stdout carries the event stream.
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

//! Face Gate CLI
//!
//! Runs the authorization screen headless: the view reports through the
//! log, and a fixed classifier stands in for face recognition. The process
//! exits once the hand-off to the successor screen happens, or on Ctrl-C.

use clap::Parser;
use face_gate::{
    capture::{FileConfig, StreamSource},
    metrics::MetricsRegistry,
    recognition::{FixedClassifier, RollingFps},
    session::{
        HostContext, LogView, SessionCommand, SessionController, SessionDriver, SessionHandle,
    },
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "face-gate", version, about = "Camera face authorization gate")]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stream address, overriding the configuration file.
    #[arg(short, long)]
    uri: Option<String>,

    /// Identity the stand-in classifier authorizes.
    #[arg(long, default_value = "demo")]
    identity: String,

    /// Frame on which the stand-in classifier authorizes (0 = never).
    #[arg(long, default_value_t = 60)]
    authorize_after: u64,

    /// Metrics server port, overriding the configuration file (0 = disabled).
    #[arg(long)]
    metrics_port: Option<u16>,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };
    if let Some(uri) = args.uri.clone() {
        config.camera.uri = uri;
    }
    if let Some(port) = args.metrics_port {
        config.metrics.port = port;
    }
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    runtime.block_on(run(args, config));
}

async fn run(args: Args, config: FileConfig) {
    info!("Face Gate v{}", face_gate::VERSION);
    info!(uri = %config.camera.uri, "Using stream");

    let classifier = if args.authorize_after == 0 {
        FixedClassifier::rejecting()
    } else {
        FixedClassifier::authorizing(args.identity.as_str(), args.authorize_after)
    };

    // The host switches screens by asking the driver to shut down.
    let (switch_tx, mut switch_rx) = mpsc::unbounded_channel::<()>();
    let host = move || {
        let _ = switch_tx.send(());
    };

    let context = HostContext::new();
    let controller = SessionController::new(
        config.camera.uri.clone(),
        config.session.clone(),
        StreamSource::from_config(&config.camera),
        classifier,
        context.clone(),
        host,
    )
    .with_fps(RollingFps::new(config.fps.window))
    .with_view(LogView::new());

    let (mut driver, handle) = SessionDriver::new(controller);

    match MetricsRegistry::new() {
        Ok(registry) => {
            let registry = Arc::new(registry);
            driver = driver.with_metrics(Arc::clone(&registry));
            serve_metrics(config.metrics.port, registry, &handle);
        }
        Err(e) => warn!("Metrics disabled: {}", e),
    }

    let interrupt = handle.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = interrupt.send(SessionCommand::Shutdown);
    }) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let switch_handle = handle.clone();
    tokio::spawn(async move {
        if switch_rx.recv().await.is_some() {
            info!("Successor screen requested");
            let _ = switch_handle.shutdown();
        }
    });

    if let Err(e) = handle.activate() {
        error!("Session could not be activated: {}", e);
        return;
    }

    let controller = driver.run().await;
    let stats = controller.stats();

    info!(
        frames = stats.frames_processed,
        read_failures = stats.read_failures,
        authorizations = stats.authorizations,
        "Session finished"
    );
    match context.last_authorization() {
        Some(record) => println!(
            "Authorized user: {} at {}",
            record.identity,
            record.authorized_at.to_rfc3339()
        ),
        None => println!("No user authorized ({})", controller.status()),
    }
}

#[cfg(feature = "metrics")]
fn serve_metrics(port: u16, registry: Arc<MetricsRegistry>, session: &SessionHandle) {
    use face_gate::metrics::MetricsServer;

    if port == 0 {
        return;
    }
    let server = MetricsServer::new(port, registry, session.subscribe());
    tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Metrics server failed: {}", e);
        }
    });
}

#[cfg(not(feature = "metrics"))]
fn serve_metrics(port: u16, _registry: Arc<MetricsRegistry>, _session: &SessionHandle) {
    if port != 0 {
        warn!(port, "Metrics endpoint requires the metrics feature");
    }
}

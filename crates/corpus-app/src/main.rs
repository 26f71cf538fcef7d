//! Corpus IPC Server
//!
//! Serves the study channels (`cards:*`, `review:*`, `dashboard:*`, ...) as
//! JSON-RPC 2.0 over stdin/stdout for a desktop front-end. Logs go to stderr.
//!
//! Startup opens the database once, applies migrations and seeds the
//! taxonomy on first run. The storage handle is closed when stdin ends.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use corpus_app::protocol::stdio::StdioTransport;
use corpus_app::ChannelServer;
use corpus_core::{CorpusConfig, Storage};

#[derive(Parser)]
#[command(name = "corpus-ipc")]
#[command(author = "Corpus Developers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "JSON-RPC channel server for the Corpus study app")]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG        Log level filter (e.g. debug, info, warn)\n    CORPUS_DATA_DIR Data directory when --data-dir is not given")]
struct Args {
    /// Custom data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,

    /// Do not populate the taxonomy on an empty database
    #[arg(long)]
    no_seed: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging to stderr (stdout is for JSON-RPC)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    info!("Corpus IPC server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = CorpusConfig::from_env().with_data_dir(args.data_dir);
    let storage = match Storage::from_config(&config) {
        Ok(s) => {
            info!(path = %s.path().display(), "Storage initialized");
            s
        }
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            std::process::exit(1);
        }
    };

    if !args.no_seed {
        match storage.seed_initial_data() {
            Ok(true) => info!("First run: seeded pillars, domains and sample cards"),
            Ok(false) => {}
            Err(e) => warn!("Seeding failed: {}", e),
        }
    }

    let storage = Arc::new(storage);
    let server = ChannelServer::new(Arc::clone(&storage))
        .with_timeout(Duration::from_millis(args.timeout_ms.max(1)));

    info!("Listening on stdio");
    if let Err(e) = StdioTransport::new().run(server).await {
        error!("Transport error: {}", e);
    }

    // The server is dropped with the transport; any blocking call that outlived
    // its request timeout still holds a clone until it commits.
    match Arc::try_unwrap(storage) {
        Ok(storage) => {
            if let Err(e) = storage.close() {
                warn!("Failed to close storage cleanly: {}", e);
            }
        }
        Err(_) => warn!("Storage still in use at shutdown; skipping explicit close"),
    }

    info!("Corpus IPC server stopped");
}

//! prompt-relay server binary.

use std::env;
use std::sync::Arc;

use prompt_relay::{AppState, Config, PredictionBackend, ReplicateClient};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle --version / -V
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("prompt-relay {}", VERSION);
        return Ok(());
    }

    // Load configuration
    let config = Config::load().map_err(|e| format!("Failed to load configuration: {}", e))?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting prompt-relay {}", VERSION);

    let backend: Arc<dyn PredictionBackend> = Arc::new(ReplicateClient::new(
        &config.replicate.base_url,
        &config.replicate.user_agent,
    ));
    tracing::info!(
        "Using {} backend at {}",
        backend.backend_type(),
        config.replicate.base_url
    );

    if config.replicate.process_token().is_none() {
        tracing::warn!(
            "{} is not set; requests must carry their own replicateApiToken",
            config.replicate.token_env
        );
    }

    let state = Arc::new(AppState::new(config.clone(), backend));
    let app = prompt_relay::app(state);

    // Start server
    let addr = format!("{}:{}", config.api.host, config.api.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

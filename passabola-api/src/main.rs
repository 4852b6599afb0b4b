//! # Passa a Bola API Server
//!
//! Serves the Passa a Bola site's pages as JSON over a hosted identity
//! service and table store.
//!
//! ## Usage
//!
//! ```bash
//! SUPABASE_URL=https://project.supabase.co SUPABASE_ANON_KEY=... cargo run -p passabola-api
//! ```

use passabola_api::{
    app::{self, AppState},
    config::Config,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "passabola_api=debug,passabola_shared=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Passa a Bola API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    let address = config.bind_address();

    let connector = app::connector_from_config(&config).await?;
    tracing::info!(backend = connector.kind(), "Backend ready");

    let router = app::build_router(AppState::new(connector, config));

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}

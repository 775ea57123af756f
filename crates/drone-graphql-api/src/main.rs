//! # Drone Dispatch GraphQL API Server
//!
//! Binary entry point for the GraphQL API service.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drone_graphql_api::{ApiContext, Config, build_router, build_schema};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!(
        version = drone_graphql_api::VERSION,
        "Starting Drone Dispatch GraphQL API"
    );
    for warning in &config.warnings {
        tracing::warn!(%warning, "Configuration fallback");
    }

    // Build dispatch engine and API context
    let api_ctx = ApiContext::in_memory(config.dispatch_config());

    // Build GraphQL schema
    let schema = build_schema(api_ctx, &config);

    tracing::info!(
        playground = config.enable_playground,
        max_depth = config.max_query_depth,
        max_complexity = config.max_query_complexity,
        policy = %config.selection_policy,
        "GraphQL schema built"
    );

    // Build router
    let app = build_router(schema, &config);

    // Start server
    let addr = config.server_addr;
    tracing::info!(%addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    if config.enable_playground {
        tracing::info!("GraphQL Playground available at http://{}/graphql", addr);
    }
    tracing::info!("WebSocket subscriptions at ws://{}/graphql/ws", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}

use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use storefront_rs::{
    create_app,
    handlers::PageTemplates,
    init_observability,
    repositories::{DynamoDbCartRepository, DynamoDbProductRepository, TableManager},
    services::{CartService, ListenerRegistry, ProductService},
    shutdown_observability, AppOptions, AppState, Config, Metrics,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_environment()
        .await
        .context("Failed to load configuration")?;

    init_observability(
        &config.observability.service_name,
        &config.observability.service_version,
        config.observability.otlp_endpoint.as_deref(),
        &config.observability.log_level,
        config.observability.enable_json_logging,
    )?;

    info!(
        "Starting {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!("Region: {}", config.aws.region);
    info!(
        "DynamoDB Tables: products={}, carts={}",
        config.database.products_table_name, config.database.carts_table_name
    );

    let metrics = Arc::new(Metrics::new()?);

    let dynamodb_client = Arc::new(config.aws.dynamodb_client.clone());

    if config.database.auto_create_tables {
        TableManager::new(dynamodb_client.clone())
            .ensure_all_tables(
                &config.database.products_table_name,
                &config.database.carts_table_name,
            )
            .await
            .context("Failed to prepare DynamoDB tables")?;
    }

    let product_repository = Arc::new(DynamoDbProductRepository::new(
        dynamodb_client.clone(),
        config.database.products_table_name.clone(),
        config.database.region.clone(),
    ));
    let cart_repository = Arc::new(DynamoDbCartRepository::new(
        dynamodb_client,
        config.database.carts_table_name.clone(),
        config.database.region.clone(),
    ));

    let listeners = Arc::new(ListenerRegistry::with_metrics(metrics.clone()));
    let product_service = Arc::new(ProductService::new_with_listeners(
        product_repository.clone(),
        listeners.clone(),
    ));
    let cart_service = Arc::new(CartService::new(cart_repository, product_repository));
    info!("Services initialized successfully");

    let templates = PageTemplates::new().context("Failed to compile page templates")?;
    let state = AppState::new(
        product_service,
        cart_service,
        listeners.clone(),
        metrics,
        templates,
    );
    let app = create_app(
        state,
        AppOptions {
            request_timeout: config.server.request_timeout(),
            max_request_size: config.server.max_request_size,
            static_dir: config.server.static_dir.clone(),
        },
    );

    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .with_context(|| format!("Invalid host address: {}", config.server.host))?,
        config.server.port,
    );
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Upgraded sockets outlive graceful shutdown unless told to close
            listeners.close_all();
        })
        .await?;

    shutdown_observability().await;
    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

use lunch_orders::{api, create_pool, AppConfig, MemoryStore, PgStore, Services, TableStore};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt::time::ChronoLocal, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging with local timestamps
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_level(true)
        .init();

    // load configuration
    let config = AppConfig::from_env()?;
    info!("Starting server with config: {:?}", config);

    // pick the table store
    let store: Arc<dyn TableStore> = match &config.database.url {
        Some(url) => {
            let pool = create_pool(url, config.database.max_connections).await?;
            info!("Database pool created");
            let store = PgStore::new(pool);
            store.migrate().await?;
            Arc::new(store)
        }
        None => {
            warn!("No database URL configured, orders are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let services = Services::new(store, &config);
    info!("Order layout: {:?}", services.orders.layout());

    let app = api::router(services);

    // start the server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET    /api/restaurants");
    info!("  GET    /api/orders?restaurant=&date=");
    info!("  PUT    /api/orders");
    info!("  DELETE /api/orders/:index?restaurant=&date=");
    info!("  POST   /api/reports/weekly");
    info!("  GET    /api/reports/weekly.csv");
    info!("  GET|PUT|DELETE /api/favorites");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
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
}

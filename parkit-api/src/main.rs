use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use parkit_api::{app, AppState};
use parkit_core::{SpotStore, SystemClock, TicketStore};
use parkit_store::app_config::{Config, StorageBackend};
use parkit_store::{DbClient, MemoryStore, PostgresSpotRepository, PostgresTicketRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parkit_api=debug,parkit_lot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Parkit API on port {}", config.server.port);

    let (spots, tickets, rules): (Arc<dyn SpotStore>, Arc<dyn TicketStore>, _) =
        match config.storage.backend {
            StorageBackend::Memory => {
                tracing::info!(
                    "Using in-memory lot with {} car and {} bike spots",
                    config.lot.car_spots,
                    config.lot.bike_spots
                );
                let store = Arc::new(MemoryStore::seeded(config.lot.car_spots, config.lot.bike_spots));
                (store.clone(), store, config.business_rules.clone())
            }
            StorageBackend::Postgres => {
                let db = DbClient::new(&config.database.url, config.database.max_connections)
                    .await
                    .context("Failed to connect to Postgres")?;
                db.migrate().await.context("Failed to run migrations")?;
                let rules = db
                    .fetch_business_rules(config.business_rules.clone())
                    .await
                    .context("Failed to load business rules")?;
                (
                    Arc::new(PostgresSpotRepository::new(db.pool.clone())),
                    Arc::new(PostgresTicketRepository::new(db.pool.clone())),
                    rules,
                )
            }
        };

    let app_state = AppState::new(spots, tickets, &rules, Arc::new(SystemClock));
    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

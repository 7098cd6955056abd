use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use leaderboard_service::{handlers, Config, RankStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    // Load config
    let config = Config::from_env().context("Failed to load configuration")?;

    info!(
        "Starting {} on {}:{}",
        config.service.service_name, config.service.host, config.service.http_port
    );

    // The store lives for the process lifetime and is shared by all workers.
    let store = web::Data::new(
        RankStore::new(&config.store).context("Failed to construct the rank store")?,
    );

    let bind_address = (config.service.host.clone(), config.service.http_port);

    HttpServer::new(move || {
        App::new()
            .app_data(store.clone())
            .wrap(TracingLogger::default())
            .configure(handlers::configure)
            .default_service(web::route().to(handlers::not_found))
    })
    .bind(bind_address)
    .context("Failed to bind HTTP listener")?
    .run()
    .await
    .context("HTTP server terminated abnormally")
}

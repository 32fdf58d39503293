use std::sync::Arc;

use clap::Parser;
use poolfix::{FixtureCache, FixtureService, HttpFetcher, Site};
use poolfix_api::{Config, build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::parse();

    env_logger::Builder::new()
        .filter_level(config.log_level.into())
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .write_style(env_logger::WriteStyle::Never)
        .init();

    let cache = FixtureCache::connect(&config.database_url).await?;
    cache.init().await?;
    log::info!("Fixture cache ready at {}", config.database_url);

    let fetcher = HttpFetcher::new(config.fetcher_options())?;
    let service = FixtureService::new(
        Arc::new(fetcher),
        cache,
        Site::new(&config.upstream_url),
        config.failure_policy,
    );
    log::info!(
        "Scraping {} with the {} failure policy",
        config.upstream_url,
        service.policy()
    );

    let router = build_router(Arc::new(service));
    let address = config.bind_address();
    let tcp_listener = tokio::net::TcpListener::bind(&address).await?;

    log::info!("Pool fixtures API running on port {}", config.port);

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {e:?}");
            }
            log::info!("Shutting down");
        })
        .await?;

    Ok(())
}

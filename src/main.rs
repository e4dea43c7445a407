use std::{sync::Arc, time::Duration};

use log::{debug, info};
use taskly::{
    config, db::app_storage::AppStorage, middleware::auth::Auth, routes::build_router,
    state::AppState,
};
use tokio::{net::TcpListener, time};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::AppConfig::from_env()?;
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting application with config:");
    info!("  Host: {}", config.host);
    info!("  Port: {}", config.port);
    info!("  Database path: {}", config.database_root_path);
    info!("  Session TTL: {}s", config.token_ttl_secs);
    info!("  Default UTC offset: {} min", config.default_tz_offset);
    info!("  CORS origins: {:?}", config.cors_origins);

    let app_storage = AppStorage::new(
        &config.database_root_path,
        Duration::from_secs(config.token_ttl_secs),
    )?;

    let auth = Auth::new(config.jwt_secret.as_bytes(), config.token_ttl_secs);
    let shared_state = Arc::new(AppState::new(app_storage, config.clone(), auth));

    let app = build_router(shared_state.clone());

    let bind_address = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&bind_address).await?;
    info!("Server starting on http://{}", bind_address);

    tokio::spawn(async move {
        let mut interval = time::interval(time::Duration::from_secs(120));
        loop {
            interval.tick().await;
            shared_state.storage.cleanup_expired();
            let pruned = shared_state.feed.prune();
            debug!(
                "Housekeeping: pruned {} idle feed channel(s), {} live subscriber(s)",
                pruned,
                shared_state.feed.subscriber_count()
            );
        }
    });

    axum::serve(listener, app).await?;

    Ok(())
}

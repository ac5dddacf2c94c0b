use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use schedule_portal::api::router;
use schedule_portal::config::PortalConfig;
use schedule_portal::data_api::DataApiHttpClient;
use schedule_portal::db;
use schedule_portal::session::{SessionContext, SessionStore};
use schedule_portal::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "schedule_portal=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PortalConfig::new_from_env()?;
    info!(
        data_api = %config.data_api.base_url,
        login_mode = %config.login_mode,
        precedence = ?config.data_api.precedence,
        "starting schedule portal"
    );

    let pool = db::connect(&config.database_url).await?;
    let session = SessionContext::init(SessionStore::new(pool.clone())).await?;
    let data_api = Arc::new(DataApiHttpClient::new(config.data_api.clone())?);

    let state = AppState::new(pool, data_api, session, config.login_mode);
    let app = router(state);

    info!("listening on http://{}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutting down");
        })
        .await?;

    Ok(())
}

use std::sync::Arc;

use sea_orm::Database;
use tracing::info;

use harvest_api::config::ApiConfig;
use harvest_api::infra::email::SmtpMailer;
use harvest_api::router::build_router;
use harvest_api::state::AppState;
use harvest_core::config::Config;

#[tokio::main]
async fn main() {
    harvest_core::tracing::init_tracing();

    let config = ApiConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let mailer = SmtpMailer::new(&config).expect("failed to build SMTP transport");

    let state = AppState {
        db,
        mailer,
        config: Arc::new(config),
    };

    let router = build_router(state.clone());
    let http_addr = format!("0.0.0.0:{}", state.config.api_port);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .expect("failed to bind");

    info!("api service listening on {http_addr}");
    axum::serve(listener, router).await.expect("server error");
}

use std::sync::Arc;

use anyhow::Context;
use tracing::{Level, info};

use results_server::config::AppConfig;
use results_server::database::init_db;
use results_server::repository::{
    DbResultRepository, DbUserRepository, MemoryStore, ResultRepository, UserRepository,
};
use results_server::seed;
use results_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let (results, users) = if config.database.is_memory() {
        info!("Using in-memory store");
        let store = MemoryStore::new();
        let results: Arc<dyn ResultRepository> = Arc::new(store.clone());
        let users: Arc<dyn UserRepository> = Arc::new(store);
        (results, users)
    } else {
        let db = init_db(&config.database.url)
            .await
            .context("Failed to connect to database")?;
        info!("Connected to database");
        let results: Arc<dyn ResultRepository> = Arc::new(DbResultRepository::new(db.clone()));
        let users: Arc<dyn UserRepository> = Arc::new(DbUserRepository::new(db));
        (results, users)
    };

    seed::seed_admin(users.as_ref(), &config.auth)
        .await
        .context("Failed to seed admin user")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        results,
        users,
        config,
    };
    let app = results_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

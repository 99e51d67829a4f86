use axum::serve;
use mock_api_rust::api::handlers::AppState;
use mock_api_rust::api::routes::create_router;
use mock_api_rust::config::AppConfig;
use mock_api_rust::seed::{self, SeedTable};
use mock_api_rust::store::PostgresStore;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with explicit filter to suppress sqlx debug logs
    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info) // Default to Info for everything
        .filter_module("sqlx", LevelFilter::Warn) // Suppress sqlx Debug logs
        .init();

    println!("Mock API: Dynamic Mock Endpoint Server");

    // Load configuration
    let config = AppConfig::load()?;
    println!(
        "Configuration loaded: server={}:{}",
        config.server.host, config.server.port
    );

    println!("Connecting to PostgreSQL...");
    let database_url = config.database_url()?;
    let postgres_store = PostgresStore::new(&database_url).await?;

    println!("Running database migrations...");
    postgres_store.migrate().await?;

    let store = Arc::new(postgres_store);

    // First start on an empty database gets a project to author into
    if let Some(project) = seed::ensure_default_project(&*store).await? {
        println!("Created project \"{}\"", project.name);
    }

    // The seed table is fixed for the lifetime of the process
    let state = AppState::new(store, SeedTable::builtin());

    run_server(create_router().with_state(state), &config).await?;

    Ok(())
}

async fn run_server(app: axum::Router, config: &AppConfig) -> anyhow::Result<()> {
    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    println!("Mock API server running on http://{}", bind_address);
    println!(
        "Mock endpoints are served under http://{}/mock",
        bind_address
    );

    serve(listener, app).await?;

    Ok(())
}

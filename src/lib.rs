pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

// Export logic types
pub use logic::{
    detect_field_type, extract_fields, infer_param_value, EndpointSource, Resolution,
    ResolveError, Resolver, SnapshotSource, StoreSource,
};

// Export all model types
pub use model::*;

// Export seed module
pub use seed::{ensure_default_project, SeedTable};

// Export store types
pub use store::{PostgresStore, Store};

// Function for integration testing
pub async fn run_server() -> anyhow::Result<()> {
    use axum::serve;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with INFO level only (suppress DEBUG logs)
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    // Load configuration
    let config = crate::config::AppConfig::load()?;

    // Connect to PostgreSQL
    let database_url = config.database_url()?;
    let postgres_store = crate::store::PostgresStore::new(&database_url).await?;

    // Run migrations
    postgres_store.migrate().await?;

    let store = Arc::new(postgres_store);
    seed::ensure_default_project(&*store).await?;

    let state = handlers::AppState::new(store, SeedTable::builtin());
    let app = crate::api::routes::create_router().with_state(state);

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;

    serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::model::{
        Endpoint, EndpointWithGroup, FieldDescription, FieldType, MockDefinition,
        QueryParamExample, ResponseSet,
    };
    use std::collections::HashMap;

    #[test]
    fn endpoint_round_trips_through_json() {
        let mut field_descriptions = HashMap::new();
        field_descriptions.insert(
            200,
            vec![FieldDescription {
                key: "items[0].id".to_string(),
                field_type: FieldType::Integer,
                description: "Row identifier".to_string(),
            }],
        );

        let mut query_params = HashMap::new();
        query_params.insert(
            "page".to_string(),
            QueryParamExample {
                value: serde_json::json!(1),
                description: String::new(),
            },
        );

        let endpoint = Endpoint {
            id: "ep-1".to_string(),
            name: "List items".to_string(),
            description: Some("Paginated listing".to_string()),
            path: "/api/v1/items".to_string(),
            method: "GET".to_string(),
            group_id: "grp-1".to_string(),
            responses: ResponseSet::from_entries([
                (200, r#"{"items":[{"id":1}]}"#),
                (404, r#"{"error":"Not found"}"#),
            ]),
            field_descriptions,
            request_body: None,
            query_params,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        };

        let json = serde_json::to_string(&endpoint).unwrap();
        let parsed: Endpoint = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, endpoint);
        // Authored order of the responses mapping survives the round-trip
        assert_eq!(parsed.responses.first().unwrap().status, 200);

        // Field-description status keys serialize as JSON object keys
        assert!(json.contains("\"200\""));
    }

    #[test]
    fn endpoint_with_group_flattens_the_group_name() {
        let endpoint = Endpoint {
            id: "ep-1".to_string(),
            name: "Ping".to_string(),
            description: None,
            path: "/ping".to_string(),
            method: "GET".to_string(),
            group_id: "grp-1".to_string(),
            responses: ResponseSet::from_entries([(200, "{}")]),
            field_descriptions: HashMap::new(),
            request_body: None,
            query_params: HashMap::new(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        };
        let row = EndpointWithGroup {
            endpoint,
            group: "General".to_string(),
        };

        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["group"], "General");
        assert_eq!(value["path"], "/ping");

        // The same record is snapshot material: it parses as a definition
        let definition: MockDefinition = serde_json::from_value(value).unwrap();
        assert_eq!(definition.path, "/ping");
        assert_eq!(definition.responses.get(200), Some("{}"));
    }

    #[test]
    fn builtin_seed_covers_the_demo_user_endpoint() {
        let seed = crate::seed::SeedTable::builtin();
        let definition = seed.find("GET", "/api/v1/user").expect("builtin entry");

        assert_eq!(definition.responses.len(), 3);
        let body: serde_json::Value =
            serde_json::from_str(definition.responses.get(200).unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"name": "John", "age": 30, "car": null}));
        assert!(seed.find("POST", "/api/v1/user").is_none());
    }
}

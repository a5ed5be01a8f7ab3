//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, FileStore, FirebaseIdentityAdapter, OpenAiClassifierAdapter},
    config::{Config, ConfigError},
    error::ApiError,
    web::{self, rest::ApiDoc, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use authenticity_core::{AnalysisStore, AuthService, KeyValueStore, MockGenerator, UserStore};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Choose the Storage Backend ---
    let storage: Arc<dyn KeyValueStore> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = DbAdapter::new(db_pool);
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(db_adapter)
        }
        None => {
            info!(dir = %config.data_dir.display(), "No DATABASE_URL set, storing data in files");
            Arc::new(FileStore::open(&config.data_dir).await?)
        }
    };

    // --- 3. Initialize Service Adapters ---
    let classifier = match &config.openai_api_key {
        Some(api_key) => {
            let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
            if let Some(api_base) = &config.openai_api_base {
                openai_config = openai_config.with_api_base(api_base);
            }
            OpenAiClassifierAdapter::new(
                Client::with_config(openai_config),
                config.classifier_model.clone(),
            )
        }
        None => {
            info!("OPENAI_API_KEY not set, checks will use the mock generator");
            OpenAiClassifierAdapter::unconfigured(config.classifier_model.clone())
        }
    };

    let identity = FirebaseIdentityAdapter::new(
        reqwest::Client::new(),
        config.identity_base_url.clone(),
        config.require_firebase_api_key()?,
    );

    // --- 4. Build and Load the Stores ---
    let analysis = Arc::new(
        AnalysisStore::new(storage.clone())
            .with_provider(Arc::new(classifier))
            .with_mock(MockGenerator::new(config.mock_delay)),
    );
    let profile = Arc::new(UserStore::new(storage));
    let auth = Arc::new(AuthService::new(Arc::new(identity)));

    if let Err(e) = analysis.initialize().await {
        error!("Failed to load the analysis history: {}", e);
    }
    if let Err(e) = profile.initialize().await {
        error!("Failed to load the user profile: {}", e);
    }

    let app_state = Arc::new(AppState {
        config: config.clone(),
        analysis,
        profile,
        auth,
    });

    // --- 5. Create the Web Router ---
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string())
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let api_router = web::router(app_state)
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

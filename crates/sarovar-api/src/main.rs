use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sarovar_analysis::ModuleRegistry;
use sarovar_backend::{HttpBackend, MemoryBackend};
use sarovar_core::ports::ComputeBackend;
use sarovar_session::SessionOptions;

use sarovar_api::{create_router, ApiConfig, AppState, BackendKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sarovar_api=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env();

    tracing::info!(
        port = config.port,
        backend = config.backend.as_str(),
        project_id = %config.layered.project_id.value,
        "Starting GeoSarovar API server"
    );

    let backend: Arc<dyn ComputeBackend> = match config.backend {
        BackendKind::Http => {
            let backend = HttpBackend::from_config(&config.layered);
            tracing::info!(endpoint = backend.endpoint(), "Using remote compute backend");
            Arc::new(backend)
        }
        BackendKind::Memory => {
            let backend = match &config.fixture {
                Some(path) => MemoryBackend::from_fixture_file(path)
                    .with_context(|| format!("Failed to load fixture {}", path.display()))?,
                None => MemoryBackend::demo().context("Failed to load the bundled demo fixture")?,
            };
            tracing::info!("Using in-memory backend (set SAROVAR_BACKEND=http for a remote service)");
            Arc::new(backend)
        }
    };

    let state = Arc::new(AppState::new(
        backend,
        Arc::new(ModuleRegistry::standard()),
        SessionOptions::from_config(&config.layered),
    ));

    let origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid SAROVAR_CORS_ORIGIN '{}'", config.cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = create_router(state).layer(TraceLayer::new_for_http()).layer(cors);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("CORS enabled for {}", config.cors_origin);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use resume_api::config::Config;
use resume_api::db::create_pool;
use resume_api::pdf_client::{HttpPdfConverter, PdfConverter};
use resume_api::render::ResumeStyle;
use resume_api::routes::build_router;
use resume_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("resume_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url, config.max_db_connections).await?;

    // Initialize PDF converter
    let pdf: Option<Arc<dyn PdfConverter>> = match &config.pdf_service_url {
        Some(url) => {
            let converter = HttpPdfConverter::new(url.clone())?;
            info!("PDF converter configured at {}", converter.endpoint());
            Some(Arc::new(converter))
        }
        None => {
            warn!("PDF_SERVICE_URL not set; PDF downloads are disabled");
            None
        }
    };

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        style: Arc::new(ResumeStyle::default()),
        pdf,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS to the editor origin once it is configurable

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

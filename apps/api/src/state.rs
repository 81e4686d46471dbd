use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::pdf_client::PdfConverter;
use crate::render::ResumeStyle;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Presentation rules embedded in every rendered document.
    pub style: Arc<ResumeStyle>,
    /// HTML → PDF collaborator; `None` when `PDF_SERVICE_URL` is not configured.
    pub pdf: Option<Arc<dyn PdfConverter>>,
}

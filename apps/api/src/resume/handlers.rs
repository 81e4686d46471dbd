use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{ResumeRows, ResumeSummaryRow};
use crate::pdf_client::attachment_filename;
use crate::persistence::{ensure_merged_valid, load_aggregate, merge_rows, plan_create, store};
use crate::render::render_html;
use crate::resume::aggregate::{create_empty, derive_copy, remove_item, remove_section};
use crate::resume::document::{from_document, to_document, ResumeDocument};
use crate::resume::models::{Resume, ResumeKind};
use crate::resume::validation::{ensure_valid, validate, ValidationResult};
use crate::schema::{NewSectionSchema, SchemaRegistry};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRequest {
    /// Catalog keys to include, in order. All predefined sections when absent.
    #[serde(default)]
    pub sections: Option<Vec<String>>,
    #[serde(default)]
    pub custom_sections: Vec<NewSectionSchema>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct KindQuery {
    pub kind: Option<ResumeKind>,
}

#[derive(Debug, Deserialize)]
pub struct CopyRequest {
    pub title: Option<String>,
    pub kind: Option<ResumeKind>,
}

/// POST /api/v1/resumes/draft
/// Builds an empty resume from catalog keys and custom schemas. Nothing is
/// stored: an empty draft does not pass validation.
pub async fn handle_draft(Json(req): Json<DraftRequest>) -> Result<Json<ResumeDocument>, AppError> {
    let mut registry = SchemaRegistry::with_catalog();

    let mut schema_ids = match &req.sections {
        None => registry.list().iter().map(|s| s.id).collect::<Vec<_>>(),
        Some(keys) => keys
            .iter()
            .map(|key| {
                registry
                    .by_key(key)
                    .map(|s| s.id)
                    .ok_or_else(|| AppError::Validation(format!("Unknown section key '{key}'")))
            })
            .collect::<Result<Vec<_>, _>>()?,
    };
    for custom in req.custom_sections {
        schema_ids.push(registry.register(custom)?);
    }

    let schemas = schema_ids
        .iter()
        .map(|id| registry.get(*id))
        .collect::<Result<Vec<_>, _>>()?;
    let mut resume = create_empty(schemas);
    if let Some(title) = req.title.filter(|t| !t.trim().is_empty()) {
        resume.title = title;
    }

    Ok(Json(to_document(&resume, &registry)?))
}

/// POST /api/v1/resumes
pub async fn handle_create(
    State(state): State<AppState>,
    Json(document): Json<ResumeDocument>,
) -> Result<(StatusCode, Json<ResumeDocument>), AppError> {
    let (registry, resume) = from_document(document)?;
    ensure_valid(&resume, &registry)?;

    let plan = plan_create(&resume, &registry)?;
    let id = store::apply_plan(&state.db, &plan).await?;
    info!("Created resume {id} ({})", resume.kind);

    let document = fetch_document(&state, id).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

/// GET /api/v1/resumes?kind=
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<KindQuery>,
) -> Result<Json<Vec<ResumeSummaryRow>>, AppError> {
    Ok(Json(store::list_resumes(&state.db, params.kind).await?))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeDocument>, AppError> {
    Ok(Json(fetch_document(&state, id).await?))
}

/// PUT /api/v1/resumes/:id
/// Validates the document, merges it into the stored rows and applies the
/// plan in one transaction. Stored rows missing from the document are kept,
/// so the merged result is validated again before anything is written.
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut document): Json<ResumeDocument>,
) -> Result<Json<ResumeDocument>, AppError> {
    document.id = id;
    let (registry, resume) = from_document(document)?;
    ensure_valid(&resume, &registry)?;

    let mut tx = state.db.begin().await?;
    let rows = store::lock_rows(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    let plan = merge_rows(&resume, &registry, &rows)?;
    ensure_merged_valid(&plan, &rows)?;

    if plan.has_writes() {
        store::write_plan(&mut tx, &plan).await?;
        tx.commit().await?;
    } else {
        info!("Resume {id} unchanged; nothing to write");
    }

    Ok(Json(fetch_document(&state, id).await?))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if store::delete_resume(&state.db, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Resume {id} not found")))
    }
}

/// POST /api/v1/resumes/validate
pub async fn handle_validate(
    Json(document): Json<ResumeDocument>,
) -> Result<Json<ValidationResult>, AppError> {
    let (registry, resume) = from_document(document)?;
    Ok(Json(validate(&resume, &registry)))
}

/// POST /api/v1/resumes/:id/copy
/// Stores an independent copy; `kind` defaults to `generated`.
pub async fn handle_copy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<CopyRequest>>,
) -> Result<(StatusCode, Json<ResumeDocument>), AppError> {
    let (title, kind) = match body {
        Some(Json(req)) => (req.title, req.kind.unwrap_or(ResumeKind::Generated)),
        None => (None, ResumeKind::Generated),
    };

    let (registry, resume) = fetch_aggregate(&state, id).await?;
    let (copy, copy_registry) = derive_copy(&resume, &registry, kind, title)?;
    ensure_valid(&copy, &copy_registry)?;

    let plan = plan_create(&copy, &copy_registry)?;
    let copy_id = store::apply_plan(&state.db, &plan).await?;
    info!("Copied resume {id} into {copy_id}");

    Ok((StatusCode::CREATED, Json(fetch_document(&state, copy_id).await?)))
}

/// DELETE /api/v1/resumes/:id/sections/:section_id
pub async fn handle_delete_section(
    State(state): State<AppState>,
    Path((id, section_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let (_, resume) = fetch_aggregate(&state, id).await?;
    if resume.section(section_id).is_none() {
        return Err(AppError::NotFound(format!(
            "Section {section_id} not found in resume {id}"
        )));
    }
    remove_section(&resume, section_id)?;

    if !store::delete_section(&state.db, id, section_id).await? {
        return Err(AppError::NotFound(format!(
            "Section {section_id} not found in resume {id}"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/resumes/:id/items/:item_id
/// Refused when the section would drop below its minimum item count.
pub async fn handle_delete_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let (registry, resume) = fetch_aggregate(&state, id).await?;
    let section_id = resume
        .sections
        .iter()
        .find(|s| s.item(item_id).is_some())
        .map(|s| s.id)
        .ok_or_else(|| AppError::NotFound(format!("Item {item_id} not found in resume {id}")))?;
    remove_item(&resume, &registry, section_id, item_id)?;

    if !store::delete_item(&state.db, id, item_id).await? {
        return Err(AppError::NotFound(format!("Item {item_id} not found in resume {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/resumes/:id/html
pub async fn handle_html(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let (registry, resume) = fetch_aggregate(&state, id).await?;
    Ok(Html(render_html(&resume, &registry, &state.style)?))
}

/// GET /api/v1/resumes/:id/pdf?kind=
pub async fn handle_pdf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<KindQuery>,
) -> Result<impl IntoResponse, AppError> {
    let converter = state
        .pdf
        .clone()
        .ok_or_else(|| AppError::Unavailable("PDF conversion is not configured".to_string()))?;

    let (registry, resume) = fetch_aggregate(&state, id).await?;
    if params.kind.is_some_and(|kind| kind != resume.kind) {
        return Err(AppError::NotFound(format!(
            "Resume {id} is not a {} resume",
            params.kind.map(|k| k.as_str()).unwrap_or_default()
        )));
    }

    let html = render_html(&resume, &registry, &state.style)?;
    let pdf = converter
        .convert(&html)
        .await
        .map_err(|e| AppError::Pdf(e.to_string()))?;
    info!("Generated PDF for resume {id} ({} bytes)", pdf.len());

    let disposition = format!("attachment; filename=\"{}\"", attachment_filename(&resume.title));
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    ))
}

async fn fetch_rows(state: &AppState, id: Uuid) -> Result<ResumeRows, AppError> {
    store::load_rows(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}

async fn fetch_aggregate(state: &AppState, id: Uuid) -> Result<(SchemaRegistry, Resume), AppError> {
    let rows = fetch_rows(state, id).await?;
    Ok(load_aggregate(&rows)?)
}

async fn fetch_document(state: &AppState, id: Uuid) -> Result<ResumeDocument, AppError> {
    let (registry, resume) = fetch_aggregate(state, id).await?;
    Ok(to_document(&resume, &registry)?)
}

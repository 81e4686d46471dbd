use axum::Json;

use crate::schema::catalog::predefined_schemas;
use crate::schema::NewSectionSchema;

/// GET /api/v1/schemas
/// The predefined section catalog. Ids are assigned per resume, so the
/// catalog is served as registration templates keyed by `key`.
pub async fn handle_list_schemas() -> Json<Vec<NewSectionSchema>> {
    Json(predefined_schemas())
}

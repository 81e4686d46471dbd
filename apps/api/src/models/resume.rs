use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub kind: String,
    pub source_resume_id: Option<Uuid>,
    pub title: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub summary: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub portfolio: Option<String>,
}

/// A section row also carries the cardinality of the schema it instantiates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SectionRow {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub schema_id: Uuid,
    pub schema_key: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub display_order: i32,
    pub allow_multiple: bool,
    pub min_items: Option<i32>,
    pub max_items: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FieldRow {
    pub id: Uuid,
    pub section_id: Uuid,
    pub name: String,
    pub label: String,
    pub field_type: String,
    pub required: bool,
    pub full_width: bool,
    pub placeholder: Option<String>,
    pub display_order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ItemRow {
    pub id: Uuid,
    pub section_id: Uuid,
    pub display_order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FieldValueRow {
    pub id: Uuid,
    pub item_id: Uuid,
    pub field_id: Uuid,
    pub value: String,
}

/// Listing projection of the `resumes` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSummaryRow {
    pub id: Uuid,
    pub kind: String,
    pub title: String,
    pub source_resume_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Every row belonging to one resume, in storage order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeRows {
    pub resume: ResumeRow,
    pub sections: Vec<SectionRow>,
    pub fields: Vec<FieldRow>,
    pub items: Vec<ItemRow>,
    pub field_values: Vec<FieldValueRow>,
}

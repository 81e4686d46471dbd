//! JSON shape exchanged with the editing UI.
//!
//! Items carry their values keyed by field *name*; the aggregate keys them by
//! field id. The document embeds the schemas its sections use so the editor can
//! render forms and the service can rebuild the registry snapshot on the way in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ResumeError;
use crate::resume::aggregate::default_title;
use crate::resume::models::{
    FieldValue, Item, PersonalDetails, Resume, ResumeId, ResumeKind, Section,
};
use crate::schema::{SchemaId, SchemaRegistry, SectionSchema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDocument {
    #[serde(default = "Uuid::new_v4")]
    pub id: ResumeId,
    #[serde(default)]
    pub kind: ResumeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_resume_id: Option<ResumeId>,
    #[serde(default)]
    pub title: String,
    pub personal: PersonalDetails,
    #[serde(default)]
    pub sections: Vec<SectionDocument>,
    #[serde(default)]
    pub schemas: Vec<SectionSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDocument {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub schema_id: SchemaId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDocument {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

/// Projects the aggregate into its document form, sections and items in
/// display order. Only schemas used by a section are embedded.
pub fn to_document(resume: &Resume, registry: &SchemaRegistry) -> Result<ResumeDocument, ResumeError> {
    let mut sections = Vec::with_capacity(resume.sections.len());
    let mut schemas = Vec::new();

    for section in resume.ordered_sections() {
        let schema = registry.get(section.schema_id)?;

        let mut items = Vec::with_capacity(section.items.len());
        for item in section.ordered_items() {
            let mut fields = BTreeMap::new();
            for (field_id, value) in &item.values {
                let field = schema.field(*field_id).ok_or_else(|| {
                    ResumeError::ReferentialIntegrityViolation(format!(
                        "field {field_id} is not part of schema '{}'",
                        schema.title
                    ))
                })?;
                fields.insert(field.name.clone(), value.value.clone());
            }
            items.push(ItemDocument {
                id: item.id,
                fields,
            });
        }

        if !schemas.iter().any(|s: &SectionSchema| s.id == schema.id) {
            schemas.push(schema.clone());
        }

        sections.push(SectionDocument {
            id: section.id,
            schema_id: section.schema_id,
            title: section.title.clone(),
            description: section.description.clone(),
            items,
        });
    }

    Ok(ResumeDocument {
        id: resume.id,
        kind: resume.kind,
        source_resume_id: resume.source_resume_id,
        title: resume.title.clone(),
        personal: resume.personal.clone(),
        sections,
        schemas,
    })
}

/// Rebuilds the registry snapshot and the aggregate from a document.
/// Display orders follow document order. Value ids are not part of the
/// document and come back as `None`.
pub fn from_document(document: ResumeDocument) -> Result<(SchemaRegistry, Resume), ResumeError> {
    let registry = SchemaRegistry::from_schemas(document.schemas)?;

    let mut sections = Vec::with_capacity(document.sections.len());
    for (section_index, section) in document.sections.into_iter().enumerate() {
        let schema = registry.get(section.schema_id)?;

        let mut items = Vec::with_capacity(section.items.len());
        for (item_index, item) in section.items.into_iter().enumerate() {
            let mut values = BTreeMap::new();
            for (name, value) in item.fields {
                let field = schema.field_by_name(&name).ok_or_else(|| {
                    ResumeError::ReferentialIntegrityViolation(format!(
                        "field '{name}' is not part of schema '{}'",
                        schema.title
                    ))
                })?;
                values.insert(field.id, FieldValue::new(value));
            }
            items.push(Item {
                id: item.id,
                display_order: item_index as i32,
                values,
            });
        }

        sections.push(Section {
            id: section.id,
            schema_id: section.schema_id,
            title: section.title,
            description: section.description,
            display_order: section_index as i32,
            items,
        });
    }

    let title = if document.title.trim().is_empty() {
        default_title()
    } else {
        document.title
    };

    let resume = Resume {
        id: document.id,
        kind: document.kind,
        source_resume_id: document.source_resume_id,
        title,
        personal: document.personal,
        sections,
    };
    Ok((registry, resume))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resume::validation::validate;
    use crate::schema::catalog::EXPERIENCE;
    use crate::test_support::catalog_resume;
    use serde_json::json;

    #[test]
    fn test_document_round_trip_keeps_values() {
        let (registry, resume) = catalog_resume();
        let document = to_document(&resume, &registry).unwrap();
        let (restored_registry, restored) = from_document(document).unwrap();

        assert_eq!(restored.id, resume.id);
        assert_eq!(restored.personal, resume.personal);
        assert_eq!(restored.sections.len(), resume.sections.len());
        for (a, b) in restored.sections.iter().zip(&resume.sections) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.items[0].values.len(), b.items[0].values.len());
            for (field, value) in &b.items[0].values {
                assert_eq!(a.items[0].value(*field), value.value);
            }
        }
        assert!(validate(&restored, &restored_registry).is_valid());
    }

    #[test]
    fn test_document_uses_camel_case_and_field_names() {
        let (registry, resume) = catalog_resume();
        let value = serde_json::to_value(to_document(&resume, &registry).unwrap()).unwrap();

        assert_eq!(value["personal"]["fullName"], "Ada Lovelace");
        let experience = value["sections"]
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["title"] == "Work Experience")
            .unwrap();
        assert!(experience["schemaId"].is_string());
        assert_eq!(experience["items"][0]["fields"]["company"], "Sample Company");
    }

    #[test]
    fn test_missing_ids_are_generated() {
        let (registry, resume) = catalog_resume();
        let schema = registry.by_key(EXPERIENCE).unwrap();
        let document: ResumeDocument = serde_json::from_value(json!({
            "personal": { "fullName": "Ada", "email": "ada@example.com" },
            "sections": [{
                "schemaId": schema.id,
                "title": "Experience",
                "items": [{ "fields": { "company": "Analytical Engines" } }]
            }],
            "schemas": [schema]
        }))
        .unwrap();

        let (_, restored) = from_document(document).unwrap();
        assert_ne!(restored.id, resume.id);
        assert_eq!(restored.sections[0].items.len(), 1);
        assert!(restored.title.starts_with("Resume - "));
    }

    #[test]
    fn test_unknown_field_name_is_referential_violation() {
        let (registry, resume) = catalog_resume();
        let mut document = to_document(&resume, &registry).unwrap();
        document.sections[0].items[0]
            .fields
            .insert("salary".to_string(), "lots".to_string());

        assert!(matches!(
            from_document(document),
            Err(ResumeError::ReferentialIntegrityViolation(_))
        ));
    }

    #[test]
    fn test_section_without_embedded_schema_is_rejected() {
        let (registry, resume) = catalog_resume();
        let mut document = to_document(&resume, &registry).unwrap();
        document.schemas.remove(0);
        assert!(from_document(document).is_err());
    }
}

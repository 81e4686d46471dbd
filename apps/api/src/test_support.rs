//! Fixtures shared by unit tests.

use crate::resume::aggregate::{create_empty, set_field_value};
use crate::resume::models::{Resume, SectionId};
use crate::schema::{FieldId, SchemaRegistry};

/// A catalog resume with personal details and every required field filled.
/// Optional fields (dates, descriptions, links) are left empty.
pub fn catalog_resume() -> (SchemaRegistry, Resume) {
    let registry = SchemaRegistry::with_catalog();
    let mut resume = create_empty(registry.list());
    resume.title = "Ada Lovelace - Engineering".to_string();
    resume.personal.full_name = "Ada Lovelace".to_string();
    resume.personal.email = "ada@example.com".to_string();

    let targets: Vec<_> = resume
        .sections
        .iter()
        .map(|s| (s.id, s.schema_id, s.items[0].id))
        .collect();

    for (section_id, schema_id, item_id) in targets {
        let schema = registry.get(schema_id).unwrap().clone();
        for field in schema.fields.iter().filter(|f| f.required) {
            resume = set_field_value(
                &resume,
                &registry,
                section_id,
                item_id,
                field.id,
                format!("Sample {}", field.label),
            )
            .unwrap();
        }
    }

    (registry, resume)
}

pub fn section_id(resume: &Resume, registry: &SchemaRegistry, key: &str) -> SectionId {
    let schema_id = registry.by_key(key).unwrap().id;
    resume
        .sections
        .iter()
        .find(|s| s.schema_id == schema_id)
        .unwrap()
        .id
}

pub fn field_id(registry: &SchemaRegistry, key: &str, name: &str) -> FieldId {
    registry
        .by_key(key)
        .unwrap()
        .field_by_name(name)
        .unwrap()
        .id
}

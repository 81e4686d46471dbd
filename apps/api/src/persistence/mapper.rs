//! Projection between the aggregate and its relational rows.
//!
//! A section row carries the cardinality of the schema it instantiates and the
//! schema's fields are stored as field rows under the section, so a stored
//! resume is self-describing: `schemas_from_rows` rebuilds its registry.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;
use uuid::Uuid;

use crate::errors::ResumeError;
use crate::models::{FieldRow, FieldValueRow, ItemRow, ResumeRow, ResumeRows, SectionRow};
use crate::resume::models::{FieldValue, Item, PersonalDetails, Resume, Section};
use crate::schema::{FieldDefinition, SchemaRegistry, SectionSchema};

/// Projects a resume onto rows. Values that have never been persisted get a
/// fresh id.
pub fn to_rows(resume: &Resume, registry: &SchemaRegistry) -> Result<ResumeRows, ResumeError> {
    let mut sections = Vec::with_capacity(resume.sections.len());
    let mut fields = Vec::new();
    let mut items = Vec::new();
    let mut field_values = Vec::new();

    for section in &resume.sections {
        let schema = registry.get(section.schema_id)?;
        sections.push(section_row(resume.id, section, schema)?);
        fields.extend(schema.fields.iter().map(|f| field_row(section.id, f)));

        for item in &section.items {
            items.push(ItemRow {
                id: item.id,
                section_id: section.id,
                display_order: item.display_order,
            });
            for (field_id, value) in &item.values {
                field_values.push(FieldValueRow {
                    id: value.id.unwrap_or_else(Uuid::new_v4),
                    item_id: item.id,
                    field_id: *field_id,
                    value: value.value.clone(),
                });
            }
        }
    }

    Ok(ResumeRows {
        resume: resume_row(resume),
        sections,
        fields,
        items,
        field_values,
    })
}

/// Rebuilds the registry a stored resume was written with, one schema per
/// section row.
pub fn schemas_from_rows(rows: &ResumeRows) -> Result<SchemaRegistry, ResumeError> {
    let mut fields_by_section: HashMap<Uuid, Vec<&FieldRow>> = HashMap::new();
    for field in &rows.fields {
        fields_by_section.entry(field.section_id).or_default().push(field);
    }

    let mut registry = SchemaRegistry::new();
    for section in &rows.sections {
        let mut field_rows = fields_by_section.remove(&section.id).unwrap_or_default();
        field_rows.sort_by_key(|f| f.display_order);

        let fields = field_rows
            .into_iter()
            .map(field_definition)
            .collect::<Result<Vec<_>, _>>()?;

        registry.restore(SectionSchema {
            id: section.schema_id,
            key: section.schema_key.clone(),
            title: section.title.clone(),
            description: section.description.clone(),
            fields,
            allow_multiple: section.allow_multiple,
            min_items: to_count(section.min_items, "min_items")?,
            max_items: to_count(section.max_items, "max_items")?,
        })?;
    }

    if let Some(orphan) = fields_by_section.keys().next() {
        return Err(ResumeError::ReferentialIntegrityViolation(format!(
            "field rows reference unknown section {orphan}"
        )));
    }
    Ok(registry)
}

/// Groups rows into an aggregate. Every level is ordered by `display_order`,
/// ties kept in the order the rows were given.
pub fn from_rows(rows: &ResumeRows) -> Result<Resume, ResumeError> {
    let resume_id = rows.resume.id;

    let mut section_rows: Vec<&SectionRow> = rows.sections.iter().collect();
    section_rows.sort_by_key(|s| s.display_order);

    let mut section_fields: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
    for section in &section_rows {
        if section.resume_id != resume_id {
            return Err(ResumeError::ReferentialIntegrityViolation(format!(
                "section {} belongs to resume {}, not {resume_id}",
                section.id, section.resume_id
            )));
        }
        section_fields.insert(section.id, HashSet::new());
    }
    for field in &rows.fields {
        let fields = section_fields.get_mut(&field.section_id).ok_or_else(|| {
            ResumeError::ReferentialIntegrityViolation(format!(
                "field {} references unknown section {}",
                field.id, field.section_id
            ))
        })?;
        fields.insert(field.id);
    }

    let mut item_rows: Vec<&ItemRow> = rows.items.iter().collect();
    item_rows.sort_by_key(|i| i.display_order);

    let mut item_sections: HashMap<Uuid, Uuid> = HashMap::new();
    let mut items_by_section: HashMap<Uuid, Vec<Item>> = HashMap::new();
    for item in item_rows {
        if !section_fields.contains_key(&item.section_id) {
            return Err(ResumeError::ReferentialIntegrityViolation(format!(
                "item {} references unknown section {}",
                item.id, item.section_id
            )));
        }
        item_sections.insert(item.id, item.section_id);
        items_by_section.entry(item.section_id).or_default().push(Item {
            id: item.id,
            display_order: item.display_order,
            values: BTreeMap::new(),
        });
    }

    let mut values_by_item: HashMap<Uuid, BTreeMap<Uuid, FieldValue>> = HashMap::new();
    for row in &rows.field_values {
        let section_id = item_sections.get(&row.item_id).ok_or_else(|| {
            ResumeError::ReferentialIntegrityViolation(format!(
                "value {} references unknown item {}",
                row.id, row.item_id
            ))
        })?;
        let known_field = section_fields
            .get(section_id)
            .is_some_and(|fields| fields.contains(&row.field_id));
        if !known_field {
            return Err(ResumeError::ReferentialIntegrityViolation(format!(
                "value {} references field {} outside its section",
                row.id, row.field_id
            )));
        }

        let values = values_by_item.entry(row.item_id).or_default();
        if values.contains_key(&row.field_id) {
            return Err(ResumeError::ReferentialIntegrityViolation(format!(
                "item {} holds more than one value for field {}",
                row.item_id, row.field_id
            )));
        }
        values.insert(
            row.field_id,
            FieldValue {
                id: Some(row.id),
                value: row.value.clone(),
            },
        );
    }

    let sections = section_rows
        .into_iter()
        .map(|row| {
            let mut items = items_by_section.remove(&row.id).unwrap_or_default();
            for item in items.iter_mut() {
                item.values = values_by_item.remove(&item.id).unwrap_or_default();
            }
            Section {
                id: row.id,
                schema_id: row.schema_id,
                title: row.title.clone(),
                description: row.description.clone(),
                display_order: row.display_order,
                items,
            }
        })
        .collect::<Vec<_>>();

    debug!(
        "Rebuilt resume {resume_id} from {} section rows and {} value rows",
        sections.len(),
        rows.field_values.len()
    );

    let resume = &rows.resume;
    Ok(Resume {
        id: resume.id,
        kind: resume.kind.parse()?,
        source_resume_id: resume.source_resume_id,
        title: resume.title.clone(),
        personal: PersonalDetails {
            full_name: resume.full_name.clone(),
            email: resume.email.clone(),
            phone: resume.phone.clone(),
            location: resume.location.clone(),
            summary: resume.summary.clone(),
            github: resume.github.clone(),
            linkedin: resume.linkedin.clone(),
            portfolio: resume.portfolio.clone(),
        },
        sections,
    })
}

/// Registry and aggregate of a stored resume.
pub fn load_aggregate(rows: &ResumeRows) -> Result<(SchemaRegistry, Resume), ResumeError> {
    let registry = schemas_from_rows(rows)?;
    let resume = from_rows(rows)?;
    Ok((registry, resume))
}

pub fn resume_row(resume: &Resume) -> ResumeRow {
    let personal = &resume.personal;
    ResumeRow {
        id: resume.id,
        kind: resume.kind.to_string(),
        source_resume_id: resume.source_resume_id,
        title: resume.title.clone(),
        full_name: personal.full_name.clone(),
        email: personal.email.clone(),
        phone: personal.phone.clone(),
        location: personal.location.clone(),
        summary: personal.summary.clone(),
        github: personal.github.clone(),
        linkedin: personal.linkedin.clone(),
        portfolio: personal.portfolio.clone(),
    }
}

pub fn section_row(
    resume_id: Uuid,
    section: &Section,
    schema: &SectionSchema,
) -> Result<SectionRow, ResumeError> {
    Ok(SectionRow {
        id: section.id,
        resume_id,
        schema_id: schema.id,
        schema_key: schema.key.clone(),
        title: section.title.clone(),
        description: section.description.clone(),
        display_order: section.display_order,
        allow_multiple: schema.allow_multiple,
        min_items: to_column(schema.min_items, "min_items")?,
        max_items: to_column(schema.max_items, "max_items")?,
    })
}

pub fn field_row(section_id: Uuid, field: &FieldDefinition) -> FieldRow {
    FieldRow {
        id: field.id,
        section_id,
        name: field.name.clone(),
        label: field.label.clone(),
        field_type: field.field_type.to_string(),
        required: field.required,
        full_width: field.full_width,
        placeholder: field.placeholder.clone(),
        display_order: field.display_order,
    }
}

fn field_definition(row: &FieldRow) -> Result<FieldDefinition, ResumeError> {
    Ok(FieldDefinition {
        id: row.id,
        name: row.name.clone(),
        label: row.label.clone(),
        field_type: row.field_type.parse()?,
        required: row.required,
        full_width: row.full_width,
        placeholder: row.placeholder.clone(),
        display_order: row.display_order,
    })
}

fn to_column(value: Option<u32>, column: &str) -> Result<Option<i32>, ResumeError> {
    value
        .map(|v| {
            i32::try_from(v)
                .map_err(|_| ResumeError::SchemaInvalid(format!("{column} {v} is out of range")))
        })
        .transpose()
}

fn to_count(value: Option<i32>, column: &str) -> Result<Option<u32>, ResumeError> {
    value
        .map(|v| {
            u32::try_from(v)
                .map_err(|_| ResumeError::SchemaInvalid(format!("{column} must not be negative")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resume::aggregate::{add_item, set_field_value};
    use crate::resume::validation::validate;
    use crate::schema::catalog::{EXPERIENCE, PROJECTS};
    use crate::test_support::{catalog_resume, field_id, section_id};

    #[test]
    fn test_round_trip_is_structurally_equal() {
        let (registry, resume) = catalog_resume();
        let rows = to_rows(&resume, &registry).unwrap();
        let (restored_registry, restored) = load_aggregate(&rows).unwrap();

        assert_eq!(restored.id, resume.id);
        assert_eq!(restored.personal, resume.personal);
        assert_eq!(restored.sections.len(), resume.sections.len());
        for (a, b) in restored.sections.iter().zip(&resume.sections) {
            assert_eq!((a.id, a.schema_id, &a.title), (b.id, b.schema_id, &b.title));
            assert_eq!(a.items.len(), b.items.len());
            for (x, y) in a.items.iter().zip(&b.items) {
                assert_eq!(x.id, y.id);
                let left: Vec<_> = x.values.iter().map(|(k, v)| (*k, &v.value)).collect();
                let right: Vec<_> = y.values.iter().map(|(k, v)| (*k, &v.value)).collect();
                assert_eq!(left, right);
            }
        }
        assert!(validate(&restored, &restored_registry).is_valid());
    }

    #[test]
    fn test_round_trip_assigns_value_ids() {
        let (registry, resume) = catalog_resume();
        let restored = from_rows(&to_rows(&resume, &registry).unwrap()).unwrap();
        assert!(restored
            .sections
            .iter()
            .flat_map(|s| &s.items)
            .flat_map(|i| i.values.values())
            .all(|v| v.id.is_some()));
    }

    #[test]
    fn test_schemas_are_rebuilt_from_field_rows() {
        let (registry, resume) = catalog_resume();
        let rows = to_rows(&resume, &registry).unwrap();
        let restored = schemas_from_rows(&rows).unwrap();

        let original = registry.by_key(PROJECTS).unwrap();
        let rebuilt = restored.get(original.id).unwrap();
        assert_eq!(rebuilt.fields, original.fields);
        assert_eq!(rebuilt.max_items(), original.max_items());
        assert_eq!(rebuilt.key.as_deref(), Some(PROJECTS));
    }

    #[test]
    fn test_section_row_rejects_bounds_outside_column_range() {
        let (registry, resume) = catalog_resume();
        let section = &resume.sections[0];
        let mut schema = registry.get(section.schema_id).unwrap().clone();
        schema.min_items = Some(u32::MAX);

        assert!(matches!(
            section_row(resume.id, section, &schema),
            Err(ResumeError::SchemaInvalid(_))
        ));

        schema.min_items = Some(2);
        let row = section_row(resume.id, section, &schema).unwrap();
        assert_eq!(row.min_items, Some(2));
    }

    #[test]
    fn test_from_rows_orders_items_by_display_order() {
        let (registry, resume) = catalog_resume();
        let section = section_id(&resume, &registry, EXPERIENCE);
        let resume = add_item(&resume, &registry, section).unwrap();
        let resume = add_item(&resume, &registry, section).unwrap();

        let mut rows = to_rows(&resume, &registry).unwrap();
        let ids: Vec<Uuid> = rows
            .items
            .iter()
            .filter(|i| i.section_id == section)
            .map(|i| i.id)
            .collect();
        for item in rows.items.iter_mut().filter(|i| i.section_id == section) {
            item.display_order = if item.id == ids[0] { 7 } else { 1 };
        }

        let restored = from_rows(&rows).unwrap();
        let order: Vec<Uuid> = restored
            .section(section)
            .unwrap()
            .items
            .iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(order, vec![ids[1], ids[2], ids[0]]);
    }

    #[test]
    fn test_value_for_foreign_field_is_rejected() {
        let (registry, resume) = catalog_resume();
        let mut rows = to_rows(&resume, &registry).unwrap();
        rows.field_values[0].field_id = Uuid::new_v4();
        assert!(matches!(
            from_rows(&rows),
            Err(ResumeError::ReferentialIntegrityViolation(_))
        ));
    }

    #[test]
    fn test_duplicate_value_for_item_field_is_rejected() {
        let (registry, resume) = catalog_resume();
        let mut rows = to_rows(&resume, &registry).unwrap();
        let mut duplicate = rows.field_values[0].clone();
        duplicate.id = Uuid::new_v4();
        rows.field_values.push(duplicate);
        assert!(from_rows(&rows).is_err());
    }

    #[test]
    fn test_orphan_item_is_rejected() {
        let (registry, resume) = catalog_resume();
        let mut rows = to_rows(&resume, &registry).unwrap();
        rows.items[0].section_id = Uuid::new_v4();
        assert!(from_rows(&rows).is_err());
    }

    #[test]
    fn test_edited_value_survives_round_trip() {
        let (registry, resume) = catalog_resume();
        let section = section_id(&resume, &registry, EXPERIENCE);
        let item = resume.section(section).unwrap().items[0].id;
        let field = field_id(&registry, EXPERIENCE, "endDate");
        let resume = set_field_value(&resume, &registry, section, item, field, "Present").unwrap();

        let restored = from_rows(&to_rows(&resume, &registry).unwrap()).unwrap();
        assert_eq!(restored.section(section).unwrap().items[0].value(field), "Present");
    }
}

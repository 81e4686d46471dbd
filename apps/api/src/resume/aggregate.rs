//! Pure aggregate operations. Every mutator takes the current resume by
//! reference and returns a new one; the registry is only read.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::errors::ResumeError;
use crate::resume::models::{
    FieldValue, Item, ItemId, PersonalDetails, Resume, ResumeKind, Section, SectionId,
};
use crate::schema::{FieldId, SchemaId, SchemaRegistry, SectionSchema};

/// Title given to resumes created without one.
pub fn default_title() -> String {
    format!("Resume - {}", Utc::now().format("%Y-%m-%d"))
}

/// Creates a resume with one section per schema, each holding exactly one
/// item whose values are all empty strings.
pub fn create_empty<'a, I>(schemas: I) -> Resume
where
    I: IntoIterator<Item = &'a SectionSchema>,
{
    let sections = schemas
        .into_iter()
        .enumerate()
        .map(|(index, schema)| instantiate_section(schema, index as i32))
        .collect();

    Resume {
        id: Uuid::new_v4(),
        kind: ResumeKind::Manual,
        source_resume_id: None,
        title: default_title(),
        personal: PersonalDetails::default(),
        sections,
    }
}

/// Appends an empty item. Fails when the section already holds `max_items`.
pub fn add_item(
    resume: &Resume,
    registry: &SchemaRegistry,
    section_id: SectionId,
) -> Result<Resume, ResumeError> {
    let mut next = resume.clone();
    let section = next.section_mut(section_id)?;
    let schema = registry.get(section.schema_id)?;

    let max = schema.max_items();
    if section.items.len() as u32 >= max {
        return Err(ResumeError::CardinalityExceeded { section_id, max });
    }

    let item = empty_item(schema, section.next_item_order());
    debug!("Added item {} to section {section_id}", item.id);
    section.items.push(item);
    Ok(next)
}

/// Removes an item. Fails when removal would drop the section below `min_items`.
/// Sibling display orders are left as they are.
pub fn remove_item(
    resume: &Resume,
    registry: &SchemaRegistry,
    section_id: SectionId,
    item_id: ItemId,
) -> Result<Resume, ResumeError> {
    let mut next = resume.clone();
    let section = next.section_mut(section_id)?;
    let schema = registry.get(section.schema_id)?;

    let position = section
        .items
        .iter()
        .position(|i| i.id == item_id)
        .ok_or_else(|| {
            ResumeError::ReferentialIntegrityViolation(format!(
                "item {item_id} does not exist in section {section_id}"
            ))
        })?;

    let min = schema.min_items();
    if section.items.len() as u32 <= min {
        return Err(ResumeError::CardinalityViolated { section_id, min });
    }

    section.items.remove(position);
    Ok(next)
}

/// Binds `value` to `(item, field)`, replacing any previous value but keeping
/// its storage identity.
pub fn set_field_value(
    resume: &Resume,
    registry: &SchemaRegistry,
    section_id: SectionId,
    item_id: ItemId,
    field_id: FieldId,
    value: impl Into<String>,
) -> Result<Resume, ResumeError> {
    let mut next = resume.clone();
    let section = next.section_mut(section_id)?;
    let schema = registry.get(section.schema_id)?;

    if schema.field(field_id).is_none() {
        return Err(ResumeError::ReferentialIntegrityViolation(format!(
            "field {field_id} is not part of schema '{}'",
            schema.title
        )));
    }

    let item = section
        .items
        .iter_mut()
        .find(|i| i.id == item_id)
        .ok_or_else(|| {
            ResumeError::ReferentialIntegrityViolation(format!(
                "item {item_id} does not exist in section {section_id}"
            ))
        })?;

    let value = value.into();
    item.values
        .entry(field_id)
        .and_modify(|v| v.value = value.clone())
        .or_insert_with(|| FieldValue::new(value));
    Ok(next)
}

/// Appends a section instantiated from a registered schema.
/// A schema can back at most one section of a resume.
pub fn add_section(
    resume: &Resume,
    registry: &SchemaRegistry,
    schema_id: SchemaId,
) -> Result<Resume, ResumeError> {
    let schema = registry.get(schema_id)?;
    if resume.sections.iter().any(|s| s.schema_id == schema_id) {
        return Err(ResumeError::ReferentialIntegrityViolation(format!(
            "schema '{}' is already used by a section of this resume",
            schema.title
        )));
    }

    let order = resume
        .sections
        .iter()
        .map(|s| s.display_order + 1)
        .max()
        .unwrap_or(0);

    let mut next = resume.clone();
    next.sections.push(instantiate_section(schema, order));
    Ok(next)
}

pub fn remove_section(resume: &Resume, section_id: SectionId) -> Result<Resume, ResumeError> {
    let mut next = resume.clone();
    let before = next.sections.len();
    next.sections.retain(|s| s.id != section_id);
    if next.sections.len() == before {
        return Err(ResumeError::ReferentialIntegrityViolation(format!(
            "section {section_id} does not exist in resume"
        )));
    }
    Ok(next)
}

/// Moves a section to `new_index` of the current ordering and renumbers all
/// sections `0..n`. Indexes past the end move the section last.
pub fn move_section(
    resume: &Resume,
    section_id: SectionId,
    new_index: usize,
) -> Result<Resume, ResumeError> {
    let mut ordered: Vec<Section> = resume.ordered_sections().into_iter().cloned().collect();
    let position = ordered
        .iter()
        .position(|s| s.id == section_id)
        .ok_or_else(|| {
            ResumeError::ReferentialIntegrityViolation(format!(
                "section {section_id} does not exist in resume"
            ))
        })?;

    let section = ordered.remove(position);
    let target = new_index.min(ordered.len());
    ordered.insert(target, section);
    for (index, section) in ordered.iter_mut().enumerate() {
        section.display_order = index as i32;
    }

    Ok(Resume {
        sections: ordered,
        ..resume.clone()
    })
}

/// Produces an independent copy of `resume` and of the registry it is
/// interpreted against. Every schema, field, section and item gets a fresh id
/// and value ids are cleared, so the copy shares no identity with its source.
pub fn derive_copy(
    resume: &Resume,
    registry: &SchemaRegistry,
    kind: ResumeKind,
    title: Option<String>,
) -> Result<(Resume, SchemaRegistry), ResumeError> {
    let mut schema_ids: HashMap<SchemaId, SchemaId> = HashMap::new();
    let mut field_ids: HashMap<FieldId, FieldId> = HashMap::new();

    let schemas: Vec<SectionSchema> = registry
        .list()
        .iter()
        .map(|schema| {
            let mut copy = schema.clone();
            copy.id = Uuid::new_v4();
            schema_ids.insert(schema.id, copy.id);
            for field in copy.fields.iter_mut() {
                let fresh = Uuid::new_v4();
                field_ids.insert(field.id, fresh);
                field.id = fresh;
            }
            copy
        })
        .collect();
    let copied_registry = SchemaRegistry::from_schemas(schemas)?;

    let mut sections = Vec::with_capacity(resume.sections.len());
    for section in &resume.sections {
        let schema_id = *schema_ids.get(&section.schema_id).ok_or_else(|| {
            ResumeError::ReferentialIntegrityViolation(format!(
                "schema {} is not registered",
                section.schema_id
            ))
        })?;

        let mut items = Vec::with_capacity(section.items.len());
        for item in &section.items {
            let mut values = BTreeMap::new();
            for (field_id, value) in &item.values {
                let fresh = *field_ids.get(field_id).ok_or_else(|| {
                    ResumeError::ReferentialIntegrityViolation(format!(
                        "field {field_id} is not part of any registered schema"
                    ))
                })?;
                values.insert(fresh, FieldValue::new(value.value.clone()));
            }
            items.push(Item {
                id: Uuid::new_v4(),
                display_order: item.display_order,
                values,
            });
        }

        sections.push(Section {
            id: Uuid::new_v4(),
            schema_id,
            title: section.title.clone(),
            description: section.description.clone(),
            display_order: section.display_order,
            items,
        });
    }

    let copy = Resume {
        id: Uuid::new_v4(),
        kind,
        source_resume_id: Some(resume.id),
        title: title.unwrap_or_else(|| format!("{} (copy)", resume.title)),
        personal: resume.personal.clone(),
        sections,
    };
    Ok((copy, copied_registry))
}

fn instantiate_section(schema: &SectionSchema, display_order: i32) -> Section {
    Section {
        id: Uuid::new_v4(),
        schema_id: schema.id,
        title: schema.title.clone(),
        description: schema.description.clone(),
        display_order,
        items: vec![empty_item(schema, 0)],
    }
}

fn empty_item(schema: &SectionSchema, display_order: i32) -> Item {
    Item {
        id: Uuid::new_v4(),
        display_order,
        values: schema
            .fields
            .iter()
            .map(|f| (f.id, FieldValue::new("")))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{NewField, NewSectionSchema};

    fn bounded_registry(min: u32, max: u32) -> (SchemaRegistry, SchemaId) {
        let mut registry = SchemaRegistry::new();
        let mut schema = NewSectionSchema::new(
            "Talks",
            vec![NewField::text("title", "Title").required()],
        );
        schema.min_items = Some(min);
        schema.max_items = Some(max);
        let id = registry.register(schema).unwrap();
        (registry, id)
    }

    fn resume_with_items(registry: &SchemaRegistry, count: usize) -> (Resume, SectionId) {
        let mut resume = create_empty(registry.list());
        let section_id = resume.sections[0].id;
        for _ in 1..count {
            resume = add_item(&resume, registry, section_id).unwrap();
        }
        (resume, section_id)
    }

    #[test]
    fn test_create_empty_has_one_blank_item_per_schema() {
        let registry = SchemaRegistry::with_catalog();
        let resume = create_empty(registry.list());

        assert_eq!(resume.sections.len(), registry.len());
        for (section, schema) in resume.sections.iter().zip(registry.list()) {
            assert_eq!(section.schema_id, schema.id);
            assert_eq!(section.title, schema.title);
            assert_eq!(section.items.len(), 1);
            let item = &section.items[0];
            assert_eq!(item.values.len(), schema.fields.len());
            assert!(item.values.values().all(|v| v.value.is_empty() && v.id.is_none()));
        }
        assert!(resume.title.starts_with("Resume - "));
    }

    #[test]
    fn test_add_item_at_max_fails() {
        let (registry, _) = bounded_registry(1, 3);
        let (resume, section_id) = resume_with_items(&registry, 3);
        assert_eq!(
            add_item(&resume, &registry, section_id),
            Err(ResumeError::CardinalityExceeded { section_id, max: 3 })
        );
    }

    #[test]
    fn test_remove_item_at_min_fails() {
        let (registry, _) = bounded_registry(1, 3);
        let (resume, section_id) = resume_with_items(&registry, 1);
        let item_id = resume.sections[0].items[0].id;
        assert_eq!(
            remove_item(&resume, &registry, section_id, item_id),
            Err(ResumeError::CardinalityViolated { section_id, min: 1 })
        );
    }

    #[test]
    fn test_add_and_remove_succeed_between_bounds() {
        let (registry, _) = bounded_registry(1, 3);
        let (resume, section_id) = resume_with_items(&registry, 2);

        let grown = add_item(&resume, &registry, section_id).unwrap();
        assert_eq!(grown.sections[0].items.len(), 3);

        let item_id = resume.sections[0].items[1].id;
        let shrunk = remove_item(&resume, &registry, section_id, item_id).unwrap();
        assert_eq!(shrunk.sections[0].items.len(), 1);

        // the input aggregate is untouched
        assert_eq!(resume.sections[0].items.len(), 2);
    }

    #[test]
    fn test_add_item_appends_after_highest_order() {
        let (registry, _) = bounded_registry(1, 5);
        let (mut resume, section_id) = resume_with_items(&registry, 2);
        resume.sections[0].items[0].display_order = 7;
        let grown = add_item(&resume, &registry, section_id).unwrap();
        assert_eq!(grown.sections[0].items[2].display_order, 8);
    }

    #[test]
    fn test_set_field_value_keeps_value_identity() {
        let (registry, schema_id) = bounded_registry(1, 3);
        let (mut resume, section_id) = resume_with_items(&registry, 1);
        let item_id = resume.sections[0].items[0].id;
        let field_id = registry.get(schema_id).unwrap().fields[0].id;
        let stored = Uuid::new_v4();
        resume.sections[0].items[0]
            .values
            .get_mut(&field_id)
            .unwrap()
            .id = Some(stored);

        let next =
            set_field_value(&resume, &registry, section_id, item_id, field_id, "RustConf").unwrap();
        let value = &next.sections[0].items[0].values[&field_id];
        assert_eq!(value.value, "RustConf");
        assert_eq!(value.id, Some(stored));
    }

    #[test]
    fn test_set_field_value_rejects_foreign_field() {
        let (registry, _) = bounded_registry(1, 3);
        let (resume, section_id) = resume_with_items(&registry, 1);
        let item_id = resume.sections[0].items[0].id;
        assert!(matches!(
            set_field_value(&resume, &registry, section_id, item_id, Uuid::new_v4(), "x"),
            Err(ResumeError::ReferentialIntegrityViolation(_))
        ));
    }

    #[test]
    fn test_unknown_section_is_referential_violation() {
        let (registry, _) = bounded_registry(1, 3);
        let (resume, _) = resume_with_items(&registry, 1);
        assert!(matches!(
            add_item(&resume, &registry, Uuid::new_v4()),
            Err(ResumeError::ReferentialIntegrityViolation(_))
        ));
    }

    #[test]
    fn test_add_section_rejects_reused_schema() {
        let (registry, schema_id) = bounded_registry(1, 3);
        let (resume, _) = resume_with_items(&registry, 1);
        assert!(matches!(
            add_section(&resume, &registry, schema_id),
            Err(ResumeError::ReferentialIntegrityViolation(_))
        ));
    }

    #[test]
    fn test_add_custom_section_goes_last() {
        let mut registry = SchemaRegistry::with_catalog();
        let resume = create_empty(registry.list());
        let custom = registry
            .register(NewSectionSchema::new(
                "Publications",
                vec![NewField::text("title", "Title").required()],
            ))
            .unwrap();

        let next = add_section(&resume, &registry, custom).unwrap();
        let last = next.ordered_sections().last().map(|s| s.schema_id);
        assert_eq!(last, Some(custom));
    }

    #[test]
    fn test_move_section_renumbers() {
        let registry = SchemaRegistry::with_catalog();
        let resume = create_empty(registry.list());
        let skills = resume.sections[3].id;

        let moved = move_section(&resume, skills, 0).unwrap();
        let ordered = moved.ordered_sections();
        assert_eq!(ordered[0].id, skills);
        let orders: Vec<i32> = ordered.iter().map(|s| s.display_order).collect();
        assert_eq!(orders, (0..registry.len() as i32).collect::<Vec<_>>());
    }

    #[test]
    fn test_remove_section() {
        let registry = SchemaRegistry::with_catalog();
        let resume = create_empty(registry.list());
        let id = resume.sections[0].id;
        let next = remove_section(&resume, id).unwrap();
        assert!(next.section(id).is_none());
        assert!(remove_section(&next, id).is_err());
    }

    #[test]
    fn test_derive_copy_shares_no_identity() {
        let registry = SchemaRegistry::with_catalog();
        let resume = create_empty(registry.list());

        let (copy, copy_registry) =
            derive_copy(&resume, &registry, ResumeKind::Generated, None).unwrap();

        assert_ne!(copy.id, resume.id);
        assert_eq!(copy.kind, ResumeKind::Generated);
        assert_eq!(copy.source_resume_id, Some(resume.id));
        assert_eq!(copy.sections.len(), resume.sections.len());
        for (a, b) in copy.sections.iter().zip(&resume.sections) {
            assert_ne!(a.id, b.id);
            assert_ne!(a.schema_id, b.schema_id);
            assert!(copy_registry.find(a.schema_id).is_some());
            assert!(registry.find(a.schema_id).is_none());
            assert_eq!(a.items.len(), b.items.len());
        }
    }
}

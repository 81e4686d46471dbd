//! Schema registry: an addressable, explicitly passed collection of section schemas.
//!
//! A registry is a snapshot. Each resume is interpreted against the registry it
//! was created with (catalog + custom schemas), and the persisted resume carries
//! enough information to rebuild it. Nothing here is process-global.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::errors::ResumeError;
use crate::schema::catalog::predefined_schemas;
use crate::schema::models::{NewSectionSchema, SchemaId, SectionSchema};

#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: Vec<SectionSchema>,
    index: HashMap<SchemaId, usize>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding a fresh instantiation of the predefined catalog.
    pub fn with_catalog() -> Self {
        let mut registry = Self::new();
        for new in predefined_schemas() {
            registry.insert(new.instantiate());
        }
        registry
    }

    /// Rebuilds a registry from schemas that already carry identifiers
    /// (a stored resume, or a document echoed back by the editor).
    pub fn from_schemas<I>(schemas: I) -> Result<Self, ResumeError>
    where
        I: IntoIterator<Item = SectionSchema>,
    {
        let mut registry = Self::new();
        for schema in schemas {
            registry.restore(schema)?;
        }
        Ok(registry)
    }

    /// Registers a new schema under a fresh identifier.
    pub fn register(&mut self, schema: NewSectionSchema) -> Result<SchemaId, ResumeError> {
        let schema = schema.instantiate();
        check_schema(&schema)?;
        let id = schema.id;
        debug!("Registered schema '{}' as {id}", schema.title);
        self.insert(schema);
        Ok(id)
    }

    /// Registers a schema keeping its identifiers.
    pub fn restore(&mut self, schema: SectionSchema) -> Result<SchemaId, ResumeError> {
        check_schema(&schema)?;
        if self.index.contains_key(&schema.id) {
            return Err(ResumeError::SchemaInvalid(format!(
                "schema id {} is registered twice",
                schema.id
            )));
        }
        let id = schema.id;
        self.insert(schema);
        Ok(id)
    }

    pub fn get(&self, id: SchemaId) -> Result<&SectionSchema, ResumeError> {
        self.find(id).ok_or_else(|| {
            ResumeError::ReferentialIntegrityViolation(format!("schema {id} is not registered"))
        })
    }

    pub fn find(&self, id: SchemaId) -> Option<&SectionSchema> {
        self.index.get(&id).map(|&i| &self.schemas[i])
    }

    pub fn by_key(&self, key: &str) -> Option<&SectionSchema> {
        self.schemas.iter().find(|s| s.key.as_deref() == Some(key))
    }

    /// Schemas in registration order.
    pub fn list(&self) -> &[SectionSchema] {
        &self.schemas
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    fn insert(&mut self, schema: SectionSchema) {
        self.index.insert(schema.id, self.schemas.len());
        self.schemas.push(schema);
    }
}

/// Structural checks applied to every schema entering a registry.
pub fn check_schema(schema: &SectionSchema) -> Result<(), ResumeError> {
    if schema.title.trim().is_empty() {
        return Err(ResumeError::SchemaInvalid(
            "schema title must not be empty".to_string(),
        ));
    }
    if schema.fields.is_empty() {
        return Err(ResumeError::SchemaInvalid(format!(
            "schema '{}' has no fields",
            schema.title
        )));
    }

    let mut names = HashSet::new();
    let mut ids = HashSet::new();
    for (index, field) in schema.fields.iter().enumerate() {
        if field.label.trim().is_empty() {
            return Err(ResumeError::SchemaInvalid(format!(
                "field #{index} of schema '{}' is missing a label",
                schema.title
            )));
        }
        if field.name.trim().is_empty() {
            return Err(ResumeError::SchemaInvalid(format!(
                "field '{}' of schema '{}' has an empty name",
                field.label, schema.title
            )));
        }
        if !names.insert(field.name.as_str()) {
            return Err(ResumeError::SchemaInvalid(format!(
                "field name '{}' appears more than once in schema '{}'",
                field.name, schema.title
            )));
        }
        if !ids.insert(field.id) {
            return Err(ResumeError::SchemaInvalid(format!(
                "field id {} appears more than once in schema '{}'",
                field.id, schema.title
            )));
        }
    }

    for (bound, value) in [("minItems", schema.min_items), ("maxItems", schema.max_items)] {
        if value.is_some_and(|v| i32::try_from(v).is_err()) {
            return Err(ResumeError::SchemaInvalid(format!(
                "{bound} of schema '{}' is out of range",
                schema.title
            )));
        }
    }
    if schema.max_items() == 0 {
        return Err(ResumeError::SchemaInvalid(format!(
            "schema '{}' allows no items",
            schema.title
        )));
    }
    if schema.min_items() > schema.max_items() {
        return Err(ResumeError::SchemaInvalid(format!(
            "schema '{}' requires at least {} items but allows at most {}",
            schema.title,
            schema.min_items(),
            schema.max_items()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog::{EXPERIENCE, PROJECTS};
    use crate::schema::models::NewField;

    fn awards() -> NewSectionSchema {
        NewSectionSchema::new(
            "Awards",
            vec![
                NewField::text("title", "Title").required(),
                NewField::date("date", "Date"),
            ],
        )
    }

    #[test]
    fn test_register_assigns_fresh_id_and_is_listed() {
        let mut registry = SchemaRegistry::new();
        let id = registry.register(awards()).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(id).unwrap().title, "Awards");
        assert_eq!(registry.list()[0].id, id);
    }

    #[test]
    fn test_register_empty_title_fails() {
        let mut registry = SchemaRegistry::new();
        let mut schema = awards();
        schema.title = "   ".to_string();
        assert!(matches!(
            registry.register(schema),
            Err(ResumeError::SchemaInvalid(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_field_without_label_fails() {
        let mut registry = SchemaRegistry::new();
        let mut schema = awards();
        schema.fields.push(NewField::text("issuer", ""));
        assert!(matches!(
            registry.register(schema),
            Err(ResumeError::SchemaInvalid(_))
        ));
    }

    #[test]
    fn test_register_duplicate_field_names_fails() {
        let mut registry = SchemaRegistry::new();
        let schema = NewSectionSchema::new(
            "Jobs",
            vec![
                NewField::text("company", "Company"),
                NewField::text("company", "Employer"),
            ],
        );
        assert!(matches!(
            registry.register(schema),
            Err(ResumeError::SchemaInvalid(_))
        ));
    }

    #[test]
    fn test_register_inverted_cardinality_fails() {
        let mut registry = SchemaRegistry::new();
        let mut schema = awards();
        schema.min_items = Some(4);
        schema.max_items = Some(2);
        assert!(matches!(
            registry.register(schema),
            Err(ResumeError::SchemaInvalid(_))
        ));
    }

    #[test]
    fn test_register_oversized_cardinality_fails() {
        let mut registry = SchemaRegistry::new();
        let mut schema = awards();
        schema.max_items = Some(u32::MAX);
        assert!(matches!(
            registry.register(schema),
            Err(ResumeError::SchemaInvalid(_))
        ));

        let mut schema = awards();
        schema.min_items = Some(i32::MAX as u32);
        schema.max_items = Some(i32::MAX as u32);
        assert!(registry.register(schema).is_ok());
    }

    #[test]
    fn test_get_unknown_schema_is_referential_violation() {
        let registry = SchemaRegistry::new();
        assert!(matches!(
            registry.get(uuid::Uuid::new_v4()),
            Err(ResumeError::ReferentialIntegrityViolation(_))
        ));
    }

    #[test]
    fn test_catalog_registry_passes_schema_checks() {
        let registry = SchemaRegistry::with_catalog();
        assert_eq!(registry.len(), 7);
        for schema in registry.list() {
            check_schema(schema).unwrap();
        }
        assert_eq!(registry.by_key(EXPERIENCE).unwrap().title, "Work Experience");
    }

    #[test]
    fn test_catalog_instantiations_do_not_share_ids() {
        let a = SchemaRegistry::with_catalog();
        let b = SchemaRegistry::with_catalog();
        assert_ne!(a.by_key(PROJECTS).unwrap().id, b.by_key(PROJECTS).unwrap().id);
    }

    #[test]
    fn test_restore_keeps_ids_and_rejects_duplicates() {
        let schema = awards().instantiate();
        let mut registry = SchemaRegistry::new();
        assert_eq!(registry.restore(schema.clone()).unwrap(), schema.id);
        assert!(matches!(
            registry.restore(schema),
            Err(ResumeError::SchemaInvalid(_))
        ));
    }

    #[test]
    fn test_registries_do_not_cross_talk() {
        let mut left = SchemaRegistry::with_catalog();
        let right = SchemaRegistry::with_catalog();
        let id = left.register(awards()).unwrap();
        assert!(left.find(id).is_some());
        assert!(right.find(id).is_none());
        assert_eq!(right.len(), 7);
    }
}

//! Section schema types: the shape of user data is itself data.
//!
//! A `SectionSchema` owns an ordered list of `FieldDefinition`s and the
//! cardinality rules for the items a section may hold. Schemas are created
//! from `NewSectionSchema` inputs by the registry, which assigns identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ResumeError;

pub type SchemaId = Uuid;
pub type FieldId = Uuid;

pub const DEFAULT_MIN_ITEMS: u32 = 1;
pub const DEFAULT_MAX_ITEMS: u32 = 10;

// ────────────────────────────────────────────────────────────────────────────
// Field types
// ────────────────────────────────────────────────────────────────────────────

/// The value type of a field. Every type has a rendering rule and a
/// validation rule; values are always stored as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Short single-line value, rendered as a title line.
    Text,
    /// Free text, split into lines when rendered.
    Textarea,
    /// `"<Month> <YYYY>"` or `"Present"`.
    Date,
    /// Absolute URL, rendered as an anchor labelled with the field label.
    Link,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Date => "date",
            FieldType::Link => "link",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = ResumeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(FieldType::Text),
            "textarea" => Ok(FieldType::Textarea),
            "date" => Ok(FieldType::Date),
            "link" => Ok(FieldType::Link),
            other => Err(ResumeError::SchemaInvalid(format!(
                "unknown field type '{other}'"
            ))),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Registered schema types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub id: FieldId,
    /// Stable identifier, unique within the owning schema.
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_true")]
    pub full_width: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub display_order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSchema {
    pub id: SchemaId,
    /// Catalog key for predefined schemas (`"education"`, `"experience"`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldDefinition>,
    #[serde(default = "default_true")]
    pub allow_multiple: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
}

impl SectionSchema {
    pub fn min_items(&self) -> u32 {
        self.min_items.unwrap_or(DEFAULT_MIN_ITEMS)
    }

    /// Effective upper bound. A schema that does not allow multiple items
    /// is capped at one regardless of `max_items`.
    pub fn max_items(&self) -> u32 {
        let max = self.max_items.unwrap_or(DEFAULT_MAX_ITEMS);
        if self.allow_multiple {
            max
        } else {
            max.min(1)
        }
    }

    pub fn field(&self, id: FieldId) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields in `display_order`, ties kept in insertion order.
    pub fn ordered_fields(&self) -> Vec<&FieldDefinition> {
        let mut fields: Vec<&FieldDefinition> = self.fields.iter().collect();
        fields.sort_by_key(|f| f.display_order);
        fields
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Registration inputs
// ────────────────────────────────────────────────────────────────────────────

/// A field as submitted for registration, before it has an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewField {
    /// Derived from the label when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_true")]
    pub full_width: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl NewField {
    pub fn new(name: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            name: Some(name.to_string()),
            label: label.to_string(),
            field_type,
            required: false,
            full_width: true,
            placeholder: None,
        }
    }

    pub fn text(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldType::Text)
    }

    pub fn textarea(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldType::Textarea)
    }

    pub fn date(name: &str, label: &str) -> Self {
        Self {
            full_width: false,
            ..Self::new(name, label, FieldType::Date)
        }
    }

    pub fn link(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldType::Link)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    /// The explicit name, or one derived from the label.
    pub fn resolved_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => derive_field_name(&self.label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSectionSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<NewField>,
    #[serde(default = "default_true")]
    pub allow_multiple: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
}

impl NewSectionSchema {
    pub fn new(title: &str, fields: Vec<NewField>) -> Self {
        Self {
            key: None,
            title: title.to_string(),
            description: None,
            fields,
            allow_multiple: true,
            min_items: None,
            max_items: None,
        }
    }

    pub fn keyed(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Builds the schema with fresh identifiers. Fields are ordered as given.
    pub fn instantiate(&self) -> SectionSchema {
        SectionSchema {
            id: Uuid::new_v4(),
            key: self.key.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            fields: self
                .fields
                .iter()
                .enumerate()
                .map(|(index, field)| FieldDefinition {
                    id: Uuid::new_v4(),
                    name: field.resolved_name(),
                    label: field.label.clone(),
                    field_type: field.field_type,
                    required: field.required,
                    full_width: field.full_width,
                    placeholder: field.placeholder.clone(),
                    display_order: index as i32,
                })
                .collect(),
            allow_multiple: self.allow_multiple,
            min_items: self.min_items,
            max_items: self.max_items,
        }
    }
}

/// `"Tech Stack Used"` → `"tech_stack_used"`.
pub fn derive_field_name(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_round_trips_through_str() {
        for ty in [
            FieldType::Text,
            FieldType::Textarea,
            FieldType::Date,
            FieldType::Link,
        ] {
            assert_eq!(ty.as_str().parse::<FieldType>().unwrap(), ty);
        }
    }

    #[test]
    fn test_unknown_field_type_is_schema_invalid() {
        assert!(matches!(
            "number".parse::<FieldType>(),
            Err(ResumeError::SchemaInvalid(_))
        ));
    }

    #[test]
    fn test_derive_field_name_from_label() {
        assert_eq!(derive_field_name("Tech Stack  Used"), "tech_stack_used");
        assert_eq!(derive_field_name("Award"), "award");
    }

    #[test]
    fn test_resolved_name_prefers_explicit_name() {
        let field = NewField::text("company", "Employer Name");
        assert_eq!(field.resolved_name(), "company");

        let unnamed = NewField {
            name: None,
            ..NewField::text("", "Employer Name")
        };
        assert_eq!(unnamed.resolved_name(), "employer_name");
    }

    #[test]
    fn test_effective_cardinality_defaults() {
        let schema = NewSectionSchema::new("Awards", vec![NewField::text("title", "Title")])
            .instantiate();
        assert_eq!(schema.min_items(), DEFAULT_MIN_ITEMS);
        assert_eq!(schema.max_items(), DEFAULT_MAX_ITEMS);
    }

    #[test]
    fn test_single_item_schema_caps_max_at_one() {
        let mut new = NewSectionSchema::new("Objective", vec![NewField::text("text", "Text")]);
        new.allow_multiple = false;
        new.max_items = Some(5);
        assert_eq!(new.instantiate().max_items(), 1);
    }

    #[test]
    fn test_instantiate_assigns_display_order_by_position() {
        let schema = NewSectionSchema::new(
            "Talks",
            vec![NewField::text("title", "Title"), NewField::date("date", "Date")],
        )
        .instantiate();
        let orders: Vec<i32> = schema.fields.iter().map(|f| f.display_order).collect();
        assert_eq!(orders, vec![0, 1]);
        assert_ne!(schema.fields[0].id, schema.fields[1].id);
    }

    #[test]
    fn test_ordered_fields_keeps_insertion_order_on_ties() {
        let mut schema = NewSectionSchema::new(
            "Talks",
            vec![
                NewField::text("a", "A"),
                NewField::text("b", "B"),
                NewField::text("c", "C"),
            ],
        )
        .instantiate();
        schema.fields[0].display_order = 1;
        schema.fields[1].display_order = 0;
        schema.fields[2].display_order = 1;
        let names: Vec<&str> = schema.ordered_fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}

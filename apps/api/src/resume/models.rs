//! The in-memory résumé aggregate: `Resume → Section → Item → FieldValue`.
//!
//! The aggregate is always interpreted against a `SchemaRegistry`. Sections
//! point at their schema by id and field values are keyed by field id, so one
//! generic value type serves every section.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ResumeError;
use crate::schema::{FieldId, SchemaId};

pub type ResumeId = Uuid;
pub type SectionId = Uuid;
pub type ItemId = Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumeKind {
    /// Authored by the user in the editor.
    #[default]
    Manual,
    /// Derived from another resume.
    Generated,
}

impl ResumeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResumeKind::Manual => "manual",
            ResumeKind::Generated => "generated",
        }
    }
}

impl fmt::Display for ResumeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResumeKind {
    type Err = ResumeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(ResumeKind::Manual),
            "generated" => Ok(ResumeKind::Generated),
            other => Err(ResumeError::ReferentialIntegrityViolation(format!(
                "unknown resume kind '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDetails {
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<String>,
}

/// Returns the trimmed value when it is present and non-blank.
/// Empty strings from the editor count as absent.
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValue {
    /// Storage identity; `None` until the value has been persisted.
    pub id: Option<Uuid>,
    pub value: String,
}

impl FieldValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            id: None,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub display_order: i32,
    /// One value per field; the map makes a second value for a field unrepresentable.
    pub values: BTreeMap<FieldId, FieldValue>,
}

impl Item {
    /// The raw value bound to `field_id`, or `""` when none is bound.
    pub fn value(&self, field_id: FieldId) -> &str {
        self.values
            .get(&field_id)
            .map(|v| v.value.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: SectionId,
    pub schema_id: SchemaId,
    /// May diverge from the schema title after creation.
    pub title: String,
    pub description: Option<String>,
    pub display_order: i32,
    pub items: Vec<Item>,
}

impl Section {
    /// Items in `display_order`, ties kept in their current order.
    pub fn ordered_items(&self) -> Vec<&Item> {
        let mut items: Vec<&Item> = self.items.iter().collect();
        items.sort_by_key(|i| i.display_order);
        items
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub(crate) fn next_item_order(&self) -> i32 {
        self.items
            .iter()
            .map(|i| i.display_order + 1)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resume {
    pub id: ResumeId,
    pub kind: ResumeKind,
    /// Set on generated resumes: the resume this one was derived from.
    pub source_resume_id: Option<ResumeId>,
    pub title: String,
    pub personal: PersonalDetails,
    pub sections: Vec<Section>,
}

impl Resume {
    /// Sections in the resume's own ordering (not the schema registry's).
    pub fn ordered_sections(&self) -> Vec<&Section> {
        let mut sections: Vec<&Section> = self.sections.iter().collect();
        sections.sort_by_key(|s| s.display_order);
        sections
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub(crate) fn section_mut(&mut self, id: SectionId) -> Result<&mut Section, ResumeError> {
        self.sections.iter_mut().find(|s| s.id == id).ok_or_else(|| {
            ResumeError::ReferentialIntegrityViolation(format!(
                "section {id} does not exist in resume"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(order: i32) -> Item {
        Item {
            id: Uuid::new_v4(),
            display_order: order,
            values: BTreeMap::new(),
        }
    }

    #[test]
    fn test_present_treats_blank_as_absent() {
        assert_eq!(present(&Some("  ".to_string())), None);
        assert_eq!(present(&None), None);
        assert_eq!(present(&Some(" Berlin ".to_string())), Some("Berlin"));
    }

    #[test]
    fn test_ordered_items_is_stable_for_ties() {
        let items = vec![item(1), item(0), item(1), item(0)];
        let section = Section {
            id: Uuid::new_v4(),
            schema_id: Uuid::new_v4(),
            title: "Projects".to_string(),
            description: None,
            display_order: 0,
            items: items.clone(),
        };
        let ordered: Vec<ItemId> = section.ordered_items().iter().map(|i| i.id).collect();
        assert_eq!(ordered, vec![items[1].id, items[3].id, items[0].id, items[2].id]);
    }

    #[test]
    fn test_changing_one_order_leaves_sibling_order_intact() {
        let mut section = Section {
            id: Uuid::new_v4(),
            schema_id: Uuid::new_v4(),
            title: "Projects".to_string(),
            description: None,
            display_order: 0,
            items: vec![item(0), item(1), item(2)],
        };
        let (a, b, c) = (section.items[0].id, section.items[1].id, section.items[2].id);
        section.items[0].display_order = 5;
        let ordered: Vec<ItemId> = section.ordered_items().iter().map(|i| i.id).collect();
        assert_eq!(ordered, vec![b, c, a]);
    }

    #[test]
    fn test_missing_value_reads_as_empty() {
        assert_eq!(item(0).value(Uuid::new_v4()), "");
    }

    #[test]
    fn test_resume_kind_parses() {
        assert_eq!("generated".parse::<ResumeKind>().unwrap(), ResumeKind::Generated);
        assert!("draft".parse::<ResumeKind>().is_err());
    }
}

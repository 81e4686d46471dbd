// Resume aggregate: the section/item/value tree, its pure mutators, the
// validator that gates persistence and rendering, and the JSON boundary.

pub mod aggregate;
pub mod document;
pub mod handlers;
pub mod models;
pub mod validation;

pub use models::{FieldValue, Item, PersonalDetails, Resume, ResumeKind, Section};
pub use validation::{ensure_valid, validate, ValidationResult, Violation};

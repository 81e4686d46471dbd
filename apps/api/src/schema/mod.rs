// Section schemas: field definitions, the predefined catalog, and the registry
// every other component receives explicitly.

pub mod catalog;
pub mod handlers;
pub mod models;
pub mod registry;

pub use models::{
    FieldDefinition, FieldId, FieldType, NewField, NewSectionSchema, SchemaId, SectionSchema,
};
pub use registry::SchemaRegistry;

pub mod resume;

pub use resume::{
    FieldRow, FieldValueRow, ItemRow, ResumeRow, ResumeRows, ResumeSummaryRow, SectionRow,
};

// Relational persistence: row projection, merge planning and the sqlx store.

pub mod mapper;
pub mod merge;
pub mod store;

pub use mapper::{from_rows, load_aggregate, schemas_from_rows, to_rows};
pub use merge::{ensure_merged_valid, merge_rows, plan_create, MergePlan, MergeSummary, RowOp};

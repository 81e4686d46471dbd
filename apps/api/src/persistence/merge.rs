//! Merge-on-update: decide per row whether an incoming aggregate inserts,
//! updates or leaves stored rows untouched.
//!
//! The plan is computed up front as a pure function of the incoming resume and
//! the stored snapshot, then applied as one batch by the store. Rows that exist
//! in storage but not in the incoming resume produce no operation.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;
use uuid::Uuid;

use crate::errors::ResumeError;
use crate::models::{FieldRow, FieldValueRow, ItemRow, ResumeRow, ResumeRows, SectionRow};
use crate::persistence::mapper::{load_aggregate, to_rows};
use crate::resume::models::Resume;
use crate::resume::validation::ensure_valid;
use crate::schema::SchemaRegistry;

#[derive(Debug, Clone, PartialEq)]
pub enum RowOp<R> {
    /// Row is new; its id has been freshly generated.
    Insert(R),
    /// Row exists under the same id and parent with different attributes.
    Update(R),
    /// Row exists and is identical to the stored one.
    Noop(R),
}

impl<R> RowOp<R> {
    pub fn row(&self) -> &R {
        match self {
            RowOp::Insert(row) | RowOp::Update(row) | RowOp::Noop(row) => row,
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, RowOp::Insert(_))
    }

    pub fn is_update(&self) -> bool {
        matches!(self, RowOp::Update(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergePlan {
    pub resume: RowOp<ResumeRow>,
    pub sections: Vec<RowOp<SectionRow>>,
    pub fields: Vec<RowOp<FieldRow>>,
    pub items: Vec<RowOp<ItemRow>>,
    pub field_values: Vec<RowOp<FieldValueRow>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub inserts: usize,
    pub updates: usize,
    pub noops: usize,
}

impl MergeSummary {
    fn count<R>(&mut self, op: &RowOp<R>) {
        match op {
            RowOp::Insert(_) => self.inserts += 1,
            RowOp::Update(_) => self.updates += 1,
            RowOp::Noop(_) => self.noops += 1,
        }
    }
}

impl fmt::Display for MergeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} insert(s), {} update(s), {} unchanged",
            self.inserts, self.updates, self.noops
        )
    }
}

impl MergePlan {
    pub fn resume_id(&self) -> Uuid {
        self.resume.row().id
    }

    /// True when applying the plan writes at least one row.
    pub fn has_writes(&self) -> bool {
        let summary = self.summary();
        summary.inserts + summary.updates > 0
    }

    /// Rows held by storage once the plan is applied to `existing`. Stored
    /// rows keep their position with updates applied in place; inserts follow.
    pub fn merged_rows(&self, existing: &ResumeRows) -> ResumeRows {
        ResumeRows {
            resume: self.resume.row().clone(),
            sections: overlay(&existing.sections, &self.sections, |r| r.id),
            fields: overlay(&existing.fields, &self.fields, |r| r.id),
            items: overlay(&existing.items, &self.items, |r| r.id),
            field_values: overlay(&existing.field_values, &self.field_values, |r| r.id),
        }
    }

    pub fn summary(&self) -> MergeSummary {
        let mut summary = MergeSummary::default();
        summary.count(&self.resume);
        self.sections.iter().for_each(|op| summary.count(op));
        self.fields.iter().for_each(|op| summary.count(op));
        self.items.iter().for_each(|op| summary.count(op));
        self.field_values.iter().for_each(|op| summary.count(op));
        summary
    }
}

/// Plans the update of a stored resume. `existing` must be the rows stored
/// under the incoming resume's id.
pub fn merge_rows(
    resume: &Resume,
    registry: &SchemaRegistry,
    existing: &ResumeRows,
) -> Result<MergePlan, ResumeError> {
    if existing.resume.id != resume.id {
        return Err(ResumeError::MergeConflict(format!(
            "resume {} cannot be merged into stored resume {}",
            resume.id, existing.resume.id
        )));
    }
    let plan = plan(to_rows(resume, registry)?, Some(existing))?;
    debug!("Merge plan for resume {}: {}", resume.id, plan.summary());
    Ok(plan)
}

/// Validates the resume storage holds after `plan` is applied. Stored rows
/// missing from the incoming resume survive the merge, so a valid incoming
/// resume can still leave a section above its item limit.
pub fn ensure_merged_valid(plan: &MergePlan, existing: &ResumeRows) -> Result<(), ResumeError> {
    let (registry, merged) = load_aggregate(&plan.merged_rows(existing))?;
    for section in &merged.sections {
        let max = registry.get(section.schema_id)?.max_items();
        if section.items.len() > max as usize {
            return Err(ResumeError::CardinalityExceeded {
                section_id: section.id,
                max,
            });
        }
    }
    ensure_valid(&merged, &registry)
}

/// Plans the first write of a resume. Nothing is stored yet, so every row is
/// an insert under a freshly generated id.
pub fn plan_create(resume: &Resume, registry: &SchemaRegistry) -> Result<MergePlan, ResumeError> {
    plan(to_rows(resume, registry)?, None)
}

struct Snapshot<'a> {
    sections: HashMap<Uuid, &'a SectionRow>,
    fields: HashMap<Uuid, &'a FieldRow>,
    items: HashMap<Uuid, &'a ItemRow>,
    values: HashMap<Uuid, &'a FieldValueRow>,
    values_by_key: HashMap<(Uuid, Uuid), &'a FieldValueRow>,
}

impl<'a> Snapshot<'a> {
    fn new(rows: Option<&'a ResumeRows>) -> Self {
        let mut snapshot = Snapshot {
            sections: HashMap::new(),
            fields: HashMap::new(),
            items: HashMap::new(),
            values: HashMap::new(),
            values_by_key: HashMap::new(),
        };
        if let Some(rows) = rows {
            snapshot.sections = rows.sections.iter().map(|r| (r.id, r)).collect();
            snapshot.fields = rows.fields.iter().map(|r| (r.id, r)).collect();
            snapshot.items = rows.items.iter().map(|r| (r.id, r)).collect();
            snapshot.values = rows.field_values.iter().map(|r| (r.id, r)).collect();
            snapshot.values_by_key = rows
                .field_values
                .iter()
                .map(|r| ((r.item_id, r.field_id), r))
                .collect();
        }
        snapshot
    }
}

fn plan(incoming: ResumeRows, existing: Option<&ResumeRows>) -> Result<MergePlan, ResumeError> {
    let snapshot = Snapshot::new(existing);

    let resume = match existing {
        Some(stored) => diff(incoming.resume, &stored.resume),
        None => RowOp::Insert(ResumeRow {
            id: Uuid::new_v4(),
            ..incoming.resume
        }),
    };
    let resume_id = resume.row().id;

    let mut section_ids = HashMap::new();
    let mut sections = Vec::with_capacity(incoming.sections.len());
    for mut row in incoming.sections {
        let incoming_id = row.id;
        row.resume_id = resume_id;
        let op = match snapshot.sections.get(&row.id).copied() {
            Some(stored) if stored.resume_id != resume_id => {
                return Err(conflict("section", row.id, "resume", stored.resume_id));
            }
            Some(stored) => diff(row, stored),
            None => insert(row, |r| &mut r.id),
        };
        section_ids.insert(incoming_id, op.row().id);
        sections.push(op);
    }

    let mut field_ids = HashMap::new();
    let mut fields = Vec::with_capacity(incoming.fields.len());
    for mut row in incoming.fields {
        let incoming_id = row.id;
        row.section_id = remapped(&section_ids, row.section_id, "section")?;
        let op = match snapshot.fields.get(&row.id).copied() {
            Some(stored) if stored.section_id != row.section_id => {
                return Err(conflict("field", row.id, "section", stored.section_id));
            }
            Some(stored) => diff(row, stored),
            None => insert(row, |r| &mut r.id),
        };
        field_ids.insert(incoming_id, op.row().id);
        fields.push(op);
    }

    let mut item_ids = HashMap::new();
    let mut items = Vec::with_capacity(incoming.items.len());
    for mut row in incoming.items {
        let incoming_id = row.id;
        row.section_id = remapped(&section_ids, row.section_id, "section")?;
        let op = match snapshot.items.get(&row.id).copied() {
            Some(stored) if stored.section_id != row.section_id => {
                return Err(conflict("item", row.id, "section", stored.section_id));
            }
            Some(stored) => diff(row, stored),
            None => insert(row, |r| &mut r.id),
        };
        item_ids.insert(incoming_id, op.row().id);
        items.push(op);
    }

    let mut field_values = Vec::with_capacity(incoming.field_values.len());
    for mut row in incoming.field_values {
        row.item_id = remapped(&item_ids, row.item_id, "item")?;
        row.field_id = remapped(&field_ids, row.field_id, "field")?;
        let op = match snapshot.values.get(&row.id).copied() {
            Some(stored) if stored.item_id != row.item_id || stored.field_id != row.field_id => {
                return Err(conflict("value", row.id, "item", stored.item_id));
            }
            Some(stored) => diff(row, stored),
            // The editor does not echo value ids; the (item, field) pair
            // identifies the stored value.
            None => match snapshot.values_by_key.get(&(row.item_id, row.field_id)).copied() {
                Some(stored) => {
                    row.id = stored.id;
                    diff(row, stored)
                }
                None => insert(row, |r| &mut r.id),
            },
        };
        field_values.push(op);
    }

    Ok(MergePlan {
        resume,
        sections,
        fields,
        items,
        field_values,
    })
}

fn overlay<R: Clone>(stored: &[R], ops: &[RowOp<R>], id: impl Fn(&R) -> Uuid) -> Vec<R> {
    let updates: HashMap<Uuid, &R> = ops
        .iter()
        .filter(|op| op.is_update())
        .map(|op| (id(op.row()), op.row()))
        .collect();

    let mut rows: Vec<R> = stored
        .iter()
        .map(|row| updates.get(&id(row)).map_or(row, |updated| *updated).clone())
        .collect();
    rows.extend(
        ops.iter()
            .filter(|op| op.is_insert())
            .map(|op| op.row().clone()),
    );
    rows
}

fn diff<R: PartialEq>(incoming: R, stored: &R) -> RowOp<R> {
    if incoming == *stored {
        RowOp::Noop(incoming)
    } else {
        RowOp::Update(incoming)
    }
}

fn insert<R>(mut row: R, id: impl FnOnce(&mut R) -> &mut Uuid) -> RowOp<R> {
    *id(&mut row) = Uuid::new_v4();
    RowOp::Insert(row)
}

fn remapped(ids: &HashMap<Uuid, Uuid>, id: Uuid, kind: &str) -> Result<Uuid, ResumeError> {
    ids.get(&id).copied().ok_or_else(|| {
        ResumeError::ReferentialIntegrityViolation(format!("row references unknown {kind} {id}"))
    })
}

fn conflict(kind: &str, id: Uuid, parent_kind: &str, parent: Uuid) -> ResumeError {
    ResumeError::MergeConflict(format!(
        "{kind} {id} already belongs to {parent_kind} {parent}"
    ))
}

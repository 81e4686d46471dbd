//! PostgreSQL access for stored resumes.
//!
//! Plans are applied in one transaction, parents before children, so a
//! partially merged resume is never visible.

use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    FieldRow, FieldValueRow, ItemRow, ResumeRow, ResumeRows, ResumeSummaryRow, SectionRow,
};
use crate::persistence::merge::{MergePlan, RowOp};
use crate::resume::models::ResumeKind;

const SELECT_RESUME: &str = r#"
    SELECT id, kind, source_resume_id, title, full_name, email, phone, location,
           summary, github, linkedin, portfolio
    FROM resumes
    WHERE id = $1
"#;

/// Applies a merge plan atomically and returns the id of the written resume.
pub async fn apply_plan(pool: &PgPool, plan: &MergePlan) -> Result<Uuid, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let resume_id = write_plan(&mut tx, plan).await?;
    tx.commit().await?;
    Ok(resume_id)
}

/// Writes a plan inside a caller-owned transaction, parents before children.
pub async fn write_plan(
    tx: &mut Transaction<'_, Postgres>,
    plan: &MergePlan,
) -> Result<Uuid, sqlx::Error> {
    let resume_id = plan.resume_id();

    match &plan.resume {
        RowOp::Insert(row) => insert_resume(tx, row).await?,
        RowOp::Update(row) => update_resume(tx, row).await?,
        RowOp::Noop(_) if plan.has_writes() => touch_resume(tx, resume_id).await?,
        RowOp::Noop(_) => {}
    }

    for op in &plan.sections {
        match op {
            RowOp::Insert(row) => insert_section(tx, row).await?,
            RowOp::Update(row) => update_section(tx, row).await?,
            RowOp::Noop(_) => {}
        }
    }
    for op in &plan.fields {
        match op {
            RowOp::Insert(row) => insert_field(tx, row).await?,
            RowOp::Update(row) => update_field(tx, row).await?,
            RowOp::Noop(_) => {}
        }
    }
    for op in &plan.items {
        match op {
            RowOp::Insert(row) => insert_item(tx, row).await?,
            RowOp::Update(row) => update_item(tx, row).await?,
            RowOp::Noop(_) => {}
        }
    }
    for op in &plan.field_values {
        match op {
            RowOp::Insert(row) => insert_field_value(tx, row).await?,
            RowOp::Update(row) => update_field_value(tx, row).await?,
            RowOp::Noop(_) => {}
        }
    }

    info!("Applied plan for resume {resume_id}: {}", plan.summary());
    Ok(resume_id)
}

/// Loads every row of a resume, each level ordered by `display_order` and
/// then by write order.
pub async fn load_rows(pool: &PgPool, resume_id: Uuid) -> Result<Option<ResumeRows>, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    let resume = sqlx::query_as::<_, ResumeRow>(SELECT_RESUME)
        .bind(resume_id)
        .fetch_optional(&mut *conn)
        .await?;
    match resume {
        Some(resume) => Ok(Some(load_children(&mut *conn, resume).await?)),
        None => Ok(None),
    }
}

/// Loads a resume for update inside `tx`. The resume row stays locked until
/// the transaction ends, so concurrent updates of one resume are serialized
/// and each plans against the rows the previous one committed.
pub async fn lock_rows(
    tx: &mut Transaction<'_, Postgres>,
    resume_id: Uuid,
) -> Result<Option<ResumeRows>, sqlx::Error> {
    let resume = sqlx::query_as::<_, ResumeRow>(&locking(SELECT_RESUME))
        .bind(resume_id)
        .fetch_optional(&mut **tx)
        .await?;
    match resume {
        Some(resume) => Ok(Some(load_children(&mut **tx, resume).await?)),
        None => Ok(None),
    }
}

fn locking(query: &str) -> String {
    format!("{} FOR UPDATE", query.trim_end())
}

async fn load_children(conn: &mut PgConnection, resume: ResumeRow) -> Result<ResumeRows, sqlx::Error> {
    let resume_id = resume.id;

    let sections = sqlx::query_as::<_, SectionRow>(
        r#"
        SELECT id, resume_id, schema_id, schema_key, title, description, display_order,
               allow_multiple, min_items, max_items
        FROM resume_sections
        WHERE resume_id = $1
        ORDER BY display_order, seq
        "#,
    )
    .bind(resume_id)
    .fetch_all(&mut *conn)
    .await?;

    let fields = sqlx::query_as::<_, FieldRow>(
        r#"
        SELECT f.id, f.section_id, f.name, f.label, f.field_type, f.required,
               f.full_width, f.placeholder, f.display_order
        FROM resume_fields f
        JOIN resume_sections s ON s.id = f.section_id
        WHERE s.resume_id = $1
        ORDER BY f.display_order, f.seq
        "#,
    )
    .bind(resume_id)
    .fetch_all(&mut *conn)
    .await?;

    let items = sqlx::query_as::<_, ItemRow>(
        r#"
        SELECT i.id, i.section_id, i.display_order
        FROM resume_items i
        JOIN resume_sections s ON s.id = i.section_id
        WHERE s.resume_id = $1
        ORDER BY i.display_order, i.seq
        "#,
    )
    .bind(resume_id)
    .fetch_all(&mut *conn)
    .await?;

    let field_values = sqlx::query_as::<_, FieldValueRow>(
        r#"
        SELECT v.id, v.item_id, v.field_id, v.value
        FROM resume_field_values v
        JOIN resume_items i ON i.id = v.item_id
        JOIN resume_sections s ON s.id = i.section_id
        WHERE s.resume_id = $1
        ORDER BY v.seq
        "#,
    )
    .bind(resume_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(ResumeRows {
        resume,
        sections,
        fields,
        items,
        field_values,
    })
}

/// Resume summaries, most recently updated first.
pub async fn list_resumes(
    pool: &PgPool,
    kind: Option<ResumeKind>,
) -> Result<Vec<ResumeSummaryRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeSummaryRow>(
        r#"
        SELECT id, kind, title, source_resume_id, created_at, updated_at
        FROM resumes
        WHERE ($1::TEXT IS NULL OR kind = $1)
        ORDER BY updated_at DESC
        "#,
    )
    .bind(kind.map(|k| k.as_str()))
    .fetch_all(pool)
    .await
}

/// Deletes a resume; children go with it through `ON DELETE CASCADE`.
pub async fn delete_resume(pool: &PgPool, resume_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM resumes WHERE id = $1")
        .bind(resume_id)
        .execute(pool)
        .await?;
    Ok(deleted(result.rows_affected(), format_args!("resume {resume_id}")))
}

pub async fn delete_section(
    pool: &PgPool,
    resume_id: Uuid,
    section_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM resume_sections WHERE id = $1 AND resume_id = $2")
        .bind(section_id)
        .bind(resume_id)
        .execute(pool)
        .await?;
    Ok(deleted(
        result.rows_affected(),
        format_args!("section {section_id} of resume {resume_id}"),
    ))
}

pub async fn delete_item(pool: &PgPool, resume_id: Uuid, item_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM resume_items i
        USING resume_sections s
        WHERE i.id = $1 AND s.id = i.section_id AND s.resume_id = $2
        "#,
    )
    .bind(item_id)
    .bind(resume_id)
    .execute(pool)
    .await?;
    Ok(deleted(
        result.rows_affected(),
        format_args!("item {item_id} of resume {resume_id}"),
    ))
}

/// Logs a delete that removed something and reports whether it did.
fn deleted(rows_affected: u64, what: std::fmt::Arguments<'_>) -> bool {
    if rows_affected == 0 {
        debug!("Nothing to delete for {what}");
        return false;
    }
    info!("Deleted {what}");
    true
}

async fn insert_resume(tx: &mut Transaction<'_, Postgres>, row: &ResumeRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO resumes
            (id, kind, source_resume_id, title, full_name, email, phone, location,
             summary, github, linkedin, portfolio)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(row.id)
    .bind(&row.kind)
    .bind(row.source_resume_id)
    .bind(&row.title)
    .bind(&row.full_name)
    .bind(&row.email)
    .bind(&row.phone)
    .bind(&row.location)
    .bind(&row.summary)
    .bind(&row.github)
    .bind(&row.linkedin)
    .bind(&row.portfolio)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn update_resume(tx: &mut Transaction<'_, Postgres>, row: &ResumeRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE resumes
        SET kind = $2, source_resume_id = $3, title = $4, full_name = $5, email = $6,
            phone = $7, location = $8, summary = $9, github = $10, linkedin = $11,
            portfolio = $12, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(row.id)
    .bind(&row.kind)
    .bind(row.source_resume_id)
    .bind(&row.title)
    .bind(&row.full_name)
    .bind(&row.email)
    .bind(&row.phone)
    .bind(&row.location)
    .bind(&row.summary)
    .bind(&row.github)
    .bind(&row.linkedin)
    .bind(&row.portfolio)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn touch_resume(tx: &mut Transaction<'_, Postgres>, resume_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE resumes SET updated_at = NOW() WHERE id = $1")
        .bind(resume_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn insert_section(tx: &mut Transaction<'_, Postgres>, row: &SectionRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO resume_sections
            (id, resume_id, schema_id, schema_key, title, description, display_order,
             allow_multiple, min_items, max_items)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(row.id)
    .bind(row.resume_id)
    .bind(row.schema_id)
    .bind(&row.schema_key)
    .bind(&row.title)
    .bind(&row.description)
    .bind(row.display_order)
    .bind(row.allow_multiple)
    .bind(row.min_items)
    .bind(row.max_items)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn update_section(tx: &mut Transaction<'_, Postgres>, row: &SectionRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE resume_sections
        SET schema_id = $2, schema_key = $3, title = $4, description = $5,
            display_order = $6, allow_multiple = $7, min_items = $8, max_items = $9
        WHERE id = $1
        "#,
    )
    .bind(row.id)
    .bind(row.schema_id)
    .bind(&row.schema_key)
    .bind(&row.title)
    .bind(&row.description)
    .bind(row.display_order)
    .bind(row.allow_multiple)
    .bind(row.min_items)
    .bind(row.max_items)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_field(tx: &mut Transaction<'_, Postgres>, row: &FieldRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO resume_fields
            (id, section_id, name, label, field_type, required, full_width, placeholder, display_order)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(row.id)
    .bind(row.section_id)
    .bind(&row.name)
    .bind(&row.label)
    .bind(&row.field_type)
    .bind(row.required)
    .bind(row.full_width)
    .bind(&row.placeholder)
    .bind(row.display_order)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn update_field(tx: &mut Transaction<'_, Postgres>, row: &FieldRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE resume_fields
        SET name = $2, label = $3, field_type = $4, required = $5, full_width = $6,
            placeholder = $7, display_order = $8
        WHERE id = $1
        "#,
    )
    .bind(row.id)
    .bind(&row.name)
    .bind(&row.label)
    .bind(&row.field_type)
    .bind(row.required)
    .bind(row.full_width)
    .bind(&row.placeholder)
    .bind(row.display_order)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_item(tx: &mut Transaction<'_, Postgres>, row: &ItemRow) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO resume_items (id, section_id, display_order) VALUES ($1, $2, $3)")
        .bind(row.id)
        .bind(row.section_id)
        .bind(row.display_order)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn update_item(tx: &mut Transaction<'_, Postgres>, row: &ItemRow) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE resume_items SET display_order = $2 WHERE id = $1")
        .bind(row.id)
        .bind(row.display_order)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn insert_field_value(
    tx: &mut Transaction<'_, Postgres>,
    row: &FieldValueRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO resume_field_values (id, item_id, field_id, value) VALUES ($1, $2, $3, $4)",
    )
    .bind(row.id)
    .bind(row.item_id)
    .bind(row.field_id)
    .bind(&row.value)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn update_field_value(
    tx: &mut Transaction<'_, Postgres>,
    row: &FieldValueRow,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE resume_field_values SET value = $2 WHERE id = $1")
        .bind(row.id)
        .bind(&row.value)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
